use std::fmt;

use anyhow::{anyhow, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::model::evaluation::{Criterion, CriterionFlag};

/// 单维度评估器
///
/// 评估器必须是无状态的纯函数：同样的文本永远得到同样的结论，
/// 只能通过传入的 [`CriterionFlag`] 置位自己负责的维度，不依赖其它评估器的执行结果。
pub trait CriterionEvaluator: Send + Sync {
    /// 负责的评估维度
    fn criterion(&self) -> Criterion;

    fn name(&self) -> &str {
        self.criterion().name()
    }

    /// 检查全文，命中时调用 `flag.raise()`；未命中保持原状
    fn evaluate(&self, text: &str, flag: &mut CriterionFlag<'_>) -> Result<()>;
}

/// 评估器出错时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorFailurePolicy {
    /// 任一评估器出错即终止整个分析
    #[default]
    FailFast,
    /// 记录告警并跳过出错的评估器
    Skip,
}

impl EvaluatorFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorFailurePolicy::FailFast => "fail_fast",
            EvaluatorFailurePolicy::Skip => "skip",
        }
    }
}

impl fmt::Display for EvaluatorFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 固定词表的短语匹配器（大小写不敏感）
///
/// 短语内部的空白与连字符可互换且可重复，例如 "net zero" 同时匹配 "Net-Zero" 与 "net\nzero"；
/// 短语两端按 ASCII 单词边界匹配，末尾允许复数 `s`，避免 "GRI" 命中 "agriculture"。
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    regex: Regex,
}

impl PhraseMatcher {
    pub fn new(phrases: &[&str]) -> Result<Self> {
        let alternatives: Vec<String> = phrases
            .iter()
            .map(|phrase| phrase_pattern(phrase))
            .filter(|pattern| !pattern.is_empty())
            .collect();
        if alternatives.is_empty() {
            return Err(anyhow!("词表为空"));
        }

        // ASCII 单词边界：紧邻中文的 "GRI标准" 也能命中
        let pattern = format!(r"(?-u:\b)(?:{})s?(?-u:\b)", alternatives.join("|"));
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// 返回第一个命中的原文片段
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex.find(text).map(|m| m.as_str())
    }
}

fn phrase_pattern(phrase: &str) -> String {
    phrase
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|word| !word.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[\s\-]+")
}
