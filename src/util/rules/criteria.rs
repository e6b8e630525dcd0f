//! 六个 ESG 评估维度的评估器与词表

use std::sync::{Arc, LazyLock};

use anyhow::Result;
use regex::Regex;

use super::model::{CriterionEvaluator, PhraseMatcher};
use crate::model::evaluation::{Criterion, CriterionFlag};

/// 标准与框架引用
pub const STANDARD_REFERENCE_PHRASES: &[&str] = &[
    "ghg protocol",
    "greenhouse gas protocol",
    "gri",
    "global reporting initiative",
    "sasb",
    "tcfd",
    "task force on climate-related financial disclosures",
    "cdp",
    "carbon disclosure project",
    "iso 14001",
    "iso 14064",
    "iso 50001",
    "esrs",
    "european sustainability reporting standards",
    "csrd",
    "issb",
    "ifrs s1",
    "ifrs s2",
    "sbti",
    "science based target",
];

/// 减排目标
pub const REDUCTION_TARGET_PHRASES: &[&str] = &[
    "reduction target",
    "reduction goal",
    "emission reduction",
    "emissions reduction",
    "reduce emissions",
    "reduce our emissions",
    "reducing emissions",
    "reduce greenhouse gas emissions",
    "net zero",
    "carbon neutral",
    "carbon neutrality",
    "climate neutral",
    "climate neutrality",
    "decarbonisation target",
    "decarbonization target",
];

/// 气候风险讨论
pub const CLIMATE_RISK_PHRASES: &[&str] = &[
    "climate risk",
    "climate-related risk",
    "climate change risk",
    "physical risk",
    "transition risk",
    "scenario analysis",
    "climate scenario",
    "climate resilience",
];

/// 能效指标
pub const EFFICIENCY_INDICATOR_PHRASES: &[&str] = &[
    "energy efficiency",
    "energy intensity",
    "carbon intensity",
    "emission intensity",
    "emissions intensity",
    "ghg intensity",
    "water intensity",
    "resource efficiency",
    "energy saving",
    "energy consumption per",
    "efficiency indicator",
];

// 必须出现 "emissions"，单独的 "scope" / "scope 1" 不算；
// 范围之间可用 "1, 2, and 3" / "1-3" / "1 + 2" 等写法，"emissions" 前允许至多三个限定词或一个括号说明
static SCOPE_EMISSIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?-u:\b)scope[\s\-]*[123](?-u:\b)(?:(?:\s*(?:,|/|&|\+|-|–|—|to|and|or))+\s*(?:scope[\s\-]*)?[123](?-u:\b))*(?:\s+(?:\([^()]{1,40}\)|[a-z][a-z0-9\-]*)){0,3}?\s+emissions?(?-u:\b)",
    )
    .unwrap()
});

// 数字紧跟计量单位
static NUMERIC_WITH_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?-u:\b)\d+(?:[.,]\d+)*\s?(?:%|(?:percent|per\s+cent|t\s?co2e?|tonnes?|tons?|kt|mt|kg|kwh|mwh|gwh|twh|gj|tj|mj|m3|litres?|liters?|hectares?|ha)(?-u:\b))",
    )
    .unwrap()
});

static STANDARD_REFERENCES: LazyLock<PhraseMatcher> =
    LazyLock::new(|| PhraseMatcher::new(STANDARD_REFERENCE_PHRASES).unwrap());
static REDUCTION_TARGETS: LazyLock<PhraseMatcher> =
    LazyLock::new(|| PhraseMatcher::new(REDUCTION_TARGET_PHRASES).unwrap());
static CLIMATE_RISK: LazyLock<PhraseMatcher> =
    LazyLock::new(|| PhraseMatcher::new(CLIMATE_RISK_PHRASES).unwrap());
static EFFICIENCY_INDICATORS: LazyLock<PhraseMatcher> =
    LazyLock::new(|| PhraseMatcher::new(EFFICIENCY_INDICATOR_PHRASES).unwrap());

fn raise_if(matched: bool, flag: &mut CriterionFlag<'_>) {
    if matched {
        tracing::debug!(
            target: "analysis.rules",
            event = "criterion.matched",
            criterion = %flag.criterion()
        );
        flag.raise();
    }
}

/// 范围一/二/三排放
#[derive(Debug, Default, Clone, Copy)]
pub struct ScopeEmissionsEvaluator;

impl CriterionEvaluator for ScopeEmissionsEvaluator {
    fn criterion(&self) -> Criterion {
        Criterion::ScopeEmissions
    }

    fn evaluate(&self, text: &str, flag: &mut CriterionFlag<'_>) -> Result<()> {
        raise_if(SCOPE_EMISSIONS_RE.is_match(text), flag);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StandardReferencesEvaluator;

impl CriterionEvaluator for StandardReferencesEvaluator {
    fn criterion(&self) -> Criterion {
        Criterion::StandardReferences
    }

    fn evaluate(&self, text: &str, flag: &mut CriterionFlag<'_>) -> Result<()> {
        raise_if(STANDARD_REFERENCES.is_match(text), flag);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NumericConsistencyEvaluator;

impl CriterionEvaluator for NumericConsistencyEvaluator {
    fn criterion(&self) -> Criterion {
        Criterion::NumericConsistency
    }

    fn evaluate(&self, text: &str, flag: &mut CriterionFlag<'_>) -> Result<()> {
        raise_if(NUMERIC_WITH_UNIT_RE.is_match(text), flag);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReductionTargetsEvaluator;

impl CriterionEvaluator for ReductionTargetsEvaluator {
    fn criterion(&self) -> Criterion {
        Criterion::ReductionTargets
    }

    fn evaluate(&self, text: &str, flag: &mut CriterionFlag<'_>) -> Result<()> {
        raise_if(REDUCTION_TARGETS.is_match(text), flag);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ClimateRiskEvaluator;

impl CriterionEvaluator for ClimateRiskEvaluator {
    fn criterion(&self) -> Criterion {
        Criterion::ClimateRiskDiscussion
    }

    fn evaluate(&self, text: &str, flag: &mut CriterionFlag<'_>) -> Result<()> {
        raise_if(CLIMATE_RISK.is_match(text), flag);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EfficiencyIndicatorsEvaluator;

impl CriterionEvaluator for EfficiencyIndicatorsEvaluator {
    fn criterion(&self) -> Criterion {
        Criterion::EfficiencyIndicators
    }

    fn evaluate(&self, text: &str, flag: &mut CriterionFlag<'_>) -> Result<()> {
        raise_if(EFFICIENCY_INDICATORS.is_match(text), flag);
        Ok(())
    }
}

/// 默认注册的六个评估器
pub fn default_evaluators() -> Vec<Arc<dyn CriterionEvaluator>> {
    vec![
        Arc::new(ScopeEmissionsEvaluator),
        Arc::new(StandardReferencesEvaluator),
        Arc::new(NumericConsistencyEvaluator),
        Arc::new(ReductionTargetsEvaluator),
        Arc::new(ClimateRiskEvaluator),
        Arc::new(EfficiencyIndicatorsEvaluator),
    ]
}
