use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::criteria::default_evaluators;
use super::model::{CriterionEvaluator, EvaluatorFailurePolicy};
use crate::model::evaluation::AnalysisResult;

/// 规则评估引擎入口
///
/// 持有固定的评估器列表，每次分析都从全新的 [`AnalysisResult`] 开始，
/// 依次执行每个评估器一次。引擎本身在两次调用之间不保存任何状态。
pub struct RuleBasedAnalyzer {
    evaluators: Vec<Arc<dyn CriterionEvaluator>>,
    policy: EvaluatorFailurePolicy,
}

impl RuleBasedAnalyzer {
    pub fn builder() -> RuleBasedAnalyzerBuilder {
        RuleBasedAnalyzerBuilder::default()
    }

    /// 注册默认六个评估器
    pub fn with_default_criteria(policy: EvaluatorFailurePolicy) -> Self {
        Self::builder()
            .register_all(default_evaluators())
            .with_policy(policy)
            .build()
    }

    pub fn policy(&self) -> EvaluatorFailurePolicy {
        self.policy
    }

    pub fn evaluator_count(&self) -> usize {
        self.evaluators.len()
    }

    pub fn evaluator_names(&self) -> Vec<&str> {
        self.evaluators.iter().map(|e| e.name()).collect()
    }

    /// 对全文执行所有评估器
    pub fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let started = Instant::now();
        let mut result = AnalysisResult::new();

        for evaluator in &self.evaluators {
            let mut flag = result.flag(evaluator.criterion());
            let outcome = evaluator
                .evaluate(text, &mut flag)
                .with_context(|| format!("评估器 {} 执行失败", evaluator.name()));

            if let Err(err) = outcome {
                match self.policy {
                    EvaluatorFailurePolicy::FailFast => return Err(err),
                    EvaluatorFailurePolicy::Skip => {
                        warn!(
                            target: "analysis.rules",
                            event = "criterion.skipped",
                            evaluator = evaluator.name(),
                            error = %err
                        );
                    }
                }
            }
        }

        debug!(
            target: "analysis.rules",
            event = "analysis.evaluated",
            evaluators = self.evaluators.len(),
            text_chars = text.chars().count(),
            duration_us = started.elapsed().as_micros() as u64
        );
        info!(
            target: "analysis.rules",
            event = "analysis.scored",
            score = result.total_score(),
            matched = ?result.matched()
        );

        Ok(result)
    }
}

/// 评估器注册列表
#[derive(Default)]
pub struct RuleBasedAnalyzerBuilder {
    evaluators: Vec<Arc<dyn CriterionEvaluator>>,
    policy: EvaluatorFailurePolicy,
}

impl RuleBasedAnalyzerBuilder {
    pub fn register(mut self, evaluator: Arc<dyn CriterionEvaluator>) -> Self {
        self.evaluators.push(evaluator);
        self
    }

    pub fn register_all(
        mut self,
        evaluators: impl IntoIterator<Item = Arc<dyn CriterionEvaluator>>,
    ) -> Self {
        self.evaluators.extend(evaluators);
        self
    }

    pub fn with_policy(mut self, policy: EvaluatorFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> RuleBasedAnalyzer {
        RuleBasedAnalyzer {
            evaluators: self.evaluators,
            policy: self.policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::evaluation::{Criterion, CriterionFlag};
    use anyhow::anyhow;

    const ALL_SIGNALS: &str = "In 2023 our Scope 1 emissions were 1,200 tCO2e, calculated under the GHG Protocol. \
        We have set a reduction target aligned with net zero, discuss climate risk in our scenario work, \
        and track energy intensity across sites.";

    struct FaultyEvaluator;

    impl CriterionEvaluator for FaultyEvaluator {
        fn criterion(&self) -> Criterion {
            Criterion::ClimateRiskDiscussion
        }

        fn name(&self) -> &str {
            "faulty"
        }

        fn evaluate(&self, _text: &str, _flag: &mut CriterionFlag<'_>) -> Result<()> {
            Err(anyhow!("boom"))
        }
    }

    /// 任何文本都会置位的评估器
    struct AlwaysEvaluator(Criterion);

    impl CriterionEvaluator for AlwaysEvaluator {
        fn criterion(&self) -> Criterion {
            self.0
        }

        fn evaluate(&self, _text: &str, flag: &mut CriterionFlag<'_>) -> Result<()> {
            flag.raise();
            Ok(())
        }
    }

    fn default_analyzer() -> RuleBasedAnalyzer {
        RuleBasedAnalyzer::with_default_criteria(EvaluatorFailurePolicy::FailFast)
    }

    #[test]
    fn test_empty_text_scores_zero() {
        let result = default_analyzer().analyze("").unwrap();
        assert_eq!(result, AnalysisResult::new());
        assert_eq!(result.total_score(), 0);
    }

    #[test]
    fn test_scope_only_text_scores_one() {
        let result = default_analyzer()
            .analyze("Scope 1 emissions and Scope 2 emissions are disclosed.")
            .unwrap();
        assert!(result.has_scope_emissions());
        assert_eq!(result.matched(), vec![Criterion::ScopeEmissions]);
        assert_eq!(result.total_score(), 1);
    }

    #[test]
    fn test_near_miss_leaves_scope_flag_false() {
        let result = default_analyzer()
            .analyze("The scope of this report covers Scope 1 sites only.")
            .unwrap();
        assert!(!result.has_scope_emissions());
    }

    #[test]
    fn test_all_signals_score_six() {
        let result = default_analyzer().analyze(ALL_SIGNALS).unwrap();
        assert!(result.has_scope_emissions());
        assert!(result.has_standard_references());
        assert!(result.has_numeric_consistency());
        assert!(result.has_reduction_targets());
        assert!(result.has_climate_risk_discussion());
        assert!(result.has_efficiency_indicators());
        assert_eq!(result.total_score(), 6);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let analyzer = default_analyzer();
        let first = analyzer.analyze(ALL_SIGNALS).unwrap();
        let second = analyzer.analyze(ALL_SIGNALS).unwrap();
        assert_eq!(first, second);

        let partial = "Energy efficiency improved by 12%.";
        assert_eq!(
            analyzer.analyze(partial).unwrap(),
            analyzer.analyze(partial).unwrap()
        );
    }

    #[test]
    fn test_evaluator_order_does_not_change_result() {
        let texts = [
            ALL_SIGNALS,
            "Scope 3 emissions under TCFD.",
            "Energy savings of 4 GWh.",
            "",
        ];
        let forward = default_evaluators();
        let mut reversed = default_evaluators();
        reversed.reverse();
        let mut rotated = default_evaluators();
        rotated.rotate_left(2);

        let analyzers: Vec<RuleBasedAnalyzer> = [forward, reversed, rotated]
            .into_iter()
            .map(|set| RuleBasedAnalyzer::builder().register_all(set).build())
            .collect();

        for text in texts {
            let expected = analyzers[0].analyze(text).unwrap();
            for analyzer in &analyzers[1..] {
                assert_eq!(analyzer.analyze(text).unwrap(), expected, "text: {text}");
            }
        }
    }

    #[test]
    fn test_new_criterion_only_needs_registration() {
        let analyzer = RuleBasedAnalyzer::builder()
            .register(Arc::new(AlwaysEvaluator(Criterion::ReductionTargets)))
            .build();
        assert_eq!(analyzer.evaluator_count(), 1);
        assert_eq!(analyzer.evaluator_names(), vec!["reduction_targets"]);

        let result = analyzer.analyze("anything").unwrap();
        assert_eq!(result.matched(), vec![Criterion::ReductionTargets]);
    }

    #[test]
    fn test_fail_fast_propagates_evaluator_error() {
        let analyzer = RuleBasedAnalyzer::builder()
            .register_all(default_evaluators())
            .register(Arc::new(FaultyEvaluator))
            .build();
        assert_eq!(analyzer.policy(), EvaluatorFailurePolicy::FailFast);

        let err = analyzer.analyze(ALL_SIGNALS).unwrap_err();
        assert!(err.to_string().contains("faulty"));
    }

    #[test]
    fn test_skip_policy_keeps_other_results() {
        let analyzer = RuleBasedAnalyzer::builder()
            .register(Arc::new(FaultyEvaluator))
            .register_all(default_evaluators())
            .with_policy(EvaluatorFailurePolicy::Skip)
            .build();

        let result = analyzer.analyze(ALL_SIGNALS).unwrap();
        assert_eq!(result.total_score(), 6);
    }

    #[test]
    fn test_failed_evaluator_cannot_clear_flag() {
        let analyzer = RuleBasedAnalyzer::builder()
            .register(Arc::new(AlwaysEvaluator(Criterion::ClimateRiskDiscussion)))
            .register(Arc::new(FaultyEvaluator))
            .with_policy(EvaluatorFailurePolicy::Skip)
            .build();

        let result = analyzer.analyze("").unwrap();
        assert!(result.has_climate_risk_discussion());
    }
}
