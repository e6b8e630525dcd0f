mod criteria;
mod executor;
mod model;

pub use criteria::{
    default_evaluators, ClimateRiskEvaluator, EfficiencyIndicatorsEvaluator,
    NumericConsistencyEvaluator, ReductionTargetsEvaluator, ScopeEmissionsEvaluator,
    StandardReferencesEvaluator, CLIMATE_RISK_PHRASES, EFFICIENCY_INDICATOR_PHRASES,
    REDUCTION_TARGET_PHRASES, STANDARD_REFERENCE_PHRASES,
};
pub use executor::{RuleBasedAnalyzer, RuleBasedAnalyzerBuilder};
pub use model::{CriterionEvaluator, EvaluatorFailurePolicy, PhraseMatcher};
