use serde::{Deserialize, Serialize};
use std::fmt;

/// ESG 报告评估维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// 范围一/二/三排放披露
    ScopeEmissions,
    /// 引用的披露标准或框架
    StandardReferences,
    /// 带单位的量化数据
    NumericConsistency,
    /// 减排目标表述
    ReductionTargets,
    /// 气候风险讨论
    ClimateRiskDiscussion,
    /// 能效类指标
    EfficiencyIndicators,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::ScopeEmissions,
        Criterion::StandardReferences,
        Criterion::NumericConsistency,
        Criterion::ReductionTargets,
        Criterion::ClimateRiskDiscussion,
        Criterion::EfficiencyIndicators,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Criterion::ScopeEmissions => "scope_emissions",
            Criterion::StandardReferences => "standard_references",
            Criterion::NumericConsistency => "numeric_consistency",
            Criterion::ReductionTargets => "reduction_targets",
            Criterion::ClimateRiskDiscussion => "climate_risk_discussion",
            Criterion::EfficiencyIndicators => "efficiency_indicators",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 单次分析的评分卡 - 六个独立的布尔标记
///
/// 字段只能通过 [`CriterionFlag`] 置为 true，一次分析过程中不会回退为 false。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    has_scope_emissions: bool,
    has_standard_references: bool,
    has_numeric_consistency: bool,
    has_reduction_targets: bool,
    has_climate_risk_discussion: bool,
    has_efficiency_indicators: bool,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_scope_emissions(&self) -> bool {
        self.has_scope_emissions
    }

    pub fn has_standard_references(&self) -> bool {
        self.has_standard_references
    }

    pub fn has_numeric_consistency(&self) -> bool {
        self.has_numeric_consistency
    }

    pub fn has_reduction_targets(&self) -> bool {
        self.has_reduction_targets
    }

    pub fn has_climate_risk_discussion(&self) -> bool {
        self.has_climate_risk_discussion
    }

    pub fn has_efficiency_indicators(&self) -> bool {
        self.has_efficiency_indicators
    }

    pub fn is_set(&self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::ScopeEmissions => self.has_scope_emissions,
            Criterion::StandardReferences => self.has_standard_references,
            Criterion::NumericConsistency => self.has_numeric_consistency,
            Criterion::ReductionTargets => self.has_reduction_targets,
            Criterion::ClimateRiskDiscussion => self.has_climate_risk_discussion,
            Criterion::EfficiencyIndicators => self.has_efficiency_indicators,
        }
    }

    /// 总分 = 命中维度数量，范围 0..=6
    pub fn total_score(&self) -> u8 {
        Criterion::ALL.iter().filter(|c| self.is_set(**c)).count() as u8
    }

    /// 已命中的维度（按固定顺序）
    pub fn matched(&self) -> Vec<Criterion> {
        Criterion::ALL
            .iter()
            .copied()
            .filter(|c| self.is_set(*c))
            .collect()
    }

    /// 取得某一维度的受限写入视图，仅供评估引擎分发给对应评估器
    pub(crate) fn flag(&mut self, criterion: Criterion) -> CriterionFlag<'_> {
        let slot = match criterion {
            Criterion::ScopeEmissions => &mut self.has_scope_emissions,
            Criterion::StandardReferences => &mut self.has_standard_references,
            Criterion::NumericConsistency => &mut self.has_numeric_consistency,
            Criterion::ReductionTargets => &mut self.has_reduction_targets,
            Criterion::ClimateRiskDiscussion => &mut self.has_climate_risk_discussion,
            Criterion::EfficiencyIndicators => &mut self.has_efficiency_indicators,
        };
        CriterionFlag { criterion, slot }
    }
}

/// 指向评分卡中单个标记的写入视图，只允许置位
pub struct CriterionFlag<'a> {
    criterion: Criterion,
    slot: &'a mut bool,
}

impl<'a> CriterionFlag<'a> {
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    pub fn raise(&mut self) {
        *self.slot = true;
    }

    pub fn is_raised(&self) -> bool {
        *self.slot
    }
}
