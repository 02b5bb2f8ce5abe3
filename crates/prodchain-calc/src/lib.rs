//! # Production Chain Resolution Engine
//!
//! 生產鏈解析引擎：展開藍圖、彙總原料、評估成本

pub mod aggregator;
pub mod cost;
pub mod lookup;
pub mod planner;
pub mod profit;
pub mod quantity;
pub mod resolver;

// Re-export 主要類型
pub use aggregator::{IntermediateTotal, MaterialAggregator, PeggingRecord};
pub use cost::{CostEvaluation, CostEvaluator, CostOptions};
pub use lookup::BlueprintLookup;
pub use planner::ChainPlanner;
pub use profit::{ProfitAnalysis, ProfitAnalyzer};
pub use quantity::{QuantityCalculator, QuantityError, RunPlan};
pub use resolver::{ChainResolver, TraversalBudget};

use prodchain_core::{
    AggregateResult, BlueprintCatalog, ChainNode, CostBreakdown, ItemCatalog, ItemId, PriceSource,
    PricingWarning, ResolveConfig, WarningSeverity,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// 生產鏈解析結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainResult {
    /// 生產樹
    pub root: ChainNode,

    /// 原料彙總
    pub aggregate: AggregateResult,

    /// 成本明細
    pub cost: CostBreakdown,

    /// 定價警告
    pub warnings: Vec<PricingWarning>,

    /// 總製造時間（秒）
    pub total_production_time: u64,
}

impl ChainResult {
    /// 添加警告
    pub fn add_warning(&mut self, warning: PricingWarning) {
        self.warnings.push(warning);
    }

    /// 是否有需要注意的警告
    pub fn has_warnings(&self, min_severity: WarningSeverity) -> bool {
        self.warnings
            .iter()
            .any(|w| severity_rank(w.severity) >= severity_rank(min_severity))
    }

    /// 指定原料的追溯記錄
    pub fn pegging(&self, material_id: ItemId) -> Vec<PeggingRecord> {
        MaterialAggregator::peg(&self.root, material_id)
    }

    /// 輸出 JSON
    pub fn to_json(&self) -> prodchain_core::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| prodchain_core::ChainError::CalculationError(format!("序列化失敗: {}", e)))
    }
}

fn severity_rank(severity: WarningSeverity) -> u8 {
    match severity {
        WarningSeverity::Info => 0,
        WarningSeverity::Warning => 1,
        WarningSeverity::Error => 2,
    }
}

/// 解析生產鏈（單次呼叫入口）
pub fn resolve_chain(
    items: &dyn ItemCatalog,
    blueprints: &dyn BlueprintCatalog,
    prices: &dyn PriceSource,
    target: ItemId,
    quantity: u64,
    efficiency: Decimal,
    config: &ResolveConfig,
) -> prodchain_core::Result<ChainResult> {
    ChainPlanner::new(items, blueprints, prices).resolve_chain(target, quantity, efficiency, config)
}
