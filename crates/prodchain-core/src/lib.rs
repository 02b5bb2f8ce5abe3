//! # Production Chain Core
//!
//! 核心資料模型、外部協作介面與錯誤類型定義

pub mod blueprint;
pub mod catalog;
pub mod chain;
pub mod config;
pub mod item;
pub mod price;

// Re-export 主要類型
pub use blueprint::{BlueprintDefinition, BlueprintMaterial};
pub use catalog::{
    BlueprintCatalog, CatalogSnapshot, InMemoryCatalog, ItemCatalog, PriceBook, PriceEntry,
    PriceSource,
};
pub use chain::{
    AggregateResult, BranchCost, ChainNode, CostBreakdown, MaterialCost, MaterialRequirement,
    PricingWarning, PricingWarningKind, WarningSeverity,
};
pub use config::{
    me_level_to_efficiency, te_level_to_efficiency, validate_fraction, MaterialRounding,
    ResolveConfig,
};
pub use item::{Item, ItemId};
pub use price::{PriceLookup, PriceOrigin, PriceQuote};

/// 生產鏈解析的尺寸上限類型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeLimit {
    /// 展開節點數上限
    Nodes(usize),
    /// 製造深度上限
    Depth(usize),
}

impl std::fmt::Display for SizeLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeLimit::Nodes(limit) => write!(f, "展開節點數超過上限 {}", limit),
            SizeLimit::Depth(limit) => write!(f, "製造深度超過上限 {}", limit),
        }
    }
}

/// 生產鏈錯誤類型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    #[error("藍圖資料無效（物品 {item_id}）: {reason}")]
    InvalidBlueprintData { item_id: ItemId, reason: String },

    #[error("偵測到循環藍圖: {}", format_cycle(.cycle))]
    CyclicBlueprint { cycle: Vec<ItemId> },

    #[error("生產鏈過大: {limit}")]
    ChainTooLarge { limit: SizeLimit },

    #[error("解析已取消: 超過時間預算 {budget_ms} 毫秒")]
    ResolutionCancelled { budget_ms: u128 },

    #[error("價格資料無效（物品 {item_id}）: {reason}")]
    InvalidPriceData { item_id: ItemId, reason: String },

    #[error("找不到物品: {0}")]
    ItemNotFound(ItemId),

    #[error("無效的解析參數: {0}")]
    InvalidConfig(String),

    #[error("計算錯誤: {0}")]
    CalculationError(String),
}

impl ChainError {
    /// 是否值得由呼叫端調整參數後重試
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChainError::ChainTooLarge { .. } | ChainError::ResolutionCancelled { .. }
        )
    }
}

fn format_cycle(cycle: &[ItemId]) -> String {
    cycle
        .iter()
        .map(ItemId::to_string)
        .collect::<Vec<_>>()
        .join(" → ")
}

pub type Result<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_message_names_every_item() {
        let err = ChainError::CyclicBlueprint {
            cycle: vec![ItemId(1), ItemId(2), ItemId(1)],
        };
        assert_eq!(err.to_string(), "偵測到循環藍圖: 1 → 2 → 1");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ChainError::ChainTooLarge { limit: SizeLimit::Nodes(10) }.is_retryable());
        assert!(ChainError::ResolutionCancelled { budget_ms: 5 }.is_retryable());
        assert!(!ChainError::CyclicBlueprint { cycle: vec![] }.is_retryable());
        assert!(!ChainError::ItemNotFound(ItemId(3)).is_retryable());
    }
}
