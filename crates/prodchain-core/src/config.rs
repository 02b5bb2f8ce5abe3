//! 生產鏈解析配置

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::{ChainError, ItemId};

/// 預設展開節點上限
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// 預設製造深度上限
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// 材料用量的捨入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaterialRounding {
    /// 逐輪捨入：ceil(每輪用量 × (1 - 效率)) × 輪數
    #[default]
    PerRun,
    /// 整批捨入：ceil(每輪用量 × 輪數 × (1 - 效率))
    PerBatch,
}

/// 生產鏈解析配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// 展開節點數上限（含根節點）
    pub max_nodes: usize,

    /// 製造深度上限（根節點為 0）
    pub max_depth: usize,

    /// 時間預算，超過即取消解析
    pub cancel_budget: Option<Duration>,

    /// 是否優先使用自訂價格
    pub use_custom_prices: bool,

    /// 材料用量捨入方式
    pub rounding: MaterialRounding,

    /// 時間效率（0-1，縮短每輪製造時間）
    pub time_efficiency: Decimal,

    /// 直接購買的物品（即使有藍圖也不展開）
    pub buy_items: BTreeSet<ItemId>,

    /// 是否在單次解析內快取重複子樹
    pub memoize: bool,

    /// 是否並行展開根節點的子樹
    pub parallel: bool,

    /// 市場價格過期天數（需同時設置 price_as_of）
    pub stale_price_days: Option<u32>,

    /// 價格評估基準日
    pub price_as_of: Option<NaiveDate>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            max_depth: DEFAULT_MAX_DEPTH,
            cancel_budget: None,
            use_custom_prices: false,
            rounding: MaterialRounding::PerRun,
            time_efficiency: Decimal::ZERO,
            buy_items: BTreeSet::new(),
            memoize: true,
            parallel: false,
            stale_price_days: None,
            price_as_of: None,
        }
    }
}

impl ResolveConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置節點上限
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// 建構器模式：設置深度上限
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 建構器模式：設置時間預算
    pub fn with_cancel_budget(mut self, budget: Duration) -> Self {
        self.cancel_budget = Some(budget);
        self
    }

    /// 建構器模式：設置是否使用自訂價格
    pub fn with_custom_prices(mut self, use_custom_prices: bool) -> Self {
        self.use_custom_prices = use_custom_prices;
        self
    }

    /// 建構器模式：設置捨入方式
    pub fn with_rounding(mut self, rounding: MaterialRounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// 建構器模式：設置時間效率
    pub fn with_time_efficiency(mut self, time_efficiency: Decimal) -> Self {
        self.time_efficiency = time_efficiency;
        self
    }

    /// 建構器模式：添加直接購買的物品
    pub fn with_buy_item(mut self, item_id: ItemId) -> Self {
        self.buy_items.insert(item_id);
        self
    }

    /// 建構器模式：設置單次解析快取
    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// 建構器模式：設置並行展開
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 建構器模式：設置價格過期檢查
    pub fn with_stale_prices(mut self, days: u32, as_of: NaiveDate) -> Self {
        self.stale_price_days = Some(days);
        self.price_as_of = Some(as_of);
        self
    }

    /// 驗證配置
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_nodes == 0 {
            return Err(ChainError::InvalidConfig("max_nodes 必須大於 0".to_string()));
        }

        validate_fraction("time_efficiency", self.time_efficiency)
    }
}

/// 驗證 0-1 之間的效率係數
pub fn validate_fraction(name: &str, value: Decimal) -> crate::Result<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ChainError::InvalidConfig(format!(
            "{} 必須介於 0 與 1 之間，實際為 {}",
            name, value
        )));
    }
    Ok(())
}

/// 材料效率研究等級轉換為效率係數：min(0.02 × 等級, 0.10)
pub fn me_level_to_efficiency(level: u8) -> Decimal {
    (Decimal::new(2, 2) * Decimal::from(level)).min(Decimal::new(10, 2))
}

/// 時間效率研究等級轉換為效率係數：min(0.2 × 等級, 0.8)
pub fn te_level_to_efficiency(level: u8) -> Decimal {
    (Decimal::new(2, 1) * Decimal::from(level)).min(Decimal::new(8, 1))
}
