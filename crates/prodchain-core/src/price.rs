//! 價格模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 價格來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceOrigin {
    /// 市場資料
    Market,
    /// 使用者自訂價格
    Custom,
}

/// 單價報價
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// 單價
    pub unit_price: Decimal,

    /// 價格來源
    pub origin: PriceOrigin,

    /// 觀測日期（市場資料快照日）
    pub observed_on: Option<NaiveDate>,
}

impl PriceQuote {
    /// 市場報價
    pub fn market(unit_price: Decimal) -> Self {
        Self {
            unit_price,
            origin: PriceOrigin::Market,
            observed_on: None,
        }
    }

    /// 自訂報價
    pub fn custom(unit_price: Decimal) -> Self {
        Self {
            unit_price,
            origin: PriceOrigin::Custom,
            observed_on: None,
        }
    }

    /// 建構器模式：設置觀測日期
    pub fn observed_on(mut self, date: NaiveDate) -> Self {
        self.observed_on = Some(date);
        self
    }

    /// 報價距指定日期的天數（無觀測日期時為 None）
    pub fn age_days(&self, as_of: NaiveDate) -> Option<i64> {
        self.observed_on.map(|d| (as_of - d).num_days())
    }
}

/// 價格查詢結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceLookup {
    /// 有報價
    Available(PriceQuote),
    /// 無可用價格
    Unavailable,
    /// 結構上無效的原始資料（例如非數值）
    Malformed(String),
}

impl PriceLookup {
    pub fn is_available(&self) -> bool {
        matches!(self, PriceLookup::Available(_))
    }

    pub fn quote(&self) -> Option<&PriceQuote> {
        match self {
            PriceLookup::Available(quote) => Some(quote),
            _ => None,
        }
    }
}
