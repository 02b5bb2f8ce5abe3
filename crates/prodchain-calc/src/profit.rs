//! 製造利潤分析

use prodchain_core::{ChainError, ItemId, PriceLookup, PriceSource};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ChainResult;

/// 利潤分析結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitAnalysis {
    pub item_id: ItemId,

    /// 製造數量
    pub quantity: u64,

    /// 生產總成本
    pub production_cost: Decimal,

    /// 產品單位售價
    pub market_price: Decimal,

    /// 市場總價值（售價 × 數量）
    pub market_value: Decimal,

    /// 利潤
    pub profit: Decimal,

    /// 利潤率（%），成本為 0 時為 None
    pub profit_margin: Option<Decimal>,

    /// 每小時利潤，製造時間為 0 時為 None
    pub profit_per_hour: Option<Decimal>,

    /// 總製造時間（秒）
    pub production_time: u64,
}

impl ProfitAnalysis {
    pub fn is_profitable(&self) -> bool {
        self.profit > Decimal::ZERO
    }
}

/// 利潤分析器
pub struct ProfitAnalyzer;

impl ProfitAnalyzer {
    /// 分析製造利潤
    ///
    /// 產品沒有正的市場售價時返回 `Ok(None)`；售價資料結構無效時返回錯誤。
    pub fn analyze(
        result: &ChainResult,
        prices: &dyn PriceSource,
    ) -> prodchain_core::Result<Option<ProfitAnalysis>> {
        let item_id = result.root.item_id;
        let quantity = result.root.quantity;

        let market_price = match prices.market_value(item_id) {
            PriceLookup::Available(quote) if quote.unit_price > Decimal::ZERO => quote.unit_price,
            PriceLookup::Available(_) | PriceLookup::Unavailable => {
                tracing::warn!("物品 {} 沒有有效的市場售價，無法分析利潤", item_id);
                return Ok(None);
            }
            PriceLookup::Malformed(raw) => {
                return Err(ChainError::InvalidPriceData {
                    item_id,
                    reason: format!("售價不是數值: {:?}", raw),
                })
            }
        };

        let overflow = |what: &str| {
            ChainError::CalculationError(format!("物品 {} 的{}溢位", item_id, what))
        };

        let production_cost = result.cost.total;
        let market_value = market_price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| overflow("市場價值"))?;
        let profit = market_value
            .checked_sub(production_cost)
            .ok_or_else(|| overflow("利潤"))?;

        let profit_margin = if production_cost > Decimal::ZERO {
            let margin = profit
                .checked_div(production_cost)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .ok_or_else(|| overflow("利潤率"))?;
            Some(margin)
        } else {
            None
        };

        let production_time = result.total_production_time;
        let profit_per_hour = if production_time > 0 {
            let hourly = profit
                .checked_div(Decimal::from(production_time))
                .and_then(|per_second| per_second.checked_mul(Decimal::from(3600)))
                .ok_or_else(|| overflow("每小時利潤"))?;
            Some(hourly)
        } else {
            None
        };

        tracing::debug!(
            "物品 {} 利潤分析: 成本 {}，售價 {}，利潤 {}",
            item_id,
            production_cost,
            market_price,
            profit
        );

        Ok(Some(ProfitAnalysis {
            item_id,
            quantity,
            production_cost,
            market_price,
            market_value,
            profit,
            profit_margin,
            profit_per_hour,
            production_time,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodchain_core::{AggregateResult, ChainNode, CostBreakdown, PriceBook};

    fn result(cost: Decimal, time: u64) -> ChainResult {
        let mut root = ChainNode::terminal(ItemId(1), 10);
        root.production_time = time;
        ChainResult {
            root,
            aggregate: AggregateResult::new(),
            cost: CostBreakdown {
                total: cost,
                ..CostBreakdown::default()
            },
            warnings: Vec::new(),
            total_production_time: time,
        }
    }

    #[test]
    fn test_profit_analysis() {
        let mut prices = PriceBook::new();
        prices.set_sell_price(ItemId(1), Decimal::from(15));

        let analysis = ProfitAnalyzer::analyze(&result(Decimal::from(100), 7200), &prices)
            .unwrap()
            .unwrap();

        assert_eq!(analysis.market_value, Decimal::from(150));
        assert_eq!(analysis.profit, Decimal::from(50));
        assert_eq!(analysis.profit_margin, Some(Decimal::from(50)));
        assert_eq!(analysis.profit_per_hour, Some(Decimal::from(25)));
        assert!(analysis.is_profitable());
    }

    #[test]
    fn test_zero_cost_and_time_have_no_ratios() {
        let mut prices = PriceBook::new();
        prices.set_market_price(ItemId(1), Decimal::from(2));

        let analysis = ProfitAnalyzer::analyze(&result(Decimal::ZERO, 0), &prices)
            .unwrap()
            .unwrap();

        assert_eq!(analysis.profit, Decimal::from(20));
        assert_eq!(analysis.profit_margin, None);
        assert_eq!(analysis.profit_per_hour, None);
    }

    #[test]
    fn test_no_market_price_means_no_analysis() {
        let prices = PriceBook::new();
        assert_eq!(ProfitAnalyzer::analyze(&result(Decimal::ONE, 1), &prices).unwrap(), None);

        let mut zero = PriceBook::new();
        zero.set_market_price(ItemId(1), Decimal::ZERO);
        assert_eq!(ProfitAnalyzer::analyze(&result(Decimal::ONE, 1), &zero).unwrap(), None);
    }

    #[test]
    fn test_margin_overflow_is_an_error() {
        // 10 × 1e27 的價值除以 0.001 的成本超出 Decimal 範圍
        let mut prices = PriceBook::new();
        prices.set_sell_price(ItemId(1), Decimal::from_i128_with_scale(10i128.pow(27), 0));

        let err = ProfitAnalyzer::analyze(&result(Decimal::new(1, 3), 0), &prices).unwrap_err();

        assert!(matches!(err, ChainError::CalculationError(msg) if msg.contains("利潤率")));
    }

    #[test]
    fn test_profit_overflow_is_an_error() {
        let mut prices = PriceBook::new();
        prices.set_sell_price(ItemId(1), Decimal::MAX / Decimal::from(10));

        let err = ProfitAnalyzer::analyze(&result(-Decimal::MAX, 0), &prices).unwrap_err();

        assert!(matches!(err, ChainError::CalculationError(msg) if msg.contains("利潤")));
    }

    #[test]
    fn test_malformed_sell_price_fails() {
        let mut prices = PriceBook::new();
        prices.set_raw_market_price(ItemId(1), "??");
        assert!(ProfitAnalyzer::analyze(&result(Decimal::ONE, 1), &prices).is_err());
    }
}
