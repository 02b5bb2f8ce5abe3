//! 成本評估

use chrono::NaiveDate;
use prodchain_core::{
    AggregateResult, BranchCost, ChainError, ChainNode, CostBreakdown, ItemId, MaterialCost,
    PriceLookup, PriceOrigin, PriceQuote, PriceSource, PricingWarning, ResolveConfig,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::aggregator::MaterialAggregator;

/// 成本評估選項
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostOptions {
    /// 自訂價格優先
    pub use_custom_prices: bool,

    /// 市場價格過期天數
    pub stale_price_days: Option<u32>,

    /// 評估基準日
    pub price_as_of: Option<NaiveDate>,
}

impl From<&ResolveConfig> for CostOptions {
    fn from(config: &ResolveConfig) -> Self {
        Self {
            use_custom_prices: config.use_custom_prices,
            stale_price_days: config.stale_price_days,
            price_as_of: config.price_as_of,
        }
    }
}

/// 成本評估結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostEvaluation {
    pub breakdown: CostBreakdown,
    pub warnings: Vec<PricingWarning>,
}

/// 成本評估器
///
/// 缺少價格只會產生警告並以 0 計算；只有結構上無效的價格（非數值）會使整次評估失敗。
pub struct CostEvaluator<'a> {
    prices: &'a dyn PriceSource,
    options: CostOptions,
}

impl<'a> CostEvaluator<'a> {
    pub fn new(prices: &'a dyn PriceSource, options: CostOptions) -> Self {
        Self { prices, options }
    }

    /// 依彙總結果計算成本
    pub fn evaluate(&self, aggregate: &AggregateResult) -> prodchain_core::Result<CostEvaluation> {
        let mut evaluation = CostEvaluation::default();

        for (material_id, quantity) in aggregate.iter() {
            let quote = self.quote(material_id, &mut evaluation.warnings)?;
            let unit_price = quote.map(|q| q.unit_price);
            let cost = match unit_price {
                Some(price) => price
                    .checked_mul(Decimal::from(quantity))
                    .ok_or_else(|| overflow(material_id))?,
                None => Decimal::ZERO,
            };

            evaluation.breakdown.total = evaluation
                .breakdown
                .total
                .checked_add(cost)
                .ok_or_else(|| overflow(material_id))?;
            evaluation.breakdown.contributions.insert(
                material_id,
                MaterialCost {
                    quantity,
                    unit_price,
                    origin: quote.map(|q| q.origin),
                    cost,
                },
            );
        }

        if !evaluation.warnings.is_empty() {
            tracing::warn!(
                "成本評估有 {} 筆定價警告，價格覆蓋率 {}/{}",
                evaluation.warnings.len(),
                evaluation.breakdown.priced_count(),
                evaluation.breakdown.contributions.len()
            );
        }

        Ok(evaluation)
    }

    /// 計算整條生產鏈的成本，含各分支成本與單位成本
    pub fn evaluate_chain(
        &self,
        root: &ChainNode,
        aggregate: &AggregateResult,
    ) -> prodchain_core::Result<CostEvaluation> {
        let mut evaluation = self.evaluate(aggregate)?;

        let unit_prices: BTreeMap<ItemId, Decimal> = evaluation
            .breakdown
            .contributions
            .iter()
            .filter_map(|(&id, c)| c.unit_price.map(|p| (id, p)))
            .collect();

        evaluation.breakdown.branches = root
            .children
            .iter()
            .map(|child| {
                Ok(BranchCost {
                    item_id: child.item_id,
                    quantity: child.quantity,
                    cost: branch_cost(child, &unit_prices)?,
                })
            })
            .collect::<prodchain_core::Result<Vec<_>>>()?;

        if root.quantity > 0 {
            evaluation.breakdown.unit_cost = evaluation
                .breakdown
                .total
                .checked_div(Decimal::from(root.quantity))
                .ok_or_else(|| overflow(root.item_id))?;
        }

        Ok(evaluation)
    }

    /// 取得材料報價；無價格或市場負價時返回 None 並記錄警告
    fn quote(
        &self,
        material_id: ItemId,
        warnings: &mut Vec<PricingWarning>,
    ) -> prodchain_core::Result<Option<PriceQuote>> {
        if self.options.use_custom_prices {
            match self.prices.custom_price(material_id) {
                // 自訂價格為使用者明確指定，允許負值
                PriceLookup::Available(quote) => return Ok(Some(quote)),
                PriceLookup::Malformed(raw) => {
                    return Err(malformed(material_id, &raw, PriceOrigin::Custom))
                }
                PriceLookup::Unavailable => {}
            }
        }

        match self.prices.unit_price(material_id) {
            PriceLookup::Available(quote) if quote.unit_price < Decimal::ZERO => {
                tracing::warn!("物品 {} 市場價格為負值 {}", material_id, quote.unit_price);
                warnings.push(PricingWarning::negative(material_id, quote.unit_price));
                Ok(None)
            }
            PriceLookup::Available(quote) => {
                if let Some(age_days) = self.stale_age(&quote) {
                    warnings.push(PricingWarning::stale(material_id, age_days));
                }
                Ok(Some(quote))
            }
            PriceLookup::Unavailable => {
                tracing::debug!("物品 {} 無可用價格", material_id);
                warnings.push(PricingWarning::missing(material_id));
                Ok(None)
            }
            PriceLookup::Malformed(raw) => Err(malformed(material_id, &raw, PriceOrigin::Market)),
        }
    }

    fn stale_age(&self, quote: &PriceQuote) -> Option<i64> {
        let days = self.options.stale_price_days?;
        let as_of = self.options.price_as_of?;
        quote
            .age_days(as_of)
            .filter(|&age| age > i64::from(days))
    }
}

/// 分支內所有已計價原料的成本合計
fn branch_cost(
    branch: &ChainNode,
    unit_prices: &BTreeMap<ItemId, Decimal>,
) -> prodchain_core::Result<Decimal> {
    let mut cost = Decimal::ZERO;
    for (material_id, quantity) in MaterialAggregator::aggregate(branch)?.iter() {
        let Some(price) = unit_prices.get(&material_id) else {
            continue;
        };
        cost = price
            .checked_mul(Decimal::from(quantity))
            .and_then(|line| cost.checked_add(line))
            .ok_or_else(|| overflow(material_id))?;
    }
    Ok(cost)
}

fn overflow(item_id: ItemId) -> ChainError {
    ChainError::CalculationError(format!("物品 {} 的成本溢位", item_id))
}

fn malformed(item_id: ItemId, raw: &str, origin: PriceOrigin) -> ChainError {
    ChainError::InvalidPriceData {
        item_id,
        reason: format!("{:?} 價格不是數值: {:?}", origin, raw),
    }
}
