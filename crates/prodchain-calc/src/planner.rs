//! 生產鏈規劃器：串接解析、彙總與成本評估

use prodchain_core::{
    validate_fraction, BlueprintCatalog, ChainError, ChainNode, ItemCatalog, ItemId, PriceSource,
    ResolveConfig,
};
use rust_decimal::Decimal;
use std::time::Instant;

use crate::aggregator::MaterialAggregator;
use crate::cost::{CostEvaluator, CostOptions};
use crate::resolver::ChainResolver;
use crate::ChainResult;

/// 生產鏈規劃器
pub struct ChainPlanner<'a> {
    items: &'a dyn ItemCatalog,
    blueprints: &'a dyn BlueprintCatalog,
    prices: &'a dyn PriceSource,
}

impl<'a> ChainPlanner<'a> {
    /// 創建新的規劃器
    pub fn new(
        items: &'a dyn ItemCatalog,
        blueprints: &'a dyn BlueprintCatalog,
        prices: &'a dyn PriceSource,
    ) -> Self {
        Self {
            items,
            blueprints,
            prices,
        }
    }

    /// 價格來源
    pub fn prices(&self) -> &'a dyn PriceSource {
        self.prices
    }

    /// 完整解析：展開生產樹、彙總原料並評估成本
    pub fn resolve_chain(
        &self,
        target: ItemId,
        quantity: u64,
        efficiency: Decimal,
        config: &ResolveConfig,
    ) -> prodchain_core::Result<ChainResult> {
        let start = Instant::now();
        tracing::info!(
            "開始解析生產鏈: 物品 {}，數量 {}，材料效率 {}",
            target,
            quantity,
            efficiency
        );

        let root = self.build_tree(target, quantity, efficiency, config)?;
        let result = self.assemble(root, config)?;

        tracing::info!(
            "生產鏈解析完成: {} 種原料，總成本 {}，{} 筆警告，耗時 {} 毫秒",
            result.aggregate.len(),
            result.cost.total,
            result.warnings.len(),
            start.elapsed().as_millis()
        );

        Ok(result)
    }

    /// 檢查解析請求：配置、材料效率、數量與目標物品是否存在
    pub fn check_request(
        &self,
        target: ItemId,
        quantity: u64,
        efficiency: Decimal,
        config: &ResolveConfig,
    ) -> prodchain_core::Result<()> {
        config.validate()?;
        validate_fraction("材料效率", efficiency)?;
        if quantity == 0 {
            return Err(ChainError::InvalidConfig("目標數量必須至少為 1".to_string()));
        }
        if self.items.get(target).is_none() {
            return Err(ChainError::ItemNotFound(target));
        }
        Ok(())
    }

    /// 只展開生產樹（不評估成本）
    pub fn build_tree(
        &self,
        target: ItemId,
        quantity: u64,
        efficiency: Decimal,
        config: &ResolveConfig,
    ) -> prodchain_core::Result<ChainNode> {
        self.check_request(target, quantity, efficiency, config)?;

        ChainResolver::new(self.blueprints, config, efficiency)
            .with_item_catalog(self.items)
            .resolve(target, quantity)
    }

    /// 從已展開的生產樹計算彙總與成本
    ///
    /// 價格每次都重新查詢，因此可搭配快取的生產樹使用。
    pub fn assemble(
        &self,
        root: ChainNode,
        config: &ResolveConfig,
    ) -> prodchain_core::Result<ChainResult> {
        let aggregate = MaterialAggregator::aggregate(&root)?;
        tracing::debug!(
            "原料彙總完成: {} 種，共 {} 單位",
            aggregate.len(),
            aggregate.total_units()
        );

        let evaluation = CostEvaluator::new(self.prices, CostOptions::from(config))
            .evaluate_chain(&root, &aggregate)?;
        let total_production_time = root.total_production_time()?;

        Ok(ChainResult {
            root,
            aggregate,
            cost: evaluation.breakdown,
            warnings: evaluation.warnings,
            total_production_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodchain_core::{BlueprintDefinition, InMemoryCatalog, Item, PriceBook, PricingWarningKind};

    const SHIP: ItemId = ItemId(1);
    const PART: ItemId = ItemId(2);
    const ORE: ItemId = ItemId(10);
    const GAS: ItemId = ItemId(11);

    fn catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        for (id, name) in [(SHIP, "Ship"), (PART, "Part"), (ORE, "Ore"), (GAS, "Gas")] {
            catalog.add_item(Item::new(id, name, 6));
        }
        catalog
            .add_blueprint(
                BlueprintDefinition::new(100, SHIP)
                    .with_material(PART, 2)
                    .with_material(GAS, 5)
                    .with_time_per_run(60),
            )
            .unwrap();
        catalog
            .add_blueprint(
                BlueprintDefinition::new(200, PART)
                    .with_material(ORE, 10)
                    .with_output_quantity(2)
                    .with_time_per_run(30),
            )
            .unwrap();
        catalog
    }

    fn prices() -> PriceBook {
        let mut prices = PriceBook::new();
        prices.set_market_price(ORE, Decimal::from(3));
        prices
    }

    #[test]
    fn test_resolve_chain_end_to_end() {
        let catalog = catalog();
        let prices = prices();
        let planner = ChainPlanner::new(&catalog, &catalog, &prices);

        let result = planner
            .resolve_chain(SHIP, 3, Decimal::ZERO, &ResolveConfig::default())
            .unwrap();

        // SHIP ×3 → PART ×6（3 輪，30 ORE）+ GAS ×15
        assert_eq!(result.aggregate.get(ORE), Some(30));
        assert_eq!(result.aggregate.get(GAS), Some(15));
        assert_eq!(result.cost.total, Decimal::from(90));
        assert_eq!(result.cost.unit_cost, Decimal::from(30));
        assert_eq!(result.total_production_time, 3 * 60 + 3 * 30);
        assert_eq!(result.root.item_name.as_deref(), Some("Ship"));

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].item_id, GAS);
        assert_eq!(result.warnings[0].kind, PricingWarningKind::MissingPrice);
    }

    #[test]
    fn test_unknown_target() {
        let catalog = catalog();
        let prices = prices();
        let planner = ChainPlanner::new(&catalog, &catalog, &prices);

        assert_eq!(
            planner.resolve_chain(ItemId(999), 1, Decimal::ZERO, &ResolveConfig::default()),
            Err(ChainError::ItemNotFound(ItemId(999)))
        );
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let catalog = catalog();
        let prices = prices();
        let planner = ChainPlanner::new(&catalog, &catalog, &prices);
        let config = ResolveConfig::default();

        assert!(matches!(
            planner.resolve_chain(SHIP, 0, Decimal::ZERO, &config),
            Err(ChainError::InvalidConfig(_))
        ));
        assert!(matches!(
            planner.resolve_chain(SHIP, 1, Decimal::new(15, 1), &config),
            Err(ChainError::InvalidConfig(_))
        ));
        assert!(matches!(
            planner.resolve_chain(SHIP, 1, Decimal::ZERO, &config.clone().with_max_nodes(0)),
            Err(ChainError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_material_total_overflow_fails_resolution() {
        // SHIP ← PART + GAS，兩者各需要 2^63 ORE
        let half = 1u64 << 63;
        let mut catalog = InMemoryCatalog::new();
        for id in [SHIP, PART, GAS, ORE] {
            catalog.add_item(Item::new(id, "x", 1));
        }
        catalog
            .add_blueprint(
                BlueprintDefinition::new(1, SHIP)
                    .with_material(PART, 1)
                    .with_material(GAS, 1),
            )
            .unwrap();
        catalog
            .add_blueprint(BlueprintDefinition::new(2, PART).with_material(ORE, half))
            .unwrap();
        catalog
            .add_blueprint(BlueprintDefinition::new(3, GAS).with_material(ORE, half))
            .unwrap();
        let prices = PriceBook::new();

        let err = ChainPlanner::new(&catalog, &catalog, &prices)
            .resolve_chain(SHIP, 1, Decimal::ZERO, &ResolveConfig::default())
            .unwrap_err();

        assert!(
            matches!(err, ChainError::CalculationError(msg) if msg.contains(&ORE.to_string()))
        );
    }

    #[test]
    fn test_assemble_reprices_existing_tree() {
        let catalog = catalog();
        let prices = prices();
        let planner = ChainPlanner::new(&catalog, &catalog, &prices);
        let config = ResolveConfig::default();
        let tree = planner.build_tree(SHIP, 1, Decimal::ZERO, &config).unwrap();

        let mut cheaper = PriceBook::new();
        cheaper.set_market_price(ORE, Decimal::ONE);
        cheaper.set_market_price(GAS, Decimal::ONE);
        let repriced = ChainPlanner::new(&catalog, &catalog, &cheaper)
            .assemble(tree, &config)
            .unwrap();

        assert_eq!(repriced.cost.total, Decimal::from(10 + 5));
        assert!(repriced.warnings.is_empty());
    }
}
