//! 外部協作者介面與記憶體實作
//!
//! 解析器只透過 [`ItemCatalog`]、[`BlueprintCatalog`]、[`PriceSource`] 三個介面
//! 存取資料，不依賴任何特定的持久化技術。

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

use crate::{BlueprintDefinition, ChainError, Item, ItemId, PriceLookup, PriceQuote};

/// 物品目錄
pub trait ItemCatalog: Send + Sync {
    /// 依ID查詢物品，找不到時返回 None
    fn get(&self, item_id: ItemId) -> Option<Item>;
}

/// 藍圖目錄
pub trait BlueprintCatalog: Send + Sync {
    /// 依產品ID查詢製造定義，原料返回 None
    fn find_by_product(&self, item_id: ItemId) -> Option<BlueprintDefinition>;
}

/// 價格來源
pub trait PriceSource: Send + Sync {
    /// 市場單價（取得材料的成本）
    fn unit_price(&self, item_id: ItemId) -> PriceLookup;

    /// 使用者自訂價格
    fn custom_price(&self, _item_id: ItemId) -> PriceLookup {
        PriceLookup::Unavailable
    }

    /// 產品的市場售價（利潤分析使用）
    fn market_value(&self, item_id: ItemId) -> PriceLookup {
        self.unit_price(item_id)
    }
}

/// 記憶體物品/藍圖目錄
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: HashMap<ItemId, Item>,
    blueprints: HashMap<ItemId, BlueprintDefinition>,
}

impl InMemoryCatalog {
    /// 創建空目錄
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加物品（同ID覆蓋）
    pub fn add_item(&mut self, item: Item) {
        self.items.insert(item.id, item);
    }

    /// 添加藍圖
    ///
    /// 同一產品只允許一份製造定義，重複添加返回錯誤。
    pub fn add_blueprint(&mut self, blueprint: BlueprintDefinition) -> crate::Result<()> {
        if let Some(existing) = self.blueprints.get(&blueprint.product_id) {
            return Err(ChainError::InvalidBlueprintData {
                item_id: blueprint.product_id,
                reason: format!(
                    "產品已有藍圖 {}，無法再加入藍圖 {}",
                    existing.blueprint_id, blueprint.blueprint_id
                ),
            });
        }

        self.blueprints.insert(blueprint.product_id, blueprint);
        Ok(())
    }

    /// 取代指定產品的藍圖（目錄更新時使用）
    pub fn replace_blueprint(
        &mut self,
        blueprint: BlueprintDefinition,
    ) -> Option<BlueprintDefinition> {
        self.blueprints.insert(blueprint.product_id, blueprint)
    }

    /// 移除指定產品的藍圖
    pub fn remove_blueprint(&mut self, product_id: ItemId) -> Option<BlueprintDefinition> {
        self.blueprints.remove(&product_id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn blueprint_count(&self) -> usize {
        self.blueprints.len()
    }
}

impl ItemCatalog for InMemoryCatalog {
    fn get(&self, item_id: ItemId) -> Option<Item> {
        self.items.get(&item_id).cloned()
    }
}

impl BlueprintCatalog for InMemoryCatalog {
    fn find_by_product(&self, item_id: ItemId) -> Option<BlueprintDefinition> {
        self.blueprints.get(&item_id).cloned()
    }
}

/// 記憶體價格表（市場價格 + 使用者自訂價格）
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    market: HashMap<ItemId, PriceLookup>,
    custom: HashMap<ItemId, PriceLookup>,
    sell: HashMap<ItemId, PriceLookup>,
}

impl PriceBook {
    /// 創建空價格表
    pub fn new() -> Self {
        Self::default()
    }

    /// 設置市場報價
    pub fn set_market_quote(&mut self, item_id: ItemId, quote: PriceQuote) {
        self.market.insert(item_id, PriceLookup::Available(quote));
    }

    /// 設置市場單價
    pub fn set_market_price(&mut self, item_id: ItemId, unit_price: Decimal) {
        self.set_market_quote(item_id, PriceQuote::market(unit_price));
    }

    /// 設置原始市場價格文字，無法解析為數值時記為結構無效
    pub fn set_raw_market_price(&mut self, item_id: ItemId, raw: &str) {
        self.market.insert(item_id, parse_raw(raw, PriceQuote::market));
    }

    /// 設置自訂單價
    pub fn set_custom_price(&mut self, item_id: ItemId, unit_price: Decimal) {
        self.custom
            .insert(item_id, PriceLookup::Available(PriceQuote::custom(unit_price)));
    }

    /// 設置原始自訂價格文字
    pub fn set_raw_custom_price(&mut self, item_id: ItemId, raw: &str) {
        self.custom.insert(item_id, parse_raw(raw, PriceQuote::custom));
    }

    /// 設置產品市場售價
    pub fn set_sell_price(&mut self, item_id: ItemId, unit_price: Decimal) {
        self.sell
            .insert(item_id, PriceLookup::Available(PriceQuote::market(unit_price)));
    }

    /// 清除自訂價格
    pub fn clear_custom_price(&mut self, item_id: ItemId) {
        self.custom.remove(&item_id);
    }
}

fn parse_raw(raw: &str, quote: fn(Decimal) -> PriceQuote) -> PriceLookup {
    match Decimal::from_str(raw.trim()) {
        Ok(price) => PriceLookup::Available(quote(price)),
        Err(_) => PriceLookup::Malformed(raw.to_string()),
    }
}

impl PriceSource for PriceBook {
    fn unit_price(&self, item_id: ItemId) -> PriceLookup {
        self.market
            .get(&item_id)
            .cloned()
            .unwrap_or(PriceLookup::Unavailable)
    }

    fn custom_price(&self, item_id: ItemId) -> PriceLookup {
        self.custom
            .get(&item_id)
            .cloned()
            .unwrap_or(PriceLookup::Unavailable)
    }

    fn market_value(&self, item_id: ItemId) -> PriceLookup {
        match self.sell.get(&item_id) {
            Some(lookup) => lookup.clone(),
            None => self.unit_price(item_id),
        }
    }
}

/// 目錄快照（JSON 匯入格式）
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub items: Vec<Item>,

    #[serde(default)]
    pub blueprints: Vec<BlueprintDefinition>,

    #[serde(default)]
    pub prices: Vec<PriceEntry>,
}

/// 快照中的價格條目（保留原始文字，由價格表判斷是否為數值）
#[derive(Debug, Clone, Deserialize)]
pub struct PriceEntry {
    pub item_id: ItemId,

    #[serde(default)]
    pub market: Option<serde_json::Value>,

    #[serde(default)]
    pub custom: Option<serde_json::Value>,

    #[serde(default)]
    pub sell: Option<Decimal>,
}

impl CatalogSnapshot {
    /// 從 JSON 文字解析快照
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ChainError::InvalidConfig(format!("目錄快照解析失敗: {}", e)))
    }

    /// 建立記憶體目錄與價格表
    pub fn into_parts(self) -> crate::Result<(InMemoryCatalog, PriceBook)> {
        let mut catalog = InMemoryCatalog::new();
        for item in self.items {
            catalog.add_item(item);
        }
        for blueprint in self.blueprints {
            catalog.add_blueprint(blueprint)?;
        }

        let mut prices = PriceBook::new();
        for entry in self.prices {
            if let Some(raw) = entry.market {
                prices.set_raw_market_price(entry.item_id, &raw_text(&raw));
            }
            if let Some(raw) = entry.custom {
                prices.set_raw_custom_price(entry.item_id, &raw_text(&raw));
            }
            if let Some(sell) = entry.sell {
                prices.set_sell_price(entry.item_id, sell);
            }
        }

        Ok((catalog, prices))
    }
}

fn raw_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PriceOrigin;

    #[test]
    fn test_duplicate_blueprint_rejected() {
        let mut catalog = InMemoryCatalog::new();
        catalog
            .add_blueprint(BlueprintDefinition::new(1, ItemId(10)).with_material(ItemId(20), 1))
            .unwrap();

        let err = catalog
            .add_blueprint(BlueprintDefinition::new(2, ItemId(10)).with_material(ItemId(21), 1))
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::InvalidBlueprintData { item_id, .. } if item_id == ItemId(10)
        ));

        // 仍保留第一份定義
        assert_eq!(catalog.find_by_product(ItemId(10)).unwrap().blueprint_id, 1);
    }

    #[test]
    fn test_raw_item_detection() {
        let mut catalog = InMemoryCatalog::new();
        let plate = Item::new(ItemId(10), "Steel Plates", 4);
        let ore = Item::new(ItemId(20), "Iron Ore", 4);
        catalog.add_item(plate.clone());
        catalog.add_item(ore.clone());
        catalog
            .add_blueprint(BlueprintDefinition::new(1, ItemId(10)).with_material(ItemId(20), 4))
            .unwrap();

        assert!(!plate.is_raw(&catalog));
        assert!(ore.is_raw(&catalog));
    }

    #[test]
    fn test_price_book_raw_values() {
        let mut prices = PriceBook::new();
        prices.set_raw_market_price(ItemId(1), " 12.5 ");
        prices.set_raw_market_price(ItemId(2), "n/a");
        prices.set_raw_custom_price(ItemId(1), "9");

        assert_eq!(
            prices.unit_price(ItemId(1)).quote().map(|q| q.unit_price),
            Some(Decimal::new(125, 1))
        );
        assert_eq!(prices.unit_price(ItemId(2)), PriceLookup::Malformed("n/a".to_string()));
        assert_eq!(prices.unit_price(ItemId(3)), PriceLookup::Unavailable);

        let custom = prices.custom_price(ItemId(1));
        assert_eq!(custom.quote().map(|q| q.origin), Some(PriceOrigin::Custom));

        prices.clear_custom_price(ItemId(1));
        assert_eq!(prices.custom_price(ItemId(1)), PriceLookup::Unavailable);
    }

    #[test]
    fn test_market_value_falls_back_to_unit_price() {
        let mut prices = PriceBook::new();
        prices.set_market_price(ItemId(1), Decimal::from(100));
        assert_eq!(
            prices.market_value(ItemId(1)).quote().map(|q| q.unit_price),
            Some(Decimal::from(100))
        );

        prices.set_sell_price(ItemId(1), Decimal::from(140));
        assert_eq!(
            prices.market_value(ItemId(1)).quote().map(|q| q.unit_price),
            Some(Decimal::from(140))
        );
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "items": [
                {"id": 10, "name": "Steel Plates", "category_id": 4},
                {"id": 20, "name": "Iron Ore", "category_id": 4}
            ],
            "blueprints": [
                {"blueprint_id": 1, "product_id": 10, "output_quantity": 2,
                 "time_per_run": 60, "materials": [{"material_id": 20, "quantity": 5}]}
            ],
            "prices": [
                {"item_id": 20, "market": "3.25"},
                {"item_id": 10, "market": 40, "sell": "45"}
            ]
        }"#;

        let (catalog, prices) = CatalogSnapshot::from_json(json).unwrap().into_parts().unwrap();

        assert_eq!(catalog.item_count(), 2);
        assert_eq!(catalog.blueprint_count(), 1);
        assert_eq!(
            prices.unit_price(ItemId(20)).quote().map(|q| q.unit_price),
            Some(Decimal::new(325, 2))
        );
        assert_eq!(
            prices.unit_price(ItemId(10)).quote().map(|q| q.unit_price),
            Some(Decimal::from(40))
        );
        assert_eq!(
            prices.market_value(ItemId(10)).quote().map(|q| q.unit_price),
            Some(Decimal::from(45))
        );
    }

    #[test]
    fn test_snapshot_rejects_invalid_json() {
        assert!(matches!(
            CatalogSnapshot::from_json("{ not json"),
            Err(ChainError::InvalidConfig(_))
        ));
    }
}
