//! 藍圖查詢轉接層

use prodchain_core::{BlueprintCatalog, BlueprintDefinition, ChainError, ItemId};

/// 藍圖查詢轉接器
///
/// 找不到藍圖不是錯誤：返回 `Ok(None)`，解析器將該物品視為末端材料。
/// 物品是否已發布由目錄負責，這裡只依ID查詢。
#[derive(Clone, Copy)]
pub struct BlueprintLookup<'a> {
    catalog: &'a dyn BlueprintCatalog,
}

impl<'a> BlueprintLookup<'a> {
    pub fn new(catalog: &'a dyn BlueprintCatalog) -> Self {
        Self { catalog }
    }

    /// 查詢並驗證製造定義
    pub fn find_blueprint(
        &self,
        item_id: ItemId,
    ) -> prodchain_core::Result<Option<BlueprintDefinition>> {
        let Some(blueprint) = self.catalog.find_by_product(item_id) else {
            return Ok(None);
        };

        if blueprint.product_id != item_id {
            return Err(ChainError::InvalidBlueprintData {
                item_id,
                reason: format!(
                    "目錄返回的藍圖 {} 產品為 {}",
                    blueprint.blueprint_id, blueprint.product_id
                ),
            });
        }

        blueprint.validate()?;
        Ok(Some(blueprint))
    }

    /// 是否為原料
    pub fn is_raw(&self, item_id: ItemId) -> bool {
        self.catalog.find_by_product(item_id).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodchain_core::InMemoryCatalog;

    struct MislabeledCatalog;

    impl BlueprintCatalog for MislabeledCatalog {
        fn find_by_product(&self, _item_id: ItemId) -> Option<BlueprintDefinition> {
            Some(BlueprintDefinition::new(1, ItemId(999)).with_material(ItemId(2), 1))
        }
    }

    #[test]
    fn test_missing_blueprint_is_terminal() {
        let catalog = InMemoryCatalog::new();
        let lookup = BlueprintLookup::new(&catalog);

        assert_eq!(lookup.find_blueprint(ItemId(1)).unwrap(), None);
        assert!(lookup.is_raw(ItemId(1)));
    }

    #[test]
    fn test_valid_blueprint_is_returned() {
        let mut catalog = InMemoryCatalog::new();
        catalog
            .add_blueprint(BlueprintDefinition::new(7, ItemId(1)).with_material(ItemId(2), 3))
            .unwrap();
        let lookup = BlueprintLookup::new(&catalog);

        let bp = lookup.find_blueprint(ItemId(1)).unwrap().unwrap();
        assert_eq!(bp.blueprint_id, 7);
        assert!(!lookup.is_raw(ItemId(1)));
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let mut catalog = InMemoryCatalog::new();
        catalog
            .add_blueprint(BlueprintDefinition::new(7, ItemId(1)).with_material(ItemId(1), 3))
            .unwrap();
        let lookup = BlueprintLookup::new(&catalog);

        assert!(matches!(
            lookup.find_blueprint(ItemId(1)),
            Err(ChainError::InvalidBlueprintData { item_id, .. }) if item_id == ItemId(1)
        ));
    }

    #[test]
    fn test_mismatched_product_is_rejected() {
        let lookup = BlueprintLookup::new(&MislabeledCatalog);
        assert!(lookup.find_blueprint(ItemId(1)).is_err());
    }
}
