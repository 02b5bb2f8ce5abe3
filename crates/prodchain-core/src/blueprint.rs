//! 藍圖（製造定義）模型

use serde::{Deserialize, Serialize};

use crate::{ChainError, ItemId};

/// 藍圖材料（每輪用量）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintMaterial {
    /// 材料物品ID
    pub material_id: ItemId,

    /// 每輪用量
    pub quantity: u64,
}

impl BlueprintMaterial {
    pub fn new(material_id: ItemId, quantity: u64) -> Self {
        Self {
            material_id,
            quantity,
        }
    }
}

/// 藍圖製造定義
///
/// 每個產品最多對應一份製造定義；材料順序即目錄宣告順序，
/// 解析時會原樣保留在生產鏈的子節點順序中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintDefinition {
    /// 藍圖ID
    pub blueprint_id: u64,

    /// 產品物品ID
    pub product_id: ItemId,

    /// 材料清單（依目錄宣告順序）
    pub materials: Vec<BlueprintMaterial>,

    /// 每輪產出數量
    pub output_quantity: u64,

    /// 每輪製造時間（秒）
    #[serde(default)]
    pub time_per_run: u64,
}

impl BlueprintDefinition {
    /// 創建新的藍圖定義（每輪產出 1，無材料）
    pub fn new(blueprint_id: u64, product_id: ItemId) -> Self {
        Self {
            blueprint_id,
            product_id,
            materials: Vec::new(),
            output_quantity: 1,
            time_per_run: 0,
        }
    }

    /// 建構器模式：添加材料
    pub fn with_material(mut self, material_id: ItemId, quantity: u64) -> Self {
        self.materials.push(BlueprintMaterial::new(material_id, quantity));
        self
    }

    /// 建構器模式：設置每輪產出
    pub fn with_output_quantity(mut self, quantity: u64) -> Self {
        self.output_quantity = quantity;
        self
    }

    /// 建構器模式：設置每輪製造時間（秒）
    pub fn with_time_per_run(mut self, seconds: u64) -> Self {
        self.time_per_run = seconds;
        self
    }

    /// 是否直接消耗指定材料
    pub fn consumes(&self, material_id: ItemId) -> bool {
        self.materials.iter().any(|m| m.material_id == material_id)
    }

    /// 驗證資料完整性
    ///
    /// 每輪產出與所有材料用量必須大於 0，且材料清單不得包含自身產品。
    pub fn validate(&self) -> crate::Result<()> {
        if self.output_quantity == 0 {
            return Err(self.invalid(format!(
                "藍圖 {} 每輪產出數量為 0",
                self.blueprint_id
            )));
        }

        for material in &self.materials {
            if material.material_id == self.product_id {
                return Err(self.invalid(format!(
                    "藍圖 {} 的材料清單包含自身產品",
                    self.blueprint_id
                )));
            }

            if material.quantity == 0 {
                return Err(self.invalid(format!(
                    "藍圖 {} 的材料 {} 每輪用量為 0",
                    self.blueprint_id, material.material_id
                )));
            }
        }

        Ok(())
    }

    fn invalid(&self, reason: String) -> ChainError {
        ChainError::InvalidBlueprintData {
            item_id: self.product_id,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blueprint_builder_keeps_declared_order() {
        let bp = BlueprintDefinition::new(900, ItemId(1))
            .with_material(ItemId(30), 5)
            .with_material(ItemId(10), 2)
            .with_output_quantity(3)
            .with_time_per_run(600);

        let order: Vec<_> = bp.materials.iter().map(|m| m.material_id).collect();
        assert_eq!(order, vec![ItemId(30), ItemId(10)]);
        assert_eq!(bp.output_quantity, 3);
        assert_eq!(bp.time_per_run, 600);
        assert!(bp.consumes(ItemId(10)));
        assert!(!bp.consumes(ItemId(11)));
        assert!(bp.validate().is_ok());
    }

    #[test]
    fn test_zero_output_is_invalid() {
        let bp = BlueprintDefinition::new(1, ItemId(5))
            .with_material(ItemId(6), 1)
            .with_output_quantity(0);

        assert!(matches!(
            bp.validate(),
            Err(ChainError::InvalidBlueprintData { item_id, .. }) if item_id == ItemId(5)
        ));
    }

    #[test]
    fn test_zero_material_quantity_is_invalid() {
        let bp = BlueprintDefinition::new(1, ItemId(5)).with_material(ItemId(6), 0);
        assert!(bp.validate().is_err());
    }

    #[test]
    fn test_self_referencing_material_is_invalid() {
        let bp = BlueprintDefinition::new(1, ItemId(5))
            .with_material(ItemId(6), 1)
            .with_material(ItemId(5), 1);

        let err = bp.validate().unwrap_err();
        assert!(matches!(err, ChainError::InvalidBlueprintData { .. }));
        assert!(err.to_string().contains("自身產品"));
    }
}
