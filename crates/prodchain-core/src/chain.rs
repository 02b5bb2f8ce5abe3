//! 生產鏈結果模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ChainError, ItemId, PriceOrigin};

/// 末端材料需求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialRequirement {
    /// 材料物品ID
    pub material_id: ItemId,

    /// 需求數量（已捨入）
    pub quantity: u64,
}

impl MaterialRequirement {
    pub fn new(material_id: ItemId, quantity: u64) -> Self {
        Self {
            material_id,
            quantity,
        }
    }
}

/// 生產鏈節點（一個製造步驟）
///
/// 子節點與末端材料皆依藍圖宣告順序排列。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainNode {
    /// 物品ID
    pub item_id: ItemId,

    /// 物品名稱（物品目錄中不存在時為 None）
    pub item_name: Option<String>,

    /// 使用的藍圖ID（末端節點為 None）
    pub blueprint_id: Option<u64>,

    /// 需求產出數量
    pub quantity: u64,

    /// 製造輪數
    pub runs: u64,

    /// 實際產出數量（輪數 × 每輪產出）
    pub produced_quantity: u64,

    /// 本節點總製造時間（秒）
    pub production_time: u64,

    /// 有藍圖的材料（需繼續製造）
    pub children: Vec<ChainNode>,

    /// 無藍圖的材料（直接採購）
    pub terminals: Vec<MaterialRequirement>,
}

impl ChainNode {
    /// 創建末端節點（物品本身即為原料）
    pub fn terminal(item_id: ItemId, quantity: u64) -> Self {
        Self {
            item_id,
            item_name: None,
            blueprint_id: None,
            quantity,
            runs: 0,
            produced_quantity: 0,
            production_time: 0,
            children: Vec::new(),
            terminals: vec![MaterialRequirement::new(item_id, quantity)],
        }
    }

    /// 建構器模式：設置名稱
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.item_name = name;
        self
    }

    /// 是否為末端節點（沒有使用藍圖）
    pub fn is_terminal(&self) -> bool {
        self.blueprint_id.is_none()
    }

    /// 超額產出（整輪製造造成）
    pub fn excess(&self) -> u64 {
        self.produced_quantity.saturating_sub(self.quantity)
    }

    /// 子樹中製造節點的數量（含本節點）
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if !node.is_terminal() {
                count += 1;
            }
            stack.extend(node.children.iter());
        }
        count
    }

    /// 子樹高度（葉節點為 0）
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// 子樹總製造時間（秒）
    pub fn total_production_time(&self) -> crate::Result<u64> {
        let mut total = 0u64;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total = total.checked_add(node.production_time).ok_or_else(|| {
                ChainError::CalculationError(format!("物品 {} 的總製造時間溢位", self.item_id))
            })?;
            stack.extend(node.children.iter());
        }
        Ok(total)
    }

    /// 子樹中出現過的所有物品ID（製造節點與末端材料）
    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut ids = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            ids.push(node.item_id);
            ids.extend(node.terminals.iter().map(|t| t.material_id));
            stack.extend(node.children.iter());
        }
        ids.sort();
        ids.dedup();
        ids
    }
}

/// 原料彙總（原料ID → 總需求量）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub materials: BTreeMap<ItemId, u64>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加一筆需求，總量溢位時返回錯誤
    pub fn add(&mut self, material_id: ItemId, quantity: u64) -> crate::Result<()> {
        let entry = self.materials.entry(material_id).or_insert(0);
        *entry = entry.checked_add(quantity).ok_or_else(|| {
            ChainError::CalculationError(format!("原料 {} 的需求總量溢位", material_id))
        })?;
        Ok(())
    }

    /// 合併另一份彙總
    pub fn merge(&mut self, other: &AggregateResult) -> crate::Result<()> {
        for (&material_id, &quantity) in &other.materials {
            self.add(material_id, quantity)?;
        }
        Ok(())
    }

    /// 從 (原料ID, 數量) 序列建立彙總
    pub fn try_from_entries(
        entries: impl IntoIterator<Item = (ItemId, u64)>,
    ) -> crate::Result<Self> {
        let mut result = AggregateResult::new();
        for (material_id, quantity) in entries {
            result.add(material_id, quantity)?;
        }
        Ok(result)
    }

    pub fn get(&self, material_id: ItemId) -> Option<u64> {
        self.materials.get(&material_id).copied()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u64)> + '_ {
        self.materials.iter().map(|(&id, &qty)| (id, qty))
    }

    /// 所有原料總件數
    pub fn total_units(&self) -> u128 {
        self.materials.values().map(|&qty| u128::from(qty)).sum()
    }
}

/// 單一材料的成本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialCost {
    /// 需求數量
    pub quantity: u64,

    /// 採用的單價（無價格時為 None）
    pub unit_price: Option<Decimal>,

    /// 價格來源
    pub origin: Option<PriceOrigin>,

    /// 成本貢獻
    pub cost: Decimal,
}

/// 分支成本（根節點直接子件的彙總成本）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCost {
    /// 中間產品ID
    pub item_id: ItemId,

    /// 中間產品需求數量
    pub quantity: u64,

    /// 子樹所有原料成本
    pub cost: Decimal,
}

/// 成本明細
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// 總成本
    pub total: Decimal,

    /// 每單位產品成本
    pub unit_cost: Decimal,

    /// 各材料成本
    pub contributions: BTreeMap<ItemId, MaterialCost>,

    /// 各分支成本（依藍圖宣告順序）
    pub branches: Vec<BranchCost>,
}

impl CostBreakdown {
    /// 有價格的材料數量
    pub fn priced_count(&self) -> usize {
        self.contributions
            .values()
            .filter(|c| c.unit_price.is_some())
            .count()
    }

    /// 是否所有材料皆有價格
    pub fn fully_priced(&self) -> bool {
        self.priced_count() == self.contributions.len()
    }
}

/// 定價警告類型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingWarningKind {
    /// 無可用價格
    MissingPrice,
    /// 市場價格為負值
    NegativePrice(Decimal),
    /// 市場價格過期
    StalePrice { age_days: i64 },
}

/// 警告嚴重度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}

/// 定價警告（非致命，成本估算仍會完成）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingWarning {
    pub item_id: ItemId,
    pub kind: PricingWarningKind,
    pub severity: WarningSeverity,
    pub message: String,
}

impl PricingWarning {
    pub fn missing(item_id: ItemId) -> Self {
        Self {
            item_id,
            kind: PricingWarningKind::MissingPrice,
            severity: WarningSeverity::Warning,
            message: format!("物品 {} 無可用價格，以 0 計算成本", item_id),
        }
    }

    pub fn negative(item_id: ItemId, price: Decimal) -> Self {
        Self {
            item_id,
            kind: PricingWarningKind::NegativePrice(price),
            severity: WarningSeverity::Error,
            message: format!("物品 {} 的市場價格為負值 {}，以 0 計算成本", item_id, price),
        }
    }

    pub fn stale(item_id: ItemId, age_days: i64) -> Self {
        Self {
            item_id,
            kind: PricingWarningKind::StalePrice { age_days },
            severity: WarningSeverity::Info,
            message: format!("物品 {} 的市場價格已 {} 天未更新", item_id, age_days),
        }
    }

    /// 此警告是否表示該材料未被計價
    pub fn is_unpriced(&self) -> bool {
        !matches!(self.kind, PricingWarningKind::StalePrice { .. })
    }
}
