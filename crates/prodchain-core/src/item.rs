//! 物品模型

use serde::{Deserialize, Serialize};
use std::fmt;

/// 物品ID（全域唯一，不可變）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// 物品（唯讀參考資料，由物品目錄提供）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// 物品ID
    pub id: ItemId,

    /// 顯示名稱
    pub name: String,

    /// 分類ID
    pub category_id: u32,

    /// 群組ID
    #[serde(default)]
    pub group_id: Option<u32>,

    /// 是否已發布（未發布的物品仍可依ID查詢藍圖）
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

impl Item {
    /// 創建新的物品
    pub fn new(id: ItemId, name: impl Into<String>, category_id: u32) -> Self {
        Self {
            id,
            name: name.into(),
            category_id,
            group_id: None,
            published: true,
        }
    }

    /// 建構器模式：設置群組
    pub fn with_group(mut self, group_id: u32) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// 建構器模式：設置發布狀態
    pub fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    /// 是否為原料（藍圖目錄中沒有此物品的製造定義）
    pub fn is_raw(&self, blueprints: &dyn crate::BlueprintCatalog) -> bool {
        blueprints.find_by_product(self.id).is_none()
    }
}
