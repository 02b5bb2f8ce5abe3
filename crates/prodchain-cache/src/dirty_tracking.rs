//! 髒標記追蹤

use prodchain_core::ItemId;
use std::collections::BTreeSet;

/// 髒標記追蹤器
///
/// 記錄自上次同步以來藍圖或物品資料有變動的物品。
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    dirty_items: BTreeSet<ItemId>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記物品為髒
    pub fn mark_dirty(&mut self, item_id: ItemId) {
        self.dirty_items.insert(item_id);
    }

    /// 檢查物品是否為髒
    pub fn is_dirty(&self, item_id: ItemId) -> bool {
        self.dirty_items.contains(&item_id)
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.dirty_items.clear();
    }

    /// 獲取所有髒物品（已排序）
    pub fn dirty_items(&self) -> Vec<ItemId> {
        self.dirty_items.iter().copied().collect()
    }

    /// 指定的物品中是否有任一為髒
    pub fn intersects(&self, item_ids: &[ItemId]) -> bool {
        item_ids.iter().any(|id| self.dirty_items.contains(id))
    }

    pub fn is_empty(&self) -> bool {
        self.dirty_items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_clear() {
        let mut tracker = DirtyTracker::new();
        tracker.mark_dirty(ItemId(5));
        tracker.mark_dirty(ItemId(2));
        tracker.mark_dirty(ItemId(5));

        assert!(tracker.is_dirty(ItemId(5)));
        assert!(!tracker.is_dirty(ItemId(3)));
        assert_eq!(tracker.dirty_items(), vec![ItemId(2), ItemId(5)]);
        assert!(tracker.intersects(&[ItemId(1), ItemId(2)]));
        assert!(!tracker.intersects(&[ItemId(1), ItemId(3)]));

        tracker.clear();
        assert!(tracker.is_empty());
    }
}
