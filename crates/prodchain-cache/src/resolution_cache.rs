//! 跨次呼叫的生產樹快取
//!
//! 只快取展開後的生產樹；彙總與成本每次命中都重新計算，價格變動不需要失效。

use prodchain_calc::{ChainPlanner, ChainResult};
use prodchain_core::{ChainNode, ItemId, MaterialRounding, ResolveConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::dirty_tracking::DirtyTracker;

/// 快取鍵：決定生產樹形狀的全部輸入
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainKey {
    pub item_id: ItemId,
    pub quantity: u64,
    pub efficiency: Decimal,
    pub rounding: MaterialRounding,
    pub time_efficiency: Decimal,
    pub buy_items: Vec<ItemId>,
}

impl ChainKey {
    pub fn new(
        item_id: ItemId,
        quantity: u64,
        efficiency: Decimal,
        config: &ResolveConfig,
    ) -> Self {
        Self {
            item_id,
            quantity,
            efficiency: efficiency.normalize(),
            rounding: config.rounding,
            time_efficiency: config.time_efficiency.normalize(),
            buy_items: config.buy_items.iter().copied().collect(),
        }
    }
}

/// 快取統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// 命中率（無查詢時為 0）
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

#[derive(Debug, Clone)]
struct CachedTree {
    root: ChainNode,
    item_ids: Vec<ItemId>,
}

/// 生產樹快取
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<ChainKey, CachedTree>,
    tracker: DirtyTracker,
    hits: u64,
    misses: u64,
}

impl ResolutionCache {
    /// 創建新的快取
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析生產鏈，命中時沿用生產樹並重新計算成本
    pub fn resolve(
        &mut self,
        planner: &ChainPlanner<'_>,
        target: ItemId,
        quantity: u64,
        efficiency: Decimal,
        config: &ResolveConfig,
    ) -> prodchain_core::Result<ChainResult> {
        planner.check_request(target, quantity, efficiency, config)?;
        self.evict_dirty();
        let key = ChainKey::new(target, quantity, efficiency, config);

        if let Some(cached) = self.entries.get(&key) {
            // 上限比建樹時更嚴格時重新解析，讓錯誤照常回報
            let root = &cached.root;
            if root.node_count() <= config.max_nodes && root.height() <= config.max_depth {
                self.hits += 1;
                tracing::debug!("快取命中: 物品 {} × {}", target, quantity);
                return planner.assemble(cached.root.clone(), config);
            }
        }

        self.misses += 1;
        let root = planner.build_tree(target, quantity, efficiency, config)?;
        let item_ids = root.item_ids();
        self.entries.insert(
            key,
            CachedTree {
                root: root.clone(),
                item_ids,
            },
        );

        planner.assemble(root, config)
    }

    /// 標記物品資料已變動（藍圖新增、修改或刪除）
    ///
    /// 實際清除延後到下一次查詢時進行。
    pub fn invalidate_items(&mut self, item_ids: impl IntoIterator<Item = ItemId>) {
        for id in item_ids {
            self.tracker.mark_dirty(id);
        }
    }

    /// 清除全部快取
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.tracker.clear();
    }

    /// 快取統計
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    fn evict_dirty(&mut self) {
        if self.tracker.is_empty() {
            return;
        }

        let before = self.entries.len();
        let tracker = &self.tracker;
        self.entries.retain(|key, cached| {
            !tracker.is_dirty(key.item_id) && !tracker.intersects(&cached.item_ids)
        });

        tracing::debug!(
            "清除受影響的快取: {} 筆（髒物品 {:?}）",
            before - self.entries.len(),
            self.tracker.dirty_items()
        );
        self.tracker.clear();
    }
}
