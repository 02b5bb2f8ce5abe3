//! 原料彙總與需求追溯

use prodchain_core::{AggregateResult, ChainError, ChainNode, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// 原料需求追溯記錄（哪條路徑消耗了多少）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeggingRecord {
    /// 從根節點到消耗節點的路徑
    pub path: Vec<ItemId>,

    /// 此路徑上的需求量
    pub quantity: u64,
}

impl PeggingRecord {
    /// 追溯深度
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// 中間產品彙總
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateTotal {
    /// 總需求量
    pub quantity: u64,

    /// 總製造輪數
    pub runs: u64,

    /// 出現次數
    pub occurrences: usize,
}

/// 原料彙總器
///
/// 每個末端需求都已在所屬節點捨入，彙總時只相加、不再捨入。
pub struct MaterialAggregator;

impl MaterialAggregator {
    /// 深度優先彙總
    ///
    /// 任一原料總量超過 u64 範圍時返回 `CalculationError`，不會截斷。
    pub fn aggregate(root: &ChainNode) -> prodchain_core::Result<AggregateResult> {
        let mut result = AggregateResult::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            for terminal in &node.terminals {
                result.add(terminal.material_id, terminal.quantity)?;
            }
            stack.extend(node.children.iter());
        }

        Ok(result)
    }

    /// 廣度優先彙總（結果必須與深度優先相同）
    pub fn aggregate_breadth_first(root: &ChainNode) -> prodchain_core::Result<AggregateResult> {
        let mut result = AggregateResult::new();
        let mut queue = VecDeque::from([root]);

        while let Some(node) = queue.pop_front() {
            for terminal in &node.terminals {
                result.add(terminal.material_id, terminal.quantity)?;
            }
            queue.extend(node.children.iter());
        }

        Ok(result)
    }

    /// 合併多份獨立彙總
    pub fn merge<'r>(
        parts: impl IntoIterator<Item = &'r AggregateResult>,
    ) -> prodchain_core::Result<AggregateResult> {
        let mut result = AggregateResult::new();
        for part in parts {
            result.merge(part)?;
        }
        Ok(result)
    }

    /// 追溯指定原料在生產鏈中的所有消耗路徑
    pub fn peg(root: &ChainNode, material_id: ItemId) -> Vec<PeggingRecord> {
        let mut records = Vec::new();
        let mut stack: Vec<(&ChainNode, Vec<ItemId>)> = vec![(root, vec![root.item_id])];

        while let Some((node, path)) = stack.pop() {
            for terminal in node.terminals.iter().filter(|t| t.material_id == material_id) {
                records.push(PeggingRecord {
                    path: path.clone(),
                    quantity: terminal.quantity,
                });
            }

            // 反向壓入，讓輸出依宣告順序排列
            for child in node.children.iter().rev() {
                let mut child_path = path.clone();
                child_path.push(child.item_id);
                stack.push((child, child_path));
            }
        }

        records
    }

    /// 彙總所有中間產品（不含根節點）
    pub fn intermediates(
        root: &ChainNode,
    ) -> prodchain_core::Result<BTreeMap<ItemId, IntermediateTotal>> {
        let mut totals: BTreeMap<ItemId, IntermediateTotal> = BTreeMap::new();
        let mut stack: Vec<&ChainNode> = root.children.iter().collect();

        while let Some(node) = stack.pop() {
            let overflow = || {
                ChainError::CalculationError(format!("中間產品 {} 的總量溢位", node.item_id))
            };
            let entry = totals.entry(node.item_id).or_default();
            entry.quantity = entry.quantity.checked_add(node.quantity).ok_or_else(overflow)?;
            entry.runs = entry.runs.checked_add(node.runs).ok_or_else(overflow)?;
            entry.occurrences += 1;
            stack.extend(node.children.iter());
        }

        Ok(totals)
    }
}
