//! 生產鏈解析器
//!
//! 以顯式堆疊做深度優先展開，避免深層藍圖造成呼叫堆疊溢位：
//!
//! 1. 根物品進入 `Pending`
//! 2. 查詢藍圖：無藍圖（或列入直接購買）即為 `Terminal`
//! 3. 有藍圖則計算輪數與材料，節點進入 `Expanding`，每個材料成為新的 `Pending`
//! 4. 所有材料處理完畢後節點成為 `Resolved`，掛回父節點
//!
//! 循環偵測只看目前展開路徑上的祖先，同一物品可以出現在不同的兄弟分支。

use prodchain_core::{
    BlueprintCatalog, BlueprintDefinition, ChainError, ChainNode, ItemCatalog, ItemId,
    MaterialRequirement, ResolveConfig, SizeLimit,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::lookup::BlueprintLookup;
use crate::quantity::QuantityCalculator;

/// 單次解析的資源預算（節點數與時間）
///
/// 每次解析各自建立，並行展開的分支共用同一份計數。
#[derive(Debug)]
pub struct TraversalBudget {
    max_nodes: usize,
    max_depth: usize,
    expanded: AtomicUsize,
    budget: Option<Duration>,
    deadline: Option<Instant>,
}

impl TraversalBudget {
    /// 依配置開始計時
    pub fn start(config: &ResolveConfig) -> Self {
        let now = Instant::now();
        Self {
            max_nodes: config.max_nodes,
            max_depth: config.max_depth,
            expanded: AtomicUsize::new(0),
            budget: config.cancel_budget,
            deadline: config.cancel_budget.map(|b| now + b),
        }
    }

    /// 登記新展開的節點
    pub fn admit(&self, nodes: usize) -> prodchain_core::Result<()> {
        let total = self.expanded.fetch_add(nodes, Ordering::Relaxed) + nodes;
        if total > self.max_nodes {
            return Err(ChainError::ChainTooLarge {
                limit: SizeLimit::Nodes(self.max_nodes),
            });
        }
        Ok(())
    }

    /// 檢查深度上限
    pub fn check_depth(&self, depth: usize) -> prodchain_core::Result<()> {
        if depth > self.max_depth {
            return Err(ChainError::ChainTooLarge {
                limit: SizeLimit::Depth(self.max_depth),
            });
        }
        Ok(())
    }

    /// 檢查時間預算
    pub fn check_deadline(&self) -> prodchain_core::Result<()> {
        if let (Some(deadline), Some(budget)) = (self.deadline, self.budget) {
            if Instant::now() >= deadline {
                return Err(ChainError::ResolutionCancelled {
                    budget_ms: budget.as_millis(),
                });
            }
        }
        Ok(())
    }

    /// 同樣的上限與截止時間，節點計數歸零
    pub fn restarted(&self) -> Self {
        Self {
            max_nodes: self.max_nodes,
            max_depth: self.max_depth,
            expanded: AtomicUsize::new(0),
            budget: self.budget,
            deadline: self.deadline,
        }
    }

    /// 目前已展開的節點數
    pub fn expanded(&self) -> usize {
        self.expanded.load(Ordering::Relaxed)
    }
}

/// 生產鏈解析器
pub struct ChainResolver<'a> {
    lookup: BlueprintLookup<'a>,
    items: Option<&'a dyn ItemCatalog>,
    config: &'a ResolveConfig,
    efficiency: Decimal,
}

impl<'a> ChainResolver<'a> {
    /// 創建新的解析器
    pub fn new(
        blueprints: &'a dyn BlueprintCatalog,
        config: &'a ResolveConfig,
        efficiency: Decimal,
    ) -> Self {
        Self {
            lookup: BlueprintLookup::new(blueprints),
            items: None,
            config,
            efficiency,
        }
    }

    /// 建構器模式：設置物品目錄（用於節點名稱）
    pub fn with_item_catalog(mut self, items: &'a dyn ItemCatalog) -> Self {
        self.items = Some(items);
        self
    }

    /// 解析生產鏈
    pub fn resolve(&self, target: ItemId, quantity: u64) -> prodchain_core::Result<ChainNode> {
        let budget = TraversalBudget::start(self.config);
        let root = self.resolve_with_budget(target, quantity, &budget)?;

        tracing::debug!(
            "物品 {} 解析完成：展開節點 {} 個，深度 {}",
            target,
            budget.expanded(),
            root.height()
        );

        Ok(root)
    }

    /// 在指定預算下解析生產鏈
    pub fn resolve_with_budget(
        &self,
        target: ItemId,
        quantity: u64,
        budget: &TraversalBudget,
    ) -> prodchain_core::Result<ChainNode> {
        budget.check_deadline()?;

        let Some(blueprint) = self.classify(target)? else {
            tracing::debug!("物品 {} 沒有藍圖，視為原料", target);
            return Ok(ChainNode::terminal(target, quantity).with_name(self.item_name(target)));
        };

        budget.admit(1)?;

        if !self.config.parallel {
            return Traversal::new(self, budget).run(target, quantity, &blueprint, &[]);
        }

        match self.resolve_parallel(target, quantity, &blueprint, budget) {
            Err(err @ ChainError::ResolutionCancelled { .. }) => Err(err),
            // 先失敗的分支取決於排程，循序重跑取得確定的錯誤
            Err(err) => {
                tracing::debug!("物品 {} 並行展開失敗（{}），改以循序展開", target, err);
                let retry = budget.restarted();
                retry.admit(1)?;
                Traversal::new(self, &retry).run(target, quantity, &blueprint, &[])
            }
            Ok(root) => Ok(root),
        }
    }

    /// 根節點的子樹並行展開，結果依藍圖宣告順序合併
    ///
    /// 失敗時返回的錯誤不保證與循序展開相同，由 `resolve_with_budget` 重跑取得。
    fn resolve_parallel(
        &self,
        target: ItemId,
        quantity: u64,
        blueprint: &BlueprintDefinition,
        budget: &TraversalBudget,
    ) -> prodchain_core::Result<ChainNode> {
        let mut root = self.open_node(target, quantity, blueprint)?;
        let materials = std::mem::take(&mut root.pending);

        // 先依序分類，保留宣告順序
        let mut steps = Vec::with_capacity(materials.len());
        for requirement in materials {
            budget.check_deadline()?;
            steps.push((requirement, self.classify(requirement.material_id)?));
        }

        let ancestors = [target];
        let expanded: Vec<prodchain_core::Result<Option<ChainNode>>> = steps
            .par_iter()
            .map(|(requirement, blueprint)| match blueprint {
                None => Ok(None),
                Some(bp) => {
                    if requirement.material_id == target {
                        return Err(cycle_error(&ancestors, target));
                    }
                    budget.check_depth(1)?;
                    budget.admit(1)?;
                    Traversal::new(self, budget)
                        .run(requirement.material_id, requirement.quantity, bp, &ancestors)
                        .map(Some)
                }
            })
            .collect();

        for ((requirement, _), child) in steps.into_iter().zip(expanded) {
            match child? {
                Some(node) => root.node.children.push(node),
                None => root.node.terminals.push(requirement),
            }
        }

        Ok(root.node)
    }

    /// 判斷物品是否需要展開：列入直接購買或沒有藍圖時返回 None
    fn classify(&self, item_id: ItemId) -> prodchain_core::Result<Option<BlueprintDefinition>> {
        if self.config.buy_items.contains(&item_id) {
            tracing::debug!("物品 {} 列入直接購買清單", item_id);
            return Ok(None);
        }
        self.lookup.find_blueprint(item_id)
    }

    fn item_name(&self, item_id: ItemId) -> Option<String> {
        self.items
            .and_then(|catalog| catalog.get(item_id))
            .map(|item| item.name)
    }

    /// 計算節點的輪數、產出與材料，建立展開中的節點
    fn open_node(
        &self,
        item_id: ItemId,
        quantity: u64,
        blueprint: &BlueprintDefinition,
    ) -> prodchain_core::Result<OpenNode> {
        let plan =
            QuantityCalculator::plan(blueprint, quantity, self.efficiency, self.config.rounding)?;
        let production_time = QuantityCalculator::production_time(
            blueprint.time_per_run,
            plan.runs,
            self.config.time_efficiency,
        )
        .map_err(|e| ChainError::CalculationError(format!("物品 {} 的製造時間{}", item_id, e)))?;

        Ok(OpenNode {
            node: ChainNode {
                item_id,
                item_name: self.item_name(item_id),
                blueprint_id: Some(blueprint.blueprint_id),
                quantity,
                runs: plan.runs,
                produced_quantity: plan.produced_quantity,
                production_time,
                children: Vec::new(),
                terminals: Vec::new(),
            },
            pending: plan.materials,
        })
    }
}

/// 展開中的節點
struct OpenNode {
    node: ChainNode,
    pending: Vec<MaterialRequirement>,
}

/// 堆疊上的一層
struct Frame {
    node: ChainNode,
    pending: std::vec::IntoIter<MaterialRequirement>,
    depth: usize,
    /// 子樹中製造節點數（含自身）
    subtree_nodes: usize,
    /// 子樹高度
    height: usize,
}

/// 已解析子樹的快取項目
#[derive(Clone)]
struct Memo {
    node: ChainNode,
    subtree_nodes: usize,
    height: usize,
}

/// 單一分支的展開狀態（祖先路徑與子樹快取各自獨立）
struct Traversal<'r, 'a> {
    resolver: &'r ChainResolver<'a>,
    budget: &'r TraversalBudget,
    on_path: HashSet<ItemId>,
    memo: HashMap<(ItemId, u64), Memo>,
}

impl<'r, 'a> Traversal<'r, 'a> {
    fn new(resolver: &'r ChainResolver<'a>, budget: &'r TraversalBudget) -> Self {
        Self {
            resolver,
            budget,
            on_path: HashSet::new(),
            memo: HashMap::new(),
        }
    }

    /// 展開一個已登記的節點直到完成
    ///
    /// `ancestors` 為此分支之上的展開路徑（並行模式下為根節點）。
    fn run(
        mut self,
        item_id: ItemId,
        quantity: u64,
        blueprint: &BlueprintDefinition,
        ancestors: &[ItemId],
    ) -> prodchain_core::Result<ChainNode> {
        self.on_path.extend(ancestors.iter().copied());

        let mut stack = vec![self.push(item_id, quantity, blueprint, ancestors.len())?];

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame.pending.next(),
                None => {
                    return Err(ChainError::CalculationError(
                        "展開堆疊意外清空".to_string(),
                    ))
                }
            };

            if let Some(requirement) = next {
                self.visit(&mut stack, requirement, ancestors)?;
                continue;
            }

            let Some(frame) = stack.pop() else {
                continue;
            };
            self.on_path.remove(&frame.node.item_id);

            let memo = Memo {
                node: frame.node,
                subtree_nodes: frame.subtree_nodes,
                height: frame.height,
            };
            if self.resolver.config.memoize {
                self.memo
                    .insert((memo.node.item_id, memo.node.quantity), memo.clone());
            }

            match stack.last_mut() {
                Some(parent) => attach(parent, memo),
                None => return Ok(memo.node),
            }
        }
    }

    /// 處理一個材料需求
    fn visit(
        &mut self,
        stack: &mut Vec<Frame>,
        requirement: MaterialRequirement,
        ancestors: &[ItemId],
    ) -> prodchain_core::Result<()> {
        self.budget.check_deadline()?;

        if self.on_path.contains(&requirement.material_id) {
            let path: Vec<ItemId> = ancestors
                .iter()
                .copied()
                .chain(stack.iter().map(|f| f.node.item_id))
                .collect();
            return Err(cycle_error(&path, requirement.material_id));
        }

        let parent_depth = stack.last().map(|f| f.depth).unwrap_or(ancestors.len());
        let key = (requirement.material_id, requirement.quantity);

        if let Some(hit) = self.memo.get(&key).cloned() {
            self.budget.check_depth(parent_depth + 1 + hit.height)?;
            self.budget.admit(hit.subtree_nodes)?;
            if let Some(parent) = stack.last_mut() {
                attach(parent, hit);
            }
            return Ok(());
        }

        let Some(blueprint) = self.resolver.classify(requirement.material_id)? else {
            if let Some(parent) = stack.last_mut() {
                parent.node.terminals.push(requirement);
            }
            return Ok(());
        };

        self.budget.check_depth(parent_depth + 1)?;
        self.budget.admit(1)?;

        let frame = self.push(
            requirement.material_id,
            requirement.quantity,
            &blueprint,
            parent_depth + 1,
        )?;
        stack.push(frame);
        Ok(())
    }

    fn push(
        &mut self,
        item_id: ItemId,
        quantity: u64,
        blueprint: &BlueprintDefinition,
        depth: usize,
    ) -> prodchain_core::Result<Frame> {
        let open = self.resolver.open_node(item_id, quantity, blueprint)?;
        self.on_path.insert(item_id);

        Ok(Frame {
            node: open.node,
            pending: open.pending.into_iter(),
            depth,
            subtree_nodes: 1,
            height: 0,
        })
    }
}

fn attach(parent: &mut Frame, child: Memo) {
    parent.subtree_nodes += child.subtree_nodes;
    parent.height = parent.height.max(child.height + 1);
    parent.node.children.push(child.node);
}

/// 從路徑中第一次出現重複物品處截取循環
fn cycle_error(path: &[ItemId], repeated: ItemId) -> ChainError {
    let start = path.iter().position(|&id| id == repeated).unwrap_or(0);
    let mut cycle: Vec<ItemId> = path[start..].to_vec();
    cycle.push(repeated);
    ChainError::CyclicBlueprint { cycle }
}
