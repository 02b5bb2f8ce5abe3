//! 護衛艦生產鏈解析示例

use anyhow::Context;
use prodchain::*;

const CATALOG: &str = r#"{
    "items": [
        {"id": 587, "name": "Rifter", "category_id": 6},
        {"id": 3828, "name": "Construction Blocks", "category_id": 43},
        {"id": 11530, "name": "Plasma Thruster", "category_id": 17},
        {"id": 34, "name": "Tritanium", "category_id": 4},
        {"id": 35, "name": "Pyerite", "category_id": 4},
        {"id": 36, "name": "Mexallon", "category_id": 4},
        {"id": 37, "name": "Isogen", "category_id": 4}
    ],
    "blueprints": [
        {"blueprint_id": 691, "product_id": 587, "output_quantity": 1, "time_per_run": 3600,
         "materials": [
            {"material_id": 34, "quantity": 32000},
            {"material_id": 11530, "quantity": 4},
            {"material_id": 3828, "quantity": 10}
         ]},
        {"blueprint_id": 11531, "product_id": 11530, "output_quantity": 1, "time_per_run": 600,
         "materials": [
            {"material_id": 35, "quantity": 900},
            {"material_id": 36, "quantity": 150}
         ]},
        {"blueprint_id": 3829, "product_id": 3828, "output_quantity": 5, "time_per_run": 300,
         "materials": [
            {"material_id": 34, "quantity": 200},
            {"material_id": 37, "quantity": 15}
         ]}
    ],
    "prices": [
        {"item_id": 34, "market": "4.12"},
        {"item_id": 35, "market": "9.8", "custom": "8.5"},
        {"item_id": 36, "market": "71.3"},
        {"item_id": 587, "sell": "620000"}
    ]
}"#;

fn print_node(node: &ChainNode, indent: usize) {
    let name = node.item_name.as_deref().unwrap_or("?");
    if node.is_terminal() {
        println!(
            "{:indent$}- {} ({}) × {}",
            "",
            name,
            node.item_id,
            node.quantity,
            indent = indent
        );
    } else {
        println!(
            "{:indent$}- {} ({}) × {}，{} 輪，產出 {}",
            "",
            name,
            node.item_id,
            node.quantity,
            node.runs,
            node.produced_quantity,
            indent = indent
        );
    }
    for child in &node.children {
        print_node(child, indent + 2);
    }
    for terminal in &node.terminals {
        println!(
            "{:indent$}- 原料 {} × {}",
            "",
            terminal.material_id,
            terminal.quantity,
            indent = indent + 2
        );
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .init();

    println!("=== 護衛艦生產鏈解析示例 ===\n");

    let (catalog, prices) = CatalogSnapshot::from_json(CATALOG)?
        .into_parts()
        .context("載入目錄快照失敗")?;

    let target = ItemId(587);
    let efficiency = model::me_level_to_efficiency(5);
    let config = ResolveConfig::default()
        .with_custom_prices(true)
        .with_time_efficiency(model::te_level_to_efficiency(2));

    let result = resolve_chain(&catalog, &catalog, &prices, target, 3, efficiency, &config)
        .context("生產鏈解析失敗")?;

    println!("\n生產樹:");
    print_node(&result.root, 2);

    println!("\n原料彙總:");
    for (material, quantity) in result.aggregate.iter() {
        let cost = &result.cost.contributions[&material];
        println!(
            "  - 物品 {}: {} 單位，單價 {:?}，成本 {}",
            material, quantity, cost.unit_price, cost.cost
        );
    }

    println!("\n總成本: {}（單位成本 {}）", result.cost.total, result.cost.unit_cost);
    println!("總製造時間: {} 秒", result.total_production_time);

    if !result.warnings.is_empty() {
        println!("\n定價警告:");
        for warning in &result.warnings {
            println!("  - [{:?}] {}", warning.severity, warning.message);
        }
    }

    if let Some(profit) = ProfitAnalyzer::analyze(&result, &prices)? {
        println!(
            "\n利潤: {}，利潤率 {:?}%，每小時 {:?}",
            profit.profit, profit.profit_margin, profit.profit_per_hour
        );
    }

    // 價格變動只需重新評估成本，生產樹沿用快取
    let mut cache = ResolutionCache::new();
    let planner = calc::ChainPlanner::new(&catalog, &catalog, &prices);
    cache.resolve(&planner, target, 3, efficiency, &config)?;
    cache.resolve(&planner, target, 3, efficiency, &config)?;
    println!("\n快取統計: {:?}", cache.stats());

    Ok(())
}
