//! # Production Chain
//!
//! 生產鏈解析：從藍圖目錄展開製造樹，彙總原料需求並評估成本。
//!
//! ```no_run
//! use prodchain::{resolve_chain, InMemoryCatalog, ItemId, PriceBook, ResolveConfig};
//! use rust_decimal::Decimal;
//!
//! let catalog = InMemoryCatalog::new();
//! let prices = PriceBook::new();
//! let result = resolve_chain(
//!     &catalog,
//!     &catalog,
//!     &prices,
//!     ItemId(587),
//!     10,
//!     Decimal::ZERO,
//!     &ResolveConfig::default(),
//! );
//! ```

pub use prodchain_cache as cache;
pub use prodchain_calc as calc;
pub use prodchain_core as model;

pub use prodchain_cache::{CacheStats, ResolutionCache};
pub use prodchain_calc::{
    resolve_chain, ChainPlanner, ChainResult, MaterialAggregator, PeggingRecord, ProfitAnalysis,
    ProfitAnalyzer,
};
pub use prodchain_core::{
    AggregateResult, BlueprintCatalog, BlueprintDefinition, CatalogSnapshot, ChainError, ChainNode,
    CostBreakdown, InMemoryCatalog, Item, ItemCatalog, ItemId, MaterialRounding, PriceBook,
    PriceSource, PricingWarning, PricingWarningKind, ResolveConfig, SizeLimit,
};
