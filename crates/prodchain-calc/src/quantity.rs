//! 數量與效率計算

use prodchain_core::{BlueprintDefinition, ChainError, MaterialRequirement, MaterialRounding};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 數量計算的底層錯誤
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("每輪產出數量為 0")]
    ZeroOutput,

    #[error("效率係數 {0} 不在 0 與 1 之間")]
    InvalidEfficiency(Decimal),

    #[error("數量溢位")]
    Overflow,
}

/// 單一節點的製造計劃
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// 製造輪數
    pub runs: u64,

    /// 實際產出
    pub produced_quantity: u64,

    /// 各材料需求（依藍圖宣告順序）
    pub materials: Vec<MaterialRequirement>,
}

impl RunPlan {
    /// 超額產出
    pub fn excess(&self, requested: u64) -> u64 {
        self.produced_quantity.saturating_sub(requested)
    }
}

/// 數量與效率計算器
pub struct QuantityCalculator;

impl QuantityCalculator {
    /// 所需輪數 = ceil(需求量 / 每輪產出)
    pub fn runs_needed(needed: u64, per_run_output: u64) -> Result<u64, QuantityError> {
        if per_run_output == 0 {
            return Err(QuantityError::ZeroOutput);
        }
        Ok(needed.div_ceil(per_run_output))
    }

    /// 計算材料用量，效率在每輪（或整批）層級捨入
    pub fn material_quantity(
        base_per_run: u64,
        runs: u64,
        efficiency: Decimal,
        rounding: MaterialRounding,
    ) -> Result<u64, QuantityError> {
        let factor = Self::reduction_factor(efficiency)?;

        match rounding {
            MaterialRounding::PerRun => {
                let per_run = ceil_to_u64(Decimal::from(base_per_run) * factor)?;
                per_run.checked_mul(runs).ok_or(QuantityError::Overflow)
            }
            MaterialRounding::PerBatch => {
                let batch = Decimal::from(base_per_run)
                    .checked_mul(Decimal::from(runs))
                    .and_then(|b| b.checked_mul(factor))
                    .ok_or(QuantityError::Overflow)?;
                ceil_to_u64(batch)
            }
        }
    }

    /// 製造時間 = ceil(每輪時間 × (1 - 時間效率)) × 輪數
    pub fn production_time(
        time_per_run: u64,
        runs: u64,
        time_efficiency: Decimal,
    ) -> Result<u64, QuantityError> {
        let factor = Self::reduction_factor(time_efficiency)?;
        let per_run = ceil_to_u64(Decimal::from(time_per_run) * factor)?;
        per_run.checked_mul(runs).ok_or(QuantityError::Overflow)
    }

    /// 計算單一藍圖的製造計劃
    pub fn plan(
        blueprint: &BlueprintDefinition,
        needed: u64,
        efficiency: Decimal,
        rounding: MaterialRounding,
    ) -> prodchain_core::Result<RunPlan> {
        let to_chain_error = |e: QuantityError| match e {
            QuantityError::ZeroOutput => ChainError::InvalidBlueprintData {
                item_id: blueprint.product_id,
                reason: format!("藍圖 {} {}", blueprint.blueprint_id, e),
            },
            QuantityError::InvalidEfficiency(_) => ChainError::InvalidConfig(e.to_string()),
            QuantityError::Overflow => ChainError::CalculationError(format!(
                "物品 {} 的材料數量{}",
                blueprint.product_id, e
            )),
        };

        let runs = Self::runs_needed(needed, blueprint.output_quantity).map_err(to_chain_error)?;
        let produced_quantity = runs
            .checked_mul(blueprint.output_quantity)
            .ok_or(QuantityError::Overflow)
            .map_err(to_chain_error)?;

        let materials = blueprint
            .materials
            .iter()
            .map(|m| {
                Self::material_quantity(m.quantity, runs, efficiency, rounding)
                    .map(|qty| MaterialRequirement::new(m.material_id, qty))
                    .map_err(to_chain_error)
            })
            .collect::<prodchain_core::Result<Vec<_>>>()?;

        Ok(RunPlan {
            runs,
            produced_quantity,
            materials,
        })
    }

    fn reduction_factor(efficiency: Decimal) -> Result<Decimal, QuantityError> {
        if efficiency < Decimal::ZERO || efficiency > Decimal::ONE {
            return Err(QuantityError::InvalidEfficiency(efficiency));
        }
        Ok(Decimal::ONE - efficiency)
    }
}

fn ceil_to_u64(value: Decimal) -> Result<u64, QuantityError> {
    value.ceil().to_u64().ok_or(QuantityError::Overflow)
}
