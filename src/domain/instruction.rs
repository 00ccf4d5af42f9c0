// ==========================================
// 多工厂供应计划系统 - 计划指令
// ==========================================
// 职责: 排产结果中的生产/调拨/供货指令
// 红线: 同一天同一键的指令合并数量, 不重复建行
// ==========================================

use crate::domain::types::{ItemId, PlantId, ProductionId, TransitId};
use serde::{Deserialize, Serialize};

/// 生产指令 (按开工日)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionInstruction {
    pub production: ProductionId,
    pub item: ItemId,
    pub plant: PlantId,
    pub start_date: usize,
    pub finish_date: usize,
    pub lots: i64,
    pub quantity: i64,
}

/// 调拨指令 (按发运日)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitInstruction {
    pub transit: TransitId,
    pub item: ItemId,
    pub source: PlantId,
    pub destination: PlantId,
    pub start_date: usize,
    pub arrival_date: usize,
    pub quantity: i64,
}

/// 供货指令 (按供货日, 键为 物料 x 工厂)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyInstruction {
    pub item: ItemId,
    pub plant: PlantId,
    pub date: usize,
    pub order_quantity: i64,
    pub forecast_quantity: i64,
}

impl SupplyInstruction {
    pub fn new(item: ItemId, plant: PlantId, date: usize) -> Self {
        Self {
            item,
            plant,
            date,
            order_quantity: 0,
            forecast_quantity: 0,
        }
    }

    pub fn quantity(&self) -> i64 {
        self.order_quantity + self.forecast_quantity
    }

    pub fn is_empty(&self) -> bool {
        self.order_quantity == 0 && self.forecast_quantity == 0
    }
}
