// ==========================================
// 多工厂供应计划系统 - 物料主数据
// ==========================================
// 职责: 物料静态属性 + 按日期的需求 + 期初库存
// 红线: 加载完成后只读
// ==========================================

use crate::domain::types::{CapacityType, ItemId, MachineSetId, PlantId, ProductionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// Item - 物料
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub holding_cost: f64, // 单位库存持有成本 (每件每天)

    // ===== 产能消耗 =====
    pub rates: BTreeMap<CapacityType, f64>, // 每件消耗的产能 (按产能类型)

    // ===== 工厂关联 =====
    pub productions: BTreeMap<PlantId, ProductionId>,
    pub machine_sets: BTreeMap<PlantId, Vec<MachineSetId>>,
    pub plants: BTreeSet<PlantId>, // 可持有该物料的工厂 (链接时计算)

    // ===== 需求 (日期下标 -> 数量) =====
    pub order_demand: BTreeMap<usize, i64>,
    pub forecast_demand: BTreeMap<usize, i64>,

    // ===== 期初库存 =====
    pub initial_inventory: BTreeMap<PlantId, i64>,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>, holding_cost: f64) -> Self {
        Self {
            id,
            name: name.into(),
            holding_cost,
            rates: BTreeMap::new(),
            productions: BTreeMap::new(),
            machine_sets: BTreeMap::new(),
            plants: BTreeSet::new(),
            order_demand: BTreeMap::new(),
            forecast_demand: BTreeMap::new(),
            initial_inventory: BTreeMap::new(),
        }
    }

    /// 该产能类型下的消耗率; 未登记视为 0 (不受约束)
    pub fn rate(&self, capacity_type: CapacityType) -> f64 {
        self.rates.get(&capacity_type).copied().unwrap_or(0.0)
    }

    /// 在指定工厂登记的机台组
    pub fn machine_sets_at(&self, plant: PlantId) -> &[MachineSetId] {
        self.machine_sets
            .get(&plant)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
