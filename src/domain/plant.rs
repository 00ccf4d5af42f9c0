// ==========================================
// 多工厂供应计划系统 - 工厂主数据
// ==========================================

use crate::domain::types::{ItemId, PlantId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 工厂
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    pub id: PlantId,
    pub name: String,

    /// 锁定天数: 计划期开始后这些天内不得开工, 也不得发出调拨
    pub locked_out_days: usize,

    // ===== 调拨伙伴 (物料 -> 对端工厂) =====
    pub transit_in: BTreeMap<ItemId, BTreeSet<PlantId>>,
    pub transit_out: BTreeMap<ItemId, BTreeSet<PlantId>>,

    // ===== 在途入库 (日期下标 -> 物料 -> 数量) =====
    pub purchase_orders: BTreeMap<usize, BTreeMap<ItemId, i64>>,
    pub work_in_process: BTreeMap<usize, BTreeMap<ItemId, i64>>,
}

impl Plant {
    pub fn new(id: PlantId, name: impl Into<String>, locked_out_days: usize) -> Self {
        Self {
            id,
            name: name.into(),
            locked_out_days,
            transit_in: BTreeMap::new(),
            transit_out: BTreeMap::new(),
            purchase_orders: BTreeMap::new(),
            work_in_process: BTreeMap::new(),
        }
    }

    /// 以 `start` 为计划起点时最早可开工/发运的日期
    pub fn earliest_release(&self, start: usize) -> usize {
        start + self.locked_out_days
    }

    /// 采购与在制的全部入库事件 (日期, 物料, 数量)
    pub fn receipts(&self) -> impl Iterator<Item = (usize, ItemId, i64)> + '_ {
        self.purchase_orders
            .iter()
            .chain(self.work_in_process.iter())
            .flat_map(|(date, items)| items.iter().map(move |(item, q)| (*date, *item, *q)))
    }
}
