// ==========================================
// 多工厂供应计划系统 - 机台组与产能
// ==========================================
// 红线: 产能按开工日扣减, 同一机台组被所有消耗率非零的物料共享
// ==========================================

use crate::domain::types::{CapacityType, MachineSetId, PlantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// MachineSet - 机台组
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSet {
    pub id: MachineSetId,
    pub name: String,
    pub plant: PlantId,
    pub capacity_type: CapacityType,
    pub capacity: BTreeMap<usize, f64>, // 日期下标 -> 当日总产能
}

impl MachineSet {
    pub fn new(
        id: MachineSetId,
        name: impl Into<String>,
        plant: PlantId,
        capacity_type: CapacityType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            plant,
            capacity_type,
            capacity: BTreeMap::new(),
        }
    }

    /// 当日总产能; 未登记的日期没有产能
    pub fn capacity_on(&self, date: usize) -> f64 {
        self.capacity.get(&date).copied().unwrap_or(0.0)
    }
}

// ==========================================
// CapacitySlot - 单日单机台组产能
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CapacitySlot {
    pub total: f64,
    pub remaining: f64,
}

impl CapacitySlot {
    pub fn new(total: f64) -> Self {
        Self {
            total,
            remaining: total,
        }
    }
}

// ==========================================
// Trait: CapacityConstraint
// ==========================================
// 用途: 生产上限计算与产能扣减
pub trait CapacityConstraint {
    /// 按消耗率可容纳的最大件数 (消耗率为 0 视为不受约束)
    fn max_units(&self, rate: f64) -> i64;

    /// 扣减产能 (负数表示归还)
    fn consume(&mut self, amount: f64);

    /// 已使用产能
    fn used(&self) -> f64;
}

impl CapacityConstraint for CapacitySlot {
    fn max_units(&self, rate: f64) -> i64 {
        if rate <= 0.0 {
            return i64::MAX;
        }
        if self.remaining <= 0.0 {
            return 0;
        }
        // 浮点误差容忍, 避免 10.0/0.1 得到 99.999...
        let units = (self.remaining / rate + 1e-9).floor();
        if units >= i64::MAX as f64 {
            i64::MAX
        } else {
            units as i64
        }
    }

    fn consume(&mut self, amount: f64) {
        self.remaining -= amount;
    }

    fn used(&self) -> f64 {
        self.total - self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_is_unconstrained() {
        let slot = CapacitySlot::new(0.0);
        assert_eq!(slot.max_units(0.0), i64::MAX);
    }

    #[test]
    fn test_max_units_floor() {
        let mut slot = CapacitySlot::new(10.0);
        assert_eq!(slot.max_units(3.0), 3);
        slot.consume(4.0);
        assert_eq!(slot.max_units(3.0), 2);
        assert_eq!(slot.used(), 4.0);
        assert_eq!(slot.max_units(0.1), 60);
    }

    #[test]
    fn test_missing_date_has_no_capacity() {
        let set = MachineSet::new(MachineSetId(0), "M1", PlantId(0), CapacityType::Pcs);
        assert_eq!(set.capacity_on(5), 0.0);
    }
}
