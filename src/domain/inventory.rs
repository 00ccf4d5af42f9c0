// ==========================================
// 多工厂供应计划系统 - 库存格
// ==========================================
// 红线: 0 <= free <= total
// ==========================================

use serde::{Deserialize, Serialize};

/// 某日某物料某工厂的库存
///
/// - `total`: 当日在库数量
/// - `free`: 未被之后日期的供货占用的数量 (水位线, 等于此后各日 total 的最小值)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Inventory {
    pub total: i64,
    pub free: i64,
}

impl Inventory {
    pub fn new(total: i64, free: i64) -> Self {
        Self { total, free }
    }

    pub fn is_consistent(&self) -> bool {
        0 <= self.free && self.free <= self.total
    }

    /// 已承诺给后续供货的数量
    pub fn promised(&self) -> i64 {
        self.total - self.free
    }
}
