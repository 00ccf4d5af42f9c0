// ==========================================
// 多工厂供应计划系统 - 生产工艺与调拨线路
// ==========================================
// 职责: Production / BomComponent / Transit 静态定义
// 红线: 生产按批次 (lot) 投产, 产出 = lot_size * lots
// ==========================================

use crate::domain::types::{ItemId, PlantId, ProductionId, SupplyType, TransitId};
use serde::{Deserialize, Serialize};

// ==========================================
// BomComponent - 物料清单行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomComponent {
    pub material: ItemId,
    pub quantity: i64, // 每件成品消耗的组件数
    #[serde(default)]
    pub supply_type: SupplyType,
}

impl BomComponent {
    pub fn new(material: ItemId, quantity: i64) -> Self {
        Self {
            material,
            quantity,
            supply_type: SupplyType::default(),
        }
    }

    /// 组件可供量能支撑的最大成品件数
    pub fn producible_from(&self, available: i64) -> i64 {
        if self.quantity <= 0 {
            return i64::MAX;
        }
        available.max(0) / self.quantity
    }

    /// 生产 `produced` 件成品需要的组件数
    pub fn required_for(&self, produced: i64) -> i64 {
        produced.saturating_mul(self.quantity)
    }
}

// ==========================================
// Production - 生产工艺 (物料 x 工厂)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Production {
    pub id: ProductionId,
    pub item: ItemId,
    pub plant: PlantId,
    pub cost: f64,           // 每批次成本
    pub lead_time: usize,    // 开工到入库天数
    pub lot_size: i64,       // 批量
    pub min_production: i64, // 单次最小产量
    pub max_production: Option<i64>, // 单次最大产量 (None = 不限)
    pub bom: Vec<BomComponent>,
}

impl Production {
    pub fn new(
        id: ProductionId,
        item: ItemId,
        plant: PlantId,
        cost: f64,
        lead_time: usize,
        lot_size: i64,
    ) -> Self {
        Self {
            id,
            item,
            plant,
            cost,
            lead_time,
            lot_size: lot_size.max(1),
            min_production: 0,
            max_production: None,
            bom: Vec::new(),
        }
    }

    /// 单件分摊成本
    pub fn unit_cost(&self) -> f64 {
        self.cost / self.lot_size as f64
    }

    /// 单次产量上限
    pub fn max_production_cap(&self) -> i64 {
        self.max_production.unwrap_or(i64::MAX)
    }

    /// 向下取整到整批
    pub fn floor_to_lots(&self, quantity: i64) -> i64 {
        (quantity.max(0) / self.lot_size) * self.lot_size
    }

    pub fn produced_quantity(&self, lots: i64) -> i64 {
        lots.saturating_mul(self.lot_size)
    }

    /// 计算至少覆盖 `quantity` 的批次数, 不超过 `max_quantity` 可容纳的整批数
    ///
    /// 若 `min_production` 可在上限内满足, 批次数会被抬升到满足最小产量
    pub fn lots(&self, quantity: i64, max_quantity: i64) -> i64 {
        let cap = max_quantity.max(0) / self.lot_size;
        let mut lots = ceil_div(quantity.max(0), self.lot_size);

        if self.min_production > 0 {
            let min_lots = ceil_div(self.min_production, self.lot_size);
            if lots < min_lots && min_lots <= cap {
                lots = min_lots;
            }
        }

        lots.min(cap)
    }
}

fn ceil_div(a: i64, b: i64) -> i64 {
    if a <= 0 {
        return 0;
    }
    (a - 1) / b + 1
}

// ==========================================
// Transit - 调拨线路
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transit {
    pub id: TransitId,
    pub item: ItemId,
    pub source: PlantId,
    pub destination: PlantId,
    pub cost: f64, // 每件运费
    pub lead_time: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn production(lot_size: i64) -> Production {
        Production::new(ProductionId(0), ItemId(0), PlantId(0), 100.0, 3, lot_size)
    }

    #[test]
    fn test_lots_ceiling_division() {
        let p = production(10);
        assert_eq!(p.lots(25, i64::MAX), 3);
        assert_eq!(p.lots(30, i64::MAX), 3);
        assert_eq!(p.lots(0, i64::MAX), 0);
    }

    #[test]
    fn test_lots_capped_by_max_quantity() {
        let p = production(10);
        // 上限 20 件只能容纳 2 批
        assert_eq!(p.lots(25, 20), 2);
        assert_eq!(p.lots(25, 29), 2);
    }

    #[test]
    fn test_lots_raised_to_min_production() {
        let mut p = production(10);
        p.min_production = 40;
        assert_eq!(p.lots(5, 100), 4);
        // 上限不足以满足最小产量时保持原需
        assert_eq!(p.lots(5, 30), 1);
    }

    #[test]
    fn test_unit_cost_and_floor() {
        let p = production(4);
        assert_eq!(p.unit_cost(), 25.0);
        assert_eq!(p.floor_to_lots(11), 8);
        assert_eq!(p.floor_to_lots(-3), 0);
    }

    #[test]
    fn test_bom_producible_from() {
        let c = BomComponent::new(ItemId(1), 2);
        assert_eq!(c.producible_from(4), 2);
        assert_eq!(c.producible_from(5), 2);
        assert_eq!(c.required_for(3), 6);
    }
}
