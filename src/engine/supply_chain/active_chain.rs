// ==========================================
// 供应链 - 激活子图快照
// ==========================================
// 职责: 保存一次激活的结果, 按结果把数量写入台账
// 红线: 快照只含下标, 不引用图与台账, 可跨台账重放
// ==========================================

use crate::domain::types::{ItemId, PlantId, ProductionId, TransitId};
use crate::engine::schedule::Schedule;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 激活的子图 (树)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveChain {
    pub item: ItemId,
    pub plant: PlantId,
    pub date: usize, // 交付日
    pub quantity: i64,
    pub inventory: i64,
    pub lead_time: usize,
    pub hops: usize,
    pub holding_cost: f64,
    pub production_cost: f64,
    pub transit_cost: f64,
    pub production: Option<ActiveProduction>,
    pub lanes: Vec<ActiveLane>,
}

/// 激活的生产流, `components` 与工艺 BOM 行一一对应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveProduction {
    pub production: ProductionId,
    pub max_quantity: i64,
    pub components: Vec<ActiveChain>,
}

/// 激活的调拨流
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveLane {
    pub transit: TransitId,
    pub source: ActiveChain,
}

/// 台账中的供应链使用记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRecord {
    pub chain: ActiveChain,
    pub quantity: i64,
}

impl ActiveChain {
    pub fn total_cost(&self) -> f64 {
        self.holding_cost + self.production_cost + self.transit_cost
    }

    /// 供给开始日 (交付日 - 提前期)
    pub fn provision_date(&self) -> usize {
        self.date.saturating_sub(self.lead_time)
    }

    /// 重排紧急度: 供给开始日 + 提前期, 即交付日
    pub fn urgency_date(&self) -> usize {
        self.provision_date() + self.lead_time
    }

    pub fn is_direct_inventory(&self) -> bool {
        self.inventory > 0
    }

    /// 把 `quantity` 件在 `date` 交付到 (物料, 工厂) 写入台账
    ///
    /// 1) 库存部分只认领, 由上层的调拨/生产/供货实际扣减
    /// 2) 生产流先递归安排 BOM 组件, 再按组件实际到位量与当下剩余产能取整批投产
    /// 3) 余量依次占用激活的调拨线路, 发运量以来源实际安排量为准
    ///
    /// 激活时各层分别估算产能, 同一机台组被多层共用时以提交时的剩余产能为准.
    /// 返回实际安排的数量
    pub fn add_to_schedule(&self, schedule: &mut Schedule<'_>, date: usize, quantity: i64) -> i64 {
        let mut left = quantity.max(0);

        if self.inventory > 0 {
            left -= self.inventory.min(left);
        }
        if left == 0 {
            return quantity;
        }

        if let Some(active) = &self.production {
            let refs = schedule.refs();
            let production = refs.production(active.production);

            if let Some(start) = date.checked_sub(production.lead_time) {
                let provide = active.max_quantity.min(left);
                let lots = production.lots(provide, active.max_quantity);
                let target = production.produced_quantity(lots);

                let mut feasible = target;
                for (component, chain) in production.bom.iter().zip(&active.components) {
                    let delivered = chain.add_to_schedule(schedule, start, component.required_for(target));
                    feasible = feasible.min(component.producible_from(delivered));
                }
                feasible = feasible.min(schedule.max_quantity_from_capacity(active.production, start));

                let committed = production.floor_to_lots(feasible) / production.lot_size;
                if committed < lots {
                    debug!(
                        production = %active.production,
                        start,
                        target,
                        feasible,
                        "组件到位量或剩余产能不足, 减少投产批次"
                    );
                }
                schedule.add_production(start, active.production, committed);
                left -= provide.min(production.produced_quantity(committed));
            }
        }
        if left == 0 {
            return quantity;
        }

        for lane in &self.lanes {
            let refs = schedule.refs();
            let transit = refs.transit(lane.transit);
            let Some(start) = date.checked_sub(transit.lead_time) else {
                continue;
            };
            let provide = lane.source.quantity.min(left);
            if provide <= 0 {
                continue;
            }
            let shipped = lane.source.add_to_schedule(schedule, start, provide);
            schedule.add_transit(start, lane.transit, shipped);
            left -= shipped;
            if left == 0 {
                break;
            }
        }

        if left > 0 {
            warn!(
                item = %self.item,
                plant = %self.plant,
                date,
                requested = quantity,
                short = left,
                "激活链可供量不足, 部分数量未安排"
            );
        }
        quantity - left
    }
}
