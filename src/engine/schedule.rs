// ==========================================
// 多工厂供应计划系统 - 排产台账 (Schedule)
// ==========================================
// 职责: 按 [日期][物料][工厂] 维护库存, 按日期维护指令与产能,
//       维护累计未满足订单需求与成本/延期合计
// 红线: 只能通过台账操作修改; 0 <= free <= total;
//       holding_cost 恒等于 Σ total * 持有成本
// ==========================================

mod ops;
#[cfg(test)]
mod tests;

use crate::domain::capacity::{CapacityConstraint, CapacitySlot};
use crate::domain::instruction::{ProductionInstruction, SupplyInstruction, TransitInstruction};
use crate::domain::inventory::Inventory;
use crate::domain::reference::ReferenceData;
use crate::domain::types::{ItemId, MachineSetId, PlantId, ProductionId, TransitId};
use crate::engine::supply_chain::{ActiveChain, ChainRecord};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

// ==========================================
// 台账不变量违反
// ==========================================
// 只由 verify_invariants() 报告, 规划过程不会返回这些错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerViolation {
    #[error("未承诺库存为负 (日期 {date}, {item}, {plant}): free={free}")]
    NegativeFree {
        date: usize,
        item: ItemId,
        plant: PlantId,
        free: i64,
    },

    #[error("未承诺库存超过在库 (日期 {date}, {item}, {plant}): free={free}, total={total}")]
    FreeExceedsTotal {
        date: usize,
        item: ItemId,
        plant: PlantId,
        free: i64,
        total: i64,
    },

    #[error("持有成本漂移: 台账 {ledger}, 重算 {recomputed}")]
    HoldingCostDrift { ledger: f64, recomputed: f64 },

    #[error("产能超用 (日期 {date}, {machine_set}): 剩余 {remaining}")]
    CapacityOverdrawn {
        date: usize,
        machine_set: MachineSetId,
        remaining: f64,
    },
}

pub type LedgerResult<T> = Result<T, LedgerViolation>;

// ==========================================
// Schedule - 排产台账
// ==========================================
#[derive(Debug, Clone)]
pub struct Schedule<'r> {
    refs: &'r ReferenceData,
    start: usize,
    end: usize,
    n_items: usize,
    n_plants: usize,
    n_sets: usize,

    // ===== 稠密网格 =====
    inventory: Vec<Inventory>,       // [date][item][plant]
    capacity: Vec<CapacitySlot>,     // [date][machine_set]
    order_demand: Vec<i64>,          // [date][item]
    forecast_demand: Vec<i64>,       // [date][item]
    order_supplied: Vec<i64>,        // [date][item]
    forecast_supplied: Vec<i64>,     // [date][item]
    acc_order_demand: Vec<i64>,      // [date][item] 截至当日累计未满足订单

    // ===== 指令 (按日期) =====
    production_schedule: Vec<BTreeMap<ProductionId, ProductionInstruction>>,
    transit_schedule: Vec<BTreeMap<TransitId, TransitInstruction>>,
    supply_schedule: Vec<BTreeMap<(ItemId, PlantId), SupplyInstruction>>,

    // ===== 合计 =====
    holding_cost: f64,
    production_cost: f64,
    transit_cost: f64,
    total_delay: i64,

    // ===== 供应链使用记录 (重排依据) =====
    chain_records: Vec<ChainRecord>,
}

impl<'r> Schedule<'r> {
    /// 以 `start` 为起点初始化台账
    ///
    /// 期初库存记在起点; 采购与在制按到货日入库, 早于起点的记在起点
    pub fn new(refs: &'r ReferenceData, start: usize) -> Self {
        let end = refs.period();
        let start = start.min(end);
        let days = end - start;
        let n_items = refs.items().len();
        let n_plants = refs.plants().len();
        let n_sets = refs.machine_sets().len();

        let mut schedule = Self {
            refs,
            start,
            end,
            n_items,
            n_plants,
            n_sets,
            inventory: vec![Inventory::default(); days * n_items * n_plants],
            capacity: Vec::with_capacity(days * n_sets),
            order_demand: vec![0; days * n_items],
            forecast_demand: vec![0; days * n_items],
            order_supplied: vec![0; days * n_items],
            forecast_supplied: vec![0; days * n_items],
            acc_order_demand: vec![0; days * n_items],
            production_schedule: vec![BTreeMap::new(); days],
            transit_schedule: vec![BTreeMap::new(); days],
            supply_schedule: vec![BTreeMap::new(); days],
            holding_cost: 0.0,
            production_cost: 0.0,
            transit_cost: 0.0,
            total_delay: 0,
            chain_records: Vec::new(),
        };

        // ===== 产能 =====
        for date in start..end {
            for set in refs.machine_sets() {
                schedule
                    .capacity
                    .push(CapacitySlot::new(set.capacity_on(date)));
            }
        }

        // ===== 库存 =====
        for item in refs.items() {
            for (&plant, &q) in &item.initial_inventory {
                schedule.add_inventory(start, item.id, plant, q);
            }
        }
        for plant in refs.plants() {
            for (date, item, q) in plant.receipts() {
                schedule.add_inventory(date.max(start), item, plant.id, q);
            }
        }

        // ===== 需求与累计订单 =====
        for item in refs.items() {
            for (&date, &q) in item.order_demand.range(start..end) {
                let idx = schedule.item_cell(date, item.id);
                schedule.order_demand[idx] += q;
            }
            for (&date, &q) in item.forecast_demand.range(start..end) {
                let idx = schedule.item_cell(date, item.id);
                schedule.forecast_demand[idx] += q;
            }

            let mut acc = 0;
            for date in start..end {
                let idx = schedule.item_cell(date, item.id);
                acc += schedule.order_demand[idx];
                schedule.acc_order_demand[idx] = acc;
                schedule.total_delay += acc + schedule.forecast_demand[idx];
            }
        }

        debug!(
            start,
            end,
            holding_cost = schedule.holding_cost,
            total_delay = schedule.total_delay,
            "台账初始化完成"
        );
        schedule
    }

    // ==========================================
    // 网格下标
    // ==========================================

    fn in_horizon(&self, date: usize) -> bool {
        self.start <= date && date < self.end
    }

    fn cell(&self, date: usize, item: ItemId, plant: PlantId) -> usize {
        ((date - self.start) * self.n_items + item.index()) * self.n_plants + plant.index()
    }

    fn item_cell(&self, date: usize, item: ItemId) -> usize {
        (date - self.start) * self.n_items + item.index()
    }

    fn slot(&self, date: usize, set: MachineSetId) -> usize {
        (date - self.start) * self.n_sets + set.index()
    }

    fn day(&self, date: usize) -> usize {
        date - self.start
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn refs(&self) -> &'r ReferenceData {
        self.refs
    }

    pub fn start_date(&self) -> usize {
        self.start
    }

    pub fn end_date(&self) -> usize {
        self.end
    }

    /// 计划期外返回空库存
    pub fn inventory(&self, date: usize, item: ItemId, plant: PlantId) -> Inventory {
        if !self.in_horizon(date) {
            return Inventory::default();
        }
        self.inventory[self.cell(date, item, plant)]
    }

    pub fn free(&self, date: usize, item: ItemId, plant: PlantId) -> i64 {
        self.inventory(date, item, plant).free
    }

    pub fn total(&self, date: usize, item: ItemId, plant: PlantId) -> i64 {
        self.inventory(date, item, plant).total
    }

    pub fn capacity(&self, date: usize, set: MachineSetId) -> CapacitySlot {
        if !self.in_horizon(date) {
            return CapacitySlot::default();
        }
        self.capacity[self.slot(date, set)]
    }

    fn item_value(&self, grid: &[i64], date: usize, item: ItemId) -> i64 {
        if !self.in_horizon(date) {
            return 0;
        }
        grid[self.item_cell(date, item)]
    }

    pub fn order_demand(&self, date: usize, item: ItemId) -> i64 {
        self.item_value(&self.order_demand, date, item)
    }

    pub fn forecast_demand(&self, date: usize, item: ItemId) -> i64 {
        self.item_value(&self.forecast_demand, date, item)
    }

    pub fn order_supplied(&self, date: usize, item: ItemId) -> i64 {
        self.item_value(&self.order_supplied, date, item)
    }

    pub fn forecast_supplied(&self, date: usize, item: ItemId) -> i64 {
        self.item_value(&self.forecast_supplied, date, item)
    }

    /// 截至当日累计未满足的订单需求
    pub fn acc_order_demand(&self, date: usize, item: ItemId) -> i64 {
        self.item_value(&self.acc_order_demand, date, item)
    }

    pub fn production_instructions(
        &self,
        date: usize,
    ) -> impl Iterator<Item = &ProductionInstruction> + '_ {
        self.day_entries(&self.production_schedule, date)
    }

    pub fn transit_instructions(
        &self,
        date: usize,
    ) -> impl Iterator<Item = &TransitInstruction> + '_ {
        self.day_entries(&self.transit_schedule, date)
    }

    pub fn supply_instructions(&self, date: usize) -> impl Iterator<Item = &SupplyInstruction> + '_ {
        self.day_entries(&self.supply_schedule, date)
    }

    fn day_entries<'a, K, V>(
        &self,
        days: &'a [BTreeMap<K, V>],
        date: usize,
    ) -> impl Iterator<Item = &'a V> + 'a {
        let day = if self.in_horizon(date) {
            days.get(self.day(date))
        } else {
            None
        };
        day.into_iter().flat_map(|m| m.values())
    }

    pub fn all_production_instructions(&self) -> impl Iterator<Item = &ProductionInstruction> + '_ {
        self.production_schedule.iter().flat_map(|m| m.values())
    }

    pub fn all_transit_instructions(&self) -> impl Iterator<Item = &TransitInstruction> + '_ {
        self.transit_schedule.iter().flat_map(|m| m.values())
    }

    pub fn all_supply_instructions(&self) -> impl Iterator<Item = &SupplyInstruction> + '_ {
        self.supply_schedule.iter().flat_map(|m| m.values())
    }

    pub fn supply_instruction(
        &self,
        date: usize,
        item: ItemId,
        plant: PlantId,
    ) -> Option<&SupplyInstruction> {
        if !self.in_horizon(date) {
            return None;
        }
        self.supply_schedule[self.day(date)].get(&(item, plant))
    }

    pub fn holding_cost(&self) -> f64 {
        self.holding_cost
    }

    pub fn production_cost(&self) -> f64 {
        self.production_cost
    }

    pub fn transit_cost(&self) -> f64 {
        self.transit_cost
    }

    pub fn total_cost(&self) -> f64 {
        self.holding_cost + self.production_cost + self.transit_cost
    }

    pub fn total_delay(&self) -> i64 {
        self.total_delay
    }

    // ==========================================
    // 供应链记录
    // ==========================================

    pub fn chain_records(&self) -> &[ChainRecord] {
        &self.chain_records
    }

    pub fn record_chain(&mut self, chain: ActiveChain, quantity: i64) {
        self.chain_records.push(ChainRecord { chain, quantity });
    }

    // ==========================================
    // 产能
    // ==========================================

    /// 工艺在开工日按剩余产能可生产的最大件数
    ///
    /// 取该工厂所有机台组的最小值; 消耗率为 0 的机台组不受约束
    pub fn max_quantity_from_capacity(&self, production: ProductionId, date: usize) -> i64 {
        if !self.in_horizon(date) {
            return 0;
        }
        let production = self.refs.production(production);
        let item = self.refs.item(production.item);
        let sets = item.machine_sets_at(production.plant);
        if sets.is_empty() {
            return 0;
        }

        sets.iter()
            .map(|set| {
                let rate = item.rate(self.refs.machine_set(*set).capacity_type);
                self.capacity[self.slot(date, *set)].max_units(rate)
            })
            .min()
            .unwrap_or(0)
    }

    // ==========================================
    // 指标
    // ==========================================

    /// 满足率: 对每个有需求的 (日期, 物料),
    /// `max(0, 当日供货 - 前一日结转的未满足订单) / 当日需求`, 封顶 1, 再取平均
    ///
    /// 计划期内无需求时为 1.0
    pub fn calc_fill_rate(&self) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;

        for date in self.start..self.end {
            for i in 0..self.n_items {
                let item = ItemId(i);
                let idx = self.item_cell(date, item);
                let demand = self.order_demand[idx] + self.forecast_demand[idx];
                if demand <= 0 {
                    continue;
                }

                let carried = if date > self.start {
                    self.acc_order_demand[self.item_cell(date - 1, item)].max(0)
                } else {
                    0
                };
                let supplied = self.order_supplied[idx] + self.forecast_supplied[idx];
                let rate = (supplied - carried).max(0) as f64 / demand as f64;

                sum += rate.min(1.0);
                count += 1;
            }
        }

        if count == 0 {
            1.0
        } else {
            sum / count as f64
        }
    }

    /// 独立重算持有成本: Σ total * 物料持有成本
    pub fn recompute_holding_cost(&self) -> f64 {
        let mut cost = 0.0;
        for date in self.start..self.end {
            for item in self.refs.items() {
                let total: i64 = (0..self.n_plants)
                    .map(|p| self.inventory[self.cell(date, item.id, PlantId(p))].total)
                    .sum();
                cost += total as f64 * item.holding_cost;
            }
        }
        cost
    }

    /// 校验台账不变量
    pub fn verify_invariants(&self) -> LedgerResult<()> {
        for date in self.start..self.end {
            for i in 0..self.n_items {
                for p in 0..self.n_plants {
                    let (item, plant) = (ItemId(i), PlantId(p));
                    let inv = self.inventory[self.cell(date, item, plant)];
                    if inv.free < 0 {
                        return Err(LedgerViolation::NegativeFree {
                            date,
                            item,
                            plant,
                            free: inv.free,
                        });
                    }
                    if inv.free > inv.total {
                        return Err(LedgerViolation::FreeExceedsTotal {
                            date,
                            item,
                            plant,
                            free: inv.free,
                            total: inv.total,
                        });
                    }
                }
            }

            for s in 0..self.n_sets {
                let set = MachineSetId(s);
                let slot = self.capacity[self.slot(date, set)];
                if slot.remaining < -1e-6 {
                    return Err(LedgerViolation::CapacityOverdrawn {
                        date,
                        machine_set: set,
                        remaining: slot.remaining,
                    });
                }
            }
        }

        let recomputed = self.recompute_holding_cost();
        let tolerance = 1e-6 * recomputed.abs().max(1.0);
        if (recomputed - self.holding_cost).abs() > tolerance {
            return Err(LedgerViolation::HoldingCostDrift {
                ledger: self.holding_cost,
                recomputed,
            });
        }

        Ok(())
    }
}
