// ==========================================
// 排产台账 - 增量操作
// ==========================================
// 每个 add_* 都有对应的 remove_* 逆操作
// ==========================================

use super::Schedule;
use crate::domain::capacity::CapacityConstraint;
use crate::domain::demand::Demand;
use crate::domain::instruction::{ProductionInstruction, SupplyInstruction, TransitInstruction};
use crate::domain::types::{DemandKind, ItemId, PlantId, ProductionId, TransitId};
use tracing::{debug, warn};

impl<'r> Schedule<'r> {
    // ==========================================
    // 库存
    // ==========================================

    /// 自 `date` 起增加库存 (持续到期末), 持有成本同步增加
    pub fn add_inventory(&mut self, date: usize, item: ItemId, plant: PlantId, quantity: i64) {
        self.shift_inventory(date, item, plant, quantity);
    }

    /// 自 `date` 起减少库存, 持有成本同步减少
    pub fn remove_inventory(&mut self, date: usize, item: ItemId, plant: PlantId, quantity: i64) {
        self.shift_inventory(date, item, plant, -quantity);
    }

    /// total 与 free 自 `date` 起整体平移, 再向前回溯修正水位线
    ///
    /// free(d) = min(total(d), free(d+1)); 某日未变化即可停止回溯
    fn shift_inventory(&mut self, date: usize, item: ItemId, plant: PlantId, delta: i64) {
        if delta == 0 || date >= self.end {
            return;
        }
        let date = date.max(self.start);

        for d in date..self.end {
            let idx = self.cell(d, item, plant);
            self.inventory[idx].total += delta;
            self.inventory[idx].free += delta;
        }

        let mut next_free = self.inventory[self.cell(date, item, plant)].free;
        for d in (self.start..date).rev() {
            let idx = self.cell(d, item, plant);
            let cell = &mut self.inventory[idx];
            let free = cell.total.min(next_free);
            if free == cell.free {
                break;
            }
            cell.free = free;
            next_free = free;
        }

        let holding = self.refs.item(item).holding_cost;
        self.holding_cost += holding * delta as f64 * (self.end - date) as f64;
    }

    // ==========================================
    // 供货
    // ==========================================

    /// 订单供货: 扣库存, 冲减自当日起的累计订单需求与延期
    ///
    /// 若当日供货使之后某日累计订单需求为负 (后续已有供货被重复覆盖),
    /// 按日期升序、同日按工厂升序回退后续的订单供货
    pub fn add_order_supply(&mut self, date: usize, item: ItemId, plant: PlantId, quantity: i64) {
        if quantity <= 0 {
            return;
        }
        if !self.in_horizon(date) {
            warn!(date, %item, %plant, quantity, "订单供货日期超出计划期, 忽略");
            return;
        }

        let day = self.day(date);
        self.supply_schedule[day]
            .entry((item, plant))
            .or_insert_with(|| SupplyInstruction::new(item, plant, date))
            .order_quantity += quantity;

        self.remove_inventory(date, item, plant, quantity);

        let idx = self.item_cell(date, item);
        self.order_supplied[idx] += quantity;
        for d in date..self.end {
            let idx = self.item_cell(d, item);
            self.acc_order_demand[idx] -= quantity;
        }
        self.total_delay -= quantity * (self.end - date) as i64;

        self.revert_excess_order_supply(date, item);
    }

    pub fn remove_order_supply(
        &mut self,
        date: usize,
        item: ItemId,
        plant: PlantId,
        quantity: i64,
    ) {
        if quantity <= 0 || !self.in_horizon(date) {
            return;
        }
        let day = self.day(date);
        let Some(instruction) = self.supply_schedule[day].get_mut(&(item, plant)) else {
            warn!(date, %item, %plant, "不存在的订单供货, 无法回退");
            return;
        };

        let quantity = if quantity > instruction.order_quantity {
            warn!(
                date,
                %item,
                %plant,
                requested = quantity,
                available = instruction.order_quantity,
                "回退数量超过已供货数量, 按已供货数量回退"
            );
            instruction.order_quantity
        } else {
            quantity
        };
        if quantity <= 0 {
            return;
        }
        instruction.order_quantity -= quantity;
        if instruction.is_empty() {
            self.supply_schedule[day].remove(&(item, plant));
        }

        self.add_inventory(date, item, plant, quantity);

        let idx = self.item_cell(date, item);
        self.order_supplied[idx] -= quantity;
        for d in date..self.end {
            let idx = self.item_cell(d, item);
            self.acc_order_demand[idx] += quantity;
        }
        self.total_delay += quantity * (self.end - date) as i64;
    }

    fn revert_excess_order_supply(&mut self, date: usize, item: ItemId) {
        let own = self.acc_order_demand[self.item_cell(date, item)];
        if own < 0 {
            warn!(date, %item, excess = -own, "订单供货超过截至当日的累计订单需求");
        }

        for d in date + 1..self.end {
            let mut excess = -self.acc_order_demand[self.item_cell(d, item)];
            if excess <= 0 {
                continue;
            }

            let day = self.day(d);
            let supplies: Vec<(PlantId, i64)> = self.supply_schedule[day]
                .range((item, PlantId(0))..=(item, PlantId(usize::MAX)))
                .filter(|(_, s)| s.order_quantity > 0)
                .map(|((_, plant), s)| (*plant, s.order_quantity))
                .collect();

            for (plant, supplied) in supplies {
                let reverted = supplied.min(excess);
                debug!(date = d, %item, %plant, reverted, "回退重复覆盖的订单供货");
                self.remove_order_supply(d, item, plant, reverted);
                excess -= reverted;
                if excess == 0 {
                    break;
                }
            }
        }
    }

    /// 预测供货: 扣库存, 延期减少供货数量
    pub fn add_forecast_supply(
        &mut self,
        date: usize,
        item: ItemId,
        plant: PlantId,
        quantity: i64,
    ) {
        if quantity <= 0 {
            return;
        }
        if !self.in_horizon(date) {
            warn!(date, %item, %plant, quantity, "预测供货日期超出计划期, 忽略");
            return;
        }

        let day = self.day(date);
        self.supply_schedule[day]
            .entry((item, plant))
            .or_insert_with(|| SupplyInstruction::new(item, plant, date))
            .forecast_quantity += quantity;

        self.remove_inventory(date, item, plant, quantity);

        let idx = self.item_cell(date, item);
        self.forecast_supplied[idx] += quantity;
        self.total_delay -= quantity;
    }

    pub fn remove_forecast_supply(
        &mut self,
        date: usize,
        item: ItemId,
        plant: PlantId,
        quantity: i64,
    ) {
        if quantity <= 0 || !self.in_horizon(date) {
            return;
        }
        let day = self.day(date);
        let Some(instruction) = self.supply_schedule[day].get_mut(&(item, plant)) else {
            warn!(date, %item, %plant, "不存在的预测供货, 无法回退");
            return;
        };

        let quantity = quantity.min(instruction.forecast_quantity);
        if quantity <= 0 {
            return;
        }
        instruction.forecast_quantity -= quantity;
        if instruction.is_empty() {
            self.supply_schedule[day].remove(&(item, plant));
        }

        self.add_inventory(date, item, plant, quantity);

        let idx = self.item_cell(date, item);
        self.forecast_supplied[idx] -= quantity;
        self.total_delay += quantity;
    }

    /// 需求结算: 按需求类型记订单或预测供货, 并扣减需求剩余量
    pub fn settle_demand(&mut self, demand: &mut Demand, date: usize, plant: PlantId, quantity: i64) {
        match demand.kind {
            DemandKind::Order => self.add_order_supply(date, demand.item, plant, quantity),
            DemandKind::Forecast => self.add_forecast_supply(date, demand.item, plant, quantity),
        }
        demand.quantity -= quantity;
    }

    // ==========================================
    // 生产
    // ==========================================

    /// 登记生产: 开工日扣产能, 完工日扣 BOM 组件并入库成品
    pub fn add_production(&mut self, start_date: usize, production: ProductionId, lots: i64) {
        if lots <= 0 {
            return;
        }
        if !self.in_horizon(start_date) {
            warn!(start_date, %production, lots, "开工日超出计划期, 忽略");
            return;
        }

        let refs = self.refs;
        let prod = refs.production(production);
        let finish = start_date + prod.lead_time;
        let quantity = prod.produced_quantity(lots);

        let day = self.day(start_date);
        let instruction = self.production_schedule[day]
            .entry(production)
            .or_insert_with(|| ProductionInstruction {
                production,
                item: prod.item,
                plant: prod.plant,
                start_date,
                finish_date: finish,
                lots: 0,
                quantity: 0,
            });
        instruction.lots += lots;
        instruction.quantity += quantity;

        self.consume_capacity(start_date, production, quantity as f64);

        for component in &prod.bom {
            self.remove_inventory(
                finish,
                component.material,
                prod.plant,
                component.required_for(quantity),
            );
        }
        self.add_inventory(finish, prod.item, prod.plant, quantity);

        self.production_cost += prod.cost * lots as f64;
    }

    pub fn remove_production(&mut self, start_date: usize, production: ProductionId, lots: i64) {
        if lots <= 0 || !self.in_horizon(start_date) {
            return;
        }
        let refs = self.refs;
        let prod = refs.production(production);
        let day = self.day(start_date);
        let Some(instruction) = self.production_schedule[day].get_mut(&production) else {
            warn!(start_date, %production, "不存在的生产指令, 无法回退");
            return;
        };

        let lots = lots.min(instruction.lots);
        let quantity = prod.produced_quantity(lots);
        instruction.lots -= lots;
        instruction.quantity -= quantity;
        let finish = instruction.finish_date;
        if instruction.lots == 0 {
            self.production_schedule[day].remove(&production);
        }

        self.consume_capacity(start_date, production, -(quantity as f64));

        self.remove_inventory(finish, prod.item, prod.plant, quantity);
        for component in &prod.bom {
            self.add_inventory(
                finish,
                component.material,
                prod.plant,
                component.required_for(quantity),
            );
        }

        self.production_cost -= prod.cost * lots as f64;
    }

    fn consume_capacity(&mut self, date: usize, production: ProductionId, quantity: f64) {
        let refs = self.refs;
        let prod = refs.production(production);
        let item = refs.item(prod.item);
        for set in item.machine_sets_at(prod.plant) {
            let rate = item.rate(refs.machine_set(*set).capacity_type);
            if rate > 0.0 {
                let idx = self.slot(date, *set);
                self.capacity[idx].consume(rate * quantity);
            }
        }
    }

    // ==========================================
    // 调拨
    // ==========================================

    /// 登记调拨: 发运日扣发货厂库存, 到货日入收货厂库存
    pub fn add_transit(&mut self, start_date: usize, transit: TransitId, quantity: i64) {
        if quantity <= 0 {
            return;
        }
        if !self.in_horizon(start_date) {
            warn!(start_date, %transit, quantity, "发运日超出计划期, 忽略");
            return;
        }

        let refs = self.refs;
        let t = refs.transit(transit);
        let arrival = start_date + t.lead_time;

        let day = self.day(start_date);
        self.transit_schedule[day]
            .entry(transit)
            .or_insert_with(|| TransitInstruction {
                transit,
                item: t.item,
                source: t.source,
                destination: t.destination,
                start_date,
                arrival_date: arrival,
                quantity: 0,
            })
            .quantity += quantity;

        self.remove_inventory(start_date, t.item, t.source, quantity);
        self.add_inventory(arrival, t.item, t.destination, quantity);

        self.transit_cost += t.cost * quantity as f64;
    }

    pub fn remove_transit(&mut self, start_date: usize, transit: TransitId, quantity: i64) {
        if quantity <= 0 || !self.in_horizon(start_date) {
            return;
        }
        let refs = self.refs;
        let t = refs.transit(transit);
        let day = self.day(start_date);
        let Some(instruction) = self.transit_schedule[day].get_mut(&transit) else {
            warn!(start_date, %transit, "不存在的调拨指令, 无法回退");
            return;
        };

        let quantity = quantity.min(instruction.quantity);
        instruction.quantity -= quantity;
        let arrival = instruction.arrival_date;
        if instruction.quantity == 0 {
            self.transit_schedule[day].remove(&transit);
        }

        self.remove_inventory(arrival, t.item, t.destination, quantity);
        self.add_inventory(start_date, t.item, t.source, quantity);

        self.transit_cost -= t.cost * quantity as f64;
    }
}
