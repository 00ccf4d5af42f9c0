// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 按名称搭建小型多工厂网络, 提供各场景的参考数据
// ==========================================
#![allow(dead_code)]

use multi_plant_aps::domain::production::BomComponent;
use multi_plant_aps::domain::reference::{ReferenceData, ReferenceDataBuilder};
use multi_plant_aps::domain::types::{CapacityType, ItemId, PlantId};
use multi_plant_aps::engine::{ActiveChain, Schedule};

// ==========================================
// NetworkBuilder - 按名称搭建网络
// ==========================================

pub struct NetworkBuilder {
    b: ReferenceDataBuilder,
}

impl NetworkBuilder {
    pub fn new(period: usize) -> Self {
        Self {
            b: ReferenceDataBuilder::new(period),
        }
    }

    fn item_id(&self, name: &str) -> ItemId {
        self.b.find_item(name).unwrap()
    }

    fn plant_id(&self, name: &str) -> PlantId {
        self.b.find_plant(name).unwrap()
    }

    pub fn plant(mut self, name: &str) -> Self {
        self.b.add_plant(name, 0);
        self
    }

    pub fn locked_plant(mut self, name: &str, locked_out_days: usize) -> Self {
        self.b.add_plant(name, locked_out_days);
        self
    }

    pub fn item(mut self, name: &str, holding_cost: f64) -> Self {
        self.b.add_item(name, holding_cost);
        self
    }

    pub fn inventory(mut self, item: &str, plant: &str, quantity: i64) -> Self {
        let (i, p) = (self.item_id(item), self.plant_id(plant));
        self.b.add_initial_inventory(i, p, quantity);
        self
    }

    pub fn order(mut self, item: &str, date: usize, quantity: i64) -> Self {
        let i = self.item_id(item);
        self.b.add_order_demand(i, date, quantity);
        self
    }

    pub fn forecast(mut self, item: &str, date: usize, quantity: i64) -> Self {
        let i = self.item_id(item);
        self.b.add_forecast_demand(i, date, quantity);
        self
    }

    pub fn purchase_order(mut self, item: &str, plant: &str, date: usize, quantity: i64) -> Self {
        let (i, p) = (self.item_id(item), self.plant_id(plant));
        self.b.add_purchase_order(p, i, date, quantity);
        self
    }

    /// 生产工艺 + 专用机台组 `<item>@<plant>` (Pcs, 每日产能 `daily_capacity`, 消耗率 `rate`)
    ///
    /// `rate` 为 0 时产能不受约束
    pub fn production(
        mut self,
        item: &str,
        plant: &str,
        cost: f64,
        lead_time: usize,
        lot_size: i64,
        daily_capacity: f64,
        rate: f64,
    ) -> Self {
        let (i, p) = (self.item_id(item), self.plant_id(plant));
        let set = self
            .b
            .add_machine_set(&format!("{}@{}", item, plant), p, CapacityType::Pcs);
        for d in 0..self.b.period() {
            self.b.set_capacity(set, d, daily_capacity);
        }
        self.b.assign_machine_set(i, set);
        self.b.set_rate(i, CapacityType::Pcs, rate);
        self.b.add_production(i, p, cost, lead_time, lot_size);
        self
    }

    /// 多个物料共用的机台组 (Pcs), 各物料消耗率均为 `rate`
    pub fn machine_set(
        mut self,
        name: &str,
        plant: &str,
        daily_capacity: f64,
        items: &[&str],
        rate: f64,
    ) -> Self {
        let p = self.plant_id(plant);
        let set = self.b.add_machine_set(name, p, CapacityType::Pcs);
        for d in 0..self.b.period() {
            self.b.set_capacity(set, d, daily_capacity);
        }
        for item in items {
            let i = self.item_id(item);
            self.b.assign_machine_set(i, set);
            self.b.set_rate(i, CapacityType::Pcs, rate);
        }
        self
    }

    /// 只登记生产工艺, 机台组由 `machine_set` 另行指定
    pub fn production_on(mut self, item: &str, plant: &str, cost: f64, lead_time: usize, lot_size: i64) -> Self {
        let (i, p) = (self.item_id(item), self.plant_id(plant));
        self.b.add_production(i, p, cost, lead_time, lot_size);
        self
    }

    pub fn limits(mut self, item: &str, plant: &str, min: i64, max: Option<i64>) -> Self {
        let (i, p) = (self.item_id(item), self.plant_id(plant));
        let pid = self.b.production_at(i, p).unwrap();
        self.b.set_production_limits(pid, min, max);
        self
    }

    pub fn bom(mut self, item: &str, plant: &str, component: &str, quantity: i64) -> Self {
        let (i, p, c) = (
            self.item_id(item),
            self.plant_id(plant),
            self.item_id(component),
        );
        let pid = self.b.production_at(i, p).unwrap();
        self.b.add_bom(pid, BomComponent::new(c, quantity));
        self
    }

    pub fn transit(mut self, item: &str, from: &str, to: &str, cost: f64, lead_time: usize) -> Self {
        let (i, f, t) = (self.item_id(item), self.plant_id(from), self.plant_id(to));
        self.b.add_transit(i, f, t, cost, lead_time);
        self
    }

    pub fn build(self) -> ReferenceData {
        self.b.build()
    }
}

// ==========================================
// 名称解析
// ==========================================

pub fn item(refs: &ReferenceData, name: &str) -> ItemId {
    refs.find_item(name).unwrap()
}

pub fn plant(refs: &ReferenceData, name: &str) -> PlantId {
    refs.find_plant(name).unwrap()
}

// ==========================================
// 场景
// ==========================================

/// A: X 在 P 期初 10, 第 0 天订单 6
pub fn scenario_direct_inventory() -> ReferenceData {
    NetworkBuilder::new(5)
        .plant("P")
        .item("X", 1.0)
        .inventory("X", "P", 10)
        .order("X", 0, 6)
        .build()
}

/// B: Y 只能在 Q 生产 (生产期 3, 批量 10, 产能不限), 第 5 天订单 25
pub fn scenario_production_path() -> ReferenceData {
    NetworkBuilder::new(10)
        .plant("Q")
        .item("Y", 1.0)
        .production("Y", "Q", 100.0, 3, 10, 1000.0, 0.0)
        .order("Y", 5, 25)
        .build()
}

/// E: B 的基础上第 6 天再有订单 3, 由第 5 天的整批余量供给
pub fn scenario_lot_leftover() -> ReferenceData {
    NetworkBuilder::new(10)
        .plant("Q")
        .item("Y", 1.0)
        .production("Y", "Q", 100.0, 3, 10, 1000.0, 0.0)
        .order("Y", 5, 25)
        .order("Y", 6, 3)
        .build()
}

/// F: 第 2 天预测 4, 采购到货在第 3 天, 超出预测的交付窗口
pub fn scenario_late_forecast_receipt() -> ReferenceData {
    NetworkBuilder::new(6)
        .plant("P")
        .item("F", 1.0)
        .forecast("F", 2, 4)
        .purchase_order("F", "P", 3, 4)
        .build()
}

/// C: Z 每件耗 2 个 W, R 只有 4 个 W; 第 3 天订单 5
pub fn scenario_bom_shortage() -> ReferenceData {
    NetworkBuilder::new(8)
        .plant("R")
        .item("Z", 1.0)
        .item("W", 0.5)
        .production("Z", "R", 3.0, 1, 1, 1000.0, 1.0)
        .bom("Z", "R", "W", 2)
        .inventory("W", "R", 4)
        .order("Z", 3, 5)
        .build()
}

/// D: A(7) 与 B(8) 各一条运输期 2 的线路调拨 X 到 S
pub fn scenario_transit_tie() -> ReferenceData {
    NetworkBuilder::new(10)
        .plant("A")
        .plant("B")
        .plant("S")
        .item("X", 1.0)
        .inventory("X", "A", 7)
        .inventory("X", "B", 8)
        .transit("X", "A", "S", 2.0, 2)
        .transit("X", "B", "S", 1.0, 2)
        .build()
}

/// 各场景合并, 物料之间互不相关
pub fn mixed_network() -> ReferenceData {
    NetworkBuilder::new(10)
        .plant("P")
        .plant("Q")
        .plant("R")
        .plant("A")
        .plant("B")
        .plant("S")
        .item("X", 1.0)
        .item("Y", 1.0)
        .item("Z", 1.0)
        .item("W", 0.5)
        .item("V", 2.0)
        // A
        .inventory("X", "P", 10)
        .order("X", 0, 6)
        // B
        .production("Y", "Q", 100.0, 3, 10, 1000.0, 0.0)
        .order("Y", 5, 25)
        // C
        .production("Z", "R", 3.0, 1, 1, 1000.0, 1.0)
        .bom("Z", "R", "W", 2)
        .inventory("W", "R", 4)
        .order("Z", 3, 5)
        // D
        .inventory("V", "A", 7)
        .inventory("V", "B", 8)
        .transit("V", "A", "S", 2.0, 2)
        .transit("V", "B", "S", 1.0, 2)
        .order("V", 5, 15)
        .forecast("V", 6, 3)
        .build()
}

/// K 在 Q 每日产能 12, 批量 5, 生产期 1; 第 4 天订单 40
pub fn capacity_bound_network() -> ReferenceData {
    NetworkBuilder::new(8)
        .plant("Q")
        .item("K", 1.0)
        .production("K", "Q", 5.0, 1, 5, 12.0, 1.0)
        .order("K", 4, 40)
        .build()
}

/// A 在 P 由 B, C 各 1 件组装 (生产期 1); B, C 在 P 共用每日 10 件的机台组 M;
/// 第 2 天订单 10
pub fn shared_machine_set_network() -> ReferenceData {
    NetworkBuilder::new(6)
        .plant("P")
        .item("A", 1.0)
        .item("B", 0.5)
        .item("C", 0.5)
        .production("A", "P", 10.0, 1, 1, 1000.0, 1.0)
        .machine_set("M", "P", 10.0, &["B", "C"], 1.0)
        .production_on("B", "P", 1.0, 1, 1)
        .production_on("C", "P", 1.0, 1, 1)
        .bom("A", "P", "B", 1)
        .bom("A", "P", "C", 1)
        .order("A", 2, 10)
        .build()
}

// ==========================================
// 断言辅助
// ==========================================

/// 台账不变量 + 持有成本独立重算
pub fn assert_ledger_consistent(schedule: &Schedule<'_>) {
    schedule.verify_invariants().unwrap();
    let recomputed = schedule.recompute_holding_cost();
    assert!(
        (schedule.holding_cost() - recomputed).abs() < 1e-6,
        "holding cost drift: ledger {} vs recomputed {}",
        schedule.holding_cost(),
        recomputed
    );
}

/// 跳数: 库存为 0, 否则比所用的每个上游都大
pub fn assert_hops_monotone(chain: &ActiveChain) {
    if chain.is_direct_inventory() {
        assert_eq!(chain.hops, 0);
        return;
    }
    assert!(chain.hops >= 1);
    if let Some(production) = &chain.production {
        for component in &production.components {
            assert!(chain.hops > component.hops);
            assert_hops_monotone(component);
        }
    }
    for lane in &chain.lanes {
        assert!(chain.hops > lane.source.hops);
        assert_hops_monotone(&lane.source);
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
