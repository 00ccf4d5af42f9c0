use super::*;
use crate::domain::demand::Demand;
use crate::domain::production::BomComponent;
use crate::domain::reference::ReferenceDataBuilder;
use crate::domain::types::CapacityType;

// ==========================================
// 测试辅助函数
// ==========================================

struct Fixture {
    refs: ReferenceData,
    x: ItemId,
    y: ItemId,
    w: ItemId,
    p: PlantId,
    q: PlantId,
    s: PlantId,
    prod_y: ProductionId,
    transit_ps: TransitId,
    machine: MachineSetId,
}

/// P: X 期初 10; Q: Y 工艺 (W x2), W 期初 40; P->S 调拨 X
fn fixture(order_x: &[(usize, i64)], forecast_x: &[(usize, i64)]) -> Fixture {
    let mut b = ReferenceDataBuilder::new(10);
    let p = b.add_plant("P", 0);
    let q = b.add_plant("Q", 0);
    let s = b.add_plant("S", 0);
    let x = b.add_item("X", 1.0);
    let y = b.add_item("Y", 2.0);
    let w = b.add_item("W", 0.5);

    b.add_initial_inventory(x, p, 10);
    b.add_initial_inventory(w, q, 40);
    for (date, qty) in order_x {
        b.add_order_demand(x, *date, *qty);
    }
    for (date, qty) in forecast_x {
        b.add_forecast_demand(x, *date, *qty);
    }

    let machine = b.add_machine_set("M", q, CapacityType::Pcs);
    for d in 0..10 {
        b.set_capacity(machine, d, 100.0);
    }
    b.assign_machine_set(y, machine);
    b.set_rate(y, CapacityType::Pcs, 2.0);
    let prod = b.add_production(y, q, 50.0, 2, 5);
    b.add_bom(prod, BomComponent::new(w, 2));
    let transit_ps = b.add_transit(x, p, s, 1.5, 2);

    let refs = b.build();
    let prod_y = refs.production_at(y, q).map(|p| p.id).unwrap();
    Fixture {
        refs,
        x,
        y,
        w,
        p,
        q,
        s,
        prod_y,
        transit_ps,
        machine,
    }
}

fn snapshot(schedule: &Schedule<'_>, item: ItemId, plant: PlantId) -> Vec<Inventory> {
    (schedule.start_date()..schedule.end_date())
        .map(|d| schedule.inventory(d, item, plant))
        .collect()
}

// ==========================================
// 初始化
// ==========================================

#[test]
fn test_init_with_initial_inventory() {
    let f = fixture(&[], &[]);
    let schedule = Schedule::new(&f.refs, 0);

    assert_eq!(schedule.inventory(0, f.x, f.p), Inventory::new(10, 10));
    assert_eq!(schedule.inventory(9, f.x, f.p), Inventory::new(10, 10));
    // 持有成本: X 10*1*10 + W 40*0.5*10
    assert_eq!(schedule.holding_cost(), 300.0);
    assert_eq!(schedule.total_delay(), 0);
    assert!(schedule.verify_invariants().is_ok());
}

#[test]
fn test_init_accumulates_order_demand_and_delay() {
    let f = fixture(&[(2, 6), (4, 1)], &[(1, 3)]);
    let schedule = Schedule::new(&f.refs, 0);

    assert_eq!(schedule.acc_order_demand(1, f.x), 0);
    assert_eq!(schedule.acc_order_demand(2, f.x), 6);
    assert_eq!(schedule.acc_order_demand(4, f.x), 7);
    // 6*8 + 1*6 + 预测 3
    assert_eq!(schedule.total_delay(), 48 + 6 + 3);
}

#[test]
fn test_receipts_before_start_land_on_start() {
    let mut b = ReferenceDataBuilder::new(6);
    let p = b.add_plant("P", 0);
    let x = b.add_item("X", 1.0);
    b.add_purchase_order(p, x, 1, 5);
    b.add_work_in_process(p, x, 4, 2);
    let refs = b.build();

    let schedule = Schedule::new(&refs, 2);
    assert_eq!(schedule.start_date(), 2);
    assert_eq!(schedule.total(2, x, p), 5);
    assert_eq!(schedule.total(4, x, p), 7);
    assert_eq!(schedule.free(2, x, p), 5);
    assert!(schedule.verify_invariants().is_ok());
}

// ==========================================
// 库存
// ==========================================

#[test]
fn test_add_remove_inventory_round_trip() {
    let f = fixture(&[], &[]);
    let mut schedule = Schedule::new(&f.refs, 0);
    let before = snapshot(&schedule, f.x, f.p);
    let holding = schedule.holding_cost();

    schedule.add_inventory(3, f.x, f.p, 5);
    assert_eq!(schedule.inventory(2, f.x, f.p), Inventory::new(10, 10));
    assert_eq!(schedule.inventory(3, f.x, f.p), Inventory::new(15, 15));
    assert_eq!(schedule.holding_cost(), holding + 35.0);

    schedule.remove_inventory(3, f.x, f.p, 5);
    assert_eq!(snapshot(&schedule, f.x, f.p), before);
    assert_eq!(schedule.holding_cost(), holding);
}

#[test]
fn test_free_watermark_follows_later_removal() {
    let f = fixture(&[], &[]);
    let mut schedule = Schedule::new(&f.refs, 0);

    schedule.remove_inventory(5, f.x, f.p, 4);
    assert_eq!(schedule.inventory(5, f.x, f.p), Inventory::new(6, 6));
    // 之前各日的在库不变, 但只剩 6 件未被承诺
    assert_eq!(schedule.inventory(0, f.x, f.p), Inventory::new(10, 6));
    assert_eq!(schedule.inventory(4, f.x, f.p).promised(), 4);

    schedule.add_inventory(7, f.x, f.p, 10);
    assert_eq!(schedule.inventory(0, f.x, f.p), Inventory::new(10, 6));
    assert_eq!(schedule.inventory(7, f.x, f.p), Inventory::new(16, 16));
    assert!(schedule.verify_invariants().is_ok());
}

#[test]
fn test_verify_detects_negative_free() {
    let f = fixture(&[], &[]);
    let mut schedule = Schedule::new(&f.refs, 0);
    schedule.remove_inventory(0, f.x, f.p, 20);
    assert!(matches!(
        schedule.verify_invariants(),
        Err(LedgerViolation::NegativeFree { .. })
    ));
}

// ==========================================
// 供货
// ==========================================

#[test]
fn test_order_supply_on_due_date() {
    let f = fixture(&[(2, 6)], &[]);
    let mut schedule = Schedule::new(&f.refs, 0);

    schedule.add_order_supply(2, f.x, f.p, 6);

    let instruction = schedule.supply_instruction(2, f.x, f.p).unwrap();
    assert_eq!(instruction.order_quantity, 6);
    assert_eq!(schedule.inventory(2, f.x, f.p), Inventory::new(4, 4));
    assert_eq!(schedule.inventory(0, f.x, f.p), Inventory::new(10, 4));
    assert_eq!(schedule.acc_order_demand(9, f.x), 0);
    assert_eq!(schedule.total_delay(), 0);
    assert_eq!(schedule.calc_fill_rate(), 1.0);
    assert!(schedule.verify_invariants().is_ok());
}

#[test]
fn test_late_order_supply_counts_delay() {
    let f = fixture(&[(2, 6)], &[]);
    let mut schedule = Schedule::new(&f.refs, 0);

    schedule.add_order_supply(4, f.x, f.p, 6);

    assert_eq!(schedule.acc_order_demand(3, f.x), 6);
    assert_eq!(schedule.acc_order_demand(4, f.x), 0);
    assert_eq!(schedule.total_delay(), 12);
    assert_eq!(schedule.calc_fill_rate(), 0.0);
}

#[test]
fn test_order_supply_round_trip() {
    let f = fixture(&[(2, 6)], &[]);
    let mut schedule = Schedule::new(&f.refs, 0);
    let before = snapshot(&schedule, f.x, f.p);
    let delay = schedule.total_delay();

    schedule.add_order_supply(3, f.x, f.p, 4);
    schedule.remove_order_supply(3, f.x, f.p, 4);

    assert_eq!(snapshot(&schedule, f.x, f.p), before);
    assert_eq!(schedule.total_delay(), delay);
    assert!(schedule.supply_instruction(3, f.x, f.p).is_none());
    assert_eq!(schedule.order_supplied(3, f.x), 0);
}

#[test]
fn test_earlier_order_supply_reverts_later_one() {
    let f = fixture(&[(2, 6)], &[]);
    let mut schedule = Schedule::new(&f.refs, 0);

    schedule.add_order_supply(5, f.x, f.p, 6);
    assert_eq!(schedule.total_delay(), 18);

    // 提前到第 3 天供货, 第 5 天的供货被回退
    schedule.add_order_supply(3, f.x, f.p, 6);

    assert!(schedule.supply_instruction(5, f.x, f.p).is_none());
    assert_eq!(schedule.order_supplied(5, f.x), 0);
    assert_eq!(schedule.acc_order_demand(5, f.x), 0);
    assert_eq!(schedule.acc_order_demand(2, f.x), 6);
    assert_eq!(schedule.total_delay(), 6);
    assert_eq!(schedule.total(9, f.x, f.p), 4);
    assert!(schedule.verify_invariants().is_ok());
}

#[test]
fn test_forecast_supply_round_trip() {
    let f = fixture(&[], &[(1, 3)]);
    let mut schedule = Schedule::new(&f.refs, 0);
    assert_eq!(schedule.total_delay(), 3);

    schedule.add_forecast_supply(1, f.x, f.p, 3);
    assert_eq!(schedule.total_delay(), 0);
    assert_eq!(schedule.forecast_supplied(1, f.x), 3);
    assert_eq!(schedule.calc_fill_rate(), 1.0);

    schedule.remove_forecast_supply(1, f.x, f.p, 3);
    assert_eq!(schedule.total_delay(), 3);
    assert_eq!(schedule.total(1, f.x, f.p), 10);
    assert!(schedule.supply_instruction(1, f.x, f.p).is_none());
}

#[test]
fn test_settle_demand_dispatches_on_kind() {
    let f = fixture(&[(2, 6)], &[(2, 2)]);
    let mut schedule = Schedule::new(&f.refs, 0);

    let mut forecast = Demand::forecast(f.x, 2, 2);
    schedule.settle_demand(&mut forecast, 2, f.p, 2);
    assert!(forecast.is_satisfied());
    assert_eq!(schedule.forecast_supplied(2, f.x), 2);
    assert_eq!(schedule.order_supplied(2, f.x), 0);

    let mut order = Demand::order(f.x, 2, 6);
    schedule.settle_demand(&mut order, 2, f.p, 5);
    assert_eq!(order.quantity, 1);
    assert_eq!(schedule.order_supplied(2, f.x), 5);

    let instruction = schedule.supply_instruction(2, f.x, f.p).unwrap();
    assert_eq!(instruction.quantity(), 7);
    // 第 2 天需求 8, 供货 7
    assert!((schedule.calc_fill_rate() - 7.0 / 8.0).abs() < 1e-9);
}

#[test]
fn test_fill_rate_without_demand_is_one() {
    let f = fixture(&[], &[]);
    let schedule = Schedule::new(&f.refs, 0);
    assert_eq!(schedule.calc_fill_rate(), 1.0);
}

// ==========================================
// 生产与调拨
// ==========================================

#[test]
fn test_add_production_consumes_capacity_and_bom() {
    let f = fixture(&[], &[]);
    let mut schedule = Schedule::new(&f.refs, 0);
    assert_eq!(schedule.max_quantity_from_capacity(f.prod_y, 1), 50);

    schedule.add_production(1, f.prod_y, 3);

    let slot = schedule.capacity(1, f.machine);
    assert_eq!(slot.remaining, 70.0);
    assert_eq!(schedule.max_quantity_from_capacity(f.prod_y, 1), 35);
    // 完工日 (第 3 天) 扣 30 件 W, 入 15 件 Y
    assert_eq!(schedule.total(2, f.w, f.q), 40);
    assert_eq!(schedule.free(2, f.w, f.q), 10);
    assert_eq!(schedule.total(3, f.w, f.q), 10);
    assert_eq!(schedule.total(3, f.y, f.q), 15);
    assert_eq!(schedule.total(2, f.y, f.q), 0);
    assert_eq!(schedule.production_cost(), 150.0);

    let instruction = schedule.production_instructions(1).next().unwrap();
    assert_eq!(instruction.lots, 3);
    assert_eq!(instruction.quantity, 15);
    assert_eq!(instruction.finish_date, 3);
    assert!(schedule.verify_invariants().is_ok());
}

#[test]
fn test_production_round_trip() {
    let f = fixture(&[], &[]);
    let mut schedule = Schedule::new(&f.refs, 0);
    let w_before = snapshot(&schedule, f.w, f.q);
    let holding = schedule.holding_cost();

    schedule.add_production(1, f.prod_y, 3);
    schedule.remove_production(1, f.prod_y, 3);

    assert_eq!(snapshot(&schedule, f.w, f.q), w_before);
    assert_eq!(schedule.total(9, f.y, f.q), 0);
    assert!((schedule.holding_cost() - holding).abs() < 1e-9);
    assert_eq!(schedule.production_cost(), 0.0);
    assert_eq!(schedule.capacity(1, f.machine).remaining, 100.0);
    assert_eq!(schedule.production_instructions(1).count(), 0);
}

#[test]
fn test_transit_moves_inventory() {
    let f = fixture(&[], &[]);
    let mut schedule = Schedule::new(&f.refs, 0);
    let holding = schedule.holding_cost();

    schedule.add_transit(1, f.transit_ps, 4);

    assert_eq!(schedule.total(1, f.x, f.p), 6);
    assert_eq!(schedule.total(2, f.x, f.s), 0);
    assert_eq!(schedule.total(3, f.x, f.s), 4);
    assert_eq!(schedule.transit_cost(), 6.0);
    // 在途两天不计持有成本
    assert_eq!(schedule.holding_cost(), holding - 8.0);
    assert!(schedule.verify_invariants().is_ok());

    schedule.remove_transit(1, f.transit_ps, 4);
    assert_eq!(schedule.total(1, f.x, f.p), 10);
    assert_eq!(schedule.total(3, f.x, f.s), 0);
    assert_eq!(schedule.transit_cost(), 0.0);
    assert_eq!(schedule.holding_cost(), holding);
    assert_eq!(schedule.transit_instructions(1).count(), 0);
}

#[test]
fn test_capacity_missing_dates_are_zero() {
    let mut b = ReferenceDataBuilder::new(4);
    let p = b.add_plant("P", 0);
    let y = b.add_item("Y", 1.0);
    let m = b.add_machine_set("M", p, CapacityType::Point);
    b.set_capacity(m, 2, 9.0);
    b.assign_machine_set(y, m);
    b.set_rate(y, CapacityType::Point, 3.0);
    b.add_production(y, p, 1.0, 1, 1);
    let refs = b.build();
    let pid = refs.production_at(y, p).unwrap().id;

    let schedule = Schedule::new(&refs, 0);
    assert_eq!(schedule.max_quantity_from_capacity(pid, 1), 0);
    assert_eq!(schedule.max_quantity_from_capacity(pid, 2), 3);
}
