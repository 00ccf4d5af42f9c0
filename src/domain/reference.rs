// ==========================================
// 多工厂供应计划系统 - 参考数据
// ==========================================
// 职责: 一次加载、计划期内只读的主数据集合
// 红线: 物料在某工厂无机台组时, 该工厂的生产工艺在链接阶段剔除
// ==========================================

use crate::domain::capacity::MachineSet;
use crate::domain::item::Item;
use crate::domain::plant::Plant;
use crate::domain::production::{BomComponent, Production, Transit};
use crate::domain::types::{CapacityType, ItemId, MachineSetId, PlantId, ProductionId, TransitId};
use std::collections::HashMap;
use tracing::{debug, warn};

// ==========================================
// ReferenceData - 链接完成的参考数据
// ==========================================
#[derive(Debug, Clone)]
pub struct ReferenceData {
    period: usize,
    items: Vec<Item>,
    plants: Vec<Plant>,
    machine_sets: Vec<MachineSet>,
    productions: Vec<Production>,
    transits: Vec<Transit>,

    // ===== 名称索引 =====
    item_index: HashMap<String, ItemId>,
    plant_index: HashMap<String, PlantId>,
    machine_set_index: HashMap<String, MachineSetId>,

    // ===== 链接结果 =====
    inbound: HashMap<(ItemId, PlantId), Vec<TransitId>>,
}

impl ReferenceData {
    /// 计划期长度, 日期下标范围 `[0, period)`
    pub fn period(&self) -> usize {
        self.period
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn machine_sets(&self) -> &[MachineSet] {
        &self.machine_sets
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn transits(&self) -> &[Transit] {
        &self.transits
    }

    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.index()]
    }

    pub fn plant(&self, id: PlantId) -> &Plant {
        &self.plants[id.index()]
    }

    pub fn machine_set(&self, id: MachineSetId) -> &MachineSet {
        &self.machine_sets[id.index()]
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.index()]
    }

    pub fn transit(&self, id: TransitId) -> &Transit {
        &self.transits[id.index()]
    }

    pub fn find_item(&self, name: &str) -> Option<ItemId> {
        self.item_index.get(name).copied()
    }

    pub fn find_plant(&self, name: &str) -> Option<PlantId> {
        self.plant_index.get(name).copied()
    }

    pub fn find_machine_set(&self, name: &str) -> Option<MachineSetId> {
        self.machine_set_index.get(name).copied()
    }

    /// 物料在工厂的生产工艺 (已剔除无机台组的工艺)
    pub fn production_at(&self, item: ItemId, plant: PlantId) -> Option<&Production> {
        self.item(item)
            .productions
            .get(&plant)
            .map(|id| self.production(*id))
    }

    /// 运入 (物料, 工厂) 的调拨线路, 按线路下标升序
    pub fn transits_into(&self, item: ItemId, plant: PlantId) -> &[TransitId] {
        self.inbound
            .get(&(item, plant))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

// ==========================================
// ReferenceDataBuilder - 参考数据构建器
// ==========================================
// 加载器与测试共用; build() 完成链接
#[derive(Debug, Default)]
pub struct ReferenceDataBuilder {
    period: usize,
    items: Vec<Item>,
    plants: Vec<Plant>,
    machine_sets: Vec<MachineSet>,
    productions: Vec<Production>,
    transits: Vec<Transit>,
    item_index: HashMap<String, ItemId>,
    plant_index: HashMap<String, PlantId>,
    machine_set_index: HashMap<String, MachineSetId>,
}

impl ReferenceDataBuilder {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    // ==========================================
    // 主数据登记
    // ==========================================

    /// 登记工厂; 重名时返回已有工厂
    pub fn add_plant(&mut self, name: &str, locked_out_days: usize) -> PlantId {
        if let Some(id) = self.plant_index.get(name) {
            warn!(plant = name, "工厂重复登记, 沿用首条");
            return *id;
        }
        let id = PlantId(self.plants.len());
        self.plants.push(Plant::new(id, name, locked_out_days));
        self.plant_index.insert(name.to_string(), id);
        id
    }

    /// 登记物料; 重名时返回已有物料
    pub fn add_item(&mut self, name: &str, holding_cost: f64) -> ItemId {
        if let Some(id) = self.item_index.get(name) {
            warn!(item = name, "物料重复登记, 沿用首条");
            return *id;
        }
        let id = ItemId(self.items.len());
        self.items.push(Item::new(id, name, holding_cost));
        self.item_index.insert(name.to_string(), id);
        id
    }

    pub fn add_machine_set(
        &mut self,
        name: &str,
        plant: PlantId,
        capacity_type: CapacityType,
    ) -> MachineSetId {
        if let Some(id) = self.machine_set_index.get(name) {
            warn!(machine_set = name, "机台组重复登记, 沿用首条");
            return *id;
        }
        let id = MachineSetId(self.machine_sets.len());
        self.machine_sets
            .push(MachineSet::new(id, name, plant, capacity_type));
        self.machine_set_index.insert(name.to_string(), id);
        id
    }

    pub fn find_item(&self, name: &str) -> Option<ItemId> {
        self.item_index.get(name).copied()
    }

    pub fn find_plant(&self, name: &str) -> Option<PlantId> {
        self.plant_index.get(name).copied()
    }

    pub fn find_machine_set(&self, name: &str) -> Option<MachineSetId> {
        self.machine_set_index.get(name).copied()
    }

    // ==========================================
    // 产能
    // ==========================================

    pub fn set_capacity(&mut self, set: MachineSetId, date: usize, capacity: f64) {
        self.machine_sets[set.index()].capacity.insert(date, capacity);
    }

    pub fn set_rate(&mut self, item: ItemId, capacity_type: CapacityType, rate: f64) {
        self.items[item.index()].rates.insert(capacity_type, rate);
    }

    /// 物料可在该机台组生产 (机台组所在工厂即生产工厂)
    pub fn assign_machine_set(&mut self, item: ItemId, set: MachineSetId) {
        let plant = self.machine_sets[set.index()].plant;
        let sets = self.items[item.index()]
            .machine_sets
            .entry(plant)
            .or_default();
        if !sets.contains(&set) {
            sets.push(set);
        }
    }

    // ==========================================
    // 工艺与调拨
    // ==========================================

    /// 登记生产工艺, 返回的下标在 build() 前有效
    pub fn add_production(
        &mut self,
        item: ItemId,
        plant: PlantId,
        cost: f64,
        lead_time: usize,
        lot_size: i64,
    ) -> ProductionId {
        let id = ProductionId(self.productions.len());
        self.productions
            .push(Production::new(id, item, plant, cost, lead_time, lot_size));
        id
    }

    pub fn set_production_limits(
        &mut self,
        production: ProductionId,
        min_production: i64,
        max_production: Option<i64>,
    ) {
        let p = &mut self.productions[production.index()];
        p.min_production = min_production.max(0);
        p.max_production = max_production;
    }

    /// 最近一次为 (物料, 工厂) 登记的工艺
    pub fn production_at(&self, item: ItemId, plant: PlantId) -> Option<ProductionId> {
        self.productions
            .iter()
            .rev()
            .find(|p| p.item == item && p.plant == plant)
            .map(|p| p.id)
    }

    pub fn add_bom(&mut self, production: ProductionId, component: BomComponent) {
        self.productions[production.index()].bom.push(component);
    }

    pub fn add_transit(
        &mut self,
        item: ItemId,
        source: PlantId,
        destination: PlantId,
        cost: f64,
        lead_time: usize,
    ) -> TransitId {
        let id = TransitId(self.transits.len());
        self.transits.push(Transit {
            id,
            item,
            source,
            destination,
            cost,
            lead_time,
        });
        id
    }

    // ==========================================
    // 需求与库存
    // ==========================================

    pub fn add_order_demand(&mut self, item: ItemId, date: usize, quantity: i64) {
        *self.items[item.index()]
            .order_demand
            .entry(date)
            .or_insert(0) += quantity;
    }

    pub fn add_forecast_demand(&mut self, item: ItemId, date: usize, quantity: i64) {
        *self.items[item.index()]
            .forecast_demand
            .entry(date)
            .or_insert(0) += quantity;
    }

    pub fn add_initial_inventory(&mut self, item: ItemId, plant: PlantId, quantity: i64) {
        *self.items[item.index()]
            .initial_inventory
            .entry(plant)
            .or_insert(0) += quantity;
    }

    pub fn add_purchase_order(&mut self, plant: PlantId, item: ItemId, date: usize, quantity: i64) {
        *self.plants[plant.index()]
            .purchase_orders
            .entry(date)
            .or_default()
            .entry(item)
            .or_insert(0) += quantity;
    }

    pub fn add_work_in_process(
        &mut self,
        plant: PlantId,
        item: ItemId,
        date: usize,
        quantity: i64,
    ) {
        *self.plants[plant.index()]
            .work_in_process
            .entry(date)
            .or_default()
            .entry(item)
            .or_insert(0) += quantity;
    }

    // ==========================================
    // 链接
    // ==========================================

    /// 完成链接并冻结参考数据
    ///
    /// 1) 剔除物料在该工厂无机台组的工艺, 剩余工艺重新编号
    /// 2) 建立调拨伙伴与运入索引
    /// 3) 计算每个物料可持有的工厂
    pub fn build(self) -> ReferenceData {
        let ReferenceDataBuilder {
            period,
            mut items,
            mut plants,
            machine_sets,
            productions,
            transits,
            item_index,
            plant_index,
            machine_set_index,
        } = self;

        // ===== 1) 工艺剔除 =====
        let mut linked: Vec<Production> = Vec::with_capacity(productions.len());
        for mut production in productions {
            let item = &mut items[production.item.index()];
            if item.machine_sets_at(production.plant).is_empty() {
                warn!(
                    item = %item.name,
                    plant = %plants[production.plant.index()].name,
                    "物料在该工厂无机台组, 剔除生产工艺"
                );
                continue;
            }
            let id = ProductionId(linked.len());
            production.id = id;
            if item.productions.insert(production.plant, id).is_some() {
                warn!(item = %item.name, "同一工厂重复的生产工艺, 以后登记者为准");
            }
            linked.push(production);
        }
        // 被覆盖的工艺不再可达, 从列表中去掉并重新编号
        let mut productions: Vec<Production> = linked
            .into_iter()
            .filter(|p| items[p.item.index()].productions.get(&p.plant) == Some(&p.id))
            .collect();
        for (idx, p) in productions.iter_mut().enumerate() {
            p.id = ProductionId(idx);
            items[p.item.index()].productions.insert(p.plant, p.id);
        }

        // ===== 2) 调拨索引 =====
        let mut inbound: HashMap<(ItemId, PlantId), Vec<TransitId>> = HashMap::new();
        for transit in &transits {
            plants[transit.source.index()]
                .transit_out
                .entry(transit.item)
                .or_default()
                .insert(transit.destination);
            plants[transit.destination.index()]
                .transit_in
                .entry(transit.item)
                .or_default()
                .insert(transit.source);
            inbound
                .entry((transit.item, transit.destination))
                .or_default()
                .push(transit.id);
        }

        // ===== 3) 可持有工厂 =====
        for item in items.iter_mut() {
            let holders: Vec<PlantId> = item
                .initial_inventory
                .keys()
                .chain(item.productions.keys())
                .copied()
                .collect();
            item.plants.extend(holders);
        }
        for transit in &transits {
            let item = &mut items[transit.item.index()];
            item.plants.insert(transit.source);
            item.plants.insert(transit.destination);
        }
        for plant in &plants {
            for (_, item, _) in plant.receipts() {
                items[item.index()].plants.insert(plant.id);
            }
        }
        for production in &productions {
            for component in &production.bom {
                items[component.material.index()]
                    .plants
                    .insert(production.plant);
            }
        }

        debug!(
            items = items.len(),
            plants = plants.len(),
            productions = productions.len(),
            transits = transits.len(),
            period,
            "参考数据链接完成"
        );

        ReferenceData {
            period,
            items,
            plants,
            machine_sets,
            productions,
            transits,
            item_index,
            plant_index,
            machine_set_index,
            inbound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_without_machine_set_is_pruned() {
        let mut b = ReferenceDataBuilder::new(5);
        let p = b.add_plant("P", 0);
        let q = b.add_plant("Q", 0);
        let x = b.add_item("X", 1.0);
        let m = b.add_machine_set("M", q, CapacityType::Pcs);
        b.assign_machine_set(x, m);
        b.add_production(x, p, 10.0, 1, 1);
        b.add_production(x, q, 10.0, 1, 1);

        let refs = b.build();
        assert!(refs.production_at(x, p).is_none());
        let prod = refs.production_at(x, q).expect("Q 的工艺应保留");
        assert_eq!(prod.id, ProductionId(0));
        assert_eq!(refs.productions().len(), 1);
        assert!(refs.item(x).plants.contains(&q));
        assert!(!refs.item(x).plants.contains(&p));
    }

    #[test]
    fn test_holdable_plants_and_transit_links() {
        let mut b = ReferenceDataBuilder::new(5);
        let p = b.add_plant("P", 0);
        let s = b.add_plant("S", 0);
        let r = b.add_plant("R", 0);
        let x = b.add_item("X", 1.0);
        let w = b.add_item("W", 1.0);
        let m = b.add_machine_set("M", r, CapacityType::Pcs);
        b.assign_machine_set(x, m);
        let prod = b.add_production(x, r, 1.0, 1, 1);
        b.add_bom(prod, BomComponent::new(w, 2));
        let t = b.add_transit(x, p, s, 1.0, 2);
        b.add_purchase_order(s, w, 0, 5);

        let refs = b.build();
        assert!(refs.item(x).plants.contains(&p));
        assert!(refs.item(x).plants.contains(&s));
        assert!(refs.item(x).plants.contains(&r));
        // BOM 消耗工厂与采购工厂均可持有组件
        assert!(refs.item(w).plants.contains(&r));
        assert!(refs.item(w).plants.contains(&s));
        assert_eq!(refs.transits_into(x, s), &[t]);
        assert!(refs.plant(s).transit_in[&x].contains(&p));
        assert!(refs.plant(p).transit_out[&x].contains(&s));
    }

    #[test]
    fn test_duplicate_names_resolve_to_first() {
        let mut b = ReferenceDataBuilder::new(1);
        let a = b.add_item("A", 1.0);
        let again = b.add_item("A", 2.0);
        assert_eq!(a, again);
        let refs = b.build();
        assert_eq!(refs.find_item("A"), Some(a));
        assert_eq!(refs.item(a).holding_cost, 1.0);
    }
}
