// ==========================================
// 多工厂供应计划系统 - 供应链图与激活
// ==========================================
// 职责: 每个 (物料, 工厂) 一个节点, 边指向 BOM 组件节点与调拨来源节点;
//       给定日期求出再交付一件的最短提前期路径
// 输入: 参考数据 + 当前台账
// 输出: 节点激活状态 (可供量/提前期/跳数/成本), 激活子图快照
// 红线: 图结构只读; 一次查询内每个节点至多激活一次 (visited 集合)
// ==========================================

mod active_chain;

pub use active_chain::{ActiveChain, ActiveLane, ActiveProduction, ChainRecord};

use crate::domain::reference::ReferenceData;
use crate::domain::types::{ItemId, PlantId, ProductionId, TransitId};
use crate::engine::schedule::Schedule;
use crate::perf;
use std::collections::HashMap;
use tracing::debug;

/// 节点下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

// ==========================================
// Node - 图节点 (只读)
// ==========================================
#[derive(Debug, Clone)]
struct Node {
    item: ItemId,
    plant: PlantId,
    production: Option<ProductionId>,
    bom_streams: Vec<Option<NodeId>>, // 与工艺 BOM 行一一对应
    transit_streams: Vec<(TransitId, NodeId)>, // 按线路下标升序
}

// ==========================================
// NodeState - 节点最近一次激活结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeState {
    pub date: usize,
    pub active: bool,
    pub prod_active: bool,
    pub quantity: i64,          // 所有激活流合计可供量
    pub max_prod_quantity: i64, // 生产流可供量 (整批)
    pub inventory: i64,         // 当日未承诺库存
    pub lead_time: usize,
    pub hops: usize,
    pub holding_cost: f64,
    pub production_cost: f64,
    pub transit_cost: f64,
    pub active_lanes: Vec<usize>, // 激活的调拨流 (transit_streams 下标)
}

impl NodeState {
    pub fn total_cost(&self) -> f64 {
        self.holding_cost + self.production_cost + self.transit_cost
    }
}

// ==========================================
// Activation - 单次查询的激活上下文
// ==========================================
// 节点状态与 visited 集合都放在这里, 图本身保持只读
#[derive(Debug, Clone)]
pub struct Activation {
    states: Vec<NodeState>,
    visited: Vec<bool>,
}

impl Activation {
    pub fn new(nodes: usize) -> Self {
        Self {
            states: vec![NodeState::default(); nodes],
            visited: vec![false; nodes],
        }
    }

    /// 开始新一次遍历
    pub fn reset(&mut self) {
        self.visited.iter_mut().for_each(|v| *v = false);
    }

    pub fn state(&self, node: NodeId) -> &NodeState {
        &self.states[node.0]
    }

    pub fn is_visited(&self, node: NodeId) -> bool {
        self.visited[node.0]
    }
}

// ==========================================
// SupplyChain - 供应链图
// ==========================================
#[derive(Debug, Clone)]
pub struct SupplyChain<'r> {
    refs: &'r ReferenceData,
    nodes: Vec<Node>,
    index: HashMap<(ItemId, PlantId), NodeId>,
    by_item: Vec<Vec<NodeId>>,
}

impl<'r> SupplyChain<'r> {
    /// 按物料可持有的工厂建节点, 再链接 BOM 与调拨边
    pub fn build(refs: &'r ReferenceData) -> Self {
        let mut nodes = Vec::new();
        let mut index = HashMap::new();
        let mut by_item = vec![Vec::new(); refs.items().len()];

        for item in refs.items() {
            for &plant in &item.plants {
                let id = NodeId(nodes.len());
                nodes.push(Node {
                    item: item.id,
                    plant,
                    production: item.productions.get(&plant).copied(),
                    bom_streams: Vec::new(),
                    transit_streams: Vec::new(),
                });
                index.insert((item.id, plant), id);
                by_item[item.id.index()].push(id);
            }
        }

        for node in nodes.iter_mut() {
            if let Some(pid) = node.production {
                node.bom_streams = refs
                    .production(pid)
                    .bom
                    .iter()
                    .map(|c| index.get(&(c.material, node.plant)).copied())
                    .collect();
            }
            node.transit_streams = refs
                .transits_into(node.item, node.plant)
                .iter()
                .filter_map(|tid| {
                    let source = refs.transit(*tid).source;
                    index.get(&(node.item, source)).map(|src| (*tid, *src))
                })
                .collect();
        }

        debug!(nodes = nodes.len(), "供应链图构建完成");

        Self {
            refs,
            nodes,
            index,
            by_item,
        }
    }

    pub fn refs(&self) -> &'r ReferenceData {
        self.refs
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, item: ItemId, plant: PlantId) -> Option<NodeId> {
        self.index.get(&(item, plant)).copied()
    }

    /// 物料的全部节点, 按工厂下标升序
    pub fn nodes_of(&self, item: ItemId) -> &[NodeId] {
        self.by_item
            .get(item.index())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn node_key(&self, node: NodeId) -> (ItemId, PlantId) {
        let n = &self.nodes[node.0];
        (n.item, n.plant)
    }

    pub fn new_activation(&self) -> Activation {
        Activation::new(self.nodes.len())
    }

    // ==========================================
    // 激活
    // ==========================================

    /// 求节点在 `date` 交付的最佳边际路径, 结果写入 `act`
    ///
    /// 返回 false 表示本次遍历中该节点已被访问过, 调用方按零供给处理
    ///
    /// 1) 当日有未承诺库存: 直接激活, 提前期 0, 不考虑其它流
    /// 2) 调拨流: 在 `date - 运输期` 激活来源节点
    /// 3) 生产流: 开工日 `date - 生产期`, 可供量取产能、最大产量与各 BOM 组件可供量的最小值
    /// 4) 取最小提前期, 所有并列最小的流都激活并合计可供量
    pub fn activate(
        &self,
        schedule: &Schedule<'_>,
        node: NodeId,
        date: usize,
        act: &mut Activation,
    ) -> bool {
        if act.visited[node.0] {
            return false;
        }
        act.visited[node.0] = true;
        perf::record_activation();

        let refs = self.refs;
        let n = &self.nodes[node.0];
        let item = refs.item(n.item);
        let end = schedule.end_date();
        let release = refs.plant(n.plant).earliest_release(schedule.start_date());

        let mut state = NodeState {
            date,
            ..Default::default()
        };

        // ===== 1) 库存 =====
        let inventory = schedule.free(date, n.item, n.plant);
        if inventory > 0 {
            state.active = true;
            state.inventory = inventory;
            state.quantity = inventory;
            state.holding_cost = -item.holding_cost * end.saturating_sub(date) as f64;
            act.states[node.0] = state;
            return true;
        }

        // ===== 2) 调拨流 =====
        let mut lane_offers: Vec<(usize, usize, i64)> = Vec::new(); // (流下标, 提前期, 可供量)
        for (k, (tid, src)) in n.transit_streams.iter().enumerate() {
            let transit = refs.transit(*tid);
            let Some(start) = date.checked_sub(transit.lead_time) else {
                continue;
            };
            let source_release = refs.plant(transit.source).earliest_release(schedule.start_date());
            if start < source_release {
                continue;
            }
            if !self.activate(schedule, *src, start, act) {
                continue;
            }
            let s = &act.states[src.0];
            if !s.active || s.quantity <= 0 {
                continue;
            }
            lane_offers.push((k, s.lead_time + transit.lead_time, s.quantity));
        }

        // ===== 3) 生产流 =====
        let mut prod_offer: Option<(usize, i64)> = None;
        if let Some(pid) = n.production {
            let production = refs.production(pid);
            let start = date
                .checked_sub(production.lead_time)
                .filter(|s| *s >= release);

            if let Some(start) = start {
                let mut max_quantity = schedule
                    .max_quantity_from_capacity(pid, start)
                    .min(production.max_production_cap());
                let mut bom_lead = 0;

                for (component, stream) in production.bom.iter().zip(&n.bom_streams) {
                    if max_quantity <= 0 {
                        break;
                    }
                    let Some(child) = stream else {
                        max_quantity = 0;
                        break;
                    };
                    if !self.activate(schedule, *child, start, act) {
                        max_quantity = 0;
                        break;
                    }
                    let s = &act.states[child.0];
                    if !s.active {
                        max_quantity = 0;
                        break;
                    }
                    max_quantity = max_quantity.min(component.producible_from(s.quantity));
                    bom_lead = bom_lead.max(s.lead_time);
                }

                let max_quantity = production.floor_to_lots(max_quantity);
                if max_quantity > 0 {
                    prod_offer = Some((production.lead_time + bom_lead, max_quantity));
                }
            }
        }

        // ===== 4) 取最小提前期 =====
        let lead = lane_offers
            .iter()
            .map(|(_, lead, _)| *lead)
            .chain(prod_offer.map(|(lead, _)| lead))
            .min();

        let Some(lead) = lead else {
            act.states[node.0] = state;
            return true;
        };

        state.active = true;
        state.lead_time = lead;
        for (k, l, q) in &lane_offers {
            if *l == lead {
                state.quantity = state.quantity.saturating_add(*q);
                state.active_lanes.push(*k);
            }
        }
        if let Some((l, q)) = prod_offer {
            if l == lead {
                state.prod_active = true;
                state.max_prod_quantity = q;
                state.quantity = state.quantity.saturating_add(q);
            }
        }

        self.derive_costs(n, &mut state, act);
        act.states[node.0] = state;
        true
    }

    /// 由激活的流自底向上计算单件成本与跳数
    fn derive_costs(&self, n: &Node, state: &mut NodeState, act: &Activation) {
        let refs = self.refs;
        let mut deepest = 0;

        if state.prod_active {
            if let Some(pid) = n.production {
                let production = refs.production(pid);
                state.production_cost = production.unit_cost();
                for (component, stream) in production.bom.iter().zip(&n.bom_streams) {
                    let Some(child) = stream else { continue };
                    let s = &act.states[child.0];
                    let per_unit = component.quantity as f64;
                    // 组件自开工日起等待到完工日才被消耗
                    let waiting = refs.item(component.material).holding_cost
                        * production.lead_time as f64;
                    state.production_cost += per_unit * s.production_cost;
                    state.holding_cost += per_unit * (s.holding_cost + waiting);
                    deepest = deepest.max(s.hops);
                }
            }
        }

        // 只取下标最小的一条激活调拨线路计费
        if let Some(&k) = state.active_lanes.first() {
            let (tid, src) = n.transit_streams[k];
            let s = &act.states[src.0];
            state.holding_cost += s.holding_cost;
            state.transit_cost = refs.transit(tid).cost + s.transit_cost;
        }
        for &k in &state.active_lanes {
            let (_, src) = n.transit_streams[k];
            deepest = deepest.max(act.states[src.0].hops);
        }

        state.hops = 1 + deepest;
    }

    // ==========================================
    // 快照
    // ==========================================

    /// 复制当前激活的子图, 供之后重放
    pub fn clone_active(&self, node: NodeId, act: &Activation) -> Option<ActiveChain> {
        let n = &self.nodes[node.0];
        let s = &act.states[node.0];
        if !s.active {
            return None;
        }

        let production = if s.prod_active {
            let pid = n.production?;
            let components = n
                .bom_streams
                .iter()
                .map(|stream| stream.and_then(|child| self.clone_active(child, act)))
                .collect::<Option<Vec<_>>>()?;
            Some(ActiveProduction {
                production: pid,
                max_quantity: s.max_prod_quantity,
                components,
            })
        } else {
            None
        };

        let lanes = s
            .active_lanes
            .iter()
            .filter_map(|&k| {
                let (tid, src) = n.transit_streams[k];
                self.clone_active(src, act).map(|source| ActiveLane {
                    transit: tid,
                    source,
                })
            })
            .collect();

        Some(ActiveChain {
            item: n.item,
            plant: n.plant,
            date: s.date,
            quantity: s.quantity,
            inventory: s.inventory,
            lead_time: s.lead_time,
            hops: s.hops,
            holding_cost: s.holding_cost,
            production_cost: s.production_cost,
            transit_cost: s.transit_cost,
            production,
            lanes,
        })
    }

    /// 在新的遍历中激活节点并取快照
    pub fn activate_snapshot(
        &self,
        schedule: &Schedule<'_>,
        node: NodeId,
        date: usize,
        act: &mut Activation,
    ) -> Option<ActiveChain> {
        act.reset();
        if !self.activate(schedule, node, date, act) {
            return None;
        }
        self.clone_active(node, act)
    }
}
