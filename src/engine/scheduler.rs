// ==========================================
// 多工厂供应计划系统 - 贪心排产引擎
// ==========================================
// 职责: 按紧急度逐条满足需求, 每次向供应链图要下一条最早可交付的链
// 输入: 供应链图 + 计划起点
// 输出: 排产台账 (含供应链使用记录)
// 红线: 找不到可行链即停止该需求, 余量计入延期, 不报错
// ==========================================

use crate::domain::demand::Demand;
use crate::domain::types::ItemId;
use crate::engine::priority::ChainRule;
use crate::engine::schedule::Schedule;
use crate::engine::supply_chain::{Activation, ActiveChain, SupplyChain};
use crate::perf::PerfGuard;
use tracing::{debug, info, instrument};

// ==========================================
// GreedyScheduler - 贪心排产引擎
// ==========================================
pub struct GreedyScheduler {
    rule: ChainRule,
}

impl GreedyScheduler {
    pub fn new(rule: ChainRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> ChainRule {
        self.rule
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 从空台账开始完成一次排产
    #[instrument(skip(self, graph), fields(rule = self.rule.name()))]
    pub fn plan<'r>(&self, graph: &SupplyChain<'r>, start: usize) -> Schedule<'r> {
        let _perf = PerfGuard::new("greedy_plan");

        let mut schedule = Schedule::new(graph.refs(), start);
        let mut demands = Demand::collect(graph.refs(), schedule.start_date(), schedule.end_date());
        let count = demands.len();

        self.supply_demands(graph, &mut schedule, &mut demands);

        let unmet = demands.iter().filter(|d| !d.is_satisfied()).count();
        info!(
            demands = count,
            unmet,
            chains = schedule.chain_records().len(),
            total_delay = schedule.total_delay(),
            "贪心排产完成"
        );
        schedule
    }

    /// 依次满足需求列表 (调用方负责排序)
    pub fn supply_demands(
        &self,
        graph: &SupplyChain<'_>,
        schedule: &mut Schedule<'_>,
        demands: &mut [Demand],
    ) {
        let mut act = graph.new_activation();
        for demand in demands.iter_mut() {
            if demand.is_satisfied() {
                continue;
            }
            self.supply_demand(graph, schedule, demand, &mut act);
        }
    }

    /// 反复取下一条链满足单条需求, 返回本次满足的数量
    pub fn supply_demand(
        &self,
        graph: &SupplyChain<'_>,
        schedule: &mut Schedule<'_>,
        demand: &mut Demand,
        act: &mut Activation,
    ) -> i64 {
        let deadline = demand.latest_supply_date(schedule.end_date());
        let mut from = demand.date;
        let mut supplied = 0;

        while demand.quantity > 0 {
            let Some(chain) =
                self.next_supply_chain(graph, schedule, demand.item, from, deadline, act)
            else {
                debug!(
                    item = %demand.item,
                    date = demand.date,
                    kind = %demand.kind,
                    remaining = demand.quantity,
                    "无可行供应链, 余量计入延期"
                );
                break;
            };

            let quantity = chain.quantity.min(demand.quantity);
            let delivered = chain.add_to_schedule(schedule, chain.date, quantity);
            if delivered <= 0 {
                // 共用产能在提交时已被同链其他层占用, 从下一天继续找
                from = chain.date + 1;
                continue;
            }

            debug!(
                item = %demand.item,
                plant = %chain.plant,
                date = chain.date,
                hops = chain.hops,
                quantity = delivered,
                "提交供应链"
            );
            schedule.settle_demand(demand, chain.date, chain.plant, delivered);
            supplied += delivered;
            from = chain.date;
            schedule.record_chain(chain, delivered);
        }

        supplied
    }

    /// 在 `[from, deadline)` 内找最早能交付的日期, 按规则从该日候选中选一条
    pub fn next_supply_chain(
        &self,
        graph: &SupplyChain<'_>,
        schedule: &Schedule<'_>,
        item: ItemId,
        from: usize,
        deadline: usize,
        act: &mut Activation,
    ) -> Option<ActiveChain> {
        let end = deadline.min(schedule.end_date());
        let from = from.max(schedule.start_date());

        for date in from..end {
            let candidates: Vec<ActiveChain> = graph
                .nodes_of(item)
                .iter()
                .filter_map(|node| graph.activate_snapshot(schedule, *node, date, act))
                .filter(|chain| chain.quantity > 0)
                .collect();

            if !candidates.is_empty() {
                return self.rule.select(candidates);
            }
        }
        None
    }
}

impl Default for GreedyScheduler {
    fn default() -> Self {
        Self::new(ChainRule::default())
    }
}
