// ==========================================
// 多工厂供应计划系统 - 重排引擎
// ==========================================
// 职责: 在新状态下优先复用历史台账中的供应链, 余量交给贪心排产
// 输入: 供应链图 (新状态) + 历史供应链记录
// 输出: 新的排产台账
// 红线: 单条链复用量不超过历史计划量; 台账整体重建, 不就地修改历史台账
// ==========================================

use crate::domain::demand::Demand;
use crate::engine::priority::{urgency_order, ChainRule};
use crate::engine::schedule::Schedule;
use crate::engine::scheduler::GreedyScheduler;
use crate::engine::supply_chain::{ChainRecord, SupplyChain};
use crate::perf::PerfGuard;
use tracing::{info, instrument, warn};

/// 重排结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescheduleStats {
    pub reused_chains: usize,
    pub reused_quantity: i64,
    pub lost_quantity: i64, // 历史链在新状态下不再能提供的数量
}

// ==========================================
// Rescheduler - 重排引擎
// ==========================================
pub struct Rescheduler {
    greedy: GreedyScheduler,
}

impl Rescheduler {
    pub fn new(rule: ChainRule) -> Self {
        Self {
            greedy: GreedyScheduler::new(rule),
        }
    }

    /// 重排, 只返回新台账
    pub fn plan<'r>(
        &self,
        graph: &SupplyChain<'r>,
        start: usize,
        prior: &[ChainRecord],
    ) -> Schedule<'r> {
        self.plan_with_stats(graph, start, prior).0
    }

    /// 重排并返回复用统计
    ///
    /// 1) 历史链按紧急度稳定排序 (交付日 = 供给开始日 + 提前期, 再跳数)
    /// 2) 逐条在原交付日重新激活, 可供量取新旧较小值
    /// 3) 分配给该物料交付窗口覆盖此日期的未满足需求 (紧急者优先), 按合计量提交
    /// 4) 剩余需求交给贪心排产
    #[instrument(skip(self, graph, prior), fields(records = prior.len()))]
    pub fn plan_with_stats<'r>(
        &self,
        graph: &SupplyChain<'r>,
        start: usize,
        prior: &[ChainRecord],
    ) -> (Schedule<'r>, RescheduleStats) {
        let _perf = PerfGuard::new("reschedule");

        let mut schedule = Schedule::new(graph.refs(), start);
        let end = schedule.end_date();
        let mut demands = Demand::collect(graph.refs(), schedule.start_date(), end);
        let mut stats = RescheduleStats::default();

        let mut records: Vec<&ChainRecord> = prior.iter().collect();
        records.sort_by(|a, b| urgency_order(a, b));

        let mut act = graph.new_activation();
        for record in records {
            let planned = record.quantity;
            let (item, plant, date) = (record.chain.item, record.chain.plant, record.chain.date);

            let chain = graph
                .node(item, plant)
                .filter(|_| date >= schedule.start_date() && date < end)
                .and_then(|node| graph.activate_snapshot(&schedule, node, date, &mut act));
            let Some(chain) = chain else {
                warn!(%item, %plant, date, planned, "历史链在新状态下不可用");
                stats.lost_quantity += planned;
                continue;
            };

            // ===== 分配 =====
            let mut left = chain.quantity.min(planned);
            let mut allocations: Vec<(usize, i64)> = Vec::new();
            for (idx, demand) in demands.iter().enumerate() {
                if left == 0 {
                    break;
                }
                if demand.item != item || demand.is_satisfied() || !demand.accepts_supply_on(date, end) {
                    continue;
                }
                let q = demand.quantity.min(left);
                allocations.push((idx, q));
                left -= q;
            }

            let total: i64 = allocations.iter().map(|(_, q)| *q).sum();
            if total <= 0 {
                stats.lost_quantity += planned;
                continue;
            }

            // ===== 提交 + 结算 =====
            let delivered = chain.add_to_schedule(&mut schedule, date, total);
            let mut remaining = delivered;
            for (idx, q) in allocations {
                let q = q.min(remaining);
                if q <= 0 {
                    break;
                }
                schedule.settle_demand(&mut demands[idx], date, plant, q);
                remaining -= q;
            }

            stats.reused_chains += 1;
            stats.reused_quantity += delivered;
            stats.lost_quantity += (planned - delivered).max(0);
            schedule.record_chain(chain, delivered);
        }

        demands.retain(|d| !d.is_satisfied());
        self.greedy.supply_demands(graph, &mut schedule, &mut demands);

        info!(
            reused_chains = stats.reused_chains,
            reused_quantity = stats.reused_quantity,
            lost_quantity = stats.lost_quantity,
            leftover_demands = demands.iter().filter(|d| !d.is_satisfied()).count(),
            "重排完成"
        );
        (schedule, stats)
    }
}

impl Default for Rescheduler {
    fn default() -> Self {
        Self::new(ChainRule::default())
    }
}
