// ==========================================
// 多工厂供应计划系统 - 引擎层
// ==========================================
// 职责: 供应链图激活、排产台账、贪心排产与重排
// 红线: 单线程同步计算; 台账由一次规划独占
// ==========================================

pub mod priority;
pub mod reschedule;
pub mod schedule;
pub mod scheduler;
pub mod supply_chain;

// 重导出核心引擎
pub use priority::{tie_break, urgency_order, ChainPriority, ChainRule};
pub use reschedule::{RescheduleStats, Rescheduler};
pub use schedule::{LedgerResult, LedgerViolation, Schedule};
pub use scheduler::GreedyScheduler;
pub use supply_chain::{
    Activation, ActiveChain, ActiveLane, ActiveProduction, ChainRecord, NodeId, NodeState,
    SupplyChain,
};
