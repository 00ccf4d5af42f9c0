// ==========================================
// 多工厂供应计划系统 - 核心库
// ==========================================
// 技术栈: Rust (同步计算, 单台账独占)
// 系统定位: 多工厂生产/调拨/供货计划的贪心排产与重排
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 参考数据与计划指令
pub mod domain;

// 引擎层 - 供应链图、台账、排产
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 导入与规划参数
pub mod config;

// 结果输出
pub mod report;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    CapacityType, DemandKind, ItemId, MachineSetId, PlantId, ProductionId, SupplyType, TransitId,
};

// 领域实体
pub use domain::{Demand, Inventory, ReferenceData, ReferenceDataBuilder};

// 引擎
pub use engine::{
    ActiveChain, ChainRecord, ChainRule, GreedyScheduler, LedgerViolation, RescheduleStats,
    Rescheduler, Schedule, SupplyChain,
};

// 配置与导入
pub use config::{AppConfig, ConfigError};
pub use importer::{open_source, ImportError, LoadReport, ReferenceLoader};

// 输出
pub use report::{export_schedule, write_summary_csv, PlanSummary};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "多工厂供应计划系统";
