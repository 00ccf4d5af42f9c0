// ==========================================
// 多工厂供应计划系统 - 配置层
// ==========================================
// 职责: 导入表名/列名映射与规划参数, 以显式配置值传入导入器与调度器
// 存储: JSON 文件 (字段全部可缺省)
// ==========================================

pub mod app_config;
pub mod import_config;
pub mod planner_config;

// 重导出核心配置
pub use app_config::{AppConfig, ConfigError, ConfigResult};
pub use import_config::{ColumnNames, ImportConfig, SheetNames};
pub use planner_config::PlannerConfig;
