// ==========================================
// 多工厂供应计划系统 - 导入层
// ==========================================
// 职责: 外部数据导入, 生成只读参考数据
// 支持: Excel 工作簿, CSV 目录
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod reference_loader;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{open_source, CsvDirectory, ExcelWorkbook, RawRow, SheetSource};
pub use reference_loader::{LoadReport, ReferenceLoader, SheetStats};
