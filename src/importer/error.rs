// ==========================================
// 多工厂供应计划系统 - 导入错误类型
// ==========================================
// 红线: 错误都带表名/行号, 便于在原始工作簿中定位
// 名称无法解析不算错误 (告警并跳过), 见 reference_loader
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 数据源 =====
    #[error("输入不存在: {0}")]
    FileNotFound(String),

    #[error("不支持的输入: {0} (需要 .xlsx/.xls/.xlsm/.ods 工作簿或 CSV 目录)")]
    UnsupportedFormat(String),

    #[error("读取输入失败")]
    Io(#[from] std::io::Error),

    #[error("工作簿解析失败")]
    Workbook(#[from] calamine::Error),

    #[error("CSV 解析失败")]
    Csv(#[from] csv::Error),

    // ===== 表结构 =====
    #[error("缺少工作表: {0}")]
    MissingSheet(String),

    #[error("工作表 {0} 没有数据行")]
    EmptySheet(String),

    #[error("{sheet} 第 {row} 行缺少 {column}")]
    MissingColumn {
        sheet: String,
        row: usize,
        column: String,
    },

    // ===== 单元格 =====
    #[error("{sheet} 第 {row} 行 {field} 不是数值: {value:?}")]
    TypeConversionError {
        sheet: String,
        row: usize,
        field: String,
        value: String,
    },

    #[error("{sheet} 第 {row} 行 {field} 日期无法按 {format} 解析: {value:?}")]
    DateFormatError {
        sheet: String,
        row: usize,
        field: String,
        format: String,
        value: String,
    },
}

pub type ImportResult<T> = Result<T, ImportError>;
