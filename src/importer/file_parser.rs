// ==========================================
// 多工厂供应计划系统 - 工作表读取
// ==========================================
// 支持: Excel 工作簿 (一表一 sheet) / CSV 目录 (一表一文件)
// 输出: 每行为 列名 -> 去空白文本
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 原始行: 列名 -> 单元格文本
pub type RawRow = HashMap<String, String>;

// ==========================================
// SheetSource Trait
// ==========================================
// 实现者: ExcelWorkbook / CsvDirectory
pub trait SheetSource {
    /// 数据源描述 (日志与报表用)
    fn describe(&self) -> String;

    fn has_sheet(&self, name: &str) -> bool;

    /// 读取整张表, 跳过完全空白的行
    fn read_sheet(&self, name: &str) -> ImportResult<Vec<RawRow>>;
}

/// 表头 + 数据行 -> RawRow 列表
fn collect_rows<I, R, S>(headers: &[String], rows: I) -> Vec<RawRow>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut records = Vec::new();
    for row in rows {
        let mut row_map = HashMap::new();
        for (col_idx, value) in row.into_iter().enumerate() {
            if let Some(header) = headers.get(col_idx) {
                row_map.insert(header.clone(), value.as_ref().trim().to_string());
            }
        }

        // 跳过完全空白的行
        if row_map.values().all(|v| v.is_empty()) {
            continue;
        }
        records.push(row_map);
    }
    records
}

// ==========================================
// ExcelWorkbook - Excel 工作簿
// ==========================================
// 打开时读入全部工作表; 表名匹配大小写不敏感
pub struct ExcelWorkbook {
    path: PathBuf,
    sheets: HashMap<String, Vec<RawRow>>,
}

impl ExcelWorkbook {
    pub fn open<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(path)?;
        let mut sheets = HashMap::new();

        for sheet_name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet_name)?;
            let mut rows = range.rows();

            // 提取表头（第一行）
            let Some(header_row) = rows.next() else {
                sheets.insert(sheet_name.to_lowercase(), Vec::new());
                continue;
            };
            let headers: Vec<String> = header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect();

            let records = collect_rows(
                &headers,
                rows.map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>()),
            );
            debug!(sheet = %sheet_name, rows = records.len(), "读取工作表");
            sheets.insert(sheet_name.to_lowercase(), records);
        }

        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }
}

impl SheetSource for ExcelWorkbook {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(&name.to_lowercase())
    }

    fn read_sheet(&self, name: &str) -> ImportResult<Vec<RawRow>> {
        self.sheets
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| ImportError::MissingSheet(name.to_string()))
    }
}

// ==========================================
// CsvDirectory - CSV 目录
// ==========================================
// 表 `<name>` 对应文件 `<dir>/<name>.csv`
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn open<P: AsRef<Path>>(dir: P) -> ImportResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ImportError::FileNotFound(dir.display().to_string()));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl SheetSource for CsvDirectory {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn has_sheet(&self, name: &str) -> bool {
        self.sheet_path(name).is_file()
    }

    fn read_sheet(&self, name: &str) -> ImportResult<Vec<RawRow>> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            return Err(ImportError::MissingSheet(name.to_string()));
        }

        let file = File::open(&path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            rows.push(result?);
        }

        let records = collect_rows(&headers, rows.iter().map(|r| r.iter()));
        debug!(sheet = name, rows = records.len(), "读取 CSV 表");
        Ok(records)
    }
}

// ==========================================
// 按路径选择数据源
// ==========================================

/// 目录按 CSV 目录读取, 文件按扩展名读取 Excel
pub fn open_source<P: AsRef<Path>>(path: P) -> ImportResult<Box<dyn SheetSource>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    if path.is_dir() {
        return Ok(Box::new(CsvDirectory::open(path)?));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "xlsx" | "xls" | "xlsm" | "ods" => Ok(Box::new(ExcelWorkbook::open(path)?)),
        _ => Err(ImportError::UnsupportedFormat(ext)),
    }
}
