// ==========================================
// 多工厂供应计划系统 - 参考数据加载
// ==========================================
// 职责: 按固定顺序读取各表, 登记到 ReferenceDataBuilder
// 输入: SheetSource + ImportConfig
// 输出: ReferenceData + LoadReport
// 红线: 名称无法解析的行告警并跳过; 数值/日期格式错误直接报错
// ==========================================

use crate::config::import_config::ImportConfig;
use crate::domain::production::BomComponent;
use crate::domain::reference::{ReferenceData, ReferenceDataBuilder};
use crate::domain::types::SupplyType;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, SheetSource};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

// ==========================================
// LoadReport - 加载报告
// ==========================================

/// 单表统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SheetStats {
    pub rows: usize,
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub source: String,
    pub start_date: NaiveDate,
    pub period: usize,
    pub sheets: BTreeMap<String, SheetStats>,
}

impl LoadReport {
    pub fn skipped_rows(&self) -> usize {
        self.sheets.values().map(|s| s.skipped).sum()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetStats> {
        self.sheets.get(name)
    }
}

// ==========================================
// 行读取辅助
// ==========================================
struct RowReader<'a> {
    sheet: &'a str,
    row: usize, // 1 起, 不含表头
    data: &'a RawRow,
}

impl<'a> RowReader<'a> {
    fn opt_text(&self, column: &str) -> Option<&'a str> {
        self.data
            .get(column)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    fn text(&self, column: &str) -> ImportResult<&'a str> {
        self.opt_text(column)
            .ok_or_else(|| ImportError::MissingColumn {
                sheet: self.sheet.to_string(),
                row: self.row,
                column: column.to_string(),
            })
    }

    fn conversion_error(&self, column: &str, value: &str) -> ImportError {
        ImportError::TypeConversionError {
            sheet: self.sheet.to_string(),
            row: self.row,
            field: column.to_string(),
            value: value.to_string(),
        }
    }

    /// 整数列; 允许 "12.0" 这类 Excel 数值文本
    fn opt_int(&self, column: &str) -> ImportResult<Option<i64>> {
        let Some(value) = self.opt_text(column) else {
            return Ok(None);
        };
        if let Ok(v) = value.parse::<i64>() {
            return Ok(Some(v));
        }
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v.round() as i64)),
            _ => Err(self.conversion_error(column, value)),
        }
    }

    fn int(&self, column: &str) -> ImportResult<i64> {
        self.text(column)?;
        self.opt_int(column)?
            .ok_or_else(|| self.conversion_error(column, ""))
    }

    fn opt_float(&self, column: &str) -> ImportResult<Option<f64>> {
        let Some(value) = self.opt_text(column) else {
            return Ok(None);
        };
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(self.conversion_error(column, value)),
        }
    }

    fn float(&self, column: &str) -> ImportResult<f64> {
        self.text(column)?;
        self.opt_float(column)?
            .ok_or_else(|| self.conversion_error(column, ""))
    }

    fn date(&self, column: &str, format: &str) -> ImportResult<NaiveDate> {
        let value = self.text(column)?;
        // Excel 数值单元格可能带 ".0"
        let trimmed = value.strip_suffix(".0").unwrap_or(value);
        NaiveDate::parse_from_str(trimmed, format).map_err(|_| ImportError::DateFormatError {
            sheet: self.sheet.to_string(),
            row: self.row,
            field: column.to_string(),
            format: format.to_string(),
            value: value.to_string(),
        })
    }
}

// ==========================================
// 计划期日历
// ==========================================
struct Calendar {
    start: NaiveDate,
    period: usize,
    period_starts: Vec<NaiveDate>, // 升序
}

impl Calendar {
    fn from_dates(mut dates: Vec<NaiveDate>) -> Option<Self> {
        dates.sort();
        dates.dedup();
        let start = *dates.first()?;
        let last = *dates.last()?;
        let period = (last - start).num_days() as usize + 1;
        Some(Self {
            start,
            period,
            period_starts: dates,
        })
    }

    /// 日期 -> 计划期下标; 计划期外返回 None
    fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let gap = (date - self.start).num_days();
        if gap < 0 || gap as usize >= self.period {
            return None;
        }
        Some(gap as usize)
    }

    /// 到货类日期: 早于计划期的记在首日
    fn receipt_index(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start {
            return Some(0);
        }
        self.index_of(date)
    }

    /// 需求日期归入所在时段的交期 (时段首日)
    fn due_index(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.period_starts.partition_point(|d| *d <= date);
        let due = *self.period_starts.get(idx.checked_sub(1)?)?;
        self.index_of(due)
    }
}

// ==========================================
// ReferenceLoader
// ==========================================
pub struct ReferenceLoader<'c> {
    config: &'c ImportConfig,
}

/// 单表加载过程的计数器
struct SheetPass<'a> {
    name: &'a str,
    stats: SheetStats,
}

impl<'a> SheetPass<'a> {
    fn new(name: &'a str, rows: usize) -> Self {
        Self {
            name,
            stats: SheetStats {
                rows,
                ..Default::default()
            },
        }
    }

    fn loaded(&mut self) {
        self.stats.loaded += 1;
    }

    fn skip(&mut self, row: usize, reason: &str, value: &str) {
        warn!(sheet = self.name, row, value, "{}, 跳过该行", reason);
        self.stats.skipped += 1;
    }
}

impl<'c> ReferenceLoader<'c> {
    pub fn new(config: &'c ImportConfig) -> Self {
        Self { config }
    }

    /// 读取全部参考数据
    ///
    /// 时段、工厂、物料三张表必需, 其余缺失时视为空表
    #[instrument(skip(self, source), fields(source = %source.describe()))]
    pub fn load(&self, source: &dyn SheetSource) -> ImportResult<(ReferenceData, LoadReport)> {
        let sheets = &self.config.sheets;
        let cols = &self.config.columns;
        let fmt = self.config.date_format.as_str();
        let mut report_sheets = BTreeMap::new();

        // ===== 时段 =====
        let rows = source.read_sheet(&sheets.time_periods)?;
        let mut dates = Vec::with_capacity(rows.len());
        for (i, data) in rows.iter().enumerate() {
            let r = RowReader {
                sheet: &sheets.time_periods,
                row: i + 1,
                data,
            };
            dates.push(r.date(&cols.date, fmt)?);
        }
        let calendar = Calendar::from_dates(dates)
            .ok_or_else(|| ImportError::EmptySheet(sheets.time_periods.clone()))?;
        report_sheets.insert(
            sheets.time_periods.clone(),
            SheetStats {
                rows: rows.len(),
                loaded: rows.len(),
                skipped: 0,
            },
        );

        let mut b = ReferenceDataBuilder::new(calendar.period);

        // ===== 工厂 =====
        self.each_row(source, &sheets.plants, true, &mut report_sheets, |r, pass| {
            let name = r.text(&cols.plant)?;
            let lod = r.opt_int(&cols.locked_out_days)?.unwrap_or(0).max(0) as usize;
            b.add_plant(name, lod);
            pass.loaded();
            Ok(())
        })?;

        // ===== 机台组 =====
        self.each_row(source, &sheets.machine_sets, false, &mut report_sheets, |r, pass| {
            let name = r.text(&cols.machine_set)?;
            let plant_name = r.text(&cols.plant)?;
            let ct_name = r.text(&cols.capacity_type)?;
            let Some(plant) = b.find_plant(plant_name) else {
                pass.skip(r.row, "未知工厂", plant_name);
                return Ok(());
            };
            let Some(ct) = self.config.capacity_type(ct_name) else {
                pass.skip(r.row, "未知产能类型", ct_name);
                return Ok(());
            };
            b.add_machine_set(name, plant, ct);
            pass.loaded();
            Ok(())
        })?;

        // ===== 物料 =====
        self.each_row(source, &sheets.items, true, &mut report_sheets, |r, pass| {
            let name = r.text(&cols.item)?;
            let hc = r.opt_float(&cols.holding_cost)?.unwrap_or(0.0);
            b.add_item(name, hc);
            pass.loaded();
            Ok(())
        })?;

        // ===== 消耗率 =====
        self.each_row(source, &sheets.item_rates, false, &mut report_sheets, |r, pass| {
            let item_name = r.text(&cols.item)?;
            let ct_name = r.text(&cols.capacity_type)?;
            let rate = r.float(&cols.rate)?;
            let Some(item) = b.find_item(item_name) else {
                pass.skip(r.row, "未知物料", item_name);
                return Ok(());
            };
            let Some(ct) = self.config.capacity_type(ct_name) else {
                pass.skip(r.row, "未知产能类型", ct_name);
                return Ok(());
            };
            b.set_rate(item, ct, rate);
            pass.loaded();
            Ok(())
        })?;

        // ===== 物料-机台组 =====
        self.each_row(source, &sheets.item_machine_sets, false, &mut report_sheets, |r, pass| {
            let set_name = r.text(&cols.machine_set)?;
            let item_name = r.text(&cols.item)?;
            let Some(set) = b.find_machine_set(set_name) else {
                pass.skip(r.row, "未知机台组", set_name);
                return Ok(());
            };
            let Some(item) = b.find_item(item_name) else {
                pass.skip(r.row, "未知物料", item_name);
                return Ok(());
            };
            b.assign_machine_set(item, set);
            pass.loaded();
            Ok(())
        })?;

        // ===== 产能 =====
        self.each_row(source, &sheets.capacities, false, &mut report_sheets, |r, pass| {
            let set_name = r.text(&cols.machine_set)?;
            let date = r.date(&cols.date, fmt)?;
            let capacity = r.float(&cols.capacity)?;
            let Some(set) = b.find_machine_set(set_name) else {
                pass.skip(r.row, "未知机台组", set_name);
                return Ok(());
            };
            let Some(d) = calendar.index_of(date) else {
                pass.skip(r.row, "日期超出计划期", &date.to_string());
                return Ok(());
            };
            b.set_capacity(set, d, capacity);
            pass.loaded();
            Ok(())
        })?;

        // ===== 生产工艺 =====
        self.each_row(source, &sheets.productions, false, &mut report_sheets, |r, pass| {
            let item_name = r.text(&cols.item)?;
            let plant_name = r.text(&cols.plant)?;
            let cost = r.float(&cols.cost)?;
            let lead_time = r.int(&cols.lead_time)?.max(0) as usize;
            let lot_size = r.opt_int(&cols.lot_size)?.unwrap_or(1).max(1);
            let min_production = r.opt_int(&cols.min_production)?.unwrap_or(0);
            let max_production = match r.opt_int(&cols.max_production)? {
                Some(0) | None if self.config.zero_max_production_unlimited => None,
                other => other.map(|v| v.max(0)),
            };

            let Some(item) = b.find_item(item_name) else {
                pass.skip(r.row, "未知物料", item_name);
                return Ok(());
            };
            let Some(plant) = b.find_plant(plant_name) else {
                pass.skip(r.row, "未知工厂", plant_name);
                return Ok(());
            };
            let pid = b.add_production(item, plant, cost, lead_time, lot_size);
            b.set_production_limits(pid, min_production, max_production);
            pass.loaded();
            Ok(())
        })?;

        // ===== BOM =====
        self.each_row(source, &sheets.bom, false, &mut report_sheets, |r, pass| {
            let assembly_name = r.text(&cols.assembly)?;
            let component_name = r.text(&cols.component)?;
            let plant_name = r.text(&cols.plant)?;
            let quantity = r.int(&cols.quantity)?;
            let supply_text = r.opt_text(&cols.supply_type).unwrap_or("");

            let Some(assembly) = b.find_item(assembly_name) else {
                pass.skip(r.row, "未知成品", assembly_name);
                return Ok(());
            };
            let Some(component) = b.find_item(component_name) else {
                pass.skip(r.row, "未知组件", component_name);
                return Ok(());
            };
            let Some(plant) = b.find_plant(plant_name) else {
                pass.skip(r.row, "未知工厂", plant_name);
                return Ok(());
            };
            let Some(pid) = b.production_at(assembly, plant) else {
                pass.skip(r.row, "成品在该工厂无生产工艺", assembly_name);
                return Ok(());
            };
            let supply_type = SupplyType::from_name(supply_text).unwrap_or_else(|| {
                warn!(row = r.row, value = supply_text, "未知供料方式, 按 Push 处理");
                SupplyType::Push
            });
            b.add_bom(
                pid,
                BomComponent {
                    material: component,
                    quantity,
                    supply_type,
                },
            );
            pass.loaded();
            Ok(())
        })?;

        // ===== 调拨线路 =====
        self.each_row(source, &sheets.transits, false, &mut report_sheets, |r, pass| {
            let item_name = r.text(&cols.item)?;
            let from_name = r.text(&cols.from_plant)?;
            let to_name = r.text(&cols.to_plant)?;
            let cost = r.float(&cols.cost)?;
            let lead_time = r.int(&cols.lead_time)?.max(0) as usize;

            let Some(item) = b.find_item(item_name) else {
                pass.skip(r.row, "未知物料", item_name);
                return Ok(());
            };
            let (Some(from), Some(to)) = (b.find_plant(from_name), b.find_plant(to_name)) else {
                pass.skip(r.row, "未知工厂", &format!("{} -> {}", from_name, to_name));
                return Ok(());
            };
            b.add_transit(item, from, to, cost, lead_time);
            pass.loaded();
            Ok(())
        })?;

        // ===== 需求 =====
        self.each_row(source, &sheets.demands, false, &mut report_sheets, |r, pass| {
            let item_name = r.text(&cols.item)?;
            let date = r.date(&cols.date, fmt)?;
            let order = r.opt_int(&cols.order_demand)?.unwrap_or(0);
            let forecast = r.opt_int(&cols.forecast_demand)?.unwrap_or(0);

            let Some(item) = b.find_item(item_name) else {
                pass.skip(r.row, "未知物料", item_name);
                return Ok(());
            };
            let Some(d) = calendar.due_index(date) else {
                pass.skip(r.row, "日期不属于任何时段", &date.to_string());
                return Ok(());
            };
            if order > 0 {
                b.add_order_demand(item, d, order);
            }
            if forecast > 0 {
                b.add_forecast_demand(item, d, forecast);
            }
            pass.loaded();
            Ok(())
        })?;

        // ===== 期初库存 =====
        self.each_row(source, &sheets.initial_inventory, false, &mut report_sheets, |r, pass| {
            let item_name = r.text(&cols.item)?;
            let plant_name = r.text(&cols.plant)?;
            let quantity = r.int(&cols.quantity)?;
            let (Some(item), Some(plant)) = (b.find_item(item_name), b.find_plant(plant_name))
            else {
                pass.skip(r.row, "未知物料或工厂", &format!("{} @ {}", item_name, plant_name));
                return Ok(());
            };
            b.add_initial_inventory(item, plant, quantity);
            pass.loaded();
            Ok(())
        })?;

        // ===== 采购 / 在制 =====
        for (sheet, is_po) in [
            (&sheets.purchase_orders, true),
            (&sheets.work_in_process, false),
        ] {
            self.each_row(source, sheet, false, &mut report_sheets, |r, pass| {
                let item_name = r.text(&cols.item)?;
                let plant_name = r.text(&cols.plant)?;
                let quantity = r.int(&cols.quantity)?;
                let date = r.date(&cols.date, fmt)?;

                let (Some(item), Some(plant)) = (b.find_item(item_name), b.find_plant(plant_name))
                else {
                    pass.skip(r.row, "未知物料或工厂", &format!("{} @ {}", item_name, plant_name));
                    return Ok(());
                };
                let Some(d) = calendar.receipt_index(date) else {
                    pass.skip(r.row, "日期超出计划期", &date.to_string());
                    return Ok(());
                };
                if is_po {
                    b.add_purchase_order(plant, item, d, quantity);
                } else {
                    b.add_work_in_process(plant, item, d, quantity);
                }
                pass.loaded();
                Ok(())
            })?;
        }

        let refs = b.build();
        let report = LoadReport {
            source: source.describe(),
            start_date: calendar.start,
            period: calendar.period,
            sheets: report_sheets,
        };

        info!(
            period = report.period,
            start_date = %report.start_date,
            items = refs.items().len(),
            plants = refs.plants().len(),
            skipped_rows = report.skipped_rows(),
            "参考数据加载完成"
        );
        Ok((refs, report))
    }

    /// 逐行处理一张表并记录统计; 非必需表缺失时跳过
    fn each_row<F>(
        &self,
        source: &dyn SheetSource,
        sheet: &str,
        required: bool,
        report: &mut BTreeMap<String, SheetStats>,
        mut handle: F,
    ) -> ImportResult<()>
    where
        F: FnMut(&RowReader<'_>, &mut SheetPass<'_>) -> ImportResult<()>,
    {
        if !required && !source.has_sheet(sheet) {
            debug!(sheet, "工作表缺失, 按空表处理");
            return Ok(());
        }

        let rows = source.read_sheet(sheet)?;
        let mut pass = SheetPass::new(sheet, rows.len());
        for (i, data) in rows.iter().enumerate() {
            let reader = RowReader {
                sheet,
                row: i + 1,
                data,
            };
            handle(&reader, &mut pass)?;
        }

        debug!(
            sheet,
            loaded = pass.stats.loaded,
            skipped = pass.stats.skipped,
            "工作表加载完成"
        );
        report.insert(sheet.to_string(), pass.stats);
        Ok(())
    }
}
