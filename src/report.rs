// ==========================================
// 多工厂供应计划系统 - 结果输出
// ==========================================
// 职责: 规划指标汇总、多输入指标表、台账指令导出
// 输出: summary.csv / production.csv / transit.csv / supply.csv / summary.json
// ==========================================

use crate::domain::reference::ReferenceData;
use crate::engine::schedule::Schedule;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("输出文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 写入失败: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

// ==========================================
// 指标
// ==========================================

/// 台账合计指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTotals {
    pub start_date: usize,
    pub end_date: usize,
    pub fill_rate: f64,
    pub holding_cost: f64,
    pub production_cost: f64,
    pub transit_cost: f64,
    pub total_cost: f64,
    pub total_delay: i64,
    pub production_instructions: usize,
    pub transit_instructions: usize,
    pub supply_instructions: usize,
}

impl ScheduleTotals {
    pub fn of(schedule: &Schedule<'_>) -> Self {
        Self {
            start_date: schedule.start_date(),
            end_date: schedule.end_date(),
            fill_rate: schedule.calc_fill_rate(),
            holding_cost: schedule.holding_cost(),
            production_cost: schedule.production_cost(),
            transit_cost: schedule.transit_cost(),
            total_cost: schedule.total_cost(),
            total_delay: schedule.total_delay(),
            production_instructions: schedule.all_production_instructions().count(),
            transit_instructions: schedule.all_transit_instructions().count(),
            supply_instructions: schedule.all_supply_instructions().count(),
        }
    }
}

/// 单次规划的运行摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub run_id: Uuid,
    pub input: String,
    pub rule: String,
    pub rescheduled: bool,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub totals: ScheduleTotals,
}

impl PlanSummary {
    pub fn new(
        input: &str,
        rule: &str,
        rescheduled: bool,
        schedule: &Schedule<'_>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            input: input.to_string(),
            rule: rule.to_string(),
            rescheduled,
            elapsed_ms,
            totals: ScheduleTotals::of(schedule),
        }
    }
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    input: &'a str,
    fill_rate: f64,
    holding_cost: f64,
    production_cost: f64,
    transit_cost: f64,
    total_delay: i64,
    seconds: f64,
}

/// 写出多输入的指标表
pub fn write_summary_csv<P: AsRef<Path>>(path: P, summaries: &[PlanSummary]) -> ReportResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    if summaries.is_empty() {
        writer.write_record([
            "input",
            "fill_rate",
            "holding_cost",
            "production_cost",
            "transit_cost",
            "total_delay",
            "seconds",
        ])?;
    }
    for s in summaries {
        writer.serialize(SummaryRow {
            input: &s.input,
            fill_rate: s.totals.fill_rate,
            holding_cost: s.totals.holding_cost,
            production_cost: s.totals.production_cost,
            transit_cost: s.totals.transit_cost,
            total_delay: s.totals.total_delay,
            seconds: s.elapsed_ms as f64 / 1000.0,
        })?;
    }
    writer.flush()?;
    Ok(())
}

// ==========================================
// 台账导出
// ==========================================

#[derive(Serialize)]
struct ProductionRow<'a> {
    item: &'a str,
    plant: &'a str,
    start_date: usize,
    finish_date: usize,
    lots: i64,
    quantity: i64,
}

#[derive(Serialize)]
struct TransitRow<'a> {
    item: &'a str,
    source: &'a str,
    destination: &'a str,
    start_date: usize,
    arrival_date: usize,
    quantity: i64,
}

#[derive(Serialize)]
struct SupplyRow<'a> {
    item: &'a str,
    plant: &'a str,
    date: usize,
    order_quantity: i64,
    forecast_quantity: i64,
}

/// 导出台账指令与合计指标到目录 `dir`
pub fn export_schedule<P: AsRef<Path>>(
    dir: P,
    refs: &ReferenceData,
    schedule: &Schedule<'_>,
) -> ReportResult<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let item_name = |id| refs.item(id).name.as_str();
    let plant_name = |id| refs.plant(id).name.as_str();

    let mut writer = csv::Writer::from_path(dir.join("production.csv"))?;
    for p in schedule.all_production_instructions() {
        writer.serialize(ProductionRow {
            item: item_name(p.item),
            plant: plant_name(p.plant),
            start_date: p.start_date,
            finish_date: p.finish_date,
            lots: p.lots,
            quantity: p.quantity,
        })?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(dir.join("transit.csv"))?;
    for t in schedule.all_transit_instructions() {
        writer.serialize(TransitRow {
            item: item_name(t.item),
            source: plant_name(t.source),
            destination: plant_name(t.destination),
            start_date: t.start_date,
            arrival_date: t.arrival_date,
            quantity: t.quantity,
        })?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(dir.join("supply.csv"))?;
    for s in schedule.all_supply_instructions() {
        writer.serialize(SupplyRow {
            item: item_name(s.item),
            plant: plant_name(s.plant),
            date: s.date,
            order_quantity: s.order_quantity,
            forecast_quantity: s.forecast_quantity,
        })?;
    }
    writer.flush()?;

    let totals = ScheduleTotals::of(schedule);
    serde_json::to_writer_pretty(File::create(dir.join("summary.json"))?, &totals)?;

    info!(
        dir = %dir.display(),
        production = totals.production_instructions,
        transit = totals.transit_instructions,
        supply = totals.supply_instructions,
        "台账导出完成"
    );
    Ok(())
}
