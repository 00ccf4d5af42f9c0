// ==========================================
// 多工厂供应计划系统 - 导入配置
// ==========================================
// 职责: 参考数据各表的表名与列名、产能类型名称映射、日期格式
// 红线: 只描述"去哪里读", 不含解析逻辑
// ==========================================

use crate::config::app_config::{ConfigError, ConfigResult};
use crate::domain::types::CapacityType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 导入配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub sheets: SheetNames,
    pub columns: ColumnNames,

    /// 表中出现的产能类型名称 -> 产能类型
    pub capacity_types: BTreeMap<String, CapacityType>,

    /// chrono 日期格式
    pub date_format: String,

    /// 最大产量为空或 0 时视为不限
    pub zero_max_production_unlimited: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        let capacity_types = [("Pcs", CapacityType::Pcs), ("Point", CapacityType::Point)]
            .into_iter()
            .map(|(name, ct)| (name.to_string(), ct))
            .collect();

        Self {
            sheets: SheetNames::default(),
            columns: ColumnNames::default(),
            capacity_types,
            date_format: "%Y%m%d".to_string(),
            zero_max_production_unlimited: true,
        }
    }
}

impl ImportConfig {
    pub fn capacity_type(&self, name: &str) -> Option<CapacityType> {
        self.capacity_types.get(name.trim()).copied()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.date_format.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "import.date_format".to_string(),
                value: self.date_format.clone(),
                message: "日期格式不能为空".to_string(),
            });
        }
        if let Some((key, _)) = self.sheets.entries().into_iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: format!("import.sheets.{}", key),
                value: String::new(),
                message: "表名不能为空".to_string(),
            });
        }
        Ok(())
    }
}

// ==========================================
// SheetNames - 表名
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub time_periods: String,
    pub plants: String,
    pub machine_sets: String,
    pub items: String,
    pub item_rates: String,
    pub item_machine_sets: String,
    pub capacities: String,
    pub productions: String,
    pub bom: String,
    pub transits: String,
    pub demands: String,
    pub initial_inventory: String,
    pub purchase_orders: String,
    pub work_in_process: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            time_periods: "Time Periods".to_string(),
            plants: "Plants".to_string(),
            machine_sets: "Sets".to_string(),
            items: "Items".to_string(),
            item_rates: "Rate".to_string(),
            item_machine_sets: "Item Sets".to_string(),
            capacities: "Capacity".to_string(),
            productions: "Production".to_string(),
            bom: "Plant Bom".to_string(),
            transits: "Transit".to_string(),
            demands: "Demand".to_string(),
            initial_inventory: "Item Initial Inventory".to_string(),
            purchase_orders: "Raw Material Po".to_string(),
            work_in_process: "Items WIP".to_string(),
        }
    }
}

impl SheetNames {
    /// (配置键, 表名), 按导入顺序
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("time_periods", &self.time_periods),
            ("plants", &self.plants),
            ("machine_sets", &self.machine_sets),
            ("items", &self.items),
            ("item_rates", &self.item_rates),
            ("item_machine_sets", &self.item_machine_sets),
            ("capacities", &self.capacities),
            ("productions", &self.productions),
            ("bom", &self.bom),
            ("transits", &self.transits),
            ("demands", &self.demands),
            ("initial_inventory", &self.initial_inventory),
            ("purchase_orders", &self.purchase_orders),
            ("work_in_process", &self.work_in_process),
        ]
    }
}

// ==========================================
// ColumnNames - 列名
// ==========================================
// 同名概念在各表共用一个列名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    // ===== 键 =====
    pub item: String,
    pub plant: String,
    pub machine_set: String,
    pub date: String,

    // ===== 主数据 =====
    pub locked_out_days: String,
    pub holding_cost: String,
    pub capacity_type: String,
    pub rate: String,
    pub capacity: String,

    // ===== 工艺 =====
    pub cost: String,
    pub lead_time: String,
    pub lot_size: String,
    pub min_production: String,
    pub max_production: String,
    pub assembly: String,
    pub component: String,
    pub supply_type: String,

    // ===== 调拨 =====
    pub from_plant: String,
    pub to_plant: String,

    // ===== 数量 =====
    pub quantity: String,
    pub order_demand: String,
    pub forecast_demand: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            item: "Item".to_string(),
            plant: "Plant".to_string(),
            machine_set: "Set".to_string(),
            date: "Date".to_string(),
            locked_out_days: "Locked Out Days".to_string(),
            holding_cost: "Holding Cost".to_string(),
            capacity_type: "Capacity Type".to_string(),
            rate: "Rate".to_string(),
            capacity: "Capacity".to_string(),
            cost: "Cost".to_string(),
            lead_time: "Lead Time".to_string(),
            lot_size: "Lot Size".to_string(),
            min_production: "Min Production".to_string(),
            max_production: "Max Production".to_string(),
            assembly: "Assembly".to_string(),
            component: "Component".to_string(),
            supply_type: "Supply Type".to_string(),
            from_plant: "From Plant".to_string(),
            to_plant: "To Plant".to_string(),
            quantity: "Quantity".to_string(),
            order_demand: "Order Demand".to_string(),
            forecast_demand: "Forecast Demand".to_string(),
        }
    }
}
