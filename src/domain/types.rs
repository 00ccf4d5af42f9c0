// ==========================================
// 多工厂供应计划系统 - 领域类型定义
// ==========================================
// 职责: 主数据索引类型 + 枚举
// 红线: 所有索引在加载时分配, 规划过程中不再变化
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 主数据索引 (加载时分配的紧凑下标)
// ==========================================

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub usize);

        impl $name {
            /// 在稠密数组中的下标
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

index_type!(
    /// 物料索引
    ItemId,
    "item"
);
index_type!(
    /// 工厂索引
    PlantId,
    "plant"
);
index_type!(
    /// 机台组索引
    MachineSetId,
    "machine_set"
);
index_type!(
    /// 生产工艺索引 (物料 x 工厂)
    ProductionId,
    "production"
);
index_type!(
    /// 调拨线路索引 (物料 x 发货厂 x 收货厂)
    TransitId,
    "transit"
);

// ==========================================
// 产能类型
// ==========================================
// 机台组按一种产能类型计量, 物料对每种类型有各自的消耗率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CapacityType {
    Pcs,   // 件数
    Point, // 点数
}

impl fmt::Display for CapacityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityType::Pcs => write!(f, "Pcs"),
            CapacityType::Point => write!(f, "Point"),
        }
    }
}

// ==========================================
// BOM 供料方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SupplyType {
    #[default]
    Push,
    Bulk,
    Supplier,
}

impl SupplyType {
    /// 从文本解析 (大小写不敏感), 未识别返回 None
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "push" | "" => Some(SupplyType::Push),
            "bulk" => Some(SupplyType::Bulk),
            "supplier" => Some(SupplyType::Supplier),
            _ => None,
        }
    }
}

impl fmt::Display for SupplyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplyType::Push => write!(f, "Push"),
            SupplyType::Bulk => write!(f, "Bulk"),
            SupplyType::Supplier => write!(f, "Supplier"),
        }
    }
}

// ==========================================
// 需求类型
// ==========================================
// 订单: 可延期交付至计划期末, 计入累计延期
// 预测: 只能当天满足, 否则永久计入延期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DemandKind {
    Order,
    Forecast,
}

impl fmt::Display for DemandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandKind::Order => write!(f, "ORDER"),
            DemandKind::Forecast => write!(f, "FORECAST"),
        }
    }
}
