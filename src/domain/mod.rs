// ==========================================
// 多工厂供应计划系统 - 领域模型层
// ==========================================
// 职责: 参考数据实体、需求、库存格、计划指令
// 红线: 不含引擎逻辑, 参考数据加载后只读
// ==========================================

pub mod capacity;
pub mod demand;
pub mod instruction;
pub mod inventory;
pub mod item;
pub mod plant;
pub mod production;
pub mod reference;
pub mod types;

// 重导出核心类型
pub use capacity::{CapacityConstraint, CapacitySlot, MachineSet};
pub use demand::Demand;
pub use instruction::{ProductionInstruction, SupplyInstruction, TransitInstruction};
pub use inventory::Inventory;
pub use item::Item;
pub use plant::Plant;
pub use production::{BomComponent, Production, Transit};
pub use reference::{ReferenceData, ReferenceDataBuilder};
pub use types::{
    CapacityType, DemandKind, ItemId, MachineSetId, PlantId, ProductionId, SupplyType, TransitId,
};
