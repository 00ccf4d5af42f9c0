// ==========================================
// 多工厂供应计划系统 - 需求
// ==========================================
// 职责: 订单/预测需求的交付窗口与优先级
// 红线: 同一天内预测优先于订单, 日期越早越优先
// ==========================================

use crate::domain::reference::ReferenceData;
use crate::domain::types::{DemandKind, ItemId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 一条待满足的需求 (物料 x 日期 x 类型)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub kind: DemandKind,
    pub item: ItemId,
    pub date: usize,
    pub requested: i64,
    pub quantity: i64, // 剩余未满足数量
}

impl Demand {
    pub fn order(item: ItemId, date: usize, quantity: i64) -> Self {
        Self {
            kind: DemandKind::Order,
            item,
            date,
            requested: quantity,
            quantity,
        }
    }

    pub fn forecast(item: ItemId, date: usize, quantity: i64) -> Self {
        Self {
            kind: DemandKind::Forecast,
            item,
            date,
            requested: quantity,
            quantity,
        }
    }

    /// 优先级分值, 越小越紧急
    pub fn priority(&self) -> f64 {
        match self.kind {
            DemandKind::Forecast => self.date as f64,
            DemandKind::Order => self.date as f64 + 0.5,
        }
    }

    /// 最晚供货日 (不含); 订单可拖到计划期末, 预测只认当天
    pub fn latest_supply_date(&self, end: usize) -> usize {
        match self.kind {
            DemandKind::Order => end,
            DemandKind::Forecast => (self.date + 1).min(end),
        }
    }

    /// 在 `date` 供货是否落在交付窗口内
    pub fn accepts_supply_on(&self, date: usize, end: usize) -> bool {
        self.date <= date && date < self.latest_supply_date(end)
    }

    pub fn is_satisfied(&self) -> bool {
        self.quantity <= 0
    }

    /// 排序比较: 优先级分值, 再按物料下标
    pub fn urgency_cmp(&self, other: &Demand) -> Ordering {
        self.priority()
            .partial_cmp(&other.priority())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.item.cmp(&other.item))
    }

    /// 收集计划期 `[start, end)` 内全部非零需求, 按紧急程度排序
    pub fn collect(refs: &ReferenceData, start: usize, end: usize) -> Vec<Demand> {
        let mut demands = Vec::new();

        for item in refs.items() {
            for (&date, &q) in item.order_demand.range(start..end) {
                if q > 0 {
                    demands.push(Demand::order(item.id, date, q));
                }
            }
            for (&date, &q) in item.forecast_demand.range(start..end) {
                if q > 0 {
                    demands.push(Demand::forecast(item.id, date, q));
                }
            }
        }

        demands.sort_by(|a, b| a.urgency_cmp(b));
        demands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_before_order_same_day() {
        let o = Demand::order(ItemId(0), 3, 10);
        let f = Demand::forecast(ItemId(1), 3, 10);
        assert!(f.priority() < o.priority());
        assert_eq!(f.urgency_cmp(&o), Ordering::Less);
    }

    #[test]
    fn test_earlier_date_dominates() {
        let o = Demand::order(ItemId(0), 2, 10);
        let f = Demand::forecast(ItemId(0), 3, 10);
        assert_eq!(o.urgency_cmp(&f), Ordering::Less);
    }

    #[test]
    fn test_supply_window() {
        let o = Demand::order(ItemId(0), 2, 10);
        assert!(o.accepts_supply_on(2, 10));
        assert!(o.accepts_supply_on(9, 10));
        assert!(!o.accepts_supply_on(1, 10));
        assert!(!o.accepts_supply_on(10, 10));

        let f = Demand::forecast(ItemId(0), 2, 10);
        assert!(f.accepts_supply_on(2, 10));
        assert!(!f.accepts_supply_on(3, 10));
        assert_eq!(f.latest_supply_date(10), 3);
    }
}
