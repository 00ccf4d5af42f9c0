// ==========================================
// 多工厂供应计划系统 - 供应链选择规则
// ==========================================
// 职责: 在同一交付日的候选链中选出下一条链; 重排时对历史链排序
// 输入: 激活子图快照列表
// 输出: 选中的快照 / 排序结果
// ==========================================

use crate::engine::supply_chain::{ActiveChain, ChainRecord};
use std::cmp::Ordering;

/// 优先级函数, 分值越大越优先
pub type ChainPriority = fn(&ActiveChain) -> f64;

// ==========================================
// ChainRule - 可插拔的链选择规则
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ChainRule {
    name: &'static str,
    priority: ChainPriority,
}

impl ChainRule {
    pub fn new(name: &'static str, priority: ChainPriority) -> Self {
        Self { name, priority }
    }

    /// SCF: 跳数最少优先
    pub fn shortest_chain_first() -> Self {
        Self::new("SCF", |chain| -(chain.hops as f64))
    }

    /// CCF: 单件总成本最低优先
    pub fn cheapest_chain_first() -> Self {
        Self::new("CCF", |chain| -chain.total_cost())
    }

    /// 按配置代码取规则 (SCF / CCF, 大小写不敏感)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "SCF" => Some(Self::shortest_chain_first()),
            "CCF" => Some(Self::cheapest_chain_first()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn priority(&self, chain: &ActiveChain) -> f64 {
        (self.priority)(chain)
    }

    /// Less 表示 `a` 优先
    pub fn compare(&self, a: &ActiveChain, b: &ActiveChain) -> Ordering {
        self.priority(b)
            .partial_cmp(&self.priority(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| tie_break(a, b))
    }

    /// 选出最优候选
    pub fn select(&self, candidates: Vec<ActiveChain>) -> Option<ActiveChain> {
        candidates.into_iter().min_by(|a, b| self.compare(a, b))
    }
}

impl Default for ChainRule {
    fn default() -> Self {
        Self::shortest_chain_first()
    }
}

/// 默认次级比较: 可供量大者优先, 再总成本低者, 再工厂下标小者
pub fn tie_break(a: &ActiveChain, b: &ActiveChain) -> Ordering {
    b.quantity
        .cmp(&a.quantity)
        .then_with(|| {
            a.total_cost()
                .partial_cmp(&b.total_cost())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.plant.cmp(&b.plant))
}

/// 重排紧急度: 供给开始日 + 提前期 (交付日) 升序, 再跳数升序
///
/// 配合稳定排序使用, 完全相同时保持原台账记录顺序;
/// 上游生产留下的余量晚于或同日被下游记录使用, 因此先于后者重放
pub fn urgency_order(a: &ChainRecord, b: &ChainRecord) -> Ordering {
    a.chain
        .urgency_date()
        .cmp(&b.chain.urgency_date())
        .then_with(|| a.chain.hops.cmp(&b.chain.hops))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ItemId, PlantId};

    fn chain(plant: usize, hops: usize, quantity: i64, cost: f64) -> ActiveChain {
        ActiveChain {
            item: ItemId(0),
            plant: PlantId(plant),
            date: 3,
            quantity,
            inventory: if hops == 0 { quantity } else { 0 },
            lead_time: hops,
            hops,
            holding_cost: 0.0,
            production_cost: cost,
            transit_cost: 0.0,
            production: None,
            lanes: Vec::new(),
        }
    }

    #[test]
    fn test_shortest_chain_first() {
        let rule = ChainRule::shortest_chain_first();
        let picked = rule
            .select(vec![chain(0, 2, 100, 1.0), chain(1, 1, 5, 9.0)])
            .unwrap();
        assert_eq!(picked.plant, PlantId(1));
    }

    #[test]
    fn test_cheapest_chain_first() {
        let rule = ChainRule::cheapest_chain_first();
        let picked = rule
            .select(vec![chain(0, 2, 100, 1.0), chain(1, 1, 5, 9.0)])
            .unwrap();
        assert_eq!(picked.plant, PlantId(0));
    }

    #[test]
    fn test_tie_break_quantity_then_cost_then_plant() {
        let rule = ChainRule::default();
        let picked = rule
            .select(vec![chain(2, 1, 10, 1.0), chain(1, 1, 20, 5.0)])
            .unwrap();
        assert_eq!(picked.plant, PlantId(1));

        let picked = rule
            .select(vec![chain(2, 1, 10, 5.0), chain(1, 1, 10, 1.0)])
            .unwrap();
        assert_eq!(picked.plant, PlantId(1));

        let picked = rule
            .select(vec![chain(3, 1, 10, 1.0), chain(2, 1, 10, 1.0)])
            .unwrap();
        assert_eq!(picked.plant, PlantId(2));
    }

    #[test]
    fn test_from_code() {
        assert_eq!(ChainRule::from_code("scf").unwrap().name(), "SCF");
        assert_eq!(ChainRule::from_code("CCF").unwrap().name(), "CCF");
        assert!(ChainRule::from_code("EDD").is_none());
    }

    #[test]
    fn test_urgency_order() {
        let early = ChainRecord {
            chain: chain(0, 2, 1, 0.0),
            quantity: 1,
        };
        let mut late = early.clone();
        late.chain.date = 5;
        assert_eq!(urgency_order(&early, &late), Ordering::Less);

        let mut short = early.clone();
        short.chain.hops = 1;
        short.chain.lead_time = 2;
        assert_eq!(urgency_order(&short, &early), Ordering::Less);
    }

    #[test]
    fn test_urgency_ignores_lead_time() {
        // 第 5 天交付的生产链 (提前期 3) 先于第 6 天的库存链
        let mut produced = ChainRecord {
            chain: chain(0, 1, 25, 100.0),
            quantity: 25,
        };
        produced.chain.date = 5;
        produced.chain.lead_time = 3;
        let mut leftover = ChainRecord {
            chain: chain(0, 0, 5, 0.0),
            quantity: 3,
        };
        leftover.chain.date = 6;

        assert_eq!(produced.chain.provision_date(), 2);
        assert_eq!(urgency_order(&produced, &leftover), Ordering::Less);
    }
}
