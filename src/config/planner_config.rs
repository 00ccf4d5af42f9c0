use crate::config::app_config::{ConfigError, ConfigResult};
use crate::engine::priority::ChainRule;
use serde::{Deserialize, Serialize};

/// 规划参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// 链选择规则代码: SCF (跳数最少) / CCF (成本最低)
    pub chain_rule: String,

    /// 台账起点 (计划期内日期下标)
    pub start_date_index: usize,

    /// 贪心排产后是否以其台账为历史再重排一次
    pub reschedule: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            chain_rule: "SCF".to_string(),
            start_date_index: 0,
            reschedule: false,
        }
    }
}

impl PlannerConfig {
    pub fn chain_rule(&self) -> ConfigResult<ChainRule> {
        ChainRule::from_code(&self.chain_rule).ok_or_else(|| ConfigError::InvalidValue {
            key: "planner.chain_rule".to_string(),
            value: self.chain_rule.clone(),
            message: "仅支持 SCF / CCF".to_string(),
        })
    }
}
