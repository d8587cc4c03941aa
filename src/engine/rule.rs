use super::{JsonFileRuleStore, MemoryRuleStore, RulePersistence};
use crate::aop::{InterceptorManager, LoggingInterceptor, RuleInterceptor};
use crate::components::CalculationResults;
use crate::types::{Record, Rule, RuleError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// 单条规则的执行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub rule_id: String,
    pub priority: u32,
    pub matched: bool,
    pub results: CalculationResults,
}

/// 规则引擎: 保存规则并按优先级对记录执行所有启用的规则
#[derive(Debug, Clone)]
pub struct RuleEngine {
    store: Arc<MemoryRuleStore>,
    interceptor_manager: Arc<RwLock<InterceptorManager>>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        let mut manager = InterceptorManager::new();
        manager.register(Arc::new(LoggingInterceptor));

        Self {
            store: Arc::new(MemoryRuleStore::new()),
            interceptor_manager: Arc::new(RwLock::new(manager)),
        }
    }

    pub fn store(&self) -> Arc<MemoryRuleStore> {
        self.store.clone()
    }

    pub async fn add_interceptor(&self, interceptor: Arc<dyn RuleInterceptor>) {
        self.interceptor_manager.write().await.register(interceptor);
    }

    /// 从 JSON 加载规则,校验失败时拒绝加载
    pub async fn load_rule(&self, content: &str) -> Result<String, RuleError> {
        let rule: Rule = serde_json::from_str(content)?;
        self.add_rule(rule).await
    }

    pub async fn add_rule(&self, rule: Rule) -> Result<String, RuleError> {
        let errors = rule.validate();
        if !errors.is_empty() {
            return Err(RuleError::ConfigError(format!(
                "规则 {} 校验失败: {:?}",
                rule.id,
                errors.fields()
            )));
        }

        let id = rule.id.clone();
        self.store.insert(rule).await;
        Ok(id)
    }

    /// 加载目录下所有规则文件,返回加载数量
    pub async fn load_rules_from_dir(&self, dir: impl AsRef<Path>) -> Result<usize, RuleError> {
        let rules = JsonFileRuleStore::new(dir.as_ref()).load_all().await?;
        let count = rules.len();
        for rule in rules {
            self.add_rule(rule).await?;
        }
        debug!("从 {} 加载了 {} 条规则", dir.as_ref().display(), count);
        Ok(count)
    }

    pub async fn get_rule(&self, id: &str) -> Option<Arc<Rule>> {
        self.store.get(id).await
    }

    pub async fn remove_rule(&self, id: &str) -> Result<(), RuleError> {
        self.store.remove(id).await.map(|_| ())
    }

    pub async fn get_loaded_rules(&self) -> Vec<Arc<Rule>> {
        self.store.list_by_priority().await
    }

    pub fn get_current_version(&self) -> u64 {
        self.store.current_version()
    }

    /// 执行单条规则: 条件满足时计算所有启用的计算配置
    pub async fn execute_rule(&self, rule: &Rule, record: &Record) -> Result<RuleOutcome, RuleError> {
        let manager = self.interceptor_manager.read().await;
        manager.before_rule(rule, record).await?;

        let matched = rule.conditions.evaluate(record);
        let mut results = CalculationResults::new();
        if matched {
            for calc in rule.calculations.iter().filter(|c| c.is_active) {
                match calc.evaluate(record) {
                    Ok(value) => {
                        results.insert(calc.name.clone(), value);
                    }
                    Err(e) => {
                        manager.rule_error(rule, &e).await?;
                        return Err(e);
                    }
                }
            }
        }

        let outcome = RuleOutcome {
            rule_id: rule.id.clone(),
            priority: rule.priority,
            matched,
            results,
        };
        manager.after_rule(rule, &outcome).await?;
        Ok(outcome)
    }

    /// 按优先级执行所有启用的规则
    pub async fn evaluate(&self, record: &Record) -> Result<Vec<RuleOutcome>, RuleError> {
        let rules = self.store.active_by_priority().await;
        let mut outcomes = Vec::with_capacity(rules.len());
        for rule in rules {
            outcomes.push(self.execute_rule(&rule, record).await?);
        }
        Ok(outcomes)
    }
}

#[async_trait]
impl RulePersistence for RuleEngine {
    async fn persist(&self, rule: &Rule) -> Result<(), RuleError> {
        self.add_rule(rule.clone()).await.map(|_| ())
    }
}
