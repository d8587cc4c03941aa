use crate::engine::RuleOutcome;
use crate::types::{Record, Rule, RuleError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 规则拦截器,在规则求值的不同阶段被调用
#[async_trait]
pub trait RuleInterceptor: Send + Sync + std::fmt::Debug {
    /// 规则求值前
    async fn before(&self, rule: &Rule, record: &Record) -> Result<(), RuleError>;

    /// 规则求值后
    async fn after(&self, rule: &Rule, outcome: &RuleOutcome) -> Result<(), RuleError>;

    /// 规则求值出错时
    async fn error(&self, rule: &Rule, error: &RuleError) -> Result<(), RuleError>;
}

/// 拦截器管理器
#[derive(Debug, Default)]
pub struct InterceptorManager {
    interceptors: Vec<Arc<dyn RuleInterceptor>>,
}

impl InterceptorManager {
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    pub fn register(&mut self, interceptor: Arc<dyn RuleInterceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub async fn before_rule(&self, rule: &Rule, record: &Record) -> Result<(), RuleError> {
        for interceptor in &self.interceptors {
            interceptor.before(rule, record).await?;
        }
        Ok(())
    }

    pub async fn after_rule(&self, rule: &Rule, outcome: &RuleOutcome) -> Result<(), RuleError> {
        for interceptor in &self.interceptors {
            interceptor.after(rule, outcome).await?;
        }
        Ok(())
    }

    pub async fn rule_error(&self, rule: &Rule, error: &RuleError) -> Result<(), RuleError> {
        for interceptor in &self.interceptors {
            interceptor.error(rule, error).await?;
        }
        Ok(())
    }
}

/// 记录规则求值关键信息的日志拦截器
#[derive(Debug)]
pub struct LoggingInterceptor;

#[async_trait]
impl RuleInterceptor for LoggingInterceptor {
    async fn before(&self, rule: &Rule, record: &Record) -> Result<(), RuleError> {
        debug!(
            "开始执行规则 [{}] {}, 优先级: {}, 输入: {:?}",
            rule.id, rule.name, rule.priority, record
        );
        Ok(())
    }

    async fn after(&self, rule: &Rule, outcome: &RuleOutcome) -> Result<(), RuleError> {
        info!(
            "规则 [{}] 执行完成, 条件满足: {}, 结果: {:?}",
            rule.id, outcome.matched, outcome.results
        );
        Ok(())
    }

    async fn error(&self, rule: &Rule, error: &RuleError) -> Result<(), RuleError> {
        warn!("规则 [{}] 执行出错: {}", rule.id, error);
        Ok(())
    }
}
