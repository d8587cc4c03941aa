use crate::types::{Record, Rule, RuleError};
use anyhow::bail;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 测试输入数据
pub type TestData = Record;

/// 计算名称到结果的映射
pub type CalculationResults = BTreeMap<String, f64>;

/// 规则测试结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CalculationResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    pub fn passed(result: CalculationResults) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// 由调用方注入的测试求值函数
#[async_trait]
pub trait TestEvaluator: Send + Sync {
    async fn evaluate(&self, data: TestData) -> anyhow::Result<CalculationResults>;
}

/// 将异步闭包包装为 [`TestEvaluator`]
pub struct FnEvaluator<F> {
    f: F,
}

impl<F> fmt::Debug for FnEvaluator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEvaluator")
            .field("f", &"<evaluator function>")
            .finish()
    }
}

pub fn evaluator_fn<F, Fut>(f: F) -> FnEvaluator<F>
where
    F: Fn(TestData) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<CalculationResults>> + Send + 'static,
{
    FnEvaluator { f }
}

#[async_trait]
impl<F, Fut> TestEvaluator for FnEvaluator<F>
where
    F: Fn(TestData) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<CalculationResults>> + Send + 'static,
{
    async fn evaluate(&self, data: TestData) -> anyhow::Result<CalculationResults> {
        (self.f)(data).await
    }
}

/// 内置求值器: 先判断规则条件,再计算所有启用的计算配置
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    rule: Rule,
}

impl RuleEvaluator {
    pub fn new(rule: Rule) -> Self {
        Self { rule }
    }
}

#[async_trait]
impl TestEvaluator for RuleEvaluator {
    async fn evaluate(&self, data: TestData) -> anyhow::Result<CalculationResults> {
        if !self.rule.conditions.evaluate(&data) {
            bail!("规则条件不满足: {}", self.rule.name);
        }

        let mut results = CalculationResults::new();
        for calc in self.rule.calculations.iter().filter(|c| c.is_active) {
            results.insert(calc.name.clone(), calc.evaluate(&data)?);
        }
        Ok(results)
    }
}

/// 测试执行期间保持加载标记,结束或被丢弃时复位
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 规则测试器,管理输入数据、加载状态与最近一次结果
pub struct RuleTester {
    evaluator: Arc<dyn TestEvaluator>,
    inputs: RwLock<TestData>,
    loading: AtomicBool,
    last_result: RwLock<Option<TestResult>>,
}

impl fmt::Debug for RuleTester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTester")
            .field("evaluator", &"<test evaluator>")
            .field("loading", &self.is_loading())
            .finish()
    }
}

impl RuleTester {
    pub fn new(evaluator: Arc<dyn TestEvaluator>) -> Self {
        Self {
            evaluator,
            inputs: RwLock::new(TestData::new()),
            loading: AtomicBool::new(false),
            last_result: RwLock::new(None),
        }
    }

    /// 使用内置求值器测试指定规则
    pub fn for_rule(rule: Rule) -> Self {
        Self::new(Arc::new(RuleEvaluator::new(rule)))
    }

    pub async fn set_input(&self, field: &str, value: Value) {
        self.inputs.write().await.insert(field.to_string(), value);
    }

    pub async fn set_inputs(&self, data: TestData) {
        *self.inputs.write().await = data;
    }

    pub async fn inputs(&self) -> TestData {
        self.inputs.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn last_result(&self) -> Option<TestResult> {
        self.last_result.read().await.clone()
    }

    /// 占用加载标记,测试进行中时返回 [`RuleError::TestInProgress`]
    fn begin(&self) -> Result<LoadingGuard<'_>, RuleError> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("规则测试正在进行中, 忽略重复调用");
            return Err(RuleError::TestInProgress);
        }
        Ok(LoadingGuard(&self.loading))
    }

    /// 使用当前输入执行测试
    ///
    /// 测试进行中再次调用会直接返回 [`RuleError::TestInProgress`],
    /// 求值失败会转换为 `success: false` 的结果。
    pub async fn test(&self) -> Result<TestResult, RuleError> {
        let _guard = self.begin()?;
        Ok(self.run().await)
    }

    /// 替换输入后执行测试; 被拒绝的调用不会修改输入
    pub async fn test_with(&self, data: TestData) -> Result<TestResult, RuleError> {
        let _guard = self.begin()?;
        self.set_inputs(data).await;
        Ok(self.run().await)
    }

    async fn run(&self) -> TestResult {
        let data = self.inputs().await;
        debug!("开始规则测试, 输入: {:?}", data);

        let result = match self.evaluator.evaluate(data).await {
            Ok(results) => {
                info!("规则测试通过: {:?}", results);
                TestResult::passed(results)
            }
            Err(e) => {
                info!("规则测试失败: {}", e);
                TestResult::failed(e.to_string())
            }
        };

        *self.last_result.write().await = Some(result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CalculationConfig, Condition, ConditionOperator};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn failed_result_omits_result_field() {
        let value = serde_json::to_value(TestResult::failed("boom")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn rule_evaluator_skips_inactive_calculations() {
        let mut rule = Rule::new("Teste", "descrição");
        rule.conditions
            .push(Condition::new("salary", ConditionOperator::NotEquals, "0"));
        let mut inactive = CalculationConfig::new("off", "1 +");
        inactive.is_active = false;
        rule.calculations = vec![CalculationConfig::new("on", "2 * 21"), inactive].into();

        let tester = RuleTester::for_rule(rule);
        let result = tokio_test::block_on(async {
            tester.set_input("salary", json!(10)).await;
            tester.test().await
        })
        .unwrap();

        assert_eq!(
            result,
            TestResult::passed(CalculationResults::from([("on".to_string(), 42.0)]))
        );
        assert!(!tester.is_loading());
    }
}
