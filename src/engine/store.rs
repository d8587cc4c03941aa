use super::{Version, VersionManager};
use crate::types::{Rule, RuleError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 规则持久化回调,编辑器保存成功后调用
#[async_trait]
pub trait RulePersistence: Send + Sync {
    async fn persist(&self, rule: &Rule) -> Result<(), RuleError>;
}

/// 将异步闭包包装为 [`RulePersistence`]
pub struct FnPersistence<F> {
    f: F,
}

impl<F> fmt::Debug for FnPersistence<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPersistence")
            .field("f", &"<persistence function>")
            .finish()
    }
}

pub fn persistence_fn<F, Fut>(f: F) -> FnPersistence<F>
where
    F: Fn(Rule) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RuleError>> + Send + 'static,
{
    FnPersistence { f }
}

#[async_trait]
impl<F, Fut> RulePersistence for FnPersistence<F>
where
    F: Fn(Rule) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RuleError>> + Send + 'static,
{
    async fn persist(&self, rule: &Rule) -> Result<(), RuleError> {
        (self.f)(rule.clone()).await
    }
}

/// 已保存的规则及其版本
#[derive(Debug, Clone)]
pub struct StoredRule {
    pub rule: Arc<Rule>,
    pub version: Version,
}

impl StoredRule {
    /// 最后一次保存的时间
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.version.timestamp)
    }
}

/// 按优先级排序: 数字越小越靠前,同优先级按名称排序
fn by_priority(rules: &mut [Arc<Rule>]) {
    rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
}

/// 内存规则存储
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: RwLock<HashMap<String, StoredRule>>,
    version_manager: VersionManager,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            version_manager: VersionManager::new(),
        }
    }

    pub async fn insert(&self, rule: Rule) -> Version {
        let version = self.version_manager.create_version(&rule);
        let id = rule.id.clone();
        self.rules.write().await.insert(
            id,
            StoredRule {
                rule: Arc::new(rule),
                version,
            },
        );
        version
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Rule>> {
        self.rules.read().await.get(id).map(|s| s.rule.clone())
    }

    pub async fn version_of(&self, id: &str) -> Option<Version> {
        self.rules.read().await.get(id).map(|s| s.version)
    }

    pub async fn remove(&self, id: &str) -> Result<Arc<Rule>, RuleError> {
        self.rules
            .write()
            .await
            .remove(id)
            .map(|s| s.rule)
            .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.rules.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rules.read().await.is_empty()
    }

    /// 所有规则及其版本信息,按优先级排序
    pub async fn entries(&self) -> Vec<StoredRule> {
        let mut entries: Vec<StoredRule> = self.rules.read().await.values().cloned().collect();
        entries.sort_by(|a, b| {
            a.rule
                .priority
                .cmp(&b.rule.priority)
                .then_with(|| a.rule.name.cmp(&b.rule.name))
        });
        entries
    }

    /// 所有规则,按优先级排序
    pub async fn list_by_priority(&self) -> Vec<Arc<Rule>> {
        let mut rules: Vec<Arc<Rule>> = self
            .rules
            .read()
            .await
            .values()
            .map(|s| s.rule.clone())
            .collect();
        by_priority(&mut rules);
        rules
    }

    /// 启用的规则,按优先级排序
    pub async fn active_by_priority(&self) -> Vec<Arc<Rule>> {
        let mut rules = self.list_by_priority().await;
        rules.retain(|r| r.is_active);
        rules
    }

    pub fn current_version(&self) -> u64 {
        self.version_manager.get_current_version()
    }
}

#[async_trait]
impl RulePersistence for MemoryRuleStore {
    async fn persist(&self, rule: &Rule) -> Result<(), RuleError> {
        let version = self.insert(rule.clone()).await;
        debug!("规则 [{}] 写入内存存储, 版本 {}", rule.id, version.version);
        Ok(())
    }
}

/// 以 `<目录>/<规则标识>.json` 形式保存规则
#[derive(Debug, Clone)]
pub struct JsonFileRuleStore {
    dir: PathBuf,
}

impl JsonFileRuleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, RuleError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(RuleError::ConfigError(format!("无效的规则标识: {}", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    pub async fn load(&self, id: &str) -> Result<Rule, RuleError> {
        let path = self.path_for(id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(RuleError::RuleNotFound(id.to_string()));
        }
        read_rule(path).await
    }

    /// 读取目录下所有规则文件,按优先级排序
    pub async fn load_all(&self) -> Result<Vec<Rule>, RuleError> {
        if !tokio::fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }

        let mut rules = try_join_all(paths.into_iter().map(read_rule)).await?;
        rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        Ok(rules)
    }

    pub async fn remove(&self, id: &str) -> Result<(), RuleError> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RuleError::RuleNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn read_rule(path: PathBuf) -> Result<Rule, RuleError> {
    let content = tokio::fs::read_to_string(&path).await?;
    Ok(serde_json::from_str(&content)?)
}

#[async_trait]
impl RulePersistence for JsonFileRuleStore {
    async fn persist(&self, rule: &Rule) -> Result<(), RuleError> {
        let path = self.path_for(&rule.id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string_pretty(rule)?;
        tokio::fs::write(&path, content).await?;
        info!("规则 [{}] 已写入 {}", rule.id, path.display());
        Ok(())
    }
}
