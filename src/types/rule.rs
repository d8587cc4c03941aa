use super::{Calculations, ConditionSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 规则: 条件集合与计算配置的聚合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub conditions: ConditionSet,
    #[serde(default)]
    pub calculations: Calculations,
    pub is_active: bool,
    /// 执行优先级,1 为最高
    pub priority: u32,
    pub category: String,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            description: String::new(),
            conditions: ConditionSet::default(),
            calculations: Calculations::default(),
            is_active: true,
            priority: 1,
            category: String::new(),
        }
    }
}

impl Rule {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }
}

/// 保存校验涉及的规则属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleField {
    Name,
    Description,
    Conditions,
    Calculations,
}

/// 按属性归类的校验错误
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<RuleField, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: RuleField, message: &str) {
        self.0.insert(field, message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: RuleField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn get(&self, field: RuleField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn fields(&self) -> Vec<RuleField> {
        self.0.keys().copied().collect()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
