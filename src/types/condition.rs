use super::FieldId;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// 条件比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionOperator {
    #[default]
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
}

/// 连接当前条件与下一个条件的逻辑运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl LogicalOperator {
    pub fn apply(self, left: bool, right: bool) -> bool {
        match self {
            LogicalOperator::And => left && right,
            LogicalOperator::Or => left || right,
        }
    }
}

/// 规则过滤表达式中的一个子句
///
/// `logical_operator` 描述本条件与下一个条件的组合方式,
/// 最后一个条件上的连接符不参与求值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    pub field: FieldId,
    pub operator: ConditionOperator,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<LogicalOperator>,
}

impl Condition {
    pub fn new(field: &str, operator: ConditionOperator, value: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            field: field.to_string(),
            operator,
            value: value.to_string(),
            logical_operator: None,
        }
    }

    pub fn joined_by(mut self, logical_operator: LogicalOperator) -> Self {
        self.logical_operator = Some(logical_operator);
        self
    }

    pub(crate) fn apply_patch(&mut self, patch: ConditionPatch) {
        if let Some(field) = patch.field {
            self.field = field;
        }
        if let Some(operator) = patch.operator {
            self.operator = operator;
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(logical_operator) = patch.logical_operator {
            self.logical_operator = Some(logical_operator);
        }
    }
}

/// 条件的部分更新,`None` 字段保持原值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionPatch {
    #[serde(default)]
    pub field: Option<FieldId>,
    #[serde(default)]
    pub operator: Option<ConditionOperator>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub logical_operator: Option<LogicalOperator>,
}

/// 条件移动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// 有序条件列表,按从左到右的顺序与成对连接符求值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet {
    pub(crate) conditions: Vec<Condition>,
    #[serde(skip)]
    pub(crate) default_field: FieldId,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增条件时使用的默认字段
    pub fn with_default_field(mut self, field: &str) -> Self {
        self.default_field = field.to_string();
        self
    }

    pub fn as_slice(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn ids(&self) -> Vec<&str> {
        self.conditions.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.id == id)
    }
}

impl From<Vec<Condition>> for ConditionSet {
    fn from(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            default_field: FieldId::new(),
        }
    }
}

impl PartialEq for ConditionSet {
    fn eq(&self, other: &Self) -> bool {
        self.conditions == other.conditions
    }
}

impl Deref for ConditionSet {
    type Target = [Condition];

    fn deref(&self) -> &Self::Target {
        &self.conditions
    }
}
