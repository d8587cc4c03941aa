use super::RulePersistence;
use crate::types::{
    CalculationConfig, Calculations, ConditionSet, Rule, RuleError, RuleField, ValidationErrors,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// 编辑器状态: Draft -> Validating -> Valid / Invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorState {
    Draft,
    Validating,
    Valid,
    Invalid,
}

/// 保存结果; 校验失败不是错误,只是拒绝保存
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved,
    Rejected(ValidationErrors),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

impl Rule {
    /// 校验规则,返回所有不满足的属性
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.insert(RuleField::Name, "name required");
        }
        if self.description.trim().is_empty() {
            errors.insert(RuleField::Description, "description required");
        }
        if self.conditions.is_empty() {
            errors.insert(RuleField::Conditions, "at least one condition required");
        }
        if self.calculations.is_empty() {
            errors.insert(RuleField::Calculations, "at least one calculation required");
        }
        errors
    }
}

/// 单次编辑会话中的规则草稿
///
/// 所有修改都通过 `&mut self` 进行,任何修改都会使状态回到 `Draft`。
#[derive(Debug, Clone)]
pub struct RuleEditor {
    draft: Rule,
    state: EditorState,
    errors: ValidationErrors,
}

impl Default for RuleEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEditor {
    pub fn new() -> Self {
        Self::edit(Rule::default())
    }

    /// 编辑已有规则的副本
    pub fn edit(rule: Rule) -> Self {
        Self {
            draft: rule,
            state: EditorState::Draft,
            errors: ValidationErrors::new(),
        }
    }

    pub fn rule(&self) -> &Rule {
        &self.draft
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn rule_mut(&mut self) -> &mut Rule {
        self.state = EditorState::Draft;
        &mut self.draft
    }

    pub fn set_name(&mut self, name: &str) {
        self.rule_mut().name = name.to_string();
    }

    pub fn set_description(&mut self, description: &str) {
        self.rule_mut().description = description.to_string();
    }

    pub fn set_category(&mut self, category: &str) {
        self.rule_mut().category = category.to_string();
    }

    pub fn set_priority(&mut self, priority: u32) {
        self.rule_mut().priority = priority;
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.rule_mut().is_active = is_active;
    }

    pub fn conditions_mut(&mut self) -> &mut ConditionSet {
        &mut self.rule_mut().conditions
    }

    pub fn calculations_mut(&mut self) -> &mut Calculations {
        &mut self.rule_mut().calculations
    }

    pub fn add_calculation(&mut self, calc: CalculationConfig) {
        self.calculations_mut().push(calc);
    }

    /// 执行校验并更新状态与错误表
    pub fn validate(&mut self) -> &ValidationErrors {
        self.state = EditorState::Validating;
        self.errors = self.draft.validate();
        self.state = if self.errors.is_empty() {
            EditorState::Valid
        } else {
            EditorState::Invalid
        };
        &self.errors
    }

    /// 校验并保存; 校验失败时不会调用持久化
    pub async fn save(
        &mut self,
        persistence: &dyn RulePersistence,
    ) -> Result<SaveOutcome, RuleError> {
        if !self.validate().is_empty() {
            debug!(
                "规则 [{}] 校验失败: {:?}",
                self.draft.id,
                self.errors.fields()
            );
            return Ok(SaveOutcome::Rejected(self.errors.clone()));
        }

        if let Err(e) = persistence.persist(&self.draft).await {
            self.state = EditorState::Draft;
            return Err(e);
        }

        info!("规则 [{}] {} 保存成功", self.draft.id, self.draft.name);
        Ok(SaveOutcome::Saved)
    }

    pub fn into_rule(self) -> Rule {
        self.draft
    }
}
