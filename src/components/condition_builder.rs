use crate::types::{
    Condition, ConditionOperator, ConditionPatch, ConditionSet, Direction, LogicalOperator,
    RuleError,
};
use tracing::debug;
use uuid::Uuid;

impl ConditionSet {
    /// 在列表末尾追加默认条件,返回新条件的标识
    pub fn add_condition(&mut self) -> String {
        let condition = Condition {
            id: Uuid::new_v4().to_string(),
            field: self.default_field.clone(),
            operator: ConditionOperator::Equals,
            value: String::new(),
            logical_operator: Some(LogicalOperator::And),
        };
        let id = condition.id.clone();
        self.conditions.push(condition);
        id
    }

    /// 追加一个已构造的条件
    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// 按标识删除条件,标识不存在时返回 false 且列表不变
    pub fn remove_condition(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) => {
                self.conditions.remove(index);
                true
            }
            None => {
                debug!("删除条件被忽略, 标识不存在: {}", id);
                false
            }
        }
    }

    pub fn try_remove_condition(&mut self, id: &str) -> Result<Condition, RuleError> {
        let index = self
            .position(id)
            .ok_or_else(|| RuleError::ConditionNotFound(id.to_string()))?;
        Ok(self.conditions.remove(index))
    }

    /// 合并部分更新,标识不存在时返回 false
    pub fn update_condition(&mut self, id: &str, patch: ConditionPatch) -> bool {
        match self.conditions.iter_mut().find(|c| c.id == id) {
            Some(condition) => {
                condition.apply_patch(patch);
                true
            }
            None => {
                debug!("更新条件被忽略, 标识不存在: {}", id);
                false
            }
        }
    }

    pub fn try_update_condition(&mut self, id: &str, patch: ConditionPatch) -> Result<(), RuleError> {
        let condition = self
            .conditions
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RuleError::ConditionNotFound(id.to_string()))?;
        condition.apply_patch(patch);
        Ok(())
    }

    /// 与相邻条件交换位置; 首个条件不能上移,末尾条件不能下移
    pub fn move_condition(&mut self, index: usize, direction: Direction) -> bool {
        if index >= self.conditions.len() {
            return false;
        }
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.conditions.len() => index + 1,
            _ => return false,
        };
        self.conditions.swap(index, target);
        true
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.conditions.iter().position(|c| c.id == id)
    }
}
