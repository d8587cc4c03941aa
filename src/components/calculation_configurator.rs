use crate::types::{CalculationConfig, Record, RuleError, Variable, VariableField};
use tracing::{debug, info};
use uuid::Uuid;

impl CalculationConfig {
    /// 追加变量,名称按 var1, var2 ... 依次生成并跳过已占用的名称
    pub fn add_variable(&mut self) -> String {
        let mut index = self.variables.len() + 1;
        while self.variable(&format!("var{}", index)).is_some() {
            index += 1;
        }

        let variable = Variable {
            id: Uuid::new_v4().to_string(),
            name: format!("var{}", index),
            field_id: String::new(),
            default_value: String::new(),
        };
        let id = variable.id.clone();
        self.variables.push(variable);
        id
    }

    pub fn remove_variable(&mut self, id: &str) -> bool {
        let before = self.variables.len();
        self.variables.retain(|v| v.id != id);
        let removed = self.variables.len() != before;
        if !removed {
            debug!("删除变量被忽略, 标识不存在: {}", id);
        }
        removed
    }

    pub fn try_remove_variable(&mut self, id: &str) -> Result<Variable, RuleError> {
        let index = self
            .variables
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| RuleError::VariableNotFound(id.to_string()))?;
        Ok(self.variables.remove(index))
    }

    /// 修改变量的单个属性,标识不存在时返回 false
    pub fn update_variable(&mut self, id: &str, field: VariableField, value: &str) -> bool {
        self.try_update_variable(id, field, value).is_ok()
    }

    pub fn try_update_variable(
        &mut self,
        id: &str,
        field: VariableField,
        value: &str,
    ) -> Result<(), RuleError> {
        let variable = self
            .variables
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| RuleError::VariableNotFound(id.to_string()))?;

        match field {
            VariableField::Name => variable.name = value.to_string(),
            VariableField::FieldId => variable.field_id = value.to_string(),
            VariableField::DefaultValue => variable.default_value = value.to_string(),
        }
        Ok(())
    }

    /// 使用变量默认值试算公式
    pub fn test_calculation(&self) -> Result<f64, RuleError> {
        self.test_calculation_with(&Record::new())
    }

    /// 使用给定的样例数据试算公式
    pub fn test_calculation_with(&self, record: &Record) -> Result<f64, RuleError> {
        let result = self.evaluate(record)?;
        info!(
            "计算 [{}] 试算结果: {}",
            self.name,
            self.format_result(result)
        );
        Ok(result)
    }
}
