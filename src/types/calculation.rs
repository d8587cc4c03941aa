use super::FieldId;
use serde::{Deserialize, Serialize};

/// 公式中的变量,绑定到目录字段并带有默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: String,
    pub name: String,
    pub field_id: FieldId,
    pub default_value: String,
}

impl Variable {
    pub fn new(name: &str, field_id: &str, default_value: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            field_id: field_id.to_string(),
            default_value: default_value.to_string(),
        }
    }
}

/// `update_variable` 可修改的变量属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableField {
    Name,
    FieldId,
    DefaultValue,
}

/// 取整方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMethod {
    #[default]
    None,
    Up,
    Down,
    Nearest,
}

/// f64 能精确表示的最大小数位数
pub const MAX_DECIMAL_PLACES: u32 = 15;

impl RoundingMethod {
    /// 按指定小数位取整
    ///
    /// 小数位超过 [`MAX_DECIMAL_PLACES`] 时按上限处理; 放大后溢出的值原样返回。
    pub fn apply(self, value: f64, decimal_places: u32) -> f64 {
        let factor = 10f64.powi(decimal_places.min(MAX_DECIMAL_PLACES) as i32);
        let scaled = value * factor;
        if !scaled.is_finite() {
            return value;
        }
        match self {
            RoundingMethod::None => value,
            RoundingMethod::Up => scaled.ceil() / factor,
            RoundingMethod::Down => scaled.floor() / factor,
            RoundingMethod::Nearest => scaled.round() / factor,
        }
    }
}

/// 计算配置: 命名公式、变量绑定与取整策略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationConfig {
    pub name: String,
    pub description: String,
    /// 公式文本,`$名称` 引用变量
    pub formula: String,
    pub variables: Vec<Variable>,
    pub rounding_method: RoundingMethod,
    pub decimal_places: u32,
    pub is_active: bool,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            formula: String::new(),
            variables: Vec::new(),
            rounding_method: RoundingMethod::None,
            decimal_places: 2,
            is_active: true,
        }
    }
}

impl CalculationConfig {
    pub fn new(name: &str, formula: &str) -> Self {
        Self {
            name: name.to_string(),
            formula: formula.to_string(),
            ..Default::default()
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// 按 `decimal_places` 格式化结果用于展示
    pub fn format_result(&self, value: f64) -> String {
        format!("{:.*}", self.decimal_places as usize, value)
    }
}

/// 规则的计算配置,既可以是列表也可以是单个对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Calculations {
    Many(Vec<CalculationConfig>),
    Single(Box<CalculationConfig>),
}

impl Default for Calculations {
    fn default() -> Self {
        Calculations::Many(Vec::new())
    }
}

impl Calculations {
    pub fn is_empty(&self) -> bool {
        match self {
            Calculations::Many(list) => list.is_empty(),
            Calculations::Single(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Calculations::Many(list) => list.len(),
            Calculations::Single(_) => 1,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CalculationConfig> {
        match self {
            Calculations::Many(list) => list.iter(),
            Calculations::Single(calc) => std::slice::from_ref(calc.as_ref()).iter(),
        }
    }

    /// 追加计算配置,单个对象会转换为列表
    pub fn push(&mut self, calc: CalculationConfig) {
        match self {
            Calculations::Many(list) => list.push(calc),
            Calculations::Single(existing) => {
                let first = (**existing).clone();
                *self = Calculations::Many(vec![first, calc]);
            }
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CalculationConfig> {
        match self {
            Calculations::Many(list) => list.get_mut(index),
            Calculations::Single(calc) if index == 0 => Some(calc.as_mut()),
            Calculations::Single(_) => None,
        }
    }
}

impl From<CalculationConfig> for Calculations {
    fn from(calc: CalculationConfig) -> Self {
        Calculations::Single(Box::new(calc))
    }
}

impl From<Vec<CalculationConfig>> for Calculations {
    fn from(list: Vec<CalculationConfig>) -> Self {
        Calculations::Many(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rounding_methods_at_two_places() {
        let cases = [
            (RoundingMethod::None, 98.7648, 98.7648),
            (RoundingMethod::Up, 98.7648, 98.77),
            (RoundingMethod::Down, 98.7648, 98.76),
            (RoundingMethod::Nearest, 98.7648, 98.76),
            (RoundingMethod::None, -98.7648, -98.7648),
            (RoundingMethod::Up, -98.7648, -98.76),
            (RoundingMethod::Down, -98.7648, -98.77),
            (RoundingMethod::Nearest, -98.7648, -98.76),
            (RoundingMethod::Nearest, 0.125, 0.13),
        ];
        for (method, input, expected) in cases {
            assert_eq!(method.apply(input, 2), expected, "{:?}({})", method, input);
        }
    }

    #[test]
    fn rounding_stays_finite_for_extreme_inputs() {
        assert_eq!(RoundingMethod::Nearest.apply(1e300, 10), 1e300);
        assert_eq!(RoundingMethod::Up.apply(1.5, 400), 1.5);
        assert_eq!(RoundingMethod::Down.apply(1.25, u32::MAX), 1.25);
        assert_eq!(RoundingMethod::Up.apply(f64::MAX, 0), f64::MAX);
    }
}
