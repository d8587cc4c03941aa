use crate::types::{
    CalculationConfig, Condition, ConditionOperator, ConditionSet, LogicalOperator, Record,
    RuleError,
};
use rquickjs::{Context, Runtime};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// 单个公式允许的最长执行时间
const FORMULA_TIMEOUT: Duration = Duration::from_millis(500);

/// 单个公式运行时的内存上限
const FORMULA_MEMORY_LIMIT: usize = 16 * 1024 * 1024;

/// 将记录中的取值转换为文本; 缺失或 null 视为无值
fn record_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl Condition {
    /// 对单条记录求值,字段缺失时不满足
    pub fn matches(&self, record: &Record) -> bool {
        let Some(actual) = record_text(record, &self.field) else {
            return false;
        };
        let expected = self.value.as_str();
        let numbers = parse_number(&actual).zip(parse_number(expected));

        match self.operator {
            ConditionOperator::Equals => match numbers {
                Some((a, b)) => a == b,
                None => actual == expected,
            },
            ConditionOperator::NotEquals => match numbers {
                Some((a, b)) => a != b,
                None => actual != expected,
            },
            ConditionOperator::GreaterThan => match numbers {
                Some((a, b)) => a > b,
                None => actual.as_str() > expected,
            },
            ConditionOperator::LessThan => match numbers {
                Some((a, b)) => a < b,
                None => actual.as_str() < expected,
            },
            ConditionOperator::Contains => actual.to_lowercase().contains(&expected.to_lowercase()),
            ConditionOperator::StartsWith => {
                actual.to_lowercase().starts_with(&expected.to_lowercase())
            }
            ConditionOperator::EndsWith => actual.to_lowercase().ends_with(&expected.to_lowercase()),
        }
    }
}

impl ConditionSet {
    /// 从左到右折叠求值,第 i 个条件的连接符决定它与第 i+1 个条件的组合方式
    ///
    /// 空条件集视为满足。
    pub fn evaluate(&self, record: &Record) -> bool {
        let mut iter = self.conditions.iter();
        let Some(first) = iter.next() else {
            return true;
        };

        let mut result = first.matches(record);
        let mut connector = first.logical_operator.unwrap_or(LogicalOperator::And);
        for condition in iter {
            result = connector.apply(result, condition.matches(record));
            connector = condition.logical_operator.unwrap_or(LogicalOperator::And);
        }
        result
    }
}

impl CalculationConfig {
    /// 解析变量取值: 优先使用记录中的字段值,否则使用默认值
    pub fn resolve_variables(&self, record: &Record) -> HashMap<String, String> {
        self.variables
            .iter()
            .map(|v| {
                let value =
                    record_text(record, &v.field_id).unwrap_or_else(|| v.default_value.clone());
                (v.name.clone(), value)
            })
            .collect()
    }

    /// 求值公式并按取整策略处理结果
    pub fn evaluate(&self, record: &Record) -> Result<f64, RuleError> {
        let values = self.resolve_variables(record);
        let script = substitute_variables(&self.formula, &values)?;
        debug!("计算 [{}] 公式展开: {}", self.name, script);

        let raw = run_formula(&script)?;
        let rounded = self.rounding_method.apply(raw, self.decimal_places);
        if !rounded.is_finite() {
            return Err(RuleError::NonNumericResult(script));
        }
        Ok(rounded)
    }
}

/// 将公式中的 `$名称` 替换为变量取值的字面量
pub fn substitute_variables(
    formula: &str,
    values: &HashMap<String, String>,
) -> Result<String, RuleError> {
    let mut output = String::with_capacity(formula.len());
    let mut chars = formula.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if ch != '$' {
            output.push(ch);
            continue;
        }

        let mut name = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }

        if name.is_empty() {
            output.push('$');
            continue;
        }

        let value = values
            .get(&name)
            .ok_or_else(|| RuleError::UnknownVariable(name.clone()))?;
        output.push_str(&literal(value)?);
    }

    Ok(output)
}

fn literal(value: &str) -> Result<String, RuleError> {
    if let Some(number) = parse_number(value) {
        return Ok(format!("({})", number));
    }
    match value.trim() {
        "true" | "false" => Ok(value.trim().to_string()),
        _ => Ok(serde_json::to_string(value)?),
    }
}

/// 在独立的 QuickJS 运行时中执行展开后的公式
fn run_formula(script: &str) -> Result<f64, RuleError> {
    if script.trim().is_empty() {
        return Err(RuleError::FormulaError("公式为空".to_string()));
    }

    let runtime = Runtime::new().map_err(|e| RuleError::FormulaError(e.to_string()))?;
    runtime.set_memory_limit(FORMULA_MEMORY_LIMIT);
    let deadline = Instant::now() + FORMULA_TIMEOUT;
    runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() > deadline)));
    let context = Context::full(&runtime).map_err(|e| RuleError::FormulaError(e.to_string()))?;

    let js_code = format!("JSON.stringify(Number(({})));", script);
    let output: String = context
        .with(|ctx| ctx.eval::<String, _>(js_code))
        .map_err(|e| RuleError::FormulaError(format!("{}: {}", script, e)))?;

    match serde_json::from_str::<Value>(&output)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| RuleError::NonNumericResult(script.to_string())),
        _ => Err(RuleError::NonNumericResult(script.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoundingMethod, Variable};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn numeric_and_text_comparisons() {
        let rec = record(json!({"salary": 1500, "department": "Financeiro", "admission_date": "2021-03-01"}));

        assert!(Condition::new("salary", ConditionOperator::GreaterThan, "1000").matches(&rec));
        assert!(!Condition::new("salary", ConditionOperator::LessThan, "1000").matches(&rec));
        assert!(Condition::new("salary", ConditionOperator::Equals, "1500.00").matches(&rec));
        assert!(Condition::new("department", ConditionOperator::Equals, "Financeiro").matches(&rec));
        assert!(Condition::new("department", ConditionOperator::NotEquals, "RH").matches(&rec));
        assert!(Condition::new("department", ConditionOperator::Contains, "nance").matches(&rec));
        assert!(Condition::new("department", ConditionOperator::StartsWith, "fin").matches(&rec));
        assert!(Condition::new("department", ConditionOperator::EndsWith, "EIRO").matches(&rec));
        assert!(Condition::new("admission_date", ConditionOperator::LessThan, "2022-01-01").matches(&rec));
    }

    #[test]
    fn missing_field_never_matches() {
        let rec = record(json!({"bonus": null}));
        assert!(!Condition::new("salary", ConditionOperator::NotEquals, "1").matches(&rec));
        assert!(!Condition::new("bonus", ConditionOperator::Equals, "").matches(&rec));
    }

    #[test]
    fn fold_is_left_to_right_without_precedence() {
        // (false OR true) AND false = false, precedence grouping would give true
        let set = ConditionSet::from(vec![
            Condition::new("a", ConditionOperator::Equals, "0").joined_by(LogicalOperator::Or),
            Condition::new("a", ConditionOperator::Equals, "1").joined_by(LogicalOperator::And),
            Condition::new("b", ConditionOperator::Equals, "1").joined_by(LogicalOperator::Or),
        ]);
        let rec = record(json!({"a": 1, "b": 0}));
        assert!(!set.evaluate(&rec));

        let rec = record(json!({"a": 1, "b": 1}));
        assert!(set.evaluate(&rec));
    }

    #[test]
    fn empty_set_is_satisfied() {
        assert!(ConditionSet::new().evaluate(&Record::new()));
    }

    #[test]
    fn substitution_reports_unknown_variables() {
        let values = HashMap::from([("base".to_string(), "100".to_string())]);
        assert_eq!(
            substitute_variables("$base * 2 + '$'", &values).unwrap(),
            "(100) * 2 + '$'"
        );
        assert!(matches!(
            substitute_variables("$base + $missing", &values),
            Err(RuleError::UnknownVariable(name)) if name == "missing"
        ));
    }

    #[test]
    fn formula_uses_record_then_defaults_and_rounds() {
        let mut calc = CalculationConfig::new("Hora Extra", "$salario / 220 * 1.5 * $horas");
        calc.variables = vec![
            Variable::new("salario", "salary", "2200"),
            Variable::new("horas", "overtime_hours", "0"),
        ];
        calc.rounding_method = RoundingMethod::Nearest;
        calc.decimal_places = 2;

        assert_eq!(calc.evaluate(&Record::new()).unwrap(), 0.0);

        let rec = record(json!({"salary": 3000, "overtime_hours": 7}));
        // 3000 / 220 * 1.5 * 7 = 143.1818...
        assert_eq!(calc.evaluate(&rec).unwrap(), 143.18);
    }

    #[test]
    fn non_numeric_and_broken_formulas_fail() {
        let calc = CalculationConfig::new("texto", "'abc'");
        assert!(matches!(
            calc.evaluate(&Record::new()),
            Err(RuleError::NonNumericResult(_))
        ));

        let calc = CalculationConfig::new("quebrada", "1 +");
        assert!(matches!(
            calc.evaluate(&Record::new()),
            Err(RuleError::FormulaError(_))
        ));

        let calc = CalculationConfig::new("vazia", "");
        assert!(matches!(
            calc.evaluate(&Record::new()),
            Err(RuleError::FormulaError(_))
        ));
    }

    #[test]
    fn rounding_never_turns_a_finite_result_into_inf_or_nan() {
        let mut big = CalculationConfig::new("big", "1e300");
        big.rounding_method = RoundingMethod::Nearest;
        big.decimal_places = 10;
        assert_eq!(big.evaluate(&Record::new()).unwrap(), 1e300);

        let mut precise = CalculationConfig::new("x", "1.5");
        precise.rounding_method = RoundingMethod::Up;
        precise.decimal_places = 400;
        assert_eq!(precise.evaluate(&Record::new()).unwrap(), 1.5);
    }

    #[test]
    fn infinite_formula_result_is_rejected() {
        let calc = CalculationConfig::new("overflow", "1e308 * 10");
        assert!(matches!(
            calc.evaluate(&Record::new()),
            Err(RuleError::NonNumericResult(_))
        ));
    }

    #[test]
    fn oversized_allocation_is_stopped_by_memory_limit() {
        let calc = CalculationConfig::new("memoria", "'x'.repeat(2 ** 26).length");
        assert!(matches!(
            calc.evaluate(&Record::new()),
            Err(RuleError::FormulaError(_))
        ));
    }
}
