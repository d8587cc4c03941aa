use anyhow::anyhow;
use payroll_rules::{
    evaluator_fn, CalculationConfig, CalculationResults, Condition, ConditionOperator,
    RoundingMethod, Rule, RuleError, RuleTester, TestResult, Variable,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;

#[test_log::test(tokio::test)]
async fn rejected_evaluation_is_reported_as_failure() {
    let tester = RuleTester::new(Arc::new(evaluator_fn(|_data| async {
        Err::<CalculationResults, _>(anyhow!("boom"))
    })));

    let result = tester.test().await.unwrap();

    assert_eq!(
        result,
        TestResult {
            success: false,
            result: None,
            error: Some("boom".to_string()),
        }
    );
    assert!(!tester.is_loading());
    assert_eq!(tester.last_result().await, Some(result));

    // 失败后仍可继续使用
    assert!(tester.test().await.is_ok());
}

#[test_log::test(tokio::test)]
async fn evaluator_receives_form_inputs() {
    let tester = RuleTester::new(Arc::new(evaluator_fn(|data| async move {
        let salary = data
            .get("salary")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| anyhow!("salary missing"))?;
        Ok::<_, anyhow::Error>(CalculationResults::from([(
            "double".to_string(),
            salary * 2.0,
        )]))
    })));

    tester.set_input("salary", json!(1500)).await;
    let result = tester.test().await.unwrap();

    assert!(result.success);
    assert_eq!(result.result.unwrap()["double"], 3000.0);
    assert_eq!(
        serde_json::to_value(tester.last_result().await.unwrap()).unwrap(),
        json!({"success": true, "result": {"double": 3000.0}})
    );
}

#[test_log::test(tokio::test)]
async fn second_call_while_pending_is_refused() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let (started_signal, release_signal) = (started.clone(), release.clone());

    let tester = Arc::new(RuleTester::new(Arc::new(evaluator_fn(move |_data| {
        let started = started_signal.clone();
        let release = release_signal.clone();
        async move {
            started.notify_one();
            release.notified().await;
            Ok::<_, anyhow::Error>(CalculationResults::new())
        }
    }))));

    let pending = {
        let tester = tester.clone();
        tokio::spawn(async move { tester.test().await })
    };

    started.notified().await;
    assert!(tester.is_loading());
    assert!(matches!(tester.test().await, Err(RuleError::TestInProgress)));

    release.notify_one();
    let result = pending.await.unwrap().unwrap();
    assert!(result.success);
    assert!(!tester.is_loading());
}

#[test_log::test(tokio::test)]
async fn refused_test_with_keeps_pending_inputs() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let (started_signal, release_signal) = (started.clone(), release.clone());

    let tester = Arc::new(RuleTester::new(Arc::new(evaluator_fn(move |_data| {
        let started = started_signal.clone();
        let release = release_signal.clone();
        async move {
            started.notify_one();
            release.notified().await;
            Ok::<_, anyhow::Error>(CalculationResults::new())
        }
    }))));
    tester.set_input("salary", json!(1000)).await;

    let pending = {
        let tester = tester.clone();
        tokio::spawn(async move { tester.test().await })
    };
    started.notified().await;

    let other = json!({"salary": 9999}).as_object().cloned().unwrap();
    assert!(matches!(
        tester.test_with(other).await,
        Err(RuleError::TestInProgress)
    ));
    assert_eq!(tester.inputs().await.get("salary"), Some(&json!(1000)));

    release.notify_one();
    assert!(pending.await.unwrap().unwrap().success);
    assert!(!tester.is_loading());
}

fn overtime_rule() -> Rule {
    let mut rule = Rule::new("Hora Extra", "Cálculo de horas extras");
    rule.conditions
        .push(Condition::new("overtime_hours", ConditionOperator::GreaterThan, "0"));

    let mut calc = CalculationConfig::new("hora_extra", "$salario / 220 * 1.5 * $horas");
    calc.variables = vec![
        Variable::new("salario", "salary", "0"),
        Variable::new("horas", "overtime_hours", "0"),
    ];
    calc.rounding_method = RoundingMethod::Nearest;

    let mut inactive = CalculationConfig::new("inativo", "1");
    inactive.is_active = false;

    rule.calculations = vec![calc, inactive].into();
    rule
}

#[test_log::test(tokio::test)]
async fn rule_evaluator_computes_active_calculations() {
    let tester = RuleTester::for_rule(overtime_rule());
    let data = json!({"salary": 2200, "overtime_hours": 10});

    let result = tester
        .test_with(data.as_object().cloned().unwrap())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(
        result.result.unwrap(),
        CalculationResults::from([("hora_extra".to_string(), 150.0)])
    );
}

#[test_log::test(tokio::test)]
async fn rule_evaluator_fails_when_conditions_not_met() {
    let tester = RuleTester::for_rule(overtime_rule());
    tester.set_input("overtime_hours", json!(0)).await;

    let result = tester.test().await.unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("Hora Extra"));
}
