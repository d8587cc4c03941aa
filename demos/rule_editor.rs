use payroll_rules::engine::{SaveOutcome, MemoryRuleStore};
use payroll_rules::{
    CalculationConfig, ConditionOperator, ConditionPatch, Direction, FieldCatalog,
    LogicalOperator, RoundingMethod, RuleEditor, RuleEngine, RuleTester, VariableField,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let catalog = FieldCatalog::payroll();
    for category in catalog.list_categories() {
        info!("分类 {}: {} 个字段", category.name, category.fields.len());
    }
    info!("搜索 'imposto': {:?}", catalog.search("imposto"));

    // 编辑规则
    let mut editor = RuleEditor::new();
    editor.set_name("Hora Extra Financeiro");
    editor.set_description("Horas extras do departamento financeiro");
    editor.set_category("Remuneração");

    let conditions = editor.conditions_mut();
    let department = conditions.add_condition();
    conditions.update_condition(
        &department,
        ConditionPatch {
            field: Some("department".to_string()),
            value: Some("Financeiro".to_string()),
            ..Default::default()
        },
    );
    let hours = conditions.add_condition();
    conditions.update_condition(
        &hours,
        ConditionPatch {
            field: Some("overtime_hours".to_string()),
            operator: Some(ConditionOperator::GreaterThan),
            value: Some("0".to_string()),
            logical_operator: Some(LogicalOperator::And),
        },
    );
    conditions.move_condition(1, Direction::Up);

    let mut calc = CalculationConfig::new("hora_extra", "$salario / 220 * 1.5 * $horas");
    calc.rounding_method = RoundingMethod::Nearest;
    for (name, field) in [("salario", "salary"), ("horas", "overtime_hours")] {
        let id = calc.add_variable();
        calc.update_variable(&id, VariableField::Name, name);
        calc.update_variable(&id, VariableField::FieldId, field);
        calc.update_variable(&id, VariableField::DefaultValue, "0");
    }
    info!("试算结果: {}", calc.test_calculation()?);
    editor.add_calculation(calc);

    // 保存规则
    let store = MemoryRuleStore::new();
    match editor.save(&store).await? {
        SaveOutcome::Saved => {
            for entry in store.entries().await {
                info!(
                    "规则 {} 版本 {} 保存于 {:?}",
                    entry.rule.name,
                    entry.version.version,
                    entry.updated_at()
                );
            }
        }
        SaveOutcome::Rejected(errors) => info!("规则校验失败: {:?}", errors),
    }

    // 测试规则
    let tester = RuleTester::for_rule(editor.rule().clone());
    tester.set_input("department", json!("Financeiro")).await;
    tester.set_input("salary", json!(4400)).await;
    tester.set_input("overtime_hours", json!(12)).await;
    info!("测试结果: {:?}", tester.test().await?);

    // 执行引擎
    let engine = RuleEngine::new();
    engine.add_rule(editor.into_rule()).await?;
    let outcomes = engine.evaluate(&tester.inputs().await).await?;
    info!("引擎执行结果: {:?}", outcomes);

    Ok(())
}
