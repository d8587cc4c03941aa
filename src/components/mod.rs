mod calculation_configurator;
mod condition_builder;
mod rule_tester;

pub use rule_tester::{
    evaluator_fn, CalculationResults, FnEvaluator, RuleEvaluator, RuleTester, TestData,
    TestEvaluator, TestResult,
};
