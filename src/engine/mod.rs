mod editor;
mod evaluator;
pub mod rule;
mod store;
mod version;

pub use editor::*;
pub use evaluator::substitute_variables;
pub use rule::{RuleEngine, RuleOutcome};
pub use store::*;
pub use version::*;
