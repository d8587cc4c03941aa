pub mod aop;
pub mod catalog;
pub mod components;
pub mod engine;
pub mod types;

pub use catalog::FieldCatalog;
pub use components::*;
pub use engine::{RuleEditor, RuleEngine};
pub use types::*;
