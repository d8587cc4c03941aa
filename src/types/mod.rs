mod calculation;
mod condition;
mod error;
mod field;
mod rule;

pub use calculation::*;
pub use condition::*;
pub use error::*;
pub use field::*;
pub use rule::*;

use serde_json::{Map, Value};

/// 求值上下文: 字段标识到取值的映射
pub type Record = Map<String, Value>;
