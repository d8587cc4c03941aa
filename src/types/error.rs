use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("条件不存在: {0}")]
    ConditionNotFound(String),

    #[error("变量不存在: {0}")]
    VariableNotFound(String),

    #[error("字段已存在: {0}")]
    DuplicateField(String),

    #[error("字段定义无效: {0}")]
    InvalidField(String),

    #[error("公式引用了未定义的变量: ${0}")]
    UnknownVariable(String),

    #[error("公式执行失败: {0}")]
    FormulaError(String),

    #[error("公式结果不是有效数字: {0}")]
    NonNumericResult(String),

    #[error("规则测试正在进行中")]
    TestInProgress,

    #[error("规则不存在: {0}")]
    RuleNotFound(String),

    #[error("持久化失败: {0}")]
    PersistenceError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
