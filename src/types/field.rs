use serde::{Deserialize, Serialize};

/// 字段标识,条件与变量通过它引用目录中的字段
pub type FieldId = String;

/// 字段数据类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Boolean,
    Currency,
}

/// 目录中注册的字段定义,注册后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// 字段唯一标识
    pub id: FieldId,
    /// 显示名称
    pub name: String,
    /// 所属分类
    pub category: String,
    /// 字段类型
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// 字段说明,参与搜索
    #[serde(default)]
    pub description: String,
}

impl Field {
    pub fn new(id: &str, name: &str, category: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            field_type,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// 字段分类,按注册顺序保存其字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub fields: Vec<Field>,
}
