//! 字段目录: 条件与计算变量可引用的字段注册表

use crate::types::{Category, Field, FieldType, RuleError};
use lazy_static::lazy_static;
use std::path::Path;
use tracing::debug;

lazy_static! {
    static ref PAYROLL_FIELDS: Vec<Field> = vec![
        Field::new("employee_name", "Nome do Funcionário", "Funcionário", FieldType::Text)
            .with_description("Nome completo do colaborador"),
        Field::new("department", "Departamento", "Funcionário", FieldType::Text)
            .with_description("Departamento de lotação"),
        Field::new("position", "Cargo", "Funcionário", FieldType::Text)
            .with_description("Cargo atual do colaborador"),
        Field::new("admission_date", "Data de Admissão", "Funcionário", FieldType::Date)
            .with_description("Data de início do contrato"),
        Field::new("has_dependents", "Possui Dependentes", "Funcionário", FieldType::Boolean)
            .with_description("Indica dependentes para dedução de IRRF"),
        Field::new("salary", "Salário Base", "Remuneração", FieldType::Currency)
            .with_description("Salário base mensal"),
        Field::new("bonus", "Bônus", "Remuneração", FieldType::Currency)
            .with_description("Bonificação variável do período"),
        Field::new("overtime_hours", "Horas Extras", "Remuneração", FieldType::Number)
            .with_description("Quantidade de horas extras no período"),
        Field::new("worked_days", "Dias Trabalhados", "Remuneração", FieldType::Number)
            .with_description("Dias trabalhados no mês"),
        Field::new("inss", "INSS", "Impostos", FieldType::Currency)
            .with_description("Contribuição previdenciária"),
        Field::new("irrf", "IRRF", "Impostos", FieldType::Currency)
            .with_description("Imposto de renda retido na fonte"),
        Field::new("fgts", "FGTS", "Impostos", FieldType::Currency)
            .with_description("Fundo de garantia por tempo de serviço"),
        Field::new("meal_allowance", "Vale Refeição", "Benefícios", FieldType::Currency)
            .with_description("Valor diário de vale refeição"),
        Field::new("transport_allowance", "Vale Transporte", "Benefícios", FieldType::Currency)
            .with_description("Valor mensal de vale transporte"),
    ];
}

/// 字段目录,按注册顺序保存字段
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: Vec<Field>,
}

impl FieldCatalog {
    pub fn new(fields: Vec<Field>) -> Result<Self, RuleError> {
        let mut catalog = Self::default();
        for field in fields {
            catalog.register_custom_field(field)?;
        }
        Ok(catalog)
    }

    /// 内置的薪资字段目录
    pub fn payroll() -> Self {
        Self {
            fields: PAYROLL_FIELDS.clone(),
        }
    }

    /// 从 JSON 字段数组创建目录
    pub fn from_json(content: &str) -> Result<Self, RuleError> {
        let fields: Vec<Field> = serde_json::from_str(content)?;
        Self::new(fields)
    }

    /// 从 JSON 文件加载目录
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let catalog = Self::from_json(&content)?;
        debug!(
            "字段目录加载完成: {} 个字段, 来源 {}",
            catalog.fields.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    /// 按注册顺序列出所有分类及其字段
    pub fn list_categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();
        for field in &self.fields {
            match categories.iter_mut().find(|c| c.name == field.category) {
                Some(category) => category.fields.push(field.clone()),
                None => categories.push(Category {
                    name: field.category.clone(),
                    fields: vec![field.clone()],
                }),
            }
        }
        categories
    }

    /// 按名称或说明搜索字段,忽略大小写; 空查询返回全部字段
    pub fn search(&self, query: &str) -> Vec<Field> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.fields.clone();
        }
        self.fields
            .iter()
            .filter(|f| {
                f.name.to_lowercase().contains(&query)
                    || f.description.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 注册自定义字段,已有字段不会被覆盖
    pub fn register_custom_field(&mut self, field: Field) -> Result<(), RuleError> {
        if field.id.trim().is_empty() {
            return Err(RuleError::InvalidField("字段标识不能为空".to_string()));
        }
        if self.contains(&field.id) {
            return Err(RuleError::DuplicateField(field.id));
        }
        self.fields.push(field);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn categories_keep_registration_order() {
        let catalog = FieldCatalog::payroll();
        let names: Vec<String> = catalog
            .list_categories()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            vec!["Funcionário", "Remuneração", "Impostos", "Benefícios"]
        );
    }

    #[test]
    fn search_matches_name_and_description_case_insensitively() {
        let catalog = FieldCatalog::payroll();

        let by_name: Vec<String> = catalog.search("salário").into_iter().map(|f| f.id).collect();
        assert_eq!(by_name, vec!["salary"]);

        let by_description: Vec<String> = catalog
            .search("RETIDO NA FONTE")
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(by_description, vec!["irrf"]);
    }

    #[test]
    fn empty_query_returns_whole_catalog() {
        let catalog = FieldCatalog::payroll();
        assert_eq!(catalog.search("").len(), catalog.len());
        assert_eq!(catalog.search("   ").len(), catalog.len());
    }

    #[test]
    fn custom_field_rejects_duplicates() {
        let mut catalog = FieldCatalog::payroll();
        let before = catalog.get("salary").cloned();

        let err = catalog
            .register_custom_field(Field::new("salary", "Outro", "X", FieldType::Text))
            .unwrap_err();
        assert!(matches!(err, RuleError::DuplicateField(id) if id == "salary"));
        assert_eq!(catalog.get("salary").cloned(), before);

        catalog
            .register_custom_field(Field::new("night_shift", "Adicional Noturno", "Remuneração", FieldType::Currency))
            .unwrap();
        assert!(catalog.contains("night_shift"));
    }

    #[test]
    fn catalog_from_json() {
        let catalog = FieldCatalog::from_json(
            r#"[
                {"id": "a", "name": "A", "category": "C", "type": "number"},
                {"id": "b", "name": "B", "category": "C", "type": "date", "description": "b field"}
            ]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("b").unwrap().field_type, FieldType::Date);

        let dup = FieldCatalog::from_json(
            r#"[
                {"id": "a", "name": "A", "category": "C", "type": "number"},
                {"id": "a", "name": "A2", "category": "C", "type": "text"}
            ]"#,
        );
        assert!(matches!(dup, Err(RuleError::DuplicateField(_))));
    }
}
