//! Schema and field models shared by the declarations and trace writers.
//!
//! [`ColumnInfo`] and [`TableSchema`] are the raw metadata handed over by a schema
//! provider. [`Field`] and [`Table`] are built from them once per run and never change
//! afterwards; both writers rely on a table's field order matching the order of the
//! values in each row.

use serde::{Deserialize, Serialize};

use super::classify::{classify, RepType};
use super::constants::NULL_INDICATOR_SUFFIX;
use super::encode::{Encoder, Value};

/// Column metadata as reported by the source schema.
///
/// # Fields
/// - `name`: Column name
/// - `raw_type`: Declared database type (e.g., `varchar(45)`)
/// - `nullable`: Whether the column accepts NULL
/// - `primary_key`: Whether the column is part of the primary key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub raw_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

impl ColumnInfo {
    pub fn new(name: &str, raw_type: &str, nullable: bool, primary_key: bool) -> Self {
        Self {
            name: name.to_string(),
            raw_type: raw_type.to_string(),
            nullable,
            primary_key,
        }
    }
}

/// A table and its columns in schema order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// A traced variable derived from one table column.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    table: Option<String>,
    name: String,
    full_name: String,
    escaped_name: String,
    quoted_name: String,
    raw_type: String,
    rep_type: RepType,
    encoder: Encoder,
    comparability: String,
    primary_key: bool,
    nullable: bool,
    null_indicator: Option<String>,
}

impl Field {
    pub fn builder(name: &str, raw_type: &str) -> FieldBuilder {
        FieldBuilder {
            table: None,
            name: name.to_string(),
            raw_type: raw_type.to_string(),
            rep_type: None,
            nullable: false,
            primary_key: false,
        }
    }

    /// Builds the field for `column` of `table`.
    pub fn from_column(table: &str, column: &ColumnInfo) -> Self {
        Field::builder(&column.name, &column.raw_type)
            .table(table)
            .nullable(column.nullable)
            .primary_key(column.primary_key)
            .build()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `table.name`, or just `name` for a field without a table.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Full name with spaces replaced by underscores, as used for variable names.
    pub fn escaped_name(&self) -> &str {
        &self.escaped_name
    }

    /// Full name with each part in backticks, for building queries.
    pub fn quoted_name(&self) -> &str {
        &self.quoted_name
    }

    pub fn raw_type(&self) -> &str {
        &self.raw_type
    }

    pub fn rep_type(&self) -> RepType {
        self.rep_type
    }

    pub fn encoder(&self) -> Encoder {
        self.encoder
    }

    pub fn comparability(&self) -> &str {
        &self.comparability
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Name of the synthetic null indicator, present only for nullable fields.
    pub fn null_indicator(&self) -> Option<&str> {
        self.null_indicator.as_deref()
    }

    pub fn encode(&self, value: &Value) -> String {
        self.encoder.encode(value)
    }
}

/// Builder for [`Field`].
#[derive(Clone, Debug)]
pub struct FieldBuilder {
    table: Option<String>,
    name: String,
    raw_type: String,
    rep_type: Option<RepType>,
    nullable: bool,
    primary_key: bool,
}

impl FieldBuilder {
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Overrides the classified representation type. The encoder and comparability
    /// still come from the raw type.
    pub fn rep_type(mut self, rep_type: RepType) -> Self {
        self.rep_type = Some(rep_type);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    pub fn build(self) -> Field {
        let class = classify(&self.raw_type);

        let mut rep_type = self.rep_type.unwrap_or(class.rep_type);
        if self.primary_key && rep_type == RepType::Int {
            rep_type = RepType::HashCode;
        }
        // Primary keys can never hold NULL, whatever the source metadata says
        let nullable = self.nullable && !self.primary_key;

        let (full_name, quoted_name) = match &self.table {
            Some(table) => (
                format!("{}.{}", table, self.name),
                format!("{}.{}", quote_ident(table), quote_ident(&self.name)),
            ),
            None => (self.name.clone(), quote_ident(&self.name)),
        };
        let escaped_name = full_name.replace(' ', "_");
        let null_indicator = nullable.then(|| format!("{escaped_name}{NULL_INDICATOR_SUFFIX}"));

        Field {
            table: self.table,
            name: self.name,
            full_name,
            escaped_name,
            quoted_name,
            raw_type: self.raw_type,
            rep_type,
            encoder: class.encoder,
            comparability: class.comparability.to_string(),
            primary_key: self.primary_key,
            nullable,
            null_indicator,
        }
    }
}

/// A table with its fields in column order.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    fields: Vec<Field>,
}

impl Table {
    pub fn new(name: &str, fields: Vec<Field>) -> Self {
        Self {
            name: name.to_string(),
            fields,
        }
    }

    pub fn from_schema(schema: &TableSchema) -> Self {
        let fields = schema
            .columns
            .iter()
            .map(|column| Field::from_column(&schema.name, column))
            .collect();
        Self::new(&schema.name, fields)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Program point name of this table.
    pub fn point_name(&self) -> String {
        format!("{}{}", self.name, super::constants::POINT_SUFFIX)
    }

    /// Number of fields carrying a null indicator.
    pub fn nullable_count(&self) -> usize {
        self.fields.iter().filter(|f| f.is_nullable()).count()
    }

    /// Query selecting every field in declaration order.
    pub fn select_query(&self) -> String {
        let columns: Vec<&str> = self.fields.iter().map(Field::quoted_name).collect();
        format!("SELECT {} FROM {}", columns.join(", "), quote_ident(&self.name))
    }
}

/// Wraps an identifier in backticks, doubling any backtick inside it.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names() {
        let field = Field::builder("first name", "varchar(20)")
            .table("people")
            .nullable(true)
            .build();
        assert_eq!(field.full_name(), "people.first name");
        assert_eq!(field.escaped_name(), "people.first_name");
        assert_eq!(field.quoted_name(), "`people`.`first name`");
        assert_eq!(
            field.null_indicator(),
            Some("people.first_name__IS_NULL__")
        );
    }

    #[test]
    fn test_field_without_table() {
        let field = Field::builder("count", "int").build();
        assert_eq!(field.table(), None);
        assert_eq!(field.full_name(), "count");
        assert_eq!(field.quoted_name(), "`count`");
        assert_eq!(field.null_indicator(), None);
    }

    #[test]
    fn test_primary_key_forces_non_null_and_hashcode() {
        let field = Field::builder("id", "int(11)")
            .table("t")
            .nullable(true)
            .primary_key(true)
            .build();
        assert!(!field.is_nullable());
        assert_eq!(field.null_indicator(), None);
        assert_eq!(field.rep_type(), RepType::HashCode);
        assert_eq!(field.comparability(), "2");
    }

    #[test]
    fn test_non_integer_primary_key_keeps_rep_type() {
        let field = Field::builder("code", "char(3)").primary_key(true).build();
        assert_eq!(field.rep_type(), RepType::String);
        assert!(!field.is_nullable());
    }

    #[test]
    fn test_rep_type_override() {
        let field = Field::builder("flags", "varchar(10)")
            .rep_type(RepType::Int)
            .build();
        assert_eq!(field.rep_type(), RepType::Int);
        assert_eq!(field.encoder(), Encoder::Quoted);

        // The primary key rule applies to the overridden type too
        let field = Field::builder("id", "varchar(10)")
            .rep_type(RepType::Int)
            .primary_key(true)
            .build();
        assert_eq!(field.rep_type(), RepType::HashCode);
    }

    #[test]
    fn test_backticks_in_names_are_doubled() {
        let schema = TableSchema {
            name: "we`ird".to_string(),
            columns: vec![ColumnInfo::new("co`l", "int", false, false)],
        };
        let table = Table::from_schema(&schema);
        assert_eq!(table.fields()[0].quoted_name(), "`we``ird`.`co``l`");
        assert_eq!(
            table.select_query(),
            "SELECT `we``ird`.`co``l` FROM `we``ird`"
        );
        assert_eq!(table.fields()[0].full_name(), "we`ird.co`l");
    }

    #[test]
    fn test_table_from_schema_preserves_order() {
        let schema = TableSchema {
            name: "t".to_string(),
            columns: vec![
                ColumnInfo::new("id", "int", false, true),
                ColumnInfo::new("name", "varchar(10)", true, false),
                ColumnInfo::new("born", "date", true, false),
            ],
        };
        let table = Table::from_schema(&schema);
        let names: Vec<&str> = table.fields().iter().map(Field::name).collect();
        assert_eq!(names, ["id", "name", "born"]);
        assert_eq!(table.nullable_count(), 2);
        assert_eq!(table.point_name(), "t:::POINT");
        assert_eq!(
            table.select_query(),
            "SELECT `t`.`id`, `t`.`name`, `t`.`born` FROM `t`"
        );
    }
}
