//! Table definitions generated from relational schemas.

use bson::Bson;

use modelayer_core::{
    error::{ModelError, ModelResult},
    schema::{DefaultValue, RelationalColumn, RelationalSchema, SchemaDescriptor},
    types::RelationalType,
};

use crate::value::format_date;

/// Name of the integer primary key column added to every table.
pub const PRIMARY_KEY: &str = "id";

const CURRENT_TIMESTAMP: &str = "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))";

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Renders a value as an SQL literal, for `DEFAULT` and `CHECK` clauses.
pub(crate) fn literal(value: &Bson) -> ModelResult<String> {
    Ok(match value {
        Bson::Null => "NULL".to_string(),
        Bson::Boolean(value) => i32::from(*value).to_string(),
        Bson::Int32(value) => value.to_string(),
        Bson::Int64(value) => value.to_string(),
        Bson::Double(value) => value.to_string(),
        Bson::String(value) => quote_text(value),
        Bson::DateTime(value) => quote_text(&format_date(value)),
        other => {
            return Err(ModelError::InvalidRecord(format!(
                "{:?} values cannot be used as a column literal",
                other.element_type()
            )));
        }
    })
}

fn sql_type(ty: &RelationalType) -> String {
    match ty {
        RelationalType::String(Some(length)) => format!("VARCHAR({length})"),
        RelationalType::String(None) | RelationalType::Text | RelationalType::Enum(_) => "TEXT".to_string(),
        RelationalType::Real => "REAL".to_string(),
        RelationalType::Integer => "INTEGER".to_string(),
        RelationalType::Date => "DATETIME".to_string(),
        RelationalType::Boolean => "BOOLEAN".to_string(),
        RelationalType::Blob => "BLOB".to_string(),
    }
}

fn column_definition(name: &str, column: &RelationalColumn) -> ModelResult<String> {
    let ident = quote_ident(name);
    let mut definition = format!("{ident} {}", sql_type(&column.ty));

    if !column.allow_null {
        definition.push_str(" NOT NULL");
    }
    if column.unique == Some(true) {
        definition.push_str(" UNIQUE");
    }

    match &column.default_value {
        Some(DefaultValue::CurrentTimestamp) => {
            definition.push_str(" DEFAULT ");
            definition.push_str(CURRENT_TIMESTAMP);
        }
        Some(DefaultValue::Value(value)) => {
            definition.push_str(" DEFAULT ");
            definition.push_str(&literal(value)?);
        }
        None => {}
    }

    let mut checks = Vec::new();
    match &column.ty {
        RelationalType::String(Some(length)) => checks.push(format!("length({ident}) <= {length}")),
        RelationalType::Enum(values) => checks.push(format!(
            "{ident} IN ({})",
            values.iter().map(|value| quote_text(value)).collect::<Vec<_>>().join(", ")
        )),
        _ => {}
    }
    if let Some(validate) = &column.validate {
        if let Some(min) = &validate.min {
            checks.push(format!("{ident} >= {}", literal(min)?));
        }
        if let Some(max) = &validate.max {
            checks.push(format!("{ident} <= {}", literal(max)?));
        }
    }
    for check in checks {
        definition.push_str(&format!(" CHECK ({check})"));
    }

    Ok(definition)
}

/// The `CREATE TABLE IF NOT EXISTS` statement for `schema`.
///
/// # Errors
///
/// Returns [`ModelError::Validation`] when a column is named like the primary
/// key, and [`ModelError::InvalidRecord`] when a default or bound cannot be
/// written as a literal.
pub fn create_table(table: &str, schema: &RelationalSchema) -> ModelResult<String> {
    let mut columns = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote_ident(PRIMARY_KEY))];

    for (name, column) in schema.fields() {
        if name == PRIMARY_KEY {
            return Err(ModelError::Validation {
                field: name.clone(),
                message: "is reserved for the primary key".to_string(),
            });
        }
        columns.push(column_definition(name, column)?);
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quote_ident(table),
        columns.join(",\n  ")
    ))
}

#[cfg(test)]
mod tests {
    use modelayer_core::{field::FieldDeclaration, model::ModelDeclaration};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn columns_carry_their_constraints() {
        let model = ModelDeclaration::new("post")
            .field("title", FieldDeclaration::new("string 64").unique(true))
            .field("kind", FieldDeclaration::new("enum news it's").default_value("news"))
            .field("score", FieldDeclaration::new("number").optional().min(0).max(5.5))
            .field("at", FieldDeclaration::new("now"));
        let schema = RelationalSchema::convert(&model).unwrap();

        assert_eq!(
            create_table("posts", &schema).unwrap(),
            [
                "CREATE TABLE IF NOT EXISTS \"posts\" (",
                "  \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,",
                "  \"title\" VARCHAR(64) NOT NULL UNIQUE CHECK (length(\"title\") <= 64),",
                "  \"kind\" TEXT NOT NULL DEFAULT 'news' CHECK (\"kind\" IN ('news', 'it''s')),",
                "  \"score\" REAL CHECK (\"score\" >= 0) CHECK (\"score\" <= 5.5),",
                "  \"at\" DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                ")",
            ]
            .join("\n")
        );
    }

    #[test]
    fn id_is_reserved() {
        let model = ModelDeclaration::new("m").field("id", FieldDeclaration::new("integer"));
        let schema = RelationalSchema::convert(&model).unwrap();

        assert!(matches!(
            create_table("m", &schema),
            Err(ModelError::Validation { field, .. }) if field == "id"
        ));
    }
}
