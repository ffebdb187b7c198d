//! Conversion between BSON values and SQLite storage values.
//!
//! Dates are stored as RFC 3339 text with millisecond precision, booleans as
//! `0`/`1`. Reading a value back uses the declared column type to restore the
//! BSON shape.

use bson::{Binary, Bson, DateTime, spec::BinarySubtype};
use chrono::SecondsFormat;
use rusqlite::types::Value as SqlValue;

use modelayer_core::{
    error::{ModelError, ModelResult},
    types::RelationalType,
};

pub(crate) fn format_date(value: &DateTime) -> String {
    value
        .to_chrono()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn to_sql(value: &Bson) -> ModelResult<SqlValue> {
    Ok(match value {
        Bson::Null => SqlValue::Null,
        Bson::Boolean(value) => SqlValue::Integer(i64::from(*value)),
        Bson::Int32(value) => SqlValue::Integer(i64::from(*value)),
        Bson::Int64(value) => SqlValue::Integer(*value),
        Bson::Double(value) => SqlValue::Real(*value),
        Bson::String(value) => SqlValue::Text(value.clone()),
        Bson::DateTime(value) => SqlValue::Text(format_date(value)),
        Bson::Binary(binary) => SqlValue::Blob(binary.bytes.clone()),
        other => {
            return Err(ModelError::InvalidRecord(format!(
                "{:?} values cannot be stored in a column",
                other.element_type()
            )));
        }
    })
}

pub(crate) fn from_sql(value: SqlValue, ty: &RelationalType) -> Bson {
    match (value, ty) {
        (SqlValue::Null, _) => Bson::Null,
        (SqlValue::Integer(value), RelationalType::Boolean) => Bson::Boolean(value != 0),
        (SqlValue::Integer(value), RelationalType::Real) => Bson::Double(value as f64),
        (SqlValue::Integer(value), _) => Bson::Int64(value),
        (SqlValue::Real(value), _) => Bson::Double(value),
        (SqlValue::Text(text), RelationalType::Date) => {
            match chrono::DateTime::parse_from_rfc3339(&text) {
                Ok(parsed) => Bson::DateTime(DateTime::from_chrono(parsed.to_utc())),
                Err(_) => Bson::String(text),
            }
        }
        (SqlValue::Text(text), _) => Bson::String(text),
        (SqlValue::Blob(bytes), _) => Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_are_rfc3339_text() {
        let date = DateTime::from_millis(1_700_000_000_123);
        let stored = to_sql(&Bson::DateTime(date)).unwrap();

        assert_eq!(stored, SqlValue::Text("2023-11-14T22:13:20.123Z".into()));
        assert_eq!(from_sql(stored, &RelationalType::Date), Bson::DateTime(date));
    }

    #[test]
    fn column_type_restores_booleans_and_reals() {
        assert_eq!(from_sql(SqlValue::Integer(1), &RelationalType::Boolean), Bson::Boolean(true));
        assert_eq!(from_sql(SqlValue::Integer(2), &RelationalType::Real), Bson::Double(2.0));
        assert_eq!(from_sql(SqlValue::Integer(2), &RelationalType::Integer), Bson::Int64(2));
    }

    #[test]
    fn documents_are_rejected() {
        assert!(to_sql(&Bson::Document(bson::doc! {})).is_err());
    }
}
