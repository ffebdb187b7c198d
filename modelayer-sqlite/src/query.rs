//! SQL for record filters and find options.

use bson::Bson;
use rusqlite::types::Value as SqlValue;

use modelayer_core::{
    error::ModelResult,
    query::{Filter, Query, SortDirection},
};

use crate::{
    ddl::{PRIMARY_KEY, quote_ident},
    value::to_sql,
};

/// Returns `(" WHERE ...", params)` for a filter, or an empty clause for the
/// match-everything filter. A condition on null becomes `IS NULL`.
pub fn where_clause(filter: &Filter) -> ModelResult<(String, Vec<SqlValue>)> {
    if filter.is_all() {
        return Ok((String::new(), Vec::new()));
    }

    let mut conditions = Vec::new();
    let mut params = Vec::new();

    for (field, value) in filter.iter() {
        let ident = quote_ident(field);

        match value {
            Bson::Null => conditions.push(format!("{ident} IS NULL")),
            value => {
                conditions.push(format!("{ident} = ?"));
                params.push(to_sql(value)?);
            }
        }
    }

    Ok((format!(" WHERE {}", conditions.join(" AND ")), params))
}

/// The `ORDER BY` / `LIMIT` / `OFFSET` tail of a select. Rows without an
/// explicit sort come back in primary-key order.
pub(crate) fn select_tail(query: &Query) -> String {
    let primary_key = quote_ident(PRIMARY_KEY);
    let mut tail = match &query.sort {
        Some(sort) => format!(
            " ORDER BY {} {}, {primary_key}",
            quote_ident(&sort.field),
            match sort.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            }
        ),
        None => format!(" ORDER BY {primary_key}"),
    };

    match (query.limit, query.offset) {
        (Some(limit), Some(offset)) => tail.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
        (Some(limit), None) => tail.push_str(&format!(" LIMIT {limit}")),
        (None, Some(offset)) => tail.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
        (None, None) => {}
    }

    tail
}
