//! MongoDB query documents for record filters.

use bson::{Bson, Document, doc};

use modelayer_core::query::Filter;

/// Builds the MongoDB query document for a filter.
///
/// Each condition is wrapped in `$eq`, so a value that looks like an operator
/// document is still compared literally. `$eq: null` also matches documents
/// without the field.
pub fn filter_document(filter: &Filter) -> Document {
    filter
        .iter()
        .map(|(field, value)| (field.to_string(), Bson::Document(doc! { "$eq": value.clone() })))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_filter_is_an_empty_query() {
        assert_eq!(filter_document(&Filter::all()), doc! {});
    }

    #[test]
    fn conditions_compare_with_eq() {
        let filter = Filter::eq("name", "ann").and_eq("age", 3);

        assert_eq!(
            filter_document(&filter),
            doc! { "name": { "$eq": "ann" }, "age": { "$eq": 3 } }
        );
    }

    #[test]
    fn operator_shaped_values_stay_literal() {
        let filter: Filter = doc! { "name": { "$ne": "x" } }.into();

        assert_eq!(
            filter_document(&filter),
            doc! { "name": { "$eq": { "$ne": "x" } } }
        );
    }
}
