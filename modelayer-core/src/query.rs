//! Record filters and find options.
//!
//! A filter is a set of equality conditions, all of which must hold. It is
//! usually built from a BSON document:
//!
//! ```ignore
//! use bson::doc;
//! use modelayer_core::query::Filter;
//!
//! let by_name: Filter = doc! { "name": "Alice" }.into();
//! let everything = Filter::all();
//! let admins = Filter::eq("role", "admin").and_eq("active", true);
//! ```
//!
//! A condition on `null` matches records where the field is null or absent.

use bson::{Bson, Document};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Which field to sort by and in which direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Field equality conditions joined by AND.
///
/// A filter without conditions matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Document,
}

impl Filter {
    /// A filter that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter on a single field value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::all().and_eq(field, value)
    }

    /// Adds a condition. A later condition on the same field replaces the
    /// earlier one.
    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    /// Returns `true` for the match-everything filter.
    pub fn is_all(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &Document {
        &self.conditions
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bson)> {
        self.conditions.iter().map(|(field, value)| (field.as_str(), value))
    }
}

impl From<Document> for Filter {
    fn from(conditions: Document) -> Self {
        Filter { conditions }
    }
}

/// Backend-specific options accepted by `find`. The accessors forward them
/// to the backend unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<Sort>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(Sort { field: field.into(), direction });
        self
    }
}

/// A filter together with its find options, as handed to a backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<Sort>,
}

impl Query {
    pub fn new(filter: Filter, options: FindOptions) -> Self {
        Query {
            filter,
            limit: options.limit,
            offset: options.offset,
            sort: options.sort,
        }
    }
}
