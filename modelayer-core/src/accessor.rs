//! The uniform accessor contract implemented by every bound model.
//!
//! | Operation | Behavior |
//! |---|---|
//! | [`find_by_id`](ModelAccessors::find_by_id) | one record, or `None` |
//! | [`find_one`](ModelAccessors::find_one) | first match, or `None` |
//! | [`find`](ModelAccessors::find) | all matches; options forwarded to the backend |
//! | [`create`](ModelAccessors::create) | persists the payload as given, unfiltered |
//! | [`update_instance`](ModelAccessors::update_instance) | filtered updates applied to a loaded record, then saved |
//! | [`find_by_id_and_update`](ModelAccessors::find_by_id_and_update) | locate by id, apply filtered updates; a miss is [`ModelError::NotFound`] |
//! | [`find_one_and_update`](ModelAccessors::find_one_and_update) | same, located by filter |
//! | [`delete`](ModelAccessors::delete) | removes every match |
//! | [`delete_instance`](ModelAccessors::delete_instance) | removes exactly that record |
//!
//! Each call issues its backend work and resolves once the backend has
//! persisted the change. Nothing is retried.
//!
//! [`ModelError::NotFound`]: crate::error::ModelError::NotFound

use async_trait::async_trait;
use bson::Document;

use crate::{
    error::ModelResult,
    query::{Filter, FindOptions},
    record::Record,
    update::UpdateOptions,
};

/// CRUD accessors bound to one model and one backend.
#[async_trait]
pub trait ModelAccessors: Send + Sync {
    /// The backend's record identifier type.
    type Id: Send + Sync;

    /// The model name.
    fn name(&self) -> &str;

    async fn find_by_id(&self, id: &Self::Id) -> ModelResult<Option<Record<Self::Id>>>;

    async fn find_one(&self, filter: Filter) -> ModelResult<Option<Record<Self::Id>>>;

    async fn find(&self, filter: Filter, options: FindOptions) -> ModelResult<Vec<Record<Self::Id>>>;

    async fn create(&self, payload: Document) -> ModelResult<Record<Self::Id>>;

    /// Applies the permitted subset of `updates` to `instance` and persists it.
    /// On success `instance` reflects the stored state.
    async fn update_instance(
        &self,
        instance: &mut Record<Self::Id>,
        updates: &Document,
        options: UpdateOptions,
    ) -> ModelResult<()>;

    async fn find_by_id_and_update(
        &self,
        id: &Self::Id,
        updates: &Document,
        options: UpdateOptions,
    ) -> ModelResult<Record<Self::Id>>;

    async fn find_one_and_update(
        &self,
        filter: Filter,
        updates: &Document,
        options: UpdateOptions,
    ) -> ModelResult<Record<Self::Id>>;

    /// Removes every record matching the filter, returning the count.
    async fn delete(&self, filter: Filter) -> ModelResult<u64>;

    async fn delete_instance(&self, instance: Record<Self::Id>) -> ModelResult<()>;
}
