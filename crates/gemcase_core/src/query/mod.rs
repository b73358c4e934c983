//! Relationship query layer.
//!
//! # Responsibility
//! - Derive parent/child and cross-reference structure from the id fields
//!   stored on items, without mutating anything.
//! - Surface absent or ambiguous single-item relations as typed errors
//!   instead of silently yielding defaults.
//!
//! # Invariants
//! - Sequence queries return insertion order; display order within a template
//!   column is obtained separately via [`sorted_column_fields`].
//! - `template_columns` puts the column flagged `is_first_column` first; the
//!   flag, not position, identifies the first column.
//! - Queries recompute by scan on every call. Catalog sizes are personal
//!   scale, so no index is kept.

use crate::model::item::{ItemId, ItemKind};
use crate::store::{ItemStore, StoreError, StoreResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type QueryResult<T> = Result<T, QueryError>;

/// Failures raised by relationship queries.
#[derive(Debug)]
pub enum QueryError {
    /// Item access failed (unknown id or wrong kind).
    Store(StoreError),
    /// A relation expected to yield exactly one item yielded none.
    Missing {
        relation: &'static str,
        from: ItemId,
    },
    /// A relation expected to yield exactly one item yielded several.
    Ambiguous {
        relation: &'static str,
        from: ItemId,
    },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Missing { relation, from } => {
                write!(f, "no {relation} found for item {from}")
            }
            Self::Ambiguous { relation, from } => {
                write!(f, "more than one {relation} found for item {from}")
            }
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Missing { .. } | Self::Ambiguous { .. } => None,
        }
    }
}

impl From<StoreError> for QueryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Maps a dangling reference target to a referential-gap error while keeping
/// kind mismatches as hard store failures.
fn resolve_target<T>(
    result: StoreResult<T>,
    relation: &'static str,
    from: ItemId,
) -> QueryResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(StoreError::NotFound(_)) => Err(QueryError::Missing { relation, from }),
        Err(err) => Err(QueryError::Store(err)),
    }
}

/// Columns of a template: the flagged first column, then any second column.
pub fn template_columns(store: &ItemStore, template: ItemId) -> QueryResult<Vec<ItemId>> {
    store.template(template)?;
    let mut first = Vec::new();
    let mut rest = Vec::new();
    for item in store.items_of_kind(ItemKind::TemplateColumn) {
        if let Some(data) = item.body.as_template_column() {
            if data.template == template {
                if data.is_first_column {
                    first.push(item.id);
                } else {
                    rest.push(item.id);
                }
            }
        }
    }
    first.extend(rest);
    Ok(first)
}

/// Fields of one column, in insertion order. Callers wanting display order
/// use [`sorted_column_fields`].
pub fn template_column_fields(store: &ItemStore, column: ItemId) -> QueryResult<Vec<ItemId>> {
    store.template_column(column)?;
    Ok(store
        .items_of_kind(ItemKind::TemplateField)
        .filter(|item| {
            item.body
                .as_template_field()
                .is_some_and(|data| data.column == column)
        })
        .map(|item| item.id)
        .collect())
}

/// Fields of one column ordered by their dense `column_order`.
pub fn sorted_column_fields(store: &ItemStore, column: ItemId) -> QueryResult<Vec<ItemId>> {
    let mut fields: Vec<(u32, ItemId)> = Vec::new();
    for id in template_column_fields(store, column)? {
        let data = store.template_field(id)?;
        fields.push((data.column_order, id));
    }
    fields.sort_by_key(|&(order, _)| order);
    Ok(fields.into_iter().map(|(_, id)| id).collect())
}

/// Collections bound to a template.
pub fn template_collections(store: &ItemStore, template: ItemId) -> QueryResult<Vec<ItemId>> {
    store.template(template)?;
    Ok(store
        .items_of_kind(ItemKind::Collection)
        .filter(|item| {
            item.body
                .as_collection()
                .is_some_and(|data| data.template == template)
        })
        .map(|item| item.id)
        .collect())
}

/// Groupings of a collection, the auto "all" grouping included.
pub fn collection_groupings(store: &ItemStore, collection: ItemId) -> QueryResult<Vec<ItemId>> {
    store.collection(collection)?;
    Ok(store
        .items_of_kind(ItemKind::Grouping)
        .filter(|item| {
            item.body
                .as_grouping()
                .is_some_and(|data| data.collection == collection)
        })
        .map(|item| item.id)
        .collect())
}

/// Entries of a collection.
pub fn collection_entries(store: &ItemStore, collection: ItemId) -> QueryResult<Vec<ItemId>> {
    store.collection(collection)?;
    Ok(store
        .items_of_kind(ItemKind::Entry)
        .filter(|item| {
            item.body
                .as_entry()
                .is_some_and(|data| data.collection == collection)
        })
        .map(|item| item.id)
        .collect())
}

/// Membership edges of one grouping.
pub fn grouping_entry_refs(store: &ItemStore, grouping: ItemId) -> QueryResult<Vec<ItemId>> {
    store.grouping(grouping)?;
    Ok(store
        .items_of_kind(ItemKind::GroupingEntryRef)
        .filter(|item| {
            item.body
                .as_grouping_entry_ref()
                .is_some_and(|data| data.grouping == grouping)
        })
        .map(|item| item.id)
        .collect())
}

/// Field values of one entry.
pub fn entry_fields(store: &ItemStore, entry: ItemId) -> QueryResult<Vec<ItemId>> {
    store.entry(entry)?;
    Ok(store
        .items_of_kind(ItemKind::EntryField)
        .filter(|item| {
            item.body
                .as_entry_field()
                .is_some_and(|data| data.entry == entry)
        })
        .map(|item| item.id)
        .collect())
}

/// Every membership edge pointing at one entry, across all groupings.
pub fn entry_entry_refs(store: &ItemStore, entry: ItemId) -> QueryResult<Vec<ItemId>> {
    store.entry(entry)?;
    Ok(store
        .items_of_kind(ItemKind::GroupingEntryRef)
        .filter(|item| {
            item.body
                .as_grouping_entry_ref()
                .is_some_and(|data| data.entry == entry)
        })
        .map(|item| item.id)
        .collect())
}

/// The entry a membership edge points at.
pub fn entry_ref_entry(store: &ItemStore, entry_ref: ItemId) -> QueryResult<ItemId> {
    let target = store.grouping_entry_ref(entry_ref)?.entry;
    resolve_target(store.entry(target), "entry", entry_ref)?;
    Ok(target)
}

/// The grouping a membership edge belongs to.
pub fn entry_ref_grouping(store: &ItemStore, entry_ref: ItemId) -> QueryResult<ItemId> {
    let target = store.grouping_entry_ref(entry_ref)?.grouping;
    resolve_target(store.grouping(target), "grouping", entry_ref)?;
    Ok(target)
}

/// The template field an entry field carries a value for.
pub fn field_template_field(store: &ItemStore, entry_field: ItemId) -> QueryResult<ItemId> {
    let target = store.entry_field(entry_field)?.template_field;
    resolve_target(store.template_field(target), "template field", entry_field)?;
    Ok(target)
}

/// The entry an entry field belongs to.
pub fn field_entry(store: &ItemStore, entry_field: ItemId) -> QueryResult<ItemId> {
    let target = store.entry_field(entry_field)?.entry;
    resolve_target(store.entry(target), "entry", entry_field)?;
    Ok(target)
}

/// The collection a grouping belongs to.
pub fn grouping_collection(store: &ItemStore, grouping: ItemId) -> QueryResult<ItemId> {
    let target = store.grouping(grouping)?.collection;
    resolve_target(store.collection(target), "collection", grouping)?;
    Ok(target)
}

/// The collection an entry belongs to.
pub fn entry_collection(store: &ItemStore, entry: ItemId) -> QueryResult<ItemId> {
    let target = store.entry(entry)?.collection;
    resolve_target(store.collection(target), "collection", entry)?;
    Ok(target)
}

/// The template a collection is bound to.
pub fn collection_template(store: &ItemStore, collection: ItemId) -> QueryResult<ItemId> {
    let target = store.collection(collection)?.template;
    resolve_target(store.template(target), "template", collection)?;
    Ok(target)
}

/// The column a template field sits in.
pub fn field_column(store: &ItemStore, template_field: ItemId) -> QueryResult<ItemId> {
    let target = store.template_field(template_field)?.column;
    resolve_target(store.template_column(target), "template column", template_field)?;
    Ok(target)
}

/// The template a template field ultimately belongs to (two hops).
pub fn field_template(store: &ItemStore, template_field: ItemId) -> QueryResult<ItemId> {
    let column = field_column(store, template_field)?;
    let target = store.template_column(column)?.template;
    resolve_target(store.template(target), "template", template_field)?;
    Ok(target)
}

/// The auto-generated "all" grouping of a collection.
///
/// Located by the explicit `auto_generated` marker; exactly one must exist.
pub fn all_grouping(store: &ItemStore, collection: ItemId) -> QueryResult<ItemId> {
    let mut found = None;
    for id in collection_groupings(store, collection)? {
        if store.grouping(id)?.auto_generated {
            if found.is_some() {
                return Err(QueryError::Ambiguous {
                    relation: "auto grouping",
                    from: collection,
                });
            }
            found = Some(id);
        }
    }
    found.ok_or(QueryError::Missing {
        relation: "auto grouping",
        from: collection,
    })
}
