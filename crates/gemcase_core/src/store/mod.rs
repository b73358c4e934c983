//! In-memory item store.
//!
//! # Responsibility
//! - Own the flat, insertion-ordered set of catalog items.
//! - Allocate stable ids and surface add/update/remove/reset notifications.
//!
//! # Invariants
//! - Ids are handed out monotonically and never reused, including across
//!   save/load (the allocator position is part of the persisted snapshot).
//! - `remove` deletes exactly one item and never cascades; callers delete
//!   dependents first, leaves before parents.
//! - Observers are notified after the mutation has fully taken effect.

use crate::model::item::{
    CollectionData, DatabaseData, EntryData, EntryFieldData, GroupingData, GroupingEntryRefData,
    Item, ItemBody, ItemId, ItemKind, TemplateColumnData, TemplateData, TemplateFieldData,
};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by direct item access.
#[derive(Debug)]
pub enum StoreError {
    /// No item with the given id exists.
    NotFound(ItemId),
    /// The item exists but carries a different kind of payload.
    KindMismatch {
        id: ItemId,
        expected: ItemKind,
        actual: ItemKind,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::KindMismatch {
                id,
                expected,
                actual,
            } => write!(f, "item {id} is a {actual}, expected a {expected}"),
        }
    }
}

impl Error for StoreError {}

/// Notification emitted after every store mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A new item was added under the given id.
    Added(ItemId),
    /// An existing item's payload was rewritten in place.
    Updated(ItemId),
    /// The item with the given id was removed.
    Removed(ItemId),
    /// The whole item set was replaced; observers must rebuild derived views.
    Reset,
}

/// Handle for removing a previously registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&ChangeEvent) + Send>;

/// Flat, observable item storage.
///
/// Single-threaded by design; the autosave path wraps the store in a mutex
/// at the composition layer rather than locking in here.
pub struct ItemStore {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Rebuilds a store from a persisted snapshot.
    ///
    /// The codec validates id uniqueness and the allocator position before
    /// calling this; violations here are programming errors.
    pub fn from_parts(items: Vec<Item>, next_id: u64) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id, position))
            .collect::<HashMap<_, _>>();
        debug_assert_eq!(index.len(), items.len(), "duplicate item ids in snapshot");
        debug_assert!(items.iter().all(|item| item.id.0 < next_id));
        Self {
            items,
            index,
            next_id,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Next id the allocator will hand out. Persisted with the item set.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Registers an observer called after every mutation.
    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Drops an observer. Returns whether it was still registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(current, _)| *current != id);
        self.listeners.len() != before
    }

    fn notify(&self, event: ChangeEvent) {
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    /// Stores a new item and returns its freshly allocated id.
    pub fn add(&mut self, body: ItemBody) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.index.insert(id, self.items.len());
        self.items.push(Item { id, body });
        self.notify(ChangeEvent::Added(id));
        id
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: ItemId) -> StoreResult<&Item> {
        self.index
            .get(&id)
            .map(|&position| &self.items[position])
            .ok_or(StoreError::NotFound(id))
    }

    /// Rewrites one item's payload in place and notifies observers.
    ///
    /// The closure may change the payload to a different kind; typed update
    /// helpers below are the usual entry points and preserve the kind.
    pub fn update<F>(&mut self, id: ItemId, mutate: F) -> StoreResult<()>
    where
        F: FnOnce(&mut ItemBody),
    {
        let position = *self.index.get(&id).ok_or(StoreError::NotFound(id))?;
        mutate(&mut self.items[position].body);
        self.notify(ChangeEvent::Updated(id));
        Ok(())
    }

    /// Removes exactly one item. Never cascades.
    pub fn remove(&mut self, id: ItemId) -> StoreResult<()> {
        let position = self.index.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.items.remove(position);
        for moved in &self.items[position..] {
            if let Some(slot) = self.index.get_mut(&moved.id) {
                *slot -= 1;
            }
        }
        self.notify(ChangeEvent::Removed(id));
        Ok(())
    }

    /// Replaces the whole item set and allocator position in one step.
    ///
    /// Used by project load; observers receive a single `Reset`.
    pub fn replace_all(&mut self, items: Vec<Item>, next_id: u64) {
        self.index = items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id, position))
            .collect();
        debug_assert_eq!(self.index.len(), items.len(), "duplicate item ids in snapshot");
        self.items = items;
        self.next_id = next_id;
        self.notify(ChangeEvent::Reset);
    }

    /// All items of one kind, in insertion order.
    pub fn items_of_kind(&self, kind: ItemKind) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |item| item.kind() == kind)
    }

    fn typed<T>(
        &self,
        id: ItemId,
        expected: ItemKind,
        project: impl FnOnce(&ItemBody) -> Option<&T>,
    ) -> StoreResult<&T> {
        let item = self.get(id)?;
        project(&item.body).ok_or(StoreError::KindMismatch {
            id,
            expected,
            actual: item.kind(),
        })
    }

    pub fn database(&self, id: ItemId) -> StoreResult<&DatabaseData> {
        self.typed(id, ItemKind::Database, ItemBody::as_database)
    }

    pub fn collection(&self, id: ItemId) -> StoreResult<&CollectionData> {
        self.typed(id, ItemKind::Collection, ItemBody::as_collection)
    }

    pub fn grouping(&self, id: ItemId) -> StoreResult<&GroupingData> {
        self.typed(id, ItemKind::Grouping, ItemBody::as_grouping)
    }

    pub fn entry(&self, id: ItemId) -> StoreResult<&EntryData> {
        self.typed(id, ItemKind::Entry, ItemBody::as_entry)
    }

    pub fn grouping_entry_ref(&self, id: ItemId) -> StoreResult<&GroupingEntryRefData> {
        self.typed(id, ItemKind::GroupingEntryRef, ItemBody::as_grouping_entry_ref)
    }

    pub fn template(&self, id: ItemId) -> StoreResult<&TemplateData> {
        self.typed(id, ItemKind::Template, ItemBody::as_template)
    }

    pub fn template_column(&self, id: ItemId) -> StoreResult<&TemplateColumnData> {
        self.typed(id, ItemKind::TemplateColumn, ItemBody::as_template_column)
    }

    pub fn template_field(&self, id: ItemId) -> StoreResult<&TemplateFieldData> {
        self.typed(id, ItemKind::TemplateField, ItemBody::as_template_field)
    }

    pub fn entry_field(&self, id: ItemId) -> StoreResult<&EntryFieldData> {
        self.typed(id, ItemKind::EntryField, ItemBody::as_entry_field)
    }

    fn typed_update<T>(
        &mut self,
        id: ItemId,
        expected: ItemKind,
        project: impl FnOnce(&mut ItemBody) -> Option<&mut T>,
        mutate: impl FnOnce(&mut T),
    ) -> StoreResult<()> {
        let position = *self.index.get(&id).ok_or(StoreError::NotFound(id))?;
        let body = &mut self.items[position].body;
        let actual = body.kind();
        match project(body) {
            Some(data) => {
                mutate(data);
                self.notify(ChangeEvent::Updated(id));
                Ok(())
            }
            None => Err(StoreError::KindMismatch {
                id,
                expected,
                actual,
            }),
        }
    }

    pub fn update_database(
        &mut self,
        id: ItemId,
        mutate: impl FnOnce(&mut DatabaseData),
    ) -> StoreResult<()> {
        self.typed_update(
            id,
            ItemKind::Database,
            |body| match body {
                ItemBody::Database(data) => Some(data),
                _ => None,
            },
            mutate,
        )
    }

    pub fn update_collection(
        &mut self,
        id: ItemId,
        mutate: impl FnOnce(&mut CollectionData),
    ) -> StoreResult<()> {
        self.typed_update(
            id,
            ItemKind::Collection,
            |body| match body {
                ItemBody::Collection(data) => Some(data),
                _ => None,
            },
            mutate,
        )
    }

    pub fn update_grouping(
        &mut self,
        id: ItemId,
        mutate: impl FnOnce(&mut GroupingData),
    ) -> StoreResult<()> {
        self.typed_update(
            id,
            ItemKind::Grouping,
            |body| match body {
                ItemBody::Grouping(data) => Some(data),
                _ => None,
            },
            mutate,
        )
    }

    pub fn update_entry(
        &mut self,
        id: ItemId,
        mutate: impl FnOnce(&mut EntryData),
    ) -> StoreResult<()> {
        self.typed_update(
            id,
            ItemKind::Entry,
            |body| match body {
                ItemBody::Entry(data) => Some(data),
                _ => None,
            },
            mutate,
        )
    }

    pub fn update_template(
        &mut self,
        id: ItemId,
        mutate: impl FnOnce(&mut TemplateData),
    ) -> StoreResult<()> {
        self.typed_update(
            id,
            ItemKind::Template,
            |body| match body {
                ItemBody::Template(data) => Some(data),
                _ => None,
            },
            mutate,
        )
    }

    pub fn update_template_field(
        &mut self,
        id: ItemId,
        mutate: impl FnOnce(&mut TemplateFieldData),
    ) -> StoreResult<()> {
        self.typed_update(
            id,
            ItemKind::TemplateField,
            |body| match body {
                ItemBody::TemplateField(data) => Some(data),
                _ => None,
            },
            mutate,
        )
    }

    pub fn update_entry_field(
        &mut self,
        id: ItemId,
        mutate: impl FnOnce(&mut EntryFieldData),
    ) -> StoreResult<()> {
        self.typed_update(
            id,
            ItemKind::EntryField,
            |body| match body {
                ItemBody::EntryField(data) => Some(data),
                _ => None,
            },
            mutate,
        )
    }
}
