//! Template cascade engine.
//!
//! # Responsibility
//! - Propagate template structural edits (field added/removed/moved/retyped,
//!   column count switched) to every entry of every bound collection.
//! - Keep `column_order` dense and contiguous after every edit.
//!
//! # Invariants
//! - The reserved entry-images field is never deleted or retyped.
//! - Deletes run leaves-first: entry fields before the template field,
//!   collections before the template.
//! - Malformed input (a field offered against the wrong template, a swap
//!   across columns) is rejected with a typed error, never a silent no-op.

use crate::model::item::{
    EntryFieldData, FieldKind, ItemBody, ItemId, ItemKind, TemplateColumnData, TemplateFieldData,
};
use crate::query::{self, QueryError};
use crate::service::catalog_service;
use crate::service::{CascadeError, CascadeResult};
use crate::store::ItemStore;
use log::info;

/// Collections bound to `template`, with their display names.
///
/// The UI collaborator shows these in its confirmation prompt before a
/// destructive field delete; the engine itself never prompts.
pub fn collections_using(
    store: &ItemStore,
    template: ItemId,
) -> CascadeResult<Vec<(ItemId, String)>> {
    let mut uses = Vec::new();
    for collection in query::template_collections(store, template)? {
        uses.push((collection, store.collection(collection)?.name.clone()));
    }
    Ok(uses)
}

fn template_has_entry_images(store: &ItemStore, template: ItemId) -> CascadeResult<bool> {
    for column in query::template_columns(store, template)? {
        for field in query::template_column_fields(store, column)? {
            if store.template_field(field)?.kind == FieldKind::EntryImages {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn entry_fields_bound_to(store: &ItemStore, template_field: ItemId) -> Vec<ItemId> {
    store
        .items_of_kind(ItemKind::EntryField)
        .filter(|item| {
            item.body
                .as_entry_field()
                .is_some_and(|data| data.template_field == template_field)
        })
        .map(|item| item.id)
        .collect()
}

/// Rewrites a column's `column_order` values to the dense sequence `0..n`,
/// preserving the current relative order.
fn renumber_column(store: &mut ItemStore, column: ItemId) -> CascadeResult<()> {
    let fields = query::sorted_column_fields(store, column)?;
    for (position, field) in fields.into_iter().enumerate() {
        store.update_template_field(field, |data| data.column_order = position as u32)?;
    }
    Ok(())
}

/// Appends a new field at the end of `column` and materializes one
/// default-valued entry field on every entry of every bound collection.
pub fn add_field(
    store: &mut ItemStore,
    template: ItemId,
    column: ItemId,
    name: &str,
    kind: FieldKind,
) -> CascadeResult<ItemId> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CascadeError::Validation("field name cannot be blank".to_string()));
    }
    if kind == FieldKind::EntryImages && template_has_entry_images(store, template)? {
        return Err(CascadeError::Validation(format!(
            "template {template} already carries an entry-images field"
        )));
    }
    if store.template_column(column)?.template != template {
        return Err(CascadeError::Validation(format!(
            "column {column} does not belong to template {template}"
        )));
    }

    let order = query::template_column_fields(store, column)?.len() as u32;
    let field = store.add(ItemBody::TemplateField(TemplateFieldData {
        name: trimmed.to_string(),
        column,
        kind,
        column_order: order,
        is_visible: true,
        is_title_visible: true,
        is_title_inline: false,
    }));

    let mut entries = Vec::new();
    for collection in query::template_collections(store, template)? {
        entries.extend(query::collection_entries(store, collection)?);
    }
    for entry in entries {
        store.add(ItemBody::EntryField(EntryFieldData {
            entry,
            template_field: field,
            value: kind.default_value(),
        }));
    }
    info!("event=field_add module=template status=ok template={template} field={field}");
    Ok(field)
}

pub fn rename_field(store: &mut ItemStore, field: ItemId, name: &str) -> CascadeResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CascadeError::Validation("field name cannot be blank".to_string()));
    }
    let name = trimmed.to_string();
    store.update_template_field(field, |data| data.name = name)?;
    Ok(())
}

/// Deletes a template field and every entry field bound to it across all
/// collections of its template, then closes the order gap in its column.
///
/// Fails with [`CascadeError::ReservedField`] for the entry-images field.
pub fn delete_field(store: &mut ItemStore, field: ItemId) -> CascadeResult<()> {
    let data = store.template_field(field)?;
    if data.kind == FieldKind::EntryImages {
        return Err(CascadeError::ReservedField(field));
    }
    let column = data.column;
    let template = query::field_template(store, field)?;

    for entry_field in entry_fields_bound_to(store, field) {
        store.remove(entry_field)?;
    }
    store.remove(field)?;
    renumber_column(store, column)?;
    info!("event=field_delete module=template status=ok template={template} field={field}");
    Ok(())
}

/// Moves a field to its template's other column, appended after the
/// existing fields there, and renumbers the source column densely.
pub fn move_field(store: &mut ItemStore, field: ItemId) -> CascadeResult<()> {
    let source = store.template_field(field)?.column;
    let template = query::field_template(store, field)?;
    if !store.template(template)?.two_columns {
        return Err(CascadeError::Validation(format!(
            "template {template} uses a single column"
        )));
    }
    let columns = query::template_columns(store, template)?;
    let destination = columns
        .into_iter()
        .find(|&candidate| candidate != source)
        .ok_or_else(|| {
            CascadeError::Validation(format!("template {template} has no second column"))
        })?;

    let order = query::template_column_fields(store, destination)?.len() as u32;
    store.update_template_field(field, |data| {
        data.column = destination;
        data.column_order = order;
    })?;
    renumber_column(store, source)?;
    info!("event=field_move module=template status=ok field={field} column={destination}");
    Ok(())
}

/// Exchanges the positions of two fields in the same column.
///
/// Only the `column_order` values are swapped; payloads stay put, and the
/// column remains dense because a swap permutes an already dense range.
pub fn swap_fields(store: &mut ItemStore, first: ItemId, second: ItemId) -> CascadeResult<()> {
    if first == second {
        return Ok(());
    }
    let first_data = store.template_field(first)?;
    let (first_column, first_order) = (first_data.column, first_data.column_order);
    let second_data = store.template_field(second)?;
    let (second_column, second_order) = (second_data.column, second_data.column_order);
    if first_column != second_column {
        return Err(CascadeError::Validation(format!(
            "fields {first} and {second} are in different columns"
        )));
    }
    store.update_template_field(first, |data| data.column_order = second_order)?;
    store.update_template_field(second, |data| data.column_order = first_order)?;
    Ok(())
}

/// Switches a template between one- and two-column layout.
///
/// Going from two columns to one merges every second-column field into the
/// first column, appended after the existing fields with a dense order; the
/// emptied column item is kept for a later switch back.
pub fn set_column_count(
    store: &mut ItemStore,
    template: ItemId,
    two_columns: bool,
) -> CascadeResult<()> {
    if store.template(template)?.two_columns == two_columns {
        return Ok(());
    }
    let columns = query::template_columns(store, template)?;

    if two_columns {
        if columns.len() < 2 {
            store.add(ItemBody::TemplateColumn(TemplateColumnData {
                template,
                is_first_column: false,
            }));
        }
        store.update_template(template, |data| data.two_columns = true)?;
    } else {
        let first = *columns.first().ok_or(CascadeError::Query(QueryError::Missing {
            relation: "template column",
            from: template,
        }))?;
        if let Some(&second) = columns.get(1) {
            let base = query::template_column_fields(store, first)?.len() as u32;
            let moved = query::sorted_column_fields(store, second)?;
            for (offset, field) in moved.into_iter().enumerate() {
                store.update_template_field(field, |data| {
                    data.column = first;
                    data.column_order = base + offset as u32;
                })?;
            }
        }
        store.update_template(template, |data| data.two_columns = false)?;
    }
    info!("event=template_columns module=template status=ok template={template} two_columns={two_columns}");
    Ok(())
}

/// Changes a field's data type and resets every bound entry field to the
/// new type's empty value.
///
/// The entry-images field can be neither the source nor the target type.
pub fn retype_field(store: &mut ItemStore, field: ItemId, kind: FieldKind) -> CascadeResult<()> {
    let current = store.template_field(field)?.kind;
    if current == FieldKind::EntryImages {
        return Err(CascadeError::ReservedField(field));
    }
    if kind == FieldKind::EntryImages {
        return Err(CascadeError::Validation(
            "fields cannot be retyped to the reserved entry-images type".to_string(),
        ));
    }
    if current == kind {
        return Ok(());
    }
    store.update_template_field(field, |data| data.kind = kind)?;
    for entry_field in entry_fields_bound_to(store, field) {
        store.update_entry_field(entry_field, |data| data.value = kind.default_value())?;
    }
    info!("event=field_retype module=template status=ok field={field}");
    Ok(())
}

/// Deletes a template and everything that depends on it.
///
/// Order: per bound collection its membership edges, groupings, entry
/// fields and entries, then the collection; then the template's fields and
/// columns; the template itself last.
pub fn delete_template(store: &mut ItemStore, template: ItemId) -> CascadeResult<()> {
    store.template(template)?;
    for collection in query::template_collections(store, template)? {
        catalog_service::delete_collection(store, collection)?;
    }
    for column in query::template_columns(store, template)? {
        for field in query::template_column_fields(store, column)? {
            store.remove(field)?;
        }
        store.remove(column)?;
    }
    store.remove(template)?;
    info!("event=template_delete module=template status=ok template={template}");
    Ok(())
}
