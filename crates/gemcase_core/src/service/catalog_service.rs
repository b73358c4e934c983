//! Catalog lifecycle operations.
//!
//! # Responsibility
//! - Create projects, templates, collections, groupings and entries with
//!   their required default structure in place.
//! - Delete entries, groupings and collections leaves-first.
//!
//! # Invariants
//! - Every collection gets exactly one auto-generated "all" grouping at
//!   creation; it can be neither deleted nor renamed here.
//! - A new entry gets one default-valued entry field per template field of
//!   its collection's template, plus an "all" membership edge.
//! - User grouping names are non-blank and never the reserved "all".

use crate::model::item::{
    CollectionData, DatabaseData, EntryData, EntryFieldData, FieldValue, GroupingData,
    GroupingEntryRefData, ImagePlacement, ItemBody, ItemId, ItemKind, Rgb, TemplateColumnData,
    TemplateData,
};
use crate::query;
use crate::service::{CascadeError, CascadeResult};
use crate::store::ItemStore;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

/// Name carried by every auto-generated grouping.
pub const ALL_GROUPING_NAME: &str = "all";

/// Most extra image slots a template may declare.
pub const MAX_EXTRA_IMAGES: u8 = 100;

static MONEY_PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]*$").expect("valid money digits regex"));

fn require_name(name: &str, what: &str) -> CascadeResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CascadeError::Validation(format!(
            "{what} name cannot be blank"
        )));
    }
    Ok(trimmed.to_string())
}

/// Seeds a new project with its root database item.
///
/// A store can hold exactly one database; seeding twice is a validation
/// error.
pub fn new_project(store: &mut ItemStore, name: &str) -> CascadeResult<ItemId> {
    let name = require_name(name, "project")?;
    if store.items_of_kind(ItemKind::Database).next().is_some() {
        return Err(CascadeError::Validation(
            "store already contains a project database".to_string(),
        ));
    }
    let id = store.add(ItemBody::Database(DatabaseData {
        name: name.clone(),
        description: String::new(),
        default_edit_mode: true,
    }));
    info!("event=project_new module=catalog status=ok database={id} name={name}");
    Ok(id)
}

/// Creates a template with its column(s). Fields, the reserved entry-images
/// field included, are added afterwards through the cascade engine.
pub fn add_template(
    store: &mut ItemStore,
    name: &str,
    two_columns: bool,
) -> CascadeResult<ItemId> {
    let name = require_name(name, "template")?;
    let template = store.add(ItemBody::Template(TemplateData {
        name,
        two_columns,
        center_images: true,
        extra_image_count: 0,
        extra_image_pos: ImagePlacement::Under,
        font_family: "Arial".to_string(),
        header_color: Rgb::BLACK,
        content_color: Rgb::BLACK,
    }));
    store.add(ItemBody::TemplateColumn(TemplateColumnData {
        template,
        is_first_column: true,
    }));
    if two_columns {
        store.add(ItemBody::TemplateColumn(TemplateColumnData {
            template,
            is_first_column: false,
        }));
    }
    info!("event=template_add module=catalog status=ok template={template} two_columns={two_columns}");
    Ok(template)
}

/// Creates a collection bound to `template`, together with its protected
/// "all" grouping.
pub fn add_collection(
    store: &mut ItemStore,
    name: &str,
    description: &str,
    template: ItemId,
) -> CascadeResult<ItemId> {
    let name = require_name(name, "collection")?;
    store.template(template)?;
    let collection = store.add(ItemBody::Collection(CollectionData {
        name,
        description: description.to_string(),
        template,
    }));
    store.add(ItemBody::Grouping(GroupingData {
        name: ALL_GROUPING_NAME.to_string(),
        collection,
        auto_generated: true,
    }));
    info!("event=collection_add module=catalog status=ok collection={collection} template={template}");
    Ok(collection)
}

/// Creates a user grouping. The reserved "all" name is rejected so the auto
/// grouping can never become ambiguous.
pub fn add_grouping(store: &mut ItemStore, name: &str, collection: ItemId) -> CascadeResult<ItemId> {
    let name = require_name(name, "grouping")?;
    store.collection(collection)?;
    if name == ALL_GROUPING_NAME {
        return Err(CascadeError::Validation(format!(
            "grouping name `{ALL_GROUPING_NAME}` is reserved for the auto grouping"
        )));
    }
    let grouping = store.add(ItemBody::Grouping(GroupingData {
        name,
        collection,
        auto_generated: false,
    }));
    info!("event=grouping_add module=catalog status=ok grouping={grouping} collection={collection}");
    Ok(grouping)
}

/// Creates an entry with one default-valued field per template field.
///
/// Fields are materialized first column first, within a column by
/// `column_order`. Membership edges are added to the "all" grouping and to
/// each requested extra grouping of the same collection.
pub fn add_entry(
    store: &mut ItemStore,
    name: &str,
    collection: ItemId,
    extra_groupings: &[ItemId],
) -> CascadeResult<ItemId> {
    let name = require_name(name, "entry")?;
    let template = query::collection_template(store, collection)?;
    let all = query::all_grouping(store, collection)?;

    for &grouping in extra_groupings {
        let data = store.grouping(grouping)?;
        if data.collection != collection {
            return Err(CascadeError::Validation(format!(
                "grouping {grouping} belongs to a different collection"
            )));
        }
        if data.auto_generated {
            return Err(CascadeError::Validation(format!(
                "grouping {grouping} is the auto grouping; entries join it implicitly"
            )));
        }
    }

    let mut template_fields = Vec::new();
    for column in query::template_columns(store, template)? {
        template_fields.extend(query::sorted_column_fields(store, column)?);
    }

    let entry = store.add(ItemBody::Entry(EntryData { name, collection }));
    for template_field in template_fields {
        let kind = store.template_field(template_field)?.kind;
        store.add(ItemBody::EntryField(EntryFieldData {
            entry,
            template_field,
            value: kind.default_value(),
        }));
    }
    store.add(ItemBody::GroupingEntryRef(GroupingEntryRefData {
        grouping: all,
        entry,
    }));
    for &grouping in extra_groupings {
        store.add(ItemBody::GroupingEntryRef(GroupingEntryRefData {
            grouping,
            entry,
        }));
    }
    info!("event=entry_add module=catalog status=ok entry={entry} collection={collection}");
    Ok(entry)
}

/// Overwrites one entry field's value after checking it against the bound
/// template field's data type. Money parts must be digit-only strings.
pub fn set_entry_field_value(
    store: &mut ItemStore,
    entry_field: ItemId,
    value: FieldValue,
) -> CascadeResult<()> {
    let template_field = query::field_template_field(store, entry_field)?;
    let kind = store.template_field(template_field)?.kind;
    if !value.matches_kind(kind) {
        return Err(CascadeError::Validation(format!(
            "value does not match the {kind:?} data type of field {template_field}"
        )));
    }
    if let FieldValue::Money(parts) = &value {
        for part in parts {
            if !MONEY_PART_RE.is_match(part) {
                return Err(CascadeError::Validation(format!(
                    "money amount part `{part}` contains non-digit characters"
                )));
            }
        }
    }
    store.update_entry_field(entry_field, |data| data.value = value)?;
    Ok(())
}

pub fn rename_entry(store: &mut ItemStore, entry: ItemId, name: &str) -> CascadeResult<()> {
    let name = require_name(name, "entry")?;
    store.update_entry(entry, |data| data.name = name)?;
    Ok(())
}

pub fn rename_collection(
    store: &mut ItemStore,
    collection: ItemId,
    name: &str,
) -> CascadeResult<()> {
    let name = require_name(name, "collection")?;
    store.update_collection(collection, |data| data.name = name)?;
    Ok(())
}

/// Renames a user grouping. Auto groupings keep their reserved name.
pub fn rename_grouping(store: &mut ItemStore, grouping: ItemId, name: &str) -> CascadeResult<()> {
    let name = require_name(name, "grouping")?;
    if store.grouping(grouping)?.auto_generated {
        return Err(CascadeError::ProtectedGrouping(grouping));
    }
    if name == ALL_GROUPING_NAME {
        return Err(CascadeError::Validation(format!(
            "grouping name `{ALL_GROUPING_NAME}` is reserved for the auto grouping"
        )));
    }
    store.update_grouping(grouping, |data| data.name = name)?;
    Ok(())
}

pub fn rename_template(store: &mut ItemStore, template: ItemId, name: &str) -> CascadeResult<()> {
    let name = require_name(name, "template")?;
    store.update_template(template, |data| data.name = name)?;
    Ok(())
}

/// Updates a template's extra-image slot count, capped at
/// [`MAX_EXTRA_IMAGES`].
pub fn set_extra_image_count(
    store: &mut ItemStore,
    template: ItemId,
    count: u8,
) -> CascadeResult<()> {
    store.update_template(template, |data| {
        data.extra_image_count = count.min(MAX_EXTRA_IMAGES);
    })?;
    Ok(())
}

pub fn set_extra_image_pos(
    store: &mut ItemStore,
    template: ItemId,
    pos: ImagePlacement,
) -> CascadeResult<()> {
    store.update_template(template, |data| data.extra_image_pos = pos)?;
    Ok(())
}

pub fn set_center_images(
    store: &mut ItemStore,
    template: ItemId,
    center: bool,
) -> CascadeResult<()> {
    store.update_template(template, |data| data.center_images = center)?;
    Ok(())
}

pub fn set_template_font(
    store: &mut ItemStore,
    template: ItemId,
    font_family: &str,
) -> CascadeResult<()> {
    let font_family = require_name(font_family, "font family")?;
    store.update_template(template, |data| data.font_family = font_family)?;
    Ok(())
}

pub fn set_template_colors(
    store: &mut ItemStore,
    template: ItemId,
    header: Rgb,
    content: Rgb,
) -> CascadeResult<()> {
    store.update_template(template, |data| {
        data.header_color = header;
        data.content_color = content;
    })?;
    Ok(())
}

/// Deletes an entry together with its fields and every membership edge
/// pointing at it, leaves first.
pub fn delete_entry(store: &mut ItemStore, entry: ItemId) -> CascadeResult<()> {
    let fields = query::entry_fields(store, entry)?;
    let refs = query::entry_entry_refs(store, entry)?;
    for field in fields {
        store.remove(field)?;
    }
    for entry_ref in refs {
        store.remove(entry_ref)?;
    }
    store.remove(entry)?;
    info!("event=entry_delete module=catalog status=ok entry={entry}");
    Ok(())
}

/// Deletes a user grouping and its membership edges. The auto grouping is
/// protected.
pub fn delete_grouping(store: &mut ItemStore, grouping: ItemId) -> CascadeResult<()> {
    if store.grouping(grouping)?.auto_generated {
        return Err(CascadeError::ProtectedGrouping(grouping));
    }
    for entry_ref in query::grouping_entry_refs(store, grouping)? {
        store.remove(entry_ref)?;
    }
    store.remove(grouping)?;
    info!("event=grouping_delete module=catalog status=ok grouping={grouping}");
    Ok(())
}

/// Deletes a collection and everything under it: membership edges, then
/// groupings (auto grouping included), then entry fields, then entries,
/// then the collection itself.
pub fn delete_collection(store: &mut ItemStore, collection: ItemId) -> CascadeResult<()> {
    for grouping in query::collection_groupings(store, collection)? {
        for entry_ref in query::grouping_entry_refs(store, grouping)? {
            store.remove(entry_ref)?;
        }
        store.remove(grouping)?;
    }
    for entry in query::collection_entries(store, collection)? {
        for field in query::entry_fields(store, entry)? {
            store.remove(field)?;
        }
        store.remove(entry)?;
    }
    store.remove(collection)?;
    info!("event=collection_delete module=catalog status=ok collection={collection}");
    Ok(())
}
