//! Item domain model.
//!
//! # Responsibility
//! - Define the single polymorphic record every catalog object is stored as.
//! - Give each item kind an explicit, typed payload instead of a string-keyed
//!   attribute bag, so wrong-typed reads fail at compile time.
//!
//! # Invariants
//! - `ItemId` values are monotonically assigned and never reused.
//! - Relations between items are plain `ItemId` fields; structure is
//!   reconstructed by scanning, never by nested ownership.
//! - `column_order` values within one template column form a dense `0..n`
//!   sequence; the cascade service is responsible for keeping them dense.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable identifier for every catalog item.
///
/// Allocated monotonically by the store; ids survive save/load and are never
/// renumbered or reused, so they are safe to hold across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminant for every item payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Database,
    Collection,
    Grouping,
    Entry,
    GroupingEntryRef,
    Template,
    TemplateColumn,
    TemplateField,
    EntryField,
}

impl ItemKind {
    /// Stable lowercase name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Collection => "collection",
            Self::Grouping => "grouping",
            Self::Entry => "entry",
            Self::GroupingEntryRef => "grouping_entry_ref",
            Self::Template => "template",
            Self::TemplateColumn => "template_column",
            Self::TemplateField => "template_field",
            Self::EntryField => "entry_field",
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data type of a template field and of every entry field bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Reserved per-entry image set. Exactly one per template; cannot be
    /// deleted or retyped.
    EntryImages,
    /// Free-form text.
    Text,
    /// Text rendered as a mineral species name.
    MineralName,
    /// Text rendered as a chemical formula.
    MineralFormula,
    /// Two-part dollars/cents amount.
    MoneyUsd,
    /// Additional image path list.
    Images,
    /// Clickable URL.
    Hyperlink,
}

impl FieldKind {
    /// Empty value an entry field of this kind starts out with.
    pub fn default_value(self) -> FieldValue {
        match self {
            Self::MoneyUsd => FieldValue::Money([String::new(), String::new()]),
            Self::EntryImages | Self::Images => FieldValue::Images(Vec::new()),
            Self::Hyperlink => FieldValue::Hyperlink(String::new()),
            Self::Text | Self::MineralName | Self::MineralFormula => {
                FieldValue::Text(String::new())
            }
        }
    }
}

/// Value carried by one entry field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    /// Dollars and cents kept as two digit strings.
    Money([String; 2]),
    Images(Vec<String>),
    Hyperlink(String),
}

impl FieldValue {
    /// Whether this value is acceptable for a field of `kind`.
    pub fn matches_kind(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (
                FieldValue::Text(_),
                FieldKind::Text | FieldKind::MineralName | FieldKind::MineralFormula
            ) | (FieldValue::Money(_), FieldKind::MoneyUsd)
                | (FieldValue::Images(_), FieldKind::EntryImages | FieldKind::Images)
                | (FieldValue::Hyperlink(_), FieldKind::Hyperlink)
        )
    }
}

/// RGB triple for template font colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
}

/// Where a template anchors its extra-image strip relative to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePlacement {
    Above,
    Under,
    Left,
    Right,
}

/// Root record for one project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseData {
    pub name: String,
    pub description: String,
    /// Whether entry pages open in edit mode by default.
    pub default_edit_mode: bool,
}

/// A named set of entries conforming to one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionData {
    pub name: String,
    pub description: String,
    /// The template every entry of this collection conforms to.
    pub template: ItemId,
}

/// A named, possibly overlapping subset of a collection's entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingData {
    pub name: String,
    pub collection: ItemId,
    /// Marks the protected "all" grouping created with its collection.
    pub auto_generated: bool,
}

/// One specimen record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    pub name: String,
    pub collection: ItemId,
}

/// Membership edge between a grouping and an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingEntryRefData {
    pub grouping: ItemId,
    pub entry: ItemId,
}

/// Field layout and page styling shared by all entries of bound collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateData {
    pub name: String,
    /// Whether the page layout uses a second field column.
    pub two_columns: bool,
    pub center_images: bool,
    /// Number of extra image slots, capped at 100 by the lifecycle service.
    pub extra_image_count: u8,
    pub extra_image_pos: ImagePlacement,
    pub font_family: String,
    pub header_color: Rgb,
    pub content_color: Rgb,
}

/// One of a template's one or two field columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateColumnData {
    pub template: ItemId,
    /// The "first column" is a flag, not a position: queries surface the
    /// flagged column first regardless of insertion order.
    pub is_first_column: bool,
}

/// One field definition within a template column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFieldData {
    pub name: String,
    pub column: ItemId,
    /// Serialized as `field_kind`: the flattened item envelope already uses
    /// `kind` as the `ItemBody` tag.
    #[serde(rename = "field_kind")]
    pub kind: FieldKind,
    /// Dense position within the owning column, `0..n`.
    pub column_order: u32,
    pub is_visible: bool,
    pub is_title_visible: bool,
    /// Title to the left of the value instead of above it.
    pub is_title_inline: bool,
}

/// One entry's value for one template field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFieldData {
    pub entry: ItemId,
    pub template_field: ItemId,
    pub value: FieldValue,
}

/// Tagged per-kind payload; the typed replacement for an attribute bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemBody {
    Database(DatabaseData),
    Collection(CollectionData),
    Grouping(GroupingData),
    Entry(EntryData),
    GroupingEntryRef(GroupingEntryRefData),
    Template(TemplateData),
    TemplateColumn(TemplateColumnData),
    TemplateField(TemplateFieldData),
    EntryField(EntryFieldData),
}

impl ItemBody {
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Database(_) => ItemKind::Database,
            Self::Collection(_) => ItemKind::Collection,
            Self::Grouping(_) => ItemKind::Grouping,
            Self::Entry(_) => ItemKind::Entry,
            Self::GroupingEntryRef(_) => ItemKind::GroupingEntryRef,
            Self::Template(_) => ItemKind::Template,
            Self::TemplateColumn(_) => ItemKind::TemplateColumn,
            Self::TemplateField(_) => ItemKind::TemplateField,
            Self::EntryField(_) => ItemKind::EntryField,
        }
    }

    /// User-facing name, for kinds that carry one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Database(data) => Some(&data.name),
            Self::Collection(data) => Some(&data.name),
            Self::Grouping(data) => Some(&data.name),
            Self::Entry(data) => Some(&data.name),
            Self::Template(data) => Some(&data.name),
            Self::TemplateField(data) => Some(&data.name),
            Self::GroupingEntryRef(_) | Self::TemplateColumn(_) | Self::EntryField(_) => None,
        }
    }

    pub fn as_database(&self) -> Option<&DatabaseData> {
        match self {
            Self::Database(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionData> {
        match self {
            Self::Collection(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_grouping(&self) -> Option<&GroupingData> {
        match self {
            Self::Grouping(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&EntryData> {
        match self {
            Self::Entry(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_grouping_entry_ref(&self) -> Option<&GroupingEntryRefData> {
        match self {
            Self::GroupingEntryRef(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_template(&self) -> Option<&TemplateData> {
        match self {
            Self::Template(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_template_column(&self) -> Option<&TemplateColumnData> {
        match self {
            Self::TemplateColumn(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_template_field(&self) -> Option<&TemplateFieldData> {
        match self {
            Self::TemplateField(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_entry_field(&self) -> Option<&EntryFieldData> {
        match self {
            Self::EntryField(data) => Some(data),
            _ => None,
        }
    }
}

/// One stored catalog item: stable id plus typed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(flatten)]
    pub body: ItemBody,
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        self.body.kind()
    }
}
