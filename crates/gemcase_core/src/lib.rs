//! Core domain logic for Gemcase, a mineral-specimen catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod backup;
pub mod codec;
pub mod logging;
pub mod model;
pub mod query;
pub mod service;
pub mod store;

pub use backup::{backup_path, list_backups, Autosave, DEFAULT_AUTOSAVE_INTERVAL};
pub use codec::{CodecError, CodecResult, PROJECT_EXTENSION};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{
    FieldKind, FieldValue, ImagePlacement, Item, ItemBody, ItemId, ItemKind, Rgb,
};
pub use query::{QueryError, QueryResult};
pub use service::{CascadeError, CascadeResult};
pub use store::{ChangeEvent, ItemStore, StoreError, StoreResult, SubscriptionId};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
