//! Typed catalog model shared by store, queries and cascade services.
//!
//! # Responsibility
//! - Define the canonical item record and its per-kind payloads.
//! - Keep one flat, id-linked shape for every catalog object.
//!
//! # Invariants
//! - Every item is identified by a stable, never-reused `ItemId`.
//! - Structural relations are `ItemId` fields, never nested ownership.

pub mod item;
