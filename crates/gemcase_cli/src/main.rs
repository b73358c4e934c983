//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `gemcase_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("gemcase_core version={}", gemcase_core::core_version());
}
