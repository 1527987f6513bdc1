//! # keystock-storage
//!
//! Mirror store implementations for KeyStock. The mirror is a per-pool text
//! projection of unclaimed keys kept beside the authoritative database.

pub mod providers;

pub use providers::LocalMirrorStore;
