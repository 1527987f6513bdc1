//! Core traits defined in `keystock-core` and implemented by other crates.

pub mod mirror;

pub use mirror::MirrorStore;
