//! Mirror store providers.

pub mod local;

pub use local::LocalMirrorStore;
