//! Repository implementations for KeyStock entities.

pub mod grant;
pub mod key;

pub use grant::GrantRepository;
pub use key::KeyRepository;
