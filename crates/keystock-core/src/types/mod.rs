//! Shared value types: identifiers, pool keys, and key masking.

pub mod id;
pub mod mask;
pub mod pool;

pub use id::{KeyId, PrincipalId};
pub use mask::{display_key, mask_key};
pub use pool::PoolKey;
