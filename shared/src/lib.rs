//! # Meridian Shared
//! Common functionality shared between the meridian world server and clients:
//! keyed storage, key generation, tick types, transform math, and the dynamic
//! value type used by element data bags.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bigmap;
mod key_generator;
mod math;
mod types;
mod value;

pub use bigmap::{BigMap, BigMapKey};
pub use key_generator::KeyGenerator;
pub use math::{resolve_attachment, Transform};
pub use types::Tick;
pub use value::{is_valid_data_key, Value, MAX_DATA_KEY_LEN};
