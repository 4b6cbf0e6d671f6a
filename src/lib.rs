pub mod config;
pub mod core;
pub mod storage;

pub use crate::core::{validate, KnownKind, PartitioningDescriptor, ValidationError};
pub use crate::storage::{decode, encode, CodecError, HandoffStore};
