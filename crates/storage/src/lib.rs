//! Object storage for published extraction artifacts (S3 compatible).

pub mod object_store;

pub use self::object_store::{ObjectStorage, ObjectStorageConfig};
