//! Object identity and hashing for git-evtag.
//!
//! Two families of hashes live here. [`ObjectId`] is the store's native
//! identifier (SHA-1 or SHA-256), used only as a lookup key. [`StrongHasher`]
//! computes the independent digest layered over the same content.

mod algorithm;
mod error;
pub mod hasher;
pub mod hex;
mod oid;

pub use algorithm::{DigestAlgorithm, HashAlgorithm};
pub use error::HashError;
pub use hasher::{NativeHasher, StrongHasher};
pub use oid::ObjectId;
