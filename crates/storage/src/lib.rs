#![forbid(unsafe_code)]

pub mod http;
pub mod repository;

pub use http::{HttpInitError, HttpRepository};
pub use repository::{Storage, StorageError};
