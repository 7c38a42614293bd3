//! # Repository Module
//!
//! The Durable Store contract consumed by the pipeline, expressed as
//! narrow DAO-style traits, plus the in-memory implementations the crate
//! ships with. Keys are canonical: a request is looked up by its plain id
//! and a transaction by its plain hash, with no historical multi-format
//! fallback.

mod request_repository;
pub use request_repository::*;

mod transaction_repository;
pub use transaction_repository::*;

mod audit_repository;
pub use audit_repository::*;
