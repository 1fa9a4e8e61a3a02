//! Core types and trait definitions for the tender eligibility engine.
//!
//! This crate is free of HTTP and database dependencies. It holds the domain
//! model, the pure requirement classifier, the in-memory version-chain and
//! change-ledger types, and the [`store::TenderStore`] abstraction that
//! storage backends implement.

pub mod addendum;
pub mod classify;
pub mod criterion;
pub mod document;
pub mod error;
pub mod ledger;
pub mod store;
pub mod tender;
pub mod version;

pub use error::{ChainIntegrityError, Error, Result};
