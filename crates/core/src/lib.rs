//! Core domain logic for the annuaire business-directory backend.
//!
//! This crate has zero database dependencies. It owns the domain model, the
//! [`store::DirectoryStore`] persistence boundary, the partial-update
//! pipeline ([`update::apply_update`]), the child-collection reconcilers,
//! the change auditor and the external view projection. The PostgreSQL
//! store implementation lives in `annuaire-db`; the HTTP surface in
//! `annuaire-api`.

pub mod audit;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod types;
pub mod update;
pub mod view;
