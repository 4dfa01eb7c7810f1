//! # Reposcope Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! PostgreSQL database holding the mined repository data.
//!
//! ## Architectural Principles
//!
//! - **Adapter Layer:** This crate is an adapter that encapsulates all database-specific
//!   logic. It provides a clean, abstract API to the rest of the application, hiding
//!   the underlying SQL and database implementation details.
//! - **Swappable Store:** All data access goes through the `RepoStore` trait, so the
//!   web layer can be exercised against an in-memory stub without a live database.
//! - **Asynchronous & Pooled:** All operations are asynchronous, and it uses a
//!   connection pool (`PgPool`) for high-performance, concurrent database access.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `RepoStore`: The read-only data access trait the route handlers depend on.
//! - `DbRepository`: The Postgres-backed `RepoStore` implementation holding the
//!   connection pool and the per-query time budget.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::connect;
pub use error::DbError;
pub use repository::{
    DbRepository, GroupRepo, IssueActivity, IssueDateField, RepoByName, RepoCheckoutPath,
    RepoGroup, RepoGroupRef, RepoIssueCount, RepoName, RepoOverview, RepoStore, TimeWindow,
};
