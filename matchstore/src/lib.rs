//! # matchstore - document store for tournament data
//!
//! matchstore gives an application one document-database API and two
//! interchangeable backends behind it:
//!
//! - **Remote**: a Firestore-compatible database reached over REST
//! - **Local**: one JSON file per collection under a data directory, with
//!   typed timestamps, atomic rewrites, backups and restore
//!
//! The backend is picked once at start-up. The remote backend is used when it
//! is enabled and its credentials are usable; otherwise the local backend
//! takes over and the application keeps running.
//!
//! ## Quick Start
//!
//! ```rust
//! use matchstore::{doc, StoreBuilder};
//! use matchstore::common::SortOrder;
//! use matchstore::query::field;
//!
//! # fn main() -> matchstore::errors::StoreResult<()> {
//! # let dir = tempfile::tempdir().unwrap();
//! let context = StoreBuilder::new().data_dir(dir.path()).open()?;
//! let store = context.store()?;
//!
//! let scores = store.collection("matchResults");
//! scores.doc("m1").set(doc! { team: "red", points: 3 })?;
//! scores.doc("m2").set(doc! { team: "blue", points: 7 })?;
//!
//! let winners = scores
//!     .with(field("points").gte(5))
//!     .order_by("points", SortOrder::Descending)
//!     .get()?;
//! assert_eq!(winners.ids(), vec!["m2"]);
//!
//! let mut batch = store.batch();
//! batch.update(&scores.doc("m1"), doc! { points: 4 });
//! batch.delete(&scores.doc("m2"));
//! batch.commit()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`builder`] - Fluent builder for a store context
//! - [`codec`] - JSON encoding of values with tagged timestamps
//! - [`common`] - Values, documents, sort order, constants and utilities
//! - [`config`] - Store configuration and environment loading
//! - [`errors`] - Error types and result definitions
//! - [`query`] - Field filters and queries
//! - [`selector`] - One-time backend selection
//! - [`store`] - Store contract, handles, batches and both backends

pub mod builder;
pub mod codec;
pub mod common;
pub mod config;
pub mod errors;
pub mod query;
pub mod selector;
pub mod store;

pub use builder::StoreBuilder;
pub use common::{Document, SortOrder, Value};
pub use config::{RemoteConfig, RuntimeMode, StoreConfig};
pub use errors::{ErrorKind, StoreError, StoreResult};
pub use selector::StoreContext;
pub use store::{DocumentStore, StoreKind};
