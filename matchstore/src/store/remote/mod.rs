//! Remote backend.
//!
//! [RemoteStore] implements the store contract on top of a [RemoteClient];
//! [FirestoreRestClient] is the client used in production.

mod client;
mod credentials;
mod firestore;
mod store;
mod wire;

pub use client::RemoteClient;
pub use credentials::RemoteCredentials;
pub use firestore::FirestoreRestClient;
pub use store::RemoteStore;
