//! Persistence backends for autoengage.
//!
//! - [`SqliteDedupStore`] records commented permalinks in SQLite.
//! - [`JsonCookieStore`] keeps session cookies in a JSON file.

mod cookies;
mod dedup;
mod schema;

pub use cookies::JsonCookieStore;
pub use dedup::SqliteDedupStore;
