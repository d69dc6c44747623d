//! # AutoEngage Protocols
//!
//! Trait seams between the engagement engine and the things it drives or
//! consults. Contains only interface definitions and shared value types.
//!
//! ## Core Traits
//!
//! - [`Page`] / [`Browser`] - A rendered page and the context that opens more of them
//! - [`ContentGenerator`] - Structured text generation (comments, DMs, replies)
//! - [`DedupStore`] - Permalink-keyed record of previously commented posts
//! - [`CookieStore`] - Persisted session cookies
//! - [`CancellationSource`] - Polled "should this run stop" flag

pub mod cancel;
pub mod cookies;
pub mod error;
pub mod generator;
pub mod page;
pub mod store;

pub use cancel::{CancellationSource, NeverCancel};
pub use cookies::{Cookie, CookieStore};
pub use error::{CookieError, GenerationError, PageError, StoreError};
pub use generator::{
    comment_schema, CommentSuggestion, ContentGenerator, GenerationRequest, ImagePayload,
};
pub use page::{Browser, ElementSnapshot, Page, Viewport};
pub use store::{CommentedPostRecord, DedupStore};
