//! Chrome page backend for autoengage.
//!
//! Drives Chrome/Chromium over the DevTools Protocol (CDP) and exposes each
//! tab as an [`autoengage_protocols::Page`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! let browser = CdpBrowser::launch(LaunchOptions::default()).await?;
//! let page = browser.open_page().await?;
//! page.goto("https://www.instagram.com/", Duration::from_secs(30)).await?;
//! ```
//!
//! With `launch = false` the backend attaches to a Chrome already started
//! with `--remote-debugging-port`.

mod client;
mod error;
mod launcher;
mod page;
mod protocol;
mod scripts;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use launcher::{CdpBrowser, LaunchOptions};
pub use page::CdpPage;
pub use protocol::*;
pub use session::PageSession;
