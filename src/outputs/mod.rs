//! Output rendering for the digest and its web snapshot.
//!
//! # Submodules
//!
//! - [`message`]: plain-text digest sent through the notification service
//! - [`json`]: JSON snapshot of the selected articles
//! - [`html`]: rewrites the static page so it points at the latest snapshot
//!
//! Nothing here touches the network; [`crate::publish`] does the uploads.

pub mod html;
pub mod json;
pub mod message;
