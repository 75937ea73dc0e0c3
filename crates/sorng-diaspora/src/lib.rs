//! # SortOfRemote NG – diaspora* Integration
//!
//! Session client for a diaspora* pod's server-rendered web interface:
//!
//! - **Session**: CSRF-token scraping and renewal, cookie-jar propagation
//! - **Sign-in**: init / login / logout / deinit state machine with a
//!   verification probe against a session-gated page
//! - **Posts**: status messages to public or to a set of aspects
//! - **Deletion**: posts and comments, with the pod's status-code quirks
//! - **Lookups**: cached aspects and connected services

pub mod diaspora;

pub use diaspora::*;
