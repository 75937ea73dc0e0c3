//! diaspora* integration crate: sub-modules.
//!
//! ## Architecture
//!
//! - `types`: session state, configuration, request/response models
//! - `error`: structured error with stable kind codes and context
//! - `patterns`: fixed registry of body-scraping patterns
//! - `api_client`: request executor and error reporter
//! - `auth`: init / login / logout / deinit state machine
//! - `posts`: status message creation and post/comment deletion
//! - `lists`: cached aspects and connected services
//! - `service`: caller-facing facade owning the session
//! - `commands`: thin `#[tauri::command]` wrappers

pub mod api_client;
pub mod auth;
pub mod commands;
pub mod error;
pub mod lists;
pub mod patterns;
pub mod posts;
pub mod service;
pub mod types;

// Re-export top-level items for convenience.
pub use commands::*;
pub use error::{DiasporaError, DiasporaErrorKind, DiasporaResult, ErrorContext};
pub use patterns::{extract_pattern, PatternKey};
pub use service::{DiasporaService, DiasporaServiceState};
pub use types::*;
