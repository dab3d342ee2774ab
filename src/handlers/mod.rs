// handlers/mod.rs - HTTP handlers grouped by resource
//
// Handlers stay thin: extract the caller's ClientKey, path and body, hand off
// to AnnotationService, wrap the result in the success envelope. Rate limiting
// and authorization happen inside the service so every entry point gets them.

pub mod annotations;
pub mod bucket;
pub mod images;
pub mod messages;
pub mod public;
pub mod user;

use serde::Deserialize;

/// `?shareToken=` query accepted by every guest-readable endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareQuery {
    pub share_token: Option<String>,
}
