//! Data models for the wedding invitation backend.
//!
//! Field names serialize in camelCase to match the invitation and admin frontends.

mod guest;
mod invitation;
mod rsvp;
mod stats;
mod wedding;

pub use guest::*;
pub use invitation::*;
pub use rsvp::*;
pub use stats::*;
pub use wedding::*;

use serde::{Deserialize, Serialize};

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
