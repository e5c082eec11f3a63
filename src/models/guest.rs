//! Guest model and slug derivation.

use serde::{Deserialize, Serialize};

/// An invited guest, keyed by the slug derived from their name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub slug: String,
    pub name: String,
    /// Family guests do not see the wedding gift section.
    #[serde(default)]
    pub is_family: bool,
    pub created_at: String,
}

impl Guest {
    /// Name shown in the RSVP form before the guest edits it.
    pub fn prefilled_name(&self) -> String {
        self.slug.replace('-', " ")
    }
}

/// Request body for adding a guest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuestRequest {
    pub name: String,
    #[serde(default)]
    pub is_family: bool,
}

/// Derive the URL slug for a guest name.
///
/// Leading and trailing whitespace is dropped, the name is lowercased and
/// every run of whitespace becomes a single `-`. The result never contains
/// whitespace, so applying it twice yields the same slug.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
