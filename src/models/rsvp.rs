//! RSVP response model.

use serde::{Deserialize, Serialize};

/// Attendance answer given on the RSVP form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
    Yes,
    No,
}

impl Attendance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attendance::Yes => "yes",
            Attendance::No => "no",
        }
    }

    /// Parse a stored value. Anything but `yes` counts as a decline, the
    /// same way the dashboard has always tallied responses.
    pub fn from_stored(s: &str) -> Self {
        if s.eq_ignore_ascii_case("yes") {
            Attendance::Yes
        } else {
            Attendance::No
        }
    }
}

/// A single RSVP response recorded under a guest's slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpResponse {
    pub id: String,
    pub guest_slug: String,
    pub name: String,
    pub will_attend: Attendance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: String,
}

/// Request body for submitting an RSVP.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRsvpRequest {
    pub name: String,
    pub will_attend: Attendance,
    #[serde(default)]
    pub comment: Option<String>,
}

impl SubmitRsvpRequest {
    /// The comment, with blank text treated as no comment.
    pub fn normalized_comment(&self) -> Option<String> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}
