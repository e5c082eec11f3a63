//! Attendance statistics shown on the admin dashboard.

use serde::Serialize;

use super::{Attendance, Guest, RsvpResponse};

/// Aggregate counters across every guest.
///
/// `attending` and `notAttending` count recorded responses, not guests: a
/// guest who answered twice contributes twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total_guests: usize,
    pub total_responses: usize,
    pub attending: usize,
    pub not_attending: usize,
    pub no_response: usize,
}

/// One dashboard row: a guest with the responses recorded under its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestSummary {
    #[serde(flatten)]
    pub guest: Guest,
    pub responses: Vec<RsvpResponse>,
    pub response_count: usize,
    pub attending: usize,
    pub not_attending: usize,
}

impl GuestSummary {
    pub fn new(guest: Guest, responses: Vec<RsvpResponse>) -> Self {
        let attending = responses
            .iter()
            .filter(|r| r.will_attend == Attendance::Yes)
            .count();
        let response_count = responses.len();

        Self {
            guest,
            responses,
            response_count,
            attending,
            not_attending: response_count - attending,
        }
    }

    pub fn has_responded(&self) -> bool {
        self.response_count > 0
    }
}

/// Stats plus per-guest rows, pushed to dashboard subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: AttendanceStats,
    pub guests: Vec<GuestSummary>,
}

impl Dashboard {
    pub fn new(guests: Vec<GuestSummary>) -> Self {
        Self {
            stats: AttendanceStats::aggregate(&guests),
            guests,
        }
    }
}

impl AttendanceStats {
    /// Tally every guest's responses.
    pub fn aggregate(guests: &[GuestSummary]) -> Self {
        let mut stats = AttendanceStats {
            total_guests: guests.len(),
            ..Default::default()
        };

        for summary in guests {
            if !summary.has_responded() {
                stats.no_response += 1;
                continue;
            }
            for response in &summary.responses {
                stats.total_responses += 1;
                match response.will_attend {
                    Attendance::Yes => stats.attending += 1,
                    Attendance::No => stats.not_attending += 1,
                }
            }
        }

        stats
    }
}
