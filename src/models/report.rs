//! Report models owned by the remote report service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Authoritative periodic-activity report.
///
/// Never persisted locally; values live for the duration of one request.
/// `status` is kept as the remote sends it ("A"/"I") so an unexpected value
/// from upstream cannot break a whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub id: Option<i32>,
    pub year: i32,
    #[serde(default)]
    pub trimester: String,
    /// Link to the rich-text (HTML) description document.
    #[serde(default)]
    pub description_url: Option<String>,
    #[serde(default)]
    pub schedule_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Report {
    /// Case-insensitive status match; an absent filter always matches.
    pub fn matches_status(&self, filter: Option<&str>) -> bool {
        match filter {
            None => true,
            Some(wanted) => self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(wanted)),
        }
    }

    /// Case-insensitive trimester match; an absent filter always matches.
    pub fn matches_trimester(&self, filter: Option<&str>) -> bool {
        filter.is_none_or(|wanted| self.trimester.eq_ignore_ascii_case(wanted))
    }

    /// Exact year match; an absent filter always matches.
    pub fn matches_year(&self, filter: Option<i32>) -> bool {
        filter.is_none_or(|wanted| self.year == wanted)
    }
}

/// Position of a trimester label in the calendar year.
///
/// Unknown labels sort after every known trimester.
pub fn trimester_rank(trimester: &str) -> u8 {
    match trimester.to_lowercase().as_str() {
        "enero-marzo" => 1,
        "abril-junio" => 2,
        "julio-septiembre" => 3,
        "octubre-diciembre" => 4,
        _ => 5,
    }
}
