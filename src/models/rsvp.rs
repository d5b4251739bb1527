use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::store::{new_id, normalize_name};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attendance {
    #[default]
    #[serde(rename = "yes")]
    Yes,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "maybe")]
    Maybe,
}

impl Attendance {
    pub fn label(&self) -> &'static str {
        match self {
            Attendance::Yes => "Attending",
            Attendance::No => "Not attending",
            Attendance::Maybe => "Maybe",
        }
    }
}

impl std::fmt::Display for Attendance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attendance::Yes => write!(f, "yes"),
            Attendance::No => write!(f, "no"),
            Attendance::Maybe => write!(f, "maybe"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttendance(pub String);

impl FromStr for Attendance {
    type Err = UnknownAttendance;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Attendance::Yes),
            "no" => Ok(Attendance::No),
            "maybe" => Ok(Attendance::Maybe),
            other => Err(UnknownAttendance(other.to_string())),
        }
    }
}

/// A stored RSVP, in the same shape whichever backend produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsvpEntry {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
    pub guest_count: i64,
    pub attendance: Attendance,
    pub created_at: String,
    /// Only the remote backend tracks this.
    pub updated_at: Option<String>,
}

/// Write payload for an upsert. Missing fields get their defaults in
/// [`NewRsvp::into_entry`].
#[derive(Debug, Clone, Default)]
pub struct NewRsvp {
    pub id: Option<String>,
    pub name: String,
    pub guest_count: Option<i64>,
    pub attendance: Option<Attendance>,
    pub created_at: Option<String>,
}

impl NewRsvp {
    pub fn new(name: impl Into<String>, guest_count: i64, attendance: Attendance) -> Self {
        Self {
            name: name.into(),
            guest_count: Some(guest_count),
            attendance: Some(attendance),
            ..Self::default()
        }
    }

    pub fn into_entry(self) -> RsvpEntry {
        let name = self.name.trim().to_string();
        RsvpEntry {
            id: self.id.filter(|id| !id.is_empty()).unwrap_or_else(new_id),
            normalized_name: normalize_name(&name),
            name,
            guest_count: self.guest_count.filter(|n| *n >= 1).unwrap_or(1),
            attendance: self.attendance.unwrap_or_default(),
            created_at: self
                .created_at
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
            updated_at: None,
        }
    }
}
