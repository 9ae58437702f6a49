#![forbid(unsafe_code)]

//! Wire model of the overlay backend.
//!
//! Field names follow the backend's snake_case JSON. Optional fields
//! tolerate being absent or `null`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome of one battery (flight attempt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    Validated,
    Invalidated,
    Pending,
    NotFlown,
}

impl FlightStatus {
    pub const ALL: [Self; 4] = [
        Self::Validated,
        Self::Invalidated,
        Self::Pending,
        Self::NotFlown,
    ];

    /// Wire name, also used as the CSS class of a rendered result.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validated => "validated",
            Self::Invalidated => "invalidated",
            Self::Pending => "pending",
            Self::NotFlown => "not_flown",
        }
    }

    /// Label shown on the overlay.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Validated => "Validado",
            Self::Invalidated => "Invalidado",
            Self::Pending => "Em andamento",
            Self::NotFlown => "Não voado",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!("unknown flight status `{s}` (expected validated, invalidated, pending or not_flown)")
            })
    }
}

/// One recorded flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightResult {
    pub battery_number: u32,
    pub status: FlightStatus,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FlightResult {
    #[must_use]
    pub fn new(battery_number: u32, status: FlightStatus) -> Self {
        Self {
            battery_number,
            status,
            score: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A competing team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub university: String,
    #[serde(default)]
    pub aircraft_photo_url: Option<String>,
    pub current_battery: u32,
    #[serde(default)]
    pub flight_results: Vec<FlightResult>,
}

/// Partial team update. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft_photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_battery: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_results: Option<Vec<FlightResult>>,
}

impl TeamPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply present fields to `team`.
    pub fn apply(&self, team: &mut Team) {
        if let Some(name) = &self.name {
            team.name.clone_from(name);
        }
        if let Some(university) = &self.university {
            team.university.clone_from(university);
        }
        if let Some(url) = &self.aircraft_photo_url {
            team.aircraft_photo_url = Some(url.clone());
        }
        if let Some(battery) = self.current_battery {
            team.current_battery = battery;
        }
        if let Some(results) = &self.flight_results {
            team.flight_results.clone_from(results);
        }
    }
}

const fn default_true() -> bool {
    true
}

/// Overlay state as fetched from (and pushed to) the backend.
///
/// `GET /overlay/state` embeds the active team instead of naming it, so
/// [`OverlayState::active_team_id`] and [`OverlayState::results`] fall back
/// to the embedded team when the explicit fields are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayState {
    #[serde(default)]
    pub visible: bool,
    #[serde(default, alias = "activeTeamId")]
    pub current_team_id: Option<String>,
    #[serde(default = "default_true")]
    pub show_team_info: bool,
    #[serde(default = "default_true")]
    pub show_flight_results: bool,
    #[serde(default = "default_true")]
    pub show_current_battery: bool,
    #[serde(default)]
    pub custom_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_results: Option<Vec<FlightResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            visible: false,
            current_team_id: None,
            show_team_info: true,
            show_flight_results: true,
            show_current_battery: true,
            custom_message: None,
            flight_results: None,
            team: None,
        }
    }
}

impl OverlayState {
    /// The team the overlay is focused on.
    #[must_use]
    pub fn active_team_id(&self) -> Option<&str> {
        self.current_team_id
            .as_deref()
            .or_else(|| self.team.as_ref().map(|t| t.id.as_str()))
    }

    /// Results to display: explicit list first, else the active team's.
    #[must_use]
    pub fn results(&self) -> Option<&[FlightResult]> {
        self.flight_results
            .as_deref()
            .or_else(|| self.team.as_ref().map(|t| t.flight_results.as_slice()))
    }
}

/// Reply of `POST /teams/{id}/results`: the updated team, or the stored
/// result when the backend echoes only that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlightResultReply {
    Team(Team),
    Result(FlightResult),
}

impl FlightResultReply {
    /// The team, when the backend returned one.
    #[must_use]
    pub fn team(&self) -> Option<&Team> {
        match self {
            Self::Team(team) => Some(team),
            Self::Result(_) => None,
        }
    }
}
