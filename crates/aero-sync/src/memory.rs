//! In-memory overlay backend for tests and demos.
//!
//! Answers the same routes as the HTTP API with the same reply shapes:
//! bare resources for reads, `{"status": "success", ...}` envelopes for
//! writes and acknowledgements for the overlay show/hide/toggle commands.
//! Faults and latency can be injected, and every request is logged.
//!
//! Rejected commands leave the store untouched: `POST /overlay/show` with
//! an unknown `team_id` answers 404 without making the overlay visible.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use serde_json::{Value, json};

use crate::error::{BridgeError, Result};
use crate::model::{FlightResult, FlightStatus, OverlayState, Team, TeamPatch};
use crate::transport::{Method, Request, Response, Transport};

/// A failure injected into the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The request never completes.
    Network,
    /// The backend answers with this status.
    Status(u16),
}

#[derive(Debug, Default)]
struct Store {
    teams: Vec<Team>,
    overlay: OverlayState,
}

impl Store {
    fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    fn team_mut(&mut self, id: &str) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == id)
    }

    /// `GET /overlay/state` shape: the active team is embedded, not named.
    fn overlay_view(&self) -> Value {
        let team = self
            .overlay
            .current_team_id
            .as_deref()
            .and_then(|id| self.team(id));
        json!({
            "visible": self.overlay.visible,
            "show_team_info": self.overlay.show_team_info,
            "show_flight_results": self.overlay.show_flight_results,
            "show_current_battery": self.overlay.show_current_battery,
            "custom_message": self.overlay.custom_message,
            "team": team,
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: RefCell<Store>,
    faults: RefCell<VecDeque<Fault>>,
    delay: Cell<Duration>,
    log: RefCell<Vec<Request>>,
}

fn not_found() -> Response {
    Response {
        status: 404,
        body: json!({ "detail": "Team not found" }),
    }
}

fn unprocessable(message: impl std::fmt::Display) -> Response {
    Response {
        status: 422,
        body: json!({ "detail": message.to_string() }),
    }
}

fn team_envelope(team: &Team) -> Response {
    Response::ok(json!({ "status": "success", "team": team }))
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend seeded with the three demo teams.
    #[must_use]
    pub fn with_demo_teams() -> Self {
        let backend = Self::new();
        for team in demo_teams() {
            backend.insert_team(team);
        }
        backend
    }

    /// Insert or replace a team.
    pub fn insert_team(&self, team: Team) {
        let mut store = self.store.borrow_mut();
        match store.team_mut(&team.id) {
            Some(existing) => *existing = team,
            None => store.teams.push(team),
        }
    }

    #[must_use]
    pub fn team(&self, id: &str) -> Option<Team> {
        self.store.borrow().team(id).cloned()
    }

    /// Stored overlay state (with `current_team_id`, without the team).
    #[must_use]
    pub fn overlay(&self) -> OverlayState {
        self.store.borrow().overlay.clone()
    }

    pub fn set_overlay(&self, overlay: OverlayState) {
        self.store.borrow_mut().overlay = overlay;
    }

    /// Fail the next request (faults queue up in order).
    pub fn push_fault(&self, fault: Fault) {
        self.faults.borrow_mut().push_back(fault);
    }

    /// Latency applied to every request before it is answered.
    pub fn set_delay(&self, delay: Duration) {
        self.delay.set(delay);
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.log.borrow().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn clear_requests(&self) {
        self.log.borrow_mut().clear();
    }

    fn route(&self, request: &Request) -> Response {
        let segments: Vec<&str> = request.segments.iter().map(String::as_str).collect();
        let mut store = self.store.borrow_mut();
        match (request.method, segments.as_slice()) {
            (Method::Get, ["teams"]) => Response::ok(json!(store.teams)),
            (Method::Post, ["teams"]) => {
                let team: Team = match parse_body(request) {
                    Ok(team) => team,
                    Err(response) => return response,
                };
                if store.team(&team.id).is_some() {
                    return Response {
                        status: 400,
                        body: json!({ "detail": "Team already exists" }),
                    };
                }
                let response = team_envelope(&team);
                store.teams.push(team);
                response
            }
            (Method::Get, ["teams", id]) => match store.team(id) {
                Some(team) => Response::ok(json!(team)),
                None => not_found(),
            },
            (Method::Put, ["teams", id]) => {
                let patch: TeamPatch = match parse_body(request) {
                    Ok(patch) => patch,
                    Err(response) => return response,
                };
                match store.team_mut(id) {
                    Some(team) => {
                        patch.apply(team);
                        team_envelope(team)
                    }
                    None => not_found(),
                }
            }
            (Method::Put, ["teams", id, "battery"]) => {
                let Some(battery) = request
                    .query_param("battery_number")
                    .and_then(|raw| raw.parse::<u32>().ok())
                else {
                    return unprocessable("battery_number must be a non-negative integer");
                };
                match store.team_mut(id) {
                    Some(team) => {
                        team.current_battery = battery;
                        team_envelope(team)
                    }
                    None => not_found(),
                }
            }
            (Method::Post, ["teams", id, "results"]) => {
                let result: FlightResult = match parse_body(request) {
                    Ok(result) => result,
                    Err(response) => return response,
                };
                match store.team_mut(id) {
                    Some(team) => {
                        team.flight_results.push(result);
                        team_envelope(team)
                    }
                    None => not_found(),
                }
            }
            (Method::Get, ["overlay", "state"]) => Response::ok(store.overlay_view()),
            (Method::Put, ["overlay", "state"]) => {
                let mut overlay: OverlayState = match parse_body(request) {
                    Ok(overlay) => overlay,
                    Err(response) => return response,
                };
                overlay.team = None;
                overlay.flight_results = None;
                store.overlay = overlay;
                Response::ok(json!({ "status": "success", "state": store.overlay }))
            }
            (Method::Post, ["overlay", "show"]) => {
                let team_id = request.query_param("team_id").filter(|id| !id.is_empty());
                if let Some(id) = team_id {
                    if store.team(id).is_none() {
                        return not_found();
                    }
                    store.overlay.current_team_id = Some(id.to_string());
                }
                store.overlay.visible = true;
                Response::ok(json!({ "status": "success", "visible": true, "team_id": team_id }))
            }
            (Method::Post, ["overlay", "hide"]) => {
                store.overlay.visible = false;
                Response::ok(json!({ "status": "success", "visible": false }))
            }
            (Method::Post, ["overlay", "toggle"]) => {
                store.overlay.visible = !store.overlay.visible;
                Response::ok(json!({ "status": "success", "visible": store.overlay.visible }))
            }
            _ => Response {
                status: 404,
                body: json!({ "detail": "Not Found" }),
            },
        }
    }
}

fn parse_body<B: serde::de::DeserializeOwned>(request: &Request) -> std::result::Result<B, Response> {
    let body = request.body.clone().unwrap_or(Value::Null);
    serde_json::from_value(body).map_err(unprocessable)
}

impl Transport for MemoryBackend {
    async fn send(&self, request: Request) -> Result<Response> {
        self.log.borrow_mut().push(request.clone());
        let delay = self.delay.get();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let fault = self.faults.borrow_mut().pop_front();
        match fault {
            Some(Fault::Network) => Err(BridgeError::transport(
                request.operation,
                "connection refused",
            )),
            Some(Fault::Status(status)) => Ok(Response {
                status,
                body: json!({ "detail": "injected fault" }),
            }),
            None => Ok(self.route(&request)),
        }
    }
}

/// The three teams the backend starts with.
#[must_use]
pub fn demo_teams() -> Vec<Team> {
    use FlightStatus::{Invalidated, Pending, Validated};

    let result = |battery: u32, status: FlightStatus, score: Option<f64>, notes: &str| FlightResult {
        battery_number: battery,
        status,
        score,
        notes: Some(notes.to_string()),
    };
    vec![
        Team {
            id: "team001".into(),
            name: "AeroTech Racing".into(),
            university: "Universidade de São Paulo".into(),
            aircraft_photo_url: Some(
                "https://via.placeholder.com/300x200/0066cc/ffffff?text=AeroTech".into(),
            ),
            current_battery: 3,
            flight_results: vec![
                result(1, Validated, Some(8.5), "Excellent flight"),
                result(2, Validated, Some(9.2), "Perfect landing"),
                result(3, Pending, None, "Currently flying"),
            ],
        },
        Team {
            id: "team002".into(),
            name: "Sky Pioneers".into(),
            university: "Instituto Tecnológico de Aeronáutica".into(),
            aircraft_photo_url: Some(
                "https://via.placeholder.com/300x200/cc0000/ffffff?text=Sky+Pioneers".into(),
            ),
            current_battery: 2,
            flight_results: vec![
                result(1, Invalidated, None, "Crashed on takeoff"),
                result(2, Validated, Some(7.8), "Good recovery"),
            ],
        },
        Team {
            id: "team003".into(),
            name: "Falcon Engineering".into(),
            university: "Universidade Federal de Minas Gerais".into(),
            aircraft_photo_url: Some(
                "https://via.placeholder.com/300x200/00cc66/ffffff?text=Falcon".into(),
            ),
            current_battery: 4,
            flight_results: vec![
                result(1, Validated, Some(8.0), "Solid performance"),
                result(2, Validated, Some(8.3), "Improving"),
                result(3, Validated, Some(9.0), "Excellent"),
                result(4, Pending, None, "On track now"),
            ],
        },
    ]
}
