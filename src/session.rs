//! Server-timed session lifecycle.
//!
//! The session machine is sans-IO: `begin_*` hands back the request the shell
//! must dispatch (or `None` when the transition is not legal right now) and
//! `complete_*` ingests the settled result. All timing comes from server
//! timestamps, so a slow client cannot shorten its own score.

use serde::Deserialize;

use crate::remote::{HttpRequest, HttpResponse, Method, TransportResult, error_message};

// --- State machine ------------------------------------------------------------

/// `NoSession -> Creating -> Active -> Finalizing -> Finalized`, with error
/// branches that leave the game playable but suppress completion timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    NoSession,
    Creating,
    Active,
    Finalizing,
    Finalized,
    CreateFailed,
    FinalizeFailed,
}

/// A server-tracked timed attempt. Timestamps are epoch milliseconds as
/// recorded by the server.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub id: u64,
    pub started_at: f64,
    pub ended_at: Option<f64>,
    pub elapsed_seconds: Option<f64>,
}

pub struct SessionManager {
    api_base: String,
    phase: SessionPhase,
    session: Option<Session>,
    notice: Option<String>,
}

impl SessionManager {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            phase: SessionPhase::NoSession,
            session: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Completion time in seconds, two-decimal precision. Present only after a
    /// successful finalize.
    pub fn elapsed_seconds(&self) -> Option<f64> {
        self.session.as_ref().and_then(|s| s.elapsed_seconds)
    }

    /// Human-readable note for the error branches; never shown as a game
    /// message, only as a passive notice.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Requests session creation. Returns the `POST /user` to dispatch exactly
    /// once per page visit; any later call (double image-load event, hot
    /// reload) is a no-op.
    pub fn begin_create(&mut self) -> Option<HttpRequest> {
        if self.phase != SessionPhase::NoSession {
            return None;
        }
        self.phase = SessionPhase::Creating;
        Some(HttpRequest {
            method: Method::Post,
            url: format!("{}/user", self.api_base),
        })
    }

    pub fn complete_create(&mut self, result: TransportResult) {
        if self.phase != SessionPhase::Creating {
            return;
        }
        match parse_create_response(result) {
            Ok(created) => {
                self.session = Some(Session {
                    id: created.id,
                    started_at: created.start_time,
                    ended_at: None,
                    elapsed_seconds: None,
                });
                self.phase = SessionPhase::Active;
            }
            Err(msg) => {
                self.phase = SessionPhase::CreateFailed;
                self.notice = Some(msg);
            }
        }
    }

    /// Requests finalization after the first successful hit. Only legal from
    /// `Active`; the phase guard makes a second hit after completion a no-op.
    pub fn begin_finalize(&mut self) -> Option<HttpRequest> {
        if self.phase != SessionPhase::Active {
            return None;
        }
        let id = self.session.as_ref()?.id;
        self.phase = SessionPhase::Finalizing;
        Some(HttpRequest {
            method: Method::Put,
            url: format!("{}/user/{id}", self.api_base),
        })
    }

    pub fn complete_finalize(&mut self, result: TransportResult) {
        if self.phase != SessionPhase::Finalizing {
            return;
        }
        match parse_finalize_response(result) {
            Ok(stamps) => {
                if let Some(session) = self.session.as_mut() {
                    session.started_at = stamps.start_time;
                    session.ended_at = Some(stamps.end_time);
                    session.elapsed_seconds =
                        Some(elapsed_seconds(stamps.start_time, stamps.end_time));
                }
                self.phase = SessionPhase::Finalized;
            }
            Err(msg) => {
                self.phase = SessionPhase::FinalizeFailed;
                self.notice = Some(msg);
            }
        }
    }
}

/// `(end - start) / 1000`, rounded to two decimals. Server timestamps are in
/// milliseconds.
pub fn elapsed_seconds(start_ms: f64, end_ms: f64) -> f64 {
    ((end_ms - start_ms) / 1000.0 * 100.0).round() / 100.0
}

// --- Wire payloads ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UserEnvelope<T> {
    data: UserWrapper<T>,
}

#[derive(Debug, Deserialize)]
struct UserWrapper<T> {
    user: T,
}

#[derive(Debug, Deserialize)]
struct CreatedUser {
    id: u64,
    #[serde(rename = "startTime")]
    start_time: f64,
}

#[derive(Debug, Deserialize)]
struct FinalizedUser {
    #[serde(rename = "startTime")]
    start_time: f64,
    #[serde(rename = "endTime")]
    end_time: f64,
}

fn parse_create_response(result: TransportResult) -> Result<CreatedUser, String> {
    parse_user_response(result)
}

fn parse_finalize_response(result: TransportResult) -> Result<FinalizedUser, String> {
    parse_user_response(result)
}

fn parse_user_response<T: for<'de> Deserialize<'de>>(
    result: TransportResult,
) -> Result<T, String> {
    let resp: HttpResponse = result.map_err(|msg| format!("Session request failed: {msg}"))?;
    if !resp.is_success() {
        return Err(error_message(resp.status, &resp.body));
    }
    serde_json::from_str::<UserEnvelope<T>>(&resp.body)
        .map(|envelope| envelope.data.user)
        .map_err(|e| e.to_string())
}
