//! Remote collaborator: transport abstraction plus the challenge data source.
//!
//! The game talks to the backend through the `Transport` trait so all of the
//! request/response logic stays pure and host-testable; the browser `fetch`
//! implementation lives in the shell (`app`). Completion is delivered through
//! a one-shot callback, matching the browser's single-threaded event loop.

use serde::Deserialize;
use std::fmt;

use crate::geometry::Rect;

// --- Wire-level request / response -------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors the transport can hand back before a response exists (network
/// unreachable, CORS rejection) are plain strings; everything after a response
/// arrived is classified by the caller.
pub type TransportResult = Result<HttpResponse, String>;

/// Injectable network collaborator. One `send` per logical request, no retry,
/// no caching; the callback fires exactly once when the exchange settles.
pub trait Transport {
    fn send(&self, req: HttpRequest, done: Box<dyn FnOnce(TransportResult)>);
}

// --- Error taxonomy -----------------------------------------------------------

/// Failure of a remote exchange, after local classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteError {
    /// A response arrived but was unusable: non-2xx status, or a 2xx body that
    /// did not parse. `message` is the server's own `message` field when the
    /// error body was parseable, else a generic fallback.
    Status { code: u16, message: String },
    /// The exchange failed before any response was received.
    Transport(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Status { message, .. } => write!(f, "{message}"),
            RemoteError::Transport(msg) => write!(f, "Fetching data failed: {msg}"),
        }
    }
}

/// Error bodies, when the server sends one, look like `{"message": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Best-effort extraction of a server-provided error message.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => format!("HTTP error status {status}"),
    }
}

// --- Challenge data source ----------------------------------------------------

/// Challenge payload: image reference plus the target region, straight off the
/// wire. The region is not validated here; the hit tester gates it at point of
/// use so a malformed challenge degrades to misses instead of a crash.
#[derive(Clone, Debug, PartialEq)]
pub struct ChallengeData {
    pub image_url: String,
    pub target: Rect,
}

#[derive(Debug, Deserialize)]
struct ChallengeEnvelope {
    data: ChallengeBody,
}

// The region bounds are deliberately lenient (missing or null parses through
// as NaN): geometric validation belongs to the hit tester at point of use, so
// a malformed challenge degrades to misses instead of a failed fetch.
#[derive(Debug, Deserialize)]
struct ChallengeBody {
    url: String,
    #[serde(default)]
    waldo_top: Option<f64>,
    #[serde(default)]
    waldo_left: Option<f64>,
    #[serde(default)]
    waldo_right: Option<f64>,
    #[serde(default)]
    waldo_bottom: Option<f64>,
}

/// Classifies a settled challenge fetch into `ChallengeData` or `RemoteError`.
pub fn parse_challenge_response(result: TransportResult) -> Result<ChallengeData, RemoteError> {
    let resp = result.map_err(RemoteError::Transport)?;
    if !resp.is_success() {
        return Err(RemoteError::Status {
            code: resp.status,
            message: error_message(resp.status, &resp.body),
        });
    }
    let envelope: ChallengeEnvelope =
        serde_json::from_str(&resp.body).map_err(|e| RemoteError::Status {
            code: resp.status,
            message: e.to_string(),
        })?;
    let body = envelope.data;
    Ok(ChallengeData {
        image_url: body.url,
        target: Rect {
            top: body.waldo_top.unwrap_or(f64::NAN),
            left: body.waldo_left.unwrap_or(f64::NAN),
            right: body.waldo_right.unwrap_or(f64::NAN),
            bottom: body.waldo_bottom.unwrap_or(f64::NAN),
        },
    })
}

/// Single-attempt challenge fetch. `done` receives the classified outcome.
pub fn load_challenge(
    transport: &dyn Transport,
    url: &str,
    done: Box<dyn FnOnce(Result<ChallengeData, RemoteError>)>,
) {
    let req = HttpRequest {
        method: Method::Get,
        url: url.to_string(),
    };
    transport.send(req, Box::new(move |result| done(parse_challenge_response(result))));
}
