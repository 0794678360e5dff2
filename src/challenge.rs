//! Challenge orchestration: the click -> feedback -> completion flow.
//!
//! Like the session machine this module is sans-IO. Every event handler in the
//! browser shell funnels into one of the methods here, and any network request
//! a transition demands is returned to the shell for dispatch. That keeps the
//! whole flow drivable from native tests with a fake transport.

use crate::geometry::{BoundingBox, PixelOffset, Point, normalize};
use crate::hit::is_hit;
use crate::remote::{ChallengeData, HttpRequest, RemoteError, TransportResult};
use crate::session::{SessionManager, SessionPhase};

/// Side length of the overlay box drawn around a click, in screen pixels.
pub const TARGET_BOX_SIZE: f64 = 50.0;

pub const FOUND_MESSAGE: &str = "You found Waldo";
pub const MISS_MESSAGE: &str = "That's not Waldo. Try again.";

/// `Loading -> Playing -> Completed`, or terminal `Failed` when the challenge
/// fetch errors. Hits and misses cycle inside `Playing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengePhase {
    Loading,
    Failed,
    Playing,
    Completed,
}

/// Overlay box pixel geometry, centred on the last click.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayBox {
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

/// Everything the view needs to render, nothing more.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub loading: bool,
    pub error: Option<String>,
    pub message: String,
    pub clicked_at: Option<PixelOffset>,
    pub overlay: Option<OverlayBox>,
    pub elapsed_seconds: Option<f64>,
    pub show_completion_form: bool,
    pub session_notice: Option<String>,
}

pub struct ChallengeController {
    phase: ChallengePhase,
    data: Option<ChallengeData>,
    error: Option<String>,
    message: String,
    clicked_at: Option<PixelOffset>,
    overlay: Option<OverlayBox>,
    session: SessionManager,
}

impl ChallengeController {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            phase: ChallengePhase::Loading,
            data: None,
            error: None,
            message: String::new(),
            clicked_at: None,
            overlay: None,
            session: SessionManager::new(api_base),
        }
    }

    pub fn phase(&self) -> ChallengePhase {
        self.phase
    }

    pub fn challenge(&self) -> Option<&ChallengeData> {
        self.data.as_ref()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Ingests the settled challenge fetch. A failure is terminal: the view
    /// shows the error and no further interaction is possible.
    pub fn data_loaded(&mut self, result: Result<ChallengeData, RemoteError>) {
        if self.phase != ChallengePhase::Loading {
            return;
        }
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.phase = ChallengePhase::Playing;
            }
            Err(err) => {
                self.error = Some(err.to_string());
                self.phase = ChallengePhase::Failed;
            }
        }
    }

    /// The challenge image finished loading in the page. Starts the server
    /// session; the session machine's own guard makes a duplicate load event
    /// harmless.
    pub fn image_loaded(&mut self) -> Option<HttpRequest> {
        if self.phase != ChallengePhase::Playing {
            return None;
        }
        self.session.begin_create()
    }

    pub fn session_created(&mut self, result: TransportResult) {
        self.session.complete_create(result);
    }

    /// Runs one click through normalize + hit test. Returns the finalize
    /// request on the first successful hit; any click outside `Playing`, and
    /// any hit after finalization started, is a no-op.
    pub fn handle_click(&mut self, pointer: Point, image_box: BoundingBox) -> Option<HttpRequest> {
        if self.phase != ChallengePhase::Playing {
            return None;
        }
        let target = self.data.as_ref()?.target;
        let (offset, point) = normalize(pointer, image_box);
        self.clicked_at = Some(offset);
        self.overlay = Some(OverlayBox {
            left: offset.x - TARGET_BOX_SIZE / 2.0,
            top: offset.y - TARGET_BOX_SIZE / 2.0,
            size: TARGET_BOX_SIZE,
        });
        if !is_hit(point, target) {
            self.message = MISS_MESSAGE.to_string();
            return None;
        }
        self.message = FOUND_MESSAGE.to_string();
        if let Some(req) = self.session.begin_finalize() {
            return Some(req);
        }
        // No finalize possible: either it is already in flight / done, or the
        // session never became active. Only the latter ends the game here,
        // without timing.
        if !matches!(
            self.session.phase(),
            SessionPhase::Finalizing | SessionPhase::Finalized
        ) {
            self.phase = ChallengePhase::Completed;
        }
        None
    }

    /// Ingests the settled finalize call. The hit already happened, so the
    /// game completes either way; a failure just suppresses the timing.
    pub fn finalize_completed(&mut self, result: TransportResult) {
        self.session.complete_finalize(result);
        if self.phase == ChallengePhase::Playing {
            self.phase = ChallengePhase::Completed;
        }
    }

    pub fn view(&self) -> ViewState {
        ViewState {
            loading: self.phase == ChallengePhase::Loading,
            error: self.error.clone(),
            message: self.message.clone(),
            clicked_at: self.clicked_at,
            overlay: self.overlay,
            elapsed_seconds: self.session.elapsed_seconds(),
            show_completion_form: self.phase == ChallengePhase::Completed
                && self.session.phase() == SessionPhase::Finalized,
            session_notice: self.session.notice().map(str::to_string),
        }
    }
}
