// Native tests driving the full click -> feedback -> completion flow.
// A counting fake transport stands in for the browser fetch layer, answering
// synchronously; the controller and session machine are exercised end to end.

use std::cell::RefCell;
use std::rc::Rc;

use waldo_hunt::challenge::{
    ChallengeController, ChallengePhase, FOUND_MESSAGE, MISS_MESSAGE, TARGET_BOX_SIZE,
};
use waldo_hunt::geometry::{BoundingBox, Point};
use waldo_hunt::remote::{
    self, HttpRequest, HttpResponse, Method, RemoteError, Transport, TransportResult,
};

const API: &str = "http://localhost:3000";
const CHALLENGE_URL: &str = "http://localhost:3000/challenge/1";

/// Answers every send with the same canned result and logs the requests.
struct FakeTransport {
    reply: TransportResult,
    sent: RefCell<Vec<HttpRequest>>,
}

impl FakeTransport {
    fn replying(reply: TransportResult) -> Self {
        Self { reply, sent: RefCell::new(Vec::new()) }
    }

    fn sent_count(&self) -> usize {
        self.sent.borrow().len()
    }
}

impl Transport for FakeTransport {
    fn send(&self, req: HttpRequest, done: Box<dyn FnOnce(TransportResult)>) {
        self.sent.borrow_mut().push(req);
        done(self.reply.clone());
    }
}

fn challenge_body() -> String {
    r#"{"data":{"url":"/img/beach.jpg","waldo_top":450,"waldo_left":400,"waldo_right":600,"waldo_bottom":550}}"#
        .to_string()
}

fn fetch_challenge(transport: &FakeTransport) -> Result<remote::ChallengeData, RemoteError> {
    let out = Rc::new(RefCell::new(None));
    let slot = out.clone();
    remote::load_challenge(
        transport,
        CHALLENGE_URL,
        Box::new(move |result| {
            *slot.borrow_mut() = Some(result);
        }),
    );
    out.borrow_mut().take().expect("fake transport answers synchronously")
}

/// Image box used throughout: clicks at (500, 350) normalize to (500, 500),
/// inside the challenge's target region.
const IMAGE_BOX: BoundingBox = BoundingBox { left: 100.0, top: 50.0, width: 800.0, height: 600.0 };
const HIT_CLICK: Point = Point { x: 500.0, y: 350.0 };
const MISS_CLICK: Point = Point { x: 150.0, y: 100.0 };

fn playing_controller() -> ChallengeController {
    let transport = FakeTransport::replying(Ok(HttpResponse { status: 200, body: challenge_body() }));
    let mut ctrl = ChallengeController::new(API);
    ctrl.data_loaded(fetch_challenge(&transport));
    assert_eq!(ctrl.phase(), ChallengePhase::Playing);
    ctrl
}

fn activate_session(ctrl: &mut ChallengeController) {
    let req = ctrl.image_loaded().expect("create request");
    assert_eq!(req.method, Method::Post);
    ctrl.session_created(Ok(HttpResponse {
        status: 200,
        body: r#"{"data":{"user":{"id":42,"startTime":1000.0}}}"#.to_string(),
    }));
}

#[test]
fn challenge_fetch_is_a_single_attempt() {
    let transport = FakeTransport::replying(Ok(HttpResponse { status: 200, body: challenge_body() }));
    let data = fetch_challenge(&transport).expect("challenge data");
    assert_eq!(data.image_url, "/img/beach.jpg");
    assert_eq!(data.target.top, 450.0);
    assert_eq!(data.target.bottom, 550.0);
    let sent = transport.sent.borrow();
    assert_eq!(sent.len(), 1, "no retry, no duplicate fetch");
    assert_eq!(sent[0].method, Method::Get);
    assert_eq!(sent[0].url, CHALLENGE_URL);
}

#[test]
fn http_error_becomes_terminal_failed_state_with_server_message() {
    let transport = FakeTransport::replying(Ok(HttpResponse {
        status: 500,
        body: r#"{"message":"challenge table is gone"}"#.to_string(),
    }));
    let mut ctrl = ChallengeController::new(API);
    ctrl.data_loaded(fetch_challenge(&transport));
    assert_eq!(ctrl.phase(), ChallengePhase::Failed);
    let view = ctrl.view();
    assert_eq!(view.error.as_deref(), Some("challenge table is gone"));
    assert_eq!(transport.sent_count(), 1, "failure is not retried");
    // Terminal: clicks are ignored.
    assert!(ctrl.handle_click(HIT_CLICK, IMAGE_BOX).is_none());
    assert!(ctrl.view().overlay.is_none());
}

#[test]
fn http_error_without_body_uses_generic_status_message() {
    let transport = FakeTransport::replying(Ok(HttpResponse { status: 404, body: String::new() }));
    let mut ctrl = ChallengeController::new(API);
    ctrl.data_loaded(fetch_challenge(&transport));
    assert_eq!(ctrl.view().error.as_deref(), Some("HTTP error status 404"));
}

#[test]
fn transport_failure_becomes_terminal_failed_state() {
    let transport = FakeTransport::replying(Err("connection refused".to_string()));
    let mut ctrl = ChallengeController::new(API);
    ctrl.data_loaded(fetch_challenge(&transport));
    assert_eq!(ctrl.phase(), ChallengePhase::Failed);
    let err = ctrl.view().error.expect("error message");
    assert!(err.contains("connection refused"), "got: {err}");
}

#[test]
fn malformed_challenge_body_fails_rather_than_playing_blind() {
    let transport = FakeTransport::replying(Ok(HttpResponse {
        status: 200,
        body: r#"{"data":{"url":42}}"#.to_string(),
    }));
    let mut ctrl = ChallengeController::new(API);
    ctrl.data_loaded(fetch_challenge(&transport));
    assert_eq!(ctrl.phase(), ChallengePhase::Failed);
}

#[test]
fn clicks_before_data_load_are_ignored() {
    let mut ctrl = ChallengeController::new(API);
    assert!(ctrl.view().loading);
    assert!(ctrl.handle_click(HIT_CLICK, IMAGE_BOX).is_none());
    assert!(ctrl.image_loaded().is_none(), "session cannot start while loading");
    assert_eq!(ctrl.view().message, "");
}

#[test]
fn session_creation_happens_once_per_visit() {
    let mut ctrl = playing_controller();
    assert!(ctrl.image_loaded().is_some());
    // Duplicate load events (cache revalidation, src reassignment) are no-ops.
    assert!(ctrl.image_loaded().is_none());
    assert!(ctrl.image_loaded().is_none());
}

#[test]
fn miss_keeps_the_game_interactive_with_feedback_and_overlay() {
    let mut ctrl = playing_controller();
    activate_session(&mut ctrl);

    assert!(ctrl.handle_click(MISS_CLICK, IMAGE_BOX).is_none());
    let view = ctrl.view();
    assert_eq!(view.message, MISS_MESSAGE);
    assert!(!view.show_completion_form);
    // Overlay is centred on the click, in image-relative pixels.
    let overlay = view.overlay.expect("overlay");
    assert_eq!(overlay.left, 50.0 - TARGET_BOX_SIZE / 2.0);
    assert_eq!(overlay.top, 50.0 - TARGET_BOX_SIZE / 2.0);
    assert_eq!(overlay.size, TARGET_BOX_SIZE);
    let at = view.clicked_at.expect("click offset");
    assert_eq!((at.x, at.y), (50.0, 50.0));
    assert_eq!(ctrl.phase(), ChallengePhase::Playing);
}

#[test]
fn first_hit_finalizes_and_completes_with_elapsed_time() {
    let mut ctrl = playing_controller();
    activate_session(&mut ctrl);

    let finalize = ctrl.handle_click(HIT_CLICK, IMAGE_BOX).expect("finalize request");
    assert_eq!(finalize.method, Method::Put);
    assert_eq!(finalize.url, format!("{API}/user/42"));
    assert_eq!(ctrl.view().message, FOUND_MESSAGE);

    ctrl.finalize_completed(Ok(HttpResponse {
        status: 200,
        body: r#"{"data":{"user":{"startTime":1000.0,"endTime":9870.0}}}"#.to_string(),
    }));
    assert_eq!(ctrl.phase(), ChallengePhase::Completed);
    let view = ctrl.view();
    assert_eq!(view.elapsed_seconds, Some(8.87));
    assert!(view.show_completion_form);
    assert!(view.session_notice.is_none());
}

#[test]
fn hits_after_finalization_are_no_ops() {
    let mut ctrl = playing_controller();
    activate_session(&mut ctrl);

    ctrl.handle_click(HIT_CLICK, IMAGE_BOX).expect("finalize request");
    // A frantic double-click while finalize is in flight: no second PUT.
    assert!(ctrl.handle_click(HIT_CLICK, IMAGE_BOX).is_none());

    ctrl.finalize_completed(Ok(HttpResponse {
        status: 200,
        body: r#"{"data":{"user":{"startTime":1000.0,"endTime":5000.0}}}"#.to_string(),
    }));
    assert_eq!(ctrl.view().elapsed_seconds, Some(4.0));

    // And after completion the game is terminal.
    assert!(ctrl.handle_click(HIT_CLICK, IMAGE_BOX).is_none());
    assert_eq!(ctrl.view().elapsed_seconds, Some(4.0));
}

#[test]
fn session_create_failure_leaves_the_game_playable_without_timing() {
    let mut ctrl = playing_controller();
    ctrl.image_loaded().expect("create request");
    ctrl.session_created(Ok(HttpResponse {
        status: 500,
        body: r#"{"message":"no session for you"}"#.to_string(),
    }));

    // Hit detection still works; the hit ends the game without a finalize call.
    assert!(ctrl.handle_click(MISS_CLICK, IMAGE_BOX).is_none());
    assert_eq!(ctrl.view().message, MISS_MESSAGE);
    assert!(ctrl.handle_click(HIT_CLICK, IMAGE_BOX).is_none());
    assert_eq!(ctrl.phase(), ChallengePhase::Completed);

    let view = ctrl.view();
    assert_eq!(view.message, FOUND_MESSAGE);
    assert!(view.elapsed_seconds.is_none());
    assert!(!view.show_completion_form, "no timing, no submission form");
    assert_eq!(view.session_notice.as_deref(), Some("no session for you"));
}

#[test]
fn finalize_failure_completes_without_a_submission_form() {
    let mut ctrl = playing_controller();
    activate_session(&mut ctrl);

    ctrl.handle_click(HIT_CLICK, IMAGE_BOX).expect("finalize request");
    ctrl.finalize_completed(Err("timeout".to_string()));

    assert_eq!(ctrl.phase(), ChallengePhase::Completed);
    let view = ctrl.view();
    assert!(view.elapsed_seconds.is_none());
    assert!(!view.show_completion_form);
    let notice = view.session_notice.expect("passive notice");
    assert!(notice.contains("timeout"), "got: {notice}");
}

#[test]
fn degenerate_image_box_turns_the_click_into_a_miss() {
    let mut ctrl = playing_controller();
    activate_session(&mut ctrl);

    // Zero-size box (image not laid out): normalized point is non-finite and
    // the validity gate treats the click as a miss instead of panicking.
    let collapsed = BoundingBox { left: 0.0, top: 0.0, width: 0.0, height: 0.0 };
    assert!(ctrl.handle_click(Point { x: 10.0, y: 10.0 }, collapsed).is_none());
    assert_eq!(ctrl.view().message, MISS_MESSAGE);
    assert_eq!(ctrl.phase(), ChallengePhase::Playing);
}

#[test]
fn invalid_target_region_from_server_degrades_to_misses() {
    let transport = FakeTransport::replying(Ok(HttpResponse {
        status: 200,
        body: r#"{"data":{"url":"/img/x.jpg","waldo_top":null,"waldo_left":400,"waldo_right":600,"waldo_bottom":550}}"#
            .to_string(),
    }));
    let mut ctrl = ChallengeController::new(API);
    ctrl.data_loaded(fetch_challenge(&transport));
    // Schema validation is deferred to the hit tester: the null bound parses
    // through as NaN and every click fails containment, no panic anywhere.
    assert_eq!(ctrl.phase(), ChallengePhase::Playing);
    assert_eq!(ctrl.challenge().expect("data").image_url, "/img/x.jpg");

    activate_session(&mut ctrl);
    assert!(ctrl.handle_click(HIT_CLICK, IMAGE_BOX).is_none());
    assert_eq!(ctrl.view().message, MISS_MESSAGE);
    assert_eq!(ctrl.phase(), ChallengePhase::Playing);
}
