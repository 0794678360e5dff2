//! Browser shell: DOM surface, event wiring and the `fetch`-backed transport.
//!
//! All game decisions live in `challenge`; this module only builds the page
//! elements, feeds browser events into the controller held in a thread-local,
//! dispatches whatever requests the controller hands back, and re-renders.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlImageElement, MouseEvent, Request, RequestInit, Response, window};

use crate::challenge::{ChallengeController, ViewState};
use crate::geometry::{BoundingBox, Point};
use crate::remote::{self, HttpRequest, HttpResponse, Transport, TransportResult};

/// Challenge endpoint baked into the original page; `start_challenge_at`
/// overrides it per deployment.
pub const DEFAULT_CHALLENGE_URL: &str = "http://localhost:3000/challenge/1";
pub const DEFAULT_API_BASE: &str = "http://localhost:3000";

thread_local! {
    static CONTROLLER: RefCell<Option<ChallengeController>> = RefCell::new(None);
}

// --- Fetch transport ----------------------------------------------------------

/// `Transport` over the browser's global `fetch`. Each send runs as its own
/// spawned task; completion re-enters the controller on the event loop, so no
/// two handlers ever overlap.
struct FetchTransport;

impl Transport for FetchTransport {
    fn send(&self, req: HttpRequest, done: Box<dyn FnOnce(TransportResult)>) {
        wasm_bindgen_futures::spawn_local(async move {
            done(perform_fetch(req).await);
        });
    }
}

async fn perform_fetch(req: HttpRequest) -> TransportResult {
    let win = window().ok_or_else(|| "no window".to_string())?;
    let init = RequestInit::new();
    init.set_method(req.method.as_str());
    let request = Request::new_with_str_and_init(&req.url, &init).map_err(js_message)?;
    let resp_value = wasm_bindgen_futures::JsFuture::from(win.fetch_with_request(&request))
        .await
        .map_err(js_message)?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| "fetch resolved to a non-Response value".to_string())?;
    let status = resp.status();
    let text_promise = resp.text().map_err(js_message)?;
    let text = wasm_bindgen_futures::JsFuture::from(text_promise)
        .await
        .map_err(js_message)?;
    Ok(HttpResponse {
        status,
        body: text.as_string().unwrap_or_default(),
    })
}

fn js_message(v: JsValue) -> String {
    v.as_string().unwrap_or_else(|| format!("{v:?}"))
}

// --- Session dispatch ---------------------------------------------------------

#[derive(Clone, Copy)]
enum SessionCall {
    Create,
    Finalize,
}

fn dispatch_session(req: HttpRequest, call: SessionCall) {
    FetchTransport.send(
        req,
        Box::new(move |result| {
            CONTROLLER.with(|cell| {
                if let Some(ctrl) = cell.borrow_mut().as_mut() {
                    match call {
                        SessionCall::Create => ctrl.session_created(result),
                        SessionCall::Finalize => ctrl.finalize_completed(result),
                    }
                }
            });
            render_current();
        }),
    );
}

// --- Page construction --------------------------------------------------------

pub fn start(challenge_url: &str, api_base: &str) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win.document().ok_or_else(|| JsValue::from_str("no document"))?;

    build_page(&doc)?;
    wire_image_events(&doc)?;

    CONTROLLER.with(|cell| cell.replace(Some(ChallengeController::new(api_base))));
    render_current();

    // Kick off the single challenge fetch; the controller settles into
    // Playing or terminal Failed when it resolves.
    remote::load_challenge(
        &FetchTransport,
        challenge_url,
        Box::new(|result| {
            CONTROLLER.with(|cell| {
                if let Some(ctrl) = cell.borrow_mut().as_mut() {
                    ctrl.data_loaded(result);
                    if let Some(data) = ctrl.challenge() {
                        set_image_source(&data.image_url);
                    }
                }
            });
            render_current();
        }),
    );
    Ok(())
}

fn build_page(doc: &Document) -> Result<(), JsValue> {
    // Reuse elements if the host page already carries them (hot reload).
    if doc.get_element_by_id("wh-root").is_some() {
        return Ok(());
    }
    let root = doc.create_element("div")?;
    root.set_id("wh-root");
    root.set_attribute("style", "font-family:'Fira Code', monospace; padding:12px;").ok();

    let heading = doc.create_element("h3")?;
    heading.set_text_content(Some("Find Waldo"));
    root.append_child(&heading)?;

    let clicked = doc.create_element("p")?;
    clicked.set_id("wh-clicked");
    clicked.set_text_content(Some("User clicked:"));
    root.append_child(&clicked)?;

    let message = doc.create_element("p")?;
    message.set_id("wh-message");
    root.append_child(&message)?;

    let notice = doc.create_element("p")?;
    notice.set_id("wh-notice");
    notice.set_attribute("style", "display:none; color:#b58900; font-size:13px;").ok();
    root.append_child(&notice)?;

    let container = doc.create_element("div")?;
    container.set_id("wh-img-container");
    container.set_attribute("style", "position:relative; display:inline-block;").ok();

    let img: HtmlImageElement = doc.create_element("img")?.dyn_into()?;
    img.set_id("wh-image");
    img.set_alt("Waldo image");
    img.set_attribute("style", "display:block; max-width:100%; cursor:crosshair;").ok();
    container.append_child(&img)?;

    let target_box = doc.create_element("div")?;
    target_box.set_id("wh-target-box");
    target_box
        .set_attribute(
            "style",
            "display:none; position:absolute; border:3px dashed #ff4d4d; border-radius:4px; pointer-events:none;",
        )
        .ok();
    container.append_child(&target_box)?;
    root.append_child(&container)?;

    let completion = doc.create_element("div")?;
    completion.set_id("wh-completion");
    completion.set_attribute("style", "display:none; margin-top:10px;").ok();
    let elapsed = doc.create_element("p")?;
    elapsed.set_id("wh-elapsed");
    completion.append_child(&elapsed)?;
    root.append_child(&completion)?;

    doc.body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .append_child(&root)?;
    Ok(())
}

fn wire_image_events(doc: &Document) -> Result<(), JsValue> {
    let img = image_element(doc).ok_or_else(|| JsValue::from_str("image element missing"))?;

    // Click: normalize against the current bounding box and run the hit test.
    {
        let img_click = img.clone();
        let closure = Closure::wrap(Box::new(move |evt: MouseEvent| {
            let rect = img_click.get_bounding_client_rect();
            let pointer = Point {
                x: evt.client_x() as f64,
                y: evt.client_y() as f64,
            };
            let image_box = BoundingBox {
                left: rect.left(),
                top: rect.top(),
                width: rect.width(),
                height: rect.height(),
            };
            let finalize = CONTROLLER.with(|cell| {
                cell.borrow_mut()
                    .as_mut()
                    .and_then(|ctrl| ctrl.handle_click(pointer, image_box))
            });
            if let Some(req) = finalize {
                dispatch_session(req, SessionCall::Finalize);
            }
            render_current();
        }) as Box<dyn FnMut(_)>);
        img.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Load: the session clock must not start before the image is on screen.
    {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            let create = CONTROLLER.with(|cell| {
                cell.borrow_mut().as_mut().and_then(|ctrl| ctrl.image_loaded())
            });
            if let Some(req) = create {
                dispatch_session(req, SessionCall::Create);
            }
        }) as Box<dyn FnMut(_)>);
        img.add_event_listener_with_callback("load", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

// --- Rendering ----------------------------------------------------------------

fn render_current() {
    let view = CONTROLLER.with(|cell| cell.borrow().as_ref().map(|ctrl| ctrl.view()));
    if let (Some(view), Some(doc)) = (view, window().and_then(|w| w.document())) {
        render(&doc, &view);
    }
}

fn render(doc: &Document, view: &ViewState) {
    if let Some(el) = doc.get_element_by_id("wh-message") {
        let text = if view.loading {
            "Loading challenge..."
        } else if let Some(err) = &view.error {
            err.as_str()
        } else {
            view.message.as_str()
        };
        el.set_text_content(Some(text));
    }
    if let Some(el) = doc.get_element_by_id("wh-clicked") {
        let text = match view.clicked_at {
            Some(at) => format!("User clicked: {:.0} {:.0}", at.x, at.y),
            None => "User clicked:".to_string(),
        };
        el.set_text_content(Some(&text));
    }
    if let Some(el) = doc.get_element_by_id("wh-target-box") {
        let style = match view.overlay {
            Some(overlay) => format!(
                "display:block; position:absolute; left:{}px; top:{}px; width:{}px; height:{}px; border:3px dashed #ff4d4d; border-radius:4px; pointer-events:none;",
                overlay.left, overlay.top, overlay.size, overlay.size
            ),
            None => "display:none;".to_string(),
        };
        el.set_attribute("style", &style).ok();
    }
    if let Some(el) = doc.get_element_by_id("wh-notice") {
        match &view.session_notice {
            Some(notice) => {
                el.set_text_content(Some(notice));
                el.set_attribute("style", "display:block; color:#b58900; font-size:13px;").ok();
            }
            None => {
                el.set_attribute("style", "display:none;").ok();
            }
        }
    }
    if let Some(el) = doc.get_element_by_id("wh-completion") {
        let display = if view.show_completion_form {
            "display:block; margin-top:10px;"
        } else {
            "display:none; margin-top:10px;"
        };
        el.set_attribute("style", display).ok();
    }
    if let (Some(el), Some(elapsed)) = (doc.get_element_by_id("wh-elapsed"), view.elapsed_seconds) {
        el.set_text_content(Some(&format!("Found in {elapsed:.2} s")));
    }
}

fn image_element(doc: &Document) -> Option<HtmlImageElement> {
    doc.get_element_by_id("wh-image")
        .and_then(|el| el.dyn_into::<HtmlImageElement>().ok())
}

fn set_image_source(url: &str) {
    if let Some(doc) = window().and_then(|w| w.document())
        && let Some(img) = image_element(&doc)
    {
        img.set_src(url);
    }
}
