//! Waldo Hunt core crate.
//!
//! Single-player "spot the hidden figure" click game. The page shows a
//! challenge image; the player clicks where they think the figure hides and a
//! server-timed session records how long the find took. Gameplay logic
//! (coordinate normalization, hit testing, session lifecycle, orchestration)
//! is plain Rust and host-testable; the browser shell in `app` is the only
//! wasm-facing layer.

use wasm_bindgen::prelude::*;

pub mod challenge;
pub mod geometry;
pub mod hit;
pub mod remote;
mod report;
pub mod session;

mod app;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Launches the game against the default local backend.
#[wasm_bindgen]
pub fn start_challenge() -> Result<(), JsValue> {
    app::start(app::DEFAULT_CHALLENGE_URL, app::DEFAULT_API_BASE)
}

/// Launches the game against a specific challenge endpoint and API base
/// (deployment-specific session routes hang off the base).
#[wasm_bindgen]
pub fn start_challenge_at(challenge_url: &str, api_base: &str) -> Result<(), JsValue> {
    app::start(challenge_url, api_base)
}
