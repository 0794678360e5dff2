//! Observability side-channel. Validation failures and other non-fatal
//! anomalies go here instead of the user-facing message line.

/// Report a non-fatal anomaly. Browser builds write to the devtools console;
/// host builds (native tests) fall back to stderr.
pub(crate) fn observe(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&wasm_bindgen::JsValue::from_str(msg));
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{msg}");
}
