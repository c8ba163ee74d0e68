// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

//! Action forwarders: one thin wrapper per worker-side action.
//!
//! Every method here is a one-line forwarder that picks an action name and
//! an args shape and calls the generic [`Client::send`] primitive. The full
//! worker catalog is far larger than this; anything not wrapped yet can be
//! reached through `send` directly.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use iso_protocol::{Args, SOLVE_CAPTCHA_TIMEOUT, TaskResult};
use iso_runtime::{Error, Result};
use serde_json::{Value, json};

use crate::client::Client;

fn obj(value: Value) -> Args {
    match value {
        Value::Object(map) => map,
        _ => Args::new(),
    }
}

impl Client {
    // --- Navigation ---

    /// Navigates the browser to `url`.
    pub async fn open_url(&mut self, url: &str) -> Result<TaskResult> {
        self.send("open_url", obj(json!({ "url": url }))).await
    }

    /// Reloads the current page.
    pub async fn reload(&mut self) -> Result<TaskResult> {
        self.send("reload", Args::new()).await
    }

    /// Navigates back in history.
    pub async fn go_back(&mut self) -> Result<TaskResult> {
        self.send("go_back", Args::new()).await
    }

    /// Navigates forward in history.
    pub async fn go_forward(&mut self) -> Result<TaskResult> {
        self.send("go_forward", Args::new()).await
    }

    // --- Interaction ---

    /// Clicks the first element matching `selector`.
    pub async fn click(&mut self, selector: &str) -> Result<TaskResult> {
        self.send("click", obj(json!({ "selector": selector }))).await
    }

    /// Clicks the first link whose text matches `text`.
    pub async fn click_link(&mut self, text: &str) -> Result<TaskResult> {
        self.send("click_link", obj(json!({ "text": text }))).await
    }

    /// Types `text` into the element matching `selector`, clearing it
    /// first.
    pub async fn type_text(&mut self, selector: &str, text: &str) -> Result<TaskResult> {
        self.send("type", obj(json!({ "selector": selector, "text": text })))
            .await
    }

    /// Sends keystrokes to the element matching `selector` without
    /// clearing.
    pub async fn send_keys(&mut self, selector: &str, text: &str) -> Result<TaskResult> {
        self.send("send_keys", obj(json!({ "selector": selector, "text": text })))
            .await
    }

    /// Clears the input matching `selector`.
    pub async fn clear(&mut self, selector: &str) -> Result<TaskResult> {
        self.send("clear", obj(json!({ "selector": selector }))).await
    }

    /// Submits the form containing `selector`.
    pub async fn submit(&mut self, selector: &str) -> Result<TaskResult> {
        self.send("submit", obj(json!({ "selector": selector }))).await
    }

    /// Focuses the element matching `selector`.
    pub async fn focus(&mut self, selector: &str) -> Result<TaskResult> {
        self.send("focus", obj(json!({ "selector": selector }))).await
    }

    /// Moves the pointer over the element matching `selector`.
    pub async fn hover(&mut self, selector: &str) -> Result<TaskResult> {
        self.send("gui_hover_element", obj(json!({ "selector": selector })))
            .await
    }

    /// Selects the option with the given value in a `<select>`.
    pub async fn select_option_by_value(
        &mut self,
        selector: &str,
        value: &str,
    ) -> Result<TaskResult> {
        self.send(
            "select_option_by_value",
            obj(json!({ "selector": selector, "value": value })),
        )
        .await
    }

    // --- Reading ---

    /// Fetches the page title (in the `value` field of the result).
    pub async fn get_title(&mut self) -> Result<TaskResult> {
        self.send("get_title", Args::new()).await
    }

    /// Fetches the current URL.
    pub async fn get_current_url(&mut self) -> Result<TaskResult> {
        self.send("get_current_url", Args::new()).await
    }

    /// Fetches the text content of the element matching `selector`.
    pub async fn get_text(&mut self, selector: &str) -> Result<TaskResult> {
        self.send("get_text", obj(json!({ "selector": selector }))).await
    }

    /// Fetches the outer HTML of the element matching `selector`.
    pub async fn get_html(&mut self, selector: &str) -> Result<TaskResult> {
        self.send("get_html", obj(json!({ "selector": selector }))).await
    }

    /// Fetches one attribute of the element matching `selector`.
    pub async fn get_attribute(&mut self, selector: &str, attribute: &str) -> Result<TaskResult> {
        self.send(
            "get_attribute",
            obj(json!({ "selector": selector, "attribute": attribute })),
        )
        .await
    }

    /// Fetches the full page source.
    pub async fn get_page_source(&mut self) -> Result<TaskResult> {
        self.send("get_page_source", Args::new()).await
    }

    /// Fetches all cookies visible to the page.
    pub async fn get_all_cookies(&mut self) -> Result<TaskResult> {
        self.send("get_all_cookies", Args::new()).await
    }

    /// Checks whether an element matching `selector` is visible.
    pub async fn is_element_visible(&mut self, selector: &str) -> Result<TaskResult> {
        self.send("is_element_visible", obj(json!({ "selector": selector })))
            .await
    }

    // --- Scripting ---

    /// Executes a script in the page context.
    pub async fn execute_script(&mut self, script: &str) -> Result<TaskResult> {
        self.send("execute_script", obj(json!({ "script": script }))).await
    }

    /// Evaluates an expression and returns its value.
    pub async fn evaluate(&mut self, expression: &str) -> Result<TaskResult> {
        self.send("evaluate", obj(json!({ "expression": expression })))
            .await
    }

    // --- Waiting & scrolling ---

    /// Waits up to `timeout_secs` for an element matching `selector` to
    /// become visible.
    pub async fn wait_for_element(&mut self, selector: &str, timeout_secs: u64) -> Result<TaskResult> {
        self.send(
            "wait_for_element",
            obj(json!({ "selector": selector, "timeout": timeout_secs })),
        )
        .await
    }

    /// Sleeps remotely for `seconds` (keeps the worker's action ordering).
    pub async fn sleep(&mut self, seconds: f64) -> Result<TaskResult> {
        self.send("sleep", obj(json!({ "seconds": seconds }))).await
    }

    /// Scrolls the element matching `selector` into view.
    pub async fn scroll_into_view(&mut self, selector: &str) -> Result<TaskResult> {
        self.send("scroll_into_view", obj(json!({ "selector": selector })))
            .await
    }

    /// Scrolls to the bottom of the page.
    pub async fn scroll_to_bottom(&mut self) -> Result<TaskResult> {
        self.send("scroll_to_bottom", Args::new()).await
    }

    // --- Tabs ---

    /// Opens `url` in a new tab and switches to it.
    pub async fn open_new_tab(&mut self, url: &str) -> Result<TaskResult> {
        self.send("open_new_tab", obj(json!({ "url": url }))).await
    }

    /// Switches to the tab at `index`.
    pub async fn switch_to_tab(&mut self, index: u32) -> Result<TaskResult> {
        self.send("switch_to_tab", obj(json!({ "index": index }))).await
    }

    // --- Captcha ---

    /// Asks the worker to solve the captcha on the current page. Regularly
    /// takes minutes, hence the extended timeout.
    pub async fn solve_captcha(&mut self) -> Result<TaskResult> {
        self.send_with_timeout("solve_captcha", Args::new(), SOLVE_CAPTCHA_TIMEOUT)
            .await
    }

    // --- Media ---

    /// Captures a screenshot of the page (or of `selector` when given) and
    /// returns the decoded PNG bytes. Writing them anywhere is the
    /// caller's business.
    pub async fn screenshot(&mut self, selector: Option<&str>) -> Result<Vec<u8>> {
        let mut args = Args::new();
        if let Some(selector) = selector {
            args.insert("selector".into(), json!(selector));
        }
        let result = self.send("save_screenshot", args).await?;
        decode_base64_field(&result, "image_base64", "save_screenshot")
    }

    /// Renders the page to PDF and returns the decoded bytes.
    pub async fn save_as_pdf(&mut self) -> Result<Vec<u8>> {
        let result = self.send("save_as_pdf", Args::new()).await?;
        decode_base64_field(&result, "pdf_base64", "save_as_pdf")
    }
}

fn decode_base64_field(result: &TaskResult, field: &str, action: &str) -> Result<Vec<u8>> {
    if !result.is_ok() {
        return Err(Error::Protocol(format!(
            "{action} failed: {}",
            result.error.as_deref().unwrap_or(&result.status)
        )));
    }
    let encoded = result.str_field(field).ok_or_else(|| {
        Error::Protocol(format!("{action} response missing '{field}'"))
    })?;
    BASE64
        .decode(encoded)
        .map_err(|err| Error::Protocol(format!("{action} returned invalid base64: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obj_flattens_json_objects() {
        let args = obj(json!({ "selector": "#btn", "timeout": 5 }));
        assert_eq!(args["selector"], json!("#btn"));
        assert_eq!(args["timeout"], json!(5));
    }

    #[test]
    fn decode_base64_field_happy_path() {
        let wire = format!(
            r#"{{"status":"ok","image_base64":"{}"}}"#,
            BASE64.encode(b"png-bytes")
        );
        let result: TaskResult = serde_json::from_str(&wire).unwrap();
        let bytes = decode_base64_field(&result, "image_base64", "save_screenshot").unwrap();
        assert_eq!(bytes, b"png-bytes");
    }

    #[test]
    fn decode_base64_field_surfaces_worker_failure() {
        let result: TaskResult =
            serde_json::from_str(r#"{"status":"fail","error":"no such element"}"#).unwrap();
        let err = decode_base64_field(&result, "image_base64", "save_screenshot").unwrap_err();
        assert!(matches!(err, Error::Protocol(message) if message.contains("no such element")));
    }

    #[test]
    fn decode_base64_field_rejects_missing_field() {
        let result: TaskResult = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        let err = decode_base64_field(&result, "pdf_base64", "save_as_pdf").unwrap_err();
        assert!(matches!(err, Error::Protocol(message) if message.contains("pdf_base64")));
    }
}
