//! `PageHandle` over a chromiumoxide page: element lookup, input dispatch,
//! capture, and the event pumps that feed the core's console store and
//! response correlator.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::dom;
use chromiumoxide::cdp::browser_protocol::input::DispatchKeyEventParams;
use chromiumoxide::cdp::browser_protocol::input::DispatchKeyEventType;
use chromiumoxide::cdp::browser_protocol::input::DispatchMouseEventParams;
use chromiumoxide::cdp::browser_protocol::input::DispatchMouseEventType;
use chromiumoxide::cdp::browser_protocol::input::MouseButton;
use chromiumoxide::cdp::browser_protocol::log as cdp_log;
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::cdp::browser_protocol::page as cdp_page;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotParams;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime as cdp_runtime;
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use pagehand_core::CoreError;
use pagehand_core::Result;
use pagehand_core::config::WaitUntil;
use pagehand_core::console::LogKind;
use pagehand_core::correlator::pattern_matches;
use pagehand_core::driver::ElementState;
use pagehand_core::driver::PageEvent;
use pagehand_core::driver::PageHandle;
use pagehand_core::driver::PdfOptions;
use pagehand_core::driver::ScreenshotArea;
use pagehand_core::driver::Selection;
use pagehand_core::driver::Target;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio::time::sleep;
use tokio::time::timeout_at;
use tracing::trace;
use tracing::warn;
use uuid::Uuid;

use crate::cdp_err;
use crate::locator;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const EVENT_CHANNEL_CAPACITY: usize = 256;
/// Marker attribute used to hand a JS-located element over to CDP, which can
/// only address elements through selectors.
const TAG_ATTRIBUTE: &str = "data-pagehand-target";
/// There is no lifecycle event for "network idle" here; after the load event
/// a settle delay covers the straggler requests in practice.
const NETWORK_IDLE_SETTLE: Duration = Duration::from_millis(500);

pub struct CdpPage {
    page: Page,
    events: broadcast::Sender<PageEvent>,
}

impl CdpPage {
    pub(crate) fn new(page: Page) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        spawn_console_pump(&page, &events);
        spawn_exception_pump(&page, &events);
        spawn_response_pump(&page, &events);
        Self { page, events }
    }

    /// Resolves `target` to a live element handle, polling until it appears
    /// or the timeout lapses.
    async fn resolve(&self, target: &Target, timeout_ms: u64) -> Result<Element> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if let Some(element) = self.try_resolve(target).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(CoreError::ElementTimeout {
                    locator: target.to_string(),
                    timeout_ms,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn try_resolve(&self, target: &Target) -> Option<Element> {
        if let Target::Css(selector) = target {
            return self.page.find_element(selector.as_str()).await.ok();
        }
        // Non-CSS strategies locate the element in JS, tag it with a nonce
        // attribute, and re-find it by that attribute so CDP gets a real
        // node handle. The tag is removed again right after.
        let nonce = Uuid::new_v4().simple().to_string();
        let script = format!(
            r#"(() => {{
  const el = {expression};
  if (!el) return false;
  el.setAttribute("{TAG_ATTRIBUTE}", "{nonce}");
  return true;
}})()"#,
            expression = locator::lookup_expression(target, "document"),
        );
        let tagged = self.page.evaluate(script.as_str()).await.ok()?;
        if tagged.value().and_then(Value::as_bool) != Some(true) {
            return None;
        }
        let element = self
            .page
            .find_element(format!("[{TAG_ATTRIBUTE}=\"{nonce}\"]"))
            .await
            .ok()?;
        let cleanup = format!(
            "document.querySelector('[{TAG_ATTRIBUTE}=\"{nonce}\"]')?.removeAttribute(\"{TAG_ATTRIBUTE}\")"
        );
        let _ = self.page.evaluate(cleanup.as_str()).await;
        Some(element)
    }

    /// Runs `js_fn` (an arrow function receiving the element) against the
    /// first match for `target`, polling until the element exists.
    async fn eval_on(&self, target: &Target, timeout_ms: u64, js_fn: &str) -> Result<Value> {
        let script = format!(
            r#"(() => {{
  const el = {expression};
  if (!el) return {{ found: false }};
  return {{ found: true, value: ({js_fn})(el) }};
}})()"#,
            expression = locator::lookup_expression(target, "document"),
        );
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if let Ok(result) = self.page.evaluate(script.as_str()).await
                && let Some(outcome) = result.value()
                && outcome.get("found").and_then(Value::as_bool) == Some(true)
            {
                return Ok(outcome.get("value").cloned().unwrap_or(Value::Null));
            }
            if Instant::now() >= deadline {
                return Err(CoreError::ElementTimeout {
                    locator: target.to_string(),
                    timeout_ms,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Same as `eval_on` but inside an iframe's document. Cross-origin
    /// frames have no reachable `contentDocument` and report as missing.
    async fn eval_in_frame(
        &self,
        frame_selector: &str,
        target: &Target,
        timeout_ms: u64,
        js_fn: &str,
    ) -> Result<Value> {
        let script = format!(
            r#"(() => {{
  const frame = document.querySelector({frame});
  if (!frame || !frame.contentDocument) return {{ state: "noframe" }};
  const doc = frame.contentDocument;
  const el = {expression};
  if (!el) return {{ state: "noelement" }};
  return {{ state: "ok", value: ({js_fn})(el) }};
}})()"#,
            frame = locator::js_string(frame_selector),
            expression = locator::lookup_expression(target, "doc"),
        );
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut frame_seen = false;
        loop {
            if let Ok(result) = self.page.evaluate(script.as_str()).await
                && let Some(outcome) = result.value()
            {
                match outcome.get("state").and_then(Value::as_str) {
                    Some("ok") => {
                        return Ok(outcome.get("value").cloned().unwrap_or(Value::Null));
                    }
                    Some("noelement") => frame_seen = true,
                    _ => {}
                }
            }
            if Instant::now() >= deadline {
                if frame_seen {
                    return Err(CoreError::ElementTimeout {
                        locator: target.to_string(),
                        timeout_ms,
                    });
                }
                return Err(CoreError::IframeNotFound(frame_selector.to_string()));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_ready_state(&self, deadline: Instant) -> Result<()> {
        loop {
            let state = self
                .page
                .evaluate("document.readyState")
                .await
                .ok()
                .and_then(|result| result.value().and_then(Value::as_str).map(str::to_string));
            if matches!(state.as_deref(), Some("interactive" | "complete")) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CoreError::Navigation(
                    "timed out waiting for the DOM to finish parsing".to_string(),
                ));
            }
            sleep(Duration::from_millis(50)).await;
        }
    }

    async fn travel_history(&self, delta: i64) -> Result<()> {
        let history = self
            .page
            .execute(cdp_page::GetNavigationHistoryParams::default())
            .await
            .map_err(|e| CoreError::Navigation(e.to_string()))?;
        let Ok(index) = usize::try_from(history.current_index + delta) else {
            return Ok(());
        };
        // Off the end of the history is a no-op, same as the browser button.
        let Some(entry) = history.entries.get(index) else {
            return Ok(());
        };
        self.page
            .execute(cdp_page::NavigateToHistoryEntryParams::new(entry.id))
            .await
            .map_err(|e| CoreError::Navigation(e.to_string()))?;
        let _ = tokio::time::timeout(Duration::from_millis(2000), self.page.wait_for_navigation())
            .await;
        Ok(())
    }

    async fn dispatch_click(
        &self,
        x: f64,
        y: f64,
        button: MouseButton,
        click_count: i64,
    ) -> Result<()> {
        for kind in [
            DispatchMouseEventType::MousePressed,
            DispatchMouseEventType::MouseReleased,
        ] {
            let params = DispatchMouseEventParams::builder()
                .r#type(kind)
                .x(x)
                .y(y)
                .button(button.clone())
                .click_count(click_count)
                .build()
                .map_err(CoreError::Driver)?;
            self.page.execute(params).await.map_err(cdp_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl PageHandle for CdpPage {
    async fn navigate(&self, url: &str, wait_until: WaitUntil, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        match timeout_at(deadline, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(CoreError::Navigation(e.to_string())),
            Err(_) => {
                return Err(CoreError::Navigation(format!(
                    "timed out after {timeout_ms}ms loading {url}"
                )));
            }
        }
        match wait_until {
            WaitUntil::Load => {
                let _ = timeout_at(deadline, self.page.wait_for_navigation()).await;
            }
            WaitUntil::DomContentLoaded => self.wait_for_ready_state(deadline).await?,
            WaitUntil::NetworkIdle => {
                let _ = timeout_at(deadline, self.page.wait_for_navigation()).await;
                sleep(NETWORK_IDLE_SETTLE).await;
            }
        }
        Ok(())
    }

    async fn go_back(&self) -> Result<()> {
        self.travel_history(-1).await
    }

    async fn go_forward(&self) -> Result<()> {
        self.travel_history(1).await
    }

    async fn url(&self) -> Result<String> {
        let url = self.page.url().await.map_err(cdp_err)?;
        Ok(url.unwrap_or_default())
    }

    async fn wait_for_url(&self, pattern: Option<&str>, timeout_ms: u64) -> Result<String> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let Some(pattern) = pattern else {
            if timeout_at(deadline, self.page.wait_for_navigation())
                .await
                .is_err()
            {
                return Err(CoreError::Navigation(format!(
                    "timed out after {timeout_ms}ms waiting for the page to load"
                )));
            }
            return self.url().await;
        };
        loop {
            let url = self.url().await?;
            if pattern_matches(pattern, &url) {
                return Ok(url);
            }
            if Instant::now() >= deadline {
                return Err(CoreError::Navigation(format!(
                    "timed out after {timeout_ms}ms waiting for URL matching: {pattern}"
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, target: &Target, timeout_ms: u64) -> Result<()> {
        let element = self.resolve(target, timeout_ms).await?;
        element.click().await.map_err(cdp_err)?;
        Ok(())
    }

    async fn double_click(&self, target: &Target, timeout_ms: u64) -> Result<()> {
        let element = self.resolve(target, timeout_ms).await?;
        let element = element.scroll_into_view().await.map_err(cdp_err)?;
        let point = element.clickable_point().await.map_err(cdp_err)?;
        // Chrome recognises a double click from the second pair carrying
        // click_count 2.
        self.dispatch_click(point.x, point.y, MouseButton::Left, 1)
            .await?;
        self.dispatch_click(point.x, point.y, MouseButton::Left, 2)
            .await?;
        Ok(())
    }

    async fn right_click(&self, target: &Target, timeout_ms: u64) -> Result<()> {
        let element = self.resolve(target, timeout_ms).await?;
        let element = element.scroll_into_view().await.map_err(cdp_err)?;
        let point = element.clickable_point().await.map_err(cdp_err)?;
        self.dispatch_click(point.x, point.y, MouseButton::Right, 1)
            .await
    }

    async fn hover(&self, target: &Target, timeout_ms: u64) -> Result<()> {
        let element = self.resolve(target, timeout_ms).await?;
        let element = element.scroll_into_view().await.map_err(cdp_err)?;
        let point = element.clickable_point().await.map_err(cdp_err)?;
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseMoved)
            .x(point.x)
            .y(point.y)
            .build()
            .map_err(CoreError::Driver)?;
        self.page.execute(params).await.map_err(cdp_err)?;
        Ok(())
    }

    async fn fill(&self, target: &Target, value: &str, timeout_ms: u64) -> Result<()> {
        self.eval_on(target, timeout_ms, &fill_function(value))
            .await?;
        Ok(())
    }

    async fn type_text(&self, target: &Target, text: &str, timeout_ms: u64) -> Result<()> {
        let element = self.resolve(target, timeout_ms).await?;
        element.click().await.map_err(cdp_err)?;
        element.type_str(text).await.map_err(cdp_err)?;
        Ok(())
    }

    async fn press_key(&self, key: &str, target: Option<&Target>, timeout_ms: u64) -> Result<()> {
        if let Some(target) = target {
            self.eval_on(target, timeout_ms, "(el) => { el.focus(); return true; }")
                .await?;
        }
        let (code, text, virtual_key) = key_descriptor(key);
        // Single printable characters type themselves.
        let text = text
            .map(str::to_string)
            .or_else(|| (key.chars().count() == 1).then(|| key.to_string()));

        let mut down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key(key)
            .code(code);
        if let Some(vk) = virtual_key {
            down = down.windows_virtual_key_code(vk).native_virtual_key_code(vk);
        }
        self.page
            .execute(down.build().map_err(CoreError::Driver)?)
            .await
            .map_err(cdp_err)?;

        if let Some(text) = &text {
            let char_event = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::Char)
                .key(key)
                .code(code)
                .text(text)
                .build()
                .map_err(CoreError::Driver)?;
            self.page.execute(char_event).await.map_err(cdp_err)?;
        }

        let mut up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(key)
            .code(code);
        if let Some(vk) = virtual_key {
            up = up.windows_virtual_key_code(vk).native_virtual_key_code(vk);
        }
        self.page
            .execute(up.build().map_err(CoreError::Driver)?)
            .await
            .map_err(cdp_err)?;
        Ok(())
    }

    async fn select(
        &self,
        target: &Target,
        selection: &Selection,
        timeout_ms: u64,
    ) -> Result<Vec<String>> {
        let (picker, wanted) = match selection {
            Selection::Value(value) => (
                format!("(o) => o.value === {}", locator::js_string(value)),
                value.clone(),
            ),
            Selection::Label(label) => (
                format!(
                    "(o) => (o.label || o.textContent || '').trim() === {}",
                    locator::js_string(label)
                ),
                label.clone(),
            ),
            Selection::Values(values) => (
                format!("(o) => {}.includes(o.value)", Value::from(values.clone())),
                values.join(", "),
            ),
        };
        let js_fn = format!(
            r#"(el) => {{
  const matches = {picker};
  const options = Array.from(el.options || []);
  if (!options.some(matches)) return null;
  for (const option of options) {{
    option.selected = false;
  }}
  for (const option of options) {{
    if (matches(option)) {{
      option.selected = true;
      if (!el.multiple) break;
    }}
  }}
  el.dispatchEvent(new Event("input", {{ bubbles: true }}));
  el.dispatchEvent(new Event("change", {{ bubbles: true }}));
  return Array.from(el.selectedOptions).map((option) => option.value);
}}"#
        );
        let picked = self.eval_on(target, timeout_ms, &js_fn).await?;
        if picked.is_null() {
            return Err(CoreError::Driver(format!(
                "no option matching \"{wanted}\" in {target}"
            )));
        }
        Ok(serde_json::from_value(picked).unwrap_or_default())
    }

    async fn set_checked(&self, target: &Target, checked: bool, timeout_ms: u64) -> Result<()> {
        let js_fn = format!(
            r#"(el) => {{
  if (Boolean(el.checked) !== {checked}) {{
    el.click();
  }}
  return Boolean(el.checked);
}}"#
        );
        self.eval_on(target, timeout_ms, &js_fn).await?;
        Ok(())
    }

    async fn drag(&self, source: &Target, dest: &Target, timeout_ms: u64) -> Result<()> {
        let source = self.resolve(source, timeout_ms).await?;
        let dest = self.resolve(dest, timeout_ms).await?;
        let from = source.clickable_point().await.map_err(cdp_err)?;
        let to = dest.clickable_point().await.map_err(cdp_err)?;

        let press = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MousePressed)
            .x(from.x)
            .y(from.y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(CoreError::Driver)?;
        self.page.execute(press).await.map_err(cdp_err)?;

        let drag_move = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseMoved)
            .x(to.x)
            .y(to.y)
            .button(MouseButton::Left)
            .build()
            .map_err(CoreError::Driver)?;
        self.page.execute(drag_move).await.map_err(cdp_err)?;

        let release = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseReleased)
            .x(to.x)
            .y(to.y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(CoreError::Driver)?;
        self.page.execute(release).await.map_err(cdp_err)?;
        Ok(())
    }

    async fn scroll_into_view(&self, target: &Target, timeout_ms: u64) -> Result<()> {
        let element = self.resolve(target, timeout_ms).await?;
        element.scroll_into_view().await.map_err(cdp_err)?;
        Ok(())
    }

    async fn upload_file(&self, target: &Target, path: &Path, timeout_ms: u64) -> Result<()> {
        let element = self.resolve(target, timeout_ms).await?;
        let params = dom::SetFileInputFilesParams::builder()
            .file(path.to_string_lossy().into_owned())
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(CoreError::Driver)?;
        self.page.execute(params).await.map_err(cdp_err)?;
        Ok(())
    }

    async fn frame_click(
        &self,
        frame_selector: &str,
        target: &Target,
        timeout_ms: u64,
    ) -> Result<()> {
        self.eval_in_frame(
            frame_selector,
            target,
            timeout_ms,
            "(el) => { el.click(); return true; }",
        )
        .await?;
        Ok(())
    }

    async fn frame_fill(
        &self,
        frame_selector: &str,
        target: &Target,
        value: &str,
        timeout_ms: u64,
    ) -> Result<()> {
        self.eval_in_frame(frame_selector, target, timeout_ms, &fill_function(value))
            .await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| CoreError::Driver(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn text_content(&self, target: &Target, timeout_ms: u64) -> Result<String> {
        let element = self.resolve(target, timeout_ms).await?;
        let text = element.inner_text().await.map_err(cdp_err)?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(
        &self,
        target: &Target,
        name: &str,
        timeout_ms: u64,
    ) -> Result<Option<String>> {
        let element = self.resolve(target, timeout_ms).await?;
        element.attribute(name).await.map_err(cdp_err)
    }

    async fn input_value(&self, target: &Target, timeout_ms: u64) -> Result<String> {
        let value = self
            .eval_on(target, timeout_ms, r#"(el) => el.value ?? """#)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn is_checked(&self, target: &Target, timeout_ms: u64) -> Result<bool> {
        let value = self
            .eval_on(target, timeout_ms, "(el) => Boolean(el.checked)")
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn exists(&self, target: &Target, timeout_ms: u64) -> Result<bool> {
        // Single probe, no retry loop; the timeout only bounds the round
        // trip.
        let expression = locator::lookup_expression(target, "document");
        let script = format!("Boolean({expression})");
        let probe = self.page.evaluate(script.as_str());
        match tokio::time::timeout(Duration::from_millis(timeout_ms), probe).await {
            Ok(Ok(result)) => Ok(result.value().and_then(Value::as_bool).unwrap_or(false)),
            Ok(Err(e)) => Err(CoreError::Driver(e.to_string())),
            Err(_) => Ok(false),
        }
    }

    async fn wait_for(&self, target: &Target, state: ElementState, timeout_ms: u64) -> Result<()> {
        let expression = locator::lookup_expression(target, "document");
        let script = format!(
            r#"(() => {{
  const el = {expression};
  if (!el) return false;
  const style = getComputedStyle(el);
  if (style.display === "none" || style.visibility === "hidden") return false;
  const rect = el.getBoundingClientRect();
  return rect.width > 0 && rect.height > 0;
}})()"#
        );
        let wants_visible = matches!(state, ElementState::Visible);
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let visible = self
                .page
                .evaluate(script.as_str())
                .await
                .ok()
                .and_then(|result| result.value().and_then(Value::as_bool))
                .unwrap_or(false);
            if visible == wants_visible {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CoreError::ElementTimeout {
                    locator: target.to_string(),
                    timeout_ms,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn visible_text(&self) -> Result<String> {
        let result = self
            .page
            .evaluate(r#"document.body ? document.body.innerText : """#)
            .await
            .map_err(cdp_err)?;
        Ok(result
            .value()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn content(&self, scope: Option<&Target>) -> Result<String> {
        let Some(target) = scope else {
            let result = self
                .page
                .evaluate("document.documentElement.outerHTML")
                .await
                .map_err(cdp_err)?;
            return Ok(result
                .value()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string());
        };
        let expression = locator::lookup_expression(target, "document");
        let script = format!(
            r#"(() => {{
  const el = {expression};
  return el ? el.outerHTML : null;
}})()"#
        );
        let result = self.page.evaluate(script.as_str()).await.map_err(cdp_err)?;
        match result.value().and_then(Value::as_str) {
            Some(html) => Ok(html.to_string()),
            None => Err(CoreError::Driver(format!("Element not found: {target}"))),
        }
    }

    async fn screenshot(&self, area: &ScreenshotArea, timeout_ms: u64) -> Result<Vec<u8>> {
        match area {
            ScreenshotArea::Viewport { width, height } => {
                let params = CaptureScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .clip(cdp_page::Viewport {
                        x: 0.0,
                        y: 0.0,
                        width: f64::from(*width),
                        height: f64::from(*height),
                        scale: 1.0,
                    })
                    .capture_beyond_viewport(true)
                    .build();
                let response = self.page.execute(params).await.map_err(cdp_err)?;
                BASE64_STANDARD
                    .decode(&response.data)
                    .map_err(|e| CoreError::Driver(format!("base64 decode failed: {e}")))
            }
            ScreenshotArea::FullPage => {
                let params = ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build();
                self.page.screenshot(params).await.map_err(cdp_err)
            }
            ScreenshotArea::Element(target) => {
                let element = self.resolve(target, timeout_ms).await?;
                let element = element.scroll_into_view().await.map_err(cdp_err)?;
                element
                    .screenshot(CaptureScreenshotFormat::Png)
                    .await
                    .map_err(cdp_err)
            }
        }
    }

    async fn pdf(&self, options: &PdfOptions) -> Result<Vec<u8>> {
        let mut params = PrintToPdfParams {
            print_background: Some(options.print_background),
            ..PrintToPdfParams::default()
        };
        if let Some(format) = &options.format
            && let Some((width, height)) = paper_size(format)
        {
            params.paper_width = Some(width);
            params.paper_height = Some(height);
        }
        if let Some(margins) = &options.margins {
            params.margin_top = margins.top.as_deref().and_then(margin_inches);
            params.margin_right = margins.right.as_deref().and_then(margin_inches);
            params.margin_bottom = margins.bottom.as_deref().and_then(margin_inches);
            params.margin_left = margins.left.as_deref().and_then(margin_inches);
        }
        self.page.pdf(params).await.map_err(cdp_err)
    }

    fn events(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    async fn close(&self) -> Result<()> {
        self.page.clone().close().await.map_err(cdp_err)
    }
}

fn spawn_console_pump(page: &Page, events: &broadcast::Sender<PageEvent>) {
    let page = page.clone();
    let events = events.clone();
    tokio::spawn(async move {
        let _ = page.execute(cdp_runtime::EnableParams::default()).await;
        let _ = page.execute(cdp_log::EnableParams::default()).await;
        let Ok(mut stream) = page
            .event_listener::<cdp_runtime::EventConsoleApiCalled>()
            .await
        else {
            warn!("console listener unavailable; console_logs will be empty");
            return;
        };
        while let Some(event) = stream.next().await {
            let kind = console_kind(&event.r#type);
            let text = join_console_args(&event.args);
            trace!("console event: [{kind}] {text}");
            let _ = events.send(PageEvent::Console { kind, text });
        }
    });
}

fn spawn_exception_pump(page: &Page, events: &broadcast::Sender<PageEvent>) {
    let page = page.clone();
    let events = events.clone();
    tokio::spawn(async move {
        let _ = page.execute(cdp_runtime::EnableParams::default()).await;
        let Ok(mut stream) = page
            .event_listener::<cdp_runtime::EventExceptionThrown>()
            .await
        else {
            warn!("exception listener unavailable");
            return;
        };
        while let Some(event) = stream.next().await {
            let text = exception_text(&event.exception_details);
            trace!("page exception: {text}");
            let _ = events.send(PageEvent::PageError { text });
        }
    });
}

fn spawn_response_pump(page: &Page, events: &broadcast::Sender<PageEvent>) {
    let page = page.clone();
    let events = events.clone();
    tokio::spawn(async move {
        let _ = page.execute(network::EnableParams::default()).await;
        let Ok(mut stream) = page
            .event_listener::<network::EventResponseReceived>()
            .await
        else {
            warn!("network listener unavailable; response waits will time out");
            return;
        };
        while let Some(event) = stream.next().await {
            let url = event.response.url.clone();
            let status = u16::try_from(event.response.status).unwrap_or(0);
            trace!("response: {status} {url}");
            // Bodies are only worth shipping for textual payloads; response
            // asserts match on body fragments, not bytes.
            let body = if is_textual(&event.response.mime_type) {
                fetch_response_body(&page, event.request_id.clone()).await
            } else {
                None
            };
            let _ = events.send(PageEvent::Response { url, status, body });
        }
    });
}

fn console_kind(kind: &cdp_runtime::ConsoleApiCalledType) -> LogKind {
    match kind {
        cdp_runtime::ConsoleApiCalledType::Debug => LogKind::Debug,
        cdp_runtime::ConsoleApiCalledType::Info => LogKind::Info,
        cdp_runtime::ConsoleApiCalledType::Error => LogKind::Error,
        cdp_runtime::ConsoleApiCalledType::Warning => LogKind::Warning,
        _ => LogKind::Log,
    }
}

/// Formats console call arguments the way a devtools console would: string
/// values verbatim, other primitives as JSON, remote objects by their
/// description.
fn join_console_args(args: &[cdp_runtime::RemoteObject]) -> String {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        if let Some(value) = &arg.value {
            match value {
                Value::String(text) => parts.push(text.clone()),
                other => parts.push(other.to_string()),
            }
        } else if let Some(description) = &arg.description {
            parts.push(description.clone());
        }
    }
    parts.join(" ")
}

fn exception_text(details: &cdp_runtime::ExceptionDetails) -> String {
    details
        .exception
        .as_ref()
        .and_then(|exception| exception.description.clone())
        .unwrap_or_else(|| details.text.clone())
}

async fn fetch_response_body(page: &Page, request_id: network::RequestId) -> Option<String> {
    let response = page
        .execute(network::GetResponseBodyParams::new(request_id))
        .await
        .ok()?;
    if response.base64_encoded {
        let bytes = BASE64_STANDARD.decode(&response.body).ok()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        Some(response.body.clone())
    }
}

fn is_textual(mime_type: &str) -> bool {
    mime_type.starts_with("text/")
        || mime_type.contains("json")
        || mime_type.contains("xml")
        || mime_type.contains("javascript")
        || mime_type.contains("x-www-form-urlencoded")
}

fn fill_function(value: &str) -> String {
    format!(
        r#"(el) => {{
  el.focus();
  el.value = {value};
  el.dispatchEvent(new Event("input", {{ bubbles: true }}));
  el.dispatchEvent(new Event("change", {{ bubbles: true }}));
  return true;
}}"#,
        value = locator::js_string(value),
    )
}

/// Key name to CDP code, produced text, and virtual key code. Unknown keys
/// pass through by name, which covers plain characters.
fn key_descriptor(key: &str) -> (&str, Option<&str>, Option<i64>) {
    match key {
        "Enter" => ("Enter", Some("\r"), Some(13)),
        "Tab" => ("Tab", Some("\t"), Some(9)),
        "Escape" => ("Escape", None, Some(27)),
        "Backspace" => ("Backspace", None, Some(8)),
        "Delete" => ("Delete", None, Some(46)),
        "ArrowUp" => ("ArrowUp", None, Some(38)),
        "ArrowDown" => ("ArrowDown", None, Some(40)),
        "ArrowLeft" => ("ArrowLeft", None, Some(37)),
        "ArrowRight" => ("ArrowRight", None, Some(39)),
        "Home" => ("Home", None, Some(36)),
        "End" => ("End", None, Some(35)),
        "PageUp" => ("PageUp", None, Some(33)),
        "PageDown" => ("PageDown", None, Some(34)),
        " " | "Space" => ("Space", Some(" "), Some(32)),
        _ => (key, None, None),
    }
}

fn paper_size(format: &str) -> Option<(f64, f64)> {
    match format.to_ascii_lowercase().as_str() {
        "a3" => Some((11.69, 16.54)),
        "a4" => Some((8.27, 11.69)),
        "a5" => Some((5.83, 8.27)),
        "letter" => Some((8.5, 11.0)),
        "legal" => Some((8.5, 14.0)),
        "tabloid" => Some((11.0, 17.0)),
        _ => None,
    }
}

/// Parses a CSS length into inches. Bare numbers count as pixels, matching
/// what Chrome assumes for print margins.
fn margin_inches(value: &str) -> Option<f64> {
    let value = value.trim();
    let (number, factor) = if let Some(rest) = value.strip_suffix("px") {
        (rest, 1.0 / 96.0)
    } else if let Some(rest) = value.strip_suffix("in") {
        (rest, 1.0)
    } else if let Some(rest) = value.strip_suffix("cm") {
        (rest, 1.0 / 2.54)
    } else if let Some(rest) = value.strip_suffix("mm") {
        (rest, 1.0 / 25.4)
    } else {
        (value, 1.0 / 96.0)
    };
    number.trim().parse::<f64>().ok().map(|n| n * factor)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn key_descriptor_maps_named_keys() {
        assert_eq!(key_descriptor("Enter"), ("Enter", Some("\r"), Some(13)));
        assert_eq!(key_descriptor("Space"), ("Space", Some(" "), Some(32)));
        assert_eq!(key_descriptor("F5"), ("F5", None, None));
    }

    #[test]
    fn paper_size_is_case_insensitive() {
        assert_eq!(paper_size("A4"), Some((8.27, 11.69)));
        assert_eq!(paper_size("letter"), Some((8.5, 11.0)));
        assert_eq!(paper_size("postcard"), None);
    }

    #[test]
    fn margin_parsing_handles_css_units() {
        assert!((margin_inches("1in").unwrap() - 1.0).abs() < 1e-9);
        assert!((margin_inches("2.54cm").unwrap() - 1.0).abs() < 1e-9);
        assert!((margin_inches("96px").unwrap() - 1.0).abs() < 1e-9);
        assert!((margin_inches("25.4mm").unwrap() - 1.0).abs() < 1e-9);
        assert!((margin_inches(" 48 ").unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(margin_inches("wide"), None);
    }

    #[test]
    fn textual_mime_types_are_recognised() {
        assert!(is_textual("application/json"));
        assert!(is_textual("text/html"));
        assert!(is_textual("application/xhtml+xml"));
        assert!(!is_textual("image/png"));
        assert!(!is_textual("font/woff2"));
    }
}
