//! Turns a recorded action list into Playwright test source. The renderer is
//! the one [`CodegenBackend`] implementation shipped with the workspace; it
//! compiles its template once at construction and stays pure after that.
//!
//! Actions that have no test-code equivalent (console queries, response
//! waits, HTTP calls) are dropped from the output rather than emitted as
//! dead comments.

use handlebars::Handlebars;
use pagehand_core::CoreError;
use pagehand_core::Result;
use pagehand_core::codegen::CodegenBackend;
use pagehand_core::codegen::RecordedAction;
use pagehand_core::codegen::SessionOptions;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const TEMPLATE_NAME: &str = "spec";

const SPEC_TEMPLATE: &str = r#"import { test, expect } from '@playwright/test';

test('{{testName}}', async ({ page }) => {
{{#each lines~}}
  {{this}}
{{/each~}}
});
"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpecData {
    test_name: String,
    lines: Vec<String>,
}

pub struct PlaywrightRenderer {
    registry: Handlebars<'static>,
}

impl PlaywrightRenderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        // Generated output is source code, not HTML.
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, SPEC_TEMPLATE)
            .map_err(|e| CoreError::Render(e.to_string()))?;
        Ok(Self { registry })
    }
}

impl CodegenBackend for PlaywrightRenderer {
    fn render(&self, actions: &[RecordedAction], options: &SessionOptions) -> Result<String> {
        let mut lines = Vec::new();
        for action in actions {
            let Some(code) = step_code(&action.tool_name, &action.arguments) else {
                continue;
            };
            if options.include_comments {
                let summary = action.outcome_summary.lines().next().unwrap_or_default();
                if !summary.is_empty() {
                    lines.push(format!("// {summary}"));
                }
            }
            lines.push(code);
        }
        debug!(
            "rendering {} of {} recorded action(s)",
            lines.len(),
            actions.len()
        );
        let data = SpecData {
            test_name: test_name(&options.test_name_prefix),
            lines,
        };
        self.registry
            .render(TEMPLATE_NAME, &data)
            .map_err(|e| CoreError::Render(e.to_string()))
    }
}

/// One recorded call as a line of Playwright code. `None` means the action
/// does not translate; malformed recorded arguments fall out the same way.
fn step_code(name: &str, args: &Value) -> Option<String> {
    match name {
        "browser.navigate" => Some(format!("await page.goto({});", quoted(args, "url")?)),
        "browser.go_back" => Some("await page.goBack();".to_string()),
        "browser.go_forward" => Some("await page.goForward();".to_string()),

        "browser.click" => Some(format!("await page.click({});", quoted(args, "selector")?)),
        "browser.double_click" => Some(format!(
            "await page.dblclick({});",
            quoted(args, "selector")?
        )),
        "browser.right_click" => Some(format!(
            "await page.click({}, {{ button: 'right' }});",
            quoted(args, "selector")?
        )),
        "browser.fill" => Some(format!(
            "await page.fill({}, {});",
            quoted(args, "selector")?,
            quoted(args, "value")?
        )),
        "browser.type_text" => Some(format!(
            "await page.type({}, {});",
            quoted(args, "selector")?,
            quoted(args, "text")?
        )),
        "browser.select" => Some(format!(
            "await page.selectOption({}, {});",
            quoted(args, "selector")?,
            quoted(args, "value")?
        )),
        "browser.select_by_label" => Some(format!(
            "await page.selectOption({}, {{ label: {} }});",
            quoted(args, "selector")?,
            quoted(args, "label")?
        )),
        "browser.select_multi" => {
            let values = args.get("values")?;
            values.as_array()?;
            Some(format!(
                "await page.selectOption({}, {values});",
                quoted(args, "selector")?
            ))
        }
        "browser.check" => Some(format!("await page.check({});", quoted(args, "selector")?)),
        "browser.uncheck" => Some(format!(
            "await page.uncheck({});",
            quoted(args, "selector")?
        )),
        "browser.hover" => Some(format!("await page.hover({});", quoted(args, "selector")?)),
        "browser.drag" => Some(format!(
            "await page.dragAndDrop({}, {});",
            quoted(args, "sourceSelector")?,
            quoted(args, "targetSelector")?
        )),
        "browser.press_key" => {
            let key = quoted(args, "key")?;
            match quoted(args, "selector") {
                Some(selector) => Some(format!("await page.press({selector}, {key});")),
                None => Some(format!("await page.keyboard.press({key});")),
            }
        }
        "browser.upload_file" => Some(format!(
            "await page.setInputFiles({}, {});",
            quoted(args, "selector")?,
            quoted(args, "filePath")?
        )),
        "browser.scroll_to" => Some(format!(
            "await page.locator({}).scrollIntoViewIfNeeded();",
            quoted(args, "selector")?
        )),
        "browser.click_and_switch_tab" => Some(format!(
            "const [popup] = await Promise.all([page.waitForEvent('popup'), page.click({})]);",
            quoted(args, "selector")?
        )),

        "browser.click_by_test_id" => Some(format!(
            "await page.getByTestId({}).click();",
            quoted(args, "testId")?
        )),
        "browser.fill_by_test_id" => Some(format!(
            "await page.getByTestId({}).fill({});",
            quoted(args, "testId")?,
            quoted(args, "text")?
        )),
        "browser.click_by_role" => Some(format!(
            "await page.getByRole({}, {{ name: {} }}).click();",
            quoted(args, "role")?,
            quoted(args, "name")?
        )),
        "browser.fill_by_role" => Some(format!(
            "await page.getByRole({}, {{ name: {} }}).fill({});",
            quoted(args, "role")?,
            quoted(args, "name")?,
            quoted(args, "text")?
        )),
        "browser.click_by_text" => Some(format!(
            "await page.getByText({}).click();",
            quoted(args, "text")?
        )),
        "browser.fill_by_text" => Some(format!(
            "await page.getByText({}).fill({});",
            quoted(args, "text")?,
            quoted(args, "inputText")?
        )),
        "browser.click_by_label" => Some(format!(
            "await page.getByLabel({}).click();",
            quoted(args, "label")?
        )),
        "browser.fill_by_label" => Some(format!(
            "await page.getByLabel({}).fill({});",
            quoted(args, "label")?,
            quoted(args, "text")?
        )),
        "browser.click_by_placeholder" => Some(format!(
            "await page.getByPlaceholder({}).click();",
            quoted(args, "placeholder")?
        )),
        "browser.fill_by_placeholder" => Some(format!(
            "await page.getByPlaceholder({}).fill({});",
            quoted(args, "placeholder")?,
            quoted(args, "text")?
        )),
        "browser.click_by_title" => Some(format!(
            "await page.getByTitle({}).click();",
            quoted(args, "title")?
        )),
        "browser.click_by_alt" => Some(format!(
            "await page.getByAltText({}).click();",
            quoted(args, "alt")?
        )),

        "browser.iframe_click" => Some(format!(
            "await page.frameLocator({}).locator({}).click();",
            quoted(args, "iframeSelector")?,
            quoted(args, "selector")?
        )),
        "browser.iframe_fill" => Some(format!(
            "await page.frameLocator({}).locator({}).fill({});",
            quoted(args, "iframeSelector")?,
            quoted(args, "selector")?,
            quoted(args, "value")?
        )),

        "browser.evaluate" => Some(format!(
            "await page.evaluate({});",
            quoted(args, "script")?
        )),
        "browser.visible_text" => {
            Some("await page.evaluate(() => document.body.innerText);".to_string())
        }
        "browser.visible_html" => Some("await page.content();".to_string()),
        "browser.element_text" => Some(format!(
            "await page.textContent({});",
            quoted(args, "selector")?
        )),
        "browser.element_attribute" => Some(format!(
            "await page.getAttribute({}, {});",
            quoted(args, "selector")?,
            quoted(args, "attribute")?
        )),
        "browser.element_exists" => Some(format!(
            "await page.locator({}).count();",
            quoted(args, "selector")?
        )),
        "browser.is_checked" => Some(format!(
            "await page.isChecked({});",
            quoted(args, "selector")?
        )),
        "browser.input_value" => Some(format!(
            "await page.inputValue({});",
            quoted(args, "selector")?
        )),

        "browser.wait_for_hidden" => Some(format!(
            "await expect(page.locator({})).toBeHidden();",
            quoted(args, "selector")?
        )),
        "browser.wait_for_url" => match quoted(args, "expectedUrl") {
            Some(pattern) => Some(format!("await page.waitForURL({pattern});")),
            None => Some("await page.waitForLoadState();".to_string()),
        },

        "browser.screenshot" => {
            let name = arg(args, "name")?;
            let path = ts_string(&format!("{name}.png"));
            let full_page = args
                .get("fullPage")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            match quoted(args, "selector") {
                Some(selector) => Some(format!(
                    "await page.locator({selector}).screenshot({{ path: {path} }});"
                )),
                None if full_page => Some(format!(
                    "await page.screenshot({{ path: {path}, fullPage: true }});"
                )),
                None => Some(format!("await page.screenshot({{ path: {path} }});")),
            }
        }
        "browser.element_screenshot" => Some(format!(
            "await page.locator({}).screenshot({{ path: {} }});",
            quoted(args, "selector")?,
            quoted(args, "path")?
        )),
        "browser.save_pdf" => {
            let dir = arg(args, "outputPath")?;
            let filename = arg(args, "filename").unwrap_or("page.pdf");
            let path = ts_string(&format!("{dir}/{filename}"));
            Some(format!("await page.pdf({{ path: {path} }});"))
        }

        _ => None,
    }
}

fn arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn quoted(args: &Value, key: &str) -> Option<String> {
    arg(args, key).map(ts_string)
}

/// JSON string literal, which is also a valid TS string literal.
fn ts_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// The prefix as a safe TS test title. Anything that could break out of the
/// single-quoted literal becomes an underscore.
fn test_name(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        "GeneratedTest".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn recorded(tool_name: &str, arguments: Value, summary: &str) -> RecordedAction {
        RecordedAction {
            tool_name: tool_name.to_string(),
            arguments,
            timestamp: Utc::now(),
            outcome_summary: summary.to_string(),
        }
    }

    fn options(include_comments: bool) -> SessionOptions {
        SessionOptions {
            output_path: "/tmp/generated".to_string(),
            test_name_prefix: "GeneratedTest".to_string(),
            include_comments,
        }
    }

    #[test]
    fn renders_an_empty_session() {
        let renderer = PlaywrightRenderer::new().unwrap();
        let source = renderer.render(&[], &options(false)).unwrap();
        assert_eq!(
            source,
            "import { test, expect } from '@playwright/test';\n\n\
             test('GeneratedTest', async ({ page }) => {\n});\n"
        );
    }

    #[test]
    fn translates_a_browse_and_fill_flow() {
        let renderer = PlaywrightRenderer::new().unwrap();
        let actions = [
            recorded(
                "browser.navigate",
                json!({"url": "https://example.com/login"}),
                "Navigated to https://example.com/login",
            ),
            recorded(
                "browser.fill",
                json!({"selector": "#user", "value": "admin"}),
                "Filled #user",
            ),
            recorded(
                "browser.click",
                json!({"selector": "#submit"}),
                "Clicked element: #submit",
            ),
        ];
        let source = renderer.render(&actions, &options(false)).unwrap();
        assert!(source.contains("  await page.goto(\"https://example.com/login\");\n"));
        assert!(source.contains("  await page.fill(\"#user\", \"admin\");\n"));
        assert!(source.contains("  await page.click(\"#submit\");\n"));
    }

    #[test]
    fn comments_repeat_the_outcome_summary() {
        let renderer = PlaywrightRenderer::new().unwrap();
        let actions = [recorded(
            "browser.navigate",
            json!({"url": "https://example.com"}),
            "Navigated to https://example.com",
        )];
        let source = renderer.render(&actions, &options(true)).unwrap();
        assert!(source.contains("  // Navigated to https://example.com\n"));
        assert!(source.contains("  await page.goto(\"https://example.com\");\n"));
    }

    #[test]
    fn untranslatable_actions_are_dropped() {
        let renderer = PlaywrightRenderer::new().unwrap();
        let actions = [
            recorded("browser.console_logs", json!({}), "Retrieved 0 console log(s):"),
            recorded("http.get", json!({"url": "https://api.test"}), "GET https://api.test"),
            recorded("browser.go_back", json!({}), "Navigated back"),
        ];
        let source = renderer.render(&actions, &options(false)).unwrap();
        assert!(!source.contains("console"));
        assert!(!source.contains("api.test"));
        assert!(source.contains("  await page.goBack();\n"));
    }

    #[test]
    fn locator_actions_use_get_by_helpers() {
        let renderer = PlaywrightRenderer::new().unwrap();
        let actions = [
            recorded(
                "browser.click_by_role",
                json!({"role": "button", "name": "Sign in"}),
                "Clicked role \"button\" named \"Sign in\"",
            ),
            recorded(
                "browser.fill_by_label",
                json!({"label": "Email", "text": "a@b.test"}),
                "Filled label \"Email\"",
            ),
        ];
        let source = renderer.render(&actions, &options(false)).unwrap();
        assert!(
            source.contains("  await page.getByRole(\"button\", { name: \"Sign in\" }).click();\n")
        );
        assert!(source.contains("  await page.getByLabel(\"Email\").fill(\"a@b.test\");\n"));
    }

    #[test]
    fn press_key_targets_the_selector_when_given() {
        let renderer = PlaywrightRenderer::new().unwrap();
        let with_selector = [recorded(
            "browser.press_key",
            json!({"key": "Enter", "selector": "#search"}),
            "Pressed key: Enter",
        )];
        let without_selector = [recorded(
            "browser.press_key",
            json!({"key": "Escape"}),
            "Pressed key: Escape",
        )];
        let first = renderer.render(&with_selector, &options(false)).unwrap();
        let second = renderer.render(&without_selector, &options(false)).unwrap();
        assert!(first.contains("  await page.press(\"#search\", \"Enter\");\n"));
        assert!(second.contains("  await page.keyboard.press(\"Escape\");\n"));
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        let renderer = PlaywrightRenderer::new().unwrap();
        let actions = [recorded(
            "browser.fill",
            json!({"selector": "input[name=\"q\"]", "value": "say \"hi\""}),
            "Filled input",
        )];
        let source = renderer.render(&actions, &options(false)).unwrap();
        assert!(
            source.contains(r#"  await page.fill("input[name=\"q\"]", "say \"hi\"");"#)
        );
    }

    #[test]
    fn select_multi_renders_an_array_literal() {
        let renderer = PlaywrightRenderer::new().unwrap();
        let actions = [recorded(
            "browser.select_multi",
            json!({"selector": "#tags", "values": ["a", "b"]}),
            "Selected 2 option(s)",
        )];
        let source = renderer.render(&actions, &options(false)).unwrap();
        assert!(source.contains(r##"  await page.selectOption("#tags", ["a","b"]);"##));
    }

    #[test]
    fn test_titles_are_sanitised() {
        let renderer = PlaywrightRenderer::new().unwrap();
        let mut opts = options(false);
        opts.test_name_prefix = "Login Flow: 'v2'!".to_string();
        let source = renderer.render(&[], &opts).unwrap();
        assert!(source.contains("test('Login Flow_ _v2__', async ({ page }) => {"));
        opts.test_name_prefix = "   ".to_string();
        let fallback = renderer.render(&[], &opts).unwrap();
        assert!(fallback.contains("test('GeneratedTest'"));
    }

    #[test]
    fn malformed_recorded_arguments_are_skipped() {
        let renderer = PlaywrightRenderer::new().unwrap();
        let actions = [
            recorded("browser.click", json!({}), "Error: missing selector"),
            recorded("browser.click", json!({"selector": 7}), "Error"),
        ];
        let source = renderer.render(&actions, &options(false)).unwrap();
        assert!(!source.contains("page.click"));
    }
}
