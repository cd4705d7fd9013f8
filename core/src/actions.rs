//! The action catalog: every operation the dispatcher accepts, as a tagged
//! enum over typed parameter structs. Wire argument names are camelCase;
//! each parameter struct also derives a JSON schema so hosts can enumerate
//! the catalog.

use std::collections::HashMap;

use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::CoreError;
use crate::codegen::SessionOptions;
use crate::config::BrowserEngine;
use crate::config::WaitUntil;
use crate::console::LogKind;

/// Raw inbound call: an action name plus its argument object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Resolves the call against the catalog. Unknown names and
    /// schema-invalid arguments are reported separately so envelopes can
    /// say which one went wrong.
    pub fn parse(&self) -> crate::Result<Action> {
        let mut fields = match &self.arguments {
            Value::Object(map) => map.clone(),
            Value::Null => serde_json::Map::new(),
            _ => {
                return Err(CoreError::InvalidArguments(format!(
                    "Arguments for {} must be an object",
                    self.name
                )));
            }
        };
        fields.insert("action".to_string(), Value::String(self.name.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|err| {
            if catalog().iter().any(|spec| spec.name == self.name) {
                CoreError::InvalidArguments(format!(
                    "Invalid arguments for {}: {err}",
                    self.name
                ))
            } else {
                CoreError::UnknownAction(self.name.clone())
            }
        })
    }
}

/// Which execution contract an action follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Needs a live page; the dispatcher launches one first.
    Browser,
    /// Plain HTTP; no browser involved.
    Http,
    /// Codegen session management; never recorded into sessions.
    Session,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action")]
pub enum Action {
    #[serde(rename = "codegen.start")]
    StartCodegenSession(SessionOptions),
    #[serde(rename = "codegen.end")]
    EndCodegenSession(SessionIdParams),
    #[serde(rename = "codegen.get")]
    GetCodegenSession(SessionIdParams),
    #[serde(rename = "codegen.clear")]
    ClearCodegenSession(SessionIdParams),

    #[serde(rename = "browser.navigate")]
    Navigate(NavigateParams),
    #[serde(rename = "browser.go_back")]
    GoBack,
    #[serde(rename = "browser.go_forward")]
    GoForward,
    #[serde(rename = "browser.close")]
    CloseBrowser,
    #[serde(rename = "browser.user_agent")]
    SetUserAgent(UserAgentParams),

    #[serde(rename = "browser.click")]
    Click(ClickParams),
    #[serde(rename = "browser.double_click")]
    DoubleClick(TimedSelectorParams),
    #[serde(rename = "browser.right_click")]
    RightClick(TimedSelectorParams),
    #[serde(rename = "browser.fill")]
    Fill(FillParams),
    #[serde(rename = "browser.type_text")]
    TypeText(TypeTextParams),
    #[serde(rename = "browser.select")]
    Select(SelectParams),
    #[serde(rename = "browser.select_by_label")]
    SelectByLabel(SelectByLabelParams),
    #[serde(rename = "browser.select_multi")]
    SelectMulti(SelectMultiParams),
    #[serde(rename = "browser.check")]
    Check(TimedSelectorParams),
    #[serde(rename = "browser.uncheck")]
    Uncheck(TimedSelectorParams),
    #[serde(rename = "browser.hover")]
    Hover(HoverParams),
    #[serde(rename = "browser.drag")]
    Drag(DragParams),
    #[serde(rename = "browser.press_key")]
    PressKey(PressKeyParams),
    #[serde(rename = "browser.upload_file")]
    UploadFile(UploadFileParams),
    #[serde(rename = "browser.scroll_to")]
    ScrollTo(TimedSelectorParams),
    #[serde(rename = "browser.click_and_switch_tab")]
    ClickAndSwitchTab(ClickAndSwitchTabParams),

    #[serde(rename = "browser.click_by_test_id")]
    ClickByTestId(TestIdClickParams),
    #[serde(rename = "browser.fill_by_test_id")]
    FillByTestId(TestIdFillParams),
    #[serde(rename = "browser.click_by_role")]
    ClickByRole(RoleClickParams),
    #[serde(rename = "browser.fill_by_role")]
    FillByRole(RoleFillParams),
    #[serde(rename = "browser.click_by_text")]
    ClickByText(TextClickParams),
    #[serde(rename = "browser.fill_by_text")]
    FillByText(TextFillParams),
    #[serde(rename = "browser.click_by_label")]
    ClickByLabel(LabelClickParams),
    #[serde(rename = "browser.fill_by_label")]
    FillByLabel(LabelFillParams),
    #[serde(rename = "browser.click_by_placeholder")]
    ClickByPlaceholder(PlaceholderClickParams),
    #[serde(rename = "browser.fill_by_placeholder")]
    FillByPlaceholder(PlaceholderFillParams),
    #[serde(rename = "browser.click_by_title")]
    ClickByTitle(TitleClickParams),
    #[serde(rename = "browser.click_by_alt")]
    ClickByAlt(AltClickParams),

    #[serde(rename = "browser.iframe_click")]
    IframeClick(IframeClickParams),
    #[serde(rename = "browser.iframe_fill")]
    IframeFill(IframeFillParams),

    #[serde(rename = "browser.evaluate")]
    Evaluate(EvaluateParams),
    #[serde(rename = "browser.visible_text")]
    VisibleText,
    #[serde(rename = "browser.visible_html")]
    VisibleHtml(VisibleHtmlParams),
    #[serde(rename = "browser.element_text")]
    ElementText(TimedSelectorParams),
    #[serde(rename = "browser.element_attribute")]
    ElementAttribute(AttributeParams),
    #[serde(rename = "browser.element_exists")]
    ElementExists(TimedSelectorParams),
    #[serde(rename = "browser.is_checked")]
    IsChecked(TimedSelectorParams),
    #[serde(rename = "browser.input_value")]
    InputValue(TimedSelectorParams),

    #[serde(rename = "browser.wait_for_hidden")]
    WaitForHidden(TimedSelectorParams),
    #[serde(rename = "browser.wait_for_url")]
    WaitForUrl(WaitForUrlParams),

    #[serde(rename = "browser.console_logs")]
    ConsoleLogs(ConsoleLogsParams),
    #[serde(rename = "browser.expect_response")]
    ExpectResponse(ExpectResponseParams),
    #[serde(rename = "browser.assert_response")]
    AssertResponse(AssertResponseParams),

    #[serde(rename = "browser.screenshot")]
    Screenshot(ScreenshotParams),
    #[serde(rename = "browser.element_screenshot")]
    ElementScreenshot(ElementScreenshotParams),
    #[serde(rename = "browser.save_pdf")]
    SavePdf(SavePdfParams),

    #[serde(rename = "http.get")]
    HttpGet(UrlParams),
    #[serde(rename = "http.post")]
    HttpPost(HttpPostParams),
    #[serde(rename = "http.put")]
    HttpPut(HttpBodyParams),
    #[serde(rename = "http.patch")]
    HttpPatch(HttpBodyParams),
    #[serde(rename = "http.delete")]
    HttpDelete(UrlParams),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::StartCodegenSession(_) => "codegen.start",
            Action::EndCodegenSession(_) => "codegen.end",
            Action::GetCodegenSession(_) => "codegen.get",
            Action::ClearCodegenSession(_) => "codegen.clear",
            Action::Navigate(_) => "browser.navigate",
            Action::GoBack => "browser.go_back",
            Action::GoForward => "browser.go_forward",
            Action::CloseBrowser => "browser.close",
            Action::SetUserAgent(_) => "browser.user_agent",
            Action::Click(_) => "browser.click",
            Action::DoubleClick(_) => "browser.double_click",
            Action::RightClick(_) => "browser.right_click",
            Action::Fill(_) => "browser.fill",
            Action::TypeText(_) => "browser.type_text",
            Action::Select(_) => "browser.select",
            Action::SelectByLabel(_) => "browser.select_by_label",
            Action::SelectMulti(_) => "browser.select_multi",
            Action::Check(_) => "browser.check",
            Action::Uncheck(_) => "browser.uncheck",
            Action::Hover(_) => "browser.hover",
            Action::Drag(_) => "browser.drag",
            Action::PressKey(_) => "browser.press_key",
            Action::UploadFile(_) => "browser.upload_file",
            Action::ScrollTo(_) => "browser.scroll_to",
            Action::ClickAndSwitchTab(_) => "browser.click_and_switch_tab",
            Action::ClickByTestId(_) => "browser.click_by_test_id",
            Action::FillByTestId(_) => "browser.fill_by_test_id",
            Action::ClickByRole(_) => "browser.click_by_role",
            Action::FillByRole(_) => "browser.fill_by_role",
            Action::ClickByText(_) => "browser.click_by_text",
            Action::FillByText(_) => "browser.fill_by_text",
            Action::ClickByLabel(_) => "browser.click_by_label",
            Action::FillByLabel(_) => "browser.fill_by_label",
            Action::ClickByPlaceholder(_) => "browser.click_by_placeholder",
            Action::FillByPlaceholder(_) => "browser.fill_by_placeholder",
            Action::ClickByTitle(_) => "browser.click_by_title",
            Action::ClickByAlt(_) => "browser.click_by_alt",
            Action::IframeClick(_) => "browser.iframe_click",
            Action::IframeFill(_) => "browser.iframe_fill",
            Action::Evaluate(_) => "browser.evaluate",
            Action::VisibleText => "browser.visible_text",
            Action::VisibleHtml(_) => "browser.visible_html",
            Action::ElementText(_) => "browser.element_text",
            Action::ElementAttribute(_) => "browser.element_attribute",
            Action::ElementExists(_) => "browser.element_exists",
            Action::IsChecked(_) => "browser.is_checked",
            Action::InputValue(_) => "browser.input_value",
            Action::WaitForHidden(_) => "browser.wait_for_hidden",
            Action::WaitForUrl(_) => "browser.wait_for_url",
            Action::ConsoleLogs(_) => "browser.console_logs",
            Action::ExpectResponse(_) => "browser.expect_response",
            Action::AssertResponse(_) => "browser.assert_response",
            Action::Screenshot(_) => "browser.screenshot",
            Action::ElementScreenshot(_) => "browser.element_screenshot",
            Action::SavePdf(_) => "browser.save_pdf",
            Action::HttpGet(_) => "http.get",
            Action::HttpPost(_) => "http.post",
            Action::HttpPut(_) => "http.put",
            Action::HttpPatch(_) => "http.patch",
            Action::HttpDelete(_) => "http.delete",
        }
    }

    pub fn kind(&self) -> ActionKind {
        let name = self.name();
        if name.starts_with("codegen.") {
            ActionKind::Session
        } else if name.starts_with("http.") {
            ActionKind::Http
        } else {
            ActionKind::Browser
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdParams {
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    pub url: String,
    /// Engine to use; a change relative to the live browser forces a
    /// relaunch.
    #[serde(default, rename = "browserType")]
    pub engine: BrowserEngine,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
    #[serde(default)]
    pub wait_until: WaitUntil,
    #[serde(default)]
    pub headless: bool,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserAgentParams {
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ClickParams {
    pub selector: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HoverParams {
    pub selector: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FillParams {
    pub selector: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectParams {
    pub selector: String,
    /// Option value to select.
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectByLabelParams {
    pub selector: String,
    pub label: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectMultiParams {
    pub selector: String,
    pub values: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

/// Selector plus the optional timeout most locator operations share.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TimedSelectorParams {
    pub selector: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TypeTextParams {
    pub selector: String,
    pub text: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DragParams {
    pub source_selector: String,
    pub target_selector: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PressKeyParams {
    /// Key to press, e.g. `Enter`, `ArrowDown`, `a`.
    pub key: String,
    /// Focus this element before pressing.
    #[serde(default)]
    pub selector: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileParams {
    pub selector: String,
    /// Absolute path of the file to attach.
    pub file_path: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ClickAndSwitchTabParams {
    /// Link that opens the new tab.
    pub selector: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestIdClickParams {
    pub test_id: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestIdFillParams {
    pub test_id: String,
    pub text: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RoleClickParams {
    /// ARIA role, e.g. `button`, `link`, `textbox`.
    pub role: String,
    /// Accessible name of the element.
    pub name: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RoleFillParams {
    pub role: String,
    pub name: String,
    pub text: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TextClickParams {
    pub text: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextFillParams {
    /// Text content identifying the element.
    pub text: String,
    /// Text to fill in.
    pub input_text: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LabelClickParams {
    pub label: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LabelFillParams {
    pub label: String,
    pub text: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PlaceholderClickParams {
    pub placeholder: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PlaceholderFillParams {
    pub placeholder: String,
    pub text: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TitleClickParams {
    pub title: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AltClickParams {
    /// Image alt text identifying the element.
    pub alt: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IframeClickParams {
    pub iframe_selector: String,
    pub selector: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IframeFillParams {
    pub iframe_selector: String,
    pub selector: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EvaluateParams {
    /// JavaScript source run in the page.
    pub script: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisibleHtmlParams {
    /// Limit output to the first element matching this selector.
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default = "default_true")]
    pub remove_scripts: bool,
    #[serde(default)]
    pub remove_comments: bool,
    #[serde(default)]
    pub remove_styles: bool,
    #[serde(default)]
    pub remove_meta: bool,
    /// Shorthand for all of the removals above.
    #[serde(default)]
    pub clean_html: bool,
    #[serde(default)]
    pub minify: bool,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AttributeParams {
    pub selector: String,
    pub attribute: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaitForUrlParams {
    /// URL (or pattern) to wait for; without one, reports the current URL.
    #[serde(default)]
    pub expected_url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

/// `all` widens the console query to every kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogTypeFilter {
    #[default]
    All,
    Log,
    Info,
    Warning,
    Error,
    Debug,
    Exception,
}

impl LogTypeFilter {
    pub fn to_kind(self) -> Option<LogKind> {
        match self {
            LogTypeFilter::All => None,
            LogTypeFilter::Log => Some(LogKind::Log),
            LogTypeFilter::Info => Some(LogKind::Info),
            LogTypeFilter::Warning => Some(LogKind::Warning),
            LogTypeFilter::Error => Some(LogKind::Error),
            LogTypeFilter::Debug => Some(LogKind::Debug),
            LogTypeFilter::Exception => Some(LogKind::Exception),
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConsoleLogsParams {
    #[serde(default, rename = "type")]
    pub log_type: LogTypeFilter,
    /// Substring to search for; bracket characters are literal.
    #[serde(default)]
    pub search: Option<String>,
    /// Keep only the most recent N matches.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Empty the store after reading.
    #[serde(default)]
    pub clear: bool,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExpectResponseParams {
    /// Caller-assigned id used to assert on this wait later.
    pub id: String,
    /// URL substring or `*` glob the response must match.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AssertResponseParams {
    pub id: String,
    /// Fail unless the captured body contains this value.
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotParams {
    /// Name the capture is reported (and saved) under.
    pub name: String,
    /// Capture this element instead of the viewport.
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default = "default_shot_width")]
    pub width: u32,
    #[serde(default = "default_shot_height")]
    pub height: u32,
    /// Return the PNG as base64 in the envelope.
    #[serde(default = "default_true")]
    pub store_base64: bool,
    #[serde(default)]
    pub full_page: bool,
    /// Also write a PNG file under `downloadsDir`.
    #[serde(default)]
    pub save_png: bool,
    #[serde(default)]
    pub downloads_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ElementScreenshotParams {
    pub selector: String,
    /// Absolute path the PNG is written to.
    pub path: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavePdfParams {
    /// Directory the PDF is written into.
    pub output_path: String,
    #[serde(default = "default_pdf_filename")]
    pub filename: String,
    /// Page format, e.g. `A4`, `Letter`.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default = "default_true")]
    pub print_background: bool,
    #[serde(default)]
    pub margin: Option<PdfMarginParams>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct PdfMarginParams {
    #[serde(default)]
    pub top: Option<String>,
    #[serde(default)]
    pub right: Option<String>,
    #[serde(default)]
    pub bottom: Option<String>,
    #[serde(default)]
    pub left: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UrlParams {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HttpPostParams {
    pub url: String,
    /// Request body, sent as JSON.
    pub value: String,
    /// Bearer token for the Authorization header.
    #[serde(default)]
    pub token: Option<String>,
    /// Extra request headers.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HttpBodyParams {
    pub url: String,
    pub value: String,
}

/// Placeholder schema for actions that take no arguments.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EmptyParams {}

/// One catalog entry a host can list: name, human description and the
/// argument schema.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: RootSchema,
}

fn schema_for<T: JsonSchema>() -> RootSchema {
    SchemaSettings::draft2019_09()
        .with(|s| {
            s.inline_subschemas = true;
            s.option_add_null_type = false;
        })
        .into_generator()
        .into_root_schema_for::<T>()
}

fn spec<T: JsonSchema>(name: &'static str, description: &'static str) -> ActionSpec {
    ActionSpec {
        name,
        description,
        schema: schema_for::<T>(),
    }
}

/// The full catalog in a stable order: codegen, browser, http.
pub fn catalog() -> Vec<ActionSpec> {
    vec![
        spec::<SessionOptions>(
            "codegen.start",
            "Start a new code generation session to record actions",
        ),
        spec::<SessionIdParams>(
            "codegen.end",
            "End a code generation session and generate the test file",
        ),
        spec::<SessionIdParams>(
            "codegen.get",
            "Get information about a code generation session",
        ),
        spec::<SessionIdParams>(
            "codegen.clear",
            "Clear a code generation session without generating a test",
        ),
        spec::<NavigateParams>("browser.navigate", "Navigate to a URL"),
        spec::<EmptyParams>("browser.go_back", "Navigate back in browser history"),
        spec::<EmptyParams>("browser.go_forward", "Navigate forward in browser history"),
        spec::<EmptyParams>(
            "browser.close",
            "Close the browser and release all resources",
        ),
        spec::<UserAgentParams>("browser.user_agent", "Set a custom User Agent for the browser"),
        spec::<ClickParams>("browser.click", "Click an element on the page"),
        spec::<TimedSelectorParams>("browser.double_click", "Double click an element"),
        spec::<TimedSelectorParams>("browser.right_click", "Right click an element"),
        spec::<FillParams>("browser.fill", "Fill out an input field"),
        spec::<TypeTextParams>(
            "browser.type_text",
            "Type text into an element using keyboard input",
        ),
        spec::<SelectParams>("browser.select", "Select a dropdown option by value"),
        spec::<SelectByLabelParams>(
            "browser.select_by_label",
            "Select a dropdown option by label",
        ),
        spec::<SelectMultiParams>(
            "browser.select_multi",
            "Select multiple options from a dropdown",
        ),
        spec::<TimedSelectorParams>("browser.check", "Check a checkbox or radio button"),
        spec::<TimedSelectorParams>("browser.uncheck", "Uncheck a checkbox"),
        spec::<HoverParams>("browser.hover", "Hover an element on the page"),
        spec::<DragParams>("browser.drag", "Drag an element to a target location"),
        spec::<PressKeyParams>("browser.press_key", "Press a keyboard key"),
        spec::<UploadFileParams>(
            "browser.upload_file",
            "Upload a file to an input[type='file'] element",
        ),
        spec::<TimedSelectorParams>("browser.scroll_to", "Scroll an element into view"),
        spec::<ClickAndSwitchTabParams>(
            "browser.click_and_switch_tab",
            "Click a link and switch to the newly opened tab",
        ),
        spec::<TestIdClickParams>(
            "browser.click_by_test_id",
            "Click an element located by test id attribute",
        ),
        spec::<TestIdFillParams>(
            "browser.fill_by_test_id",
            "Fill an element located by test id attribute",
        ),
        spec::<RoleClickParams>(
            "browser.click_by_role",
            "Click an element located by ARIA role and name",
        ),
        spec::<RoleFillParams>(
            "browser.fill_by_role",
            "Fill an element located by ARIA role and name",
        ),
        spec::<TextClickParams>(
            "browser.click_by_text",
            "Click an element located by text content",
        ),
        spec::<TextFillParams>(
            "browser.fill_by_text",
            "Fill an element located by text content",
        ),
        spec::<LabelClickParams>(
            "browser.click_by_label",
            "Click an element located by label text",
        ),
        spec::<LabelFillParams>(
            "browser.fill_by_label",
            "Fill an element located by label text",
        ),
        spec::<PlaceholderClickParams>(
            "browser.click_by_placeholder",
            "Click an element located by placeholder text",
        ),
        spec::<PlaceholderFillParams>(
            "browser.fill_by_placeholder",
            "Fill an element located by placeholder text",
        ),
        spec::<TitleClickParams>(
            "browser.click_by_title",
            "Click an element located by title attribute",
        ),
        spec::<AltClickParams>(
            "browser.click_by_alt",
            "Click an image located by alt text",
        ),
        spec::<IframeClickParams>("browser.iframe_click", "Click an element inside an iframe"),
        spec::<IframeFillParams>("browser.iframe_fill", "Fill an element inside an iframe"),
        spec::<EvaluateParams>("browser.evaluate", "Execute JavaScript in the browser console"),
        spec::<EmptyParams>(
            "browser.visible_text",
            "Get the visible text content of the current page",
        ),
        spec::<VisibleHtmlParams>(
            "browser.visible_html",
            "Get the HTML content of the current page",
        ),
        spec::<TimedSelectorParams>("browser.element_text", "Get the text content of an element"),
        spec::<AttributeParams>(
            "browser.element_attribute",
            "Get the value of an element's attribute",
        ),
        spec::<TimedSelectorParams>(
            "browser.element_exists",
            "Check whether an element exists on the page",
        ),
        spec::<TimedSelectorParams>("browser.is_checked", "Check whether a checkbox is checked"),
        spec::<TimedSelectorParams>("browser.input_value", "Get the value of an input element"),
        spec::<TimedSelectorParams>(
            "browser.wait_for_hidden",
            "Wait for an element to disappear",
        ),
        spec::<WaitForUrlParams>(
            "browser.wait_for_url",
            "Wait for the page URL to change or match a pattern",
        ),
        spec::<ConsoleLogsParams>(
            "browser.console_logs",
            "Retrieve console logs from the browser with filtering options",
        ),
        spec::<ExpectResponseParams>(
            "browser.expect_response",
            "Start waiting for an HTTP response without blocking",
        ),
        spec::<AssertResponseParams>(
            "browser.assert_response",
            "Wait for and validate a previously expected HTTP response",
        ),
        spec::<ScreenshotParams>(
            "browser.screenshot",
            "Take a screenshot of the current page or a specific element",
        ),
        spec::<ElementScreenshotParams>(
            "browser.element_screenshot",
            "Save a screenshot of a specific element to a file",
        ),
        spec::<SavePdfParams>("browser.save_pdf", "Save the current page as a PDF file"),
        spec::<UrlParams>("http.get", "Perform an HTTP GET request"),
        spec::<HttpPostParams>("http.post", "Perform an HTTP POST request"),
        spec::<HttpBodyParams>("http.put", "Perform an HTTP PUT request"),
        spec::<HttpBodyParams>("http.patch", "Perform an HTTP PATCH request"),
        spec::<UrlParams>("http.delete", "Perform an HTTP DELETE request"),
    ]
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_shot_width() -> u32 {
    800
}

fn default_shot_height() -> u32 {
    600
}

fn default_max_length() -> usize {
    20000
}

fn default_pdf_filename() -> String {
    "page.pdf".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn navigate_applies_defaults() {
        let call = ToolCall::new("browser.navigate", json!({"url": "https://example.com"}));
        let Action::Navigate(params) = call.parse().unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(params.engine, BrowserEngine::Chromium);
        assert_eq!(params.width, 1280);
        assert_eq!(params.height, 720);
        assert_eq!(params.timeout, 30000);
        assert!(!params.headless);
    }

    #[test]
    fn wire_names_are_camel_case() {
        let call = ToolCall::new(
            "browser.iframe_fill",
            json!({"iframeSelector": "#frame", "selector": "input", "value": "hi"}),
        );
        let Action::IframeFill(params) = call.parse().unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(params.iframe_selector, "#frame");
    }

    #[test]
    fn close_takes_no_arguments() {
        let call = ToolCall::new("browser.close", Value::Null);
        let action = call.parse().unwrap();
        assert!(matches!(action, Action::CloseBrowser));
        assert_eq!(action.kind(), ActionKind::Browser);
    }

    #[test]
    fn unknown_action_is_reported_as_such() {
        let call = ToolCall::new("browser.teleport", json!({}));
        let err = call.parse().unwrap_err();
        assert_eq!(format!("{err}"), "Unknown action: browser.teleport");
    }

    #[test]
    fn missing_required_field_is_an_argument_error() {
        let call = ToolCall::new("browser.click", json!({}));
        let err = call.parse().unwrap_err();
        assert!(format!("{err}").contains("Invalid arguments for browser.click"));
    }

    #[test]
    fn catalog_covers_every_group() {
        let specs = catalog();
        assert_eq!(specs.len(), 60);
        assert_eq!(specs.iter().filter(|s| s.name.starts_with("codegen.")).count(), 4);
        assert_eq!(specs.iter().filter(|s| s.name.starts_with("http.")).count(), 5);
    }

    #[test]
    fn every_catalog_name_parses_to_a_variant() {
        for spec in catalog() {
            let call = ToolCall::new(spec.name, json!({}));
            if let Err(err) = call.parse() {
                assert!(
                    matches!(err, CoreError::InvalidArguments(_)),
                    "{} reported: {err}",
                    spec.name
                );
            }
        }
    }

    #[test]
    fn kind_classification_follows_name_prefix() {
        let post = ToolCall::new("http.post", json!({"url": "https://x.test", "value": "{}"}))
            .parse()
            .unwrap();
        assert_eq!(post.kind(), ActionKind::Http);
        let start = ToolCall::new("codegen.start", json!({"outputPath": "/tmp/out"}))
            .parse()
            .unwrap();
        assert_eq!(start.kind(), ActionKind::Session);
    }
}
