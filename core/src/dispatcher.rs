//! Routes tool calls to their handlers and folds every outcome into an
//! [`ExecutionResult`]. Faults never cross this boundary as errors; the
//! caller always gets an envelope.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::Result;
use crate::actions::Action;
use crate::actions::ActionKind;
use crate::actions::ToolCall;
use crate::codegen::CodegenBackend;
use crate::codegen::CodegenSessions;
use crate::codegen::RecordedAction;
use crate::config::CoreConfig;
use crate::console::ConsoleStore;
use crate::console::LogFilter;
use crate::correlator::ResponseCorrelator;
use crate::driver::Driver;
use crate::driver::Target;
use crate::envelope::ExecutionResult;
use crate::handlers::capture;
use crate::handlers::inspection;
use crate::handlers::interaction;
use crate::handlers::navigation;
use crate::http;
use crate::manager::PageManager;

pub struct Dispatcher {
    manager: PageManager,
    console: Arc<ConsoleStore>,
    correlator: Arc<ResponseCorrelator>,
    sessions: CodegenSessions,
    client: reqwest::Client,
    config: CoreConfig,
}

impl Dispatcher {
    pub fn new(
        driver: Arc<dyn Driver>,
        backend: Arc<dyn CodegenBackend>,
        config: CoreConfig,
    ) -> Self {
        let console = Arc::new(ConsoleStore::new(config.console_capacity));
        let correlator = Arc::new(ResponseCorrelator::new(
            config.response_window_ms,
            config.response_body_limit,
        ));
        let manager = PageManager::new(driver, console.clone(), correlator.clone());
        Self {
            manager,
            console,
            correlator,
            sessions: CodegenSessions::new(backend),
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn manager(&self) -> &PageManager {
        &self.manager
    }

    pub fn sessions(&self) -> &CodegenSessions {
        &self.sessions
    }

    pub fn console(&self) -> &ConsoleStore {
        &self.console
    }

    /// Runs one call end to end. Parse faults, handler faults and launch
    /// faults all come back as error envelopes. Every successfully parsed
    /// browser or HTTP call is offered to active codegen sessions, errored
    /// handlers included, so generated scripts reflect what was attempted.
    pub async fn dispatch(&self, call: &ToolCall) -> ExecutionResult {
        let action = match call.parse() {
            Ok(action) => action,
            Err(err) => return ExecutionResult::error(err.to_string()),
        };
        debug!("dispatching {}", action.name());

        let envelope = match self.execute(&action).await {
            Ok(messages) => ExecutionResult::ok(messages),
            Err(err) => ExecutionResult::error(err.to_string()),
        };

        if action.kind() != ActionKind::Session && self.sessions.has_active().await {
            let record = RecordedAction {
                tool_name: action.name().to_string(),
                arguments: call.arguments.clone(),
                timestamp: Utc::now(),
                outcome_summary: envelope.summary(),
            };
            self.sessions.record_all(&record).await;
        }

        envelope
    }

    async fn execute(&self, action: &Action) -> Result<Vec<String>> {
        match action.kind() {
            ActionKind::Session => self.execute_session(action).await,
            ActionKind::Http => self.execute_http(action).await,
            ActionKind::Browser => self.execute_browser(action).await,
        }
    }

    async fn execute_session(&self, action: &Action) -> Result<Vec<String>> {
        match action {
            Action::StartCodegenSession(options) => {
                let id = self.sessions.start(options.clone()).await?;
                Ok(vec![format!("Started codegen session: {id}")])
            }
            Action::EndCodegenSession(params) => {
                let path = self.sessions.end(&params.session_id).await?;
                Ok(vec![
                    format!("Ended codegen session: {}", params.session_id),
                    format!("Generated test written to: {}", path.display()),
                ])
            }
            Action::GetCodegenSession(params) => {
                let snapshot = self.sessions.snapshot(&params.session_id).await?;
                Ok(vec![
                    format!("Codegen session: {}", snapshot.id),
                    format!("State: {}", snapshot.state),
                    format!("Actions recorded: {}", snapshot.action_count),
                    format!("Created at: {}", snapshot.created_at.to_rfc3339()),
                ])
            }
            Action::ClearCodegenSession(params) => {
                self.sessions.clear(&params.session_id).await?;
                Ok(vec![format!(
                    "Cleared codegen session: {}",
                    params.session_id
                )])
            }
            _ => unreachable!("non-session action routed to session executor"),
        }
    }

    async fn execute_http(&self, action: &Action) -> Result<Vec<String>> {
        match action {
            Action::HttpGet(params) => http::get(&self.client, &params.url).await,
            Action::HttpPost(params) => http::post(&self.client, params).await,
            Action::HttpPut(params) => http::put(&self.client, params).await,
            Action::HttpPatch(params) => http::patch(&self.client, params).await,
            Action::HttpDelete(params) => http::delete(&self.client, &params.url).await,
            _ => unreachable!("non-http action routed to http executor"),
        }
    }

    async fn execute_browser(&self, action: &Action) -> Result<Vec<String>> {
        // Lifecycle actions manage the browser themselves; close stays a
        // no-op on a closed browser instead of launching one to close.
        match action {
            Action::Navigate(params) => {
                return navigation::navigate(&self.manager, &self.config, params).await;
            }
            Action::SetUserAgent(params) => {
                return navigation::set_user_agent(&self.manager, &self.config, params).await;
            }
            Action::CloseBrowser => return navigation::close(&self.manager).await,
            _ => {}
        }

        let options = self
            .manager
            .current_options()
            .await
            .unwrap_or_else(|| self.config.launch.clone());
        let page = self.manager.ensure_page(&options).await?;
        let page = page.as_ref();
        let timeout = self.config.element_timeout_ms;

        match action {
            Action::GoBack => navigation::go_back(page).await,
            Action::GoForward => navigation::go_forward(page).await,
            Action::WaitForUrl(params) => navigation::wait_for_url(page, params).await,
            Action::ClickAndSwitchTab(params) => {
                navigation::click_and_switch_tab(&self.manager, page, params, timeout).await
            }

            Action::Click(params) => interaction::click(page, &params.selector, timeout).await,
            Action::DoubleClick(params) => {
                interaction::double_click(page, &params.selector, params.timeout).await
            }
            Action::RightClick(params) => {
                interaction::right_click(page, &params.selector, params.timeout).await
            }
            Action::Fill(params) => {
                interaction::fill(page, &params.selector, &params.value, timeout).await
            }
            Action::TypeText(params) => interaction::type_text(page, params).await,
            Action::Select(params) => interaction::select(page, params, timeout).await,
            Action::SelectByLabel(params) => interaction::select_by_label(page, params).await,
            Action::SelectMulti(params) => interaction::select_multi(page, params).await,
            Action::Check(params) => {
                interaction::set_checked(page, &params.selector, true, params.timeout).await
            }
            Action::Uncheck(params) => {
                interaction::set_checked(page, &params.selector, false, params.timeout).await
            }
            Action::Hover(params) => interaction::hover(page, &params.selector, timeout).await,
            Action::Drag(params) => interaction::drag(page, params, timeout).await,
            Action::PressKey(params) => interaction::press_key(page, params, timeout).await,
            Action::UploadFile(params) => interaction::upload_file(page, params, timeout).await,
            Action::ScrollTo(params) => {
                interaction::scroll_to(page, &params.selector, params.timeout).await
            }

            Action::ClickByTestId(params) => {
                let target = Target::TestId(params.test_id.clone());
                interaction::click_target(page, target, params.timeout).await
            }
            Action::FillByTestId(params) => {
                let target = Target::TestId(params.test_id.clone());
                interaction::fill_target(page, target, &params.text, params.timeout).await
            }
            Action::ClickByRole(params) => {
                let target = Target::Role {
                    role: params.role.clone(),
                    name: params.name.clone(),
                };
                interaction::click_target(page, target, params.timeout).await
            }
            Action::FillByRole(params) => {
                let target = Target::Role {
                    role: params.role.clone(),
                    name: params.name.clone(),
                };
                interaction::fill_target(page, target, &params.text, params.timeout).await
            }
            Action::ClickByText(params) => {
                let target = Target::Text(params.text.clone());
                interaction::click_target(page, target, params.timeout).await
            }
            Action::FillByText(params) => {
                let target = Target::Text(params.text.clone());
                interaction::fill_target(page, target, &params.input_text, params.timeout).await
            }
            Action::ClickByLabel(params) => {
                let target = Target::Label(params.label.clone());
                interaction::click_target(page, target, params.timeout).await
            }
            Action::FillByLabel(params) => {
                let target = Target::Label(params.label.clone());
                interaction::fill_target(page, target, &params.text, params.timeout).await
            }
            Action::ClickByPlaceholder(params) => {
                let target = Target::Placeholder(params.placeholder.clone());
                interaction::click_target(page, target, params.timeout).await
            }
            Action::FillByPlaceholder(params) => {
                let target = Target::Placeholder(params.placeholder.clone());
                interaction::fill_target(page, target, &params.text, params.timeout).await
            }
            Action::ClickByTitle(params) => {
                let target = Target::Title(params.title.clone());
                interaction::click_target(page, target, params.timeout).await
            }
            Action::ClickByAlt(params) => {
                let target = Target::AltText(params.alt.clone());
                interaction::click_target(page, target, params.timeout).await
            }

            Action::IframeClick(params) => interaction::iframe_click(page, params, timeout).await,
            Action::IframeFill(params) => interaction::iframe_fill(page, params, timeout).await,

            Action::Evaluate(params) => interaction::evaluate(page, params).await,
            Action::VisibleText => inspection::visible_text(page).await,
            Action::VisibleHtml(params) => inspection::visible_html(page, params).await,
            Action::ElementText(params) => inspection::element_text(page, params).await,
            Action::ElementAttribute(params) => inspection::element_attribute(page, params).await,
            Action::ElementExists(params) => inspection::element_exists(page, params).await,
            Action::IsChecked(params) => inspection::is_checked(page, params).await,
            Action::InputValue(params) => inspection::input_value(page, params).await,
            Action::WaitForHidden(params) => inspection::wait_for_hidden(page, params).await,

            Action::ConsoleLogs(params) => {
                let filter = LogFilter {
                    kind: params.log_type.to_kind(),
                    search: params.search.clone(),
                    limit: params.limit,
                };
                let entries = self.console.query(&filter, params.clear).await;
                let mut messages = vec![format!("Retrieved {} console log(s):", entries.len())];
                messages.extend(
                    entries
                        .iter()
                        .map(|entry| format!("[{}] {}", entry.kind, entry.text)),
                );
                Ok(messages)
            }
            Action::ExpectResponse(params) => {
                self.correlator.expect(&params.id, &params.url).await?;
                Ok(vec![format!(
                    "Started waiting for response matching: {} (id: {})",
                    params.url, params.id
                )])
            }
            Action::AssertResponse(params) => {
                let response = self
                    .correlator
                    .assert(&params.id, params.value.as_deref())
                    .await?;
                Ok(vec![
                    format!("Response assertion passed (id: {})", params.id),
                    format!("URL: {}", response.url),
                    format!("Status: {}", response.status),
                ])
            }

            Action::Screenshot(params) => capture::screenshot(page, params, timeout).await,
            Action::ElementScreenshot(params) => capture::element_screenshot(page, params).await,
            Action::SavePdf(params) => capture::save_pdf(page, params).await,

            Action::Navigate(_) | Action::SetUserAgent(_) | Action::CloseBrowser => {
                unreachable!("handled before the page is ensured")
            }
            Action::StartCodegenSession(_)
            | Action::EndCodegenSession(_)
            | Action::GetCodegenSession(_)
            | Action::ClearCodegenSession(_)
            | Action::HttpGet(_)
            | Action::HttpPost(_)
            | Action::HttpPut(_)
            | Action::HttpPatch(_)
            | Action::HttpDelete(_) => {
                unreachable!("non-browser action routed to browser executor")
            }
        }
    }
}
