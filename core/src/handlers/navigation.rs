use crate::CoreError;
use crate::Result;
use crate::actions::ClickAndSwitchTabParams;
use crate::actions::NavigateParams;
use crate::actions::UserAgentParams;
use crate::actions::WaitForUrlParams;
use crate::config::CoreConfig;
use crate::config::LaunchOptions;
use crate::config::Viewport;
use crate::driver::PageHandle;
use crate::driver::Target;
use crate::manager::PageManager;

/// Ensures a page matching the requested engine/viewport/headless flags
/// (relaunching if the live one differs), then navigates. The user agent of
/// a live instance is carried over so navigation alone never drops it.
pub async fn navigate(
    manager: &PageManager,
    config: &CoreConfig,
    params: &NavigateParams,
) -> Result<Vec<String>> {
    let base = manager
        .current_options()
        .await
        .unwrap_or_else(|| config.launch.clone());
    let wanted = LaunchOptions {
        engine: params.engine,
        viewport: Viewport {
            width: params.width,
            height: params.height,
        },
        headless: params.headless,
        timeout_ms: params.timeout,
        user_agent: base.user_agent,
    };
    let page = manager.ensure_page(&wanted).await?;
    page.navigate(&params.url, params.wait_until, params.timeout)
        .await?;
    Ok(vec![format!("Navigated to {}", params.url)])
}

pub async fn go_back(page: &dyn PageHandle) -> Result<Vec<String>> {
    page.go_back().await?;
    Ok(vec!["Navigated back in browser history".to_string()])
}

pub async fn go_forward(page: &dyn PageHandle) -> Result<Vec<String>> {
    page.go_forward().await?;
    Ok(vec!["Navigated forward in browser history".to_string()])
}

pub async fn close(manager: &PageManager) -> Result<Vec<String>> {
    manager.close_all().await;
    Ok(vec!["Browser closed successfully".to_string()])
}

/// A custom user agent is a launch parameter, so applying one to a live
/// browser means a relaunch with the agent set.
pub async fn set_user_agent(
    manager: &PageManager,
    config: &CoreConfig,
    params: &UserAgentParams,
) -> Result<Vec<String>> {
    let mut wanted = manager
        .current_options()
        .await
        .unwrap_or_else(|| config.launch.clone());
    wanted.user_agent = Some(params.user_agent.clone());
    manager.ensure_page(&wanted).await?;
    Ok(vec![format!("User agent set to: {}", params.user_agent)])
}

pub async fn wait_for_url(page: &dyn PageHandle, params: &WaitForUrlParams) -> Result<Vec<String>> {
    let url = page
        .wait_for_url(params.expected_url.as_deref(), params.timeout)
        .await?;
    match params.expected_url {
        Some(_) => Ok(vec![format!("URL changed to: {url}")]),
        None => Ok(vec!["Page load completed".to_string()]),
    }
}

/// Arms the new-page wait concurrently with the click, then promotes the
/// freshly opened tab to the active page.
pub async fn click_and_switch_tab(
    manager: &PageManager,
    page: &dyn PageHandle,
    params: &ClickAndSwitchTabParams,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    let browser = manager
        .browser()
        .await
        .ok_or_else(|| CoreError::Launch("no live browser".to_string()))?;
    let target = Target::Css(params.selector.clone());
    let (new_page, clicked) = tokio::join!(
        browser.wait_for_page(timeout_ms),
        page.click(&target, timeout_ms)
    );
    clicked?;
    let new_page = new_page?;
    let url = new_page.url().await?;
    manager.set_active_page(new_page).await;
    Ok(vec![format!("Clicked link and switched to new tab: {url}")])
}
