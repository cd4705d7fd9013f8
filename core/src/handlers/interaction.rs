use crate::Result;
use crate::actions::DragParams;
use crate::actions::EvaluateParams;
use crate::actions::IframeClickParams;
use crate::actions::IframeFillParams;
use crate::actions::PressKeyParams;
use crate::actions::SelectByLabelParams;
use crate::actions::SelectMultiParams;
use crate::actions::SelectParams;
use crate::actions::TypeTextParams;
use crate::actions::UploadFileParams;
use crate::driver::PageHandle;
use crate::driver::Selection;
use crate::driver::Target;

fn css(selector: &str) -> Target {
    Target::Css(selector.to_string())
}

pub async fn click(page: &dyn PageHandle, selector: &str, timeout_ms: u64) -> Result<Vec<String>> {
    page.click(&css(selector), timeout_ms).await?;
    Ok(vec![format!("Clicked element: {selector}")])
}

pub async fn double_click(
    page: &dyn PageHandle,
    selector: &str,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.double_click(&css(selector), timeout_ms).await?;
    Ok(vec![format!("Double clicked element: {selector}")])
}

pub async fn right_click(
    page: &dyn PageHandle,
    selector: &str,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.right_click(&css(selector), timeout_ms).await?;
    Ok(vec![format!("Right clicked element: {selector}")])
}

/// Clicks via an alternate locator strategy; the message names the strategy
/// the way the catalog exposes it.
pub async fn click_target(
    page: &dyn PageHandle,
    target: Target,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.click(&target, timeout_ms).await?;
    let line = match &target {
        Target::TestId(id) => format!("Clicked element with test ID: {id}"),
        Target::Role { role, name } => {
            format!("Clicked element with role: {role} and name: {name}")
        }
        Target::Text(text) => format!("Clicked element with text: {text}"),
        Target::Label(label) => format!("Clicked element with label: {label}"),
        Target::Placeholder(p) => format!("Clicked element with placeholder: {p}"),
        Target::Title(title) => format!("Clicked element with title: {title}"),
        Target::AltText(alt) => format!("Clicked element with alt text: {alt}"),
        Target::Css(selector) => format!("Clicked element: {selector}"),
    };
    Ok(vec![line])
}

pub async fn fill(
    page: &dyn PageHandle,
    selector: &str,
    value: &str,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.fill(&css(selector), value, timeout_ms).await?;
    Ok(vec![format!("Filled {selector} with: {value}")])
}

pub async fn fill_target(
    page: &dyn PageHandle,
    target: Target,
    text: &str,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.fill(&target, text, timeout_ms).await?;
    let line = match &target {
        Target::TestId(id) => format!("Filled element with test ID: {id} with: {text}"),
        Target::Role { role, name } => {
            format!("Filled element with role: {role} and name: {name} with: {text}")
        }
        Target::Text(t) => format!("Filled element with text: {t} with: {text}"),
        Target::Label(label) => format!("Filled element with label: {label} with: {text}"),
        Target::Placeholder(p) => format!("Filled element with placeholder: {p} with: {text}"),
        Target::Title(title) => format!("Filled element with title: {title} with: {text}"),
        Target::AltText(alt) => format!("Filled element with alt text: {alt} with: {text}"),
        Target::Css(selector) => format!("Filled {selector} with: {text}"),
    };
    Ok(vec![line])
}

pub async fn type_text(page: &dyn PageHandle, params: &TypeTextParams) -> Result<Vec<String>> {
    page.type_text(&css(&params.selector), &params.text, params.timeout)
        .await?;
    Ok(vec![format!(
        "Typed text: {} into element: {}",
        params.text, params.selector
    )])
}

pub async fn select(
    page: &dyn PageHandle,
    params: &SelectParams,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.select(
        &css(&params.selector),
        &Selection::Value(params.value.clone()),
        timeout_ms,
    )
    .await?;
    Ok(vec![format!(
        "Selected {} with: {}",
        params.selector, params.value
    )])
}

pub async fn select_by_label(
    page: &dyn PageHandle,
    params: &SelectByLabelParams,
) -> Result<Vec<String>> {
    page.select(
        &css(&params.selector),
        &Selection::Label(params.label.clone()),
        params.timeout,
    )
    .await?;
    Ok(vec![format!(
        "Selected option with label: {} from: {}",
        params.label, params.selector
    )])
}

pub async fn select_multi(
    page: &dyn PageHandle,
    params: &SelectMultiParams,
) -> Result<Vec<String>> {
    page.select(
        &css(&params.selector),
        &Selection::Values(params.values.clone()),
        params.timeout,
    )
    .await?;
    Ok(vec![format!(
        "Selected multiple options: {} from: {}",
        params.values.join(", "),
        params.selector
    )])
}

pub async fn set_checked(
    page: &dyn PageHandle,
    selector: &str,
    checked: bool,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.set_checked(&css(selector), checked, timeout_ms).await?;
    if checked {
        Ok(vec![format!("Checked element: {selector}")])
    } else {
        Ok(vec![format!("Unchecked element: {selector}")])
    }
}

pub async fn hover(page: &dyn PageHandle, selector: &str, timeout_ms: u64) -> Result<Vec<String>> {
    page.hover(&css(selector), timeout_ms).await?;
    Ok(vec![format!("Hovered {selector}")])
}

pub async fn drag(
    page: &dyn PageHandle,
    params: &DragParams,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.drag(
        &css(&params.source_selector),
        &css(&params.target_selector),
        timeout_ms,
    )
    .await?;
    Ok(vec![format!(
        "Dragged element from {} to {}",
        params.source_selector, params.target_selector
    )])
}

pub async fn press_key(
    page: &dyn PageHandle,
    params: &PressKeyParams,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    let focus = params.selector.as_ref().map(|s| css(s));
    page.press_key(&params.key, focus.as_ref(), timeout_ms)
        .await?;
    Ok(vec![format!("Pressed key: {}", params.key)])
}

pub async fn upload_file(
    page: &dyn PageHandle,
    params: &UploadFileParams,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.upload_file(
        &css(&params.selector),
        std::path::Path::new(&params.file_path),
        timeout_ms,
    )
    .await?;
    Ok(vec![format!(
        "Uploaded file '{}' to '{}'",
        params.file_path, params.selector
    )])
}

pub async fn scroll_to(
    page: &dyn PageHandle,
    selector: &str,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.scroll_into_view(&css(selector), timeout_ms).await?;
    Ok(vec![format!("Scrolled to element: {selector}")])
}

pub async fn iframe_click(
    page: &dyn PageHandle,
    params: &IframeClickParams,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.frame_click(&params.iframe_selector, &css(&params.selector), timeout_ms)
        .await?;
    Ok(vec![format!(
        "Clicked element {} inside iframe {}",
        params.selector, params.iframe_selector
    )])
}

pub async fn iframe_fill(
    page: &dyn PageHandle,
    params: &IframeFillParams,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    page.frame_fill(
        &params.iframe_selector,
        &css(&params.selector),
        &params.value,
        timeout_ms,
    )
    .await?;
    Ok(vec![format!(
        "Filled element {} inside iframe {} with: {}",
        params.selector, params.iframe_selector, params.value
    )])
}

pub async fn evaluate(page: &dyn PageHandle, params: &EvaluateParams) -> Result<Vec<String>> {
    let value = page.evaluate(&params.script).await?;
    let rendered =
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    Ok(vec![
        "Executed JavaScript:".to_string(),
        params.script.clone(),
        "Result:".to_string(),
        rendered,
    ])
}
