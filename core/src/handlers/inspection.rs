use once_cell::sync::Lazy;
use regex::Regex;

use crate::Result;
use crate::actions::AttributeParams;
use crate::actions::TimedSelectorParams;
use crate::actions::VisibleHtmlParams;
use crate::driver::ElementState;
use crate::driver::PageHandle;
use crate::driver::Target;

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| compile(r"(?is)<script\b.*?</script>"));
static STYLE_RE: Lazy<Regex> = Lazy::new(|| compile(r"(?is)<style\b.*?</style>"));
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| compile(r"(?s)<!--.*?-->"));
static META_RE: Lazy<Regex> = Lazy::new(|| compile(r"(?i)<meta\s[^>]*>"));
static INTER_TAG_WS_RE: Lazy<Regex> = Lazy::new(|| compile(r">\s+<"));
static WS_RUN_RE: Lazy<Regex> = Lazy::new(|| compile(r"\s{2,}"));

#[expect(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

pub async fn visible_text(page: &dyn PageHandle) -> Result<Vec<String>> {
    let text = page.visible_text().await?;
    Ok(vec!["Visible text content:".to_string(), text])
}

pub async fn visible_html(
    page: &dyn PageHandle,
    params: &VisibleHtmlParams,
) -> Result<Vec<String>> {
    let scope = params.selector.as_ref().map(|s| Target::Css(s.clone()));
    let mut html = page.content(scope.as_ref()).await?;

    // cleanHtml is shorthand for every removal filter at once.
    if params.remove_scripts || params.clean_html {
        html = SCRIPT_RE.replace_all(&html, "").into_owned();
    }
    if params.remove_styles || params.clean_html {
        html = STYLE_RE.replace_all(&html, "").into_owned();
    }
    if params.remove_comments || params.clean_html {
        html = COMMENT_RE.replace_all(&html, "").into_owned();
    }
    if params.remove_meta || params.clean_html {
        html = META_RE.replace_all(&html, "").into_owned();
    }
    if params.minify {
        html = INTER_TAG_WS_RE.replace_all(&html, "><").into_owned();
        html = WS_RUN_RE.replace_all(&html, " ").into_owned();
        html = html.trim().to_string();
    }
    if params.max_length > 0 && html.len() > params.max_length {
        let mut end = params.max_length;
        while end > 0 && !html.is_char_boundary(end) {
            end -= 1;
        }
        html.truncate(end);
        html.push_str("...");
    }

    Ok(vec!["HTML content:".to_string(), html])
}

pub async fn element_text(
    page: &dyn PageHandle,
    params: &TimedSelectorParams,
) -> Result<Vec<String>> {
    let text = page
        .text_content(&Target::Css(params.selector.clone()), params.timeout)
        .await?;
    Ok(vec![format!("Element text content: {text}")])
}

pub async fn element_attribute(
    page: &dyn PageHandle,
    params: &AttributeParams,
) -> Result<Vec<String>> {
    let value = page
        .attribute(
            &Target::Css(params.selector.clone()),
            &params.attribute,
            params.timeout,
        )
        .await?;
    let line = match value {
        Some(value) => format!("Element attribute {}: {value}", params.attribute),
        None => format!(
            "Attribute {} not found on element: {}",
            params.attribute, params.selector
        ),
    };
    Ok(vec![line])
}

/// A missing element is an answer here, not a fault.
pub async fn element_exists(
    page: &dyn PageHandle,
    params: &TimedSelectorParams,
) -> Result<Vec<String>> {
    let found = page
        .exists(&Target::Css(params.selector.clone()), params.timeout)
        .await?;
    let line = if found {
        format!("Element exists: {}", params.selector)
    } else {
        format!("Element does not exist: {}", params.selector)
    };
    Ok(vec![line])
}

pub async fn is_checked(
    page: &dyn PageHandle,
    params: &TimedSelectorParams,
) -> Result<Vec<String>> {
    let checked = page
        .is_checked(&Target::Css(params.selector.clone()), params.timeout)
        .await?;
    Ok(vec![format!("Element checked state: {checked}")])
}

pub async fn input_value(
    page: &dyn PageHandle,
    params: &TimedSelectorParams,
) -> Result<Vec<String>> {
    let value = page
        .input_value(&Target::Css(params.selector.clone()), params.timeout)
        .await?;
    Ok(vec![format!("Input value: {value}")])
}

pub async fn wait_for_hidden(
    page: &dyn PageHandle,
    params: &TimedSelectorParams,
) -> Result<Vec<String>> {
    page.wait_for(
        &Target::Css(params.selector.clone()),
        ElementState::Hidden,
        params.timeout,
    )
    .await?;
    Ok(vec![format!("Element is now hidden: {}", params.selector)])
}
