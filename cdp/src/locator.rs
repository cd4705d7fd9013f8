//! Translates locator targets into JavaScript lookup expressions. CSS
//! selectors go straight through `querySelector`; the other strategies scan
//! the DOM the way the dedicated locator actions describe elements: by test
//! id, accessible role and name, visible text, label, and so on.
//!
//! Every expression evaluates to the first matching element or `null`, and
//! resolves against `root`, which is `document` for the page itself or a
//! frame's `contentDocument` binding for iframe lookups.

use pagehand_core::driver::Target;

pub(crate) fn lookup_expression(target: &Target, root: &str) -> String {
    match target {
        Target::Css(selector) => {
            format!("{root}.querySelector({})", js_string(selector))
        }
        Target::TestId(id) => attribute_scan(root, "data-testid", id),
        Target::Placeholder(placeholder) => attribute_scan(root, "placeholder", placeholder),
        Target::Title(title) => attribute_scan(root, "title", title),
        Target::AltText(alt) => attribute_scan(root, "alt", alt),
        Target::Role { role, name } => role_scan(root, role, name),
        Target::Text(text) => text_scan(root, text),
        Target::Label(label) => label_scan(root, label),
    }
}

/// First element carrying `attribute` with exactly the wanted value. The
/// comparison happens in JS rather than in a CSS attribute selector so the
/// needle never has to be escaped into selector syntax.
fn attribute_scan(root: &str, attribute: &str, needle: &str) -> String {
    format!(
        "(Array.from({root}.querySelectorAll(\"[{attribute}]\"))\
         .find((el) => el.getAttribute(\"{attribute}\") === {needle}) || null)",
        needle = js_string(needle),
    )
}

/// Approximates a role lookup: explicit `role` attributes first, then the
/// implicit roles of common tags, filtered by accessible name. The name is
/// taken from `aria-label`, an associated label, `alt`, `title`, or the
/// collapsed text content, in that order.
fn role_scan(root: &str, role: &str, name: &str) -> String {
    format!(
        r#"(() => {{
  const role = {role};
  const name = {name};
  const implicit = {{
    button: 'button, input[type="button"], input[type="submit"], input[type="reset"]',
    link: 'a[href], area[href]',
    checkbox: 'input[type="checkbox"]',
    radio: 'input[type="radio"]',
    textbox: 'textarea, input:not([type]), input[type="text"], input[type="email"], input[type="password"], input[type="search"], input[type="tel"], input[type="url"]',
    combobox: 'select',
    heading: 'h1, h2, h3, h4, h5, h6',
    img: 'img',
    list: 'ul, ol',
    listitem: 'li',
  }};
  const explicit = Array.from({root}.querySelectorAll('[role]'))
    .filter((el) => el.getAttribute('role') === role);
  const tagged = implicit[role] ? Array.from({root}.querySelectorAll(implicit[role])) : [];
  const accessibleName = (el) => {{
    const aria = el.getAttribute('aria-label');
    if (aria) return aria.trim();
    if (el.labels && el.labels.length > 0) return (el.labels[0].textContent || '').trim();
    const alt = el.getAttribute('alt');
    if (alt) return alt.trim();
    const title = el.getAttribute('title');
    if (title) return title.trim();
    return (el.textContent || '').replace(/\s+/g, ' ').trim();
  }};
  return explicit.concat(tagged).find((el) => accessibleName(el) === name) || null;
}})()"#,
        role = js_string(role),
        name = js_string(name),
    )
}

/// Innermost element whose collapsed text contains the needle, so a match
/// lands on the `<button>` rather than the `<body>` that also contains it.
fn text_scan(root: &str, text: &str) -> String {
    format!(
        r#"(() => {{
  const needle = {needle};
  const matches = Array.from({root}.querySelectorAll('*'))
    .filter((el) => (el.textContent || '').replace(/\s+/g, ' ').trim().includes(needle));
  return matches.find((el) => !matches.some((other) => other !== el && el.contains(other))) || null;
}})()"#,
        needle = js_string(text),
    )
}

/// Form control for a `<label>` with the given text, resolved through
/// `htmlFor` or nesting, with `aria-label` as the fallback.
fn label_scan(root: &str, label: &str) -> String {
    format!(
        r#"(() => {{
  const text = {needle};
  const label = Array.from({root}.querySelectorAll('label'))
    .find((l) => (l.textContent || '').replace(/\s+/g, ' ').trim() === text);
  if (label) {{
    if (label.htmlFor) {{
      const el = {root}.getElementById(label.htmlFor);
      if (el) return el;
    }}
    const nested = label.querySelector('input, textarea, select');
    if (nested) return nested;
  }}
  return Array.from({root}.querySelectorAll('[aria-label]'))
    .find((el) => el.getAttribute('aria-label') === text) || null;
}})()"#,
        needle = js_string(label),
    )
}

/// Renders `text` as a double-quoted JavaScript string literal. JSON string
/// escaping is a subset of JS, so this is safe for any needle.
pub(crate) fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}
