// Placeholder substitution and container assembly.
// Replaces `[field]` / `[field:filter;filter=param]` tokens in loop templates with record values.

use chrono::{FixedOffset, Offset, Utc};

use crate::config::FALLBACK_DATE_FORMAT;
use crate::feed::{FeedRecord, Field};

use super::filter::{apply_chain, parse_chain};

/// Placeholder replaced by the rendered items in the container template.
pub const FEED_PLACEHOLDER: &str = "[feed]";

/// Ambient values filters need while rendering.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// The advanced `date_format` setting (empty means unset).
    pub date_format: String,
    /// Host default date format.
    pub host_date_format: Option<String>,
    /// Offset dates are displayed in.
    pub offset: FixedOffset,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            date_format: String::new(),
            host_date_format: None,
            offset: Utc.fix(),
        }
    }
}

impl RenderContext {
    /// Resolve the date format: filter param, then setting, then host, then fallback.
    pub fn date_format<'a>(&'a self, param: Option<&'a str>) -> &'a str {
        [
            param,
            Some(self.date_format.as_str()),
            self.host_date_format.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|format| !format.is_empty())
        .unwrap_or(FALLBACK_DATE_FORMAT)
    }
}

/// Substitute every placeholder for `field` in `template`.
///
/// A `[field...]` match whose text after the field name does not start with
/// `:` belongs to some other token (e.g. `[titleX]`) and is skipped. Scanning
/// resumes after each inserted value, so inserted text is never re-scanned.
pub fn replace_field(
    template: &str,
    field: Field,
    value: Option<&str>,
    ctx: &RenderContext,
) -> String {
    let open = format!("[{}", field.name());
    let mut item = template.to_string();
    let mut offset = 0;

    while let Some(start) = item[offset..].find(&open).map(|i| offset + i) {
        let after = start + open.len();
        let Some(tail) = item[after..].find(']').map(|i| after + i) else {
            break;
        };

        let trail = &item[after..tail];
        if !trail.is_empty() && !trail.starts_with(':') {
            offset = tail + 1;
            continue;
        }

        let filters = parse_chain(trail.strip_prefix(':'));
        let replacement = apply_chain(&filters, value.map(str::to_string), ctx).unwrap_or_default();

        item.replace_range(start..=tail, &replacement);
        offset = start + replacement.len();
    }

    item
}

/// Render one record through the loop template, field by field.
pub fn render_item(
    template: &str,
    record: &FeedRecord,
    fields: &[Field],
    ctx: &RenderContext,
) -> String {
    fields.iter().fold(template.to_string(), |item, field| {
        replace_field(&item, *field, record.get(*field).as_deref(), ctx)
    })
}

/// Inject the concatenated items into the container template.
pub fn render_container<S: AsRef<str>>(container: &str, items: &[S]) -> String {
    let feed: String = items.iter().map(AsRef::as_ref).collect();
    container.replace(FEED_PLACEHOLDER, &feed)
}

/// Render all records and wrap them in the container.
pub fn render_feed(
    loop_template: &str,
    container: &str,
    records: &[FeedRecord],
    ctx: &RenderContext,
) -> String {
    let items: Vec<String> = records
        .iter()
        .map(|record| render_item(loop_template, record, &Field::ALL, ctx))
        .collect();
    render_container(container, &items)
}

/// Built-in stylesheet for the default templates.
pub fn default_stylesheet(name: &str) -> String {
    format!(
        r#".{name} {{
	display: block;
	padding: 10px 0;
}}
.{name}-item {{
	padding: 5px 0;
}}
.{name}-title {{
	display: inline-block;
	width: 100%;
}}
.{name}-title > *:first-child {{
	float: left;
}}
.{name}-title > *:last-child {{
	float: right;
}}
.{name}-item-date {{
	font-size: 0.8rem;
	display: block;
	clear: both;
}}
.{name} *:empty {{
	display: none;
}}"#,
        name = name
    )
}

/// Stylesheet to emit: the built-in one when `template_css` is empty, else
/// `template_css` trimmed. A whitespace-only value therefore emits nothing.
pub fn stylesheet(template_css: &str, name: &str) -> String {
    if template_css.is_empty() {
        default_stylesheet(name)
    } else {
        template_css.trim().to_string()
    }
}
