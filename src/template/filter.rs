// Placeholder filters.
// Parses `name[=param]` tokens into typed filters and applies them to field values.

use super::date;
use super::render::RenderContext;

/// What a filter does, resolved once when the placeholder is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    /// Format the value as a date.
    Date,
    /// Value is already markup; suppresses the implicit escape.
    Html,
    /// HTML-escape the value.
    Safe,
    /// Unrecognized filter, passes the value through.
    Identity(String),
}

impl FilterKind {
    fn from_name(name: &str) -> Self {
        match name {
            "date" => FilterKind::Date,
            "html" => FilterKind::Html,
            "safe" => FilterKind::Safe,
            other => FilterKind::Identity(other.to_string()),
        }
    }
}

/// A single filter with its optional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub kind: FilterKind,
    pub param: Option<String>,
}

impl Filter {
    /// Parse `name` or `name=param`, splitting at the first `=`.
    pub fn parse(token: &str) -> Self {
        let (name, param) = match token.split_once('=') {
            Some((name, param)) => (name, Some(param.to_string())),
            None => (token, None),
        };
        Self {
            kind: FilterKind::from_name(name),
            param,
        }
    }

    fn safe() -> Self {
        Self {
            kind: FilterKind::Safe,
            param: None,
        }
    }

    /// Apply this filter to a value. `None` stands for a null value.
    pub fn apply(&self, value: Option<String>, ctx: &RenderContext) -> Option<String> {
        match &self.kind {
            FilterKind::Date => {
                let value = value.filter(|v| !v.is_empty())?;
                let format = ctx.date_format(self.param.as_deref());
                let timestamp = date::parse_timestamp(&value)?;
                Some(date::format(&timestamp.with_timezone(&ctx.offset), format))
            }
            FilterKind::Safe => value.map(|v| escape_html(&v)),
            FilterKind::Html | FilterKind::Identity(_) => value,
        }
    }
}

/// HTML-escape `value` without double-encoding entities it already contains.
///
/// `< > " '` and bare `&` are encoded; an `&` that starts `&name;`, `&#NN;`
/// or `&#xHH;` is copied as is.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&html_escape::encode_quoted_attribute(&rest[..amp]));
        let tail = &rest[amp..];
        match entity_len(tail) {
            Some(len) => {
                out.push_str(&tail[..len]);
                rest = &tail[len..];
            }
            None => {
                out.push_str("&amp;");
                rest = &tail[1..];
            }
        }
    }
    out.push_str(&html_escape::encode_quoted_attribute(rest));
    out
}

/// Byte length of the character reference at the start of `text`, if any.
fn entity_len(text: &str) -> Option<usize> {
    let end = text.find(';')?;
    let body = text.get(1..end)?;
    let valid = match body.strip_prefix('#') {
        Some(numeric) => match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !numeric.is_empty() && numeric.chars().all(|c| c.is_ascii_digit()),
        },
        None => {
            body.starts_with(|c: char| c.is_ascii_alphabetic())
                && body.chars().all(|c| c.is_ascii_alphanumeric())
        }
    };
    valid.then_some(end + 1)
}

/// Parse a filter list (the text after `:`), appending the implicit `safe`
/// filter unless `html` is present.
pub fn parse_chain(list: Option<&str>) -> Vec<Filter> {
    let mut filters: Vec<Filter> = list
        .map(|list| list.split(';').map(Filter::parse).collect())
        .unwrap_or_default();

    if !filters.iter().any(|f| f.kind == FilterKind::Html) {
        filters.push(Filter::safe());
    }
    filters
}

/// Run a chain left to right, each filter receiving the previous output.
pub fn apply_chain(filters: &[Filter], value: Option<String>, ctx: &RenderContext) -> Option<String> {
    filters
        .iter()
        .fold(value, |value, filter| filter.apply(value, ctx))
}
