//! Content persisted by older editor generations: raw HTML with formula
//! spans, or plain strings with `$...$` math.

use crate::model::ContentSegment;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Turns legacy markup into a plain string whose math is `$`/`$$` delimited.
pub trait LegacyConverter {
    fn convert(&self, html: &str) -> String;
}

static STRUCTURAL_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(?:p|br|div|span|sup|sub|strong|em|b|i|u|ol|ul|li|table|tr|td)\b[^>]*>")
        .expect("structural tag regex")
});
static STASHED: Lazy<Regex> =
    Lazy::new(|| Regex::new("\u{e000}([0-9]+)\u{e001}").expect("stash marker regex"));
static DATA_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)data-value\s*=\s*"([^"]*)""#).expect("data-value regex"));
static SUP_SUB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(sup|sub)\b[^>]*>(.*?)</(?:sup|sub)\s*>").expect("sup/sub regex"));
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|tr)\s*>").expect("line break regex")
});
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));
static NUMERIC_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("entity regex"));
static PAREN_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\\((.*?)\\\)|\\\[(.*?)\\\]").expect("paren math regex"));

/// Does this string look like markup from the old rich-text editor?
pub fn looks_like_legacy_html(s: &str) -> bool {
    s.contains("ql-formula") || s.contains("math-tex") || STRUCTURAL_TAG.is_match(s)
}

pub fn decode_entities(s: &str) -> String {
    let named = s
        .replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");
    let numeric = NUMERIC_ENTITY.replace_all(&named, |c: &Captures| {
        let code = &c[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value.and_then(char::from_u32).map(String::from).unwrap_or_default()
    });
    // last so "&amp;lt;" stays "&lt;"
    numeric.replace("&amp;", "&")
}

fn inline_math(tex: &str) -> String {
    format!("${}$", tex.trim())
}

/// Converts formula spans (`ql-formula` with `data-value`, `math-tex` with
/// `\( \)` or `\[ \]`), `<sup>`/`<sub>`, and line-breaking tags; strips the rest.
///
/// Converted math is set aside behind private-use markers while tags are
/// stripped and entities decoded, so a decoded `<` inside a formula is never
/// mistaken for markup.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlLegacyConverter;

impl LegacyConverter for HtmlLegacyConverter {
    fn convert(&self, html: &str) -> String {
        let html = html.replace([STASH_OPEN, STASH_CLOSE], "");
        let mut stash = Vec::new();
        let s = lift_formula_spans(&html, &mut stash);
        let s = SUP_SUB.replace_all(&s, |c: &Captures| {
            let mark = if c[1].eq_ignore_ascii_case("sup") { '^' } else { '_' };
            let body = decode_entities(&ANY_TAG.replace_all(&c[2], ""));
            stash_math(&mut stash, format!("${}{{{}}}$", mark, body.trim()))
        });
        let s = LINE_BREAK.replace_all(&s, "\n");
        let s = ANY_TAG.replace_all(&s, "");
        // quill pads embeds with zero-width no-break spaces
        let s = paren_to_dollar(&decode_entities(&s)).replace('\u{feff}', "");
        let s = STASHED.replace_all(&s, |c: &Captures| {
            c[1].parse::<usize>().ok().and_then(|i| stash.get(i)).cloned().unwrap_or_default()
        });
        s.trim_end_matches(['\n', ' ']).to_string()
    }
}

const STASH_OPEN: char = '\u{e000}';
const STASH_CLOSE: char = '\u{e001}';

fn stash_math(stash: &mut Vec<String>, math: String) -> String {
    stash.push(math);
    format!("{}{}{}", STASH_OPEN, stash.len() - 1, STASH_CLOSE)
}

/// Replaces every whole `ql-formula` / `math-tex` span element, nested
/// spans included, with a stash marker. Other spans are left for the tag
/// strip.
fn lift_formula_spans(html: &str, stash: &mut Vec<String>) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `html`
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut done = 0;
    let mut from = 0;
    while let Some(start) = find_span_open(&lower, from) {
        let Some(open_end) = lower[start..].find('>').map(|p| start + p + 1) else {
            break;
        };
        let attrs = &html[start + "<span".len()..open_end - 1];
        if !(attrs.contains("ql-formula") || attrs.contains("math-tex")) {
            from = open_end;
            continue;
        }
        let Some((inner_end, close_end)) = matching_span_close(&lower, open_end) else {
            tracing::debug!(at = start, "unclosed formula span left as text");
            break;
        };
        out.push_str(&html[done..start]);
        out.push_str(&stash_math(stash, formula_text(attrs, &html[open_end..inner_end])));
        done = close_end;
        from = close_end;
    }
    out.push_str(&html[done..]);
    out
}

/// Next `<span` that is a whole tag name, not a prefix of another one.
fn find_span_open(lower: &str, from: usize) -> Option<usize> {
    let mut at = from;
    loop {
        let start = at + lower[at..].find("<span")?;
        let after = start + "<span".len();
        match lower[after..].chars().next() {
            Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/' => return Some(start),
            None => return None,
            _ => at = after,
        }
    }
}

/// `(content end, element end)` of the span whose content starts at
/// `from`, counting nested spans.
fn matching_span_close(lower: &str, from: usize) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    let mut at = from;
    loop {
        let close = at + lower[at..].find("</span")?;
        match find_span_open(lower, at) {
            Some(open) if open < close => {
                depth += 1;
                at = open + "<span".len();
            }
            _ => {
                let close_end = close + lower[close..].find('>')? + 1;
                depth -= 1;
                if depth == 0 {
                    return Some((close, close_end));
                }
                at = close_end;
            }
        }
    }
}

fn formula_text(attrs: &str, inner: &str) -> String {
    if attrs.contains("ql-formula") {
        if let Some(v) = DATA_VALUE.captures(attrs) {
            return inline_math(&decode_entities(&v[1]));
        }
    }
    let inner = decode_entities(&ANY_TAG.replace_all(inner, ""));
    if attrs.contains("math-tex") {
        paren_to_dollar(&inner)
    } else {
        // rendered formula without its source; keep what it shows
        inner
    }
}

/// `\( a \)` -> `$a$`, `\[ a \]` -> `$$a$$`.
fn paren_to_dollar(s: &str) -> String {
    PAREN_MATH
        .replace_all(s, |c: &Captures| match (c.get(1), c.get(2)) {
            (Some(inline), _) => inline_math(inline.as_str()),
            (None, Some(block)) => format!("$${}$$", block.as_str().trim()),
            (None, None) => String::new(),
        })
        .into_owned()
}

/// Splits `$...$` and `$$...$$` spans out of a plain string. `\$` is a literal
/// dollar; an unclosed delimiter is kept as text.
pub fn split_dollar_math(s: &str) -> Vec<ContentSegment> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut rest = s;
    let mut next_id = 0usize;
    let mut id = || {
        next_id += 1;
        format!("legacy-{}", next_id)
    };

    while let Some(pos) = rest.find(|c: char| c == '$' || c == '\\') {
        let (before, at) = rest.split_at(pos);
        text.push_str(before);
        if let Some(after) = at.strip_prefix("\\$") {
            text.push('$');
            rest = after;
            continue;
        }
        if at.starts_with('\\') {
            text.push('\\');
            rest = &at[1..];
            continue;
        }
        let delim = if at.starts_with("$$") { "$$" } else { "$" };
        let body = &at[delim.len()..];
        match body.find(delim) {
            Some(end) if !body[..end].trim().is_empty() => {
                if !text.is_empty() {
                    out.push(ContentSegment::text(id(), std::mem::take(&mut text)));
                }
                let tex = body[..end].trim();
                // a `$$` span marks display math; keep the intent for prepare_math
                let latex = if delim == "$$" && !tex.starts_with(r"\displaystyle") {
                    format!(r"\displaystyle {}", tex)
                } else {
                    tex.to_string()
                };
                out.push(ContentSegment::math(id(), latex));
                rest = &body[end + delim.len()..];
            }
            _ => {
                text.push_str(delim);
                rest = body;
            }
        }
    }
    text.push_str(rest);
    if !text.is_empty() {
        out.push(ContentSegment::text(id(), text));
    }
    out
}
