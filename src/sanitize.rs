//! Allow-list HTML sanitization for authored text segments.
//!
//! Layout never interprets raw authored markup itself; every text run passes
//! through an [`HtmlSanitizer`] before it reaches a measurement surface.

use std::borrow::Cow;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Zero-width space used when a caller requires non-empty output.
pub const EMPTY_TEXT_PLACEHOLDER: &str = "\u{200B}";

const ALLOWED_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "s", "sub", "sup", "span", "br", "code", "p", "div", "small",
    "mark",
];
const VOID_TAGS: &[&str] = &["br"];
const SKIPPED_SUBTREES: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "template", "noscript", "head", "title",
    "link", "meta",
];

/// Strips unsafe markup from authored HTML.
pub trait HtmlSanitizer: Send + Sync {
    /// Return markup that is safe to insert into a rendering surface.
    fn sanitize(&self, raw_html: &str) -> String;

    /// Like [`sanitize`](Self::sanitize), but never returns an empty string.
    fn sanitize_non_empty(&self, raw_html: &str) -> String {
        let clean = self.sanitize(raw_html);
        if clean.trim().is_empty() {
            EMPTY_TEXT_PLACEHOLDER.to_string()
        } else {
            clean
        }
    }
}

/// Tokenizer-driven sanitizer keeping a fixed set of inline tags.
///
/// Disallowed tags are unwrapped (children kept), dangerous subtrees are
/// dropped entirely and every attribute except `class` and a benign `style`
/// is removed.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowListSanitizer;

impl AllowListSanitizer {
    pub fn new() -> Self {
        Self
    }

    fn try_sanitize(raw_html: &str) -> Result<String, quick_xml::Error> {
        let source = escape_bare_lt(raw_html);
        let mut reader = Reader::from_str(&source);
        reader.config_mut().trim_text(false);
        reader.config_mut().check_end_names = false;
        let mut out = String::with_capacity(raw_html.len());
        let mut open: Vec<String> = Vec::with_capacity(8);
        let mut skip_depth = 0usize;
        let mut entity_buf = String::with_capacity(16);

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let tag = tag_name(&e);
                    if SKIPPED_SUBTREES.contains(&tag.as_str()) {
                        skip_depth += 1;
                        continue;
                    }
                    if skip_depth > 0 {
                        continue;
                    }
                    if !ALLOWED_TAGS.contains(&tag.as_str()) {
                        continue;
                    }
                    write_open_tag(&mut out, &tag, &e);
                    if !VOID_TAGS.contains(&tag.as_str()) {
                        open.push(tag);
                    }
                }
                Event::Empty(e) => {
                    let tag = tag_name(&e);
                    if skip_depth > 0 || !ALLOWED_TAGS.contains(&tag.as_str()) {
                        continue;
                    }
                    write_open_tag(&mut out, &tag, &e);
                    if !VOID_TAGS.contains(&tag.as_str()) {
                        write_close_tag(&mut out, &tag);
                    }
                }
                Event::End(e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                    if SKIPPED_SUBTREES.contains(&tag.as_str()) {
                        skip_depth = skip_depth.saturating_sub(1);
                        continue;
                    }
                    if skip_depth > 0 {
                        continue;
                    }
                    // Close everything opened after the matching tag; stray closers are dropped.
                    if let Some(pos) = open.iter().rposition(|t| *t == tag) {
                        while open.len() > pos {
                            if let Some(inner) = open.pop() {
                                write_close_tag(&mut out, &inner);
                            }
                        }
                    }
                }
                Event::Text(e) => {
                    if skip_depth > 0 {
                        continue;
                    }
                    let text = e.decode().map_err(quick_xml::Error::from)?;
                    out.push_str(&escape(text.as_ref()));
                }
                Event::CData(e) => {
                    if skip_depth > 0 {
                        continue;
                    }
                    let text = String::from_utf8_lossy(&e).into_owned();
                    out.push_str(&escape(text.as_str()));
                }
                Event::GeneralRef(e) => {
                    if skip_depth > 0 {
                        continue;
                    }
                    let name = e.decode().map_err(quick_xml::Error::from)?;
                    entity_buf.clear();
                    entity_buf.push('&');
                    entity_buf.push_str(name.as_ref());
                    entity_buf.push(';');
                    match unescape(&entity_buf) {
                        Ok(resolved) => out.push_str(&escape(resolved.as_ref())),
                        // Named HTML entities outside the XML set survive as literal text.
                        Err(_) => out.push_str(&escape(entity_buf.as_str())),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        while let Some(tag) = open.pop() {
            write_close_tag(&mut out, &tag);
        }
        Ok(out)
    }
}

impl HtmlSanitizer for AllowListSanitizer {
    fn sanitize(&self, raw_html: &str) -> String {
        match Self::try_sanitize(raw_html) {
            Ok(clean) => clean,
            Err(err) => {
                log::warn!(
                    "Unparseable segment markup ({}); falling back to escaped text",
                    err
                );
                escape(strip_angle_brackets(raw_html).as_str()).into_owned()
            }
        }
    }
}

fn tag_name(e: &BytesStart<'_>) -> String {
    let raw = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    match raw.rsplit(':').next() {
        Some(local) => local.to_string(),
        None => raw,
    }
}

fn write_open_tag(out: &mut String, tag: &str, e: &BytesStart<'_>) {
    out.push('<');
    out.push_str(tag);
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            // Unknown named entities are kept verbatim and escaped once below.
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        let keep = match key.as_str() {
            "class" => true,
            "style" => is_benign_inline_style(&value),
            _ => false,
        };
        if !keep {
            continue;
        }
        out.push(' ');
        out.push_str(&key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    out.push('>');
}

fn write_close_tag(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn is_benign_inline_style(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    !(lower.contains("url(")
        || lower.contains("expression(")
        || lower.contains("javascript:")
        || lower.contains("@import"))
}

/// Escape every `<` that cannot open a tag, so `x < y` and `a<3` stay text.
fn escape_bare_lt(raw: &str) -> Cow<'_, str> {
    let opens_markup = |next: Option<char>| {
        next.is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
    };
    let mut chars = raw.char_indices().peekable();
    let mut out: Option<String> = None;
    while let Some((idx, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);
        if ch == '<' && !opens_markup(next) {
            let buf = out.get_or_insert_with(|| {
                let mut buf = String::with_capacity(raw.len() + 8);
                buf.push_str(&raw[..idx]);
                buf
            });
            buf.push_str("&lt;");
        } else if let Some(buf) = out.as_mut() {
            buf.push(ch);
        }
    }
    match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(raw),
    }
}

/// Drop complete `<...>` tags; a `<` that never closes is kept as text.
fn strip_angle_brackets(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut tag = String::new();
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => {
                if in_tag {
                    out.push_str(&tag);
                }
                tag.clear();
                tag.push('<');
                in_tag = true;
            }
            '>' if in_tag => in_tag = false,
            _ if in_tag => tag.push(ch),
            _ => out.push(ch),
        }
    }
    if in_tag {
        out.push_str(&tag);
    }
    out
}

/// Strip all markup and return plain text with entities resolved.
///
/// Measurement backends use this to estimate glyph runs.
pub fn plain_text(html: &str) -> String {
    let source = escape_bare_lt(html);
    let mut reader = Reader::from_str(&source);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;
    let mut out = String::with_capacity(html.len());
    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                if let Ok(text) = e.decode() {
                    out.push_str(text.as_ref());
                }
            }
            Ok(Event::CData(e)) => out.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => {
                let Ok(name) = e.decode() else {
                    continue;
                };
                let entity = format!("&{};", name);
                match unescape(&entity) {
                    Ok(resolved) => out.push_str(resolved.as_ref()),
                    Err(_) => out.push_str(&entity),
                }
            }
            Ok(Event::Empty(e)) if tag_name(&e) == "br" => out.push('\n'),
            Ok(Event::Start(e)) if tag_name(&e) == "br" => out.push('\n'),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return strip_angle_brackets(html),
        }
    }
    out
}
