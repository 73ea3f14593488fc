//! Saving successful bodies to disk.
//!
//! Bodies that parse as JSON are re-serialized with 4-space indentation,
//! everything else is treated as HTML and re-indented through `scraper`.
//! Files are named `{strategy}_{sanitized url}_{4 random digits}.{json|html}`.

use crate::error::{ProbeError, Result};
use crate::types::{PersistedRecord, SaveFormat};
use rand::Rng;
use scraper::{ElementRef, Html, Node};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MAX_FRAGMENT_LEN: usize = 50;
const JSON_INDENT: &[u8] = b"    ";
const HTML_INDENT: &str = "  ";

const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];
/// Whitespace inside these is content, so children are written inline.
const PREFORMATTED_ELEMENTS: [&str; 3] = ["pre", "textarea", "listing"];

/// Strip a leading scheme, replace every non-alphanumeric character with `_`,
/// keep at most 50 characters.
pub fn sanitize_url(url: &str) -> String {
    let rest = match url.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => rest,
        _ => url,
    };
    rest.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_FRAGMENT_LEN)
        .collect()
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub fn random_suffix() -> u16 {
    rand::rng().random_range(1000..=9999)
}

/// Pick a format for `body` and pretty-print it.
pub fn format_body(body: &str) -> (SaveFormat, String) {
    match pretty_json(body) {
        Some(pretty) => (SaveFormat::Json, pretty),
        None => (SaveFormat::Html, pretty_html(body)),
    }
}

fn pretty_json(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).ok()?;
    String::from_utf8(buf).ok()
}

/// Re-indent an HTML document, one node per line.
pub fn pretty_html(body: &str) -> String {
    let doc = Html::parse_document(body);
    let mut out = String::new();
    for child in doc.tree.root().children() {
        match child.value() {
            Node::Doctype(d) => {
                out.push_str(&format!("<!DOCTYPE {}>\n", d.name()));
            }
            Node::Comment(c) => {
                out.push_str(&format!("<!--{}-->\n", &**c));
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    write_element(el, 0, &mut out);
                }
            }
            _ => {}
        }
    }
    out
}

fn write_element(el: ElementRef<'_>, depth: usize, out: &mut String) {
    let pad = HTML_INDENT.repeat(depth);
    let name = el.value().name();

    out.push_str(&pad);
    push_start_tag(el, out);

    if VOID_ELEMENTS.contains(&name) {
        out.push('\n');
        return;
    }

    if PREFORMATTED_ELEMENTS.contains(&name) {
        let mut inner = String::new();
        write_inline_children(el, &mut inner);
        // a newline right after the start tag is dropped when parsing
        if inner.starts_with('\n') {
            out.push('\n');
        }
        out.push_str(&inner);
        out.push_str(&format!("</{name}>\n"));
        return;
    }

    out.push('\n');
    if RAW_TEXT_ELEMENTS.contains(&name) {
        let raw: String = el.text().collect();
        if !raw.trim().is_empty() {
            out.push_str(&raw);
            if !raw.ends_with('\n') {
                out.push('\n');
            }
        }
    } else {
        let inner = HTML_INDENT.repeat(depth + 1);
        for child in el.children() {
            match child.value() {
                Node::Text(t) => {
                    let text = t.trim();
                    if !text.is_empty() {
                        out.push_str(&format!("{inner}{}\n", escape_text(text)));
                    }
                }
                Node::Comment(c) => {
                    out.push_str(&format!("{inner}<!--{}-->\n", &**c));
                }
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        write_element(child_el, depth + 1, out);
                    }
                }
                _ => {}
            }
        }
    }

    out.push_str(&format!("{pad}</{name}>\n"));
}

fn push_start_tag(el: ElementRef<'_>, out: &mut String) {
    out.push('<');
    out.push_str(el.value().name());
    for (attr, value) in el.value().attrs() {
        out.push_str(&format!(" {}=\"{}\"", attr, escape_attr(value)));
    }
    out.push('>');
}

/// Serialize an element's children exactly as parsed: no indentation, no
/// trimming.
fn write_inline_children(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(&escape_text(t)),
            Node::Comment(c) => out.push_str(&format!("<!--{}-->", &**c)),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    let name = child_el.value().name();
                    push_start_tag(child_el, out);
                    if !VOID_ELEMENTS.contains(&name) {
                        write_inline_children(child_el, out);
                        out.push_str(&format!("</{name}>"));
                    }
                }
            }
            _ => {}
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

/// Build the record for a successful body. Nothing touches the disk yet.
pub fn build_record(strategy_name: &str, url: &str, body: &str) -> PersistedRecord {
    let (format, content) = format_body(body);
    PersistedRecord {
        strategy_name: strategy_name.to_string(),
        sanitized_url_fragment: sanitize_url(url),
        random_suffix: random_suffix(),
        format,
        content,
    }
}

/// Write `record` under `dir`, creating the directory if needed.
pub fn save(dir: &Path, record: &PersistedRecord) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| {
        ProbeError::persistence(format!("cannot create {}: {e}", dir.display()))
    })?;
    let path = dir.join(record.file_name());
    debug!(path = %path.display(), "writing result");
    fs::write(&path, &record.content)
        .map_err(|e| ProbeError::persistence(format!("cannot write {}: {e}", path.display())))?;
    info!(path = %path.display(), format = ?record.format, "result saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_scheme_and_symbols() {
        let s = sanitize_url("https://Example.com/Path?x=1");
        assert_eq!(s, "Example_com_Path_x_1");
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        assert!(!s.contains("://"));
    }

    #[test]
    fn sanitize_truncates() {
        let long = format!("http://example.com/{}", "a".repeat(200));
        assert_eq!(sanitize_url(&long).len(), 50);
    }

    #[test]
    fn sanitize_without_scheme() {
        assert_eq!(sanitize_url("example.com/a-b"), "example_com_a_b");
    }

    #[test]
    fn suffix_has_four_digits() {
        for _ in 0..50 {
            let n = random_suffix();
            assert!((1000..=9999).contains(&n));
        }
    }

    #[test]
    fn json_body_is_indented() {
        let (format, content) = format_body(r#"{"a":1,"b":[true]}"#);
        assert_eq!(format, SaveFormat::Json);
        assert!(content.contains("\n    \"a\": 1"));
        let reparsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(reparsed, serde_json::json!({"a": 1, "b": [true]}));
    }

    #[test]
    fn html_body_is_reindented() {
        let (format, content) =
            format_body("<!doctype html><html><body><p>Hi &amp; bye</p><br></body></html>");
        assert_eq!(format, SaveFormat::Html);
        assert!(content.starts_with("<!DOCTYPE html>\n<html>\n"));
        assert!(content.contains("\n    <p>\n      Hi &amp; bye\n    </p>\n"));
        assert!(content.contains("<br>\n"));
        assert!(!content.contains("</br>"));
    }

    #[test]
    fn script_text_is_kept_verbatim() {
        let content = pretty_html("<html><head><script>if (a < b) { go(); }</script></head></html>");
        assert!(content.contains("if (a < b) { go(); }"));
    }

    #[test]
    fn sanitize_only_strips_a_leading_scheme() {
        assert_eq!(
            sanitize_url("example.com/login?next=https://other.org/x"),
            "example_com_login_next_https___other_org_x"
        );
        assert_eq!(sanitize_url("git+ssh://host/repo"), "host_repo");
    }

    #[test]
    fn preformatted_children_survive_verbatim() {
        let body = "<html><body><div><pre><code class=\"rust\">fn main() {\n    let ok = 1 &lt; 2;\n}</code></pre>\
                    <textarea>a &lt;b&gt;</textarea></div></body></html>";
        let content = pretty_html(body);

        assert!(content.contains(
            "<pre><code class=\"rust\">fn main() {\n    let ok = 1 &lt; 2;\n}</code></pre>\n"
        ));
        assert!(content.contains("<textarea>a &lt;b&gt;</textarea>\n"));

        let original = Html::parse_document(body);
        let reparsed = Html::parse_document(&content);
        let pre = scraper::Selector::parse("pre").unwrap();
        let text = |doc: &Html| -> String { doc.select(&pre).next().unwrap().text().collect() };
        assert_eq!(text(&reparsed), text(&original));
    }

    #[test]
    fn pre_leading_newline_is_preserved() {
        let body = "<html><body><pre>\n\nindented</pre></body></html>";
        let original: String = {
            let doc = Html::parse_document(body);
            let pre = scraper::Selector::parse("pre").unwrap();
            let text = doc.select(&pre).next().unwrap().text().collect();
            text
        };
        let reparsed = Html::parse_document(&pretty_html(body));
        let pre = scraper::Selector::parse("pre").unwrap();
        let text: String = reparsed.select(&pre).next().unwrap().text().collect();
        assert_eq!(text, original);
    }

    #[test]
    fn attributes_keep_source_order() {
        let content = pretty_html(r#"<html><body><a id="z" href="/x" class="a">x</a></body></html>"#);
        assert!(content.contains(r#"<a id="z" href="/x" class="a">"#));
    }

    #[test]
    fn record_file_name_follows_pattern() {
        let record = build_record("session", "https://example.com/x", "<p>x</p>");
        let name = record.file_name();
        assert!(name.starts_with("session_example_com_x_"));
        assert!(name.ends_with(".html"));
    }

    #[test]
    fn save_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data");
        let record = build_record("reqwest", "https://example.com", r#"{"k":"v"}"#);

        let path = save(&dir, &record).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "json");

        // idempotent directory creation
        let again = save(&dir, &record).unwrap();
        assert_eq!(again, path);
    }

    #[test]
    fn save_into_file_path_fails() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let record = build_record("reqwest", "https://example.com", "x");
        let err = save(tmp.path(), &record).unwrap_err();
        assert!(matches!(err, ProbeError::Persistence(_)));
    }
}
