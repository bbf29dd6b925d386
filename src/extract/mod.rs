use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

use crate::wire::GeneratedSite;

/// Separates the code part of a response from the follow-up suggestions.
pub const SUGGESTIONS_DELIMITER: &str = "---SUGGESTIONS---";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("the model returned an empty response")]
    Empty,
    #[error("no HTML found in the model response (starts with: {preview:?})")]
    NoMarkup { preview: String },
}

/// Where the HTML came from; useful in logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    MultiFile,
    Fenced,
    Doctype,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub site: GeneratedSite,
    pub suggestions: Vec<String>,
    pub source: Source,
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```([A-Za-z0-9_+-]*)[ \t]*\r?\n?([\s\S]*?)```").expect("fence regex"))
}

fn file_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"=====\s*FILE:\s*([^\s=]+)\s*=====").expect("file marker regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(?:!doctype|html|head|body|div|section|main|header|style|script)\b").expect("tag regex"))
}

/// Splits off the suggestion list. Malformed JSON after the delimiter yields
/// no suggestions rather than an error.
pub fn split_suggestions(response: &str) -> (&str, Vec<String>) {
    match response.split_once(SUGGESTIONS_DELIMITER) {
        Some((code, tail)) => (code, parse_suggestions(tail)),
        None => (response, Vec::new()),
    }
}

fn parse_suggestions(tail: &str) -> Vec<String> {
    let tail = strip_fence(tail.trim());
    let (Some(start), Some(end)) = (tail.find('['), tail.rfind(']')) else {
        debug!("suggestions block has no JSON array");
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(&tail[start..=end]) {
        Ok(v) => v.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
        Err(e) => {
            debug!(error = %e, "ignoring malformed suggestions JSON");
            Vec::new()
        }
    }
}

/// Content of a single fenced block, or the input when it is not fenced.
fn strip_fence(s: &str) -> &str {
    match fence_re().captures(s) {
        Some(c) if s.trim_start().starts_with("```") => c.get(2).map(|m| m.as_str().trim()).unwrap_or(s),
        _ => s,
    }
}

/// Body of one `===== FILE:` section. Handles a section fenced on its own as
/// well as the leftovers of one fence wrapped around the whole layout.
fn clean_section(raw: &str) -> &str {
    let s = raw.trim();
    if let Some(c) = fence_re().captures(s) {
        if c.get(0).map(|m| m.as_str().len()) == Some(s.len()) {
            return c.get(2).map(|m| m.as_str().trim()).unwrap_or(s);
        }
    }
    let mut s = if s.starts_with("```") {
        s.split_once('\n').map(|(_, rest)| rest).unwrap_or("")
    } else {
        s
    };
    while let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Best-effort HTML out of a response: the first `html` (or untagged) fenced
/// block, else the trimmed response as is.
pub fn extract_html(response: &str) -> String {
    let fences = fenced_blocks(response);
    if let Some((_, body)) = fences
        .iter()
        .find(|(lang, _)| lang == "html")
        .or_else(|| fences.first())
    {
        return body.clone();
    }
    response.trim().to_string()
}

fn fenced_blocks(s: &str) -> Vec<(String, String)> {
    fence_re()
        .captures_iter(s)
        .map(|c| {
            let lang = c.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
            let body = c.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
            (lang, body)
        })
        .collect()
}

/// Parses the `===== FILE: name =====` layout. Requires an HTML file.
pub fn extract_multi_file(response: &str) -> Option<GeneratedSite> {
    let markers: Vec<_> = file_marker_re().captures_iter(response).collect();
    if markers.is_empty() {
        return None;
    }

    let mut site = GeneratedSite::default();
    let mut found_html = false;
    for (i, cap) in markers.iter().enumerate() {
        let whole = cap.get(0)?;
        let name = cap.get(1)?.as_str().to_lowercase();
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(response.len());
        let body = clean_section(&response[whole.end()..end]).to_string();

        if name.ends_with(".html") || name.ends_with(".htm") {
            site.html = body;
            found_html = true;
        } else if name.ends_with(".css") {
            site.css = body;
        } else if name.ends_with(".js") {
            site.js = body;
        } else {
            debug!(file = %name, "skipping unknown file section");
        }
    }
    found_html.then_some(site)
}

/// Full pipeline: suggestions split, multi-file layout, fenced blocks,
/// DOCTYPE-prefixed document, then raw markup.
pub fn extract_site(response: &str) -> Result<Extraction, ExtractionFailure> {
    if response.trim().is_empty() {
        return Err(ExtractionFailure::Empty);
    }
    let (code, suggestions) = split_suggestions(response);

    if let Some(site) = extract_multi_file(code) {
        debug!("multi-file layout detected");
        return Ok(Extraction { site, suggestions, source: Source::MultiFile });
    }

    let fences = fenced_blocks(code);
    let pick = |langs: &[&str]| {
        fences
            .iter()
            .find(|(l, _)| langs.contains(&l.as_str()))
            .map(|(_, b)| b.clone())
    };
    let html = pick(&["html", "htm"]).or_else(|| pick(&[""]));
    if let Some(html) = html.filter(|h| !h.is_empty()) {
        let site = GeneratedSite {
            html,
            css: pick(&["css"]).unwrap_or_default(),
            js: pick(&["js", "javascript"]).unwrap_or_default(),
        };
        return Ok(Extraction { site, suggestions, source: Source::Fenced });
    }

    let trimmed = code.trim();
    if let Some(idx) = find_doctype(trimmed) {
        let html = trimmed[idx..].to_string();
        return Ok(Extraction { site: GeneratedSite { html, ..Default::default() }, suggestions, source: Source::Doctype });
    }

    if tag_re().is_match(&trimmed.to_lowercase()) {
        return Ok(Extraction {
            site: GeneratedSite { html: trimmed.to_string(), ..Default::default() },
            suggestions,
            source: Source::Raw,
        });
    }

    if trimmed.is_empty() {
        return Err(ExtractionFailure::Empty);
    }
    Err(ExtractionFailure::NoMarkup { preview: trimmed.chars().take(80).collect() })
}

fn find_doctype(s: &str) -> Option<usize> {
    // ASCII lowercase keeps byte offsets aligned with the original
    s.to_ascii_lowercase().find("<!doctype")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_content_is_returned_trimmed() {
        let r = "Here you go:\n```html\n  <!DOCTYPE html><html></html>\n```\nEnjoy!";
        assert_eq!(extract_html(r), "<!DOCTYPE html><html></html>");

        let bare = "```\n<p>hi</p>\n```";
        assert_eq!(extract_html(bare), "<p>hi</p>");
    }

    #[test]
    fn doctype_response_is_unmodified() {
        let r = "  <!DOCTYPE html>\n<html><body>x</body></html>\n";
        assert_eq!(extract_html(r), r.trim());
        let e = extract_site(r).unwrap();
        assert_eq!(e.site.html, r.trim());
        assert_eq!(e.source, Source::Doctype);
    }

    #[test]
    fn multi_file_layout() {
        let r = "===== FILE: index.html =====\n<!DOCTYPE html><html></html>\n\n===== FILE: styles.css =====\n```css\nbody{margin:0}\n```\n===== FILE: script.js =====\nconsole.log(1);\n";
        let e = extract_site(r).unwrap();
        assert_eq!(e.source, Source::MultiFile);
        assert_eq!(e.site.html, "<!DOCTYPE html><html></html>");
        assert_eq!(e.site.css, "body{margin:0}");
        assert_eq!(e.site.js, "console.log(1);");
    }

    #[test]
    fn single_line_fence_keeps_its_body() {
        assert_eq!(extract_html("```html <html><body>x</body></html>```"), "<html><body>x</body></html>");

        let e = extract_site("Here:\n```html <!DOCTYPE html><html></html>```").unwrap();
        assert_eq!(e.source, Source::Fenced);
        assert_eq!(e.site.html, "<!DOCTYPE html><html></html>");
    }

    #[test]
    fn outer_fence_around_multi_file_layout() {
        let r = "```\n===== FILE: index.html =====\n<!DOCTYPE html><html></html>\n===== FILE: styles.css =====\nbody{margin:0}\n===== FILE: script.js =====\nconsole.log(1);\n```";
        let e = extract_site(r).unwrap();
        assert_eq!(e.source, Source::MultiFile);
        assert_eq!(e.site.html, "<!DOCTYPE html><html></html>");
        assert_eq!(e.site.css, "body{margin:0}");
        assert_eq!(e.site.js, "console.log(1);");

        let nested = "```text\n===== FILE: index.html =====\n```html\n<html></html>\n```\n===== FILE: script.js =====\n```js\nrun();\n```\n```";
        let site = extract_multi_file(nested).unwrap();
        assert_eq!(site.html, "<html></html>");
        assert_eq!(site.js, "run();");
    }

    #[test]
    fn multi_file_without_html_falls_through() {
        let r = "===== FILE: styles.css =====\nbody{}\n";
        assert!(extract_multi_file(r).is_none());
        assert!(matches!(extract_site(r), Err(ExtractionFailure::NoMarkup { .. })));
    }

    #[test]
    fn separate_fences_fill_each_file() {
        let r = "```html\n<html></html>\n```\n```css\nh1{}\n```\n```javascript\nalert(1)\n```";
        let e = extract_site(r).unwrap();
        assert_eq!(e.site.css, "h1{}");
        assert_eq!(e.site.js, "alert(1)");
    }

    #[test]
    fn suggestions_after_delimiter() {
        let r = "```html\n<html></html>\n```\n---SUGGESTIONS---\n[\"Add a pricing table\", \"Use a darker hero\"]";
        let e = extract_site(r).unwrap();
        assert_eq!(e.suggestions, vec!["Add a pricing table", "Use a darker hero"]);
        assert_eq!(e.site.html, "<html></html>");
    }

    #[test]
    fn malformed_suggestions_are_swallowed() {
        let r = "<!DOCTYPE html><html></html>\n---SUGGESTIONS---\n[\"Add a gallery\", ";
        let e = extract_site(r).unwrap();
        assert!(e.suggestions.is_empty());
        assert_eq!(e.site.html, "<!DOCTYPE html><html></html>");
    }

    #[test]
    fn fenced_suggestions_parse() {
        let (_, s) = split_suggestions("x---SUGGESTIONS---\n```json\n[\"a\"]\n```");
        assert_eq!(s, vec!["a"]);
    }

    #[test]
    fn prose_before_doctype_is_dropped() {
        let e = extract_site("Sure! Here it is.\n<!DOCTYPE html><html></html>").unwrap();
        assert_eq!(e.site.html, "<!DOCTYPE html><html></html>");
    }

    #[test]
    fn raw_markup_is_accepted() {
        let e = extract_site("<div class=\"hero\">Hi</div>").unwrap();
        assert_eq!(e.source, Source::Raw);
    }

    #[test]
    fn typed_failures() {
        assert_eq!(extract_site("   \n").unwrap_err(), ExtractionFailure::Empty);
        assert!(matches!(
            extract_site("I cannot help with that."),
            Err(ExtractionFailure::NoMarkup { .. })
        ));
        assert_eq!(extract_site("---SUGGESTIONS---[\"a\"]").unwrap_err(), ExtractionFailure::Empty);
    }
}
