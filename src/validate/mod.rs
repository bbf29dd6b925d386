//! Textual fix-ups for generated HTML. Nothing here parses the document; all
//! checks are substring tests, so a comment mentioning "viewport" counts.

pub const DOCTYPE: &str = "<!DOCTYPE html>";
const CHARSET_META: &str = r#"<meta charset="UTF-8">"#;
const VIEWPORT_META: &str = r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub added_doctype: bool,
    pub added_charset: bool,
    pub added_viewport: bool,
}

impl ValidationReport {
    pub fn changed(&self) -> bool {
        self.added_doctype || self.added_charset || self.added_viewport
    }

    pub fn describe(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.added_doctype { out.push("added DOCTYPE"); }
        if self.added_charset { out.push("added charset meta"); }
        if self.added_viewport { out.push("added viewport meta"); }
        out
    }
}

pub fn has_doctype(html: &str) -> bool {
    html.to_ascii_lowercase().contains("<!doctype")
}

/// Prepends `<!DOCTYPE html>` unless any doctype is already present.
pub fn ensure_doctype(html: &str) -> String {
    if has_doctype(html) {
        html.to_string()
    } else {
        format!("{DOCTYPE}\n{html}")
    }
}

/// Inserts the charset and viewport metas right after the first `<head>`.
/// Documents without a literal `<head>` are left alone.
pub fn ensure_meta(html: &str) -> String {
    let mut fixed = html.to_string();
    if !fixed.contains("charset") {
        fixed = insert_after_head(&fixed, CHARSET_META);
    }
    if !fixed.contains("viewport") {
        fixed = insert_after_head(&fixed, VIEWPORT_META);
    }
    fixed
}

fn insert_after_head(html: &str, tag: &str) -> String {
    match html.find("<head>") {
        Some(i) => {
            let at = i + "<head>".len();
            format!("{}\n  {}{}", &html[..at], tag, &html[at..])
        }
        None => html.to_string(),
    }
}

pub fn validate_and_fix(html: &str) -> String {
    validate_with_report(html).0
}

pub fn validate_with_report(html: &str) -> (String, ValidationReport) {
    let with_doctype = ensure_doctype(html);
    let fixed = ensure_meta(&with_doctype);
    let report = ValidationReport {
        added_doctype: !has_doctype(html),
        added_charset: !with_doctype.contains("charset") && fixed.contains(CHARSET_META),
        added_viewport: !with_doctype.contains("viewport") && fixed.contains(VIEWPORT_META),
    };
    (fixed, report)
}
