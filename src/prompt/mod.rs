use fs_err as fs;
use std::path::Path;
use thiserror::Error;

use crate::extract::SUGGESTIONS_DELIMITER;
use crate::merge::combine_for_preview;
use crate::wire::{GeneratedSite, StylePreferences};

/// Largest text file accepted as a prompt.
pub const MAX_PROMPT_FILE_BYTES: u64 = 50 * 1024;

#[derive(Error, Debug)]
pub enum PromptFileError {
    #[error("Please upload a valid .txt file.")]
    NotText,
    #[error("File too large ({bytes} bytes). Please upload a .txt file smaller than 50KB.")]
    TooLarge { bytes: u64 },
    #[error("Could not read the file: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads a `.txt` file to use as a request. Size is checked before reading.
pub fn read_prompt_file(path: &Path) -> Result<String, PromptFileError> {
    let is_txt = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);
    if !is_txt {
        return Err(PromptFileError::NotText);
    }
    let bytes = fs::metadata(path)?.len();
    if bytes > MAX_PROMPT_FILE_BYTES {
        return Err(PromptFileError::TooLarge { bytes });
    }
    Ok(fs::read_to_string(path)?)
}

/// What kind of change a follow-up message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    ColorChange,
    ContentChange,
    AddSection,
    RemoveSection,
    LayoutChange,
    AnimationChange,
    GeneralImprovement,
}

impl EditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditKind::ColorChange => "color_change",
            EditKind::ContentChange => "content_change",
            EditKind::AddSection => "add_section",
            EditKind::RemoveSection => "remove_section",
            EditKind::LayoutChange => "layout_change",
            EditKind::AnimationChange => "animation_change",
            EditKind::GeneralImprovement => "general_improvement",
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub fn analyze_edit_request(request: &str) -> EditKind {
    let r = request.to_lowercase();
    if contains_any(&r, &["color", "colour", "theme", "blue", "red", "green", "purple"]) {
        EditKind::ColorChange
    } else if contains_any(&r, &["text", "content", "title", "description", "copy"]) {
        EditKind::ContentChange
    } else if contains_any(&r, &["add", "include", "new section"]) {
        EditKind::AddSection
    } else if contains_any(&r, &["remove", "delete", "take out"]) {
        EditKind::RemoveSection
    } else if contains_any(&r, &["layout", "design", "structure"]) {
        EditKind::LayoutChange
    } else if contains_any(&r, &["animation", "effect", "transition"]) {
        EditKind::AnimationChange
    } else {
        EditKind::GeneralImprovement
    }
}

/// Heuristic for "change what we have" versus "build something new".
pub fn is_modification_request(request: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "add", "remove", "change", "modify", "update", "edit", "include", "delete", "replace",
        "insert", "append", "prepend", "swap", "switch", "toggle", "adjust", "tweak",
        "make it", "can you", "also add", "instead of", "rather than",
        "color", "colour", "font", "background", "style", "theme", "layout",
        "section", "button", "menu", "navigation", "header", "footer",
    ];
    let r = request.to_lowercase();
    let short_follow_up = r.len() < 50 && contains_any(&r, &["more", "different", "better", "another"]);
    let comparative = contains_any(&r, &["instead", "rather", " but ", "however"]);
    contains_any(&r, KEYWORDS) || short_follow_up || comparative
}

/// Code prompts go through the code provider chain; anything else through
/// the text chain.
pub fn is_code_prompt(prompt: &str) -> bool {
    let p = prompt.to_lowercase();
    contains_any(&p, &["html", "css", "javascript", "jsx", "tsx", "component", "website", "app", "code"])
}

fn density_label(density: u8) -> &'static str {
    match density {
        0..=33 => "airy (generous whitespace, large section padding)",
        34..=66 => "balanced (comfortable spacing)",
        _ => "compact (dense grids, tighter spacing)",
    }
}

fn style_section(style: &StylePreferences) -> String {
    format!(
        r#"STYLE PREFERENCES:
- Primary color: {name} ({hex}); expose it as the CSS custom property --primary-color.
- Heading font: "{heading}"; body font: "{body}" (load both from Google Fonts).
- Layout density: {density}."#,
        name = style.primary_color,
        hex = style.primary_hex(),
        heading = style.heading_font,
        body = style.body_font,
        density = density_label(style.layout_density),
    )
}

fn output_format() -> String {
    format!(
        r#"OUTPUT FORMAT (MANDATORY):
Generate EXACTLY this structure, with no prose before the first marker:

===== FILE: index.html =====
[Complete HTML5 document starting with <!DOCTYPE html>, including charset and viewport meta tags]

===== FILE: styles.css =====
[All CSS]

===== FILE: script.js =====
[All JavaScript]

If you cannot split the files, return one complete document inside a single ```html fenced block instead.

After the code, write the line {delim} followed by a JSON array of 3-5 short follow-up suggestions, e.g.
{delim}
["Add a pricing section", "Switch to a dark theme"]"#,
        delim = SUGGESTIONS_DELIMITER
    )
}

fn quality_rules() -> &'static str {
r#"QUALITY RULES:
- Semantic HTML5: header, nav, main, section, footer; one h1, ordered headings.
- Fully responsive, mobile first; touch targets of at least 44px.
- Realistic, domain-specific copy. No lorem ipsum.
- Accessible: alt text, labelled form inputs, visible focus styles, sufficient contrast.
- Respect prefers-reduced-motion for every animation.
- No external JS frameworks; vanilla JS only. No build step."#
}

pub fn build_generation_prompt(request: &str, style: &StylePreferences) -> String {
    format!(
        r#"You are a senior web designer and front-end engineer. Build a COMPLETE, production-quality static website.

USER REQUEST: {request}

REQUIRED STRUCTURE:
- Fixed header with logo and navigation (with a mobile menu toggle)
- Hero section with headline, supporting text and a primary call to action
- 2-4 content sections relevant to the request
- Footer with contact details and secondary links

{style}

{quality}

{format}"#,
        request = request.trim(),
        style = style_section(style),
        quality = quality_rules(),
        format = output_format(),
    )
}

/// Takes at most `max` chars, appending an ellipsis marker when cut.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Asks for a walkthrough of the current site, inlined into one document.
pub fn build_explain_prompt(site: &GeneratedSite) -> String {
    format!(
        "Provide a clear, step-by-step explanation of this HTML/CSS/JS code. Highlight structure, \
         interactivity, accessibility considerations, and important implementation notes.\n\n```html\n{}\n```",
        combine_for_preview(site)
    )
}

pub fn build_edit_prompt(request: &str, current: &GeneratedSite, style: &StylePreferences) -> String {
    let kind = analyze_edit_request(request);
    format!(
        r#"You are an expert web developer. The user wants to edit their existing website.

USER REQUEST: "{request}"
EDIT TYPE: {kind}

CURRENT WEBSITE FILES:
===== CURRENT HTML =====
{html}

===== CURRENT CSS =====
{css}

===== CURRENT JS =====
{js}

INSTRUCTIONS:
1. Make ONLY the requested changes while preserving everything else.
2. Keep the existing design language, sections and structure unless asked to remove them.
3. New content must match the existing style.
4. Output the COMPLETE edited files, not a diff.

{style}

{format}"#,
        request = request.trim(),
        kind = kind.as_str(),
        html = current.html,
        css = truncate_chars(&current.css, 2000),
        js = truncate_chars(&current.js, 1000),
        style = style_section(style),
        format = output_format(),
    )
}
