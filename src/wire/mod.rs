use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ========================================
/// Session data model
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
    System,
}

/// One line of the chat transcript. Fields are private so a message cannot be
/// edited after it is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    id: Uuid,
    sender: Sender,
    text: String,
    timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn sender(&self) -> Sender { self.sender }
    pub fn text(&self) -> &str { &self.text }
    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }
}

/// The three "files" of a generated website.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSite {
    pub html: String,
    pub css: String,
    pub js: String,
}

impl GeneratedSite {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty() && self.css.trim().is_empty() && self.js.trim().is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.html.len() + self.css.len() + self.js.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePreferences {
    pub primary_color: String,
    pub heading_font: String,
    pub body_font: String,
    /// 0 (airy) ..= 100 (dense)
    pub layout_density: u8,
}

impl Default for StylePreferences {
    fn default() -> Self {
        Self {
            primary_color: "cyan".into(),
            heading_font: "Space Grotesk".into(),
            body_font: "Inter".into(),
            layout_density: 50,
        }
    }
}

impl StylePreferences {
    /// Accepts a `Heading_Body` pair such as `Poppins_Inter`. A value without
    /// an underscore uses the same font for both.
    pub fn with_font_pair(mut self, pair: &str) -> Self {
        let pair = pair.trim();
        if pair.is_empty() {
            return self;
        }
        match pair.split_once('_') {
            Some((heading, body)) => {
                if !heading.trim().is_empty() { self.heading_font = heading.trim().to_string(); }
                if !body.trim().is_empty() { self.body_font = body.trim().to_string(); }
            }
            None => {
                self.heading_font = pair.to_string();
                self.body_font = pair.to_string();
            }
        }
        self
    }

    pub fn primary_hex(&self) -> &'static str {
        color_hex(&self.primary_color)
    }
}

const COLOR_MAP: &[(&str, &str)] = &[
    ("blue", "#3b82f6"),
    ("cyan", "#06b6d4"),
    ("emerald", "#10b981"),
    ("violet", "#8b5cf6"),
    ("purple", "#a855f7"),
    ("pink", "#ec4899"),
    ("teal", "#14b8a6"),
];

/// Unknown colour names fall back to cyan.
pub fn color_hex(name: &str) -> &'static str {
    let name = name.trim().to_lowercase();
    COLOR_MAP
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| *v)
        .unwrap_or("#06b6d4")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_pair_splits_on_underscore() {
        let s = StylePreferences::default().with_font_pair("Poppins_Lora");
        assert_eq!(s.heading_font, "Poppins");
        assert_eq!(s.body_font, "Lora");

        let s = StylePreferences::default().with_font_pair("Inter");
        assert_eq!(s.heading_font, "Inter");
        assert_eq!(s.body_font, "Inter");
    }

    #[test]
    fn unknown_color_defaults_to_cyan() {
        assert_eq!(color_hex("Violet"), "#8b5cf6");
        assert_eq!(color_hex("chartreuse"), "#06b6d4");
    }

    #[test]
    fn empty_site() {
        assert!(GeneratedSite::default().is_empty());
        let site = GeneratedSite { html: "<p>x</p>".into(), ..Default::default() };
        assert!(!site.is_empty());
        assert_eq!(site.total_bytes(), 8);
    }
}
