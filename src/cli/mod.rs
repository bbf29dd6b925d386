use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(name = "openrouter", alias = "open-router")]
    OpenRouter,
    Groq,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::OpenRouter => "OpenRouter",
            ProviderKind::Groq => "Groq",
        };
        f.write_str(s)
    }
}

#[derive(Parser, Debug)]
#[command(name = "wave_codegen", version, about = "Chat-driven static website generator over Gemini, OpenRouter and Groq")]
pub struct Args {
    /// Describe the site to build. Omit to start an interactive chat.
    #[arg(long)]
    pub task: Option<String>,

    /// Read the request from a .txt file (50KB max) instead of --task.
    #[arg(long, conflicts_with = "task")]
    pub task_file: Option<String>,

    /// Directory the generated files are written to.
    #[arg(long)]
    pub out: Option<String>,

    /// Primary colour name (blue, cyan, emerald, violet, purple, pink, teal).
    #[arg(long)]
    pub color: Option<String>,

    /// Font pair as Heading_Body, e.g. "Space Grotesk_Inter".
    #[arg(long)]
    pub fonts: Option<String>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub density: Option<u8>,

    /// Provider order override; repeat to list several.
    #[arg(long = "provider", value_enum)]
    pub providers: Vec<ProviderKind>,

    /// Unlock code for unlimited credits.
    #[arg(long)]
    pub unlock: Option<String>,

    /// TOML config file.
    #[arg(long)]
    pub config: Option<String>,

    /// Credit state file.
    #[arg(long)]
    pub state: Option<String>,

    /// Attempts of the whole provider chain before giving up.
    #[arg(long)]
    pub attempts: Option<u32>,

    #[arg(long, default_value_t = false)]
    pub save_request: bool,

    #[arg(long, default_value_t = false)]
    pub save_response: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
