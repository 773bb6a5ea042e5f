//! Configuration schema for quaver.
//!
//! All structs use `#[serde(rename_all = "camelCase")]` so that the JSON config
//! file can use camelCase keys while Rust code uses snake_case fields.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::utils::helpers::get_media_path;

// ---------------------------------------------------------------------------
// Bot config
// ---------------------------------------------------------------------------

/// Core bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Sender id allowed to run owner-only commands. Unset means nobody.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

fn default_command_prefix() -> String {
    "!".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            owner_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway configs
// ---------------------------------------------------------------------------

/// Console gateway configuration (stdin/stdout, local operation).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_console_guild")]
    pub default_guild: String,
    #[serde(default = "default_console_user")]
    pub default_user: String,
    #[serde(default = "default_console_channel")]
    pub default_channel: String,
    /// Voice channel the console user starts out in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_voice_channel: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_console_guild() -> String {
    "local".to_string()
}

fn default_console_user() -> String {
    "console".to_string()
}

fn default_console_channel() -> String {
    "general".to_string()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_guild: default_console_guild(),
            default_user: default_console_user(),
            default_channel: default_console_channel(),
            default_voice_channel: None,
        }
    }
}

/// Configuration for gateways.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaysConfig {
    #[serde(default)]
    pub console: ConsoleConfig,
}

// ---------------------------------------------------------------------------
// Voice config
// ---------------------------------------------------------------------------

/// Voice playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    /// Volume multiplier new sessions start with.
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    /// PulseAudio sink to play into. Unset uses the system default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<String>,
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
}

fn default_volume() -> f32 {
    0.5
}

fn default_media_dir() -> String {
    "~/.quaver/media".to_string()
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            sink: None,
            media_dir: default_media_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver config
// ---------------------------------------------------------------------------

/// Media resolver configuration, passed through to the extraction tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    #[serde(default = "default_resolver_binary")]
    pub binary: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_output_template")]
    pub output_template: String,
    #[serde(default = "default_true")]
    pub restrict_filenames: bool,
    #[serde(default = "default_true")]
    pub no_playlist: bool,
    #[serde(default = "default_true")]
    pub no_check_certificates: bool,
    #[serde(default = "default_search")]
    pub default_search: String,
    /// Bind address for the tool's network traffic (ipv4 avoids flaky ipv6).
    #[serde(default = "default_source_address")]
    pub source_address: String,
}

fn default_resolver_binary() -> String {
    "yt-dlp".to_string()
}

fn default_format() -> String {
    "bestaudio/best".to_string()
}

fn default_output_template() -> String {
    "%(extractor)s-%(id)s-%(title)s.%(ext)s".to_string()
}

fn default_search() -> String {
    "auto".to_string()
}

fn default_source_address() -> String {
    "0.0.0.0".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            binary: default_resolver_binary(),
            format: default_format(),
            output_template: default_output_template(),
            restrict_filenames: true,
            no_playlist: true,
            no_check_certificates: true,
            default_search: default_search(),
            source_address: default_source_address(),
        }
    }
}

// ---------------------------------------------------------------------------
// LaTeX config
// ---------------------------------------------------------------------------

/// LaTeX render pipeline configuration. Page geometry is in points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatexConfig {
    #[serde(default = "default_paper_width")]
    pub paper_width: u32,
    #[serde(default = "default_paper_height")]
    pub paper_height: u32,
    #[serde(default = "default_margin")]
    pub margin: u32,
    #[serde(default = "default_pdflatex_binary")]
    pub pdflatex_binary: String,
    #[serde(default = "default_pdftoppm_binary")]
    pub pdftoppm_binary: String,
}

fn default_paper_width() -> u32 {
    200
}

fn default_paper_height() -> u32 {
    100
}

fn default_margin() -> u32 {
    5
}

fn default_pdflatex_binary() -> String {
    "pdflatex".to_string()
}

fn default_pdftoppm_binary() -> String {
    "pdftoppm".to_string()
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            paper_width: default_paper_width(),
            paper_height: default_paper_height(),
            margin: default_margin(),
            pdflatex_binary: default_pdflatex_binary(),
            pdftoppm_binary: default_pdftoppm_binary(),
        }
    }
}

// ---------------------------------------------------------------------------
// Root config
// ---------------------------------------------------------------------------

/// Root configuration for quaver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub gateways: GatewaysConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub latex: LatexConfig,
    /// Fixed-reply commands, name -> reply text.
    #[serde(default = "default_autoreplies")]
    pub autoreplies: HashMap<String, String>,
    #[serde(default = "default_schedule_text")]
    pub schedule_text: String,
}

fn default_autoreplies() -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("AmICool?".to_string(), "Verily, you are cool!".to_string());
    map
}

fn default_schedule_text() -> String {
    "Here you go!\n\
     Block 1: 7:35-8:45\n\
     Block 2: 8:48-9:58\n\
     Lunch: 10:01-11:19\n\
     Block 3: 11:22-12:32\n\
     Block 4: 12:35-1:45\n\
     Block 5: 1:50-3:05\n\
     \n\
     Wednesday clubs\n\
     A: 12:18-1:03\n\
     B: 1:06-1:51\n\
     C: 1:54-2:29"
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            gateways: GatewaysConfig::default(),
            voice: VoiceConfig::default(),
            resolver: ResolverConfig::default(),
            latex: LatexConfig::default(),
            autoreplies: default_autoreplies(),
            schedule_text: default_schedule_text(),
        }
    }
}

impl Config {
    /// Get the expanded media directory, creating it if needed.
    pub fn media_path(&self) -> PathBuf {
        get_media_path(Some(&self.voice.media_dir))
    }

    /// Whether `sender` may run owner-only commands.
    pub fn is_owner(&self, sender: &str) -> bool {
        self.bot.owner_id.as_deref() == Some(sender)
    }
}
