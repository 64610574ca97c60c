use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::registry::RegistryOptions;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

/// Locates `config.toml` and writes the commented template.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    dir: PathBuf,
}

impl ConfigManager {
    /// Manager rooted at `dir` instead of the platform config directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// `<platform config dir>/<app_name>`
    pub fn new(app_name: &str) -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| eyre!("No config directory on this platform"))?;
        Ok(Self::with_dir(base.join(app_name)))
    }

    pub fn config_dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| eyre!("Could not create {}: {}", self.dir.display(), e))
    }

    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_owned()
    }

    /// Write the template to `config.toml`. An existing file is only
    /// replaced when `force` is set.
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let path = self.config_path(CONFIG_FILE);
        if !force && path.exists() {
            return Err(eyre!(
                "{} already exists; pass --force to replace it",
                path.display()
            ));
        }
        self.ensure_config_dir()?;
        std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
            .map_err(|e| eyre!("Could not write {}: {}", path.display(), e))?;
        Ok(path)
    }

    /// Parse `config.toml`. Absent keys and sections keep their defaults, and
    /// an absent file is the default config.
    pub fn load_user_config(&self) -> Result<AppConfig> {
        let path = self.config_path(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppConfig::default()),
            Err(e) => return Err(eyre!("Failed to read config file at {}: {}", path.display(), e)),
        };
        toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file at {}: {}", path.display(), e))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version: String,
    pub query: QueryConfig,
    pub performance: PerformanceConfig,
    pub display: DisplayConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Rows selected when a file is opened
    pub preview_limit: usize,
    pub history_limit: usize,
    pub enable_history: bool,
    /// Run a file's preview as soon as its tab opens
    pub run_on_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
    /// Queries allowed to run against the engine at the same time
    pub max_concurrent_queries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Widest a result column is drawn, in characters
    pub max_column_width: u16,
    pub row_numbers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    /// tracing level used when RUST_LOG is not set
    pub log_level: String,
}

/// Each theme color is declared once here, with its default.
macro_rules! color_config {
    ($($field:ident = $default:expr),+ $(,)?) => {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #[serde(default)]
        pub struct ColorConfig {
            $(pub $field: String,)+
        }

        impl Default for ColorConfig {
            fn default() -> Self {
                Self {
                    $($field: $default.to_string(),)+
                }
            }
        }

        impl ColorConfig {
            /// `(name, value)` for every color
            pub fn entries(&self) -> Vec<(&'static str, &str)> {
                vec![$((stringify!($field), self.$field.as_str()),)+]
            }
        }
    };
}

color_config! {
    primary = "cyan",
    secondary = "yellow",
    success = "green",
    error = "red",
    warning = "yellow",
    dimmed = "dark_gray",
    controls_bg = "indexed(236)",
    text_primary = "white",
    text_inverse = "black",
    tab_active = "cyan",
    tab_inactive = "dark_gray",
    editor_border = "cyan",
    table_header = "white",
    table_border = "cyan",
    table_selected = "reversed",
    null_value = "dark_gray",
    directory = "blue",
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            query: QueryConfig::default(),
            performance: PerformanceConfig::default(),
            display: DisplayConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            preview_limit: crate::statement::PREVIEW_LIMIT,
            history_limit: crate::store::HISTORY_LIMIT,
            enable_history: true,
            run_on_open: true,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
            max_concurrent_queries: 4,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_column_width: 40,
            row_numbers: false,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with the user's `config.toml`, validated.
    pub fn load(app_name: &str) -> Result<Self> {
        Self::load_from(&ConfigManager::new(app_name)?)
    }

    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let config = manager.load_user_config()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version {:?}; this build reads 0.1",
                self.version
            ));
        }

        let positive = [
            ("query.preview_limit", self.query.preview_limit as u64),
            ("query.history_limit", self.query.history_limit as u64),
            (
                "performance.event_poll_interval_ms",
                self.performance.event_poll_interval_ms,
            ),
            (
                "performance.max_concurrent_queries",
                self.performance.max_concurrent_queries as u64,
            ),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(eyre!("{} must be greater than 0", key));
        }

        if !matches!(self.theme.color_mode.as_str(), "auto" | "light" | "dark") {
            return Err(eyre!(
                "theme.color_mode must be auto, light or dark, not {:?}",
                self.theme.color_mode
            ));
        }

        let level = self.debug.log_level.to_ascii_lowercase();
        if !["error", "warn", "info", "debug", "trace"].contains(&level.as_str()) {
            return Err(eyre!("debug.log_level {:?} is not a tracing level", self.debug.log_level));
        }

        let parser = ColorParser::new();
        for (name, value) in self.theme.colors.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("theme.colors.{}: {}", name, e))?;
        }
        Ok(())
    }

    /// Options handed to the session registry
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            preview_limit: self.query.preview_limit,
            record_history: self.query.enable_history,
            run_on_open: self.query.run_on_open,
        }
    }
}

/// Names accepted in the theme, after lower-casing, turning spaces into
/// underscores and spelling grey as gray.
const NAMED_COLORS: &[(&str, Color)] = &[
    ("black", Color::Black),
    ("red", Color::Red),
    ("green", Color::Green),
    ("yellow", Color::Yellow),
    ("blue", Color::Blue),
    ("magenta", Color::Magenta),
    ("cyan", Color::Cyan),
    ("white", Color::White),
    ("light_gray", Color::Indexed(7)),
    ("gray", Color::Indexed(8)),
    ("dark_gray", Color::Indexed(8)),
    ("bright_black", Color::Indexed(8)),
    ("bright_red", Color::Indexed(9)),
    ("bright_green", Color::Indexed(10)),
    ("bright_yellow", Color::Indexed(11)),
    ("bright_blue", Color::Indexed(12)),
    ("bright_magenta", Color::Indexed(13)),
    ("bright_cyan", Color::Indexed(14)),
    ("bright_white", Color::Indexed(15)),
    ("reset", Color::Reset),
    // drawn as a modifier by the widgets
    ("reversed", Color::Reset),
];

/// Turns theme strings into terminal colors, downgrading hex colors to what
/// the terminal can show.
#[derive(Debug, Clone, Copy)]
pub struct ColorParser {
    true_color: bool,
    palette_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Capabilities of stdout, with `NO_COLOR` turning every color into `Reset`.
    pub fn new() -> Self {
        let level = supports_color::on(Stream::Stdout);
        Self {
            true_color: level.as_ref().is_some_and(|l| l.has_16m),
            palette_256: level.as_ref().is_some_and(|l| l.has_256),
            no_color: std::env::var_os("NO_COLOR").is_some(),
        }
    }

    /// Parser with fixed capabilities, independent of the running terminal
    pub fn with_capabilities(true_color: bool, palette_256: bool) -> Self {
        Self {
            true_color,
            palette_256,
            no_color: false,
        }
    }

    /// Parse `#rrggbb`, `indexed(n)` or a color name.
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }
        let value = s.trim();

        if let Some(hex) = value.strip_prefix('#') {
            let (r, g, b) = parse_hex(hex).ok_or_else(|| {
                eyre!("Invalid hex color '{}': expected #rrggbb", value)
            })?;
            return Ok(self.downgrade(r, g, b));
        }

        let lower = value.to_lowercase();
        if let Some(index) = lower.strip_prefix("indexed(").and_then(|r| r.strip_suffix(')')) {
            return index
                .trim()
                .parse::<u8>()
                .map(Color::Indexed)
                .map_err(|_| eyre!("Invalid indexed color '{}': expected indexed(0-255)", value));
        }

        let name = lower.replace(' ', "_").replace("grey", "gray");
        NAMED_COLORS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, color)| *color)
            .ok_or_else(|| {
                eyre!(
                    "Unknown color name '{}'; use an ANSI name such as red or bright_blue, \
                     indexed(n) or #rrggbb",
                    value
                )
            })
    }

    fn downgrade(&self, r: u8, g: u8, b: u8) -> Color {
        match (self.true_color, self.palette_256) {
            (true, _) => Color::Rgb(r, g, b),
            (false, true) => Color::Indexed(rgb_to_256_color(r, g, b)),
            (false, false) => rgb_to_basic_ansi(r, g, b),
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |at: usize| u8::from_str_radix(&hex[at..at + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Nearest xterm 256-color palette index
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let (lo, hi) = (r.min(g).min(b), r.max(g).max(b));
    if hi - lo < 10 {
        // grayscale ramp, with the cube's black and white at the ends
        let level = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
        return match level {
            0..=7 => 16,
            248.. => 231,
            _ => 232 + ((level - 8) * 24 / 240) as u8,
        };
    }
    let step = |c: u8| (u16::from(c) * 5 / 255) as u8;
    16 + 36 * step(r) + 6 * step(g) + step(b)
}

/// Nearest of the eight basic ANSI colors
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let (lo, hi) = (r.min(g).min(b), r.max(g).max(b));
    if hi - lo < 30 {
        let level = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
        return if level < 64 { Color::Black } else { Color::White };
    }
    const BY_CHANNELS: [Color; 8] = [
        Color::Black,
        Color::Blue,
        Color::Green,
        Color::Cyan,
        Color::Red,
        Color::Magenta,
        Color::Yellow,
        Color::White,
    ];
    let bit = |c: u8, weight: usize| if c > 128 { weight } else { 0 };
    BY_CHANNELS[bit(r, 4) | bit(g, 2) | bit(b, 1)]
}

/// Parsed theme colors, looked up by config name.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let mut colors = HashMap::new();
        for (name, value) in config.colors.entries() {
            colors.insert(name.to_string(), parser.parse(value)?);
        }
        Ok(Self { colors })
    }

    /// Color by name, `Reset` if unknown
    pub fn get(&self, name: &str) -> Color {
        self.get_optional(name).unwrap_or(Color::Reset)
    }

    pub fn get_optional(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }
}
