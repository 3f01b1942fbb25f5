//! Printer Model
//!
//! A printer is a named destination with a transport endpoint and its own
//! text rendering settings. Receipts are rendered once per printer so every
//! device gets text that fits its paper width and character set.

use serde::{Deserialize, Serialize};

use super::default_true;
use super::role::Role;

/// Where print data is sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum PrinterEndpoint {
    /// A queue on the HTTP print relay (`POST {relay}/print`)
    Relay { queue: String },
    /// Raw ESC/POS over TCP, usually port 9100
    Network { host: String, port: u16 },
}

impl PrinterEndpoint {
    /// Stable identifier used in logs and the receipt archive
    pub fn label(&self) -> String {
        match self {
            PrinterEndpoint::Relay { queue } => queue.clone(),
            PrinterEndpoint::Network { host, port } => format!("{host}:{port}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontMode {
    #[default]
    Normal,
    /// Every glyph takes two columns, halving the usable line width.
    /// Network printers are switched with ESC ! 0x20; relay queues only
    /// receive text, so the relay's printer must already be set up for it.
    DoubleWidth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CodePage {
    #[default]
    Pc858,
}

/// Per-printer text rendering settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_chars_per_line")]
    pub chars_per_line: usize,
    #[serde(default)]
    pub font_mode: FontMode,
    #[serde(default)]
    pub code_page: CodePage,
    /// Replace the euro sign with "EUR"
    #[serde(default = "default_true")]
    pub replace_euro: bool,
    /// Rewrite umlauts and sharp s as ASCII digraphs
    #[serde(default = "default_true")]
    pub transliterate_german: bool,
    #[serde(default = "default_true")]
    pub cut_after_print: bool,
}

pub const DEFAULT_CHARS_PER_LINE: usize = 48;

fn default_chars_per_line() -> usize {
    DEFAULT_CHARS_PER_LINE
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            chars_per_line: DEFAULT_CHARS_PER_LINE,
            font_mode: FontMode::Normal,
            code_page: CodePage::Pc858,
            replace_euro: true,
            transliterate_german: true,
            cut_after_print: true,
        }
    }
}

impl RenderConfig {
    /// Columns actually available for text
    pub fn line_width(&self) -> usize {
        let width = match self.font_mode {
            FontMode::Normal => self.chars_per_line,
            FontMode::DoubleWidth => self.chars_per_line / 2,
        };
        width.max(MIN_LINE_WIDTH)
    }
}

/// Narrowest layout the receipt renderer supports
pub const MIN_LINE_WIDTH: usize = 16;

/// Printer entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printer {
    pub id: String,
    pub display_name: String,
    pub endpoint: PrinterEndpoint,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fallback target for category routing and customer receipts
    #[serde(default)]
    pub is_default: bool,
    /// Terminal roles whose receipts this printer produces (role routing)
    #[serde(default)]
    pub assigned_roles: Vec<Role>,
    #[serde(default)]
    pub render: RenderConfig,
}

impl Printer {
    /// Whether this printer takes receipts for the given terminal role
    pub fn serves(&self, role: Role) -> bool {
        let role = role.print_role();
        self.assigned_roles.iter().any(|r| r.print_role() == role)
    }

    pub fn is_food_printer(&self) -> bool {
        self.assigned_roles.contains(&Role::Food)
    }
}

/// Create printer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterCreate {
    pub display_name: String,
    pub endpoint: PrinterEndpoint,
    pub enabled: Option<bool>,
    pub is_default: Option<bool>,
    #[serde(default)]
    pub assigned_roles: Vec<Role>,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Update printer payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrinterUpdate {
    pub display_name: Option<String>,
    pub endpoint: Option<PrinterEndpoint>,
    pub enabled: Option<bool>,
    pub is_default: Option<bool>,
    pub assigned_roles: Option<Vec<Role>>,
    pub render: Option<RenderConfig>,
}

impl Printer {
    pub fn apply(&mut self, update: PrinterUpdate) {
        if let Some(display_name) = update.display_name {
            self.display_name = display_name;
        }
        if let Some(endpoint) = update.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(is_default) = update.is_default {
            self.is_default = is_default;
        }
        if let Some(assigned_roles) = update.assigned_roles {
            self.assigned_roles = assigned_roles;
        }
        if let Some(render) = update.render {
            self.render = render;
        }
    }
}
