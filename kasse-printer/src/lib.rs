//! # kasse-printer
//!
//! Receipt printing primitives - HOW to print, not WHAT.
//!
//! ## Scope
//!
//! - Fixed-width text layout (padding, word wrap, ellipsis)
//! - Printer text sanitizing (German transliteration, euro sign, ASCII filter)
//! - ESC/POS control sequences (init, double width, cut)
//! - Print transports: HTTP print relay and raw TCP (port 9100)
//!
//! Receipt content (orders, kitchen tickets, summaries) is rendered by
//! `kasse-server`.
//!
//! ## Example
//!
//! ```ignore
//! use kasse_printer::{Printer, RelayClient, SanitizeOptions, TextBuilder, sanitize};
//!
//! let mut b = TextBuilder::new(32);
//! b.text_center("Weinfest").dash_sep().line_lr("2x Riesling", "11,00");
//! let text = sanitize(&b.finalize(), SanitizeOptions::default());
//!
//! let relay = RelayClient::new("http://127.0.0.1:3001")?;
//! relay.printer("bar_front").print(&text, true).await?;
//! ```

mod error;
mod escpos;
mod layout;
mod printer;
mod sanitize;

// Re-exports
pub use error::{PrintError, PrintResult};
pub use escpos::{CUT, DOUBLE_WIDTH, EscPosBuilder, FEED_LINES_BEFORE_CUT, INIT, TextBuilder};
pub use layout::{center, item_lines, pad_line, text_width, truncate_with_ellipsis, wrap_words};
pub use printer::{NetworkPrinter, Printer, RelayClient, RelayHealth, RelayPrinter};
pub use sanitize::{SanitizeOptions, sanitize};
