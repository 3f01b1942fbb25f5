//! ESC/POS sequences and receipt text builders
//!
//! Receipt bodies are built as plain text with [`TextBuilder`] so they can
//! pass through the sanitizer unchanged in structure. Control bytes are only
//! added afterwards: the relay takes a `cut` flag, raw TCP printers get the
//! bytes from [`EscPosBuilder`].

/// ESC @ - initialize printer
pub const INIT: &[u8] = &[0x1B, 0x40];

/// ESC ! 0x20 - double-width characters until the next ESC @
pub const DOUBLE_WIDTH: &[u8] = &[0x1B, 0x21, 0x20];

/// GS V 0 - full cut
pub const CUT: &[u8] = &[0x1D, 0x56, 0x00];

/// Blank lines between the last text line and the cut
pub const FEED_LINES_BEFORE_CUT: usize = 3;

/// Plain text receipt builder with a fixed line width
pub struct TextBuilder {
    buf: String,
    width: usize,
}

impl TextBuilder {
    /// Common widths: 58mm paper 32 characters, 80mm paper 48 characters
    pub fn new(width: usize) -> Self {
        Self {
            buf: String::with_capacity(1024),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    // === Text Output ===

    pub fn write_line(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self.buf.push('\n');
        self
    }

    pub fn write_lines<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.write_line(line.as_ref());
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// `n` empty lines
    pub fn feed(&mut self, n: usize) -> &mut Self {
        for _ in 0..n {
            self.buf.push('\n');
        }
        self
    }

    // === Separators ===

    /// Line of '=' characters
    pub fn eq_sep(&mut self) -> &mut Self {
        self.write_line(&"=".repeat(self.width))
    }

    /// Line of '-' characters
    pub fn dash_sep(&mut self) -> &mut Self {
        self.write_line(&"-".repeat(self.width))
    }

    // === Layout Helpers ===

    pub fn text_center(&mut self, s: &str) -> &mut Self {
        let line = crate::layout::center(s, self.width);
        self.write_line(&line)
    }

    /// Left and right text on the same line
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let line = crate::layout::pad_line(left, right, self.width);
        self.write_line(&line)
    }

    /// Text framed by a box of '*', for identities that must stand out
    ///
    /// ```text
    /// ****************
    /// *   TISCH 12   *
    /// ****************
    /// ```
    pub fn boxed(&mut self, s: &str) -> &mut Self {
        let border = "*".repeat(self.width);
        let inner = self.width.saturating_sub(2);
        let text = crate::layout::truncate_with_ellipsis(s, inner);
        let pad = inner.saturating_sub(crate::layout::text_width(&text));
        let left = pad / 2;
        let right = pad - left;
        let middle = format!("*{}{}{}*", " ".repeat(left), text, " ".repeat(right));
        self.write_line(&border);
        self.write_line(&middle);
        self.write_line(&border)
    }

    /// Text centered between two '=' lines
    pub fn banner(&mut self, s: &str) -> &mut Self {
        self.eq_sep();
        self.text_center(s);
        self.eq_sep()
    }

    // === Build ===

    pub fn finalize(self) -> String {
        self.buf
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl Default for TextBuilder {
    fn default() -> Self {
        Self::new(48)
    }
}

/// Byte-level ESC/POS framing for raw TCP printers
pub struct EscPosBuilder {
    buf: Vec<u8>,
}

impl EscPosBuilder {
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(4096);
        buf.extend_from_slice(INIT);
        Self { buf }
    }

    /// Append already sanitized text
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn double_width(&mut self) -> &mut Self {
        self.buf.extend_from_slice(DOUBLE_WIDTH);
        self
    }

    pub fn cut(&mut self) -> &mut Self {
        self.buf.extend_from_slice(CUT);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new()
    }
}
