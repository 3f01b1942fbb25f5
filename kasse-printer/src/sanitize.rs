//! Printer text sanitizer
//!
//! Thermal printers on the relay accept plain ASCII. Substitutions run first
//! (German transliteration, euro sign), then every remaining character
//! outside `0x20..=0x7E` is dropped, except `\n` and `\r`.

/// Which substitutions a printer wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// `Ä Ö Ü ä ö ü ß` -> `Ae Oe Ue ae oe ue ss`
    pub transliterate_german: bool,
    /// `€` -> `EUR`
    pub replace_euro: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            transliterate_german: true,
            replace_euro: true,
        }
    }
}

fn german_digraph(c: char) -> Option<&'static str> {
    Some(match c {
        'Ä' => "Ae",
        'Ö' => "Oe",
        'Ü' => "Ue",
        'ä' => "ae",
        'ö' => "oe",
        'ü' => "ue",
        'ß' => "ss",
        _ => return None,
    })
}

#[inline]
fn is_printable(c: char) -> bool {
    matches!(c, '\x20'..='\x7E' | '\n' | '\r')
}

/// Reduce text to what a receipt printer can print
///
/// Output is ASCII only, so `sanitize(sanitize(x, o), o) == sanitize(x, o)`.
pub fn sanitize(text: &str, options: SanitizeOptions) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if options.transliterate_german {
            if let Some(digraph) = german_digraph(c) {
                out.push_str(digraph);
                continue;
            }
        }
        if options.replace_euro && c == '€' {
            out.push_str("EUR");
            continue;
        }
        if is_printable(c) {
            out.push(c);
        }
    }
    out
}
