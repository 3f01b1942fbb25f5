//! Fixed-width text layout
//!
//! Widths are counted in characters. Receipt text is sanitized to ASCII
//! before it reaches a printer, so one character is one column.

/// Marker appended to a word cut short
const ELLIPSIS: &str = "...";

/// Indent of wrapped item name lines
const CONTINUATION_INDENT: &str = "  ";

/// Column width of a string
#[inline]
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Left text, right text, spaces in between
///
/// If both do not fit, they are joined with a single space and the line
/// overflows. Callers that must stay within `width` use [`item_lines`].
pub fn pad_line(left: &str, right: &str, width: usize) -> String {
    let used = text_width(left) + text_width(right);
    if used >= width {
        return format!("{left} {right}");
    }
    format!("{left}{}{right}", " ".repeat(width - used))
}

/// Center `text` by padding on the left
pub fn center(text: &str, width: usize) -> String {
    let len = text_width(text);
    if len >= width {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((width - len) / 2), text)
}

/// Cut a word to `width` columns, marking the cut with `...`
pub fn truncate_with_ellipsis(word: &str, width: usize) -> String {
    if text_width(word) <= width {
        return word.to_string();
    }
    if width <= ELLIPSIS.len() {
        return word.chars().take(width).collect();
    }
    let kept: String = word.chars().take(width - ELLIPSIS.len()).collect();
    format!("{kept}{ELLIPSIS}")
}

/// Greedy word wrap
///
/// The first line holds at most `first_width` columns, every further line
/// `rest_width`. A word longer than an empty line is truncated with an
/// ellipsis, unless it is the first word and fits a continuation line: then
/// the first line stays empty and the word moves down.
pub fn wrap_words(text: &str, first_width: usize, rest_width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let budget = if lines.is_empty() {
            first_width
        } else {
            rest_width
        };
        let word_len = text_width(word);

        if current.is_empty() {
            if word_len <= budget {
                current.push_str(word);
            } else if lines.is_empty() && word_len <= rest_width {
                lines.push(String::new());
                current.push_str(word);
            } else {
                current = truncate_with_ellipsis(word, budget);
            }
            continue;
        }

        if text_width(&current) + 1 + word_len <= budget {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            if word_len <= rest_width {
                current.push_str(word);
            } else {
                current = truncate_with_ellipsis(word, rest_width);
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lay out one receipt item: `prefix` + name on the left, `amount` right-aligned
///
/// When the name collides with the amount column it wraps onto indented
/// continuation lines. Only a single word wider than a whole line is cut.
/// Pass an empty `amount` for price-less lines (kitchen tickets).
pub fn item_lines(prefix: &str, name: &str, amount: &str, width: usize) -> Vec<String> {
    let prefix_len = text_width(prefix);
    let amount_len = text_width(amount);
    let gap = usize::from(amount_len > 0);

    let first_width = width.saturating_sub(prefix_len + amount_len + gap).max(1);
    let rest_width = width
        .saturating_sub(text_width(CONTINUATION_INDENT))
        .max(1);

    let name_lines = wrap_words(name, first_width, rest_width);
    let mut out = Vec::with_capacity(name_lines.len());
    for (idx, line) in name_lines.into_iter().enumerate() {
        if idx == 0 {
            let left = format!("{prefix}{line}");
            if amount.is_empty() {
                out.push(left.trim_end().to_string());
            } else {
                out.push(pad_line(&left, amount, width));
            }
        } else {
            out.push(format!("{CONTINUATION_INDENT}{line}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_line() {
        assert_eq!(pad_line("Gesamt:", "16,50", 20), "Gesamt:        16,50");
        assert_eq!(pad_line("Gesamt:", "16,50", 20).len(), 20);
        assert_eq!(pad_line("abcdefgh", "12345", 10), "abcdefgh 12345");
    }

    #[test]
    fn test_center() {
        assert_eq!(center("TO GO", 11), "   TO GO");
        assert_eq!(center("too long text", 5), "too long text");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Spaetburgunder", 8), "Spaet...");
        assert_eq!(truncate_with_ellipsis("Wein", 8), "Wein");
        assert_eq!(truncate_with_ellipsis("Wein", 2), "We");
    }

    #[test]
    fn test_wrap_words_prefers_wrapping() {
        let lines = wrap_words("Grauburgunder trocken Flasche", 14, 20);
        assert_eq!(lines, vec!["Grauburgunder", "trocken Flasche"]);
    }

    #[test]
    fn test_wrap_words_moves_long_first_word_down() {
        let lines = wrap_words("Spaetburgunder Rose", 6, 14);
        assert_eq!(lines, vec!["", "Spaetburgunder", "Rose"]);
    }

    #[test]
    fn test_wrap_words_truncates_only_oversized_word() {
        let lines = wrap_words("Rindfleischetikettierung ok", 10, 10);
        assert_eq!(lines, vec!["Rindfle...", "ok"]);
    }

    #[test]
    fn test_item_lines_single_line() {
        let lines = item_lines("2x ", "Riesling 0,25l", "11,00", 32);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 32);
        assert!(lines[0].starts_with("2x Riesling 0,25l"));
        assert!(lines[0].ends_with("11,00"));
    }

    #[test]
    fn test_item_lines_wraps_instead_of_truncating() {
        let lines = item_lines("1x ", "Flammkuchen mit Speck und Zwiebeln", "9,50", 24);
        assert_eq!(lines[0], "1x Flammkuchen mit  9,50");
        assert_eq!(lines[1], "  Speck und Zwiebeln");
        assert!(lines.iter().all(|l| l.len() <= 24));
        assert!(lines.iter().all(|l| !l.contains("...")));
    }

    #[test]
    fn test_item_lines_without_amount() {
        let lines = item_lines("3x ", "Bratwurst", "", 32);
        assert_eq!(lines, vec!["3x Bratwurst"]);
    }
}
