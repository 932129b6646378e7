//! Greedy pixel-aware word wrapping.
//!
//! Headlines are wrapped against real glyph widths supplied by the caller
//! (see [`TextRenderer::measure`](crate::font::TextRenderer::measure)), not
//! character counts, so proportional fonts fill the title area evenly.
//!
//! ## Algorithm
//!
//! While the remaining text is wider than the budget, scan backward from its
//! end for the rightmost space whose prefix fits; emit the prefix as a line
//! and continue after that space. When no space gives a fitting prefix (a
//! single word wider than the budget), the first word is emitted on its own
//! and allowed to overflow so the loop always makes progress.
//!
//! At most `max_lines` lines are returned. Whatever does not fit is dropped
//! without an ellipsis.

/// Largest accepted `max_lines`.
pub const MAX_LINES_LIMIT: usize = 10;

/// Split `text` into at most `max_lines` lines no wider than `max_width`.
///
/// `max_lines` outside `1..=10` is a usage error: it is logged and yields an
/// empty list.
pub fn wrap_text(
    text: &str,
    measure: impl Fn(&str) -> f32,
    max_width: f32,
    max_lines: usize,
) -> Vec<String> {
    let mut lines = Vec::new();
    if !(1..=MAX_LINES_LIMIT).contains(&max_lines) {
        tracing::error!(max_lines, "max_lines must be between 1 and {MAX_LINES_LIMIT}");
        return lines;
    }

    let mut rest = text;
    while !rest.is_empty() {
        if measure(rest) <= max_width {
            lines.push(rest.to_string());
            break;
        }
        let (line, remainder) = break_line(rest, &measure, max_width);
        lines.push(line.to_string());
        rest = remainder;
        if lines.len() >= max_lines {
            if !rest.is_empty() {
                tracing::debug!(dropped = rest, "title truncated");
            }
            break;
        }
    }
    lines
}

/// Split off the longest fitting prefix that ends before a space.
///
/// Spaces at index 0 never break, matching the backward scan stopping short
/// of the first character.
fn break_line<'a>(
    text: &'a str,
    measure: &impl Fn(&str) -> f32,
    max_width: f32,
) -> (&'a str, &'a str) {
    let spaces = || text.match_indices(' ').map(|(i, _)| i).filter(|&i| i > 0);

    for i in spaces().rev() {
        let candidate = &text[..i];
        if measure(candidate) <= max_width {
            return (candidate, &text[i + 1..]);
        }
    }

    // Nothing fits: let the first word overflow.
    match spaces().next() {
        Some(i) => (&text[..i], &text[i + 1..]),
        None => (text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Monospace stand-in: 20px per character.
    fn mono(s: &str) -> f32 {
        s.chars().count() as f32 * 20.0
    }

    const HEADLINE: &str =
        "A very long headline that cannot possibly fit on a single line of the canvas";

    // =========================================================================
    // Basic behaviour
    // =========================================================================

    #[test]
    fn fitting_text_is_one_line() {
        let lines = wrap_text("short text that fits", mono, 10_000.0, 3);
        assert_eq!(lines, vec!["short text that fits"]);
    }

    #[test]
    fn exact_fit_is_one_line() {
        // 5 chars * 20px = 100px
        assert_eq!(wrap_text("hello", mono, 100.0, 1), vec!["hello"]);
    }

    #[test]
    fn empty_text_is_no_lines() {
        assert!(wrap_text("", mono, 100.0, 3).is_empty());
    }

    #[test]
    fn breaks_at_rightmost_fitting_space() {
        // budget 11 chars: "the quick b" → break after "the quick"
        let lines = wrap_text("the quick brown fox", mono, 220.0, 3);
        assert_eq!(lines, vec!["the quick", "brown fox"]);
    }

    #[test]
    fn delimiting_space_is_consumed() {
        let lines = wrap_text("aaaa bbbb cccc", mono, 80.0, 3);
        assert_eq!(lines, vec!["aaaa", "bbbb", "cccc"]);
    }

    #[test]
    fn long_headline_lines_fit_budget() {
        let lines = wrap_text(HEADLINE, mono, 900.0, 3);
        assert_eq!(
            lines,
            vec![
                "A very long headline that cannot possibly fit",
                "on a single line of the canvas",
            ]
        );
        assert!(lines.iter().all(|l| mono(l) <= 900.0));
    }

    // =========================================================================
    // Line budget
    // =========================================================================

    #[test]
    fn remainder_beyond_max_lines_is_dropped() {
        let title = format!("{HEADLINE} {HEADLINE}");
        let lines = wrap_text(&title, mono, 900.0, 3);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| mono(l) <= 900.0));
        let joined = lines.join(" ");
        assert!(title.starts_with(&joined));
        assert!(joined.len() < title.len());
    }

    #[test]
    fn never_exceeds_max_lines() {
        let words = "word ".repeat(200);
        for max_lines in 1..=MAX_LINES_LIMIT {
            let lines = wrap_text(words.trim_end(), mono, 200.0, max_lines);
            assert_eq!(lines.len(), max_lines);
        }
    }

    #[test]
    fn zero_max_lines_is_empty() {
        assert!(wrap_text(HEADLINE, mono, 900.0, 0).is_empty());
    }

    #[test]
    fn too_many_max_lines_is_empty() {
        assert!(wrap_text("fits", mono, 900.0, 11).is_empty());
    }

    // =========================================================================
    // Overflow
    // =========================================================================

    #[test]
    fn oversized_single_word_overflows() {
        let lines = wrap_text("Supercalifragilistic", mono, 100.0, 3);
        assert_eq!(lines, vec!["Supercalifragilistic"]);
    }

    #[test]
    fn oversized_first_word_gets_own_line() {
        let lines = wrap_text("Supercalifragilistic is long", mono, 200.0, 3);
        assert_eq!(lines, vec!["Supercalifragilistic", "is long"]);
    }

    #[test]
    fn leading_space_is_not_a_break_point() {
        let lines = wrap_text(" abcdefghij", mono, 100.0, 2);
        assert_eq!(lines, vec![" abcdefghij"]);
    }

    #[test]
    fn multibyte_text_breaks_on_char_boundaries() {
        let lines = wrap_text("Él café größer naïve", mono, 120.0, 4);
        assert_eq!(lines, vec!["Él", "café", "größer", "naïve"]);
    }

    #[test]
    fn proportional_measure_is_respected() {
        // 'W' is wide, everything else narrow.
        let measure = |s: &str| -> f32 {
            s.chars()
                .map(|c| if c == 'W' { 50.0 } else { 10.0 })
                .sum()
        };
        let lines = wrap_text("WWW ii WW i", measure, 160.0, 3);
        assert_eq!(lines, vec!["WWW", "ii WW i"]);
    }
}
