//! CLI output formatting for a build run.
//!
//! Output is **card-centric**: each card leads with its positional index and
//! headline, with the written file and photo status as indented context
//! lines. Failures keep the same header so a reader can line them up with
//! the article list.
//!
//! ```text
//! msnbc: 3 cards (10 requested, 3 available)
//! 01 Senate passes stopgap funding bill hours before shutdown deadline
//!     File: msnbc-01.jpg
//!     Photo: embedded
//! 02 Storm system brings record rainfall to the Gulf Coast
//!     File: msnbc-02.jpg
//!     Photo: placeholder
//! 03 Markets rally as inflation cools
//!     Error: card encoding failed: ...
//! ```
//!
//! [`format_build_event`] is pure and returns lines for testability; the
//! binary prints them as events arrive.

use crate::builder::BuildEvent;

/// Headlines longer than this are cut with `...` in the listing.
const MAX_TITLE_CHARS: usize = 72;

/// Format a 1-based card index the way card files are numbered.
fn format_index(pos: usize) -> String {
    format!("{:0>2}", pos)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_title(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn card_header(index: usize, title: &str) -> String {
    format!(
        "{} {}",
        format_index(index),
        truncate_title(title, MAX_TITLE_CHARS)
    )
}

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::Started {
            source,
            requested,
            available,
            count,
        } => {
            let noun = if *count == 1 { "card" } else { "cards" };
            vec![format!(
                "{source}: {count} {noun} ({requested} requested, {available} available)"
            )]
        }
        BuildEvent::CardWritten {
            index,
            title,
            file_name,
            has_photo,
        } => vec![
            card_header(*index, title),
            format!("    File: {file_name}"),
            format!(
                "    Photo: {}",
                if *has_photo { "embedded" } else { "placeholder" }
            ),
        ],
        BuildEvent::CardFailed {
            index,
            title,
            error,
        } => vec![card_header(*index, title), format!("    Error: {error}")],
    }
}
