// SPDX-License-Identifier: AGPL-3.0-or-later
//! Line classifier
//!
//! Tags a single line by its block role. Rules are tried in a fixed order:
//! fence > heading > ordered item > unordered item > table row > quote >
//! thematic break > blank > text. There is no line-level escaping, so
//! `# word` at the start of a line is always a heading.

/// Classification of one input line, with the captured content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Opening or closing run of three or more backticks, with the
    /// trailing info string
    Fence { width: usize, info: &'a str },
    Heading { level: u8, text: &'a str },
    OrderedItem { number: u32, text: &'a str },
    UnorderedItem { text: &'a str },
    /// `|`-delimited row; cells are trimmed
    TableRow { cells: Vec<&'a str> },
    BlockQuote { text: &'a str },
    ThematicBreak,
    Blank,
    Text { text: &'a str },
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    let body = strip_indent(line);

    let ticks = body.bytes().take_while(|b| *b == b'`').count();
    if ticks >= 3 {
        return LineKind::Fence {
            width: ticks,
            info: body[ticks..].trim(),
        };
    }
    if let Some(kind) = heading(body) {
        return kind;
    }
    if let Some(kind) = ordered_item(body) {
        return kind;
    }
    if let Some(kind) = unordered_item(body) {
        return kind;
    }
    if let Some(cells) = table_cells(body) {
        return LineKind::TableRow { cells };
    }
    if let Some(rest) = body.strip_prefix('>') {
        let text = rest.strip_prefix(' ').unwrap_or(rest);
        return LineKind::BlockQuote { text };
    }
    if is_thematic_break(body) {
        return LineKind::ThematicBreak;
    }
    if body.trim().is_empty() {
        return LineKind::Blank;
    }
    LineKind::Text { text: line }
}

/// Whether every cell of a row is a header separator like `---` or `:-:`
pub fn is_separator_row(cells: &[&str], min_dashes: usize) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            let inner = cell.trim();
            let inner = inner.strip_prefix(':').unwrap_or(inner);
            let inner = inner.strip_suffix(':').unwrap_or(inner);
            inner.len() >= min_dashes.max(1) && inner.chars().all(|c| c == '-')
        })
}

/// Drop up to three leading spaces
fn strip_indent(line: &str) -> &str {
    let indent = line.bytes().take(3).take_while(|b| *b == b' ').count();
    &line[indent..]
}

fn heading(body: &str) -> Option<LineKind<'_>> {
    let hashes = body.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &body[hashes..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let mut text = rest.trim();
    // Closing hashes are decoration: `## Title ##`
    let unclosed = text.trim_end_matches('#');
    if unclosed.is_empty() || unclosed.ends_with([' ', '\t']) {
        text = unclosed.trim_end();
    }
    Some(LineKind::Heading {
        level: hashes as u8,
        text,
    })
}

fn ordered_item(body: &str) -> Option<LineKind<'_>> {
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let rest = body[digits..].strip_prefix('.')?;
    let text = marker_content(rest)?;
    let number = body[..digits].parse().ok()?;
    Some(LineKind::OrderedItem { number, text })
}

fn unordered_item(body: &str) -> Option<LineKind<'_>> {
    let rest = body.strip_prefix(['-', '+', '*'])?;
    let text = marker_content(rest)?;
    Some(LineKind::UnorderedItem { text })
}

/// Content after a list marker; the marker must be followed by whitespace
/// or end the line
fn marker_content(rest: &str) -> Option<&str> {
    if rest.is_empty() {
        return Some("");
    }
    if rest.starts_with([' ', '\t']) {
        Some(rest.trim())
    } else {
        None
    }
}

fn table_cells(body: &str) -> Option<Vec<&str>> {
    let trimmed = body.trim_end();
    if trimmed.len() < 2 || !trimmed.starts_with('|') || !trimmed.ends_with('|') {
        return None;
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    let mut cells = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in inner.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '|' if !escaped => {
                cells.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => escaped = false,
        }
    }
    cells.push(inner[start..].trim());
    Some(cells)
}

fn is_thematic_break(body: &str) -> bool {
    let trimmed = body.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first @ ('-' | '*' | '_')) => {
            trimmed.len() >= 3 && trimmed.chars().all(|c| c == first)
        }
        _ => false,
    }
}
