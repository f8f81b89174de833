// SPDX-License-Identifier: AGPL-3.0-or-later
//! Inline formatter
//!
//! One left-to-right scan over the text of a block. At each position the
//! rules are tried in order: backslash escape, code span, image, link,
//! strong, strikethrough, emphasis. Delimiter searches skip code spans and
//! escapes, so text inside backticks is never reinterpreted. Anything
//! unmatched stays literal. A `\n` separates the lines of a paragraph and
//! becomes a soft break, or a hard break after two trailing spaces.
//!
//! Every closer search runs at most once per delimiter kind: a failed search
//! is remembered for the rest of the scan, and brackets are paired up front.
//! That keeps a scan linear in its input.

use std::collections::HashMap;

use crate::ast::{plain_text, Inline};
use crate::traits::ParseConfig;

/// Parse the inline content of one block
pub fn parse_inlines(text: &str, config: &ParseConfig) -> Vec<Inline> {
    InlineScanner::new(text, config.backslash_escapes, config.max_nesting).scan()
}

struct InlineScanner<'t> {
    text: &'t str,
    escapes: bool,
    /// Container levels still allowed below this one
    depth: usize,
    /// Delimiter runs `(char, width)` with no closer left in the text
    unclosed: Vec<(char, usize)>,
    /// Backtick width -> offset from which no run of that width follows
    no_code_close: HashMap<usize, usize>,
    brackets: Option<HashMap<usize, usize>>,
    parens: Option<HashMap<usize, usize>>,
}

impl<'t> InlineScanner<'t> {
    fn new(text: &'t str, escapes: bool, depth: usize) -> Self {
        Self {
            text,
            escapes,
            depth,
            unclosed: Vec::new(),
            no_code_close: HashMap::new(),
            brackets: None,
            parens: None,
        }
    }

    /// Scan the content of a container one level down
    fn nested(&self, inner: &str) -> Vec<Inline> {
        InlineScanner::new(inner, self.escapes, self.depth.saturating_sub(1)).scan()
    }

    fn scan(&mut self) -> Vec<Inline> {
        let text = self.text;
        let mut out = Vec::new();
        let mut buf = String::new();
        let mut i = 0;

        while i < text.len() {
            let rest = &text[i..];
            let Some(c) = rest.chars().next() else {
                break;
            };

            match c {
                '\n' => {
                    let hard = buf.ends_with("  ");
                    let kept = buf.trim_end_matches([' ', '\t']).len();
                    buf.truncate(kept);
                    flush(&mut out, &mut buf);
                    out.push(if hard { Inline::LineBreak } else { Inline::SoftBreak });
                    i += 1;
                    continue;
                }
                '\\' if self.escapes => {
                    if let Some(next) = rest[1..].chars().next().filter(char::is_ascii_punctuation) {
                        buf.push(next);
                        i += 1 + next.len_utf8();
                        continue;
                    }
                }
                '`' => {
                    let run = run_len(rest, '`');
                    if let Some(close) = self.code_close(i + run, run) {
                        let code = trim_code_padding(&text[i + run..close]);
                        flush(&mut out, &mut buf);
                        out.push(Inline::Code {
                            content: code.replace('\n', " "),
                        });
                        i = close + run;
                    } else {
                        buf.push_str(&rest[..run]);
                        i += run;
                    }
                    continue;
                }
                '!' if self.depth > 0 && rest[1..].starts_with('[') => {
                    if let Some(link) = self.link_parts(i + 1) {
                        flush(&mut out, &mut buf);
                        out.push(Inline::Image {
                            url: link.url,
                            alt: plain_text(&self.nested(link.label)),
                            title: link.title,
                        });
                        i = link.end;
                        continue;
                    }
                }
                '[' if self.depth > 0 => {
                    if let Some(link) = self.link_parts(i) {
                        flush(&mut out, &mut buf);
                        out.push(Inline::Link {
                            url: link.url,
                            title: link.title,
                            content: self.nested(link.label),
                        });
                        i = link.end;
                        continue;
                    }
                }
                '*' | '_' if self.depth > 0 => {
                    let prev = text[..i].chars().next_back();
                    let run = run_len(rest, c);
                    if run >= 2 {
                        if let Some((inner_end, end)) = self.delimited(i, c, 2, prev) {
                            flush(&mut out, &mut buf);
                            out.push(Inline::Strong {
                                content: self.nested(&text[i + 2..inner_end]),
                            });
                            i = end;
                            continue;
                        }
                    }
                    if run == 1 || run >= 3 {
                        if let Some((inner_end, end)) = self.delimited(i, c, 1, prev) {
                            flush(&mut out, &mut buf);
                            out.push(Inline::Emphasis {
                                content: self.nested(&text[i + 1..inner_end]),
                            });
                            i = end;
                            continue;
                        }
                    }
                    buf.push_str(&rest[..run]);
                    i += run;
                    continue;
                }
                '~' if self.depth > 0 && rest.starts_with("~~") => {
                    let prev = text[..i].chars().next_back();
                    if let Some((inner_end, end)) = self.delimited(i, '~', 2, prev) {
                        flush(&mut out, &mut buf);
                        out.push(Inline::Strikethrough {
                            content: self.nested(&text[i + 2..inner_end]),
                        });
                        i = end;
                        continue;
                    }
                }
                _ => {}
            }

            buf.push(c);
            i += c.len_utf8();
        }

        flush(&mut out, &mut buf);
        out
    }

    /// Match `delim` repeated `width` times at `at` against a closing run.
    /// Returns the end of the inner text and the end of the closing run.
    fn delimited(
        &mut self,
        at: usize,
        delim: char,
        width: usize,
        prev: Option<char>,
    ) -> Option<(usize, usize)> {
        if self.unclosed.contains(&(delim, width)) {
            return None;
        }
        let text = self.text;
        let start = at + width;
        let after_open = &text[start..];
        if after_open.starts_with(char::is_whitespace) || after_open.is_empty() {
            return None;
        }
        if delim == '_' && prev.is_some_and(char::is_alphanumeric) {
            return None;
        }

        let mut j = start;
        while j < text.len() {
            let tail = &text[j..];
            let Some(c) = tail.chars().next() else {
                break;
            };
            if c == '\\' && self.escapes {
                j += 1 + tail[1..].chars().next().map_or(0, char::len_utf8);
                continue;
            }
            if c == '`' {
                let run = run_len(tail, '`');
                j = self.code_close(j + run, run).map_or(j + run, |close| close + run);
                continue;
            }
            if c == delim {
                let run = run_len(tail, delim);
                let before = text[..j].chars().next_back();
                let after = tail[run..].chars().next();
                let flanking = j > start && !before.is_some_and(char::is_whitespace);
                let word_ok = delim != '_' || !after.is_some_and(char::is_alphanumeric);
                let fits = if width == 1 { run == 1 } else { run >= width };
                if flanking && word_ok && fits {
                    // A longer closing run closes at its end: `**a***` -> strong("a*")
                    let close_at = j + run - width;
                    return Some((close_at, close_at + width));
                }
                j += run;
                continue;
            }
            j += c.len_utf8();
        }

        // Later openers of this kind only see a subset of these closers
        self.unclosed.push((delim, width));
        None
    }

    /// Parse `[label](url "title")` with the `[` at `at`
    fn link_parts(&mut self, at: usize) -> Option<LinkParts<'t>> {
        let text = self.text;
        let label_end = self.bracket_close(at)?;
        let open = label_end + 1;
        if !text[open..].starts_with('(') {
            return None;
        }
        let dest_end = self.paren_close(open)?;
        let dest = text[open + 1..dest_end].trim();
        if dest.contains('\n') {
            return None;
        }
        let (url, title) = split_destination(dest);
        Some(LinkParts {
            label: &text[at + 1..label_end],
            url: url.to_string(),
            title: title.map(str::to_string),
            end: dest_end + 1,
        })
    }

    fn bracket_close(&mut self, at: usize) -> Option<usize> {
        if self.brackets.is_none() {
            let pairs = self.pairs('[', ']', true);
            self.brackets = Some(pairs);
        }
        self.brackets.as_ref()?.get(&at).copied()
    }

    fn paren_close(&mut self, at: usize) -> Option<usize> {
        if self.parens.is_none() {
            let pairs = self.pairs('(', ')', false);
            self.parens = Some(pairs);
        }
        self.parens.as_ref()?.get(&at).copied()
    }

    /// Pair every `open` with its balancing `close` in one pass
    fn pairs(&mut self, open: char, close: char, skip_code: bool) -> HashMap<usize, usize> {
        let text = self.text;
        let mut pairs = HashMap::new();
        let mut stack = Vec::new();
        let mut j = 0;
        while j < text.len() {
            let tail = &text[j..];
            let Some(c) = tail.chars().next() else {
                break;
            };
            if c == '\\' && self.escapes {
                j += 1 + tail[1..].chars().next().map_or(0, char::len_utf8);
                continue;
            }
            if c == '`' && skip_code {
                let run = run_len(tail, '`');
                j = self.code_close(j + run, run).map_or(j + run, |close| close + run);
                continue;
            }
            if c == open {
                stack.push(j);
            } else if c == close {
                if let Some(o) = stack.pop() {
                    pairs.insert(o, j);
                }
            }
            j += c.len_utf8();
        }
        pairs
    }

    /// Start of the backtick run of exactly `width` closing a code span
    /// whose content starts at `from`
    fn code_close(&mut self, from: usize, width: usize) -> Option<usize> {
        if self.no_code_close.get(&width).is_some_and(|&p| p <= from) {
            return None;
        }
        match find_backtick_run(&self.text[from..], width) {
            Some(offset) => Some(from + offset),
            None => {
                let failed = self.no_code_close.entry(width).or_insert(from);
                *failed = (*failed).min(from);
                None
            }
        }
    }
}

struct LinkParts<'t> {
    label: &'t str,
    url: String,
    title: Option<String>,
    end: usize,
}

/// `url "title"` or `<url>`; the title is optional
fn split_destination(dest: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = dest.strip_suffix('"') {
        if let Some(split) = stripped.rfind(" \"") {
            let url = dest[..split].trim();
            let title = &stripped[split + 2..];
            return (unwrap_angle(url), Some(title));
        }
    }
    (unwrap_angle(dest), None)
}

fn unwrap_angle(url: &str) -> &str {
    url.strip_prefix('<')
        .and_then(|u| u.strip_suffix('>'))
        .unwrap_or(url)
}

fn run_len(text: &str, c: char) -> usize {
    text.chars().take_while(|x| *x == c).count() * c.len_utf8()
}

/// Offset of a backtick run of exactly `width` in `text`
fn find_backtick_run(text: &str, width: usize) -> Option<usize> {
    let mut j = 0;
    while j < text.len() {
        let tail = &text[j..];
        if tail.starts_with('`') {
            let run = run_len(tail, '`');
            if run == width {
                return Some(j);
            }
            j += run;
        } else {
            j += tail.chars().next().map_or(1, char::len_utf8);
        }
    }
    None
}

/// One space of padding on both sides is stripped: `` ` `a` ` `` -> `` `a` ``
fn trim_code_padding(code: &str) -> &str {
    if code.len() >= 2 && code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty() {
        &code[1..code.len() - 1]
    } else {
        code
    }
}

fn flush(out: &mut Vec<Inline>, buf: &mut String) {
    if buf.is_empty() {
        return;
    }
    let text = std::mem::take(buf);
    if let Some(Inline::Text { content }) = out.last_mut() {
        content.push_str(&text);
    } else {
        out.push(Inline::Text { content: text });
    }
}
