// SPDX-License-Identifier: AGPL-3.0-or-later
//! Block assembler
//!
//! Drives classified lines through a small state machine. The open group
//! (paragraph, list, fence, table, quote) is closed whenever a line of a
//! different kind arrives, and whatever is still open at end of input is
//! force-closed. Fenced lines are captured verbatim. Quotes nest up to
//! `max_nesting` levels; deeper `>` markers are plain text.

use super::classify::{classify_line, is_separator_row, LineKind};
use super::inline::parse_inlines;
use crate::ast::{Block, Inline, ListItem, ListKind, TableCell, TableRow};
use crate::traits::ParseConfig;

#[derive(Debug)]
enum State {
    Normal,
    InParagraph(Vec<String>),
    InUnorderedList(Vec<ListItem>),
    InOrderedList { start: u32, items: Vec<ListItem> },
    InCodeFence {
        width: usize,
        language: Option<String>,
        lines: Vec<String>,
    },
    InTable { header: TableRow, body: Vec<TableRow> },
    InBlockQuote(Vec<String>),
}

pub struct BlockAssembler<'c> {
    config: &'c ParseConfig,
    state: State,
    blocks: Vec<Block>,
    /// Quote levels still allowed below this one
    depth: usize,
}

impl<'c> BlockAssembler<'c> {
    pub fn new(config: &'c ParseConfig) -> Self {
        Self::nested(config, config.max_nesting)
    }

    fn nested(config: &'c ParseConfig, depth: usize) -> Self {
        Self {
            config,
            state: State::Normal,
            blocks: Vec::new(),
            depth,
        }
    }

    /// Assemble the whole input into blocks
    pub fn assemble(mut self, input: &str) -> Vec<Block> {
        let lines: Vec<&str> = input.lines().collect();
        let mut idx = 0;
        while idx < lines.len() {
            idx += self.push_line(lines[idx], lines.get(idx + 1).copied());
        }
        self.close();
        self.blocks
    }

    /// Feed one line; `next` is peeked for table headers. Returns how many
    /// lines were consumed.
    fn push_line(&mut self, line: &str, next: Option<&str>) -> usize {
        if let State::InCodeFence { width, lines, .. } = &mut self.state {
            let closes = matches!(
                classify_line(line),
                LineKind::Fence { width: w, info } if w >= *width && info.is_empty()
            );
            if closes {
                self.close();
            } else {
                lines.push(line.to_string());
            }
            return 1;
        }

        match classify_line(line) {
            LineKind::Fence { width, info } => {
                self.close();
                let language = info.split_whitespace().next().map(str::to_string);
                self.state = State::InCodeFence {
                    width,
                    language,
                    lines: Vec::new(),
                };
            }
            LineKind::Heading { level, text } => {
                self.close();
                self.blocks.push(Block::Heading {
                    level,
                    content: self.inlines(text),
                });
            }
            LineKind::OrderedItem { number, text } => {
                let item = ListItem {
                    content: self.inlines(text),
                };
                if let State::InOrderedList { items, .. } = &mut self.state {
                    items.push(item);
                } else {
                    self.close();
                    self.state = State::InOrderedList {
                        start: number,
                        items: vec![item],
                    };
                }
            }
            LineKind::UnorderedItem { text } => {
                let item = ListItem {
                    content: self.inlines(text),
                };
                if let State::InUnorderedList(items) = &mut self.state {
                    items.push(item);
                } else {
                    self.close();
                    self.state = State::InUnorderedList(vec![item]);
                }
            }
            LineKind::TableRow { cells } => return self.table_row(line, cells, next),
            LineKind::BlockQuote { .. } if self.depth == 0 => self.text_line(line),
            LineKind::BlockQuote { text } => {
                if let State::InBlockQuote(lines) = &mut self.state {
                    lines.push(text.to_string());
                } else {
                    self.close();
                    self.state = State::InBlockQuote(vec![text.to_string()]);
                }
            }
            LineKind::ThematicBreak => {
                self.close();
                self.blocks.push(Block::ThematicBreak);
            }
            LineKind::Blank => self.close(),
            LineKind::Text { text } => self.text_line(text),
        }
        1
    }

    fn table_row(&mut self, line: &str, cells: Vec<&str>, next: Option<&str>) -> usize {
        if let State::InTable { body, .. } = &mut self.state {
            let row = row_from_cells(&cells, self.config);
            body.push(row);
            return 1;
        }

        let separator_follows = next
            .map(classify_line)
            .is_some_and(|kind| match kind {
                LineKind::TableRow { cells } => {
                    is_separator_row(&cells, self.config.min_separator_dashes)
                }
                _ => false,
            });

        if separator_follows {
            self.close();
            self.state = State::InTable {
                header: row_from_cells(&cells, self.config),
                body: Vec::new(),
            };
            2
        } else {
            // No separator row: the pipes are just text
            self.text_line(line);
            1
        }
    }

    fn text_line(&mut self, text: &str) {
        if let State::InParagraph(lines) = &mut self.state {
            lines.push(text.to_string());
        } else {
            self.close();
            self.state = State::InParagraph(vec![text.to_string()]);
        }
    }

    /// Emit the open group, if any, and return to `Normal`
    fn close(&mut self) {
        let block = match std::mem::replace(&mut self.state, State::Normal) {
            State::Normal => None,
            State::InParagraph(lines) => Some(Block::Paragraph {
                content: self.paragraph(&lines),
            }),
            State::InUnorderedList(items) => Some(Block::List {
                kind: ListKind::Bullet,
                items,
                start: None,
            }),
            State::InOrderedList { start, items } => Some(Block::List {
                kind: ListKind::Ordered,
                items,
                start: (start != 1).then_some(start),
            }),
            State::InCodeFence { language, lines, .. } => Some(Block::CodeBlock {
                language,
                content: lines.join("\n"),
            }),
            State::InTable { header, body } => Some(Block::Table { header, body }),
            State::InBlockQuote(lines) => Some(Block::BlockQuote {
                content: BlockAssembler::nested(self.config, self.depth - 1)
                    .assemble(&lines.join("\n")),
            }),
        };
        if let Some(block) = block {
            self.blocks.push(block);
        }
    }

    /// Lines of one paragraph, scanned as one text so spans may cross lines.
    /// Two trailing spaces survive the trim to mark a hard break.
    fn paragraph(&self, lines: &[String]) -> Vec<Inline> {
        let mut joined = String::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                if lines[i - 1].ends_with("  ") {
                    joined.push_str("  ");
                }
                joined.push('\n');
            }
            joined.push_str(line.trim());
        }
        self.inlines(&joined)
    }

    fn inlines(&self, text: &str) -> Vec<Inline> {
        parse_inlines(text, self.config)
    }
}

fn row_from_cells(cells: &[&str], config: &ParseConfig) -> TableRow {
    TableRow {
        cells: cells
            .iter()
            .map(|cell| TableCell {
                content: parse_inlines(cell, config),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assemble(input: &str) -> Vec<Block> {
        BlockAssembler::new(&ParseConfig::default()).assemble(input)
    }

    fn text(s: &str) -> Vec<Inline> {
        vec![Inline::text(s)]
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        assert_eq!(
            assemble("one\ntwo\n\n\n\nthree"),
            vec![
                Block::Paragraph {
                    content: vec![Inline::text("one"), Inline::SoftBreak, Inline::text("two")],
                },
                Block::Paragraph { content: text("three") },
            ]
        );
    }

    #[test]
    fn test_hard_break() {
        assert_eq!(
            assemble("one  \ntwo"),
            vec![Block::Paragraph {
                content: vec![Inline::text("one"), Inline::LineBreak, Inline::text("two")],
            }]
        );
    }

    #[test]
    fn test_list_switch_closes_previous() {
        let blocks = assemble("- a\n- b\n1. c\n2. d\ntext");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[0], Block::List { kind: ListKind::Bullet, items, .. } if items.len() == 2));
        assert!(matches!(&blocks[1], Block::List { kind: ListKind::Ordered, items, start: None } if items.len() == 2));
        assert!(matches!(&blocks[2], Block::Paragraph { .. }));
    }

    #[test]
    fn test_ordered_list_start() {
        let blocks = assemble("3. three\n4. four");
        assert!(matches!(&blocks[0], Block::List { start: Some(3), .. }));
    }

    #[test]
    fn test_unclosed_list_is_force_closed() {
        let blocks = assemble("- a\n- b\n- c");
        assert_eq!(blocks.len(), 1);
        assert!(matches!(&blocks[0], Block::List { items, .. } if items.len() == 3));
    }

    #[test]
    fn test_fence_is_verbatim() {
        let blocks = assemble("```rust\nlet x = **not bold**;\n# not a heading\n```\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::CodeBlock {
                    language: Some("rust".to_string()),
                    content: "let x = **not bold**;\n# not a heading".to_string(),
                },
                Block::Paragraph { content: text("after") },
            ]
        );
    }

    #[test]
    fn test_longer_fence_contains_shorter() {
        let blocks = assemble("````\n```\ninner\n```\n````");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: None,
                content: "```\ninner\n```".to_string(),
            }]
        );
    }

    #[test]
    fn test_unclosed_fence_is_force_closed() {
        let blocks = assemble("```\ncode\n\nmore");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: None,
                content: "code\n\nmore".to_string(),
            }]
        );
    }

    #[test]
    fn test_table_needs_separator() {
        let blocks = assemble("| a | b |\n| --- | --- |\n| 1 | 2 |");
        let Block::Table { header, body } = &blocks[0] else {
            panic!("expected table, got {blocks:?}");
        };
        assert_eq!(header.cells.len(), 2);
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].cells[1].content, text("2"));

        let blocks = assemble("| a | b |");
        assert_eq!(blocks, vec![Block::Paragraph { content: text("| a | b |") }]);
    }

    #[test]
    fn test_table_ends_on_other_line() {
        let blocks = assemble("| h |\n|---|\n| r |\nafter");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[1], Block::Paragraph { .. }));
    }

    #[test]
    fn test_blockquote_is_nested_document() {
        let blocks = assemble("> # Quote\n> body\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::BlockQuote {
                    content: vec![
                        Block::Heading { level: 1, content: text("Quote") },
                        Block::Paragraph { content: text("body") },
                    ],
                },
                Block::Paragraph { content: text("after") },
            ]
        );
    }

    #[test]
    fn test_heading_interrupts_paragraph() {
        let blocks = assemble("intro\n## Next\n---");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph { content: text("intro") },
                Block::Heading { level: 2, content: text("Next") },
                Block::ThematicBreak,
            ]
        );
    }

    #[test]
    fn test_strong_spans_paragraph_lines() {
        assert_eq!(
            assemble("a **b\nc** d"),
            vec![Block::Paragraph {
                content: vec![
                    Inline::text("a "),
                    Inline::Strong {
                        content: vec![Inline::text("b"), Inline::SoftBreak, Inline::text("c")],
                    },
                    Inline::text(" d"),
                ],
            }]
        );
    }

    #[test]
    fn test_quote_depth_is_capped() {
        let config = ParseConfig {
            max_nesting: 2,
            ..ParseConfig::default()
        };
        let blocks = BlockAssembler::new(&config).assemble(">>> deep");
        assert_eq!(
            blocks,
            vec![Block::BlockQuote {
                content: vec![Block::BlockQuote {
                    content: vec![Block::Paragraph { content: text("> deep") }],
                }],
            }]
        );
    }

    #[test]
    fn test_very_deep_quote_does_not_overflow() {
        let blocks = assemble(&">".repeat(100_000));
        let mut depth = 0;
        let mut level = &blocks;
        while let [Block::BlockQuote { content }] = level.as_slice() {
            depth += 1;
            level = content;
        }
        assert_eq!(depth, ParseConfig::default().max_nesting);
        assert!(matches!(level.as_slice(), [Block::Paragraph { .. }]));
    }
}
