// SPDX-License-Identifier: AGPL-3.0-or-later
//! Reduce a parsed HTML document to the AST
//!
//! Markup is parsed by html5ever into an `RcDom`, which already applies the
//! browser rules for implied and stray tags and decodes every entity. Known
//! block tags map to blocks, known inline tags to inlines. Wrapper tags
//! (`div`, `section`, `span`, anything unknown) are unwrapped, and loose
//! inline content between blocks becomes an implicit paragraph.
//!
//! Whitespace runs containing a newline become soft breaks; other runs are
//! kept as written. Elements nested past the depth budget contribute their
//! text only.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::ast::{Block, Inline, ListItem, ListKind, TableCell, TableRow};

/// Dropped together with everything inside them
const SKIPPED: &[&str] = &[
    "head", "script", "style", "template", "title", "noscript", "iframe", "object", "svg",
    "select", "button",
];

/// Unwrapped at block level; their content starts a new paragraph
const CONTAINERS: &[&str] = &[
    "html", "body", "main", "div", "section", "article", "header", "footer", "nav", "aside",
    "figure", "figcaption", "address", "form", "fieldset", "details", "summary", "dl", "dt",
    "dd", "center", "li", "thead", "tbody", "tfoot", "tr", "td", "th", "caption",
];

/// Known block tags, treated as line-separated when met inside inline content
const BLOCKS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "pre", "blockquote", "table", "hr",
];

/// Parse markup into a DOM; html5ever never rejects input
pub fn parse_dom(input: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(input)
}

/// The `<body>` html5ever always creates, or the document node itself
pub fn body(dom: &RcDom) -> Handle {
    child_named(&dom.document, "html")
        .and_then(|html| child_named(&html, "body"))
        .unwrap_or_else(|| dom.document.clone())
}

/// Reduce the children of `root`, allowing `depth` levels of element nesting
pub fn reduce(root: &Handle, depth: usize) -> Vec<Block> {
    reduce_nodes(&root.children.borrow(), depth)
}

fn reduce_nodes(nodes: &[Handle], depth: usize) -> Vec<Block> {
    let mut reducer = BlockReducer {
        blocks: Vec::new(),
        pending: Vec::new(),
        depth,
    };
    reducer.nodes(nodes);
    reducer.flush();
    reducer.blocks
}

fn tag(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

fn attr(node: &Handle, name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return None;
    };
    let attrs = attrs.borrow();
    let value = attrs
        .iter()
        .find(|a| &*a.name.local == name)
        .map(|a| String::from(&*a.value));
    value
}

fn child_named(node: &Handle, name: &str) -> Option<Handle> {
    let children = node.children.borrow();
    let found = children.iter().find(|c| tag(c) == Some(name)).cloned();
    found
}

struct BlockReducer {
    blocks: Vec<Block>,
    /// Loose inline content waiting to become a paragraph
    pending: Vec<Inline>,
    /// Element levels still allowed at this point
    depth: usize,
}

impl BlockReducer {
    fn nodes(&mut self, nodes: &[Handle]) {
        for node in nodes {
            self.node(node);
        }
    }

    /// Children of the current element, one level down
    fn nested(&mut self, nodes: &[Handle]) {
        self.depth -= 1;
        self.nodes(nodes);
        self.depth += 1;
    }

    fn node(&mut self, node: &Handle) {
        let Some(name) = tag(node) else {
            inline_node(&mut self.pending, node, self.depth);
            return;
        };
        if self.depth == 0 {
            inline_node(&mut self.pending, node, 0);
            return;
        }

        let depth = self.depth - 1;
        let children = node.children.borrow();
        if let Some(level) = heading_level(name) {
            self.flush();
            let content = block_inlines(&children, depth);
            if !content.is_empty() {
                self.blocks.push(Block::Heading { level, content });
            }
            return;
        }

        match name {
            "p" => {
                self.flush();
                self.nested(&children);
                self.flush();
            }
            "ul" | "ol" => {
                self.flush();
                self.blocks.extend(list(node, &children, depth));
            }
            "pre" => {
                self.flush();
                self.blocks.push(code_block(node, &children));
            }
            "blockquote" => {
                self.flush();
                let content = reduce_nodes(&children, depth);
                if !content.is_empty() {
                    self.blocks.push(Block::BlockQuote { content });
                }
            }
            "table" => {
                self.flush();
                self.blocks.extend(table(&children, depth));
            }
            "hr" => {
                self.flush();
                self.blocks.push(Block::ThematicBreak);
            }
            _ if SKIPPED.contains(&name) => {}
            _ if CONTAINERS.contains(&name) => {
                self.flush();
                self.nested(&children);
                self.flush();
            }
            _ => inline_node(&mut self.pending, node, self.depth),
        }
    }

    fn flush(&mut self) {
        let mut content = std::mem::take(&mut self.pending);
        trim_edges(&mut content);
        if !content.is_empty() {
            self.blocks.push(Block::Paragraph { content });
        }
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
        _ => None,
    }
}

fn list(node: &Handle, children: &[Handle], depth: usize) -> Option<Block> {
    let kind = if tag(node) == Some("ol") {
        ListKind::Ordered
    } else {
        ListKind::Bullet
    };
    let start = match kind {
        ListKind::Ordered => attr(node, "start")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|&n| n != 1),
        ListKind::Bullet => None,
    };

    let mut items = Vec::new();
    collect_items(children, &mut items, depth);
    (!items.is_empty()).then_some(Block::List { kind, items, start })
}

/// Nested lists are flattened into the items of the outer list
fn collect_items(nodes: &[Handle], items: &mut Vec<ListItem>, depth: usize) {
    for node in nodes {
        match tag(node) {
            Some("li") if depth > 0 => {
                let children = node.children.borrow();
                let (nested, inline): (Vec<&Handle>, Vec<&Handle>) =
                    children.iter().partition(|n| is_list(n));
                let mut content = Vec::new();
                for child in inline {
                    inline_node(&mut content, child, depth - 1);
                }
                push_item(items, content);
                for sublist in nested {
                    collect_items(&sublist.children.borrow(), items, depth - 1);
                }
            }
            Some(name) if depth > 0 && is_list_name(name) => {
                collect_items(&node.children.borrow(), items, depth - 1)
            }
            _ => {
                let mut content = Vec::new();
                inline_node(&mut content, node, depth);
                push_item(items, content);
            }
        }
    }
}

fn push_item(items: &mut Vec<ListItem>, mut content: Vec<Inline>) {
    trim_edges(&mut content);
    if !content.is_empty() {
        items.push(ListItem { content });
    }
}

fn is_list(node: &Handle) -> bool {
    tag(node).is_some_and(is_list_name)
}

fn is_list_name(name: &str) -> bool {
    name == "ul" || name == "ol"
}

fn code_block(pre: &Handle, children: &[Handle]) -> Block {
    let language = children
        .iter()
        .find(|n| tag(n) == Some("code"))
        .and_then(language_class)
        .or_else(|| language_class(pre));

    let mut content = String::new();
    collect_text(children, &mut content);
    // A newline straight after `<code>` is not content
    if content.starts_with('\n') {
        content.remove(0);
    }
    if content.ends_with('\n') {
        content.pop();
    }
    Block::CodeBlock { language, content }
}

fn language_class(node: &Handle) -> Option<String> {
    let class = attr(node, "class")?;
    class
        .split_whitespace()
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
        })
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

/// Text below `nodes` in document order, with `<br>` as a newline. Walks an
/// explicit stack, so nesting depth does not matter.
fn collect_text(nodes: &[Handle], out: &mut String) {
    let mut stack: Vec<Handle> = nodes.iter().rev().cloned().collect();
    while let Some(node) = stack.pop() {
        match &node.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { name, .. } if &*name.local == "br" => out.push('\n'),
            NodeData::Element { name, .. } if SKIPPED.contains(&&*name.local) => {}
            NodeData::Element { .. } => {
                stack.extend(node.children.borrow().iter().rev().cloned());
            }
            _ => {}
        }
    }
}

struct Row {
    in_head: bool,
    row: TableRow,
}

fn table(children: &[Handle], depth: usize) -> Option<Block> {
    let mut rows = Vec::new();
    collect_rows(children, false, &mut rows, depth);
    if rows.is_empty() {
        return None;
    }

    // `thead` wins; otherwise the first row, usually a row of `th`, is promoted
    let header_idx = rows.iter().position(|r| r.in_head).unwrap_or(0);
    let header = rows.remove(header_idx).row;
    let body = rows.into_iter().map(|r| r.row).collect();
    Some(Block::Table { header, body })
}

fn collect_rows(nodes: &[Handle], in_head: bool, rows: &mut Vec<Row>, depth: usize) {
    if depth == 0 {
        return;
    }
    for node in nodes {
        match tag(node) {
            Some("thead") => collect_rows(&node.children.borrow(), true, rows, depth - 1),
            Some("tbody" | "tfoot") => {
                collect_rows(&node.children.borrow(), false, rows, depth - 1)
            }
            Some("tr") => {
                let cells: Vec<TableCell> = node
                    .children
                    .borrow()
                    .iter()
                    .filter(|cell| matches!(tag(cell), Some("td" | "th")))
                    .map(|cell| TableCell {
                        content: block_inlines(&cell.children.borrow(), depth.saturating_sub(2)),
                    })
                    .collect();
                if !cells.is_empty() {
                    rows.push(Row {
                        in_head,
                        row: TableRow { cells },
                    });
                }
            }
            _ => {}
        }
    }
}

/// Inline content of a single block, trimmed at both ends
fn block_inlines(nodes: &[Handle], depth: usize) -> Vec<Inline> {
    let mut content = inlines(nodes, depth);
    trim_edges(&mut content);
    content
}

fn inlines(nodes: &[Handle], depth: usize) -> Vec<Inline> {
    let mut out = Vec::new();
    out_extend(&mut out, nodes, depth);
    out
}

fn out_extend(out: &mut Vec<Inline>, nodes: &[Handle], depth: usize) {
    for node in nodes {
        inline_node(out, node, depth);
    }
}

fn inline_node(out: &mut Vec<Inline>, node: &Handle, depth: usize) {
    let name = match &node.data {
        NodeData::Text { contents } => {
            push_text(out, &contents.borrow());
            return;
        }
        NodeData::Element { name, .. } => &*name.local,
        _ => return,
    };

    match name {
        "br" => return push_inline(out, Inline::LineBreak),
        "img" => {
            if let Some(src) = attr(node, "src") {
                push_inline(
                    out,
                    Inline::Image {
                        url: src,
                        alt: attr(node, "alt").unwrap_or_default(),
                        title: attr(node, "title"),
                    },
                );
            }
            return;
        }
        _ if SKIPPED.contains(&name) => return,
        _ => {}
    }

    let children = node.children.borrow();
    if depth == 0 {
        let mut text = String::new();
        collect_text(&children, &mut text);
        push_text(out, &text);
        return;
    }

    let depth = depth - 1;
    match name {
        "strong" | "b" => wrap(out, inlines(&children, depth), |content| Inline::Strong { content }),
        "em" | "i" => wrap(out, inlines(&children, depth), |content| Inline::Emphasis { content }),
        "del" | "s" | "strike" => wrap(out, inlines(&children, depth), |content| {
            Inline::Strikethrough { content }
        }),
        "code" | "kbd" | "samp" | "tt" => {
            let mut raw = String::new();
            collect_text(&children, &mut raw);
            let content = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if !content.is_empty() {
                push_inline(out, Inline::Code { content });
            }
        }
        "a" => match attr(node, "href") {
            Some(url) => {
                let title = attr(node, "title");
                wrap(out, inlines(&children, depth), |content| Inline::Link {
                    url,
                    title,
                    content,
                });
            }
            None => out_extend(out, &children, depth),
        },
        name if BLOCKS.contains(&name) || CONTAINERS.contains(&name) => {
            push_inline(out, Inline::SoftBreak);
            out_extend(out, &children, depth);
            push_inline(out, Inline::SoftBreak);
        }
        _ => out_extend(out, &children, depth),
    }
}

/// Whitespace runs containing a newline become soft breaks; other runs are
/// kept as written
fn push_text(out: &mut Vec<Inline>, text: &str) {
    let mut word = String::new();
    let mut run = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        end_run(out, &mut word, &mut run);
        word.push(c);
    }
    end_run(out, &mut word, &mut run);
    push_inline(out, Inline::Text { content: word });
}

fn end_run(out: &mut Vec<Inline>, word: &mut String, run: &mut String) {
    if run.is_empty() {
        return;
    }
    if run.contains(['\n', '\r']) {
        push_inline(out, Inline::Text { content: std::mem::take(word) });
        push_inline(out, Inline::SoftBreak);
    } else {
        word.push_str(run);
    }
    run.clear();
}

/// Append one inline, merging text and keeping at most one space where
/// adjacent nodes meet
fn push_inline(out: &mut Vec<Inline>, inline: Inline) {
    match inline {
        Inline::Text { mut content } => {
            if matches!(out.last(), Some(Inline::SoftBreak | Inline::LineBreak)) {
                content = content.trim_start_matches(' ').to_string();
            }
            if content.is_empty() {
                return;
            }
            if let Some(Inline::Text { content: prev }) = out.last_mut() {
                if prev.ends_with(' ') && content.starts_with(' ') {
                    content.remove(0);
                }
                prev.push_str(&content);
            } else {
                out.push(Inline::Text { content });
            }
        }
        Inline::SoftBreak => {
            trim_trailing_space(out);
            if !matches!(out.last(), Some(Inline::SoftBreak | Inline::LineBreak)) {
                out.push(Inline::SoftBreak);
            }
        }
        Inline::LineBreak => {
            trim_trailing_space(out);
            match out.last() {
                Some(Inline::LineBreak) => {}
                Some(Inline::SoftBreak) => {
                    out.pop();
                    out.push(Inline::LineBreak);
                }
                _ => out.push(Inline::LineBreak),
            }
        }
        other => out.push(other),
    }
}

fn trim_trailing_space(out: &mut Vec<Inline>) {
    if let Some(Inline::Text { content }) = out.last_mut() {
        let trimmed = content.trim_end_matches(' ').len();
        content.truncate(trimmed);
        if content.is_empty() {
            out.pop();
        }
    }
}

/// Wrap formatted content, moving edge whitespace outside the markers
fn wrap(out: &mut Vec<Inline>, mut content: Vec<Inline>, make: impl FnOnce(Vec<Inline>) -> Inline) {
    let leading = take_edge_space(&mut content, true);
    let trailing = take_edge_space(&mut content, false);
    if let Some(space) = leading {
        push_inline(out, space);
    }
    if !content.is_empty() {
        push_inline(out, make(content));
    }
    if let Some(space) = trailing {
        push_inline(out, space);
    }
}

fn take_edge_space(content: &mut Vec<Inline>, at_start: bool) -> Option<Inline> {
    let mut hoisted: Option<Inline> = None;
    loop {
        let idx = if at_start {
            0
        } else {
            match content.len().checked_sub(1) {
                Some(last) => last,
                None => break,
            }
        };
        match content.get_mut(idx) {
            Some(Inline::SoftBreak | Inline::LineBreak) => {
                let brk = content.remove(idx);
                hoisted = Some(match (hoisted, brk) {
                    (Some(Inline::LineBreak), _) | (_, Inline::LineBreak) => Inline::LineBreak,
                    _ => Inline::SoftBreak,
                });
            }
            Some(Inline::Text { content: text }) => {
                let trimmed = if at_start {
                    text.trim_start_matches(' ').to_string()
                } else {
                    text.trim_end_matches(' ').to_string()
                };
                if trimmed.len() == text.len() {
                    break;
                }
                hoisted.get_or_insert_with(|| Inline::text(" "));
                if trimmed.is_empty() {
                    content.remove(idx);
                } else {
                    *text = trimmed;
                    break;
                }
            }
            _ => break,
        }
    }
    hoisted
}

/// Drop breaks and spaces at both ends of a block's content
fn trim_edges(content: &mut Vec<Inline>) {
    take_edge_space(content, true);
    take_edge_space(content, false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reduce_html(html: &str) -> Vec<Block> {
        let dom = parse_dom(html);
        reduce(&body(&dom), 64)
    }

    fn para(content: Vec<Inline>) -> Block {
        Block::Paragraph { content }
    }

    #[test]
    fn test_paragraph_whitespace() {
        assert_eq!(
            reduce_html("<p>\n  Hello   <b> big </b>world\n  again </p>"),
            vec![para(vec![
                Inline::text("Hello   "),
                Inline::Strong { content: vec![Inline::text("big")] },
                Inline::text(" world"),
                Inline::SoftBreak,
                Inline::text("again"),
            ])]
        );
    }

    #[test]
    fn test_space_runs_are_kept() {
        assert_eq!(
            reduce_html("<p>hello  world</p>"),
            vec![para(vec![Inline::text("hello  world")])]
        );
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(
            reduce_html("<p>caf&eacute; &euro;5 &amp; &#x2014; &copy;</p>"),
            vec![para(vec![Inline::text("café €5 & — ©")])]
        );
    }

    #[test]
    fn test_br_swallows_newline() {
        assert_eq!(
            reduce_html("<p>one<br>\ntwo</p>"),
            vec![para(vec![Inline::text("one"), Inline::LineBreak, Inline::text("two")])]
        );
    }

    #[test]
    fn test_headings_and_rule() {
        assert_eq!(
            reduce_html("<h2>Title</h2><hr/><h7>x</h7>"),
            vec![
                Block::Heading { level: 2, content: vec![Inline::text("Title")] },
                Block::ThematicBreak,
                para(vec![Inline::text("x")]),
            ]
        );
    }

    #[test]
    fn test_containers_unwrap_and_loose_text() {
        assert_eq!(
            reduce_html("<div><section>intro <span>text</span></section><p>next</p>tail</div>"),
            vec![
                para(vec![Inline::text("intro text")]),
                para(vec![Inline::text("next")]),
                para(vec![Inline::text("tail")]),
            ]
        );
    }

    #[test]
    fn test_skipped_elements() {
        assert_eq!(
            reduce_html("<head><title>t</title><style>p{}</style></head><script>x()</script><p>kept</p>"),
            vec![para(vec![Inline::text("kept")])]
        );
    }

    #[test]
    fn test_nested_list_flattened() {
        let blocks = reduce_html("<ol start=\"3\"><li>a<ul><li>b</li></ul></li><li><p>c</p></li></ol>");
        assert_eq!(
            blocks,
            vec![Block::List {
                kind: ListKind::Ordered,
                items: vec![
                    ListItem { content: vec![Inline::text("a")] },
                    ListItem { content: vec![Inline::text("b")] },
                    ListItem { content: vec![Inline::text("c")] },
                ],
                start: Some(3),
            }]
        );
    }

    #[test]
    fn test_pre_keeps_text_and_language() {
        assert_eq!(
            reduce_html("<pre><code class=\"hl language-rust\">\nfn main() {\n    **x** &lt; 1\n}\n</code></pre>"),
            vec![Block::CodeBlock {
                language: Some("rust".to_string()),
                content: "fn main() {\n    **x** < 1\n}".to_string(),
            }]
        );
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            reduce_html("<p><a href=\"/p\" title=\"T\" class=\"x\">see <em>it</em></a> <img src=\"a.png\" alt=\"A\"><a>plain</a></p>"),
            vec![para(vec![
                Inline::Link {
                    url: "/p".to_string(),
                    title: Some("T".to_string()),
                    content: vec![
                        Inline::text("see "),
                        Inline::Emphasis { content: vec![Inline::text("it")] },
                    ],
                },
                Inline::text(" "),
                Inline::Image { url: "a.png".to_string(), alt: "A".to_string(), title: None },
                Inline::text("plain"),
            ])]
        );
    }

    #[test]
    fn test_table_header_sources() {
        let cell = |s: &str| TableCell { content: vec![Inline::text(s)] };
        let expected = Block::Table {
            header: TableRow { cells: vec![cell("a"), cell("b")] },
            body: vec![TableRow { cells: vec![cell("1"), cell("2")] }],
        };
        assert_eq!(
            reduce_html("<table><thead><tr><th>a</th><th>b</th></tr></thead><tbody><tr><td>1</td><td>2</td></tr></tbody></table>"),
            vec![expected.clone()]
        );
        assert_eq!(
            reduce_html("<table><tr><th>a<th>b<tr><td>1<td>2</table>"),
            vec![expected.clone()]
        );
        assert_eq!(
            reduce_html("<table><tr><td>a</td><td>b</td></tr><tr><td>1</td><td>2</td></tr></table>"),
            vec![expected]
        );
    }

    #[test]
    fn test_blockquote_recurses() {
        assert_eq!(
            reduce_html("<blockquote><p>q</p></blockquote>"),
            vec![Block::BlockQuote { content: vec![para(vec![Inline::text("q")])] }]
        );
    }

    #[test]
    fn test_empty_markup_yields_nothing() {
        assert_eq!(reduce_html("<div> </div><p>\n</p><b></b>"), vec![]);
    }

    #[test]
    fn test_nesting_past_budget_keeps_text() {
        let dom = parse_dom("<div><em>a <b>b <i>c</i></b></em></div>");
        assert_eq!(
            reduce(&body(&dom), 2),
            vec![para(vec![Inline::Emphasis {
                content: vec![Inline::text("a b c")],
            }])]
        );
    }

    #[test]
    fn test_very_deep_markup_does_not_overflow() {
        let html = format!("{}x", "<b>".repeat(100_000));
        let blocks = reduce_html(&html);
        assert_eq!(blocks.len(), 1);

        let html = format!("{}q", "<blockquote>".repeat(10_000));
        let mut depth = 0;
        let blocks = reduce_html(&html);
        let mut level = &blocks;
        while let [Block::BlockQuote { content }] = level.as_slice() {
            depth += 1;
            level = content;
        }
        assert!(depth <= 64);
        assert!(matches!(level.as_slice(), [Block::Paragraph { .. }]));
    }
}
