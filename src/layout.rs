//! Height measurement for card bodies. There is no browser here to lay the
//! page out, so [`EstimatedLayout`] approximates the rendered height from the
//! body's HTML: block-level elements start new lines and long lines wrap at a
//! fixed number of characters.

use crate::render::Card;

/// Measures the rendered height of a card body once it has been attached.
pub trait Layout {
    fn body_height(&self, card: &Card) -> u32;
}

/// Line-based height estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EstimatedLayout {
    pub line_height: u32,
    pub chars_per_line: usize,
}

impl Default for EstimatedLayout {
    fn default() -> Self {
        EstimatedLayout {
            line_height: 24,
            chars_per_line: 40,
        }
    }
}

impl Layout for EstimatedLayout {
    fn body_height(&self, card: &Card) -> u32 {
        let per_line = self.chars_per_line.max(1);
        let rows: usize = text_lines(&card.body)
            .iter()
            .map(|line| line.trim().chars().count())
            .filter(|&n| n > 0)
            .map(|n| (n + per_line - 1) / per_line)
            .sum();
        (rows as u32).saturating_mul(self.line_height)
    }
}

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote", "tr",
    "table",
];

/// Splits HTML into the lines of text it would display. Markup is dropped,
/// source newlines collapse to spaces.
fn text_lines(html: &str) -> Vec<String> {
    let mut lines = vec![String::new()];
    let mut chars = html.chars();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let tag: String = chars.by_ref().take_while(|&c| c != '>').collect();
                if breaks_line(&tag) {
                    lines.push(String::new());
                }
            }
            '\n' => push_char(&mut lines, ' '),
            c => push_char(&mut lines, c),
        }
    }
    lines
}

fn push_char(lines: &mut Vec<String>, c: char) {
    if let Some(line) = lines.last_mut() {
        line.push(c);
    }
}

fn breaks_line(tag: &str) -> bool {
    let closing = tag.starts_with('/');
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    match name.as_str() {
        "br" | "hr" => true,
        name => closing && BLOCK_ELEMENTS.contains(&name),
    }
}
