//! The view renderer. Turns posts into [`Card`]s and places them into a
//! [`Region`], the stand-in for one area of the page (the main content
//! area, in practice).
//!
//! Cards whose body may need collapsing can't be judged when they are
//! created: the height of the body is only known once the card has been
//! attached and laid out. Attaching a card therefore queues it, and
//! [`Region::settle`] performs the queued measurements afterwards against a
//! [`Layout`].

use pulldown_cmark::escape::{escape_href, escape_html};
use serde::Deserialize;

use crate::layout::Layout;
use crate::markdown;
use crate::post::Post;

/// Bodies taller than this are collapsed by default.
pub const COLLAPSE_THRESHOLD: u32 = 120;

/// Number of cards added per incremental load.
pub const LOAD_MORE_COUNT: usize = 5;

/// Distance from the bottom of the document under which scrolling triggers an
/// incremental load.
pub const SCROLL_PROXIMITY: u32 = 200;

/// Number of cards per page when fixed pagination is used.
pub const ITEMS_PER_PAGE: usize = 5;

pub const NO_RESULTS_TEXT: &str = "No matching content.";
pub const NO_MORE_TEXT: &str = "No more content.";

/// How a view is split up when it is rendered.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Batching {
    /// Every post of the view is rendered at once.
    None,

    /// The view is split into numbered pages of `size` posts.
    FixedPage {
        #[serde(default = "default_page_size")]
        size: usize,
    },

    /// Posts are appended `batch_size` at a time as the reader scrolls within
    /// `proximity` of the bottom of the document.
    InfiniteScroll {
        #[serde(default = "default_batch_size")]
        batch_size: usize,
        #[serde(default = "default_proximity")]
        proximity: u32,
    },
}

impl Default for Batching {
    fn default() -> Self {
        Batching::None
    }
}

fn default_page_size() -> usize {
    ITEMS_PER_PAGE
}

fn default_batch_size() -> usize {
    LOAD_MORE_COUNT
}

fn default_proximity() -> u32 {
    SCROLL_PROXIMITY
}

/// Options recognized by the [`Renderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Render post content as Markdown rather than plain text.
    pub markdown: bool,

    /// Collapse bodies taller than this; `None` disables collapsing.
    pub collapse_threshold: Option<u32>,

    pub batching: Batching,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            markdown: false,
            collapse_threshold: Some(COLLAPSE_THRESHOLD),
            batching: Batching::None,
        }
    }
}

/// Collapse state of a card body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collapse {
    /// Attached but not measured yet.
    Unmeasured,

    /// Short enough to show in full; no toggle.
    Fits,

    Collapsed,
    Expanded,
}

impl Collapse {
    /// The indicator shown on the toggle control, if the card has one.
    pub fn glyph(self) -> Option<char> {
        match self {
            Collapse::Collapsed => Some('▼'),
            Collapse::Expanded => Some('▲'),
            Collapse::Unmeasured | Collapse::Fits => None,
        }
    }
}

/// The visual structure derived from one [`Post`].
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub title: String,
    pub date: String,
    pub image: String,

    /// The body as HTML, either escaped plain text or rendered Markdown.
    pub body: String,

    /// Whether `body` came from Markdown.
    pub markdown: bool,

    /// One chip per tag, raw tag text.
    pub tags: Vec<String>,

    /// Present only when the post's price is present and non-zero.
    pub price: Option<String>,

    pub collapse: Collapse,
}

impl Card {
    /// Serializes the card to HTML. `index` is the card's position within its
    /// region, carried by the toggle control.
    pub fn to_html(&self, index: usize) -> String {
        let mut s = String::from(r#"<div class="news-item">"#);
        s.push_str(r#"<div class="news-left"><img src=""#);
        push_href(&mut s, &self.image);
        s.push_str(r#"" alt=""#);
        push_escaped(&mut s, &self.title);
        s.push_str(r#"" loading="lazy" /></div><div class="news-right"><h3 class="news-title">"#);
        push_escaped(&mut s, &self.title);
        s.push_str(r#"</h3><p class="news-time">"#);
        push_escaped(&mut s, &self.date);
        s.push_str("</p>");

        let collapsed = match self.collapse {
            Collapse::Collapsed => " collapsed",
            _ => "",
        };
        match self.markdown {
            true => s.push_str(&format!(r#"<div class="content{}">{}</div>"#, collapsed, self.body)),
            false => s.push_str(&format!(r#"<p class="content{}">{}</p>"#, collapsed, self.body)),
        }
        if let Some(glyph) = self.collapse.glyph() {
            s.push_str(&format!(
                r#"<button class="toggle-content" data-card="{}">{}</button>"#,
                index, glyph
            ));
        }

        s.push_str(r#"<div class="tags-price-line"><div class="tags">"#);
        for tag in &self.tags {
            s.push_str(r#"<span class="tag tag-"#);
            push_escaped(&mut s, &tag.replace(' ', "-"));
            s.push_str(r#"" data-tag=""#);
            push_escaped(&mut s, tag);
            s.push_str(r#"">"#);
            push_escaped(&mut s, tag);
            s.push_str("</span>");
        }
        s.push_str("</div>");
        if let Some(price) = &self.price {
            s.push_str(r#"<div class="price">¥"#);
            push_escaped(&mut s, price);
            s.push_str("</div>");
        }
        s.push_str("</div></div></div>");
        s
    }
}

/// One child of a [`Region`].
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Card(Card),

    /// Shown instead of cards when a view is empty.
    NoResults,

    /// Terminal marker appended once an incremental view is exhausted.
    NoMore,

    /// Free text replacing the region's content, e.g. an error.
    Message(String),
}

impl Node {
    pub fn to_html(&self, index: usize) -> String {
        let mut s = String::new();
        match self {
            Node::Card(card) => return card.to_html(index),
            Node::NoResults => {
                s.push_str(r#"<p class="no-results">"#);
                s.push_str(NO_RESULTS_TEXT);
            }
            Node::NoMore => {
                s.push_str(r#"<p class="no-more">"#);
                s.push_str(NO_MORE_TEXT);
            }
            Node::Message(message) => {
                s.push_str("<p>");
                push_escaped(&mut s, message);
            }
        }
        s.push_str("</p>");
        s
    }
}

/// An area of the page holding rendered nodes, plus the queue of cards
/// waiting to be measured.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    nodes: Vec<Node>,

    /// `(node index, threshold)` for attached cards not measured yet.
    pending: Vec<(usize, u32)>,
}

impl Region {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Discards every node and any pending measurement.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.pending.clear();
    }

    /// Replaces the region's content with a single text message.
    pub fn show_message(&mut self, message: impl Into<String>) {
        self.clear();
        self.nodes.push(Node::Message(message.into()));
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Appends a card. With a threshold, the card's measurement is queued
    /// until the next [`Region::settle`].
    pub fn attach(&mut self, card: Card, threshold: Option<u32>) {
        if let (Some(threshold), Collapse::Unmeasured) = (threshold, card.collapse) {
            self.pending.push((self.nodes.len(), threshold));
        }
        self.nodes.push(Node::Card(card));
    }

    /// Whether measurements are waiting for [`Region::settle`].
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Runs the deferred measurements: each queued card whose body is taller
    /// than its threshold is collapsed, the rest are marked as fitting.
    pub fn settle(&mut self, layout: &dyn Layout) {
        for (index, threshold) in self.pending.drain(..) {
            if let Some(Node::Card(card)) = self.nodes.get_mut(index) {
                card.collapse = match layout.body_height(card) > threshold {
                    true => Collapse::Collapsed,
                    false => Collapse::Fits,
                };
            }
        }
    }

    /// Flips the collapse state of the card at `index`. Returns the new state,
    /// or `None` when there is no collapsible card there.
    pub fn toggle(&mut self, index: usize) -> Option<Collapse> {
        match self.nodes.get_mut(index) {
            Some(Node::Card(card)) => {
                card.collapse = match card.collapse {
                    Collapse::Collapsed => Collapse::Expanded,
                    Collapse::Expanded => Collapse::Collapsed,
                    _ => return None,
                };
                Some(card.collapse)
            }
            _ => None,
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Card(card) => Some(card),
            _ => None,
        })
    }

    pub fn to_html(&self) -> String {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| node.to_html(i))
            .collect()
    }
}

/// Renders posts into cards according to a set of [`RenderOptions`].
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Renderer {
        Renderer { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Builds the card for one post.
    pub fn card(&self, post: &Post) -> Card {
        let mut body = String::new();
        match self.options.markdown {
            true => markdown::to_html(&mut body, &post.content),
            false => push_escaped(&mut body, &post.content),
        }

        Card {
            title: post.title.clone(),
            date: post.date.clone(),
            image: post.image.clone(),
            body,
            markdown: self.options.markdown,
            tags: post.tags.clone(),
            price: match post.has_price() {
                true => post.price.as_ref().map(|p| p.to_string()),
                false => None,
            },
            collapse: match self.options.collapse_threshold {
                Some(_) => Collapse::Unmeasured,
                None => Collapse::Fits,
            },
        }
    }

    /// Replaces the region's content with one card per post, in order. An
    /// empty list renders a single [`Node::NoResults`].
    pub fn render(&self, region: &mut Region, posts: &[&Post]) {
        region.clear();
        if posts.is_empty() {
            region.push(Node::NoResults);
            return;
        }
        self.append(region, posts);
    }

    /// Appends one card per post without touching existing nodes.
    pub fn append(&self, region: &mut Region, posts: &[&Post]) {
        for post in posts {
            region.attach(self.card(post), self.options.collapse_threshold);
        }
    }
}

fn push_escaped(s: &mut String, text: &str) {
    // Writing into a `String` can't fail.
    let _ = escape_html(s, text);
}

fn push_href(s: &mut String, href: &str) {
    let _ = escape_href(s, href);
}
