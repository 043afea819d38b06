//! The navigation/filter controller. A [`Session`] owns every piece of
//! derived state (the sorted posts, the tag statistics, the current view and
//! the cursors over it) and reacts to discrete events: clicking a tag, the
//! price total or a nav link, scrolling, paging and toggling a collapsed
//! card. All state lives in the session; nothing survives it.

use tracing::{error, info, warn};

use crate::config::Config;
use crate::layout::{EstimatedLayout, Layout};
use crate::loader::{IncrementalLoader, LoadOutcome, ScrollMetrics};
use crate::nav;
use crate::page::{Page, TagStats};
use crate::pager::{page_count, page_range, PageControls};
use crate::post::Post;
use crate::render::{Batching, Collapse, RenderOptions, Renderer};
use crate::source::{load_inputs, Inputs, Source};
use crate::tag::{count_tags, sum_prices, TagCounts};

/// Prefix of the message shown when the session can't be initialized.
pub const INIT_FAILED: &str = "Initialization failed: ";

/// What the session needs to know to start.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Name of the nav fragment resource.
    pub nav: String,

    /// Name of the JSON data resource.
    pub data: String,

    /// Page id of the nav link showing the unfiltered feed.
    pub home_page: String,

    pub render: RenderOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            nav: String::from("nav.html"),
            data: String::from("data.json"),
            home_page: String::from(nav::HOME_PAGE),
            render: RenderOptions::default(),
        }
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Settings {
        Settings {
            nav: config.nav.clone(),
            data: config.data.clone(),
            home_page: config.home_page.clone(),
            render: config.render,
        }
    }
}

/// Which subset of the posts is being shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    All,

    /// Posts carrying the tag.
    Tag(String),

    /// Posts with a non-zero price.
    Priced,

    /// A nav page other than home. These aren't loaded; the main region only
    /// shows a loading notice.
    Page(String),
}

impl View {
    /// Indices into `posts` of the posts in this view, in order.
    pub fn select(&self, posts: &[Post]) -> Vec<usize> {
        let keep = |post: &Post| match self {
            View::All => true,
            View::Tag(tag) => post.has_tag(tag),
            View::Priced => post.has_price(),
            View::Page(_) => false,
        };
        posts
            .iter()
            .enumerate()
            .filter(|(_, post)| keep(post))
            .map(|(i, _)| i)
            .collect()
    }
}

/// The highlighted link. At most one link, nav or tag, is active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Nav(String),
    Tag(String),
}

pub struct Session {
    settings: Settings,
    posts: Vec<Post>,
    tag_counts: TagCounts,
    total_price: f64,
    nav: String,

    /// Page ids of the nav links, in document order.
    nav_pages: Vec<String>,

    renderer: Renderer,
    layout: Box<dyn Layout>,
    view: View,

    /// Indices into `posts` of the current view.
    current: Vec<usize>,

    loader: IncrementalLoader,

    /// 1-based page of the current view, for fixed pagination.
    page_number: usize,

    selection: Option<Selection>,
    page: Page,
    failed: bool,
}

impl Session {
    /// Fetches the nav fragment and the posts (in parallel) and renders the
    /// initial page: home link active, every post shown. A failure to fetch
    /// or parse either resource is terminal: the main region shows the error
    /// and nothing else is rendered.
    pub fn initialize(source: &dyn Source, settings: Settings) -> Session {
        match load_inputs(source, &settings.nav, &settings.data) {
            Ok(inputs) => Session::from_inputs(inputs, settings),
            Err(err) => {
                error!(error = %err, "initializing session");
                Session::failed(settings, &err)
            }
        }
    }

    /// Starts a session from already fetched resources. Posts must already be
    /// sorted.
    pub fn from_inputs(inputs: Inputs, settings: Settings) -> Session {
        let Inputs { nav, posts } = inputs;
        let tag_counts = count_tags(&posts);
        let total_price = sum_prices(&posts);
        info!(
            posts = posts.len(),
            tags = tag_counts.len(),
            total_price,
            "session initialized"
        );
        let mut session = Session::empty(settings, nav);
        session.page.tag_stats = TagStats::new(&tag_counts, total_price);
        session.posts = posts;
        session.tag_counts = tag_counts;
        session.total_price = total_price;
        match nav::nav_pages(&session.nav) {
            Ok(pages) => session.nav_pages = pages,
            Err(e) => warn!(error = %e, "reading nav links"),
        }

        let home = session.settings.home_page.clone();
        session.select(Some(Selection::Nav(home)));
        session.show(View::All);
        session
    }

    fn failed(settings: Settings, err: &dyn std::fmt::Display) -> Session {
        let mut session = Session::empty(settings, String::new());
        session.failed = true;
        session.view = View::Page(String::new());
        session
            .page
            .main
            .show_message(format!("{}{}", INIT_FAILED, err));
        session
    }

    fn empty(settings: Settings, nav: String) -> Session {
        let (batch_size, proximity) = match settings.render.batching {
            Batching::InfiniteScroll {
                batch_size,
                proximity,
            } => (batch_size, proximity),
            _ => (crate::render::LOAD_MORE_COUNT, crate::render::SCROLL_PROXIMITY),
        };
        Session {
            renderer: Renderer::new(settings.render),
            loader: IncrementalLoader::new(batch_size, proximity),
            settings,
            posts: Vec::new(),
            tag_counts: TagCounts::default(),
            total_price: 0.0,
            nav,
            nav_pages: Vec::new(),
            layout: Box::new(EstimatedLayout::default()),
            view: View::All,
            current: Vec::new(),
            page_number: 1,
            selection: None,
            page: Page::default(),
            failed: false,
        }
    }

    /// Replaces the layout used to measure card bodies.
    pub fn with_layout(mut self, layout: Box<dyn Layout>) -> Session {
        self.layout = layout;
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// All posts, most recent first.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn tag_counts(&self) -> &TagCounts {
        &self.tag_counts
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// The posts of the current view, in order.
    pub fn current_posts(&self) -> Vec<&Post> {
        self.current.iter().map(|&i| &self.posts[i]).collect()
    }

    /// Page ids of the nav links, in document order.
    pub fn nav_pages(&self) -> &[String] {
        &self.nav_pages
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// The loader driving an infinite-scroll view.
    pub fn loader(&self) -> &IncrementalLoader {
        &self.loader
    }

    /// Whether initialization failed. A failed session ignores every event.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Shows the posts carrying `tag` and makes its link the active one.
    pub fn click_tag(&mut self, tag: &str) {
        if self.failed {
            return;
        }
        info!(tag, "filtering by tag");
        self.select(Some(Selection::Tag(tag.to_owned())));
        self.show(View::Tag(tag.to_owned()));
    }

    /// Shows the posts with a non-zero price. Clears every active link.
    pub fn click_total_price(&mut self) {
        if self.failed {
            return;
        }
        info!("filtering by price");
        self.select(None);
        self.show(View::Priced);
    }

    /// Activates the nav link for `page`. The home page shows every post; any
    /// other page only gets a loading notice.
    pub fn click_nav(&mut self, page: &str) {
        if self.failed {
            return;
        }
        if !self.nav_pages.iter().any(|p| p == page) {
            warn!(page, "no nav link for page");
        }
        self.select(Some(Selection::Nav(page.to_owned())));
        if page == self.settings.home_page {
            self.show(View::All);
        } else {
            info!(page, "nav page requested");
            self.view = View::Page(page.to_owned());
            self.current.clear();
            self.page.pagination = None;
            self.page
                .main
                .show_message(format!("Loading {}...", page));
        }
    }

    /// Scroll observer. Loads the next batch of an infinite-scroll view when
    /// the viewport nears the bottom; a no-op otherwise.
    pub fn scroll(&mut self, metrics: ScrollMetrics) -> LoadOutcome {
        if !self.is_incremental() {
            return LoadOutcome::Skipped;
        }
        let view: Vec<&Post> = self.current.iter().map(|&i| &self.posts[i]).collect();
        self.loader
            .on_scroll(metrics, &mut self.page.main, &self.renderer, &view)
    }

    /// Loads the next batch of an infinite-scroll view regardless of the
    /// scroll position.
    pub fn load_more(&mut self) -> LoadOutcome {
        if !self.is_incremental() {
            return LoadOutcome::Skipped;
        }
        let view: Vec<&Post> = self.current.iter().map(|&i| &self.posts[i]).collect();
        self.loader
            .load_more(&mut self.page.main, &self.renderer, &view)
    }

    /// Shows 1-based page `number` of a paginated view. Out-of-range pages
    /// and non-paginated views are ignored. Returns whether the page changed.
    pub fn goto_page(&mut self, number: usize) -> bool {
        let size = match self.settings.render.batching {
            Batching::FixedPage { size } => size,
            _ => return false,
        };
        if self.failed || matches!(self.view, View::Page(_)) {
            return false;
        }
        if number < 1 || number > page_count(self.current.len(), size) {
            return false;
        }
        self.page_number = number;
        self.render_page(size);
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.goto_page(self.page_number + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        match self.page_number {
            0 | 1 => false,
            n => self.goto_page(n - 1),
        }
    }

    /// Expands or collapses the card at `index` of the main region.
    pub fn toggle(&mut self, index: usize) -> Option<Collapse> {
        self.page.main.toggle(index)
    }

    /// Runs the measurements deferred since cards were attached. Call after
    /// the event that rendered them has completed.
    pub fn settle(&mut self) {
        self.page.main.settle(&*self.layout);
    }

    fn is_incremental(&self) -> bool {
        !self.failed
            && !matches!(self.view, View::Page(_))
            && matches!(
                self.settings.render.batching,
                Batching::InfiniteScroll { .. }
            )
    }

    /// Recomputes the current view and renders it from scratch.
    fn show(&mut self, view: View) {
        self.current = view.select(&self.posts);
        self.view = view;
        self.page.pagination = None;
        match self.settings.render.batching {
            Batching::None => {
                let posts: Vec<&Post> = self.current.iter().map(|&i| &self.posts[i]).collect();
                self.renderer.render(&mut self.page.main, &posts);
            }
            Batching::FixedPage { size } => {
                self.page_number = 1;
                self.render_page(size);
            }
            Batching::InfiniteScroll { .. } => {
                let posts: Vec<&Post> = self.current.iter().map(|&i| &self.posts[i]).collect();
                self.loader
                    .reset(&mut self.page.main, &self.renderer, &posts);
            }
        }
    }

    fn render_page(&mut self, size: usize) {
        let range = page_range(self.current.len(), size, self.page_number);
        let posts: Vec<&Post> = self.current[range].iter().map(|&i| &self.posts[i]).collect();
        self.renderer.render(&mut self.page.main, &posts);
        self.page.pagination = Some(PageControls::new(
            self.page_number,
            page_count(self.current.len(), size),
        ));
    }

    /// Makes `selection` the only active link, clearing every other mark
    /// first.
    fn select(&mut self, selection: Option<Selection>) {
        let (nav_page, tag) = match &selection {
            Some(Selection::Nav(page)) => (Some(page.as_str()), None),
            Some(Selection::Tag(tag)) => (None, Some(tag.as_str())),
            None => (None, None),
        };
        self.page.tag_stats.set_active(tag);
        self.page.sidebar = match nav::mark_active(&self.nav, nav_page) {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "marking active nav link");
                self.nav.clone()
            }
        };
        self.selection = selection;
    }
}
