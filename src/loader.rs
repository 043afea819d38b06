//! Incremental ("infinite scroll") rendering of a view. The loader keeps a
//! cursor into the current view and appends one batch of cards each time the
//! reader scrolls close enough to the bottom of the document.

use tracing::debug;

use crate::post::Post;
use crate::render::{Node, Region, Renderer, LOAD_MORE_COUNT, SCROLL_PROXIMITY};

/// Loader states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    LoadingBatch,

    /// Every post of the view has been rendered.
    Exhausted,
}

/// What a call to [`IncrementalLoader::load_more`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing happened: a batch is in flight, or the view was already
    /// exhausted and its marker shown.
    Skipped,

    /// A batch of this many cards was appended.
    Batch(usize),

    /// The view just ran out; the "no more" marker was appended.
    Exhausted,
}

/// Scroll position of the viewport within the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub scroll_top: u32,
    pub viewport_height: u32,
    pub document_height: u32,
}

impl ScrollMetrics {
    /// Distance between the bottom of the viewport and the bottom of the
    /// document.
    pub fn distance_to_bottom(&self) -> u32 {
        self.document_height
            .saturating_sub(self.scroll_top.saturating_add(self.viewport_height))
    }
}

#[derive(Clone, Debug)]
pub struct IncrementalLoader {
    batch_size: usize,
    proximity: u32,
    loaded: usize,
    state: LoaderState,

    /// Set once the "no more" marker has been rendered for the current view.
    marker_shown: bool,
}

impl Default for IncrementalLoader {
    fn default() -> Self {
        IncrementalLoader::new(LOAD_MORE_COUNT, SCROLL_PROXIMITY)
    }
}

impl IncrementalLoader {
    pub fn new(batch_size: usize, proximity: u32) -> IncrementalLoader {
        IncrementalLoader {
            batch_size: batch_size.max(1),
            proximity,
            loaded: 0,
            state: LoaderState::Idle,
            marker_shown: false,
        }
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// Number of posts of the current view rendered so far.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Starts over on a new view: clears the region (and with it any "no
    /// more" marker), rewinds the cursor and loads the first batch. An empty
    /// view shows the "no results" placeholder and is exhausted immediately.
    pub fn reset(&mut self, region: &mut Region, renderer: &Renderer, view: &[&Post]) -> LoadOutcome {
        region.clear();
        self.loaded = 0;
        self.state = LoaderState::Idle;
        self.marker_shown = false;
        if view.is_empty() {
            region.push(Node::NoResults);
            self.state = LoaderState::Exhausted;
            self.marker_shown = true;
            return LoadOutcome::Skipped;
        }
        self.load_more(region, renderer, view)
    }

    /// Appends the next batch of `view`. A no-op while a batch is loading.
    /// Once the view runs out, the "no more" marker is rendered exactly once
    /// and later calls do nothing.
    pub fn load_more(&mut self, region: &mut Region, renderer: &Renderer, view: &[&Post]) -> LoadOutcome {
        if self.state == LoaderState::LoadingBatch {
            return LoadOutcome::Skipped;
        }
        if self.loaded >= view.len() {
            self.state = LoaderState::Exhausted;
            if self.marker_shown {
                return LoadOutcome::Skipped;
            }
            region.push(Node::NoMore);
            self.marker_shown = true;
            debug!(loaded = self.loaded, "view exhausted");
            return LoadOutcome::Exhausted;
        }

        self.state = LoaderState::LoadingBatch;
        let end = (self.loaded + self.batch_size).min(view.len());
        let batch = &view[self.loaded..end];
        renderer.append(region, batch);
        self.loaded += batch.len();
        self.state = LoaderState::Idle;
        debug!(batch = batch.len(), loaded = self.loaded, total = view.len(), "loaded batch");
        LoadOutcome::Batch(batch.len())
    }

    /// Scroll observer: loads more when the viewport is within `proximity`
    /// of the bottom of the document. Safe to call on every scroll event.
    pub fn on_scroll(
        &mut self,
        metrics: ScrollMetrics,
        region: &mut Region,
        renderer: &Renderer,
        view: &[&Post],
    ) -> LoadOutcome {
        match metrics.distance_to_bottom() < self.proximity {
            true => self.load_more(region, renderer, view),
            false => LoadOutcome::Skipped,
        }
    }
}
