//! The library code for `tagfeed`, a small personal feed site. Posts come
//! from a static JSON document and are shown as cards with tag filtering, a
//! tag-frequency sidebar, a price total, optional Markdown bodies, collapsing
//! of long bodies and either fixed pagination or infinite scroll.
//!
//! The page is modeled as a handful of regions ([`crate::page`]) owned by a
//! [`crate::session::Session`], which reacts to discrete events:
//!
//! 1. Fetching the nav fragment and the posts ([`crate::source`]) and
//!    deriving the tag statistics ([`crate::tag`])
//! 2. Filtering on tag, price and nav clicks
//! 3. Rendering the current view into cards ([`crate::render`]), either all at
//!    once, a page at a time ([`crate::pager`]) or in batches as the reader
//!    scrolls ([`crate::loader`])
//!
//! A session can be driven interactively or replayed over every view to
//! build a static snapshot of the site ([`crate::build`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod layout;
pub mod loader;
pub mod markdown;
pub mod nav;
pub mod page;
pub mod pager;
pub mod post;
pub mod render;
pub mod session;
pub mod source;
pub mod tag;
mod util;
pub mod write;
