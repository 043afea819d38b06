//! Handling of the navigation fragment injected into the sidebar. Nav links
//! are the anchors carrying a `data-page` attribute; the selected one gets
//! the `active` class.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::errors::RewritingError;
use lol_html::{element, rewrite_str, RewriteStrSettings};

/// Page id of the nav entry that shows the unfiltered feed.
pub const HOME_PAGE: &str = "home.html";

const NAV_LINKS: &str = "a[data-page]";
const ACTIVE_CLASS: &str = "active";

/// Lists the page ids of the nav links in document order.
pub fn nav_pages(fragment: &str) -> Result<Vec<String>, Error> {
    let pages = Rc::new(RefCell::new(Vec::new()));
    rewrite_str(
        fragment,
        RewriteStrSettings {
            element_content_handlers: vec![element!(NAV_LINKS, {
                let pages = Rc::clone(&pages);
                move |el| {
                    if let Some(page) = el.get_attribute("data-page") {
                        pages.borrow_mut().push(page);
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )?;
    let pages = pages.borrow().clone();
    Ok(pages)
}

/// Returns the fragment with the `active` class set on the link for `page`
/// and removed from every other nav link. `None` leaves every link inactive.
pub fn mark_active(fragment: &str, page: Option<&str>) -> Result<String, Error> {
    let html = rewrite_str(
        fragment,
        RewriteStrSettings {
            element_content_handlers: vec![element!(NAV_LINKS, move |el| {
                let selected = el.get_attribute("data-page").as_deref() == page;
                let class = el.get_attribute("class").unwrap_or_default();
                let mut classes: Vec<&str> = class
                    .split_whitespace()
                    .filter(|c| *c != ACTIVE_CLASS)
                    .collect();
                if selected {
                    classes.push(ACTIVE_CLASS);
                }
                match classes.is_empty() {
                    true => el.remove_attribute("class"),
                    false => el.set_attribute("class", &classes.join(" "))?,
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )?;
    Ok(html)
}

/// Represents an error processing the nav fragment.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("rewriting nav fragment: {0}")]
    Rewrite(#[from] RewritingError),
}
