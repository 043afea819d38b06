//! Fixed, numbered pagination: the page controls shown under the main
//! content when a view is split into pages of a fixed size.

/// Maximum number of page buttons shown at once.
pub const PAGE_WINDOW: usize = 5;

/// Number of pages needed for `len` items, `size` per page.
pub fn page_count(len: usize, size: usize) -> usize {
    let size = size.max(1);
    (len + size - 1) / size
}

/// The item range shown on 1-based page `page`.
pub fn page_range(len: usize, size: usize, page: usize) -> std::ops::Range<usize> {
    let size = size.max(1);
    let start = page.saturating_sub(1).saturating_mul(size).min(len);
    start..(start + size).min(len)
}

/// One numbered button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageButton {
    pub number: usize,
    pub active: bool,
}

/// The state of the pagination controls for one page of a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageControls {
    pub current: usize,
    pub page_count: usize,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub buttons: Vec<PageButton>,
}

impl PageControls {
    /// Builds the controls for 1-based page `current` out of `page_count`.
    /// The button window is centred on the current page where possible and
    /// holds at most [`PAGE_WINDOW`] pages.
    pub fn new(current: usize, page_count: usize) -> PageControls {
        let span = PAGE_WINDOW - 1;
        let mut start = current.saturating_sub(2).max(1);
        let end = page_count.min(start + span);
        if end < start + span {
            start = end.saturating_sub(span).max(1);
        }
        PageControls {
            current,
            page_count,
            prev_enabled: current > 1,
            next_enabled: current < page_count,
            buttons: (start..=end)
                .map(|number| PageButton {
                    number,
                    active: number == current,
                })
                .collect(),
        }
    }

    /// Serializes the controls. `href` maps a page number to its link; it is
    /// `None` for interactive sessions, where buttons carry `data-page` only.
    pub fn to_html(&self, href: Option<&dyn Fn(usize) -> String>) -> String {
        let button = |label: &str, page: usize, class: &str, disabled: bool| -> String {
            let class_attr = match class.is_empty() {
                true => String::new(),
                false => format!(r#" class="{}""#, class),
            };
            match (href, disabled) {
                (Some(href), false) => format!(
                    r#"<a{} href="{}" data-page="{}">{}</a>"#,
                    class_attr,
                    href(page),
                    page,
                    label
                ),
                (_, true) => format!(r#"<button{} disabled>{}</button>"#, class_attr, label),
                (None, false) => format!(
                    r#"<button{} data-page="{}">{}</button>"#,
                    class_attr, page, label
                ),
            }
        };

        let mut s = String::from(r#"<div class="pagination">"#);
        s.push_str(&button("Prev", self.current.saturating_sub(1), "prev", !self.prev_enabled));
        for b in &self.buttons {
            let class = match b.active {
                true => "active",
                false => "",
            };
            s.push_str(&button(&b.number.to_string(), b.number, class, false));
        }
        s.push_str(&button("Next", self.current + 1, "next", !self.next_enabled));
        s.push_str("</div>");
        s
    }
}
