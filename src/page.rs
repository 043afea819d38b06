//! The page a session renders into: the sidebar (nav fragment), the tag
//! statistics, the main content region and the optional pagination controls.

use pulldown_cmark::escape::escape_html;

use crate::pager::PageControls;
use crate::render::Region;
use crate::tag::{format_total, TagCounts};

/// One entry of the tag statistics list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagEntry {
    pub tag: String,
    pub count: usize,
    pub active: bool,
}

/// The tag statistics region: tags by descending count and the price total.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagStats {
    pub entries: Vec<TagEntry>,
    pub total_price: f64,
}

/// Links used when serializing the statistics for a static site. Without
/// them, entries link to `#` and are identified by their data attributes.
pub struct StatsLinks<'a> {
    pub tag: &'a dyn Fn(&str) -> String,
    pub price: String,
}

impl TagStats {
    pub fn new(counts: &TagCounts, total_price: f64) -> TagStats {
        TagStats {
            entries: counts
                .sorted()
                .into_iter()
                .map(|(tag, count)| TagEntry {
                    tag: tag.to_owned(),
                    count,
                    active: false,
                })
                .collect(),
            total_price,
        }
    }

    /// Marks the entry for `tag` active and every other entry inactive.
    pub fn set_active(&mut self, tag: Option<&str>) {
        for entry in &mut self.entries {
            entry.active = Some(entry.tag.as_str()) == tag;
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.active)
            .map(|e| e.tag.as_str())
    }

    pub fn to_html(&self, links: Option<&StatsLinks>) -> String {
        let mut s = String::from("<h4>Tags</h4><ul>");
        for entry in &self.entries {
            let href = match links {
                Some(links) => (links.tag)(&entry.tag),
                None => String::from("#"),
            };
            s.push_str("<li><a");
            if entry.active {
                s.push_str(r#" class="active""#);
            }
            s.push_str(r#" href=""#);
            push_escaped(&mut s, &href);
            s.push_str(r#"" data-tag=""#);
            push_escaped(&mut s, &entry.tag);
            s.push_str(r#""><span># "#);
            push_escaped(&mut s, &entry.tag);
            s.push_str(&format!(
                r#"</span><span class="tag-count">{}</span></a></li>"#,
                entry.count
            ));
        }
        s.push_str("</ul>");
        let price_href = match links {
            Some(links) => links.price.as_str(),
            None => "#",
        };
        s.push_str(r#"<a class="total-price" href=""#);
        push_escaped(&mut s, price_href);
        s.push_str(&format!(
            r#"">Total: ¥{}</a>"#,
            format_total(self.total_price)
        ));
        s
    }
}

/// Every region a session writes to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    /// The nav fragment with the active link marked.
    pub sidebar: String,
    pub tag_stats: TagStats,
    pub main: Region,
    pub pagination: Option<PageControls>,
}

fn push_escaped(s: &mut String, text: &str) {
    let _ = escape_html(s, text);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::Post;
    use crate::tag::count_tags;

    fn stats() -> TagStats {
        let posts: Vec<Post> = serde_json::from_str(
            r#"[{"tags": ["a"]}, {"tags": ["a", "b <i>"]}]"#,
        )
        .unwrap();
        TagStats::new(&count_tags(&posts), 10.0)
    }

    #[test]
    fn test_entries_sorted_by_count() {
        let stats = stats();
        let tags: Vec<(&str, usize)> = stats
            .entries
            .iter()
            .map(|e| (e.tag.as_str(), e.count))
            .collect();
        assert_eq!(vec![("a", 2), ("b <i>", 1)], tags);
    }

    #[test]
    fn test_single_active_entry() {
        let mut stats = stats();
        stats.set_active(Some("a"));
        assert_eq!(Some("a"), stats.active());
        stats.set_active(Some("b <i>"));
        assert_eq!(Some("b <i>"), stats.active());
        assert_eq!(1, stats.entries.iter().filter(|e| e.active).count());
        stats.set_active(None);
        assert_eq!(None, stats.active());
    }

    #[test]
    fn test_empty_total_renders_zero() {
        let html = TagStats::new(&TagCounts::default(), crate::tag::sum_prices(&Vec::<Post>::new()))
            .to_html(None);
        assert!(html.ends_with(r##"<a class="total-price" href="#">Total: ¥0.00</a>"##));
    }

    #[test]
    fn test_html() {
        let mut stats = stats();
        stats.set_active(Some("a"));
        let html = stats.to_html(None);
        assert!(html.contains(
            r##"<li><a class="active" href="#" data-tag="a"><span># a</span><span class="tag-count">2</span></a></li>"##
        ));
        assert!(html.contains(r#"data-tag="b &lt;i&gt;""#));
        assert!(html.ends_with(r##"<a class="total-price" href="#">Total: ¥10.00</a>"##));

        let tag_href = |tag: &str| format!("tags/{}/index.html", slug::slugify(tag));
        let links = StatsLinks {
            tag: &tag_href,
            price: String::from("priced/index.html"),
        };
        let html = stats.to_html(Some(&links));
        assert!(html.contains(r#"href="tags/a/index.html""#));
        assert!(html.contains(r#"href="priced/index.html""#));
    }
}
