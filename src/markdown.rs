//! Converts post content from Markdown to HTML. Links are rewritten so they
//! open in a new browsing context without leaking the opener or the referrer.

use pulldown_cmark::escape::{escape_href, escape_html};
use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag};

/// Converts `markdown` to HTML, appending the result to `out`.
pub fn to_html(out: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    html::push_html(out, Parser::new_ext(markdown, options).map(convert));
}

/// Replaces link start/end events with raw HTML anchors that carry
/// `target="_blank"` and `rel="noopener noreferrer"`. Everything else passes
/// through untouched.
fn convert(ev: Event) -> Event {
    match ev {
        Event::Start(Tag::Link(link_type, dest, title)) => {
            Event::Html(CowStr::Boxed(anchor(link_type, &dest, &title).into_boxed_str()))
        }
        Event::End(Tag::Link(..)) => Event::Html(CowStr::Borrowed("</a>")),
        _ => ev,
    }
}

fn anchor(link_type: LinkType, dest: &str, title: &str) -> String {
    let mut s = String::from(r#"<a href=""#);
    if let LinkType::Email = link_type {
        s.push_str("mailto:");
    }
    // Writing into a `String` can't fail.
    let _ = escape_href(&mut s, dest);
    s.push('"');
    if !title.is_empty() {
        s.push_str(r#" title=""#);
        let _ = escape_html(&mut s, title);
        s.push('"');
    }
    s.push_str(r#" target="_blank" rel="noopener noreferrer">"#);
    s
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(markdown: &str) -> String {
        let mut out = String::new();
        to_html(&mut out, markdown);
        out
    }

    #[test]
    fn test_links_open_in_new_context() {
        assert_eq!(
            "<p>see <a href=\"https://example.org/a?b=1&amp;c=2\" target=\"_blank\" \
             rel=\"noopener noreferrer\">here</a></p>\n",
            render("see [here](https://example.org/a?b=1&c=2)"),
        );
    }

    #[test]
    fn test_link_title_and_autolink() {
        let html = render(r#"[x](/y "Why") <https://example.org>"#);
        assert!(html.contains(
            r#"<a href="/y" title="Why" target="_blank" rel="noopener noreferrer">x</a>"#
        ));
        assert!(html.contains(
            r#"<a href="https://example.org" target="_blank" rel="noopener noreferrer">https://example.org</a>"#
        ));
    }

    #[test]
    fn test_email_autolink() {
        let html = render("<me@example.org>");
        assert!(html.contains(r#"href="mailto:me@example.org""#));
    }

    #[test]
    fn test_plain_markdown_untouched() {
        assert_eq!("<h1>Title</h1>\n<p><em>hi</em></p>\n", render("# Title\n\n*hi*"));
    }
}
