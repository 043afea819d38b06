//! Templating [`Page`]s into HTML files. Every filtered view of the feed is
//! written under a directory of its own (see [`view_directory`]) and its
//! pages are named after their page number (see [`page_file`]).

use crate::page::{Page, StatsLinks};
use crate::session::View;
use gtmpl::{Template, Value};
use pulldown_cmark::escape::escape_html;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// The page shell used when the project doesn't configure one.
pub const DEFAULT_TEMPLATE: &str = include_str!("../theme/page.html");

/// Parses the contents of a page-shell template.
pub fn parse_template(contents: &str) -> Result<Template> {
    let mut template = Template::default();
    template.parse(contents).map_err(Error::Template)?;
    Ok(template)
}

/// The directory, relative to the output root, holding the pages of `view`.
/// Nav pages other than home aren't written and have no directory.
pub fn view_directory(view: &View, slugs: &TagSlugs) -> Option<PathBuf> {
    match view {
        View::All => Some(PathBuf::new()),
        View::Tag(tag) => Some(Path::new("tags").join(slugs.get(tag))),
        View::Priced => Some(PathBuf::from("priced")),
        View::Page(_) => None,
    }
}

/// The file, relative to the output root, holding 1-based page `number` of
/// `view`. The first page is always `index.html`; further pages of the
/// unfiltered view go under `pages/` so they don't mix with the site root.
pub fn page_file(view: &View, number: usize, slugs: &TagSlugs) -> Option<PathBuf> {
    let dir = view_directory(view, slugs)?;
    Some(match (view, number) {
        (_, 0 | 1) => dir.join("index.html"),
        (View::All, n) => Path::new("pages").join(format!("{}.html", n)),
        (_, n) => dir.join(format!("{}.html", n)),
    })
}

/// The path segment naming a tag's directory. Tags whose slug is empty fall
/// back to `tag`.
pub fn tag_slug(tag: &str) -> String {
    match slug::slugify(tag) {
        s if s.is_empty() => String::from("tag"),
        s => s,
    }
}

/// Directory names for a set of tags, unique even when two tags slugify the
/// same way (`Rust` and `rust`): later tags get a `-2`, `-3`, ... suffix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSlugs(HashMap<String, String>);

impl TagSlugs {
    /// Assigns slugs in iteration order, so earlier tags keep the plain one.
    pub fn new<'a>(tags: impl IntoIterator<Item = &'a str>) -> TagSlugs {
        let mut slugs = HashMap::new();
        let mut used = HashSet::new();
        for tag in tags {
            if slugs.contains_key(tag) {
                continue;
            }
            let base = tag_slug(tag);
            let mut slug = base.clone();
            let mut n = 2;
            while !used.insert(slug.clone()) {
                slug = format!("{}-{}", base, n);
                n += 1;
            }
            slugs.insert(tag.to_owned(), slug);
        }
        TagSlugs(slugs)
    }

    /// The directory name for `tag`. Tags the set wasn't built from fall back
    /// to [`tag_slug`].
    pub fn get(&self, tag: &str) -> String {
        match self.0.get(tag) {
            Some(slug) => slug.clone(),
            None => tag_slug(tag),
        }
    }
}

/// The prefix leading from `file` back to the output root, e.g. `../../` for
/// `tags/a/index.html`.
pub fn root_prefix(file: &Path) -> String {
    let depth = file
        .parent()
        .map(|dir| {
            dir.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0);
    "../".repeat(depth)
}

/// Responsible for templating [`Page`]s and writing them to disk.
pub struct Writer<'a> {
    /// The page shell.
    pub template: &'a Template,

    /// The directory all output files are written under.
    pub output_directory: &'a Path,

    /// Directory names of the tag views.
    pub slugs: &'a TagSlugs,
}

impl Writer<'_> {
    /// Templates one page of `view` and writes it to the file named by
    /// [`page_file`]. Links in the tag statistics and the pagination controls
    /// are made relative to that file.
    pub fn write_page(&self, page: &Page, view: &View, number: usize, title: &str) -> Result<PathBuf> {
        let file = page_file(view, number, self.slugs).ok_or_else(|| Error::NotWritable(view.clone()))?;
        let root = root_prefix(&file);

        let tag_href = |tag: &str| format!("{}tags/{}/index.html", root, self.slugs.get(tag));
        let links = StatsLinks {
            tag: &tag_href,
            price: format!("{}priced/index.html", root),
        };
        let page_href = |n: usize| match page_file(view, n, self.slugs) {
            Some(path) => format!("{}{}", root, path.display()),
            None => String::from("#"),
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        let mut escaped_title = String::new();
        // Writing into a `String` can't fail.
        let _ = escape_html(&mut escaped_title, title);
        m.insert("title".to_owned(), Value::String(escaped_title));
        m.insert("root".to_owned(), Value::String(root.clone()));
        m.insert("sidebar".to_owned(), Value::String(page.sidebar.clone()));
        m.insert(
            "tag_stats".to_owned(),
            Value::String(page.tag_stats.to_html(Some(&links))),
        );
        m.insert("main".to_owned(), Value::String(page.main.to_html()));
        m.insert(
            "pagination".to_owned(),
            match &page.pagination {
                Some(controls) => Value::String(controls.to_html(Some(&page_href))),
                None => Value::Nil,
            },
        );

        let path = self.output_directory.join(&file);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|err| Error::Io {
                path: dir.to_owned(),
                err,
            })?;
        }
        let mut out = std::fs::File::create(&path).map_err(|err| Error::Io {
            path: path.clone(),
            err,
        })?;
        let context = gtmpl::Context::from(Value::Object(m)).map_err(Error::Template)?;
        self.template
            .execute(&mut out, &context)
            .map_err(Error::Template)?;
        debug!(path = %path.display(), "wrote page");
        Ok(file)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error parsing or executing the template.
    #[error("templating: {0}")]
    Template(String),

    /// The view has no output location.
    #[error("view {0:?} isn't written to disk")]
    NotWritable(View),

    /// An error writing the output files.
    #[error("writing `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::{Session, Settings};
    use crate::source::test::{MapSource, DATA, NAV};

    #[test]
    fn test_paths() {
        let slugs = TagSlugs::default();
        assert_eq!(Some(PathBuf::from("index.html")), page_file(&View::All, 1, &slugs));
        assert_eq!(Some(PathBuf::from("pages/3.html")), page_file(&View::All, 3, &slugs));
        assert_eq!(
            Some(PathBuf::from("tags/rust-lang/index.html")),
            page_file(&View::Tag(String::from("Rust Lang")), 1, &slugs)
        );
        assert_eq!(
            Some(PathBuf::from("priced/2.html")),
            page_file(&View::Priced, 2, &slugs)
        );
        assert_eq!(
            None,
            page_file(&View::Page(String::from("about.html")), 1, &slugs)
        );
        assert_eq!("tag", tag_slug("!!!"));
    }

    #[test]
    fn test_colliding_slugs_are_disambiguated() {
        let slugs = TagSlugs::new(vec!["rust", "Rust", "RUST", "go", "rust"]);
        assert_eq!("rust", slugs.get("rust"));
        assert_eq!("rust-2", slugs.get("Rust"));
        assert_eq!("rust-3", slugs.get("RUST"));
        assert_eq!("go", slugs.get("go"));
        assert_eq!(
            Some(PathBuf::from("tags/rust-2/index.html")),
            page_file(&View::Tag(String::from("Rust")), 1, &slugs)
        );
    }

    #[test]
    fn test_root_prefix() {
        assert_eq!("", root_prefix(Path::new("index.html")));
        assert_eq!("../", root_prefix(Path::new("pages/2.html")));
        assert_eq!("../../", root_prefix(Path::new("tags/a/index.html")));
    }

    #[test]
    fn test_write_page() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let source = MapSource::default()
            .with("data.json", DATA)
            .with("nav.html", NAV);
        let mut session = Session::initialize(&source, Settings::default());
        session.click_tag("b");

        let dir = tempfile::tempdir()?;
        let template = parse_template("{{.title}}|{{.root}}|{{.main}}|{{.tag_stats}}{{if .pagination}}|pages{{end}}")?;
        let slugs = TagSlugs::new(session.tag_counts().iter().map(|(tag, _)| tag));
        let writer = Writer {
            template: &template,
            output_directory: dir.path(),
            slugs: &slugs,
        };
        let file = writer.write_page(session.page(), session.view(), 1, "b")?;
        assert_eq!(PathBuf::from("tags/b/index.html"), file);

        let html = std::fs::read_to_string(dir.path().join(&file))?;
        assert!(html.starts_with("b|../../|"));
        assert!(html.contains("February"));
        assert!(!html.contains("January"));
        assert!(html.contains(r#"href="../../tags/a/index.html""#));
        assert!(html.contains(r#"href="../../priced/index.html""#));
        assert!(!html.contains("|pages"));
        Ok(())
    }

    #[test]
    fn test_title_is_escaped() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let template = parse_template("<title>{{.title}}</title>")?;
        let slugs = TagSlugs::default();
        let writer = Writer {
            template: &template,
            output_directory: dir.path(),
            slugs: &slugs,
        };
        let file = writer.write_page(&Page::default(), &View::All, 1, "# <b>&")?;
        let html = std::fs::read_to_string(dir.path().join(file))?;
        assert_eq!("<title># &lt;b&gt;&amp;</title>", html);
        Ok(())
    }

    #[test]
    fn test_default_template_parses() -> Result<()> {
        parse_template(DEFAULT_TEMPLATE)?;
        Ok(())
    }

    #[test]
    fn test_unwritable_view() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|err| Error::Io {
            path: PathBuf::new(),
            err,
        })?;
        let template = parse_template("{{.main}}")?;
        let slugs = TagSlugs::default();
        let writer = Writer {
            template: &template,
            output_directory: dir.path(),
            slugs: &slugs,
        };
        let view = View::Page(String::from("about.html"));
        assert!(matches!(
            writer.write_page(&Page::default(), &view, 1, "about"),
            Err(Error::NotWritable(_))
        ));
        Ok(())
    }
}
