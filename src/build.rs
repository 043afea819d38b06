//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building a static snapshot of the feed: fetching the resources
//! ([`crate::source`]), replaying the filter interactions against a
//! [`Session`] and templating every resulting page to disk
//! ([`crate::write`]).

use crate::config::Config;
use crate::render::Batching;
use crate::session::{Session, Settings, View};
use crate::source::{self, FetchError, LoadError};
use crate::write::{self, parse_template, TagSlugs, Writer, DEFAULT_TEMPLATE};
use std::path::{Path, PathBuf};
use tracing::info;

/// Builds the site from a [`Config`] into `output`. Writes the unfiltered
/// view, one view per tag and the priced view, each paginated when fixed
/// paging is configured. Returns the number of files written.
///
/// Infinite scroll has nothing to scroll in a static snapshot, so those
/// views are written in full.
pub fn build_site(config: &Config, output: &Path) -> Result<usize> {
    let source = source::open(&config.location)?;
    let inputs = source::load_inputs(&*source, &config.nav, &config.data)?;

    let template = parse_template(&match &config.template {
        Some(path) => std::fs::read_to_string(path).map_err(|err| Error::OpenTemplateFile {
            path: path.clone(),
            err,
        })?,
        None => DEFAULT_TEMPLATE.to_owned(),
    })?;

    // Blow away the old view directories so pages of tags that no longer
    // exist don't linger. The output root itself may hold other files (the
    // stylesheet, the nav pages) and is left alone.
    for dir in ["pages", "tags", "priced"] {
        rmdir(&output.join(dir))?;
    }

    let mut settings = Settings::from(config);
    if let Batching::InfiniteScroll { .. } = settings.render.batching {
        settings.render.batching = Batching::None;
    }
    let home_page = settings.home_page.clone();
    let mut session = Session::from_inputs(inputs, settings);

    // More frequent tags claim the plain slug when slugs collide.
    let sorted = session.tag_counts().sorted();
    let slugs = TagSlugs::new(sorted.iter().map(|(tag, _)| *tag));
    let mut views = vec![(View::All, String::from("Home"))];
    views.extend(
        sorted
            .iter()
            .map(|(tag, _)| (View::Tag((*tag).to_owned()), format!("# {}", tag))),
    );
    views.push((View::Priced, String::from("Priced")));
    let writer = Writer {
        template: &template,
        output_directory: output,
        slugs: &slugs,
    };

    let mut written = 0;
    for (view, title) in views {
        match &view {
            View::All => session.click_nav(&home_page),
            View::Tag(tag) => session.click_tag(tag),
            View::Priced => session.click_total_price(),
            View::Page(_) => continue,
        }
        let pages = session
            .page()
            .pagination
            .as_ref()
            .map(|controls| controls.page_count)
            .unwrap_or(1);
        for number in 1..=pages.max(1) {
            if number > 1 {
                session.goto_page(number);
            }
            session.settle();
            writer.write_page(session.page(), &view, number, &title)?;
            written += 1;
        }
    }

    info!(files = written, output = %output.display(), "site built");
    Ok(written)
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the resource source can't be opened.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Returned for errors fetching or parsing the resources.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Returned for errors templating or writing pages.
    #[error(transparent)]
    Write(#[from] write::Error),

    /// Returned for I/O problems while cleaning output directories.
    #[error("cleaning directory `{}`: {err}", .path.display())]
    Clean {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for I/O problems while reading the template file.
    #[error("opening template file `{}`: {err}", .path.display())]
    OpenTemplateFile {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Location;
    use crate::nav::HOME_PAGE;
    use crate::render::RenderOptions;
    use crate::source::test::{DATA, NAV};
    use std::fs;

    fn project(dir: &Path, batching: Batching) -> std::io::Result<Config> {
        fs::write(dir.join("data.json"), DATA)?;
        fs::write(dir.join("nav.html"), NAV)?;
        fs::write(
            dir.join("page.html"),
            "{{.title}}\n{{.main}}\n{{if .pagination}}{{.pagination}}{{end}}",
        )?;
        Ok(Config {
            project_directory: dir.to_owned(),
            location: Location::Directory(dir.to_owned()),
            data: String::from("data.json"),
            nav: String::from("nav.html"),
            home_page: String::from(HOME_PAGE),
            template: Some(dir.join("page.html")),
            render: RenderOptions {
                batching,
                ..RenderOptions::default()
            },
        })
    }

    #[test]
    fn test_build_views() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let config = project(dir.path(), Batching::None)?;
        let output = dir.path().join("out");
        fs::create_dir_all(output.join("tags/stale"))?;

        assert_eq!(4, build_site(&config, &output)?);

        let index = fs::read_to_string(output.join("index.html"))?;
        assert!(index.starts_with("Home\n"));
        assert!(index.contains("February") && index.contains("January"));

        let b = fs::read_to_string(output.join("tags/b/index.html"))?;
        assert!(b.starts_with("# b\n"));
        assert!(b.contains("February") && !b.contains("January"));

        let priced = fs::read_to_string(output.join("priced/index.html"))?;
        assert!(priced.contains("February") && !priced.contains("January"));

        assert!(output.join("tags/a/index.html").exists());
        assert!(!output.join("tags/stale").exists());
        Ok(())
    }

    #[test]
    fn test_build_fixed_pages() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let config = project(dir.path(), Batching::FixedPage { size: 1 })?;
        let output = dir.path().join("out");

        // index + pages/2, tags/a + tags/a/2, tags/b, priced
        assert_eq!(6, build_site(&config, &output)?);
        let second = fs::read_to_string(output.join("pages/2.html"))?;
        assert!(second.contains("January") && !second.contains("February"));
        assert!(second.contains(r#"href="../index.html""#));
        assert!(output.join("tags/a/2.html").exists());
        Ok(())
    }

    #[test]
    fn test_colliding_tags_get_their_own_pages() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let config = project(dir.path(), Batching::None)?;
        fs::write(
            dir.path().join("data.json"),
            r#"[
                {"title": "Lower one", "date": "2024/01/01", "tags": ["rust"]},
                {"title": "Lower two", "date": "2024/01/02", "tags": ["rust"]},
                {"title": "Upper", "date": "2024/01/03", "tags": ["Rust"]}
            ]"#,
        )?;
        let output = dir.path().join("out");

        // index, rust, Rust, priced
        assert_eq!(4, build_site(&config, &output)?);
        let lower = fs::read_to_string(output.join("tags/rust/index.html"))?;
        assert!(lower.contains("Lower one") && !lower.contains("Upper"));
        let upper = fs::read_to_string(output.join("tags/rust-2/index.html"))?;
        assert!(upper.contains("Upper") && !upper.contains("Lower"));
        Ok(())
    }

    #[test]
    fn test_missing_data_fails() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let config = project(dir.path(), Batching::None)?;
        fs::remove_file(dir.path().join("data.json"))?;
        assert!(matches!(
            build_site(&config, &dir.path().join("out")),
            Err(Error::Load(_))
        ));
        Ok(())
    }
}
