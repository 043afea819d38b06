//! The feed store: fetching the static resources a session starts from (the
//! post data file and the nav fragment) and turning the data file into a
//! sorted list of [`Post`]s.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, info};
use url::Url;

use crate::config::Location;
use crate::post::{sort_by_date_desc, Post};

/// A place static resources are fetched from, addressed by a relative name
/// like `data.json`. Implementations must be shareable across threads
/// because the initial resources are fetched in parallel.
pub trait Source: Sync {
    fn fetch(&self, name: &str) -> Result<String, FetchError>;
}

/// Reads resources from a local directory. A missing file is reported the
/// way a web server would report it, as a 404 status.
#[derive(Clone, Debug)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> DirSource {
        DirSource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Source for DirSource {
    fn fetch(&self, name: &str) -> Result<String, FetchError> {
        let path = self.root.join(name);
        debug!(path = %path.display(), "reading resource");
        fs::read_to_string(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => FetchError::Status {
                name: name.to_owned(),
                status: 404,
            },
            _ => FetchError::Io {
                name: name.to_owned(),
                err,
            },
        })
    }
}

/// Fetches resources over HTTP relative to a base URL.
#[derive(Clone, Debug)]
pub struct HttpSource {
    base: Url,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// `base` should end in a trailing slash; otherwise its last path segment
    /// is replaced rather than extended when resource names are joined.
    pub fn new(base: Url) -> Result<HttpSource, FetchError> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(HttpSource { base, client })
    }
}

impl Source for HttpSource {
    fn fetch(&self, name: &str) -> Result<String, FetchError> {
        let url = self.base.join(name)?;
        debug!(%url, "fetching resource");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                name: name.to_owned(),
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }
}

/// Opens the source a project's resources are fetched from.
pub fn open(location: &Location) -> Result<Box<dyn Source>, FetchError> {
    Ok(match location {
        Location::Directory(dir) => Box::new(DirSource::new(dir.clone())),
        Location::Url(base) => Box::new(HttpSource::new(base.clone())?),
    })
}

/// Fetches the named data file and parses it into posts sorted by date, most
/// recent first.
pub fn load(source: &dyn Source, data: &str) -> Result<Vec<Post>, LoadError> {
    parse_posts(data, &source.fetch(data)?)
}

/// Parses the contents of a data file (a JSON array of post objects) and
/// sorts the result by date, most recent first.
pub fn parse_posts(name: &str, json: &str) -> Result<Vec<Post>, LoadError> {
    let mut posts: Vec<Post> = serde_json::from_str(json).map_err(|err| LoadError::Parse {
        name: name.to_owned(),
        err,
    })?;
    sort_by_date_desc(&mut posts);
    info!(count = posts.len(), source = name, "loaded posts");
    Ok(posts)
}

/// The resources a session is initialized from.
#[derive(Clone, Debug)]
pub struct Inputs {
    /// The nav fragment, as fetched.
    pub nav: String,

    /// The posts, sorted by date, most recent first.
    pub posts: Vec<Post>,
}

/// Fetches the nav fragment and the data file in parallel. Both must succeed;
/// when both fail, the data file's error is reported.
pub fn load_inputs(source: &dyn Source, nav: &str, data: &str) -> Result<Inputs, LoadError> {
    let (fragment, posts) = thread::scope(|s| {
        let handle = s.spawn(|| source.fetch(nav));
        let posts = load(source, data);
        let fragment = handle.join().unwrap_or_else(|_| {
            Err(FetchError::Panicked {
                name: nav.to_owned(),
            })
        });
        (fragment, posts)
    });
    let posts = posts?;
    Ok(Inputs {
        nav: fragment?,
        posts,
    })
}

/// Represents a failure to fetch a resource.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The resource was answered with a non-success status (a missing file
    /// counts as 404).
    #[error("fetching `{name}` failed with status {status}")]
    Status { name: String, status: u16 },

    /// Returned for I/O errors reading a local resource.
    #[error("reading `{name}`: {err}")]
    Io {
        name: String,
        #[source]
        err: std::io::Error,
    },

    /// Returned for transport-level HTTP errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Returned when a resource name can't be joined onto the base URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// The fetching thread panicked.
    #[error("fetching `{name}` panicked")]
    Panicked { name: String },
}

/// Represents a failure to load posts.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The data file isn't a well-formed JSON array of posts.
    #[error("parsing `{name}`: {err}")]
    Parse {
        name: String,
        #[source]
        err: serde_json::Error,
    },
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::collections::HashMap;

    /// An in-memory [`Source`]. Unknown names are answered with a 404.
    #[derive(Default)]
    pub(crate) struct MapSource(pub HashMap<String, String>);

    impl MapSource {
        pub(crate) fn with(mut self, name: &str, contents: &str) -> Self {
            self.0.insert(name.to_owned(), contents.to_owned());
            self
        }
    }

    impl Source for MapSource {
        fn fetch(&self, name: &str) -> Result<String, FetchError> {
            self.0.get(name).cloned().ok_or_else(|| FetchError::Status {
                name: name.to_owned(),
                status: 404,
            })
        }
    }

    pub(crate) const DATA: &str = r#"[
        {"title": "January", "date": "2024/01/01", "content": "c1", "image": "1.png", "tags": ["a"], "price": "0"},
        {"title": "February", "date": "2024/02/01", "content": "c2", "image": "2.png", "tags": ["a", "b"], "price": "10"}
    ]"#;

    pub(crate) const NAV: &str = r#"<nav><a href="home.html" data-page="home.html">Home</a><a href="about.html" data-page="about.html">About</a></nav>"#;

    #[test]
    fn test_load_sorts_by_date() -> Result<(), LoadError> {
        let source = MapSource::default().with("data.json", DATA);
        let posts = load(&source, "data.json")?;
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(vec!["February", "January"], titles);
        Ok(())
    }

    #[test]
    fn test_missing_data_is_404() {
        let source = MapSource::default();
        match load(&source, "data.json") {
            Err(LoadError::Fetch(FetchError::Status { status: 404, .. })) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_data() {
        let source = MapSource::default().with("data.json", "{not json");
        assert!(matches!(
            load(&source, "data.json"),
            Err(LoadError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_inputs_requires_both() -> Result<(), LoadError> {
        let source = MapSource::default()
            .with("data.json", DATA)
            .with("nav.html", NAV);
        let inputs = load_inputs(&source, "nav.html", "data.json")?;
        assert_eq!(NAV, inputs.nav);
        assert_eq!(2, inputs.posts.len());

        let no_nav = MapSource::default().with("data.json", DATA);
        assert!(load_inputs(&no_nav, "nav.html", "data.json").is_err());
        Ok(())
    }

    #[test]
    fn test_dir_source() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("data.json"), DATA)?;
        let source = DirSource::new(dir.path());
        assert_eq!(2, load(&source, "data.json")?.len());
        assert!(matches!(
            source.fetch("nav.html"),
            Err(FetchError::Status { status: 404, .. })
        ));
        Ok(())
    }
}
