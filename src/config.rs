use crate::nav::HOME_PAGE;
use crate::render::{Batching, RenderOptions, COLLAPSE_THRESHOLD};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

const PROJECT_FILE: &str = "tagfeed.yaml";

fn default_data() -> String {
    String::from("data.json")
}

fn default_nav() -> String {
    String::from("nav.html")
}

fn default_home_page() -> String {
    String::from(HOME_PAGE)
}

fn default_collapse_threshold() -> Option<u32> {
    Some(COLLAPSE_THRESHOLD)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    #[serde(default = "default_data")]
    data: String,

    #[serde(default = "default_nav")]
    nav: String,

    #[serde(default = "default_home_page")]
    home_page: String,

    #[serde(default)]
    template: Option<PathBuf>,

    #[serde(default)]
    base_url: Option<Url>,

    #[serde(default)]
    markdown: bool,

    #[serde(default = "default_collapse_threshold")]
    collapse_threshold: Option<u32>,

    #[serde(default)]
    batching: Batching,
}

/// Where the static resources come from.
#[derive(Clone, Debug, PartialEq)]
pub enum Location {
    /// A local directory (the project directory unless configured otherwise).
    Directory(PathBuf),

    /// A base URL the resources are fetched from.
    Url(Url),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The directory containing the project file.
    pub project_directory: PathBuf,
    pub location: Location,

    /// Name of the JSON data file, relative to `location`.
    pub data: String,

    /// Name of the nav fragment, relative to `location`.
    pub nav: String,

    /// Page id of the nav entry showing the unfiltered feed.
    pub home_page: String,

    /// The page shell template; `None` selects the built-in one.
    pub template: Option<PathBuf>,

    pub render: RenderOptions,
}

impl Config {
    /// Loads the project file from `dir`, or from the nearest ancestor
    /// directory that has one.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
                .with_context(|| format!("Loading configuration from `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_directory = match path.parent() {
            None => {
                return Err(anyhow!(
                    "Can't get parent directory for provided project file path '{:?}'",
                    path
                ))
            }
            Some(dir) => dir.to_owned(),
        };
        Ok(Config {
            location: match project.base_url {
                Some(url) => Location::Url(url),
                None => Location::Directory(project_directory.clone()),
            },
            data: project.data,
            nav: project.nav,
            home_page: project.home_page,
            template: project.template.map(|t| project_directory.join(t)),
            render: RenderOptions {
                markdown: project.markdown,
                collapse_threshold: project.collapse_threshold,
                batching: project.batching,
            },
            project_directory,
        })
    }
}
