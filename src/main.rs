use anyhow::{anyhow, Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tagfeed::build::build_site;
use tagfeed::config::Config;
use tagfeed::loader::ScrollMetrics;
use tagfeed::session::{Session, Settings};
use tagfeed::source;
use tagfeed::tag::{count_tags, format_total, sum_prices};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    init_logging()?;

    let project = Arg::with_name("project")
        .long("project")
        .takes_value(true)
        .value_name("DIR")
        .help("The project directory, or any directory below it (default: the current directory)");
    let matches = App::new("tagfeed")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A small personal feed site")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Writes a static snapshot of every view of the feed")
                .arg(project.clone())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("The output directory (default: `_output` in the project directory)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("stats")
                .about("Prints the tag counts and the price total")
                .arg(project.clone()),
        )
        .subcommand(
            SubCommand::with_name("session")
                .about("Replays commands read from stdin against a live session")
                .arg(project),
        )
        .get_matches();

    match matches.subcommand() {
        ("build", Some(m)) => build(m),
        ("stats", Some(m)) => stats(m),
        ("session", Some(m)) => session(m),
        (other, _) => Err(anyhow!("Unknown subcommand `{}`", other)),
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Installing tracing subscriber")
}

fn config(matches: &ArgMatches) -> Result<Config> {
    let dir = match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("Getting current directory")?,
    };
    Config::from_directory(&dir)
}

fn build(matches: &ArgMatches) -> Result<()> {
    let config = config(matches)?;
    let output = match matches.value_of("output") {
        Some(dir) => PathBuf::from(dir),
        None => config.project_directory.join("_output"),
    };
    build_site(&config, &output)
        .with_context(|| format!("Building site into `{}`", output.display()))?;
    Ok(())
}

fn stats(matches: &ArgMatches) -> Result<()> {
    let config = config(matches)?;
    let source = source::open(&config.location)?;
    let posts = source::load(&*source, &config.data)?;
    let counts = count_tags(&posts);
    let mut out = std::io::stdout().lock();
    for (tag, count) in counts.sorted() {
        writeln!(out, "{}\t{}", tag, count)?;
    }
    writeln!(out, "Total: ¥{}", format_total(sum_prices(&posts)))?;
    Ok(())
}

fn session(matches: &ArgMatches) -> Result<()> {
    let config = config(matches)?;
    let source = source::open(&config.location)?;
    let mut session = Session::initialize(&*source, Settings::from(&config));
    session.settle();

    let stdin = std::io::stdin();
    let mut out = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("Reading command")?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        let status = command.apply(&mut session);
        session.settle();
        writeln!(out, "{}", status)?;
    }
    Ok(())
}

/// One line of the `session` command's input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command<'a> {
    Tag(&'a str),
    Price,
    Nav(&'a str),
    Scroll(ScrollMetrics),
    More,
    Page(usize),
    Next,
    Prev,
    Toggle(usize),
    Show,
    Quit,
}

impl<'a> Command<'a> {
    /// Parses a command line. Blank lines and `#` comments yield `None`.
    fn parse(line: &'a str) -> Result<Option<Command<'a>>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        Ok(Some(match word {
            "tag" if !rest.is_empty() => Command::Tag(rest),
            "nav" if !rest.is_empty() => Command::Nav(rest),
            "price" => Command::Price,
            "more" => Command::More,
            "next" => Command::Next,
            "prev" => Command::Prev,
            "show" => Command::Show,
            "quit" => Command::Quit,
            "page" => Command::Page(number(word, rest)?),
            "toggle" => Command::Toggle(number(word, rest)?),
            "scroll" => match rest.split_whitespace().collect::<Vec<&str>>()[..] {
                [top, viewport, height] => Command::Scroll(ScrollMetrics {
                    scroll_top: number(word, top)?,
                    viewport_height: number(word, viewport)?,
                    document_height: number(word, height)?,
                }),
                _ => return Err(anyhow!("usage: scroll <top> <viewport> <height>")),
            },
            _ => return Err(anyhow!("unknown command `{}`", line)),
        }))
    }

    /// Applies the command and describes what happened.
    fn apply(self, session: &mut Session) -> String {
        match self {
            Command::Tag(tag) => {
                session.click_tag(tag);
                summary(session)
            }
            Command::Price => {
                session.click_total_price();
                summary(session)
            }
            Command::Nav(page) => {
                session.click_nav(page);
                summary(session)
            }
            Command::Scroll(metrics) => format!("{:?}", session.scroll(metrics)),
            Command::More => format!("{:?}", session.load_more()),
            Command::Page(n) => page_status(session.goto_page(n), session),
            Command::Next => page_status(session.next_page(), session),
            Command::Prev => page_status(session.prev_page(), session),
            Command::Toggle(card) => match session.toggle(card) {
                Some(state) => format!("card {}: {:?}", card, state),
                None => format!("card {}: not collapsible", card),
            },
            Command::Show => show(session),
            Command::Quit => String::new(),
        }
    }
}

fn number<T>(word: &str, s: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.parse()
        .with_context(|| format!("`{}` expects a number, got `{}`", word, s))
}

fn summary(session: &Session) -> String {
    format!(
        "{:?}: {} of {} posts shown",
        session.view(),
        session.page().main.cards().count(),
        session.current_posts().len()
    )
}

fn page_status(changed: bool, session: &Session) -> String {
    match (changed, &session.page().pagination) {
        (true, Some(controls)) => format!("page {} of {}", controls.current, controls.page_count),
        _ => String::from("page unchanged"),
    }
}

fn show(session: &Session) -> String {
    let page = session.page();
    let mut s = format!(
        "<!-- sidebar -->\n{}\n<!-- tag stats -->\n{}\n<!-- main -->\n{}",
        page.sidebar,
        page.tag_stats.to_html(None),
        page.main.to_html()
    );
    if let Some(controls) = &page.pagination {
        s.push_str("\n<!-- pagination -->\n");
        s.push_str(&controls.to_html(None));
    }
    s
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_commands() -> Result<()> {
        assert_eq!(Some(Command::Tag("rust lang")), Command::parse("tag  rust lang ")?);
        assert_eq!(Some(Command::Price), Command::parse("price")?);
        assert_eq!(Some(Command::Page(3)), Command::parse("page 3")?);
        assert_eq!(
            Some(Command::Scroll(ScrollMetrics {
                scroll_top: 900,
                viewport_height: 1000,
                document_height: 2000,
            })),
            Command::parse("scroll 900 1000 2000")?
        );
        assert_eq!(None, Command::parse("   ")?);
        assert_eq!(None, Command::parse("# comment")?);
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("page x").is_err());
        assert!(Command::parse("tag").is_err());
        assert!(Command::parse("scroll 1 2").is_err());
        assert!(Command::parse("jump").is_err());
    }
}
