//! Defines the [`Post`] record read from the feed's JSON data file, along with
//! the [`Price`] field and the date handling used to order posts. Posts are
//! immutable once loaded; everything else in the crate derives views from a
//! sorted `Vec<Post>`.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// A single entry of the feed. Field names match the keys of the JSON data
/// file (`title`, `date`, `content`, `image`, `tags`, `price`).
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Post {
    /// The title of the post.
    #[serde(default)]
    pub title: String,

    /// The date as written in the data file, e.g. `2024/02/01`. It is
    /// displayed verbatim and only parsed (see [`Post::sort_key`]) for
    /// ordering.
    #[serde(default)]
    pub date: String,

    /// Plain text or Markdown source, depending on the render options.
    #[serde(default)]
    pub content: String,

    /// URL of the card image.
    #[serde(default)]
    pub image: String,

    /// The tags associated with the post, in source order. Duplicates and
    /// arbitrary casing are kept as-is.
    #[serde(default)]
    pub tags: Vec<String>,

    /// The optional price of the post.
    #[serde(default)]
    pub price: Option<Price>,
}

impl Post {
    /// Best-effort parse of [`Post::date`] into a comparable instant. Slashes
    /// are normalized to dashes and a handful of date and date-time layouts
    /// are tried; `None` means the date is unparseable.
    pub fn sort_key(&self) -> Option<NaiveDateTime> {
        parse_date(&self.date)
    }

    /// Whether the post carries a price worth showing, i.e. a truthy price
    /// that isn't numerically zero.
    pub fn has_price(&self) -> bool {
        self.price.as_ref().map_or(false, Price::is_nonzero)
    }

    /// Whether `tag` appears among the post's tags (exact match).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// The `price` field. The data file is loose about it: it may be a number, a
/// string holding a number, or something else entirely.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Price {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Price {
    /// Converts the price to a number the way a whole-string numeric
    /// conversion would: surrounding whitespace is ignored and an empty
    /// string is zero. Returns `None` for anything that isn't a finite
    /// number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Price::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Price::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Some(0.0);
                }
                if let Some(n) = parse_radix(trimmed) {
                    return Some(n);
                }
                // `f64::from_str` accepts spellings like "inf" and "NaN".
                if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            Price::Other(serde_json::Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            Price::Other(_) => None,
        }
    }

    /// A price is "present" when it is truthy: a non-empty string, a
    /// non-zero number, or a `true` flag.
    fn is_truthy(&self) -> bool {
        match self {
            Price::Number(n) => *n != 0.0 && !n.is_nan(),
            Price::Text(s) => !s.is_empty(),
            Price::Other(serde_json::Value::Bool(b)) => *b,
            Price::Other(serde_json::Value::Null) => false,
            Price::Other(_) => true,
        }
    }

    /// True when the price is present and not numerically zero. Prices that
    /// don't convert to a number count as non-zero.
    pub fn is_nonzero(&self) -> bool {
        self.is_truthy() && self.as_number() != Some(0.0)
    }
}

/// Reads `0x`, `0o` and `0b` prefixed integers. Signs aren't allowed.
fn parse_radix(s: &str) -> Option<f64> {
    let (radix, digits) = match s.get(..2)? {
        "0x" | "0X" => (16, &s[2..]),
        "0o" | "0O" => (8, &s[2..]),
        "0b" | "0B" => (2, &s[2..]),
        _ => return None,
    };
    if digits.starts_with('+') {
        return None;
    }
    u64::from_str_radix(digits, radix).ok().map(|n| n as f64)
}

impl std::fmt::Display for Price {
    /// Displays the price as it appears in the data file.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Price::Number(n) => n.fmt(f),
            Price::Text(s) => s.fmt(f),
            Price::Other(v) => v.fmt(f),
        }
    }
}

// `%.f` also matches when there are no fractional seconds.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamps with an offset are compared in UTC; local ones as written.
fn parse_date(date: &str) -> Option<NaiveDateTime> {
    let normalized = date.trim().replace('/', "-");
    DateTime::parse_from_rfc3339(&normalized)
        .map(|d| d.naive_utc())
        .ok()
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(&normalized, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Sorts posts by descending date. The sort is stable, so posts sharing a
/// date keep their source order. Posts with unparseable dates go after every
/// dated post, also in source order.
pub fn sort_by_date_desc(posts: &mut [Post]) {
    // `None < Some(_)`, so reversing puts undated posts last.
    posts.sort_by_cached_key(|post| Reverse(post.sort_key()));
}

#[cfg(test)]
mod test {
    use super::*;

    fn post(date: &str) -> Post {
        Post {
            title: date.to_owned(),
            date: date.to_owned(),
            content: String::new(),
            image: String::new(),
            tags: Vec::new(),
            price: None,
        }
    }

    #[test]
    fn test_parse_slash_dates() {
        let key = post("2024/02/01").sort_key();
        assert_eq!(
            NaiveDate::from_ymd_opt(2024, 2, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
            key
        );
        assert!(post("2024/2/1 08:30").sort_key().is_some());
        assert!(post("yesterday").sort_key().is_none());
    }

    #[test]
    fn test_sort_descending_and_stable() {
        let mut posts = vec![
            post("2024/01/01"),
            post("garbage"),
            post("2024/02/01"),
            post("2024/01/01 12:00"),
            post("also garbage"),
        ];
        posts[0].title = String::from("first");
        sort_by_date_desc(&mut posts);
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            vec![
                "2024/02/01",
                "2024/01/01 12:00",
                "first",
                "garbage",
                "also garbage"
            ],
            titles
        );
    }

    #[test]
    fn test_price_deserialize_and_nonzero() -> Result<(), serde_json::Error> {
        let posts: Vec<Post> = serde_json::from_str(
            r#"[
                {"title": "a", "date": "2024/01/01", "price": "0"},
                {"title": "b", "date": "2024/01/01", "price": 12.5},
                {"title": "c", "date": "2024/01/01", "price": ""},
                {"title": "d", "date": "2024/01/01"},
                {"title": "e", "date": "2024/01/01", "price": null},
                {"title": "f", "date": "2024/01/01", "price": "abc"},
                {"title": "g", "date": "2024/01/01", "price": " 10 "}
            ]"#,
        )?;
        let shown: Vec<bool> = posts.iter().map(Post::has_price).collect();
        assert_eq!(vec![false, true, false, false, false, true, true], shown);
        assert_eq!(Some(10.0), posts[6].price.as_ref().and_then(Price::as_number));
        assert_eq!(None, posts[5].price.as_ref().and_then(Price::as_number));
        Ok(())
    }

    #[test]
    fn test_price_rejects_non_finite_spellings() {
        assert_eq!(None, Price::Text(String::from("inf")).as_number());
        assert_eq!(None, Price::Text(String::from("NaN")).as_number());
        assert_eq!(Some(1000.0), Price::Text(String::from("1e3")).as_number());
    }

    #[test]
    fn test_sort_mixes_slash_and_rfc3339_dates() {
        let mut posts = vec![
            post("2024/01/01"),
            post("2024-03-01T10:00:00Z"),
            post("2024-03-02T10:00:00.000+08:00"),
        ];
        posts[0].title = String::from("old");
        posts[1].title = String::from("new_z");
        posts[2].title = String::from("new_ms");
        sort_by_date_desc(&mut posts);
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(vec!["new_ms", "new_z", "old"], titles);
    }

    #[test]
    fn test_parse_offsets_and_fractions() {
        assert_eq!(
            post("2024-03-01T10:00:00Z").sort_key(),
            post("2024-03-01T18:00:00+08:00").sort_key()
        );
        assert_eq!(
            NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_milli_opt(10, 0, 0, 250)),
            post("2024-03-01 10:00:00.250").sort_key()
        );
    }

    #[test]
    fn test_price_radix_and_flags() {
        assert_eq!(Some(16.0), Price::Text(String::from("0x10")).as_number());
        assert_eq!(Some(5.0), Price::Text(String::from("0b101")).as_number());
        assert_eq!(None, Price::Text(String::from("0x+1")).as_number());
        assert_eq!(None, Price::Text(String::from("-0x10")).as_number());
        let yes = Price::Other(serde_json::Value::Bool(true));
        let no = Price::Other(serde_json::Value::Bool(false));
        assert_eq!(Some(1.0), yes.as_number());
        assert!(yes.is_nonzero());
        assert_eq!(Some(0.0), no.as_number());
        assert!(!no.is_nonzero());
    }

    #[test]
    fn test_price_display_keeps_source_text() {
        assert_eq!("10", Price::Number(10.0).to_string());
        assert_eq!("12.50", Price::Text(String::from("12.50")).to_string());
    }
}
