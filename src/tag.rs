//! The tag index: per-tag occurrence counts and the price total shown in the
//! sidebar. Both are computed over the full post list, independent of any
//! active filter.

use std::collections::HashMap;

use crate::post::{Post, Price};

/// Occurrence counts for every tag, in first-encounter order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagCounts {
    entries: Vec<(String, usize)>,
    positions: HashMap<String, usize>,
}

impl TagCounts {
    fn add(&mut self, tag: &str) {
        match self.positions.get(tag) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.positions.insert(tag.to_owned(), self.entries.len());
                self.entries.push((tag.to_owned(), 1));
            }
        }
    }

    /// The count for `tag`, zero if it never occurs.
    pub fn get(&self, tag: &str) -> usize {
        self.positions
            .get(tag)
            .map_or(0, |&i| self.entries[i].1)
    }

    /// The number of distinct tags.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every count, i.e. the total number of tag occurrences.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Iterates `(tag, count)` pairs in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(t, n)| (t.as_str(), *n))
    }

    /// Tags in presentation order: descending count, ties in first-encounter
    /// order.
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

/// Counts every tag occurrence across every post. Repeated tags, including a
/// tag repeated within one post, all accumulate.
pub fn count_tags<'a>(posts: impl IntoIterator<Item = &'a Post>) -> TagCounts {
    let mut counts = TagCounts::default();
    for post in posts {
        for tag in &post.tags {
            counts.add(tag);
        }
    }
    counts
}

/// Sums the prices that convert to a finite number. Absent and non-numeric
/// prices contribute nothing.
pub fn sum_prices<'a>(posts: impl IntoIterator<Item = &'a Post>) -> f64 {
    posts
        .into_iter()
        .filter_map(|p| p.price.as_ref().and_then(Price::as_number))
        .fold(0.0, |sum, n| sum + n)
}

/// Formats a price total with two decimals, the way the sidebar shows it.
pub fn format_total(total: f64) -> String {
    format!("{:.2}", total)
}
