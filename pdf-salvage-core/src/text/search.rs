//! Substring search over extracted page text
//!
//! Runs are grouped into visual lines with the same rules as
//! [`join_runs`](crate::text::extraction::join_runs), so a phrase split over
//! adjacent `Tj`/`TJ` operators on one line is still found. Matches never
//! span two lines and do not overlap.

use crate::geometry::Point;
use crate::text::extraction::{joint, ExtractedText, Joint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
}

impl SearchOptions {
    pub fn case_sensitive() -> Self {
        Self {
            case_sensitive: true,
        }
    }

    pub fn case_insensitive() -> Self {
        Self {
            case_sensitive: false,
        }
    }
}

/// One match of a search
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SearchResult {
    pub page_index: usize,
    /// Matched text as it appears on the page
    pub match_text: String,
    /// Approximate start of the match, top-left origin
    pub position: Point,
}

/// Characters of one line, each tagged with where it sits on the page
struct Line {
    chars: Vec<char>,
    positions: Vec<Point>,
}

fn lines(items: &[ExtractedText]) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut prev: Option<&ExtractedText> = None;

    for item in items {
        let joint = prev.map(|p| joint(p, item));
        if matches!(joint, None | Some(Joint::NewLine)) {
            lines.push(Line {
                chars: Vec::new(),
                positions: Vec::new(),
            });
        }
        let Some(line) = lines.last_mut() else {
            continue;
        };

        let start = Point::new(item.x, item.y);
        if joint == Some(Joint::Space)
            && line.chars.last() != Some(&' ')
            && !item.text.starts_with(' ')
        {
            line.chars.push(' ');
            line.positions.push(start);
        }

        let count = item.text.chars().count().max(1) as f64;
        for (i, c) in item.text.chars().enumerate() {
            line.chars.push(c);
            line.positions
                .push(Point::new(item.x + item.width * i as f64 / count, item.y));
        }
        prev = Some(item);
    }

    lines
}

fn fold(c: char, case_sensitive: bool) -> char {
    if case_sensitive {
        c
    } else {
        c.to_lowercase().next().unwrap_or(c)
    }
}

/// Find `query` in the runs of one page
pub fn search_runs(
    items: &[ExtractedText],
    page_index: usize,
    query: &str,
    options: SearchOptions,
) -> Vec<SearchResult> {
    let needle: Vec<char> = query
        .chars()
        .map(|c| fold(c, options.case_sensitive))
        .collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut results = Vec::new();
    for line in lines(items) {
        let haystack: Vec<char> = line
            .chars
            .iter()
            .map(|&c| fold(c, options.case_sensitive))
            .collect();

        let mut i = 0;
        while i + needle.len() <= haystack.len() {
            if haystack[i..i + needle.len()] == needle[..] {
                results.push(SearchResult {
                    page_index,
                    match_text: line.chars[i..i + needle.len()].iter().collect(),
                    position: line.positions[i],
                });
                i += needle.len();
            } else {
                i += 1;
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, x: f64, y: f64, width: f64) -> ExtractedText {
        ExtractedText {
            text: text.to_string(),
            x,
            y,
            font_name: "F1".to_string(),
            font_size: 10.0,
            width,
        }
    }

    #[test]
    fn test_case_sensitivity() {
        let items = vec![item("Hello hello HELLO", 0.0, 50.0, 85.0)];
        assert_eq!(search_runs(&items, 0, "hello", SearchOptions::case_sensitive()).len(), 1);

        let found = search_runs(&items, 2, "hello", SearchOptions::case_insensitive());
        assert_eq!(found.len(), 3);
        assert_eq!(found[2].match_text, "HELLO");
        assert_eq!(found[2].page_index, 2);
        assert_eq!(found[1].position, Point::new(30.0, 50.0));
    }

    #[test]
    fn test_match_across_adjacent_runs() {
        let items = vec![item("Hel", 0.0, 50.0, 15.0), item("lo there", 15.0, 50.0, 40.0)];
        let found = search_runs(&items, 0, "Hello", SearchOptions::case_sensitive());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position, Point::new(0.0, 50.0));

        // A word gap between runs reads as a space
        let spaced = vec![item("big", 0.0, 50.0, 15.0), item("cat", 30.0, 50.0, 15.0)];
        assert_eq!(search_runs(&spaced, 0, "big cat", SearchOptions::default()).len(), 1);
    }

    #[test]
    fn test_matches_do_not_cross_lines_or_overlap() {
        let items = vec![item("ab", 0.0, 50.0, 10.0), item("ab", 10.0, 80.0, 10.0)];
        assert!(search_runs(&items, 0, "abab", SearchOptions::default()).is_empty());

        let repeated = vec![item("aaaa", 0.0, 10.0, 20.0)];
        assert_eq!(search_runs(&repeated, 0, "aa", SearchOptions::default()).len(), 2);
        assert!(search_runs(&repeated, 0, "", SearchOptions::default()).is_empty());
    }
}
