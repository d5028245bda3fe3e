use serde::{Serialize, Serializer};
use std::fmt;

/// Controlled vocabulary for level-2 section headings.
///
/// Headings outside the vocabulary are kept as `Other` with their original
/// text and never satisfy a template requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionTag {
    Summary,
    Theory,
    Complexity,
    QuickReference,
    Examples,
    Patterns,
    EdgeCases,
    Pitfalls,
    BestPractices,
    Usage,
    Flags,
    RelatedTopics,
    References,
    Other(String),
}

impl SectionTag {
    /// Map heading text to a tag. Matching ignores case, a leading ordinal
    /// (`2. `), leading emoji/punctuation and a trailing colon.
    pub fn from_heading(heading: &str) -> SectionTag {
        let key = heading_key(heading);
        match key.as_str() {
            "summary" | "overview" | "tl;dr" | "tldr" => SectionTag::Summary,
            "theory" | "core concepts" | "concepts" | "how it works" | "background" => {
                SectionTag::Theory
            }
            "complexity" | "complexity analysis" | "time complexity" => SectionTag::Complexity,
            "quick reference" | "quickreference" | "cheat sheet" | "cheatsheet" => {
                SectionTag::QuickReference
            }
            "examples" | "example" | "code examples" | "worked examples" => SectionTag::Examples,
            "patterns" | "common patterns" | "usage patterns" => SectionTag::Patterns,
            "edge cases" | "edgecases" | "gotchas" | "edge cases and gotchas" => {
                SectionTag::EdgeCases
            }
            "pitfalls" | "common pitfalls" | "common mistakes" => SectionTag::Pitfalls,
            "best practices" => SectionTag::BestPractices,
            "usage" | "basic usage" => SectionTag::Usage,
            "flags" | "options" | "common flags" | "flags and options" => SectionTag::Flags,
            "related topics" | "relatedtopics" | "related" | "see also" => {
                SectionTag::RelatedTopics
            }
            "references" | "sources" | "further reading" | "resources" => SectionTag::References,
            _ => SectionTag::Other(heading.trim().to_string()),
        }
    }

    /// Parse a tag name as written in configuration (`Quick Reference`,
    /// `quick-reference`, `QuickReference`). Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<SectionTag> {
        let spaced = split_camel(name).replace(['-', '_'], " ");
        match SectionTag::from_heading(&spaced) {
            SectionTag::Other(_) => None,
            tag => Some(tag),
        }
    }

    /// Canonical heading text, used in messages and generated skeletons.
    pub fn label(&self) -> &str {
        match self {
            SectionTag::Summary => "Summary",
            SectionTag::Theory => "Theory",
            SectionTag::Complexity => "Complexity",
            SectionTag::QuickReference => "Quick Reference",
            SectionTag::Examples => "Examples",
            SectionTag::Patterns => "Patterns",
            SectionTag::EdgeCases => "Edge Cases",
            SectionTag::Pitfalls => "Pitfalls",
            SectionTag::BestPractices => "Best Practices",
            SectionTag::Usage => "Usage",
            SectionTag::Flags => "Flags",
            SectionTag::RelatedTopics => "Related Topics",
            SectionTag::References => "References",
            SectionTag::Other(text) => text,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SectionTag::Other(_))
    }
}

impl fmt::Display for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for SectionTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

fn heading_key(heading: &str) -> String {
    let trimmed = heading
        .trim()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end_matches(':')
        .trim();
    // Leading ordinals such as "2." or "3)".
    let without_ordinal = match trimmed.split_once(|c: char| c == '.' || c == ')') {
        Some((num, rest)) if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()) => {
            rest.trim()
        }
        _ => trimmed,
    };
    without_ordinal
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" & ", " and ")
        .to_lowercase()
}

fn split_camel(name: &str) -> String {
    let mut out = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = c.is_lowercase();
        out.push(c);
    }
    out
}

/// One level-2 section of a document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub tag: SectionTag,
    /// Heading text as written.
    pub heading: String,
    /// 1-based line of the heading, relative to the whole file.
    pub line: u32,
    /// Everything up to the next level-2 heading, subsections included.
    pub body: String,
}

impl Section {
    /// True when the section has no prose or code content at all.
    pub fn is_empty(&self) -> bool {
        !self.body.chars().any(char::is_alphanumeric)
    }
}
