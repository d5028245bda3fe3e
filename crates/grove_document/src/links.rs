//! Outbound references found in a document body.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// A parsed wikilink token (`[[target]]`, `[[target|alias]]`, `[[target#heading]]`, `![[embed]]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiLink {
    pub raw: String,
    pub target: String,
    pub alias: Option<String>,
    pub heading: Option<String>,
    pub embed: bool,
    /// 1-based line relative to the whole file.
    pub line: u32,
    /// Index into `Document::sections`; `None` for the preamble.
    pub section: Option<usize>,
}

impl WikiLink {
    /// Text a reader sees for this link.
    pub fn display_text(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalLink {
    pub url: String,
    pub line: u32,
    pub section: Option<usize>,
}

/// Parses the inner content of a wikilink into `(target, alias, heading)`.
pub fn parse_wikilink_inner(inner: &str) -> Option<(String, Option<String>, Option<String>)> {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut parts = trimmed.splitn(2, '|');
    // Inside a table the alias pipe is written `\|`.
    let left = parts.next()?.trim().trim_end_matches('\\').trim_end();
    let alias = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let mut left_parts = left.splitn(2, '#');
    let target = left_parts.next()?.trim().to_string();
    let heading = left_parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    if target.is_empty() {
        return None;
    }
    Some((target, alias, heading))
}

/// A wikilink token located within a single line, as byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiToken {
    pub start: usize,
    pub end: usize,
    pub inner_start: usize,
    pub inner_end: usize,
    pub embed: bool,
}

/// Locate every `[[...]]` token in one line. `start` includes a leading `!`
/// for embeds, `end` is exclusive.
pub fn find_wikilink_tokens(line: &str) -> Vec<WikiToken> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i + 1 < bytes.len() {
        if bytes[i] == b'[' && bytes[i + 1] == b'[' {
            let embed = i > 0 && bytes[i - 1] == b'!';
            let inner_start = i + 2;
            let mut j = inner_start;
            let mut end = None;
            while j + 1 < bytes.len() {
                if bytes[j] == b']' && bytes[j + 1] == b']' {
                    end = Some(j);
                    break;
                }
                j += 1;
            }
            if let Some(inner_end) = end {
                out.push(WikiToken {
                    start: if embed { i - 1 } else { i },
                    end: inner_end + 2,
                    inner_start,
                    inner_end,
                    embed,
                });
                i = inner_end + 2;
                continue;
            }
        }
        i += 1;
    }
    out
}

pub(crate) fn extract_wikilinks(line: &str, line_no: u32, section: Option<usize>) -> Vec<WikiLink> {
    find_wikilink_tokens(line)
        .into_iter()
        .filter_map(|token| {
            let inner = &line[token.inner_start..token.inner_end];
            let (target, alias, heading) = parse_wikilink_inner(inner)?;
            Some(WikiLink {
                raw: line[token.start..token.end].to_string(),
                target,
                alias,
                heading,
                embed: token.embed,
                line: line_no,
                section,
            })
        })
        .collect()
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:\]\(\s*([^)\s]+)[^)]*\))|(https?://[^\s<>()\[\]"'`]+)"#)
            .expect("url pattern compiles")
    })
}

/// External references on one prose line: markdown link targets `[x](target)`
/// and bare `http(s)://` URLs. Wikilinks are not external references.
pub(crate) fn extract_external_links(
    line: &str,
    line_no: u32,
    section: Option<usize>,
) -> Vec<ExternalLink> {
    let mut out = Vec::new();
    for caps in url_regex().captures_iter(line) {
        let url = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':']));
        if let Some(url) = url {
            if url.starts_with('#') {
                continue;
            }
            out.push(ExternalLink {
                url: url.to_string(),
                line: line_no,
                section,
            });
        }
    }
    out
}
