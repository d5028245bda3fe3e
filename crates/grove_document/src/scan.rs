//! Line-level scanning of a Markdown body: fenced code, callouts, tables,
//! headings and prose word counts.
//!
//! Everything here is fence-aware: content inside a fenced block never counts
//! as a heading, callout, table or prose word.

use serde::Serialize;

/// Languages whose fenced blocks count as worked examples.
///
/// Diagram and plain-text fences (`mermaid`, `text`, `plaintext`) are
/// deliberately absent.
pub const EXAMPLE_LANGUAGES: &[&str] = &[
    "bash", "sh", "shell", "zsh", "fish", "console", "powershell", "ps1", "python", "py", "rust",
    "rs", "javascript", "js", "jsx", "typescript", "ts", "tsx", "go", "java", "kotlin", "swift",
    "c", "cpp", "c++", "csharp", "cs", "ruby", "rb", "php", "sql", "json", "yaml", "yml", "toml",
    "html", "css", "scss", "lua", "haskell", "scala", "elixir", "r", "dockerfile", "makefile",
    "nix", "vim", "prompt", "markdown", "md", "xml", "graphql", "regex", "awk", "sed", "jq",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineClass<'a> {
    Prose(&'a str),
    FenceOpen { lang: Option<&'a str> },
    Code,
    FenceClose,
}

struct Fence {
    marker: char,
    len: usize,
}

fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    Some((marker, len, trimmed[len..].trim()))
}

/// Classify every line of `body`, tracking fenced code state.
pub(crate) fn classify_lines(body: &str) -> Vec<LineClass<'_>> {
    let mut out = Vec::new();
    let mut open: Option<Fence> = None;
    for line in body.lines() {
        match (&open, fence_marker(line)) {
            (None, Some((marker, len, info))) => {
                let lang = info.split_whitespace().next().map(|l| l.trim_matches('{'));
                let lang = lang.filter(|l| !l.is_empty());
                open = Some(Fence { marker, len });
                out.push(LineClass::FenceOpen { lang });
            }
            (None, None) => out.push(LineClass::Prose(line)),
            (Some(fence), Some((marker, len, info)))
                if marker == fence.marker && len >= fence.len && info.is_empty() =>
            {
                open = None;
                out.push(LineClass::FenceClose);
            }
            (Some(_), _) => out.push(LineClass::Code),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FencedBlock {
    pub lang: Option<String>,
    /// 1-based line of the opening fence, relative to the whole file.
    pub line: u32,
}

impl FencedBlock {
    pub fn is_example(&self, extra_languages: &[String]) -> bool {
        let Some(lang) = self.lang.as_deref() else {
            return false;
        };
        let lang = lang.to_ascii_lowercase();
        EXAMPLE_LANGUAGES.contains(&lang.as_str())
            || extra_languages.iter().any(|l| l.eq_ignore_ascii_case(&lang))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalloutStyle {
    Tip,
    Warning,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Callout {
    pub callout_type: String,
    pub style: CalloutStyle,
    pub line: u32,
}

const TIP_CALLOUTS: &[&str] = &["tip", "hint", "important", "success", "check", "done"];
const WARNING_CALLOUTS: &[&str] = &[
    "warning", "caution", "attention", "danger", "error", "bug", "failure", "fail",
];

/// Parse an Obsidian callout opener such as `> [!tip] Title` or `> [!warning]-`.
pub(crate) fn parse_callout(line: &str) -> Option<(String, CalloutStyle)> {
    let rest = line.trim_start().strip_prefix('>')?.trim_start();
    let rest = rest.strip_prefix("[!")?;
    let end = rest.find(']')?;
    let callout_type = rest[..end].trim().to_ascii_lowercase();
    if callout_type.is_empty() {
        return None;
    }
    let style = if TIP_CALLOUTS.contains(&callout_type.as_str()) {
        CalloutStyle::Tip
    } else if WARNING_CALLOUTS.contains(&callout_type.as_str()) {
        CalloutStyle::Warning
    } else {
        CalloutStyle::Other
    };
    Some((callout_type, style))
}

/// Header row of a Markdown pipe table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableHeader {
    pub cells: Vec<String>,
    pub line: u32,
}

pub fn split_table_row(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') {
        return None;
    }
    let inner = trimmed.trim_start_matches('|').trim_end_matches('|');
    Some(split_cells(inner))
}

/// Split on `|` except inside `[[...]]`, where `|` separates a wikilink alias.
fn split_cells(inner: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '[' if chars.peek() == Some(&'[') => {
                chars.next();
                depth += 1;
                current.push_str("[[");
            }
            ']' if chars.peek() == Some(&']') && depth > 0 => {
                chars.next();
                depth -= 1;
                current.push_str("]]");
            }
            '\\' if chars.peek() == Some(&'|') => {
                chars.next();
                current.push('|');
            }
            '|' if depth == 0 => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

pub fn is_table_separator(line: &str) -> bool {
    let Some(cells) = split_table_row(line) else {
        return false;
    };
    !cells.is_empty()
        && cells.iter().all(|cell| {
            let c = cell.trim();
            !c.is_empty() && c.contains('-') && c.chars().all(|ch| matches!(ch, '-' | ':' | ' '))
        })
}

/// An ATX heading (`#` to `######`) outside fenced code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub line: u32,
}

pub(crate) fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    let text = rest.trim();
    let text = match text.trim_end_matches('#') {
        stripped if stripped.is_empty() || stripped.ends_with(' ') => stripped.trim(),
        _ => text,
    };
    Some((hashes as u8, text))
}

pub(crate) fn count_words(line: &str) -> usize {
    line.split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .count()
}

/// Lowercased, hyphenated heading slug used for `[[doc#heading]]` checks.
pub fn heading_slug(text: &str) -> String {
    let mut out = String::new();
    let mut last_dash = false;
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_dash = false;
        } else if (c.is_whitespace() || c == '-' || c == '_') && !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
