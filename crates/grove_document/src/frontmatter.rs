use serde_json::Value;
use std::collections::BTreeMap;

const BOM: char = '\u{feff}';

/// The raw frontmatter block split off a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrontmatter<'a> {
    pub yaml: String,
    pub body: &'a str,
    /// 1-based line number of the first body line.
    pub body_line: u32,
}

/// True when the document opens a frontmatter block, terminated or not.
pub fn opens_frontmatter(input: &str) -> bool {
    input
        .trim_start_matches(BOM)
        .lines()
        .next()
        .is_some_and(|line| line.trim_end() == "---")
}

/// Split YAML frontmatter from markdown content.
///
/// The first line must be `---` (optionally after a BOM); the block ends at
/// the next `---` or `...` line. Returns `None` when no terminated block exists.
pub fn split_frontmatter(input: &str) -> Option<RawFrontmatter<'_>> {
    let input = input.trim_start_matches(BOM);
    let mut lines = input.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    let mut offset = first.len();
    let mut line_no: u32 = 1;
    let mut yaml = String::new();
    for line in lines {
        line_no += 1;
        offset += line.len();
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some(RawFrontmatter {
                yaml,
                body: &input[offset..],
                body_line: line_no + 1,
            });
        }
        yaml.push_str(line);
    }
    None
}

/// Parse a YAML string into a JSON-compatible map.
///
/// Uses serde_yaml to parse, then converts to serde_json::Value
/// for uniform downstream handling.
pub fn parse_yaml_to_json_map(yaml: &str) -> Result<BTreeMap<String, Value>, String> {
    if yaml.trim().is_empty() {
        return Err("frontmatter block is empty".to_string());
    }
    let yaml_value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
    let json_value: Value = serde_json::to_value(yaml_value).map_err(|e| e.to_string())?;

    match json_value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(format!(
            "frontmatter must be a mapping, got {}",
            value_type_name(&other)
        )),
    }
}

pub fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Set a top-level scalar frontmatter field, leaving every other byte of the
/// document untouched.
///
/// An existing `key:` line (plus any indented continuation lines belonging to
/// it) is replaced; otherwise the field is inserted before the closing
/// delimiter. Returns `None` if the document has no frontmatter block.
pub fn set_frontmatter_field(input: &str, key: &str, value: &str) -> Option<String> {
    let had_bom = input.starts_with(BOM);
    let block = split_frontmatter(input)?;
    let stripped = input.trim_start_matches(BOM);
    let newline = if stripped.contains("\r\n") { "\r\n" } else { "\n" };

    let header_end = stripped.len() - block.body.len();
    let header = &stripped[..header_end];
    let mut lines: Vec<&str> = header.split_inclusive('\n').collect();
    // lines[0] is the opening delimiter, the last entry the closing one.
    let closing = lines.len() - 1;
    let new_line = format!("{key}: {value}{newline}");

    let prefix = format!("{key}:");
    let existing = (1..closing).find(|&i| lines[i].starts_with(&prefix));
    let mut out_lines: Vec<String> = Vec::with_capacity(lines.len() + 1);
    match existing {
        Some(pos) => {
            let mut skip_to = pos + 1;
            while skip_to < closing && is_continuation(lines[skip_to]) {
                skip_to += 1;
            }
            for line in &lines[..pos] {
                out_lines.push((*line).to_string());
            }
            out_lines.push(new_line);
            for line in &lines[skip_to..] {
                out_lines.push((*line).to_string());
            }
        }
        None => {
            let closing_line = lines.remove(closing);
            for line in &lines {
                out_lines.push((*line).to_string());
            }
            if let Some(last) = out_lines.last_mut() {
                if !last.ends_with('\n') {
                    last.push_str(newline);
                }
            }
            out_lines.push(new_line);
            out_lines.push(closing_line.to_string());
        }
    }

    let mut out = String::with_capacity(input.len() + key.len() + value.len() + 4);
    if had_bom {
        out.push(BOM);
    }
    for line in out_lines {
        out.push_str(&line);
    }
    out.push_str(block.body);
    Some(out)
}

fn is_continuation(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t') || line.starts_with("- ")
}
