use serde::{Deserialize, Serialize};

/// Location of a finding inside a vault document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
}

impl Span {
    pub fn file(file: &str) -> Self {
        Self {
            file: file.to_string(),
            line: None,
            col: None,
        }
    }

    pub fn line(file: &str, line: u32) -> Self {
        Self {
            file: file.to_string(),
            line: Some(line),
            col: None,
        }
    }
}
