use grove_core::TemplateError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Closed set of document kinds; each selects one template contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    Standard,
    Index,
    AlgorithmOrDataStructure,
    PromptingTechnique,
    ShellTool,
    FrameworkFeature,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        DocumentKind::Standard,
        DocumentKind::Index,
        DocumentKind::AlgorithmOrDataStructure,
        DocumentKind::PromptingTechnique,
        DocumentKind::ShellTool,
        DocumentKind::FrameworkFeature,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Standard => "standard",
            DocumentKind::Index => "index",
            DocumentKind::AlgorithmOrDataStructure => "algorithm",
            DocumentKind::PromptingTechnique => "prompting-technique",
            DocumentKind::ShellTool => "shell-tool",
            DocumentKind::FrameworkFeature => "framework-feature",
        }
    }

    pub fn is_index(self) -> bool {
        self == DocumentKind::Index
    }
}

impl FromStr for DocumentKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        match key.as_str() {
            "standard" | "concept" | "note" => Ok(DocumentKind::Standard),
            "index" | "moc" => Ok(DocumentKind::Index),
            "algorithm" | "data-structure" | "algorithm-or-data-structure" => {
                Ok(DocumentKind::AlgorithmOrDataStructure)
            }
            "prompting-technique" | "prompting" | "prompt" => Ok(DocumentKind::PromptingTechnique),
            "shell-tool" | "tool" | "cli" => Ok(DocumentKind::ShellTool),
            "framework-feature" | "framework" => Ok(DocumentKind::FrameworkFeature),
            _ => Err(TemplateError::UnknownKind(s.trim().to_string())),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DocumentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const VALUES: &'static [&'static str] = &["beginner", "intermediate", "advanced"];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(()),
        }
    }
}

/// Maturity status. Ordering follows the progression `Seed < Growing < Evergreen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Seed,
    Growing,
    Evergreen,
}

impl Status {
    pub const VALUES: &'static [&'static str] = &["seed", "growing", "evergreen"];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Seed => "seed",
            Status::Growing => "growing",
            Status::Evergreen => "evergreen",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Seed => "Seed",
            Status::Growing => "Growing",
            Status::Evergreen => "Evergreen",
        }
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seed" | "seedling" => Ok(Status::Seed),
            "growing" | "budding" => Ok(Status::Growing),
            "evergreen" => Ok(Status::Evergreen),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frontmatter value that was present but may not have parsed.
///
/// Parsing keeps invalid values so the schema validator can report them as
/// findings instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue<T> {
    Known(T),
    Invalid(String),
}

impl<T: Copy> FieldValue<T> {
    pub fn known(&self) -> Option<T> {
        match self {
            FieldValue::Known(value) => Some(*value),
            FieldValue::Invalid(_) => None,
        }
    }
}

impl<T: FromStr> FieldValue<T> {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<T>() {
            Ok(value) => FieldValue::Known(value),
            Err(_) => FieldValue::Invalid(raw.to_string()),
        }
    }
}
