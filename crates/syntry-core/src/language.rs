//! Programming language definitions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Languages the scanner can parse. `Other` is anything without a
/// registered grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Go,
    Rust,
    Ruby,
    C,
    Cpp,
    Php,
    Terraform,
    Yaml,
    Other,
}

impl Language {
    /// Create a Language from a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "py" => Language::Python,
            "js" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "rb" => Language::Ruby,
            "c" | "h" => Language::C,
            "cpp" | "cxx" | "cc" | "hpp" | "hxx" => Language::Cpp,
            "php" | "php3" | "php4" | "php5" | "phtml" => Language::Php,
            "tf" | "hcl" => Language::Terraform,
            "yml" | "yaml" => Language::Yaml,
            _ => Language::Other,
        }
    }

    /// Create a Language from a filename.
    #[must_use]
    pub fn from_filename(filename: &str) -> Self {
        if let Some(ext) = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
        {
            Self::from_extension(ext)
        } else {
            Language::Other
        }
    }

    /// Get the display name for this language.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Java => "Java",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::Ruby => "Ruby",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Php => "PHP",
            Language::Terraform => "Terraform",
            Language::Yaml => "YAML",
            Language::Other => "Other",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s_lower = s.to_lowercase();
        match s_lower.as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" | "tsx" => Ok(Language::TypeScript),
            "java" => Ok(Language::Java),
            "go" => Ok(Language::Go),
            "rust" | "rs" => Ok(Language::Rust),
            "ruby" | "rb" => Ok(Language::Ruby),
            "c" => Ok(Language::C),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            "php" => Ok(Language::Php),
            "terraform" | "tf" | "hcl" => Ok(Language::Terraform),
            "yaml" | "yml" => Ok(Language::Yaml),
            "other" => Ok(Language::Other),
            _ => Err(format!(
                "Unknown language: '{}'. Supported languages: python, javascript, typescript, java, go, rust, ruby, c, cpp, php, terraform, yaml",
                s
            )),
        }
    }
}
