use std::path::Path;

/// Syntax of a document, used to derive its base scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    C,
    Cpp,
    Ruby,
    Shell,
    Markdown,
    Json,
    Toml,
    PlainText,
}

impl Syntax {
    /// Detect syntax from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Syntax::Rust,
            "py" | "pyw" => Syntax::Python,
            "js" | "mjs" | "cjs" | "jsx" => Syntax::JavaScript,
            "ts" | "tsx" => Syntax::TypeScript,
            "go" => Syntax::Go,
            "java" => Syntax::Java,
            "c" | "h" => Syntax::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Syntax::Cpp,
            "rb" => Syntax::Ruby,
            "sh" | "bash" | "zsh" => Syntax::Shell,
            "md" | "markdown" => Syntax::Markdown,
            "json" => Syntax::Json,
            "toml" => Syntax::Toml,
            _ => Syntax::PlainText,
        }
    }

    /// Detect syntax from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Syntax::PlainText)
    }

    /// Base scope name, e.g. `source.rust`
    pub fn scope(self) -> &'static str {
        match self {
            Syntax::Rust => "source.rust",
            Syntax::Python => "source.python",
            Syntax::JavaScript => "source.js",
            Syntax::TypeScript => "source.ts",
            Syntax::Go => "source.go",
            Syntax::Java => "source.java",
            Syntax::C => "source.c",
            Syntax::Cpp => "source.c++",
            Syntax::Ruby => "source.ruby",
            Syntax::Shell => "source.shell",
            Syntax::Markdown => "text.html.markdown",
            Syntax::Json => "source.json",
            Syntax::Toml => "source.toml",
            Syntax::PlainText => "text.plain",
        }
    }
}
