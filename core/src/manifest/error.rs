use std::fmt;

/// Integrity violation found while assembling a manifest.
///
/// These are configuration defects, not runtime conditions: the caller is
/// expected to abort with the diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    DuplicateRule {
        rule: String,
    },
    InvalidName {
        kind: &'static str,
        name: String,
    },
    UnknownRule {
        rule: String,
        output: String,
        origin: Option<String>,
    },
    DuplicateOutput {
        output: String,
        origin: Option<String>,
    },
    MalformedPath {
        path: String,
        output: String,
        origin: Option<String>,
    },
    MalformedValue {
        name: String,
        context: String,
    },
    UndeclaredOrderOnly {
        dependency: String,
        output: String,
        origin: Option<String>,
    },
}

impl ManifestError {
    /// Matrix cell (or other origin label) of the offending edge, if known.
    pub fn origin(&self) -> Option<&str> {
        match self {
            ManifestError::UnknownRule { origin, .. }
            | ManifestError::DuplicateOutput { origin, .. }
            | ManifestError::MalformedPath { origin, .. }
            | ManifestError::UndeclaredOrderOnly { origin, .. } => origin.as_deref(),
            _ => None,
        }
    }
}

struct EdgeLabel<'a>(&'a str, Option<&'a str>);

impl fmt::Display for EdgeLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            Some(origin) => write!(f, "build edge `{}` for {}", self.0, origin),
            None => write!(f, "build edge `{}`", self.0),
        }
    }
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::DuplicateRule { rule } => write!(f, "rule `{}` is declared more than once", rule),
            ManifestError::InvalidName { kind, name } => write!(f, "invalid {} name `{}`", kind, name),
            ManifestError::UnknownRule { rule, output, origin } => write!(
                f,
                "{} references rule `{}` which is not declared before it",
                EdgeLabel(output, origin.as_deref()),
                rule
            ),
            ManifestError::DuplicateOutput { output, origin } => write!(
                f,
                "{} produces an output that another edge already produces",
                EdgeLabel(output, origin.as_deref())
            ),
            ManifestError::MalformedPath { path, output, origin } => write!(
                f,
                "{} contains malformed path `{}` (empty, whitespace or reserved character)",
                EdgeLabel(output, origin.as_deref()),
                path.escape_debug()
            ),
            ManifestError::MalformedValue { name, context } => {
                write!(f, "value of `{}` in {} spans multiple lines", name, context)
            }
            ManifestError::UndeclaredOrderOnly {
                dependency,
                output,
                origin,
            } => write!(
                f,
                "{} has order-only dependency `{}` which no build edge produces",
                EdgeLabel(output, origin.as_deref()),
                dependency
            ),
        }
    }
}

impl std::error::Error for ManifestError {}
