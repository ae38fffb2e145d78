use thiserror::Error;

/// Errors carrying a source position, raised while reading a script or by
/// edits made to the document afterward.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HamError {
    /// The parse pass hit a structural violation. The whole parse is
    /// abandoned; no document is returned alongside this.
    #[error("Syntax error: {message} on line {line} ({file})")]
    Syntax {
        message: String,
        line: usize,
        file: String,
    },
    /// An edit after the parse pass was invalid.
    #[error("Runtime Error: {message} on line {line} ({file})")]
    Runtime {
        message: String,
        line: usize,
        file: String,
    },
}

impl HamError {
    pub(crate) fn syntax(message: impl Into<String>, line: usize, file: &str) -> Self {
        HamError::Syntax {
            message: message.into(),
            line,
            file: file.to_string(),
        }
    }

    pub(crate) fn runtime(message: impl Into<String>, line: usize, file: &str) -> Self {
        HamError::Runtime {
            message: message.into(),
            line,
            file: file.to_string(),
        }
    }

    /// Source line the error points at, 1-based. Zero when the error did not
    /// originate from a source line.
    pub fn line(&self) -> usize {
        match self {
            HamError::Syntax { line, .. } | HamError::Runtime { line, .. } => *line,
        }
    }

    pub fn file(&self) -> &str {
        match self {
            HamError::Syntax { file, .. } | HamError::Runtime { file, .. } => file,
        }
    }
}

/// Recursive `$variable` expansion went past the depth limit, which means a
/// variable refers to itself directly or through a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("recursion limit exceeded while expanding '${name}'")]
pub struct FillError {
    /// Variable being expanded when the limit was hit.
    pub name: String,
}

/// Malformed `key = value` instruction-argument text. Not tied to a source
/// line; the argument text itself is quoted back in the message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgError {
    #[error("unable to parse key values: ({text})")]
    MissingEquals { text: String },
    #[error("unterminated quoted value in key values: ({text})")]
    UnterminatedQuote { text: String },
    #[error("trailing backslash in key values: ({text})")]
    TrailingEscape { text: String },
    #[error("duplicate key \"{key}\" in key values: ({text})")]
    DuplicateKey { key: String, text: String },
    #[error(transparent)]
    Fill(#[from] FillError),
}

/// Failure while producing the JSON snapshot of a document.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Fill(#[from] FillError),
    #[error("could not encode document as JSON: {0}")]
    Json(#[from] serde_json::Error),
}
