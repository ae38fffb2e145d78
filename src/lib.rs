//! Reader and writer for the line-oriented Ham dialogue-script format.
//!
//! A script is parsed in one pass into a [`Document`] of [`Scene`]s holding
//! typed [`Line`]s. The document can be queried and edited through accessors
//! and serialized back to script text with `to_string()`, or snapshotted as
//! JSON for downstream tooling with [`Document::to_json`].

mod args;
mod document;
mod error;
mod export;
mod line;
mod parser;
mod scene;
mod subst;

pub use document::Document;
pub use error::{ArgError, ExportError, FillError, HamError};
pub use export::{DocumentExport, LineExport, SceneExport, VariableExport};
pub use line::{
    BlankLine, CommentLine, InstructionLine, Line, LineKind, ProcessorLine, TextLine, VariableLine,
};
pub use scene::Scene;
pub use subst::MAX_FILL_DEPTH;

/// Parses script text into a [`Document`]. `file_name` labels the source in
/// error messages. Any syntax error abandons the parse; no partial document
/// is returned.
pub fn parse_str(text: &str, file_name: &str) -> Result<Document, HamError> {
    parse_lines(text.lines(), file_name)
}

/// Parses an already-split sequence of raw lines, trailing newlines optional.
pub fn parse_lines<I, S>(lines: I, file_name: &str) -> Result<Document, HamError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = parser::Parser::new(file_name);
    for (index, line) in lines.into_iter().enumerate() {
        parser.read_line(index + 1, line.as_ref())?;
    }
    Ok(parser.finish())
}
