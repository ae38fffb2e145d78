//! Typed representation of one logical script line.

use std::fmt;

/// Discriminant for [`Line`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Comment,
    Blank,
    Variable,
    Instruction,
    Processor,
    Text,
}

impl LineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LineKind::Comment => "comment",
            LineKind::Blank => "blank",
            LineKind::Variable => "variable",
            LineKind::Instruction => "instruction",
            LineKind::Processor => "processor",
            LineKind::Text => "text",
        }
    }
}

/// A full-line `# comment`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentLine {
    pub(crate) body: String,
    pub(crate) time: Option<f64>,
    pub(crate) line_number: Option<usize>,
}

impl CommentLine {
    pub fn new(body: impl Into<String>) -> Self {
        CommentLine {
            body: body.into().trim_end().to_string(),
            time: None,
            line_number: None,
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into().trim_end().to_string();
    }

    /// Speech time in force when the comment was read.
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    pub fn line_number(&self) -> Option<usize> {
        self.line_number
    }
}

/// A line that was empty after trimming.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlankLine {
    pub(crate) line_number: Option<usize>,
}

impl BlankLine {
    pub fn line_number(&self) -> Option<usize> {
        self.line_number
    }
}

/// A `NAME = value` assignment. Names are canonicalized to uppercase; a
/// leading underscore marks the variable as local to its scene.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableLine {
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) line_number: Option<usize>,
    pub(crate) comment: Option<String>,
}

impl VariableLine {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        VariableLine {
            name: name.into().trim().to_uppercase(),
            value: value.into().trim().to_string(),
            line_number: None,
            comment: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into().trim().to_uppercase();
    }

    /// The stored value, which may itself contain `$references`.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into().trim().to_string();
    }

    /// Underscore-prefixed names resolve only inside their own scene.
    pub fn is_local(&self) -> bool {
        self.name.starts_with('_')
    }

    pub fn line_number(&self) -> Option<usize> {
        self.line_number
    }
}

/// A `!NAME argument` directive. `FLAG`, `UNFLAG` and `SPEECHTIME` are
/// interpreted by the parser; other names pass through uninterpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionLine {
    pub(crate) name: String,
    pub(crate) text: String,
    pub(crate) time: Option<f64>,
    pub(crate) line_number: Option<usize>,
    pub(crate) comment: Option<String>,
}

impl InstructionLine {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        InstructionLine {
            name: name.into().trim().to_uppercase(),
            text: text.into().trim().to_string(),
            time: None,
            line_number: None,
            comment: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into().trim().to_uppercase();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into().trim().to_string();
    }

    /// Speech time in force when the instruction was read.
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    pub fn line_number(&self) -> Option<usize> {
        self.line_number
    }
}

/// Internal bookkeeping directive: a `%name argument` metadata line, or the
/// record of a `== name ==` scene boundary. Never part of the export.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorLine {
    pub(crate) name: String,
    pub(crate) text: String,
    pub(crate) boundary: bool,
    pub(crate) line_number: Option<usize>,
    pub(crate) comment: Option<String>,
}

impl ProcessorLine {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True for the synthetic record of a `== name ==` boundary.
    pub fn is_scene_boundary(&self) -> bool {
        self.boundary
    }

    pub fn line_number(&self) -> Option<usize> {
        self.line_number
    }
}

/// A spoken dialogue line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub(crate) speaker: String,
    pub(crate) text: String,
    pub(crate) action: Option<String>,
    pub(crate) flags: Vec<String>,
    pub(crate) time: Option<f64>,
    pub(crate) duration: Option<f64>,
    pub(crate) padding: Option<f64>,
    pub(crate) line_number: Option<usize>,
    pub(crate) comment: Option<String>,
}

impl TextLine {
    /// Resolved display name of the speaker.
    pub fn speaker(&self) -> &str {
        &self.speaker
    }

    pub fn set_speaker(&mut self, speaker: impl Into<String>) {
        self.speaker = speaker.into().trim().to_string();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Leading bracketed `[action]` annotation, stripped from the text.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn set_action(&mut self, action: impl Into<String>) {
        self.action = Some(action.into());
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn set_flags(&mut self, flags: Vec<String>) {
        self.flags = flags;
    }

    pub fn time(&self) -> Option<f64> {
        self.time
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn padding(&self) -> Option<f64> {
        self.padding
    }

    pub fn line_number(&self) -> Option<usize> {
        self.line_number
    }
}

/// One logical line of a script. Continuations are merged into the text
/// payload of the line they extend rather than forming a line of their own.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Comment(CommentLine),
    Blank(BlankLine),
    Variable(VariableLine),
    Instruction(InstructionLine),
    Processor(ProcessorLine),
    Text(TextLine),
}

impl Line {
    pub fn kind(&self) -> LineKind {
        match self {
            Line::Comment(_) => LineKind::Comment,
            Line::Blank(_) => LineKind::Blank,
            Line::Variable(_) => LineKind::Variable,
            Line::Instruction(_) => LineKind::Instruction,
            Line::Processor(_) => LineKind::Processor,
            Line::Text(_) => LineKind::Text,
        }
    }

    /// 1-based source line, or `None` for lines created after the parse.
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Line::Comment(line) => line.line_number,
            Line::Blank(line) => line.line_number,
            Line::Variable(line) => line.line_number,
            Line::Instruction(line) => line.line_number,
            Line::Processor(line) => line.line_number,
            Line::Text(line) => line.line_number,
        }
    }

    /// Trailing inline comment, if one was captured for this line.
    pub fn comment(&self) -> Option<&str> {
        match self {
            Line::Comment(_) | Line::Blank(_) => None,
            Line::Variable(line) => line.comment.as_deref(),
            Line::Instruction(line) => line.comment.as_deref(),
            Line::Processor(line) => line.comment.as_deref(),
            Line::Text(line) => line.comment.as_deref(),
        }
    }

    /// Variable name, instruction keyword or speaker, depending on variant.
    pub fn name(&self) -> Option<&str> {
        match self {
            Line::Comment(_) => Some("#"),
            Line::Blank(_) => None,
            Line::Variable(line) => Some(&line.name),
            Line::Instruction(line) => Some(&line.name),
            Line::Processor(line) => Some(&line.name),
            Line::Text(line) => Some(&line.speaker),
        }
    }

    /// Main text payload of the line.
    pub fn text(&self) -> Option<&str> {
        match self {
            Line::Comment(line) => Some(&line.body),
            Line::Blank(_) => None,
            Line::Variable(line) => Some(&line.value),
            Line::Instruction(line) => Some(&line.text),
            Line::Processor(line) => Some(&line.text),
            Line::Text(line) => Some(&line.text),
        }
    }

    /// Speech time attached to the line, where the variant carries one.
    pub fn time(&self) -> Option<f64> {
        match self {
            Line::Comment(line) => line.time,
            Line::Instruction(line) => line.time,
            Line::Text(line) => line.time,
            Line::Blank(_) | Line::Variable(_) | Line::Processor(_) => None,
        }
    }

    /// Extends the text payload with a continuation. Fails for blank lines,
    /// which have no payload to extend.
    pub(crate) fn append_text(&mut self, extra: &str) -> bool {
        let payload = match self {
            Line::Blank(_) => return false,
            Line::Comment(line) => &mut line.body,
            Line::Variable(line) => &mut line.value,
            Line::Instruction(line) => &mut line.text,
            Line::Processor(line) => &mut line.text,
            Line::Text(line) => &mut line.text,
        };
        payload.push('\n');
        payload.push_str(extra);
        true
    }

    /// Reconstructs the source form of the line from its current payload.
    /// Multi-line payloads re-serialize as `+   ` continuation lines, and a
    /// captured inline comment is re-attached at the end.
    pub fn raw(&self) -> String {
        let base = match self {
            Line::Comment(line) => format!("#{}", line.body),
            Line::Blank(_) => String::new(),
            Line::Variable(line) => format!("{} = {}", line.name, line.value),
            Line::Instruction(line) => {
                if line.text.is_empty() {
                    format!("!{}", line.name)
                } else {
                    format!("!{} {}", line.name, line.text)
                }
            }
            Line::Processor(line) => {
                if line.boundary {
                    format!("== {} ==", line.text)
                } else if line.text.is_empty() {
                    format!("%{}", line.name)
                } else {
                    format!("%{} {}", line.name, line.text)
                }
            }
            Line::Text(line) => {
                let speaker = capitalize(&line.speaker);
                match &line.action {
                    Some(action) => format!("{}: [{}] {}", speaker, action, line.text),
                    None => format!("{}: {}", speaker, line.text),
                }
            }
        };

        let mut out = base.split('\n').collect::<Vec<_>>().join("\n+   ");
        if let Some(comment) = self.comment() {
            out.push_str(" #");
            out.push_str(comment);
        }
        out
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_line(speaker: &str, text: &str) -> TextLine {
        TextLine {
            speaker: speaker.to_string(),
            text: text.to_string(),
            action: None,
            flags: Vec::new(),
            time: None,
            duration: None,
            padding: None,
            line_number: None,
            comment: None,
        }
    }

    #[test]
    fn variable_raw_rebuilds_assignment() {
        let line = Line::Variable(VariableLine::new("tom", " $VOICE_A "));
        assert_eq!(line.raw(), "TOM = $VOICE_A");
    }

    #[test]
    fn instruction_raw_omits_trailing_space_without_argument() {
        assert_eq!(
            Line::Instruction(InstructionLine::new("unflag", "")).raw(),
            "!UNFLAG"
        );
        assert_eq!(
            Line::Instruction(InstructionLine::new("flag", "angry")).raw(),
            "!FLAG angry"
        );
    }

    #[test]
    fn text_raw_capitalizes_speaker_and_keeps_action() {
        let mut line = text_line("TOM", "Hello there.");
        assert_eq!(Line::Text(line.clone()).raw(), "Tom: Hello there.");

        line.set_action("to himself");
        assert_eq!(Line::Text(line).raw(), "Tom: [to himself] Hello there.");
    }

    #[test]
    fn raw_reflects_mutation() {
        let mut line = Line::Text(text_line("alice", "Hi."));
        if let Line::Text(text) = &mut line {
            text.set_text("Bye.");
            text.set_speaker("bob");
        }
        assert_eq!(line.raw(), "Bob: Bye.");
    }

    #[test]
    fn continuations_reserialize_as_plus_lines() {
        let mut line = Line::Text(text_line("alice", "Hello"));
        assert!(line.append_text("world"));
        assert_eq!(line.raw(), "Alice: Hello\n+   world");
    }

    #[test]
    fn blank_lines_cannot_be_continued() {
        let mut line = Line::Blank(BlankLine::default());
        assert!(!line.append_text("more"));
    }

    #[test]
    fn scene_boundary_raw_uses_boundary_syntax() {
        let line = Line::Processor(ProcessorLine {
            name: "scene".to_string(),
            text: "Kitchen".to_string(),
            boundary: true,
            line_number: None,
            comment: None,
        });
        assert_eq!(line.raw(), "== Kitchen ==");

        let line = Line::Processor(ProcessorLine {
            name: "t".to_string(),
            text: "1.5:0.2,0.3".to_string(),
            boundary: false,
            line_number: None,
            comment: None,
        });
        assert_eq!(line.raw(), "%t 1.5:0.2,0.3");
    }

    #[test]
    fn inline_comment_is_reattached() {
        let mut var = VariableLine::new("X", "1");
        var.comment = Some("speed".to_string());
        assert_eq!(Line::Variable(var).raw(), "X = 1 #speed");
    }

    #[test]
    fn comment_and_blank_raw() {
        assert_eq!(Line::Comment(CommentLine::new(" a note")).raw(), "# a note");
        assert_eq!(Line::Blank(BlankLine::default()).raw(), "");
    }
}
