//! Single-pass classification of raw script lines into a [`Document`].
//!
//! Classification is an ordered cascade: the first rule that matches a line
//! wins. Parser state (open scene, current speaker, flags, speech timing)
//! threads through one instance per parse; nothing is global.

use crate::document::Document;
use crate::error::HamError;
use crate::line::{
    BlankLine, CommentLine, InstructionLine, Line, ProcessorLine, TextLine, VariableLine,
};
use crate::scene::Scene;

pub(crate) struct Parser<'a> {
    file_name: &'a str,
    /// Scenes already closed by a boundary, in first-appearance order.
    scenes: Vec<Scene>,
    /// The scene currently receiving lines.
    scene: Scene,
    speaker: Option<String>,
    flags: Vec<String>,
    time: Option<f64>,
    duration: Option<f64>,
    padding: Option<f64>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(file_name: &'a str) -> Self {
        Parser {
            file_name,
            scenes: Vec::new(),
            scene: Scene::anonymous(),
            speaker: None,
            flags: Vec::new(),
            time: None,
            duration: None,
            padding: None,
        }
    }

    /// Closes the open scene and hands back the finished document. The open
    /// scene is always kept, even when empty or anonymous.
    pub(crate) fn finish(mut self) -> Document {
        self.scenes.push(self.scene);
        Document::from_parts(self.file_name.to_string(), self.scenes)
    }

    pub(crate) fn read_line(&mut self, line_number: usize, raw: &str) -> Result<(), HamError> {
        let raw = if line_number == 1 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };
        let trimmed = raw.trim();

        // Full-line comment.
        if let Some(body) = trimmed.strip_prefix('#') {
            self.scene.push(Line::Comment(CommentLine {
                body: body.to_string(),
                time: self.time,
                line_number: Some(line_number),
            }));
            return Ok(());
        }

        // Blank line.
        if trimmed.is_empty() {
            self.scene.push(Line::Blank(BlankLine {
                line_number: Some(line_number),
            }));
            return Ok(());
        }

        // Trailing inline comment, captured for every structural rule below.
        // Continuations are the exception: their payload keeps any `#` text,
        // since they extend an existing line instead of forming one.
        let (content, comment) = split_inline_comment(trimmed);

        // Variable assignment. Checked before the speaker rule, so a line
        // matching both is an assignment.
        if let Some((name, value)) = match_assignment(content) {
            if self.find_variable(name).is_some() {
                return Err(HamError::syntax(
                    "Variable already exists",
                    line_number,
                    self.file_name,
                ));
            }
            self.scene.push(Line::Variable(VariableLine {
                name: name.to_uppercase(),
                value: value.to_string(),
                line_number: Some(line_number),
                comment,
            }));
            return Ok(());
        }

        // Scene boundary.
        if let Some(name) = match_scene(content) {
            self.speaker = None;
            self.flags.clear();
            let finished = std::mem::replace(&mut self.scene, Scene::named(name));
            self.scenes.push(finished);
            self.scene.push(Line::Processor(ProcessorLine {
                name: "scene".to_string(),
                text: name.to_string(),
                boundary: true,
                line_number: Some(line_number),
                comment,
            }));
            return Ok(());
        }

        // Processor directive.
        if let Some((name, arg)) = match_directive(content, '%') {
            let is_timing = name.eq_ignore_ascii_case("t");
            self.scene.push(Line::Processor(ProcessorLine {
                name: name.to_string(),
                text: arg.to_string(),
                boundary: false,
                line_number: Some(line_number),
                comment,
            }));
            if is_timing {
                self.read_speech_time(arg, line_number)?;
            }
            return Ok(());
        }

        // Bang instruction.
        if let Some((name, arg)) = match_directive(content, '!') {
            return self.read_instruction(name, arg, line_number, comment);
        }

        // Continuation of the previous line.
        if let Some(rest) = trimmed.strip_prefix('+') {
            let captured = rest.trim_start();
            let appended = self
                .scene
                .last_line_mut()
                .map(|line| line.append_text(captured))
                .unwrap_or(false);
            if !appended {
                return Err(HamError::syntax(
                    "No line to continue",
                    line_number,
                    self.file_name,
                ));
            }
            return Ok(());
        }

        // Speaker change; the remainder carries on as dialogue text.
        let mut text = content;
        if let Some((speaker_name, rest)) = content.split_once(':') {
            let speaker_name = speaker_name.trim();
            if !speaker_name.is_empty() {
                self.speaker = Some(self.resolve_speaker(speaker_name));
                text = rest.trim();
            }
        }

        self.add_text_line(text, line_number, comment)
    }

    /// Display name for a `Name:` speaker change: the value of the variable
    /// `VOICE_<NAME>` (spaces as underscores) if declared, else the captured
    /// name lowercased.
    fn resolve_speaker(&self, name: &str) -> String {
        let var_name = format!("VOICE_{}", name.to_uppercase().replace(' ', "_"));
        match self.find_variable(&var_name) {
            Some(var) => var.value().to_string(),
            None => name.to_lowercase(),
        }
    }

    fn read_instruction(
        &mut self,
        name: &str,
        arg: &str,
        line_number: usize,
        comment: Option<String>,
    ) -> Result<(), HamError> {
        let name = name.to_uppercase();
        if name == "SCENE" {
            return Err(HamError::syntax(
                "'!SCENE foo' is not supported! use '== foo =='",
                line_number,
                self.file_name,
            ));
        }

        // The line records the speech time in force before interpretation.
        let line = InstructionLine {
            name: name.clone(),
            text: arg.to_string(),
            time: self.time,
            line_number: Some(line_number),
            comment,
        };

        match name.as_str() {
            "SPEECHTIME" => {
                let head = arg.split(':').next().unwrap_or_default();
                let value: f64 = head.trim().parse().map_err(|_| {
                    HamError::syntax(
                        format!("Expected float for SPEECHTIME, got '{}'", arg),
                        line_number,
                        self.file_name,
                    )
                })?;
                self.time = Some(value);
            }
            "FLAG" => {
                let flag = normalize_flag(arg);
                if !flag.is_empty() && !self.flags.contains(&flag) {
                    self.flags.push(flag);
                }
            }
            "UNFLAG" => self.flags.clear(),
            _ => {}
        }

        self.scene.push(Line::Instruction(line));
        Ok(())
    }

    /// `%t time[:duration[,padding]]` updates the timing state. Components
    /// past the padding are validated but have no effect.
    fn read_speech_time(&mut self, arg: &str, line_number: usize) -> Result<(), HamError> {
        let malformed = |file: &str| {
            HamError::syntax(
                format!("Expected float for speech time, got '{}'", arg),
                line_number,
                file,
            )
        };

        let (head, tail) = match arg.split_once(':') {
            Some((head, tail)) => (head, Some(tail)),
            None => (arg, None),
        };
        let time: f64 = head
            .trim()
            .parse()
            .map_err(|_| malformed(self.file_name))?;
        self.time = Some(time);

        if let Some(tail) = tail {
            for (index, part) in tail.split(',').enumerate() {
                let value: f64 = part
                    .trim()
                    .parse()
                    .map_err(|_| malformed(self.file_name))?;
                match index {
                    0 => self.duration = Some(value),
                    1 => self.padding = Some(value),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn add_text_line(
        &mut self,
        text: &str,
        line_number: usize,
        comment: Option<String>,
    ) -> Result<(), HamError> {
        let Some(speaker) = self.speaker.clone() else {
            return Err(HamError::syntax("No speaker", line_number, self.file_name));
        };

        let mut text = text.trim();
        let mut action = None;
        if let Some(rest) = text.strip_prefix('[') {
            if let Some(close) = rest.find(']') {
                let inner = &rest[..close];
                if !inner.is_empty() {
                    action = Some(inner.to_string());
                }
                text = rest[close + 1..].trim();
            }
        }

        self.scene.push(Line::Text(TextLine {
            speaker,
            text: text.to_string(),
            action,
            flags: self.flags.clone(),
            time: self.time,
            duration: self.duration,
            padding: self.padding,
            line_number: Some(line_number),
            comment,
        }));
        Ok(())
    }

    /// Scope-aware lookup across the closed scenes and the open one. Local
    /// names only resolve against the open scene.
    fn find_variable(&self, name: &str) -> Option<&VariableLine> {
        let canonical = name.trim().to_uppercase();
        if canonical.starts_with('_') {
            return self.scene.find_variable(&canonical);
        }
        self.scenes
            .iter()
            .chain(std::iter::once(&self.scene))
            .find_map(|scene| scene.find_variable(&canonical))
    }
}

/// Splits a trailing `#comment` off the line. An empty comment is dropped.
fn split_inline_comment(line: &str) -> (&str, Option<String>) {
    match line.find('#') {
        Some(index) => {
            let comment = line[index + 1..].trim();
            let comment = (!comment.is_empty()).then(|| comment.to_string());
            (line[..index].trim_end(), comment)
        }
        None => (line, None),
    }
}

/// `NAME = value` with a bare identifier and a non-empty value.
fn match_assignment(content: &str) -> Option<(&str, &str)> {
    let bytes = content.as_bytes();
    let first = *bytes.first()?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    let name = &content[..i];
    let value = content[i..].trim_start().strip_prefix('=')?.trim();
    if value.is_empty() {
        return None;
    }
    Some((name, value))
}

/// `== name ==` with a non-empty name.
fn match_scene(content: &str) -> Option<&str> {
    let inner = content.strip_prefix("==")?.strip_suffix("==")?;
    let name = inner.trim();
    (!name.is_empty()).then_some(name)
}

/// `<sigil>name argument` where name is `[A-Za-z_][A-Za-z0-9_]*` and the
/// argument, if present, is separated by whitespace. Anything else falls
/// through to the later rules.
fn match_directive(content: &str, sigil: char) -> Option<(&str, &str)> {
    let rest = content.strip_prefix(sigil)?.trim_start();
    let bytes = rest.as_bytes();
    let first = *bytes.first()?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    let (name, arg) = rest.split_at(i);
    if arg.is_empty() {
        return Some((name, ""));
    }
    if !arg.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    Some((name, arg.trim()))
}

/// Flags are whitespace-collapsed and lowercased before comparison.
fn normalize_flag(arg: &str) -> String {
    arg.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
