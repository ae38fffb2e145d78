//! JSON-facing snapshot of a document, with variables filled in.

use serde::Serialize;

use crate::document::Document;
use crate::error::{ExportError, FillError};
use crate::line::Line;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentExport {
    pub scenes: Vec<SceneExport>,
    pub variables: Vec<VariableExport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneExport {
    pub name: Option<String>,
    pub lines: Vec<LineExport>,
}

/// A global variable with its fully substituted value.
#[derive(Debug, Clone, Serialize)]
pub struct VariableExport {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineExport {
    pub kind: &'static str,
    pub name: String,
    pub text: String,
    pub time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
}

impl Document {
    /// Snapshot for downstream tooling. Comments, blanks, processor lines
    /// and scene-local variables are left out; scenes with nothing left are
    /// skipped; all text and values have variables substituted recursively.
    pub fn export(&self) -> Result<DocumentExport, FillError> {
        let mut scenes = Vec::new();
        for (index, scene) in self.scenes().iter().enumerate() {
            let mut lines = Vec::new();
            for line in scene.lines() {
                if let Some(export) = self.export_line(line, index)? {
                    lines.push(export);
                }
            }
            if lines.is_empty() {
                continue;
            }
            scenes.push(SceneExport {
                name: scene.name().map(str::to_string),
                lines,
            });
        }

        let mut variables = Vec::new();
        for (index, scene) in self.scenes().iter().enumerate() {
            for var in scene.variables() {
                if var.is_local() {
                    continue;
                }
                variables.push(VariableExport {
                    name: var.name().to_string(),
                    value: self.fill_variables(var.value(), Some(index), true)?,
                });
            }
        }

        Ok(DocumentExport { scenes, variables })
    }

    /// The export as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        let export = self.export()?;
        Ok(serde_json::to_string_pretty(&export)?)
    }

    fn export_line(&self, line: &Line, scene: usize) -> Result<Option<LineExport>, FillError> {
        let export = match line {
            Line::Comment(_) | Line::Blank(_) | Line::Processor(_) => None,
            Line::Variable(var) => {
                if var.is_local() {
                    None
                } else {
                    Some(LineExport {
                        kind: "variable",
                        name: var.name().to_string(),
                        text: self.fill_variables(var.value(), Some(scene), true)?,
                        time: 0.0,
                        line_number: var.line_number(),
                        action: None,
                        flags: Vec::new(),
                        duration: None,
                        padding: None,
                    })
                }
            }
            Line::Instruction(instr) => Some(LineExport {
                kind: "instruction",
                name: instr.name().to_string(),
                text: self.fill_variables(instr.text(), Some(scene), true)?,
                time: instr.time().unwrap_or(0.0),
                line_number: instr.line_number(),
                action: None,
                flags: Vec::new(),
                duration: None,
                padding: None,
            }),
            Line::Text(text) => Some(LineExport {
                kind: "text",
                name: text.speaker().to_string(),
                text: self.fill_variables(text.text(), Some(scene), true)?,
                time: text.time().unwrap_or(0.0),
                line_number: text.line_number(),
                action: text.action().map(str::to_string),
                flags: text.flags().to_vec(),
                duration: text.duration(),
                padding: text.padding(),
            }),
        };
        Ok(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        crate::parse_str(text, "test.ham").expect("fixture should parse")
    }

    #[test]
    fn export_skips_internal_lines_and_empty_scenes() {
        let doc = doc("# header\n\n== a ==\n%t 1\nTom: Hi\n== deserted ==");
        let export = doc.export().unwrap();
        // The anonymous scene held only a comment and a blank; the trailing
        // scene holds only its boundary record.
        assert_eq!(export.scenes.len(), 1);
        let scene = &export.scenes[0];
        assert_eq!(scene.name.as_deref(), Some("a"));
        assert_eq!(scene.lines.len(), 1);
        assert_eq!(scene.lines[0].kind, "text");
        assert_eq!(scene.lines[0].time, 1.0);
    }

    #[test]
    fn export_fills_values_and_lists_only_globals() {
        let doc = doc("WHO = world\n== a ==\n_SECRET = hush\nTom: hello $WHO");
        let export = doc.export().unwrap();

        assert_eq!(export.variables.len(), 1);
        assert_eq!(export.variables[0].name, "WHO");
        assert_eq!(export.variables[0].value, "world");

        let lines = &export.scenes[1].lines;
        assert_eq!(lines[0].text, "hello world");
    }

    #[test]
    fn json_round_trips_through_serde() {
        let doc = doc("WHO = world\nTom: hello $WHO # greet");
        let json = doc.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let line = &value["scenes"][0]["lines"][1];
        assert_eq!(line["kind"], "text");
        assert_eq!(line["name"], "tom");
        assert_eq!(line["text"], "hello world");
        assert_eq!(line["line_number"], 2);
        // Absent optionals are omitted entirely.
        assert!(line.get("action").is_none());
        assert!(line.get("flags").is_none());
    }

    #[test]
    fn export_surfaces_substitution_cycles() {
        let doc = doc("A = $B\nB = $A\nTom: $A");
        assert!(doc.export().is_err());
    }
}
