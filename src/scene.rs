//! Ordered container of the lines between two scene boundaries.

use std::fmt;

use crate::line::{Line, VariableLine};

/// A named or anonymous contiguous block of script lines. Scene-local
/// variables resolve against the scene that declared them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub(crate) name: Option<String>,
    pub(crate) lines: Vec<Line>,
}

impl Scene {
    pub(crate) fn anonymous() -> Self {
        Scene::default()
    }

    /// Scene names are stored lowercased and matched case-insensitively.
    pub(crate) fn named(name: &str) -> Self {
        Scene {
            name: Some(name.trim().to_lowercase()),
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line_mut(&mut self, index: usize) -> Option<&mut Line> {
        self.lines.get_mut(index)
    }

    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut Line> {
        self.lines.iter_mut()
    }

    pub(crate) fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub(crate) fn last_line_mut(&mut self) -> Option<&mut Line> {
        self.lines.last_mut()
    }

    /// Variable lines in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &VariableLine> {
        self.lines.iter().filter_map(|line| match line {
            Line::Variable(var) => Some(var),
            _ => None,
        })
    }

    /// Looks up a variable declared in this scene. Names compare
    /// case-insensitively.
    pub fn find_variable(&self, name: &str) -> Option<&VariableLine> {
        let canonical = name.trim().to_uppercase();
        self.variables().find(|var| var.name() == canonical)
    }

    pub(crate) fn find_variable_mut(&mut self, name: &str) -> Option<&mut VariableLine> {
        let canonical = name.trim().to_uppercase();
        self.lines.iter_mut().find_map(|line| match line {
            Line::Variable(var) if var.name() == canonical => Some(var),
            _ => None,
        })
    }

    /// Distinct flags stamped on this scene's dialogue lines, in the order
    /// they first appear.
    pub fn flags(&self) -> Vec<&str> {
        let mut flags: Vec<&str> = Vec::new();
        for line in &self.lines {
            if let Line::Text(text) = line {
                for flag in text.flags() {
                    if !flags.contains(&flag.as_str()) {
                        flags.push(flag);
                    }
                }
            }
        }
        flags
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Scene {}", name),
            None => write!(f, "Blank Scene"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::TextLine;

    #[test]
    fn named_scenes_store_lowercase_names() {
        let scene = Scene::named("  The Kitchen ");
        assert_eq!(scene.name(), Some("the kitchen"));
        assert_eq!(scene.to_string(), "Scene the kitchen");
        assert_eq!(Scene::anonymous().to_string(), "Blank Scene");
    }

    #[test]
    fn variables_iterates_declaration_order() {
        let mut scene = Scene::anonymous();
        scene.push(Line::Variable(VariableLine::new("A", "1")));
        scene.push(Line::Blank(crate::line::BlankLine::default()));
        scene.push(Line::Variable(VariableLine::new("b", "2")));

        let names: Vec<&str> = scene.variables().map(VariableLine::name).collect();
        assert_eq!(names, ["A", "B"]);
        assert!(scene.find_variable("a").is_some());
        assert!(scene.find_variable("missing").is_none());
    }

    #[test]
    fn flags_collects_distinct_in_first_seen_order() {
        let mut scene = Scene::anonymous();
        for flags in [vec!["angry"], vec!["angry", "shouting"], vec!["shouting"]] {
            scene.push(Line::Text(TextLine {
                speaker: "tom".to_string(),
                text: "hi".to_string(),
                action: None,
                flags: flags.into_iter().map(str::to_string).collect(),
                time: None,
                duration: None,
                padding: None,
                line_number: None,
                comment: None,
            }));
        }
        assert_eq!(scene.flags(), ["angry", "shouting"]);
    }
}
