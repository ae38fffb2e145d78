//! The parsed script: an ordered list of scenes plus lookup and mutation
//! helpers.

use std::fmt;

use crate::error::HamError;
use crate::line::{Line, VariableLine};
use crate::scene::Scene;

/// A fully parsed script. Owns its scenes; scenes own their lines. Scene
/// and line order always matches the source, so serializing with
/// [`Document::to_string`] reproduces the script text.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) file_name: String,
    pub(crate) scenes: Vec<Scene>,
}

impl Document {
    /// An empty document holding one anonymous scene.
    pub fn new(file_name: impl Into<String>) -> Self {
        Document {
            file_name: file_name.into(),
            scenes: vec![Scene::anonymous()],
        }
    }

    pub(crate) fn from_parts(file_name: String, scenes: Vec<Scene>) -> Self {
        Document { file_name, scenes }
    }

    /// Label used in error messages, normally the source file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene_mut(&mut self, index: usize) -> Option<&mut Scene> {
        self.scenes.get_mut(index)
    }

    /// Finds a named scene, matching case-insensitively.
    pub fn scene_by_name(&self, name: &str) -> Option<&Scene> {
        self.scene_index_by_name(name)
            .map(|index| &self.scenes[index])
    }

    pub fn scene_index_by_name(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.scenes
            .iter()
            .position(|scene| scene.name().is_some_and(|n| n == wanted))
    }

    /// All lines in source order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.scenes.iter().flat_map(|scene| scene.lines().iter())
    }

    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut Line> {
        self.scenes.iter_mut().flat_map(|scene| scene.lines_mut())
    }

    /// All variable lines in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &VariableLine> {
        self.scenes.iter().flat_map(|scene| scene.variables())
    }

    /// Scope-aware variable lookup. Underscore-prefixed names resolve only
    /// within `scene`; other names scan every scene in declaration order and
    /// the first match wins. Returns the defining scene's index alongside
    /// the line.
    pub(crate) fn find_variable(
        &self,
        name: &str,
        scene: Option<usize>,
    ) -> Option<(usize, &VariableLine)> {
        let canonical = name.trim().to_uppercase();
        if canonical.starts_with('_') {
            let index = scene?;
            let found = self.scenes.get(index)?.find_variable(&canonical)?;
            return Some((index, found));
        }
        self.scenes
            .iter()
            .enumerate()
            .find_map(|(index, scene)| Some((index, scene.find_variable(&canonical)?)))
    }

    fn find_variable_mut(
        &mut self,
        name: &str,
        scene: Option<usize>,
    ) -> Option<&mut VariableLine> {
        let index = self.find_variable(name, scene)?.0;
        self.scenes[index].find_variable_mut(name)
    }

    /// Value of a variable visible from `scene`, or `None`. A lookup miss is
    /// not an error.
    pub fn get_variable(&self, name: &str, scene: Option<usize>) -> Option<&str> {
        self.find_variable(name, scene).map(|(_, var)| var.value())
    }

    /// Overwrites an existing variable, or declares a new one. New globals
    /// land in `scene` when given, else in the first scene. Declaring a new
    /// scene-local variable requires a scene.
    pub fn set_variable(
        &mut self,
        name: &str,
        value: &str,
        scene: Option<usize>,
    ) -> Result<(), HamError> {
        if let Some(index) = scene {
            if index >= self.scenes.len() {
                return Err(HamError::runtime(
                    format!("No scene with index {}", index),
                    0,
                    &self.file_name,
                ));
            }
        }

        if let Some(var) = self.find_variable_mut(name, scene) {
            var.set_value(value);
            return Ok(());
        }

        let var = VariableLine::new(name, value);
        if var.is_local() && scene.is_none() {
            return Err(HamError::runtime(
                format!("Local variable {} requires a scene", var.name()),
                0,
                &self.file_name,
            ));
        }
        self.scenes[scene.unwrap_or(0)].push(Line::Variable(var));
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for scene in &self.scenes {
            for line in scene.lines() {
                if !first {
                    f.write_str("\n")?;
                }
                f.write_str(&line.raw())?;
                first = false;
            }
        }
        Ok(())
    }
}
