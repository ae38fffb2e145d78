//! `$name` variable substitution with scene scoping and escaping.

use crate::document::Document;
use crate::error::FillError;

/// Nesting limit for recursive expansion. A variable chain deeper than this
/// is reported as a cycle instead of recursing forever.
pub const MAX_FILL_DEPTH: usize = 16;

impl Document {
    /// Replaces each unescaped `$name` token in `text` with the value of the
    /// named variable, honoring scope rules: underscore-prefixed names only
    /// resolve within `scene`, other names scan all scenes in declaration
    /// order. A token with no matching variable is replaced by the bare name
    /// (a miss is not an error). With `recurse`, a found value is itself
    /// substituted against its defining scene before being spliced in.
    /// Afterward every `\$` sequence unescapes to a literal `$`.
    pub fn fill_variables(
        &self,
        text: &str,
        scene: Option<usize>,
        recurse: bool,
    ) -> Result<String, FillError> {
        self.fill_depth(text, scene, recurse, 0)
    }

    fn fill_depth(
        &self,
        text: &str,
        scene: Option<usize>,
        recurse: bool,
        depth: usize,
    ) -> Result<String, FillError> {
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while i < text.len() {
            let Some(offset) = text[i..].find('$') else {
                out.push_str(&text[i..]);
                break;
            };
            let dollar = i + offset;
            out.push_str(&text[i..dollar]);

            let escaped = dollar > 0 && text.as_bytes()[dollar - 1] == b'\\';
            let start = dollar + 1;
            let len = ident_len(&text[start..]);
            if escaped || len == 0 {
                out.push('$');
                i = start;
                continue;
            }

            let name = &text[start..start + len];
            match self.find_variable(name, scene) {
                Some((var_scene, var)) => {
                    if recurse {
                        if depth >= MAX_FILL_DEPTH {
                            return Err(FillError {
                                name: name.to_string(),
                            });
                        }
                        let value = var.value().to_string();
                        out.push_str(&self.fill_depth(&value, Some(var_scene), true, depth + 1)?);
                    } else {
                        out.push_str(var.value());
                    }
                }
                None => out.push_str(name),
            }
            i = start + len;
        }
        Ok(out.replace("\\$", "$"))
    }
}

/// Length of a leading `[A-Za-z_][A-Za-z0-9_]*` identifier, or zero.
fn ident_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return 0,
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        crate::parse_str(text, "test.ham").expect("fixture should parse")
    }

    #[test]
    fn substitutes_known_variables() {
        let doc = doc("NAME = Tom\nGREETING = Hi $NAME!");
        assert_eq!(
            doc.fill_variables("$GREETING", None, true).unwrap(),
            "Hi Tom!"
        );
    }

    #[test]
    fn non_recursive_fill_leaves_nested_references() {
        let doc = doc("NAME = Tom\nGREETING = Hi $NAME!");
        assert_eq!(
            doc.fill_variables("$GREETING", None, false).unwrap(),
            "Hi $NAME!"
        );
    }

    #[test]
    fn fill_without_tokens_is_identity() {
        let doc = doc("X = 1");
        let text = "no references here, 10:30 sharp";
        assert_eq!(doc.fill_variables(text, None, true).unwrap(), text);
    }

    #[test]
    fn missing_variable_becomes_bare_name() {
        let doc = doc("X = 1");
        assert_eq!(doc.fill_variables("$NOBODY here", None, true).unwrap(), "NOBODY here");
    }

    #[test]
    fn escaped_dollar_is_literal() {
        let doc = doc("X = 1");
        assert_eq!(doc.fill_variables(r"costs \$X", None, true).unwrap(), "costs $X");
    }

    #[test]
    fn dollar_without_identifier_is_kept() {
        let doc = doc("X = 1");
        assert_eq!(doc.fill_variables("$ $$X $.", None, true).unwrap(), "$ $1 $.");
    }

    #[test]
    fn local_variables_resolve_only_in_their_scene() {
        let doc = doc("== a ==\n_WHO = us\n== b ==");
        let a = doc.scene_index_by_name("a").unwrap();
        let b = doc.scene_index_by_name("b").unwrap();
        assert_eq!(doc.fill_variables("$_WHO", Some(a), true).unwrap(), "us");
        assert_eq!(doc.fill_variables("$_WHO", Some(b), true).unwrap(), "_WHO");
        assert_eq!(doc.fill_variables("$_WHO", None, true).unwrap(), "_WHO");
    }

    #[test]
    fn recursion_resolves_against_defining_scene() {
        // GREETING lives in scene a and refers to a's local _WHO.
        let doc = doc("== a ==\n_WHO = us\nGREETING = hello $_WHO\n== b ==");
        let b = doc.scene_index_by_name("b").unwrap();
        assert_eq!(
            doc.fill_variables("$GREETING", Some(b), true).unwrap(),
            "hello us"
        );
    }

    #[test]
    fn self_reference_hits_the_depth_limit() {
        let doc = doc("LOOP = $LOOP");
        let err = doc.fill_variables("$LOOP", None, true).unwrap_err();
        assert_eq!(err.name, "LOOP");
    }

    #[test]
    fn mutual_cycle_hits_the_depth_limit() {
        let doc = doc("X = $Y\nY = $X");
        let err = doc.fill_variables("$X", None, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("recursion limit exceeded while expanding '${}'", err.name)
        );
    }
}
