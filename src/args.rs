//! Reader for `key = value, key = "quoted value"` instruction arguments.

use std::collections::HashMap;

use crate::document::Document;
use crate::error::ArgError;

impl Document {
    /// Parses comma-separated `key = value` pairs. Keys are lowercased and
    /// trimmed. Values may be bare (read up to the next comma), or quoted
    /// with `'` or `"` and backslash-escapes; single quotes additionally
    /// protect `$` from substitution. Every value is passed through
    /// [`Document::fill_variables`]. Duplicate keys are an error.
    pub fn parse_instruction_args(&self, text: &str) -> Result<HashMap<String, String>, ArgError> {
        let mut args = HashMap::new();
        let mut i = 0;

        while i < text.len() {
            if text[i..].trim().is_empty() {
                break;
            }
            let Some((key, after_key)) = read_key(text, i) else {
                return Err(ArgError::MissingEquals {
                    text: text.to_string(),
                });
            };
            if key.is_empty() {
                break;
            }

            let (raw_value, after_value) = read_value(text, after_key)?;
            let value = self.fill_variables(&raw_value, None, true)?;

            if args.contains_key(&key) {
                return Err(ArgError::DuplicateKey {
                    key,
                    text: text.to_string(),
                });
            }
            args.insert(key, value);

            // Skip to the pair separator, or the end of the text.
            i = match text[after_value..].find(',') {
                Some(offset) => after_value + offset + 1,
                None => text.len(),
            };
        }

        Ok(args)
    }
}

/// Reads a key up to the first unescaped `=`. Returns the lowercased,
/// trimmed key and the index just past the `=`.
fn read_key(text: &str, start: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'=' && (i == 0 || bytes[i - 1] != b'\\') {
            let key = text[start..i].trim().to_lowercase();
            return Some((key, i + 1));
        }
        i += 1;
    }
    None
}

/// Reads a quoted or bare value starting at `start`, returning the value and
/// the index just past it.
fn read_value(text: &str, start: usize) -> Result<(String, usize), ArgError> {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    match bytes.get(i) {
        None => Ok((String::new(), i)),
        Some(b'"') => read_quoted(text, i + 1, '"'),
        Some(b'\'') => read_quoted(text, i + 1, '\''),
        Some(_) => Ok(read_bare(text, i)),
    }
}

/// Reads until the matching unescaped close quote, processing backslash
/// escapes. A `$` inside single quotes is re-escaped so substitution will
/// not fire on it; an escaped `$` inside double quotes stays escaped.
fn read_quoted(text: &str, start: usize, quote: char) -> Result<(String, usize), ArgError> {
    let mut value = String::new();
    let mut iter = text[start..].char_indices();

    while let Some((offset, ch)) = iter.next() {
        match ch {
            '\\' => {
                let Some((_, escaped)) = iter.next() else {
                    return Err(ArgError::TrailingEscape {
                        text: text.to_string(),
                    });
                };
                if quote == '"' && escaped == '$' {
                    value.push_str("\\$");
                } else {
                    value.push(escaped);
                }
            }
            '$' if quote == '\'' => value.push_str("\\$"),
            _ if ch == quote => return Ok((value, start + offset + ch.len_utf8())),
            _ => value.push(ch),
        }
    }

    Err(ArgError::UnterminatedQuote {
        text: text.to_string(),
    })
}

/// Reads up to the next top-level comma, trimming trailing whitespace.
fn read_bare(text: &str, start: usize) -> (String, usize) {
    let end = text[start..]
        .find(',')
        .map(|offset| start + offset)
        .unwrap_or(text.len());
    (text[start..end].trim_end().to_string(), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        crate::parse_str(text, "test.ham").expect("fixture should parse")
    }

    #[test]
    fn parses_bare_quoted_and_substituted_values() {
        let doc = doc("TOM = Thomas");
        let args = doc
            .parse_instruction_args(
                r#"lines = 1, only = $TOM, action = "to himself, in the kitchen""#,
            )
            .unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args["lines"], "1");
        assert_eq!(args["only"], "Thomas");
        assert_eq!(args["action"], "to himself, in the kitchen");
    }

    #[test]
    fn bare_values_stop_at_commas() {
        let doc = doc("TOM = Thomas");
        let args = doc
            .parse_instruction_args("action=opening the front door, first=$TOM")
            .unwrap();
        assert_eq!(args["action"], "opening the front door");
        assert_eq!(args["first"], "Thomas");
    }

    #[test]
    fn single_quotes_protect_dollar_signs() {
        let doc = doc("TOM = Thomas");
        let args = doc.parse_instruction_args("a = '$TOM', b = \"$TOM\"").unwrap();
        assert_eq!(args["a"], "$TOM");
        assert_eq!(args["b"], "Thomas");
    }

    #[test]
    fn escaped_dollar_in_double_quotes_is_literal() {
        let doc = doc("TOM = Thomas");
        let args = doc.parse_instruction_args(r#"a = "\$TOM""#).unwrap();
        assert_eq!(args["a"], "$TOM");
    }

    #[test]
    fn quotes_protect_leading_and_trailing_whitespace() {
        let doc = doc("X = 1");
        let args = doc.parse_instruction_args("pad = '  spaced  '").unwrap();
        assert_eq!(args["pad"], "  spaced  ");
    }

    #[test]
    fn escaped_quote_inside_value() {
        let doc = doc("X = 1");
        let args = doc
            .parse_instruction_args(r#"say = "she said \"hi\"""#)
            .unwrap();
        assert_eq!(args["say"], r#"she said "hi""#);
    }

    #[test]
    fn keys_are_lowercased_and_trimmed() {
        let doc = doc("X = 1");
        let args = doc.parse_instruction_args("  Lines = 3").unwrap();
        assert_eq!(args["lines"], "3");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let doc = doc("X = 1");
        let err = doc.parse_instruction_args("a = 1, A = 2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "duplicate key \"a\" in key values: (a = 1, A = 2)"
        );
    }

    #[test]
    fn missing_equals_is_rejected() {
        let doc = doc("X = 1");
        let err = doc.parse_instruction_args("a = 1, nonsense").unwrap_err();
        assert!(matches!(err, ArgError::MissingEquals { .. }));
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        let doc = doc("X = 1");
        let err = doc.parse_instruction_args("a = \"oops").unwrap_err();
        assert!(matches!(err, ArgError::UnterminatedQuote { .. }));
    }

    #[test]
    fn trailing_comma_and_whitespace_end_the_list() {
        let doc = doc("X = 1");
        let args = doc.parse_instruction_args("a = 1,  ").unwrap();
        assert_eq!(args.len(), 1);
        assert!(doc.parse_instruction_args("").unwrap().is_empty());
    }

    #[test]
    fn empty_value_at_end_is_empty_string() {
        let doc = doc("X = 1");
        let args = doc.parse_instruction_args("a =").unwrap();
        assert_eq!(args["a"], "");
    }
}
