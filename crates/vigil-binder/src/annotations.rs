//! Doc-comment annotation extraction.
//!
//! Declarations may carry `@param`, `@return` and `@var` tags whose type
//! expressions are more precise than the source-level declarations. This
//! module pulls the raw type strings out of a doc comment; turning them
//! into union types is the type algebra's job.

/// Raw annotation strings found in one doc comment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocAnnotations {
    /// `(parameter name without `$`, type string)` pairs, in order.
    pub params: Vec<(String, String)>,
    pub return_type: Option<String>,
    pub var_type: Option<String>,
}

/// Strip comment framing from one doc-comment line.
fn strip_frame(line: &str) -> &str {
    let line = line.trim();
    let line = line.strip_prefix("/**").unwrap_or(line);
    let line = line.strip_suffix("*/").unwrap_or(line);
    line.trim_start_matches('*').trim()
}

/// Extract `@param` / `@return` / `@var` tags from a doc comment.
///
/// Unknown tags and free-form prose are skipped. The first `@return` and
/// `@var` win; repeated `@param` tags for the same name keep the first.
pub fn parse_doc_comment(doc: &str) -> DocAnnotations {
    let mut annotations = DocAnnotations::default();
    for raw_line in doc.lines() {
        let line = strip_frame(raw_line);
        if let Some(rest) = line.strip_prefix("@param") {
            let mut words = rest.split_whitespace();
            let Some(type_string) = words.next() else {
                continue;
            };
            let Some(name) = words.next().and_then(|w| w.strip_prefix('$')) else {
                continue;
            };
            if !annotations.params.iter().any(|(n, _)| n == name) {
                annotations
                    .params
                    .push((name.to_string(), type_string.to_string()));
            }
        } else if let Some(rest) = line.strip_prefix("@return") {
            if annotations.return_type.is_none()
                && let Some(type_string) = rest.split_whitespace().next()
            {
                annotations.return_type = Some(type_string.to_string());
            }
        } else if let Some(rest) = line.strip_prefix("@var") {
            if annotations.var_type.is_none()
                && let Some(type_string) = rest.split_whitespace().next()
            {
                annotations.var_type = Some(type_string.to_string());
            }
        }
    }
    annotations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tags_from_framed_comment() {
        let doc = "/**\n * Does a thing.\n * @param int|string $count\n * @param ?Foo $foo\n * @return string[]\n */";
        let annotations = parse_doc_comment(doc);
        assert_eq!(annotations.params, vec![
            ("count".to_string(), "int|string".to_string()),
            ("foo".to_string(), "?Foo".to_string()),
        ]);
        assert_eq!(annotations.return_type.as_deref(), Some("string[]"));
        assert_eq!(annotations.var_type, None);
    }

    #[test]
    fn first_tag_wins_and_prose_is_skipped() {
        let doc = "/** @var int the counter\n @var string */";
        let annotations = parse_doc_comment(doc);
        assert_eq!(annotations.var_type.as_deref(), Some("int"));
    }

    #[test]
    fn param_without_name_is_ignored() {
        let doc = "/** @param int */";
        let annotations = parse_doc_comment(doc);
        assert!(annotations.params.is_empty());
    }
}
