//! Template text parsing
//!
//! Splits `{placeholder}` template text into literal runs and placeholders.
//! A placeholder ending in `:hash` refers to a signed definition; any other
//! placeholder is a free-text field named by the part before its first `:`.

use crate::directory::Template;

/// Placeholder suffix selecting a reference field
pub const REFERENCE_SUFFIX: &str = ":hash";

/// One `{...}` occurrence in template text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    raw: &'a str,
    offset: usize,
}

impl<'a> Placeholder<'a> {
    /// Text between the braces, used as label and data key
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Byte offset of the opening brace
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Field name (before the first `:`)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.raw.split(':').next().unwrap_or(self.raw)
    }

    /// Whether this placeholder refers to a signed definition
    #[inline]
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.raw.ends_with(REFERENCE_SUFFIX)
    }

    /// Key under which the field's value is submitted
    #[must_use]
    pub fn form_key(&self) -> String {
        if self.is_reference() {
            format!("{}{}", self.name(), REFERENCE_SUFFIX)
        } else {
            self.name().to_string()
        }
    }
}

/// Parsed piece of template text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePart<'a> {
    /// Literal text outside braces (never empty)
    Literal(&'a str),
    /// Placeholder
    Placeholder(Placeholder<'a>),
}

/// Parse template text, tolerating malformed input
///
/// An unterminated `{` is dropped and the rest of the text is kept as a
/// literal. Use [`validate`] to reject such text instead.
#[must_use]
pub fn parse(text: &str) -> Vec<TemplatePart<'_>> {
    let mut parts = Vec::new();
    let mut rest = text;
    let mut offset = 0;

    while let Some(open) = rest.find('{') {
        push_literal(&mut parts, &rest[..open]);
        let after = &rest[open + 1..];
        if let Some(close) = after.find('}') {
            parts.push(TemplatePart::Placeholder(Placeholder {
                raw: &after[..close],
                offset: offset + open,
            }));
            let consumed = open + close + 2;
            rest = &rest[consumed..];
            offset += consumed;
        } else {
            tracing::warn!(
                "Unterminated placeholder at offset {}; keeping remainder as text",
                offset + open
            );
            push_literal(&mut parts, after);
            return parts;
        }
    }

    push_literal(&mut parts, rest);
    parts
}

fn push_literal<'a>(parts: &mut Vec<TemplatePart<'a>>, text: &'a str) {
    if !text.is_empty() {
        parts.push(TemplatePart::Literal(text));
    }
}

/// Check template text strictly
///
/// # Errors
/// Returns [`TemplateError::Unterminated`] for a `{` without matching `}`.
pub fn validate(text: &str) -> Result<usize, TemplateError> {
    let mut count = 0;
    let mut rest = text;
    let mut offset = 0;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open + 1..].find('}') else {
            return Err(TemplateError::Unterminated {
                offset: offset + open,
            });
        };
        count += 1;
        let consumed = open + close + 2;
        rest = &rest[consumed..];
        offset += consumed;
    }
    Ok(count)
}

impl Template {
    /// Parsed template text
    #[inline]
    #[must_use]
    pub fn parts(&self) -> Vec<TemplatePart<'_>> {
        parse(&self.text)
    }

    /// Placeholders in order of appearance
    #[must_use]
    pub fn placeholders(&self) -> Vec<Placeholder<'_>> {
        self.parts()
            .into_iter()
            .filter_map(|part| match part {
                TemplatePart::Placeholder(p) => Some(p),
                TemplatePart::Literal(_) => None,
            })
            .collect()
    }
}

/// Template text errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Opening brace never closed
    #[error("unterminated placeholder starting at byte {offset}")]
    Unterminated {
        /// Byte offset of the opening brace
        offset: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn literal(s: &str) -> TemplatePart<'_> {
        TemplatePart::Literal(s)
    }

    #[test]
    fn parse_interleaves_literals_and_placeholders() {
        let parts = parse("Pay {amount} to {recipient}");
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], literal("Pay "));
        assert!(matches!(parts[1], TemplatePart::Placeholder(p) if p.raw() == "amount" && p.offset() == 4));
        assert_eq!(parts[2], literal(" to "));
        assert!(matches!(parts[3], TemplatePart::Placeholder(p) if p.raw() == "recipient"));
    }

    #[test]
    fn parse_omits_empty_literals() {
        let parts = parse("{a}{b}");
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| matches!(p, TemplatePart::Placeholder(_))));
    }

    #[test]
    fn reference_placeholder() {
        let parts = parse("See {offer:hash}.");
        let TemplatePart::Placeholder(p) = parts[1] else {
            panic!("expected placeholder");
        };
        assert!(p.is_reference());
        assert_eq!(p.name(), "offer");
        assert_eq!(p.form_key(), "offer:hash");
    }

    #[test]
    fn non_hash_suffix_is_plain_field_named_by_prefix() {
        let parts = parse("{price:eur}");
        let TemplatePart::Placeholder(p) = parts[0] else {
            panic!("expected placeholder");
        };
        assert!(!p.is_reference());
        assert_eq!(p.name(), "price");
        assert_eq!(p.form_key(), "price");
        assert_eq!(p.raw(), "price:eur");
    }

    /// Documents current behaviour: an unterminated brace is swallowed and
    /// the remainder is kept as literal text.
    #[test]
    fn unterminated_placeholder_is_kept_as_text() {
        let parts = parse("Pay {amount to Bob");
        assert_eq!(parts, vec![literal("Pay "), literal("amount to Bob")]);
    }

    #[test]
    fn validate_rejects_unterminated_placeholder() {
        assert_eq!(validate("Pay {amount} to {recipient}"), Ok(2));
        assert_eq!(
            validate("Pay {amount} to {recipient"),
            Err(TemplateError::Unterminated { offset: 16 })
        );
    }

    #[test]
    fn nested_open_brace_belongs_to_name() {
        let parts = parse("{a{b}c");
        assert!(matches!(parts[0], TemplatePart::Placeholder(p) if p.raw() == "a{b"));
        assert_eq!(parts[1], literal("c"));
    }

    #[test]
    fn template_placeholders() {
        let template = Template::new("t", "T", "{x} and {y:hash}");
        let names: Vec<_> = template.placeholders().iter().map(|p| p.form_key()).collect();
        assert_eq!(names, vec!["x".to_string(), "y:hash".to_string()]);
    }

    proptest! {
        #[test]
        fn prop_placeholder_count_and_reassembly(
            pieces in prop::collection::vec(("[^{}]{0,8}", "[a-z]{1,6}"), 0..8),
            tail in "[^{}]{0,8}",
        ) {
            let mut text = String::new();
            for (lit, name) in &pieces {
                text.push_str(lit);
                text.push('{');
                text.push_str(name);
                text.push('}');
            }
            text.push_str(&tail);

            let parts = parse(&text);
            let fields = parts
                .iter()
                .filter(|p| matches!(p, TemplatePart::Placeholder(_)))
                .count();
            prop_assert_eq!(fields, pieces.len());
            prop_assert_eq!(validate(&text), Ok(pieces.len()));

            let rebuilt: String = parts
                .iter()
                .map(|p| match p {
                    TemplatePart::Literal(s) => (*s).to_string(),
                    TemplatePart::Placeholder(ph) => format!("{{{}}}", ph.raw()),
                })
                .collect();
            prop_assert_eq!(rebuilt, text);
        }
    }
}
