//! Template rendering
//!
//! Turns template text plus contract arguments into an ordered sequence of
//! [`RenderedSegment`]s: literal runs, free-text input fields and reference
//! fields resolved against the [`Ledger`].

use crate::ledger::Ledger;
use crate::offer::ContractArguments;
use crate::template::{self, Placeholder, TemplatePart};

/// Free-text field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    /// Field name; also the submission key
    pub name: String,
    /// Placeholder text, shown while the field is empty
    pub label: String,
    /// Pre-filled value
    pub value: Option<String>,
    /// Whether the user may edit the field
    pub editable: bool,
}

/// One selectable definition of an editable reference field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceOption {
    /// Submitted value (a definition hash, or empty for the unset option)
    pub value: String,
    /// Human-readable description
    pub description: String,
    /// Whether the option is selected
    pub selected: bool,
}

impl ReferenceOption {
    /// Whether this is the synthesized "unset" option
    #[inline]
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.value.is_empty()
    }
}

/// How a reference field presents its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceDisplay {
    /// Editable: selectable known definitions
    Choices(Vec<ReferenceOption>),
    /// Read-only: bound hash resolved to a description
    Resolved(String),
    /// Read-only: nothing bound, or bound hash unknown
    Unresolved,
}

/// Field referring to a signed definition by hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceField {
    /// Field name (without `:hash`)
    pub name: String,
    /// Placeholder text
    pub label: String,
    /// Bound hash
    pub value: Option<String>,
    /// Presentation
    pub display: ReferenceDisplay,
}

impl ReferenceField {
    /// Submission key (`name:hash`)
    #[must_use]
    pub fn form_key(&self) -> String {
        format!("{}{}", self.name, template::REFERENCE_SUFFIX)
    }

    /// Whether the user may pick a definition
    #[inline]
    #[must_use]
    pub fn editable(&self) -> bool {
        matches!(self.display, ReferenceDisplay::Choices(_))
    }

    /// Currently selected option value, or the bound value when read-only
    #[must_use]
    pub fn selected_value(&self) -> Option<&str> {
        match &self.display {
            ReferenceDisplay::Choices(options) => options
                .iter()
                .find(|option| option.selected)
                .map(|option| option.value.as_str()),
            ReferenceDisplay::Resolved(_) | ReferenceDisplay::Unresolved => {
                self.value.as_deref()
            }
        }
    }
}

/// Rendered piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedSegment {
    /// Literal text
    Literal(String),
    /// Free-text field
    Input(InputField),
    /// Definition reference field
    Reference(ReferenceField),
}

impl RenderedSegment {
    /// Submission key for field segments
    #[must_use]
    pub fn form_key(&self) -> Option<String> {
        match self {
            Self::Literal(_) => None,
            Self::Input(field) => Some(field.name.clone()),
            Self::Reference(field) => Some(field.form_key()),
        }
    }

    /// Whether this segment is a field
    #[inline]
    #[must_use]
    pub fn is_field(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }
}

/// Render template text
///
/// Plain fields are pre-filled from `data` keyed by the full placeholder
/// text. Reference fields become selectable lists when `editable`, and
/// resolved descriptions otherwise.
#[must_use]
pub fn render(
    text: &str,
    data: &ContractArguments,
    editable: bool,
    ledger: &Ledger,
) -> Vec<RenderedSegment> {
    template::parse(text)
        .into_iter()
        .map(|part| match part {
            TemplatePart::Literal(text) => RenderedSegment::Literal(text.to_string()),
            TemplatePart::Placeholder(placeholder) => {
                let value = data.get(placeholder.raw()).cloned();
                if placeholder.is_reference() {
                    RenderedSegment::Reference(reference_field(
                        placeholder,
                        value,
                        editable,
                        ledger,
                    ))
                } else {
                    RenderedSegment::Input(InputField {
                        name: placeholder.name().to_string(),
                        label: placeholder.raw().to_string(),
                        value,
                        editable,
                    })
                }
            }
        })
        .collect()
}

fn reference_field(
    placeholder: Placeholder<'_>,
    value: Option<String>,
    editable: bool,
    ledger: &Ledger,
) -> ReferenceField {
    let label = placeholder.raw().to_string();
    let display = if editable {
        ReferenceDisplay::Choices(reference_options(ledger, value.as_deref(), &label))
    } else {
        resolve(ledger, value.as_deref())
    };
    ReferenceField {
        name: placeholder.name().to_string(),
        label,
        value,
        display,
    }
}

fn resolve(ledger: &Ledger, value: Option<&str>) -> ReferenceDisplay {
    let Some(hash) = value.filter(|v| !v.is_empty()) else {
        return ReferenceDisplay::Unresolved;
    };
    match ledger.definition(hash) {
        Some(definition) => ReferenceDisplay::Resolved(ledger.describe_definition(definition)),
        None => {
            tracing::info!("No definition exists with the hash {}", hash);
            ReferenceDisplay::Unresolved
        }
    }
}

/// Resolve read-only reference fields whose bound hash the ledger has
/// learned since they were rendered
///
/// Returns the number of fields resolved.
pub fn resolve_references(segments: &mut [RenderedSegment], ledger: &Ledger) -> usize {
    let mut resolved = 0;
    for segment in segments {
        let RenderedSegment::Reference(field) = segment else {
            continue;
        };
        if field.display != ReferenceDisplay::Unresolved {
            continue;
        }
        let Some(definition) = field
            .value
            .as_deref()
            .filter(|v| !v.is_empty())
            .and_then(|hash| ledger.definition(hash))
        else {
            continue;
        };
        field.display = ReferenceDisplay::Resolved(ledger.describe_definition(definition));
        resolved += 1;
    }
    resolved
}

/// Selectable definitions for an editable reference field
///
/// Definitions are visited in ledger insertion order; one whose hashes
/// overlap hashes claimed by an earlier option is skipped. When no option
/// matches `bound`, an unset option labelled `{label}` is prepended and
/// selected.
#[must_use]
pub fn reference_options(
    ledger: &Ledger,
    bound: Option<&str>,
    label: &str,
) -> Vec<ReferenceOption> {
    let bound = bound.filter(|v| !v.is_empty());
    let mut claimed = std::collections::HashSet::new();
    let mut options = Vec::new();

    for definition in ledger.definitions() {
        if definition.hashes.iter().any(|hash| claimed.contains(hash)) {
            continue;
        }
        claimed.extend(definition.hashes.iter().cloned());

        let Some(primary) = definition.primary_hash() else {
            continue;
        };
        options.push(ReferenceOption {
            value: primary.to_string(),
            description: ledger.describe(definition.negotiation_id, primary),
            selected: bound.is_some_and(|b| definition.has_hash(b)),
        });
    }

    if !options.iter().any(|option| option.selected) {
        if let Some(bound) = bound {
            tracing::info!("No definition exists with the hash {}", bound);
        }
        options.insert(
            0,
            ReferenceOption {
                value: String::new(),
                description: format!("{{{label}}}"),
                selected: true,
            },
        );
    }

    options
}

/// Plain-text rendering of segments
///
/// Fields show their value, the selected description, or `{label}` when
/// empty.
#[must_use]
pub fn plain_text(segments: &[RenderedSegment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            RenderedSegment::Literal(text) => text.clone(),
            RenderedSegment::Input(field) => match field.value.as_deref() {
                Some(value) if !value.trim().is_empty() => value.to_string(),
                _ => format!("{{{}}}", field.label),
            },
            RenderedSegment::Reference(field) => match &field.display {
                ReferenceDisplay::Resolved(description) => description.clone(),
                ReferenceDisplay::Choices(options) => options
                    .iter()
                    .find(|o| o.selected && !o.is_unset())
                    .map_or_else(|| format!("{{{}}}", field.label), |o| o.description.clone()),
                ReferenceDisplay::Unresolved => format!("{{{}}}", field.label),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::DefinitionHash;
    use crate::ledger::{Definition, DefinitionKind};
    use crate::offer::NegotiationId;
    use pretty_assertions::assert_eq;

    fn args(pairs: &[(&str, &str)]) -> ContractArguments {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn learn(ledger: &mut Ledger, id: i64, kind: DefinitionKind, hashes: &[&str]) {
        let hashes: Vec<DefinitionHash> = hashes.iter().map(|h| h.parse().unwrap()).collect();
        ledger.learn(
            NegotiationId(id),
            Definition::new(kind, NegotiationId(id), hashes, serde_json::Value::Null),
        );
    }

    #[test]
    fn render_read_only_with_data() {
        let ledger = Ledger::new();
        let segments = render(
            "Pay {amount} to {recipient}",
            &args(&[("amount", "100"), ("recipient", "Bob")]),
            false,
            &ledger,
        );
        assert_eq!(
            segments,
            vec![
                RenderedSegment::Literal("Pay ".into()),
                RenderedSegment::Input(InputField {
                    name: "amount".into(),
                    label: "amount".into(),
                    value: Some("100".into()),
                    editable: false,
                }),
                RenderedSegment::Literal(" to ".into()),
                RenderedSegment::Input(InputField {
                    name: "recipient".into(),
                    label: "recipient".into(),
                    value: Some("Bob".into()),
                    editable: false,
                }),
            ]
        );
        assert_eq!(plain_text(&segments), "Pay 100 to Bob");
    }

    #[test]
    fn render_editable_without_data_leaves_fields_empty() {
        let segments = render("Deliver {qty} units", &ContractArguments::new(), true, &Ledger::new());
        let RenderedSegment::Input(field) = &segments[1] else {
            panic!("expected input field");
        };
        assert!(field.editable);
        assert_eq!(field.value, None);
        assert_eq!(plain_text(&segments), "Deliver {qty} units");
    }

    #[test]
    fn editable_reference_options_dedup_by_hash() {
        let mut ledger = Ledger::new();
        learn(&mut ledger, 1, DefinitionKind::Offer, &["sha:a1", "sha:a2"]);
        learn(&mut ledger, 2, DefinitionKind::Offer, &["sha:b1"]);
        // Shares a hash with the first definition: skipped
        learn(&mut ledger, 3, DefinitionKind::Rejection, &["sha:c1", "sha:a2"]);

        let options = reference_options(&ledger, None, "prior:hash");
        let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["", "sha:a1", "sha:b1"]);
        assert!(options[0].selected);
        assert_eq!(options[0].description, "{prior:hash}");

        let mut seen = std::collections::HashSet::new();
        for option in options.iter().filter(|o| !o.is_unset()) {
            let def = ledger.definition(&option.value).unwrap();
            for hash in &def.hashes {
                assert!(seen.insert(hash.clone()), "hash offered twice: {hash}");
            }
        }
    }

    #[test]
    fn editable_reference_selects_bound_hash() {
        let mut ledger = Ledger::new();
        learn(&mut ledger, 1, DefinitionKind::Offer, &["sha:aaaa"]);
        learn(&mut ledger, 2, DefinitionKind::Acceptance, &["sha:bbbb", "sha:bbb2"]);

        let segments = render(
            "Ref {prior:hash}",
            &args(&[("prior:hash", "sha:bbb2")]),
            true,
            &ledger,
        );
        let RenderedSegment::Reference(field) = &segments[1] else {
            panic!("expected reference field");
        };
        assert!(field.editable());
        assert_eq!(field.form_key(), "prior:hash");
        assert_eq!(field.selected_value(), Some("sha:bbbb"));
        let ReferenceDisplay::Choices(options) = &field.display else {
            panic!("expected choices");
        };
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].description, "Acceptance [2] bbbb...");
    }

    #[test]
    fn editable_reference_with_unknown_bound_value_synthesizes_unset() {
        let mut ledger = Ledger::new();
        learn(&mut ledger, 1, DefinitionKind::Offer, &["sha:aaaa"]);
        let options = reference_options(&ledger, Some("sha:missing"), "x:hash");
        assert_eq!(options.len(), 2);
        assert!(options[0].is_unset() && options[0].selected);
        assert!(!options[1].selected);
    }

    #[test]
    fn read_only_reference_resolves_description() {
        let mut ledger = Ledger::new();
        learn(&mut ledger, 7, DefinitionKind::Offer, &["SHA-256:abcdef0123456789"]);

        let segments = render(
            "{prior:hash}",
            &args(&[("prior:hash", "SHA-256:abcdef0123456789")]),
            false,
            &ledger,
        );
        assert_eq!(plain_text(&segments), "Offer [7] abcdef01234567...");
    }

    #[test]
    fn read_only_reference_unknown_is_unresolved() {
        let segments = render(
            "{prior:hash}",
            &args(&[("prior:hash", "sha:nope")]),
            false,
            &Ledger::new(),
        );
        let RenderedSegment::Reference(field) = &segments[0] else {
            panic!("expected reference field");
        };
        assert_eq!(field.display, ReferenceDisplay::Unresolved);
        assert_eq!(field.selected_value(), Some("sha:nope"));
    }

    #[test]
    fn late_definition_resolves_rendered_reference() {
        let data = args(&[("prior:hash", "sha:abcdef"), ("amount", "5")]);
        let mut ledger = Ledger::new();
        let mut segments = render("Amends {prior:hash} for {amount}", &data, false, &ledger);
        assert_eq!(resolve_references(&mut segments, &ledger), 0);
        assert_eq!(plain_text(&segments), "Amends {prior:hash} for 5");

        learn(&mut ledger, 1, DefinitionKind::Offer, &["sha:abcdef"]);
        assert_eq!(resolve_references(&mut segments, &ledger), 1);
        assert_eq!(plain_text(&segments), "Amends Offer [1] abcdef... for 5");
        // Already resolved
        assert_eq!(resolve_references(&mut segments, &ledger), 0);
    }

    #[test]
    fn resolve_leaves_editable_choices_alone() {
        let mut ledger = Ledger::new();
        let mut segments = render("{prior:hash}", &ContractArguments::new(), true, &ledger);
        learn(&mut ledger, 1, DefinitionKind::Offer, &["sha:abcdef"]);
        assert_eq!(resolve_references(&mut segments, &ledger), 0);
        let RenderedSegment::Reference(field) = &segments[0] else {
            panic!("expected reference field");
        };
        assert!(field.editable());
    }

    #[test]
    fn plain_field_with_suffix_looks_up_full_placeholder() {
        let segments = render("{price:eur}", &args(&[("price:eur", "12")]), false, &Ledger::new());
        assert_eq!(segments[0].form_key().as_deref(), Some("price"));
        assert_eq!(plain_text(&segments), "12");
    }

    /// Documents current behaviour for malformed text.
    #[test]
    fn render_malformed_template_keeps_remainder_as_text() {
        let segments = render("Pay {amount", &ContractArguments::new(), true, &Ledger::new());
        assert_eq!(
            segments,
            vec![
                RenderedSegment::Literal("Pay ".into()),
                RenderedSegment::Literal("amount".into()),
            ]
        );
    }
}
