//! Offer and counter-offer dialogs
//!
//! A form renders its template editable, collects field values keyed by
//! their submission key and validates them before anything is sent.

use crate::error::NegotiatorError;
use indexmap::IndexMap;
use negotiator_client::{CounterOffer, OfferSubmission};
use negotiator_contract::{
    render, ContractArguments, Directory, Ledger, NegotiationId, Party, ReferenceDisplay,
    RenderedSegment, Template, TrustedContract, TrustedOffer,
};
use negotiator_inbox::ReconcileError;
use std::collections::HashMap;

/// Key under which a missing receiver is reported
pub const RECEIVER_FIELD: &str = "receiver";

/// Fields that failed validation, with a message each
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("invalid fields: {}", join_keys(.errors))]
pub struct ValidationErrors {
    errors: IndexMap<String, String>,
}

fn join_keys(errors: &IndexMap<String, String>) -> String {
    errors.keys().cloned().collect::<Vec<_>>().join(", ")
}

impl ValidationErrors {
    fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    /// Error of one field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Invalid fields in form order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// Check if every field is valid
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of invalid fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

/// Field values of a rendered body, keyed by submission key
#[derive(Debug, Clone, Default)]
struct FieldValues {
    values: ContractArguments,
    /// Selectable values of editable reference fields
    choices: HashMap<String, Vec<String>>,
}

impl FieldValues {
    fn from_segments(segments: &[RenderedSegment]) -> Self {
        let mut values = ContractArguments::new();
        let mut choices = HashMap::new();
        for segment in segments {
            let (key, value) = match segment {
                RenderedSegment::Literal(_) => continue,
                RenderedSegment::Input(field) => (field.name.clone(), field.value.clone()),
                RenderedSegment::Reference(field) => {
                    if let ReferenceDisplay::Choices(options) = &field.display {
                        choices.insert(
                            field.form_key(),
                            options.iter().map(|option| option.value.clone()).collect(),
                        );
                    }
                    (field.form_key(), field.selected_value().map(str::to_string))
                }
            };
            values.entry(key).or_insert_with(|| value.unwrap_or_default());
        }
        Self { values, choices }
    }

    /// Set a field and mirror the value into `body`
    ///
    /// Reference fields only accept one of their option values.
    fn set(&mut self, body: &mut [RenderedSegment], key: &str, value: String) -> bool {
        if let Some(choices) = self.choices.get(key) {
            if !choices.contains(&value) {
                tracing::debug!("'{}' is not a selectable value of '{}'", value, key);
                return false;
            }
        }
        let Some(slot) = self.values.get_mut(key) else {
            tracing::debug!("Ignoring value for unknown field '{}'", key);
            return false;
        };
        slot.clone_from(&value);

        for segment in body.iter_mut() {
            match segment {
                RenderedSegment::Input(field) if field.name == key => {
                    field.value = Some(value.clone());
                }
                RenderedSegment::Reference(field) if field.form_key() == key => {
                    if let ReferenceDisplay::Choices(options) = &mut field.display {
                        for option in options.iter_mut() {
                            option.selected = option.value == value;
                        }
                    }
                    field.value = Some(value.clone());
                }
                _ => {}
            }
        }
        true
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        for (key, value) in &self.values {
            if value.trim().is_empty() {
                errors.add(key.clone(), "required");
            }
        }
    }
}

/// Dialog for a new offer
#[derive(Debug, Clone)]
pub struct OfferForm {
    template: Template,
    receivers: Vec<Party>,
    receiver: Option<String>,
    body: Vec<RenderedSegment>,
    values: FieldValues,
    errors: ValidationErrors,
}

impl OfferForm {
    /// Open a form for `template`
    ///
    /// Receivers are all known parties but the local identity; none is
    /// selected.
    #[must_use]
    pub fn new(template: Template, directory: &Directory, ledger: &Ledger) -> Self {
        let body = render(&template.text, &ContractArguments::new(), true, ledger);
        let values = FieldValues::from_segments(&body);
        Self {
            receivers: directory.counterparties().cloned().collect(),
            template,
            receiver: None,
            body,
            values,
            errors: ValidationErrors::default(),
        }
    }

    /// Template offered
    #[inline]
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Heading line
    #[must_use]
    pub fn title(&self) -> String {
        format!("Offer {} to", self.template.label)
    }

    /// Selectable receivers
    #[inline]
    #[must_use]
    pub fn receivers(&self) -> &[Party] {
        &self.receivers
    }

    /// Selected receiver
    #[inline]
    #[must_use]
    pub fn receiver(&self) -> Option<&str> {
        self.receiver.as_deref()
    }

    /// Rendered editable body
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[RenderedSegment] {
        &self.body
    }

    /// Submission keys in form order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.values.keys().map(String::as_str)
    }

    /// Value of a field
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.values.get(key).map(String::as_str)
    }

    /// Set a field; returns whether the field exists
    pub fn set_field(&mut self, key: &str, value: impl Into<String>) -> bool {
        self.values.set(&mut self.body, key, value.into())
    }

    /// Select receiver by name; returns whether it is selectable
    pub fn select_receiver(&mut self, name: &str) -> bool {
        if self.receivers.iter().any(|party| party.name == name) {
            self.receiver = Some(name.to_string());
            true
        } else {
            tracing::debug!("'{}' is not a selectable receiver", name);
            false
        }
    }

    /// Errors of the last validation
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Validate and collect the submission
    ///
    /// # Errors
    /// Returns the invalid fields when a field is blank or no receiver is
    /// selected; they also stay recorded on the form.
    pub fn validate(&mut self) -> Result<OfferSubmission, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.receiver.is_none() {
            errors.add(RECEIVER_FIELD, "required");
        }
        self.values.validate(&mut errors);
        self.errors = errors.clone();

        match &self.receiver {
            Some(receiver) if errors.is_empty() => Ok(OfferSubmission {
                receiver: receiver.clone(),
                contract: self.values.values.clone(),
                template: self.template.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Dialog for countering a received offer
#[derive(Debug, Clone)]
pub struct CounterOfferForm {
    negotiation: NegotiationId,
    offer: TrustedOffer,
    me: String,
    template: Template,
    receiver: Party,
    body: Vec<RenderedSegment>,
    values: FieldValues,
    errors: ValidationErrors,
}

impl CounterOfferForm {
    /// Open a form countering `offer`
    ///
    /// The receiver is fixed to the offeror; the body is pre-filled from the
    /// offer's first contract.
    ///
    /// # Errors
    /// Fails when the identity is not loaded, the offer has no contract, or
    /// its template or offeror is unknown.
    pub fn new(
        negotiation: NegotiationId,
        offer: TrustedOffer,
        directory: &Directory,
        ledger: &Ledger,
    ) -> Result<Self, NegotiatorError> {
        let me = directory
            .me()
            .ok_or(NegotiatorError::IdentityUnknown)?
            .name
            .clone();
        let contract = offer
            .primary_contract()
            .ok_or(ReconcileError::MissingContract(negotiation))?;
        let template = directory
            .template_by_name(&contract.template_name)
            .map_err(ReconcileError::from)?
            .clone();
        let receiver = directory
            .party_by_name(&offer.offeror_name)
            .map_err(ReconcileError::from)?
            .clone();

        let body = render(&template.text, &contract.arguments, true, ledger);
        let values = FieldValues::from_segments(&body);
        Ok(Self {
            negotiation,
            offer,
            me,
            template,
            receiver,
            body,
            values,
            errors: ValidationErrors::default(),
        })
    }

    /// Negotiation countered
    #[inline]
    #[must_use]
    pub fn negotiation(&self) -> NegotiationId {
        self.negotiation
    }

    /// Heading line
    #[must_use]
    pub fn title(&self) -> String {
        format!("Offer {} to {}", self.template.label, self.receiver.label)
    }

    /// Fixed receiver
    #[inline]
    #[must_use]
    pub fn receiver(&self) -> &Party {
        &self.receiver
    }

    /// Rendered editable body
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[RenderedSegment] {
        &self.body
    }

    /// Submission keys in form order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.values.keys().map(String::as_str)
    }

    /// Value of a field
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.values.get(key).map(String::as_str)
    }

    /// Set a field; returns whether the field exists
    pub fn set_field(&mut self, key: &str, value: impl Into<String>) -> bool {
        self.values.set(&mut self.body, key, value.into())
    }

    /// Errors of the last validation
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Validate and collect the counter-offer
    ///
    /// # Errors
    /// Returns the blank fields; they also stay recorded on the form.
    pub fn validate(&mut self) -> Result<CounterOffer, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        self.values.validate(&mut errors);
        self.errors = errors.clone();
        if !errors.is_empty() {
            return Err(errors);
        }

        let offer = TrustedOffer {
            negotiation_id: None,
            offeror_name: self.me.clone(),
            receiver_name: self.offer.offeror_name.clone(),
            valid_after: self.offer.valid_after.clone(),
            valid_until: self.offer.valid_until.clone(),
            offered_at: self.offer.offered_at.clone(),
            contracts: vec![TrustedContract::new(
                self.template.name.clone(),
                self.values.values.clone(),
            )],
        };
        Ok(CounterOffer::new(self.negotiation, offer))
    }
}

/// Open dialog
#[derive(Debug, Clone)]
pub enum Dialog {
    Offer(OfferForm),
    CounterOffer(CounterOfferForm),
}

#[cfg(test)]
mod tests {
    use super::*;
    use negotiator_contract::{Definition, DefinitionHash, DefinitionKind, HashDigest};
    use pretty_assertions::assert_eq;

    fn directory() -> Directory {
        Directory::new()
            .with_me(Party::new("alice", "Alice Ltd"))
            .with_parties(vec![
                Party::new("alice", "Alice Ltd"),
                Party::new("bob", "Bob Inc"),
                Party::new("carol", "Carol AB"),
            ])
            .with_templates(vec![template()])
    }

    fn template() -> Template {
        Template::new("pay.txt", "Payment", "Pay {amount} to {recipient}")
    }

    #[test]
    fn offer_form_excludes_me_and_selects_nobody() {
        let form = OfferForm::new(template(), &directory(), &Ledger::new());
        let names: Vec<_> = form.receivers().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "carol"]);
        assert_eq!(form.receiver(), None);
        assert_eq!(form.fields().collect::<Vec<_>>(), vec!["amount", "recipient"]);
    }

    #[test]
    fn offer_form_rejects_blank_fields_and_missing_receiver() {
        let mut form = OfferForm::new(template(), &directory(), &Ledger::new());
        form.set_field("amount", "   ");
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec![RECEIVER_FIELD, "amount", "recipient"]
        );
        assert_eq!(form.errors(), &errors);
    }

    #[test]
    fn offer_form_collects_submission() {
        let mut form = OfferForm::new(template(), &directory(), &Ledger::new());
        assert!(!form.select_receiver("alice"));
        assert!(form.select_receiver("bob"));
        assert!(form.set_field("amount", "100"));
        assert!(form.set_field("recipient", "Bob"));
        assert!(!form.set_field("unknown", "x"));

        let submission = form.validate().unwrap();
        assert_eq!(submission.receiver, "bob");
        assert_eq!(submission.template.name, "pay.txt");
        assert_eq!(submission.contract.get("amount").map(String::as_str), Some("100"));
        assert!(form.errors().is_empty());
    }

    #[test]
    fn reference_field_uses_hash_key() {
        let mut ledger = Ledger::new();
        ledger.learn(
            NegotiationId(1),
            Definition::new(
                DefinitionKind::Offer,
                NegotiationId(1),
                vec![DefinitionHash::from_digest(&HashDigest::new("SHA-256", "abc"))],
                serde_json::json!({}),
            ),
        );
        let template = Template::new("ref.txt", "Ref", "Refers to {prior:hash}");
        let mut form = OfferForm::new(template, &directory(), &ledger);
        assert_eq!(form.fields().collect::<Vec<_>>(), vec!["prior:hash"]);
        let RenderedSegment::Reference(field) = &form.body()[1] else {
            panic!("expected reference field");
        };
        assert!(matches!(field.display, ReferenceDisplay::Choices(ref o) if o.len() == 2));

        assert!(form.set_field("prior:hash", "SHA-256:abc"));
        form.select_receiver("bob");
        let submission = form.validate().unwrap();
        assert_eq!(
            submission.contract.get("prior:hash").map(String::as_str),
            Some("SHA-256:abc")
        );
    }

    #[test]
    fn reference_field_accepts_only_listed_hashes() {
        let mut ledger = Ledger::new();
        ledger.learn(
            NegotiationId(1),
            Definition::new(
                DefinitionKind::Offer,
                NegotiationId(1),
                vec![DefinitionHash::from_digest(&HashDigest::new("SHA-256", "abc"))],
                serde_json::json!({}),
            ),
        );
        let template = Template::new("ref.txt", "Ref", "Refers to {prior:hash}");
        let mut form = OfferForm::new(template, &directory(), &ledger);

        assert!(!form.set_field("prior:hash", "SHA-256:forged"));
        assert_eq!(form.value("prior:hash"), Some(""));

        assert!(form.set_field("prior:hash", "SHA-256:abc"));
        let RenderedSegment::Reference(field) = &form.body()[1] else {
            panic!("expected reference field");
        };
        assert_eq!(field.selected_value(), Some("SHA-256:abc"));
        let ReferenceDisplay::Choices(options) = &field.display else {
            panic!("expected choices");
        };
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);

        // Back to the unset option
        assert!(form.set_field("prior:hash", ""));
        let RenderedSegment::Reference(field) = &form.body()[1] else {
            panic!("expected reference field");
        };
        assert_eq!(field.selected_value(), Some(""));
        form.select_receiver("bob");
        assert_eq!(form.validate().unwrap_err().get("prior:hash"), Some("required"));
    }

    #[test]
    fn set_field_mirrors_value_into_body() {
        let mut form = OfferForm::new(template(), &directory(), &Ledger::new());
        form.set_field("amount", "250");
        assert_eq!(
            negotiator_contract::plain_text(form.body()),
            "Pay 250 to {recipient}"
        );
    }

    fn received_offer() -> TrustedOffer {
        let mut args = ContractArguments::new();
        args.insert("amount".into(), "100".into());
        args.insert("recipient".into(), "Bob".into());
        let mut offer = TrustedOffer::new("bob", "alice", TrustedContract::new("pay.txt", args));
        offer.valid_until = Some("2030-01-01T00:00:00Z".into());
        offer.offered_at = Some("2024-05-01T10:00:00Z".into());
        offer
    }

    #[test]
    fn counter_form_prefills_and_targets_offeror() {
        let mut form = CounterOfferForm::new(
            NegotiationId(7),
            received_offer(),
            &directory(),
            &Ledger::new(),
        )
        .unwrap();
        assert_eq!(form.title(), "Offer Payment to Bob Inc");
        assert_eq!(form.value("amount"), Some("100"));

        form.set_field("amount", "90");
        let counter = form.validate().unwrap();
        assert_eq!(counter.negotiation_id, NegotiationId(7));
        assert_eq!(counter.offer.offeror_name, "alice");
        assert_eq!(counter.offer.receiver_name, "bob");
        assert_eq!(counter.offer.valid_until.as_deref(), Some("2030-01-01T00:00:00Z"));
        assert_eq!(counter.offer.offered_at.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(
            counter.offer.contracts[0].arguments.get("amount").map(String::as_str),
            Some("90")
        );
    }

    #[test]
    fn counter_form_rejects_blank_field() {
        let mut form = CounterOfferForm::new(
            NegotiationId(7),
            received_offer(),
            &directory(),
            &Ledger::new(),
        )
        .unwrap();
        form.set_field("recipient", "");
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("recipient"), Some("required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn counter_form_requires_identity() {
        let directory = Directory::new().with_templates(vec![template()]);
        let err = CounterOfferForm::new(NegotiationId(1), received_offer(), &directory, &Ledger::new())
            .unwrap_err();
        assert!(matches!(err, NegotiatorError::IdentityUnknown));
    }
}
