//! Parties and templates known to the client

use serde::{Deserialize, Serialize};

/// A negotiating party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// System name used on the wire
    pub name: String,
    /// Human-readable label
    pub label: String,
}

impl Party {
    /// Create new party
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Contract template served by the negotiation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Unique template name
    pub name: String,
    /// Human-readable label
    pub label: String,
    /// Template text with `{placeholder}` fields
    pub text: String,
}

impl Template {
    /// Create new template
    #[inline]
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Reference data loaded from the service: identity, parties, templates
#[derive(Debug, Clone, Default)]
pub struct Directory {
    me: Option<Party>,
    parties: Vec<Party>,
    templates: Vec<Template>,
}

impl Directory {
    /// Create empty directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With identity
    #[inline]
    #[must_use]
    pub fn with_me(mut self, me: Party) -> Self {
        self.me = Some(me);
        self
    }

    /// With parties
    #[inline]
    #[must_use]
    pub fn with_parties(mut self, parties: Vec<Party>) -> Self {
        self.parties = parties;
        self
    }

    /// With templates
    #[inline]
    #[must_use]
    pub fn with_templates(mut self, templates: Vec<Template>) -> Self {
        self.templates = templates;
        self
    }

    /// Replace identity
    pub fn set_me(&mut self, me: Party) {
        self.me = Some(me);
    }

    /// Replace parties
    pub fn set_parties(&mut self, parties: Vec<Party>) {
        self.parties = parties;
    }

    /// Replace templates
    pub fn set_templates(&mut self, templates: Vec<Template>) {
        self.templates = templates;
    }

    /// Identity of the local party, once loaded
    #[inline]
    #[must_use]
    pub fn me(&self) -> Option<&Party> {
        self.me.as_ref()
    }

    /// All known parties
    #[inline]
    #[must_use]
    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    /// All known templates
    #[inline]
    #[must_use]
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Parties other than the local one, in directory order
    pub fn counterparties(&self) -> impl Iterator<Item = &Party> {
        let me = self.me.as_ref().map(|me| me.name.as_str());
        self.parties
            .iter()
            .filter(move |party| Some(party.name.as_str()) != me)
    }

    /// Find party by name, falling back to the local identity
    ///
    /// # Errors
    /// Returns [`LookupError::UnknownParty`] if neither matches.
    pub fn party_by_name(&self, name: &str) -> Result<&Party, LookupError> {
        self.parties
            .iter()
            .find(|party| party.name == name)
            .or_else(|| self.me.as_ref().filter(|me| me.name == name))
            .ok_or_else(|| LookupError::UnknownParty(name.to_string()))
    }

    /// Find template by name
    ///
    /// # Errors
    /// Returns [`LookupError::UnknownTemplate`] if no template matches.
    pub fn template_by_name(&self, name: &str) -> Result<&Template, LookupError> {
        self.templates
            .iter()
            .find(|template| template.name == name)
            .ok_or_else(|| LookupError::UnknownTemplate(name.to_string()))
    }
}

/// Reference data lookup failures
///
/// Usually transient: entries can arrive before templates or parties load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// No party with the given name
    #[error("no party named '{0}' is known")]
    UnknownParty(String),

    /// No template with the given name
    #[error("no template named '{0}' is known")]
    UnknownTemplate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Directory {
        Directory::new()
            .with_me(Party::new("alice", "Alice Ltd"))
            .with_parties(vec![
                Party::new("alice", "Alice Ltd"),
                Party::new("bob", "Bob Inc"),
                Party::new("carol", "Carol AB"),
            ])
            .with_templates(vec![Template::new("pay.txt", "Payment", "Pay {amount}")])
    }

    #[test]
    fn party_lookup_falls_back_to_me() {
        let dir = Directory::new()
            .with_me(Party::new("me", "Myself"))
            .with_parties(vec![Party::new("bob", "Bob")]);
        assert_eq!(dir.party_by_name("me").unwrap().label, "Myself");
        assert_eq!(dir.party_by_name("bob").unwrap().label, "Bob");
    }

    #[test]
    fn unknown_party_is_lookup_error() {
        let err = directory().party_by_name("mallory").unwrap_err();
        assert_eq!(err, LookupError::UnknownParty("mallory".into()));
        assert_eq!(err.to_string(), "no party named 'mallory' is known");
    }

    #[test]
    fn template_lookup() {
        let dir = directory();
        assert_eq!(dir.template_by_name("pay.txt").unwrap().label, "Payment");
        assert!(matches!(
            dir.template_by_name("nope"),
            Err(LookupError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn counterparties_exclude_me() {
        let dir = directory();
        let names: Vec<_> = dir.counterparties().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "carol"]);
    }
}
