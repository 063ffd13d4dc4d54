//! Contact domain types and field validation.

use serde::{Deserialize, Serialize};

use crate::entity::{Direction, Entity, EntityId, OrderKey, ValidationError};
use crate::mapper::{self, MappingError};

/// An address-book entry tracked by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Server-assigned id.
    pub id: EntityId,
    /// Full name: at least two words, no digits.
    pub name: String,
    /// Structurally valid email address.
    pub email: String,
    /// Digits with an optional leading `+` (normalized on input).
    pub phone: String,
}

/// Client-supplied fields of a new contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number; separators are tolerated and normalized out.
    pub phone: String,
}

/// Partial update to a contact. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    /// New name.
    pub name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
}

/// Checks the two-words / no-digits name rule.
fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::NameHasDigits);
    }
    if name.split_whitespace().count() < 2 {
        return Err(ValidationError::NameTooShort);
    }
    Ok(())
}

/// Structural email check: one `@`, non-empty local part, dotted domain.
fn check_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::EmailInvalid(email.to_string());
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || email.chars().any(char::is_whitespace) || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

/// Strips separators and checks the digits-with-optional-`+` phone rule,
/// returning the normalized number.
fn normalize_phone(phone: &str) -> Result<String, ValidationError> {
    let normalized: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = normalized.strip_prefix('+').unwrap_or(&normalized);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PhoneInvalid(phone.to_string()));
    }
    Ok(normalized)
}

impl ContactDraft {
    /// Returns a copy of the draft with the phone number normalized.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PhoneInvalid`] if the phone number
    /// contains anything besides digits, separators and a leading `+`.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: normalize_phone(&self.phone)?,
        })
    }
}

impl Entity for Contact {
    type Draft = ContactDraft;
    type Patch = ContactPatch;

    const TABLE: &'static str = "contacts";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn order() -> &'static [OrderKey] {
        &[OrderKey {
            column: "name",
            direction: Direction::Ascending,
            nulls_last: true,
        }]
    }

    fn apply_patch(&mut self, patch: &ContactPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            // validate_patch already rejected unnormalizable phones
            self.phone = normalize_phone(phone).unwrap_or_else(|_| phone.clone());
        }
    }

    fn validate_draft(draft: &ContactDraft) -> Result<(), ValidationError> {
        check_name(&draft.name)?;
        check_email(&draft.email)?;
        normalize_phone(&draft.phone)?;
        Ok(())
    }

    fn validate_patch(patch: &ContactPatch) -> Result<(), ValidationError> {
        if let Some(name) = &patch.name {
            check_name(name)?;
        }
        if let Some(email) = &patch.email {
            check_email(email)?;
        }
        if let Some(phone) = &patch.phone {
            normalize_phone(phone)?;
        }
        Ok(())
    }

    fn from_record(record: &serde_json::Value) -> Result<Self, MappingError> {
        mapper::contact_from_record(record)
    }

    fn draft_to_record(draft: &ContactDraft) -> serde_json::Value {
        // validate_draft already rejected unnormalizable phones
        let draft = draft.normalized().unwrap_or_else(|_| draft.clone());
        mapper::contact_draft_to_record(&draft)
    }

    fn patch_to_record(patch: &ContactPatch) -> serde_json::Map<String, serde_json::Value> {
        let mut patch = patch.clone();
        if let Some(phone) = &patch.phone {
            if let Ok(normalized) = normalize_phone(phone) {
                patch.phone = Some(normalized);
            }
        }
        mapper::contact_patch_to_record(&patch)
    }
}
