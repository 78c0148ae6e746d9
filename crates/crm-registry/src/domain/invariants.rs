//! # Input Invariants
//!
//! Pure checks run before any store call. A rejected input never causes a
//! write.

use shared_types::{Metadata, MetadataQuery};

use super::entities::BankingDetails;
use super::errors::RegistryError;
use super::value_objects::{
    CreateAliasInput, CreateHolderInput, HolderType, HolderUpdate, LinkType, RelatedPartyInput,
    UpdateAliasInput,
};

/// Parse an optional link type literal.
pub fn parse_link_type(value: Option<&str>) -> Result<Option<LinkType>, RegistryError> {
    value.map(str::parse::<LinkType>).transpose()
}

/// Name and document present; person details match the holder type.
pub fn validate_create_holder(input: &CreateHolderInput) -> Result<(), RegistryError> {
    if input.name.trim().is_empty() {
        return Err(RegistryError::MissingField("name"));
    }
    if input.document.trim().is_empty() {
        return Err(RegistryError::MissingField("document"));
    }
    check_person_details(
        input.holder_type,
        input.natural_person.is_some(),
        input.legal_person.is_some(),
    )?;
    input.metadata.validate()?;
    Ok(())
}

/// Holder update rules. The holder type is needed to check person details.
pub fn validate_holder_update(
    holder_type: HolderType,
    update: &HolderUpdate,
) -> Result<(), RegistryError> {
    if matches!(&update.name, Some(name) if name.trim().is_empty()) {
        return Err(RegistryError::MissingField("name"));
    }
    check_person_details(
        holder_type,
        update.natural_person.is_some(),
        update.legal_person.is_some(),
    )?;
    if let Some(metadata) = &update.metadata {
        metadata.validate()?;
    }
    Ok(())
}

fn check_person_details(
    holder_type: HolderType,
    has_natural: bool,
    has_legal: bool,
) -> Result<(), RegistryError> {
    match holder_type {
        HolderType::NaturalPerson if has_legal => Err(RegistryError::InvalidField {
            field: "legal_person",
            reason: "not allowed for NATURAL_PERSON holders".to_string(),
        }),
        HolderType::LegalPerson if has_natural => Err(RegistryError::InvalidField {
            field: "natural_person",
            reason: "not allowed for LEGAL_PERSON holders".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Validate a new Alias and return its parsed link request.
pub fn validate_create_alias(input: &CreateAliasInput) -> Result<Option<LinkType>, RegistryError> {
    if input.ledger_id.trim().is_empty() {
        return Err(RegistryError::MissingField("ledger_id"));
    }
    if input.account_id.trim().is_empty() {
        return Err(RegistryError::MissingField("account_id"));
    }
    let link_type = parse_link_type(input.link_type.as_deref())?;
    if let Some(details) = &input.banking_details {
        validate_banking_details(details)?;
    }
    for party in &input.related_parties {
        validate_related_party(party)?;
    }
    input.metadata.validate()?;
    Ok(link_type)
}

/// Validate an Alias update and return its parsed link request.
pub fn validate_update_alias(input: &UpdateAliasInput) -> Result<Option<LinkType>, RegistryError> {
    let link_type = parse_link_type(input.link_type.as_deref())?;
    if let Some(details) = &input.banking_details {
        validate_banking_details(details)?;
    }
    for party in &input.related_parties {
        validate_related_party(party)?;
    }
    if let Some(metadata) = &input.metadata {
        metadata.validate()?;
    }
    Ok(link_type)
}

fn validate_banking_details(details: &BankingDetails) -> Result<(), RegistryError> {
    if let (Some(opening), Some(closing)) = (details.opening_date, details.closing_date) {
        if closing < opening {
            return Err(RegistryError::InvalidField {
                field: "banking_details.closing_date",
                reason: "must not precede opening_date".to_string(),
            });
        }
    }
    Ok(())
}

/// Document and name present, role valid, end date not before start date.
pub fn validate_related_party(party: &RelatedPartyInput) -> Result<LinkType, RegistryError> {
    if party.document.trim().is_empty() {
        return Err(RegistryError::InvalidRelatedParty(
            "document is required".to_string(),
        ));
    }
    if party.name.trim().is_empty() {
        return Err(RegistryError::InvalidRelatedParty(
            "name is required".to_string(),
        ));
    }
    let role = party
        .role
        .parse::<LinkType>()
        .map_err(|_| RegistryError::InvalidRelatedParty(format!("invalid role {}", party.role)))?;
    if matches!(party.end_date, Some(end) if end < party.start_date) {
        return Err(RegistryError::InvalidRelatedParty(
            "end_date must not precede start_date".to_string(),
        ));
    }
    Ok(role)
}

/// Every removal path must address a metadata key.
pub fn validate_fields_to_remove(fields: &[String]) -> Result<Vec<String>, RegistryError> {
    fields
        .iter()
        .map(|path| Ok(Metadata::removal_key(path)?.to_string()))
        .collect()
}

/// Metadata query values must be scalar.
pub fn validate_metadata_query(query: &MetadataQuery) -> Result<(), RegistryError> {
    query
        .validate()
        .map_err(|e| RegistryError::InvalidQueryParameter(e.to_string()))
}
