//! # Value Objects
//!
//! Enumerations, write inputs, partial updates and list queries.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared_types::{Metadata, MetadataQuery, Pagination};
use uuid::Uuid;

use super::entities::{
    Addresses, BankingDetails, Contact, LegalPerson, NaturalPerson, RegulatoryFields,
    RelatedParty,
};
use super::errors::RegistryError;

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Type of relationship between a Holder and an Alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkType {
    /// Owner of the account. At most one per Alias.
    PrimaryHolder,
    /// Acts on behalf of the primary holder.
    LegalRepresentative,
    /// Financially responsible for the account.
    ResponsibleParty,
}

impl LinkType {
    /// Every valid link type.
    pub const ALL: [LinkType; 3] = [
        LinkType::PrimaryHolder,
        LinkType::LegalRepresentative,
        LinkType::ResponsibleParty,
    ];

    /// Wire name, e.g. `PRIMARY_HOLDER`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryHolder => "PRIMARY_HOLDER",
            Self::LegalRepresentative => "LEGAL_REPRESENTATIVE",
            Self::ResponsibleParty => "RESPONSIBLE_PARTY",
        }
    }

    /// Membership test against the closed set of link types.
    pub fn is_valid(value: &str) -> bool {
        Self::ALL.iter().any(|t| t.as_str() == value)
    }

    /// True for [`LinkType::PrimaryHolder`].
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::PrimaryHolder)
    }
}

impl FromStr for LinkType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RegistryError::InvalidLinkType(s.to_string()))
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Natural or legal person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HolderType {
    /// An individual.
    NaturalPerson,
    /// A company or other legal entity.
    LegalPerson,
}

/// Entity kinds, used for error context and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Holder
    Holder,
    /// Alias
    Alias,
    /// HolderLink
    HolderLink,
    /// Related party embedded in an Alias
    RelatedParty,
}

impl EntityKind {
    /// Snake-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Holder => "holder",
            Self::Alias => "alias",
            Self::HolderLink => "holder_link",
            Self::RelatedParty => "related_party",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// HOLDER INPUTS
// =============================================================================

/// Fields for a new Holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateHolderInput {
    /// Caller-side reference.
    pub external_id: Option<String>,
    /// Natural or legal person.
    pub holder_type: HolderType,
    /// Full name.
    pub name: String,
    /// Tax document.
    pub document: String,
    /// Postal addresses.
    pub addresses: Option<Addresses>,
    /// Contact channels.
    pub contact: Option<Contact>,
    /// Natural person details.
    pub natural_person: Option<NaturalPerson>,
    /// Legal person details.
    pub legal_person: Option<LegalPerson>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl CreateHolderInput {
    /// Minimal natural-person input.
    pub fn natural_person(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            external_id: None,
            holder_type: HolderType::NaturalPerson,
            name: name.into(),
            document: document.into(),
            addresses: None,
            contact: None,
            natural_person: None,
            legal_person: None,
            metadata: Metadata::default(),
        }
    }
}

/// Partial Holder update. `None` leaves a field unchanged.
///
/// The tax document is immutable once created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderUpdate {
    /// New external reference.
    pub external_id: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// Replacement addresses.
    pub addresses: Option<Addresses>,
    /// Replacement contact block.
    pub contact: Option<Contact>,
    /// Replacement natural person block.
    pub natural_person: Option<NaturalPerson>,
    /// Replacement legal person block.
    pub legal_person: Option<LegalPerson>,
    /// Keys merged into the stored metadata.
    pub metadata: Option<Metadata>,
}

// =============================================================================
// ALIAS INPUTS
// =============================================================================

/// A related party as supplied by callers (no id yet, role unparsed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedPartyInput {
    /// Tax document.
    pub document: String,
    /// Full name.
    pub name: String,
    /// Link type literal, e.g. `LEGAL_REPRESENTATIVE`.
    pub role: String,
    /// Start of the relationship.
    pub start_date: NaiveDate,
    /// End of the relationship.
    pub end_date: Option<NaiveDate>,
}

impl RelatedPartyInput {
    /// Assign a fresh id.
    pub fn into_related_party(self, role: LinkType) -> RelatedParty {
        RelatedParty {
            id: Uuid::new_v4(),
            document: self.document,
            name: self.name,
            role,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Fields for a new Alias. The document is copied from the owning Holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAliasInput {
    /// Owning ledger.
    pub ledger_id: String,
    /// External account identifier.
    pub account_id: String,
    /// Free-form alias type.
    pub alias_type: Option<String>,
    /// Banking details.
    pub banking_details: Option<BankingDetails>,
    /// Regulatory fields.
    pub regulatory_fields: Option<RegulatoryFields>,
    /// Related parties.
    #[serde(default)]
    pub related_parties: Vec<RelatedPartyInput>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Link to create between the Holder and the new Alias.
    pub link_type: Option<String>,
}

impl CreateAliasInput {
    /// Minimal input for an account binding.
    pub fn new(ledger_id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            ledger_id: ledger_id.into(),
            account_id: account_id.into(),
            alias_type: None,
            banking_details: None,
            regulatory_fields: None,
            related_parties: Vec::new(),
            metadata: Metadata::default(),
            link_type: None,
        }
    }

    /// Builder-style link request.
    pub fn with_link_type(mut self, link_type: LinkType) -> Self {
        self.link_type = Some(link_type.as_str().to_string());
        self
    }
}

/// Caller-facing Alias update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateAliasInput {
    /// New alias type.
    pub alias_type: Option<String>,
    /// Banking fields to set; unset inner fields are left unchanged.
    pub banking_details: Option<BankingDetails>,
    /// Regulatory fields to set.
    pub regulatory_fields: Option<RegulatoryFields>,
    /// Related parties appended to the existing list.
    #[serde(default)]
    pub related_parties: Vec<RelatedPartyInput>,
    /// Keys merged into the stored metadata.
    pub metadata: Option<Metadata>,
    /// Link to attach between the owning Holder and this Alias.
    pub link_type: Option<String>,
}

/// Persisted Alias changes.
///
/// `related_parties` replaces the stored list wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasUpdate {
    /// New alias type.
    pub alias_type: Option<String>,
    /// Banking fields to set.
    pub banking_details: Option<BankingDetails>,
    /// Regulatory fields to set.
    pub regulatory_fields: Option<RegulatoryFields>,
    /// Complete replacement list.
    pub related_parties: Option<Vec<RelatedParty>>,
    /// Keys merged into the stored metadata.
    pub metadata: Option<Metadata>,
}

// =============================================================================
// HOLDER LINK INPUTS
// =============================================================================

/// Fields for a new HolderLink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateHolderLinkInput {
    /// Linked Holder.
    pub holder_id: Uuid,
    /// Linked Alias.
    pub alias_id: Uuid,
    /// Link type literal.
    pub link_type: String,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Partial HolderLink update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderLinkUpdate {
    /// Keys merged into the stored metadata.
    pub metadata: Option<Metadata>,
}

// =============================================================================
// QUERIES
// =============================================================================

/// Holder list filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolderQuery {
    /// Exact external reference.
    pub external_id: Option<String>,
    /// Tax document, matched through its search token.
    pub document: Option<String>,
    /// Metadata equality filters.
    pub metadata: MetadataQuery,
    /// Page request. `None` uses the configured default limit.
    pub pagination: Option<Pagination>,
}

/// Alias list filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasQuery {
    /// Owning Holder.
    pub holder_id: Option<Uuid>,
    /// Exact account id.
    pub account_id: Option<String>,
    /// Exact ledger id.
    pub ledger_id: Option<String>,
    /// Tax document, via search token.
    pub document: Option<String>,
    /// Plaintext branch.
    pub banking_details_branch: Option<String>,
    /// Account number, via search token.
    pub banking_details_account: Option<String>,
    /// IBAN, via search token.
    pub banking_details_iban: Option<String>,
    /// Participant document, via search token.
    pub regulatory_fields_participant_document: Option<String>,
    /// Any related party's document, via search token.
    pub related_party_document: Option<String>,
    /// Metadata equality filters.
    pub metadata: MetadataQuery,
    /// Page request.
    pub pagination: Option<Pagination>,
}

/// HolderLink list filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolderLinkQuery {
    /// Linked Holder.
    pub holder_id: Option<Uuid>,
    /// Linked Alias.
    pub alias_id: Option<Uuid>,
    /// Link type literal.
    pub link_type: Option<String>,
    /// Metadata equality filters.
    pub metadata: MetadataQuery,
    /// Page request.
    pub pagination: Option<Pagination>,
}
