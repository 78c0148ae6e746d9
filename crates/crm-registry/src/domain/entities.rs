//! # Domain Entities
//!
//! Plaintext views of Holder, Alias and HolderLink. Encryption happens only
//! at the persistence boundary (see `mapper`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared_types::Metadata;
use uuid::Uuid;

use super::value_objects::{HolderType, LinkType};

// =============================================================================
// HOLDER
// =============================================================================

/// A natural or legal person that can own ledger account bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holder {
    /// Identifier.
    pub id: Uuid,
    /// Caller-side reference.
    pub external_id: Option<String>,
    /// Natural or legal person.
    pub holder_type: HolderType,
    /// Full name (sensitive).
    pub name: String,
    /// Tax document (sensitive, searchable).
    pub document: String,
    /// Postal addresses.
    pub addresses: Option<Addresses>,
    /// Contact channels (sensitive).
    pub contact: Option<Contact>,
    /// Natural person details.
    pub natural_person: Option<NaturalPerson>,
    /// Legal person details.
    pub legal_person: Option<LegalPerson>,
    /// Free-form metadata.
    pub metadata: Metadata,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete instant.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Postal addresses of a Holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addresses {
    /// Main address.
    pub primary: Option<Address>,
    /// First additional address.
    pub additional_1: Option<Address>,
    /// Second additional address.
    pub additional_2: Option<Address>,
}

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street and number.
    pub line1: String,
    /// Complement.
    pub line2: Option<String>,
    /// Postal code.
    pub zip_code: String,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// ISO country code.
    pub country: String,
}

/// Contact channels. Every field is sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Main e-mail.
    pub primary_email: Option<String>,
    /// Secondary e-mail.
    pub secondary_email: Option<String>,
    /// Mobile phone.
    pub mobile_phone: Option<String>,
    /// Other phone.
    pub other_phone: Option<String>,
}

/// Details specific to natural persons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalPerson {
    /// Preferred name.
    pub favorite_name: Option<String>,
    /// Social name.
    pub social_name: Option<String>,
    /// Gender.
    pub gender: Option<String>,
    /// Birth date.
    pub birth_date: Option<NaiveDate>,
    /// Civil status.
    pub civil_status: Option<String>,
    /// Nationality.
    pub nationality: Option<String>,
    /// Mother's name (sensitive).
    pub mother_name: Option<String>,
    /// Father's name (sensitive).
    pub father_name: Option<String>,
    /// Status.
    pub status: Option<String>,
}

/// Details specific to legal persons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalPerson {
    /// Trade name.
    pub trade_name: Option<String>,
    /// Business activity.
    pub activity: Option<String>,
    /// Legal form.
    pub legal_type: Option<String>,
    /// Founding date.
    pub founding_date: Option<NaiveDate>,
    /// Company size.
    pub size: Option<String>,
    /// Status.
    pub status: Option<String>,
    /// Legal representative.
    pub representative: Option<Representative>,
}

/// Legal representative of a legal person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representative {
    /// Name (sensitive).
    pub name: String,
    /// Tax document (sensitive).
    pub document: String,
    /// E-mail (sensitive).
    pub email: Option<String>,
    /// Role in the company.
    pub role: Option<String>,
}

// =============================================================================
// ALIAS
// =============================================================================

/// A binding between a ledger account and a Holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    /// Identifier.
    pub id: Uuid,
    /// Owning ledger.
    pub ledger_id: String,
    /// External account identifier.
    pub account_id: String,
    /// Owning Holder.
    pub holder_id: Uuid,
    /// Tax document copied from the Holder (sensitive, searchable).
    pub document: String,
    /// Free-form alias type.
    pub alias_type: Option<String>,
    /// Banking details.
    pub banking_details: Option<BankingDetails>,
    /// Regulatory fields.
    pub regulatory_fields: Option<RegulatoryFields>,
    /// Related parties.
    pub related_parties: Vec<RelatedParty>,
    /// Free-form metadata.
    pub metadata: Metadata,
    /// Current HolderLinks, filled at read time and never persisted.
    #[serde(default)]
    pub holder_links: Vec<HolderLink>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete instant.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Banking details of an Alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankingDetails {
    /// Branch (plaintext, filterable).
    pub branch: Option<String>,
    /// Account number (sensitive, searchable).
    pub account: Option<String>,
    /// IBAN (sensitive, searchable).
    pub iban: Option<String>,
    /// Account type.
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    /// Opening date.
    pub opening_date: Option<NaiveDate>,
    /// Closing date.
    pub closing_date: Option<NaiveDate>,
    /// ISO country code.
    pub country_code: Option<String>,
    /// Bank identifier.
    pub bank_id: Option<String>,
}

/// Regulatory fields of an Alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulatoryFields {
    /// Participant document (sensitive, searchable).
    pub participant_document: Option<String>,
}

/// A party related to an Alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedParty {
    /// Identifier.
    pub id: Uuid,
    /// Tax document (sensitive, searchable).
    pub document: String,
    /// Full name.
    pub name: String,
    /// Relationship role.
    pub role: LinkType,
    /// Start of the relationship.
    pub start_date: NaiveDate,
    /// End of the relationship.
    pub end_date: Option<NaiveDate>,
}

// =============================================================================
// HOLDER LINK
// =============================================================================

/// A typed edge from a Holder to an Alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderLink {
    /// Identifier.
    pub id: Uuid,
    /// Linked Holder.
    pub holder_id: Uuid,
    /// Linked Alias.
    pub alias_id: Uuid,
    /// Relationship type.
    pub link_type: LinkType,
    /// Free-form metadata.
    pub metadata: Metadata,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete instant.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl HolderLink {
    /// New link with `created_at == updated_at`.
    pub fn new(holder_id: Uuid, alias_id: Uuid, link_type: LinkType, metadata: Metadata) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            holder_id,
            alias_id,
            link_type,
            metadata,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// False once soft-deleted.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
