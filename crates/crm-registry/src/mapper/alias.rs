//! Alias document.
//!
//! Encrypted and searchable: document, banking account, banking IBAN,
//! regulatory participant document, and each related party's document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::Metadata;
use uuid::Uuid;

use super::{decrypt_opt, decrypt_str, encrypt_opt, encrypt_str, hash_opt, EntityDocument, MapperError};
use crate::domain::{Alias, BankingDetails, CodecError, RegulatoryFields, RelatedParty};
use crate::ports::FieldCodec;

/// Search tokens of an Alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasSearch {
    /// Token of the tax document.
    pub document: Option<String>,
    /// Token of the banking account number.
    pub banking_details_account: Option<String>,
    /// Token of the IBAN.
    pub banking_details_iban: Option<String>,
    /// Token of the participant document.
    pub regulatory_fields_participant_document: Option<String>,
    /// Tokens of every related party's document.
    #[serde(default)]
    pub related_party_documents: Vec<String>,
}

/// Persisted Alias. HolderLinks are not stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasDocument {
    /// Primary key.
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Owning ledger.
    pub ledger_id: String,
    /// External account identifier.
    pub account_id: String,
    /// Owning Holder.
    pub holder_id: Uuid,
    /// Encrypted tax document.
    pub document: Option<String>,
    /// Free-form alias type.
    #[serde(rename = "type")]
    pub alias_type: Option<String>,
    /// Banking details with encrypted account and IBAN.
    pub banking_details: Option<BankingDetails>,
    /// Regulatory fields with encrypted participant document.
    pub regulatory_fields: Option<RegulatoryFields>,
    /// Related parties with encrypted documents.
    #[serde(default)]
    pub related_parties: Vec<RelatedParty>,
    /// Metadata, never null.
    #[serde(default)]
    pub metadata: Metadata,
    /// Search tokens.
    #[serde(default)]
    pub search: AliasSearch,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete instant.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EntityDocument for AliasDocument {
    type Entity = Alias;

    fn from_entity(alias: &Alias, codec: &dyn FieldCodec) -> Result<Self, MapperError> {
        let banking = alias.banking_details.as_ref();
        let regulatory = alias.regulatory_fields.as_ref();

        let search = AliasSearch {
            document: hash_opt(codec, Some(alias.document.as_str())),
            banking_details_account: hash_opt(codec, banking.and_then(|b| b.account.as_deref())),
            banking_details_iban: hash_opt(codec, banking.and_then(|b| b.iban.as_deref())),
            regulatory_fields_participant_document: hash_opt(
                codec,
                regulatory.and_then(|r| r.participant_document.as_deref()),
            ),
            related_party_documents: related_party_tokens(&alias.related_parties, codec),
        };

        Ok(Self {
            id: alias.id,
            ledger_id: alias.ledger_id.clone(),
            account_id: alias.account_id.clone(),
            holder_id: alias.holder_id,
            document: encrypt_opt(codec, Some(alias.document.as_str()))?,
            alias_type: alias.alias_type.clone(),
            banking_details: banking.map(|b| encrypt_banking(b, codec)).transpose()?,
            regulatory_fields: regulatory.map(|r| encrypt_regulatory(r, codec)).transpose()?,
            related_parties: encrypt_related_parties(&alias.related_parties, codec)?,
            metadata: alias.metadata.clone(),
            search,
            created_at: alias.created_at,
            updated_at: alias.updated_at,
            deleted_at: alias.deleted_at,
        })
    }

    fn into_entity(self, codec: &dyn FieldCodec) -> Result<Alias, MapperError> {
        let related_parties = self
            .related_parties
            .into_iter()
            .map(|party| -> Result<RelatedParty, CodecError> {
                Ok(RelatedParty {
                    document: decrypt_str(codec, &party.document)?,
                    ..party
                })
            })
            .collect::<Result<Vec<_>, CodecError>>()?;

        Ok(Alias {
            id: self.id,
            ledger_id: self.ledger_id,
            account_id: self.account_id,
            holder_id: self.holder_id,
            document: decrypt_opt(codec, self.document.as_deref())?.unwrap_or_default(),
            alias_type: self.alias_type,
            banking_details: self
                .banking_details
                .map(|b| decrypt_banking(b, codec))
                .transpose()?,
            regulatory_fields: self
                .regulatory_fields
                .map(|r| {
                    Ok::<_, CodecError>(RegulatoryFields {
                        participant_document: decrypt_opt(codec, r.participant_document.as_deref())?,
                    })
                })
                .transpose()?,
            related_parties,
            metadata: self.metadata,
            holder_links: Vec::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

pub(crate) fn encrypt_banking(
    details: &BankingDetails,
    codec: &dyn FieldCodec,
) -> Result<BankingDetails, CodecError> {
    Ok(BankingDetails {
        account: encrypt_opt(codec, details.account.as_deref())?,
        iban: encrypt_opt(codec, details.iban.as_deref())?,
        ..details.clone()
    })
}

fn decrypt_banking(details: BankingDetails, codec: &dyn FieldCodec) -> Result<BankingDetails, CodecError> {
    Ok(BankingDetails {
        account: decrypt_opt(codec, details.account.as_deref())?,
        iban: decrypt_opt(codec, details.iban.as_deref())?,
        ..details
    })
}

pub(crate) fn encrypt_regulatory(
    fields: &RegulatoryFields,
    codec: &dyn FieldCodec,
) -> Result<RegulatoryFields, CodecError> {
    Ok(RegulatoryFields {
        participant_document: encrypt_opt(codec, fields.participant_document.as_deref())?,
    })
}

pub(crate) fn encrypt_related_parties(
    parties: &[RelatedParty],
    codec: &dyn FieldCodec,
) -> Result<Vec<RelatedParty>, CodecError> {
    parties
        .iter()
        .map(|party| -> Result<RelatedParty, CodecError> {
            Ok(RelatedParty {
                document: encrypt_str(codec, &party.document)?,
                ..party.clone()
            })
        })
        .collect()
}

pub(crate) fn related_party_tokens(parties: &[RelatedParty], codec: &dyn FieldCodec) -> Vec<String> {
    parties
        .iter()
        .filter_map(|party| hash_opt(codec, Some(party.document.as_str())))
        .collect()
}
