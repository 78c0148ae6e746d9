//! Partial-update documents.
//!
//! Every update sets `updated_at`. Metadata is merged key by key
//! (`metadata.<key>`) and removals unset individual keys. Any sensitive
//! field in an update is re-encrypted and its search token regenerated.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use shared_types::Metadata;

use super::alias::{encrypt_related_parties, related_party_tokens};
use super::holder::{encrypt_contact, encrypt_legal_person, encrypt_natural_person};
use super::{encrypt_opt, hash_opt, MapperError};
use crate::domain::{AliasUpdate, HolderLinkUpdate, HolderUpdate};
use crate::ports::{FieldCodec, UpdateDocument, DELETED_AT_FIELD};

/// Holder update. `removed_keys` are bare metadata keys.
pub fn holder_update(
    update: &HolderUpdate,
    removed_keys: &[String],
    codec: &dyn FieldCodec,
    now: DateTime<Utc>,
) -> Result<UpdateDocument, MapperError> {
    let mut doc = UpdateDocument::new();

    if let Some(external_id) = &update.external_id {
        doc.set("external_id", external_id.as_str());
    }
    if let Some(name) = &update.name {
        doc.set("name", nullable(encrypt_opt(codec, Some(name.as_str()))?));
    }
    if let Some(addresses) = &update.addresses {
        doc.set("addresses", to_value(addresses)?);
    }
    if let Some(contact) = &update.contact {
        doc.set("contact", to_value(&encrypt_contact(contact, codec)?)?);
    }
    if let Some(person) = &update.natural_person {
        doc.set(
            "natural_person",
            to_value(&encrypt_natural_person(person, codec)?)?,
        );
    }
    if let Some(person) = &update.legal_person {
        doc.set("legal_person", to_value(&encrypt_legal_person(person, codec)?)?);
    }

    finish(doc, update.metadata.as_ref(), removed_keys, now)
}

/// Alias update. Banking and regulatory fields are set one path at a time,
/// so fields absent from the update keep their stored value.
pub fn alias_update(
    update: &AliasUpdate,
    removed_keys: &[String],
    codec: &dyn FieldCodec,
    now: DateTime<Utc>,
) -> Result<UpdateDocument, MapperError> {
    let mut doc = UpdateDocument::new();

    if let Some(alias_type) = &update.alias_type {
        doc.set("type", alias_type.as_str());
    }

    if let Some(details) = &update.banking_details {
        if let Some(branch) = &details.branch {
            doc.set("banking_details.branch", branch.as_str());
        }
        if let Some(account) = details.account.as_deref() {
            doc.set(
                "banking_details.account",
                nullable(encrypt_opt(codec, Some(account))?),
            );
            doc.set(
                "search.banking_details_account",
                nullable(hash_opt(codec, Some(account))),
            );
        }
        if let Some(iban) = details.iban.as_deref() {
            doc.set(
                "banking_details.iban",
                nullable(encrypt_opt(codec, Some(iban))?),
            );
            doc.set(
                "search.banking_details_iban",
                nullable(hash_opt(codec, Some(iban))),
            );
        }
        if let Some(account_type) = &details.account_type {
            doc.set("banking_details.type", account_type.as_str());
        }
        if let Some(date) = details.opening_date {
            doc.set("banking_details.opening_date", to_value(&date)?);
        }
        if let Some(date) = details.closing_date {
            doc.set("banking_details.closing_date", to_value(&date)?);
        }
        if let Some(country_code) = &details.country_code {
            doc.set("banking_details.country_code", country_code.as_str());
        }
        if let Some(bank_id) = &details.bank_id {
            doc.set("banking_details.bank_id", bank_id.as_str());
        }
    }

    if let Some(participant) = update
        .regulatory_fields
        .as_ref()
        .and_then(|r| r.participant_document.as_deref())
    {
        doc.set(
            "regulatory_fields.participant_document",
            nullable(encrypt_opt(codec, Some(participant))?),
        );
        doc.set(
            "search.regulatory_fields_participant_document",
            nullable(hash_opt(codec, Some(participant))),
        );
    }

    if let Some(parties) = &update.related_parties {
        doc.set(
            "related_parties",
            to_value(&encrypt_related_parties(parties, codec)?)?,
        );
        doc.set(
            "search.related_party_documents",
            to_value(&related_party_tokens(parties, codec))?,
        );
    }

    finish(doc, update.metadata.as_ref(), removed_keys, now)
}

/// HolderLink update.
pub fn holder_link_update(
    update: &HolderLinkUpdate,
    removed_keys: &[String],
    now: DateTime<Utc>,
) -> Result<UpdateDocument, MapperError> {
    finish(UpdateDocument::new(), update.metadata.as_ref(), removed_keys, now)
}

/// Soft delete: set `deleted_at` and `updated_at`.
pub fn soft_delete(now: DateTime<Utc>) -> Result<UpdateDocument, MapperError> {
    let mut doc = UpdateDocument::new();
    let stamp = to_value(&now)?;
    doc.set(DELETED_AT_FIELD, stamp.clone());
    doc.set("updated_at", stamp);
    Ok(doc)
}

fn finish(
    mut doc: UpdateDocument,
    metadata: Option<&Metadata>,
    removed_keys: &[String],
    now: DateTime<Utc>,
) -> Result<UpdateDocument, MapperError> {
    if let Some(metadata) = metadata {
        for (key, value) in metadata.iter() {
            doc.set(format!("metadata.{}", key), Value::from(value.clone()));
        }
    }
    for key in removed_keys {
        doc.unset(format!("metadata.{}", key));
    }
    doc.set("updated_at", to_value(&now)?);
    Ok(doc)
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, MapperError> {
    Ok(serde_json::to_value(value)?)
}

fn nullable(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::String)
}
