//! Holder document.
//!
//! Encrypted: name, document, every contact channel, the parents' names and
//! the legal representative's name, document and e-mail. Searchable: document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::Metadata;
use uuid::Uuid;

use super::{decrypt_opt, decrypt_str, encrypt_opt, encrypt_str, hash_opt, EntityDocument, MapperError};
use crate::domain::{
    Addresses, CodecError, Contact, Holder, HolderType, LegalPerson, NaturalPerson, Representative,
};
use crate::ports::FieldCodec;

/// Search tokens of a Holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderSearch {
    /// Token of the tax document.
    pub document: Option<String>,
}

/// Persisted Holder.
///
/// Nested blocks reuse the domain shapes with ciphertext in their sensitive
/// fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderDocument {
    /// Primary key.
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Caller-side reference.
    pub external_id: Option<String>,
    /// Natural or legal person.
    #[serde(rename = "type")]
    pub holder_type: HolderType,
    /// Encrypted name.
    pub name: Option<String>,
    /// Encrypted tax document.
    pub document: Option<String>,
    /// Plaintext addresses.
    pub addresses: Option<Addresses>,
    /// Encrypted contact channels.
    pub contact: Option<Contact>,
    /// Natural person block with encrypted parents' names.
    pub natural_person: Option<NaturalPerson>,
    /// Legal person block with an encrypted representative.
    pub legal_person: Option<LegalPerson>,
    /// Metadata, never null.
    #[serde(default)]
    pub metadata: Metadata,
    /// Search tokens.
    #[serde(default)]
    pub search: HolderSearch,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete instant.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EntityDocument for HolderDocument {
    type Entity = Holder;

    fn from_entity(holder: &Holder, codec: &dyn FieldCodec) -> Result<Self, MapperError> {
        Ok(Self {
            id: holder.id,
            external_id: holder.external_id.clone(),
            holder_type: holder.holder_type,
            name: encrypt_opt(codec, Some(holder.name.as_str()))?,
            document: encrypt_opt(codec, Some(holder.document.as_str()))?,
            addresses: holder.addresses.clone(),
            contact: holder
                .contact
                .as_ref()
                .map(|c| encrypt_contact(c, codec))
                .transpose()?,
            natural_person: holder
                .natural_person
                .as_ref()
                .map(|p| encrypt_natural_person(p, codec))
                .transpose()?,
            legal_person: holder
                .legal_person
                .as_ref()
                .map(|p| encrypt_legal_person(p, codec))
                .transpose()?,
            metadata: holder.metadata.clone(),
            search: HolderSearch {
                document: hash_opt(codec, Some(holder.document.as_str())),
            },
            created_at: holder.created_at,
            updated_at: holder.updated_at,
            deleted_at: holder.deleted_at,
        })
    }

    fn into_entity(self, codec: &dyn FieldCodec) -> Result<Holder, MapperError> {
        Ok(Holder {
            id: self.id,
            external_id: self.external_id,
            holder_type: self.holder_type,
            name: decrypt_opt(codec, self.name.as_deref())?.unwrap_or_default(),
            document: decrypt_opt(codec, self.document.as_deref())?.unwrap_or_default(),
            addresses: self.addresses,
            contact: self
                .contact
                .map(|c| decrypt_contact(c, codec))
                .transpose()?,
            natural_person: self
                .natural_person
                .map(|p| decrypt_natural_person(p, codec))
                .transpose()?,
            legal_person: self
                .legal_person
                .map(|p| decrypt_legal_person(p, codec))
                .transpose()?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

pub(crate) fn encrypt_contact(contact: &Contact, codec: &dyn FieldCodec) -> Result<Contact, CodecError> {
    Ok(Contact {
        primary_email: encrypt_opt(codec, contact.primary_email.as_deref())?,
        secondary_email: encrypt_opt(codec, contact.secondary_email.as_deref())?,
        mobile_phone: encrypt_opt(codec, contact.mobile_phone.as_deref())?,
        other_phone: encrypt_opt(codec, contact.other_phone.as_deref())?,
    })
}

fn decrypt_contact(contact: Contact, codec: &dyn FieldCodec) -> Result<Contact, CodecError> {
    Ok(Contact {
        primary_email: decrypt_opt(codec, contact.primary_email.as_deref())?,
        secondary_email: decrypt_opt(codec, contact.secondary_email.as_deref())?,
        mobile_phone: decrypt_opt(codec, contact.mobile_phone.as_deref())?,
        other_phone: decrypt_opt(codec, contact.other_phone.as_deref())?,
    })
}

pub(crate) fn encrypt_natural_person(
    person: &NaturalPerson,
    codec: &dyn FieldCodec,
) -> Result<NaturalPerson, CodecError> {
    Ok(NaturalPerson {
        mother_name: encrypt_opt(codec, person.mother_name.as_deref())?,
        father_name: encrypt_opt(codec, person.father_name.as_deref())?,
        ..person.clone()
    })
}

fn decrypt_natural_person(
    person: NaturalPerson,
    codec: &dyn FieldCodec,
) -> Result<NaturalPerson, CodecError> {
    Ok(NaturalPerson {
        mother_name: decrypt_opt(codec, person.mother_name.as_deref())?,
        father_name: decrypt_opt(codec, person.father_name.as_deref())?,
        ..person
    })
}

pub(crate) fn encrypt_legal_person(
    person: &LegalPerson,
    codec: &dyn FieldCodec,
) -> Result<LegalPerson, CodecError> {
    let representative = match &person.representative {
        Some(rep) => Some(Representative {
            name: encrypt_str(codec, &rep.name)?,
            document: encrypt_str(codec, &rep.document)?,
            email: encrypt_opt(codec, rep.email.as_deref())?,
            role: rep.role.clone(),
        }),
        None => None,
    };
    Ok(LegalPerson {
        representative,
        ..person.clone()
    })
}

fn decrypt_legal_person(person: LegalPerson, codec: &dyn FieldCodec) -> Result<LegalPerson, CodecError> {
    let representative = match person.representative {
        Some(rep) => Some(Representative {
            name: decrypt_str(codec, &rep.name)?,
            document: decrypt_str(codec, &rep.document)?,
            email: decrypt_opt(codec, rep.email.as_deref())?,
            role: rep.role,
        }),
        None => None,
    };
    Ok(LegalPerson {
        representative,
        ..person
    })
}
