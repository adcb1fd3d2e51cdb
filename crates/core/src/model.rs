//! Domain model for the business directory.
//!
//! [`Company`] is the primary record. Phones, faxes and managers are owned
//! child collections reachable through the store by company id; a child only
//! carries a back-reference to its parent. Sectors and legal forms are
//! referenced lookup entities, never owned.

use std::fmt;

use serde::Deserialize;

use crate::types::{DbId, Timestamp};

/// A company record. All scalar attributes except `id` are nullable.
///
/// The struct owns every field, so a pre-update snapshot is a plain
/// [`Clone`] with no aliasing back into the live record.
#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub id: DbId,
    pub denomination: Option<String>,
    pub capital_social: Option<f64>,
    pub ice: Option<String>,
    pub identifiant_fiscal: Option<String>,
    pub num_registre_commerce: Option<String>,
    pub num_patente: Option<String>,
    pub num_affiliation_cnss: Option<String>,
    pub adresse: Option<String>,
    pub ville: Option<String>,
    pub mail: Option<String>,
    pub site_web: Option<String>,
    pub nombre_employes: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub creation_date: Option<Timestamp>,
    pub cessation_date: Option<Timestamp>,
    pub logo: Option<Vec<u8>>,
    pub sector: Option<Sector>,
    pub legal_form: Option<LegalForm>,
}

/// Payload for creating a company. Relations are supplied by lookup id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCompany {
    pub denomination: Option<String>,
    pub capital_social: Option<f64>,
    pub ice: Option<String>,
    pub identifiant_fiscal: Option<String>,
    pub num_registre_commerce: Option<String>,
    pub num_patente: Option<String>,
    pub num_affiliation_cnss: Option<String>,
    pub adresse: Option<String>,
    pub ville: Option<String>,
    pub mail: Option<String>,
    pub site_web: Option<String>,
    pub nombre_employes: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub creation_date: Option<Timestamp>,
    pub cessation_date: Option<Timestamp>,
    pub sector_id: Option<DbId>,
    pub legal_form_id: Option<DbId>,
}

/// An activity sector, referenced by companies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sector {
    pub id: DbId,
    pub nom: String,
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id={})", self.nom, self.id)
    }
}

/// A legal form (SARL, SA, ...), referenced by companies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalForm {
    pub id: DbId,
    pub nom: String,
}

impl fmt::Display for LegalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id={})", self.nom, self.id)
    }
}

/// A phone number owned by one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phone {
    pub id: DbId,
    pub company_id: DbId,
    pub numero: Option<String>,
}

/// Insert payload for a phone. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewPhone {
    pub company_id: DbId,
    pub numero: Option<String>,
}

/// A fax number owned by one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fax {
    pub id: DbId,
    pub company_id: DbId,
    pub numero: Option<String>,
}

/// Insert payload for a fax. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewFax {
    pub company_id: DbId,
    pub numero: Option<String>,
}

/// A manager of one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manager {
    pub id: DbId,
    pub company_id: DbId,
    pub nom: Option<String>,
    pub prenom: Option<String>,
}

/// Insert payload for a manager. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewManager {
    pub company_id: DbId,
    pub nom: Option<String>,
    pub prenom: Option<String>,
}

/// One immutable history entry: a single field's old and new value at a
/// point in time. Created only by the change auditor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub id: DbId,
    pub company_id: DbId,
    pub attribute: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_at: Timestamp,
}

/// Insert payload for a history entry.
#[derive(Debug, Clone)]
pub struct NewChangeRecord {
    pub company_id: DbId,
    pub attribute: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_at: Timestamp,
}

/// An incoming phone item in a partial update. An id that matches an
/// existing phone selects it for in-place update; any other id is ignored
/// and the item is inserted as new.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhonePatch {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub numero: Option<String>,
}

/// An incoming fax item in a partial update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FaxPatch {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub numero: Option<String>,
}

/// An incoming manager item in a partial update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManagerPatch {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub prenom: Option<String>,
}
