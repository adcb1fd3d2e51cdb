//! External-facing projection of the persisted company graph.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;

use crate::error::CoreError;
use crate::model::{ChangeRecord, Company, Fax, LegalForm, Manager, Phone, Sector};
use crate::store::DirectoryStore;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, Serialize)]
pub struct SectorView {
    pub id: DbId,
    pub nom: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegalFormView {
    pub id: DbId,
    pub nom: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhoneView {
    pub id: DbId,
    pub numero: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FaxView {
    pub id: DbId,
    pub numero: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerView {
    pub id: DbId,
    pub nom: Option<String>,
    pub prenom: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeView {
    pub id: DbId,
    pub attribute: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_at: Timestamp,
}

/// The full external representation of one company: scalars, base64 logo,
/// nested lookups, child collections and change history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyView {
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
    pub logo: Option<String>,
    pub sector: Option<SectorView>,
    pub legal_form: Option<LegalFormView>,
    pub phones: Vec<PhoneView>,
    pub faxes: Vec<FaxView>,
    pub managers: Vec<ManagerView>,
    pub history: Vec<ChangeView>,
}

impl From<&Sector> for SectorView {
    fn from(s: &Sector) -> Self {
        Self {
            id: s.id,
            nom: s.nom.clone(),
        }
    }
}

impl From<&LegalForm> for LegalFormView {
    fn from(f: &LegalForm) -> Self {
        Self {
            id: f.id,
            nom: f.nom.clone(),
        }
    }
}

impl From<&Phone> for PhoneView {
    fn from(p: &Phone) -> Self {
        Self {
            id: p.id,
            numero: p.numero.clone(),
        }
    }
}

impl From<&Fax> for FaxView {
    fn from(f: &Fax) -> Self {
        Self {
            id: f.id,
            numero: f.numero.clone(),
        }
    }
}

impl From<&Manager> for ManagerView {
    fn from(m: &Manager) -> Self {
        Self {
            id: m.id,
            nom: m.nom.clone(),
            prenom: m.prenom.clone(),
        }
    }
}

impl From<&ChangeRecord> for ChangeView {
    fn from(c: &ChangeRecord) -> Self {
        Self {
            id: c.id,
            attribute: c.attribute.clone(),
            old_value: c.old_value.clone(),
            new_value: c.new_value.clone(),
            changed_at: c.changed_at,
        }
    }
}

/// Assemble the external view of `company` from the persisted graph.
pub async fn project(
    store: &dyn DirectoryStore,
    company: &Company,
) -> Result<CompanyView, CoreError> {
    let phones = store.phones_by_company(company.id).await?;
    let faxes = store.faxes_by_company(company.id).await?;
    let managers = store.managers_by_company(company.id).await?;
    let history = store.changes_by_company(company.id).await?;

    Ok(CompanyView {
        id: company.id,
        denomination: company.denomination.clone(),
        capital_social: company.capital_social,
        ice: company.ice.clone(),
        identifiant_fiscal: company.identifiant_fiscal.clone(),
        num_registre_commerce: company.num_registre_commerce.clone(),
        num_patente: company.num_patente.clone(),
        num_affiliation_cnss: company.num_affiliation_cnss.clone(),
        adresse: company.adresse.clone(),
        ville: company.ville.clone(),
        mail: company.mail.clone(),
        site_web: company.site_web.clone(),
        nombre_employes: company.nombre_employes,
        latitude: company.latitude,
        longitude: company.longitude,
        creation_date: company.creation_date,
        cessation_date: company.cessation_date,
        logo: company.logo.as_deref().map(|b| BASE64.encode(b)),
        sector: company.sector.as_ref().map(SectorView::from),
        legal_form: company.legal_form.as_ref().map(LegalFormView::from),
        phones: phones.iter().map(PhoneView::from).collect(),
        faxes: faxes.iter().map(FaxView::from).collect(),
        managers: managers.iter().map(ManagerView::from).collect(),
        history: history.iter().map(ChangeView::from).collect(),
    })
}
