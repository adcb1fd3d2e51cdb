//! In-memory [`DirectoryStore`] used by the unit and API test suites.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{
    ChangeRecord, Company, CreateCompany, Fax, LegalForm, Manager, NewChangeRecord, NewFax,
    NewManager, NewPhone, Phone, Sector,
};
use crate::store::{CompanyFilter, DirectoryStore};
use crate::types::DbId;

#[derive(Debug, Default)]
struct Inner {
    companies: BTreeMap<DbId, Company>,
    phones: BTreeMap<DbId, Phone>,
    faxes: BTreeMap<DbId, Fax>,
    managers: BTreeMap<DbId, Manager>,
    sectors: BTreeMap<DbId, Sector>,
    legal_forms: BTreeMap<DbId, LegalForm>,
    changes: Vec<ChangeRecord>,
    next_id: DbId,
}

impl Inner {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`DirectoryStore`] holding everything in process memory.
///
/// Ids are assigned from a single shared counter. The store is cheap to
/// construct per test and safe to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a sector and return it.
    pub fn put_sector(&self, nom: &str) -> Sector {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let sector = Sector {
            id,
            nom: nom.to_string(),
        };
        inner.sectors.insert(id, sector.clone());
        sector
    }

    /// Seed a legal form and return it.
    pub fn put_legal_form(&self, nom: &str) -> LegalForm {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let form = LegalForm {
            id,
            nom: nom.to_string(),
        };
        inner.legal_forms.insert(id, form.clone());
        form
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_company(&self, company: &CreateCompany) -> Result<Company, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let sector = company
            .sector_id
            .and_then(|sid| inner.sectors.get(&sid).cloned());
        let legal_form = company
            .legal_form_id
            .and_then(|fid| inner.legal_forms.get(&fid).cloned());
        let row = Company {
            id,
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
            logo: None,
            sector,
            legal_form,
        };
        inner.companies.insert(id, row.clone());
        Ok(row)
    }

    async fn find_company(&self, id: DbId) -> Result<Option<Company>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.companies.get(&id).cloned())
    }

    async fn save_company(&self, company: &Company) -> Result<Company, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.companies.insert(company.id, company.clone());
        Ok(company.clone())
    }

    async fn delete_company(&self, id: DbId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let existed = inner.companies.remove(&id).is_some();
        if existed {
            inner.phones.retain(|_, p| p.company_id != id);
            inner.faxes.retain(|_, f| f.company_id != id);
            inner.managers.retain(|_, m| m.company_id != id);
            inner.changes.retain(|c| c.company_id != id);
        }
        Ok(existed)
    }

    async fn list_companies(&self, filter: &CompanyFilter) -> Result<Vec<Company>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let matches = |c: &Company| {
            if let Some(ville) = &filter.ville {
                if c.ville.as_deref() != Some(ville.as_str()) {
                    return false;
                }
            }
            if let Some(denomination) = &filter.denomination {
                let needle = denomination.to_lowercase();
                match &c.denomination {
                    Some(d) if d.to_lowercase().contains(&needle) => {}
                    _ => return false,
                }
            }
            if let Some(sector) = &filter.sector {
                if c.sector.as_ref().map(|s| s.nom.as_str()) != Some(sector.as_str()) {
                    return false;
                }
            }
            if let Some(legal_form) = &filter.legal_form {
                if c.legal_form.as_ref().map(|f| f.nom.as_str()) != Some(legal_form.as_str()) {
                    return false;
                }
            }
            true
        };
        Ok(inner.companies.values().filter(|c| matches(c)).cloned().collect())
    }

    async fn distinct_cities(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut cities: Vec<String> = inner
            .companies
            .values()
            .filter_map(|c| c.ville.clone())
            .collect();
        cities.sort();
        cities.dedup();
        Ok(cities)
    }

    async fn find_sector(&self, id: DbId) -> Result<Option<Sector>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.sectors.get(&id).cloned())
    }

    async fn list_sectors(&self) -> Result<Vec<Sector>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.sectors.values().cloned().collect())
    }

    async fn find_legal_form(&self, id: DbId) -> Result<Option<LegalForm>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.legal_forms.get(&id).cloned())
    }

    async fn list_legal_forms(&self) -> Result<Vec<LegalForm>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.legal_forms.values().cloned().collect())
    }

    async fn phones_by_company(&self, company_id: DbId) -> Result<Vec<Phone>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .phones
            .values()
            .filter(|p| p.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn insert_phone(&self, phone: &NewPhone) -> Result<Phone, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let row = Phone {
            id,
            company_id: phone.company_id,
            numero: phone.numero.clone(),
        };
        inner.phones.insert(id, row.clone());
        Ok(row)
    }

    async fn update_phone(&self, phone: &Phone) -> Result<Phone, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.phones.insert(phone.id, phone.clone());
        Ok(phone.clone())
    }

    async fn faxes_by_company(&self, company_id: DbId) -> Result<Vec<Fax>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .faxes
            .values()
            .filter(|f| f.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn insert_fax(&self, fax: &NewFax) -> Result<Fax, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let row = Fax {
            id,
            company_id: fax.company_id,
            numero: fax.numero.clone(),
        };
        inner.faxes.insert(id, row.clone());
        Ok(row)
    }

    async fn update_fax(&self, fax: &Fax) -> Result<Fax, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.faxes.insert(fax.id, fax.clone());
        Ok(fax.clone())
    }

    async fn managers_by_company(&self, company_id: DbId) -> Result<Vec<Manager>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .managers
            .values()
            .filter(|m| m.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn insert_manager(&self, manager: &NewManager) -> Result<Manager, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let row = Manager {
            id,
            company_id: manager.company_id,
            nom: manager.nom.clone(),
            prenom: manager.prenom.clone(),
        };
        inner.managers.insert(id, row.clone());
        Ok(row)
    }

    async fn update_manager(&self, manager: &Manager) -> Result<Manager, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.managers.insert(manager.id, manager.clone());
        Ok(manager.clone())
    }

    async fn changes_by_company(&self, company_id: DbId) -> Result<Vec<ChangeRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .changes
            .iter()
            .filter(|c| c.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn change_exists(
        &self,
        company_id: DbId,
        attribute: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.changes.iter().any(|c| {
            c.company_id == company_id
                && c.attribute == attribute
                && c.old_value.as_deref() == old_value
                && c.new_value.as_deref() == new_value
        }))
    }

    async fn insert_change(&self, change: &NewChangeRecord) -> Result<ChangeRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let row = ChangeRecord {
            id,
            company_id: change.company_id,
            attribute: change.attribute.clone(),
            old_value: change.old_value.clone(),
            new_value: change.new_value.clone(),
            changed_at: change.changed_at,
        };
        inner.changes.push(row.clone());
        Ok(row)
    }
}
