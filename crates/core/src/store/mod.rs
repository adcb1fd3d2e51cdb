//! Persistence boundary of the directory core.
//!
//! [`DirectoryStore`] is the contract the core consumes from its
//! collaborators: simple load/save/find operations keyed by identifier. The
//! PostgreSQL implementation lives in `annuaire-db`; [`memory::MemoryStore`]
//! backs the test suites.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{
    ChangeRecord, Company, CreateCompany, Fax, LegalForm, Manager, NewChangeRecord, NewFax,
    NewManager, NewPhone, Phone, Sector,
};
use crate::types::DbId;

pub mod memory;

/// Optional, conjunctive company list filters.
#[derive(Debug, Clone, Default)]
pub struct CompanyFilter {
    /// Exact match on the company's city.
    pub ville: Option<String>,
    /// Case-insensitive substring match on the denomination.
    pub denomination: Option<String>,
    /// Exact match on the referenced sector's name.
    pub sector: Option<String>,
    /// Exact match on the referenced legal form's name.
    pub legal_form: Option<String>,
}

/// Key-value persistence for companies, their child collections, the lookup
/// entities and the change history.
///
/// Every method surfaces backend failures unchanged as [`StoreError`]. The
/// trait offers no multi-write transaction: a failure in the middle of an
/// update can leave earlier writes of the same request persisted.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    // --- companies ---
    async fn insert_company(&self, company: &CreateCompany) -> Result<Company, StoreError>;
    async fn find_company(&self, id: DbId) -> Result<Option<Company>, StoreError>;
    async fn save_company(&self, company: &Company) -> Result<Company, StoreError>;
    /// Returns `false` when no row with the given id existed.
    async fn delete_company(&self, id: DbId) -> Result<bool, StoreError>;
    async fn list_companies(&self, filter: &CompanyFilter) -> Result<Vec<Company>, StoreError>;
    /// Sorted distinct non-null cities across all companies.
    async fn distinct_cities(&self) -> Result<Vec<String>, StoreError>;

    // --- lookups ---
    async fn find_sector(&self, id: DbId) -> Result<Option<Sector>, StoreError>;
    async fn list_sectors(&self) -> Result<Vec<Sector>, StoreError>;
    async fn find_legal_form(&self, id: DbId) -> Result<Option<LegalForm>, StoreError>;
    async fn list_legal_forms(&self) -> Result<Vec<LegalForm>, StoreError>;

    // --- phones ---
    async fn phones_by_company(&self, company_id: DbId) -> Result<Vec<Phone>, StoreError>;
    async fn insert_phone(&self, phone: &NewPhone) -> Result<Phone, StoreError>;
    async fn update_phone(&self, phone: &Phone) -> Result<Phone, StoreError>;

    // --- faxes ---
    async fn faxes_by_company(&self, company_id: DbId) -> Result<Vec<Fax>, StoreError>;
    async fn insert_fax(&self, fax: &NewFax) -> Result<Fax, StoreError>;
    async fn update_fax(&self, fax: &Fax) -> Result<Fax, StoreError>;

    // --- managers ---
    async fn managers_by_company(&self, company_id: DbId) -> Result<Vec<Manager>, StoreError>;
    async fn insert_manager(&self, manager: &NewManager) -> Result<Manager, StoreError>;
    async fn update_manager(&self, manager: &Manager) -> Result<Manager, StoreError>;

    // --- change history ---
    async fn changes_by_company(&self, company_id: DbId) -> Result<Vec<ChangeRecord>, StoreError>;
    /// Whether an identical (attribute, old, new) triple was already
    /// recorded for this company.
    async fn change_exists(
        &self,
        company_id: DbId,
        attribute: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> Result<bool, StoreError>;
    async fn insert_change(&self, change: &NewChangeRecord) -> Result<ChangeRecord, StoreError>;
}
