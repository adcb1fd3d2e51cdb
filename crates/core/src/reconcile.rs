//! Child-collection reconciliation for phones, faxes and managers.
//!
//! Reconciliation merges an incoming item sequence into a company's existing
//! children by id match: a matching item updates that child in place, a
//! non-matching item is inserted as new with the parent back-reference set.
//! Children absent from the incoming sequence are deliberately left alone —
//! the operation is additive/updating only, never subtractive.

use crate::error::CoreError;
use crate::model::{Fax, FaxPatch, Manager, ManagerPatch, NewFax, NewManager, NewPhone, Phone, PhonePatch};
use crate::store::DirectoryStore;
use crate::types::DbId;

async fn ensure_company(store: &dyn DirectoryStore, company_id: DbId) -> Result<(), CoreError> {
    store
        .find_company(company_id)
        .await?
        .map(|_| ())
        .ok_or(CoreError::NotFound {
            entity: "company",
            id: company_id,
        })
}

/// Merge `incoming` into the phones of `company_id` and return the full
/// resulting set, re-read from the store.
pub async fn reconcile_phones(
    store: &dyn DirectoryStore,
    company_id: DbId,
    incoming: &[PhonePatch],
) -> Result<Vec<Phone>, CoreError> {
    ensure_company(store, company_id).await?;
    let existing = store.phones_by_company(company_id).await?;

    for patch in incoming {
        match patch.id.and_then(|id| existing.iter().find(|p| p.id == id)) {
            Some(current) => {
                let mut updated = current.clone();
                updated.numero = patch.numero.clone();
                store.update_phone(&updated).await?;
            }
            None => {
                // An id with no match among the existing children is treated
                // as new; the store assigns the real id on insert.
                store
                    .insert_phone(&NewPhone {
                        company_id,
                        numero: patch.numero.clone(),
                    })
                    .await?;
            }
        }
    }

    Ok(store.phones_by_company(company_id).await?)
}

/// Merge `incoming` into the faxes of `company_id`.
pub async fn reconcile_faxes(
    store: &dyn DirectoryStore,
    company_id: DbId,
    incoming: &[FaxPatch],
) -> Result<Vec<Fax>, CoreError> {
    ensure_company(store, company_id).await?;
    let existing = store.faxes_by_company(company_id).await?;

    for patch in incoming {
        match patch.id.and_then(|id| existing.iter().find(|f| f.id == id)) {
            Some(current) => {
                let mut updated = current.clone();
                updated.numero = patch.numero.clone();
                store.update_fax(&updated).await?;
            }
            None => {
                store
                    .insert_fax(&NewFax {
                        company_id,
                        numero: patch.numero.clone(),
                    })
                    .await?;
            }
        }
    }

    Ok(store.faxes_by_company(company_id).await?)
}

/// Merge `incoming` into the managers of `company_id`.
pub async fn reconcile_managers(
    store: &dyn DirectoryStore,
    company_id: DbId,
    incoming: &[ManagerPatch],
) -> Result<Vec<Manager>, CoreError> {
    ensure_company(store, company_id).await?;
    let existing = store.managers_by_company(company_id).await?;

    for patch in incoming {
        match patch.id.and_then(|id| existing.iter().find(|m| m.id == id)) {
            Some(current) => {
                let mut updated = current.clone();
                updated.nom = patch.nom.clone();
                updated.prenom = patch.prenom.clone();
                store.update_manager(&updated).await?;
            }
            None => {
                store
                    .insert_manager(&NewManager {
                        company_id,
                        nom: patch.nom.clone(),
                        prenom: patch.prenom.clone(),
                    })
                    .await?;
            }
        }
    }

    Ok(store.managers_by_company(company_id).await?)
}
