//! Partial updates: a sparse attribute map applied to one company.
//!
//! The raw `attribute name -> JSON value` map is parsed into typed commands
//! up front, so an unknown key or a malformed value aborts before anything
//! is written. Execution then runs in phases: relation lookups resolve
//! first, child collections reconcile second, scalar assignments apply
//! last, followed by a single save and the change audit.

use std::collections::HashMap;

use chrono::{Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::audit;
use crate::error::CoreError;
use crate::model::{Company, FaxPatch, ManagerPatch, PhonePatch};
use crate::reconcile;
use crate::store::DirectoryStore;
use crate::types::{DbId, Timestamp};

/// Sparse update payload: attribute name to raw JSON value. Values may be
/// strings, serialized lists, or identifiers of related entities; `null`
/// entries are skipped.
pub type UpdateMap = HashMap<String, Value>;

/// A direct scalar assignment, coerced to the field's type at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarAssign {
    Denomination(String),
    CapitalSocial(f64),
    Ice(String),
    IdentifiantFiscal(String),
    NumRegistreCommerce(String),
    NumPatente(String),
    NumAffiliationCnss(String),
    Adresse(String),
    Ville(String),
    Mail(String),
    SiteWeb(String),
    NombreEmployes(i32),
    Latitude(f64),
    Longitude(f64),
}

impl ScalarAssign {
    fn key(&self) -> &'static str {
        match self {
            Self::Denomination(_) => "denomination",
            Self::CapitalSocial(_) => "capitalSocial",
            Self::Ice(_) => "ice",
            Self::IdentifiantFiscal(_) => "identifiantFiscal",
            Self::NumRegistreCommerce(_) => "numRegistreCommerce",
            Self::NumPatente(_) => "numPatente",
            Self::NumAffiliationCnss(_) => "numAffiliationCnss",
            Self::Adresse(_) => "adresse",
            Self::Ville(_) => "ville",
            Self::Mail(_) => "mail",
            Self::SiteWeb(_) => "siteWeb",
            Self::NombreEmployes(_) => "nombreEmployes",
            Self::Latitude(_) => "latitude",
            Self::Longitude(_) => "longitude",
        }
    }

    fn apply(&self, company: &mut Company) {
        match self {
            Self::Denomination(v) => company.denomination = Some(v.clone()),
            Self::CapitalSocial(v) => company.capital_social = Some(*v),
            Self::Ice(v) => company.ice = Some(v.clone()),
            Self::IdentifiantFiscal(v) => company.identifiant_fiscal = Some(v.clone()),
            Self::NumRegistreCommerce(v) => company.num_registre_commerce = Some(v.clone()),
            Self::NumPatente(v) => company.num_patente = Some(v.clone()),
            Self::NumAffiliationCnss(v) => company.num_affiliation_cnss = Some(v.clone()),
            Self::Adresse(v) => company.adresse = Some(v.clone()),
            Self::Ville(v) => company.ville = Some(v.clone()),
            Self::Mail(v) => company.mail = Some(v.clone()),
            Self::SiteWeb(v) => company.site_web = Some(v.clone()),
            Self::NombreEmployes(v) => company.nombre_employes = Some(*v),
            Self::Latitude(v) => company.latitude = Some(*v),
            Self::Longitude(v) => company.longitude = Some(*v),
        }
    }
}

/// One recognized entry of the update map.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCommand {
    Assign(ScalarAssign),
    Phones(Vec<PhonePatch>),
    Faxes(Vec<FaxPatch>),
    Managers(Vec<ManagerPatch>),
    Sector(DbId),
    LegalForm(DbId),
    CreationDate(Timestamp),
    CessationDate(Timestamp),
}

impl UpdateCommand {
    fn key(&self) -> &'static str {
        match self {
            Self::Assign(assign) => assign.key(),
            Self::Phones(_) => "phones",
            Self::Faxes(_) => "faxes",
            Self::Managers(_) => "managers",
            Self::Sector(_) => "sector",
            Self::LegalForm(_) => "legalForm",
            Self::CreationDate(_) => "creationDate",
            Self::CessationDate(_) => "cessationDate",
        }
    }
}

// --- value coercions -------------------------------------------------------
//
// Multipart form values arrive as strings, JSON bodies as typed values, so
// numeric fields accept both representations.

fn string_value(key: &str, value: &Value) -> Result<String, CoreError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(CoreError::malformed(key, "expected a string value")),
    }
}

fn f64_value(key: &str, value: &Value) -> Result<f64, CoreError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CoreError::malformed(key, "expected a finite number")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| CoreError::malformed(key, format!("'{s}' is not a number"))),
        _ => Err(CoreError::malformed(key, "expected a number")),
    }
}

fn i32_value(key: &str, value: &Value) -> Result<i32, CoreError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| CoreError::malformed(key, "expected a 32-bit integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| CoreError::malformed(key, format!("'{s}' is not an integer"))),
        _ => Err(CoreError::malformed(key, "expected an integer")),
    }
}

fn id_value(key: &str, value: &Value) -> Result<DbId, CoreError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| CoreError::malformed(key, "expected an integer identifier")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| CoreError::malformed(key, format!("'{s}' is not an identifier"))),
        _ => Err(CoreError::malformed(key, "expected an identifier")),
    }
}

/// Parse a `YYYY-MM-DD` calendar date and normalize it to the start of that
/// day in the local system time zone, stored as the UTC instant.
fn date_value(key: &str, value: &Value) -> Result<Timestamp, CoreError> {
    let raw = match value {
        Value::String(s) => s.trim(),
        _ => return Err(CoreError::malformed(key, "expected a calendar date string")),
    };
    let date: NaiveDate = raw
        .parse()
        .map_err(|e: chrono::ParseError| CoreError::malformed(key, e.to_string()))?;

    match Local.from_local_datetime(&date.and_time(NaiveTime::MIN)) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => Ok(t.with_timezone(&Utc)),
        LocalResult::None => Err(CoreError::malformed(
            key,
            "date does not exist in the local time zone",
        )),
    }
}

fn child_list<T>(key: &str, value: &Value) -> Result<Vec<T>, CoreError>
where
    T: serde::de::DeserializeOwned,
{
    let parsed = match value {
        Value::String(raw) => serde_json::from_str(raw),
        Value::Array(_) => serde_json::from_value(value.clone()),
        _ => {
            return Err(CoreError::malformed(
                key,
                "expected a JSON list of child items",
            ))
        }
    };
    parsed.map_err(|e| CoreError::malformed(key, e.to_string()))
}

fn parse_scalar(key: &str, value: &Value) -> Result<ScalarAssign, CoreError> {
    match key {
        "denomination" => Ok(ScalarAssign::Denomination(string_value(key, value)?)),
        "capitalSocial" => Ok(ScalarAssign::CapitalSocial(f64_value(key, value)?)),
        "ice" => Ok(ScalarAssign::Ice(string_value(key, value)?)),
        "identifiantFiscal" => Ok(ScalarAssign::IdentifiantFiscal(string_value(key, value)?)),
        "numRegistreCommerce" => Ok(ScalarAssign::NumRegistreCommerce(string_value(key, value)?)),
        "numPatente" => Ok(ScalarAssign::NumPatente(string_value(key, value)?)),
        "numAffiliationCnss" => Ok(ScalarAssign::NumAffiliationCnss(string_value(key, value)?)),
        "adresse" => Ok(ScalarAssign::Adresse(string_value(key, value)?)),
        "ville" => Ok(ScalarAssign::Ville(string_value(key, value)?)),
        "mail" => Ok(ScalarAssign::Mail(string_value(key, value)?)),
        "siteWeb" => Ok(ScalarAssign::SiteWeb(string_value(key, value)?)),
        "nombreEmployes" => Ok(ScalarAssign::NombreEmployes(i32_value(key, value)?)),
        "latitude" => Ok(ScalarAssign::Latitude(f64_value(key, value)?)),
        "longitude" => Ok(ScalarAssign::Longitude(f64_value(key, value)?)),
        _ => Err(CoreError::malformed(key, "unknown attribute")),
    }
}

fn parse_command(key: &str, value: &Value) -> Result<UpdateCommand, CoreError> {
    match key {
        "phones" => Ok(UpdateCommand::Phones(child_list(key, value)?)),
        "faxes" => Ok(UpdateCommand::Faxes(child_list(key, value)?)),
        "managers" => Ok(UpdateCommand::Managers(child_list(key, value)?)),
        "sector" => Ok(UpdateCommand::Sector(id_value(key, value)?)),
        "legalForm" => Ok(UpdateCommand::LegalForm(id_value(key, value)?)),
        "creationDate" => Ok(UpdateCommand::CreationDate(date_value(key, value)?)),
        "cessationDate" => Ok(UpdateCommand::CessationDate(date_value(key, value)?)),
        _ => Ok(UpdateCommand::Assign(parse_scalar(key, value)?)),
    }
}

/// Parse a sparse update map into typed commands. `null` entries are
/// skipped; any other unparseable entry aborts with the offending key.
pub fn parse_commands(changes: &UpdateMap) -> Result<Vec<UpdateCommand>, CoreError> {
    let mut commands = Vec::with_capacity(changes.len());
    for (key, value) in changes {
        if value.is_null() {
            continue;
        }
        let command =
            parse_command(key, value).map_err(|e| CoreError::update_failed(key.clone(), e))?;
        commands.push(command);
    }
    Ok(commands)
}

/// Apply a sparse update to the company identified by `company_id`.
///
/// The pre-update state is snapshotted before any mutation; after the save,
/// the change auditor appends one deduplicated history record per field that
/// actually changed. Any failure while interpreting or executing an entry
/// aborts the whole update as [`CoreError::UpdateFailed`] naming the key.
///
/// Child reconciliation persists row by row; if the store fails partway
/// through, children already written in this request stay written.
pub async fn apply_update(
    store: &dyn DirectoryStore,
    company_id: DbId,
    changes: &UpdateMap,
    logo: Option<Vec<u8>>,
) -> Result<Company, CoreError> {
    let company = store
        .find_company(company_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "company",
            id: company_id,
        })?;

    let commands = parse_commands(changes)?;

    let before = company.clone();
    let mut company = company;

    // Resolve relation references first so a dangling id aborts the update
    // before any child rows are written.
    for command in &commands {
        match command {
            UpdateCommand::Sector(id) => {
                let sector = store
                    .find_sector(*id)
                    .await
                    .map_err(|e| CoreError::update_failed(command.key(), e.into()))?
                    .ok_or_else(|| {
                        CoreError::update_failed(
                            command.key(),
                            CoreError::NotFound {
                                entity: "sector",
                                id: *id,
                            },
                        )
                    })?;
                company.sector = Some(sector);
            }
            UpdateCommand::LegalForm(id) => {
                let form = store
                    .find_legal_form(*id)
                    .await
                    .map_err(|e| CoreError::update_failed(command.key(), e.into()))?
                    .ok_or_else(|| {
                        CoreError::update_failed(
                            command.key(),
                            CoreError::NotFound {
                                entity: "legal form",
                                id: *id,
                            },
                        )
                    })?;
                company.legal_form = Some(form);
            }
            _ => {}
        }
    }

    for command in &commands {
        let result = match command {
            UpdateCommand::Phones(patches) => {
                reconcile::reconcile_phones(store, company_id, patches)
                    .await
                    .map(|_| ())
            }
            UpdateCommand::Faxes(patches) => {
                reconcile::reconcile_faxes(store, company_id, patches)
                    .await
                    .map(|_| ())
            }
            UpdateCommand::Managers(patches) => {
                reconcile::reconcile_managers(store, company_id, patches)
                    .await
                    .map(|_| ())
            }
            _ => Ok(()),
        };
        result.map_err(|e| CoreError::update_failed(command.key(), e))?;
    }

    for command in &commands {
        match command {
            UpdateCommand::Assign(assign) => assign.apply(&mut company),
            UpdateCommand::CreationDate(t) => company.creation_date = Some(*t),
            UpdateCommand::CessationDate(t) => company.cessation_date = Some(*t),
            _ => {}
        }
    }

    // The binary attachment replaces the logo verbatim; no validation.
    if let Some(bytes) = logo {
        company.logo = Some(bytes);
    }

    let saved = store.save_company(&company).await?;
    audit::record_changes(store, &before, &saved).await?;

    tracing::info!(company_id, entries = changes.len(), "applied partial update");
    Ok(saved)
}
