//! Change auditing: snapshot diffing and append-only history records.
//!
//! The diff walks a field-descriptor table covering every declared scalar
//! field of [`Company`], including its id and the relation-holding fields.
//! Adding a field to the entity only requires one new table entry here; no
//! other code participates in auditing.

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::model::{Company, NewChangeRecord};
use crate::store::DirectoryStore;

type Render = fn(&Company) -> Option<String>;

/// One auditable field: its external attribute name and how to render its
/// value to the canonical string form (`None` = absent).
pub struct FieldDescriptor {
    pub name: &'static str,
    render: Render,
}

impl FieldDescriptor {
    pub fn render(&self, company: &Company) -> Option<String> {
        (self.render)(company)
    }
}

/// Canonical rendering of the logo blob. Comparing multi-megabyte byte
/// strings verbatim would bloat the history table, so the blob is identified
/// by a truncated content hash.
fn render_logo(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("sha256:{hex}")
}

/// The full descriptor table for [`Company`].
pub fn field_descriptors() -> &'static [FieldDescriptor] {
    const FIELDS: &[FieldDescriptor] = &[
        FieldDescriptor {
            name: "id",
            render: |c| Some(c.id.to_string()),
        },
        FieldDescriptor {
            name: "denomination",
            render: |c| c.denomination.clone(),
        },
        FieldDescriptor {
            name: "capitalSocial",
            render: |c| c.capital_social.map(|v| v.to_string()),
        },
        FieldDescriptor {
            name: "ice",
            render: |c| c.ice.clone(),
        },
        FieldDescriptor {
            name: "identifiantFiscal",
            render: |c| c.identifiant_fiscal.clone(),
        },
        FieldDescriptor {
            name: "numRegistreCommerce",
            render: |c| c.num_registre_commerce.clone(),
        },
        FieldDescriptor {
            name: "numPatente",
            render: |c| c.num_patente.clone(),
        },
        FieldDescriptor {
            name: "numAffiliationCnss",
            render: |c| c.num_affiliation_cnss.clone(),
        },
        FieldDescriptor {
            name: "adresse",
            render: |c| c.adresse.clone(),
        },
        FieldDescriptor {
            name: "ville",
            render: |c| c.ville.clone(),
        },
        FieldDescriptor {
            name: "mail",
            render: |c| c.mail.clone(),
        },
        FieldDescriptor {
            name: "siteWeb",
            render: |c| c.site_web.clone(),
        },
        FieldDescriptor {
            name: "nombreEmployes",
            render: |c| c.nombre_employes.map(|v| v.to_string()),
        },
        FieldDescriptor {
            name: "latitude",
            render: |c| c.latitude.map(|v| v.to_string()),
        },
        FieldDescriptor {
            name: "longitude",
            render: |c| c.longitude.map(|v| v.to_string()),
        },
        FieldDescriptor {
            name: "creationDate",
            render: |c| c.creation_date.map(|t| t.to_rfc3339()),
        },
        FieldDescriptor {
            name: "cessationDate",
            render: |c| c.cessation_date.map(|t| t.to_rfc3339()),
        },
        FieldDescriptor {
            name: "logo",
            render: |c| c.logo.as_deref().map(render_logo),
        },
        FieldDescriptor {
            name: "sector",
            render: |c| c.sector.as_ref().map(|s| s.to_string()),
        },
        FieldDescriptor {
            name: "legalForm",
            render: |c| c.legal_form.as_ref().map(|f| f.to_string()),
        },
    ];
    FIELDS
}

/// One differing field between two snapshots, in canonical string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub attribute: &'static str,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Compare two snapshots field by field. A field differs when exactly one
/// side is absent, or both are present with unequal renderings.
pub fn diff(before: &Company, after: &Company) -> Vec<FieldChange> {
    field_descriptors()
        .iter()
        .filter_map(|field| {
            let old = field.render(before);
            let new = field.render(after);
            (old != new).then(|| FieldChange {
                attribute: field.name,
                old,
                new,
            })
        })
        .collect()
}

/// Persist one history record per differing field, skipping any
/// (attribute, old, new) triple already recorded for this company.
///
/// Returns the number of records actually inserted.
pub async fn record_changes(
    store: &dyn DirectoryStore,
    before: &Company,
    after: &Company,
) -> Result<usize, CoreError> {
    let mut recorded = 0;

    for change in diff(before, after) {
        let exists = store
            .change_exists(
                after.id,
                change.attribute,
                change.old.as_deref(),
                change.new.as_deref(),
            )
            .await?;
        if exists {
            continue;
        }

        store
            .insert_change(&NewChangeRecord {
                company_id: after.id,
                attribute: change.attribute.to_string(),
                old_value: change.old,
                new_value: change.new,
                changed_at: Utc::now(),
            })
            .await?;
        recorded += 1;
    }

    if recorded > 0 {
        tracing::debug!(company_id = after.id, recorded, "recorded field changes");
    }
    Ok(recorded)
}
