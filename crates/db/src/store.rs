//! `DirectoryStore` implementation over PostgreSQL.

use async_trait::async_trait;
use sqlx::FromRow;

use annuaire_core::error::StoreError;
use annuaire_core::model::{
    ChangeRecord, Company, CreateCompany, Fax, LegalForm, Manager, NewChangeRecord, NewFax,
    NewManager, NewPhone, Phone, Sector,
};
use annuaire_core::store::{CompanyFilter, DirectoryStore};
use annuaire_core::types::{DbId, Timestamp};

use crate::DbPool;

/// Column list shared across company queries to avoid repetition.
const COMPANY_COLUMNS: &str = "c.id, c.denomination, c.capital_social, c.ice, \
    c.identifiant_fiscal, c.num_registre_commerce, c.num_patente, c.num_affiliation_cnss, \
    c.adresse, c.ville, c.mail, c.site_web, c.nombre_employes, c.latitude, c.longitude, \
    c.creation_date, c.cessation_date, c.logo, \
    s.id AS sector_id, s.nom AS sector_nom, f.id AS legal_form_id, f.nom AS legal_form_nom";

const COMPANY_FROM: &str = "companies c \
    LEFT JOIN sectors s ON s.id = c.sector_id \
    LEFT JOIN legal_forms f ON f.id = c.legal_form_id";

#[derive(Debug, FromRow)]
struct CompanyRow {
    id: DbId,
    denomination: Option<String>,
    capital_social: Option<f64>,
    ice: Option<String>,
    identifiant_fiscal: Option<String>,
    num_registre_commerce: Option<String>,
    num_patente: Option<String>,
    num_affiliation_cnss: Option<String>,
    adresse: Option<String>,
    ville: Option<String>,
    mail: Option<String>,
    site_web: Option<String>,
    nombre_employes: Option<i32>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    creation_date: Option<Timestamp>,
    cessation_date: Option<Timestamp>,
    logo: Option<Vec<u8>>,
    sector_id: Option<DbId>,
    sector_nom: Option<String>,
    legal_form_id: Option<DbId>,
    legal_form_nom: Option<String>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id,
            denomination: row.denomination,
            capital_social: row.capital_social,
            ice: row.ice,
            identifiant_fiscal: row.identifiant_fiscal,
            num_registre_commerce: row.num_registre_commerce,
            num_patente: row.num_patente,
            num_affiliation_cnss: row.num_affiliation_cnss,
            adresse: row.adresse,
            ville: row.ville,
            mail: row.mail,
            site_web: row.site_web,
            nombre_employes: row.nombre_employes,
            latitude: row.latitude,
            longitude: row.longitude,
            creation_date: row.creation_date,
            cessation_date: row.cessation_date,
            logo: row.logo,
            sector: row
                .sector_id
                .zip(row.sector_nom)
                .map(|(id, nom)| Sector { id, nom }),
            legal_form: row
                .legal_form_id
                .zip(row.legal_form_nom)
                .map(|(id, nom)| LegalForm { id, nom }),
        }
    }
}

#[derive(Debug, FromRow)]
struct SectorRow {
    id: DbId,
    nom: String,
}

#[derive(Debug, FromRow)]
struct LegalFormRow {
    id: DbId,
    nom: String,
}

#[derive(Debug, FromRow)]
struct PhoneRow {
    id: DbId,
    company_id: DbId,
    numero: Option<String>,
}

#[derive(Debug, FromRow)]
struct FaxRow {
    id: DbId,
    company_id: DbId,
    numero: Option<String>,
}

#[derive(Debug, FromRow)]
struct ManagerRow {
    id: DbId,
    company_id: DbId,
    nom: Option<String>,
    prenom: Option<String>,
}

#[derive(Debug, FromRow)]
struct ChangeRow {
    id: DbId,
    company_id: DbId,
    attribute: String,
    old_value: Option<String>,
    new_value: Option<String>,
    changed_at: Timestamp,
}

/// PostgreSQL-backed [`DirectoryStore`].
#[derive(Debug, Clone)]
pub struct PgDirectoryStore {
    pool: DbPool,
}

impl PgDirectoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_company(&self, id: DbId) -> Result<Option<Company>, StoreError> {
        let query = format!("SELECT {COMPANY_COLUMNS} FROM {COMPANY_FROM} WHERE c.id = $1");
        let row = sqlx::query_as::<_, CompanyRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.map(Company::from))
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn insert_company(&self, company: &CreateCompany) -> Result<Company, StoreError> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO companies
                (denomination, capital_social, ice, identifiant_fiscal,
                 num_registre_commerce, num_patente, num_affiliation_cnss,
                 adresse, ville, mail, site_web, nombre_employes,
                 latitude, longitude, creation_date, cessation_date,
                 sector_id, legal_form_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                     $13, $14, $15, $16, $17, $18)
             RETURNING id",
        )
        .bind(&company.denomination)
        .bind(company.capital_social)
        .bind(&company.ice)
        .bind(&company.identifiant_fiscal)
        .bind(&company.num_registre_commerce)
        .bind(&company.num_patente)
        .bind(&company.num_affiliation_cnss)
        .bind(&company.adresse)
        .bind(&company.ville)
        .bind(&company.mail)
        .bind(&company.site_web)
        .bind(company.nombre_employes)
        .bind(company.latitude)
        .bind(company.longitude)
        .bind(company.creation_date)
        .bind(company.cessation_date)
        .bind(company.sector_id)
        .bind(company.legal_form_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        self.fetch_company(id)
            .await?
            .ok_or_else(|| StoreError(anyhow::anyhow!("company {id} vanished after insert")))
    }

    async fn find_company(&self, id: DbId) -> Result<Option<Company>, StoreError> {
        self.fetch_company(id).await
    }

    async fn save_company(&self, company: &Company) -> Result<Company, StoreError> {
        sqlx::query(
            "UPDATE companies SET
                denomination = $2, capital_social = $3, ice = $4,
                identifiant_fiscal = $5, num_registre_commerce = $6,
                num_patente = $7, num_affiliation_cnss = $8, adresse = $9,
                ville = $10, mail = $11, site_web = $12, nombre_employes = $13,
                latitude = $14, longitude = $15, creation_date = $16,
                cessation_date = $17, logo = $18, sector_id = $19,
                legal_form_id = $20
             WHERE id = $1",
        )
        .bind(company.id)
        .bind(&company.denomination)
        .bind(company.capital_social)
        .bind(&company.ice)
        .bind(&company.identifiant_fiscal)
        .bind(&company.num_registre_commerce)
        .bind(&company.num_patente)
        .bind(&company.num_affiliation_cnss)
        .bind(&company.adresse)
        .bind(&company.ville)
        .bind(&company.mail)
        .bind(&company.site_web)
        .bind(company.nombre_employes)
        .bind(company.latitude)
        .bind(company.longitude)
        .bind(company.creation_date)
        .bind(company.cessation_date)
        .bind(&company.logo)
        .bind(company.sector.as_ref().map(|s| s.id))
        .bind(company.legal_form.as_ref().map(|f| f.id))
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        self.fetch_company(company.id).await?.ok_or_else(|| {
            StoreError(anyhow::anyhow!("company {} vanished during save", company.id))
        })
    }

    async fn delete_company(&self, id: DbId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_companies(&self, filter: &CompanyFilter) -> Result<Vec<Company>, StoreError> {
        let query = format!(
            "SELECT {COMPANY_COLUMNS} FROM {COMPANY_FROM}
             WHERE ($1::text IS NULL OR c.ville = $1)
               AND ($2::text IS NULL OR c.denomination ILIKE '%' || $2 || '%')
               AND ($3::text IS NULL OR s.nom = $3)
               AND ($4::text IS NULL OR f.nom = $4)
             ORDER BY c.id"
        );
        let rows = sqlx::query_as::<_, CompanyRow>(&query)
            .bind(filter.ville.as_deref())
            .bind(filter.denomination.as_deref())
            .bind(filter.sector.as_deref())
            .bind(filter.legal_form.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Company::from).collect())
    }

    async fn distinct_cities(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar(
            "SELECT DISTINCT ville FROM companies WHERE ville IS NOT NULL ORDER BY ville",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)
    }

    async fn find_sector(&self, id: DbId) -> Result<Option<Sector>, StoreError> {
        let row = sqlx::query_as::<_, SectorRow>("SELECT id, nom FROM sectors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.map(|r| Sector { id: r.id, nom: r.nom }))
    }

    async fn list_sectors(&self) -> Result<Vec<Sector>, StoreError> {
        let rows = sqlx::query_as::<_, SectorRow>("SELECT id, nom FROM sectors ORDER BY nom")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(rows
            .into_iter()
            .map(|r| Sector { id: r.id, nom: r.nom })
            .collect())
    }

    async fn find_legal_form(&self, id: DbId) -> Result<Option<LegalForm>, StoreError> {
        let row =
            sqlx::query_as::<_, LegalFormRow>("SELECT id, nom FROM legal_forms WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        Ok(row.map(|r| LegalForm { id: r.id, nom: r.nom }))
    }

    async fn list_legal_forms(&self) -> Result<Vec<LegalForm>, StoreError> {
        let rows =
            sqlx::query_as::<_, LegalFormRow>("SELECT id, nom FROM legal_forms ORDER BY nom")
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        Ok(rows
            .into_iter()
            .map(|r| LegalForm { id: r.id, nom: r.nom })
            .collect())
    }

    async fn phones_by_company(&self, company_id: DbId) -> Result<Vec<Phone>, StoreError> {
        let rows = sqlx::query_as::<_, PhoneRow>(
            "SELECT id, company_id, numero FROM phones WHERE company_id = $1 ORDER BY id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows
            .into_iter()
            .map(|r| Phone {
                id: r.id,
                company_id: r.company_id,
                numero: r.numero,
            })
            .collect())
    }

    async fn insert_phone(&self, phone: &NewPhone) -> Result<Phone, StoreError> {
        let row = sqlx::query_as::<_, PhoneRow>(
            "INSERT INTO phones (company_id, numero) VALUES ($1, $2)
             RETURNING id, company_id, numero",
        )
        .bind(phone.company_id)
        .bind(&phone.numero)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(Phone {
            id: row.id,
            company_id: row.company_id,
            numero: row.numero,
        })
    }

    async fn update_phone(&self, phone: &Phone) -> Result<Phone, StoreError> {
        let row = sqlx::query_as::<_, PhoneRow>(
            "UPDATE phones SET numero = $2 WHERE id = $1
             RETURNING id, company_id, numero",
        )
        .bind(phone.id)
        .bind(&phone.numero)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(Phone {
            id: row.id,
            company_id: row.company_id,
            numero: row.numero,
        })
    }

    async fn faxes_by_company(&self, company_id: DbId) -> Result<Vec<Fax>, StoreError> {
        let rows = sqlx::query_as::<_, FaxRow>(
            "SELECT id, company_id, numero FROM faxes WHERE company_id = $1 ORDER BY id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows
            .into_iter()
            .map(|r| Fax {
                id: r.id,
                company_id: r.company_id,
                numero: r.numero,
            })
            .collect())
    }

    async fn insert_fax(&self, fax: &NewFax) -> Result<Fax, StoreError> {
        let row = sqlx::query_as::<_, FaxRow>(
            "INSERT INTO faxes (company_id, numero) VALUES ($1, $2)
             RETURNING id, company_id, numero",
        )
        .bind(fax.company_id)
        .bind(&fax.numero)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(Fax {
            id: row.id,
            company_id: row.company_id,
            numero: row.numero,
        })
    }

    async fn update_fax(&self, fax: &Fax) -> Result<Fax, StoreError> {
        let row = sqlx::query_as::<_, FaxRow>(
            "UPDATE faxes SET numero = $2 WHERE id = $1
             RETURNING id, company_id, numero",
        )
        .bind(fax.id)
        .bind(&fax.numero)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(Fax {
            id: row.id,
            company_id: row.company_id,
            numero: row.numero,
        })
    }

    async fn managers_by_company(&self, company_id: DbId) -> Result<Vec<Manager>, StoreError> {
        let rows = sqlx::query_as::<_, ManagerRow>(
            "SELECT id, company_id, nom, prenom FROM managers
             WHERE company_id = $1 ORDER BY id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows
            .into_iter()
            .map(|r| Manager {
                id: r.id,
                company_id: r.company_id,
                nom: r.nom,
                prenom: r.prenom,
            })
            .collect())
    }

    async fn insert_manager(&self, manager: &NewManager) -> Result<Manager, StoreError> {
        let row = sqlx::query_as::<_, ManagerRow>(
            "INSERT INTO managers (company_id, nom, prenom) VALUES ($1, $2, $3)
             RETURNING id, company_id, nom, prenom",
        )
        .bind(manager.company_id)
        .bind(&manager.nom)
        .bind(&manager.prenom)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(Manager {
            id: row.id,
            company_id: row.company_id,
            nom: row.nom,
            prenom: row.prenom,
        })
    }

    async fn update_manager(&self, manager: &Manager) -> Result<Manager, StoreError> {
        let row = sqlx::query_as::<_, ManagerRow>(
            "UPDATE managers SET nom = $2, prenom = $3 WHERE id = $1
             RETURNING id, company_id, nom, prenom",
        )
        .bind(manager.id)
        .bind(&manager.nom)
        .bind(&manager.prenom)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(Manager {
            id: row.id,
            company_id: row.company_id,
            nom: row.nom,
            prenom: row.prenom,
        })
    }

    async fn changes_by_company(&self, company_id: DbId) -> Result<Vec<ChangeRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ChangeRow>(
            "SELECT id, company_id, attribute, old_value, new_value, changed_at
             FROM company_changes WHERE company_id = $1 ORDER BY changed_at, id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows
            .into_iter()
            .map(|r| ChangeRecord {
                id: r.id,
                company_id: r.company_id,
                attribute: r.attribute,
                old_value: r.old_value,
                new_value: r.new_value,
                changed_at: r.changed_at,
            })
            .collect())
    }

    async fn change_exists(
        &self,
        company_id: DbId,
        attribute: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> Result<bool, StoreError> {
        // IS NOT DISTINCT FROM treats NULL as an ordinary comparable value.
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM company_changes
                WHERE company_id = $1
                  AND attribute = $2
                  AND old_value IS NOT DISTINCT FROM $3
                  AND new_value IS NOT DISTINCT FROM $4
             )",
        )
        .bind(company_id)
        .bind(attribute)
        .bind(old_value)
        .bind(new_value)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)
    }

    async fn insert_change(&self, change: &NewChangeRecord) -> Result<ChangeRecord, StoreError> {
        let row = sqlx::query_as::<_, ChangeRow>(
            "INSERT INTO company_changes
                (company_id, attribute, old_value, new_value, changed_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, company_id, attribute, old_value, new_value, changed_at",
        )
        .bind(change.company_id)
        .bind(&change.attribute)
        .bind(&change.old_value)
        .bind(&change.new_value)
        .bind(change.changed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(ChangeRecord {
            id: row.id,
            company_id: row.company_id,
            attribute: row.attribute,
            old_value: row.old_value,
            new_value: row.new_value,
            changed_at: row.changed_at,
        })
    }
}
