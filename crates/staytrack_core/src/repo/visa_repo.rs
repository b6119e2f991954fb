//! Visa repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist visa and residence-permit records.
//! - Resolve the exempt-country set for an evaluation date in one query.
//!
//! # Invariants
//! - Writes call `Visa::validate()` before SQL mutations.
//! - `exempt_countries(as_of)` agrees with `Visa::exempt_country_on(as_of)`.

use super::{
    bool_to_int, date_to_db, ensure_tables_ready, parse_bool, parse_date, parse_uuid, RepoError,
    RepoResult,
};
use crate::model::visa::{Visa, VisaCategory, VisaEntries, VisaId};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;

const VISA_COLUMNS: &[&str] = &[
    "id",
    "visa_number",
    "category",
    "country",
    "issue_date",
    "expiry_date",
    "duration_of_stay",
    "entries",
    "is_active",
    "notes",
];

const VISA_SELECT_SQL: &str = "SELECT
    id,
    visa_number,
    category,
    country,
    issue_date,
    expiry_date,
    duration_of_stay,
    entries,
    is_active,
    notes
FROM visas";

/// Repository interface for visa records.
pub trait VisaRepository {
    fn create_visa(&self, visa: &Visa) -> RepoResult<VisaId>;
    fn update_visa(&self, visa: &Visa) -> RepoResult<()>;
    /// Deletes the record; trips bound to it keep existing unbound.
    fn delete_visa(&self, id: VisaId) -> RepoResult<()>;
    fn get_visa(&self, id: VisaId) -> RepoResult<Option<Visa>>;
    /// Lists visas ordered by `expiry_date DESC, id ASC`.
    fn list_visas(&self, active_only: bool) -> RepoResult<Vec<Visa>>;
    /// Clears `is_active` on records that expired before `as_of`.
    fn deactivate_expired(&self, as_of: NaiveDate) -> RepoResult<usize>;
    /// Countries with an active long-stay source not expired at `as_of`.
    fn exempt_countries(&self, as_of: NaiveDate) -> RepoResult<BTreeSet<String>>;
}

/// SQLite-backed visa repository.
pub struct SqliteVisaRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVisaRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables_ready(conn, &[("visas", VISA_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl VisaRepository for SqliteVisaRepository<'_> {
    fn create_visa(&self, visa: &Visa) -> RepoResult<VisaId> {
        visa.validate()?;

        self.conn.execute(
            "INSERT INTO visas (
                id,
                visa_number,
                category,
                country,
                issue_date,
                expiry_date,
                duration_of_stay,
                entries,
                is_active,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                visa.id.to_string(),
                visa.visa_number.as_str(),
                category_to_db(visa.category),
                visa.country.as_deref(),
                date_to_db(visa.issue_date),
                date_to_db(visa.expiry_date),
                i64::from(visa.duration_of_stay),
                entries_to_db(visa.entries),
                bool_to_int(visa.is_active),
                visa.notes.as_deref(),
            ],
        )?;

        Ok(visa.id)
    }

    fn update_visa(&self, visa: &Visa) -> RepoResult<()> {
        visa.validate()?;

        let changed = self.conn.execute(
            "UPDATE visas
             SET
                visa_number = ?1,
                category = ?2,
                country = ?3,
                issue_date = ?4,
                expiry_date = ?5,
                duration_of_stay = ?6,
                entries = ?7,
                is_active = ?8,
                notes = ?9
             WHERE id = ?10;",
            params![
                visa.visa_number.as_str(),
                category_to_db(visa.category),
                visa.country.as_deref(),
                date_to_db(visa.issue_date),
                date_to_db(visa.expiry_date),
                i64::from(visa.duration_of_stay),
                entries_to_db(visa.entries),
                bool_to_int(visa.is_active),
                visa.notes.as_deref(),
                visa.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::VisaNotFound(visa.id));
        }
        Ok(())
    }

    fn delete_visa(&self, id: VisaId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM visas WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::VisaNotFound(id));
        }
        Ok(())
    }

    fn get_visa(&self, id: VisaId) -> RepoResult<Option<Visa>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VISA_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_visa_row(row)?));
        }
        Ok(None)
    }

    fn list_visas(&self, active_only: bool) -> RepoResult<Vec<Visa>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VISA_SELECT_SQL}
             WHERE (?1 = 0 OR is_active = 1)
             ORDER BY expiry_date DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(active_only)])?;
        let mut visas = Vec::new();
        while let Some(row) = rows.next()? {
            visas.push(parse_visa_row(row)?);
        }
        Ok(visas)
    }

    fn deactivate_expired(&self, as_of: NaiveDate) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE visas
             SET is_active = 0
             WHERE is_active = 1
               AND expiry_date < ?1;",
            [date_to_db(as_of)],
        )?;
        Ok(changed)
    }

    fn exempt_countries(&self, as_of: NaiveDate) -> RepoResult<BTreeSet<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT country
             FROM visas
             WHERE category IN ('type_d', 'residence_permit')
               AND is_active = 1
               AND country IS NOT NULL
               AND expiry_date >= ?1;",
        )?;
        let mut rows = stmt.query([date_to_db(as_of)])?;
        let mut countries = BTreeSet::new();
        while let Some(row) = rows.next()? {
            let country: String = row.get(0)?;
            countries.insert(country.trim().to_ascii_uppercase());
        }
        Ok(countries)
    }
}

fn parse_visa_row(row: &Row<'_>) -> RepoResult<Visa> {
    let id_text: String = row.get("id")?;
    let category_text: String = row.get("category")?;
    let category = parse_category(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in visas.category"
        ))
    })?;
    let entries_text: String = row.get("entries")?;
    let entries = parse_entries(&entries_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid entries `{entries_text}` in visas.entries"))
    })?;
    let duration: i64 = row.get("duration_of_stay")?;
    let duration_of_stay = u32::try_from(duration).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid duration `{duration}` in visas.duration_of_stay"
        ))
    })?;
    let issue: String = row.get("issue_date")?;
    let expiry: String = row.get("expiry_date")?;

    let visa = Visa {
        id: parse_uuid(&id_text, "visas.id")?,
        visa_number: row.get("visa_number")?,
        category,
        country: row.get("country")?,
        issue_date: parse_date(&issue, "visas.issue_date")?,
        expiry_date: parse_date(&expiry, "visas.expiry_date")?,
        duration_of_stay,
        entries,
        is_active: parse_bool(row.get("is_active")?, "visas.is_active")?,
        notes: row.get("notes")?,
    };
    visa.validate()?;
    Ok(visa)
}

fn category_to_db(category: VisaCategory) -> &'static str {
    match category {
        VisaCategory::TypeC => "type_c",
        VisaCategory::TypeD => "type_d",
        VisaCategory::ResidencePermit => "residence_permit",
    }
}

fn parse_category(value: &str) -> Option<VisaCategory> {
    match value {
        "type_c" => Some(VisaCategory::TypeC),
        "type_d" => Some(VisaCategory::TypeD),
        "residence_permit" => Some(VisaCategory::ResidencePermit),
        _ => None,
    }
}

fn entries_to_db(entries: VisaEntries) -> &'static str {
    match entries {
        VisaEntries::Single => "single",
        VisaEntries::Double => "double",
        VisaEntries::Multi => "multi",
    }
}

fn parse_entries(value: &str) -> Option<VisaEntries> {
    match value {
        "single" => Some(VisaEntries::Single),
        "double" => Some(VisaEntries::Double),
        "multi" => Some(VisaEntries::Multi),
        _ => None,
    }
}
