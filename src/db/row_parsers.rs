use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::authz::RoleRecord;
use crate::errors::AppError;
use crate::models::campaign::{BallotEntry, Campaign};
use crate::models::candidate::Candidate;
use crate::models::file::StoredFile;
use crate::models::list::List;
use crate::models::organization::{Organization, OrganizationStatus};
use crate::models::position::Position;
use crate::models::role::{Permission, Role};
use crate::models::user::DbUser;

pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite CURRENT_TIMESTAMP format
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    if let Ok(naive_date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ndt = naive_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AppError::internal("invalid datetime: date out of range".to_string()))?;
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

pub fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| AppError::internal(format!("invalid date {}: {}", s, e)))
}

/// Storage form of a date column.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn text(row: &SqliteRow, col: &str) -> Result<String, AppError> {
    row.try_get::<String, _>(col).map_err(|e| AppError::internal(format!("missing {}: {}", col, e)))
}

fn opt_text(row: &SqliteRow, col: &str) -> Result<Option<String>, AppError> {
    row.try_get::<Option<String>, _>(col).map_err(|e| AppError::internal(format!("missing {}: {}", col, e)))
}

fn integer(row: &SqliteRow, col: &str) -> Result<i64, AppError> {
    row.try_get::<i64, _>(col).map_err(|e| AppError::internal(format!("missing {}: {}", col, e)))
}

fn opt_integer(row: &SqliteRow, col: &str) -> Result<Option<i64>, AppError> {
    row.try_get::<Option<i64>, _>(col).map_err(|e| AppError::internal(format!("missing {}: {}", col, e)))
}

pub fn uuid_col(row: &SqliteRow, col: &str) -> Result<Uuid, AppError> {
    let s = text(row, col)?;
    Uuid::parse_str(&s).map_err(|e| AppError::internal(format!("invalid uuid in {}: {}", col, e)))
}

pub fn opt_uuid_col(row: &SqliteRow, col: &str) -> Result<Option<Uuid>, AppError> {
    match opt_text(row, col)? {
        Some(s) if !s.trim().is_empty() => Uuid::parse_str(&s)
            .map(Some)
            .map_err(|e| AppError::internal(format!("invalid uuid in {}: {}", col, e))),
        _ => Ok(None),
    }
}

fn datetime_col(row: &SqliteRow, col: &str) -> Result<DateTime<Utc>, AppError> {
    parse_datetime(&text(row, col)?)
}

fn opt_datetime_col(row: &SqliteRow, col: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    match opt_text(row, col)? {
        Some(s) if !s.trim().is_empty() => Ok(Some(parse_datetime(&s)?)),
        _ => Ok(None),
    }
}

pub fn role_record_from_row(row: &SqliteRow) -> Result<RoleRecord, AppError> {
    Ok(RoleRecord {
        id: uuid_col(row, "id")?,
        org_id: uuid_col(row, "org_id")?,
        list_id: opt_uuid_col(row, "list_id")?,
        level: integer(row, "level")?,
    })
}

/// Role columns only; permissions are attached by the caller.
pub fn role_from_row(row: &SqliteRow) -> Result<Role, AppError> {
    Ok(Role {
        id: uuid_col(row, "id")?,
        org_id: uuid_col(row, "org_id")?,
        list_id: opt_uuid_col(row, "list_id")?,
        name: text(row, "name")?,
        color: opt_text(row, "color")?,
        level: integer(row, "level")?,
        permissions: Vec::new(),
        created_at: datetime_col(row, "created_at")?,
        updated_at: datetime_col(row, "updated_at")?,
    })
}

pub fn permission_from_row(row: &SqliteRow) -> Result<Permission, AppError> {
    Ok(Permission {
        id: uuid_col(row, "id")?,
        name: text(row, "name")?,
        description: opt_text(row, "description")?,
    })
}

pub fn organization_from_row(row: &SqliteRow) -> Result<Organization, AppError> {
    Ok(Organization {
        id: uuid_col(row, "id")?,
        code: text(row, "code")?,
        name: text(row, "name")?,
        status: OrganizationStatus::parse(&text(row, "status")?)?,
        max_lists: opt_integer(row, "max_lists")?,
        created_at: datetime_col(row, "created_at")?,
    })
}

pub fn list_from_row(row: &SqliteRow) -> Result<List, AppError> {
    Ok(List {
        id: uuid_col(row, "id")?,
        org_id: uuid_col(row, "org_id")?,
        name: text(row, "name")?,
        description: text(row, "description")?,
        slogan: text(row, "slogan")?,
        color_primary: opt_text(row, "color_primary")?,
        color_secondary: opt_text(row, "color_secondary")?,
        logo_file_id: opt_uuid_col(row, "logo_file_id")?,
        created_at: datetime_col(row, "created_at")?,
    })
}

pub fn db_user_from_row(row: &SqliteRow) -> Result<DbUser, AppError> {
    Ok(DbUser {
        id: uuid_col(row, "id")?,
        org_id: uuid_col(row, "org_id")?,
        name: text(row, "name")?,
        surname: text(row, "surname")?,
        email: text(row, "email")?,
        password_hash: text(row, "password_hash")?,
        must_change_password: integer(row, "must_change_password")? != 0,
        created_at: datetime_col(row, "created_at")?,
        updated_at: datetime_col(row, "updated_at")?,
        deleted_at: opt_datetime_col(row, "deleted_at")?,
    })
}

pub fn campaign_from_row(row: &SqliteRow) -> Result<Campaign, AppError> {
    Ok(Campaign {
        id: uuid_col(row, "id")?,
        list_id: uuid_col(row, "list_id")?,
        name: text(row, "name")?,
        description: opt_text(row, "description")?,
        start_date: parse_date(&text(row, "start_date")?)?,
        end_date: parse_date(&text(row, "end_date")?)?,
        created_at: datetime_col(row, "created_at")?,
        updated_at: datetime_col(row, "updated_at")?,
    })
}

pub fn candidate_from_row(row: &SqliteRow) -> Result<Candidate, AppError> {
    Ok(Candidate {
        id: uuid_col(row, "id")?,
        list_id: uuid_col(row, "list_id")?,
        user_id: uuid_col(row, "user_id")?,
        school_class: text(row, "school_class")?,
        bio: opt_text(row, "bio")?,
        photo_file_id: opt_uuid_col(row, "photo_file_id")?,
        created_at: datetime_col(row, "created_at")?,
    })
}

pub fn position_from_row(row: &SqliteRow) -> Result<Position, AppError> {
    Ok(Position {
        id: uuid_col(row, "id")?,
        org_id: uuid_col(row, "org_id")?,
        list_id: opt_uuid_col(row, "list_id")?,
        name: text(row, "name")?,
        created_at: datetime_col(row, "created_at")?,
    })
}

/// Candidate columns plus `position_in_list` and the `position_*` aliases of
/// an outer-joined position.
pub fn ballot_entry_from_row(row: &SqliteRow) -> Result<BallotEntry, AppError> {
    let position = match opt_uuid_col(row, "position_id")? {
        Some(id) => Some(Position {
            id,
            org_id: uuid_col(row, "position_org_id")?,
            list_id: opt_uuid_col(row, "position_list_id")?,
            name: text(row, "position_name")?,
            created_at: datetime_col(row, "position_created_at")?,
        }),
        None => None,
    };
    Ok(BallotEntry {
        candidate: candidate_from_row(row)?,
        position_in_list: opt_integer(row, "position_in_list")?,
        position,
    })
}

pub fn file_from_row(row: &SqliteRow) -> Result<StoredFile, AppError> {
    Ok(StoredFile {
        id: uuid_col(row, "id")?,
        org_id: uuid_col(row, "org_id")?,
        list_id: opt_uuid_col(row, "list_id")?,
        user_id: uuid_col(row, "user_id")?,
        name: text(row, "name")?,
        mime_type: text(row, "mime_type")?,
        size_bytes: integer(row, "size_bytes")?,
        category: opt_text(row, "category")?,
        storage_path: text(row, "storage_path")?,
        uploaded_at: datetime_col(row, "uploaded_at")?,
    })
}

/// `?, ?, ?` for binding `n` values into an `IN (...)` clause.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_sqlite_timestamps() {
        let a = parse_datetime("2025-11-19T12:34:56Z").unwrap();
        let b = parse_datetime("2025-11-19 12:34:56").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn date_only_timestamps_land_on_midnight() {
        let dt = parse_datetime("2025-01-02").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-02T00:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime("not a date").is_err());
        assert!(parse_date("2025-13-01").is_err());
    }

    #[test]
    fn formats_dates_for_storage() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(format_date(d), "2026-03-01");
        assert_eq!(parse_date(&format_date(d)).unwrap(), d);
    }

    #[test]
    fn builds_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
