use std::path::Path;

use sqlx::SqlitePool;
use uuid::Uuid;

use super::{optional_text, require_text};
use crate::authz::{policy, AuthorizationEngine, Guard, Target};
use crate::db::row_parsers::file_from_row;
use crate::errors::{AppError, AppResult};
use crate::models::file::{FileRegisterRequest, StoredFile};
use crate::utils::utc_now;

const FILE_COLUMNS: &str = "id, org_id, list_id, user_id, name, mime_type, size_bytes, category, storage_path, uploaded_at";

/// File metadata. Bytes are written by the storage layer at `storage_path`.
#[derive(Clone)]
pub struct FileService {
    pool: SqlitePool,
    engine: AuthorizationEngine,
    max_upload_bytes: i64,
}

impl FileService {
    pub fn new(pool: SqlitePool, engine: AuthorizationEngine, max_upload_bytes: i64) -> Self {
        Self {
            pool,
            engine,
            max_upload_bytes,
        }
    }

    pub async fn register(&self, actor: Uuid, req: FileRegisterRequest) -> AppResult<StoredFile> {
        let name = require_text(&req.name, "name")?;
        let mime_type = require_text(&req.mime_type, "mime_type")?;
        let category = optional_text(req.category.as_deref(), "category")?;
        if req.size_bytes <= 0 {
            return Err(AppError::bad_request("file is empty"));
        }
        if req.size_bytes > self.max_upload_bytes {
            return Err(AppError::bad_request(format!(
                "file exceeds the upload limit of {} bytes",
                self.max_upload_bytes
            )));
        }

        let target = req.list_id.map(Target::List).unwrap_or(Target::Organization);
        let auth = self
            .engine
            .authorize(actor, Guard::new(target, policy::ADD_FILE))
            .await?;

        let id = Uuid::new_v4();
        let storage_path = storage_path(auth.org_id(), req.list_id, category.as_deref(), id, &name);
        sqlx::query(
            "INSERT INTO files (id, org_id, list_id, user_id, name, mime_type, size_bytes, category, storage_path, uploaded_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(auth.org_id().to_string())
        .bind(req.list_id.map(|l| l.to_string()))
        .bind(actor.to_string())
        .bind(&name)
        .bind(&mime_type)
        .bind(req.size_bytes)
        .bind(&category)
        .bind(&storage_path)
        .bind(utc_now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::info!(file_id = %id, actor_id = %actor, size_bytes = req.size_bytes, "file registered");
        self.fetch(id).await
    }

    /// Uploaders may always remove their own files. References from
    /// candidates and lists are cleared first.
    pub async fn delete(&self, actor: Uuid, file_id: Uuid) -> AppResult<()> {
        self.engine
            .authorize(actor, Guard::new(Target::File(file_id), policy::DELETE_FILE))
            .await?;

        let mut tx = self.pool.begin().await?;
        for sql in [
            "UPDATE candidates SET photo_file_id = NULL WHERE photo_file_id = ?",
            "UPDATE lists SET logo_file_id = NULL WHERE logo_file_id = ?",
            "DELETE FROM files WHERE id = ?",
        ] {
            sqlx::query(sql).bind(file_id.to_string()).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        tracing::info!(file_id = %file_id, actor_id = %actor, "file deleted");
        Ok(())
    }

    /// Any member of the organization may read file metadata.
    pub async fn get(&self, actor: Uuid, file_id: Uuid) -> AppResult<StoredFile> {
        let me = self.engine.resolve_actor(actor).await?;
        let file = self.fetch(file_id).await?;
        if file.org_id != me.org_id {
            return Err(AppError::not_found("file not found"));
        }
        Ok(file)
    }

    async fn fetch(&self, file_id: Uuid) -> AppResult<StoredFile> {
        let sql = format!("SELECT {} FROM files WHERE id = ?", FILE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(file_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("file not found"))?;
        file_from_row(&row)
    }
}

/// `uploads/{org}/{list or "org"}/{category or "0"}/{id}.{ext}`.
fn storage_path(org_id: Uuid, list_id: Option<Uuid>, category: Option<&str>, id: Uuid, name: &str) -> String {
    let scope = list_id.map(|l| l.to_string()).unwrap_or_else(|| "org".to_string());
    let category: String = category
        .map(|c| {
            c.chars()
                .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
                .collect()
        })
        .unwrap_or_else(|| "0".to_string());
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string());
    format!("uploads/{}/{}/{}/{}.{}", org_id, scope, category, id, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_path_falls_back_for_org_files() {
        let (org, id) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            storage_path(org, None, None, id, "README"),
            format!("uploads/{}/org/0/{}.bin", org, id)
        );
    }

    #[test]
    fn storage_path_keeps_list_category_and_extension() {
        let (org, list, id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            storage_path(org, Some(list), Some("logos/2026"), id, "Poster.PNG"),
            format!("uploads/{}/{}/logos_2026/{}.png", org, list, id)
        );
    }
}
