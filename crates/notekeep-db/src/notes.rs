//! PostgreSQL note repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use notekeep_core::{
    CreateNoteRequest, DataService, Error, ListNotesResponse, Note, Result, ServiceError,
};

/// PostgreSQL implementation of [`DataService`].
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn note_from_row(row: &PgRow) -> std::result::Result<Note, sqlx::Error> {
    Ok(Note {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        image_key: row.try_get("image_key")?,
        created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
    })
}

#[async_trait]
impl DataService for PgNoteRepository {
    async fn list(&self) -> Result<ListNotesResponse> {
        let rows = sqlx::query(
            "SELECT id, name, description, image_key, created_at FROM note ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut response = ListNotesResponse::default();
        for row in &rows {
            match note_from_row(row) {
                Ok(note) => response.data.push(note),
                Err(e) => {
                    let id: Option<Uuid> = row.try_get("id").ok();
                    warn!(
                        subsystem = "db",
                        component = "notes",
                        op = "list",
                        error = %e,
                        "Skipping note row that failed to decode"
                    );
                    let mut err = ServiceError::new(e.to_string());
                    if let Some(id) = id {
                        err = err.with_path(format!("note/{}", id));
                    }
                    response.errors.push(err);
                }
            }
        }

        debug!(
            subsystem = "db",
            component = "notes",
            op = "list",
            result_count = response.data.len(),
            error_count = response.errors.len(),
            "Listed notes"
        );
        Ok(response)
    }

    async fn create(&self, req: CreateNoteRequest) -> Result<Note> {
        req.validate()?;

        let row = sqlx::query(
            r#"INSERT INTO note (id, name, description, image_key, created_at)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, name, description, image_key, created_at"#,
        )
        .bind(Uuid::now_v7())
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.image_key)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let note = note_from_row(&row).map_err(Error::Database)?;
        debug!(
            subsystem = "db",
            component = "notes",
            op = "create",
            note_id = %note.id,
            "Inserted note"
        );
        Ok(note)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        debug!(subsystem = "db", component = "notes", op = "delete", note_id = %id, "Deleted note");
        Ok(())
    }
}
