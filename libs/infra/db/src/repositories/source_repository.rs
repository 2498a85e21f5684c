// [libs/infra/db/src/repositories/source_repository.rs]
/*!
 * =================================================================
 * APARATO: SOURCE REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: REGISTRO DE PLATAFORMAS DE VIRTUALIZACIÓN DESCUBIERTAS
 *
 * Owned by the discovery loop (out of scope in this workspace); the
 * proxy itself is a read-mostly consumer of `sources`.
 * =================================================================
 */

use crate::errors::DbError;
use crate::DbClient;
use chrono::{DateTime, Utc};
use kerbside_domain_model::{Source, SourceKind};
use libsql::params;
use tracing::instrument;

pub struct SourceRepository {
    client: DbClient,
}

impl SourceRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, connection_url, credentials, ca_cert))]
    pub async fn add_source(
        &self,
        name: &str,
        kind: SourceKind,
        connection_url: &str,
        credentials: &str,
        ca_cert: Option<&str>,
        seen_by: &str,
    ) -> Result<(), DbError> {
        let connection = self.client.connection()?;
        let now = Utc::now().to_rfc3339();

        connection
            .execute(
                r#"
                INSERT INTO sources (name, kind, connection_url, credentials, ca_cert,
                                      errored, deleted, last_seen, seen_by)
                VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6, ?7)
                ON CONFLICT(name) DO UPDATE SET
                    kind = excluded.kind,
                    connection_url = excluded.connection_url,
                    credentials = excluded.credentials,
                    ca_cert = excluded.ca_cert,
                    errored = 0,
                    deleted = 0,
                    last_seen = excluded.last_seen,
                    seen_by = excluded.seen_by
                "#,
                params![
                    name,
                    kind.as_str(),
                    connection_url,
                    credentials,
                    ca_cert,
                    now,
                    seen_by
                ],
            )
            .await?;

        Ok(())
    }

    pub async fn get_sources(&self) -> Result<Vec<Source>, DbError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT name, kind, connection_url, credentials, ca_cert, errored, deleted,
                        last_seen, seen_by
                 FROM sources WHERE deleted = 0 ORDER BY name",
                (),
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_source(&row)?);
        }
        Ok(out)
    }

    pub async fn get_source(&self, name: &str) -> Result<Option<Source>, DbError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT name, kind, connection_url, credentials, ca_cert, errored, deleted,
                        last_seen, seen_by
                 FROM sources WHERE name = ?1",
                params![name],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_source(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn set_source_error_state(&self, name: &str, errored: bool) -> Result<(), DbError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE sources SET errored = ?2 WHERE name = ?1",
                params![name, errored as i64],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::SourceNotFound(name.to_string()));
        }
        Ok(())
    }

    pub async fn delete_source(&self, name: &str) -> Result<(), DbError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute("UPDATE sources SET deleted = 1 WHERE name = ?1", params![name])
            .await?;
        if affected == 0 {
            return Err(DbError::SourceNotFound(name.to_string()));
        }
        Ok(())
    }
}

fn row_to_source(row: &libsql::Row) -> Result<Source, DbError> {
    let kind_str: String = row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?;
    let kind = SourceKind::parse(&kind_str)
        .ok_or_else(|| DbError::MappingError(format!("unknown source kind: {kind_str}")))?;
    let last_seen: Option<String> = row.get(7).map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(Source {
        name: row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        kind,
        connection_url: row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?,
        credentials: row.get(3).map_err(|e| DbError::MappingError(e.to_string()))?,
        ca_cert: row.get(4).map_err(|e| DbError::MappingError(e.to_string()))?,
        errored: row.get::<i64>(5).map_err(|e| DbError::MappingError(e.to_string()))? != 0,
        deleted: row.get::<i64>(6).map_err(|e| DbError::MappingError(e.to_string()))? != 0,
        last_seen: last_seen
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        seen_by: row.get(8).map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}
