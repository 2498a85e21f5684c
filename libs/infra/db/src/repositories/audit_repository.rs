// [libs/infra/db/src/repositories/audit_repository.rs]
/*!
 * =================================================================
 * APARATO: AUDIT REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: BITÁCORA DE EVENTOS DE CONEXIÓN, APPEND-ONLY
 * =================================================================
 */

use crate::errors::DbError;
use crate::DbClient;
use chrono::{DateTime, Utc};
use kerbside_domain_model::AuditEvent;
use libsql::params;
use tracing::instrument;

pub struct AuditRepository {
    client: DbClient,
}

impl AuditRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, event))]
    pub async fn add_audit_event(&self, event: &AuditEvent) -> Result<(), DbError> {
        let connection = self.client.connection()?;
        connection
            .execute(
                r#"
                INSERT INTO auditevents (source, uuid, timestamp, session_id, channel, node, pid, message)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    event.source.clone(),
                    event.uuid.clone(),
                    event.timestamp.to_rfc3339(),
                    event.session_id.clone(),
                    event.channel.clone(),
                    event.node.clone(),
                    event.pid,
                    event.message.clone()
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn count_audit_events(&self, source: &str, uuid: &str) -> Result<u64, DbError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT COUNT(*) FROM auditevents WHERE source = ?1 AND uuid = ?2",
                params![source, uuid],
            )
            .await?;

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?,
            None => 0,
        };
        Ok(count as u64)
    }

    pub async fn get_audit_events(
        &self,
        source: &str,
        uuid: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AuditEvent>, DbError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                r#"
                SELECT source, uuid, timestamp, session_id, channel, node, pid, message
                FROM auditevents
                WHERE source = ?1 AND uuid = ?2
                ORDER BY timestamp DESC
                LIMIT ?3 OFFSET ?4
                "#,
                params![source, uuid, limit as i64, offset as i64],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_event(&row)?);
        }
        Ok(out)
    }
}

fn row_to_event(row: &libsql::Row) -> Result<AuditEvent, DbError> {
    let timestamp: String = row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(AuditEvent {
        source: row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        uuid: row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .with_timezone(&Utc),
        session_id: row.get(3).map_err(|e| DbError::MappingError(e.to_string()))?,
        channel: row.get(4).map_err(|e| DbError::MappingError(e.to_string()))?,
        node: row.get(5).map_err(|e| DbError::MappingError(e.to_string()))?,
        pid: row.get(6).map_err(|e| DbError::MappingError(e.to_string()))?,
        message: row.get(7).map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}
