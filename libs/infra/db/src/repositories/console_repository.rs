// [libs/infra/db/src/repositories/console_repository.rs]
/*!
 * =================================================================
 * APARATO: CONSOLE REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN DE CONSOLAS SPICE DESCUBIERTAS
 * =================================================================
 */

use crate::errors::DbError;
use crate::DbClient;
use chrono::{DateTime, Utc};
use kerbside_domain_model::Console;
use libsql::params;
use tracing::instrument;

pub struct ConsoleRepository {
    client: DbClient,
}

/// A read aggregate over a console's live token count and open sessions,
/// assembled for the out-of-scope admin surface — the query itself lives
/// here because it is a pure read over tables this repository owns.
#[derive(Debug, Clone)]
pub struct ConsoleSessionSummary {
    pub console: Console,
    pub live_token_count: u32,
    pub session_ids: Vec<String>,
}

impl ConsoleRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    /// Upserts by `uuid`. Returns `true` if a new row was inserted.
    #[instrument(skip(self, console))]
    pub async fn add_console(&self, console: &Console) -> Result<bool, DbError> {
        let connection = self.client.connection()?;

        let existing: Option<String> = {
            let mut rows = connection
                .query("SELECT uuid FROM consoles WHERE uuid = ?1", params![console.uuid.clone()])
                .await?;
            match rows.next().await? {
                Some(row) => Some(row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?),
                None => None,
            }
        };

        if existing.is_some() {
            connection
                .execute(
                    r#"
                    UPDATE consoles SET
                        hypervisor_hostname = ?2, hypervisor_ip = ?3, insecure_port = ?4,
                        secure_port = ?5, name = ?6, host_subject = ?7
                    WHERE uuid = ?1
                    "#,
                    params![
                        console.uuid.clone(),
                        console.hypervisor_hostname.clone(),
                        console.hypervisor_ip.clone(),
                        console.insecure_port as i64,
                        console.secure_port.map(|p| p as i64),
                        console.name.clone(),
                        console.host_subject.clone()
                    ],
                )
                .await?;
            Ok(false)
        } else {
            connection
                .execute(
                    r#"
                    INSERT INTO consoles (uuid, source, hypervisor_hostname, hypervisor_ip,
                                           insecure_port, secure_port, name, host_subject,
                                           ticket, discovered)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    "#,
                    params![
                        console.uuid.clone(),
                        console.source.clone(),
                        console.hypervisor_hostname.clone(),
                        console.hypervisor_ip.clone(),
                        console.insecure_port as i64,
                        console.secure_port.map(|p| p as i64),
                        console.name.clone(),
                        console.host_subject.clone(),
                        console.ticket.clone(),
                        console.discovered.to_rfc3339()
                    ],
                )
                .await?;
            Ok(true)
        }
    }

    pub async fn get_consoles(&self) -> Result<Vec<Console>, DbError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT uuid, source, hypervisor_hostname, hypervisor_ip, insecure_port,
                        secure_port, name, host_subject, ticket, discovered
                 FROM consoles ORDER BY name",
                (),
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_console(&row)?);
        }
        Ok(out)
    }

    pub async fn get_console(&self, uuid: &str) -> Result<Option<Console>, DbError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT uuid, source, hypervisor_hostname, hypervisor_ip, insecure_port,
                        secure_port, name, host_subject, ticket, discovered
                 FROM consoles WHERE uuid = ?1",
                params![uuid],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_console(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_console_session_summary(
        &self,
        source: &str,
        uuid: &str,
    ) -> Result<Option<ConsoleSessionSummary>, DbError> {
        let console = match self.get_console(uuid).await? {
            Some(c) => c,
            None => return Ok(None),
        };

        let connection = self.client.connection()?;
        let now = Utc::now().timestamp();

        let mut token_rows = connection
            .query(
                "SELECT session_id, expires FROM consoletokens WHERE source = ?1 AND uuid = ?2",
                params![source, uuid],
            )
            .await?;

        let mut live_token_count = 0u32;
        let mut session_ids = Vec::new();
        while let Some(row) = token_rows.next().await? {
            let session_id: String = row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?;
            let expires: i64 = row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?;
            if expires > now {
                live_token_count += 1;
            }

            let mut channel_rows = connection
                .query(
                    "SELECT 1 FROM proxychannels WHERE session_id = ?1 LIMIT 1",
                    params![session_id.clone()],
                )
                .await?;
            if channel_rows.next().await?.is_some() {
                session_ids.push(session_id);
            }
        }

        Ok(Some(ConsoleSessionSummary {
            console,
            live_token_count,
            session_ids,
        }))
    }

    pub async fn store_console_ticket(&self, uuid: &str, ticket: &str) -> Result<(), DbError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE consoles SET ticket = ?2 WHERE uuid = ?1",
                params![uuid, ticket],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::ConsoleNotFound(uuid.to_string()));
        }
        Ok(())
    }

    pub async fn remove_console(&self, uuid: &str) -> Result<(), DbError> {
        let connection = self.client.connection()?;
        connection
            .execute("DELETE FROM consoles WHERE uuid = ?1", params![uuid])
            .await?;
        Ok(())
    }
}

fn row_to_console(row: &libsql::Row) -> Result<Console, DbError> {
    let insecure_port: i64 = row.get(4).map_err(|e| DbError::MappingError(e.to_string()))?;
    let secure_port: Option<i64> = row.get(5).map_err(|e| DbError::MappingError(e.to_string()))?;
    let discovered: String = row.get(9).map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(Console {
        uuid: row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        source: row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        hypervisor_hostname: row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?,
        hypervisor_ip: row.get(3).map_err(|e| DbError::MappingError(e.to_string()))?,
        insecure_port: insecure_port as u16,
        secure_port: secure_port.map(|p| p as u16),
        name: row.get(6).map_err(|e| DbError::MappingError(e.to_string()))?,
        host_subject: row.get(7).map_err(|e| DbError::MappingError(e.to_string()))?,
        ticket: row.get(8).map_err(|e| DbError::MappingError(e.to_string()))?,
        discovered: DateTime::parse_from_rfc3339(&discovered)
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .with_timezone(&Utc),
    })
}
