// [libs/infra/db/src/repositories/channel_repository.rs]
/*!
 * =================================================================
 * APARATO: CHANNEL REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: REGISTRO DE CANALES DE PROXY EN VUELO
 * =================================================================
 */

use crate::errors::DbError;
use crate::DbClient;
use chrono::{DateTime, Utc};
use kerbside_domain_model::ProxyChannel;
use libsql::params;
use tracing::instrument;

pub struct ChannelRepository {
    client: DbClient,
}

impl ChannelRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    /// Upserts by `(node, pid)` — a worker re-announcing the same channel
    /// (e.g. after reconnecting a sub-channel) overwrites its own row.
    #[instrument(skip(self, channel))]
    pub async fn record_channel_info(&self, channel: &ProxyChannel) -> Result<(), DbError> {
        let connection = self.client.connection()?;
        connection
            .execute(
                r#"
                INSERT INTO proxychannels (node, pid, created, client_ip, client_port,
                                            connection_id, channel_type, channel_id, session_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(node, pid) DO UPDATE SET
                    created = excluded.created,
                    client_ip = excluded.client_ip,
                    client_port = excluded.client_port,
                    connection_id = excluded.connection_id,
                    channel_type = excluded.channel_type,
                    channel_id = excluded.channel_id,
                    session_id = excluded.session_id
                "#,
                params![
                    channel.node.clone(),
                    channel.pid,
                    channel.created.to_rfc3339(),
                    channel.client_ip.clone(),
                    channel.client_port as i64,
                    channel.connection_id as i64,
                    channel.channel_type.clone(),
                    channel.channel_id as i64,
                    channel.session_id.clone()
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn remove_proxy_channel(&self, node: &str, pid: i64) -> Result<(), DbError> {
        let connection = self.client.connection()?;
        connection
            .execute(
                "DELETE FROM proxychannels WHERE node = ?1 AND pid = ?2",
                params![node, pid],
            )
            .await?;
        Ok(())
    }

    pub async fn get_node_channels(&self, node: &str) -> Result<Vec<ProxyChannel>, DbError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT node, pid, client_ip, client_port, connection_id, channel_type,
                        channel_id, session_id, created
                 FROM proxychannels WHERE node = ?1",
                params![node],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_channel(&row)?);
        }
        Ok(out)
    }

    /// A node's maintenance tick calls this at startup to drop any channel
    /// rows left behind by a crash of a previous run on the same node name.
    #[instrument(skip(self))]
    pub async fn remove_node_channels(&self, node: &str) -> Result<u64, DbError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute("DELETE FROM proxychannels WHERE node = ?1", params![node])
            .await?;
        Ok(affected)
    }

    /// Distinct `session_id`s with at least one live channel — used to decide
    /// which tokens `reap_expired_tokens` must spare.
    pub async fn get_sessions(&self) -> Result<Vec<String>, DbError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT DISTINCT session_id FROM proxychannels WHERE session_id IS NOT NULL",
                (),
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?);
        }
        Ok(out)
    }
}

fn row_to_channel(row: &libsql::Row) -> Result<ProxyChannel, DbError> {
    let client_port: i64 = row.get(3).map_err(|e| DbError::MappingError(e.to_string()))?;
    let connection_id: i64 = row.get(4).map_err(|e| DbError::MappingError(e.to_string()))?;
    let channel_id: i64 = row.get(6).map_err(|e| DbError::MappingError(e.to_string()))?;
    let created: String = row.get(8).map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(ProxyChannel {
        node: row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        pid: row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        client_ip: row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?,
        client_port: client_port as u16,
        connection_id: connection_id as u32,
        channel_type: row.get(5).map_err(|e| DbError::MappingError(e.to_string()))?,
        channel_id: channel_id as u8,
        session_id: row.get(7).map_err(|e| DbError::MappingError(e.to_string()))?,
        created: DateTime::parse_from_rfc3339(&created)
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .with_timezone(&Utc),
    })
}
