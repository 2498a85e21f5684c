// [libs/infra/db/src/repositories/token_repository.rs]
/*!
 * =================================================================
 * APARATO: TOKEN REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: EMISIÓN Y CADUCIDAD DE TOKENS DE CONSOLA
 * =================================================================
 */

use crate::errors::DbError;
use crate::DbClient;
use kerbside_domain_model::ConsoleToken;
use libsql::params;
use tracing::{instrument, warn};

const ADD_TOKEN_ATTEMPTS: u32 = 5;

pub struct TokenRepository {
    client: DbClient,
}

impl TokenRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    /// Mints a fresh `(token, session_id)` pair and inserts it, retrying with
    /// fresh randomness on primary-key collision. Exhausting the attempt
    /// budget surfaces as `TokenFailure` rather than panicking — collisions
    /// are expected to be astronomically rare, not a hard bug.
    #[instrument(skip(self, source, uuid))]
    pub async fn add_token(&self, source: &str, uuid: &str, ttl_seconds: i64) -> Result<ConsoleToken, DbError> {
        let connection = self.client.connection()?;

        for attempt in 1..=ADD_TOKEN_ATTEMPTS {
            let token = ConsoleToken::random_token();
            let session_id = ConsoleToken::random_session_id();
            let created = chrono_now_timestamp();
            let expires = created + ttl_seconds;

            let result = connection
                .execute(
                    r#"
                    INSERT INTO consoletokens (token, session_id, source, uuid, created, expires)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![token.clone(), session_id.clone(), source, uuid, created, expires],
                )
                .await;

            match result {
                Ok(_) => {
                    return Ok(ConsoleToken {
                        token,
                        session_id,
                        source: source.to_string(),
                        uuid: uuid.to_string(),
                        created,
                        expires,
                    });
                }
                Err(libsql::Error::SqliteFailure(_, message)) if message.contains("UNIQUE constraint failed") => {
                    warn!(attempt, "token or session_id collision, retrying with fresh randomness");
                    continue;
                }
                Err(e) => return Err(DbError::QueryError(e)),
            }
        }

        Err(DbError::TokenFailure(ADD_TOKEN_ATTEMPTS))
    }

    pub async fn get_tokens_by_console(&self, source: &str, uuid: &str) -> Result<Vec<ConsoleToken>, DbError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT token, session_id, source, uuid, created, expires
                 FROM consoletokens WHERE source = ?1 AND uuid = ?2",
                params![source, uuid],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_token(&row)?);
        }
        Ok(out)
    }

    /// Only returns the token if it has not yet expired.
    pub async fn get_token_by_token(&self, token: &str) -> Result<Option<ConsoleToken>, DbError> {
        let connection = self.client.connection()?;
        let now = chrono_now_timestamp();
        let mut rows = connection
            .query(
                "SELECT token, session_id, source, uuid, created, expires
                 FROM consoletokens WHERE token = ?1 AND expires > ?2",
                params![token, now],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_token(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_token_by_session_id(&self, session_id: &str) -> Result<Option<ConsoleToken>, DbError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT token, session_id, source, uuid, created, expires
                 FROM consoletokens WHERE session_id = ?1",
                params![session_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_token(&row)?)),
            None => Ok(None),
        }
    }

    /// Forces a token's `expires` timestamp into the past, without touching
    /// whatever live `proxychannels` rows reference its `session_id` — the
    /// channels drain on their own and `reap_expired_tokens` later collects it.
    pub async fn expire_token(&self, token: &str) -> Result<(), DbError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE consoletokens SET expires = 0 WHERE token = ?1",
                params![token],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::MappingError(format!("no such token: {token}")));
        }
        Ok(())
    }

    pub async fn remove_session(&self, session_id: &str) -> Result<(), DbError> {
        let connection = self.client.connection()?;
        connection
            .execute("DELETE FROM consoletokens WHERE session_id = ?1", params![session_id])
            .await?;
        Ok(())
    }

    /// Deletes tokens that are BOTH expired AND have zero live `proxychannels`
    /// rows against their `session_id`. A token with an open channel survives
    /// even past expiry — the channel, not the clock, is the source of truth
    /// for whether a session is still in use.
    #[instrument(skip(self))]
    pub async fn reap_expired_tokens(&self) -> Result<u64, DbError> {
        let connection = self.client.connection()?;
        let now = chrono_now_timestamp();

        let affected = connection
            .execute(
                r#"
                DELETE FROM consoletokens
                WHERE expires <= ?1
                  AND session_id NOT IN (SELECT session_id FROM proxychannels WHERE session_id IS NOT NULL)
                "#,
                params![now],
            )
            .await?;

        Ok(affected)
    }
}

fn row_to_token(row: &libsql::Row) -> Result<ConsoleToken, DbError> {
    Ok(ConsoleToken {
        token: row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        session_id: row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        source: row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?,
        uuid: row.get(3).map_err(|e| DbError::MappingError(e.to_string()))?,
        created: row.get(4).map_err(|e| DbError::MappingError(e.to_string()))?,
        expires: row.get(5).map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}

fn chrono_now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_token_attempt_budget_is_five() {
        assert_eq!(ADD_TOKEN_ATTEMPTS, 5);
    }
}
