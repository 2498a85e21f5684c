// [libs/infra/db/src/schema.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN DATABASE SCHEMA (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Cinco tablas: `sources`, `consoles`, `consoletokens`, `proxychannels`,
 * `auditevents`. Las claves foráneas usan `ON UPDATE CASCADE, ON DELETE
 * CASCADE` siguiendo la cadena `consoles.source -> sources.name`,
 * `consoletokens.uuid -> consoles.uuid`,
 * `proxychannels.session_id -> consoletokens.session_id`.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument};

const TABLES: &[(&str, &str)] = &[
    (
        "TABLE_SOURCES",
        r#"
        CREATE TABLE IF NOT EXISTS sources (
            name TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            connection_url TEXT NOT NULL,
            credentials TEXT NOT NULL,
            ca_cert TEXT,
            errored INTEGER NOT NULL DEFAULT 0,
            deleted INTEGER NOT NULL DEFAULT 0,
            last_seen DATETIME,
            seen_by TEXT
        );
    "#,
    ),
    (
        "TABLE_CONSOLES",
        r#"
        CREATE TABLE IF NOT EXISTS consoles (
            uuid TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            hypervisor_hostname TEXT,
            hypervisor_ip TEXT,
            insecure_port INTEGER NOT NULL,
            secure_port INTEGER,
            name TEXT,
            host_subject TEXT,
            ticket TEXT,
            discovered DATETIME NOT NULL,
            FOREIGN KEY(source) REFERENCES sources(name)
                ON UPDATE CASCADE ON DELETE CASCADE
        );
    "#,
    ),
    (
        "TABLE_CONSOLETOKENS",
        r#"
        CREATE TABLE IF NOT EXISTS consoletokens (
            token TEXT PRIMARY KEY,
            session_id TEXT NOT NULL UNIQUE,
            source TEXT NOT NULL,
            uuid TEXT NOT NULL,
            created INTEGER NOT NULL,
            expires INTEGER NOT NULL,
            FOREIGN KEY(uuid) REFERENCES consoles(uuid)
                ON UPDATE CASCADE ON DELETE CASCADE
        );
    "#,
    ),
    (
        "TABLE_PROXYCHANNELS",
        r#"
        CREATE TABLE IF NOT EXISTS proxychannels (
            node TEXT NOT NULL,
            pid INTEGER NOT NULL,
            created DATETIME NOT NULL,
            client_ip TEXT,
            client_port INTEGER,
            connection_id INTEGER,
            channel_type TEXT,
            channel_id INTEGER,
            session_id TEXT,
            PRIMARY KEY(node, pid),
            FOREIGN KEY(session_id) REFERENCES consoletokens(session_id)
                ON UPDATE CASCADE ON DELETE CASCADE
        );
    "#,
    ),
    (
        "TABLE_AUDITEVENTS",
        r#"
        CREATE TABLE IF NOT EXISTS auditevents (
            source TEXT NOT NULL,
            uuid TEXT NOT NULL,
            timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            session_id TEXT,
            channel TEXT,
            node TEXT,
            pid INTEGER,
            message TEXT NOT NULL,
            PRIMARY KEY(source, uuid, timestamp)
        );
    "#,
    ),
];

const INDEXES: &[(&str, &str)] = &[
    (
        "IDX_CONSOLES_SOURCE",
        "CREATE INDEX IF NOT EXISTS idx_consoles_source ON consoles(source);",
    ),
    (
        "IDX_CONSOLETOKENS_UUID",
        "CREATE INDEX IF NOT EXISTS idx_consoletokens_uuid ON consoletokens(source, uuid);",
    ),
    (
        "IDX_CONSOLETOKENS_EXPIRES",
        "CREATE INDEX IF NOT EXISTS idx_consoletokens_expires ON consoletokens(expires);",
    ),
    (
        "IDX_PROXYCHANNELS_NODE",
        "CREATE INDEX IF NOT EXISTS idx_proxychannels_node ON proxychannels(node);",
    ),
    (
        "IDX_AUDITEVENTS_LOOKUP",
        "CREATE INDEX IF NOT EXISTS idx_auditevents_lookup ON auditevents(source, uuid, timestamp DESC);",
    ),
];

#[instrument(skip(connection))]
pub async fn apply_schema(connection: &Connection) -> Result<()> {
    info!("synchronizing console token/audit store schema");

    connection
        .execute("PRAGMA foreign_keys = ON;", ())
        .await
        .context("enabling foreign key enforcement")?;

    for (identifier, sql) in TABLES {
        debug!(identifier, "applying table definition");
        connection
            .execute(sql, ())
            .await
            .with_context(|| format!("failed to create table: {identifier}"))?;
    }

    for (identifier, sql) in INDEXES {
        debug!(identifier, "applying index definition");
        connection
            .execute(sql, ())
            .await
            .with_context(|| format!("failed to create index: {identifier}"))?;
    }

    info!("schema synchronized");
    Ok(())
}
