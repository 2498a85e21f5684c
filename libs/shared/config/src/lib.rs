// [libs/shared/config/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DIRECTIVAS DE CONFIGURACIÓN SOBERANA (ESTRATO L4)
 * RESPONSABILIDAD: CARGA DE VARIABLES DE ENTORNO `KERBSIDE_*`
 *
 * Un único struct cubre el superconjunto de variables que el
 * despliegue completo usa (proxy + API administrativa out-of-scope),
 * porque ambos binarios comparten el mismo `.env`. El binario del
 * proxy solo lee los campos que le conciernen.
 * =================================================================
 */

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug, Clone)]
#[command(
    author = "Raz Podesta <metaShark Tech>",
    version,
    about = "Kerbside: tenant-facing SPICE proxy for multi-tenant virtualization platforms"
)]
pub struct KerbsideConfig {
    // --- Identity & node ---
    #[arg(long, env = "KERBSIDE_NODE_NAME")]
    pub node_name: String,

    #[arg(long, env = "KERBSIDE_PUBLIC_FQDN")]
    pub public_fqdn: Option<String>,

    #[arg(long, env = "KERBSIDE_PID_FILE_LOCATION")]
    pub pid_file_location: Option<PathBuf>,

    // --- VDI listener (core to this crate) ---
    #[arg(long, env = "KERBSIDE_VDI_ADDRESS", default_value = "0.0.0.0")]
    pub vdi_address: String,

    #[arg(long, env = "KERBSIDE_VDI_SECURE_PORT", default_value_t = 5900)]
    pub vdi_secure_port: u16,

    #[arg(long, env = "KERBSIDE_VDI_INSECURE_PORT", default_value_t = 5901)]
    pub vdi_insecure_port: u16,

    // --- TLS material for the client-facing secure socket ---
    #[arg(long, env = "KERBSIDE_PROXY_HOST_CERT_PATH")]
    pub proxy_host_cert_path: PathBuf,

    #[arg(long, env = "KERBSIDE_PROXY_HOST_CERT_KEY_PATH")]
    pub proxy_host_cert_key_path: PathBuf,

    // --- TLS trust for the server-facing hypervisor connection ---
    #[arg(long, env = "KERBSIDE_CACERT_PATH")]
    pub cacert_path: Option<PathBuf>,

    #[arg(long, env = "KERBSIDE_PROXY_HOST_SUBJECT")]
    pub proxy_host_subject: Option<String>,

    // --- Persistence ---
    #[arg(long, env = "KERBSIDE_SQL_URL")]
    pub sql_url: String,

    #[arg(long, env = "KERBSIDE_SQL_ACCESS_TOKEN")]
    pub sql_access_token: Option<String>,

    #[arg(long, env = "KERBSIDE_SOURCES_PATH")]
    pub sources_path: Option<PathBuf>,

    // --- Token lifetime ---
    #[arg(long, env = "KERBSIDE_CONSOLE_TOKEN_DURATION", default_value_t = 1)]
    pub console_token_duration_minutes: i64,

    // --- Traffic inspection surface ---
    #[arg(long, env = "KERBSIDE_TRAFFIC_INSPECTION", default_value_t = false)]
    pub traffic_inspection: bool,

    #[arg(long, env = "KERBSIDE_TRAFFIC_INSPECTION_INTIMATE", default_value_t = false)]
    pub traffic_inspection_intimate: bool,

    #[arg(long, env = "KERBSIDE_TRAFFIC_OUTPUT_PATH")]
    pub traffic_output_path: Option<PathBuf>,

    // --- Observability ---
    #[arg(long, env = "KERBSIDE_LOG_OUTPUT_PATH")]
    pub log_output_path: Option<PathBuf>,

    #[arg(long, env = "KERBSIDE_LOG_OUTPUT_JSON", default_value_t = false)]
    pub log_output_json: bool,

    #[arg(long, env = "KERBSIDE_LOG_VERBOSE", default_value_t = false)]
    pub log_verbose: bool,

    #[arg(long, env = "KERBSIDE_PROMETHEUS_METRICS_PORT", default_value_t = 13003)]
    pub prometheus_metrics_port: u16,

    // --- Out-of-scope admin API surface, parsed here only because the
    // binary shares one `.env` file with that (unimplemented) surface. ---
    #[arg(long, env = "KERBSIDE_AUTH_SECRET_SEED")]
    pub auth_secret_seed: Option<String>,

    #[arg(long, env = "KERBSIDE_API_TOKEN_DURATION", default_value_t = 60)]
    pub api_token_duration_minutes: i64,

    #[arg(long, env = "KERBSIDE_API_ADDRESS")]
    pub api_address: Option<String>,

    #[arg(long, env = "KERBSIDE_API_PORT")]
    pub api_port: Option<u16>,

    #[arg(long, env = "KERBSIDE_API_TIMEOUT")]
    pub api_timeout_seconds: Option<u64>,

    #[arg(long, env = "KERBSIDE_KEYSTONE_AUTH_URL")]
    pub keystone_auth_url: Option<String>,

    #[arg(long, env = "KERBSIDE_KEYSTONE_USER")]
    pub keystone_user: Option<String>,

    #[arg(long, env = "KERBSIDE_KEYSTONE_PASSWORD")]
    pub keystone_password: Option<String>,

    #[arg(long, env = "KERBSIDE_KEYSTONE_DOMAINS")]
    pub keystone_domains: Option<String>,

    #[arg(long, env = "KERBSIDE_KEYSTONE_PROJECT")]
    pub keystone_project: Option<String>,

    #[arg(long, env = "KERBSIDE_KEYSTONE_ACCESS_GROUP")]
    pub keystone_access_group: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("[CONFIG_MISSING_FILE] required file not found: {0}")]
    MissingFile(PathBuf),
}

impl KerbsideConfig {
    /// Validates that every path this crate's binary dereferences at
    /// startup actually exists, surfacing `MissingFile` (a fatal,
    /// startup-aborting condition) rather than failing lazily mid-accept-loop.
    pub fn validate_required_files(&self) -> Result<(), ConfigError> {
        for path in [
            Some(&self.proxy_host_cert_path),
            Some(&self.proxy_host_cert_key_path),
        ]
        .into_iter()
        .flatten()
        .chain(self.cacert_path.iter())
        {
            if !path.exists() {
                return Err(ConfigError::MissingFile(path.clone()));
            }
        }
        Ok(())
    }

    pub fn console_token_duration_seconds(&self) -> i64 {
        self.console_token_duration_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_required_arguments() {
        let config = KerbsideConfig::parse_from([
            "kerbside-proxy",
            "--node-name",
            "node-a",
            "--proxy-host-cert-path",
            "/tmp/does-not-matter.pem",
            "--proxy-host-cert-key-path",
            "/tmp/does-not-matter.key",
            "--sql-url",
            "file:kerbside.db",
        ]);

        assert_eq!(config.vdi_secure_port, 5900);
        assert_eq!(config.vdi_insecure_port, 5901);
        assert_eq!(config.prometheus_metrics_port, 13003);
        assert_eq!(config.console_token_duration_minutes, 1);
        assert!(!config.traffic_inspection);
    }

    #[test]
    fn console_token_duration_converts_minutes_to_seconds() {
        let config = KerbsideConfig::parse_from([
            "kerbside-proxy",
            "--node-name",
            "node-a",
            "--proxy-host-cert-path",
            "/tmp/a.pem",
            "--proxy-host-cert-key-path",
            "/tmp/a.key",
            "--sql-url",
            "file:kerbside.db",
            "--console-token-duration",
            "5",
        ]);
        assert_eq!(config.console_token_duration_seconds(), 300);
    }

    #[test]
    fn validate_required_files_rejects_missing_cert() {
        let config = KerbsideConfig::parse_from([
            "kerbside-proxy",
            "--node-name",
            "node-a",
            "--proxy-host-cert-path",
            "/definitely/not/a/real/path.pem",
            "--proxy-host-cert-key-path",
            "/definitely/not/a/real/path.key",
            "--sql-url",
            "file:kerbside.db",
        ]);
        assert!(matches!(
            config.validate_required_files(),
            Err(ConfigError::MissingFile(_))
        ));
    }
}
