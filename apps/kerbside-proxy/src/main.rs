// [apps/kerbside-proxy/src/main.rs]
/*!
 * =================================================================
 * APARATO: PUNTO DE ENTRADA DEL PROXY (ESTRATO L1-APP)
 * RESPONSABILIDAD: CARGA DE CONFIGURACIÓN E IGNICIÓN DEL KERNEL
 * =================================================================
 */

use clap::Parser;
use dotenvy::dotenv;
use kerbside_proxy::prelude::*;
use kerbside_shared_config::KerbsideConfig;
use kerbside_shared_telemetry::init_tracing;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("kerbside_proxy");

    let config = KerbsideConfig::parse();
    if let Err(e) = config.validate_required_files() {
        error!(error = %e, "configuration rejected at startup");
        std::process::exit(1);
    }

    let ca_cert_pem = match &config.cacert_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(pem) => Some(pem),
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to read CA certificate");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        info!(node = %config.node_name, "kerbside-proxy igniting");
        let kernel = ProxyKernel::ignite(config, ca_cert_pem).await;
        kernel.launch().await;
    });

    Ok(())
}
