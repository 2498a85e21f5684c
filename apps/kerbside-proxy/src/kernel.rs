// [apps/kerbside-proxy/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: NÚCLEO DE IGNICIÓN DEL PROXY (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP, DOBLE ACEPTACIÓN Y COMPOSICIÓN DE RAÍZ
 *
 * El bind dual (puerto inseguro para la redirección y puerto seguro
 * para el enlace real) corre sobre dos `TcpListener`s independientes
 * en la misma tarea de aceptación, cada uno con `SO_REUSEADDR` para
 * que un reinicio del proceso no choque contra un socket en TIME_WAIT
 * dejado por el anterior.
 * =================================================================
 */

use crate::metrics::{MetricEvent, ProxyMetrics};
use crate::routes;
use crate::services::spawn_reaper;
use crate::state::AppState;
use crate::worker;
use crate::worker::stream::ClientStream;
use kerbside_infra_db::repositories::ChannelRepository;
use kerbside_infra_db::DbClient;
use kerbside_shared_config::KerbsideConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio_rustls::TlsAcceptor;
use tracing::{error, info, instrument, warn};

pub struct ProxyKernel {
    config: Arc<KerbsideConfig>,
    state: AppState,
    metrics: Arc<ProxyMetrics>,
    metrics_rx: tokio::sync::mpsc::UnboundedReceiver<MetricEvent>,
}

impl ProxyKernel {
    /// Opens the node's own database connection, clears whatever
    /// `proxychannels` rows a crashed previous run on this node name left
    /// behind, and wires the metrics channel before any socket is bound.
    #[instrument(skip(config, ca_cert_pem))]
    pub async fn ignite(config: KerbsideConfig, ca_cert_pem: Option<String>) -> Self {
        let config = Arc::new(config);

        let db = DbClient::connect(&config.sql_url, config.sql_access_token.clone())
            .await
            .expect("FATAL: could not open the startup database connection");
        let channel_repo = ChannelRepository::new(db);
        match channel_repo.remove_node_channels(&config.node_name).await {
            Ok(removed) if removed > 0 => {
                warn!(removed, node = %config.node_name, "cleared stale channel rows from a previous run on this node");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "failed to clear stale channel rows at startup"),
        }

        let metrics = Arc::new(ProxyMetrics::new().expect("FATAL: could not register Prometheus collectors"));
        let (metrics_tx, metrics_rx) = tokio::sync::mpsc::unbounded_channel();
        let state = AppState::new(config.clone(), ca_cert_pem, metrics_tx);

        Self {
            config,
            state,
            metrics,
            metrics_rx,
        }
    }

    pub async fn launch(self) {
        let Self {
            config,
            state,
            metrics,
            metrics_rx,
        } = self;

        spawn_reaper(state.clone(), metrics.clone(), metrics_rx);

        let tls_acceptor = build_tls_acceptor(&config).expect("FATAL: could not build server TLS configuration");

        let insecure = bind_reusable(&config.vdi_address, config.vdi_insecure_port)
            .await
            .expect("FATAL: could not bind the insecure VDI port");
        let secure = bind_reusable(&config.vdi_address, config.vdi_secure_port)
            .await
            .expect("FATAL: could not bind the secure VDI port");

        info!(
            insecure = %insecure.local_addr().unwrap(),
            secure = %secure.local_addr().unwrap(),
            "VDI listeners bound"
        );

        let accept_state = state.clone();
        let accept_acceptor = tls_acceptor.clone();
        tokio::spawn(async move {
            accept_loop(insecure, false, None, accept_state).await;
        });
        let accept_state = state.clone();
        tokio::spawn(async move {
            accept_loop(secure, true, Some(accept_acceptor), accept_state).await;
        });

        let router = routes::build_router(metrics);
        let admin_listener = TcpListener::bind((config.vdi_address.as_str(), config.prometheus_metrics_port)).await;

        match admin_listener {
            Ok(listener) => {
                info!(addr = %listener.local_addr().unwrap(), "metrics/healthz listener bound");
                if let Err(e) = axum::serve(listener, router).await {
                    error!(error = %e, "metrics HTTP server exited");
                }
            }
            Err(e) => error!(error = %e, "could not bind the metrics/healthz listener, observability surface disabled"),
        }
    }
}

async fn bind_reusable(address: &str, port: u16) -> std::io::Result<TcpListener> {
    let addr: SocketAddr = format!("{address}:{port}").parse().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("bad listen address {address}:{port}: {e}"))
    })?;
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(1024)
}

fn build_tls_acceptor(config: &KerbsideConfig) -> anyhow::Result<TlsAcceptor> {
    let cert_pem = std::fs::read(&config.proxy_host_cert_path)?;
    let key_pem = std::fs::read(&config.proxy_host_cert_key_path)?;

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut Cursor::new(cert_pem))
        .collect::<Result<_, _>>()
        .map_err(|e| anyhow::anyhow!("invalid server certificate PEM: {e}"))?;
    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut Cursor::new(key_pem))?
        .ok_or_else(|| anyhow::anyhow!("no private key found in {:?}", config.proxy_host_cert_key_path))?;

    let server_config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

#[instrument(skip(listener, tls_acceptor, state), fields(secure = is_secure))]
async fn accept_loop(listener: TcpListener, is_secure: bool, tls_acceptor: Option<TlsAcceptor>, state: AppState) {
    loop {
        let (tcp, client_addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "accept() failed, retrying");
                continue;
            }
        };

        let state = state.clone();
        let tls_acceptor = tls_acceptor.clone();
        tokio::spawn(async move {
            let stream = match upgrade(tcp, is_secure, tls_acceptor).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, %client_addr, "TLS handshake failed, dropping connection");
                    return;
                }
            };

            let pid = state.next_pid();
            let handle_state = state.clone();
            let handle = tokio::spawn(async move {
                if let Err(e) = worker::handle_connection(stream, is_secure, client_addr, handle_state, pid).await {
                    if e.is_ordinary_termination() {
                        info!(pid, %client_addr, "{e}");
                    } else {
                        warn!(pid, %client_addr, error = %e, "worker task ended with a fault");
                    }
                }
            });
            state.register_task(pid, handle);
        });
    }
}

async fn upgrade(tcp: TcpStream, is_secure: bool, tls_acceptor: Option<TlsAcceptor>) -> anyhow::Result<ClientStream> {
    if !is_secure {
        return Ok(ClientStream::Plain(tcp));
    }
    let acceptor = tls_acceptor.expect("secure listener always carries a TLS acceptor");
    let tls = acceptor.accept(tcp).await?;
    Ok(ClientStream::Tls(Box::new(tls)))
}
