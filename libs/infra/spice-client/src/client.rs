// [libs/infra/spice-client/src/client.rs]
/*!
 * =================================================================
 * APARATO: HYPERVISOR UPLINK (ESTRATO L3)
 * RESPONSABILIDAD: EL PROXY ACTUANDO COMO CLIENTE SPICE FRENTE AL
 * HIPERVISOR — NEGOCIACIÓN DE ENLACE, ASCENSO TLS OPCIONAL Y AUTH
 * =================================================================
 *
 * Reproduce la secuencia de `SpiceClient.connect()` del proxy original:
 * intenta siempre el puerto inseguro primero; si el hipervisor exige
 * un canal asegurado (`need_secured`), reintenta exactamente una vez
 * por `secure_port` bajo TLS. Cada paso del handshake — conexión TCP,
 * intercambio de enlace, envío del ticket re-cifrado — corre bajo un
 * plazo fijo para que un hipervisor mudo no cuelgue el worker que lo
 * atiende.
 */

use crate::errors::HypervisorLinkError;
use crate::stream::HypervisorStream;
use crate::subject;
use crate::verifier::AcceptAnyChainVerifier;
use byteorder::{ByteOrder, LittleEndian};
use kerbside_infra_wire::auth::{encrypt_ticket, parse_public_key_der};
use kerbside_infra_wire::constants::error_code;
use kerbside_infra_wire::link::{SpiceLinkMess, SpiceLinkReply};
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument, warn};

/// One hypervisor's connection coordinates, as carried on a `Console`.
#[derive(Debug, Clone)]
pub struct HypervisorEndpoint {
    pub host: String,
    pub insecure_port: u16,
    pub secure_port: Option<u16>,
    pub ca_cert_pem: Option<String>,
    pub host_subject: Option<String>,
}

/// A live, post-handshake connection to a hypervisor's SPICE channel,
/// ready to be handed to the forwarding loop.
pub struct HypervisorLink {
    pub stream: HypervisorStream,
    pub used_tls: bool,
}

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const AUTH_MECHANISM_SPICE: u32 = 1;

/// Negotiate a channel against a hypervisor: link exchange, an optional
/// TLS retry on `need_secured`, and ticket authentication.
#[instrument(skip(endpoint, client_common_caps, client_channel_caps, ticket), fields(host = %endpoint.host))]
pub async fn connect(
    endpoint: &HypervisorEndpoint,
    connection_id: u32,
    channel_type: u8,
    channel_id: u8,
    client_common_caps: &[u32],
    client_channel_caps: &[u32],
    ticket: &str,
) -> Result<HypervisorLink, HypervisorLinkError> {
    let link_mess = SpiceLinkMess {
        connection_id,
        channel_type,
        channel_id,
        common_caps: client_common_caps.to_vec(),
        channel_caps: client_channel_caps.to_vec(),
    };

    match connect_attempt(endpoint, &link_mess, ticket, false).await {
        Ok(link) => Ok(link),
        Err(HypervisorLinkError::LinkRejected(code)) if code == error_code::NEED_SECURED => {
            debug!("hypervisor demanded a secured channel, retrying over TLS");
            connect_attempt(endpoint, &link_mess, ticket, true).await
        }
        Err(e) => Err(e),
    }
}

async fn connect_attempt(
    endpoint: &HypervisorEndpoint,
    link_mess: &SpiceLinkMess,
    ticket: &str,
    force_secure: bool,
) -> Result<HypervisorLink, HypervisorLinkError> {
    let mut stream = if force_secure {
        let secure_port = endpoint.secure_port.ok_or(HypervisorLinkError::NoTlsPort)?;
        wrap_tls(endpoint, secure_port).await?
    } else {
        let tcp = timeout(TcpStream::connect((endpoint.host.as_str(), endpoint.insecure_port))).await?;
        HypervisorStream::Plain(tcp)
    };

    timeout(stream.write_all(&link_mess.encode())).await?;
    timeout(stream.flush()).await?;

    let reply = read_link_reply(&mut stream).await?;
    if reply.error_code != error_code::OK {
        return Err(HypervisorLinkError::LinkRejected(reply.error_code));
    }

    let public_key = parse_public_key_der(&reply.public_key_der)?;
    let ciphertext = encrypt_ticket(&public_key, ticket)?;

    let mut auth_packet = Vec::with_capacity(4 + ciphertext.len());
    let mut mechanism = [0u8; 4];
    LittleEndian::write_u32(&mut mechanism, AUTH_MECHANISM_SPICE);
    auth_packet.extend_from_slice(&mechanism);
    auth_packet.extend_from_slice(&ciphertext);
    timeout(stream.write_all(&auth_packet)).await?;
    timeout(stream.flush()).await?;

    let mut auth_result_bytes = [0u8; 4];
    timeout(stream.read_exact(&mut auth_result_bytes)).await?;
    let auth_result = LittleEndian::read_u32(&auth_result_bytes);
    if auth_result != error_code::OK {
        return Err(HypervisorLinkError::AuthRejected(auth_result));
    }

    Ok(HypervisorLink {
        stream,
        used_tls: force_secure,
    })
}

async fn wrap_tls(endpoint: &HypervisorEndpoint, port: u16) -> Result<HypervisorStream, HypervisorLinkError> {
    let tcp = timeout(TcpStream::connect((endpoint.host.as_str(), port))).await?;

    let config = build_tls_config(endpoint.ca_cert_pem.as_deref())?;
    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(endpoint.host.clone())
        .unwrap_or_else(|_| ServerName::try_from("localhost".to_string()).expect("static DNS name is valid"));

    let tls = timeout(connector.connect(server_name, tcp)).await.map_err(|e| match e {
        HypervisorLinkError::Io(io) => HypervisorLinkError::Tls(io.to_string()),
        other => other,
    })?;

    let stream = HypervisorStream::Tls(Box::new(tls));

    if let Some(der) = stream.peer_certificate_der() {
        subject::enforce_host_subject(&der, endpoint.host_subject.as_deref())?;
    } else if endpoint.host_subject.is_some() {
        return Err(HypervisorLinkError::Tls(
            "TLS handshake completed without a peer certificate".to_string(),
        ));
    }

    Ok(stream)
}

/// When the source carries a CA certificate, validate the chain against it
/// through rustls' standard root-store verifier. Without one, hypervisor
/// certificates are near-never issued against their management hostname,
/// so chain validation is skipped and [`subject::enforce_host_subject`]
/// alone gates trust, matching the original proxy's manual subject check.
fn build_tls_config(ca_cert_pem: Option<&str>) -> Result<ClientConfig, HypervisorLinkError> {
    let builder = ClientConfig::builder();

    let config = match ca_cert_pem {
        Some(pem) => {
            let mut root_store = RootCertStore::empty();
            let mut reader = Cursor::new(pem.as_bytes());
            for cert in rustls_pemfile::certs(&mut reader) {
                let cert: CertificateDer<'static> =
                    cert.map_err(|e| HypervisorLinkError::Tls(format!("invalid CA certificate PEM: {e}")))?;
                root_store
                    .add(cert)
                    .map_err(|e| HypervisorLinkError::Tls(format!("failed to install CA certificate: {e}")))?;
            }
            builder.with_root_certificates(root_store).with_no_client_auth()
        }
        None => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyChainVerifier::new()))
            .with_no_client_auth(),
    };

    Ok(config)
}

async fn read_link_reply(stream: &mut HypervisorStream) -> Result<SpiceLinkReply, HypervisorLinkError> {
    let mut buffered = Vec::new();
    let mut chunk = [0u8; 512];

    loop {
        if let Some((reply, _consumed)) = SpiceLinkReply::try_parse(&buffered)? {
            return Ok(reply);
        }

        let read = timeout(stream.read(&mut chunk)).await?;
        if read == 0 {
            return Err(HypervisorLinkError::ConnectionClosed);
        }
        buffered.extend_from_slice(&chunk[..read]);
    }
}

async fn timeout<F, T>(future: F) -> Result<T, HypervisorLinkError>
where
    F: std::future::Future<Output = std::io::Result<T>>,
{
    match tokio::time::timeout(HANDSHAKE_TIMEOUT, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(HypervisorLinkError::Io(e)),
        Err(_) => Err(HypervisorLinkError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kerbside_infra_wire::constants::common_caps;
    use tokio::io::AsyncWriteExt as _;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn insecure_link_authenticates_against_loopback_hypervisor() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let keypair = kerbside_infra_wire::auth::LinkKeypair::generate().expect("keygen");
        let public_der = *keypair.public_key_der();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");

            let mut buffered = Vec::new();
            let mut chunk = [0u8; 512];
            let link_mess = loop {
                if let Some((mess, _)) = SpiceLinkMess::try_parse(&buffered).expect("parse link mess") {
                    break mess;
                }
                let n = socket.read(&mut chunk).await.expect("read");
                buffered.extend_from_slice(&chunk[..n]);
            };
            assert_eq!(link_mess.channel_type, 1);

            let reply = SpiceLinkReply {
                error_code: error_code::OK,
                public_key_der: public_der,
                common_caps: vec![common_caps::DEFAULT],
                channel_caps: vec![],
            };
            socket.write_all(&reply.encode()).await.expect("write reply");

            let mut auth_packet = [0u8; 4 + 128];
            socket.read_exact(&mut auth_packet).await.expect("read auth");
            let mechanism = LittleEndian::read_u32(&auth_packet[0..4]);
            assert_eq!(mechanism, AUTH_MECHANISM_SPICE);
            let ticket = keypair.decrypt_ticket(&auth_packet[4..]).expect("decrypt ticket");
            assert_eq!(ticket, "s3cr3t");

            let mut ok = [0u8; 4];
            LittleEndian::write_u32(&mut ok, error_code::OK);
            socket.write_all(&ok).await.expect("write auth result");
        });

        let endpoint = HypervisorEndpoint {
            host: "127.0.0.1".to_string(),
            insecure_port: addr.port(),
            secure_port: None,
            ca_cert_pem: None,
            host_subject: None,
        };

        let link = connect(&endpoint, 0, 2, 0, &[common_caps::DEFAULT], &[], "s3cr3t")
            .await
            .expect("connect should succeed");
        assert!(!link.used_tls);

        server.await.expect("server task");
    }

    #[tokio::test]
    async fn link_rejected_surfaces_error_code() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buffered = Vec::new();
            let mut chunk = [0u8; 512];
            loop {
                if SpiceLinkMess::try_parse(&buffered).expect("parse").is_some() {
                    break;
                }
                let n = socket.read(&mut chunk).await.expect("read");
                buffered.extend_from_slice(&chunk[..n]);
            }
            let reply = SpiceLinkReply::error(error_code::PERMISSION_DENIED);
            socket.write_all(&reply.encode()).await.expect("write reply");
        });

        let endpoint = HypervisorEndpoint {
            host: "127.0.0.1".to_string(),
            insecure_port: addr.port(),
            secure_port: None,
            ca_cert_pem: None,
            host_subject: None,
        };

        let result = connect(&endpoint, 0, 2, 0, &[], &[], "s3cr3t").await;
        assert!(matches!(
            result,
            Err(HypervisorLinkError::LinkRejected(code)) if code == error_code::PERMISSION_DENIED
        ));

        server.await.expect("server task");
    }
}
