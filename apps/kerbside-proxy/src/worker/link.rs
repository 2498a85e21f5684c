// [apps/kerbside-proxy/src/worker/link.rs]
/*!
 * =================================================================
 * APARATO: ENLACE Y AUTENTICACIÓN DEL LADO CLIENTE (ESTRATO L1-APP)
 * RESPONSABILIDAD: HANDSHAKE SPICE, RESOLUCIÓN DE TOKEN Y MARCADO DE CANAL
 *
 * El socket del puerto inseguro nunca llega más allá de un primer
 * `SpiceLinkMess`: se le responde `need_secured` y se cierra. Todo lo
 * demás — intercambio de claves, desencriptado del ticket, resolución
 * contra la base de datos y el enlace saliente al hipervisor — ocurre
 * exclusivamente sobre el socket asegurado.
 * =================================================================
 */

use crate::state::AppState;
use crate::worker::errors::WorkerError;
use crate::worker::stream::ClientStream;
use byteorder::{ByteOrder, LittleEndian};
use kerbside_domain_model::{AuditEvent, ProxyChannel};
use kerbside_infra_db::repositories::{AuditRepository, ChannelRepository, ConsoleRepository, TokenRepository};
use kerbside_infra_db::DbClient;
use kerbside_infra_spice_client::client::{connect as connect_hypervisor, HypervisorEndpoint, HypervisorLink};
use kerbside_infra_wire::auth::LinkKeypair;
use kerbside_infra_wire::constants::{channel, common_caps, error_code, main_caps};
use kerbside_infra_wire::link::{SpiceLinkMess, SpiceLinkReply};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, instrument, warn};

const AUTH_MECHANISM_SPICE: u32 = 1;
const AUTH_PACKET_LEN: usize = 4 + kerbside_infra_wire::auth::TICKET_CIPHERTEXT_LEN;

/// What survives the link handshake: the live hypervisor connection and
/// the identifiers the session runtime and maintenance tick need.
pub struct LinkedChannel {
    pub hypervisor: HypervisorLink,
    pub channel_type: u8,
    pub session_id: String,
}

/// Accumulates bytes off `stream` until `parse` yields a complete frame.
async fn read_frame<T, F>(stream: &mut ClientStream, buf: &mut Vec<u8>, parse: F) -> Result<T, WorkerError>
where
    F: Fn(&[u8]) -> Result<Option<(T, usize)>, kerbside_infra_wire::error::WireError>,
{
    let mut chunk = [0u8; 4096];
    loop {
        if let Some((value, consumed)) = parse(buf)? {
            buf.drain(0..consumed);
            return Ok(value);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(WorkerError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "client closed before completing the link frame",
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Runs the client-facing link + auth handshake. On success, hands back
/// the live hypervisor connection ready for the forwarding loop; the
/// caller is responsible for deleting the `proxychannels` row it wrote
/// if anything downstream of a successful return later fails.
#[instrument(skip(stream, state), fields(%client_addr, secure = is_secure_port))]
pub async fn negotiate(
    mut stream: ClientStream,
    is_secure_port: bool,
    client_addr: SocketAddr,
    state: &AppState,
    pid: i64,
) -> Result<(ClientStream, LinkedChannel), WorkerError> {
    let mut inbound = Vec::new();
    let link_mess: SpiceLinkMess = read_frame(&mut stream, &mut inbound, SpiceLinkMess::try_parse).await?;

    if !is_secure_port {
        let reply = SpiceLinkReply::error(error_code::NEED_SECURED);
        stream.write_all(&reply.encode()).await?;
        stream.flush().await?;
        return Err(WorkerError::ConnectionRedirected);
    }

    let keypair = LinkKeypair::generate()?;
    let channel_caps = if link_mess.channel_type == channel::MAIN {
        vec![main_caps::DEFAULT]
    } else {
        Vec::new()
    };
    let reply = SpiceLinkReply {
        error_code: error_code::OK,
        public_key_der: *keypair.public_key_der(),
        common_caps: vec![common_caps::DEFAULT],
        channel_caps,
    };
    stream.write_all(&reply.encode()).await?;
    stream.flush().await?;

    let mut auth_packet = vec![0u8; AUTH_PACKET_LEN];
    stream.read_exact(&mut auth_packet).await?;
    let mechanism = LittleEndian::read_u32(&auth_packet[0..4]);
    if mechanism != AUTH_MECHANISM_SPICE {
        return Err(WorkerError::UnsupportedAuthMechanism(mechanism));
    }
    let client_token = keypair.decrypt_ticket(&auth_packet[4..])?;

    let db = DbClient::connect(&state.config.sql_url, state.config.sql_access_token.clone()).await?;
    let token_repo = TokenRepository::new(db.clone());
    let console_repo = ConsoleRepository::new(db.clone());
    let channel_repo = ChannelRepository::new(db.clone());
    let audit_repo = AuditRepository::new(db);

    let token_row = token_repo.get_token_by_token(&client_token).await?;
    let Some(token_row) = token_row else {
        send_auth_result(&mut stream, error_code::PERMISSION_DENIED).await?;
        return Err(WorkerError::ConnectionDeclined(error_code::PERMISSION_DENIED));
    };

    let console = console_repo.get_console(&token_row.uuid).await?;
    let Some(console) = console else {
        warn!(uuid = %token_row.uuid, "token referenced a console that no longer exists");
        send_auth_result(&mut stream, error_code::PERMISSION_DENIED).await?;
        return Err(WorkerError::ConnectionDeclined(error_code::PERMISSION_DENIED));
    };

    audit_repo
        .add_audit_event(&AuditEvent {
            source: console.source.clone(),
            uuid: console.uuid.clone(),
            timestamp: chrono::Utc::now(),
            session_id: Some(token_row.session_id.clone()),
            channel: Some(channel::name(link_mess.channel_type).to_string()),
            node: Some(state.config.node_name.clone()),
            pid: Some(pid),
            message: "Channel created".to_string(),
        })
        .await?;

    let proxy_channel = ProxyChannel {
        node: state.config.node_name.clone(),
        pid,
        client_ip: client_addr.ip().to_string(),
        client_port: client_addr.port(),
        connection_id: link_mess.connection_id,
        channel_type: channel::name(link_mess.channel_type).to_string(),
        channel_id: link_mess.channel_id,
        session_id: Some(token_row.session_id.clone()),
        created: chrono::Utc::now(),
    };
    channel_repo.record_channel_info(&proxy_channel).await?;

    send_auth_result(&mut stream, error_code::OK).await?;

    let endpoint = HypervisorEndpoint {
        host: console.hypervisor_ip.clone(),
        insecure_port: console.insecure_port,
        secure_port: console.secure_port,
        ca_cert_pem: (*state.ca_cert_pem).clone(),
        host_subject: console.host_subject.clone(),
    };
    let hypervisor_ticket = console.ticket.clone().unwrap_or_default();

    match connect_hypervisor(
        &endpoint,
        link_mess.connection_id,
        link_mess.channel_type,
        link_mess.channel_id,
        &link_mess.common_caps,
        &link_mess.channel_caps,
        &hypervisor_ticket,
    )
    .await
    {
        Ok(hypervisor) => {
            info!(session_id = %token_row.session_id, "channel established end to end");
            Ok((
                stream,
                LinkedChannel {
                    hypervisor,
                    channel_type: link_mess.channel_type,
                    session_id: token_row.session_id,
                },
            ))
        }
        Err(e) => {
            warn!(error = %e, "hypervisor connection failed after client was told ok");
            channel_repo.remove_proxy_channel(&proxy_channel.node, proxy_channel.pid).await.ok();
            audit_repo
                .add_audit_event(&AuditEvent {
                    source: console.source,
                    uuid: console.uuid,
                    timestamp: chrono::Utc::now(),
                    session_id: Some(token_row.session_id),
                    channel: Some(channel::name(link_mess.channel_type).to_string()),
                    node: Some(state.config.node_name.clone()),
                    pid: Some(pid),
                    message: "Hypervisor connection failed".to_string(),
                })
                .await
                .ok();
            Err(WorkerError::ConnectionRefused)
        }
    }
}

async fn send_auth_result(stream: &mut ClientStream, code: u32) -> Result<(), WorkerError> {
    let mut bytes = [0u8; 4];
    LittleEndian::write_u32(&mut bytes, code);
    stream.write_all(&bytes).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_channel_advertises_migration_caps() {
        let caps = if channel::MAIN == channel::MAIN {
            vec![main_caps::DEFAULT]
        } else {
            Vec::new()
        };
        assert_eq!(caps, vec![main_caps::DEFAULT]);
    }
}
