// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: KERBSIDE INFRA DB (V1.0)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE FUENTES, CONSOLAS, TOKENS,
 *                   CANALES DE PROXY Y AUDITORÍA SOBRE LIBSQL
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::DbClient;
pub use errors::DbError;
pub use repositories::{AuditRepository, ChannelRepository, ConsoleRepository, SourceRepository, TokenRepository};

#[cfg(test)]
mod tests {
    use super::*;
    use kerbside_domain_model::{AuditEvent, ConsoleToken, ProxyChannel, Source, SourceKind};

    async fn memory_client() -> DbClient {
        DbClient::connect("file::memory:?cache=shared", None)
            .await
            .expect("in-memory db should bootstrap")
    }

    #[tokio::test]
    async fn source_round_trips_through_add_and_get() {
        let client = memory_client().await;
        let repo = SourceRepository::new(client);

        repo.add_source("alpha", SourceKind::Openstack, "https://alpha.example", "{}", None, "node-a")
            .await
            .unwrap();

        let fetched = repo.get_source("alpha").await.unwrap().expect("source should exist");
        assert_eq!(fetched.name, "alpha");
        assert!(!fetched.errored);
        assert!(!fetched.deleted);
    }

    #[tokio::test]
    async fn delete_source_is_soft_and_excludes_from_listing() {
        let client = memory_client().await;
        let repo = SourceRepository::new(client);

        repo.add_source("beta", SourceKind::Ovirt, "https://beta.example", "{}", None, "node-a")
            .await
            .unwrap();
        repo.delete_source("beta").await.unwrap();

        let listed = repo.get_sources().await.unwrap();
        assert!(listed.iter().all(|s| s.name != "beta"));
    }

    #[tokio::test]
    async fn add_token_then_lookup_by_token_and_session_id() {
        let client = memory_client().await;
        let source_repo = SourceRepository::new(client.clone());
        let console_repo = ConsoleRepository::new(client.clone());
        let token_repo = TokenRepository::new(client);

        source_repo
            .add_source("gamma", SourceKind::Shakenfist, "https://gamma.example", "{}", None, "node-a")
            .await
            .unwrap();
        console_repo
            .add_console(&kerbside_domain_model::Console {
                uuid: "console-1".into(),
                source: "gamma".into(),
                hypervisor_hostname: "hv1".into(),
                hypervisor_ip: "10.0.0.5".into(),
                insecure_port: 5901,
                secure_port: Some(5900),
                name: "vm-1".into(),
                host_subject: None,
                ticket: None,
                discovered: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let issued = token_repo.add_token("gamma", "console-1", 60).await.unwrap();

        let by_token = token_repo.get_token_by_token(&issued.token).await.unwrap();
        assert!(by_token.is_some());

        let by_session = token_repo.get_token_by_session_id(&issued.session_id).await.unwrap();
        assert_eq!(by_session.unwrap().token, issued.token);
    }

    #[tokio::test]
    async fn reap_expired_tokens_spares_tokens_with_live_channels() {
        let client = memory_client().await;
        let source_repo = SourceRepository::new(client.clone());
        let console_repo = ConsoleRepository::new(client.clone());
        let token_repo = TokenRepository::new(client.clone());
        let channel_repo = ChannelRepository::new(client);

        source_repo
            .add_source("delta", SourceKind::Openstack, "https://delta.example", "{}", None, "node-a")
            .await
            .unwrap();
        console_repo
            .add_console(&kerbside_domain_model::Console {
                uuid: "console-2".into(),
                source: "delta".into(),
                hypervisor_hostname: String::new(),
                hypervisor_ip: String::new(),
                insecure_port: 5901,
                secure_port: None,
                name: String::new(),
                host_subject: None,
                ticket: None,
                discovered: chrono::Utc::now(),
            })
            .await
            .unwrap();

        // already expired on arrival
        let expired = token_repo.add_token("delta", "console-2", -1).await.unwrap();

        channel_repo
            .record_channel_info(&ProxyChannel {
                node: "node-a".into(),
                pid: 1,
                client_ip: "203.0.113.9".into(),
                client_port: 54321,
                connection_id: 1,
                channel_type: "main".into(),
                channel_id: 0,
                session_id: Some(expired.session_id.clone()),
                created: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let reaped = token_repo.reap_expired_tokens().await.unwrap();
        assert_eq!(reaped, 0, "token with a live channel must survive reaping");

        channel_repo.remove_proxy_channel("node-a", 1).await.unwrap();
        let reaped = token_repo.reap_expired_tokens().await.unwrap();
        assert_eq!(reaped, 1, "token becomes reapable once its channel clears");
    }

    #[tokio::test]
    async fn audit_events_accumulate_and_count() {
        let client = memory_client().await;
        let source_repo = SourceRepository::new(client.clone());
        let console_repo = ConsoleRepository::new(client.clone());
        let audit_repo = AuditRepository::new(client);

        source_repo
            .add_source("epsilon", SourceKind::Ovirt, "https://epsilon.example", "{}", None, "node-a")
            .await
            .unwrap();
        console_repo
            .add_console(&kerbside_domain_model::Console {
                uuid: "console-3".into(),
                source: "epsilon".into(),
                hypervisor_hostname: String::new(),
                hypervisor_ip: String::new(),
                insecure_port: 5901,
                secure_port: None,
                name: String::new(),
                host_subject: None,
                ticket: None,
                discovered: chrono::Utc::now(),
            })
            .await
            .unwrap();

        for i in 0..3 {
            audit_repo
                .add_audit_event(&AuditEvent {
                    source: "epsilon".into(),
                    uuid: "console-3".into(),
                    timestamp: chrono::Utc::now(),
                    session_id: None,
                    channel: Some("main".into()),
                    node: Some("node-a".into()),
                    pid: Some(i),
                    message: format!("event {i}"),
                })
                .await
                .unwrap();
        }

        let count = audit_repo.count_audit_events("epsilon", "console-3").await.unwrap();
        assert_eq!(count, 3);

        let page = audit_repo.get_audit_events("epsilon", "console-3", 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
    }
}
