//! Shared helpers for tests: config, server and pool seeding.

use crate::api::models::sip_configs::SipTransport;
use crate::assignment::Assigner;
use crate::config::WatcherConfig;
use crate::db::handlers::{Repository, SipConfigs};
use crate::db::models::sip_configs::SipConfigCreateDBRequest;
use crate::types::ConfigId;
use crate::{AppState, Config, build_router};
use axum_test::TestServer;
use sqlx::PgPool;

/// Config suitable for tests: no background watcher, defaults otherwise
pub fn create_test_config() -> Config {
    Config {
        watcher: WatcherConfig {
            enabled: false,
            ..WatcherConfig::default()
        },
        ..Config::default()
    }
}

/// Build a test server around the full router, backed by the given pool
pub fn create_test_server(pool: PgPool) -> TestServer {
    let config = create_test_config();
    let state = AppState {
        db: pool,
        assigner: Assigner::new(&config.assignment),
        config,
    };
    let router = build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Provision `n` records directly through the repository, returning their ids
pub async fn seed_lines(pool: &PgPool, n: u32) -> Vec<ConfigId> {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut repo = SipConfigs::new(&mut conn);

    let mut ids = Vec::new();
    for i in 1..=n {
        let created = repo
            .create(&SipConfigCreateDBRequest {
                username: format!("line{i:03}"),
                password: format!("secret-{i}"),
                domain: "sip.example.com".to_string(),
                server: "sip.example.com".to_string(),
                port: 5060,
                transport: SipTransport::Udp,
            })
            .await
            .expect("Failed to seed line");
        ids.push(created.id);
    }
    ids
}
