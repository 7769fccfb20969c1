// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use token_auth_server::{
    api::{cors_layer, router},
    auth::{AuthService, BearerExtractor, TokenCodec},
    config::{Config, LogFormat, DEFAULT_LOG_FILTER},
    state::AppState,
    store::{InMemoryUserStore, NewUser},
};

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    let log_format = config
        .as_ref()
        .map(|config| config.log_format)
        .unwrap_or(LogFormat::Pretty);
    init_tracing(log_format);

    // A missing signing key must stop the process before it accepts requests.
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let store = Arc::new(InMemoryUserStore::new());
    if let Some(seed) = &config.seed_user {
        let seeded = store
            .insert_user(NewUser {
                username: seed.login.clone(),
                email: seed.email.clone(),
                display_name: None,
                password: seed.password.clone(),
                roles: vec![seed.role.clone()],
            })
            .await;
        match seeded {
            Ok(user) => tracing::info!(user_id = user.id, login = %user.username, "Seeded user"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to seed user");
                std::process::exit(1);
            }
        }
    }

    let auth = AuthService::new(
        TokenCodec::new(config.signing_key.clone()),
        store,
        config.site_url.clone(),
    )
    .with_validity_secs(config.token_validity_secs)
    .with_store_timeout(config.store_timeout);

    let state = AppState::new(auth)
        .with_bearer_extractor(BearerExtractor::new(config.fallback_header.clone()));
    let app = router(
        state,
        cors_layer(config.cors_enabled, &config.cors_allowed_origins),
    );

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    tracing::info!(%addr, issuer = %config.site_url, "Token auth server listening (docs at /docs)");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
    {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
