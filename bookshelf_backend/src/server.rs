use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{App, HttpServer};
use anyhow::Context;
use paperclip::actix::{web, OpenApiExt};
use tracing_actix_web::TracingLogger;

use crate::accounts_repository::{AccountsRepository, InMemoryAccountsRepository};
use crate::app_config::config_app;
use crate::library_repository::{InMemoryLibraryRepository, LibraryRepository};
use crate::mailer::{EmailTemplates, Mailer};

/// Everything the backend handlers share
#[derive(Clone)]
pub struct BackendState {
    pub accounts: Arc<dyn AccountsRepository>,
    pub library: Arc<dyn LibraryRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub templates: EmailTemplates,
}

impl BackendState {
    /// State backed by the in-memory repositories
    pub fn in_memory(mailer: Arc<dyn Mailer>, templates: EmailTemplates) -> Self {
        Self {
            accounts: Arc::new(InMemoryAccountsRepository::default()),
            library: Arc::new(InMemoryLibraryRepository::default()),
            mailer,
            templates,
        }
    }
}

/// Binds the backend http server, returns the server future and the address it listens on
pub fn start_server(state: BackendState, address: (&str, u16)) -> anyhow::Result<(Server, SocketAddr)> {
    let http_server = HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(web::Data::new(state.accounts.clone()))
            .app_data(web::Data::new(state.library.clone()))
            .app_data(web::Data::new(state.mailer.clone()))
            .app_data(web::Data::new(state.templates.clone()))
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind(address)
    .context("Failed to bind backend server")?;

    let bound_address = *http_server
        .addrs()
        .first()
        .context("Backend server bound to no address")?;

    Ok((http_server.run(), bound_address))
}
