//! Worked example wiring `panelforge-core`'s admin plugin to `actix-web`,
//! backed by sqlite storage and handlebars templates. Grounded on the
//! teacher's own `examples/http_server/actix_sqlite` binary: an
//! `actix_rt::main` entry point, a `HttpServer` serving the generated
//! routes plus a static-file fallback, and `PORT` read from the
//! environment.
//!
//! This is the one binary in the workspace that installs a `tracing`
//! subscriber; library crates never do this themselves.
use actix_web::{App as ActixApp, HttpServer};
use panelforge_core::{Config, DatabaseIf, DbFieldType, Engine, InfoField, Table};
use std::sync::Arc;

fn widgets_table() -> Table {
    let mut table = Table::new("widgets", "");
    table.info = table
        .info
        .field(InfoField::new("Name", "name", DbFieldType::Text))
        .field(InfoField::new("Quantity", "quantity", DbFieldType::Int));
    table
}

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let sqlite = panelforge_sqlite::SqliteConn::new(std::path::Path::new("panelforge_demo.sqlite"))
        .expect("open sqlite database");
    let hb = panelforge_handlebars::HbTemplEng::new(Some("demos/actix-sqlite/templates"))
        .expect("load handlebars templates");

    let mut engine = Engine::new();
    engine
        .add_config(Config::default())
        .add_database("", DatabaseIf::new(Arc::new(sqlite)))
        .set_template(panelforge_core::TemplEngIf::new(Arc::new(hb)))
        .add_generator("widgets", Arc::new(|_ctx| widgets_table()))
        .add_plugin(Box::new(panelforge_core::admin::AdminPlugin::new()));

    let router = Arc::new(engine.use_host().expect("compile routes"));

    let port: u16 = std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
    tracing::info!(port, "starting panelforge demo server");

    HttpServer::new(move || {
        ActixApp::new()
            .configure(|cfg| panelforge_actix::mount(cfg, router.clone()))
            .service(actix_files::Files::new("/static", "demos/actix-sqlite/static"))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
