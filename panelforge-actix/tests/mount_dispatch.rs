//! Drives the compiled `Router` through an actual `actix-web` service,
//! exercising [`panelforge_actix::mount()`] end to end rather than unit
//! testing `ActixAdapter` in isolation.
use actix_web::{test, App};
use panelforge_core::{Config, DatabaseIf, Engine};
use std::sync::Arc;

fn test_router() -> Arc<panelforge_core::Router> {
    let mut engine = Engine::new();
    engine.add_config(Config::default());
    engine.add_database("", DatabaseIf::new(Arc::new(panelforge_core::NullConn)));
    engine.set_authenticator(Arc::new(|u: &str, p: &str| u == "admin" && p == "admin"));
    engine.add_plugin(Box::new(panelforge_core::admin::AdminPlugin::new()));
    Arc::new(engine.use_host().unwrap())
}

#[actix_web::test]
async fn login_view_round_trips_through_actix() {
    let router = test_router();
    let app = test::init_service(
        App::new().configure(move |cfg| panelforge_actix::mount(cfg, router.clone())),
    )
    .await;

    let req = test::TestRequest::get().uri("/admin/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("login"));
}

#[actix_web::test]
async fn unmatched_path_yields_404() {
    let router = test_router();
    let app = test::init_service(
        App::new().configure(move |cfg| panelforge_actix::mount(cfg, router.clone())),
    )
    .await;

    let req = test::TestRequest::get().uri("/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn signin_with_form_body_authenticates() {
    let router = test_router();
    let app = test::init_service(
        App::new().configure(move |cfg| panelforge_actix::mount(cfg, router.clone())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/admin/signin")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("username=admin&password=admin")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("\"code\":200"));
}
