//! End-to-end coverage of the built-in admin plugin's URL surface (§8 of the
//! spec this crate implements), driven against a real sqlite connection and
//! an in-process fake adapter -- no host web framework involved.
use panelforge_core::{
    Config, Context, DatabaseIf, DbFieldType, DbValue, Engine, FieldFilter, FilterOperator, Info,
    InfoField, Layout, MemorySessionStore, Method, RequestData, Router, SessionIf, Table, Where,
};
use std::collections::HashMap;
use std::sync::Arc;

fn seed_people(db: &DatabaseIf) {
    db.exec(
        "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, city TEXT, gender INTEGER)",
        &[],
    )
    .unwrap();
    let rows = [
        ("admin", "guangzhou", 0),
        ("ann", "guangzhou", 1),
        ("bo", "shenzhen", 0),
    ];
    for (name, city, gender) in rows {
        db.exec(
            "INSERT INTO people (name, city, gender) VALUES ($1, $2, $3)",
            &[
                DbValue::Text(name.to_string()),
                DbValue::Text(city.to_string()),
                DbValue::Int(gender),
            ],
        )
        .unwrap();
    }
}

fn people_table() -> Table {
    let mut table = Table::new("people", "");
    table.info = Info::new("people")
        .field(InfoField::new("Name", "name", DbFieldType::Text))
        .field({
            let mut f = InfoField::new("City", "city", DbFieldType::Text);
            f.filterable = Some(FieldFilter::new(FilterOperator::Like));
            f
        })
        .wheres(vec![Where::new("gender", FilterOperator::Eq, DbValue::Int(0))]);
    table.info.layout = Layout::ThreeCol;
    table
}

fn engine_with_admin(db: DatabaseIf) -> Router {
    let mut engine = Engine::new();
    engine.add_config(Config::default());
    engine.add_database("", db);
    engine.set_authenticator(Arc::new(|u: &str, p: &str| u == "admin" && p == "admin"));
    engine.add_generator("people", Arc::new(|_c| people_table()));
    engine.add_plugin(Box::new(panelforge_core::admin::AdminPlugin::new()));
    engine.use_host().unwrap()
}

fn request(router: &Router, method: Method, path: &str, form: &[(&str, &str)]) -> Context {
    request_with_session(router, method, path, form, SessionIf::new(Arc::new(MemorySessionStore::new())))
}

fn request_with_session(
    router: &Router,
    method: Method,
    path: &str,
    form: &[(&str, &str)],
    session: SessionIf,
) -> Context {
    let (chain, route_params) = router.dispatch(path, method).expect("route exists");
    let mut req = RequestData::default();
    req.path = path.to_string();
    req.route_params = route_params;
    req.form_params = form.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    panelforge_core::run_chain(req, session, chain.to_vec())
}

fn body(ctx: &Context) -> String {
    String::from_utf8_lossy(&ctx.response.body).to_string()
}

/// §8 scenario 1: login/logout lifecycle.
#[test]
fn login_logout_lifecycle() {
    let db = DatabaseIf::new(Arc::new(panelforge_sqlite::SqliteConn::in_memory().unwrap()));
    seed_people(&db);
    let router = engine_with_admin(db);

    let session = SessionIf::new(Arc::new(MemorySessionStore::new()));
    let signin = request_with_session(
        &router,
        Method::Post,
        "/admin/signin",
        &[("username", "admin"), ("password", "admin")],
        session.clone(),
    );
    assert_eq!(signin.response.status, 200);

    let dashboard = request_with_session(&router, Method::Get, "/admin", &[], session.clone());
    assert_eq!(dashboard.response.status, 200);
    assert!(body(&dashboard).contains("Dashboard"));

    let _logout = request_with_session(&router, Method::Get, "/admin/logout", &[], session.clone());

    // an unauthenticated dashboard request redirects to the login view...
    let after_logout = request(&router, Method::Get, "/admin", &[]);
    assert_eq!(after_logout.response.status, 302);
    assert_eq!(after_logout.response.headers.get("Location"), Some(&"/admin/login".to_string()));

    // ...which itself renders with status 200 and the string "login".
    let login_view = request(&router, Method::Get, "/admin/login", &[]);
    assert_eq!(login_view.response.status, 200);
    assert!(body(&login_view).contains("login"));

    let bad_password = request(
        &router,
        Method::Post,
        "/admin/signin",
        &[("username", "admin"), ("password", "")],
    );
    assert_eq!(bad_password.response.status, 200);
    assert!(body(&bad_password).contains("\"code\":400"));
}

/// §8 scenario 6: filter semantics -- a `FieldFilter(city, like)` field plus
/// a baseline `Where` are AND-combined, and the row count matches SQL's own
/// count.
#[test]
fn filter_and_combines_with_baseline_where() {
    let db = DatabaseIf::new(Arc::new(panelforge_sqlite::SqliteConn::in_memory().unwrap()));
    seed_people(&db);
    let router = engine_with_admin(db.clone());

    let session = SessionIf::new(Arc::new(MemorySessionStore::new()));
    request_with_session(
        &router,
        Method::Post,
        "/admin/signin",
        &[("username", "admin"), ("password", "admin")],
        session.clone(),
    );

    let table = people_table();
    let mut params = panelforge_core::Params::new();
    params.filters.insert("city".to_string(), "guangz".to_string());
    let (rows, total) = table.info.get_data(&db, &params).unwrap();

    // gender = 0 AND city LIKE '%guangz%' matches only "admin", not "ann"
    // (gender 1) or "bo" (shenzhen).
    assert_eq!(total, 1);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name").map(|c| c.text.clone()), Some("admin".to_string()));
}

/// §8 scenario 5 (subset): wildcard trie matching through the compiled
/// admin router, exercised via the public `App`/`Router` surface rather
/// than `trie` directly.
#[test]
fn wildcard_route_resolves_through_compiled_router() {
    let db = DatabaseIf::new(Arc::new(panelforge_sqlite::SqliteConn::in_memory().unwrap()));
    seed_people(&db);
    let router = engine_with_admin(db);

    assert!(router.dispatch("/admin/info/people", Method::Get).is_some());
    assert!(router.dispatch("/admin/info/people/detail", Method::Get).is_some());
    assert!(router.dispatch("/admin/me/new", Method::Post).is_none());
}

/// §8's adapter-contract property, exercised end to end: a fake adapter
/// observes exactly the headers, status and body the handler chain wrote.
#[test]
fn fake_adapter_round_trips_response() {
    struct FakeAdapter;
    impl panelforge_core::Adapter for FakeAdapter {
        type Request = ();
        type Response = (u16, HashMap<String, String>, Vec<u8>);

        fn request_data(
            &self,
            _request: &Self::Request,
            route_params: HashMap<String, String>,
        ) -> Result<RequestData, panelforge_core::Error> {
            Ok(RequestData { method: Method::Get, route_params, ..Default::default() })
        }

        fn build_response(&self, data: panelforge_core::ResponseData) -> Self::Response {
            (data.status, data.headers, data.body)
        }
    }

    let db = DatabaseIf::new(Arc::new(panelforge_sqlite::SqliteConn::in_memory().unwrap()));
    seed_people(&db);
    let router = engine_with_admin(db);
    let ctx = request(&router, Method::Get, "/admin/login", &[]);

    let adapter = FakeAdapter;
    let (status, headers, response_body) = adapter.build_response(ctx.response);
    assert_eq!(status, 200);
    assert!(headers.get("Content-Type").is_some());
    assert!(String::from_utf8_lossy(&response_body).contains("login"));
}
