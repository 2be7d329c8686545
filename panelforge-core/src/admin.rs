//! The one plugin this crate ships: the built-in CRUD controllers that turn
//! a registered set of [`Table`](../table/struct.Table.html)s into the URL
//! surface under the configured prefix -- login/logout, list/new/edit/detail,
//! the JSON API mirrors, menu CRUD, CSV export, and the field-choose ajax
//! endpoint.
//!
//! Every handler here is a thin translation layer: it reads `Context`,
//! consults the [`Table`](../table/struct.Table.html) the route's `:table`
//! segment resolves to via [`Services::generator()`
//! ](../plugin/struct.Services.html#method.generator), and writes back
//! through [`ResponseData`](../context/struct.ResponseData.html). SQL
//! construction itself lives in [`table`](../table/index.html); this module
//! never builds a SELECT by hand beyond the export path's read-everything
//! query.
//!
use crate::app::{App, Handler};
use crate::context::Context;
use crate::database::{DatabaseIf, DbValue};
use crate::error::Error;
use crate::path::Method;
use crate::plugin::{Plugin, Services};
use crate::table::{Params, SortDir, Table};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn random_token() -> String {
    format!("{:032x}", rand::random::<u128>())
}

fn write_json(ctx: &mut Context, status: u16, code: u16, data: serde_json::Value, msg: &str) {
    ctx.response.set_status(status);
    ctx.response.set_header("Content-Type", "application/json; charset=utf-8");
    ctx.response
        .set_body(json!({ "code": code, "data": data, "msg": msg }).to_string());
}

fn write_html(ctx: &mut Context, status: u16, body: String) {
    ctx.response.set_status(status);
    ctx.response.set_header("Content-Type", "text/html; charset=utf-8");
    ctx.response.set_body(body);
}

fn redirect(ctx: &mut Context, url: &str) {
    ctx.response.set_status(302);
    ctx.response.set_header("Location", url);
}

fn login_panel() -> String {
    "<html><body><form id=\"login\">login</form></body></html>".to_string()
}

fn dashboard_panel() -> String {
    "<html><body><h1>Dashboard</h1></body></html>".to_string()
}

/// Tracks, per username, the token of the session that last logged in --
/// enforcing that a later successful `/signin` invalidates an earlier one
/// (§8 scenario 2).
///
#[derive(Default)]
struct SessionRegistry(Mutex<HashMap<String, String>>);

impl SessionRegistry {
    fn record(&self, username: &str, token: &str) {
        self.0.lock().unwrap().insert(username.to_string(), token.to_string());
    }

    fn is_current(&self, username: &str, token: &str) -> bool {
        self.0.lock().unwrap().get(username).map(|t| t == token).unwrap_or(false)
    }

    fn forget(&self, username: &str) {
        self.0.lock().unwrap().remove(username);
    }
}

fn authenticated(ctx: &Context, registry: &SessionRegistry) -> Option<String> {
    let user = ctx.session.get("__pf_user")?;
    let token = ctx.session.get("__pf_token")?;
    if registry.is_current(&user, &token) {
        Some(user)
    } else {
        None
    }
}

fn csrf_token(ctx: &mut Context) -> String {
    if let Some(t) = ctx.session.get("__pf_csrf") {
        return t;
    }
    let t = random_token();
    let _ = ctx.session.set("__pf_csrf", &t);
    t
}

fn token_valid(ctx: &Context, submitted: Option<&str>) -> bool {
    matches!((ctx.session.get("__pf_csrf"), submitted), (Some(a), Some(b)) if a == b)
}

fn table_for(ctx: &Context, services: &Services, name: &str) -> Result<Table, Error> {
    let generator = services.generator(name).ok_or_else(|| Error::not_found(name))?;
    Ok(generator(ctx))
}

fn connection_for(services: &Services, table: &Table) -> Result<DatabaseIf, Error> {
    services
        .database(&table.connection)
        .or_else(|| services.default_database())
        .ok_or_else(|| Error::persistence(None, "no database connection configured"))
}

fn parse_params(ctx: &Context, table: &Table) -> Params {
    let mut params = Params::new();
    if let Some(size) = ctx.request.query_params.get("pageSize").and_then(|s| s.parse().ok()) {
        params.limit = size;
    }
    if let Some(page) = ctx.request.query_params.get("page").and_then(|s| s.parse::<usize>().ok())
    {
        params.offset = page.saturating_sub(1) * params.limit;
    }
    if let Some(sort_col) = ctx.request.query_params.get("__sort") {
        let dir = match ctx.request.query_params.get("__order").map(|s| s.as_str()) {
            Some("desc") => SortDir::Desc,
            _ => SortDir::Asc,
        };
        params.sort = Some((sort_col.clone(), dir));
    }
    for field in &table.info.fields {
        if field.filterable.is_some() {
            if let Some(value) = ctx.request.query_params.get(&field.column) {
                params.filters.insert(field.column.clone(), value.clone());
            }
        }
    }
    params
}

fn rows_to_json(rows: &[crate::table::Row]) -> serde_json::Value {
    json!(rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(k, cell)| (k.clone(), json!(cell.text)))
                .collect::<serde_json::Map<_, _>>()
        })
        .collect::<Vec<_>>())
}

fn list_html(table: &Table, rows: &[crate::table::Row], total: usize) -> String {
    let mut out = format!("<html><body><h1>{}</h1><table>", table.info.title);
    out += "<tr>";
    for field in &table.info.fields {
        if !field.hidden {
            out += &format!("<th>{}</th>", field.label);
        }
    }
    out += "</tr>";
    for row in rows {
        out += "<tr>";
        for field in &table.info.fields {
            if field.hidden {
                continue;
            }
            let cell = row.get(&field.column).map(|c| c.text.as_str()).unwrap_or("");
            out += &format!("<td>{}</td>", cell);
        }
        out += "</tr>";
    }
    out += &format!("</table><p>total: {}</p></body></html>", total);
    out
}

fn form_html(table: &Table, create: bool, values: &HashMap<String, String>, token: &str) -> String {
    let mut out = format!("<html><body><form method=\"post\" action=\"\">");
    out += &format!("<input type=\"hidden\" name=\"token\" value=\"{}\">", token);
    for field in &table.form.fields {
        if !field.visible(create) {
            continue;
        }
        let value = values
            .get(&field.column)
            .cloned()
            .or_else(|| field.default_value.clone())
            .unwrap_or_default();
        out += &format!(
            "<label>{}</label><input name=\"{}\" value=\"{}\" {}>",
            field.label,
            field.column,
            value,
            if field.editable(create) { "" } else { "readonly" },
        );
    }
    out += "</form></body></html>";
    out
}

fn form_fields_json(table: &Table, create: bool) -> serde_json::Value {
    json!(table
        .form
        .fields
        .iter()
        .filter(|f| f.visible(create))
        .map(|f| json!({
            "label": f.label,
            "column": f.column,
            "formType": format!("{:?}", f.form_type),
            "defaultValue": f.default_value,
            "editable": f.editable(create),
        }))
        .collect::<Vec<_>>())
}

/// The built-in admin plugin. Construct once, register with
/// [`Engine::add_plugin()`](../engine/struct.Engine.html#method.add_plugin).
///
pub struct AdminPlugin {
    sessions: Arc<SessionRegistry>,
}

impl AdminPlugin {
    pub fn new() -> Self {
        Self { sessions: Arc::new(SessionRegistry::default()) }
    }
}

impl Default for AdminPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for AdminPlugin {
    fn name(&self) -> &str {
        "admin"
    }

    fn init_plugin(&mut self, services: &Services) -> Result<App, Error> {
        let services = services.clone();
        let prefix = services.config().url_prefix.clone();
        let login_url = services.config().login_url.clone();
        let index_url = services.config().index_url.clone();
        let sessions = self.sessions.clone();

        let mut app = App::new();
        {
            let mut group = app.group(&prefix);

            group.get(
                "/login",
                Arc::new(|c: &mut Context| write_html(c, 200, login_panel())),
            );

            {
                let sessions = sessions.clone();
                let services = services.clone();
                group.post(
                    "/signin",
                    Arc::new(move |c: &mut Context| {
                        let username = c.request.form_params.get("username").cloned().unwrap_or_default();
                        let password = c.request.form_params.get("password").cloned().unwrap_or_default();
                        if password.is_empty() {
                            write_json(c, 200, 400, json!(null), "password required");
                            return;
                        }
                        if !services.authenticate(&username, &password) {
                            write_json(c, 200, 400, json!(null), "invalid credentials");
                            return;
                        }
                        let token = random_token();
                        c.session.renew();
                        let _ = c.session.set("__pf_user", &username);
                        let _ = c.session.set("__pf_token", &token);
                        sessions.record(&username, &token);
                        write_json(c, 200, 200, json!({ "url": index_url.clone() }), "ok");
                    }),
                );
            }

            {
                let sessions = sessions.clone();
                group.get(
                    "/logout",
                    Arc::new(move |c: &mut Context| {
                        if let Some(user) = c.session.get("__pf_user") {
                            sessions.forget(&user);
                        }
                        c.session.clear();
                        write_html(c, 200, login_panel());
                    }),
                );
            }

            {
                let sessions = sessions.clone();
                let login_url = login_url.clone();
                group.get(
                    "/",
                    Arc::new(move |c: &mut Context| {
                        if authenticated(c, &sessions).is_some() {
                            write_html(c, 200, dashboard_panel());
                        } else {
                            redirect(c, &login_url);
                        }
                    }),
                );
            }

            register_crud_routes(&mut group, services.clone(), sessions.clone(), login_url.clone());
        }
        Ok(app)
    }
}

fn require_auth(
    ctx: &mut Context,
    sessions: &SessionRegistry,
    login_url: &str,
) -> Option<String> {
    match authenticated(ctx, sessions) {
        Some(user) => Some(user),
        None => {
            redirect(ctx, login_url);
            None
        }
    }
}

fn register_crud_routes(
    group: &mut crate::app::RouterGroup<'_>,
    services: Services,
    sessions: Arc<SessionRegistry>,
    login_url: String,
) {
    {
        let services = services.clone();
        let sessions = sessions.clone();
        let login_url = login_url.clone();
        group.get(
            "/info/:table",
            Arc::new(move |c: &mut Context| {
                if require_auth(c, &sessions, &login_url).is_none() {
                    return;
                }
                let table_name = c.request.route_params.get("table").cloned().unwrap_or_default();
                let table = match table_for(c, &services, &table_name) {
                    Ok(t) => t,
                    Err(e) => return write_html(c, 404, e.localize()),
                };
                let db = match connection_for(&services, &table) {
                    Ok(db) => db,
                    Err(e) => return write_html(c, 500, e.localize()),
                };
                let params = parse_params(c, &table);
                match table.info.get_data(&db, &params) {
                    Ok((rows, total)) => write_html(c, 200, list_html(&table, &rows, total)),
                    Err(e) => write_html(c, 500, e.localize()),
                }
            }),
        );
    }

    {
        let services = services.clone();
        group.get(
            "/api/list/:table",
            Arc::new(move |c: &mut Context| {
                let table_name = c.request.route_params.get("table").cloned().unwrap_or_default();
                let table = match table_for(c, &services, &table_name) {
                    Ok(t) => t,
                    Err(_) => return write_json(c, 200, 400, json!(null), "table not found"),
                };
                let db = match connection_for(&services, &table) {
                    Ok(db) => db,
                    Err(e) => return write_json(c, 200, 400, json!(null), &e.localize()),
                };
                let params = parse_params(c, &table);
                match table.info.get_data(&db, &params) {
                    Ok((rows, total)) => write_json(
                        c,
                        200,
                        200,
                        json!({ "list": rows_to_json(&rows), "total": total }),
                        "ok",
                    ),
                    Err(e) => write_json(c, 200, 400, json!(null), &e.localize()),
                }
            }),
        );
    }

    for (path, create) in [("/info/:table/new", true), ("/info/:table/edit", false)] {
        let services = services.clone();
        group.get(
            path,
            Arc::new(move |c: &mut Context| {
                let table_name = c.request.route_params.get("table").cloned().unwrap_or_default();
                let table = match table_for(c, &services, &table_name) {
                    Ok(t) => t,
                    Err(e) => return write_html(c, 404, e.localize()),
                };
                let mut values = HashMap::new();
                if !create {
                    if let Some(pk) = c.request.query_params.get("__goadmin_edit_pk").cloned() {
                        if let Ok(Some(row)) =
                            connection_for(&services, &table).and_then(|db| {
                                table.detail.get_data(&db, &table.primary_key.0, &pk)
                            })
                        {
                            for (k, cell) in row {
                                values.insert(k, cell.text);
                            }
                        }
                        values.insert(table.primary_key.0.clone(), pk);
                    }
                }
                let token = csrf_token(c);
                write_html(c, 200, form_html(&table, create, &values, &token));
            }),
        );
    }

    {
        let services = services.clone();
        group.get(
            "/info/:table/detail",
            Arc::new(move |c: &mut Context| {
                let table_name = c.request.route_params.get("table").cloned().unwrap_or_default();
                let table = match table_for(c, &services, &table_name) {
                    Ok(t) => t,
                    Err(e) => return write_html(c, 404, e.localize()),
                };
                let pk = c.request.query_params.get("__goadmin_edit_pk").cloned().unwrap_or_default();
                let db = match connection_for(&services, &table) {
                    Ok(db) => db,
                    Err(e) => return write_html(c, 500, e.localize()),
                };
                match table.detail.get_data(&db, &table.primary_key.0, &pk) {
                    Ok(Some(row)) => {
                        let mut out = format!("<html><body><h1>{}</h1>", table.detail.title);
                        for field in &table.detail.fields {
                            let cell = row.get(&field.column).map(|c| c.text.as_str()).unwrap_or("");
                            out += &format!("<p>{}: {}</p>", field.label, cell);
                        }
                        out += "</body></html>";
                        write_html(c, 200, out);
                    }
                    Ok(None) => write_html(c, 404, "wrong id".to_string()),
                    Err(e) => write_html(c, 500, e.localize()),
                }
            }),
        );
    }

    for (path, kind) in [("/api/create/form/:table", true), ("/api/edit/form/:table", false)] {
        let services = services.clone();
        group.get(
            path,
            Arc::new(move |c: &mut Context| {
                let table_name = c.request.route_params.get("table").cloned().unwrap_or_default();
                let table = match table_for(c, &services, &table_name) {
                    Ok(t) => t,
                    Err(_) => return write_json(c, 200, 400, json!(null), "table not found"),
                };
                write_json(c, 200, 200, form_fields_json(&table, kind), "ok");
            }),
        );
    }

    {
        let services = services.clone();
        group.post(
            "/new/:table",
            Arc::new(move |c: &mut Context| {
                if !token_valid(c, c.request.form_params.get("token").map(|s| s.as_str())) {
                    return write_html(c, 200, "edit fail, wrong token".to_string());
                }
                let table_name = c.request.route_params.get("table").cloned().unwrap_or_default();
                let table = match table_for(c, &services, &table_name) {
                    Ok(t) => t,
                    Err(e) => return write_json(c, 200, 400, json!(null), &e.localize()),
                };
                let errors = table.form.validate(&c.request.form_params, true);
                if !errors.is_empty() {
                    return write_json(c, 200, 400, json!(errors), "validation failed");
                }
                let db = match connection_for(&services, &table) {
                    Ok(db) => db,
                    Err(e) => return write_json(c, 200, 400, json!(null), &e.localize()),
                };
                let mut columns = Vec::new();
                let mut values = Vec::new();
                for field in &table.form.fields {
                    if !field.visible(true) || !field.editable(true) {
                        continue;
                    }
                    let Some(raw) = c.request.form_params.get(&field.column) else { continue };
                    let value = field.post_filter.as_ref().map(|f| f(raw)).unwrap_or_else(|| raw.clone());
                    columns.push(field.column.clone());
                    values.push(DbValue::Text(value));
                }
                let placeholders: Vec<String> =
                    (1..=columns.len()).map(|i| format!("${}", i)).collect();
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table.name,
                    columns.join(", "),
                    placeholders.join(", "),
                );
                match db.exec(&sql, &values) {
                    Ok(_) => {
                        c.response.set_header(
                            "X-Pjax-Url",
                            format!("/info/{}", table.name),
                        );
                        write_json(c, 200, 200, json!(null), "ok");
                    }
                    Err(e) => write_json(c, 200, 400, json!(null), &e.localize()),
                }
            }),
        );
    }

    {
        let services = services.clone();
        group.post(
            "/edit/:table",
            Arc::new(move |c: &mut Context| {
                if !token_valid(c, c.request.form_params.get("token").map(|s| s.as_str())) {
                    return write_html(c, 200, "edit fail, wrong token".to_string());
                }
                let table_name = c.request.route_params.get("table").cloned().unwrap_or_default();
                let table = match table_for(c, &services, &table_name) {
                    Ok(t) => t,
                    Err(e) => return write_json(c, 200, 400, json!(null), &e.localize()),
                };
                let Some(pk) = c.request.form_params.get(&table.primary_key.0).cloned() else {
                    return write_json(c, 200, 400, json!(null), "missing primary key");
                };
                let errors = table.form.validate(&c.request.form_params, false);
                if !errors.is_empty() {
                    return write_json(c, 200, 400, json!(errors), "validation failed");
                }
                let db = match connection_for(&services, &table) {
                    Ok(db) => db,
                    Err(e) => return write_json(c, 200, 400, json!(null), &e.localize()),
                };
                let mut assignments = Vec::new();
                let mut values = Vec::new();
                let mut n = 0;
                for field in &table.form.fields {
                    if !field.visible(false) || !field.editable(false) {
                        continue;
                    }
                    let Some(raw) = c.request.form_params.get(&field.column) else { continue };
                    let value = field.post_filter.as_ref().map(|f| f(raw)).unwrap_or_else(|| raw.clone());
                    n += 1;
                    assignments.push(format!("{} = ${}", field.column, n));
                    values.push(DbValue::Text(value));
                }
                n += 1;
                values.push(DbValue::Text(pk));
                let sql = format!(
                    "UPDATE {} SET {} WHERE {} = ${}",
                    table.name,
                    assignments.join(", "),
                    table.primary_key.0,
                    n,
                );
                match db.exec(&sql, &values) {
                    Ok(_) => {
                        c.response.set_header(
                            "X-Pjax-Url",
                            format!("/info/{}", table.name),
                        );
                        write_json(c, 200, 200, json!(null), "ok");
                    }
                    Err(e) => write_json(c, 200, 400, json!(null), &e.localize()),
                }
            }),
        );
    }

    {
        let services = services.clone();
        group.post(
            "/delete/:table",
            Arc::new(move |c: &mut Context| {
                if !token_valid(c, c.request.form_params.get("token").map(|s| s.as_str())) {
                    return write_html(c, 200, "edit fail, wrong token".to_string());
                }
                let table_name = c.request.route_params.get("table").cloned().unwrap_or_default();
                let table = match table_for(c, &services, &table_name) {
                    Ok(t) => t,
                    Err(e) => return write_json(c, 200, 400, json!(null), &e.localize()),
                };
                let Some(ids) = c.request.form_params.get("id").cloned() else {
                    return write_json(c, 200, 400, json!(null), "missing id");
                };
                let db = match connection_for(&services, &table) {
                    Ok(db) => db,
                    Err(e) => return write_json(c, 200, 400, json!(null), &e.localize()),
                };
                let id_list: Vec<&str> = ids.split(',').collect();
                let placeholders: Vec<String> =
                    (1..=id_list.len()).map(|i| format!("${}", i)).collect();
                let sql = format!(
                    "DELETE FROM {} WHERE {} IN ({})",
                    table.name,
                    table.primary_key.0,
                    placeholders.join(", "),
                );
                let values: Vec<DbValue> =
                    id_list.into_iter().map(|id| DbValue::Text(id.to_string())).collect();
                match db.exec(&sql, &values) {
                    Ok(n) => write_json(c, 200, 200, json!({ "deleted": n }), "ok"),
                    Err(e) => write_json(c, 200, 400, json!(null), &e.localize()),
                }
            }),
        );
    }

    {
        let services = services.clone();
        group.post(
            "/export/:table",
            Arc::new(move |c: &mut Context| {
                let table_name = c.request.route_params.get("table").cloned().unwrap_or_default();
                let table = match table_for(c, &services, &table_name) {
                    Ok(t) => t,
                    Err(e) => return write_html(c, 404, e.localize()),
                };
                let db = match connection_for(&services, &table) {
                    Ok(db) => db,
                    Err(e) => return write_html(c, 500, e.localize()),
                };
                let mut params = Params::new();
                params.limit = 0;
                match table.info.get_data(&db, &params) {
                    Ok((rows, _)) => {
                        let mut csv = table
                            .info
                            .fields
                            .iter()
                            .map(|f| f.label.clone())
                            .collect::<Vec<_>>()
                            .join(",");
                        csv.push('\n');
                        for row in rows {
                            let line = table
                                .info
                                .fields
                                .iter()
                                .map(|f| row.get(&f.column).map(|c| c.text.clone()).unwrap_or_default())
                                .collect::<Vec<_>>()
                                .join(",");
                            csv.push_str(&line);
                            csv.push('\n');
                        }
                        c.response.set_header("Content-Type", "text/csv; charset=utf-8");
                        c.response.set_status(200);
                        c.response.set_body(csv);
                    }
                    Err(e) => write_html(c, 500, e.localize()),
                }
            }),
        );
    }

    {
        let services = services.clone();
        group.get(
            "/field/:table/:field/choose",
            Arc::new(move |c: &mut Context| {
                let table_name = c.request.route_params.get("table").cloned().unwrap_or_default();
                let field_name = c.request.route_params.get("field").cloned().unwrap_or_default();
                let table = match table_for(c, &services, &table_name) {
                    Ok(t) => t,
                    Err(_) => return write_json(c, 200, 400, json!(null), "table not found"),
                };
                let resolver = table
                    .form
                    .fields
                    .iter()
                    .find(|f| f.column == field_name)
                    .and_then(|f| f.on_choose.as_ref())
                    .map(|oc| oc.resolver.clone());
                match resolver {
                    Some(resolver) => match resolver(c) {
                        Ok((ok, message, options)) => write_json(
                            c,
                            200,
                            if ok { 200 } else { 400 },
                            json!(options
                                .into_iter()
                                .map(|o| json!({ "label": o.label, "value": o.value }))
                                .collect::<Vec<_>>()),
                            &message,
                        ),
                        Err(e) => write_json(c, 200, 400, json!(null), &e.localize()),
                    },
                    None => write_json(c, 200, 400, json!(null), "no choose handler"),
                }
            }),
        );
    }

    register_menu_routes(group, login_url);
}

/// A minimal in-memory menu item. The menu is deliberately not backed by a
/// declared [`Table`](../table/struct.Table.html) -- it is framework
/// bookkeeping, not generated content -- so it gets its own tiny store
/// rather than going through the generator registry.
///
#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct MenuEntry {
    id: u64,
    title: String,
    icon: String,
    url: String,
    parent_id: u64,
}

#[derive(Default)]
struct MenuStore {
    entries: Mutex<Vec<MenuEntry>>,
    next_id: Mutex<u64>,
}

fn register_menu_routes(group: &mut crate::app::RouterGroup<'_>, _login_url: String) {
    let store = Arc::new(MenuStore::default());

    {
        let store = store.clone();
        group.get(
            "/menu",
            Arc::new(move |c: &mut Context| {
                let entries = store.entries.lock().unwrap().clone();
                write_json(c, 200, 200, json!(entries), "ok");
            }),
        );
    }

    {
        let store = store.clone();
        group.post(
            "/menu/new",
            Arc::new(move |c: &mut Context| {
                let mut next_id = store.next_id.lock().unwrap();
                *next_id += 1;
                let entry = MenuEntry {
                    id: *next_id,
                    title: c.request.form_params.get("title").cloned().unwrap_or_default(),
                    icon: c.request.form_params.get("icon").cloned().unwrap_or_default(),
                    url: c.request.form_params.get("url").cloned().unwrap_or_default(),
                    parent_id: c
                        .request
                        .form_params
                        .get("parent_id")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0),
                };
                store.entries.lock().unwrap().push(entry);
                write_json(c, 200, 200, json!(null), "ok");
            }),
        );
    }

    {
        let store = store.clone();
        group.get(
            "/menu/edit/show",
            Arc::new(move |c: &mut Context| {
                let Some(id) = c.request.query_params.get("id").and_then(|s| s.parse::<u64>().ok())
                else {
                    return write_json(c, 200, 400, json!(null), "missing id");
                };
                match store.entries.lock().unwrap().iter().find(|e| e.id == id) {
                    Some(entry) => write_json(c, 200, 200, json!(entry), "ok"),
                    None => write_json(c, 200, 400, json!(null), "not found"),
                }
            }),
        );
    }

    {
        let store = store.clone();
        group.post(
            "/menu/edit",
            Arc::new(move |c: &mut Context| {
                let Some(id) = c.request.form_params.get("id").and_then(|s| s.parse::<u64>().ok())
                else {
                    return write_json(c, 200, 400, json!(null), "missing id");
                };
                let mut entries = store.entries.lock().unwrap();
                match entries.iter_mut().find(|e| e.id == id) {
                    Some(entry) => {
                        if let Some(v) = c.request.form_params.get("title") {
                            entry.title = v.clone();
                        }
                        if let Some(v) = c.request.form_params.get("icon") {
                            entry.icon = v.clone();
                        }
                        if let Some(v) = c.request.form_params.get("url") {
                            entry.url = v.clone();
                        }
                        write_json(c, 200, 200, json!(null), "ok");
                    }
                    None => write_json(c, 200, 400, json!(null), "not found"),
                }
            }),
        );
    }

    {
        let store = store.clone();
        group.post(
            "/menu/delete",
            Arc::new(move |c: &mut Context| {
                let Some(id) = c.request.form_params.get("id").and_then(|s| s.parse::<u64>().ok())
                else {
                    return write_json(c, 200, 400, json!(null), "missing id");
                };
                store.entries.lock().unwrap().retain(|e| e.id != id);
                write_json(c, 200, 200, json!(null), "ok");
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::RequestData;
    use crate::database::NullConn;
    use crate::engine::Engine;
    use crate::session::{MemorySessionStore, SessionIf};
    use crate::table::{Form, FormField, Info, InfoField, DbFieldType};

    fn widgets_generator(_c: &Context) -> Table {
        Table::new("widgets", "")
    }

    fn engine_with_admin() -> crate::engine::Router {
        let mut engine = Engine::new();
        engine.add_config(Config::default());
        engine.add_database("", DatabaseIf::new(Arc::new(NullConn)));
        engine.set_authenticator(Arc::new(|u: &str, p: &str| u == "admin" && p == "admin"));
        engine.add_generator("widgets", Arc::new(widgets_generator));
        engine.add_plugin(Box::new(AdminPlugin::new()));
        engine.use_host().unwrap()
    }

    fn run(router: &crate::engine::Router, path: &str, method: Method) -> Context {
        run_with_session(router, path, method, SessionIf::new(Arc::new(MemorySessionStore::new())))
    }

    fn run_with_session(
        router: &crate::engine::Router,
        path: &str,
        method: Method,
        session: SessionIf,
    ) -> Context {
        let (chain, route_params) = router.dispatch(path, method).expect("route exists");
        let mut request = RequestData::default();
        request.route_params = route_params;
        request.path = path.to_string();
        let mut ctx = Context::new(request, session, chain.to_vec());
        ctx.run().ok();
        ctx
    }

    /// Signs in as `admin` and returns the session so a caller can make
    /// further requests as the same logged-in user (§8 scenario 2's cookie).
    fn signed_in_session(router: &crate::engine::Router) -> SessionIf {
        let session = SessionIf::new(Arc::new(MemorySessionStore::new()));
        let (chain, route_params) = router.dispatch("/admin/signin", Method::Post).expect("route exists");
        let mut request = RequestData::default();
        request.route_params = route_params;
        request.form_params.insert("username".to_string(), "admin".to_string());
        request.form_params.insert("password".to_string(), "admin".to_string());
        let mut ctx = Context::new(request, session.clone(), chain.to_vec());
        ctx.run().ok();
        assert_eq!(ctx.response.status, 200);
        session
    }

    #[test]
    fn unauthenticated_dashboard_redirects_to_login() {
        let router = engine_with_admin();
        let ctx = run(&router, "/admin", Method::Get);
        assert_eq!(ctx.response.status, 302);
        assert_eq!(ctx.response.headers.get("Location"), Some(&"/admin/login".to_string()));
    }

    #[test]
    fn login_panel_contains_login() {
        let router = engine_with_admin();
        let ctx = run(&router, "/admin/login", Method::Get);
        assert_eq!(ctx.response.status, 200);
        assert!(String::from_utf8_lossy(&ctx.response.body).contains("login"));
    }

    #[test]
    fn signin_with_empty_password_is_rejected() {
        let router = engine_with_admin();
        let (chain, route_params) = router.dispatch("/admin/signin", Method::Post).unwrap();
        let mut request = RequestData::default();
        request.route_params = route_params;
        request.form_params.insert("username".to_string(), "admin".to_string());
        request.form_params.insert("password".to_string(), "".to_string());
        let session = SessionIf::new(Arc::new(MemorySessionStore::new()));
        let mut ctx = Context::new(request, session, chain.to_vec());
        ctx.run().ok();
        assert_eq!(ctx.response.status, 200);
        assert!(String::from_utf8_lossy(&ctx.response.body).contains("\"code\":400"));
    }

    #[test]
    fn missing_csrf_token_fails_edit() {
        let router = engine_with_admin();
        let (chain, route_params) = router.dispatch("/admin/edit/widgets", Method::Post).unwrap();
        let mut request = RequestData::default();
        request.route_params = route_params;
        let session = SessionIf::new(Arc::new(MemorySessionStore::new()));
        let mut ctx = Context::new(request, session, chain.to_vec());
        ctx.run().ok();
        assert!(String::from_utf8_lossy(&ctx.response.body).contains("edit fail, wrong token"));
    }

    #[test]
    fn list_route_renders_table_title() {
        let router = engine_with_admin();
        let session = signed_in_session(&router);
        let ctx = run_with_session(&router, "/admin/info/widgets", Method::Get, session);
        assert!(String::from_utf8_lossy(&ctx.response.body).contains("widgets"));
    }

    #[test]
    fn form_type_forms_parse_and_validate() {
        let form = Form::new("people").field(FormField::new("Name", "name", DbFieldType::Varchar));
        let mut submitted = HashMap::new();
        submitted.insert("name".to_string(), "Ann".to_string());
        assert!(form.validate(&submitted, true).is_empty());
        let info = Info::new("people").field(InfoField::new("Name", "name", DbFieldType::Varchar));
        assert_eq!(info.fields.len(), 1);
    }
}
