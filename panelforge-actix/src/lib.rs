//! (Ab)use `actix-web` as the host framework for a `panelforge_core`
//! application.
//!
//! Implements [`panelforge_core::Adapter`] for `actix-web`: the adapter
//! translates one inbound `actix_web::HttpRequest` (plus its already-read
//! body) into a framework-neutral [`panelforge_core::RequestData`], and
//! translates the `ResponseData` the handler chain produced back into an
//! `actix_web::HttpResponse`. [`mount()`] wires a compiled
//! [`panelforge_core::Router`] into an `actix-web` service as a single
//! catch-all handler, the way `Engine::use_host()`'s doc comment describes:
//! one binary, one host framework, no runtime adapter registry.
//!
mod session;

pub use session::ActixSession;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::StreamExt;
use panelforge_core::{Adapter, Error, Method, RequestData, ResponseData, Router};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// The host-specific request data `ActixAdapter` reads from before handing
/// off to the framework-neutral pipeline. Built by [`mount()`]'s handler,
/// which is the only place able to `await` the body/multipart stream.
///
pub struct ActixParts {
    method: String,
    path: String,
    query: String,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    body: Vec<u8>,
    form_params: HashMap<String, String>,
    uploaded: RefCell<Vec<tempfile::TempPath>>,
}

impl ActixParts {
    /// Read `req`'s headers/cookies/query and drain `payload`, splitting
    /// into form fields and uploaded files if the content type is
    /// multipart, or parsing the raw body as `application/x-www-form-urlencoded`
    /// otherwise. `multipart_limit_bytes` matches the resource limit in
    /// `panelforge_core::Config::multipart_limit_bytes`.
    ///
    pub async fn collect(
        req: &HttpRequest,
        mut payload: web::Payload,
        multipart_limit_bytes: usize,
    ) -> Result<Self, Error> {
        let method = req.method().as_str().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().unwrap_or("").to_string();
        let headers = req
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let cookies = req
            .cookies()
            .map(|cookies| {
                cookies.iter().map(|c| (c.name().to_string(), c.value().to_string())).collect()
            })
            .unwrap_or_default();

        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let mut body = Vec::new();
        let mut form_params = HashMap::new();
        let mut uploaded = Vec::new();

        if content_type.starts_with("multipart/") {
            let mut multipart = Multipart::new(req.headers(), payload);
            while let Some(field) = multipart.next().await {
                let mut field = field.map_err(|e| Error::parameter_invalid(e.to_string()))?;
                let disposition = field.content_disposition();
                let name = disposition.as_ref().and_then(|d| d.get_name()).unwrap_or("").to_string();
                let filename = disposition
                    .as_ref()
                    .and_then(|d| d.get_filename())
                    .filter(|f| !f.is_empty())
                    .map(str::to_string);
                if filename.is_some() {
                    let tmp = tempfile::NamedTempFile::new()
                        .map_err(|e| Error::other(e.to_string()))?
                        .into_temp_path();
                    let mut file = std::fs::File::create(&tmp)
                        .map_err(|e| Error::other(e.to_string()))?;
                    use std::io::Write;
                    while let Some(chunk) = field.next().await {
                        let chunk = chunk.map_err(|e| Error::parameter_invalid(e.to_string()))?;
                        file.write_all(&chunk).map_err(|e| Error::other(e.to_string()))?;
                    }
                    form_params.insert(name, tmp.to_string_lossy().to_string());
                    uploaded.push(tmp);
                } else {
                    let mut value = Vec::new();
                    while let Some(chunk) = field.next().await {
                        let chunk = chunk.map_err(|e| Error::parameter_invalid(e.to_string()))?;
                        value.extend_from_slice(&chunk);
                    }
                    form_params.insert(name, String::from_utf8_lossy(&value).to_string());
                }
            }
        } else {
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| Error::parameter_invalid(e.to_string()))?;
                if body.len() + chunk.len() > multipart_limit_bytes {
                    return Err(Error::parameter_invalid("request body too large"));
                }
                body.extend_from_slice(&chunk);
            }
            if content_type.starts_with("application/x-www-form-urlencoded") {
                form_params = parse_urlencoded(&String::from_utf8_lossy(&body));
            }
        }

        Ok(Self { method, path, query, headers, cookies, body, form_params, uploaded: RefCell::new(uploaded) })
    }
}

fn parse_urlencoded(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next().unwrap_or("");
            Some((
                urlencoding::decode(key).ok()?.into_owned(),
                urlencoding::decode(value).ok()?.into_owned(),
            ))
        })
        .collect()
}

fn parse_query(query: &str) -> HashMap<String, String> {
    parse_urlencoded(query)
}

/// `panelforge_core::Adapter` implementation for `actix-web`.
///
pub struct ActixAdapter;

impl Adapter for ActixAdapter {
    type Request = ActixParts;
    type Response = HttpResponse;

    fn request_data(
        &self,
        request: &Self::Request,
        route_params: HashMap<String, String>,
    ) -> Result<RequestData, Error> {
        let method = Method::from_str(&request.method)?;
        // normalise trailing slashes, except on root -- §4.1 adapter obligation 1.
        let mut path = request.path.clone();
        if path.len() > 1 && path.ends_with('/') {
            path.pop();
        }
        Ok(RequestData {
            method,
            path,
            route_params,
            query_params: parse_query(&request.query),
            form_params: request.form_params.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        })
    }

    fn build_response(&self, data: ResponseData) -> HttpResponse {
        let status = actix_web::http::StatusCode::from_u16(data.status)
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = HttpResponse::build(status);
        for (name, value) in &data.headers {
            builder.insert_header((name.as_str(), value.as_str()));
        }
        builder.body(data.body)
    }

    fn handle_upload(&self, request: &Self::Request, files: &[Option<&Path>]) -> Result<(), Error> {
        for (tmp, target) in request.uploaded.borrow_mut().drain(..).zip(files.iter()) {
            if let Some(path) = target {
                tmp.persist(path).map_err(|e| Error::other(e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Look up the named cookie's value -- used by handlers that need the raw
/// cookie rather than the session it seeds (see §4.1's `GetCookie()`
/// adapter helper).
///
pub fn cookie(parts: &ActixParts, name: &str) -> Option<String> {
    parts.cookies.get(name).cloned()
}

/// Build the session handle a request's handler chain should run against.
/// `db` selects the database-table-backed mode (see [`ActixSession::database()`]);
/// pass `None` to use the plain actix-web cookie session.
///
pub fn session_for(
    req: &HttpRequest,
    db: Option<panelforge_core::DatabaseIf>,
) -> Result<panelforge_core::SessionIf, Error> {
    use actix_session::SessionExt;
    let cookie = req.get_session();
    let store: Arc<dyn panelforge_core::SessionStore + Send + Sync> = match db {
        Some(db) => Arc::new(ActixSession::database(cookie, db)?),
        None => Arc::new(ActixSession::cookie(cookie)),
    };
    Ok(panelforge_core::SessionIf::new(store))
}

/// The single catch-all handler [`mount()`] registers: dispatch `req` against
/// `router`, run its handler chain, and translate the result back to an
/// `actix_web::HttpResponse`. 404s when no route matches.
///
pub async fn dispatch(
    req: HttpRequest,
    payload: web::Payload,
    router: web::Data<Arc<Router>>,
) -> HttpResponse {
    let adapter = ActixAdapter;
    let method = match Method::from_str(req.method().as_str()) {
        Ok(m) => m,
        Err(_) => return HttpResponse::MethodNotAllowed().finish(),
    };
    let path = req.uri().path().to_string();
    let Some((chain, route_params)) = router.dispatch(&path, method) else {
        return HttpResponse::NotFound().body("not found");
    };
    let multipart_limit = router.services.config().multipart_limit_bytes;
    let parts = match ActixParts::collect(&req, payload, multipart_limit).await {
        Ok(p) => p,
        Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
    };
    let request = match adapter.request_data(&parts, route_params) {
        Ok(r) => r,
        Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
    };
    let session = match session_for(&req, router.services.default_database()) {
        Ok(s) => s,
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    let ctx = panelforge_core::run_chain(request, session, chain.to_vec());
    adapter.build_response(ctx.response)
}

/// Register [`dispatch()`] as the default (catch-all) service for every
/// method/path the `router`'s compiled routes and the built-in admin
/// plugin's URL surface cover. Application code supplies its own
/// `actix_web::App` with whatever middleware (logging, compression, static
/// file serving) it needs around this.
///
pub fn mount(cfg: &mut web::ServiceConfig, router: Arc<Router>) {
    cfg.app_data(web::Data::new(router)).default_service(web::route().to(dispatch));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_urlencoded_decodes_pairs() {
        let parsed = parse_urlencoded("a=1&b=hello%20world&c=");
        assert_eq!(parsed.get("a"), Some(&"1".to_string()));
        assert_eq!(parsed.get("b"), Some(&"hello world".to_string()));
        assert_eq!(parsed.get("c"), Some(&"".to_string()));
    }

    #[test]
    fn parse_urlencoded_ignores_empty_input() {
        assert!(parse_urlencoded("").is_empty());
    }

    #[test]
    fn request_data_normalises_trailing_slash() {
        let parts = ActixParts {
            method: "GET".to_string(),
            path: "/admin/info/widgets/".to_string(),
            query: "page=2".to_string(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            body: Vec::new(),
            form_params: HashMap::new(),
            uploaded: RefCell::new(Vec::new()),
        };
        let request = ActixAdapter.request_data(&parts, HashMap::new()).unwrap();
        assert_eq!(request.path, "/admin/info/widgets");
        assert_eq!(request.query_params.get("page"), Some(&"2".to_string()));
    }

    #[test]
    fn request_data_keeps_bare_root_slash() {
        let parts = ActixParts {
            method: "GET".to_string(),
            path: "/".to_string(),
            query: String::new(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            body: Vec::new(),
            form_params: HashMap::new(),
            uploaded: RefCell::new(Vec::new()),
        };
        let request = ActixAdapter.request_data(&parts, HashMap::new()).unwrap();
        assert_eq!(request.path, "/");
    }

    #[test]
    fn build_response_copies_status_headers_and_body() {
        let mut data = ResponseData::default();
        data.set_status(404);
        data.set_header("X-Pjax-Url", "/admin/info/widgets");
        data.set_body("not found");
        let resp = ActixAdapter.build_response(data);
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers().get("X-Pjax-Url").unwrap().to_str().unwrap(),
            "/admin/info/widgets",
        );
    }
}
