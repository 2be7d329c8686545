//! `Engine`: the process-wide object a binary builds once at boot. It
//! collects configuration, database connections, plugins and ad hoc routes,
//! then [`use_host()`](struct.Engine.html#method.use_host) compiles
//! everything into a [`Router`](struct.Router.html) a host-framework adapter
//! mounts as a single catch-all handler.
//!
//! The original this crate generalises kept a process-wide registry of
//! named adapters, picked by name at boot. That indirection has no
//! counterpart here: a binary already knows, at compile time, which single
//! host framework crate it links against, so `Engine` carries no adapter at
//! all -- the adapter crate's own `mount()`-style helper is handed the
//! `Router` `use_host()` produces, instead of `Engine` holding a `Box<dyn
//! Adapter>` it would have no type-safe way to call anyway (different
//! adapters have different `Request`/`Response` associated types).
//!
use crate::app::{App, Handler};
use crate::config::Config;
use crate::context::Context;
use crate::database::DatabaseIf;
use crate::generator::{Generator, GeneratorRegistry};
use crate::path::{param_names, Method};
use crate::plugin::{Plugin, Services};
use crate::render::TemplEngIf;
use crate::trie::Trie;
use crate::Error;
use std::collections::HashMap;
use std::sync::Arc;

/// A compiled route table: the trie used to find a route, and the
/// per-route handler chain plus parameter names needed to finish decoding a
/// request once a route is found.
///
pub struct Router {
    trie: Trie,
    chains: Vec<Vec<Handler>>,
    param_names: Vec<Vec<String>>,
    pub services: Services,
}

impl Router {
    /// Find the chain and build a `route_params` map (name -> captured
    /// value) for `path`/`method`. `None` if nothing matches -- the caller
    /// (an adapter) is expected to answer with 404 in that case.
    ///
    pub fn dispatch(
        &self,
        path: &str,
        method: Method,
    ) -> Option<(&[Handler], HashMap<String, String>)> {
        let matched = self.trie.find_path(path, method)?;
        let idx: usize = matched.id.parse().ok()?;
        let names = self.param_names.get(idx)?;
        let route_params = names
            .iter()
            .cloned()
            .zip(matched.params.into_iter())
            .collect();
        Some((&self.chains[idx], route_params))
    }
}

/// Accumulates configuration, plugins, and ad hoc routes for one process,
/// then compiles them into a [`Router`](struct.Router.html).
///
pub struct Engine {
    config: Option<Config>,
    databases: HashMap<String, DatabaseIf>,
    template: Option<TemplEngIf>,
    authenticate: Option<Arc<dyn Fn(&str, &str) -> bool + Send + Sync>>,
    plugins: Vec<Box<dyn Plugin>>,
    generators: GeneratorRegistry,
    display_filters: Vec<Arc<dyn Fn(&str) -> String + Send + Sync>>,
    extra_routes: App,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            config: None,
            databases: HashMap::new(),
            template: None,
            authenticate: None,
            plugins: Vec::new(),
            generators: GeneratorRegistry::new(),
            display_filters: Vec::new(),
            extra_routes: App::new(),
        }
    }

    pub fn add_config(&mut self, config: Config) -> &mut Self {
        self.config = Some(config);
        self
    }

    pub fn add_config_from_json(&mut self, json: &str) -> Result<&mut Self, Error> {
        self.config = Some(Config::from_json(json)?);
        Ok(self)
    }

    /// Register a named database connection, looked up by plugins through
    /// [`Services::database()`](../plugin/struct.Services.html#method.database).
    /// The empty name (`""`) is the default connection.
    ///
    pub fn add_database(&mut self, name: impl Into<String>, db: DatabaseIf) -> &mut Self {
        self.databases.insert(name.into(), db);
        self
    }

    pub fn set_template(&mut self, engine: TemplEngIf) -> &mut Self {
        self.template = Some(engine);
        self
    }

    /// Wire in the credential check `/login`'s handler delegates to. Leaving
    /// this unset means every login attempt fails closed.
    ///
    pub fn set_authenticator(
        &mut self,
        f: Arc<dyn Fn(&str, &str) -> bool + Send + Sync>,
    ) -> &mut Self {
        self.authenticate = Some(f);
        self
    }

    pub fn add_plugin(&mut self, plugin: Box<dyn Plugin>) -> &mut Self {
        self.plugins.push(plugin);
        self
    }

    pub fn add_plugins(&mut self, plugins: Vec<Box<dyn Plugin>>) -> &mut Self {
        self.plugins.extend(plugins);
        self
    }

    pub fn add_generator(&mut self, name: impl Into<String>, generator: Generator) -> &mut Self {
        self.generators.register(name, generator);
        self
    }

    pub fn add_generators(&mut self, generators: HashMap<String, Generator>) -> &mut Self {
        self.generators.register_all(generators);
        self
    }

    /// Escape every display cell's text as plain text before rendering --
    /// the blunt, always-correct filter; prefer this over
    /// [`add_display_filter_xss_js_filter()`
    /// ](#method.add_display_filter_xss_js_filter) unless a field
    /// deliberately returns markup.
    ///
    pub fn add_display_filter_xss_filter(&mut self) -> &mut Self {
        self.display_filters
            .push(Arc::new(|s: &str| v_htmlescape::escape(s).to_string()));
        self
    }

    /// Strip `<script` (case-insensitively) rather than escaping everything
    /// -- for fields that legitimately contain other markup.
    ///
    pub fn add_display_filter_xss_js_filter(&mut self) -> &mut Self {
        self.display_filters.push(Arc::new(|s: &str| {
            let lower = s.to_ascii_lowercase();
            if lower.contains("<script") {
                s.replace("<script", "&lt;script").replace("</script", "&lt;/script")
            } else {
                s.to_string()
            }
        }));
        self
    }

    /// Register an ad hoc route outside the generated CRUD surface -- a
    /// custom dashboard widget, a health check, anything a plugin's
    /// generator-driven routes don't cover.
    ///
    pub fn html(&mut self, method: Method, path: &str, handler: Handler) -> &mut Self {
        match method {
            Method::Get => {
                self.extra_routes.get(path, handler);
            }
            Method::Post => {
                self.extra_routes.post(path, handler);
            }
            Method::Put => {
                self.extra_routes.put(path, handler);
            }
            Method::Delete => {
                self.extra_routes.delete(path, handler);
            }
            Method::Patch => {
                self.extra_routes.patch(path, handler);
            }
            _ => {
                self.extra_routes.any(path, handler);
            }
        }
        self
    }

    /// The filters registered via [`add_display_filter_xss_filter()`
    /// ](#method.add_display_filter_xss_filter) /
    /// [`add_display_filter_xss_js_filter()`
    /// ](#method.add_display_filter_xss_js_filter), applied in registration
    /// order.
    ///
    pub fn display_filters(&self) -> &[Arc<dyn Fn(&str) -> String + Send + Sync>] {
        &self.display_filters
    }

    /// The generators registered directly or via a plugin's
    /// [`init_plugin()`](../plugin/trait.Plugin.html#method.init_plugin).
    ///
    pub fn generators(&self) -> &GeneratorRegistry {
        &self.generators
    }

    /// Finalize configuration: build the [`Services`](../plugin/struct.Services.html)
    /// bag, initialise every registered plugin against it, merge their
    /// routes with the ad hoc ones, and compile the result into a
    /// [`Router`](struct.Router.html) ready for an adapter to mount.
    ///
    /// Fails with [`Error::ConfigurationMissing`
    /// ](../error/enum.Error.html#variant.ConfigurationMissing) if no
    /// configuration was ever set.
    ///
    pub fn use_host(mut self) -> Result<Router, Error> {
        let config = self
            .config
            .take()
            .ok_or_else(|| Error::ConfigurationMissing("no Config set".to_string()))?;
        let authenticate =
            self.authenticate.take().unwrap_or_else(|| Arc::new(|_: &str, _: &str| false));
        let services = Services::new(
            std::mem::take(&mut self.databases),
            self.template.take(),
            authenticate,
            Arc::new(config),
            self.generators.clone(),
        );

        let mut merged = App::new();
        for plugin in self.plugins.iter_mut() {
            let app = plugin.init_plugin(&services)?;
            merged.merge(app);
        }
        merged.merge(self.extra_routes);

        let (trie, chains) = merged.build();
        let param_names = merged
            .route_patterns()
            .iter()
            .map(|pattern| param_names(pattern))
            .collect();
        Ok(Router { trie, chains, param_names, services })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `chain` to completion against a fresh [`Context`](../context/struct.Context.html)
/// built from `request` and `session` -- the loop an adapter's per-request
/// glue follows after [`Router::dispatch()`](struct.Router.html#method.dispatch)
/// finds a match.
///
pub fn run_chain(
    request: crate::context::RequestData,
    session: crate::session::SessionIf,
    chain: Vec<Handler>,
) -> Context {
    let mut ctx = Context::new(request, session, chain);
    if let Err(e) = ctx.run() {
        ctx.set_error(e);
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestData;
    use crate::database::NullConn;
    use crate::session::MemorySessionStore;
    use std::sync::Mutex;

    struct StubPlugin;
    impl Plugin for StubPlugin {
        fn name(&self) -> &str {
            "stub"
        }
        fn init_plugin(&mut self, _services: &Services) -> Result<App, Error> {
            let mut app = App::new();
            app.get(
                "/admin/info/:table",
                Arc::new(|c: &mut Context| {
                    c.response.set_body(c.request.route_params.get("table").cloned().unwrap_or_default());
                }),
            );
            Ok(app)
        }
    }

    #[test]
    fn use_host_fails_without_config() {
        let engine = Engine::new();
        assert!(matches!(engine.use_host(), Err(Error::ConfigurationMissing(_))));
    }

    #[test]
    fn use_host_merges_plugin_routes_and_dispatches() {
        let mut engine = Engine::new();
        engine.add_config(Config::default());
        engine.add_database("", DatabaseIf::new(Arc::new(NullConn)));
        engine.add_plugin(Box::new(StubPlugin));
        let router = engine.use_host().unwrap();

        let (chain, route_params) =
            router.dispatch("/admin/info/widgets", Method::Get).unwrap();
        assert_eq!(route_params.get("table"), Some(&"widgets".to_string()));

        let mut request = RequestData::default();
        request.route_params = route_params;
        let session = crate::session::SessionIf::new(Arc::new(MemorySessionStore::new()));
        let mut ctx = Context::new(request, session, chain.to_vec());
        ctx.run().unwrap();
        assert_eq!(ctx.response.body, b"widgets".to_vec());
    }

    #[test]
    fn html_registers_ad_hoc_routes_alongside_plugins() {
        let mut engine = Engine::new();
        engine.add_config(Config::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = log.clone();
        engine.html(
            Method::Get,
            "/healthz",
            Arc::new(move |_c: &mut Context| {
                l.lock().unwrap().push("hit");
            }),
        );
        let router = engine.use_host().unwrap();
        assert!(router.dispatch("/healthz", Method::Get).is_some());
    }
}
