//! `App` and `RouterGroup`: the builder surface used to register routes
//! before handing them to [`Engine`](../engine/struct.Engine.html).
//!
use crate::context::Context;
use crate::path::{join, slash, Method};
use crate::trie::Trie;
use std::collections::HashMap;
use std::sync::Arc;

/// A handler: reads and mutates a [`Context`](../context/struct.Context.html)
/// and calls `next()` to continue the chain, or not, to short-circuit it.
///
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync>;

struct Route {
    pattern: String,
    method: Method,
    middleware: Vec<Handler>,
    handler: Handler,
    name: Option<String>,
}

/// The root of the route tree. Holds every registered route plus the trie
/// built from them once [`build()`](#method.build) is called.
///
pub struct App {
    prefix_middleware: Vec<Handler>,
    routes: Vec<Route>,
    named: HashMap<String, usize>,
}

impl App {
    pub fn new() -> Self {
        Self { prefix_middleware: Vec::new(), routes: Vec::new(), named: HashMap::new() }
    }

    /// Middleware run ahead of every route registered on this `App`
    /// (directly or through a [`group()`](#method.group)), in registration
    /// order.
    ///
    pub fn use_middleware(&mut self, handler: Handler) -> &mut Self {
        self.prefix_middleware.push(handler);
        self
    }

    /// A [`RouterGroup`](struct.RouterGroup.html) prefixed by `prefix`
    /// (itself [`slash`](../path/fn.slash.html)-normalised), inheriting this
    /// app's middleware.
    ///
    pub fn group<'a>(&'a mut self, prefix: &str) -> RouterGroup<'a> {
        let middleware = self.prefix_middleware.clone();
        RouterGroup {
            app: self,
            prefix: slash(prefix),
            middleware,
        }
    }

    pub fn get(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Get, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Post, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Put, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Delete, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Patch, handler)
    }

    pub fn any(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Any, handler)
    }

    fn add(&mut self, pattern: &str, method: Method, handler: Handler) -> RouteBuilder<'_> {
        let pattern = slash(pattern);
        self.routes.push(Route {
            pattern,
            method,
            middleware: self.prefix_middleware.clone(),
            handler,
            name: None,
        });
        let idx = self.routes.len() - 1;
        RouteBuilder { app: self, idx }
    }

    /// Compile every registered route into a [`Trie`](../trie/struct.Trie.html)
    /// plus the handler chain each route id resolves to. Route ids are the
    /// routes' registration index, stringified.
    ///
    pub fn build(&self) -> (Trie, Vec<Vec<Handler>>) {
        let mut trie = Trie::new();
        let mut chains = Vec::with_capacity(self.routes.len());
        for (i, route) in self.routes.iter().enumerate() {
            trie.add_path(&route.pattern, route.method, i.to_string());
            let mut chain = route.middleware.clone();
            chain.push(route.handler.clone());
            chains.push(chain);
        }
        (trie, chains)
    }

    /// The registered pattern of each route, in registration order -- the
    /// same order [`build()`](#method.build)'s chains are returned in, so
    /// `route_patterns()[i]` is the pattern behind `chains[i]`.
    ///
    pub fn route_patterns(&self) -> Vec<String> {
        self.routes.iter().map(|r| r.pattern.clone()).collect()
    }

    /// Merge `other`'s routes into this app, offsetting nothing -- callers
    /// merging several plugins' `App`s together should do so before calling
    /// [`build()`](#method.build), since route ids are assigned at build
    /// time from final position.
    ///
    pub fn merge(&mut self, other: App) {
        for route in other.routes {
            self.routes.push(route);
        }
    }

    /// The URL registered under `name` via
    /// [`RouteBuilder::name()`](struct.RouteBuilder.html#method.name), with
    /// `:param` placeholders substituted from `params` in order of
    /// appearance.
    ///
    pub fn url_for(&self, name: &str, params: &[&str]) -> Option<String> {
        let idx = *self.named.get(name)?;
        let mut params = params.iter();
        let mut out = String::new();
        for seg in self.routes[idx].pattern.split('/').filter(|s| !s.is_empty()) {
            out.push('/');
            if seg.starts_with(':') {
                out.push_str(params.next().copied().unwrap_or(""));
            } else {
                out.push_str(seg);
            }
        }
        Some(if out.is_empty() { "/".to_string() } else { out })
    }
}

/// Returned by each of `App`'s/`RouterGroup`'s verb methods so the route can
/// be named in a fluent call: `app.get("/x", h).name("x_show")`.
///
pub struct RouteBuilder<'a> {
    app: &'a mut App,
    idx: usize,
}

impl<'a> RouteBuilder<'a> {
    /// Register this route's pattern under `name` for later
    /// [`App::url_for()`](struct.App.html#method.url_for) lookups.
    ///
    pub fn name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.app.routes[self.idx].name = Some(name.clone());
        self.app.named.insert(name, self.idx);
        self
    }
}

/// A prefixed, middleware-scoped view onto an [`App`](struct.App.html).
/// Nested groups compose their prefixes with
/// [`join()`](../path/fn.join.html) and inherit their parent's middleware
/// ahead of their own.
///
pub struct RouterGroup<'a> {
    app: &'a mut App,
    prefix: String,
    middleware: Vec<Handler>,
}

impl<'a> RouterGroup<'a> {
    pub fn use_middleware(mut self, handler: Handler) -> Self {
        self.middleware.push(handler);
        self
    }

    pub fn group<'b>(&'b mut self, prefix: &str) -> RouterGroup<'b> {
        RouterGroup {
            app: self.app,
            prefix: join(&self.prefix, &slash(prefix)),
            middleware: self.middleware.clone(),
        }
    }

    pub fn get(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Get, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Post, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Put, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Delete, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Patch, handler)
    }

    pub fn any(&mut self, pattern: &str, handler: Handler) -> RouteBuilder<'_> {
        self.add(pattern, Method::Any, handler)
    }

    fn add(&mut self, pattern: &str, method: Method, handler: Handler) -> RouteBuilder<'_> {
        let full_pattern = join(&self.prefix, &slash(pattern));
        let middleware = self.middleware.clone();
        self.app.routes.push(Route {
            pattern: full_pattern,
            method,
            middleware,
            handler,
            name: None,
        });
        let idx = self.app.routes.len() - 1;
        RouteBuilder { app: self.app, idx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestData;
    use crate::session::{MemorySessionStore, SessionIf};
    use std::sync::{Arc, Mutex};

    fn noop() -> Handler {
        Arc::new(|c: &mut Context| c.next())
    }

    #[test]
    fn group_prefix_composes_with_nesting() {
        let mut app = App::new();
        {
            let mut admin = app.group("/admin");
            let mut info = admin.group("/info");
            info.get("/:table", noop());
        }
        let (trie, _chains) = app.build();
        assert!(trie
            .find_path("/admin/info/users", Method::Get)
            .is_some());
    }

    #[test]
    fn middleware_runs_before_handler_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut app = App::new();
        let l1 = log.clone();
        app.use_middleware(Arc::new(move |c: &mut Context| {
            l1.lock().unwrap().push("mw");
            c.next();
        }));
        let l2 = log.clone();
        app.get(
            "/x",
            Arc::new(move |_c: &mut Context| {
                l2.lock().unwrap().push("handler");
            }),
        );
        let (trie, chains) = app.build();
        let matched = trie.find_path("/x", Method::Get).unwrap();
        let chain = chains[matched.id.parse::<usize>().unwrap()].clone();
        let session = SessionIf::new(Arc::new(MemorySessionStore::new()));
        let mut ctx = Context::new(RequestData::default(), session, chain);
        ctx.run().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["mw", "handler"]);
    }

    #[test]
    fn group_inherits_app_middleware() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut app = App::new();
        let l1 = log.clone();
        app.use_middleware(Arc::new(move |c: &mut Context| {
            l1.lock().unwrap().push("mw");
            c.next();
        }));
        let l2 = log.clone();
        {
            let mut group = app.group("/admin");
            group.get(
                "/x",
                Arc::new(move |_c: &mut Context| {
                    l2.lock().unwrap().push("handler");
                }),
            );
        }
        let (trie, chains) = app.build();
        let matched = trie.find_path("/admin/x", Method::Get).unwrap();
        let chain = chains[matched.id.parse::<usize>().unwrap()].clone();
        let session = SessionIf::new(Arc::new(MemorySessionStore::new()));
        let mut ctx = Context::new(RequestData::default(), session, chain);
        ctx.run().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["mw", "handler"]);
    }

    #[test]
    fn url_for_substitutes_named_params() {
        let mut app = App::new();
        app.get("/admin/info/:table", noop()).name("info");
        assert_eq!(
            app.url_for("info", &["users"]),
            Some("/admin/info/users".to_string()),
        );
        assert_eq!(app.url_for("missing", &[]), None);
    }
}
