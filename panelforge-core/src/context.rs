//! `Context` carries one request through its handler chain: the inbound
//! request data, the response being built up, a bag of arbitrary
//! handler-to-handler values, and a cursor driving `next()`/`abort()`.
//!
use crate::path::Method;
use crate::session::SessionIf;
use crate::{Error, Flash};
use std::any::Any;
use std::collections::HashMap;

/// The body of an inbound request, already decoded by the adapter.
///
#[derive(Clone, Debug, Default)]
pub struct RequestData {
    pub method: Method,
    pub path: String,
    pub route_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub form_params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RequestData {
    /// `route_params`, falling back to `query_params`, falling back to
    /// `form_params` -- the same precedence order the handler chain uses
    /// when a handler asks for "the" value of a parameter without caring
    /// which part of the request it came from.
    ///
    pub fn param(&self, name: &str) -> Option<&str> {
        self.route_params
            .get(name)
            .or_else(|| self.query_params.get(name))
            .or_else(|| self.form_params.get(name))
            .map(|s| s.as_str())
    }
}

/// The response being assembled by the handler chain. The adapter reads this
/// back out once the chain completes or aborts.
///
#[derive(Clone, Debug)]
pub struct ResponseData {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Default for ResponseData {
    fn default() -> Self {
        Self { status: 200, headers: HashMap::new(), body: Vec::new() }
    }
}

impl ResponseData {
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }
}

/// One request's state as it moves through a handler chain.
///
/// A handler receives `&mut Context` and must call
/// [`next()`](#method.next) to invoke the remainder of the chain, or
/// [`abort()`](#method.abort) to stop it early (e.g. after writing an error
/// response). A handler that does neither silently truncates the chain --
/// matching the common `Context.Next()` convention rather than treating
/// "fell off the end" as an error.
///
pub struct Context {
    pub request: RequestData,
    pub response: ResponseData,
    pub session: SessionIf,
    values: HashMap<String, Box<dyn Any + Send>>,
    chain: Vec<std::sync::Arc<dyn Fn(&mut Context) + Send + Sync>>,
    cursor: usize,
    aborted: bool,
    error: Option<Error>,
}

impl Context {
    pub fn new(
        request: RequestData,
        session: SessionIf,
        chain: Vec<std::sync::Arc<dyn Fn(&mut Context) + Send + Sync>>,
    ) -> Self {
        Self {
            request,
            response: ResponseData::default(),
            session,
            values: HashMap::new(),
            chain,
            cursor: 0,
            aborted: false,
            error: None,
        }
    }

    /// Run the chain from the beginning. Returns the error, if any, left by
    /// [`set_error()`](#method.set_error).
    ///
    pub fn run(&mut self) -> Result<(), Error> {
        self.next();
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Invoke the next handler in the chain, if any and if the chain has not
    /// been [aborted](#method.abort). Idempotent once the chain is
    /// exhausted or aborted -- calling `next()` again is a no-op, so a
    /// handler that calls `next()` more than once by mistake does not
    /// re-run the remainder of the chain.
    ///
    pub fn next(&mut self) {
        if self.aborted {
            return;
        }
        if self.cursor >= self.chain.len() {
            return;
        }
        let handler = self.chain[self.cursor].clone();
        self.cursor += 1;
        handler(self);
    }

    /// Stop the chain: no later handler, and no remaining call to
    /// [`next()`](#method.next) from a handler still on the stack, will run.
    ///
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Record an error to be returned by [`run()`](#method.run) and abort the
    /// chain. Typically followed by the handler writing an error response
    /// itself, since `run()`'s caller (the adapter) only sees the error, not
    /// this context's body.
    ///
    pub fn set_error(&mut self, error: Error) {
        self.error = Some(error);
        self.abort();
    }

    /// Stash `value` under `key` for later handlers (or the adapter) to
    /// retrieve with [`get::<T>()`](#method.get).
    ///
    pub fn set<T: Send + 'static>(&mut self, key: &str, value: T) {
        self.values.insert(key.to_string(), Box::new(value));
    }

    /// Retrieve a value stashed with [`set()`](#method.set). Returns `None`
    /// if absent or if it was stored under a different type.
    ///
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// A [`Flash`](../flash/struct.Flash.html) bound to this context's
    /// session.
    ///
    pub fn flash(&self) -> Flash {
        Flash::new(self.session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use std::sync::{Arc, Mutex};

    fn ctx(chain: Vec<std::sync::Arc<dyn Fn(&mut Context) + Send + Sync>>) -> Context {
        Context::new(
            RequestData::default(),
            SessionIf::new(Arc::new(MemorySessionStore::new())),
            chain,
        )
    }

    #[test]
    fn chain_runs_in_order_when_each_calls_next() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = log.clone();
        let b = log.clone();
        let mut c = ctx(vec![
            Arc::new(move |c: &mut Context| {
                a.lock().unwrap().push(1);
                c.next();
            }),
            Arc::new(move |_c: &mut Context| {
                b.lock().unwrap().push(2);
            }),
        ]);
        c.run().unwrap();
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn handler_that_skips_next_truncates_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let b = log.clone();
        let mut c = ctx(vec![
            Arc::new(move |_c: &mut Context| {}),
            Arc::new(move |_c: &mut Context| {
                b.lock().unwrap().push("should not run");
            }),
        ]);
        c.run().unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn abort_stops_chain_and_later_next_is_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let b = log.clone();
        let mut c = ctx(vec![
            Arc::new(move |c: &mut Context| {
                c.abort();
                c.next();
                c.next();
            }),
            Arc::new(move |_c: &mut Context| {
                b.lock().unwrap().push("should not run");
            }),
        ]);
        c.run().unwrap();
        assert!(log.lock().unwrap().is_empty());
        assert!(c.is_aborted());
    }

    #[test]
    fn set_error_surfaces_from_run() {
        let mut c = ctx(vec![Arc::new(|c: &mut Context| {
            c.set_error(Error::not_found("thing/1"));
        })]);
        let err = c.run().unwrap_err();
        assert!(crate::is_error!(err, NotFound("thing/1")));
    }

    #[test]
    fn values_round_trip_by_type() {
        let mut c = ctx(vec![]);
        c.set("count", 3u32);
        assert_eq!(c.get::<u32>("count"), Some(&3));
        assert_eq!(c.get::<String>("count"), None);
    }
}
