//! The plugin contract: a unit that, given the services the host wired in,
//! builds its own `App` of routes and hands back the generators it
//! contributes. `panelforge_core::admin` is the one plugin this crate ships;
//! any other plugin follows the same shape.
//!
use crate::app::App;
use crate::config::Config;
use crate::database::DatabaseIf;
use crate::generator::{Generator, GeneratorRegistry};
use crate::render::TemplEngIf;
use std::collections::HashMap;
use std::sync::Arc;

/// The capabilities an [`Engine`](../engine/struct.Engine.html) hands every
/// plugin at boot: named database connections, the active template engine
/// (if any), an authentication check, the resolved configuration, and the
/// generator registry (so a plugin's routes can resolve `Table`s by name
/// without owning a separate copy of the registry themselves).
///
/// Cheap to clone -- every field is already reference-counted or `Clone`
/// itself -- so a plugin can stash its own copy rather than borrow one for
/// its whole lifetime.
///
#[derive(Clone)]
pub struct Services {
    databases: HashMap<String, DatabaseIf>,
    template: Option<TemplEngIf>,
    authenticate: Arc<dyn Fn(&str, &str) -> bool + Send + Sync>,
    config: Arc<Config>,
    generators: GeneratorRegistry,
}

impl Services {
    pub fn new(
        databases: HashMap<String, DatabaseIf>,
        template: Option<TemplEngIf>,
        authenticate: Arc<dyn Fn(&str, &str) -> bool + Send + Sync>,
        config: Arc<Config>,
        generators: GeneratorRegistry,
    ) -> Self {
        Self { databases, template, authenticate, config, generators }
    }

    /// The generator registered under `name` -- see [`Engine::add_generator()`
    /// ](../engine/struct.Engine.html#method.add_generator).
    ///
    pub fn generator(&self, name: &str) -> Option<&Generator> {
        self.generators.get(name)
    }

    /// The connection registered under `name` in [`Config::databases`
    /// ](../config/struct.Config.html#structfield.databases).
    ///
    pub fn database(&self, name: &str) -> Option<DatabaseIf> {
        self.databases.get(name).cloned()
    }

    /// The connection registered under the empty string -- the default
    /// database most single-database deployments use exclusively.
    ///
    pub fn default_database(&self) -> Option<DatabaseIf> {
        self.database("").or_else(|| self.databases.values().next().cloned())
    }

    pub fn template(&self) -> Option<&TemplEngIf> {
        self.template.as_ref()
    }

    /// Check a username/password pair. The core performs no hashing or
    /// comparison itself -- this delegates entirely to whatever the host
    /// wired in via `Engine::new()`, typically backed by `bcrypt` or
    /// similar against a users table the host owns.
    ///
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        (self.authenticate)(username, password)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// A self-contained unit of routes and generators, initialised once with the
/// [`Services`](struct.Services.html) an [`Engine`](../engine/struct.Engine.html)
/// assembled at boot.
///
pub trait Plugin: Send + Sync {
    /// A short, stable identifier, e.g. `"admin"`.
    ///
    fn name(&self) -> &str;

    /// Build this plugin's routes against `services` and return the `App`
    /// fragment to be merged into the engine's route table.
    ///
    fn init_plugin(&mut self, services: &Services) -> Result<App, crate::Error>;
}
