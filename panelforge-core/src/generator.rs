//! Generators are the unit of extension a plugin registers: a name, plus a
//! function producing the [`Table`](../table/struct.Table.html) for that
//! name, evaluated fresh on every request that needs it rather than built
//! once at boot -- so a generator can, say, vary its field set by the
//! signed-in user's role.
//!
use crate::context::Context;
use crate::table::Table;
use std::collections::HashMap;
use std::sync::Arc;

/// `Context -> Table`, registered under a name in a [`GeneratorRegistry`
/// ](struct.GeneratorRegistry.html).
///
pub type Generator = Arc<dyn Fn(&Context) -> Table + Send + Sync>;

/// The name-keyed set of generators an [`Engine`](../engine/struct.Engine.html)
/// consults to build the CRUD routes for every registered table.
///
#[derive(Default, Clone)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Generator>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the generator for `name`.
    ///
    pub fn register(&mut self, name: impl Into<String>, generator: Generator) {
        self.generators.insert(name.into(), generator);
    }

    /// Register every entry of `generators` at once, as
    /// `Engine::add_generators()` does for a plugin supplying several tables.
    ///
    pub fn register_all(&mut self, generators: HashMap<String, Generator>) {
        self.generators.extend(generators);
    }

    pub fn get(&self, name: &str) -> Option<&Generator> {
        self.generators.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.generators.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestData;
    use crate::session::{MemorySessionStore, SessionIf};
    use crate::table::Table;

    fn ctx() -> Context {
        Context::new(
            RequestData::default(),
            SessionIf::new(Arc::new(MemorySessionStore::new())),
            Vec::new(),
        )
    }

    #[test]
    fn register_then_get_round_trips() {
        let mut registry = GeneratorRegistry::new();
        registry.register("widgets", Arc::new(|_c: &Context| Table::new("widgets", "default")));
        let generator = registry.get("widgets").unwrap();
        let table = generator(&ctx());
        assert_eq!(table.name, "widgets");
        assert!(registry.get("missing").is_none());
    }
}
