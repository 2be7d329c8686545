//! Framework-neutral request pipeline and table-generation engine.
//!
//! This crate is the part of a back-office admin-panel generator that does
//! not change when the host web framework, the SQL dialect, or the template
//! engine changes. It owns:
//!
//! - [`trie`]/[`path`]/[`app`]: the path matcher and the route/middleware
//!   builder a host adapter compiles into its own router.
//! - [`context`]: the framework-neutral request/response pair and handler
//!   chain every route runs through.
//! - [`adapter`]: the trait a per-host-framework crate (e.g.
//!   `panelforge-actix`) implements to translate its native request/response
//!   types to and from [`context::RequestData`]/[`context::ResponseData`].
//! - [`engine`]: the process-wide boot sequence that turns configuration,
//!   plugins and generators into a compiled [`engine::Router`].
//! - [`table`]: the declarative list/form/detail model generated CRUD
//!   controllers consume.
//! - [`admin`]: the one plugin this crate ships, translating that model into
//!   the URL surface under a configured prefix.
//! - [`database`]/[`session`]/[`render`]: the minimal capability traits the
//!   core depends on without owning an implementation -- one reference
//!   implementation of each lives in a sibling crate (`panelforge-sqlite`,
//!   `panelforge-postgres`, `panelforge-handlebars`).
//!
pub mod adapter;
pub mod admin;
pub mod app;
pub mod config;
pub mod context;
pub mod database;
pub mod engine;
pub mod error;
pub mod flash;
pub mod generator;
pub mod path;
pub mod plugin;
pub mod render;
pub mod session;
pub mod table;
pub mod texts;
pub mod trie;

pub use adapter::Adapter;
pub use app::{App, Handler, RouterGroup};
pub use config::{Config, DatabaseConfig, StoreConfig};
pub use context::{Context, RequestData, ResponseData};
pub use database::{try_exec_sql, DatabaseIf, DbConn, DbType, DbValue, JsonField, NullConn};
pub use engine::{run_chain, Engine, Router};
pub use error::{
    DatabaseError, Error, Result, SQLSTATE_FOREIGN_KEY_VIOLATION, SQLSTATE_UNIQUE_VIOLATION,
};
pub use flash::{Flash, FlashData};
pub use generator::{Generator, GeneratorRegistry};
pub use path::{join, param_names, slash, string_to_arr, Method, Path};
pub use plugin::{Plugin, Services};
pub use render::{render_minimal, TemplEng, TemplEngIf};
pub use session::{MemorySessionStore, SessionIf, SessionStore};
pub use table::{
    ActionButton, ActionMode, AjaxHandler, AjaxResult, Cell, ChooseResolver, Detail, DbFieldType,
    DisplayFn, EditAbleType, FieldFilter, FieldJoin, FilterForm, FilterOperator, FilterOption,
    Form, FormField, FormType, GetDataFn, Info, InfoField, Layout, OnChoose, OptionInitFn, Params,
    PostFilterFn, Row, SelectBox, SortDir, TabGroup, Table, Where,
};
pub use texts::{find_params, get_text, initialize as init_texts};
