//! The declarative entity model a [`Generator`](../generator/type.Generator.html)
//! produces and the built-in CRUD controllers in
//! [`admin`](../admin/index.html) consume: a [`Table`](struct.Table.html)'s
//! three sibling views -- [`Info`](struct.Info.html) (list), [`Form`
//! ](struct.Form.html) (create/edit) and [`Detail`](struct.Detail.html)
//! (read-only show) -- plus the identity metadata tying them to a database
//! table.
//!
//! Nothing here talks to a database directly except [`Info::get_data()`
//! ](struct.Info.html#method.get_data) and [`Detail::get_data()`
//! ](struct.Detail.html#method.get_data)'s default SQL path; a `GetDataFn`
//! on either view bypasses SQL entirely, which is also how tests in this
//! module exercise the filter/sort/paginate logic without a live connection.
//!
use crate::database::{DatabaseIf, DbType, DbValue};
use crate::Error;
use std::collections::HashMap;
use std::sync::Arc;

/// The closed set of database column types a field may declare, mirroring
/// [`DbType`](../database/enum.DbType.html) at the declarative level.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DbFieldType {
    Int,
    TinyInt,
    Int4,
    Integer,
    MediumInt,
    SmallInt,
    Numeric,
    SmallSerial,
    Serial,
    BigSerial,
    Money,
    BigInt,
    Text,
    LongText,
    MediumText,
    TinyText,
    Varchar,
    Datetime,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Year,
}

impl DbFieldType {
    fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::TinyInt
                | Self::Int4
                | Self::Integer
                | Self::MediumInt
                | Self::SmallInt
                | Self::Numeric
                | Self::SmallSerial
                | Self::Serial
                | Self::BigSerial
                | Self::Money
                | Self::BigInt
        )
    }

    fn is_large_text(self) -> bool {
        matches!(self, Self::LongText | Self::MediumText)
    }

    fn is_datetime(self) -> bool {
        matches!(
            self,
            Self::Datetime
                | Self::Date
                | Self::Time
                | Self::Timestamp
                | Self::TimestampTz
                | Self::Year
        )
    }

    /// The [`DbType`](../database/enum.DbType.html) a [`DatabaseIf::query()`
    /// ](../database/struct.DatabaseIf.html#method.query) call should use to
    /// fetch this column, nullability aside (callers needing the nullable
    /// variant pick it explicitly -- most generated columns are not null).
    ///
    pub fn query_type(self) -> DbType {
        if self.is_numeric() {
            DbType::Int
        } else {
            DbType::Text
        }
    }
}

/// Form control kinds a [`FormField`](struct.FormField.html) or in-list edit
/// control may render as. Names are fixed in the wire protocol between the
/// core and whatever front-end renders a [`Table`](struct.Table.html).
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormType {
    Default,
    Text,
    SelectSingle,
    Select,
    IconPicker,
    SelectBox,
    File,
    MultiFile,
    Password,
    RichText,
    Datetime,
    DatetimeRange,
    Radio,
    Checkbox,
    CheckboxStacked,
    CheckboxSingle,
    Email,
    Date,
    DateRange,
    Url,
    Ip,
    Color,
    Array,
    Currency,
    Rate,
    Number,
    Table,
    NumberRange,
    TextArea,
    Custom,
    Switch,
    Code,
    Slider,
}

impl FormType {
    /// The inference rule of this subsystem's §4.7: when a field is not
    /// given an explicit form type, infer one from the column name first,
    /// then the declared DB type, falling back to `Text`.
    ///
    /// The primary key column `id` always infers `Default` regardless of its
    /// DB type, since it is conventionally displayed but not edited.
    ///
    pub fn infer(column: &str, db_type: DbFieldType) -> Self {
        if column == "id" {
            return Self::Default;
        }
        let lower = column.to_ascii_lowercase();
        if lower.contains("password") {
            return Self::Password;
        }
        if lower == "ip" || lower.ends_with("_ip") {
            return Self::Ip;
        }
        if lower.contains("email") {
            return Self::Email;
        }
        if lower.contains("color") {
            return Self::Color;
        }
        if lower.contains("money") || matches!(db_type, DbFieldType::Money) {
            return Self::Currency;
        }
        if db_type.is_numeric() {
            return Self::Number;
        }
        if db_type.is_large_text() {
            return Self::RichText;
        }
        if db_type.is_datetime() {
            return Self::Datetime;
        }
        Self::Text
    }
}

/// Comparison used by a [`FieldFilter`](struct.FieldFilter.html) to turn a
/// submitted filter value into a WHERE predicate.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
    In,
    Between,
    Free,
}

impl FilterOperator {
    fn sql_op(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Like | Self::Free => "LIKE",
            Self::In => "IN",
            Self::Between => "BETWEEN",
        }
    }
}

/// Filter-form and form-section layout. A closed enum; names are fixed in
/// the wire protocol.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layout {
    Default,
    TwoCol,
    ThreeCol,
    FourCol,
    FiveCol,
    SixCol,
    Flow,
    Tab,
    Filter,
}

impl Default for Layout {
    fn default() -> Self {
        Self::Default
    }
}

/// One labelled value offered by a select/radio/checkbox control or a
/// [`SelectBox`](struct.SelectBox.html) bulk filter.
///
#[derive(Clone, Debug)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into() }
    }
}

/// `FieldJoin(join_column, foreign_column, foreign_table)`: the current
/// field is populated from `foreign_table.foreign_column` via
/// `... ON <table>.join_column = foreign_table.foreign_column`.
///
#[derive(Clone, Debug)]
pub struct FieldJoin {
    pub join_column: String,
    pub foreign_column: String,
    pub foreign_table: String,
}

/// In-list editing kinds a [`InfoField::editable`](struct.InfoField.html#structfield.editable)
/// column may render as.
///
#[derive(Clone, Debug)]
pub enum EditAbleType {
    Text,
    TextArea,
    Switch,
    Datetime,
    Select(Vec<FilterOption>),
}

/// A declared filter on a list field: the comparison plus the control the
/// filter form renders for it.
///
#[derive(Clone)]
pub struct FieldFilter {
    pub operator: FilterOperator,
    pub form_type: FormType,
    pub options: Vec<FilterOption>,
}

impl FieldFilter {
    pub fn new(operator: FilterOperator) -> Self {
        Self { operator, form_type: FormType::Text, options: Vec::new() }
    }

    pub fn form_type(mut self, form_type: FormType) -> Self {
        self.form_type = form_type;
        self
    }

    pub fn options(mut self, options: Vec<FilterOption>) -> Self {
        self.options = options;
        self
    }
}

/// A rendered list/detail cell: a display string plus whether it is already
/// markup (produced by a [`FieldDisplay`](type.DisplayFn.html) transform)
/// rather than plain text requiring escaping by the renderer.
///
#[derive(Clone, Debug, Default)]
pub struct Cell {
    pub text: String,
    pub html: bool,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), html: false }
    }

    pub fn html(markup: impl Into<String>) -> Self {
        Self { text: markup.into(), html: true }
    }
}

/// One fetched row, keyed by the field's column name (or label, for joined
/// fields with no column of their own in the primary table).
///
pub type Row = HashMap<String, Cell>;

/// Runs over a raw [`DbValue`](../database/enum.DbValue.html) after fetch to
/// produce the display [`Cell`](struct.Cell.html). Receives the whole row so
/// a display transform can reference sibling columns (e.g. render a status
/// code using a label looked up from another field).
///
pub type DisplayFn = Arc<dyn Fn(&DbValue, &HashMap<String, DbValue>) -> Cell + Send + Sync>;

fn default_display(value: &DbValue, _row: &HashMap<String, DbValue>) -> Cell {
    match value.to_option() {
        Some(v) => Cell::text(v.to_string()),
        None => Cell::text(""),
    }
}

/// A field as it appears in [`Info`](struct.Info.html) (the list view) or
/// [`Detail`](struct.Detail.html) (the read-only show view).
///
#[derive(Clone)]
pub struct InfoField {
    pub label: String,
    pub column: String,
    pub db_type: DbFieldType,
    pub sortable: bool,
    pub hidden: bool,
    pub editable: Option<EditAbleType>,
    pub filterable: Option<FieldFilter>,
    pub join: Option<FieldJoin>,
    pub display: DisplayFn,
}

impl InfoField {
    pub fn new(label: impl Into<String>, column: impl Into<String>, db_type: DbFieldType) -> Self {
        Self {
            label: label.into(),
            column: column.into(),
            db_type,
            sortable: false,
            hidden: false,
            editable: None,
            filterable: None,
            join: None,
            display: Arc::new(default_display),
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn editable(mut self, kind: EditAbleType) -> Self {
        self.editable = Some(kind);
        self
    }

    pub fn filterable(mut self, filter: FieldFilter) -> Self {
        self.filterable = Some(filter);
        self
    }

    pub fn join(mut self, join: FieldJoin) -> Self {
        self.join = Some(join);
        self
    }

    pub fn display(mut self, display: DisplayFn) -> Self {
        self.display = display;
        self
    }

    /// The fully qualified source column: `foreign_table.foreign_column` for
    /// a joined field, `column` otherwise.
    ///
    pub fn source_column(&self) -> String {
        match &self.join {
            Some(j) => format!("{}.{}", j.foreign_table, j.foreign_column),
            None => self.column.clone(),
        }
    }
}

/// The parameter bundle a request contributes to [`Info::get_data()`
/// ](struct.Info.html#method.get_data) / [`Detail::get_data()`
/// ](struct.Detail.html#method.get_data): submitted filter values keyed by
/// column, an optional sort, and pagination.
///
#[derive(Clone, Debug, Default)]
pub struct Params {
    pub filters: HashMap<String, String>,
    pub sort: Option<(String, SortDir)>,
    pub limit: usize,
    pub offset: usize,
}

impl Params {
    pub fn new() -> Self {
        Self { limit: 10, ..Default::default() }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A baseline predicate every query built by [`Info::get_data()`
/// ](struct.Info.html#method.get_data) carries regardless of submitted
/// filters, e.g. `Where::new("gender", FilterOperator::Eq, DbValue::Int(0))`.
///
#[derive(Clone)]
pub struct Where {
    pub column: String,
    pub operator: FilterOperator,
    pub value: DbValue,
}

impl Where {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: impl Into<DbValue>) -> Self {
        Self { column: column.into(), operator, value: value.into() }
    }
}

/// `Context → (rows, total_count)`, replacing the default SQL path entirely.
/// Must respect the same [`Params`](struct.Params.html) the SQL path would.
///
pub type GetDataFn = Arc<dyn Fn(&Params) -> Result<(Vec<Row>, usize), Error> + Send + Sync>;

/// `Context → AjaxResult`, the handler an [`ActionMode::Ajax`
/// ](enum.ActionMode.html#variant.Ajax) or [`ActionMode::PopUp`
/// ](enum.ActionMode.html#variant.PopUp) button dispatches to.
///
pub type AjaxHandler =
    Arc<dyn Fn(&mut crate::context::Context) -> AjaxResult + Send + Sync>;

/// The result of dispatching an [`ActionMode::Ajax`](enum.ActionMode.html#variant.Ajax)
/// or [`ActionMode::PopUp`](enum.ActionMode.html#variant.PopUp) button.
///
#[derive(Clone, Debug)]
pub struct AjaxResult {
    pub success: bool,
    pub message: String,
    pub data: serde_json::Value,
}

/// The three invocation modes an [`ActionButton`](struct.ActionButton.html)
/// supports.
///
#[derive(Clone)]
pub enum ActionMode {
    /// The front-end navigates to `url`.
    Jump { url: String },
    /// Like `Jump`, but opened in a new tab, labelled `text`.
    JumpInNewTab { url: String, text: String },
    /// The front-end XHRs `url`; the server dispatches to `handler` and
    /// renders the result into a status banner.
    Ajax { url: String, handler: AjaxHandler },
    /// Like `Ajax`, but the result is rendered into a modal titled `title`.
    PopUp { url: String, title: String, handler: AjaxHandler },
}

/// A button above the list (global) or on each row (row action), with an
/// icon and arbitrary extra payload passed through to the front-end control.
///
#[derive(Clone)]
pub struct ActionButton {
    pub icon: String,
    pub mode: ActionMode,
    pub extra: HashMap<String, String>,
}

impl ActionButton {
    pub fn jump(icon: impl Into<String>, url: impl Into<String>) -> Self {
        Self { icon: icon.into(), mode: ActionMode::Jump { url: url.into() }, extra: HashMap::new() }
    }

    pub fn ajax(icon: impl Into<String>, url: impl Into<String>, handler: AjaxHandler) -> Self {
        Self {
            icon: icon.into(),
            mode: ActionMode::Ajax { url: url.into(), handler },
            extra: HashMap::new(),
        }
    }

    pub fn pop_up(
        icon: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        handler: AjaxHandler,
    ) -> Self {
        Self {
            icon: icon.into(),
            mode: ActionMode::PopUp { url: url.into(), title: title.into(), handler },
            extra: HashMap::new(),
        }
    }
}

/// A bulk filter bound to a field: a fixed option set plus (usually) a
/// [`FilterOperator::Eq`](enum.FilterOperator.html#variant.Eq) predicate on
/// the selected value.
///
#[derive(Clone)]
pub struct SelectBox {
    pub column: String,
    pub options: Vec<FilterOption>,
}

/// The descriptor [`Info::get_data()`](struct.Info.html#method.get_data)'s
/// caller renders as the filter form.
///
#[derive(Clone, Debug, Default)]
pub struct FilterForm {
    pub layout: Layout,
    pub fields: Vec<(String, FormType, Vec<FilterOption>)>,
}

/// The list-view configuration. Produces rows, a total count, a filter-form
/// descriptor, and the action buttons, from a [`Params`](struct.Params.html)
/// bundle -- see [`get_data()`](#method.get_data).
///
pub struct Info {
    pub table: String,
    pub title: String,
    pub description: String,
    pub fields: Vec<InfoField>,
    pub wheres: Vec<Where>,
    pub layout: Layout,
    pub get_data_fn: Option<GetDataFn>,
    pub row_buttons: Vec<ActionButton>,
    pub global_buttons: Vec<ActionButton>,
    pub select_boxes: Vec<SelectBox>,
}

impl Info {
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            title: table.clone(),
            description: String::new(),
            table,
            fields: Vec::new(),
            wheres: Vec::new(),
            layout: Layout::default(),
            get_data_fn: None,
            row_buttons: Vec::new(),
            global_buttons: Vec::new(),
            select_boxes: Vec::new(),
        }
    }

    pub fn field(mut self, field: InfoField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn wheres(mut self, wheres: Vec<Where>) -> Self {
        self.wheres = wheres;
        self
    }

    pub fn get_data_fn(mut self, f: GetDataFn) -> Self {
        self.get_data_fn = Some(f);
        self
    }

    /// Fetch rows honouring `params`'s filters (only for fields declaring
    /// [`FieldFilter`](struct.FieldFilter.html)), sort (only for fields with
    /// [`sortable`](struct.InfoField.html#structfield.sortable) set) and
    /// pagination, AND-combined with the baseline [`wheres`
    /// ](#structfield.wheres). Defers entirely to [`get_data_fn`
    /// ](#structfield.get_data_fn) when present.
    ///
    pub fn get_data(
        &self,
        db: &DatabaseIf,
        params: &Params,
    ) -> Result<(Vec<Row>, usize), Error> {
        if let Some(f) = &self.get_data_fn {
            return f(params);
        }
        let (where_sql, values) = self.build_where(params);
        let select_cols: Vec<String> =
            self.fields.iter().map(|f| f.source_column()).collect();
        let sql = format!(
            "SELECT {} FROM {}{}{}{}",
            select_cols.join(", "),
            self.table,
            self.join_sql(),
            where_sql,
            self.order_and_limit_sql(params),
        );
        let types: Vec<DbType> =
            self.fields.iter().map(|f| f.db_type.query_type()).collect();
        let rows = db.query(&sql, &values, &types)?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM {}{}{}",
            self.table,
            self.join_sql(),
            where_sql,
        );
        let total = db
            .query(&count_sql, &values, &[DbType::Int])?
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .and_then(|v| i64::try_from(v).ok())
            .unwrap_or(0) as usize;

        let result_rows = rows
            .into_iter()
            .map(|raw| {
                let by_column: HashMap<String, DbValue> = self
                    .fields
                    .iter()
                    .zip(raw.iter())
                    .map(|(f, v)| (f.column.clone(), v.clone()))
                    .collect();
                self.fields
                    .iter()
                    .zip(raw.into_iter())
                    .map(|(field, value)| {
                        (field.column.clone(), (field.display)(&value, &by_column))
                    })
                    .collect::<Row>()
            })
            .collect();
        Ok((result_rows, total))
    }

    /// The filter-form descriptor for fields declaring [`FieldFilter`
    /// ](struct.FieldFilter.html), laid out per [`layout`](#structfield.layout).
    ///
    pub fn filter_form(&self) -> FilterForm {
        FilterForm {
            layout: self.layout,
            fields: self
                .fields
                .iter()
                .filter_map(|f| {
                    f.filterable.as_ref().map(|filter| {
                        (f.column.clone(), filter.form_type, filter.options.clone())
                    })
                })
                .collect(),
        }
    }

    fn join_sql(&self) -> String {
        self.fields
            .iter()
            .filter_map(|f| f.join.as_ref())
            .map(|j| {
                format!(
                    " LEFT JOIN {} ON {}.{} = {}.{}",
                    j.foreign_table, self.table, j.join_column, j.foreign_table, j.foreign_column,
                )
            })
            .collect()
    }

    fn build_where(&self, params: &Params) -> (String, Vec<DbValue>) {
        let mut predicates = Vec::new();
        let mut values = Vec::new();
        let mut n = 0usize;
        let mut next_placeholder = || {
            n += 1;
            format!("${}", n)
        };

        for w in &self.wheres {
            predicates.push(format!("{} {} {}", w.column, w.operator.sql_op(), next_placeholder()));
            values.push(w.value.clone());
        }

        for field in &self.fields {
            let Some(filter) = &field.filterable else { continue };
            let Some(raw) = params.filters.get(&field.column) else { continue };
            if raw.is_empty() {
                continue;
            }
            match filter.operator {
                FilterOperator::Like | FilterOperator::Free => {
                    predicates
                        .push(format!("{} LIKE {}", field.column, next_placeholder()));
                    values.push(DbValue::Text(format!("%{}%", raw)));
                }
                FilterOperator::In => {
                    let parts: Vec<&str> = raw.split(',').collect();
                    let placeholders: Vec<String> =
                        parts.iter().map(|_| next_placeholder()).collect();
                    predicates.push(format!(
                        "{} IN ({})",
                        field.column,
                        placeholders.join(", "),
                    ));
                    values.extend(parts.into_iter().map(|p| DbValue::Text(p.to_string())));
                }
                FilterOperator::Between => {
                    let mut parts = raw.splitn(2, ',');
                    let lo = parts.next().unwrap_or("").to_string();
                    let hi = parts.next().unwrap_or("").to_string();
                    predicates.push(format!(
                        "{} BETWEEN {} AND {}",
                        field.column,
                        next_placeholder(),
                        next_placeholder(),
                    ));
                    values.push(DbValue::Text(lo));
                    values.push(DbValue::Text(hi));
                }
                op => {
                    predicates.push(format!(
                        "{} {} {}",
                        field.column,
                        op.sql_op(),
                        next_placeholder(),
                    ));
                    values.push(DbValue::Text(raw.clone()));
                }
            }
        }

        if predicates.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", predicates.join(" AND ")), values)
        }
    }

    fn order_and_limit_sql(&self, params: &Params) -> String {
        let mut sql = String::new();
        if let Some((col, dir)) = &params.sort {
            if self.fields.iter().any(|f| &f.column == col && f.sortable) {
                sql += &format!(" ORDER BY {} {}", col, dir.sql());
            }
        }
        if params.limit > 0 {
            sql += &format!(" LIMIT {} OFFSET {}", params.limit, params.offset);
        }
        sql
    }
}

/// `onChoose`: whenever this field's value changes, the front-end asks
/// `url` (dispatched to `resolver`) for a fresh option set for
/// `target_field`.
///
#[derive(Clone)]
pub struct OnChoose {
    pub target_field: String,
    pub url: String,
    pub resolver: ChooseResolver,
}

/// `Context → (ok, message, options)`, the handler behind [`OnChoose`
/// ](struct.OnChoose.html).
///
pub type ChooseResolver = Arc<
    dyn Fn(&mut crate::context::Context) -> Result<(bool, String, Vec<FilterOption>), Error>
        + Send
        + Sync,
>;

/// Seeds an edit-mode select's initial option set from the field's current
/// value.
///
pub type OptionInitFn = Arc<dyn Fn(&DbValue) -> Vec<FilterOption> + Send + Sync>;

/// Server-side transform applied to a submitted value before it is written.
///
pub type PostFilterFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A field as it appears in [`Form`](struct.Form.html) (create/edit).
///
#[derive(Clone)]
pub struct FormField {
    pub label: String,
    pub column: String,
    pub db_type: DbFieldType,
    pub form_type: FormType,
    pub default_value: Option<String>,
    pub help: Option<String>,
    pub options: Vec<FilterOption>,
    pub extra_options: HashMap<String, String>,
    pub display: Option<DisplayFn>,
    pub post_filter: Option<PostFilterFn>,
    pub visible_on_create: bool,
    pub visible_on_update: bool,
    pub editable_on_create: bool,
    pub editable_on_update: bool,
    pub on_choose: Option<OnChoose>,
    pub option_init: Option<OptionInitFn>,
}

impl FormField {
    /// Builds with the inferred [`FormType`](enum.FormType.html) (see
    /// [`FormType::infer()`](enum.FormType.html#method.infer)).
    ///
    pub fn new(label: impl Into<String>, column: impl Into<String>, db_type: DbFieldType) -> Self {
        let column = column.into();
        let form_type = FormType::infer(&column, db_type);
        Self {
            label: label.into(),
            column,
            db_type,
            form_type,
            default_value: None,
            help: None,
            options: Vec::new(),
            extra_options: HashMap::new(),
            display: None,
            post_filter: None,
            visible_on_create: true,
            visible_on_update: true,
            editable_on_create: true,
            editable_on_update: true,
            on_choose: None,
            option_init: None,
        }
    }

    /// The common shape for a primary key field: shown, but not editable, on
    /// update, and not shown at all on create.
    ///
    pub fn primary_key(label: impl Into<String>, column: impl Into<String>) -> Self {
        let mut field = Self::new(label, column, DbFieldType::Int);
        field.visible_on_create = false;
        field.editable_on_update = false;
        field
    }

    pub fn form_type(mut self, form_type: FormType) -> Self {
        self.form_type = form_type;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn options(mut self, options: Vec<FilterOption>) -> Self {
        self.options = options;
        self
    }

    pub fn on_choose(mut self, on_choose: OnChoose) -> Self {
        self.on_choose = Some(on_choose);
        self
    }

    pub fn option_init(mut self, f: OptionInitFn) -> Self {
        self.option_init = Some(f);
        self
    }

    pub fn post_filter(mut self, f: PostFilterFn) -> Self {
        self.post_filter = Some(f);
        self
    }

    /// Whether this field should appear on the create form (`create`) or
    /// edit form (`!create`).
    ///
    pub fn visible(&self, create: bool) -> bool {
        if create {
            self.visible_on_create
        } else {
            self.visible_on_update
        }
    }

    /// Whether this field accepts input on the create form (`create`) or
    /// edit form (`!create`) -- distinct from [`visible()`](#method.visible):
    /// a field can be shown read-only.
    ///
    pub fn editable(&self, create: bool) -> bool {
        if create {
            self.editable_on_create
        } else {
            self.editable_on_update
        }
    }
}

/// A named group of fields under a tab header, used when [`Form::layout`
/// ](struct.Form.html#structfield.layout) is [`Layout::Tab`
/// ](enum.Layout.html#variant.Tab).
///
#[derive(Clone, Debug)]
pub struct TabGroup {
    pub header: String,
    pub field_names: Vec<String>,
}

/// The create/edit form configuration.
///
pub struct Form {
    pub table: String,
    pub title: String,
    pub description: String,
    pub fields: Vec<FormField>,
    pub tab_groups: Vec<TabGroup>,
    pub layout: Layout,
}

impl Form {
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            title: table.clone(),
            description: String::new(),
            table,
            fields: Vec::new(),
            tab_groups: Vec::new(),
            layout: Layout::default(),
        }
    }

    pub fn field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn tab_group(mut self, header: impl Into<String>, field_names: Vec<String>) -> Self {
        self.tab_groups.push(TabGroup { header: header.into(), field_names });
        self
    }

    /// Validate `submitted` against declared fields, returning a mapping of
    /// `column -> error message` for anything missing or visible-but-absent.
    /// Validation of value *shape* (beyond presence) is the caller's concern
    /// -- this only enforces the presence contract the field declarations
    /// describe.
    ///
    pub fn validate(
        &self,
        submitted: &HashMap<String, String>,
        create: bool,
    ) -> HashMap<String, String> {
        let mut errors = HashMap::new();
        for field in &self.fields {
            if !field.visible(create) || !field.editable(create) {
                continue;
            }
            if field.form_type == FormType::Default {
                continue;
            }
            if !submitted.contains_key(&field.column)
                && field.default_value.is_none()
            {
                errors.insert(
                    field.column.clone(),
                    format!("{} is required", field.label),
                );
            }
        }
        errors
    }
}

/// The read-only show view: like [`Info`](struct.Info.html) but returns a
/// single record, either via [`get_data_fn`](#structfield.get_data_fn) or a
/// primary-key lookup.
///
pub struct Detail {
    pub table: String,
    pub title: String,
    pub description: String,
    pub fields: Vec<InfoField>,
    pub get_data_fn: Option<GetDataFn>,
}

impl Detail {
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            title: table.clone(),
            description: String::new(),
            table,
            fields: Vec::new(),
            get_data_fn: None,
        }
    }

    pub fn field(mut self, field: InfoField) -> Self {
        self.fields.push(field);
        self
    }

    /// Fetch the single record matching `primary_key = pk`, or defer to
    /// [`get_data_fn`](#structfield.get_data_fn) when present (in which case
    /// `pk` is passed through `params.filters["id"]`).
    ///
    pub fn get_data(
        &self,
        db: &DatabaseIf,
        primary_key: &str,
        pk: &str,
    ) -> Result<Option<Row>, Error> {
        if let Some(f) = &self.get_data_fn {
            let mut params = Params::new();
            params.limit = 0;
            params.filters.insert(primary_key.to_string(), pk.to_string());
            return Ok(f(&params)?.0.into_iter().next());
        }
        let select_cols: Vec<String> =
            self.fields.iter().map(|f| f.source_column()).collect();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            select_cols.join(", "),
            self.table,
            primary_key,
        );
        let types: Vec<DbType> =
            self.fields.iter().map(|f| f.db_type.query_type()).collect();
        let rows = db.query(&sql, &[DbValue::Text(pk.to_string())], &types)?;
        Ok(rows.into_iter().next().map(|raw| {
            let by_column: HashMap<String, DbValue> = self
                .fields
                .iter()
                .zip(raw.iter())
                .map(|(f, v)| (f.column.clone(), v.clone()))
                .collect();
            self.fields
                .iter()
                .zip(raw.into_iter())
                .map(|(field, value)| {
                    (field.column.clone(), (field.display)(&value, &by_column))
                })
                .collect()
        }))
    }
}

/// The identity metadata plus the three sibling views a [`Generator`
/// ](../generator/type.Generator.html) produces.
///
pub struct Table {
    pub name: String,
    pub driver: String,
    pub connection: String,
    pub primary_key: (String, DbFieldType),
    pub can_add: bool,
    pub editable: bool,
    pub deletable: bool,
    pub exportable: bool,
    pub info: Info,
    pub form: Form,
    pub detail: Detail,
}

impl Table {
    pub fn new(name: impl Into<String>, connection: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            info: Info::new(&name),
            form: Form::new(&name),
            detail: Detail::new(&name),
            driver: String::new(),
            connection: connection.into(),
            primary_key: ("id".to_string(), DbFieldType::Int),
            can_add: true,
            editable: true,
            deletable: true,
            exportable: true,
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_type_inference_follows_column_name_then_db_type() {
        assert!(matches!(FormType::infer("id", DbFieldType::Int), FormType::Default));
        assert!(matches!(
            FormType::infer("password", DbFieldType::Varchar),
            FormType::Password
        ));
        assert!(matches!(FormType::infer("email", DbFieldType::Varchar), FormType::Email));
        assert!(matches!(FormType::infer("price", DbFieldType::Money), FormType::Currency));
        assert!(matches!(FormType::infer("age", DbFieldType::Int), FormType::Number));
        assert!(matches!(FormType::infer("bio", DbFieldType::LongText), FormType::RichText));
        assert!(matches!(
            FormType::infer("created_at", DbFieldType::Datetime),
            FormType::Datetime
        ));
        assert!(matches!(FormType::infer("name", DbFieldType::Varchar), FormType::Text));
    }

    #[test]
    fn form_type_inference_is_deterministic() {
        for _ in 0..5 {
            assert!(matches!(FormType::infer("email", DbFieldType::Varchar), FormType::Email));
        }
    }

    #[test]
    fn info_get_data_fn_bypasses_sql_and_respects_params() {
        let info = Info::new("widgets").get_data_fn(Arc::new(|params: &Params| {
            let mut row = Row::new();
            row.insert("id".to_string(), Cell::text("1"));
            if params.filters.get("city").map(|s| s.as_str()) == Some("guangz") {
                Ok((vec![row], 1))
            } else {
                Ok((vec![], 0))
            }
        }));
        let mut params = Params::new();
        params.filters.insert("city".to_string(), "guangz".to_string());
        let (rows, total) = info.get_data(&DatabaseIf::new(Arc::new(crate::database::NullConn)), &params).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn build_where_and_combines_baseline_and_submitted_filters() {
        let info = Info::new("people")
            .wheres(vec![Where::new("gender", FilterOperator::Eq, 0i64)])
            .field(
                InfoField::new("City", "city", DbFieldType::Varchar)
                    .filterable(FieldFilter::new(FilterOperator::Like)),
            );
        let mut params = Params::new();
        params.filters.insert("city".to_string(), "guangz".to_string());
        let (sql, values) = info.build_where(&params);
        assert_eq!(sql, " WHERE gender = $1 AND city LIKE $2");
        assert_eq!(values.len(), 2);
        assert!(matches!(&values[1], DbValue::Text(t) if t == "%guangz%"));
    }

    #[test]
    fn form_validate_flags_missing_required_fields() {
        let form = Form::new("people").field(FormField::new("Name", "name", DbFieldType::Varchar));
        let errors = form.validate(&HashMap::new(), true);
        assert!(errors.contains_key("name"));
        let mut submitted = HashMap::new();
        submitted.insert("name".to_string(), "Ann".to_string());
        assert!(form.validate(&submitted, true).is_empty());
    }

    #[test]
    fn primary_key_field_hidden_on_create_readonly_on_update() {
        let field = FormField::primary_key("ID", "id");
        assert!(!field.visible(true));
        assert!(field.visible(false));
        assert!(!field.editable(false));
    }
}
