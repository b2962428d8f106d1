//! Fluent SELECT builder bound to an entity descriptor.
//!
//! One builder per call chain: accumulate columns, predicates and an
//! ordering clause, then [`get`](QueryBuilder::get) renders the statement,
//! executes it and materializes the rows. All values are bound as `$n`
//! parameters; placeholder indices are computed at build time.

use crate::collection::Collection;
use crate::database::Database;
use crate::error::{RecordError, RecordResult};
use crate::meta::ModelMeta;
use crate::model::{DELETED_AT, Model};
use crate::value::{Value, param_refs};

/// Comparison operator for a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    In,
}

impl Op {
    fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Like => "LIKE",
            Self::In => "IN",
        }
    }
}

/// Ordering direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Parse a direction case-insensitively; anything but `asc`/`desc` is
    /// an invalid argument.
    pub fn parse(raw: &str) -> RecordResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(RecordError::invalid_argument(format!(
                "invalid ordering direction: {raw}"
            ))),
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug)]
enum Operand {
    One(Value),
    Many(Vec<Value>),
}

#[derive(Clone, Debug)]
struct Predicate {
    column: String,
    op: Op,
    operand: Operand,
}

/// SELECT builder for one entity.
pub struct QueryBuilder<'a> {
    meta: &'static ModelMeta,
    db: &'a Database,
    columns: Vec<String>,
    predicates: Vec<Predicate>,
    order: (String, Direction),
    build_error: Option<String>,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(meta: &'static ModelMeta, db: &'a Database) -> Self {
        Self {
            meta,
            db,
            columns: Vec::new(),
            predicates: Vec::new(),
            order: (meta.primary_key.to_string(), Direction::Asc),
            build_error: None,
        }
    }

    // ==================== SELECT columns ====================

    /// Append output columns; repeated calls are additive. With no columns
    /// selected the statement renders `*`.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    // ==================== WHERE predicates ====================

    fn push(mut self, column: &str, op: Op, operand: Operand) -> Self {
        // NULL only combines with the operators that have an IS form.
        if let Operand::One(Value::Null) = operand {
            if op != Op::Eq && op != Op::Ne {
                self.build_error = Some(format!(
                    "NULL value requires = or <>, got {}",
                    op.sql()
                ));
                return self;
            }
        }
        self.predicates.push(Predicate {
            column: column.to_string(),
            op,
            operand,
        });
        self
    }

    /// Add a predicate: `column = value`. A [`Value::Null`] renders
    /// `column IS NULL`.
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, Op::Eq, Operand::One(value.into()))
    }

    /// Add a predicate: `column <> value`. A [`Value::Null`] renders
    /// `column IS NOT NULL`.
    pub fn ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, Op::Ne, Operand::One(value.into()))
    }

    /// Add a predicate: `column < value`.
    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, Op::Lt, Operand::One(value.into()))
    }

    /// Add a predicate: `column <= value`.
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, Op::Lte, Operand::One(value.into()))
    }

    /// Add a predicate: `column > value`.
    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, Op::Gt, Operand::One(value.into()))
    }

    /// Add a predicate: `column >= value`.
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, Op::Gte, Operand::One(value.into()))
    }

    /// Add a predicate: `column LIKE pattern`.
    pub fn like(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.push(column, Op::Like, Operand::One(pattern.into()))
    }

    /// Add a predicate with an explicit operator. Equivalent to the
    /// operator-named methods; [`Op::In`] goes through
    /// [`where_in`](Self::where_in) instead.
    pub fn where_op(mut self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        if op == Op::In {
            self.build_error = Some("IN takes a value list; use where_in".to_string());
            return self;
        }
        self.push(column, op, Operand::One(value.into()))
    }

    /// Add a predicate: `column IS NULL`.
    pub fn where_null(self, column: &str) -> Self {
        self.eq(column, Value::Null)
    }

    /// Add a predicate: `column <> value`.
    pub fn where_not(self, column: &str, value: impl Into<Value>) -> Self {
        self.ne(column, value)
    }

    /// Add a predicate: `column IN ($1, $2, …)` with every element bound
    /// individually. An empty list renders the never-true `1=0`.
    pub fn where_in<V: Into<Value>>(self, column: &str, values: Vec<V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push(column, Op::In, Operand::Many(values))
    }

    // ==================== Ordering ====================

    /// Set the ordering clause, replacing any previous one. The direction is
    /// parsed case-insensitively; anything but `asc`/`desc` fails the query
    /// with [`RecordError::InvalidArgument`] when it is built.
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        match Direction::parse(direction) {
            Ok(direction) => self.order = (column.to_string(), direction),
            Err(e) => self.build_error = Some(e.to_string()),
        }
        self
    }

    /// Order by `column ASC`, replacing any previous clause.
    pub fn order_by_asc(mut self, column: &str) -> Self {
        self.order = (column.to_string(), Direction::Asc);
        self
    }

    /// Order by `column DESC`, replacing any previous clause.
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order = (column.to_string(), Direction::Desc);
        self
    }

    // ==================== Build & execute ====================

    /// Render the statement and its bind parameters.
    pub fn build(&self) -> RecordResult<(String, Vec<Value>)> {
        if let Some(message) = &self.build_error {
            return Err(RecordError::invalid_argument(message.clone()));
        }

        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", columns, self.meta.table);

        let mut params: Vec<Value> = Vec::new();
        let mut fragments: Vec<String> = Vec::new();

        // The implicit soft-delete filter comes before explicit predicates.
        if self.meta.soft_deletes {
            fragments.push(format!("{DELETED_AT} IS NULL"));
        }
        for predicate in &self.predicates {
            fragments.push(render_predicate(predicate, &mut params));
        }
        if !fragments.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&fragments.join(" AND "));
        }

        let (column, direction) = &self.order;
        sql.push_str(&format!(" ORDER BY {} {}", column, direction.sql()));

        Ok((sql, params))
    }

    /// Get the built SQL string (for debugging).
    pub fn to_sql(&self) -> RecordResult<String> {
        Ok(self.build()?.0)
    }

    /// Execute the query and materialize every row into an entity.
    pub async fn get(self) -> RecordResult<Collection<Model>> {
        let (sql, params) = self.build()?;
        let rows = self.db.query(&sql, &param_refs(&params)).await?;

        let mut models = Collection::new();
        for row in &rows {
            models.push(Model::from_row(self.meta, row)?);
        }
        Ok(models)
    }

    /// Execute the query and return the first entity, if any.
    pub async fn first(self) -> RecordResult<Option<Model>> {
        let mut models = self.get().await?;
        Ok(models.take_first())
    }
}

fn render_predicate(predicate: &Predicate, params: &mut Vec<Value>) -> String {
    match &predicate.operand {
        Operand::One(Value::Null) => match predicate.op {
            Op::Ne => format!("{} IS NOT NULL", predicate.column),
            _ => format!("{} IS NULL", predicate.column),
        },
        Operand::One(value) => {
            params.push(value.clone());
            format!("{} {} ${}", predicate.column, predicate.op.sql(), params.len())
        }
        Operand::Many(values) => {
            if values.is_empty() {
                return "1=0".to_string();
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|value| {
                    params.push(value.clone());
                    format!("${}", params.len())
                })
                .collect();
            format!(
                "{} {} ({})",
                predicate.column,
                predicate.op.sql(),
                placeholders.join(", ")
            )
        }
    }
}
