//! The built-in relational executor: a small `SELECT` model, alias
//! assignment, and a [`RelationalExecutor`](crate::plan::RelationalExecutor)
//! that joins relationships onto it.

mod alias;
mod executor;

pub use alias::AliasTracker;
pub use executor::SqlExecutor;

use std::fmt::Write;

use compact_str::CompactString;

use crate::dialect::Dialect;
use crate::filter::Direction;
use crate::join::JoinType;
use crate::value::Value;

/// An alias-qualified column, rendered `"alias"."column"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub alias: CompactString,
    pub column: CompactString,
}

impl ColumnRef {
    pub fn new(alias: impl Into<CompactString>, column: impl Into<CompactString>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }

    fn write_to(&self, buf: &mut String, quote: char) {
        write_ident(buf, &self.alias, quote);
        buf.push('.');
        write_ident(buf, &self.column, quote);
    }
}

/// A selectable or sortable expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Column(ColumnRef),
    /// The first non-null column, used across polymorphic branches.
    Coalesce(Vec<ColumnRef>),
}

impl Expr {
    /// One column as-is, several as a `COALESCE`.
    pub fn from_columns(mut columns: Vec<ColumnRef>) -> Self {
        if columns.len() == 1 {
            if let Some(column) = columns.pop() {
                return Expr::Column(column);
            }
        }
        Expr::Coalesce(columns)
    }

    fn write_to(&self, buf: &mut String, quote: char) {
        match self {
            Expr::Column(column) => column.write_to(buf, quote),
            Expr::Coalesce(columns) if columns.is_empty() => buf.push_str("NULL"),
            Expr::Coalesce(columns) => {
                buf.push_str("COALESCE(");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    column.write_to(buf, quote);
                }
                buf.push(')');
            }
        }
    }
}

impl From<ColumnRef> for Expr {
    fn from(value: ColumnRef) -> Self {
        Expr::Column(value)
    }
}

/// A boolean condition in an `ON` or `WHERE` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    ColumnsEqual(ColumnRef, ColumnRef),
    Equals(ColumnRef, Value),
    /// `column IN (...)`. An empty list matches nothing.
    In(ColumnRef, Vec<Value>),
    Any(Vec<Condition>),
    All(Vec<Condition>),
}

/// A join in a [`SelectQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: CompactString,
    pub alias: CompactString,
    pub on: Vec<Condition>,
}

/// A `SELECT` over a base table and the joins added by the planner.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    dialect: Dialect,
    table: CompactString,
    distinct: bool,
    columns: Vec<Expr>,
    joins: Vec<JoinClause>,
    conditions: Vec<Condition>,
    order_by: Vec<(Expr, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
    aliases: AliasTracker,
}

impl SelectQuery {
    pub fn new(dialect: Dialect, table: impl Into<CompactString>) -> Self {
        let table = table.into();
        Self {
            dialect,
            aliases: AliasTracker::new(dialect.max_identifier_length()).with_base(&table),
            table,
            distinct: false,
            columns: Vec::new(),
            joins: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The base table, also its alias.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn columns(&self) -> &[Expr] {
        &self.columns
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Appends a selected expression and returns its column index.
    pub fn select(&mut self, expr: impl Into<Expr>) -> usize {
        self.columns.push(expr.into());
        self.columns.len() - 1
    }

    pub fn join(&mut self, join: JoinClause) {
        self.joins.push(join);
    }

    pub fn and_where(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn order_by(&mut self, expr: impl Into<Expr>, direction: Direction) {
        self.order_by.push((expr.into(), direction));
    }

    pub fn limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    pub fn offset(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    pub fn aliases(&self) -> &AliasTracker {
        &self.aliases
    }

    pub fn aliases_mut(&mut self) -> &mut AliasTracker {
        &mut self.aliases
    }

    /// Renders the statement and its parameters in placeholder order.
    pub fn build(&self) -> (String, Vec<Value>) {
        crate::joinery_profile_scope!("sql", "build");

        let quote = self.dialect.identifier_quote();
        let mut writer = Writer {
            dialect: self.dialect,
            buf: String::with_capacity(128),
            params: Vec::new(),
        };

        writer.buf.push_str("SELECT ");
        if self.distinct {
            writer.buf.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            writer.buf.push('*');
        }
        for (i, expr) in self.columns.iter().enumerate() {
            if i > 0 {
                writer.buf.push_str(", ");
            }
            expr.write_to(&mut writer.buf, quote);
        }

        writer.buf.push_str(" FROM ");
        write_ident(&mut writer.buf, &self.table, quote);

        for join in &self.joins {
            writer.buf.push(' ');
            writer.buf.push_str(join.join_type.keyword());
            writer.buf.push(' ');
            write_ident(&mut writer.buf, &join.table, quote);
            if join.alias != join.table {
                writer.buf.push_str(" AS ");
                write_ident(&mut writer.buf, &join.alias, quote);
            }
            writer.buf.push_str(" ON ");
            writer.write_all(&join.on);
        }

        if !self.conditions.is_empty() {
            writer.buf.push_str(" WHERE ");
            writer.write_all(&self.conditions);
        }

        if !self.order_by.is_empty() {
            writer.buf.push_str(" ORDER BY ");
            for (i, (expr, direction)) in self.order_by.iter().enumerate() {
                if i > 0 {
                    writer.buf.push_str(", ");
                }
                expr.write_to(&mut writer.buf, quote);
                writer.buf.push(' ');
                writer.buf.push_str(direction.keyword());
            }
        }

        if let Some(limit) = self.limit {
            let _ = write!(writer.buf, " LIMIT {limit}");
        }
        if let Some(offset) = self.offset {
            let _ = write!(writer.buf, " OFFSET {offset}");
        }

        (writer.buf, writer.params)
    }
}

struct Writer {
    dialect: Dialect,
    buf: String,
    params: Vec<Value>,
}

impl Writer {
    fn write_all(&mut self, conditions: &[Condition]) {
        self.write_joined(conditions, " AND ");
    }

    fn write_joined(&mut self, conditions: &[Condition], separator: &str) {
        for (i, condition) in conditions.iter().enumerate() {
            if i > 0 {
                self.buf.push_str(separator);
            }
            self.write_condition(condition);
        }
    }

    fn write_condition(&mut self, condition: &Condition) {
        match condition {
            Condition::ColumnsEqual(left, right) => {
                let quote = self.dialect.identifier_quote();
                left.write_to(&mut self.buf, quote);
                self.buf.push_str(" = ");
                right.write_to(&mut self.buf, quote);
            }
            Condition::Equals(column, value) => {
                column.write_to(&mut self.buf, self.dialect.identifier_quote());
                self.buf.push_str(" = ");
                self.write_param(value.clone());
            }
            Condition::In(_, values) if values.is_empty() => self.buf.push_str("1 = 0"),
            Condition::In(column, values) => {
                column.write_to(&mut self.buf, self.dialect.identifier_quote());
                self.buf.push_str(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.buf.push_str(", ");
                    }
                    self.write_param(value.clone());
                }
                self.buf.push(')');
            }
            Condition::Any(conditions) if conditions.is_empty() => self.buf.push_str("1 = 0"),
            Condition::All(conditions) if conditions.is_empty() => self.buf.push_str("1 = 1"),
            Condition::Any(conditions) => {
                self.buf.push('(');
                self.write_joined(conditions, " OR ");
                self.buf.push(')');
            }
            Condition::All(conditions) => {
                self.buf.push('(');
                self.write_joined(conditions, " AND ");
                self.buf.push(')');
            }
        }
    }

    fn write_param(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.dialect.render_placeholder(self.params.len());
        self.buf.push_str(&placeholder);
    }
}

fn write_ident(buf: &mut String, ident: &str, quote: char) {
    buf.push(quote);
    for ch in ident.chars() {
        if ch == quote {
            buf.push(quote);
        }
        buf.push(ch);
    }
    buf.push(quote);
}
