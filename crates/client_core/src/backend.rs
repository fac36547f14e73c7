//! Query descriptions and the backend seam every handler talks through.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Column(String),
    Relation { name: String, fields: Vec<Field> },
}

/// Column list of a select, including embedded relations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<Field>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.fields.push(Field::Column(name.into()));
        self
    }

    pub fn relation(mut self, name: impl Into<String>, nested: Projection) -> Self {
        self.fields.push(Field::Relation {
            name: name.into(),
            fields: nested.fields,
        });
        self
    }

    /// Renders the projection in `select=` syntax, e.g. `id,vehiculos(marca)`.
    pub fn render(&self) -> String {
        render_fields(&self.fields)
    }
}

fn render_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|field| match field {
            Field::Column(name) => name.clone(),
            Field::Relation { name, fields } => format!("{name}({})", render_fields(fields)),
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub table: String,
    pub projection: Projection,
    pub order: Option<Order>,
    pub limit: Option<u32>,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>, projection: Projection) -> Self {
        Self {
            table: table.into(),
            projection,
            order: None,
            limit: None,
        }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    pub table: String,
    pub row: Map<String, Value>,
    pub returning: bool,
}

impl InsertQuery {
    pub fn new<T: Serialize>(table: impl Into<String>, row: &T) -> Result<Self, BackendError> {
        Ok(Self {
            table: table.into(),
            row: to_object(row)?,
            returning: false,
        })
    }

    pub fn returning(mut self) -> Self {
        self.returning = true;
        self
    }
}

/// Equality filter `column = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct EqFilter {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub table: String,
    pub values: Map<String, Value>,
    pub filter: EqFilter,
}

impl UpdateQuery {
    pub fn new<T: Serialize>(
        table: impl Into<String>,
        values: &T,
        column: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            table: table.into(),
            values: to_object(values)?,
            filter: EqFilter {
                column: column.into(),
                value: value.into(),
            },
        })
    }
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, BackendError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(BackendError::Decode(format!(
            "row payload must be an object, got {other}"
        ))),
        Err(err) => Err(BackendError::Decode(err.to_string())),
    }
}

/// Remote data operations consumed by the booking handlers.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, BackendError>;
    /// Returns the inserted row only when `query.returning` is set.
    async fn insert(&self, query: &InsertQuery) -> Result<Option<Value>, BackendError>;
    async fn update(&self, query: &UpdateQuery) -> Result<(), BackendError>;
}
