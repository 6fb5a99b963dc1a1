//! Typed, column-oriented frames
//!
//! A [`FeatureFrame`] is the explicit schema that sits between typed records
//! and the dense numeric matrices consumed by the transform and model stages.

mod columns;

pub use columns::{
    EPISODE_LENGTH, GENRE, LISTENING_TIME, PODCAST_NAME, PREDICTION, PUBLICATION_DAY,
    PUBLICATION_TIME, PUB_DAY_TIME,
};

use serde::{Deserialize, Serialize};

use crate::domain::record::{EngineeredRecord, LabeledRecord, RawRecord};
use crate::domain::DomainError;

/// Column values, either numeric (possibly missing) or categorical
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Categorical(_) => "categorical",
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Ordered set of equally sized, uniquely named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureFrame {
    columns: Vec<Column>,
    n_rows: usize,
}

impl FeatureFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; rejects duplicates and length mismatches
    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> Result<Self, DomainError> {
        self.push_column(name, data)?;
        Ok(self)
    }

    pub fn push_column(&mut self, name: impl Into<String>, data: ColumnData) -> Result<(), DomainError> {
        let name = name.into();

        if self.column(&name).is_some() {
            return Err(DomainError::schema(format!("Duplicate column '{}'", name)));
        }

        if !self.columns.is_empty() && data.len() != self.n_rows {
            return Err(DomainError::schema(format!(
                "Column '{}' has {} rows, frame has {}",
                name,
                data.len(),
                self.n_rows
            )));
        }

        self.n_rows = data.len();
        self.columns.push(Column { name, data });
        Ok(())
    }

    /// Frame with the five raw feature columns
    pub fn from_raw(records: &[RawRecord]) -> Self {
        let mut frame = Self::new();
        frame.columns = vec![
            categorical(PODCAST_NAME, records.iter().map(|r| r.podcast_name.clone())),
            numeric(EPISODE_LENGTH, records.iter().map(|r| r.episode_length_minutes)),
            categorical(GENRE, records.iter().map(|r| r.genre.clone())),
            categorical(
                PUBLICATION_DAY,
                records.iter().map(|r| r.publication_day.to_string()),
            ),
            categorical(
                PUBLICATION_TIME,
                records.iter().map(|r| r.publication_time.to_string()),
            ),
        ];
        frame.n_rows = records.len();
        frame
    }

    /// Raw feature columns plus the listening-time target column
    pub fn from_labeled(records: &[LabeledRecord]) -> Self {
        let raw: Vec<RawRecord> = records.iter().map(|r| r.record.clone()).collect();
        let mut frame = Self::from_raw(&raw);
        frame.columns.push(numeric(
            LISTENING_TIME,
            records.iter().map(|r| Some(r.listening_time_minutes)),
        ));
        frame
    }

    /// Frame with the four engineered feature columns
    pub fn from_engineered(records: &[EngineeredRecord]) -> Self {
        let mut frame = Self::new();
        frame.columns = vec![
            categorical(PODCAST_NAME, records.iter().map(|r| r.podcast_name.clone())),
            numeric(EPISODE_LENGTH, records.iter().map(|r| r.episode_length_minutes)),
            categorical(GENRE, records.iter().map(|r| r.genre.clone())),
            categorical(PUB_DAY_TIME, records.iter().map(|r| r.pub_day_time.clone())),
        ];
        frame.n_rows = records.len();
        frame
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Numeric column by name; `Schema` if absent or categorical
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>], DomainError> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Numeric(values)) => Ok(values),
            Some(other) => Err(DomainError::schema(format!(
                "Column '{}' is {}, expected numeric",
                name,
                other.type_name()
            ))),
            None => Err(DomainError::schema(format!("Missing column '{}'", name))),
        }
    }

    /// Categorical column by name; `Schema` if absent or numeric
    pub fn categorical(&self, name: &str) -> Result<&[String], DomainError> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Categorical(values)) => Ok(values),
            Some(other) => Err(DomainError::schema(format!(
                "Column '{}' is {}, expected categorical",
                name,
                other.type_name()
            ))),
            None => Err(DomainError::schema(format!("Missing column '{}'", name))),
        }
    }

    /// Rename a column in place
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), DomainError> {
        if from != to && self.column(to).is_some() {
            return Err(DomainError::schema(format!(
                "Cannot rename '{}' to '{}': column already exists",
                from, to
            )));
        }

        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == from)
            .ok_or_else(|| DomainError::schema(format!("Missing column '{}'", from)))?;
        column.name = to.to_string();
        Ok(())
    }

    /// Remove a column, returning it
    pub fn remove(&mut self, name: &str) -> Result<Column, DomainError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| DomainError::schema(format!("Missing column '{}'", name)))?;
        Ok(self.columns.remove(idx))
    }

    /// Keep only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Self, DomainError> {
        let mut out = Self::new();

        for name in names {
            let column = self
                .column(name)
                .ok_or_else(|| DomainError::schema(format!("Missing column '{}'", name)))?;
            out.push_column(column.name.clone(), column.data.clone())?;
        }

        Ok(out)
    }
}

fn categorical(name: &str, values: impl Iterator<Item = String>) -> Column {
    Column {
        name: name.to_string(),
        data: ColumnData::Categorical(values.collect()),
    }
}

fn numeric(name: &str, values: impl Iterator<Item = Option<f64>>) -> Column {
    Column {
        name: name.to_string(),
        data: ColumnData::Numeric(values.collect()),
    }
}
