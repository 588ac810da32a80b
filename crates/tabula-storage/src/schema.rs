//! Schema codec.
//!
//! Parses and serializes the header line of a table and encodes rows
//! against it. Column types are parsed once into [`ColumnType`] when the
//! header is read; rows are validated against the parsed types.

use std::fmt;
use std::str::FromStr;

use tabula_common::constants::{FIELD_SEPARATOR, LABEL_TYPE_SEPARATOR, LINE_SEPARATOR};
use tabula_common::{ObjectKind, TabulaError, TabulaResult};

use crate::row::Row;

/// Type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Signed integer.
    Int,
    /// Floating-point number.
    Float,
    /// Text of at most `max_len` characters.
    Varchar(usize),
}

impl ColumnType {
    /// Validates `value` against this type and returns its stored text.
    ///
    /// Integers and floats are stored in canonical decimal form; varchars
    /// are stored verbatim.
    pub fn encode(&self, value: &str) -> TabulaResult<String> {
        match self {
            ColumnType::Int => value
                .parse::<i64>()
                .map(|n| n.to_string())
                .map_err(|_| TabulaError::schema_violation(format!("'{value}' is not an int"))),
            ColumnType::Float => match value.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(f.to_string()),
                _ => Err(TabulaError::schema_violation(format!(
                    "'{value}' is not a float"
                ))),
            },
            ColumnType::Varchar(max_len) => {
                let len = value.chars().count();
                if len > *max_len {
                    return Err(TabulaError::schema_violation(format!(
                        "value of length {len} exceeds varchar({max_len})"
                    )));
                }
                Ok(value.to_string())
            }
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => write!(f, "int"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Varchar(n) => write!(f, "varchar({n})"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "int" => return Ok(ColumnType::Int),
            "float" => return Ok(ColumnType::Float),
            _ => {}
        }

        let max_len = lowered
            .strip_prefix("varchar(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|n| n.trim().parse::<usize>().ok());

        match max_len {
            Some(n) if n > 0 => Ok(ColumnType::Varchar(n)),
            _ => Err(TabulaError::schema_violation(format!(
                "unrecognized type '{s}'"
            ))),
        }
    }
}

/// A column definition: label and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    label: String,
    column_type: ColumnType,
}

impl Column {
    /// Creates a column definition.
    ///
    /// Labels must be non-empty and must not contain whitespace, since the
    /// header separates label and type with a space.
    pub fn new(label: impl Into<String>, column_type: ColumnType) -> TabulaResult<Self> {
        let label = label.into();
        if label.is_empty() || label.chars().any(char::is_whitespace) {
            return Err(TabulaError::schema_violation(format!(
                "invalid column label '{label}'"
            )));
        }
        Ok(Self { label, column_type })
    }

    /// Parses one `"<label> <type>"` header segment.
    pub fn parse_segment(segment: &str) -> TabulaResult<Self> {
        let (label, ty) = segment.split_once(LABEL_TYPE_SEPARATOR).ok_or_else(|| {
            TabulaError::schema_violation(format!("malformed header segment '{segment}'"))
        })?;
        Column::new(label, ty.parse()?)
    }

    /// Returns the label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Returns the header segment, including its trailing separator.
    pub fn header_segment(&self) -> String {
        format!("{}{FIELD_SEPARATOR}", self)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.label, LABEL_TYPE_SEPARATOR, self.column_type)
    }
}

/// Ordered column list of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema from columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Parses a header line.
    pub fn parse_header(line: &str) -> TabulaResult<Self> {
        let columns = line
            .split(FIELD_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(Column::parse_segment)
            .collect::<TabulaResult<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Serializes the schema as a header line.
    pub fn header_line(&self) -> String {
        self.columns.iter().map(Column::header_segment).collect()
    }

    /// Returns the header as a row of `"<label> <type>"` fields.
    pub fn header_row(&self) -> Row {
        Row::new(self.columns.iter().map(ToString::to_string).collect())
    }

    /// Returns the columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns true if a column with `label` exists.
    pub fn contains(&self, label: &str) -> bool {
        self.columns.iter().any(|c| c.label == label)
    }

    /// Returns the index of the column with `label`.
    pub fn index_of(&self, label: &str) -> TabulaResult<usize> {
        self.columns
            .iter()
            .position(|c| c.label == label)
            .ok_or_else(|| TabulaError::not_found(ObjectKind::Column, label))
    }

    /// Returns the column at `index`.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Appends a column, rejecting duplicate labels.
    pub fn push(&mut self, column: Column) -> TabulaResult<()> {
        if self.contains(column.label()) {
            return Err(TabulaError::schema_violation(format!(
                "duplicate column '{}'",
                column.label()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Validates `values` against the schema and returns the stored line.
    pub fn encode_row<S: AsRef<str>>(&self, values: &[S]) -> TabulaResult<String> {
        if self.columns.is_empty() {
            return Err(TabulaError::schema_violation("table has no columns"));
        }
        if values.len() != self.columns.len() {
            return Err(TabulaError::schema_violation(format!(
                "expected {} values, got {}",
                self.columns.len(),
                values.len()
            )));
        }

        let mut fields = Vec::with_capacity(values.len());
        for (column, value) in self.columns.iter().zip(values) {
            let value = value.as_ref();
            if value.contains([FIELD_SEPARATOR, LINE_SEPARATOR, '\r']) {
                return Err(TabulaError::schema_violation(format!(
                    "value for '{}' contains a separator character",
                    column.label
                )));
            }
            fields.push(column.column_type.encode(value)?);
        }

        Ok(fields.join(&FIELD_SEPARATOR.to_string()))
    }
}
