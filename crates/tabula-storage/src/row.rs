//! Decoded table rows.

use tabula_common::constants::FIELD_SEPARATOR;

/// A row as stored on disk: raw field text in schema order.
///
/// Rows carry no types. Values are interpreted against a column type only
/// when they are encoded or compared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Row {
    values: Vec<String>,
}

impl Row {
    /// Creates a row from its field values.
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Creates a row of `width` empty fields.
    pub fn empty(width: usize) -> Self {
        Self {
            values: vec![String::new(); width],
        }
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the field at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Replaces the field at `index`. Returns false if out of range.
    pub fn set(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Returns all fields.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Consumes the row, returning its fields.
    pub fn into_values(self) -> Vec<String> {
        self.values
    }

    /// Returns a new row with `self`'s fields followed by `other`'s.
    pub fn concat(&self, other: &Row) -> Row {
        let mut values = Vec::with_capacity(self.len() + other.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        Row { values }
    }

    /// Returns a row holding the fields at `indices`, in that order.
    ///
    /// Indices out of range yield empty fields.
    pub fn project(&self, indices: &[usize]) -> Row {
        Row {
            values: indices
                .iter()
                .map(|&i| self.get(i).unwrap_or_default().to_string())
                .collect(),
        }
    }
}

impl From<Vec<String>> for Row {
    fn from(values: Vec<String>) -> Self {
        Self::new(values)
    }
}

impl From<Vec<&str>> for Row {
    fn from(values: Vec<&str>) -> Self {
        Self::new(values.into_iter().map(String::from).collect())
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Splits a stored line into its fields.
///
/// No type coercion happens here; every field comes back as raw text.
pub fn decode_row(line: &str) -> Row {
    Row::new(line.split(FIELD_SEPARATOR).map(String::from).collect())
}
