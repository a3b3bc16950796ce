//! The zone table: one row per polygon, columns in insertion order

use crate::errors::InputError;
use geo::Geometry;

/// Name of the required geometry column.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// A typed column. Attribute columns are opaque to the reducer and are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Geometry(Vec<Geometry<f64>>),
    Float(Vec<Option<f64>>),
    Integer(Vec<Option<i64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Geometry(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Integer(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Geometry(_) => "geometry",
            Self::Float(_) => "float",
            Self::Integer(_) => "integer",
            Self::Text(_) => "text",
        }
    }
}

/// Ordered attribute table of zones.
///
/// Row order never changes; row `i` is zone `i` for the whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneTable {
    columns: Vec<(String, Column)>,
}

impl ZoneTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with only a geometry column.
    #[must_use]
    pub fn from_geometries(geometries: Vec<Geometry<f64>>) -> Self {
        Self {
            columns: vec![(GEOMETRY_COLUMN.to_string(), Column::Geometry(geometries))],
        }
    }

    /// Builder form of [`ZoneTable::set_column`].
    ///
    /// # Errors
    ///
    /// Fails if the column length differs from the table's row count.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self, InputError> {
        self.set_column(name, column)?;
        Ok(self)
    }

    /// Insert a column, replacing any existing column of the same name in place.
    ///
    /// # Errors
    ///
    /// Fails if the column length differs from the table's row count.
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), InputError> {
        let name = name.into();
        if let Some((_, existing)) = self.columns.iter().find(|(n, _)| *n != name) {
            if existing.len() != column.len() {
                return Err(InputError::ColumnLength {
                    column: name,
                    expected: existing.len(),
                    found: column.len(),
                });
            }
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = column,
            None => self.columns.push((name, column)),
        }
        Ok(())
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Row count, taken from the first column.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn float(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.column(name)? {
            Column::Float(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub fn integer(&self, name: &str) -> Option<&[Option<i64>]> {
        match self.column(name)? {
            Column::Integer(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&[Option<String>]> {
        match self.column(name)? {
            Column::Text(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// The geometry column.
    ///
    /// # Errors
    ///
    /// Fails if the column is missing or holds something other than geometries.
    pub fn geometries(&self) -> Result<&[Geometry<f64>], InputError> {
        match self.column(GEOMETRY_COLUMN) {
            Some(Column::Geometry(g)) => Ok(g.as_slice()),
            Some(_) => Err(InputError::GeometryColumnType),
            None => Err(InputError::MissingGeometryColumn),
        }
    }

    /// Check the table is ready for dispatch and return its geometries.
    ///
    /// # Errors
    ///
    /// Fails on a missing geometry column, an empty table, or ragged columns.
    pub fn validate(&self) -> Result<&[Geometry<f64>], InputError> {
        let geometries = self.geometries()?;
        if geometries.is_empty() {
            return Err(InputError::EmptyZoneTable);
        }
        for (name, column) in &self.columns {
            if column.len() != geometries.len() {
                return Err(InputError::ColumnLength {
                    column: name.clone(),
                    expected: geometries.len(),
                    found: column.len(),
                });
            }
        }
        Ok(geometries)
    }
}
