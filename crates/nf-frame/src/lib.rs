#![forbid(unsafe_code)]

//! The nested, labelled frame and every operation that reshapes it.

mod builder;
mod column;
mod combine;
mod flatten;
mod mutate;
mod record;
mod slice;

use std::collections::BTreeMap;
use std::sync::Arc;

use nf_columnar::{ColumnError, ColumnLike};
use nf_index::{IndexError, Key, Names, resolve_strict};
use nf_types::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use builder::FrameBuilder;
pub use column::ColumnData;
pub use combine::{combine_columns, combine_rows, relaxed_combine_rows};
pub use flatten::FlattenOptions;
pub use mutate::FrameMut;
pub use record::{Record, Value};
pub use slice::Projection;

/// Free-form metadata attached to a frame.
pub type Metadata = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("column {column:?} has height {height}, expected {expected}")]
    HeightMismatch {
        column: String,
        height: usize,
        expected: usize,
    },
    #[error("{names} row names given for {rows} rows")]
    RowNamesLength { names: usize, rows: usize },
    #[error("{names} column names given for {columns} columns")]
    ColumnNamesLength { names: usize, columns: usize },
    #[error("row name {name:?} appears more than once")]
    DuplicateRowName { name: String },
    #[error("column name {name:?} appears more than once")]
    DuplicateColumnName { name: String },
    #[error("column {name:?} is listed in the column order but has no data")]
    UnlistedColumnData { name: String },
    #[error("column {name:?} has data but is not in the column order")]
    UnorderedColumn { name: String },
    #[error("column metadata has {rows} rows, expected one per column ({columns})")]
    ColumnDataRows { rows: usize, columns: usize },
    #[error("column {name:?} not found")]
    ColumnNotFound { name: String },
    #[error("{axis} selector must select a sequence, not a single element")]
    ScalarSelector { axis: &'static str },
    #[error(
        "replacement of shape ({rows}, {columns}) does not fit a slice of shape ({expected_rows}, {expected_columns})"
    )]
    SliceShape {
        rows: usize,
        columns: usize,
        expected_rows: usize,
        expected_columns: usize,
    },
    #[error("frame {frame} has different columns: missing {missing:?}, unexpected {unexpected:?}")]
    ColumnSetMismatch {
        frame: usize,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    #[error("frame {frame} has {rows} rows, expected {expected}")]
    RowCountMismatch {
        frame: usize,
        rows: usize,
        expected: usize,
    },
    #[error("cannot combine a {left} column with a {right} column")]
    IncompatibleColumns {
        left: &'static str,
        right: &'static str,
    },
    #[error("nesting deeper than {max_depth} levels")]
    NestingTooDeep { max_depth: usize },
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Column(#[from] ColumnError),
}

impl FrameError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::HeightMismatch { .. }
            | Self::RowNamesLength { .. }
            | Self::ColumnNamesLength { .. }
            | Self::UnlistedColumnData { .. }
            | Self::UnorderedColumn { .. }
            | Self::ColumnDataRows { .. }
            | Self::SliceShape { .. }
            | Self::ColumnSetMismatch { .. }
            | Self::RowCountMismatch { .. } => ErrorKind::ShapeMismatch,
            Self::DuplicateRowName { .. } | Self::DuplicateColumnName { .. } => {
                ErrorKind::Duplicate
            }
            Self::ColumnNotFound { .. } => ErrorKind::NotFound,
            Self::ScalarSelector { .. } => ErrorKind::UnsupportedSelector,
            Self::IncompatibleColumns { .. } => ErrorKind::TypeMismatch,
            Self::NestingTooDeep { .. } => ErrorKind::Range,
            Self::Index(err) => err.kind(),
            Self::Column(err) => err.kind(),
        }
    }
}

/// Named, equal-height columns with optional row names, per-column
/// metadata and free metadata.
///
/// Columns are held behind `Arc`, so frames derived from this one share
/// every column they do not change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "FrameRepr", try_from = "FrameRepr")]
pub struct Frame {
    row_count: usize,
    row_names: Option<Names>,
    column_names: Names,
    columns: BTreeMap<String, Arc<ColumnData>>,
    column_data: Option<Box<Frame>>,
    metadata: Metadata,
}

#[derive(Serialize, Deserialize)]
struct FrameRepr {
    row_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    row_names: Option<Vec<String>>,
    columns: Vec<(String, ColumnData)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    column_data: Option<Box<Frame>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: Metadata,
}

impl From<Frame> for FrameRepr {
    fn from(frame: Frame) -> Self {
        let columns = frame
            .iter_columns()
            .map(|(name, column)| (name.to_owned(), column.as_ref().clone()))
            .collect();
        Self {
            row_count: frame.row_count,
            row_names: frame.row_names.map(Names::into_vec),
            columns,
            column_data: frame.column_data,
            metadata: frame.metadata,
        }
    }
}

impl TryFrom<FrameRepr> for Frame {
    type Error = FrameError;

    fn try_from(repr: FrameRepr) -> Result<Self, FrameError> {
        let mut builder = Frame::builder().row_count(repr.row_count);
        for (name, column) in repr.columns {
            builder = builder.column(name, column);
        }
        if let Some(names) = repr.row_names {
            builder = builder.row_names(names);
        }
        if let Some(column_data) = repr.column_data {
            builder = builder.column_data(*column_data);
        }
        let frame = builder.metadata(repr.metadata).build_trusted();
        frame.validate()?;
        Ok(frame)
    }
}

impl Frame {
    #[must_use]
    pub fn builder() -> FrameBuilder {
        FrameBuilder::new()
    }

    /// A frame with `row_count` rows and no columns.
    #[must_use]
    pub fn with_rows(row_count: usize) -> Self {
        Self {
            row_count,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count, self.column_names.len())
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    #[must_use]
    pub fn row_names(&self) -> Option<&Names> {
        self.row_names.as_ref()
    }

    #[must_use]
    pub fn column_names(&self) -> &Names {
        &self.column_names
    }

    #[must_use]
    pub fn column_data(&self) -> Option<&Frame> {
        self.column_data.as_deref()
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.get(name).map(Arc::as_ref)
    }

    /// The shared handle to a column, for building frames that reuse it.
    #[must_use]
    pub fn column_arc(&self, name: &str) -> Option<&Arc<ColumnData>> {
        self.columns.get(name)
    }

    /// Columns in order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &Arc<ColumnData>)> + '_ {
        self.column_names
            .iter()
            .filter_map(|name| self.columns.get(name).map(|column| (name, column)))
    }

    /// Look up a column by name or by a position in `[0, column_count)`.
    pub fn get_column(&self, key: impl Into<Key>) -> Result<&ColumnData, FrameError> {
        let position = resolve_strict(&key.into(), self.column_count(), Some(&self.column_names))?;
        self.column_at(position).map(Arc::as_ref)
    }

    /// Record of every column's value at one row, addressed by row name
    /// (first match) or by a position in `[0, row_count)`.
    pub fn get_row(&self, key: impl Into<Key>) -> Result<Record, FrameError> {
        let position = resolve_strict(&key.into(), self.row_count, self.row_names.as_ref())?;
        Ok(self.record_at(position))
    }

    /// Every row with its name, in order.
    pub fn rows(&self) -> impl Iterator<Item = (Option<&str>, Record)> + '_ {
        (0..self.row_count).map(|idx| {
            let name = self.row_names.as_ref().and_then(|names| names.get(idx));
            (name, self.record_at(idx))
        })
    }

    pub(crate) fn column_at(&self, position: usize) -> Result<&Arc<ColumnData>, FrameError> {
        let name = self
            .column_names
            .get(position)
            .ok_or(IndexError::PositionOutOfRange {
                position: i64::try_from(position).unwrap_or(i64::MAX),
                cardinality: self.column_count(),
            })?;
        self.columns
            .get(name)
            .ok_or_else(|| FrameError::ColumnNotFound {
                name: name.to_owned(),
            })
    }

    pub(crate) fn record_at(&self, idx: usize) -> Record {
        self.iter_columns()
            .map(|(name, column)| (name, column.value_at(idx)))
            .collect()
    }

    /// Same columns and column metadata, every column replaced by `len`
    /// missing rows.
    #[must_use]
    pub fn missing_like(&self, len: usize) -> Self {
        Self {
            row_count: len,
            row_names: None,
            column_names: self.column_names.clone(),
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), Arc::new(column.missing_like(len))))
                .collect(),
            column_data: self.column_data.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Check every structural invariant.
    ///
    /// Row names must match the row count but may repeat: frames derived
    /// by slicing, combining or merging can carry a label more than once,
    /// and lookups then resolve to its first occurrence. Uniqueness is
    /// enforced where names are supplied, by [`FrameBuilder::build`] and
    /// the row-name setters.
    pub fn validate(&self) -> Result<(), FrameError> {
        if let Some(name) = self.column_names.first_duplicate() {
            return Err(FrameError::DuplicateColumnName {
                name: name.to_owned(),
            });
        }
        if let Some(name) = self.column_names.iter().find(|name| !self.columns.contains_key(*name)) {
            return Err(FrameError::UnlistedColumnData {
                name: name.to_owned(),
            });
        }
        if let Some(name) = self.columns.keys().find(|name| !self.column_names.contains(name)) {
            return Err(FrameError::UnorderedColumn { name: name.clone() });
        }
        for (name, column) in self.iter_columns() {
            if column.height() != self.row_count {
                return Err(FrameError::HeightMismatch {
                    column: name.to_owned(),
                    height: column.height(),
                    expected: self.row_count,
                });
            }
        }
        if let Some(names) = &self.row_names {
            check_row_names_length(names, self.row_count)?;
        }
        if let Some(column_data) = &self.column_data {
            check_column_data(column_data, self.column_count())?;
        }
        Ok(())
    }
}

fn check_row_names_length(names: &Names, rows: usize) -> Result<(), FrameError> {
    if names.len() != rows {
        return Err(FrameError::RowNamesLength {
            names: names.len(),
            rows,
        });
    }
    Ok(())
}

pub(crate) fn check_row_names(names: &Names, rows: usize) -> Result<(), FrameError> {
    check_row_names_length(names, rows)?;
    match names.first_duplicate() {
        Some(name) => Err(FrameError::DuplicateRowName {
            name: name.to_owned(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_column_data(column_data: &Frame, columns: usize) -> Result<(), FrameError> {
    if column_data.row_count() != columns {
        return Err(FrameError::ColumnDataRows {
            rows: column_data.row_count(),
            columns,
        });
    }
    Ok(())
}

/// A frame nested as a column: rows are the leading axis.
impl ColumnLike for Frame {
    type Error = FrameError;

    fn height(&self) -> usize {
        self.row_count
    }

    fn take(&self, positions: &[usize]) -> Result<Self, FrameError> {
        self.take_rows(positions)
    }

    fn concat(parts: &[&Self]) -> Result<Self, FrameError> {
        combine_rows(parts)
    }

    /// Columns of `replacement` are matched to this frame's columns by
    /// position.
    fn assign(&self, positions: &[usize], replacement: &Self) -> Result<Self, FrameError> {
        if replacement.column_count() != self.column_count() {
            return Err(FrameError::SliceShape {
                rows: replacement.row_count(),
                columns: replacement.column_count(),
                expected_rows: positions.len(),
                expected_columns: self.column_count(),
            });
        }
        let mut out = self.clone();
        for ((name, column), (_, incoming)) in self.iter_columns().zip(replacement.iter_columns()) {
            out.columns
                .insert(name.to_owned(), Arc::new(column.assign(positions, incoming)?));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use nf_index::Key;
    use nf_types::{ErrorKind, Scalar};

    use super::{ColumnData, Frame, FrameError, Value};

    fn sample() -> Frame {
        Frame::builder()
            .column("A", vec![1_i64, 2, 3])
            .column("B", vec!["x", "y", "z"])
            .row_names(vec!["r1", "r2", "r3"])
            .build()
            .expect("sample")
    }

    #[test]
    fn get_column_rejects_positions_outside_bounds() {
        let frame = sample();
        let err = frame.get_column(-1_i64).expect_err("negative");
        assert_eq!(err.kind(), ErrorKind::Range);
        let err = frame.get_column(2_i64).expect_err("past end");
        assert_eq!(err.kind(), ErrorKind::Range);
        assert_eq!(
            frame.get_column(1_i64).expect("position"),
            &ColumnData::from(vec!["x", "y", "z"])
        );
    }

    #[test]
    fn get_column_by_unknown_name_is_not_found() {
        let err = sample().get_column("Q").expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn get_row_by_label_and_position_agree() {
        let frame = sample();
        let by_label = frame.get_row("r2").expect("label");
        let by_position = frame.get_row(1_i64).expect("position");
        assert_eq!(by_label, by_position);
        assert_eq!(by_label.get("A"), Some(&Value::Scalar(Scalar::Int64(2))));
        let err = frame.get_row(Key::Position(3)).expect_err("range");
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn nested_frame_rows_become_records() {
        let inner = Frame::builder()
            .column("x", vec![10_i64, 20])
            .build()
            .expect("inner");
        let outer = Frame::builder()
            .column("id", vec![1_i64, 2])
            .column("nested", inner)
            .build()
            .expect("outer");
        let row = outer.get_row(1_i64).expect("row");
        let nested = row
            .get("nested")
            .and_then(Value::as_record)
            .expect("nested record");
        assert_eq!(nested.get("x"), Some(&Value::Scalar(Scalar::Int64(20))));
    }

    #[test]
    fn rows_iterates_names_and_records() {
        let frame = sample();
        let names = frame.rows().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, vec![Some("r1"), Some("r2"), Some("r3")]);
        assert_eq!(frame.shape(), (3, 2));
    }

    #[test]
    fn serde_roundtrip_revalidates() {
        let frame = sample();
        let json = serde_json::to_string(&frame).expect("serialize");
        let back: Frame = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, frame);

        let mut value: serde_json::Value = serde_json::from_str(&json).expect("value");
        value["row_count"] = serde_json::json!(5);
        let err = serde_json::from_value::<Frame>(value).expect_err("bad height");
        assert!(err.to_string().contains("has height 3, expected 5"));
    }

    #[test]
    fn validation_reports_height_mismatch() {
        let err = Frame::builder()
            .column("A", vec![1_i64, 2])
            .column("B", vec![1_i64])
            .build()
            .expect_err("heights");
        assert_eq!(
            err,
            FrameError::HeightMismatch {
                column: "B".to_owned(),
                height: 1,
                expected: 2
            }
        );
    }
}
