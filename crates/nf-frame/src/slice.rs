use std::collections::BTreeMap;
use std::sync::Arc;

use nf_columnar::{ColumnError, ColumnLike};
use nf_index::{Resolved, Selector, normalize};

use crate::{ColumnData, Frame, FrameError, Record};

/// What a slice collapses to.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Frame(Frame),
    /// A single row was selected.
    Record(Record),
    /// A single column was selected.
    Column(Arc<ColumnData>),
}

impl Projection {
    #[must_use]
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Self::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_column(self) -> Option<Arc<ColumnData>> {
        match self {
            Self::Column(column) => Some(column),
            _ => None,
        }
    }
}

impl Frame {
    pub(crate) fn resolve_rows(&self, selector: &Selector) -> Result<Resolved, FrameError> {
        Ok(normalize(selector, self.row_count, self.row_names.as_ref())?)
    }

    pub(crate) fn resolve_columns(&self, selector: &Selector) -> Result<Resolved, FrameError> {
        Ok(normalize(selector, self.column_count(), Some(&self.column_names))?)
    }

    /// Rows at `positions`, in order. Everything else is carried over.
    pub fn take_rows(&self, positions: &[usize]) -> Result<Frame, FrameError> {
        if let Some(&position) = positions.iter().find(|&&position| position >= self.row_count) {
            return Err(ColumnError::PositionOutOfRange {
                position,
                len: self.row_count,
            }
            .into());
        }
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| Ok((name.clone(), Arc::new(column.take(positions)?))))
            .collect::<Result<BTreeMap<_, _>, FrameError>>()?;
        let row_names = self.row_names.as_ref().map(|names| names.take(positions));
        Ok(Frame {
            row_count: positions.len(),
            row_names,
            column_names: self.column_names.clone(),
            columns,
            column_data: self.column_data.clone(),
            metadata: self.metadata.clone(),
        })
    }

    /// Columns at `positions`, in order, with their metadata rows.
    pub(crate) fn take_columns(&self, positions: &[usize]) -> Result<Frame, FrameError> {
        let mut out = Frame {
            row_count: self.row_count,
            row_names: self.row_names.clone(),
            column_names: self.column_names.take(positions),
            columns: BTreeMap::new(),
            column_data: None,
            metadata: self.metadata.clone(),
        };
        for &position in positions {
            let column = self.column_at(position)?;
            let name = self.column_names.get(position).unwrap_or_default();
            if out.columns.insert(name.to_owned(), Arc::clone(column)).is_some() {
                return Err(FrameError::DuplicateColumnName {
                    name: name.to_owned(),
                });
            }
        }
        if let Some(column_data) = &self.column_data {
            out.column_data = Some(Box::new(column_data.take_rows(positions)?));
        }
        Ok(out)
    }

    /// Project rows and columns.
    ///
    /// A single row collapses to a [`Record`]; otherwise a single column
    /// collapses to that column's data. Anything else is a [`Frame`].
    pub fn get_slice(
        &self,
        rows: impl Into<Selector>,
        columns: impl Into<Selector>,
    ) -> Result<Projection, FrameError> {
        let (rows, columns) = (rows.into(), columns.into());

        let (projected, is_column_scalar) = if columns.is_all() {
            (self.clone(), false)
        } else {
            let resolved = self.resolve_columns(&columns)?;
            (self.take_columns(&resolved.positions)?, resolved.is_scalar)
        };

        if rows.is_all() {
            if is_column_scalar {
                return Ok(Projection::Column(Arc::clone(projected.column_at(0)?)));
            }
            return Ok(Projection::Frame(projected));
        }

        let resolved = self.resolve_rows(&rows)?;
        if resolved.is_scalar {
            let position = resolved.positions.first().copied().unwrap_or_default();
            return Ok(Projection::Record(projected.record_at(position)));
        }
        if is_column_scalar {
            let column = projected.column_at(0)?.take(&resolved.positions)?;
            return Ok(Projection::Column(Arc::new(column)));
        }
        Ok(Projection::Frame(projected.take_rows(&resolved.positions)?))
    }
}
