use std::collections::BTreeMap;
use std::sync::Arc;

use nf_columnar::ColumnLike;
use nf_index::Names;

use crate::{ColumnData, Frame, FrameError, Metadata, check_row_names};

/// Collects the parts of a frame.
///
/// Without an explicit row count, the first column's height is used, then
/// the number of row names, then zero. Without an explicit column order,
/// columns keep the order they were added in.
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    columns: Vec<(String, Arc<ColumnData>)>,
    row_count: Option<usize>,
    row_names: Option<Names>,
    column_order: Option<Names>,
    column_data: Option<Frame>,
    metadata: Metadata,
}

impl FrameBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn column(self, name: impl Into<String>, data: impl Into<ColumnData>) -> Self {
        self.shared_column(name, Arc::new(data.into()))
    }

    /// Add a column without copying it.
    #[must_use]
    pub fn shared_column(mut self, name: impl Into<String>, data: Arc<ColumnData>) -> Self {
        self.columns.push((name.into(), data));
        self
    }

    #[must_use]
    pub fn row_count(mut self, row_count: usize) -> Self {
        self.row_count = Some(row_count);
        self
    }

    #[must_use]
    pub fn row_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.row_names = Some(names.into_iter().collect());
        self
    }

    #[must_use]
    pub fn maybe_row_names(mut self, names: Option<Names>) -> Self {
        self.row_names = names;
        self
    }

    #[must_use]
    pub fn column_order<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_order = Some(names.into_iter().collect());
        self
    }

    #[must_use]
    pub fn column_data(mut self, column_data: Frame) -> Self {
        self.column_data = Some(column_data);
        self
    }

    #[must_use]
    pub fn maybe_column_data(mut self, column_data: Option<Frame>) -> Self {
        self.column_data = column_data;
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn metadata_entry(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Assemble and validate.
    pub fn build(self) -> Result<Frame, FrameError> {
        if self.column_order.is_none() {
            let names = self
                .columns
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Names>();
            if let Some(name) = names.first_duplicate() {
                return Err(FrameError::DuplicateColumnName {
                    name: name.to_owned(),
                });
            }
        }
        let frame = self.build_trusted();
        frame.validate()?;
        if let Some(names) = frame.row_names() {
            check_row_names(names, frame.row_count())?;
        }
        Ok(frame)
    }

    /// Assemble without checking invariants. Callers guarantee them.
    #[must_use]
    pub fn build_trusted(self) -> Frame {
        let row_count = self
            .row_count
            .or_else(|| self.columns.first().map(|(_, column)| column.height()))
            .or_else(|| self.row_names.as_ref().map(Names::len))
            .unwrap_or(0);
        let column_names = self.column_order.unwrap_or_else(|| {
            self.columns
                .iter()
                .map(|(name, _)| name.as_str())
                .collect()
        });
        let columns = self.columns.into_iter().collect::<BTreeMap<_, _>>();

        Frame {
            row_count,
            row_names: self.row_names,
            column_names,
            columns,
            column_data: self.column_data.map(Box::new),
            metadata: self.metadata,
        }
    }
}
