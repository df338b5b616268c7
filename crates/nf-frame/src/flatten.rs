use std::sync::Arc;

use nf_columnar::{Column, Matrix};
use nf_types::Scalar;
use serde::{Deserialize, Serialize};

use crate::{ColumnData, Frame, FrameError, Record, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenOptions {
    pub separator: String,
    pub max_depth: usize,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            separator: ".".to_owned(),
            max_depth: 32,
        }
    }
}

fn flatten_into(
    frame: &Frame,
    prefix: Option<&str>,
    depth: usize,
    options: &FlattenOptions,
    out: &mut Vec<(String, Arc<ColumnData>)>,
) -> Result<(), FrameError> {
    if depth > options.max_depth {
        return Err(FrameError::NestingTooDeep {
            max_depth: options.max_depth,
        });
    }
    for (name, column) in frame.iter_columns() {
        let full = match prefix {
            Some(prefix) => format!("{prefix}{}{name}", options.separator),
            None => name.to_owned(),
        };
        match column.as_ref() {
            ColumnData::Frame(nested) => flatten_into(nested, Some(&full), depth + 1, options, out)?,
            _ => out.push((full, Arc::clone(column))),
        }
    }
    Ok(())
}

fn column_from_values(values: Vec<Option<Value>>) -> Result<ColumnData, FrameError> {
    let present = values.iter().flatten().collect::<Vec<_>>();

    if present.iter().all(|value| matches!(value, Value::Scalar(_))) {
        let scalars = values
            .into_iter()
            .map(|value| match value {
                Some(Value::Scalar(scalar)) => scalar,
                _ => Scalar::missing(),
            })
            .collect::<Vec<_>>();
        return Ok(match Column::from_values(scalars.clone()) {
            Ok(column) => ColumnData::Array(column),
            Err(_) => ColumnData::List(scalars),
        });
    }

    if present.iter().all(|value| matches!(value, Value::Record(_))) {
        let records = values
            .into_iter()
            .map(|value| match value {
                Some(Value::Record(record)) => record,
                _ => Record::new(),
            })
            .collect::<Vec<_>>();
        return Ok(ColumnData::Frame(Frame::from_records(&records)?));
    }

    let width = present.iter().find_map(|value| match value {
        Value::Vector(row) => Some(row.len()),
        _ => None,
    });
    if let Some(width) = width {
        let same_width = present
            .iter()
            .all(|value| matches!(value, Value::Vector(row) if row.len() == width));
        if same_width {
            let rows = values.len();
            let flat = values
                .into_iter()
                .flat_map(|value| match value {
                    Some(Value::Vector(row)) => row,
                    _ => vec![Scalar::missing(); width],
                })
                .collect();
            return Ok(ColumnData::Matrix(Matrix::new(rows, width, flat)?));
        }
    }

    Err(FrameError::IncompatibleColumns {
        left: "record field",
        right: "mixed values",
    })
}

impl Frame {
    /// Expand nested frame columns into `parent<sep>child` columns,
    /// depth first. Column metadata is dropped.
    pub fn flatten(&self, options: &FlattenOptions) -> Result<Frame, FrameError> {
        let mut leaves = Vec::new();
        flatten_into(self, None, 0, options, &mut leaves)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            columns = self.column_count(),
            leaves = leaves.len(),
            "flattened nested columns"
        );

        let mut builder = Frame::builder()
            .row_count(self.row_count)
            .maybe_row_names(self.row_names.clone())
            .metadata(self.metadata.clone());
        for (name, column) in leaves {
            builder = builder.shared_column(name, column);
        }
        builder.build()
    }

    #[must_use]
    pub fn to_records(&self) -> Vec<Record> {
        (0..self.row_count).map(|idx| self.record_at(idx)).collect()
    }

    /// Rebuild a frame from records. Fields are unioned in order of first
    /// appearance; absent fields become missing values.
    pub fn from_records(records: &[Record]) -> Result<Frame, FrameError> {
        let mut names = Vec::<&str>::new();
        for record in records {
            for name in record.names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let mut builder = Frame::builder().row_count(records.len());
        for name in names {
            let values = records
                .iter()
                .map(|record| record.get(name).cloned())
                .collect::<Vec<_>>();
            builder = builder.column(name, column_from_values(values)?);
        }
        builder.build()
    }
}
