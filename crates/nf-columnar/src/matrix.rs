use nf_types::{DType, Scalar};
use serde::{Deserialize, Serialize};

use crate::{Column, ColumnError, ColumnLike, check_assignment, check_positions};

/// A two-axis column stored row-major. Row operations act on whole rows of
/// `width` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    width: usize,
    data: Column,
}

#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    width: usize,
    data: Column,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = ColumnError;

    fn try_from(raw: RawMatrix) -> Result<Self, ColumnError> {
        if raw.rows.checked_mul(raw.width) != Some(raw.data.len()) {
            return Err(ColumnError::ShapeMismatch {
                rows: raw.rows,
                width: raw.width,
                values: raw.data.len(),
            });
        }
        Ok(Self {
            rows: raw.rows,
            width: raw.width,
            data: raw.data,
        })
    }
}

impl Matrix {
    pub fn new(rows: usize, width: usize, values: Vec<Scalar>) -> Result<Self, ColumnError> {
        if rows.checked_mul(width) != Some(values.len()) {
            return Err(ColumnError::ShapeMismatch {
                rows,
                width,
                values: values.len(),
            });
        }
        Ok(Self {
            rows,
            width,
            data: Column::from_values(values)?,
        })
    }

    #[must_use]
    pub fn missing(dtype: DType, rows: usize, width: usize) -> Self {
        Self {
            rows,
            width,
            data: Column::missing(dtype, rows * width),
        }
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.width)
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    #[must_use]
    pub fn row(&self, idx: usize) -> Option<&[Scalar]> {
        (idx < self.rows).then(|| &self.data.values()[idx * self.width..(idx + 1) * self.width])
    }

    /// See [`Column::map_numeric`]; the shape is kept.
    pub fn map_numeric(&self, f: impl Fn(f64) -> f64) -> Result<Option<Self>, ColumnError> {
        Ok(self.data.map_numeric(f)?.map(|data| Self {
            rows: self.rows,
            width: self.width,
            data,
        }))
    }

    fn element_positions(&self, rows: &[usize]) -> Vec<usize> {
        rows.iter()
            .flat_map(|&row| row * self.width..(row + 1) * self.width)
            .collect()
    }
}

impl ColumnLike for Matrix {
    type Error = ColumnError;

    fn height(&self) -> usize {
        self.rows
    }

    fn take(&self, positions: &[usize]) -> Result<Self, ColumnError> {
        check_positions(positions, self.rows)?;
        Ok(Self {
            rows: positions.len(),
            width: self.width,
            data: self.data.take(&self.element_positions(positions))?,
        })
    }

    fn concat(parts: &[&Self]) -> Result<Self, ColumnError> {
        let width = parts.first().map_or(0, |first| first.width);
        if let Some(bad) = parts.iter().find(|part| part.width != width) {
            return Err(ColumnError::WidthMismatch {
                left: width,
                right: bad.width,
            });
        }
        let data = parts.iter().map(|part| &part.data).collect::<Vec<_>>();
        Ok(Self {
            rows: parts.iter().map(|part| part.rows).sum(),
            width,
            data: Column::concat(&data)?,
        })
    }

    fn assign(&self, positions: &[usize], replacement: &Self) -> Result<Self, ColumnError> {
        check_assignment(positions, self.rows, replacement.rows)?;
        if replacement.width != self.width {
            return Err(ColumnError::WidthMismatch {
                left: self.width,
                right: replacement.width,
            });
        }
        Ok(Self {
            rows: self.rows,
            width: self.width,
            data: self
                .data
                .assign(&self.element_positions(positions), &replacement.data)?,
        })
    }
}
