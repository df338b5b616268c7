use nf_columnar::{Column, ColumnError, ColumnLike, Factor, Matrix};
use nf_types::Scalar;
use serde::{Deserialize, Serialize};

use crate::{Frame, FrameError, Value};

/// Every kind of value a frame can hold as a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ColumnData {
    /// Untyped sequence of scalars.
    List(Vec<Scalar>),
    Array(Column),
    Factor(Factor),
    Matrix(Matrix),
    Frame(Frame),
}

impl ColumnData {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Array(_) => "array",
            Self::Factor(_) => "factor",
            Self::Matrix(_) => "matrix",
            Self::Frame(_) => "frame",
        }
    }

    /// Row values as scalars, for the kinds that have one scalar per row.
    #[must_use]
    pub fn to_scalars(&self) -> Option<Vec<Scalar>> {
        match self {
            Self::List(values) => Some(values.clone()),
            Self::Array(column) => Some(column.values().to_vec()),
            Self::Factor(factor) => Some(factor.to_scalars()),
            Self::Matrix(_) | Self::Frame(_) => None,
        }
    }

    /// The value at row `idx`. Callers check `idx < height()`.
    pub(crate) fn value_at(&self, idx: usize) -> Value {
        match self {
            Self::List(values) => Value::Scalar(values[idx].clone()),
            Self::Array(column) => Value::Scalar(column.values()[idx].clone()),
            Self::Factor(factor) => {
                Value::Scalar(factor.label(idx).map_or_else(Scalar::missing, Scalar::from))
            }
            Self::Matrix(matrix) => {
                Value::Vector(matrix.row(idx).map(<[Scalar]>::to_vec).unwrap_or_default())
            }
            Self::Frame(frame) => Value::Record(frame.record_at(idx)),
        }
    }

    /// Numeric arrays and matrices with `f` applied to each value; `None`
    /// for every other kind.
    pub fn map_numeric(&self, f: impl Fn(f64) -> f64) -> Result<Option<Self>, FrameError> {
        Ok(match self {
            Self::Array(column) => column.map_numeric(f)?.map(Self::Array),
            Self::Matrix(matrix) => matrix.map_numeric(f)?.map(Self::Matrix),
            Self::List(_) | Self::Factor(_) | Self::Frame(_) => None,
        })
    }

    /// A placeholder of `len` missing rows shaped like `self`.
    #[must_use]
    pub fn missing_like(&self, len: usize) -> Self {
        match self {
            Self::List(_) => Self::List(vec![Scalar::missing(); len]),
            Self::Array(column) => Self::Array(Column::missing(column.dtype(), len)),
            Self::Factor(factor) => Self::Factor(Factor::missing(
                factor.levels().to_vec(),
                factor.is_ordered(),
                len,
            )),
            Self::Matrix(matrix) => {
                Self::Matrix(Matrix::missing(matrix.dtype(), len, matrix.shape().1))
            }
            Self::Frame(frame) => Self::Frame(frame.missing_like(len)),
        }
    }

    fn incompatible(left: &Self, right: &Self) -> FrameError {
        FrameError::IncompatibleColumns {
            left: left.kind_name(),
            right: right.kind_name(),
        }
    }
}

impl From<Vec<Scalar>> for ColumnData {
    fn from(values: Vec<Scalar>) -> Self {
        Self::List(values)
    }
}

impl From<Column> for ColumnData {
    fn from(column: Column) -> Self {
        Self::Array(column)
    }
}

impl From<Factor> for ColumnData {
    fn from(factor: Factor) -> Self {
        Self::Factor(factor)
    }
}

impl From<Matrix> for ColumnData {
    fn from(matrix: Matrix) -> Self {
        Self::Matrix(matrix)
    }
}

impl From<Frame> for ColumnData {
    fn from(frame: Frame) -> Self {
        Self::Frame(frame)
    }
}

impl From<Vec<i64>> for ColumnData {
    fn from(values: Vec<i64>) -> Self {
        Self::Array(values.into())
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(values: Vec<f64>) -> Self {
        Self::Array(values.into())
    }
}

impl From<Vec<bool>> for ColumnData {
    fn from(values: Vec<bool>) -> Self {
        Self::Array(values.into())
    }
}

impl From<Vec<&str>> for ColumnData {
    fn from(values: Vec<&str>) -> Self {
        Self::Array(values.into())
    }
}

impl From<Vec<String>> for ColumnData {
    fn from(values: Vec<String>) -> Self {
        Self::Array(values.into())
    }
}

fn take_list(values: &[Scalar], positions: &[usize]) -> Result<Vec<Scalar>, ColumnError> {
    positions
        .iter()
        .map(|&idx| {
            values
                .get(idx)
                .cloned()
                .ok_or(ColumnError::PositionOutOfRange {
                    position: idx,
                    len: values.len(),
                })
        })
        .collect()
}

fn assign_list(
    values: &[Scalar],
    positions: &[usize],
    replacement: Vec<Scalar>,
) -> Result<Vec<Scalar>, ColumnError> {
    if positions.len() != replacement.len() {
        return Err(ColumnError::LengthMismatch {
            left: positions.len(),
            right: replacement.len(),
        });
    }
    let mut out = values.to_vec();
    for (&slot, value) in positions.iter().zip(replacement) {
        let cell = out.get_mut(slot).ok_or(ColumnError::PositionOutOfRange {
            position: slot,
            len: values.len(),
        })?;
        *cell = value;
    }
    Ok(out)
}

impl ColumnLike for ColumnData {
    type Error = FrameError;

    fn height(&self) -> usize {
        match self {
            Self::List(values) => values.len(),
            Self::Array(column) => column.len(),
            Self::Factor(factor) => factor.len(),
            Self::Matrix(matrix) => matrix.height(),
            Self::Frame(frame) => frame.row_count(),
        }
    }

    fn take(&self, positions: &[usize]) -> Result<Self, FrameError> {
        Ok(match self {
            Self::List(values) => Self::List(take_list(values, positions)?),
            Self::Array(column) => Self::Array(column.take(positions)?),
            Self::Factor(factor) => Self::Factor(factor.take(positions)?),
            Self::Matrix(matrix) => Self::Matrix(matrix.take(positions)?),
            Self::Frame(frame) => Self::Frame(frame.take(positions)?),
        })
    }

    /// Same-kind parts keep their kind. Scalar kinds that disagree, or
    /// arrays whose dtypes do not promote, fall back to a list.
    fn concat(parts: &[&Self]) -> Result<Self, FrameError> {
        let Some(&first) = parts.first() else {
            return Ok(Self::List(Vec::new()));
        };

        macro_rules! same_kind {
            ($variant:ident) => {
                parts
                    .iter()
                    .map(|part| match part {
                        Self::$variant(inner) => Some(inner),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()
            };
        }

        match first {
            Self::Array(_) => {
                if let Some(columns) = same_kind!(Array) {
                    match Column::concat(&columns) {
                        Ok(column) => return Ok(Self::Array(column)),
                        Err(ColumnError::Type(_)) => {}
                        Err(err) => return Err(err.into()),
                    }
                }
            }
            Self::Factor(_) => {
                if let Some(factors) = same_kind!(Factor) {
                    return Ok(Self::Factor(Factor::concat(&factors)?));
                }
            }
            Self::Matrix(_) => {
                let matrices = same_kind!(Matrix).ok_or_else(|| {
                    let other = parts.iter().find(|part| !matches!(part, Self::Matrix(_)));
                    Self::incompatible(first, other.copied().unwrap_or(first))
                })?;
                return Ok(Self::Matrix(Matrix::concat(&matrices)?));
            }
            Self::Frame(_) => {
                let frames = same_kind!(Frame).ok_or_else(|| {
                    let other = parts.iter().find(|part| !matches!(part, Self::Frame(_)));
                    Self::incompatible(first, other.copied().unwrap_or(first))
                })?;
                return Ok(Self::Frame(Frame::concat(&frames)?));
            }
            Self::List(_) => {}
        }

        let mut values = Vec::with_capacity(parts.iter().map(|part| part.height()).sum());
        for part in parts {
            let scalars = part
                .to_scalars()
                .ok_or_else(|| Self::incompatible(first, part))?;
            values.extend(scalars);
        }
        Ok(Self::List(values))
    }

    fn assign(&self, positions: &[usize], replacement: &Self) -> Result<Self, FrameError> {
        match (self, replacement) {
            (Self::Array(column), Self::Array(incoming)) => match column.assign(positions, incoming) {
                Ok(column) => return Ok(Self::Array(column)),
                Err(ColumnError::Type(_)) => {}
                Err(err) => return Err(err.into()),
            },
            (Self::Factor(factor), Self::Factor(incoming)) => {
                return Ok(Self::Factor(factor.assign(positions, incoming)?));
            }
            (Self::Matrix(matrix), Self::Matrix(incoming)) => {
                return Ok(Self::Matrix(matrix.assign(positions, incoming)?));
            }
            (Self::Frame(frame), Self::Frame(incoming)) => {
                return Ok(Self::Frame(frame.assign(positions, incoming)?));
            }
            (Self::Matrix(_) | Self::Frame(_), _) | (_, Self::Matrix(_) | Self::Frame(_)) => {
                return Err(Self::incompatible(self, replacement));
            }
            _ => {}
        }

        let current = self
            .to_scalars()
            .ok_or_else(|| Self::incompatible(self, replacement))?;
        let incoming = replacement
            .to_scalars()
            .ok_or_else(|| Self::incompatible(self, replacement))?;
        Ok(Self::List(assign_list(&current, positions, incoming)?))
    }
}
