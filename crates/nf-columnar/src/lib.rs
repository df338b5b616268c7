#![forbid(unsafe_code)]

//! Column storage kinds and the capability every column must provide.

mod factor;
mod matrix;

use nf_types::{
    DType, ErrorKind, NullKind, Scalar, TypeError, cast_scalar, common_dtype, infer_dtype,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use factor::Factor;
pub use matrix::Matrix;

/// What a frame needs from anything it stores as a column.
///
/// `take` and `assign` address the leading (row) axis only. `concat`
/// returns a value of the same kind as its inputs.
pub trait ColumnLike: Sized {
    type Error;

    fn height(&self) -> usize;

    fn take(&self, positions: &[usize]) -> Result<Self, Self::Error>;

    fn concat(parts: &[&Self]) -> Result<Self, Self::Error>;

    fn assign(&self, positions: &[usize], replacement: &Self) -> Result<Self, Self::Error>;
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColumnError {
    #[error("column length mismatch: left={left}, right={right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("position {position} out of bounds for column of length {len}")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("factor code {code} does not refer to one of {levels} levels")]
    InvalidLevelCode { code: usize, levels: usize },
    #[error("factor levels must be unique, found {level:?} twice")]
    DuplicateLevel { level: String },
    #[error("level {level:?} is not one of the factor's levels")]
    UnknownLevel { level: String },
    #[error("matrix width mismatch: left={left}, right={right}")]
    WidthMismatch { left: usize, right: usize },
    #[error("matrix of shape ({rows}, {width}) cannot hold {values} values")]
    ShapeMismatch {
        rows: usize,
        width: usize,
        values: usize,
    },
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl ColumnError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LengthMismatch { .. } | Self::WidthMismatch { .. } | Self::ShapeMismatch { .. } => {
                ErrorKind::ShapeMismatch
            }
            Self::PositionOutOfRange { .. } | Self::InvalidLevelCode { .. } => ErrorKind::Range,
            Self::DuplicateLevel { .. } => ErrorKind::Duplicate,
            Self::UnknownLevel { .. } => ErrorKind::NotFound,
            Self::Type(err) => err.kind(),
        }
    }
}

pub(crate) fn check_positions(positions: &[usize], len: usize) -> Result<(), ColumnError> {
    match positions.iter().find(|&&position| position >= len) {
        Some(&position) => Err(ColumnError::PositionOutOfRange { position, len }),
        None => Ok(()),
    }
}

pub(crate) fn check_assignment(
    positions: &[usize],
    len: usize,
    replacement_len: usize,
) -> Result<(), ColumnError> {
    if positions.len() != replacement_len {
        return Err(ColumnError::LengthMismatch {
            left: positions.len(),
            right: replacement_len,
        });
    }
    check_positions(positions, len)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityMask {
    bits: Vec<bool>,
}

impl ValidityMask {
    #[must_use]
    pub fn from_values(values: &[Scalar]) -> Self {
        let bits = values.iter().map(|value| !value.is_missing()).collect();
        Self { bits }
    }

    #[must_use]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    #[must_use]
    pub fn count_valid(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }

    #[must_use]
    pub fn is_valid(&self, idx: usize) -> bool {
        self.bits.get(idx).copied().unwrap_or(false)
    }
}

/// A typed, null-masked array: every value shares `dtype`, and missing
/// entries are flagged in the validity mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    dtype: DType,
    values: Vec<Scalar>,
    validity: ValidityMask,
}

impl Column {
    /// Construct a column, coercing values to the target dtype.
    pub fn new(dtype: DType, values: Vec<Scalar>) -> Result<Self, ColumnError> {
        let coerced = values
            .into_iter()
            .map(|value| cast_scalar(value, dtype))
            .collect::<Result<Vec<_>, _>>()?;
        let validity = ValidityMask::from_values(&coerced);

        Ok(Self {
            dtype,
            values: coerced,
            validity,
        })
    }

    pub fn from_values(values: Vec<Scalar>) -> Result<Self, ColumnError> {
        let dtype = infer_dtype(&values)?;
        Self::new(dtype, values)
    }

    /// A fully masked column of `len` entries.
    #[must_use]
    pub fn missing(dtype: DType, len: usize) -> Self {
        let values = vec![Scalar::missing_for_dtype(dtype); len];
        Self {
            dtype,
            validity: ValidityMask {
                bits: vec![false; len],
            },
            values,
        }
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    #[must_use]
    pub fn value(&self, idx: usize) -> Option<&Scalar> {
        self.values.get(idx)
    }

    #[must_use]
    pub fn validity(&self) -> &ValidityMask {
        &self.validity
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Scalar> {
        self.values
    }

    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        self.dtype == other.dtype
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(left, right)| left.semantic_eq(right))
    }
}

impl Column {
    /// `f` applied to every present value of an integer or float column,
    /// as a float column. Missing values stay missing, and so do NaN
    /// results. Columns of any other dtype give `None`.
    pub fn map_numeric(&self, f: impl Fn(f64) -> f64) -> Result<Option<Self>, ColumnError> {
        if !matches!(self.dtype, DType::Int64 | DType::Float64) {
            return Ok(None);
        }
        let values = self
            .values
            .iter()
            .map(|value| -> Result<Scalar, ColumnError> {
                Ok(match cast_scalar(value.clone(), DType::Float64)? {
                    Scalar::Float64(v) if !v.is_nan() => Scalar::Float64(f(v)),
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Self::typed(DType::Float64, values)))
    }

    /// Values already known to be `dtype` or missing.
    fn typed(dtype: DType, values: Vec<Scalar>) -> Self {
        let validity = ValidityMask::from_values(&values);
        Self {
            dtype,
            values,
            validity,
        }
    }
}

impl From<Vec<i64>> for Column {
    fn from(values: Vec<i64>) -> Self {
        Self::typed(DType::Int64, values.into_iter().map(Scalar::Int64).collect())
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| {
                if v.is_nan() {
                    Scalar::Null(NullKind::NaN)
                } else {
                    Scalar::Float64(v)
                }
            })
            .collect();
        Self::typed(DType::Float64, values)
    }
}

impl From<Vec<bool>> for Column {
    fn from(values: Vec<bool>) -> Self {
        Self::typed(DType::Bool, values.into_iter().map(Scalar::Bool).collect())
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Self::typed(DType::Utf8, values.into_iter().map(Scalar::Utf8).collect())
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Self::typed(DType::Utf8, values.into_iter().map(Scalar::from).collect())
    }
}

impl ColumnLike for Column {
    type Error = ColumnError;

    fn height(&self) -> usize {
        self.len()
    }

    fn take(&self, positions: &[usize]) -> Result<Self, ColumnError> {
        check_positions(positions, self.len())?;
        let values = positions
            .iter()
            .map(|&idx| self.values[idx].clone())
            .collect::<Vec<_>>();
        let validity = ValidityMask {
            bits: positions.iter().map(|&idx| self.validity.bits[idx]).collect(),
        };
        Ok(Self {
            dtype: self.dtype,
            values,
            validity,
        })
    }

    fn concat(parts: &[&Self]) -> Result<Self, ColumnError> {
        let dtype = parts
            .iter()
            .try_fold(DType::Null, |acc, part| common_dtype(acc, part.dtype))?;
        let total: usize = parts.iter().map(|part| part.len()).sum();
        let mut values = Vec::with_capacity(total);
        for part in parts {
            values.extend_from_slice(&part.values);
        }
        Self::new(dtype, values)
    }

    fn assign(&self, positions: &[usize], replacement: &Self) -> Result<Self, ColumnError> {
        check_assignment(positions, self.len(), replacement.len())?;
        let dtype = common_dtype(self.dtype, replacement.dtype)?;
        let mut values = self.values.clone();
        for (slot, value) in positions.iter().zip(&replacement.values) {
            values[*slot] = value.clone();
        }
        Self::new(dtype, values)
    }
}
