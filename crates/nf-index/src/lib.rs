#![forbid(unsafe_code)]

//! Names and the subscript normalizer.
//!
//! Every row or column selector is resolved once, here, into ordered
//! positions plus a flag recording whether it addressed a single element.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use nf_types::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("boolean selector has length {mask}, expected {cardinality}")]
    MaskLength { mask: usize, cardinality: usize },
    #[error("label {label:?} not found")]
    LabelNotFound { label: String },
    #[error("cannot resolve label {label:?}: no labels are set on this axis")]
    NoLabels { label: String },
    #[error("position {position} out of range for length {cardinality}")]
    PositionOutOfRange { position: i64, cardinality: usize },
    #[error("slice step cannot be zero")]
    ZeroStep,
}

impl IndexError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MaskLength { .. } => ErrorKind::ShapeMismatch,
            Self::LabelNotFound { .. } | Self::NoLabels { .. } => ErrorKind::NotFound,
            Self::PositionOutOfRange { .. } => ErrorKind::Range,
            Self::ZeroStep => ErrorKind::UnsupportedSelector,
        }
    }
}

/// An ordered list of string labels for one axis.
///
/// Uniqueness is not enforced here; lookups resolve to the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Names {
    values: Vec<String>,
}

impl Names {
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
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
    pub fn as_slice(&self) -> &[String] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.position(needle).is_some()
    }

    #[must_use]
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.values.iter().position(|label| label == needle)
    }

    #[must_use]
    pub fn position_map_first(&self) -> HashMap<&str, usize> {
        let mut positions = HashMap::with_capacity(self.values.len());
        for (idx, label) in self.values.iter().enumerate() {
            positions.entry(label.as_str()).or_insert(idx);
        }
        positions
    }

    #[must_use]
    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashMap::<&str, ()>::with_capacity(self.values.len());
        self.values
            .iter()
            .find(|label| seen.insert(label.as_str(), ()).is_some())
            .map(String::as_str)
    }

    /// Labels at `positions`, in order. Positions must be in bounds.
    #[must_use]
    pub fn take(&self, positions: &[usize]) -> Self {
        Self::new(positions.iter().map(|&idx| self.values[idx].clone()).collect())
    }

    #[must_use]
    pub fn concat(parts: &[&Self]) -> Self {
        Self::new(
            parts
                .iter()
                .flat_map(|part| part.values.iter().cloned())
                .collect(),
        )
    }

    pub fn push(&mut self, label: impl Into<String>) {
        self.values.push(label.into());
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.values
    }
}

impl<S: Into<String>> FromIterator<S> for Names {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for Names {
    fn from(values: Vec<String>) -> Self {
        Self::new(values)
    }
}

impl From<Vec<&str>> for Names {
    fn from(values: Vec<&str>) -> Self {
        values.into_iter().collect()
    }
}

/// One element of a selector: a position or a label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Key {
    Position(i64),
    Label(String),
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Position(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Label(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Label(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(v) => write!(f, "{v}"),
            Self::Label(v) => write!(f, "{v:?}"),
        }
    }
}

/// `start:stop:step` with the usual clamping rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    #[must_use]
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Positions this slice visits on an axis of `len` entries.
    pub fn positions(&self, len: usize) -> Result<Vec<usize>, IndexError> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(IndexError::ZeroStep);
        }

        let len = i64::try_from(len).unwrap_or(i64::MAX);
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };
        let clamp = |bound: i64| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };

        let start = self
            .start
            .map_or(if step > 0 { lower } else { upper }, clamp);
        let stop = self.stop.map_or(if step > 0 { upper } else { lower }, clamp);

        let mut out = Vec::new();
        let mut cursor = Some(start);
        while let Some(at) = cursor.filter(|&at| if step > 0 { at < stop } else { at > stop }) {
            out.extend(usize::try_from(at).ok());
            // A step past the end of `i64` leaves the axis.
            cursor = at.checked_add(step);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selector {
    /// Every element, in order.
    #[default]
    All,
    /// A bare position or label; resolution collapses the axis.
    One(Key),
    Many(Vec<Key>),
    Mask(Vec<bool>),
    Range(Slice),
}

impl Selector {
    #[must_use]
    pub fn all() -> Self {
        Self::All
    }

    #[must_use]
    pub fn none() -> Self {
        Self::Many(Vec::new())
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<Key> for Selector {
    fn from(value: Key) -> Self {
        Self::One(value)
    }
}

impl From<i64> for Selector {
    fn from(value: i64) -> Self {
        Self::One(Key::Position(value))
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::One(Key::from(value))
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Self::One(Key::Label(value))
    }
}

impl From<Vec<Key>> for Selector {
    fn from(value: Vec<Key>) -> Self {
        Self::Many(value)
    }
}

impl From<Vec<i64>> for Selector {
    fn from(value: Vec<i64>) -> Self {
        Self::Many(value.into_iter().map(Key::Position).collect())
    }
}

impl From<Vec<&str>> for Selector {
    fn from(value: Vec<&str>) -> Self {
        Self::Many(value.into_iter().map(Key::from).collect())
    }
}

impl From<Vec<String>> for Selector {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value.into_iter().map(Key::Label).collect())
    }
}

impl From<Vec<bool>> for Selector {
    fn from(value: Vec<bool>) -> Self {
        Self::Mask(value)
    }
}

impl From<Slice> for Selector {
    fn from(value: Slice) -> Self {
        Self::Range(value)
    }
}

impl From<RangeFull> for Selector {
    fn from(_: RangeFull) -> Self {
        Self::All
    }
}

impl From<Range<i64>> for Selector {
    fn from(value: Range<i64>) -> Self {
        Self::Range(Slice::new(Some(value.start), Some(value.end), None))
    }
}

impl From<RangeFrom<i64>> for Selector {
    fn from(value: RangeFrom<i64>) -> Self {
        Self::Range(Slice::new(Some(value.start), None, None))
    }
}

impl From<RangeTo<i64>> for Selector {
    fn from(value: RangeTo<i64>) -> Self {
        Self::Range(Slice::new(None, Some(value.end), None))
    }
}

/// Canonical output of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub positions: Vec<usize>,
    pub is_scalar: bool,
}

impl Resolved {
    #[must_use]
    pub fn all(cardinality: usize) -> Self {
        Self {
            positions: (0..cardinality).collect(),
            is_scalar: false,
        }
    }
}

fn wrap_position(position: i64, cardinality: usize) -> Result<usize, IndexError> {
    let len = i128::try_from(cardinality).unwrap_or(i128::MAX);
    let raw = i128::from(position);
    let normalized = if raw < 0 { raw + len } else { raw };
    if normalized < 0 || normalized >= len {
        return Err(IndexError::PositionOutOfRange {
            position,
            cardinality,
        });
    }
    usize::try_from(normalized).map_err(|_| IndexError::PositionOutOfRange {
        position,
        cardinality,
    })
}

fn label_position(
    label: &str,
    labels: Option<&Names>,
    lookup: &mut Option<HashMap<String, usize>>,
) -> Result<usize, IndexError> {
    let Some(labels) = labels else {
        return Err(IndexError::NoLabels {
            label: label.to_owned(),
        });
    };
    let map = lookup.get_or_insert_with(|| {
        labels
            .position_map_first()
            .into_iter()
            .map(|(label, idx)| (label.to_owned(), idx))
            .collect()
    });
    map.get(label)
        .copied()
        .ok_or_else(|| IndexError::LabelNotFound {
            label: label.to_owned(),
        })
}

/// Resolve `selector` against an axis of `cardinality` elements.
///
/// Negative positions count from the end. Labels resolve to their first
/// occurrence in `labels` and fail when the axis carries no labels.
pub fn normalize(
    selector: &Selector,
    cardinality: usize,
    labels: Option<&Names>,
) -> Result<Resolved, IndexError> {
    match selector {
        Selector::All => Ok(Resolved::all(cardinality)),
        Selector::One(Key::Position(position)) => Ok(Resolved {
            positions: vec![wrap_position(*position, cardinality)?],
            is_scalar: true,
        }),
        Selector::One(Key::Label(label)) => {
            // Single lookups scan instead of building a map.
            let position = match labels {
                Some(names) => names
                    .position(label)
                    .ok_or_else(|| IndexError::LabelNotFound {
                        label: label.clone(),
                    })?,
                None => {
                    return Err(IndexError::NoLabels {
                        label: label.clone(),
                    });
                }
            };
            Ok(Resolved {
                positions: vec![position],
                is_scalar: true,
            })
        }
        Selector::Many(keys) => {
            let mut lookup = None;
            let positions = keys
                .iter()
                .map(|key| match key {
                    Key::Position(position) => wrap_position(*position, cardinality),
                    Key::Label(label) => label_position(label, labels, &mut lookup),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Resolved {
                positions,
                is_scalar: false,
            })
        }
        Selector::Mask(mask) => {
            if mask.len() != cardinality {
                return Err(IndexError::MaskLength {
                    mask: mask.len(),
                    cardinality,
                });
            }
            Ok(Resolved {
                positions: mask
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, keep)| keep.then_some(idx))
                    .collect(),
                is_scalar: false,
            })
        }
        Selector::Range(slice) => Ok(Resolved {
            positions: slice.positions(cardinality)?,
            is_scalar: false,
        }),
    }
}

/// Resolve a single key without wraparound: positions must lie in
/// `[0, cardinality)`.
pub fn resolve_strict(
    key: &Key,
    cardinality: usize,
    labels: Option<&Names>,
) -> Result<usize, IndexError> {
    match key {
        Key::Position(position) => usize::try_from(*position)
            .ok()
            .filter(|idx| *idx < cardinality)
            .ok_or(IndexError::PositionOutOfRange {
                position: *position,
                cardinality,
            }),
        Key::Label(label) => {
            let names = labels.ok_or_else(|| IndexError::NoLabels {
                label: label.clone(),
            })?;
            names
                .position(label)
                .ok_or_else(|| IndexError::LabelNotFound {
                    label: label.clone(),
                })
        }
    }
}
