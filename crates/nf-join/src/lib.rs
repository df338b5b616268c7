#![forbid(unsafe_code)]

//! Key-based merging of any number of frames.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use nf_columnar::{Column, ColumnError, ColumnLike};
use nf_frame::{ColumnData, Frame, FrameError, relaxed_combine_rows};
use nf_index::{IndexError, Key, resolve_strict};
use nf_types::{ErrorKind, Scalar};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    /// Keys of the first frame, duplicates included.
    #[default]
    Left,
    /// Keys of the last frame, duplicates included.
    Right,
    /// Keys present in every frame, deduplicated.
    Inner,
    /// Keys present in any frame, deduplicated.
    Outer,
}

impl FromStr for JoinKind {
    type Err = JoinError;

    fn from_str(value: &str) -> Result<Self, JoinError> {
        match value {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "inner" => Ok(Self::Inner),
            "outer" => Ok(Self::Outer),
            other => Err(JoinError::UnknownJoin(other.to_owned())),
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Inner => "inner",
            Self::Outer => "outer",
        })
    }
}

/// Where one frame's join keys come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum KeySource {
    RowNames,
    Column(Key),
}

impl From<Key> for KeySource {
    fn from(key: Key) -> Self {
        Self::Column(key)
    }
}

impl From<&str> for KeySource {
    fn from(name: &str) -> Self {
        Self::Column(Key::from(name))
    }
}

impl From<i64> for KeySource {
    fn from(position: i64) -> Self {
        Self::Column(Key::Position(position))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MergeBy {
    /// Every frame joins on its row names.
    #[default]
    RowNames,
    /// Every frame joins on the same column name or position.
    Column(Key),
    /// One key source per frame.
    PerFrame(Vec<KeySource>),
}

impl From<&str> for MergeBy {
    fn from(name: &str) -> Self {
        Self::Column(Key::from(name))
    }
}

impl From<i64> for MergeBy {
    fn from(position: i64) -> Self {
        Self::Column(Key::Position(position))
    }
}

impl From<Vec<KeySource>> for MergeBy {
    fn from(sources: Vec<KeySource>) -> Self {
        Self::PerFrame(sources)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    pub join: JoinKind,
    /// Suffix clashing column names with ` (2)`, ` (3)`, ... instead of
    /// failing.
    pub rename_duplicates: bool,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum JoinError {
    #[error("frame {frame} has no row names to merge on")]
    MissingRowNames { frame: usize },
    #[error("{given} key sources given for {frames} frames")]
    KeySourceCount { given: usize, frames: usize },
    #[error("unknown join kind {0:?}")]
    UnknownJoin(String),
    #[error("duplicate column {name:?} across frames; rename duplicates to keep both")]
    DuplicateColumn { name: String },
    #[error("frame {frame} cannot use a {kind} column as its key")]
    UnsupportedKeyColumn { frame: usize, kind: &'static str },
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Column(#[from] ColumnError),
}

impl JoinError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingRowNames { .. } => ErrorKind::NotFound,
            Self::KeySourceCount { .. } => ErrorKind::ShapeMismatch,
            Self::UnknownJoin(_) => ErrorKind::UnsupportedSelector,
            Self::DuplicateColumn { .. } => ErrorKind::Duplicate,
            Self::UnsupportedKeyColumn { .. } => ErrorKind::TypeMismatch,
            Self::Frame(err) => err.kind(),
            Self::Index(err) => err.kind(),
            Self::Column(err) => err.kind(),
        }
    }
}

/// Hashable identity of a key value. Integral floats match integers and
/// every missing marker matches every other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum JoinKey {
    Missing,
    Bool(bool),
    Int64(i64),
    FloatBits(u64),
    Utf8(String),
}

impl JoinKey {
    fn from_scalar(value: &Scalar) -> Self {
        match value {
            Scalar::Null(_) => Self::Missing,
            Scalar::Bool(v) => Self::Bool(*v),
            Scalar::Int64(v) => Self::Int64(*v),
            Scalar::Float64(v) if v.is_nan() => Self::Missing,
            Scalar::Float64(v) => {
                if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64 {
                    Self::Int64(*v as i64)
                } else {
                    Self::FloatBits(v.to_bits())
                }
            }
            Scalar::Utf8(v) => Self::Utf8(v.clone()),
        }
    }
}

/// One frame's keys and, for column keys, the key column's position.
struct FrameKeys {
    values: Vec<Scalar>,
    ids: Vec<JoinKey>,
    column: Option<usize>,
}

fn frame_keys(frame: &Frame, idx: usize, source: &KeySource) -> Result<FrameKeys, JoinError> {
    let (values, column) = match source {
        KeySource::RowNames => {
            let names = frame
                .row_names()
                .ok_or(JoinError::MissingRowNames { frame: idx })?;
            (names.iter().map(Scalar::from).collect::<Vec<_>>(), None)
        }
        KeySource::Column(key) => {
            let position = resolve_strict(key, frame.column_count(), Some(frame.column_names()))?;
            let data = frame.get_column(key.clone())?;
            let values = data
                .to_scalars()
                .ok_or(JoinError::UnsupportedKeyColumn {
                    frame: idx,
                    kind: data.kind_name(),
                })?;
            (values, Some(position))
        }
    };
    let ids = values.iter().map(JoinKey::from_scalar).collect();
    Ok(FrameKeys { values, ids, column })
}

fn key_sources(frames: &[&Frame], by: &MergeBy) -> Result<Vec<KeySource>, JoinError> {
    match by {
        MergeBy::RowNames => Ok(vec![KeySource::RowNames; frames.len()]),
        MergeBy::Column(key) => Ok(vec![KeySource::Column(key.clone()); frames.len()]),
        MergeBy::PerFrame(sources) => {
            if sources.len() != frames.len() {
                return Err(JoinError::KeySourceCount {
                    given: sources.len(),
                    frames: frames.len(),
                });
            }
            Ok(sources.clone())
        }
    }
}

fn unique_positions(ids: &[JoinKey]) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(ids.len());
    (0..ids.len()).filter(|&idx| seen.insert(&ids[idx])).collect()
}

/// Unified keys as `(frame, position)` references into the per-frame keys.
fn unify(keys: &[FrameKeys], join: JoinKind) -> Vec<(usize, usize)> {
    let last = keys.len() - 1;
    match join {
        JoinKind::Left => (0..keys[0].ids.len()).map(|pos| (0, pos)).collect(),
        JoinKind::Right => (0..keys[last].ids.len()).map(|pos| (last, pos)).collect(),
        JoinKind::Inner => {
            let others = keys[1..]
                .iter()
                .map(|frame| frame.ids.iter().collect::<HashSet<_>>())
                .collect::<Vec<_>>();
            unique_positions(&keys[0].ids)
                .into_iter()
                .filter(|&pos| others.iter().all(|set| set.contains(&keys[0].ids[pos])))
                .map(|pos| (0, pos))
                .collect()
        }
        JoinKind::Outer => {
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for (frame, frame_keys) in keys.iter().enumerate() {
                for (pos, id) in frame_keys.ids.iter().enumerate() {
                    if seen.insert(id) {
                        out.push((frame, pos));
                    }
                }
            }
            out
        }
    }
}

/// How one frame's rows map onto the unified keys.
enum Reorganize {
    /// Rows already line up with the unified keys.
    Identity,
    /// Every key is present; pick rows in this order.
    Take(Vec<usize>),
    /// Some keys are absent. `keep` picks the present rows; `permute`
    /// reorders them plus one trailing missing row into unified order.
    Pad {
        keep: Vec<usize>,
        permute: Vec<usize>,
    },
}

impl Reorganize {
    fn plan(frame_keys: &FrameKeys, unified: &[&JoinKey]) -> Self {
        let mut first = HashMap::with_capacity(frame_keys.ids.len());
        for (pos, id) in frame_keys.ids.iter().enumerate() {
            first.entry(id).or_insert(pos);
        }
        let matches = unified
            .iter()
            .map(|id| first.get(id).copied())
            .collect::<Vec<_>>();

        if matches.iter().all(Option::is_some) {
            return Self::Take(matches.into_iter().flatten().collect());
        }

        let keep = matches.iter().flatten().copied().collect::<Vec<_>>();
        let missing_row = keep.len();
        let mut next = 0;
        let permute = matches
            .iter()
            .map(|found| match found {
                Some(_) => {
                    next += 1;
                    next - 1
                }
                None => missing_row,
            })
            .collect();
        Self::Pad { keep, permute }
    }

    fn apply(&self, column: &Arc<ColumnData>) -> Result<Arc<ColumnData>, JoinError> {
        Ok(match self {
            Self::Identity => Arc::clone(column),
            Self::Take(positions) => Arc::new(column.take(positions)?),
            Self::Pad { keep, permute } => {
                let present = column.take(keep)?;
                let padded = ColumnData::concat(&[&present, &column.missing_like(1)])?;
                Arc::new(padded.take(permute)?)
            }
        })
    }
}

fn key_column(anchor: &ColumnData, unified: Vec<Scalar>) -> ColumnData {
    match anchor {
        ColumnData::Array(_) => match Column::from_values(unified.clone()) {
            Ok(column) => ColumnData::Array(column),
            Err(_) => ColumnData::List(unified),
        },
        _ => ColumnData::List(unified),
    }
}

fn row_name(value: &Scalar) -> String {
    match value {
        Scalar::Utf8(v) => v.clone(),
        other => other.to_string(),
    }
}

/// Merge `frames` on their keys.
///
/// The first frame decides how the key appears in the result: as row
/// names when it joins on row names, otherwise as a single column at the
/// first frame's key position. Other frames' key columns are dropped.
pub fn merge(frames: &[&Frame], by: &MergeBy, options: &MergeOptions) -> Result<Frame, JoinError> {
    if frames.is_empty() {
        return Ok(Frame::default());
    }
    let sources = key_sources(frames, by)?;
    let keys = frames
        .iter()
        .zip(&sources)
        .enumerate()
        .map(|(idx, (frame, source))| frame_keys(frame, idx, source))
        .collect::<Result<Vec<_>, _>>()?;

    let unified = unify(&keys, options.join);
    let unified_ids = unified
        .iter()
        .map(|&(frame, pos)| &keys[frame].ids[pos])
        .collect::<Vec<_>>();
    let unified_values = unified
        .iter()
        .map(|&(frame, pos)| keys[frame].values[pos].clone())
        .collect::<Vec<_>>();

    let anchor = match options.join {
        JoinKind::Left => Some(0),
        JoinKind::Right => Some(frames.len() - 1),
        JoinKind::Inner | JoinKind::Outer => None,
    };

    let mut builder = Frame::builder().row_count(unified.len());
    let mut taken = HashSet::<String>::new();
    let mut surviving = Vec::with_capacity(frames.len());

    for (idx, frame) in frames.iter().enumerate() {
        let plan = if anchor == Some(idx) {
            Reorganize::Identity
        } else {
            Reorganize::plan(&keys[idx], &unified_ids)
        };
        let mut kept = Vec::new();

        for (position, (name, column)) in frame.iter_columns().enumerate() {
            if keys[idx].column == Some(position) {
                if idx == 0 {
                    let data = key_column(column, unified_values.clone());
                    taken.insert(name.to_owned());
                    builder = builder.column(name, data);
                    kept.push(position);
                }
                continue;
            }

            let mut output = name.to_owned();
            if taken.contains(&output) {
                if !options.rename_duplicates {
                    return Err(JoinError::DuplicateColumn { name: output });
                }
                let mut n = 2;
                while taken.contains(&format!("{name} ({n})")) {
                    n += 1;
                }
                output = format!("{name} ({n})");
            }
            taken.insert(output.clone());
            builder = builder.shared_column(output, plan.apply(column)?);
            kept.push(position);
        }
        surviving.push(kept);
    }

    if frames.iter().any(|frame| frame.column_data().is_some()) {
        let parts = frames
            .iter()
            .zip(&surviving)
            .map(|(frame, kept)| match frame.column_data() {
                Some(column_data) => column_data.take_rows(kept),
                None => Ok(Frame::with_rows(kept.len())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let column_data = relaxed_combine_rows(&parts.iter().collect::<Vec<_>>())?;
        builder = builder.column_data(column_data);
    }

    if keys[0].column.is_none() {
        builder = builder.row_names(unified_values.iter().map(row_name));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        frames = frames.len(),
        join = %options.join,
        keys = unified.len(),
        "merged frames"
    );

    Ok(builder.metadata(frames[0].metadata().clone()).build_trusted())
}

#[cfg(test)]
mod tests {
    use nf_frame::{ColumnData, Frame};
    use nf_index::Key;
    use nf_types::{ErrorKind, Scalar};

    use super::{JoinKind, KeySource, MergeBy, MergeOptions, merge};

    fn options(join: JoinKind) -> MergeOptions {
        MergeOptions {
            join,
            ..MergeOptions::default()
        }
    }

    fn scalars(frame: &Frame, name: &str) -> Vec<Scalar> {
        frame
            .get_column(name)
            .expect("column")
            .to_scalars()
            .expect("scalar column")
    }

    fn opt_ints(values: &[Option<i64>]) -> Vec<Scalar> {
        values.iter().map(|v| Scalar::from(*v)).collect()
    }

    fn opt_strs(values: &[Option<&str>]) -> Vec<Scalar> {
        values.iter().map(|v| Scalar::from(*v)).collect()
    }

    fn opt_bools(values: &[Option<bool>]) -> Vec<Scalar> {
        values.iter().map(|v| Scalar::from(*v)).collect()
    }

    fn names(frame: &Frame) -> Vec<String> {
        frame.column_names().as_slice().to_vec()
    }

    fn obj1() -> Frame {
        Frame::builder()
            .column("A", vec![1_i64, 2, 3, 4])
            .column("B", vec![3_i64, 4, 5, 6])
            .build()
            .expect("obj1")
    }

    fn obj2() -> Frame {
        Frame::builder()
            .column("C", ColumnData::List(opt_strs(&[Some("A"), Some("B")])))
            .column("A", vec![2_i64, 3])
            .build()
            .expect("obj2")
    }

    fn obj3() -> Frame {
        Frame::builder()
            .column("D", vec![true, false, false])
            .column("A", vec![-1_i64, 0, 3])
            .build()
            .expect("obj3")
    }

    #[test]
    fn left_merge_keeps_first_frame_keys() {
        let out = merge(&[&obj1(), &obj2()], &MergeBy::from("A"), &options(JoinKind::Left))
            .expect("merge");
        assert_eq!(names(&out), vec!["A", "B", "C"]);
        assert_eq!(scalars(&out, "A"), opt_ints(&[Some(1), Some(2), Some(3), Some(4)]));
        assert_eq!(scalars(&out, "C"), opt_strs(&[None, Some("A"), Some("B"), None]));
    }

    #[test]
    fn right_merge_places_key_at_first_frame_position() {
        let out = merge(&[&obj2(), &obj3()], &MergeBy::from("A"), &options(JoinKind::Right))
            .expect("merge");
        assert_eq!(names(&out), vec!["C", "A", "D"]);
        assert_eq!(scalars(&out, "C"), opt_strs(&[None, None, Some("B")]));
        assert_eq!(scalars(&out, "A"), opt_ints(&[Some(-1), Some(0), Some(3)]));
        assert_eq!(scalars(&out, "D"), opt_bools(&[Some(true), Some(false), Some(false)]));
    }

    #[test]
    fn inner_merge_intersects_keys() {
        let out = merge(&[&obj2(), &obj1()], &MergeBy::from("A"), &options(JoinKind::Inner))
            .expect("merge");
        assert_eq!(names(&out), vec!["C", "A", "B"]);
        assert_eq!(scalars(&out, "A"), opt_ints(&[Some(2), Some(3)]));
        assert_eq!(scalars(&out, "B"), opt_ints(&[Some(4), Some(5)]));
    }

    #[test]
    fn outer_merge_unions_keys_in_order() {
        let out = merge(&[&obj3(), &obj1()], &MergeBy::from("A"), &options(JoinKind::Outer))
            .expect("merge");
        assert_eq!(names(&out), vec!["D", "A", "B"]);
        assert_eq!(
            scalars(&out, "D"),
            opt_bools(&[Some(true), Some(false), Some(false), None, None, None])
        );
        assert_eq!(
            scalars(&out, "A"),
            opt_ints(&[Some(-1), Some(0), Some(3), Some(1), Some(2), Some(4)])
        );
        assert_eq!(
            scalars(&out, "B"),
            opt_ints(&[None, None, Some(5), Some(3), Some(4), Some(6)])
        );
    }

    #[test]
    fn per_frame_positions_select_each_key() {
        let by = MergeBy::PerFrame(vec![KeySource::from(0_i64), 1_i64.into(), 1_i64.into()]);
        let out = merge(&[&obj1(), &obj2(), &obj3()], &by, &options(JoinKind::Outer))
            .expect("merge");
        assert_eq!(names(&out), vec!["A", "B", "C", "D"]);
        assert_eq!(
            scalars(&out, "A"),
            opt_ints(&[Some(1), Some(2), Some(3), Some(4), Some(-1), Some(0)])
        );
        assert_eq!(
            scalars(&out, "D"),
            opt_bools(&[None, None, Some(false), None, Some(true), Some(false)])
        );
    }

    fn named_b() -> Frame {
        Frame::builder()
            .column("B", vec![3_i64, 4, 5, 6])
            .row_names(vec!["1", "2", "3", "4"])
            .build()
            .expect("named_b")
    }

    fn named_c() -> Frame {
        Frame::builder()
            .column("C", vec!["A", "B"])
            .row_names(vec!["2", "3"])
            .build()
            .expect("named_c")
    }

    fn string_keys() -> Frame {
        Frame::builder()
            .column("D", vec![true, false, false])
            .column("A", vec!["1", "0", "3"])
            .build()
            .expect("string_keys")
    }

    #[test]
    fn row_name_merge_labels_the_result() {
        let out = merge(&[&named_b(), &named_c()], &MergeBy::RowNames, &options(JoinKind::Left))
            .expect("merge");
        assert_eq!(names(&out), vec!["B", "C"]);
        assert_eq!(
            out.row_names().expect("row names").as_slice(),
            &["1", "2", "3", "4"]
        );
        assert_eq!(scalars(&out, "C"), opt_strs(&[None, Some("A"), Some("B"), None]));
    }

    #[test]
    fn column_anchor_ignores_other_row_names() {
        let by = MergeBy::PerFrame(vec![KeySource::from("A"), KeySource::RowNames]);
        let out = merge(&[&string_keys(), &named_c()], &by, &options(JoinKind::Inner))
            .expect("merge");
        assert_eq!(names(&out), vec!["D", "A", "C"]);
        assert!(out.row_names().is_none());
        assert_eq!(scalars(&out, "D"), opt_bools(&[Some(false)]));
        assert_eq!(scalars(&out, "A"), opt_strs(&[Some("3")]));
        assert_eq!(scalars(&out, "C"), opt_strs(&[Some("B")]));
    }

    #[test]
    fn row_name_anchor_drops_other_key_columns() {
        let by = MergeBy::PerFrame(vec![KeySource::RowNames, KeySource::from("A")]);
        let out = merge(&[&named_c(), &string_keys()], &by, &options(JoinKind::Outer))
            .expect("merge");
        assert_eq!(names(&out), vec!["C", "D"]);
        assert_eq!(
            out.row_names().expect("row names").as_slice(),
            &["2", "3", "1", "0"]
        );
        assert_eq!(
            scalars(&out, "D"),
            opt_bools(&[None, Some(false), Some(true), Some(false)])
        );
        assert_eq!(scalars(&out, "C"), opt_strs(&[Some("A"), Some("B"), None, None]));
    }

    fn duplicated_names() -> Frame {
        Frame::builder()
            .column("B", vec![3_i64, 4, 5, 6])
            .row_names(vec!["1", "1", "2", "3"])
            .build_trusted()
    }

    fn repeated_three() -> Frame {
        Frame::builder()
            .column("C", vec!["A", "B"])
            .row_names(vec!["3", "3"])
            .build_trusted()
    }

    #[test]
    fn duplicate_keys_use_first_match() {
        let frames = [&duplicated_names(), &repeated_three()];
        let left = merge(&frames, &MergeBy::RowNames, &options(JoinKind::Left)).expect("left");
        assert_eq!(
            left.row_names().expect("names").as_slice(),
            &["1", "1", "2", "3"]
        );
        assert_eq!(scalars(&left, "C"), opt_strs(&[None, None, None, Some("A")]));

        let right = merge(&frames, &MergeBy::RowNames, &options(JoinKind::Right)).expect("right");
        assert_eq!(right.row_names().expect("names").as_slice(), &["3", "3"]);
        assert_eq!(scalars(&right, "B"), opt_ints(&[Some(6), Some(6)]));
        assert_eq!(scalars(&right, "C"), opt_strs(&[Some("A"), Some("B")]));

        let outer = merge(&frames, &MergeBy::RowNames, &options(JoinKind::Outer)).expect("outer");
        assert_eq!(outer.row_names().expect("names").as_slice(), &["1", "2", "3"]);
        assert_eq!(scalars(&outer, "B"), opt_ints(&[Some(3), Some(5), Some(6)]));
        assert_eq!(scalars(&outer, "C"), opt_strs(&[None, None, Some("A")]));
    }

    #[test]
    fn duplicate_columns_fail_unless_renamed() {
        let frame = Frame::builder()
            .column("B", vec![3_i64, 4, 5, 6])
            .column("A", vec![0_i64, 1, 2, 3])
            .build()
            .expect("frame");
        let err = merge(&[&frame, &frame], &MergeBy::from("A"), &MergeOptions::default())
            .expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::Duplicate);

        let renamed = MergeOptions {
            rename_duplicates: true,
            ..MergeOptions::default()
        };
        let out = merge(&[&frame, &frame], &MergeBy::from("A"), &renamed).expect("renamed");
        assert_eq!(names(&out), vec!["B", "A", "B (2)"]);
        assert_eq!(
            scalars(&out, "B (2)"),
            opt_ints(&[Some(3), Some(4), Some(5), Some(6)])
        );
    }

    #[test]
    fn column_metadata_follows_surviving_columns() {
        let left = named_b()
            .set_column_data(Some(
                Frame::builder()
                    .column("foo", vec![true])
                    .build()
                    .expect("foo"),
            ))
            .expect("column data");
        let right = named_c();
        let out = merge(&[&left, &right], &MergeBy::RowNames, &MergeOptions::default())
            .expect("merge");
        let column_data = out.column_data().expect("column data");
        assert_eq!(scalars(column_data, "foo"), opt_bools(&[Some(true), None]));

        let right = right
            .set_column_data(Some(
                Frame::builder()
                    .column("foo", vec![false])
                    .build()
                    .expect("foo"),
            ))
            .expect("column data");
        let out = merge(&[&left, &right], &MergeBy::RowNames, &MergeOptions::default())
            .expect("merge");
        let column_data = out.column_data().expect("column data");
        assert_eq!(scalars(column_data, "foo"), opt_bools(&[Some(true), Some(false)]));
    }

    #[test]
    fn key_column_metadata_is_kept_for_the_first_frame() {
        let left = Frame::builder()
            .column("B", vec![3_i64, 4, 5, 6])
            .column("A", vec![1_i64, 0, 2, 3])
            .column_data(
                Frame::builder()
                    .column("foo", vec![true, false])
                    .build()
                    .expect("foo"),
            )
            .build()
            .expect("left");
        let right = Frame::builder()
            .column("A", vec![0_i64, 3])
            .column("C", vec!["A", "B"])
            .column_data(
                Frame::builder()
                    .column(
                        "foo",
                        ColumnData::List(vec![Scalar::from("WHEE"), Scalar::Bool(false)]),
                    )
                    .build()
                    .expect("foo"),
            )
            .build()
            .expect("right");
        let out = merge(&[&left, &right], &MergeBy::from("A"), &MergeOptions::default())
            .expect("merge");
        assert_eq!(names(&out), vec!["B", "A", "C"]);
        assert_eq!(scalars(&out, "C"), opt_strs(&[None, Some("A"), None, Some("B")]));
        let column_data = out.column_data().expect("column data");
        assert_eq!(
            scalars(column_data, "foo"),
            opt_bools(&[Some(true), Some(false), Some(false)])
        );
        out.validate().expect("valid");
    }

    #[test]
    fn key_errors_are_classified() {
        let err = merge(&[&obj1(), &obj2()], &MergeBy::RowNames, &MergeOptions::default())
            .expect_err("no row names");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = merge(&[&obj1(), &obj2()], &MergeBy::from("Z"), &MergeOptions::default())
            .expect_err("unknown column");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = merge(
            &[&obj1(), &obj2()],
            &MergeBy::Column(Key::Position(7)),
            &MergeOptions::default(),
        )
        .expect_err("bad position");
        assert_eq!(err.kind(), ErrorKind::Range);

        let err = "sideways".parse::<JoinKind>().expect_err("join kind");
        assert_eq!(err.kind(), ErrorKind::UnsupportedSelector);
        assert_eq!("outer".parse::<JoinKind>().expect("outer"), JoinKind::Outer);
    }

    #[test]
    fn integral_float_keys_match_integer_keys() {
        let floats = Frame::builder()
            .column("k", vec![1.0, 2.5])
            .column("v", vec!["one", "two and a half"])
            .build()
            .expect("floats");
        let ints = Frame::builder()
            .column("k", vec![1_i64])
            .column("w", vec![10_i64])
            .build()
            .expect("ints");
        let out = merge(&[&floats, &ints], &MergeBy::from("k"), &MergeOptions::default())
            .expect("merge");
        assert_eq!(scalars(&out, "w"), opt_ints(&[Some(10), None]));
    }
}
