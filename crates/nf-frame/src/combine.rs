use std::collections::BTreeMap;
use std::sync::Arc;

use nf_columnar::ColumnLike;
use nf_index::{Key, Names};

use crate::{ColumnData, Frame, FrameError};

fn union_of_names(frames: &[&Frame]) -> Names {
    let mut out = Names::default();
    for frame in frames {
        for name in frame.column_names().iter() {
            if !out.contains(name) {
                out.push(name);
            }
        }
    }
    out
}

/// Concatenate rows of frames that share one column set.
///
/// Columns follow the first frame's order. Row names are kept when any
/// frame has them; unnamed frames contribute empty names. Column metadata
/// and metadata come from the first frame with column metadata, else
/// metadata comes from the first frame.
pub fn combine_rows(frames: &[&Frame]) -> Result<Frame, FrameError> {
    let Some(&first) = frames.first() else {
        return Ok(Frame::default());
    };

    for (idx, frame) in frames.iter().enumerate().skip(1) {
        let missing = first
            .column_names()
            .iter()
            .filter(|name| !frame.has_column(name))
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let unexpected = frame
            .column_names()
            .iter()
            .filter(|name| !first.has_column(name))
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(FrameError::ColumnSetMismatch {
                frame: idx,
                missing,
                unexpected,
            });
        }
    }

    let mut columns = BTreeMap::new();
    for (name, column) in first.iter_columns() {
        let parts = frames
            .iter()
            .map(|frame| {
                frame
                    .column(name)
                    .ok_or_else(|| FrameError::ColumnNotFound {
                        name: name.to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let combined = if frames.len() == 1 {
            Arc::clone(column)
        } else {
            Arc::new(ColumnData::concat(&parts)?)
        };
        columns.insert(name.to_owned(), combined);
    }

    let row_names = frames
        .iter()
        .any(|frame| frame.row_names().is_some())
        .then(|| {
            let mut names = Names::default();
            for frame in frames {
                match frame.row_names() {
                    Some(labels) => labels.iter().for_each(|label| names.push(label)),
                    None => (0..frame.row_count()).for_each(|_| names.push("")),
                }
            }
            names
        });

    let carrier = frames.iter().find(|frame| frame.column_data().is_some());
    let column_data = match carrier.and_then(|frame| frame.column_data().map(|cd| (frame, cd))) {
        Some((frame, column_data)) => {
            let order = first
                .column_names()
                .iter()
                .map(|name| {
                    frame
                        .column_names()
                        .position(name)
                        .ok_or_else(|| FrameError::ColumnNotFound {
                            name: name.to_owned(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(Box::new(column_data.take_rows(&order)?))
        }
        None => None,
    };
    let metadata = carrier.map_or(first, |frame| *frame).metadata().clone();

    let out = Frame {
        row_count: frames.iter().map(|frame| frame.row_count()).sum(),
        row_names,
        column_names: first.column_names().clone(),
        columns,
        column_data,
        metadata,
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        frames = frames.len(),
        rows = out.row_count(),
        columns = out.column_count(),
        "combined rows"
    );

    Ok(out)
}

/// Concatenate rows of frames with differing column sets. Each frame is
/// padded with missing-value columns shaped like the first frame that has
/// the column.
pub fn relaxed_combine_rows(frames: &[&Frame]) -> Result<Frame, FrameError> {
    let union = union_of_names(frames);

    let mut references = BTreeMap::<&str, &ColumnData>::new();
    for frame in frames {
        for (name, column) in frame.iter_columns() {
            references.entry(name).or_insert(column.as_ref());
        }
    }

    let mut aligned = Vec::with_capacity(frames.len());
    for frame in frames {
        let padding = union
            .iter()
            .filter(|name| !frame.has_column(name))
            .filter_map(|name| {
                references
                    .get(name)
                    .map(|reference| (Key::from(name), reference.missing_like(frame.row_count())))
            })
            .collect::<Vec<_>>();
        if padding.is_empty() {
            aligned.push((*frame).clone());
        } else {
            aligned.push(frame.set_columns(padding)?);
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        frames = frames.len(),
        columns = union.len(),
        "aligned frames for relaxed row combine"
    );

    combine_rows(&aligned.iter().collect::<Vec<_>>())
}

/// Place frames side by side. Row counts must agree and column names must
/// not repeat. Row names and metadata come from the first frame.
pub fn combine_columns(frames: &[&Frame]) -> Result<Frame, FrameError> {
    let Some(&first) = frames.first() else {
        return Ok(Frame::default());
    };

    let mut column_names = Names::default();
    let mut columns = BTreeMap::new();
    for (idx, frame) in frames.iter().enumerate() {
        if frame.row_count() != first.row_count() {
            return Err(FrameError::RowCountMismatch {
                frame: idx,
                rows: frame.row_count(),
                expected: first.row_count(),
            });
        }
        for (name, column) in frame.iter_columns() {
            if columns.insert(name.to_owned(), Arc::clone(column)).is_some() {
                return Err(FrameError::DuplicateColumnName {
                    name: name.to_owned(),
                });
            }
            column_names.push(name);
        }
    }

    let column_data = if frames.iter().any(|frame| frame.column_data().is_some()) {
        let placeholders = frames
            .iter()
            .map(|frame| match frame.column_data() {
                Some(column_data) => column_data.clone(),
                None => Frame::with_rows(frame.column_count()),
            })
            .collect::<Vec<_>>();
        Some(Box::new(relaxed_combine_rows(
            &placeholders.iter().collect::<Vec<_>>(),
        )?))
    } else {
        None
    };

    let out = Frame {
        row_count: first.row_count(),
        row_names: first.row_names().cloned(),
        column_names,
        columns,
        column_data,
        metadata: first.metadata().clone(),
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        frames = frames.len(),
        columns = out.column_count(),
        "combined columns"
    );

    Ok(out)
}

impl Frame {
    /// Shorthand for [`combine_rows`] with `self` first.
    pub fn combine_rows(&self, others: &[&Frame]) -> Result<Frame, FrameError> {
        combine_rows(&std::iter::once(self).chain(others.iter().copied()).collect::<Vec<_>>())
    }

    pub fn relaxed_combine_rows(&self, others: &[&Frame]) -> Result<Frame, FrameError> {
        relaxed_combine_rows(&std::iter::once(self).chain(others.iter().copied()).collect::<Vec<_>>())
    }

    pub fn combine_columns(&self, others: &[&Frame]) -> Result<Frame, FrameError> {
        combine_columns(&std::iter::once(self).chain(others.iter().copied()).collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use nf_columnar::{Column, Factor};
    use nf_types::{DType, ErrorKind, Scalar};

    use super::{combine_columns, combine_rows, relaxed_combine_rows};
    use crate::{ColumnData, Frame, FrameError};

    fn ab(a: Vec<i64>, b: Vec<&str>) -> Frame {
        Frame::builder()
            .column("A", a)
            .column("B", b)
            .build()
            .expect("frame")
    }

    #[test]
    fn strict_combine_concatenates_in_first_frame_order() {
        let first = ab(vec![1, 2], vec!["x", "y"]);
        let second = Frame::builder()
            .column("B", vec!["z"])
            .column("A", vec![3_i64])
            .build()
            .expect("second");
        let out = combine_rows(&[&first, &second]).expect("combine");
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.column_names().as_slice(), &["A", "B"]);
        assert_eq!(out.get_column("A").expect("A"), &ColumnData::from(vec![1_i64, 2, 3]));
        assert!(matches!(out.get_column("A").expect("A"), ColumnData::Array(_)));
    }

    #[test]
    fn strict_combine_names_the_frame_and_missing_columns() {
        let first = ab(vec![1], vec!["x"]);
        let second = Frame::builder()
            .column("A", vec![2_i64])
            .build()
            .expect("second");
        let err = combine_rows(&[&first, &second]).expect_err("mismatch");
        assert_eq!(
            err,
            FrameError::ColumnSetMismatch {
                frame: 1,
                missing: vec!["B".to_owned()],
                unexpected: Vec::new(),
            }
        );
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn row_names_use_empty_placeholders() {
        let named = ab(vec![1], vec!["x"])
            .set_row_names(Some(vec!["r".to_owned()]))
            .expect("names");
        let unnamed = ab(vec![2, 3], vec!["y", "z"]);
        let out = combine_rows(&[&unnamed, &named]).expect("combine");
        assert_eq!(out.row_names().expect("names").as_slice(), &["", "", "r"]);
    }

    #[test]
    fn placeholder_row_names_survive_json() {
        let named = ab(vec![1], vec!["x"])
            .set_row_names(Some(vec!["r".to_owned()]))
            .expect("names");
        let first = ab(vec![2], vec!["y"]);
        let second = ab(vec![3], vec!["z"]);
        let out = combine_rows(&[&first, &second, &named]).expect("combine");
        assert_eq!(out.row_names().expect("names").as_slice(), &["", "", "r"]);
        out.validate().expect("valid");

        let json = serde_json::to_string(&out).expect("serialize");
        let back: Frame = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, out);
        assert_eq!(back.get_row("").expect("first blank"), out.get_row(0_i64).expect("row"));
    }

    #[test]
    fn column_metadata_is_reordered_to_first_frame() {
        let annotations = Frame::builder()
            .column("unit", vec!["b-unit", "a-unit"])
            .build()
            .expect("annotations");
        let first = ab(vec![1], vec!["x"]);
        let second = Frame::builder()
            .column("B", vec!["y"])
            .column("A", vec![2_i64])
            .column_data(annotations)
            .metadata_entry("origin", serde_json::json!("second"))
            .build()
            .expect("second");
        let out = combine_rows(&[&first, &second]).expect("combine");
        let column_data = out.column_data().expect("column data");
        assert_eq!(
            column_data.get_column("unit").expect("unit"),
            &ColumnData::from(vec!["a-unit", "b-unit"])
        );
        assert_eq!(out.metadata().get("origin"), Some(&serde_json::json!("second")));
        out.validate().expect("valid");
    }

    #[test]
    fn relaxed_combine_pads_disjoint_columns() {
        let left = Frame::builder()
            .column("A", vec![1_i64, 2])
            .build()
            .expect("left");
        let right = Frame::builder()
            .column("B", vec![3_i64, 4])
            .build()
            .expect("right");
        let out = relaxed_combine_rows(&[&left, &right]).expect("relaxed");
        assert_eq!(out.column_names().as_slice(), &["A", "B"]);
        assert_eq!(
            out.get_column("A").expect("A"),
            &ColumnData::Array(
                Column::new(
                    DType::Int64,
                    vec![
                        Scalar::Int64(1),
                        Scalar::Int64(2),
                        Scalar::missing(),
                        Scalar::missing()
                    ]
                )
                .expect("column")
            )
        );
        let b = out.get_column("B").expect("B").to_scalars().expect("scalars");
        assert!(b[0].is_missing() && b[1].is_missing());
        assert_eq!(&b[2..], &[Scalar::Int64(3), Scalar::Int64(4)]);
    }

    #[test]
    fn relaxed_combine_keeps_factor_levels() {
        let left = Frame::builder()
            .column("f", Factor::from_labels(vec![Some("a"), Some("b")]))
            .build()
            .expect("left");
        let right = Frame::builder()
            .column("g", vec![1_i64])
            .build()
            .expect("right");
        let out = relaxed_combine_rows(&[&left, &right]).expect("relaxed");
        let ColumnData::Factor(factor) = out.get_column("f").expect("f") else {
            panic!("expected factor");
        };
        assert_eq!(factor.levels(), &["a".to_owned(), "b".to_owned()]);
        assert_eq!(factor.codes(), &[Some(0), Some(1), None]);
    }

    #[test]
    fn combine_columns_requires_equal_rows_and_distinct_names() {
        let left = ab(vec![1, 2], vec!["x", "y"]);
        let right = Frame::builder()
            .column("C", vec![true, false])
            .build()
            .expect("right");
        let out = combine_columns(&[&left, &right]).expect("combine");
        assert_eq!(out.column_names().as_slice(), &["A", "B", "C"]);

        let short = Frame::builder()
            .column("D", vec![1_i64])
            .build()
            .expect("short");
        let err = combine_columns(&[&left, &short]).expect_err("rows");
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);

        let err = combine_columns(&[&left, &left]).expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::Duplicate);
    }

    #[test]
    fn combine_columns_pads_column_metadata() {
        let annotations = Frame::builder()
            .column("unit", vec!["n", "s"])
            .build()
            .expect("annotations");
        let left = ab(vec![1], vec!["x"])
            .set_column_data(Some(annotations))
            .expect("column data");
        let right = Frame::builder()
            .column("C", vec![0.5])
            .build()
            .expect("right");
        let out = combine_columns(&[&left, &right]).expect("combine");
        let column_data = out.column_data().expect("column data");
        assert_eq!(column_data.row_count(), 3);
        out.validate().expect("valid");
    }
}
