#![forbid(unsafe_code)]

//! In-memory columnar frames whose columns may be typed arrays, factors,
//! matrices, plain scalar lists, or other frames.
//!
//! ```
//! use nestframe::{Frame, JoinKind, MergeBy, MergeOptions, merge};
//!
//! let left = Frame::builder()
//!     .column("id", vec![1_i64, 2, 3])
//!     .column("name", vec!["a", "b", "c"])
//!     .build()
//!     .expect("left");
//! let right = Frame::builder()
//!     .column("id", vec![3_i64, 1])
//!     .column("score", vec![0.5, 0.25])
//!     .build()
//!     .expect("right");
//!
//! let options = MergeOptions { join: JoinKind::Inner, ..MergeOptions::default() };
//! let joined = merge(&[&left, &right], &MergeBy::from("id"), &options).expect("merge");
//! assert_eq!(joined.shape(), (2, 3));
//! ```

pub use nf_columnar::{Column, ColumnError, ColumnLike, Factor, Matrix, ValidityMask};
pub use nf_frame::{
    ColumnData, FlattenOptions, Frame, FrameBuilder, FrameError, FrameMut, Metadata, Projection,
    Record, Value, combine_columns, combine_rows, relaxed_combine_rows,
};
pub use nf_index::{
    IndexError, Key, Names, Resolved, Selector, Slice, normalize, resolve_strict,
};
pub use nf_join::{JoinError, JoinKind, KeySource, MergeBy, MergeOptions, merge};
pub use nf_types::{
    DType, ErrorKind, NullKind, Scalar, TypeError, cast_scalar, common_dtype, infer_dtype,
};
