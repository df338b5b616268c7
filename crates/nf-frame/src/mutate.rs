use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use nf_columnar::ColumnLike;
use nf_index::{Key, Names, Selector, resolve_strict};

use crate::{
    ColumnData, Frame, FrameError, Metadata, check_column_data, check_row_names,
    relaxed_combine_rows,
};

/// In-place editing handle returned by [`Frame::edit`].
///
/// Each call checks all of its inputs before touching the frame, so a
/// failed call leaves the frame as it was.
#[derive(Debug)]
pub struct FrameMut<'a> {
    frame: &'a mut Frame,
}

impl Frame {
    pub fn edit(&mut self) -> FrameMut<'_> {
        FrameMut { frame: self }
    }

    fn edited(
        &self,
        apply: impl FnOnce(&mut FrameMut<'_>) -> Result<(), FrameError>,
    ) -> Result<Frame, FrameError> {
        let mut out = self.clone();
        apply(&mut out.edit())?;
        Ok(out)
    }

    pub fn set_row_names(&self, names: Option<Vec<String>>) -> Result<Frame, FrameError> {
        self.edited(|edit| edit.set_row_names(names))
    }

    pub fn set_column_names(&self, names: Vec<String>) -> Result<Frame, FrameError> {
        self.edited(|edit| edit.set_column_names(names))
    }

    pub fn rename_columns<I, K, V>(&self, mapping: I) -> Result<Frame, FrameError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.edited(|edit| edit.rename_columns(mapping))
    }

    pub fn set_column_data(&self, column_data: Option<Frame>) -> Result<Frame, FrameError> {
        self.edited(|edit| edit.set_column_data(column_data))
    }

    #[must_use]
    pub fn set_metadata(&self, metadata: Metadata) -> Frame {
        let mut out = self.clone();
        out.edit().set_metadata(metadata);
        out
    }

    pub fn set_column(
        &self,
        key: impl Into<Key>,
        data: impl Into<ColumnData>,
    ) -> Result<Frame, FrameError> {
        self.edited(|edit| edit.set_column(key, data))
    }

    pub fn set_columns(&self, bindings: Vec<(Key, ColumnData)>) -> Result<Frame, FrameError> {
        self.edited(|edit| edit.set_columns(bindings))
    }

    pub fn remove_column(&self, key: impl Into<Key>) -> Result<Frame, FrameError> {
        self.edited(|edit| edit.remove_columns(&[key.into()]))
    }

    pub fn remove_columns(&self, keys: &[Key]) -> Result<Frame, FrameError> {
        self.edited(|edit| edit.remove_columns(keys))
    }

    pub fn set_slice(
        &self,
        rows: impl Into<Selector>,
        columns: impl Into<Selector>,
        replacement: &Frame,
    ) -> Result<Frame, FrameError> {
        self.edited(|edit| edit.set_slice(rows, columns, replacement))
    }

    pub fn remove_rows(&self, rows: impl Into<Selector>) -> Result<Frame, FrameError> {
        self.edited(|edit| edit.remove_rows(rows))
    }

    pub fn map_numeric(&self, f: impl Fn(f64) -> f64) -> Result<Frame, FrameError> {
        self.edited(|edit| edit.map_numeric(f))
    }
}

impl FrameMut<'_> {
    #[must_use]
    pub fn frame(&self) -> &Frame {
        self.frame
    }

    pub fn set_row_names(&mut self, names: Option<Vec<String>>) -> Result<(), FrameError> {
        let names = names.map(Names::new);
        if let Some(names) = &names {
            check_row_names(names, self.frame.row_count)?;
        }
        self.frame.row_names = names;
        Ok(())
    }

    /// Rename every column positionally. Column data follows its position.
    pub fn set_column_names(&mut self, names: Vec<String>) -> Result<(), FrameError> {
        let names = Names::new(names);
        if names.len() != self.frame.column_count() {
            return Err(FrameError::ColumnNamesLength {
                names: names.len(),
                columns: self.frame.column_count(),
            });
        }
        if let Some(name) = names.first_duplicate() {
            return Err(FrameError::DuplicateColumnName {
                name: name.to_owned(),
            });
        }
        let columns = names
            .iter()
            .zip(self.frame.iter_columns())
            .map(|(new, (_, column))| (new.to_owned(), Arc::clone(column)))
            .collect::<BTreeMap<_, _>>();
        self.frame.columns = columns;
        self.frame.column_names = names;
        Ok(())
    }

    /// Rename the named columns, leaving the rest alone.
    pub fn rename_columns<I, K, V>(&mut self, mapping: I) -> Result<(), FrameError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut names = self.frame.column_names.clone().into_vec();
        for (old, new) in mapping {
            let old = old.into();
            let position = self
                .frame
                .column_names
                .position(&old)
                .ok_or(FrameError::ColumnNotFound { name: old })?;
            names[position] = new.into();
        }
        self.set_column_names(names)
    }

    pub fn set_column_data(&mut self, column_data: Option<Frame>) -> Result<(), FrameError> {
        if let Some(column_data) = &column_data {
            check_column_data(column_data, self.frame.column_count())?;
        }
        self.frame.column_data = column_data.map(Box::new);
        Ok(())
    }

    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.frame.metadata = metadata;
    }

    pub fn set_column(
        &mut self,
        key: impl Into<Key>,
        data: impl Into<ColumnData>,
    ) -> Result<(), FrameError> {
        self.set_columns(vec![(key.into(), data.into())])
    }

    /// Replace or append columns. A position must name an existing column;
    /// an unknown name is appended. Column metadata grows by one missing
    /// row per appended column.
    pub fn set_columns(&mut self, bindings: Vec<(Key, ColumnData)>) -> Result<(), FrameError> {
        let mut names = self.frame.column_names.clone();
        let mut columns = self.frame.columns.clone();
        let mut appended = Names::default();

        for (key, data) in bindings {
            let name = match &key {
                Key::Position(_) => {
                    let position = resolve_strict(
                        &key,
                        self.frame.column_count(),
                        Some(&self.frame.column_names),
                    )?;
                    names.get(position).unwrap_or_default().to_owned()
                }
                Key::Label(label) => label.clone(),
            };
            if data.height() != self.frame.row_count {
                return Err(FrameError::HeightMismatch {
                    column: name,
                    height: data.height(),
                    expected: self.frame.row_count,
                });
            }
            if !columns.contains_key(&name) {
                names.push(name.clone());
                appended.push(name.clone());
            }
            columns.insert(name, Arc::new(data));
        }

        let column_data = match (&self.frame.column_data, appended.is_empty()) {
            (Some(existing), false) => {
                let mut placeholder = Frame::with_rows(appended.len());
                if existing.row_names.is_some() {
                    placeholder.row_names = Some(appended);
                }
                Some(Box::new(relaxed_combine_rows(&[&**existing, &placeholder])?))
            }
            (existing, _) => existing.clone(),
        };

        self.frame.column_names = names;
        self.frame.columns = columns;
        self.frame.column_data = column_data;
        Ok(())
    }

    pub fn remove_columns(&mut self, keys: &[Key]) -> Result<(), FrameError> {
        let mut doomed = HashSet::with_capacity(keys.len());
        for key in keys {
            doomed.insert(resolve_strict(
                key,
                self.frame.column_count(),
                Some(&self.frame.column_names),
            )?);
        }
        let kept = (0..self.frame.column_count())
            .filter(|position| !doomed.contains(position))
            .collect::<Vec<_>>();

        let column_data = match &self.frame.column_data {
            Some(existing) => Some(Box::new(existing.take_rows(&kept)?)),
            None => None,
        };
        let names = self.frame.column_names.take(&kept);
        self.frame
            .columns
            .retain(|name, _| names.contains(name));
        self.frame.column_names = names;
        self.frame.column_data = column_data;
        Ok(())
    }

    /// Assign `replacement` into the cells picked by two sequence
    /// selectors. Replacement columns are matched by position.
    pub fn set_slice(
        &mut self,
        rows: impl Into<Selector>,
        columns: impl Into<Selector>,
        replacement: &Frame,
    ) -> Result<(), FrameError> {
        let rows = self.frame.resolve_rows(&rows.into())?;
        if rows.is_scalar {
            return Err(FrameError::ScalarSelector { axis: "row" });
        }
        let columns = self.frame.resolve_columns(&columns.into())?;
        if columns.is_scalar {
            return Err(FrameError::ScalarSelector { axis: "column" });
        }
        if replacement.row_count() != rows.positions.len()
            || replacement.column_count() != columns.positions.len()
        {
            return Err(FrameError::SliceShape {
                rows: replacement.row_count(),
                columns: replacement.column_count(),
                expected_rows: rows.positions.len(),
                expected_columns: columns.positions.len(),
            });
        }

        let mut updated = self.frame.columns.clone();
        for (&position, (_, incoming)) in columns.positions.iter().zip(replacement.iter_columns()) {
            let name = self.frame.column_names.get(position).unwrap_or_default();
            let current = updated
                .get(name)
                .ok_or_else(|| FrameError::ColumnNotFound {
                    name: name.to_owned(),
                })?;
            let assigned = current.assign(&rows.positions, incoming)?;
            updated.insert(name.to_owned(), Arc::new(assigned));
        }
        self.frame.columns = updated;
        Ok(())
    }

    /// Apply `f` to every integer and float array or matrix column. Mapped
    /// columns hold floats; nested frames and other kinds are left alone.
    pub fn map_numeric(&mut self, f: impl Fn(f64) -> f64) -> Result<(), FrameError> {
        let mut columns = self.frame.columns.clone();
        for (name, column) in &self.frame.columns {
            if let Some(mapped) = column.map_numeric(&f)? {
                columns.insert(name.clone(), Arc::new(mapped));
            }
        }
        self.frame.columns = columns;
        Ok(())
    }

    pub fn remove_rows(&mut self, rows: impl Into<Selector>) -> Result<(), FrameError> {
        let doomed = self
            .frame
            .resolve_rows(&rows.into())?
            .positions
            .into_iter()
            .collect::<HashSet<_>>();
        let kept = (0..self.frame.row_count)
            .filter(|position| !doomed.contains(position))
            .collect::<Vec<_>>();
        *self.frame = self.frame.take_rows(&kept)?;
        Ok(())
    }
}
