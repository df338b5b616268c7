use std::collections::HashMap;

use nf_types::Scalar;
use serde::{Deserialize, Serialize};

use crate::{ColumnError, ColumnLike, check_assignment, check_positions};

/// Categorical encoding: per-row codes into a list of unique levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFactor")]
pub struct Factor {
    codes: Vec<Option<usize>>,
    levels: Vec<String>,
    ordered: bool,
}

#[derive(Deserialize)]
struct RawFactor {
    codes: Vec<Option<usize>>,
    levels: Vec<String>,
    ordered: bool,
}

impl TryFrom<RawFactor> for Factor {
    type Error = ColumnError;

    fn try_from(raw: RawFactor) -> Result<Self, ColumnError> {
        Self::new(raw.codes, raw.levels, raw.ordered)
    }
}

fn level_map(levels: &[String]) -> Result<HashMap<&str, usize>, ColumnError> {
    let mut map = HashMap::with_capacity(levels.len());
    for (idx, level) in levels.iter().enumerate() {
        if map.insert(level.as_str(), idx).is_some() {
            return Err(ColumnError::DuplicateLevel {
                level: level.clone(),
            });
        }
    }
    Ok(map)
}

impl Factor {
    pub fn new(
        codes: Vec<Option<usize>>,
        levels: Vec<String>,
        ordered: bool,
    ) -> Result<Self, ColumnError> {
        level_map(&levels)?;
        if let Some(code) = codes.iter().flatten().find(|&&code| code >= levels.len()) {
            return Err(ColumnError::InvalidLevelCode {
                code: *code,
                levels: levels.len(),
            });
        }
        Ok(Self {
            codes,
            levels,
            ordered,
        })
    }

    /// Encode labels, assigning levels in order of first appearance.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut levels = Vec::<String>::new();
        let mut lookup = HashMap::<String, usize>::new();
        let codes = labels
            .into_iter()
            .map(|label| {
                label.map(|label| {
                    let label = label.into();
                    *lookup.entry(label.clone()).or_insert_with(|| {
                        levels.push(label);
                        levels.len() - 1
                    })
                })
            })
            .collect();
        Self {
            codes,
            levels,
            ordered: false,
        }
    }

    /// A factor of `len` missing codes over the given levels.
    #[must_use]
    pub fn missing(levels: Vec<String>, ordered: bool, len: usize) -> Self {
        Self {
            codes: vec![None; len],
            levels,
            ordered,
        }
    }

    #[must_use]
    pub fn codes(&self) -> &[Option<usize>] {
        &self.codes
    }

    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    #[must_use]
    pub fn label(&self, idx: usize) -> Option<&str> {
        self.codes
            .get(idx)
            .copied()
            .flatten()
            .and_then(|code| self.levels.get(code))
            .map(String::as_str)
    }

    #[must_use]
    pub fn to_scalars(&self) -> Vec<Scalar> {
        (0..self.len())
            .map(|idx| self.label(idx).map_or_else(Scalar::missing, Scalar::from))
            .collect()
    }

    /// Remove levels no code refers to, keeping the survivors' order.
    #[must_use]
    pub fn drop_unused_levels(&self) -> Self {
        let mut used = vec![false; self.levels.len()];
        for code in self.codes.iter().flatten() {
            used[*code] = true;
        }

        let mut remap = vec![None; self.levels.len()];
        let mut levels = Vec::new();
        for (idx, level) in self.levels.iter().enumerate() {
            if used[idx] {
                remap[idx] = Some(levels.len());
                levels.push(level.clone());
            }
        }

        Self {
            codes: self.codes.iter().map(|code| code.and_then(|c| remap[c])).collect(),
            levels,
            ordered: self.ordered,
        }
    }

    /// Replace the level set. Codes follow their labels; labels absent from
    /// `levels` become missing.
    pub fn set_levels(&self, levels: Vec<String>) -> Result<Self, ColumnError> {
        let lookup = level_map(&levels)?;
        let remap = self
            .levels
            .iter()
            .map(|level| lookup.get(level.as_str()).copied())
            .collect::<Vec<_>>();
        Ok(Self {
            codes: self.codes.iter().map(|code| code.and_then(|c| remap[c])).collect(),
            levels,
            ordered: self.ordered,
        })
    }

    /// Move the existing `level` to the front, keeping the others in order.
    pub fn relevel(&self, level: &str) -> Result<Self, ColumnError> {
        if !self.levels.iter().any(|known| known == level) {
            return Err(ColumnError::UnknownLevel {
                level: level.to_owned(),
            });
        }
        let levels = std::iter::once(level.to_owned())
            .chain(self.levels.iter().filter(|known| *known != level).cloned())
            .collect();
        self.set_levels(levels)
    }

    /// Codes of `other` translated into this factor's level space, extending
    /// `levels` with any label it does not know yet.
    fn translate(levels: &mut Vec<String>, other: &Self) -> Vec<Option<usize>> {
        let remap = other
            .levels
            .iter()
            .map(|level| match levels.iter().position(|known| known == level) {
                Some(idx) => idx,
                None => {
                    levels.push(level.clone());
                    levels.len() - 1
                }
            })
            .collect::<Vec<_>>();
        other.codes.iter().map(|code| code.map(|c| remap[c])).collect()
    }
}

impl ColumnLike for Factor {
    type Error = ColumnError;

    fn height(&self) -> usize {
        self.len()
    }

    fn take(&self, positions: &[usize]) -> Result<Self, ColumnError> {
        check_positions(positions, self.len())?;
        Ok(Self {
            codes: positions.iter().map(|&idx| self.codes[idx]).collect(),
            levels: self.levels.clone(),
            ordered: self.ordered,
        })
    }

    fn concat(parts: &[&Self]) -> Result<Self, ColumnError> {
        let Some(first) = parts.first() else {
            return Ok(Self::missing(Vec::new(), false, 0));
        };

        let all_same = parts
            .iter()
            .all(|part| part.levels == first.levels && part.ordered == first.ordered);
        if all_same {
            let codes = parts
                .iter()
                .flat_map(|part| part.codes.iter().copied())
                .collect();
            return Ok(Self {
                codes,
                levels: first.levels.clone(),
                ordered: first.ordered,
            });
        }

        let mut levels = Vec::new();
        let mut codes = Vec::new();
        for part in parts {
            codes.extend(Self::translate(&mut levels, part));
        }
        Ok(Self {
            codes,
            levels,
            ordered: false,
        })
    }

    fn assign(&self, positions: &[usize], replacement: &Self) -> Result<Self, ColumnError> {
        check_assignment(positions, self.len(), replacement.len())?;
        let mut levels = self.levels.clone();
        let incoming = if replacement.levels == self.levels {
            replacement.codes.clone()
        } else {
            Self::translate(&mut levels, replacement)
        };

        let mut codes = self.codes.clone();
        for (slot, code) in positions.iter().zip(incoming) {
            codes[*slot] = code;
        }
        Ok(Self {
            codes,
            levels,
            ordered: self.ordered,
        })
    }
}
