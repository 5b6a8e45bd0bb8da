use crate::error::{WindowError, WindowResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column selection applied to each observation's feature vector.
///
/// In config files a selector is written as `null` (all columns), a single
/// index, or a list of indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "Option<SelectorSpec>", into = "Option<SelectorSpec>")]
pub enum FeatureSelector {
    /// Every column, in order
    #[default]
    All,
    /// One column
    Single(usize),
    /// The listed columns, in the listed order
    Subset(Vec<usize>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SelectorSpec {
    Single(usize),
    Subset(Vec<usize>),
}

impl From<Option<SelectorSpec>> for FeatureSelector {
    fn from(spec: Option<SelectorSpec>) -> Self {
        match spec {
            None => FeatureSelector::All,
            Some(SelectorSpec::Single(index)) => FeatureSelector::Single(index),
            Some(SelectorSpec::Subset(indices)) => FeatureSelector::Subset(indices),
        }
    }
}

impl From<FeatureSelector> for Option<SelectorSpec> {
    fn from(selector: FeatureSelector) -> Self {
        match selector {
            FeatureSelector::All => None,
            FeatureSelector::Single(index) => Some(SelectorSpec::Single(index)),
            FeatureSelector::Subset(indices) => Some(SelectorSpec::Subset(indices)),
        }
    }
}

impl FeatureSelector {
    /// Select (and possibly reorder) columns of `features`.
    pub fn apply(&self, features: &[f64]) -> WindowResult<Vec<f64>> {
        let pick = |index: usize| {
            features
                .get(index)
                .copied()
                .ok_or(WindowError::SelectorOutOfRange {
                    index,
                    width: features.len(),
                })
        };

        match self {
            FeatureSelector::All => Ok(features.to_vec()),
            FeatureSelector::Single(index) => Ok(vec![pick(*index)?]),
            FeatureSelector::Subset(indices) => indices.iter().map(|&i| pick(i)).collect(),
        }
    }

    /// Check the selector against a known feature width
    pub fn validate(&self, width: usize) -> WindowResult<()> {
        match self {
            FeatureSelector::All => Ok(()),
            FeatureSelector::Single(index) => check_index(*index, width),
            FeatureSelector::Subset(indices) => {
                if indices.is_empty() {
                    return Err(WindowError::InvalidConfig(
                        "feature subset must name at least one column".to_string(),
                    ));
                }
                indices.iter().try_for_each(|&i| check_index(i, width))
            }
        }
    }
}

fn check_index(index: usize, width: usize) -> WindowResult<()> {
    if index < width {
        Ok(())
    } else {
        Err(WindowError::SelectorOutOfRange { index, width })
    }
}

impl fmt::Display for FeatureSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureSelector::All => write!(f, "all"),
            FeatureSelector::Single(index) => write!(f, "{}", index),
            FeatureSelector::Subset(indices) if indices.len() == 1 => write!(f, "{},", indices[0]),
            FeatureSelector::Subset(indices) => {
                let parts: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

/// Parses `all`, `3` or `0,2` (a trailing comma forces a subset: `3,`).
impl FromStr for FeatureSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(FeatureSelector::All);
        }

        if !s.contains(',') {
            return s
                .parse::<usize>()
                .map(FeatureSelector::Single)
                .map_err(|_| format!("Invalid feature index '{}'", s));
        }

        let indices = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|_| format!("Invalid feature index '{}' in '{}'", part, s))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if indices.is_empty() {
            return Err(format!("Empty feature subset '{}'", s));
        }
        Ok(FeatureSelector::Subset(indices))
    }
}
