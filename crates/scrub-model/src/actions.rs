//! Pipeline stages and their closed action vocabularies.
//!
//! Each stage's vocabulary is a closed enum rather than a string map, so a
//! plan holding one of these values cannot reference an unknown action. The
//! string form only exists at the edge: collaborator-supplied plans arrive as
//! tokens and go through [`StageAction::parse_token`], which is the single
//! place an `UnknownAction` error can originate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of the cleaning pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Manual column pruning.
    Prune,
    /// Missing-value repair.
    Missing,
    /// Outlier handling.
    Outliers,
    /// Correlation-based feature pruning.
    Correlation,
    /// Categorical encoding.
    Encoding,
    /// Numeric scaling.
    Scaling,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Prune => "prune",
            Self::Missing => "missing",
            Self::Outliers => "outliers",
            Self::Correlation => "correlation",
            Self::Encoding => "encoding",
            Self::Scaling => "scaling",
        }
    }

    /// The stage's fixed action vocabulary, as wire tokens.
    pub fn vocabulary(self) -> &'static [&'static str] {
        match self {
            Self::Prune | Self::Correlation => &["drop"],
            Self::Missing => &["mean", "median", "mode", "drop_row", "drop_col"],
            Self::Outliers => &["cap", "remove_row", "skip"],
            Self::Encoding => &["one_hot", "label", "skip"],
            Self::Scaling => &["standard", "minmax", "skip"],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An action belonging to one stage's closed vocabulary.
pub trait StageAction: Copy + Eq + fmt::Debug {
    /// The stage this vocabulary belongs to.
    const STAGE: Stage;

    /// Wire token for this action.
    fn token(self) -> &'static str;

    /// Decode a wire token, `None` when it is outside the vocabulary.
    fn parse_token(token: &str) -> Option<Self>;
}

/// Missing-value repair actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingAction {
    /// Fill with the column mean.
    Mean,
    /// Fill with the column median.
    Median,
    /// Fill with the most frequent value.
    Mode,
    /// Drop the rows that are missing in this column.
    DropRow,
    /// Drop the whole column.
    DropCol,
}

impl StageAction for MissingAction {
    const STAGE: Stage = Stage::Missing;

    fn token(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::DropRow => "drop_row",
            Self::DropCol => "drop_col",
        }
    }

    fn parse_token(token: &str) -> Option<Self> {
        match token {
            "mean" => Some(Self::Mean),
            "median" => Some(Self::Median),
            "mode" => Some(Self::Mode),
            "drop_row" => Some(Self::DropRow),
            "drop_col" => Some(Self::DropCol),
            _ => None,
        }
    }
}

/// Outlier handling actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierAction {
    /// Clip values to the IQR fences.
    Cap,
    /// Drop the out-of-fence rows.
    RemoveRow,
    /// Leave the column untouched.
    Skip,
}

impl StageAction for OutlierAction {
    const STAGE: Stage = Stage::Outliers;

    fn token(self) -> &'static str {
        match self {
            Self::Cap => "cap",
            Self::RemoveRow => "remove_row",
            Self::Skip => "skip",
        }
    }

    fn parse_token(token: &str) -> Option<Self> {
        match token {
            "cap" => Some(Self::Cap),
            "remove_row" => Some(Self::RemoveRow),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Categorical encoding actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingAction {
    /// Fan the column out into one indicator column per category
    /// (first category dropped).
    OneHot,
    /// Replace categories with integer codes in place.
    Label,
    /// Leave the column untouched.
    Skip,
}

impl StageAction for EncodingAction {
    const STAGE: Stage = Stage::Encoding;

    fn token(self) -> &'static str {
        match self {
            Self::OneHot => "one_hot",
            Self::Label => "label",
            Self::Skip => "skip",
        }
    }

    fn parse_token(token: &str) -> Option<Self> {
        match token {
            "one_hot" => Some(Self::OneHot),
            "label" => Some(Self::Label),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Numeric scaling actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingAction {
    /// Zero mean, unit variance.
    Standard,
    /// Rescale into [0, 1].
    MinMax,
    /// Leave the column untouched.
    Skip,
}

impl StageAction for ScalingAction {
    const STAGE: Stage = Stage::Scaling;

    fn token(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::MinMax => "minmax",
            Self::Skip => "skip",
        }
    }

    fn parse_token(token: &str) -> Option<Self> {
        match token {
            "standard" => Some(Self::Standard),
            "minmax" => Some(Self::MinMax),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_parse() {
        for stage in [
            Stage::Missing,
            Stage::Outliers,
            Stage::Encoding,
            Stage::Scaling,
        ] {
            for token in stage.vocabulary() {
                let parsed = match stage {
                    Stage::Missing => MissingAction::parse_token(token).map(|a| a.token()),
                    Stage::Outliers => OutlierAction::parse_token(token).map(|a| a.token()),
                    Stage::Encoding => EncodingAction::parse_token(token).map(|a| a.token()),
                    Stage::Scaling => ScalingAction::parse_token(token).map(|a| a.token()),
                    _ => unreachable!(),
                };
                assert_eq!(parsed, Some(*token));
            }
        }
    }

    #[test]
    fn serde_tokens_match_wire_tokens() {
        let json = serde_json::to_string(&MissingAction::DropCol).unwrap();
        assert_eq!(json, "\"drop_col\"");
        let json = serde_json::to_string(&EncodingAction::OneHot).unwrap();
        assert_eq!(json, "\"one_hot\"");
    }

    #[test]
    fn unknown_token_is_rejected() {
        assert_eq!(OutlierAction::parse_token("winsorize"), None);
    }
}
