//! Comparison specifications.
//!
//! A specification file lists the paths to verify for one test case:
//!
//! ```json
//! {"json-test-key-paths": [
//!     {"json-key-path": "$.ruleset_model_descriptions[0].buildings[*].building_segments[*].zones[*].surfaces[*].area",
//!      "tolerance": 0.1},
//!     {"json-key-path": "$.ruleset_model_descriptions[0].pumps[*].design_electric_power",
//!      "special-case": "W/GPM",
//!      "special-case-value": {"PCHW": 22, "SCHW": 17, "HW": 19, "CW": 19}}
//! ]}
//! ```
//!
//! [`ComparisonSpec::from_value`] validates every entry up front, so a
//! malformed special case is reported before any comparison runs.
use serde::Deserialize;
use serde_json::Value;

use crate::query::PathQuery;

// ---------------------------------------------------------------------------
// SpecError
// ---------------------------------------------------------------------------

/// A comparison specification that cannot be used as written.
#[derive(Debug)]
pub enum SpecError {
    /// The document does not have the expected shape.
    Malformed(serde_json::Error),
    /// Entry `index` has no `json-key-path`.
    MissingPath { index: usize },
    /// `special-case` names a rule that does not exist.
    UnknownSpecialCase { path: String, tag: String },
    /// `special-case-value` is required by the tag but absent.
    MissingPayload { path: String, tag: String },
    /// `special-case-value` has the wrong shape for the tag.
    MalformedPayload {
        path: String,
        tag: String,
        reason: String,
    },
    /// A staged-limit rule without a control sequence.
    MissingSequence { path: String },
    /// A staged-limit rule naming a control sequence with no implementation.
    UnsupportedSequence { path: String, sequence: String },
}

impl std::fmt::Display for SpecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "comparison spec is malformed: {e}"),
            Self::MissingPath { index } => {
                write!(f, "entry {index} of json-test-key-paths has no json-key-path")
            }
            Self::UnknownSpecialCase { path, tag } => {
                write!(f, "unknown special case '{tag}' at '{path}'")
            }
            Self::MissingPayload { path, tag } => {
                write!(f, "special case '{tag}' at '{path}' requires a special-case-value")
            }
            Self::MalformedPayload { path, tag, reason } => {
                write!(f, "special-case-value for '{tag}' at '{path}' is malformed: {reason}")
            }
            Self::MissingSequence { path } => write!(
                f,
                "special-case-value for operation limits at '{path}' must include a controls sequence"
            ),
            Self::UnsupportedSequence { path, sequence } => write!(
                f,
                "operation limit logic is not implemented for the '{sequence}' sequence at '{path}'"
            ),
        }
    }
}

impl std::error::Error for SpecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(e) => Some(e),
            Self::MissingPath { .. }
            | Self::UnknownSpecialCase { .. }
            | Self::MissingPayload { .. }
            | Self::MalformedPayload { .. }
            | Self::MissingSequence { .. }
            | Self::UnsupportedSequence { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawSpec {
    #[serde(rename = "json-test-key-paths", default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "json-key-path")]
    path: Option<String>,
    #[serde(rename = "compare-value")]
    compare_value: Option<bool>,
    tolerance: Option<f64>,
    #[serde(rename = "special-case")]
    special_case: Option<String>,
    #[serde(rename = "special-case-value")]
    special_case_value: Option<Value>,
}

// ---------------------------------------------------------------------------
// Typed entries
// ---------------------------------------------------------------------------

/// Watts per unit flow for each pump role.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PumpRatios {
    /// Primary chilled-water loops.
    pub pchw: Option<f64>,
    /// Secondary (child) chilled-water loops.
    pub schw: Option<f64>,
    /// Heating hot-water loops.
    pub hw: Option<f64>,
    /// Condenser-water loops.
    pub cw: Option<f64>,
}

/// Which operation limit a staged-sequencing rule checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Lower,
    Upper,
}

impl LimitKind {
    /// The boiler field holding the limit.
    pub fn field(self) -> &'static str {
        match self {
            Self::Lower => "operation_lower_limit",
            Self::Upper => "operation_upper_limit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
        }
    }
}

/// A derived-value rule replacing plain path equality.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialCase {
    /// `W/cfm`: supply fan power must equal `ratio * design_airflow`.
    FanPower { ratio: f64 },
    /// `W/GPM`: pump power must equal the loop's ratio times `design_flow`.
    PumpPower(PumpRatios),
    /// `azimuth`: surface azimuths compared across wall-origin flips.
    Azimuth,
    /// `operation_lower_limit` / `operation_upper_limit` with a staged
    /// control sequence.
    StagedLimit(LimitKind),
}

impl SpecialCase {
    /// The tag as written in specification files.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::FanPower { .. } => "W/cfm",
            Self::PumpPower(_) => "W/GPM",
            Self::Azimuth => "azimuth",
            Self::StagedLimit(LimitKind::Lower) => "operation_lower_limit",
            Self::StagedLimit(LimitKind::Upper) => "operation_upper_limit",
        }
    }

    fn parse(path: &str, tag: &str, payload: Option<&Value>) -> Result<Self, SpecError> {
        let malformed = |reason: &str| SpecError::MalformedPayload {
            path: path.to_owned(),
            tag: tag.to_owned(),
            reason: reason.to_owned(),
        };
        let required = || {
            payload.ok_or_else(|| SpecError::MissingPayload {
                path: path.to_owned(),
                tag: tag.to_owned(),
            })
        };
        match tag {
            "W/cfm" => {
                let ratio = required()?
                    .as_f64()
                    .ok_or_else(|| malformed("expected a number"))?;
                Ok(Self::FanPower { ratio })
            }
            "W/GPM" => {
                let table = required()?
                    .as_object()
                    .ok_or_else(|| malformed("expected an object of ratios"))?;
                let mut ratios = PumpRatios::default();
                for (key, value) in table {
                    let ratio = value
                        .as_f64()
                        .ok_or_else(|| malformed(&format!("ratio '{key}' is not a number")))?;
                    let slot = match key.as_str() {
                        "PCHW" => &mut ratios.pchw,
                        "SCHW" => &mut ratios.schw,
                        "HW" => &mut ratios.hw,
                        "CW" => &mut ratios.cw,
                        other => {
                            return Err(malformed(&format!(
                                "unknown loop category '{other}', expected PCHW, SCHW, HW or CW"
                            )));
                        }
                    };
                    *slot = Some(ratio);
                }
                if table.is_empty() {
                    return Err(malformed("no ratios given"));
                }
                Ok(Self::PumpPower(ratios))
            }
            "azimuth" => Ok(Self::Azimuth),
            "operation_lower_limit" | "operation_upper_limit" => {
                let kind = if tag == "operation_lower_limit" {
                    LimitKind::Lower
                } else {
                    LimitKind::Upper
                };
                let sequence = payload
                    .and_then(|p| p.get("sequence"))
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| SpecError::MissingSequence {
                        path: path.to_owned(),
                    })?;
                if sequence != "staged" {
                    return Err(SpecError::UnsupportedSequence {
                        path: path.to_owned(),
                        sequence: sequence.to_owned(),
                    });
                }
                Ok(Self::StagedLimit(kind))
            }
            other => Err(SpecError::UnknownSpecialCase {
                path: path.to_owned(),
                tag: other.to_owned(),
            }),
        }
    }
}

/// One path to verify.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSpecEntry {
    /// The path exactly as written; reported back as the data path.
    pub raw_path: String,
    pub path: PathQuery,
    /// When `false` only presence (or list length) is checked.
    pub compare_value: bool,
    /// Absolute tolerance for numeric values.
    pub tolerance: f64,
    pub special_case: Option<SpecialCase>,
}

impl TestSpecEntry {
    /// A plain entry comparing values with the given tolerance.
    pub fn new(path: &str, tolerance: f64) -> Self {
        Self {
            raw_path: path.to_owned(),
            path: PathQuery::parse(path),
            compare_value: true,
            tolerance,
            special_case: None,
        }
    }

    /// Name of the compared field, the last key of the path.
    pub fn data_element(&self) -> &str {
        self.path.data_element()
    }

    fn from_raw(index: usize, raw: RawEntry) -> Result<Self, SpecError> {
        let raw_path = raw.path.ok_or(SpecError::MissingPath { index })?;
        let special_case = raw
            .special_case
            .as_deref()
            .map(|tag| SpecialCase::parse(&raw_path, tag, raw.special_case_value.as_ref()))
            .transpose()?;
        Ok(Self {
            path: PathQuery::parse(&raw_path),
            raw_path,
            compare_value: raw.compare_value.unwrap_or(true),
            tolerance: raw.tolerance.unwrap_or(0.0),
            special_case,
        })
    }
}

/// All entries of one specification, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonSpec {
    pub entries: Vec<TestSpecEntry>,
}

impl ComparisonSpec {
    /// Validates a parsed specification document.
    pub fn from_value(value: Value) -> Result<Self, SpecError> {
        serde_json::from_value(value)
            .map_err(SpecError::Malformed)
            .and_then(Self::from_raw)
    }

    /// Parses and validates specification text.
    pub fn from_json_str(text: &str) -> Result<Self, SpecError> {
        serde_json::from_str(text)
            .map_err(SpecError::Malformed)
            .and_then(Self::from_raw)
    }

    fn from_raw(raw: RawSpec) -> Result<Self, SpecError> {
        let entries = raw
            .entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| TestSpecEntry::from_raw(index, entry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }
}
