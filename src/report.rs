//! JSON result envelopes.
//!
//! Each operation has one fixed envelope shape. Errors reuse the same shape
//! with default body fields and a populated `error`, so callers always parse a
//! single schema and branch on `error`.

use crate::compare::Metadata;
use crate::engine::ComparisonResult;
use crate::locate::{Location, Offset, RelativePosition};
use crate::region::Rect;
use crate::search::MatchResult;
use crate::util::{ErrorKind, VtError, VtResult};
use serde::{Deserialize, Serialize};

/// Rounds a percentage to two decimals for stable textual output.
pub fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parses caller metadata; a missing or blank document is an empty object.
pub fn parse_metadata(json: Option<&str>) -> VtResult<Metadata> {
    match json.map(str::trim) {
        None | Some("") => Ok(Metadata::new()),
        Some(text) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(VtError::InvalidParameter(
                "metadata JSON must be an object".to_string(),
            )),
            Err(err) => Err(VtError::InvalidParameter(format!("metadata JSON: {err}"))),
        },
    }
}

/// Error payload of an envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&VtError> for ErrorBody {
    fn from(err: &VtError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Serialization shared by all envelopes.
pub trait Envelope: Serialize {
    /// Returns the error payload, if any.
    fn error(&self) -> Option<&ErrorBody>;

    /// Serializes the envelope to compact JSON.
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            serde_json::json!({
                "error": {
                    "kind": ErrorKind::InternalFailure,
                    "message": format!("encoding result: {err}"),
                }
            })
            .to_string()
        })
    }

    /// Serializes the envelope to indented JSON.
    fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Envelope of `compare`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareEnvelope {
    pub obtained_similarity: f64,
    pub passed: bool,
    pub diff_pixel_count: u64,
    pub total_pixel_count: u64,
    pub result_image_ref: Option<String>,
    pub metadata: Metadata,
    pub error: Option<ErrorBody>,
}

impl CompareEnvelope {
    pub fn success(result: ComparisonResult) -> Self {
        Self {
            obtained_similarity: round_percent(result.obtained_similarity),
            passed: result.passed,
            diff_pixel_count: result.diff_pixel_count,
            total_pixel_count: result.total_pixel_count,
            result_image_ref: result.result_image_ref,
            metadata: result.metadata,
            error: None,
        }
    }

    pub fn failure(err: &VtError, metadata: Metadata) -> Self {
        Self {
            obtained_similarity: 0.0,
            passed: false,
            diff_pixel_count: 0,
            total_pixel_count: 0,
            result_image_ref: None,
            metadata,
            error: Some(err.into()),
        }
    }
}

impl Envelope for CompareEnvelope {
    fn error(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }
}

/// Match fields shared by `search` and the two matches of `locate`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchBody {
    pub found: bool,
    pub confidence: f64,
    pub bounding_box: Option<Rect>,
}

impl MatchBody {
    pub fn not_found() -> Self {
        Self {
            found: false,
            confidence: 0.0,
            bounding_box: None,
        }
    }
}

impl From<&MatchResult> for MatchBody {
    fn from(result: &MatchResult) -> Self {
        Self {
            found: result.found,
            confidence: round_percent(result.confidence),
            bounding_box: result.bounding_box,
        }
    }
}

/// Envelope of `search`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchEnvelope {
    #[serde(flatten)]
    pub result: MatchBody,
    pub metadata: Metadata,
    pub error: Option<ErrorBody>,
}

impl SearchEnvelope {
    pub fn success(result: &MatchResult, metadata: Metadata) -> Self {
        Self {
            result: result.into(),
            metadata,
            error: None,
        }
    }

    pub fn failure(err: &VtError, metadata: Metadata) -> Self {
        Self {
            result: MatchBody::not_found(),
            metadata,
            error: Some(err.into()),
        }
    }
}

impl Envelope for SearchEnvelope {
    fn error(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }
}

/// Envelope of `locate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateEnvelope {
    pub main_match: MatchBody,
    pub relative_match: MatchBody,
    pub relative_offset: Option<Offset>,
    pub relative_position: Option<RelativePosition>,
    pub metadata: Metadata,
    pub error: Option<ErrorBody>,
}

impl LocateEnvelope {
    pub fn success(location: &Location, metadata: Metadata) -> Self {
        Self {
            main_match: (&location.main_match).into(),
            relative_match: (&location.relative_match).into(),
            relative_offset: location.relative_offset,
            relative_position: location.relative_position,
            metadata,
            error: None,
        }
    }

    pub fn failure(err: &VtError, metadata: Metadata) -> Self {
        Self {
            main_match: MatchBody::not_found(),
            relative_match: MatchBody::not_found(),
            relative_offset: None,
            relative_position: None,
            metadata,
            error: Some(err.into()),
        }
    }
}

impl Envelope for LocateEnvelope {
    fn error(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }
}
