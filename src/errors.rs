//! Error types with rich diagnostics using miette
//!
//! Nothing here aborts a whole render. Each layer reports its failure as a
//! diagnostic, which the render pass turns into a [`Notice`] while the other
//! layers carry on.

use std::fmt;

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Serialize;
use thiserror::Error;

use crate::geo::Geography;

// ============================================================================
// Topology Errors
// ============================================================================

/// Problems with the supplied boundary data
#[derive(Error, Diagnostic, Debug)]
pub enum TopologyError {
    #[error("topology has no `{object}` object, required for {geography}")]
    #[diagnostic(code(cartograph::topology::missing_object))]
    MissingObject {
        object: String,
        geography: Geography,
        #[help]
        expected: Option<String>,
    },

    #[error("no topology supplied for {geography}")]
    #[diagnostic(code(cartograph::topology::missing))]
    Missing { geography: Geography },

    #[error("arc index {index} is out of range ({count} arcs)")]
    #[diagnostic(code(cartograph::topology::arc_out_of_range))]
    ArcOutOfRange { index: i64, count: usize },

    #[error("malformed `{kind}` geometry: {reason}")]
    #[diagnostic(code(cartograph::topology::malformed_geometry))]
    MalformedGeometry { kind: String, reason: String },

    #[error("invalid topology JSON")]
    #[diagnostic(code(cartograph::topology::json))]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Custom Map Errors
// ============================================================================

/// Problems with hand-supplied map markup
#[derive(Error, Diagnostic, Debug)]
pub enum CustomMapError {
    #[error("custom map markup is not well-formed: {reason}")]
    #[diagnostic(code(cartograph::custom_map::malformed))]
    Malformed {
        reason: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("parsing stopped here")]
        span: SourceSpan,
    },

    #[error("custom map has no root group")]
    #[diagnostic(code(cartograph::custom_map::missing_root))]
    MissingRoot {
        #[help]
        accepted: Option<String>,
    },

    #[error("custom map root group contains no region elements")]
    #[diagnostic(
        code(cartograph::custom_map::no_regions),
        help("regions are <path>, <polygon>, <rect>, <circle> or <g> elements with an id")
    )]
    NoRegions,
}

// ============================================================================
// Settings Errors
// ============================================================================

/// Problems loading settings supplied by a host
#[derive(Error, Diagnostic, Debug)]
pub enum SettingsError {
    #[error("invalid settings JSON")]
    #[diagnostic(code(cartograph::settings::json))]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Layer Errors
// ============================================================================

/// Failure of the boundary layer. The render pass reports it and keeps
/// going; the other layers degrade to defaults and never fail.
#[derive(Error, Diagnostic, Debug)]
pub enum LayerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    CustomMap(#[from] CustomMapError),
}

impl LayerError {
    /// Layer the failure is reported under
    pub fn layer(&self) -> Layer {
        match self {
            LayerError::Topology(_) => Layer::Boundaries,
            LayerError::CustomMap(_) => Layer::CustomMap,
        }
    }
}

// ============================================================================
// Notices
// ============================================================================

/// Scene layer a notice belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    /// Topology-backed base map
    Boundaries,
    /// Hand-supplied map markup
    CustomMap,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Layer::Boundaries => "boundaries",
            Layer::CustomMap => "custom map",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A user-facing message surfaced by a render pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub layer: Layer,
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub help: Option<String>,
}

impl Notice {
    pub fn warning(layer: Layer, message: impl Into<String>) -> Self {
        Self {
            layer,
            severity: Severity::Warning,
            code: None,
            message: message.into(),
            help: None,
        }
    }

    /// Build a notice from any diagnostic, keeping its code and help text
    pub fn from_diagnostic(layer: Layer, severity: Severity, diag: &dyn Diagnostic) -> Self {
        Self {
            layer,
            severity,
            code: diag.code().map(|c| c.to_string()),
            message: diag.to_string(),
            help: diag.help().map(|h| h.to_string()),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.layer, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_keeps_code_and_help() {
        let err = TopologyError::MissingObject {
            object: "states".into(),
            geography: Geography::UsaStates,
            expected: Some("add a `states` object".into()),
        };
        let notice = Notice::from_diagnostic(Layer::Boundaries, Severity::Error, &err);
        assert_eq!(notice.code.as_deref(), Some("cartograph::topology::missing_object"));
        assert_eq!(notice.help.as_deref(), Some("add a `states` object"));
        assert_eq!(
            notice.message,
            "topology has no `states` object, required for usa-states"
        );
    }
}
