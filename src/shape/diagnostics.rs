use serde::Serialize;

/// What the resolver recovered from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The embedded blob could not be decoded and was ignored
    MalformedBlob,
    /// The blob's descriptor does not match the pixel rank
    DescriptorMismatch,
    /// Native axis hints were inconsistent with the pixel buffer
    InferenceAbandoned,
    /// The blob's calibrations did not fit the resolved axes
    CalibrationsDiscarded,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
