// src/pipeline/mod.rs
//
// The validation and normalization core: raw model text in, flat
// exportable rows (or a typed failure) out. Pure and stateless; each
// call operates on one self-contained text blob, so concurrent
// invocations need no coordination.

pub mod dates;
pub mod flatten;
pub mod parser;
pub mod record;
pub mod schema;

pub use flatten::flatten;
pub use parser::ParseError;
pub use record::{ExtractionRecord, FlatRow, LineItem};
pub use schema::ValidationPolicy;

/// Failure of the extraction pipeline for one form.
///
/// Display strings are shown to the operator as-is ("recognition
/// failed: ..."), so they carry enough detail to act on.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("could not recognize structured data: {0}")]
    Unrecognized(#[from] ParseError),

    #[error("extraction result does not have the expected shape")]
    InvalidShape,

    #[error("line item could not be exported: {0}")]
    BadLineItem(String),
}

/// Parse and validate one raw model response into a typed record.
pub fn recognize(
    raw_model_text: &str,
    policy: &ValidationPolicy,
) -> Result<ExtractionRecord, PipelineError> {
    let payload = parser::parse(raw_model_text)?;
    if !schema::validate(&payload, policy) {
        return Err(PipelineError::InvalidShape);
    }
    // Validation just passed, so a failed projection is the same outcome.
    ExtractionRecord::from_payload(&payload).ok_or(PipelineError::InvalidShape)
}

/// Full pipeline: raw model text to ordered flat rows.
pub fn process(
    raw_model_text: &str,
    policy: &ValidationPolicy,
) -> Result<Vec<FlatRow>, PipelineError> {
    let record = recognize(raw_model_text, policy)?;
    flatten(&record)
}
