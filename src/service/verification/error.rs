//! Error type for the verification pipeline

use thiserror::Error;

use crate::extractor::ExtractorError;
use crate::proof::ProofError;

/// Everything that can terminate a verification attempt before evaluation.
/// A malformed extractor response is not here: it degrades to an empty
/// extraction and the pipeline runs to a normal verdict.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VerificationError {
    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Extractor(#[from] ExtractorError),
}
