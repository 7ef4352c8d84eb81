//! Harness generation
//!
//! A harness is a self-contained program wrapping submitted code with a
//! fixed JSON-in/JSON-out protocol:
//!
//! - **stdin**: one JSON array; each element is the positional argument list
//!   of one case, in sequence order.
//! - **stdout**: one JSON array of equal length and order; each entry is the
//!   case's return value or `{"__error__": "<message>"}`.
//!
//! A failing case never aborts the remaining ones, so a whole suite runs in a
//! single sandbox invocation.

pub mod languages;
pub mod protocol;

pub use languages::LanguageHarness;
pub use protocol::{decode_results, encode_cases, CaseOutput, ProtocolError};

use crate::{
    error::HarnessError,
    models::{FunctionSignature, Language},
    utils::is_identifier,
};

/// Builds wrapper programs for submitted code
pub struct HarnessGenerator;

impl HarnessGenerator {
    /// Wrap `source` so that it runs `signature.name` once per case read from stdin
    pub fn generate(
        language: Language,
        source: &str,
        signature: &FunctionSignature,
    ) -> Result<String, HarnessError> {
        if !is_identifier(&signature.name) {
            return Err(HarnessError::InvalidFunctionName(signature.name.clone()));
        }

        let harness = LanguageHarness::for_language(language);

        if !harness.defines_entry_point(source, &signature.name) {
            tracing::debug!(
                language = %language,
                function = %signature.name,
                "Entry point missing from submitted source"
            );
            return Err(HarnessError::MissingEntryPoint(signature.name.clone()));
        }

        Ok(harness.render(source, &signature.name))
    }
}
