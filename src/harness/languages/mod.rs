//! Language-specific harness templates
//!
//! Each supported [`Language`] maps to one [`LanguageHarness`] carrying a pure
//! template function, an entry-point detector, and the file/command used to
//! run the rendered program in the sandbox.

pub mod javascript;
pub mod python;

use crate::models::Language;

/// Marker replaced by the submitted source
pub(crate) const USER_CODE_MARKER: &str = "__USER_CODE__";

/// Marker replaced by the entry-point function name
pub(crate) const FUNCTION_NAME_MARKER: &str = "__FUNCTION_NAME__";

/// Harness template and run settings for one language
#[derive(Debug, Clone)]
pub struct LanguageHarness {
    source_file: &'static str,
    run_command: &'static str,
    template: &'static str,
    entry_point: fn(&str, &str) -> bool,
}

impl LanguageHarness {
    /// Get harness for a specific language
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Python => python::harness(),
            Language::JavaScript => javascript::harness(),
        }
    }

    /// File name the rendered program is written to inside the sandbox
    pub fn source_file(&self) -> &'static str {
        self.source_file
    }

    /// Shell command running the program, reading cases from stdin
    pub fn run_command(&self) -> &'static str {
        self.run_command
    }

    /// Whether `source` defines a function or method called `name`
    pub fn defines_entry_point(&self, source: &str, name: &str) -> bool {
        (self.entry_point)(source, name)
    }

    /// Render the wrapper program; `name` must already be a valid identifier
    pub fn render(&self, source: &str, name: &str) -> String {
        let template = self.template.replace(FUNCTION_NAME_MARKER, name);
        match template.split_once(USER_CODE_MARKER) {
            Some((head, tail)) => format!("{head}{source}{tail}"),
            None => template,
        }
    }
}
