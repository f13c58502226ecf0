//! Error types for histcfg

use thiserror::Error;

/// histcfg error type
///
/// Every variant is a configuration-time failure; none is retryable.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// An override or definition names a field outside the descriptor schema.
    #[error("unknown field '{field}' (template '{template}')")]
    UnknownField {
        /// Template being cloned or defined.
        template: String,
        /// Offending field name.
        field: String,
    },

    /// A field value violates a descriptor invariant.
    #[error("invalid value for '{field}' in descriptor '{descriptor}': {reason}")]
    InvalidValue {
        /// Descriptor (or template) name.
        descriptor: String,
        /// Offending field name.
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Two descriptors in the same list share a name.
    #[error("duplicate histogram name '{name}' in descriptor list '{list}'")]
    DuplicateName {
        /// Descriptor list label (analyzer label).
        list: String,
        /// Colliding histogram name.
        name: String,
    },

    /// A template key was looked up but never defined.
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    /// A template key was defined twice.
    #[error("template '{0}' is already defined")]
    DuplicateTemplate(String),

    /// Template derivation refers back to itself.
    #[error("template cycle: {0}")]
    TemplateCycle(String),

    /// The execution path references an analyzer that was never added.
    #[error("unknown analyzer '{0}'")]
    UnknownAnalyzer(String),

    /// Two analyzers share a label, or a label appears twice on the path.
    #[error("duplicate analyzer '{0}'")]
    DuplicateAnalyzer(String),

    /// Malformed or unregistered `key=value` job option.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let e = Error::UnknownField { template: "Pt".into(), field: "discription".into() };
        assert_eq!(e.to_string(), "unknown field 'discription' (template 'Pt')");

        let e = Error::DuplicateName { list: "mt".into(), name: "TauIso".into() };
        assert!(e.to_string().contains("TauIso"));
        assert!(e.to_string().contains("mt"));
    }
}
