// crates/pull-server-core/src/core/validation.rs
// ============================================================================
// Module: Pull Server Input Validation
// Description: Shape checks for names and versions used as storage keys.
// Purpose: Reject untrusted input before it reaches any store.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Configuration names, module names, and module versions become storage keys
//! (file names, object keys, SQL parameters). They are validated here so that
//! no input can address anything outside its intended namespace.
//! Security posture: all inputs are untrusted and validation fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::ConfigurationName;
use crate::core::identifiers::ModuleName;
use crate::core::identifiers::ModuleVersion;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum length of a configuration or module name in bytes.
pub const MAX_NAME_LENGTH: usize = 255;
/// Maximum number of dot-separated components in a module version.
pub const MAX_VERSION_COMPONENTS: usize = 4;
/// Maximum number of digits in a single version component.
const MAX_VERSION_COMPONENT_DIGITS: usize = 9;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Validation failures for untrusted protocol input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A name failed shape validation.
    #[error("invalid {field}: {reason}")]
    InvalidName {
        /// Field label.
        field: &'static str,
        /// Failure reason.
        reason: String,
    },
    /// A module version failed shape validation.
    #[error("invalid module version {value:?}: {reason}")]
    InvalidVersion {
        /// Offending version string.
        value: String,
        /// Failure reason.
        reason: String,
    },
    /// A date-time field could not be parsed.
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidTimestamp {
        /// Field label.
        field: &'static str,
        /// Offending input value.
        value: String,
        /// Parser failure reason.
        reason: String,
    },
    /// Any other malformed input.
    #[error("invalid request: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Validators
// ============================================================================

/// Validates a configuration name.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidName`] when the name is empty, too long,
/// or contains characters outside `[A-Za-z0-9._-]`.
pub fn validate_configuration_name(name: &ConfigurationName) -> Result<(), ValidationError> {
    validate_key_segment("configuration name", name.as_str())
}

/// Validates a (name, version) module key.
///
/// # Errors
///
/// Returns [`ValidationError`] when either half of the key is malformed.
pub fn validate_module_key(name: &ModuleName, version: &ModuleVersion) -> Result<(), ValidationError> {
    validate_key_segment("module name", name.as_str())?;
    validate_module_version(version.as_str())
}

/// Validates a single storage key segment.
fn validate_key_segment(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidName {
        field,
        reason: reason.to_string(),
    };
    if value.is_empty() {
        return Err(invalid("must be non-empty"));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(invalid("exceeds maximum length"));
    }
    if !value.as_bytes().first().is_some_and(u8::is_ascii_alphanumeric) {
        return Err(invalid("must start with an ASCII letter or digit"));
    }
    if value.contains("..") {
        return Err(invalid("must not contain '..'"));
    }
    if let Some(bad) =
        value.chars().find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-')))
    {
        return Err(invalid(&format!("contains disallowed character {bad:?}")));
    }
    Ok(())
}

/// Validates a dotted numeric module version such as `1.0` or `2.3.1.4`.
fn validate_module_version(value: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidVersion {
        value: value.to_string(),
        reason: reason.to_string(),
    };
    if value.is_empty() {
        return Err(invalid("must be non-empty"));
    }
    let components: Vec<&str> = value.split('.').collect();
    if components.len() > MAX_VERSION_COMPONENTS {
        return Err(invalid("too many components"));
    }
    for component in components {
        if component.is_empty() || component.len() > MAX_VERSION_COMPONENT_DIGITS {
            return Err(invalid("components must be 1-9 digits"));
        }
        if !component.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid("components must be numeric"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ValidationError;
    use super::validate_configuration_name;
    use super::validate_module_key;
    use crate::core::identifiers::ConfigurationName;
    use crate::core::identifiers::ModuleName;
    use crate::core::identifiers::ModuleVersion;

    fn module(name: &str, version: &str) -> Result<(), ValidationError> {
        validate_module_key(&ModuleName::new(name), &ModuleVersion::new(version))
    }

    #[test]
    fn accepts_common_module_keys() {
        assert!(module("xPSDesiredStateConfiguration", "3.0.0.0").is_ok());
        assert!(module("m", "1.0").is_ok());
        assert!(module("Network_Tools-2", "7").is_ok());
    }

    #[test]
    fn rejects_traversal_in_module_names() {
        assert!(module("../secrets", "1.0").is_err());
        assert!(module("a/../../b", "1.0").is_err());
        assert!(module("a\\b", "1.0").is_err());
        assert!(module(".hidden", "1.0").is_err());
    }

    #[test]
    fn rejects_non_numeric_versions() {
        assert!(matches!(module("m", "1.0-beta"), Err(ValidationError::InvalidVersion { .. })));
        assert!(matches!(module("m", "1..0"), Err(ValidationError::InvalidVersion { .. })));
        assert!(matches!(module("m", "1.2.3.4.5"), Err(ValidationError::InvalidVersion { .. })));
        assert!(matches!(module("m", ""), Err(ValidationError::InvalidVersion { .. })));
    }

    #[test]
    fn configuration_names_follow_key_rules() {
        assert!(validate_configuration_name(&ConfigurationName::new("WebServer.prod")).is_ok());
        assert!(validate_configuration_name(&ConfigurationName::new("")).is_err());
        assert!(validate_configuration_name(&ConfigurationName::new("web server")).is_err());
    }
}
