//! Naming rules for toolset identifiers and tool names.

use crate::error::{Error, Result};

/// Toolset identifiers that may never be declared.
pub const RESERVED_TOOLSET_IDS: [&str; 5] = ["all", "default", "system", "core", "builtin"];

/// Returns `true` if the identifier is one of [`RESERVED_TOOLSET_IDS`].
#[must_use]
pub fn is_reserved_toolset_id(id: &str) -> bool {
    RESERVED_TOOLSET_IDS.contains(&id)
}

/// Validates a toolset identifier.
///
/// Identifiers use lowercase ASCII letters, digits, and underscores, must not
/// start or end with an underscore, and must not be reserved.
///
/// # Errors
///
/// Returns [`Error::InvalidToolsetId`] describing the first rule the
/// identifier breaks.
pub fn validate_toolset_id(id: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(Error::InvalidToolsetId {
            id: id.into(),
            reason: reason.into(),
        })
    };

    if id.is_empty() {
        return reject("identifier cannot be empty");
    }

    if !id
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
    {
        return reject("identifier must contain only lowercase letters, digits, or underscores");
    }

    if id.starts_with('_') || id.ends_with('_') {
        return reject("identifier must not start or end with an underscore");
    }

    if is_reserved_toolset_id(id) {
        return reject("identifier is reserved");
    }

    Ok(())
}

/// Validates a tool name.
///
/// Tool names start with a lowercase letter followed by ASCII letters, digits,
/// or underscores. Both `snake_case` and `camelCase` names are accepted.
///
/// # Errors
///
/// Returns [`Error::InvalidToolName`] when the name breaks the pattern.
pub fn validate_tool_name(name: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(Error::InvalidToolName {
            name: name.into(),
            reason: reason.into(),
        })
    };

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return reject("tool name cannot be empty");
    };

    if !first.is_ascii_lowercase() {
        return reject("tool name must start with a lowercase letter");
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return reject("tool name must contain only letters, digits, or underscores");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_ids() {
        for id in ["ui_elements", "theme", "v2", "charts_2024", "a__b"] {
            validate_toolset_id(id).unwrap_or_else(|err| panic!("{id}: {err}"));
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        for id in ["", "UI", "ui-elements", "_ui", "ui_", "ui elements", "caf\u{e9}"] {
            let err = validate_toolset_id(id).expect_err(id);
            assert!(matches!(err, Error::InvalidToolsetId { .. }));
        }
    }

    #[test]
    fn rejects_reserved_ids() {
        for id in RESERVED_TOOLSET_IDS {
            let err = validate_toolset_id(id).expect_err(id);
            assert!(err.to_string().contains("reserved"));
        }
    }

    #[test]
    fn tool_names_allow_camel_case() {
        validate_tool_name("upsert_ui_element").unwrap();
        validate_tool_name("setThemeColor").unwrap();
        validate_tool_name("a").unwrap();
    }

    #[test]
    fn tool_names_reject_bad_leading_characters() {
        for name in ["", "_private", "Upsert", "1tool", "bad-name"] {
            let err = validate_tool_name(name).expect_err(name);
            assert!(matches!(err, Error::InvalidToolName { .. }));
        }
    }
}
