//! Minimal `{{variable}}` templates.

use std::collections::BTreeMap;

use crate::error::{MigrationError, MigrationResult};

/// Text with `{{name}}` placeholders. Every placeholder must be supplied at
/// render time; substituted values are never re-scanned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    text: &'static str,
}

impl Template {
    /// Wraps template text.
    #[must_use]
    pub const fn new(text: &'static str) -> Self {
        Self { text }
    }

    /// Returns the placeholder names in order of first appearance.
    #[must_use]
    pub fn variables(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.text;
        while let Some(((_, name), after)) = next_placeholder(rest) {
            if !names.contains(&name) {
                names.push(name);
            }
            rest = after;
        }
        names
    }

    /// Substitutes every placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::MissingVariable`] for a placeholder absent
    /// from `values`.
    pub fn render(&self, values: &BTreeMap<&str, String>) -> MigrationResult<String> {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text;
        while let Some(((literal, name), after)) = next_placeholder(rest) {
            let value = values
                .get(name)
                .ok_or_else(|| MigrationError::MissingVariable {
                    name: name.to_owned(),
                })?;
            out.push_str(literal);
            out.push_str(value);
            rest = after;
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Splits `text` at its next placeholder into `((literal, name), remainder)`.
fn next_placeholder(text: &str) -> Option<((&str, &str), &str)> {
    let open = text.find("{{")?;
    let close = text[open + 2..].find("}}")? + open + 2;
    let name = text[open + 2..close].trim();
    Some(((&text[..open], name), &text[close + 2..]))
}
