//! Tool discovery for agent capability sources.
//!
//! The [`scanner`] finds declarations that accept the execution-context
//! parameter, [`grouping`] buckets the discovered names into candidate
//! toolsets, and [`Extractor`] ties both together into an [`Extraction`].

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod extraction;
pub mod grouping;
pub mod scanner;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use toolset_primitives::Error as PrimitiveError;
use tracing::{debug, warn};

pub use error::{ExtractorError, ExtractorResult};
pub use extraction::{Extraction, ParseFailure, SourceLocation};
pub use grouping::{
    ContainsAny, DEFAULT_FALLBACK_BUCKET, DEFAULT_RULES, GroupingRule, GroupingTable, ToolMatcher,
};
pub use scanner::{DEFAULT_CONTEXT_TYPE, Declaration, Scanner};

/// Combines a [`Scanner`] with a [`GroupingTable`].
#[derive(Debug)]
pub struct Extractor {
    scanner: Scanner,
    grouping: GroupingTable,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Scanner::default(), GroupingTable::defaults())
    }
}

impl Extractor {
    /// Creates an extractor from its parts.
    #[must_use]
    pub fn new(scanner: Scanner, grouping: GroupingTable) -> Self {
        Self { scanner, grouping }
    }

    /// Returns the grouping table.
    #[must_use]
    pub fn grouping(&self) -> &GroupingTable {
        &self.grouping
    }

    /// Extracts tools from a single source text.
    ///
    /// `origin` labels the source in reported locations.
    #[must_use]
    pub fn extract(&self, origin: &str, source: &str) -> Extraction {
        let (declarations, failures) = self.scanner.scan(source);
        let mut extraction = Extraction::default();
        for declaration in declarations {
            let bucket = self.grouping.classify(declaration.name());
            extraction.record_tool(
                declaration.name(),
                SourceLocation::new(origin, declaration.line()),
                bucket,
            );
        }
        for (line, reason) in failures {
            extraction.record_failure(ParseFailure::new(origin, Some(line), reason));
        }
        debug!(
            origin,
            tools = extraction.tools().len(),
            failures = extraction.failures().len(),
            "source scanned"
        );
        extraction
    }

    /// Extracts tools from raw bytes, reporting undecodable input as a
    /// parse failure with an empty extraction.
    #[must_use]
    pub fn extract_bytes(&self, origin: &str, bytes: &[u8]) -> Extraction {
        match std::str::from_utf8(bytes) {
            Ok(source) => self.extract(origin, source),
            Err(err) => {
                warn!(origin, %err, "source is not valid UTF-8");
                let mut extraction = Extraction::default();
                extraction.record_failure(ParseFailure::new(
                    origin,
                    None,
                    format!("source is not valid UTF-8: {err}"),
                ));
                extraction
            }
        }
    }

    /// Reads and extracts every file in `paths`, merging the results.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Source`] when a file is missing or cannot be
    /// read. Undecodable content is not an error; it is reported as a
    /// [`ParseFailure`].
    pub fn extract_paths<P: AsRef<Path>>(&self, paths: &[P]) -> ExtractorResult<Extraction> {
        let mut merged = Extraction::default();
        for path in paths {
            let path = path.as_ref();
            let bytes = fs::read(path).map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    PrimitiveError::MissingDocument {
                        path: path.to_path_buf(),
                    }
                } else {
                    PrimitiveError::Io {
                        path: path.to_path_buf(),
                        source: err,
                    }
                }
            })?;
            let origin = path.display().to_string();
            merged.merge(self.extract_bytes(&origin, &bytes));
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT_SOURCE: &str = r#"
from google.adk.tools import ToolContext

def upsert_ui_element(
    tool_context: ToolContext, id: str, type: str, props: Dict[str, Any]
) -> Dict[str, str]:
    return {}

def remove_ui_element(tool_context: ToolContext, id: str) -> Dict[str, str]:
    return {}

def setThemeColor(transaction_context: ToolContext, themeColor: str):
    return {}

def render_chart(tool_context: ToolContext, data: list):
    pass

def helper(value: int) -> int:
    return value

async def ping(ctx: ToolContext):
    pass
"#;

    #[test]
    fn extracts_and_groups_declarations() {
        let extraction = Extractor::default().extract("agent/main.py", AGENT_SOURCE);

        assert!(extraction.is_clean());
        let names: Vec<_> = extraction.tools().keys().map(String::as_str).collect();
        assert_eq!(
            names,
            [
                "ping",
                "remove_ui_element",
                "render_chart",
                "setThemeColor",
                "upsert_ui_element"
            ]
        );
        assert!(!extraction.contains_tool("helper"));

        let location = &extraction.tools()["upsert_ui_element"];
        assert_eq!(location.origin(), "agent/main.py");
        assert_eq!(location.line(), 4);

        let groups = extraction.groups();
        assert_eq!(groups["ui_elements"].len(), 2);
        assert!(groups["theme"].contains("setThemeColor"));
        assert!(groups["charts"].contains("render_chart"));
        assert!(groups["general"].contains("ping"));
    }

    #[test]
    fn undecodable_bytes_yield_empty_extraction() {
        let extraction = Extractor::default().extract_bytes("blob.py", &[0xff, 0xfe, 0x00]);
        assert!(extraction.tools().is_empty());
        assert!(!extraction.is_clean());
        assert!(extraction.failures()[0].reason().contains("UTF-8"));
    }

    #[test]
    fn unterminated_declaration_is_reported_but_others_survive() {
        let source = "def good(ctx: ToolContext):\n    pass\n\ndef broken(ctx: ToolContext,\n";
        let extraction = Extractor::default().extract("tools.py", source);

        assert!(extraction.contains_tool("good"));
        assert!(!extraction.contains_tool("broken"));
        assert_eq!(extraction.failures().len(), 1);
        assert_eq!(extraction.failures()[0].line(), Some(4));
    }

    #[test]
    fn extract_paths_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.py");
        let second = dir.path().join("b.py");
        std::fs::write(&first, "def clear_canvas(tool_context: ToolContext):\n    pass\n").unwrap();
        std::fs::write(
            &second,
            "def clear_canvas(tool_context: ToolContext):\n    pass\ndef create_collection(tool_context: ToolContext):\n    pass\n",
        )
        .unwrap();

        let extraction = Extractor::default()
            .extract_paths(&[&first, &second])
            .unwrap();
        assert_eq!(extraction.tools().len(), 2);
        assert!(extraction.tools()["clear_canvas"].origin().ends_with("a.py"));
        assert!(extraction.groups()["collections"].contains("create_collection"));

        let err = Extractor::default()
            .extract_paths(&[dir.path().join("missing.py")])
            .expect_err("missing file");
        assert!(matches!(err, ExtractorError::Source(_)));
    }
}
