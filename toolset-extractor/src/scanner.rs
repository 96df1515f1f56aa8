//! Declaration scanner.
//!
//! A tool is any `def`, `async def`, or `fn` declaration (Rust qualifiers
//! such as `const`, `unsafe`, and `extern "C"` included) whose parameter list
//! contains a parameter annotated with the execution-context type. The scanner
//! is purely textual: it balances brackets to find the end of each parameter
//! list and never evaluates the source.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ExtractorError, ExtractorResult};

/// Execution-context type name used when none is configured.
pub const DEFAULT_CONTEXT_TYPE: &str = "ToolContext";

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*(?:(?:pub(?:\([^)\n]*\))?|async|export|const|unsafe|extern(?:[ \t]+"[^"\n]*")?)[ \t]+)*(?:def|fn)[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*(?:<[^>(\n]*>)?[ \t]*\("#,
    )
    .expect("declaration pattern is valid")
});

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("identifier pattern is valid"));

/// A declaration recognised as a tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    name: String,
    line: usize,
}

impl Declaration {
    /// Returns the declared identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the 1-based line of the declaration keyword.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }
}

/// Scans source text for tool declarations.
#[derive(Clone, Debug)]
pub struct Scanner {
    context_type: String,
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            context_type: DEFAULT_CONTEXT_TYPE.to_owned(),
        }
    }
}

impl Scanner {
    /// Creates a scanner recognising `context_type` as the execution context.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::InvalidContextType`] unless the name is a
    /// single identifier.
    pub fn new(context_type: impl Into<String>) -> ExtractorResult<Self> {
        let context_type = context_type.into();
        let is_identifier = IDENTIFIER
            .find(&context_type)
            .is_some_and(|found| found.start() == 0 && found.end() == context_type.len());
        if !is_identifier {
            return Err(ExtractorError::InvalidContextType { name: context_type });
        }
        Ok(Self { context_type })
    }

    /// Returns the execution-context type name.
    #[must_use]
    pub fn context_type(&self) -> &str {
        &self.context_type
    }

    /// Scans `source`, returning tool declarations in source order together
    /// with `(line, reason)` pairs for declarations that could not be parsed.
    #[must_use]
    pub fn scan(&self, source: &str) -> (Vec<Declaration>, Vec<(usize, String)>) {
        let mut declarations = Vec::new();
        let mut failures = Vec::new();
        let mut lines = LineIndex::new(source);

        for captures in DECLARATION.captures_iter(source) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let line = lines.line_of(name.start());

            let Some(parameters) = parameter_list(source, whole.end()) else {
                failures.push((
                    line,
                    format!("unterminated parameter list for `{}`", name.as_str()),
                ));
                continue;
            };

            if split_top_level(parameters)
                .into_iter()
                .any(|parameter| self.is_context_parameter(parameter))
            {
                declarations.push(Declaration {
                    name: name.as_str().to_owned(),
                    line,
                });
            }
        }

        (declarations, failures)
    }

    fn is_context_parameter(&self, parameter: &str) -> bool {
        let Some((_, annotation)) = parameter.split_once(':') else {
            return false;
        };
        let annotation = annotation.split('=').next().unwrap_or_default();
        IDENTIFIER
            .find_iter(annotation)
            .any(|token| token.as_str() == self.context_type)
    }
}

/// Returns the text between the opening parenthesis (ending at `start`) and
/// its matching close, or `None` when the source ends first.
fn parameter_list(source: &str, start: usize) -> Option<&str> {
    let rest = &source[start..];
    let mut depth = 1_usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in rest.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' if is_lifetime(&rest[..offset], &rest[offset + 1..]) => {}
            '"' | '\'' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[start..start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// `'a` in `&'a ToolContext` or `Ref<'a>` opens no literal; `'a'` and
/// `= 'a,b'` do.
fn is_lifetime(before: &str, after_quote: &str) -> bool {
    let starts_identifier = after_quote
        .chars()
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_');
    if !starts_identifier {
        return false;
    }
    let run = after_quote
        .find(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
        .unwrap_or(after_quote.len());
    let rest = &after_quote[run..];
    if rest.starts_with('\'') {
        return false;
    }
    before.trim_end().ends_with(['&', '<', '+']) || rest.trim_start().starts_with('>')
}

/// Splits a parameter list on commas outside brackets and string literals.
///
/// Angle brackets nest only inside an annotation. Once a parameter reaches
/// its default value, `<` and `>` are comparisons; `->` never closes one.
fn split_top_level(parameters: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut angles = 0_usize;
    let mut in_default = false;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut previous = '\0';
    let mut begin = 0;

    for (offset, ch) in parameters.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            previous = ch;
            continue;
        }

        match ch {
            '\'' if is_lifetime(&parameters[..offset], &parameters[offset + 1..]) => {}
            '"' | '\'' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '<' if !in_default => angles += 1,
            '>' if !in_default && previous != '-' => angles = angles.saturating_sub(1),
            '=' if depth == 0 && angles == 0 && !matches!(previous, '<' | '>' | '!' | '=') => {
                in_default = true;
            }
            ',' if depth == 0 && angles == 0 => {
                parts.push(parameters[begin..offset].trim());
                begin = offset + 1;
                in_default = false;
            }
            _ => {}
        }
        previous = ch;
    }
    parts.push(parameters[begin..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// Incremental byte-offset to line-number lookup; offsets must be queried in
/// ascending order.
struct LineIndex<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
        }
    }

    fn line_of(&mut self, offset: usize) -> usize {
        self.line += self.source[self.offset..offset].matches('\n').count();
        self.offset = offset;
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(source: &str) -> Vec<String> {
        Scanner::default()
            .scan(source)
            .0
            .into_iter()
            .map(|declaration| declaration.name)
            .collect()
    }

    #[test]
    fn recognises_annotation_variants() {
        let source = "\
def plain(tool_context: ToolContext): pass
def qualified(ctx: adk.tools.ToolContext, x: int): pass
def optional(x: int, ctx: Optional[ToolContext] = None): pass
def quoted(ctx: \"ToolContext\"): pass
pub fn native(ctx: &ToolContext, input: Value) -> Result<()> {}
pub(crate) async fn generic<T>(ctx: &mut ToolContext, input: T) {}
def lookalike(ctx: ToolContextFactory): pass
def untyped(ctx): pass
";
        assert_eq!(
            names(source),
            ["plain", "qualified", "optional", "quoted", "native", "generic"]
        );
    }

    #[test]
    fn custom_context_type() {
        let scanner = Scanner::new("RunContext").unwrap();
        let (found, _) = scanner.scan("def a(ctx: RunContext): pass\ndef b(ctx: ToolContext): pass\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "a");
        assert_eq!(scanner.context_type(), "RunContext");
    }

    #[test]
    fn rejects_non_identifier_context_type() {
        for name in ["", "Tool Context", "a.b", "1Context"] {
            assert!(Scanner::new(name).is_err(), "{name}");
        }
    }

    #[test]
    fn strings_with_brackets_do_not_confuse_balancing() {
        let source = "def tricky(ctx: ToolContext, sep: str = \")\", other: str = '(' ):\n    pass\n";
        assert_eq!(names(source), ["tricky"]);
    }

    #[test]
    fn lifetimes_are_not_char_literals() {
        let source = "pub fn borrowed<'a>(ctx: &'a ToolContext, name: &'a str) {}\nfn quote(c: char = 'x', ctx: ToolContext) {}\nfn held(guard: Ref<'a>, ctx: &mut ToolContext) {}\n";
        assert_eq!(names(source), ["borrowed", "quote", "held"]);
    }

    #[test]
    fn reports_line_numbers() {
        let source = "\n\ndef first(ctx: ToolContext): pass\n\n\ndef second(\n    ctx: ToolContext,\n): pass\n";
        let (found, failures) = Scanner::default().scan(source);
        assert!(failures.is_empty());
        assert_eq!(found[0].line(), 3);
        assert_eq!(found[1].line(), 6);
    }

    #[test]
    fn qualified_rust_functions() {
        let source = "\
pub const fn constant(ctx: &ToolContext) {}
unsafe fn raw(ctx: *const ToolContext) {}
pub extern \"C\" fn exported(ctx: &ToolContext) {}
pub(crate) const unsafe fn both(ctx: &ToolContext) {}
const LIMIT: usize = 3;
";
        assert_eq!(names(source), ["constant", "raw", "exported", "both"]);
    }

    #[test]
    fn comparisons_in_defaults_are_not_generics() {
        let source = "\
def compare(flag: bool = a < b, ctx: ToolContext): pass
def bounded(lo: int = 1, hi: bool = x > 2, ctx: ToolContext = None): pass
def quoted_default(sep: str = 'a,b', ctx: ToolContext): pass
";
        assert_eq!(names(source), ["compare", "bounded", "quoted_default"]);
    }

    #[test]
    fn generic_annotations_keep_their_commas() {
        assert_eq!(
            split_top_level(
                "map: HashMap<String, Value>, f: Box<dyn Fn(u8) -> u8>, flag: bool = a < b, ctx: &ToolContext"
            ),
            [
                "map: HashMap<String, Value>",
                "f: Box<dyn Fn(u8) -> u8>",
                "flag: bool = a < b",
                "ctx: &ToolContext",
            ]
        );
    }

    #[test]
    fn commented_declarations_are_ignored() {
        assert!(names("# def hidden(ctx: ToolContext): pass\n").is_empty());
    }
}
