//! Rendering of accumulated build errors.
//!
//! Two output formats: the human-readable text block printed to stderr,
//! prefixed with `Build error(s):`, and a JSON array for tooling that wants
//! to map errors back to source positions itself.

use serde::Serialize;

use veld_language::diag::Diag;

/// Serializable view of one diagnostic.
#[derive(Serialize)]
pub struct JsonDiag<'a> {
    pub code: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<JsonSpan>,
}

#[derive(Serialize)]
pub struct JsonSpan {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

/// Formats diagnostics for stderr.
pub fn render_text(diags: &[Diag], source: &str, file_name: &str) -> String {
    let mut out = String::from("Build error(s):\n");
    for diag in diags {
        match diag.span {
            Some(span) => {
                let (line, column) = span.line_col(source);
                out.push_str(&format!(
                    "{file_name}:{line}:{column}: {}: {}\n",
                    diag.kind, diag.message
                ));
            }
            None => out.push_str(&format!("{file_name}: {}: {}\n", diag.kind, diag.message)),
        }
    }
    out
}

/// Formats diagnostics as a JSON array.
pub fn render_json(diags: &[Diag], source: &str) -> String {
    let views: Vec<JsonDiag<'_>> = diags
        .iter()
        .map(|diag| JsonDiag {
            code: diag.kind.code(),
            message: &diag.message,
            span: diag.span.map(|span| {
                let (line, column) = span.line_col(source);
                JsonSpan {
                    start: span.start,
                    end: span.end,
                    line,
                    column,
                }
            }),
        })
        .collect();
    serde_json::to_string_pretty(&views).expect("diagnostics serialize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_base::Span;
    use veld_language::diag::ErrorKind;

    fn sample() -> Vec<Diag> {
        vec![Diag {
            kind: ErrorKind::UnknownName,
            message: "no binding for `x`".into(),
            span: Some(Span::new(5, 6)),
        }]
    }

    #[test]
    fn text_output_carries_the_required_prefix() {
        let text = render_text(&sample(), "1 + \nx", "demo.veld");
        assert!(text.starts_with("Build error(s):"));
        assert!(text.contains("demo.veld:2:1"));
        assert!(text.contains("eUnknownName"));
    }

    #[test]
    fn json_output_is_parseable_and_complete() {
        let json = render_json(&sample(), "1 + \nx");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(parsed[0]["code"], "eUnknownName");
        assert_eq!(parsed[0]["span"]["line"], 2);
        assert_eq!(parsed[0]["span"]["start"], 5);
    }

    #[test]
    fn spanless_diagnostics_render_without_position() {
        let diags = vec![Diag {
            kind: ErrorKind::Syntax,
            message: "boom".into(),
            span: None,
        }];
        let text = render_text(&diags, "", "f");
        assert!(text.contains("f: eSyntax: boom"));
        let json = render_json(&diags, "");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert!(parsed[0].get("span").is_none());
    }
}
