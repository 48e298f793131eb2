//! Header directive parsing
//!
//! Directives live in the comment header at the top of a source file:
//!
//! ```text
//! //= require vendor/jquery
//! /*= require reset */
//! /*
//!  *= require grid
//!  */
//! ```
//!
//! Only `require` is understood; other directives are dropped from the body
//! without effect. Parsing stops at the first line of code.

/// Result of splitting a source file into directives and body
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Directives {
    /// Required logical paths, in header order
    pub requires: Vec<String>,
    /// Source with directive lines removed
    pub body: String,
}

pub fn parse(source: &str) -> Directives {
    let mut requires = Vec::new();
    let mut kept: Vec<&str> = Vec::new();
    let mut in_block = false;
    let mut in_header = true;

    for line in source.lines() {
        if !in_header {
            kept.push(line);
            continue;
        }

        let trimmed = line.trim_start();
        let directive = if in_block {
            if trimmed.contains("*/") {
                in_block = false;
            }
            trimmed.strip_prefix("*=")
        } else if trimmed.is_empty() {
            None
        } else if let Some(rest) = trimmed.strip_prefix("//") {
            rest.strip_prefix('=')
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            in_block = !rest.contains("*/");
            rest.strip_prefix('=')
        } else {
            in_header = false;
            None
        };

        match directive {
            Some(text) => {
                if let Some(path) = parse_require(text) {
                    requires.push(path);
                }
            }
            None => kept.push(line),
        }
    }

    let mut body = kept.join("\n");
    if source.ends_with('\n') && !body.is_empty() {
        body.push('\n');
    }

    Directives { requires, body }
}

fn parse_require(text: &str) -> Option<String> {
    let text = text.trim().trim_end_matches("*/").trim();
    let mut words = text.splitn(2, char::is_whitespace);
    if words.next()? != "require" {
        return None;
    }

    let path = words
        .next()?
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}
