//! Named output compressors
//!
//! Compressors run on the processed body of a single source file, after
//! directives have been removed and before digests are computed.

use crate::assets::error::{AssetError, Result};

/// A named transformation shrinking compiled output
pub trait Compressor: Send + Sync {
    fn name(&self) -> &'static str;
    fn compress(&self, source: &str) -> String;
}

/// Stylesheet compressor: drops comments, blank lines and indentation
///
/// Comments opening with `/*!` are kept, as are comment markers inside strings.
#[derive(Debug, Default)]
pub struct CssMinify;

impl Compressor for CssMinify {
    fn name(&self) -> &'static str {
        "css-minify"
    }

    fn compress(&self, source: &str) -> String {
        let stripped = strip_css_comments(source);
        join_lines(stripped.lines().map(str::trim))
    }
}

/// Script compressor: drops blank lines and trailing whitespace
///
/// Leading indentation is preserved so multi-line strings stay intact.
#[derive(Debug, Default)]
pub struct JsStrip;

impl Compressor for JsStrip {
    fn name(&self) -> &'static str {
        "js-strip"
    }

    fn compress(&self, source: &str) -> String {
        join_lines(source.lines().map(str::trim_end))
    }
}

/// Look up a built-in compressor by name
pub fn by_name(name: &str) -> Result<Box<dyn Compressor>> {
    match name {
        "css-minify" => Ok(Box::new(CssMinify)),
        "js-strip" => Ok(Box::new(JsStrip)),
        other => Err(AssetError::UnknownCompressor(other.to_string())),
    }
}

fn join_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for line in lines.filter(|l| !l.is_empty()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn strip_css_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let keep = chars.peek() == Some(&'!');
                if keep {
                    out.push_str("/*");
                }
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if keep {
                        out.push(inner);
                    }
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            _ => out.push(c),
        }
    }

    out
}
