use crate::error::CompilerError;
use crate::utils::{error, quote};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref TOKEN_REGEX:   Regex = Regex::new(r#"("[^"\n]*"|[;{}]|\b[A-Za-z_][A-Za-z0-9_]*\b|//.*|\s+)"#).unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^(//.*|\s+)$").unwrap();
}

#[derive(Debug, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Split `.twl` text into tokens with line/column positions. Anything the
/// token pattern cannot account for is a syntax error at that position.
pub fn tokenize(text: &str) -> Result<Vec<Token>, CompilerError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let end = mat.end();
        let part = mat.as_str();

        if start > last_end {
            let unexpected = &text[last_end..start];
            return Err(error(
                &format!("Syntax error: {}", quote(unexpected)),
                line,
                column,
            ));
        }

        if !WHITESPACE_RX.is_match(part) && !part.starts_with("//") {
            tokens.push(Token {
                text: part.to_string(),
                line,
                column,
            });
        }

        // Update line/column
        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.len() + 1;
            }
        } else {
            column += part.len();
        }

        last_end = end;
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(error(
            &format!("Syntax error: {}", quote(unexpected)),
            line,
            column,
        ));
    }

    // Append EOF token
    tokens.push(Token {
        text: "".to_string(),
        line,
        column,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple_field() {
        let input = "required int x;";
        let expected = vec![
            Token { text: "required".into(), line: 1, column: 1 },
            Token { text: "int".into(),      line: 1, column: 10 },
            Token { text: "x".into(),        line: 1, column: 14 },
            Token { text: ";".into(),        line: 1, column: 15 },
            Token { text: "".into(),         line: 1, column: 16 },
        ];
        let got = tokenize(input).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_tokenize_string_literal() {
        let input = "namespace \"urn:demo\";";
        let got = tokenize(input).unwrap();
        assert_eq!(got[0].text, "namespace");
        assert_eq!(got[1].text, "\"urn:demo\"");
        assert_eq!(got[2].text, ";");
    }

    #[test]
    fn test_tokenize_skips_comments_and_tracks_lines() {
        let input = "// header\nmessage M {\n}";
        let got = tokenize(input).unwrap();
        assert_eq!(got[0], Token { text: "message".into(), line: 2, column: 1 });
        assert_eq!(got[1], Token { text: "M".into(),       line: 2, column: 9 });
        assert_eq!(got[3], Token { text: "}".into(),       line: 3, column: 1 });
    }

    #[test]
    fn test_tokenize_unexpected_text() {
        let input = "required int x = 10;";
        let err = tokenize(input).unwrap_err();
        assert!(
            matches!(err, CompilerError::ParseError { .. }),
            "expected a ParseError but got {:?}",
            err
        );
    }
}
