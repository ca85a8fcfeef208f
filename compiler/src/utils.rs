use crate::error::CompilerError;

pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap()
}

pub fn error(msg: &str, line: usize, column: usize) -> CompilerError {
    CompilerError::ParseError {
        msg: msg.to_owned(),
        line,
        column,
    }
}
