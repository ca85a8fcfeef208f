use chrono::{DateTime, SecondsFormat, Utc};

/// The primitive value kinds a field can carry. Each has a total text
/// conversion in both directions: malformed text is a decode failure,
/// never a silent default or truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Bool,
    Int,
    String,
    Timestamp,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Int => "int",
            PrimitiveType::String => "string",
            PrimitiveType::Timestamp => "timestamp",
        }
    }
}

/// A primitive wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            _ => false,
        }
    }

    /// A convenience method to extract the value out of an [Int](#variant.Int).
    /// Returns `0` for other value kinds.
    pub fn as_int(&self) -> i64 {
        match *self {
            Value::Int(value) => value,
            _ => 0,
        }
    }

    /// A convenience method to extract the value out of a [String](#variant.String).
    /// Returns `""` for other value kinds.
    pub fn as_str(&self) -> &str {
        match *self {
            Value::String(ref value) => value.as_str(),
            _ => "",
        }
    }

    /// A convenience method to extract the value out of a [Timestamp](#variant.Timestamp).
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match *self {
            Value::Timestamp(value) => Some(value),
            _ => None,
        }
    }

    /// Parse `text` as a value of `ty`. Returns `None` when `text` is not a
    /// lexical form of the type. Bools accept `true`/`false`/`1`/`0`,
    /// integers the full `i64` range, timestamps RFC 3339. Strings are
    /// taken verbatim, whitespace included.
    pub fn parse(ty: PrimitiveType, text: &str) -> Option<Value> {
        match ty {
            PrimitiveType::String => Some(Value::String(text.to_owned())),
            PrimitiveType::Bool => match text.trim() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            PrimitiveType::Int => text.trim().parse::<i64>().ok().map(Value::Int),
            PrimitiveType::Timestamp => DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|dt| Value::Timestamp(dt.with_timezone(&Utc))),
        }
    }

    /// The wire text for this value. `parse` of the result reproduces the
    /// value exactly.
    pub fn render(&self) -> String {
        match self {
            Value::Bool(value) => {
                if *value {
                    "true".to_owned()
                } else {
                    "false".to_owned()
                }
            }
            Value::Int(value) => value.to_string(),
            Value::String(value) => value.clone(),
            Value::Timestamp(value) => value.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
