use thiserror::Error;

/// Raised while constructing or registering a [`MessageSchema`]. These are
/// programming errors: construction fails fast and nothing is usable
/// afterwards, so there is no per-instance recovery path.
///
/// [`MessageSchema`]: crate::schema::MessageSchema
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate wire name {wire_name:?} in message {type_name:?}")]
    DuplicateWireName { type_name: String, wire_name: String },

    #[error("choice group {wire_name:?} in message {type_name:?} needs at least two members")]
    DegenerateChoiceGroup { type_name: String, wire_name: String },

    #[error("choice group {wire_name:?} in message {type_name:?} may not nest another choice group")]
    NestedChoiceGroup { type_name: String, wire_name: String },

    #[error("choice member {wire_name:?} in message {type_name:?} cannot be repeated")]
    RepeatedChoiceMember { type_name: String, wire_name: String },

    #[error("choice group {wire_name:?} in message {type_name:?} cannot itself be repeated")]
    RepeatedChoiceGroup { type_name: String, wire_name: String },

    #[error("a schema named {{{namespace}}}{type_name} is already registered")]
    DuplicateRegistration { namespace: String, type_name: String },
}

/// Terminal failure of one decode call. The failed call never hands back a
/// partially populated instance; the caller decides whether to retry the
/// outer operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing required field {field:?} while decoding {type_name}")]
    MissingRequiredField { type_name: String, field: String },

    #[error("unexpected element {{{namespace}}}{local} while decoding {type_name}")]
    UnexpectedElement {
        type_name: String,
        namespace: String,
        local: String,
    },

    #[error("malformed {expected} in field {field:?}: {text:?}")]
    MalformedValue {
        field: String,
        expected: &'static str,
        text: String,
    },

    #[error("unknown extension type {{{namespace}}}{type_name}")]
    UnknownExtensionType { namespace: String, type_name: String },

    #[error("unexpected text content {0:?}")]
    UnexpectedText(String),

    #[error("token stream ended while decoding {0}")]
    UnexpectedEnd(String),
}

/// Terminal failure of one encode call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("cannot serialize {type_name}: required field {field:?} is missing")]
    MissingRequiredField { type_name: String, field: String },
}
