//! tidewire
//!
//! This crate is the user-facing surface of the Tidewire binding engine.
//!
//! - Runtime schema model, decoder, and encoder (re-exported from `tidewire-schema`)
//! - `.twl` schema compiler (re-exported from `tidewire-compiler`)
//! - XML text binding for the token stream
//! - JSON bridge for message instances

pub mod json;
pub mod xml;

pub use tidewire_compiler::{compile_file, compile_str, CompiledSchemas, CompilerError};
pub use tidewire_schema::{
    decode, encode, encode_extension, encode_to_tokens, Cardinality, DecodeError, EncodeError,
    FieldSpec, FieldValue, MessageInstance, MessageSchema, PrefixRegistry, PrimitiveType,
    SchemaError, SchemaRegistry, Token, TokenReader, TokenWriter, Value, ValueKind,
};

use std::sync::Arc;
use thiserror::Error;

/// Any failure while binding between text and message instances.
#[derive(Debug, Error)]
pub enum BindError {
    #[error(transparent)]
    Xml(#[from] xml::XmlError),

    #[error(transparent)]
    Json(#[from] json::JsonError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Decode one XML document into an instance of `schema`. Type-override
/// attributes dispatch through `registry`.
pub fn decode_xml(
    schema: &Arc<MessageSchema>,
    registry: &SchemaRegistry,
    text: &str,
) -> Result<MessageInstance, BindError> {
    let tokens = xml::read_xml(text)?;
    let mut reader = TokenReader::new(&tokens);
    Ok(decode(schema, &mut reader, registry)?)
}

/// Encode `instance` as one XML document rooted at `{namespace}local`.
pub fn encode_xml(
    instance: &MessageInstance,
    namespace: &str,
    local: &str,
) -> Result<String, BindError> {
    let (tokens, prefixes) = encode_to_tokens(instance, namespace, local)?;
    Ok(xml::write_xml(&tokens, &prefixes))
}
