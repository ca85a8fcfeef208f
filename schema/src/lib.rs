//! Runtime core of the Tidewire binding engine.
//!
//! A [`MessageSchema`] is an immutable, ordered description of one message
//! type. It drives both directions of the codec: [`decode`] consumes a
//! structural token stream into a [`MessageInstance`], and [`encode`] walks
//! an instance back out into tokens. Optional fields carry an explicit
//! "was set" tracker so round trips preserve presence, not just values.
//!
//! ```
//! use tidewire_schema::*;
//!
//! let point = MessageSchema::new("Point", "urn:demo", vec![
//!     FieldSpec::required("x", ValueKind::Primitive(PrimitiveType::Int)),
//!     FieldSpec::required("y", ValueKind::Primitive(PrimitiveType::Int)),
//! ]).unwrap();
//!
//! let mut instance = MessageInstance::new(&point);
//! instance.set("x", FieldValue::Primitive(Value::Int(3)));
//! instance.set("y", FieldValue::Primitive(Value::Int(4)));
//!
//! let (tokens, _prefixes) = encode_to_tokens(&instance, "urn:demo", "p").unwrap();
//! let registry = SchemaRegistry::new();
//! let decoded = decode(&point, &mut TokenReader::new(&tokens), &registry).unwrap();
//! assert_eq!(decoded, instance);
//! ```

pub mod decode;
pub mod encode;
pub mod error;
pub mod instance;
pub mod registry;
pub mod schema;
pub mod token;
pub mod value;

pub use decode::{decode, TYPE_OVERRIDE_LOCAL, TYPE_OVERRIDE_NAMESPACE};
pub use encode::{encode, encode_extension, encode_to_tokens};
pub use error::{DecodeError, EncodeError, SchemaError};
pub use instance::{active_choice_member, FieldValue, MessageInstance};
pub use registry::SchemaRegistry;
pub use schema::{Cardinality, FieldRef, FieldSpec, MessageSchema, ValueKind};
pub use token::{PrefixRegistry, Token, TokenReader, TokenWriter};
pub use value::{PrimitiveType, Value};
