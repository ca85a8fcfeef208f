use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::DecodeError;
use crate::instance::{FieldValue, MessageInstance};
use crate::registry::SchemaRegistry;
use crate::schema::{Cardinality, FieldRef, FieldSpec, MessageSchema, ValueKind};
use crate::token::{Token, TokenReader};
use crate::value::Value;

/// Namespace of the wire attribute that overrides the decoded type.
pub const TYPE_OVERRIDE_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// Local name of the type-override attribute.
pub const TYPE_OVERRIDE_LOCAL: &str = "type";

/// Decode one message from `reader` against `schema`.
///
/// The cursor must be at (or before, separated only by whitespace) the
/// message's start-element; on success it is left just past the matching
/// end-element, and the returned instance has trackers set for exactly the
/// fields that were present on the wire. The wrapping element's own name is
/// the caller's context and is not checked here.
///
/// A type-override attribute naming a type other than `schema` dispatches
/// the whole element to the registry-resolved subtype. An unregistered
/// name is a hard failure before any token is consumed; the element is
/// never decoded as if it were the statically expected type.
pub fn decode(
    schema: &Arc<MessageSchema>,
    reader: &mut TokenReader,
    registry: &SchemaRegistry,
) -> Result<MessageInstance, DecodeError> {
    reader.advance_to_structural();
    let element_namespace = match reader.peek() {
        Some(Token::StartElement { namespace, .. }) => namespace.clone(),
        Some(Token::Text(text)) => return Err(DecodeError::UnexpectedText(text.clone())),
        _ => return Err(DecodeError::UnexpectedEnd(schema.type_name().to_owned())),
    };

    if let Some(declared) = reader.current_attribute_value(TYPE_OVERRIDE_NAMESPACE, TYPE_OVERRIDE_LOCAL) {
        if declared != schema.type_name() {
            let target = registry.resolve(&element_namespace, declared).ok_or_else(|| {
                DecodeError::UnknownExtensionType {
                    namespace: element_namespace.clone(),
                    type_name: declared.to_owned(),
                }
            })?;
            debug!(expected = schema.type_name(), concrete = declared, "extension dispatch");
            let target = Arc::clone(target);
            return decode_fields(&target, reader, registry);
        }
    }

    decode_fields(schema, reader, registry)
}

fn decode_fields(
    schema: &Arc<MessageSchema>,
    reader: &mut TokenReader,
    registry: &SchemaRegistry,
) -> Result<MessageInstance, DecodeError> {
    trace!(type_name = schema.type_name(), "decode message");
    reader.consume_start_element();
    let mut instance = MessageInstance::new(schema);

    for (index, field) in schema.fields().iter().enumerate() {
        match &field.kind {
            ValueKind::Choice(members) => {
                decode_choice(schema, index, field, members, &mut instance, reader, registry)?;
            }
            _ => match field.cardinality {
                Cardinality::Required => {
                    if !matches_field(schema, field, reader)? {
                        return Err(DecodeError::MissingRequiredField {
                            type_name: schema.type_name().to_owned(),
                            field: field.wire_name.clone(),
                        });
                    }
                    let value = decode_value(schema, field, reader, registry)?;
                    instance.set_at(FieldRef { index, member: None }, value);
                }
                Cardinality::Optional => {
                    if matches_field(schema, field, reader)? {
                        let value = decode_value(schema, field, reader, registry)?;
                        instance.set_at(FieldRef { index, member: None }, value);
                    }
                }
                Cardinality::RepeatedOptional => {
                    let mut items = Vec::new();
                    while matches_field(schema, field, reader)? {
                        items.push(decode_value(schema, field, reader, registry)?);
                    }
                    // zero occurrences leaves the tracker unset
                    if !items.is_empty() {
                        instance.set_at(
                            FieldRef { index, member: None },
                            FieldValue::Repeated(items),
                        );
                    }
                }
            },
        }
    }

    reader.advance_to_structural();
    match reader.next_token() {
        Some(Token::EndElement) => Ok(instance),
        Some(Token::StartElement { namespace, local }) => Err(DecodeError::UnexpectedElement {
            type_name: schema.type_name().to_owned(),
            namespace: namespace.clone(),
            local: local.clone(),
        }),
        Some(Token::Text(text)) => Err(DecodeError::UnexpectedText(text.clone())),
        _ => Err(DecodeError::UnexpectedEnd(schema.type_name().to_owned())),
    }
}

fn decode_choice(
    schema: &Arc<MessageSchema>,
    index: usize,
    group: &FieldSpec,
    members: &[FieldSpec],
    instance: &mut MessageInstance,
    reader: &mut TokenReader,
    registry: &SchemaRegistry,
) -> Result<(), DecodeError> {
    reader.advance_to_structural();
    if let Some((namespace, local)) = reader.current_element_name() {
        if namespace == schema.namespace() {
            let matched = members
                .iter()
                .enumerate()
                .find(|(_, member)| member.wire_name == local);
            if let Some((member_index, member)) = matched {
                let value = decode_value(schema, member, reader, registry)?;
                instance.set_at(
                    FieldRef {
                        index,
                        member: Some(member_index),
                    },
                    value,
                );
                return Ok(());
            }
        }
    }
    if group.cardinality == Cardinality::Required {
        return Err(DecodeError::MissingRequiredField {
            type_name: schema.type_name().to_owned(),
            field: group.wire_name.clone(),
        });
    }
    Ok(())
}

/// Whether the cursor's start-element is this field's next occurrence.
fn matches_field(
    schema: &MessageSchema,
    field: &FieldSpec,
    reader: &mut TokenReader,
) -> Result<bool, DecodeError> {
    reader.advance_to_structural();
    match reader.peek() {
        Some(Token::StartElement { namespace, local }) => {
            Ok(namespace == schema.namespace() && *local == field.wire_name)
        }
        Some(Token::Text(text)) => Err(DecodeError::UnexpectedText(text.clone())),
        _ => Ok(false),
    }
}

/// Decode the value of `field`; the cursor is at its matching start-element.
fn decode_value(
    schema: &Arc<MessageSchema>,
    field: &FieldSpec,
    reader: &mut TokenReader,
    registry: &SchemaRegistry,
) -> Result<FieldValue, DecodeError> {
    match &field.kind {
        ValueKind::Primitive(ty) => {
            reader.consume_start_element();
            let mut text = String::new();
            loop {
                match reader.next_token() {
                    Some(Token::Text(chunk)) => text.push_str(chunk),
                    Some(Token::EndElement) => break,
                    Some(Token::StartElement { namespace, local }) => {
                        return Err(DecodeError::UnexpectedElement {
                            type_name: schema.type_name().to_owned(),
                            namespace: namespace.clone(),
                            local: local.clone(),
                        })
                    }
                    Some(Token::Attribute { .. }) => continue,
                    None => {
                        return Err(DecodeError::UnexpectedEnd(schema.type_name().to_owned()))
                    }
                }
            }
            let value = Value::parse(*ty, &text).ok_or_else(|| DecodeError::MalformedValue {
                field: field.wire_name.clone(),
                expected: ty.name(),
                text,
            })?;
            Ok(FieldValue::Primitive(value))
        }
        ValueKind::Message(nested) => Ok(FieldValue::Message(decode(nested, reader, registry)?)),
        // schema construction rejects nested choice groups
        ValueKind::Choice(_) => unreachable!("choice member cannot itself be a choice group"),
    }
}
