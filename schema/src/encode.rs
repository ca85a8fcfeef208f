use crate::decode::{TYPE_OVERRIDE_LOCAL, TYPE_OVERRIDE_NAMESPACE};
use crate::error::EncodeError;
use crate::instance::{FieldValue, MessageInstance};
use crate::schema::{Cardinality, FieldSpec, MessageSchema, ValueKind};
use crate::token::{PrefixRegistry, Token, TokenWriter};

/// Write `instance` into `writer`, wrapped in a `{namespace}local` element.
///
/// The wrapping name is the caller's to choose because it is context
/// dependent: the same schema serializes under a root response name in one
/// place and under a field name in another. On failure the writer holds a
/// partially written stream and must be discarded.
pub fn encode(
    instance: &MessageInstance,
    namespace: &str,
    local: &str,
    writer: &mut TokenWriter,
) -> Result<(), EncodeError> {
    writer.start_element(namespace, local);
    encode_fields(instance, writer)?;
    writer.end_element();
    Ok(())
}

/// Like [`encode`], but stamps the instance's concrete type name into the
/// type-override attribute so a decoder expecting a base type dispatches
/// back to this schema.
pub fn encode_extension(
    instance: &MessageInstance,
    namespace: &str,
    local: &str,
    writer: &mut TokenWriter,
) -> Result<(), EncodeError> {
    writer.start_element(namespace, local);
    writer.attribute(
        TYPE_OVERRIDE_NAMESPACE,
        TYPE_OVERRIDE_LOCAL,
        instance.schema().type_name(),
    );
    encode_fields(instance, writer)?;
    writer.end_element();
    Ok(())
}

/// One whole serialization pass: a fresh writer, one encode, and the token
/// stream plus the prefix registry that grew during the pass.
pub fn encode_to_tokens(
    instance: &MessageInstance,
    namespace: &str,
    local: &str,
) -> Result<(Vec<Token>, PrefixRegistry), EncodeError> {
    let mut writer = TokenWriter::new();
    encode(instance, namespace, local, &mut writer)?;
    Ok(writer.into_parts())
}

fn encode_fields(instance: &MessageInstance, writer: &mut TokenWriter) -> Result<(), EncodeError> {
    let schema = instance.schema();
    for (index, field) in schema.fields().iter().enumerate() {
        match instance.value_at(index) {
            Some(value) => encode_field_value(schema, field, value, writer)?,
            None => {
                // required-ness is checked here, lazily, not at set time
                if field.cardinality == Cardinality::Required {
                    return Err(EncodeError::MissingRequiredField {
                        type_name: schema.type_name().to_owned(),
                        field: field.wire_name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn encode_field_value(
    schema: &MessageSchema,
    field: &FieldSpec,
    value: &FieldValue,
    writer: &mut TokenWriter,
) -> Result<(), EncodeError> {
    match value {
        FieldValue::Repeated(items) => {
            for item in items {
                encode_field_value(schema, field, item, writer)?;
            }
            Ok(())
        }
        FieldValue::Choice { member, value } => {
            let member_spec = match &field.kind {
                ValueKind::Choice(members) => members.get(*member),
                _ => None,
            };
            match member_spec {
                Some(spec) => encode_field_value(schema, spec, value, writer),
                // setters only store Choice values into choice slots
                None => unreachable!("choice value stored in a non-choice field"),
            }
        }
        FieldValue::Primitive(primitive) => {
            writer.start_element(schema.namespace(), &field.wire_name);
            writer.text(&primitive.render());
            writer.end_element();
            Ok(())
        }
        FieldValue::Message(nested) => {
            let declared_name = match &field.kind {
                ValueKind::Message(declared) => declared.type_name(),
                _ => nested.schema().type_name(),
            };
            if nested.schema().type_name() == declared_name {
                encode(nested, schema.namespace(), &field.wire_name, writer)
            } else {
                // concrete subtype under a base-typed field
                encode_extension(nested, schema.namespace(), &field.wire_name, writer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::registry::SchemaRegistry;
    use crate::schema::MessageSchema;
    use crate::token::TokenReader;
    use crate::value::{PrimitiveType, Value};
    use std::sync::Arc;

    fn point_schema() -> Arc<MessageSchema> {
        MessageSchema::new(
            "Point",
            "urn:t",
            vec![
                FieldSpec::required("x", ValueKind::Primitive(PrimitiveType::Int)),
                FieldSpec::required("y", ValueKind::Primitive(PrimitiveType::Int)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn encodes_fields_in_declared_order() {
        let schema = point_schema();
        let mut instance = MessageInstance::new(&schema);
        // set out of order on purpose
        instance.set("y", FieldValue::Primitive(Value::Int(4)));
        instance.set("x", FieldValue::Primitive(Value::Int(3)));

        let (tokens, _) = encode_to_tokens(&instance, "urn:t", "p").unwrap();
        let expected = vec![
            Token::StartElement { namespace: "urn:t".into(), local: "p".into() },
            Token::StartElement { namespace: "urn:t".into(), local: "x".into() },
            Token::Text("3".into()),
            Token::EndElement,
            Token::StartElement { namespace: "urn:t".into(), local: "y".into() },
            Token::Text("4".into()),
            Token::EndElement,
            Token::EndElement,
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn unset_required_field_fails_at_encode_time() {
        let schema = point_schema();
        let mut instance = MessageInstance::new(&schema);
        instance.set("x", FieldValue::Primitive(Value::Int(3)));

        let err = encode_to_tokens(&instance, "urn:t", "p").unwrap_err();
        assert_eq!(
            err,
            EncodeError::MissingRequiredField {
                type_name: "Point".to_owned(),
                field: "y".to_owned(),
            }
        );
    }

    #[test]
    fn unset_optional_fields_are_omitted() {
        let schema = MessageSchema::new(
            "Opt",
            "urn:t",
            vec![FieldSpec::optional(
                "a",
                ValueKind::Primitive(PrimitiveType::String),
            )],
        )
        .unwrap();
        let instance = MessageInstance::new(&schema);
        let (tokens, _) = encode_to_tokens(&instance, "urn:t", "m").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::StartElement { namespace: "urn:t".into(), local: "m".into() },
                Token::EndElement,
            ]
        );
    }

    #[test]
    fn repeated_items_share_one_wire_name_in_order() {
        let schema = MessageSchema::new(
            "List",
            "urn:t",
            vec![FieldSpec::repeated(
                "item",
                ValueKind::Primitive(PrimitiveType::Int),
            )],
        )
        .unwrap();
        let mut instance = MessageInstance::new(&schema);
        for n in [2, 7, 2] {
            instance.push("item", FieldValue::Primitive(Value::Int(n)));
        }

        let (tokens, _) = encode_to_tokens(&instance, "urn:t", "l").unwrap();
        let texts: Vec<&str> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["2", "7", "2"]);
        let starts = tokens
            .iter()
            .filter(|t| matches!(t, Token::StartElement { local, .. } if local == "item"))
            .count();
        assert_eq!(starts, 3);
    }

    #[test]
    fn namespaces_are_interned_once_per_pass() {
        let schema = point_schema();
        let mut instance = MessageInstance::new(&schema);
        instance.set("x", FieldValue::Primitive(Value::Int(1)));
        instance.set("y", FieldValue::Primitive(Value::Int(2)));

        let (_, prefixes) = encode_to_tokens(&instance, "urn:t", "p").unwrap();
        assert_eq!(prefixes.len(), 1);
        assert_eq!(prefixes.lookup("urn:t"), Some("ns1"));
    }

    #[test]
    fn subtype_under_base_field_round_trips_via_type_attribute() {
        let base = MessageSchema::new(
            "Base",
            "urn:t",
            vec![FieldSpec::optional(
                "a",
                ValueKind::Primitive(PrimitiveType::String),
            )],
        )
        .unwrap();
        let sub = MessageSchema::new(
            "Sub",
            "urn:t",
            vec![
                FieldSpec::optional("a", ValueKind::Primitive(PrimitiveType::String)),
                FieldSpec::optional("extra", ValueKind::Primitive(PrimitiveType::Int)),
            ],
        )
        .unwrap();
        let outer = MessageSchema::new(
            "Outer",
            "urn:t",
            vec![FieldSpec::required("payload", ValueKind::Message(Arc::clone(&base)))],
        )
        .unwrap();

        let mut payload = MessageInstance::new(&sub);
        payload.set("extra", FieldValue::Primitive(Value::Int(9)));
        let mut instance = MessageInstance::new(&outer);
        instance.set("payload", FieldValue::Message(payload));

        let (tokens, _) = encode_to_tokens(&instance, "urn:t", "o").unwrap();
        let mut registry = SchemaRegistry::new();
        registry.register(Arc::clone(&sub)).unwrap();

        let decoded = decode(&outer, &mut TokenReader::new(&tokens), &registry).unwrap();
        assert_eq!(decoded, instance);
        let nested = decoded.get("payload").unwrap().as_message().unwrap();
        assert_eq!(nested.schema().type_name(), "Sub");
    }

    #[test]
    fn choice_member_encodes_under_its_own_wire_name() {
        let schema = MessageSchema::new(
            "Msg",
            "urn:t",
            vec![FieldSpec::choice(
                "target",
                vec![
                    FieldSpec::optional("zone", ValueKind::Primitive(PrimitiveType::String)),
                    FieldSpec::optional("host", ValueKind::Primitive(PrimitiveType::String)),
                ],
            )],
        )
        .unwrap();
        let mut instance = MessageInstance::new(&schema);
        instance.set("zone", FieldValue::Primitive(Value::String("us-east-1a".into())));
        instance.set("host", FieldValue::Primitive(Value::String("h-1".into())));

        let (tokens, _) = encode_to_tokens(&instance, "urn:t", "m").unwrap();
        let locals: Vec<&str> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::StartElement { local, .. } => Some(local.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(locals, vec!["m", "host"]);
    }
}
