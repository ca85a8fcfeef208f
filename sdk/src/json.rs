//! JSON bridge for message instances.
//!
//! Instances map to JSON objects keyed by wire name: repeated fields become
//! arrays, nested messages become objects, and a choice group appears as the
//! active member's wire name only. Unset optional fields are omitted, so a
//! JSON round trip preserves the tracker state.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;
use tidewire_schema::{
    Cardinality, FieldSpec, FieldValue, MessageInstance, MessageSchema, PrimitiveType, Value,
    ValueKind,
};

#[derive(Debug, Error, PartialEq)]
pub enum JsonError {
    #[error("expected a JSON object for message type '{type_name}'")]
    NotAnObject { type_name: String },

    #[error("message type '{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    #[error("field '{field}' expected a JSON {expected}")]
    WrongShape { field: String, expected: String },
}

/// Render an instance as a JSON object.
pub fn instance_to_json(instance: &MessageInstance) -> JsonValue {
    let schema = instance.schema();
    let mut map = serde_json::Map::new();

    for (index, field) in schema.fields().iter().enumerate() {
        let value = match instance.value_at(index) {
            Some(value) => value,
            None => continue,
        };
        match value {
            FieldValue::Choice { member, value } => {
                if let ValueKind::Choice(members) = &field.kind {
                    if let Some(spec) = members.get(*member) {
                        map.insert(spec.wire_name.clone(), field_value_to_json(spec, value));
                    }
                }
            }
            other => {
                map.insert(field.wire_name.clone(), field_value_to_json(field, other));
            }
        }
    }
    JsonValue::Object(map)
}

fn field_value_to_json(field: &FieldSpec, value: &FieldValue) -> JsonValue {
    match value {
        FieldValue::Primitive(primitive) => match primitive {
            Value::Bool(flag) => JsonValue::Bool(*flag),
            Value::Int(number) => JsonValue::from(*number),
            Value::String(text) => JsonValue::String(text.clone()),
            Value::Timestamp(_) => JsonValue::String(primitive.render()),
        },
        FieldValue::Message(nested) => instance_to_json(nested),
        FieldValue::Repeated(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| field_value_to_json(field, item))
                .collect(),
        ),
        // choice slots are unwrapped by the caller
        FieldValue::Choice { .. } => unreachable!("choice value nested inside another value"),
    }
}

/// Build an instance of `schema` from a JSON object. Keys resolve through
/// the schema's wire names, so a choice member key activates its group.
pub fn instance_from_json(
    schema: &Arc<MessageSchema>,
    json: &JsonValue,
) -> Result<MessageInstance, JsonError> {
    let object = match json {
        JsonValue::Object(object) => object,
        _ => {
            return Err(JsonError::NotAnObject {
                type_name: schema.type_name().to_owned(),
            })
        }
    };

    let mut instance = MessageInstance::new(schema);
    for (key, value) in object {
        let spec = match schema.field_by_wire_name(key) {
            Some((_, spec)) => spec,
            None => {
                return Err(JsonError::UnknownField {
                    type_name: schema.type_name().to_owned(),
                    field: key.clone(),
                })
            }
        };

        if spec.cardinality == Cardinality::RepeatedOptional {
            let items = match value {
                JsonValue::Array(items) => items,
                _ => {
                    return Err(JsonError::WrongShape {
                        field: key.clone(),
                        expected: "array".to_owned(),
                    })
                }
            };
            for item in items {
                instance.push(key, field_value_from_json(spec, item)?);
            }
        } else {
            if matches!(value, JsonValue::Array(_)) {
                return Err(JsonError::WrongShape {
                    field: key.clone(),
                    expected: expected_shape(spec).to_owned(),
                });
            }
            instance.set(key, field_value_from_json(spec, value)?);
        }
    }
    Ok(instance)
}

fn field_value_from_json(field: &FieldSpec, json: &JsonValue) -> Result<FieldValue, JsonError> {
    match &field.kind {
        ValueKind::Primitive(primitive) => {
            let value = match (primitive, json) {
                (PrimitiveType::Bool, JsonValue::Bool(flag)) => Some(Value::Bool(*flag)),
                (PrimitiveType::Int, JsonValue::Number(number)) => {
                    number.as_i64().map(Value::Int)
                }
                (PrimitiveType::String, JsonValue::String(text)) => {
                    Some(Value::String(text.clone()))
                }
                (PrimitiveType::Timestamp, JsonValue::String(text)) => {
                    Value::parse(PrimitiveType::Timestamp, text)
                }
                _ => None,
            };
            match value {
                Some(value) => Ok(FieldValue::Primitive(value)),
                None => Err(JsonError::WrongShape {
                    field: field.wire_name.clone(),
                    expected: primitive.name().to_owned(),
                }),
            }
        }
        ValueKind::Message(nested) => Ok(FieldValue::Message(instance_from_json(nested, json)?)),
        // wire-name lookup resolves members, never the group itself
        ValueKind::Choice(_) => unreachable!("choice group label resolved as a field"),
    }
}

fn expected_shape(field: &FieldSpec) -> &'static str {
    match &field.kind {
        ValueKind::Primitive(primitive) => primitive.name(),
        ValueKind::Message(_) => "object",
        ValueKind::Choice(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point_schema() -> Arc<MessageSchema> {
        MessageSchema::new(
            "Point",
            "urn:t",
            vec![
                FieldSpec::required("x", ValueKind::Primitive(PrimitiveType::Int)),
                FieldSpec::required("y", ValueKind::Primitive(PrimitiveType::Int)),
                FieldSpec::optional("label", ValueKind::Primitive(PrimitiveType::String)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn unset_optionals_are_omitted_from_json() {
        let schema = point_schema();
        let mut instance = MessageInstance::new(&schema);
        instance.set("x", FieldValue::Primitive(Value::Int(3)));
        instance.set("y", FieldValue::Primitive(Value::Int(4)));

        assert_eq!(instance_to_json(&instance), json!({ "x": 3, "y": 4 }));
    }

    #[test]
    fn json_round_trip_preserves_tracker_state() {
        let schema = point_schema();
        let mut instance = MessageInstance::new(&schema);
        instance.set("x", FieldValue::Primitive(Value::Int(3)));
        instance.set("y", FieldValue::Primitive(Value::Int(4)));
        instance.set(
            "label",
            FieldValue::Primitive(Value::String("origin-ish".into())),
        );

        let round_tripped = instance_from_json(&schema, &instance_to_json(&instance)).unwrap();
        assert_eq!(round_tripped, instance);
    }

    #[test]
    fn repeated_fields_map_to_arrays() {
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
        for n in [5, 1, 5] {
            instance.push("item", FieldValue::Primitive(Value::Int(n)));
        }

        let json = instance_to_json(&instance);
        assert_eq!(json, json!({ "item": [5, 1, 5] }));
        assert_eq!(instance_from_json(&schema, &json).unwrap(), instance);
    }

    #[test]
    fn choice_groups_appear_as_the_active_member() {
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

        let json = instance_to_json(&instance);
        assert_eq!(json, json!({ "host": "h-1" }));
        assert_eq!(instance_from_json(&schema, &json).unwrap(), instance);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = instance_from_json(&point_schema(), &json!({ "z": 1 })).unwrap_err();
        assert_eq!(
            err,
            JsonError::UnknownField {
                type_name: "Point".to_owned(),
                field: "z".to_owned(),
            }
        );
    }

    #[test]
    fn shape_mismatches_are_rejected() {
        let err = instance_from_json(&point_schema(), &json!({ "x": "three" })).unwrap_err();
        assert_eq!(
            err,
            JsonError::WrongShape {
                field: "x".to_owned(),
                expected: "int".to_owned(),
            }
        );
    }
}
