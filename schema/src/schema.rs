use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::value::PrimitiveType;

/// How many times a field may appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Always present, in memory and on the wire. Absence is a failure at
    /// decode time and at encode time, never at set time.
    Required,
    /// Zero or one occurrence; presence is tracked per instance.
    Optional,
    /// Zero or more consecutive occurrences under one wire name.
    RepeatedOptional,
}

/// What a field's value looks like.
#[derive(Debug, Clone)]
pub enum ValueKind {
    Primitive(PrimitiveType),
    Message(Arc<MessageSchema>),
    /// Mutually exclusive alternatives: at most one member is active at a
    /// time, and the members appear directly on the wire (the group's own
    /// name never does).
    Choice(Vec<FieldSpec>),
}

/// One field in a message schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub wire_name: String,
    pub cardinality: Cardinality,
    pub kind: ValueKind,
}

impl FieldSpec {
    pub fn required(wire_name: &str, kind: ValueKind) -> FieldSpec {
        FieldSpec {
            wire_name: wire_name.to_owned(),
            cardinality: Cardinality::Required,
            kind,
        }
    }

    pub fn optional(wire_name: &str, kind: ValueKind) -> FieldSpec {
        FieldSpec {
            wire_name: wire_name.to_owned(),
            cardinality: Cardinality::Optional,
            kind,
        }
    }

    pub fn repeated(wire_name: &str, kind: ValueKind) -> FieldSpec {
        FieldSpec {
            wire_name: wire_name.to_owned(),
            cardinality: Cardinality::RepeatedOptional,
            kind,
        }
    }

    /// An optional choice group. `wire_name` is the group's internal label;
    /// only member names appear on the wire.
    pub fn choice(wire_name: &str, members: Vec<FieldSpec>) -> FieldSpec {
        FieldSpec {
            wire_name: wire_name.to_owned(),
            cardinality: Cardinality::Optional,
            kind: ValueKind::Choice(members),
        }
    }

    /// A choice group of which exactly one member must be present.
    pub fn required_choice(wire_name: &str, members: Vec<FieldSpec>) -> FieldSpec {
        FieldSpec {
            wire_name: wire_name.to_owned(),
            cardinality: Cardinality::Required,
            kind: ValueKind::Choice(members),
        }
    }
}

/// Where a wire name points inside a schema: the field slot, and for choice
/// members the member slot inside the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef {
    pub index: usize,
    pub member: Option<usize>,
}

/// Immutable definition of one message type.
///
/// Field order is fixed at construction and drives both the decoder's
/// ordering contract and the encoder's output order. Schemas are shared
/// via `Arc`, are safe for concurrent reads, and outlive every instance
/// built from them.
#[derive(Debug)]
pub struct MessageSchema {
    type_name: String,
    namespace: String,
    fields: Vec<FieldSpec>,
    by_wire_name: HashMap<String, FieldRef>,
}

impl MessageSchema {
    /// Build a schema, validating the field specs. Inconsistent specs are a
    /// programming error and abort construction; nothing is recoverable at
    /// runtime from a rejected schema.
    pub fn new(
        type_name: &str,
        namespace: &str,
        fields: Vec<FieldSpec>,
    ) -> Result<Arc<MessageSchema>, SchemaError> {
        let mut by_wire_name = HashMap::new();

        for (index, field) in fields.iter().enumerate() {
            match &field.kind {
                ValueKind::Choice(members) => {
                    if field.cardinality == Cardinality::RepeatedOptional {
                        return Err(SchemaError::RepeatedChoiceGroup {
                            type_name: type_name.to_owned(),
                            wire_name: field.wire_name.clone(),
                        });
                    }
                    if members.len() < 2 {
                        return Err(SchemaError::DegenerateChoiceGroup {
                            type_name: type_name.to_owned(),
                            wire_name: field.wire_name.clone(),
                        });
                    }
                    for (member_index, member) in members.iter().enumerate() {
                        if matches!(member.kind, ValueKind::Choice(_)) {
                            return Err(SchemaError::NestedChoiceGroup {
                                type_name: type_name.to_owned(),
                                wire_name: member.wire_name.clone(),
                            });
                        }
                        if member.cardinality == Cardinality::RepeatedOptional {
                            return Err(SchemaError::RepeatedChoiceMember {
                                type_name: type_name.to_owned(),
                                wire_name: member.wire_name.clone(),
                            });
                        }
                        insert_unique(
                            &mut by_wire_name,
                            type_name,
                            &member.wire_name,
                            FieldRef {
                                index,
                                member: Some(member_index),
                            },
                        )?;
                    }
                }
                _ => {
                    insert_unique(
                        &mut by_wire_name,
                        type_name,
                        &field.wire_name,
                        FieldRef {
                            index,
                            member: None,
                        },
                    )?;
                }
            }
        }

        Ok(Arc::new(MessageSchema {
            type_name: type_name.to_owned(),
            namespace: namespace.to_owned(),
            fields,
            by_wire_name,
        }))
    }

    /// Identity used by the wire's type-override attribute.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The namespace URI this type's elements belong to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fields in declared (and therefore wire) order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_at(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    /// Resolve a wire name to its slot. Choice members resolve to their
    /// member spec inside the group.
    pub fn field_by_wire_name(&self, name: &str) -> Option<(FieldRef, &FieldSpec)> {
        let reference = *self.by_wire_name.get(name)?;
        let field = &self.fields[reference.index];
        let spec = match (&field.kind, reference.member) {
            (ValueKind::Choice(members), Some(member)) => &members[member],
            _ => field,
        };
        Some((reference, spec))
    }

    pub fn is_choice_group(&self, index: usize) -> bool {
        matches!(
            self.fields.get(index),
            Some(FieldSpec {
                kind: ValueKind::Choice(_),
                ..
            })
        )
    }
}

fn insert_unique(
    map: &mut HashMap<String, FieldRef>,
    type_name: &str,
    wire_name: &str,
    reference: FieldRef,
) -> Result<(), SchemaError> {
    if map.insert(wire_name.to_owned(), reference).is_some() {
        return Err(SchemaError::DuplicateWireName {
            type_name: type_name.to_owned(),
            wire_name: wire_name.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_field(name: &str) -> FieldSpec {
        FieldSpec::required(name, ValueKind::Primitive(PrimitiveType::Int))
    }

    #[test]
    fn duplicate_wire_names_fail_fast() {
        let err = MessageSchema::new(
            "Dup",
            "urn:t",
            vec![int_field("a"), int_field("a")],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateWireName {
                type_name: "Dup".to_owned(),
                wire_name: "a".to_owned(),
            }
        );
    }

    #[test]
    fn choice_members_share_the_wire_namespace_of_plain_fields() {
        let err = MessageSchema::new(
            "Mix",
            "urn:t",
            vec![
                int_field("a"),
                FieldSpec::choice(
                    "target",
                    vec![
                        FieldSpec::optional("a", ValueKind::Primitive(PrimitiveType::String)),
                        FieldSpec::optional("b", ValueKind::Primitive(PrimitiveType::String)),
                    ],
                ),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateWireName { .. }));
    }

    #[test]
    fn degenerate_choice_groups_are_rejected() {
        let err = MessageSchema::new(
            "One",
            "urn:t",
            vec![FieldSpec::choice(
                "target",
                vec![FieldSpec::optional(
                    "only",
                    ValueKind::Primitive(PrimitiveType::String),
                )],
            )],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DegenerateChoiceGroup { .. }));
    }

    #[test]
    fn repeated_choice_members_are_rejected() {
        let err = MessageSchema::new(
            "Rep",
            "urn:t",
            vec![FieldSpec::choice(
                "target",
                vec![
                    FieldSpec::repeated("a", ValueKind::Primitive(PrimitiveType::String)),
                    FieldSpec::optional("b", ValueKind::Primitive(PrimitiveType::String)),
                ],
            )],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::RepeatedChoiceMember { .. }));
    }

    #[test]
    fn wire_name_lookup_resolves_members() {
        let schema = MessageSchema::new(
            "Msg",
            "urn:t",
            vec![
                int_field("x"),
                FieldSpec::choice(
                    "target",
                    vec![
                        FieldSpec::optional("zone", ValueKind::Primitive(PrimitiveType::String)),
                        FieldSpec::optional("host", ValueKind::Primitive(PrimitiveType::String)),
                    ],
                ),
            ],
        )
        .unwrap();

        let (reference, spec) = schema.field_by_wire_name("host").unwrap();
        assert_eq!(reference, FieldRef { index: 1, member: Some(1) });
        assert_eq!(spec.wire_name, "host");
        assert!(schema.is_choice_group(1));
        assert!(!schema.is_choice_group(0));
        assert!(schema.field_by_wire_name("target").is_none());
    }
}
