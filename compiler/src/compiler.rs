use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tidewire_schema::{
    FieldSpec, MessageSchema, PrimitiveType, SchemaRegistry, ValueKind,
};
use tracing::debug;

use crate::{
    error::CompilerError,
    parser::parse,
    tokenizer::tokenize,
    types::{CardinalityDecl, FieldDecl, FieldDeclKind, MessageDecl, SchemaFile},
    utils::quote,
    verifier::verify,
};

/// The output of one compilation: every message type from the source file,
/// lowered to runtime schemas and registered for type-override dispatch.
#[derive(Debug)]
pub struct CompiledSchemas {
    namespace: String,
    registry: SchemaRegistry,
    by_name: HashMap<String, Arc<MessageSchema>>,
    order: Vec<String>,
}

impl CompiledSchemas {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, name: &str) -> Option<&Arc<MessageSchema>> {
        self.by_name.get(name)
    }

    /// Message names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}

/// Compile `.twl` text into runtime schemas.
/// Returns `Err(CompilerError)` if tokenization/parsing/verification fails.
pub fn compile_str(text: &str) -> Result<CompiledSchemas, CompilerError> {
    let tokens = tokenize(text)?;
    let file = parse(&tokens)?;
    verify(&file)?;
    lower(&file)
}

pub fn compile_file<P: AsRef<Path>>(path: P) -> Result<CompiledSchemas, CompilerError> {
    let text = std::fs::read_to_string(path)?;
    compile_str(&text)
}

/// Lower a verified file to `MessageSchema` values. Messages may reference
/// each other in any declaration order, so build in dependency order; the
/// verifier has already rejected cycles.
fn lower(file: &SchemaFile) -> Result<CompiledSchemas, CompilerError> {
    let mut by_name: HashMap<String, Arc<MessageSchema>> = HashMap::new();
    let mut pending: Vec<&MessageDecl> = file.messages.iter().collect();

    while !pending.is_empty() {
        let mut remaining = Vec::new();
        let mut progressed = false;

        for message in pending {
            if !references_ready(message, &by_name) {
                remaining.push(message);
                continue;
            }
            let schema = lower_message(message, &file.namespace, &by_name)?;
            debug!(name = %message.name, fields = schema.fields().len(), "lowered message");
            by_name.insert(message.name.clone(), schema);
            progressed = true;
        }

        if !progressed {
            // unreachable after verification; fail loudly rather than loop
            let stuck = remaining
                .iter()
                .map(|m| quote(&m.name))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(CompilerError::VerifierError(format!(
                "Cannot order message definitions: {}",
                stuck
            )));
        }
        pending = remaining;
    }

    let mut registry = SchemaRegistry::new();
    for schema in by_name.values() {
        registry.register(Arc::clone(schema))?;
    }

    // report names in declaration order, not build order
    let mut declared: Vec<String> = Vec::with_capacity(file.messages.len());
    for message in &file.messages {
        declared.push(message.name.clone());
    }

    Ok(CompiledSchemas {
        namespace: file.namespace.clone(),
        registry,
        by_name,
        order: declared,
    })
}

fn references_ready(message: &MessageDecl, by_name: &HashMap<String, Arc<MessageSchema>>) -> bool {
    fn ready(type_name: &str, by_name: &HashMap<String, Arc<MessageSchema>>) -> bool {
        lower_primitive(type_name).is_some() || by_name.contains_key(type_name)
    }

    message.fields.iter().all(|field| match &field.kind {
        FieldDeclKind::Typed { type_name } => ready(type_name, by_name),
        FieldDeclKind::Choice { members } => members.iter().all(|member| match &member.kind {
            FieldDeclKind::Typed { type_name } => ready(type_name, by_name),
            FieldDeclKind::Choice { .. } => false,
        }),
    })
}

fn lower_message(
    message: &MessageDecl,
    namespace: &str,
    by_name: &HashMap<String, Arc<MessageSchema>>,
) -> Result<Arc<MessageSchema>, CompilerError> {
    let mut fields = Vec::with_capacity(message.fields.len());

    for field in &message.fields {
        let spec = match &field.kind {
            FieldDeclKind::Typed { type_name } => {
                let kind = lower_kind(type_name, by_name)?;
                match field.cardinality {
                    CardinalityDecl::Required => FieldSpec::required(&field.name, kind),
                    CardinalityDecl::Optional => FieldSpec::optional(&field.name, kind),
                    CardinalityDecl::Repeated => FieldSpec::repeated(&field.name, kind),
                }
            }
            FieldDeclKind::Choice { members } => {
                let mut specs = Vec::with_capacity(members.len());
                for member in members {
                    specs.push(lower_member(member, by_name)?);
                }
                match field.cardinality {
                    CardinalityDecl::Required => FieldSpec::required_choice(&field.name, specs),
                    _ => FieldSpec::choice(&field.name, specs),
                }
            }
        };
        fields.push(spec);
    }

    Ok(MessageSchema::new(&message.name, namespace, fields)?)
}

fn lower_member(
    member: &FieldDecl,
    by_name: &HashMap<String, Arc<MessageSchema>>,
) -> Result<FieldSpec, CompilerError> {
    match &member.kind {
        FieldDeclKind::Typed { type_name } => {
            let kind = lower_kind(type_name, by_name)?;
            Ok(FieldSpec::optional(&member.name, kind))
        }
        FieldDeclKind::Choice { .. } => Err(CompilerError::VerifierError(format!(
            "The choice member {} cannot be a choice group",
            quote(&member.name)
        ))),
    }
}

fn lower_kind(
    type_name: &str,
    by_name: &HashMap<String, Arc<MessageSchema>>,
) -> Result<ValueKind, CompilerError> {
    if let Some(primitive) = lower_primitive(type_name) {
        return Ok(ValueKind::Primitive(primitive));
    }
    match by_name.get(type_name) {
        Some(schema) => Ok(ValueKind::Message(Arc::clone(schema))),
        None => Err(CompilerError::VerifierError(format!(
            "The type {} is not defined",
            quote(type_name)
        ))),
    }
}

fn lower_primitive(type_name: &str) -> Option<PrimitiveType> {
    match type_name {
        "bool" => Some(PrimitiveType::Bool),
        "int" => Some(PrimitiveType::Int),
        "string" => Some(PrimitiveType::String),
        "timestamp" => Some(PrimitiveType::Timestamp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidewire_schema::Cardinality;

    #[test]
    fn compiles_messages_in_any_declaration_order() {
        let compiled = compile_str(
            r#"
            namespace "urn:demo";

            message Outer {
              required string name;
              repeated Inner items;
            }

            message Inner {
              required int value;
            }
            "#,
        )
        .unwrap();

        assert_eq!(compiled.namespace(), "urn:demo");
        assert_eq!(compiled.names(), &["Outer".to_owned(), "Inner".to_owned()]);

        let outer = compiled.get("Outer").unwrap();
        assert_eq!(outer.fields().len(), 2);
        assert_eq!(outer.fields()[1].cardinality, Cardinality::RepeatedOptional);
        match &outer.fields()[1].kind {
            ValueKind::Message(inner) => assert_eq!(inner.type_name(), "Inner"),
            other => panic!("expected a message field, got {:?}", other),
        }
    }

    #[test]
    fn every_message_is_registered_for_dispatch() {
        let compiled = compile_str(
            r#"
            namespace "urn:demo";
            message A { required int x; }
            message B { required int y; }
            "#,
        )
        .unwrap();

        assert_eq!(compiled.registry().len(), 2);
        assert!(compiled.registry().resolve("urn:demo", "A").is_some());
        assert!(compiled.registry().resolve("urn:demo", "B").is_some());
    }

    #[test]
    fn choice_groups_lower_with_their_cardinality() {
        let compiled = compile_str(
            r#"
            namespace "urn:demo";
            message M {
              required choice target {
                string zoneName;
                int zoneId;
              }
            }
            "#,
        )
        .unwrap();

        let schema = compiled.get("M").unwrap();
        assert_eq!(schema.fields()[0].cardinality, Cardinality::Required);
        match &schema.fields()[0].kind {
            ValueKind::Choice(members) => {
                assert_eq!(members[0].wire_name, "zoneName");
                assert!(matches!(
                    members[1].kind,
                    ValueKind::Primitive(PrimitiveType::Int)
                ));
            }
            other => panic!("expected a choice group, got {:?}", other),
        }
    }

    #[test]
    fn verification_failures_surface_through_compile() {
        let err = compile_str("namespace \"urn:demo\";\nmessage M { required Ghost x; }")
            .unwrap_err();
        assert!(matches!(err, CompilerError::VerifierError(_)));
    }
}
