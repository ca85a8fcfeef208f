use std::collections::HashMap;

use crate::{
    error::CompilerError,
    types::{FieldDecl, FieldDeclKind, MessageDecl, SchemaFile},
    utils::quote,
};

pub const PRIMITIVE_TYPES: [&str; 4] = ["bool", "int", "string", "timestamp"];

/// Returns `Ok(())` if verification passed, or
/// `Err(CompilerError::VerifierError(_))` otherwise.
pub fn verify(file: &SchemaFile) -> Result<(), CompilerError> {
    let mut defined_types: Vec<String> = PRIMITIVE_TYPES.iter().map(|s| s.to_string()).collect();
    let mut messages_map: HashMap<String, &MessageDecl> = HashMap::new();

    // 1) Check duplicate / reserved message names
    for message in &file.messages {
        if defined_types.contains(&message.name) {
            return Err(CompilerError::VerifierError(format!(
                "The type {} is defined twice",
                quote(&message.name)
            )));
        }
        defined_types.push(message.name.clone());
        messages_map.insert(message.name.clone(), message);
    }

    // 2) Check the fields inside each message
    for message in &file.messages {
        let mut wire_names: Vec<&str> = Vec::new();

        for field in &message.fields {
            match &field.kind {
                FieldDeclKind::Typed { type_name } => {
                    if !defined_types.contains(type_name) {
                        return Err(CompilerError::VerifierError(format!(
                            "The type {} is not defined for field {}",
                            quote(type_name),
                            quote(&field.name)
                        )));
                    }
                    check_wire_name(&mut wire_names, field)?;
                }
                FieldDeclKind::Choice { members } => {
                    if members.len() < 2 {
                        return Err(CompilerError::VerifierError(format!(
                            "The choice group {} must have at least two members",
                            quote(&field.name)
                        )));
                    }
                    // members share the enclosing message's wire-name space
                    for member in members {
                        match &member.kind {
                            FieldDeclKind::Typed { type_name } => {
                                if !defined_types.contains(type_name) {
                                    return Err(CompilerError::VerifierError(format!(
                                        "The type {} is not defined for field {}",
                                        quote(type_name),
                                        quote(&member.name)
                                    )));
                                }
                            }
                            FieldDeclKind::Choice { .. } => {
                                return Err(CompilerError::VerifierError(format!(
                                    "The choice group {} cannot contain another choice group",
                                    quote(&field.name)
                                )));
                            }
                        }
                        check_wire_name(&mut wire_names, member)?;
                    }
                }
            }
        }
    }

    // 3) Check that messages do not contain themselves recursively. Schemas
    // are immutable once built, so a cycle could never be constructed anyway;
    // reject it here with a source position instead of failing later.
    let mut state: HashMap<String, u8> = HashMap::new();
    fn check_recursion(
        name: &str,
        messages_map: &HashMap<String, &MessageDecl>,
        state: &mut HashMap<String, u8>,
    ) -> Result<(), CompilerError> {
        let message = match messages_map.get(name) {
            Some(message) => message,
            None => return Ok(()),
        };
        if let Some(&s) = state.get(name) {
            if s == 1 {
                return Err(CompilerError::VerifierError(format!(
                    "Recursive nesting of {} is not allowed",
                    quote(name)
                )));
            } else if s == 2 {
                return Ok(());
            }
        }
        state.insert(name.to_string(), 1);
        for field in &message.fields {
            match &field.kind {
                FieldDeclKind::Typed { type_name } => {
                    check_recursion(type_name, messages_map, state)?;
                }
                FieldDeclKind::Choice { members } => {
                    for member in members {
                        if let FieldDeclKind::Typed { type_name } = &member.kind {
                            check_recursion(type_name, messages_map, state)?;
                        }
                    }
                }
            }
        }
        state.insert(name.to_string(), 2);
        Ok(())
    }

    for message in &file.messages {
        check_recursion(&message.name, &messages_map, &mut state)?;
    }

    Ok(())
}

fn check_wire_name<'a>(
    wire_names: &mut Vec<&'a str>,
    field: &'a FieldDecl,
) -> Result<(), CompilerError> {
    if wire_names.contains(&field.name.as_str()) {
        return Err(CompilerError::VerifierError(format!(
            "The wire name {} is used twice",
            quote(&field.name)
        )));
    }
    wire_names.push(&field.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse, tokenizer::tokenize};

    fn verify_text(text: &str) -> Result<(), CompilerError> {
        verify(&parse(&tokenize(text)?)?)
    }

    #[test]
    fn accepts_a_well_formed_file() {
        verify_text(
            r#"
            namespace "urn:demo";
            message Inner {
              required int value;
            }
            message Outer {
              required string name;
              repeated Inner items;
              choice target {
                string zoneName;
                Inner inner;
              }
            }
            "#,
        )
        .unwrap();
    }

    #[test]
    fn rejects_unknown_types() {
        let err = verify_text(
            "namespace \"urn:demo\";\nmessage M { required Mystery x; }",
        )
        .unwrap_err();
        assert!(matches!(err, CompilerError::VerifierError(_)));
    }

    #[test]
    fn rejects_duplicate_message_names() {
        let err = verify_text(
            "namespace \"urn:demo\";\nmessage M { required int x; }\nmessage M { required int y; }",
        )
        .unwrap_err();
        assert!(matches!(err, CompilerError::VerifierError(_)));
    }

    #[test]
    fn rejects_message_names_shadowing_primitives() {
        let err = verify_text("namespace \"urn:demo\";\nmessage int { required int x; }")
            .unwrap_err();
        assert!(matches!(err, CompilerError::VerifierError(_)));
    }

    #[test]
    fn rejects_wire_names_shared_with_choice_members() {
        let err = verify_text(
            r#"
            namespace "urn:demo";
            message M {
              required string zoneName;
              choice target {
                string zoneName;
                int zoneId;
              }
            }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CompilerError::VerifierError(_)));
    }

    #[test]
    fn rejects_single_member_choice_groups() {
        let err = verify_text(
            "namespace \"urn:demo\";\nmessage M { choice target { string a; } }",
        )
        .unwrap_err();
        assert!(matches!(err, CompilerError::VerifierError(_)));
    }

    #[test]
    fn rejects_recursive_nesting() {
        let err = verify_text(
            r#"
            namespace "urn:demo";
            message A { optional B b; }
            message B { optional A a; }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CompilerError::VerifierError(_)));
    }
}
