use crate::{
    error::CompilerError,
    tokenizer::Token,
    types::{CardinalityDecl, FieldDecl, FieldDeclKind, MessageDecl, SchemaFile},
    utils::{error, quote},
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER:        Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref STRING_LITERAL:    Regex = Regex::new(r#"^"[^"]*"$"#).unwrap();
    static ref SEMICOLON:         Regex = Regex::new(r"^;$").unwrap();
    static ref LEFT_BRACE:        Regex = Regex::new(r"^\{$").unwrap();
    static ref RIGHT_BRACE:       Regex = Regex::new(r"^\}$").unwrap();
    static ref NAMESPACE_KEYWORD: Regex = Regex::new(r"^namespace$").unwrap();
    static ref MESSAGE_KEYWORD:   Regex = Regex::new(r"^message$").unwrap();
    static ref CHOICE_KEYWORD:    Regex = Regex::new(r"^choice$").unwrap();
    static ref REQUIRED_KEYWORD:  Regex = Regex::new(r"^required$").unwrap();
    static ref OPTIONAL_KEYWORD:  Regex = Regex::new(r"^optional$").unwrap();
    static ref REPEATED_KEYWORD:  Regex = Regex::new(r"^repeated$").unwrap();
    static ref EOF:               Regex = Regex::new(r"^$").unwrap();
}

/// Parse a token stream into a [`SchemaFile`].
pub fn parse(tokens: &[Token]) -> Result<SchemaFile, CompilerError> {
    let mut messages = Vec::new();
    let mut index = 0;

    fn current_token<'a>(tokens: &'a [Token], index: usize) -> &'a Token {
        tokens.get(index).expect("Unexpected end of tokens")
    }

    fn eat(tokens: &[Token], index: &mut usize, test: &Regex) -> bool {
        if test.is_match(&current_token(tokens, *index).text) {
            *index += 1;
            true
        } else {
            false
        }
    }

    fn expect(
        tokens: &[Token],
        index: &mut usize,
        test: &Regex,
        expected: &str,
    ) -> Result<(), CompilerError> {
        if !eat(tokens, index, test) {
            let tok = current_token(tokens, *index);
            return Err(error(
                &format!("Expected {} but found {}", expected, quote(&tok.text)),
                tok.line,
                tok.column,
            ));
        }
        Ok(())
    }

    fn unexpected_token(tokens: &[Token], index: &mut usize) -> CompilerError {
        let tok = current_token(tokens, *index);
        error(
            &format!("Unexpected token {}", quote(&tok.text)),
            tok.line,
            tok.column,
        )
    }

    fn parse_field(tokens: &[Token], index: &mut usize) -> Result<FieldDecl, CompilerError> {
        let cardinality = if eat(tokens, index, &REQUIRED_KEYWORD) {
            CardinalityDecl::Required
        } else if eat(tokens, index, &OPTIONAL_KEYWORD) {
            CardinalityDecl::Optional
        } else if eat(tokens, index, &REPEATED_KEYWORD) {
            CardinalityDecl::Repeated
        } else if CHOICE_KEYWORD.is_match(&current_token(tokens, *index).text) {
            // a bare choice group defaults to optional
            CardinalityDecl::Optional
        } else {
            let tok = current_token(tokens, *index);
            return Err(error(
                &format!(
                    "Expected \"required\", \"optional\", \"repeated\", or \"choice\" but found {}",
                    quote(&tok.text)
                ),
                tok.line,
                tok.column,
            ));
        };

        if eat(tokens, index, &CHOICE_KEYWORD) {
            if cardinality == CardinalityDecl::Repeated {
                let tok = current_token(tokens, *index);
                return Err(error("A choice group cannot be repeated", tok.line, tok.column));
            }
            let name_tok = current_token(tokens, *index);
            expect(tokens, index, &IDENTIFIER, "identifier")?;
            expect(tokens, index, &LEFT_BRACE, "\"{\"")?;

            let mut members = Vec::new();
            while !eat(tokens, index, &RIGHT_BRACE) {
                // members carry no cardinality of their own
                let type_tok = current_token(tokens, *index);
                expect(tokens, index, &IDENTIFIER, "identifier")?;
                let member_tok = current_token(tokens, *index);
                expect(tokens, index, &IDENTIFIER, "identifier")?;
                expect(tokens, index, &SEMICOLON, "\";\"")?;
                members.push(FieldDecl {
                    name:        member_tok.text.clone(),
                    line:        member_tok.line,
                    column:      member_tok.column,
                    cardinality: CardinalityDecl::Optional,
                    kind:        FieldDeclKind::Typed { type_name: type_tok.text.clone() },
                });
            }

            return Ok(FieldDecl {
                name:        name_tok.text.clone(),
                line:        name_tok.line,
                column:      name_tok.column,
                cardinality,
                kind:        FieldDeclKind::Choice { members },
            });
        }

        let type_tok = current_token(tokens, *index);
        expect(tokens, index, &IDENTIFIER, "identifier")?;
        let name_tok = current_token(tokens, *index);
        expect(tokens, index, &IDENTIFIER, "identifier")?;
        expect(tokens, index, &SEMICOLON, "\";\"")?;

        Ok(FieldDecl {
            name:        name_tok.text.clone(),
            line:        name_tok.line,
            column:      name_tok.column,
            cardinality,
            kind:        FieldDeclKind::Typed { type_name: type_tok.text.clone() },
        })
    }

    // Every file opens with its wire namespace
    let ns_keyword = current_token(tokens, index);
    if !eat(tokens, &mut index, &NAMESPACE_KEYWORD) {
        return Err(error(
            "Expected \"namespace\" declaration",
            ns_keyword.line,
            ns_keyword.column,
        ));
    }
    let ns_tok = current_token(tokens, index);
    expect(tokens, &mut index, &STRING_LITERAL, "string literal")?;
    let namespace = ns_tok.text.trim_matches('"').to_owned();
    expect(tokens, &mut index, &SEMICOLON, "\";\"")?;

    // Parse message declarations one by one
    while index < tokens.len() && !eat(tokens, &mut index, &EOF) {
        if !eat(tokens, &mut index, &MESSAGE_KEYWORD) {
            return Err(unexpected_token(tokens, &mut index));
        }

        let name_tok = current_token(tokens, index);
        expect(tokens, &mut index, &IDENTIFIER, "identifier")?;
        expect(tokens, &mut index, &LEFT_BRACE, "\"{\"")?;

        let mut fields = Vec::new();
        while !eat(tokens, &mut index, &RIGHT_BRACE) {
            fields.push(parse_field(tokens, &mut index)?);
        }

        messages.push(MessageDecl {
            name:   name_tok.text.clone(),
            line:   name_tok.line,
            column: name_tok.column,
            fields,
        });
    }

    Ok(SchemaFile {
        namespace,
        messages,
    })
}
