use std::collections::HashMap;

/// One structural event in a wire document.
///
/// The codec's boundary is this generic token stream; a concrete wire
/// format (XML text, a streaming parser, a test fixture) is mapped to and
/// from tokens by the surrounding layer. Attribute tokens always follow
/// the start-element they belong to, before any content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartElement {
        namespace: String,
        local: String,
    },
    Attribute {
        namespace: String,
        local: String,
        value: String,
    },
    Text(String),
    EndElement,
}

/// A positioned cursor over a token stream, meant for reading.
///
/// Example usage:
///
/// ```
/// use tidewire_schema::{Token, TokenReader};
///
/// let tokens = vec![
///     Token::StartElement { namespace: "urn:demo".into(), local: "x".into() },
///     Token::Text("3".into()),
///     Token::EndElement,
/// ];
/// let mut reader = TokenReader::new(&tokens);
/// assert_eq!(reader.current_element_name(), Some(("urn:demo", "x")));
/// ```
pub struct TokenReader<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> TokenReader<'a> {
    /// Create a new reader positioned at the first token. The reader must
    /// not outlive the token slice it wraps.
    pub fn new(tokens: &'a [Token]) -> TokenReader<'a> {
        TokenReader { tokens, index: 0 }
    }

    /// Current position into the underlying slice. Starts at 0 and ends up
    /// at `tokens.len()` once everything has been consumed.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The token under the cursor without consuming it.
    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    /// Consume and return the token under the cursor.
    pub fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.index);
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Skip whitespace-only text so the cursor rests on a structural token.
    /// Non-whitespace text is left in place for the caller to report.
    pub fn advance_to_structural(&mut self) {
        while let Some(Token::Text(text)) = self.peek() {
            if text.trim().is_empty() {
                self.index += 1;
            } else {
                break;
            }
        }
    }

    /// Namespace and local name of the start-element under the cursor.
    pub fn current_element_name(&self) -> Option<(&'a str, &'a str)> {
        match self.peek()? {
            Token::StartElement { namespace, local } => Some((namespace, local)),
            _ => None,
        }
    }

    /// Value of the named attribute on the start-element under the cursor.
    /// Does not move the cursor.
    pub fn current_attribute_value(&self, namespace: &str, local: &str) -> Option<&'a str> {
        match self.peek()? {
            Token::StartElement { .. } => {}
            _ => return None,
        }
        for token in &self.tokens[self.index + 1..] {
            match token {
                Token::Attribute {
                    namespace: ns,
                    local: l,
                    value,
                } => {
                    if ns == namespace && l == local {
                        return Some(value);
                    }
                }
                _ => break,
            }
        }
        None
    }

    /// Consume the start-element under the cursor together with its
    /// attribute tokens. Does nothing if the cursor is elsewhere.
    pub fn consume_start_element(&mut self) {
        if let Some(Token::StartElement { .. }) = self.peek() {
            self.index += 1;
            while let Some(Token::Attribute { .. }) = self.peek() {
                self.index += 1;
            }
        }
    }
}

/// Namespace-prefix bookkeeping for one serialization pass.
///
/// A prefix is assigned the first time a namespace URI is seen and is never
/// reassigned within the pass, so every element sharing a URI shares one
/// prefix and one `xmlns` declaration. One registry per pass; never shared
/// across concurrent encodes.
#[derive(Debug, Clone, Default)]
pub struct PrefixRegistry {
    by_uri: HashMap<String, String>,
    order: Vec<String>,
}

impl PrefixRegistry {
    pub fn new() -> PrefixRegistry {
        PrefixRegistry::default()
    }

    /// Prefix for `uri`, assigning `ns1`, `ns2`, ... on first use.
    pub fn prefix_for(&mut self, uri: &str) -> &str {
        if !self.by_uri.contains_key(uri) {
            self.order.push(uri.to_owned());
            let prefix = format!("ns{}", self.order.len());
            self.by_uri.insert(uri.to_owned(), prefix);
        }
        &self.by_uri[uri]
    }

    /// Prefix already assigned to `uri`, if any.
    pub fn lookup(&self, uri: &str) -> Option<&str> {
        self.by_uri.get(uri).map(|s| s.as_str())
    }

    /// Namespace URIs in assignment order.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Collects tokens for one serialization pass, interning namespace URIs
/// into its [`PrefixRegistry`] as they are first written.
#[derive(Debug, Default)]
pub struct TokenWriter {
    tokens: Vec<Token>,
    prefixes: PrefixRegistry,
}

impl TokenWriter {
    pub fn new() -> TokenWriter {
        TokenWriter::default()
    }

    pub fn start_element(&mut self, namespace: &str, local: &str) {
        if !namespace.is_empty() {
            self.prefixes.prefix_for(namespace);
        }
        self.tokens.push(Token::StartElement {
            namespace: namespace.to_owned(),
            local: local.to_owned(),
        });
    }

    pub fn attribute(&mut self, namespace: &str, local: &str, value: &str) {
        if !namespace.is_empty() {
            self.prefixes.prefix_for(namespace);
        }
        self.tokens.push(Token::Attribute {
            namespace: namespace.to_owned(),
            local: local.to_owned(),
            value: value.to_owned(),
        });
    }

    pub fn text(&mut self, text: &str) {
        self.tokens.push(Token::Text(text.to_owned()));
    }

    pub fn end_element(&mut self) {
        self.tokens.push(Token::EndElement);
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn prefixes(&self) -> &PrefixRegistry {
        &self.prefixes
    }

    pub fn into_parts(self) -> (Vec<Token>, PrefixRegistry) {
        (self.tokens, self.prefixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_stable_within_a_pass() {
        let mut registry = PrefixRegistry::new();
        assert_eq!(registry.prefix_for("urn:a"), "ns1");
        assert_eq!(registry.prefix_for("urn:b"), "ns2");
        assert_eq!(registry.prefix_for("urn:a"), "ns1");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.uris().collect::<Vec<_>>(), vec!["urn:a", "urn:b"]);
    }

    #[test]
    fn writer_interns_namespaces_on_first_use() {
        let mut writer = TokenWriter::new();
        writer.start_element("urn:a", "root");
        writer.start_element("urn:a", "child");
        writer.text("v");
        writer.end_element();
        writer.end_element();

        let (tokens, prefixes) = writer.into_parts();
        assert_eq!(tokens.len(), 5);
        assert_eq!(prefixes.len(), 1);
        assert_eq!(prefixes.lookup("urn:a"), Some("ns1"));
    }

    #[test]
    fn reader_attribute_lookup_does_not_move_the_cursor() {
        let tokens = vec![
            Token::StartElement {
                namespace: "urn:a".into(),
                local: "e".into(),
            },
            Token::Attribute {
                namespace: "urn:x".into(),
                local: "type".into(),
                value: "Sub".into(),
            },
            Token::EndElement,
        ];
        let reader = TokenReader::new(&tokens);
        assert_eq!(reader.current_attribute_value("urn:x", "type"), Some("Sub"));
        assert_eq!(reader.current_attribute_value("urn:x", "other"), None);
        assert_eq!(reader.index(), 0);
    }

    #[test]
    fn reader_skips_whitespace_only_text() {
        let tokens = vec![
            Token::Text("  \n  ".into()),
            Token::StartElement {
                namespace: String::new(),
                local: "e".into(),
            },
        ];
        let mut reader = TokenReader::new(&tokens);
        reader.advance_to_structural();
        assert_eq!(reader.current_element_name(), Some(("", "e")));
    }

    #[test]
    fn consume_start_element_swallows_attributes() {
        let tokens = vec![
            Token::StartElement {
                namespace: String::new(),
                local: "e".into(),
            },
            Token::Attribute {
                namespace: String::new(),
                local: "a".into(),
                value: "1".into(),
            },
            Token::Text("body".into()),
        ];
        let mut reader = TokenReader::new(&tokens);
        reader.consume_start_element();
        assert_eq!(reader.peek(), Some(&Token::Text("body".into())));
    }
}
