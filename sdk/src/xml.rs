//! XML text binding for the token stream.
//!
//! The codec itself never sees markup; this module maps between XML text
//! and [`Token`] streams. The reader resolves namespace prefixes to URIs so
//! tokens always carry full URIs, and the writer assigns prefixes from a
//! [`PrefixRegistry`] and declares them on the root element. Elements are
//! always written with a full close tag, never self-closed.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tidewire_schema::{PrefixRegistry, Token};

lazy_static! {
    // XML declarations and comments carry no tokens
    static ref STRIP_RX: Regex = Regex::new(r"(?s)<\?[^>]*\?>|<!--.*?-->").unwrap();
    static ref TAG_RX:   Regex = Regex::new(
        r#"<(/?)([A-Za-z_][\w.-]*(?::[A-Za-z_][\w.-]*)?)((?:[^<>"]|"[^"]*")*?)(/?)>"#
    ).unwrap();
    static ref ATTR_RX:  Regex = Regex::new(
        r#"([A-Za-z_][\w.-]*(?::[A-Za-z_][\w.-]*)?)\s*=\s*"([^"]*)""#
    ).unwrap();
}

#[derive(Debug, Error, PartialEq)]
pub enum XmlError {
    #[error("XML syntax error near {0:?}")]
    Syntax(String),

    #[error("unbound namespace prefix {0:?}")]
    UnboundPrefix(String),

    #[error("mismatched close tag: expected {expected:?}, found {found:?}")]
    MismatchedTag { expected: String, found: String },

    #[error("close tag {0:?} with no open element")]
    UnexpectedClose(String),

    #[error("unclosed element {0:?}")]
    UnclosedElement(String),
}

/// Scan XML text into a token stream. Prefixes are resolved against the
/// bindings in scope, so the resulting tokens carry namespace URIs only.
pub fn read_xml(text: &str) -> Result<Vec<Token>, XmlError> {
    let text = STRIP_RX.replace_all(text, "");
    let mut tokens = Vec::new();

    // One binding scope per open element: prefix -> URI plus the default
    // namespace for unprefixed element names.
    let mut scopes: Vec<(HashMap<String, String>, String)> =
        vec![(HashMap::new(), String::new())];
    let mut open: Vec<String> = Vec::new();
    let mut last_end = 0;

    for tag in TAG_RX.find_iter(&text) {
        let between = &text[last_end..tag.start()];
        if between.contains('<') {
            return Err(XmlError::Syntax(snippet(between)));
        }
        if !between.is_empty() {
            tokens.push(Token::Text(unescape(between)));
        }
        last_end = tag.end();

        let caps = match TAG_RX.captures(tag.as_str()) {
            Some(caps) => caps,
            None => return Err(XmlError::Syntax(snippet(tag.as_str()))),
        };
        let closing = &caps[1] == "/";
        let qname = caps[2].to_owned();
        let attr_text = caps[3].to_owned();
        let self_closing = &caps[4] == "/";

        if closing {
            let expected = match open.pop() {
                Some(name) => name,
                None => return Err(XmlError::UnexpectedClose(qname)),
            };
            if expected != qname {
                return Err(XmlError::MismatchedTag {
                    expected,
                    found: qname,
                });
            }
            scopes.pop();
            tokens.push(Token::EndElement);
            continue;
        }

        // New scope inherits the enclosing bindings, then applies any
        // xmlns declarations on this element.
        let (mut bindings, mut default_ns) = match scopes.last() {
            Some((bindings, default_ns)) => (bindings.clone(), default_ns.clone()),
            None => (HashMap::new(), String::new()),
        };
        let mut attributes = Vec::new();
        for attr in ATTR_RX.captures_iter(&attr_text) {
            let name = &attr[1];
            let value = unescape(&attr[2]);
            if name == "xmlns" {
                default_ns = value;
            } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                bindings.insert(prefix.to_owned(), value);
            } else {
                attributes.push((name.to_owned(), value));
            }
        }

        let (namespace, local) = resolve(&qname, &bindings, Some(&default_ns))?;
        tokens.push(Token::StartElement { namespace, local });
        for (name, value) in attributes {
            // unprefixed attributes live in no namespace
            let (namespace, local) = resolve(&name, &bindings, None)?;
            tokens.push(Token::Attribute {
                namespace,
                local,
                value,
            });
        }

        if self_closing {
            tokens.push(Token::EndElement);
        } else {
            scopes.push((bindings, default_ns));
            open.push(qname);
        }
    }

    let trailing = &text[last_end..];
    if trailing.contains('<') {
        return Err(XmlError::Syntax(snippet(trailing)));
    }
    if !trailing.is_empty() {
        tokens.push(Token::Text(unescape(trailing)));
    }
    if let Some(name) = open.pop() {
        return Err(XmlError::UnclosedElement(name));
    }
    Ok(tokens)
}

fn resolve(
    qname: &str,
    bindings: &HashMap<String, String>,
    default_ns: Option<&str>,
) -> Result<(String, String), XmlError> {
    match qname.split_once(':') {
        Some((prefix, local)) => match bindings.get(prefix) {
            Some(uri) => Ok((uri.clone(), local.to_owned())),
            None => Err(XmlError::UnboundPrefix(prefix.to_owned())),
        },
        None => Ok((
            default_ns.unwrap_or("").to_owned(),
            qname.to_owned(),
        )),
    }
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    trimmed.chars().take(40).collect()
}

/// Render a token stream as XML text. Every namespace in the stream is
/// declared once, on the root element, under the prefix the registry
/// assigned to it during the pass.
pub fn write_xml(tokens: &[Token], prefixes: &PrefixRegistry) -> String {
    let mut prefixes = prefixes.clone();
    // intern stragglers so the root declaration covers the whole stream
    for token in tokens {
        match token {
            Token::StartElement { namespace, .. } | Token::Attribute { namespace, .. } => {
                if !namespace.is_empty() {
                    prefixes.prefix_for(namespace);
                }
            }
            _ => {}
        }
    }

    let mut out = String::new();
    let mut stack: Vec<String> = Vec::new();
    let mut root_written = false;
    let mut index = 0;

    while index < tokens.len() {
        match &tokens[index] {
            Token::StartElement { namespace, local } => {
                let name = qualified(&prefixes, namespace, local);
                out.push('<');
                out.push_str(&name);
                index += 1;
                while let Some(Token::Attribute {
                    namespace,
                    local,
                    value,
                }) = tokens.get(index)
                {
                    out.push(' ');
                    out.push_str(&qualified(&prefixes, namespace, local));
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                    index += 1;
                }
                if !root_written {
                    for uri in prefixes.uris() {
                        if let Some(prefix) = prefixes.lookup(uri) {
                            out.push_str(&format!(
                                " xmlns:{}=\"{}\"",
                                prefix,
                                escape_attribute(uri)
                            ));
                        }
                    }
                    root_written = true;
                }
                out.push('>');
                stack.push(name);
            }
            // an attribute with no start-element to hang on is dropped
            Token::Attribute { .. } => {
                index += 1;
            }
            Token::Text(text) => {
                out.push_str(&escape_text(text));
                index += 1;
            }
            Token::EndElement => {
                if let Some(name) = stack.pop() {
                    out.push_str("</");
                    out.push_str(&name);
                    out.push('>');
                }
                index += 1;
            }
        }
    }
    out
}

fn qualified(prefixes: &PrefixRegistry, namespace: &str, local: &str) -> String {
    if namespace.is_empty() {
        return local.to_owned();
    }
    match prefixes.lookup(namespace) {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_owned(),
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
