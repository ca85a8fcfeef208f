use serde::Serialize;

/// One parsed `.twl` file: a wire namespace and its message declarations.
#[derive(Debug, PartialEq, Serialize)]
pub struct SchemaFile {
    pub namespace: String,
    pub messages:  Vec<MessageDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDecl {
    pub name:   String,
    pub line:   usize,
    pub column: usize,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CardinalityDecl {
    Required,
    Optional,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    pub name:        String,
    pub line:        usize,
    pub column:      usize,
    pub cardinality: CardinalityDecl,
    pub kind:        FieldDeclKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldDeclKind {
    /// A primitive or message type reference.
    Typed { type_name: String },
    /// Mutually exclusive alternatives; members carry no cardinality of
    /// their own.
    Choice { members: Vec<FieldDecl> },
}
