use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::schema::MessageSchema;

/// Value-keyed lookup from `(namespace, type name)` to schema.
///
/// The decoder dispatches wire type-override attributes through this map
/// instead of any reflective lookup. Populate it at startup, then treat it
/// as read-only; it is safe to share across threads once populated.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    by_key: HashMap<(String, String), Arc<MessageSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> SchemaRegistry {
        SchemaRegistry::default()
    }

    /// Register `schema` under its own namespace and type name. Registering
    /// the same identity twice is a configuration error and fails fast.
    pub fn register(&mut self, schema: Arc<MessageSchema>) -> Result<(), SchemaError> {
        let key = (
            schema.namespace().to_owned(),
            schema.type_name().to_owned(),
        );
        if self.by_key.contains_key(&key) {
            return Err(SchemaError::DuplicateRegistration {
                namespace: key.0,
                type_name: key.1,
            });
        }
        self.by_key.insert(key, schema);
        Ok(())
    }

    pub fn resolve(&self, namespace: &str, type_name: &str) -> Option<&Arc<MessageSchema>> {
        self.by_key
            .get(&(namespace.to_owned(), type_name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<MessageSchema>> {
        self.by_key.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, ValueKind};
    use crate::value::PrimitiveType;

    fn schema(name: &str) -> Arc<MessageSchema> {
        MessageSchema::new(
            name,
            "urn:t",
            vec![FieldSpec::optional(
                "a",
                ValueKind::Primitive(PrimitiveType::String),
            )],
        )
        .unwrap()
    }

    #[test]
    fn resolves_by_namespace_and_name() {
        let mut registry = SchemaRegistry::new();
        registry.register(schema("A")).unwrap();
        registry.register(schema("B")).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("urn:t", "A").is_some());
        assert!(registry.resolve("urn:t", "C").is_none());
        assert!(registry.resolve("urn:other", "A").is_none());
    }

    #[test]
    fn duplicate_registration_fails_fast() {
        let mut registry = SchemaRegistry::new();
        registry.register(schema("A")).unwrap();
        let err = registry.register(schema("A")).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateRegistration {
                namespace: "urn:t".to_owned(),
                type_name: "A".to_owned(),
            }
        );
    }
}
