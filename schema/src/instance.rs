use std::collections::HashMap;
use std::sync::Arc;

use crate::schema::{FieldRef, MessageSchema};
use crate::value::Value;

/// The value stored in one field slot of a [`MessageInstance`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Primitive(Value),
    Message(MessageInstance),
    /// Items in document order; re-encoding reproduces the same order.
    Repeated(Vec<FieldValue>),
    /// The active member of a choice group. A group holds at most one of
    /// these at a time.
    Choice { member: usize, value: Box<FieldValue> },
}

impl FieldValue {
    /// A convenience method to extract a [Primitive](#variant.Primitive).
    pub fn as_primitive(&self) -> Option<&Value> {
        match self {
            FieldValue::Primitive(value) => Some(value),
            _ => None,
        }
    }

    /// A convenience method to extract a [Message](#variant.Message).
    pub fn as_message(&self) -> Option<&MessageInstance> {
        match self {
            FieldValue::Message(instance) => Some(instance),
            _ => None,
        }
    }

    /// A convenience method to extract the items of a [Repeated](#variant.Repeated).
    /// Returns an empty slice for other kinds.
    pub fn as_repeated(&self) -> &[FieldValue] {
        match self {
            FieldValue::Repeated(items) => items.as_slice(),
            _ => &[],
        }
    }
}

/// A typed value conforming to one [`MessageSchema`].
///
/// Constructed empty, mutated only through setters that keep the value map
/// and the set-flag tracker in lockstep. Instances are single-threaded
/// values: one decode or encode call owns one instance graph, and nothing
/// is shared across concurrent requests. Nested instances are owned by
/// their container; the schema is shared and outlives them all.
#[derive(Debug, Clone)]
pub struct MessageInstance {
    schema: Arc<MessageSchema>,
    values: HashMap<usize, FieldValue>,
    set_flags: Vec<bool>,
}

impl MessageInstance {
    /// An empty instance: every optional tracker false, every slot vacant.
    pub fn new(schema: &Arc<MessageSchema>) -> MessageInstance {
        MessageInstance {
            schema: Arc::clone(schema),
            values: HashMap::new(),
            set_flags: vec![false; schema.fields().len()],
        }
    }

    pub fn schema(&self) -> &Arc<MessageSchema> {
        &self.schema
    }

    /// Set `name` (a field or a choice member) to `value`. Returns `false`
    /// when the schema has no such wire name.
    ///
    /// Writing a choice member overwrites whichever sibling was active:
    /// the group holds at most one value, so the last setter wins and the
    /// other members' trackers read as unset.
    pub fn set(&mut self, name: &str, value: FieldValue) -> bool {
        let reference = match self.schema.field_by_wire_name(name) {
            Some((reference, _)) => reference,
            None => return false,
        };
        self.set_at(reference, value);
        true
    }

    pub(crate) fn set_at(&mut self, reference: FieldRef, value: FieldValue) {
        let stored = match reference.member {
            Some(member) => FieldValue::Choice {
                member,
                value: Box::new(value),
            },
            None => value,
        };
        self.values.insert(reference.index, stored);
        self.set_flags[reference.index] = true;
    }

    /// Append to a repeated field, creating the sequence on first use.
    /// Returns `false` for unknown wire names.
    pub fn push(&mut self, name: &str, value: FieldValue) -> bool {
        let reference = match self.schema.field_by_wire_name(name) {
            Some((reference, _)) => reference,
            None => return false,
        };
        if reference.member.is_some() {
            // choice members are never repeated
            return false;
        }
        match self.values.entry(reference.index).or_insert_with(|| FieldValue::Repeated(Vec::new())) {
            FieldValue::Repeated(items) => items.push(value),
            other => *other = FieldValue::Repeated(vec![value]),
        }
        self.set_flags[reference.index] = true;
        true
    }

    /// Tracker state for `name`. For a choice member this is true only
    /// while that member is the active one.
    pub fn is_set(&self, name: &str) -> bool {
        let reference = match self.schema.field_by_wire_name(name) {
            Some((reference, _)) => reference,
            None => return false,
        };
        if !self.set_flags[reference.index] {
            return false;
        }
        match (reference.member, self.values.get(&reference.index)) {
            (Some(member), Some(FieldValue::Choice { member: active, .. })) => member == *active,
            (Some(_), _) => false,
            (None, _) => true,
        }
    }

    /// Value stored under `name`. For a choice member, the member's value
    /// while it is the active one.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let (reference, _) = self.schema.field_by_wire_name(name)?;
        let stored = self.values.get(&reference.index)?;
        match (reference.member, stored) {
            (Some(member), FieldValue::Choice { member: active, value }) => {
                if member == *active {
                    Some(value)
                } else {
                    None
                }
            }
            (Some(_), _) => None,
            (None, _) => Some(stored),
        }
    }

    /// Clear `name`, resetting its tracker. Clearing any member of a choice
    /// group clears the whole group. Returns `false` for unknown names.
    pub fn clear(&mut self, name: &str) -> bool {
        let reference = match self.schema.field_by_wire_name(name) {
            Some((reference, _)) => reference,
            None => return false,
        };
        self.values.remove(&reference.index);
        self.set_flags[reference.index] = false;
        true
    }

    /// Raw slot access by field index, used by the encoder and bridges.
    pub fn value_at(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(&index)
    }

    /// Tracker state by field index. For choice groups this is the group's
    /// flag, regardless of which member is active.
    pub fn is_set_at(&self, index: usize) -> bool {
        self.set_flags.get(index).copied().unwrap_or(false)
    }
}

/// Equality is schema identity plus field-for-field values, including
/// tracker state, which is what the round-trip property compares.
impl PartialEq for MessageInstance {
    fn eq(&self, other: &MessageInstance) -> bool {
        self.schema.type_name() == other.schema.type_name()
            && self.schema.namespace() == other.schema.namespace()
            && self.set_flags == other.set_flags
            && self.values == other.values
    }
}

/// Looks only at the group slots present in `schema`; callers use this to
/// assert the "at most one alternative active" invariant in bulk.
pub fn active_choice_member(instance: &MessageInstance, group_index: usize) -> Option<usize> {
    if !instance.schema().is_choice_group(group_index) {
        return None;
    }
    match instance.value_at(group_index) {
        Some(FieldValue::Choice { member, .. }) if instance.is_set_at(group_index) => Some(*member),
        _ => None,
    }
}
