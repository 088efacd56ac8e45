//! Core value types and operations.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use super::node::{Node, NodeId};
use super::number::Number;

/// TypeTag names the concrete type of a value.
///
/// Built-in scalars and containers use the constants below; callers
/// modelling their own container or record types supply their own tags.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(Cow<'static, str>);

impl TypeTag {
    pub const NULL: TypeTag = TypeTag(Cow::Borrowed("null"));
    pub const BOOL: TypeTag = TypeTag(Cow::Borrowed("bool"));
    pub const INT: TypeTag = TypeTag(Cow::Borrowed("int"));
    pub const UINT: TypeTag = TypeTag(Cow::Borrowed("uint"));
    pub const FLOAT: TypeTag = TypeTag(Cow::Borrowed("float"));
    pub const STR: TypeTag = TypeTag(Cow::Borrowed("str"));
    pub const BYTES: TypeTag = TypeTag(Cow::Borrowed("bytes"));
    pub const LIST: TypeTag = TypeTag(Cow::Borrowed("list"));
    pub const TUPLE: TypeTag = TypeTag(Cow::Borrowed("tuple"));
    pub const SET: TypeTag = TypeTag(Cow::Borrowed("set"));
    pub const FROZENSET: TypeTag = TypeTag(Cow::Borrowed("frozenset"));
    pub const DICT: TypeTag = TypeTag(Cow::Borrowed("dict"));

    /// Creates a tag for a caller-defined type.
    pub fn new(name: impl Into<String>) -> Self {
        TypeTag(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeTag {
    fn from(s: &str) -> Self {
        TypeTag::new(s)
    }
}

impl From<String> for TypeTag {
    fn from(s: String) -> Self {
        TypeTag::new(s)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequence is an ordered collection.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub tag: TypeTag,
    pub items: Vec<Value>,
    /// False for sequences that can be iterated but not indexed.
    pub subscriptable: bool,
}

/// SetValue is an unordered collection of distinct members.
#[derive(Debug, Clone)]
pub struct SetValue {
    pub tag: TypeTag,
    pub items: Vec<Value>,
}

impl SetValue {
    /// Adds a member unless an equal one is already present.
    pub fn insert(&mut self, item: Value) -> bool {
        if self.items.iter().any(|existing| *existing == item) {
            return false;
        }
        self.items.push(item);
        true
    }
}

/// Mapping is a collection of unique keys with associated values.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub tag: TypeTag,
    entries: Vec<(Value, Value)>,
}

impl Mapping {
    /// Creates an empty mapping with the given type tag.
    pub fn new(tag: TypeTag) -> Self {
        Mapping {
            tag,
            entries: Vec::new(),
        }
    }

    /// Inserts an entry, replacing the value of an equal existing key.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        for (k, v) in self.entries.iter_mut() {
            if *k == key {
                return Some(std::mem::replace(v, value));
            }
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

/// Record is a value with named fields, such as a struct or a named tuple.
#[derive(Debug, Clone)]
pub struct Record {
    pub tag: TypeTag,
    pub fields: Vec<(String, Value)>,
    pub named_tuple: bool,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Opaque is a value whose fields cannot be enumerated.
#[derive(Debug, Clone)]
pub struct Opaque {
    pub tag: TypeTag,
    pub repr: String,
}

/// Value is any value the hashing and diff engines can inspect.
///
/// Containers are shared handles: cloning a container value clones the
/// handle, and two handles to the same container have the same identity.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    Bytes(Vec<u8>),
    Sequence(Node<Sequence>),
    Set(Node<SetValue>),
    Mapping(Node<Mapping>),
    Record(Node<Record>),
    Opaque(Node<Opaque>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(b.into())
    }

    /// Creates a list.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::sequence(TypeTag::LIST, items)
    }

    /// Creates a tuple without named fields.
    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::sequence(TypeTag::TUPLE, items)
    }

    /// Creates an indexable sequence with a custom tag.
    pub fn sequence(tag: TypeTag, items: impl IntoIterator<Item = Value>) -> Self {
        Value::Sequence(Node::new(Sequence {
            tag,
            items: items.into_iter().collect(),
            subscriptable: true,
        }))
    }

    /// Creates a sequence that can be iterated but not indexed.
    pub fn iterable(tag: TypeTag, items: impl IntoIterator<Item = Value>) -> Self {
        Value::Sequence(Node::new(Sequence {
            tag,
            items: items.into_iter().collect(),
            subscriptable: false,
        }))
    }

    /// Creates a set, dropping duplicate members.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::set_of(TypeTag::SET, items)
    }

    pub fn frozenset(items: impl IntoIterator<Item = Value>) -> Self {
        Value::set_of(TypeTag::FROZENSET, items)
    }

    pub fn set_of(tag: TypeTag, items: impl IntoIterator<Item = Value>) -> Self {
        let mut set = SetValue {
            tag,
            items: Vec::new(),
        };
        for item in items {
            set.insert(item);
        }
        Value::Set(Node::new(set))
    }

    /// Creates a dict from key/value pairs; later duplicates win.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::mapping(TypeTag::DICT, entries)
    }

    pub fn mapping<K, V>(tag: TypeTag, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut mapping = Mapping::new(tag);
        for (k, v) in entries {
            mapping.insert(k.into(), v.into());
        }
        Value::Mapping(Node::new(mapping))
    }

    /// Creates a record with named fields in declaration order.
    pub fn record<N, V>(tag: impl Into<TypeTag>, fields: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
    {
        Value::Record(Node::new(Record {
            tag: tag.into(),
            fields: fields.into_iter().map(|(n, v)| (n.into(), v.into())).collect(),
            named_tuple: false,
        }))
    }

    /// Creates a tuple whose positions also have field names.
    pub fn named_tuple<N, V>(tag: impl Into<TypeTag>, fields: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
    {
        Value::Record(Node::new(Record {
            tag: tag.into(),
            fields: fields.into_iter().map(|(n, v)| (n.into(), v.into())).collect(),
            named_tuple: true,
        }))
    }

    /// Creates a value with no extractable fields.
    pub fn opaque(tag: impl Into<TypeTag>, repr: impl Into<String>) -> Self {
        Value::Opaque(Node::new(Opaque {
            tag: tag.into(),
            repr: repr.into(),
        }))
    }

    /// Returns the concrete type tag.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::NULL,
            Value::Bool(_) => TypeTag::BOOL,
            Value::Number(n) => n.type_tag(),
            Value::Text(_) => TypeTag::STR,
            Value::Bytes(_) => TypeTag::BYTES,
            Value::Sequence(n) => n.borrow().tag.clone(),
            Value::Set(n) => n.borrow().tag.clone(),
            Value::Mapping(n) => n.borrow().tag.clone(),
            Value::Record(n) => n.borrow().tag.clone(),
            Value::Opaque(n) => n.borrow().tag.clone(),
        }
    }

    /// Returns the identity of a container value; scalars have none.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Sequence(n) => Some(n.id()),
            Value::Set(n) => Some(n.id()),
            Value::Mapping(n) => Some(n.id()),
            Value::Record(n) => Some(n.id()),
            Value::Opaque(n) => Some(n.id()),
            _ => None,
        }
    }

    /// Returns true if both values are handles to the same container.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self.node_id(), other.node_id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_container(&self) -> bool {
        self.node_id().is_some()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if the value is a NaN float.
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }
}

// Equality is structural and cycle-safe: a pair of containers already being
// compared further up is assumed equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other, &mut Vec::new())
    }
}

fn structural_eq(a: &Value, b: &Value, seen: &mut Vec<(NodeId, NodeId)>) -> bool {
    if let (Some(ia), Some(ib)) = (a.node_id(), b.node_id()) {
        if ia == ib || seen.contains(&(ia, ib)) {
            return true;
        }
        seen.push((ia, ib));
        let result = container_eq(a, b, seen);
        seen.pop();
        return result;
    }

    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => {
            x.type_tag() == y.type_tag() && x.numeric_eq(y)
        }
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        _ => false,
    }
}

fn container_eq(a: &Value, b: &Value, seen: &mut Vec<(NodeId, NodeId)>) -> bool {
    match (a, b) {
        (Value::Sequence(x), Value::Sequence(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.tag == y.tag
                && x.items.len() == y.items.len()
                && x.items
                    .iter()
                    .zip(y.items.iter())
                    .all(|(l, r)| structural_eq(l, r, seen))
        }
        (Value::Set(x), Value::Set(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.tag == y.tag
                && x.items.len() == y.items.len()
                && x.items
                    .iter()
                    .all(|l| y.items.iter().any(|r| structural_eq(l, r, seen)))
        }
        (Value::Mapping(x), Value::Mapping(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.tag == y.tag
                && x.len() == y.len()
                && x.iter().all(|(k, v)| {
                    y.iter()
                        .find(|(rk, _)| structural_eq(k, rk, seen))
                        .map_or(false, |(_, rv)| structural_eq(v, rv, seen))
                })
        }
        (Value::Record(x), Value::Record(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.tag == y.tag
                && x.named_tuple == y.named_tuple
                && x.fields.len() == y.fields.len()
                && x.fields
                    .iter()
                    .zip(y.fields.iter())
                    .all(|((ln, lv), (rn, rv))| ln == rn && structural_eq(lv, rv, seen))
        }
        (Value::Opaque(x), Value::Opaque(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.tag == y.tag && x.repr == y.repr
        }
        _ => false,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_repr(self, f, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_repr(self, f, &mut Vec::new())
    }
}

/// Writes a text as a single-quoted literal.
pub(crate) fn write_quoted(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    f.write_char('\'')?;
    for c in s.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('\'')
}

fn write_items(
    f: &mut fmt::Formatter<'_>,
    items: &[Value],
    stack: &mut Vec<NodeId>,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_repr(item, f, stack)?;
    }
    Ok(())
}

fn write_repr(value: &Value, f: &mut fmt::Formatter<'_>, stack: &mut Vec<NodeId>) -> fmt::Result {
    if let Some(id) = value.node_id() {
        if stack.contains(&id) {
            return f.write_str("...");
        }
        stack.push(id);
        let result = write_container(value, f, stack);
        stack.pop();
        return result;
    }

    match value {
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Number(n) => write!(f, "{}", n),
        Value::Text(s) => write_quoted(f, s),
        Value::Bytes(b) => {
            f.write_str("b")?;
            write_quoted(f, &String::from_utf8_lossy(b))
        }
        _ => Ok(()),
    }
}

fn write_container(
    value: &Value,
    f: &mut fmt::Formatter<'_>,
    stack: &mut Vec<NodeId>,
) -> fmt::Result {
    match value {
        Value::Sequence(n) => {
            let seq = n.borrow();
            let (open, close) = if seq.tag == TypeTag::TUPLE { ("(", ")") } else { ("[", "]") };
            if seq.tag != TypeTag::LIST && seq.tag != TypeTag::TUPLE {
                write!(f, "{}", seq.tag)?;
            }
            f.write_str(open)?;
            write_items(f, &seq.items, stack)?;
            f.write_str(close)
        }
        Value::Set(n) => {
            let set = n.borrow();
            if set.tag != TypeTag::SET {
                write!(f, "{}", set.tag)?;
            }
            f.write_str("{")?;
            write_items(f, &set.items, stack)?;
            f.write_str("}")
        }
        Value::Mapping(n) => {
            let mapping = n.borrow();
            if mapping.tag != TypeTag::DICT {
                write!(f, "{}", mapping.tag)?;
            }
            f.write_str("{")?;
            for (i, (k, v)) in mapping.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_repr(k, f, stack)?;
                f.write_str(": ")?;
                write_repr(v, f, stack)?;
            }
            f.write_str("}")
        }
        Value::Record(n) => {
            let record = n.borrow();
            write!(f, "{}(", record.tag)?;
            for (i, (name, v)) in record.fields.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}=", name)?;
                write_repr(v, f, stack)?;
            }
            f.write_str(")")
        }
        Value::Opaque(n) => {
            let opaque = n.borrow();
            if opaque.repr.is_empty() {
                write!(f, "<{}>", opaque.tag)
            } else {
                write!(f, "<{} {}>", opaque.tag, opaque.repr)
            }
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags() {
        assert_eq!(Value::Null.type_tag(), TypeTag::NULL);
        assert_eq!(Value::from(1).type_tag(), TypeTag::INT);
        assert_eq!(Value::from(1.5).type_tag(), TypeTag::FLOAT);
        assert_eq!(Value::text("a").type_tag(), TypeTag::STR);
        assert_eq!(Value::list(vec![]).type_tag(), TypeTag::LIST);
        assert_eq!(Value::tuple(vec![]).type_tag(), TypeTag::TUPLE);
        assert_eq!(Value::record("Point", vec![("x", 1)]).type_tag(), TypeTag::new("Point"));
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::from(42), Value::from(42));
        assert_ne!(Value::from(1), Value::from(1.0));
        assert_ne!(Value::from(true), Value::from(1));
        assert_eq!(
            Value::map(vec![("a", 1), ("b", 2)]),
            Value::map(vec![("b", 2), ("a", 1)])
        );
        assert_ne!(Value::list(vec![1.into(), 2.into()]), Value::tuple(vec![1.into(), 2.into()]));
        assert_eq!(Value::set(vec![1.into(), 2.into()]), Value::set(vec![2.into(), 1.into()]));
    }

    #[test]
    fn test_mapping_keys_unique() {
        let value = Value::map(vec![("a", 1), ("a", 2)]);
        let Value::Mapping(node) = &value else { panic!("expected mapping") };
        assert_eq!(node.borrow().len(), 1);
        assert_eq!(node.borrow().get(&Value::text("a")), Some(&Value::from(2)));
    }

    #[test]
    fn test_set_dedupes() {
        let value = Value::set(vec![1.into(), 1.into(), 2.into()]);
        let Value::Set(node) = &value else { panic!("expected set") };
        assert_eq!(node.borrow().items.len(), 2);
    }

    #[test]
    fn test_identity() {
        let a = Value::list(vec![1.into()]);
        let b = a.clone();
        let c = Value::list(vec![1.into()]);
        assert!(a.same_instance(&b));
        assert!(!a.same_instance(&c));
        assert_eq!(a, c);
        assert!(!Value::from(1).same_instance(&Value::from(1)));
    }

    #[test]
    fn test_display() {
        let value = Value::map(vec![
            (Value::text("name"), Value::text("it's")),
            (Value::text("items"), Value::list(vec![1.into(), Value::Null, true.into()])),
        ]);
        assert_eq!(value.to_string(), r"{'name': 'it\'s', 'items': [1, null, true]}");
        assert_eq!(Value::tuple(vec![1.into(), 2.into()]).to_string(), "(1, 2)");
        assert_eq!(
            Value::record("Point", vec![("x", 1), ("y", 2)]).to_string(),
            "Point(x=1, y=2)"
        );
    }

    #[test]
    fn test_cyclic_display_and_eq_terminate() {
        let a = Value::map(Vec::<(Value, Value)>::new());
        if let Value::Mapping(node) = &a {
            node.borrow_mut().insert(Value::text("self"), a.clone());
        }
        assert_eq!(a.to_string(), "{'self': ...}");

        let b = Value::map(Vec::<(Value, Value)>::new());
        if let Value::Mapping(node) = &b {
            node.borrow_mut().insert(Value::text("self"), b.clone());
        }
        assert_eq!(a, b);
    }
}
