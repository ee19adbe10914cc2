// tinymop value model
//
// The dynamic values that flow through composed classes: member data,
// method arguments and returns, and instance fields. Instances are shared
// handles so values can hold other instances and subtype tests can take
// any value.

use std::cell::RefCell;
use std::rc::Rc;

use crate::class::{ClassId, Instance};

/// Shared handle to an instance. Methods always receive `&mut Instance`
/// directly; the handle exists so instances can live inside [`Value`]s.
pub type InstanceRef = Rc<RefCell<Instance>>;

/// A dynamic value.
#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Instance(InstanceRef),
}

impl Value {
    /// Wrap an owned instance into a shareable value.
    pub fn instance(inst: Instance) -> Self {
        Value::Instance(Rc::new(RefCell::new(inst)))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Instance(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Instances compare by identity, not structure.
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Tag naming a native (non-composed) value type, for subtype tests against
/// primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTag {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    List,
}

/// Target of a subtype test: either a composed class or a primitive tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Class(ClassId),
    Primitive(PrimitiveTag),
}

impl From<ClassId> for TypeTag {
    fn from(id: ClassId) -> Self {
        TypeTag::Class(id)
    }
}

impl From<PrimitiveTag> for TypeTag {
    fn from(tag: PrimitiveTag) -> Self {
        TypeTag::Primitive(tag)
    }
}
