// tinymop classes
//
// A class is created once, from an ordered parent list and a property bag,
// and is immutable afterward. Its member table is composed over the MRO at
// creation time; there is no "reopen and add a method" operation.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::dispatch::Super;
use crate::errors::ObjectError;
use crate::mixin::{Mixin, MixinId};
use crate::system::ObjectSystem;
use crate::types::Value;

/// Unique identifier for a class; strictly increasing for the lifetime of
/// an [`ObjectSystem`], and an index into its class arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

/// Member name under which initializers are declared and dispatched.
/// The initializer is an ordinary member: it is composed, overridden, and
/// super-chained like any other method.
pub const INIT_MEMBER: &str = "init";

/// A method body. Receives the owning system (read-only: classes are
/// immutable once created), the receiver, the super capability for the
/// layer the method was installed in, and the call arguments.
pub type MethodFn =
    Arc<dyn Fn(&ObjectSystem, &mut Instance, Super<'_>, &[Value]) -> Result<Value, ObjectError>>;

/// A declared class member: plain data, a method, or an interface stub.
#[derive(Clone)]
pub enum Member {
    Data(Value),
    Method(MethodFn),
    /// Interface stub for the named member: fails with `NotImplemented`
    /// when invoked. A stub is a contract, not an implementation; it
    /// never shadows a real method during composition or super scans.
    Stub(String),
}

impl Member {
    /// Function-valued members: real methods and interface stubs.
    pub fn is_function(&self) -> bool {
        matches!(self, Member::Method(_) | Member::Stub(_))
    }

    pub fn is_stub(&self) -> bool {
        matches!(self, Member::Stub(_))
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Data(v) => f.debug_tuple("Data").field(v).finish(),
            Member::Method(_) => f.write_str("Method(..)"),
            Member::Stub(name) => f.debug_tuple("Stub").field(name).finish(),
        }
    }
}

/// The composed lookup table of a class: member name to the position (in the
/// class's MRO) of the most-derived layer declaring it. Built once at class
/// creation, root to leaf, so leafward declarations shadow ancestral ones.
#[derive(Debug, Default)]
pub(crate) struct MemberTable {
    resolved: IndexMap<String, usize>,
}

impl MemberTable {
    pub(crate) fn insert(&mut self, name: String, mro_index: usize) {
        self.resolved.insert(name, mro_index);
    }

    /// MRO position of the layer defining `name`, if any.
    pub(crate) fn defining_layer(&self, name: &str) -> Option<usize> {
        self.resolved.get(name).copied()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.resolved.keys().map(String::as_str)
    }
}

/// A composed class.
#[derive(Debug)]
pub struct Class {
    pub id: ClassId,
    pub name: Option<String>,
    /// Direct parents, in declaration order. Empty only for the root class.
    pub parents: SmallVec<[ClassId; 4]>,
    /// Linearized ancestry: `mro[0]` is the class itself, the root is last.
    pub mro: Vec<ClassId>,
    /// Ids of every class in `mro`, for O(1) subtype tests.
    pub(crate) ancestor_ids: HashSet<ClassId>,
    /// This class's own declared members (mixin members already flattened
    /// in). One layer of the composed table.
    pub(crate) own_members: IndexMap<String, Member>,
    /// Provenance: ids of every mixin (transitively) merged into this class.
    pub(crate) mixin_ids: HashSet<MixinId>,
    pub(crate) table: MemberTable,
}

impl Class {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    /// O(1): is `id` this class or one of its ancestors?
    pub fn has_ancestor(&self, id: ClassId) -> bool {
        self.ancestor_ids.contains(&id)
    }

    pub fn own_member(&self, name: &str) -> Option<&Member> {
        self.own_members.get(name)
    }

    /// Names visible on instances of this class, in composition order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.table.names()
    }
}

/// An instance of a composed class. The most-derived class is fixed at
/// construction; the field set is the instance's own mutable state,
/// populated by the cooperative initializer chain.
#[derive(Debug, Clone)]
pub struct Instance {
    class: ClassId,
    fields: IndexMap<String, Value>,
}

impl Instance {
    pub(crate) fn new(class: ClassId) -> Self {
        Self {
            class,
            fields: IndexMap::new(),
        }
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Property bag for [`ObjectSystem::create_class`]: an optional name, mixins
/// to flatten in, and the class's own members.
///
/// Mixin members are copied in first, in include order, before the bag's own
/// members; own members therefore override same-named mixin members, and
/// both override ancestors.
#[derive(Default)]
pub struct ClassDef {
    pub(crate) name: Option<String>,
    pub(crate) includes: Vec<Mixin>,
    pub(crate) members: IndexMap<String, Member>,
}

impl ClassDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Flatten a mixin's members into this class and record its provenance.
    pub fn include(mut self, mixin: &Mixin) -> Self {
        self.includes.push(mixin.clone());
        self
    }

    pub fn data(mut self, name: impl Into<String>, value: Value) -> Self {
        self.members.insert(name.into(), Member::Data(value));
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ObjectSystem, &mut Instance, Super<'_>, &[Value]) -> Result<Value, ObjectError>
            + 'static,
    {
        self.members.insert(name.into(), Member::Method(Arc::new(f)));
        self
    }

    /// Declare the initializer. Sugar for `method(INIT_MEMBER, ..)`.
    pub fn init<F>(self, f: F) -> Self
    where
        F: Fn(&ObjectSystem, &mut Instance, Super<'_>, &[Value]) -> Result<Value, ObjectError>
            + 'static,
    {
        self.method(INIT_MEMBER, f)
    }
}
