// tinymop object system
//
// The class registry: a TinyCLOS-style arena of immutable classes keyed by
// strictly increasing ids. Class creation flattens mixins into the property
// bag, runs the C3 linearizer, composes the member table root to leaf, and
// records the ancestor-id set for O(1) subtype tests. Everything after
// creation is read-only, so dispatch only ever needs `&self`.

use std::backtrace::Backtrace;
use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use smallvec::{smallvec, SmallVec};

use crate::class::{Class, ClassDef, ClassId, Instance, Member, MemberTable, INIT_MEMBER};
use crate::dispatch::Super;
use crate::errors::{ObjectError, RaisedError};
use crate::mixin::MixinId;
use crate::mro;
use crate::types::{PrimitiveTag, TypeTag, Value};

/// The composition engine and class registry.
pub struct ObjectSystem {
    classes: Vec<Class>,
    mixin_counter: u32,
    /// Root of every hierarchy. Classes created with no parents derive from
    /// it; its no-op initializer terminates cooperative constructor chains.
    pub object_class: ClassId,
    /// Base class for custom error hierarchies.
    pub error_class: ClassId,
}

impl ObjectSystem {
    pub fn new() -> Self {
        let mut sys = Self {
            classes: Vec::new(),
            mixin_counter: 0,
            object_class: ClassId(0),
            error_class: ClassId(0),
        };
        sys.bootstrap();
        sys
    }

    fn bootstrap(&mut self) {
        // The root class is built by hand: there are no parents to merge
        // and the arena is still empty.
        let id = ClassId(0);
        let mut own_members: IndexMap<String, Member> = IndexMap::new();
        own_members.insert(
            INIT_MEMBER.to_string(),
            Member::Method(Arc::new(|_, _, _, _| Ok(Value::Nil))),
        );
        let mut table = MemberTable::default();
        table.insert(INIT_MEMBER.to_string(), 0);
        self.classes.push(Class {
            id,
            name: Some("Object".to_string()),
            parents: SmallVec::new(),
            mro: vec![id],
            ancestor_ids: HashSet::from([id]),
            own_members,
            mixin_ids: HashSet::new(),
            table,
        });
        self.object_class = id;

        // The error base goes through the ordinary pipeline. Its
        // initializer takes an optional message and falls back to the
        // class's `default_message` data member.
        let def = ClassDef::named("Error")
            .data("name", Value::Str("Error".to_string()))
            .data("default_message", Value::Str(String::new()))
            .init(|sys, this, _sup, args| {
                let message = match args.first() {
                    Some(Value::Str(s)) => s.clone(),
                    _ => sys
                        .class_data(this.class(), "default_message")
                        .and_then(|v| v.as_str().map(str::to_string))
                        .unwrap_or_default(),
                };
                this.set_field("message", Value::Str(message));
                Ok(Value::Nil)
            });
        self.error_class = self
            .create_class(&[], def)
            .expect("bootstrap error class is consistent");
    }

    pub(crate) fn next_mixin_id(&mut self) -> MixinId {
        let id = MixinId(self.mixin_counter);
        self.mixin_counter += 1;
        id
    }

    pub fn get_class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id.0 as usize)
    }

    /// Internal accessor for ids already validated at creation time.
    pub(crate) fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0 as usize]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Create a new class from an ordered parent list and a property bag.
    ///
    /// An empty parent list means deriving from the root class. Fails with
    /// `InconsistentMro` when no C3 linearization exists, and with
    /// `InvalidArgument` for malformed input (unknown or duplicated
    /// parents, empty member names).
    pub fn create_class(
        &mut self,
        parents: &[ClassId],
        def: ClassDef,
    ) -> Result<ClassId, ObjectError> {
        for (i, &p) in parents.iter().enumerate() {
            if self.get_class(p).is_none() {
                return Err(ObjectError::InvalidArgument(format!(
                    "unknown parent class {:?}",
                    p
                )));
            }
            if parents[..i].contains(&p) {
                return Err(ObjectError::InvalidArgument(format!(
                    "duplicate direct parent `{}`",
                    self.class(p).display_name()
                )));
            }
        }
        let parents: SmallVec<[ClassId; 4]> = if parents.is_empty() {
            smallvec![self.object_class]
        } else {
            parents.iter().copied().collect()
        };

        // Flatten mixins first: include order, own members override.
        let mut own_members: IndexMap<String, Member> = IndexMap::new();
        let mut mixin_ids: HashSet<MixinId> = HashSet::new();
        for mixin in &def.includes {
            own_members.extend(mixin.members.clone());
            mixin_ids.extend(mixin.provenance.iter().copied());
        }
        own_members.extend(def.members);
        if own_members.keys().any(|name| name.is_empty()) {
            return Err(ObjectError::InvalidArgument(
                "empty member name".to_string(),
            ));
        }

        let id = ClassId(self.classes.len() as u32);
        let parent_mros: Vec<Vec<ClassId>> = parents
            .iter()
            .map(|&p| self.class(p).mro.clone())
            .collect();
        let merged = mro::linearize(&parent_mros, &parents).ok_or_else(|| {
            ObjectError::InconsistentMro {
                class: def.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
            }
        })?;
        let mut mro = Vec::with_capacity(merged.len() + 1);
        mro.push(id);
        mro.extend(merged);
        let ancestor_ids: HashSet<ClassId> = mro.iter().copied().collect();

        // Compose the member table most-ancestral layer first, so leafward
        // declarations shadow ancestral ones. Interface stubs are the one
        // exception: a stub never shadows a real implementation already in
        // the table.
        let mut table = MemberTable::default();
        {
            let member_of = |cid: ClassId, name: &str| {
                if cid == id {
                    own_members.get(name)
                } else {
                    self.class(cid).own_member(name)
                }
            };
            for (idx, &cid) in mro.iter().enumerate().rev() {
                let names: Vec<String> = if cid == id {
                    own_members.keys().cloned().collect()
                } else {
                    self.class(cid).own_members.keys().cloned().collect()
                };
                for name in names {
                    let incoming_stub =
                        member_of(cid, &name).is_some_and(Member::is_stub);
                    if incoming_stub {
                        if let Some(prev) = table.defining_layer(&name) {
                            let prev_real = !member_of(mro[prev], &name)
                                .is_some_and(Member::is_stub);
                            if prev_real {
                                continue;
                            }
                        }
                    }
                    table.insert(name, idx);
                }
            }
        }

        debug!(
            "class {:?} ({}) created, mro {:?}",
            id,
            def.name.as_deref().unwrap_or("<anonymous>"),
            mro
        );
        self.classes.push(Class {
            id,
            name: def.name,
            parents,
            mro,
            ancestor_ids,
            own_members,
            mixin_ids,
            table,
        });
        Ok(id)
    }

    /// Subtype test. O(1) for composed classes via the ancestor-id set;
    /// primitive tags test the native value shape.
    pub fn is_instance(&self, value: &Value, target: impl Into<TypeTag>) -> bool {
        match target.into() {
            TypeTag::Class(cid) => match value {
                Value::Instance(handle) => {
                    let class = handle.borrow().class();
                    self.get_class(class).is_some_and(|c| c.has_ancestor(cid))
                }
                _ => false,
            },
            TypeTag::Primitive(tag) => matches!(
                (value, tag),
                (Value::Nil, PrimitiveTag::Nil)
                    | (Value::Bool(_), PrimitiveTag::Bool)
                    | (Value::Int(_), PrimitiveTag::Int)
                    | (Value::Float(_), PrimitiveTag::Float)
                    | (Value::Str(_), PrimitiveTag::Str)
                    | (Value::List(_), PrimitiveTag::List)
            ),
        }
    }

    /// O(1): is the instance's class `target` or a descendant of it?
    pub fn instance_is_a(&self, this: &Instance, target: ClassId) -> bool {
        self.get_class(this.class())
            .is_some_and(|c| c.has_ancestor(target))
    }

    /// Construct an instance: runs the most-derived initializer only.
    /// Ancestor initializers run solely through the super capability; the
    /// root class's no-op `init` terminates every chain.
    pub fn construct(&self, class: ClassId, args: &[Value]) -> Result<Instance, ObjectError> {
        if self.get_class(class).is_none() {
            return Err(ObjectError::InvalidArgument(format!(
                "unknown class {:?}",
                class
            )));
        }
        let mut this = Instance::new(class);
        self.call_method(&mut this, INIT_MEMBER, args)?;
        Ok(this)
    }

    /// Invoke a member method on an instance, resolving through the
    /// composed table of its most-derived class.
    pub fn call_method(
        &self,
        this: &mut Instance,
        member: &str,
        args: &[Value],
    ) -> Result<Value, ObjectError> {
        let class = self.class(this.class());
        let Some(layer) = class.table.defining_layer(member) else {
            return Err(ObjectError::MemberNotFound {
                member: member.to_string(),
                class: class.display_name().to_string(),
            });
        };
        let defined_in = class.mro[layer];
        match self.class(defined_in).own_member(member) {
            Some(Member::Method(f)) => {
                let f = f.clone();
                f(self, this, Super::new(defined_in, member), args)
            }
            Some(Member::Stub(name)) => Err(ObjectError::NotImplemented {
                member: name.clone(),
            }),
            _ => Err(ObjectError::InvalidArgument(format!(
                "member `{}` of `{}` is not a method",
                member,
                class.display_name()
            ))),
        }
    }

    /// Read an attribute: the instance's own field if set, otherwise the
    /// class's composed data member.
    pub fn get_attr(&self, this: &Instance, name: &str) -> Result<Value, ObjectError> {
        if let Some(v) = this.field(name) {
            return Ok(v.clone());
        }
        let class = self.class(this.class());
        match self.resolve_member(class, name) {
            Some(Member::Data(v)) => Ok(v.clone()),
            Some(Member::Method(_)) | Some(Member::Stub(_)) => {
                Err(ObjectError::InvalidArgument(format!(
                    "member `{}` of `{}` is a method",
                    name,
                    class.display_name()
                )))
            }
            None => Err(ObjectError::MemberNotFound {
                member: name.to_string(),
                class: class.display_name().to_string(),
            }),
        }
    }

    /// A class's composed data member, resolved through its MRO.
    pub fn class_data(&self, class: ClassId, name: &str) -> Option<Value> {
        let class = self.get_class(class)?;
        match self.resolve_member(class, name) {
            Some(Member::Data(v)) => Some(v.clone()),
            _ => None,
        }
    }

    fn resolve_member<'a>(&'a self, class: &'a Class, name: &str) -> Option<&'a Member> {
        let layer = class.table.defining_layer(name)?;
        self.class(class.mro[layer]).own_member(name)
    }

    /// Raise an instance of a custom error class: constructs it through the
    /// ordinary pipeline (so cooperative initializers run), then packages
    /// the result as a catchable Rust error carrying its ancestor chain.
    pub fn raise(&self, class: ClassId, message: Option<&str>) -> ObjectError {
        let Some(cls) = self.get_class(class) else {
            return ObjectError::InvalidArgument(format!("unknown class {:?}", class));
        };
        if !cls.has_ancestor(self.error_class) {
            return ObjectError::InvalidArgument(format!(
                "`{}` is not an error class",
                cls.display_name()
            ));
        }
        let args: Vec<Value> = message
            .map(|m| vec![Value::Str(m.to_string())])
            .unwrap_or_default();
        let this = match self.construct(class, &args) {
            Ok(inst) => inst,
            Err(e) => return e,
        };
        let class_name = self
            .class_data(class, "name")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| cls.display_name().to_string());
        let message = this
            .field("message")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        ObjectError::Raised(RaisedError {
            class,
            class_name,
            message,
            ancestors: cls.ancestor_ids.clone(),
            // Raising is already the slow path; always capture the stack so
            // the error is debuggable without RUST_BACKTRACE set.
            trace: Backtrace::force_capture(),
        })
    }
}

impl Default for ObjectSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_classes() {
        let sys = ObjectSystem::new();
        assert_eq!(sys.object_class, ClassId(0));
        assert_eq!(sys.error_class, ClassId(1));

        let err = sys.class(sys.error_class);
        assert_eq!(err.mro, vec![sys.error_class, sys.object_class]);
        assert!(err.has_ancestor(sys.object_class));
    }

    #[test]
    fn test_class_ids_strictly_increase() {
        let mut sys = ObjectSystem::new();
        let a = sys.create_class(&[], ClassDef::named("A")).unwrap();
        let b = sys.create_class(&[], ClassDef::named("B")).unwrap();
        assert!(b.0 > a.0);
    }

    #[test]
    fn test_mro_reflexivity() {
        let mut sys = ObjectSystem::new();
        let a = sys.create_class(&[], ClassDef::named("A")).unwrap();
        assert_eq!(sys.class(a).mro[0], a);
    }

    #[test]
    fn test_duplicate_parent_rejected() {
        let mut sys = ObjectSystem::new();
        let a = sys.create_class(&[], ClassDef::named("A")).unwrap();
        let err = sys.create_class(&[a, a], ClassDef::named("B")).unwrap_err();
        assert!(matches!(err, ObjectError::InvalidArgument(_)));
    }
}
