// tinymop mixins and interfaces
//
// A mixin is an unbound bag of members with a provenance set: its own id
// plus the ids of every mixin merged into it, transitively. Mixins have no
// identity in any MRO; their members are copied flatly into whichever class
// includes them, before linearization considers normal parents.
//
// An interface is a mixin whose methods are replaced with stubs that fail
// with `NotImplemented` until the consuming class (or an ancestor)
// overrides them.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use crate::class::{ClassDef, Member};
use crate::errors::ObjectError;
use crate::system::ObjectSystem;

/// Unique identifier for a mixin; strictly increasing per [`ObjectSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MixinId(pub u32);

/// A reusable, unbound bag of members.
#[derive(Debug, Clone)]
pub struct Mixin {
    pub id: MixinId,
    pub name: Option<String>,
    pub(crate) members: IndexMap<String, Member>,
    pub(crate) provenance: HashSet<MixinId>,
}

impl Mixin {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    /// Inspect a member before the mixin is included anywhere.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// True iff `other`'s id is this mixin's own or was merged into it.
    pub fn subsumes(&self, other: &Mixin) -> bool {
        self.provenance.contains(&other.id)
    }
}

impl ObjectSystem {
    /// Compose a mixin from the definition's includes and members. Later
    /// sources override earlier ones, own members override includes.
    pub fn create_mixin(&mut self, def: ClassDef) -> Mixin {
        let id = self.next_mixin_id();
        let mut members = IndexMap::new();
        let mut provenance = HashSet::from([id]);
        for source in &def.includes {
            members.extend(source.members.clone());
            provenance.extend(source.provenance.iter().copied());
        }
        members.extend(def.members);
        debug!(
            "mixin {:?} ({}) composed with {} members",
            id,
            def.name.as_deref().unwrap_or("<anonymous>"),
            members.len()
        );
        Mixin {
            id,
            name: def.name,
            members,
            provenance,
        }
    }

    /// Compose an interface: every method becomes a failing stub. Data
    /// members declared directly in the definition are rejected; data
    /// members of included mixins are dropped (only their contract is
    /// inherited, not their state).
    pub fn create_interface(&mut self, def: ClassDef) -> Result<Mixin, ObjectError> {
        let id = self.next_mixin_id();
        let mut members = IndexMap::new();
        let mut provenance = HashSet::from([id]);
        for source in &def.includes {
            for (name, member) in &source.members {
                if member.is_function() {
                    members.insert(name.clone(), Member::Stub(name.clone()));
                }
            }
            provenance.extend(source.provenance.iter().copied());
        }
        for (name, member) in &def.members {
            if !member.is_function() {
                return Err(ObjectError::InvalidArgument(format!(
                    "interface member `{}` is not a function",
                    name
                )));
            }
            members.insert(name.clone(), Member::Stub(name.clone()));
        }
        Ok(Mixin {
            id,
            name: def.name,
            members,
            provenance,
        })
    }

    /// True iff `mixin` (or any mixin merged into the one actually
    /// included) is recorded on the instance's class or any ancestor.
    pub fn has_mixin(&self, this: &crate::class::Instance, mixin: &Mixin) -> bool {
        let class = self.class(this.class());
        class
            .mro
            .iter()
            .any(|&cid| self.class(cid).mixin_ids.contains(&mixin.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_mixin_provenance_is_transitive() {
        let mut sys = ObjectSystem::new();
        let a = sys.create_mixin(ClassDef::named("A").data("x", Value::Int(1)));
        let b = sys.create_mixin(ClassDef::named("B").include(&a).data("y", Value::Int(2)));
        assert!(b.subsumes(&a));
        assert!(!a.subsumes(&b));
        assert!(b.member("x").is_some());
        assert!(b.member("y").is_some());
    }

    #[test]
    fn test_interface_rejects_data_members() {
        let mut sys = ObjectSystem::new();
        let err = sys
            .create_interface(ClassDef::named("I").data("x", Value::Int(1)))
            .unwrap_err();
        assert!(matches!(err, ObjectError::InvalidArgument(_)));
    }
}
