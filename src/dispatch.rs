// tinymop super dispatch
//
// Cooperative dispatch resolves through the *instance's runtime MRO*, not
// the declaring class's static one. That is the contract: in a diamond,
// every ancestor implementation of a member runs exactly once, in MRO
// order, no matter which class's method started the chain.
//
// There is no shared "current super" slot to save and restore. Every method
// receives a `Super` capability naming the layer it was installed in; each
// super call re-derives the next layer from the receiver's MRO, so nested
// and re-entrant calls are safe by construction.

use std::fmt;

use log::trace;

use crate::class::{ClassId, Instance, Member, MethodFn};
use crate::errors::ObjectError;
use crate::system::ObjectSystem;
use crate::types::Value;

/// The super capability handed to every method body: the class layer the
/// running method was declared in, and the member name it was installed
/// under.
#[derive(Clone, Copy)]
pub struct Super<'a> {
    defined_in: ClassId,
    member: &'a str,
}

impl<'a> Super<'a> {
    pub(crate) fn new(defined_in: ClassId, member: &'a str) -> Self {
        Self { defined_in, member }
    }

    /// The class layer the running method was declared in.
    pub fn defined_in(&self) -> ClassId {
        self.defined_in
    }

    /// Invoke the same-named member of the next more-ancestral class in the
    /// receiver's runtime MRO.
    pub fn call(
        &self,
        sys: &ObjectSystem,
        this: &mut Instance,
        args: &[Value],
    ) -> Result<Value, ObjectError> {
        sys.call_next(self.defined_in, this, self.member, args)
    }
}

/// Result of an explicit super lookup: a callable bound to its defining
/// layer, or a plain data value.
pub enum SuperMember {
    Method(BoundSuper),
    Data(Value),
}

impl fmt::Debug for SuperMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuperMember::Method(m) => f.debug_tuple("Method").field(m).finish(),
            SuperMember::Data(v) => f.debug_tuple("Data").field(v).finish(),
        }
    }
}

/// A method found by [`ObjectSystem::get_super`], bound to the layer that
/// defines it so further super calls continue from the right place.
pub struct BoundSuper {
    pub(crate) func: MethodFn,
    pub(crate) defined_in: ClassId,
    pub(crate) member: String,
}

impl fmt::Debug for BoundSuper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSuper")
            .field("defined_in", &self.defined_in)
            .field("member", &self.member)
            .finish_non_exhaustive()
    }
}

impl BoundSuper {
    pub fn defined_in(&self) -> ClassId {
        self.defined_in
    }

    pub fn call(
        &self,
        sys: &ObjectSystem,
        this: &mut Instance,
        args: &[Value],
    ) -> Result<Value, ObjectError> {
        (self.func)(sys, this, Super::new(self.defined_in, &self.member), args)
    }
}

impl ObjectSystem {
    /// Chain-relative super: find and invoke `member` in the first class
    /// after `defined_in` in the receiver's runtime MRO that declares it.
    pub(crate) fn call_next(
        &self,
        defined_in: ClassId,
        this: &mut Instance,
        member: &str,
        args: &[Value],
    ) -> Result<Value, ObjectError> {
        let class = self.class(this.class());
        let pos = self.mro_position(class, defined_in)?;
        trace!(
            "super call `{}` from {:?} on {:?}",
            member,
            defined_in,
            this.class()
        );
        for &cid in &class.mro[pos + 1..] {
            match self.class(cid).own_member(member) {
                Some(Member::Method(f)) => {
                    let f = f.clone();
                    return f(self, this, Super::new(cid, member), args);
                }
                Some(Member::Data(_)) => {
                    return Err(ObjectError::InvalidArgument(format!(
                        "super member `{}` of `{}` is not a method",
                        member,
                        self.class(cid).display_name()
                    )));
                }
                // Stubs carry no implementation to chain to.
                Some(Member::Stub(_)) | None => continue,
            }
        }
        Err(ObjectError::MemberNotFound {
            member: member.to_string(),
            class: class.display_name().to_string(),
        })
    }

    /// Explicit lookup-by-defining-class: the member belonging to the class
    /// immediately after `defining_class` in the *instance's* runtime MRO.
    ///
    /// Fails with `ClassNotInMro` when `defining_class` is not an ancestor
    /// of the instance's actual class, and `MemberNotFound` when no more
    /// ancestral layer declares the member.
    pub fn get_super(
        &self,
        defining_class: ClassId,
        this: &Instance,
        member: &str,
    ) -> Result<SuperMember, ObjectError> {
        let class = self.class(this.class());
        let pos = self.mro_position(class, defining_class)?;
        for &cid in &class.mro[pos + 1..] {
            match self.class(cid).own_member(member) {
                Some(Member::Method(f)) => {
                    return Ok(SuperMember::Method(BoundSuper {
                        func: f.clone(),
                        defined_in: cid,
                        member: member.to_string(),
                    }));
                }
                Some(Member::Data(v)) => return Ok(SuperMember::Data(v.clone())),
                Some(Member::Stub(_)) | None => continue,
            }
        }
        Err(ObjectError::MemberNotFound {
            member: member.to_string(),
            class: class.display_name().to_string(),
        })
    }

    fn mro_position(
        &self,
        class: &crate::class::Class,
        defining: ClassId,
    ) -> Result<usize, ObjectError> {
        class
            .mro
            .iter()
            .position(|&c| c == defining)
            .ok_or_else(|| ObjectError::ClassNotInMro {
                class: self
                    .get_class(defining)
                    .map(|c| c.display_name().to_string())
                    .unwrap_or_else(|| format!("{:?}", defining)),
                instance_class: class.display_name().to_string(),
            })
    }
}
