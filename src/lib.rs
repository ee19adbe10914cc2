// tinymop: structured multiple inheritance as a library primitive.
//
// A TinyCLOS-style object system for code that wants Python-like multiple
// inheritance on top of a single-inheritance host: C3 method resolution
// orders, composed member tables, cooperative super dispatch, O(1) subtype
// tests, mixins/interfaces, and custom error classes that behave like
// ordinary Rust errors.

pub mod class;
pub mod dispatch;
pub mod errors;
pub mod mixin;
pub mod mro;
pub mod system;
pub mod types;

pub use class::{Class, ClassDef, ClassId, Instance, Member, INIT_MEMBER};
pub use dispatch::{BoundSuper, Super, SuperMember};
pub use errors::{ObjectError, RaisedError};
pub use mixin::{Mixin, MixinId};
pub use system::ObjectSystem;
pub use types::{PrimitiveTag, TypeTag, Value};
