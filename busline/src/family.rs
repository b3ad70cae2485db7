//! Family type descriptors.
//!
//! A bus is bound to two *families*: the trait every fired event implements and
//! the trait every registered listener implements. Both must be trait objects.

use std::any::{Any, TypeId};
use std::fmt;

/// Which of the two families a descriptor is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FamilyRole {
    /// The family bounding what may be fired.
    Event,
    /// The family bounding what may be registered.
    Listener,
}

impl fmt::Display for FamilyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilyRole::Event => f.write_str("event"),
            FamilyRole::Listener => f.write_str("listener"),
        }
    }
}

/// Runtime description of a family type.
///
/// # Examples
///
/// ```rust
/// use busline::FamilyType;
///
/// trait Listener: Send + Sync {}
/// struct Concrete;
///
/// assert!(FamilyType::of::<dyn Listener>().is_interface());
/// assert!(!FamilyType::of::<Concrete>().is_interface());
/// assert!(!FamilyType::of::<[u8]>().is_interface());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FamilyType {
    id: TypeId,
    name: &'static str,
    interface: bool,
}

impl FamilyType {
    /// Describes `T`.
    ///
    /// `T` counts as interface-like when it is a trait object: references to it
    /// are fat pointers and its name is a `dyn` type. Slices and `str` are fat
    /// too, but they carry state and are rejected.
    pub fn of<T: ?Sized + Any>() -> Self {
        let name = std::any::type_name::<T>();
        let fat = std::mem::size_of::<&T>() > std::mem::size_of::<usize>();
        Self {
            id: TypeId::of::<T>(),
            name,
            interface: fat && name.starts_with("dyn "),
        }
    }

    /// Returns the type id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns whether the type is a trait object.
    pub fn is_interface(&self) -> bool {
        self.interface
    }
}

impl fmt::Display for FamilyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
