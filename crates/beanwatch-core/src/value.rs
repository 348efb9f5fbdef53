//! Type-erased property values carried by change events.
//!
//! Listeners registered for "any property" see values of every property
//! type on an observable, so events carry a [`PropertyValue`] rather than a
//! generic `T`. Equality on `PropertyValue` is the equality used to decide
//! whether a write is a real change.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

/// A value of an observable property.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// Absent value (`Option::None`).
    None,
    /// Boolean value.
    Bool(bool),
    /// Signed integer, widened to 64 bits.
    I64(i64),
    /// Unsigned integer, widened to 64 bits.
    U64(u64),
    /// Floating point value.
    F64(f64),
    /// String value.
    String(Arc<str>),
    /// List-like value, compared element by element.
    List(Vec<PropertyValue>),
    /// Map-like value with string keys, compared entry by entry.
    Map(BTreeMap<String, PropertyValue>),
    /// A value without a defined equality, compared by reference.
    Opaque(OpaqueRef),
    /// The previous value could not be read.
    ///
    /// `Unknown` is never equal to any value, itself included, so a write
    /// whose old value is unknown always counts as a change.
    Unknown,
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::None, PropertyValue::None) => true,
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
            (PropertyValue::I64(a), PropertyValue::I64(b)) => a == b,
            (PropertyValue::U64(a), PropertyValue::U64(b)) => a == b,
            (PropertyValue::F64(a), PropertyValue::F64(b)) => float_bits(*a) == float_bits(*b),
            (PropertyValue::String(a), PropertyValue::String(b)) => a == b,
            (PropertyValue::List(a), PropertyValue::List(b)) => a == b,
            (PropertyValue::Map(a), PropertyValue::Map(b)) => a == b,
            (PropertyValue::Opaque(a), PropertyValue::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// NaN equals NaN, 0.0 and -0.0 stay distinct.
fn float_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

impl PropertyValue {
    /// Returns true for the capture-failure sentinel.
    pub fn is_unknown(&self) -> bool {
        matches!(self, PropertyValue::Unknown)
    }

    /// Returns true if this value is None.
    pub fn is_none(&self) -> bool {
        matches!(self, PropertyValue::None)
    }

    /// Attempts to extract an i64 value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::I64(v) => Some(*v),
            PropertyValue::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Attempts to extract an f64 value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to extract a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to extract a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract list elements.
    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::None => "none",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::I64(_) => "i64",
            PropertyValue::U64(_) => "u64",
            PropertyValue::F64(_) => "f64",
            PropertyValue::String(_) => "string",
            PropertyValue::List(_) => "list",
            PropertyValue::Map(_) => "map",
            PropertyValue::Opaque(_) => "opaque",
            PropertyValue::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::None => f.write_str("none"),
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::I64(v) => write!(f, "{}", v),
            PropertyValue::U64(v) => write!(f, "{}", v),
            PropertyValue::F64(v) => write!(f, "{}", v),
            PropertyValue::String(v) => write!(f, "{:?}", v),
            PropertyValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            PropertyValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            PropertyValue::Opaque(r) => write!(f, "<{}>", r.type_name()),
            PropertyValue::Unknown => f.write_str("<unknown>"),
        }
    }
}

/// Shared handle to a value that has no meaningful equality.
///
/// Two `OpaqueRef`s are equal only when they point at the same allocation.
#[derive(Clone)]
pub struct OpaqueRef {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl OpaqueRef {
    /// Wraps a value in a fresh allocation.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Shares an existing allocation.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &OpaqueRef) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for OpaqueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueRef")
            .field("type_name", &self.type_name)
            .field("ptr", &Arc::as_ptr(&self.value).cast::<()>())
            .finish()
    }
}

/// Conversion of a field value into a [`PropertyValue`] snapshot.
///
/// Generated setters call this on the new value before the write and the
/// accessor contract calls it on the current value to capture the old one.
pub trait ToPropertyValue {
    fn to_property_value(&self) -> PropertyValue;
}

macro_rules! impl_signed {
    ($($t:ty),*) => {
        $(
            impl ToPropertyValue for $t {
                fn to_property_value(&self) -> PropertyValue {
                    PropertyValue::I64(i64::from(*self))
                }
            }
        )*
    };
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {
        $(
            impl ToPropertyValue for $t {
                fn to_property_value(&self) -> PropertyValue {
                    PropertyValue::U64(u64::from(*self))
                }
            }
        )*
    };
}

impl_signed!(i8, i16, i32, i64);
impl_unsigned!(u8, u16, u32, u64);

impl ToPropertyValue for isize {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::I64(*self as i64)
    }
}

impl ToPropertyValue for usize {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::U64(*self as u64)
    }
}

impl ToPropertyValue for f32 {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::F64(f64::from(*self))
    }
}

impl ToPropertyValue for f64 {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::F64(*self)
    }
}

impl ToPropertyValue for bool {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Bool(*self)
    }
}

impl ToPropertyValue for char {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::String(Arc::from(self.to_string()))
    }
}

impl ToPropertyValue for String {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::String(Arc::from(self.as_str()))
    }
}

impl ToPropertyValue for &str {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::String(Arc::from(*self))
    }
}

impl ToPropertyValue for Arc<str> {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::String(Arc::clone(self))
    }
}

impl ToPropertyValue for PropertyValue {
    fn to_property_value(&self) -> PropertyValue {
        self.clone()
    }
}

impl ToPropertyValue for OpaqueRef {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Opaque(self.clone())
    }
}

impl<T: ToPropertyValue> ToPropertyValue for Option<T> {
    fn to_property_value(&self) -> PropertyValue {
        match self {
            Some(v) => v.to_property_value(),
            None => PropertyValue::None,
        }
    }
}

impl<T: ToPropertyValue> ToPropertyValue for Vec<T> {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::List(self.iter().map(ToPropertyValue::to_property_value).collect())
    }
}

impl<T: ToPropertyValue> ToPropertyValue for VecDeque<T> {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::List(self.iter().map(ToPropertyValue::to_property_value).collect())
    }
}

impl<T: ToPropertyValue, S> ToPropertyValue for HashMap<String, T, S> {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_property_value()))
                .collect(),
        )
    }
}

impl<T: ToPropertyValue> ToPropertyValue for BTreeMap<String, T> {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_property_value()))
                .collect(),
        )
    }
}

impl<T: ToPropertyValue + ?Sized> ToPropertyValue for Box<T> {
    fn to_property_value(&self) -> PropertyValue {
        (**self).to_property_value()
    }
}

macro_rules! impl_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PropertyValue {
                fn from(value: $t) -> Self {
                    value.to_property_value()
                }
            }
        )*
    };
}

impl_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char, String, &str);

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
