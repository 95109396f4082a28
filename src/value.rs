//! Converted argument values.

use crate::model::{Category, Channel, Member, Role, User};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A bound argument, produced by a converter or a default.
#[derive(Clone)]
pub enum Value {
    /// An optional parameter that did not match, or an explicit `None` default.
    None,
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    User(User),
    Member(Member),
    Channel(Channel),
    Role(Role),
    Category(Category),
    /// Collected values of a variadic parameter.
    List(Vec<Value>),
    /// Output of a user-supplied converter.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, with integers widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Self::User(u) => Some(u),
            Self::Member(m) => Some(&m.user),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Self::Member(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            Self::Channel(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<&Role> {
        match self {
            Self::Role(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<&Category> {
        match self {
            Self::Category(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(inner) => inner.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::User(u) => f.debug_tuple("User").field(&u.id).finish(),
            Self::Member(m) => f.debug_tuple("Member").field(&m.user.id).finish(),
            Self::Channel(c) => f.debug_tuple("Channel").field(&c.id).finish(),
            Self::Role(r) => f.debug_tuple("Role").field(&r.id).finish(),
            Self::Category(c) => f.debug_tuple("Category").field(&c.id).finish(),
            Self::List(items) => f.debug_list().entries(items).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::User(a), Self::User(b)) => a == b,
            (Self::Member(a), Self::Member(b)) => a == b,
            (Self::Channel(a), Self::Channel(b)) => a == b,
            (Self::Role(a), Self::Role(b)) => a == b,
            (Self::Category(a), Self::Category(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Renders the way a value would be echoed back to a user.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::User(u) => f.write_str(u.shown_name()),
            Self::Member(m) => f.write_str(m.display_name()),
            Self::Channel(c) => match &c.name {
                Some(name) => write!(f, "#{name}"),
                None => write!(f, "#{}", c.id),
            },
            Self::Role(r) => f.write_str(&r.name),
            Self::Category(c) => f.write_str(&c.name),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Custom(_) => f.write_str("<custom>"),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_list_joins_with_spaces() {
        let v = Value::List(vec![Value::Int(1), Value::from("two"), Value::Bool(true)]);
        assert_eq!(v.to_string(), "1 two true");
    }

    #[test]
    fn test_custom_downcast_and_identity() {
        let v = Value::custom(42u8);
        assert_eq!(v.downcast_ref::<u8>(), Some(&42));
        assert!(v.downcast_ref::<u16>().is_none());
        assert_eq!(v.clone(), v);
        assert_ne!(Value::custom(42u8), v);
    }

    #[test]
    fn test_option_conversion() {
        assert!(Value::from(None::<i64>).is_none());
        assert_eq!(Value::from(Some(3i64)).as_int(), Some(3));
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
    }
}
