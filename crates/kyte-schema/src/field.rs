use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// Identity of a field inside a source value: its address plus the name of
/// its type. A nested struct and its first field share an address, so the
/// type name is needed to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FieldKey {
    addr: usize,
    ty: &'static str,
}

impl FieldKey {
    pub(crate) fn of<T: ?Sized>(value: &T) -> Self {
        Self {
            addr: (value as *const T).cast::<()>() as usize,
            ty: std::any::type_name::<T>(),
        }
    }

    pub(crate) fn addr(&self) -> usize {
        self.addr
    }
}

/// A reference to a field of a bound source value.
///
/// The source stays borrowed for `'a`, so it cannot move (and invalidate the
/// recorded address) while the reference is alive.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef<'a> {
    key: FieldKey,
    _source: PhantomData<&'a ()>,
}

impl FieldRef<'_> {
    pub(crate) fn key(&self) -> FieldKey {
        self.key
    }

    /// Rust type of the referenced field, as reported by `type_name`.
    pub fn type_name(&self) -> &'static str {
        self.key.ty
    }
}

impl fmt::Debug for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldRef({:#x}: {})", self.key.addr, self.key.ty)
    }
}

/// Take a reference to a field of a source value.
///
/// ```ignore
/// let user = User::default();
/// let name = kyte_schema::field(&user.name);
/// ```
pub fn field<T: ?Sized>(value: &T) -> FieldRef<'_> {
    FieldRef {
        key: FieldKey::of(value),
        _source: PhantomData,
    }
}

/// Either a literal dotted path or a reference into a bound source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<'a> {
    Name(Cow<'a, str>),
    Ref(FieldRef<'a>),
}

impl Field<'_> {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Field::Name(name) => Some(name),
            Field::Ref(_) => None,
        }
    }
}

impl fmt::Display for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name(name) => f.write_str(name),
            Field::Ref(r) => write!(f, "<{}>", r.type_name()),
        }
    }
}

impl<'a> From<&'a str> for Field<'a> {
    fn from(name: &'a str) -> Self {
        Field::Name(Cow::Borrowed(name))
    }
}

impl From<String> for Field<'_> {
    fn from(name: String) -> Self {
        Field::Name(Cow::Owned(name))
    }
}

impl<'a> From<&'a String> for Field<'a> {
    fn from(name: &'a String) -> Self {
        Field::Name(Cow::Borrowed(name.as_str()))
    }
}

impl<'a> From<FieldRef<'a>> for Field<'a> {
    fn from(r: FieldRef<'a>) -> Self {
        Field::Ref(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Todo {
        id: String,
        done: bool,
    }

    #[test]
    fn same_field_same_ref() {
        let todo = Todo {
            id: "a".into(),
            done: false,
        };
        assert_eq!(field(&todo.id), field(&todo.id));
        assert_ne!(field(&todo.id).key(), field(&todo.done).key());
    }

    #[test]
    fn struct_and_first_field_differ_by_type() {
        let todo = Todo {
            id: "a".into(),
            done: true,
        };
        let outer = field(&todo);
        let first = field(&todo.id);
        assert_ne!(outer, first);
        assert!(first.type_name().ends_with("String"));
    }

    #[test]
    fn string_conversions() {
        assert_eq!(Field::from("name").as_name(), Some("name"));
        assert_eq!(Field::from(String::from("a.b")).as_name(), Some("a.b"));
        let todo = Todo {
            id: "x".into(),
            done: false,
        };
        assert_eq!(Field::from(field(&todo.done)).as_name(), None);
    }
}
