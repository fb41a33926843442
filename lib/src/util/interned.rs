use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt::{Debug, Display, Error as FmtError, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Shared immutable string whose equality first tries pointer identity
///
/// Names and descriptors produced by the same [`Interner`] are deduplicated, so two equal
/// strings almost always share an allocation and comparing them is a pointer comparison. The
/// fallback content comparison keeps equality correct for strings from different interners.
/// Hashing is always on the content.
#[derive(Clone)]
pub struct Interned(Arc<str>);

impl Interned {
    pub fn new(value: &str) -> Interned {
        Interned(Arc::from(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if both values share the same allocation
    pub fn ptr_eq(&self, other: &Interned) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Interned {
    fn eq(&self, other: &Interned) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl Eq for Interned {}

impl Hash for Interned {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialEq<str> for Interned {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Interned {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Deref for Interned {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Interned {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Interned {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Debug for Interned {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        Debug::fmt(&*self.0, f)
    }
}

impl Display for Interned {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(&self.0)
    }
}

/// Deduplicating string table
///
/// One interner lives for the construction of one class, so every name and descriptor that class
/// hands out is shared between the constant pool, the members, and the attributes.
#[derive(Default)]
pub struct Interner {
    strings: HashSet<Interned>,
}

impl Interner {
    pub fn new() -> Interner {
        Interner {
            strings: HashSet::new(),
        }
    }

    pub fn intern(&mut self, value: &str) -> Interned {
        if let Some(existing) = self.strings.get(value) {
            existing.clone()
        } else {
            let interned = Interned::new(value);
            self.strings.insert(interned.clone());
            interned
        }
    }

    /// Intern the string after replacing the `/` package separator with `.`
    pub fn intern_dotted(&mut self, value: &str) -> Interned {
        if value.contains('/') {
            self.intern(&value.replace('/', "."))
        } else {
            self.intern(value)
        }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interning_shares_allocations() {
        let mut interner = Interner::new();
        let a = interner.intern("java.lang.Object");
        let b = interner.intern("java.lang.Object");
        assert!(a.ptr_eq(&b));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn equality_falls_back_to_content() {
        let a = Interned::new("foo");
        let b = Interned::new("foo");
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, Interned::new("bar"));
    }

    #[test]
    fn dotted_names() {
        let mut interner = Interner::new();
        let dotted = interner.intern_dotted("java/lang/String");
        assert_eq!(dotted, "java.lang.String");
        assert!(dotted.ptr_eq(&interner.intern("java.lang.String")));
    }
}
