//! Nominal classes.
//!
//! A [`Class`] is a named nominal type with an ordered list of bases. The
//! hierarchy is fixed when the class is defined, so it is always acyclic and
//! subclass checks can be answered from a precomputed ancestor set.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashSet;

/// Process-unique identity of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    fn fresh() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        ClassId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw index of this id.
    pub fn index(self) -> u32 {
        self.0
    }
}

struct ClassData {
    id: ClassId,
    name: String,
    bases: Vec<Class>,
    /// Linearized ancestors, self first, `object` last.
    mro: Vec<ClassId>,
    ancestors: FxHashSet<ClassId>,
}

/// A nominal type.
///
/// Cloning is cheap. Equality, ordering and hashing follow the class
/// identity, never the name: two classes called `Point` are distinct.
#[derive(Clone)]
pub struct Class(Arc<ClassData>);

impl Class {
    /// The root class every other class derives from.
    pub fn object() -> Class {
        static OBJECT: OnceLock<Class> = OnceLock::new();
        OBJECT
            .get_or_init(|| {
                let id = ClassId::fresh();
                let mut ancestors = FxHashSet::default();
                ancestors.insert(id);
                Class(Arc::new(ClassData {
                    id,
                    name: "object".to_string(),
                    bases: Vec::new(),
                    mro: vec![id],
                    ancestors,
                }))
            })
            .clone()
    }

    /// Define a new class deriving from `bases`.
    ///
    /// An empty `bases` list derives from [`Class::object`].
    pub fn new(name: impl Into<String>, bases: &[Class]) -> Class {
        let object = Class::object();
        let bases = if bases.is_empty() {
            vec![object.clone()]
        } else {
            bases.to_vec()
        };

        let id = ClassId::fresh();
        let mut mro = vec![id];
        let mut ancestors = FxHashSet::default();
        ancestors.insert(id);
        for base in &bases {
            for &ancestor in &base.0.mro {
                if ancestor != object.id() && ancestors.insert(ancestor) {
                    mro.push(ancestor);
                }
            }
        }
        ancestors.insert(object.id());
        mro.push(object.id());

        Class(Arc::new(ClassData {
            id,
            name: name.into(),
            bases,
            mro,
            ancestors,
        }))
    }

    pub fn id(&self) -> ClassId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Direct bases in declaration order.
    pub fn bases(&self) -> &[Class] {
        &self.0.bases
    }

    /// Linearized ancestors: this class first, then each base's ancestors in
    /// declaration order with duplicates removed, and `object` last.
    pub fn mro(&self) -> &[ClassId] {
        &self.0.mro
    }

    /// Reflexive, transitive nominal subtype check.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.0.ancestors.contains(&other.id())
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl PartialOrd for Class {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Class {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id().cmp(&other.id())
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name(), self.id().0)
    }
}

/// The commonly used builtin classes.
///
/// `bool` derives from `int`; the numeric classes are otherwise unrelated.
#[derive(Debug, Clone)]
pub struct Builtins {
    pub object: Class,
    pub int: Class,
    pub float: Class,
    pub str: Class,
    pub bool: Class,
}

impl Builtins {
    pub fn new() -> Self {
        let int = Class::new("int", &[]);
        let bool = Class::new("bool", &[int.clone()]);
        Self {
            object: Class::object(),
            float: Class::new("float", &[]),
            str: Class::new("str", &[]),
            int,
            bool,
        }
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}
