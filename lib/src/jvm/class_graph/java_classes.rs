use super::{ClassData, ClassGraph, ClassRef};
use crate::jvm::{well_known, ClassAccessFlags, MethodAccessFlags};

/// Classes inside `java.lang.*` (plus `java.io.Serializable`) that the class model names
pub struct LangClasses {
    pub object: ClassRef,
    pub cloneable: ClassRef,
    pub serializable: ClassRef,
    pub char_sequence: ClassRef,
    pub string: ClassRef,
    pub class: ClassRef,
    pub throwable: ClassRef,
    pub exception: ClassRef,
    pub runtime_exception: ClassRef,
    pub illegal_argument_exception: ClassRef,
}

const PUBLIC_CLASS: ClassAccessFlags =
    ClassAccessFlags::from_bits_truncate(ClassAccessFlags::PUBLIC.bits() | ClassAccessFlags::SUPER.bits());
const PUBLIC_INTERFACE: ClassAccessFlags = ClassAccessFlags::from_bits_truncate(
    ClassAccessFlags::PUBLIC.bits() | ClassAccessFlags::INTERFACE.bits() | ClassAccessFlags::ABSTRACT.bits(),
);
const PUBLIC_FINAL_CLASS: ClassAccessFlags =
    ClassAccessFlags::from_bits_truncate(PUBLIC_CLASS.bits() | ClassAccessFlags::FINAL.bits());

impl ClassGraph {
    /// New graph seeded with the handful of standard library types the class model names
    pub fn with_java_lang() -> ClassGraph {
        let graph = ClassGraph::new();
        LangClasses::add_to_graph(&graph);
        graph
    }

    /// Look up the standard library classes added by [`ClassGraph::with_java_lang`]
    ///
    /// Panics if the graph was not seeded.
    pub fn java_lang(&self) -> LangClasses {
        let get = |name: &str| {
            self.lookup_class(name)
                .unwrap_or_else(|| panic!("{} is missing from the class graph", name))
        };
        LangClasses {
            object: get(well_known::OBJECT),
            cloneable: get(well_known::CLONEABLE),
            serializable: get(well_known::SERIALIZABLE),
            char_sequence: get("java.lang.CharSequence"),
            string: get(well_known::STRING),
            class: get(well_known::CLASS),
            throwable: get(well_known::THROWABLE),
            exception: get("java.lang.Exception"),
            runtime_exception: get("java.lang.RuntimeException"),
            illegal_argument_exception: get("java.lang.IllegalArgumentException"),
        }
    }
}

impl LangClasses {
    pub fn add_to_graph(class_graph: &ClassGraph) -> LangClasses {
        let object = class_graph.add_class(
            ClassData::new(well_known::OBJECT, None, PUBLIC_CLASS)
                .with_method("<init>", "()V", MethodAccessFlags::PUBLIC)
                .with_method("hashCode", "()I", MethodAccessFlags::PUBLIC | MethodAccessFlags::NATIVE)
                .with_method("equals", "(Ljava.lang.Object;)Z", MethodAccessFlags::PUBLIC)
                .with_method("toString", "()Ljava.lang.String;", MethodAccessFlags::PUBLIC)
                .with_method(
                    "getClass",
                    "()Ljava.lang.Class;",
                    MethodAccessFlags::PUBLIC | MethodAccessFlags::FINAL | MethodAccessFlags::NATIVE,
                ),
        );
        let cloneable = class_graph.add_class(ClassData::new(
            well_known::CLONEABLE,
            Some(object.clone()),
            PUBLIC_INTERFACE,
        ));
        let serializable = class_graph.add_class(ClassData::new(
            well_known::SERIALIZABLE,
            Some(object.clone()),
            PUBLIC_INTERFACE,
        ));
        let char_sequence = class_graph.add_class(
            ClassData::new("java.lang.CharSequence", Some(object.clone()), PUBLIC_INTERFACE)
                .with_method("length", "()I", MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT),
        );
        let string = class_graph.add_class(
            ClassData::new(well_known::STRING, Some(object.clone()), PUBLIC_FINAL_CLASS)
                .with_interface(serializable.clone())
                .with_interface(char_sequence.clone())
                .with_method("<init>", "()V", MethodAccessFlags::PUBLIC)
                .with_method("length", "()I", MethodAccessFlags::PUBLIC),
        );
        let class = class_graph.add_class(
            ClassData::new(well_known::CLASS, Some(object.clone()), PUBLIC_FINAL_CLASS)
                .with_interface(serializable.clone())
                .with_method("desiredAssertionStatus", "()Z", MethodAccessFlags::PUBLIC)
                .with_method("getName", "()Ljava.lang.String;", MethodAccessFlags::PUBLIC),
        );
        let throwable = class_graph.add_class(
            ClassData::new(well_known::THROWABLE, Some(object.clone()), PUBLIC_CLASS)
                .with_interface(serializable.clone())
                .with_method("<init>", "()V", MethodAccessFlags::PUBLIC)
                .with_method("getMessage", "()Ljava.lang.String;", MethodAccessFlags::PUBLIC),
        );
        let exception = class_graph.add_class(
            ClassData::new("java.lang.Exception", Some(throwable.clone()), PUBLIC_CLASS)
                .with_method("<init>", "()V", MethodAccessFlags::PUBLIC),
        );
        let runtime_exception = class_graph.add_class(
            ClassData::new("java.lang.RuntimeException", Some(exception.clone()), PUBLIC_CLASS)
                .with_method("<init>", "()V", MethodAccessFlags::PUBLIC),
        );
        let illegal_argument_exception = class_graph.add_class(
            ClassData::new(
                "java.lang.IllegalArgumentException",
                Some(runtime_exception.clone()),
                PUBLIC_CLASS,
            )
            .with_method("<init>", "()V", MethodAccessFlags::PUBLIC),
        );

        LangClasses {
            object,
            cloneable,
            serializable,
            char_sequence,
            string,
            class,
            throwable,
            exception,
            runtime_exception,
            illegal_argument_exception,
        }
    }
}
