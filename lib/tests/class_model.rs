mod common;

use classlink::jvm::class_file::ClassConstantIndex;
use classlink::jvm::class_graph::{ClassData, ClassGraph, JavaType};
use classlink::jvm::code::Opcode;
use classlink::jvm::model::{Class, FieldConstant, MethodParameters, Property};
use classlink::jvm::pool::{ConstantItem, Patch};
use classlink::jvm::*;
use common::{code, init_logging, u16s, ClassFileBuilder};

type Model = Class<ClassGraph>;

fn point() -> ClassFileBuilder {
    ClassFileBuilder::new("me/alec/Point")
}

fn build(builder: &ClassFileBuilder, options: ParseOptions) -> Result<Model, Error> {
    init_logging();
    Class::new(&builder.build(), "me.alec.Point", options, None, &LogDiagnostics)
}

fn build_err(builder: &ClassFileBuilder) -> String {
    build(builder, ParseOptions::empty()).unwrap_err().message()
}

/// `RuntimeInvisibleAnnotations` payload with one annotation per entry, each having elements
/// `(name, tag, constant index)`
fn annotations(builder: &mut ClassFileBuilder, annotations: &[(&str, &[(&str, u8, u16)])]) -> Vec<u8> {
    let mut info = u16s(&[annotations.len() as u16]);
    for (type_name, elements) in annotations {
        info.extend(u16s(&[builder.utf8(type_name), elements.len() as u16]));
        for (name, tag, index) in *elements {
            info.extend(u16s(&[builder.utf8(name)]));
            info.push(*tag);
            info.extend(u16s(&[*index]));
        }
    }
    info
}

#[test]
fn minimal_class() {
    let mut builder = point();
    let source_file = builder.utf8("Point.java");
    builder.class_attribute("SourceFile", u16s(&[source_file]));
    let class = build(&builder, ParseOptions::empty()).unwrap();

    assert_eq!(class.name(), "me.alec.Point");
    assert_eq!(class.super_class_name(), Some("java.lang.Object"));
    assert!(class.interfaces().is_empty());
    assert_eq!(class.source_file(), Some("Point.java"));
    assert_eq!(class.source_path().as_deref(), Some("me/alec/Point.java"));
    assert!(!class.is_deprecated());
}

#[test]
fn unsupported_version() {
    let builder = ClassFileBuilder::with_version("me/alec/Point", Version::new(53, 0));
    match build(&builder, ParseOptions::empty()) {
        Err(Error::UnsupportedClassVersion { class_name, version }) => {
            assert_eq!(class_name, "me.alec.Point");
            assert_eq!(version, Version::new(53, 0));
        }
        other => panic!("unexpected {:?}", other),
    }

    let builder = ClassFileBuilder::with_version("me/alec/Point", Version::new(44, 0));
    let err = build(&builder, ParseOptions::empty()).unwrap_err();
    assert_eq!(err.to_string(), "me.alec.Point (Unsupported major.minor version 44.0)");
}

#[test]
fn errors_name_the_class() {
    let mut builder = point();
    builder.access_flags |= (ClassAccessFlags::INTERFACE | ClassAccessFlags::FINAL).bits();
    let err = build(&builder, ParseOptions::empty()).unwrap_err();
    assert_eq!(err.to_string(), "me.alec.Point (Illegal class modifiers 0x231)");
}

#[test]
fn class_references() {
    let mut builder = point();
    builder.this_class = builder.class("[Lme/alec/Point;");
    assert_eq!(build_err(&builder), "Bad name");

    let mut builder = point();
    builder.super_class = builder.utf8("java/lang/Object");
    assert_eq!(build_err(&builder), "Bad superclass index");

    let mut builder = point();
    builder.super_class = 0;
    assert_eq!(build_err(&builder), "Bad superclass index");

    let mut builder = point();
    builder.access_flags = 0x0601;
    builder.super_class = builder.class("me/alec/Base");
    assert_eq!(build_err(&builder), "Interfaces must have java.lang.Object as superclass");

    let mut builder = point();
    let cloneable = builder.class("java/lang/Cloneable");
    builder.interfaces = vec![cloneable, cloneable];
    assert_eq!(build_err(&builder), "Repetitive interface name");
}

#[test]
fn object_has_no_superclass() {
    let mut builder = ClassFileBuilder::new("java/lang/Object");
    builder.super_class = 0;
    let class = Class::<ClassGraph>::new(
        &builder.build(),
        "java.lang.Object",
        ParseOptions::empty(),
        None,
        &LogDiagnostics,
    )
    .unwrap();
    assert_eq!(class.super_class_name(), None);
}

#[test]
fn duplicate_fields_around_threshold() {
    for count in [99, 100, 101] {
        let mut builder = point();
        for i in 0..count {
            builder.field(0x0002, &format!("field{}", i), "I", vec![]);
        }
        let class = build(&builder, ParseOptions::empty()).unwrap();
        assert_eq!(class.fields().len(), count);

        builder.field(0x0002, "field0", "I", vec![]);
        assert_eq!(build_err(&builder), "Repetitive field name/signature", "{} fields", count);
    }

    // Same name, different descriptor
    let mut builder = point();
    builder.field(0x0002, "x", "I", vec![]);
    builder.field(0x0002, "x", "J", vec![]);
    assert!(build(&builder, ParseOptions::empty()).is_ok());
}

#[test]
fn duplicate_methods() {
    let mut builder = point();
    builder.method(0x0401, "run", "()V", vec![]);
    builder.method(0x0401, "run", "()V", vec![]);
    builder.access_flags |= ClassAccessFlags::ABSTRACT.bits();
    assert_eq!(build_err(&builder), "Repetitive method name/signature");
}

#[test]
fn field_validation() {
    let mut builder = point();
    builder.field(0x0050, "x", "I", vec![]);
    assert_eq!(build_err(&builder), "Illegal field modifiers: 0x50");

    let mut builder = point();
    builder.field(0x0000, "x", "Ljava/lang/String", vec![]);
    assert_eq!(build_err(&builder), "Field \"x\" has invalid signature \"Ljava/lang/String\"");

    let mut builder = point();
    builder.field(0x0000, "a.b", "I", vec![]);
    assert_eq!(build_err(&builder), "Illegal field name \"a.b\"");

    // Interface fields are constants
    let mut builder = point();
    builder.access_flags = 0x0601;
    builder.field(0x0019, "X", "I", vec![]);
    assert!(build(&builder, ParseOptions::empty()).is_ok());
    builder.field(0x0009, "Y", "I", vec![]);
    assert_eq!(build_err(&builder), "Illegal field modifiers: 0x9");
}

#[test]
fn field_constants() {
    let mut builder = point();
    let int = builder.integer(42);
    let string = builder.string("hello");
    let attribute = builder.attribute("ConstantValue", u16s(&[int]));
    builder.field(0x0018, "X", "I", vec![attribute]);
    let attribute = builder.attribute("ConstantValue", u16s(&[int]));
    builder.field(0x0018, "FLAG", "Z", vec![attribute]);
    let attribute = builder.attribute("ConstantValue", u16s(&[string]));
    builder.field(0x0018, "S", "Ljava/lang/String;", vec![attribute]);
    let class = build(&builder, ParseOptions::empty()).unwrap();

    assert_eq!(class.fields()[0].constant_value, Some(FieldConstant::Int(42)));
    assert_eq!(class.fields()[1].constant_value, Some(FieldConstant::Boolean(true)));
    assert_eq!(
        class.field("S", "Ljava.lang.String;").unwrap().constant_value,
        Some(FieldConstant::String(classlink::util::Interned::new("hello")))
    );

    let mut builder = point();
    let int = builder.integer(42);
    let attribute = builder.attribute("ConstantValue", u16s(&[int]));
    builder.field(0x0018, "X", "J", vec![attribute]);
    assert_eq!(build_err(&builder), "Bad index into constant pool");

    let mut builder = point();
    let string = builder.string("hello");
    let attribute = builder.attribute("ConstantValue", u16s(&[string]));
    builder.field(0x0018, "X", "Ljava/lang/Object;", vec![attribute]);
    assert_eq!(build_err(&builder), "Invalid signature for constant");
}

#[test]
fn method_validation() {
    let mut builder = point();
    builder.method(0x0001, "<foo>", "()V", vec![]);
    assert_eq!(build_err(&builder), "Illegal method name \"<foo>\"");

    let mut builder = point();
    builder.method(0x0001, "<init>", "()I", vec![]);
    assert_eq!(build_err(&builder), "Method \"<init>\" has illegal signature \"()I\"");

    let mut builder = point();
    builder.method(0x0001, "run", "()V", vec![]);
    assert_eq!(
        build_err(&builder),
        "Absent Code attribute in method that is not native or abstract"
    );

    let mut builder = point();
    let attribute = builder.attribute("Code", code(0, 1, &[0xb1], &[]));
    builder.method(0x0401, "run", "()V", vec![attribute]);
    assert_eq!(build_err(&builder), "Code attribute in native or abstract methods");

    let mut builder = point();
    let first = builder.attribute("Code", code(0, 1, &[0xb1], &[]));
    let second = first.clone();
    builder.method(0x0001, "run", "()V", vec![first, second]);
    assert_eq!(build_err(&builder), "Duplicate Code attribute");
}

#[test]
fn static_initializer_without_code() {
    let mut builder = point();
    builder.method(0x0008, "<clinit>", "()V", vec![]);
    let class = build(&builder, ParseOptions::empty()).unwrap();
    let clinit = class.method("<clinit>", "()V").unwrap();
    assert!(clinit.is_class_initializer());
    assert!(clinit.is_static());
    let error = clinit.code.as_ref().unwrap().verify_error().unwrap();
    assert!(error.message.ends_with("No Code attribute"), "{}", error);
}

#[test]
fn branches_become_instruction_indices() {
    let mut builder = point();
    let bytecode = [
        0x03, // 0: iconst_0
        0x3c, // 1: istore_1
        0x1a, // 2: iload_0
        0x9e, 0x00, 0x09, // 3: ifle 12
        0x84, 0x00, 0xff, // 6: iinc 0 -1
        0xa7, 0xff, 0xf9, // 9: goto 2
        0x1b, // 12: iload_1
        0xac, // 13: ireturn
    ];
    let attribute = builder.attribute("Code", code(1, 2, &bytecode, &[(2, 14, 12, 0)]));
    builder.method(0x0009, "count", "(I)I", vec![attribute]);
    let class = build(&builder, ParseOptions::empty()).unwrap();

    let code = class.method("count", "(I)I").unwrap().code.as_ref().unwrap();
    assert_eq!(code.arg_map, vec![0]);
    let decoded = code.decoded().unwrap();
    let instructions = &decoded.instructions;
    assert_eq!(instructions.len(), 9);
    assert_eq!((instructions[3].opcode, instructions[3].arg1), (Opcode::IfLe, 6));
    assert_eq!((instructions[5].opcode, instructions[5].arg1), (Opcode::Goto, 2));
    assert_eq!((instructions[4].opcode, instructions[4].arg1, instructions[4].arg2), (Opcode::IInc, 0, -1));
    assert_eq!((instructions[8].opcode, instructions[8].pc), (Opcode::Nop, 14));

    // The handler range ends at the code length, so it covers up to the `ireturn`
    let handler = decoded.exception_table[0];
    assert_eq!((handler.start_index, handler.end_index, handler.handler_index), (2, 7, 6));
    assert_eq!(handler.catch_type, None);
}

#[test]
fn branch_into_instruction_is_fatal() {
    let mut builder = point();
    let attribute = builder.attribute("Code", code(0, 0, &[0xa7, 0x00, 0x01, 0xb1], &[]));
    builder.method(0x0009, "run", "()V", vec![attribute]);
    let message = build_err(&builder);
    assert!(message.contains("Illegal target of jump or branch"), "{}", message);
}

#[test]
fn bad_bytecode_is_deferred() {
    let mut builder = point();
    let attribute = builder.attribute("Code", code(0, 0, &[0xff], &[]));
    builder.method(0x0009, "broken", "()V", vec![attribute]);
    let class = build(&builder, ParseOptions::empty()).unwrap();

    let code = class.method("broken", "()V").unwrap().code.as_ref().unwrap();
    let error = code.verify_error().unwrap();
    assert!(error.message.contains("Invalid opcode"), "{}", error);
}

/// Class `me/Foo` whose static initializer starts with the `javac` assertion prologue
fn assertions_class(field_flags: u16) -> ClassFileBuilder {
    let mut builder = ClassFileBuilder::new("me/Foo");
    let this = builder.this_class;
    let desired = builder.methodref("java/lang/Class", "desiredAssertionStatus", "()Z");
    let field = builder.fieldref("me/Foo", "$assertionsDisabled", "Z");
    assert!(this < 256);
    let [desired_hi, desired_lo] = desired.to_be_bytes();
    let [field_hi, field_lo] = field.to_be_bytes();
    let bytecode = [
        0x12, this as u8, // 0: ldc me/Foo
        0xb6, desired_hi, desired_lo, // 2: invokevirtual desiredAssertionStatus
        0x9a, 0x00, 0x07, // 5: ifne 12
        0x04, // 8: iconst_1
        0xa7, 0x00, 0x04, // 9: goto 13
        0x03, // 12: iconst_0
        0xb3, field_hi, field_lo, // 13: putstatic $assertionsDisabled
        0xb1, // 16: return
    ];
    builder.field(field_flags, "$assertionsDisabled", "Z", vec![]);
    let attribute = builder.attribute("Code", code(1, 0, &bytecode, &[]));
    builder.method(0x0008, "<clinit>", "()V", vec![attribute]);
    builder
}

fn build_foo(builder: &ClassFileBuilder, options: ParseOptions) -> Model {
    init_logging();
    Class::new(&builder.build(), "me.Foo", options, None, &LogDiagnostics).unwrap()
}

#[test]
fn assertion_initialization_is_removed() {
    let builder = assertions_class(0x1018);
    let class = build_foo(&builder, ParseOptions::REMOVE_ASSERTIONS);

    let field = class.field("$assertionsDisabled", "Z").unwrap();
    assert_eq!(field.constant_value, Some(FieldConstant::Boolean(true)));
    let clinit = class.method("<clinit>", "()V").unwrap();
    assert!(clinit.has_assertions());
    let first = &clinit.code.as_ref().unwrap().decoded().unwrap().instructions[0];
    assert_eq!((first.opcode, first.arg1), (Opcode::Goto, 7));
}

#[test]
fn assertion_initialization_is_kept() {
    // Option not set
    let class = build_foo(&assertions_class(0x1018), ParseOptions::empty());
    assert_eq!(class.field("$assertionsDisabled", "Z").unwrap().constant_value, None);
    let clinit = class.method("<clinit>", "()V").unwrap();
    assert!(!clinit.has_assertions());
    assert_eq!(clinit.code.as_ref().unwrap().decoded().unwrap().instructions[0].opcode, Opcode::Ldc);

    // Field is not final
    let class = build_foo(&assertions_class(0x1008), ParseOptions::REMOVE_ASSERTIONS);
    assert_eq!(class.field("$assertionsDisabled", "Z").unwrap().constant_value, None);
    assert!(!class.method("<clinit>", "()V").unwrap().has_assertions());
}

#[test]
fn attributes_are_gated_by_version() {
    // `Signature` only exists from version 49 on
    let old = Version::new(48, 0);
    let mut builder = ClassFileBuilder::with_version("me/alec/Point", old);
    let attribute = builder.attribute("Signature", vec![0]);
    builder.field(0x0000, "x", "I", vec![attribute]);
    let class = build(&builder, ParseOptions::empty()).unwrap();
    assert_eq!(class.fields()[0].member.signature, None);

    builder.version = Version::JAVA5;
    assert_eq!(build_err(&builder), "Signature attribute has incorrect length");

    // `BootstrapMethods` only exists from version 51 on
    let mut builder = ClassFileBuilder::with_version("me/alec/Point", Version::JAVA6);
    builder.class_attribute("BootstrapMethods", vec![0, 1]);
    assert!(build(&builder, ParseOptions::empty()).is_ok());
    builder.version = Version::JAVA7;
    assert!(build(&builder, ParseOptions::empty()).is_err());

    // `RuntimeVisibleTypeAnnotations` only exists from version 52 on
    let mut builder = ClassFileBuilder::with_version("me/alec/Point", Version::JAVA7);
    builder.class_attribute("RuntimeVisibleTypeAnnotations", vec![0, 0]);
    assert_eq!(build(&builder, ParseOptions::empty()).unwrap().type_annotations(), None);
    builder.version = Version::JAVA8;
    let class = build(&builder, ParseOptions::empty()).unwrap();
    assert_eq!(class.type_annotations(), Some(&[0u8, 0][..]));
}

#[test]
fn interfaces_before_version_49_are_abstract() {
    let mut builder = ClassFileBuilder::with_version("me/alec/Point", Version::new(48, 0));
    builder.access_flags = (ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE).bits();
    let class = build(&builder, ParseOptions::empty()).unwrap();
    assert!(class.access_flags().contains(ClassAccessFlags::ABSTRACT));

    builder.version = Version::JAVA5;
    assert_eq!(build_err(&builder), "Illegal class modifiers 0x201");
}

#[test]
fn inner_classes() {
    let mut builder = point();
    let inner = builder.class("me/alec/Point$Inner");
    let outer = builder.this_class;
    let name = builder.utf8("Inner");
    builder.class_attribute("InnerClasses", u16s(&[1, inner, outer, name, 0x0009]));
    let class = build(&builder, ParseOptions::empty()).unwrap();

    let entry = &class.inner_classes()[0];
    assert_eq!(entry.name.as_deref(), Some("Inner"));
    assert_eq!(entry.outer_class, Some(ClassConstantIndex::from(outer)));
    assert!(entry.access_flags.contains(InnerClassAccessFlags::STATIC));
    match class.constant_pool().get(inner) {
        Some(ConstantItem::Class(item)) => assert!(item.is_link_required()),
        other => panic!("unexpected {:?}", other),
    }

    let mut builder = point();
    let this = builder.this_class;
    builder.class_attribute("InnerClasses", u16s(&[1, this, this, 0, 0]));
    assert_eq!(build_err(&builder), "Class is both inner and outer class");

    let mut builder = point();
    builder.class_attribute("InnerClasses", u16s(&[1, 0, 0, 0]));
    assert_eq!(build_err(&builder), "InnerClasses attribute has incorrect length");
}

#[test]
fn enclosing_method() {
    let mut builder = point();
    let outer = builder.class("me/alec/Outer");
    let method = builder.name_and_type("run", "(Lme/alec/Outer;)V");
    builder.class_attribute("EnclosingMethod", u16s(&[outer, method]));
    let class = build(&builder, ParseOptions::empty()).unwrap();

    let enclosing = class.enclosing_method().unwrap();
    assert_eq!(enclosing.class, "me.alec.Outer");
    let (name, descriptor) = enclosing.method.as_ref().unwrap();
    assert_eq!((name.as_str(), descriptor.as_str()), ("run", "(Lme.alec.Outer;)V"));

    let mut builder = point();
    builder.class_attribute("EnclosingMethod", u16s(&[outer]));
    assert_eq!(build_err(&builder), "Wrong EnclosingMethod attribute length");
}

#[test]
fn ikvm_assembly() {
    let mut builder = point();
    let assembly = builder.utf8("IKVM.Runtime");
    builder.class_attribute("IKVM.NET.Assembly", u16s(&[assembly]));
    assert_eq!(build(&builder, ParseOptions::empty()).unwrap().ikvm_assembly(), Some("IKVM.Runtime"));

    let mut builder = point();
    builder.class_attribute("IKVM.NET.Assembly", vec![0]);
    assert_eq!(build_err(&builder), "IKVM.NET.Assembly attribute has incorrect length");
}

#[test]
fn internal_classes() {
    let mut builder = point();
    let info = annotations(&mut builder, &[("Likvm/lang/Internal;", &[])]);
    builder.class_attribute("RuntimeInvisibleAnnotations", info);

    let class = build(&builder, ParseOptions::empty()).unwrap();
    assert!(!class.is_internal());

    let mut class = build(&builder, ParseOptions::STATIC_COMPILER).unwrap();
    assert!(class.is_internal());
    assert!(!class.access_flags().contains(ClassAccessFlags::PUBLIC));

    class.set_internal();
    assert!(class.is_internal());
}

#[test]
fn property_annotations() {
    let mut builder = point();
    let get_x = builder.utf8("getX");
    let one = builder.integer(1);
    let good = annotations(&mut builder, &[("Likvm/lang/Property;", &[("get", b's', get_x)])]);
    let attribute = builder.attribute("RuntimeInvisibleAnnotations", good);
    builder.field(0x0002, "x", "I", vec![attribute]);
    let twice = annotations(
        &mut builder,
        &[
            ("Likvm/lang/Property;", &[("get", b's', get_x)]),
            ("Likvm/lang/Property;", &[]),
        ],
    );
    let attribute = builder.attribute("RuntimeInvisibleAnnotations", twice);
    builder.field(0x0002, "y", "I", vec![attribute]);
    let bad = annotations(&mut builder, &[("Likvm/lang/Property;", &[("get", b'I', one)])]);
    let attribute = builder.attribute("RuntimeInvisibleAnnotations", bad);
    builder.field(0x0002, "z", "I", vec![attribute]);

    let diagnostics = CollectingDiagnostics::new();
    let class: Model =
        Class::new(&builder.build(), "me.alec.Point", ParseOptions::empty(), None, &diagnostics).unwrap();

    let getter = Property {
        getter: Some(String::from("getX")),
        setter: None,
    };
    assert_eq!(class.fields()[0].property.as_ref(), Some(&getter));
    assert_eq!(class.fields()[1].property.as_ref(), Some(&getter));
    assert_eq!(class.fields()[2].property, None);
    assert_eq!(
        diagnostics.warnings(),
        vec![
            Warning::DuplicatePropertyAnnotation {
                class: String::from("me.alec.Point"),
                member: String::from("y"),
            },
            Warning::MalformedPropertyAnnotation {
                class: String::from("me.alec.Point"),
                member: String::from("z"),
            },
        ]
    );
}

#[test]
fn method_marker_annotations() {
    let mut builder = point();
    builder.access_flags = 0x0601;
    let internal = annotations(&mut builder, &[("Likvm/lang/Internal;", &[])]);
    let attribute = builder.attribute("RuntimeInvisibleAnnotations", internal);
    builder.method(0x0401, "run", "()V", vec![attribute]);
    let initializer = annotations(&mut builder, &[("Likvm/lang/ModuleInitializer;", &[])]);
    let attribute = builder.attribute("RuntimeInvisibleAnnotations", initializer);
    builder.method(0x0401, "init", "()V", vec![attribute]);
    let field = builder.utf8("value");
    let compare_and_set = annotations(
        &mut builder,
        &[("Likvm/lang/InterlockedCompareAndSet;", &[("value", b's', field)])],
    );
    let attribute = builder.attribute("RuntimeInvisibleAnnotations", compare_and_set);
    builder.method(0x0401, "cas", "()Z", vec![attribute]);

    let diagnostics = CollectingDiagnostics::new();
    let class: Model = Class::new(
        &builder.build(),
        "me.alec.Point",
        ParseOptions::STATIC_COMPILER,
        None,
        &diagnostics,
    )
    .unwrap();
    assert!(!class.methods()[0].member.is_internal);
    assert_eq!(
        diagnostics.warnings(),
        vec![
            Warning::InternalOnInterfaceMethod {
                class: String::from("me.alec.Point"),
                member: String::from("run"),
            },
            Warning::MalformedModuleInitializer {
                class: String::from("me.alec.Point"),
                member: String::from("init"),
            },
            Warning::MalformedInterlockedCompareAndSet {
                class: String::from("me.alec.Point"),
                member: String::from("cas"),
            },
        ]
    );
    assert_eq!(class.methods()[2].interlocked_compare_and_set, None);
}

#[test]
fn method_extras() {
    let mut builder = point();
    let exception = builder.class("java/io/IOException");
    let name = builder.utf8("count");
    let exceptions = builder.attribute("Exceptions", u16s(&[1, exception]));
    let mut parameters = vec![1];
    parameters.extend(u16s(&[name, 0x0010]));
    let parameters = builder.attribute("MethodParameters", parameters);
    let body = builder.attribute("Code", code(1, 1, &[0x1a, 0xac], &[]));
    builder.method(0x0009, "read", "(I)I", vec![exceptions, parameters, body]);
    let deprecated = builder.attribute("Deprecated", vec![]);
    let signature = builder.utf8("<T:Ljava/lang/Object;>()TT;");
    let signature = builder.attribute("Signature", u16s(&[signature]));
    builder.method(0x0109, "get", "()Ljava/lang/Object;", vec![deprecated, signature]);
    let class = build(&builder, ParseOptions::empty()).unwrap();

    let read = &class.methods()[0];
    assert_eq!(read.exceptions, vec![classlink::util::Interned::new("java.io.IOException")]);
    match &read.parameters {
        MethodParameters::Present(parameters) => {
            assert_eq!(parameters[0].name.as_deref(), Some("count"));
            assert_eq!(parameters[0].access_flags, 0x0010);
        }
        other => panic!("unexpected {:?}", other),
    }

    let get = &class.methods()[1];
    assert!(get.is_native());
    assert!(get.code.is_none());
    assert!(get.member.is_deprecated);
    assert_eq!(get.member.signature.as_deref(), Some("<T:Ljava/lang/Object;>()TT;"));
    assert_eq!(get.descriptor(), "()Ljava.lang.Object;");
}

#[test]
fn patches_apply_before_resolution() {
    let mut builder = point();
    let greeting = builder.string("template");
    let this = builder.this_class as usize;
    let class_file = builder.build();

    let mut patches: Vec<Option<Patch<ClassGraph>>> = (0..class_file.constants.len()).map(|_| None).collect();
    patches[greeting as usize] = Some(Patch::Text(String::from("hello")));
    patches[this] = Some(Patch::Text(String::from("me/alec/Point$1")));
    let class = Class::new(
        &class_file,
        "me.alec.Point",
        ParseOptions::empty(),
        Some(&patches),
        &LogDiagnostics,
    )
    .unwrap();
    assert_eq!(class.name(), "me.alec.Point$1");
    assert!(matches!(
        class.constant_pool().get(greeting),
        Some(ConstantItem::LiveObject(_))
    ));

    let mut patches: Vec<Option<Patch<ClassGraph>>> = (0..class_file.constants.len()).map(|_| None).collect();
    patches[greeting as usize] = Some(Patch::Integer(1));
    let err = Class::new(
        &class_file,
        "me.alec.Point",
        ParseOptions::empty(),
        Some(&patches),
        &LogDiagnostics,
    )
    .unwrap_err();
    assert!(err.message().contains("Illegal constant pool patch"), "{}", err);
}

#[test]
fn link_against_class_graph() {
    let mut builder = point();
    let length = builder.methodref("java/lang/String", "length", "()I");
    let missing = builder.fieldref("me/alec/Missing", "x", "I");
    let [length_hi, length_lo] = length.to_be_bytes();
    let [missing_hi, missing_lo] = missing.to_be_bytes();
    let bytecode = [
        0x2a, // aload_0
        0xb6, length_hi, length_lo, // invokevirtual String.length
        0xb2, missing_hi, missing_lo, // getstatic Missing.x
        0x60, // iadd
        0xac, // ireturn
    ];
    let attribute = builder.attribute("Code", code(2, 1, &bytecode, &[]));
    builder.method(0x0009, "len", "(Ljava/lang/String;)I", vec![attribute]);
    let class = build(&builder, ParseOptions::empty()).unwrap();

    let class_graph = ClassGraph::with_java_lang();
    let java = class_graph.java_lang();
    let point = JavaType::class(&class_graph.add_class(ClassData::new(
        "me.alec.Point",
        Some(java.object),
        ClassAccessFlags::PUBLIC,
    )));
    let diagnostics = CollectingDiagnostics::new();
    class.link(&class_graph, &point, LoadMode::Link, &diagnostics);

    let pool = class.constant_pool();
    match pool.get(class.this_class()) {
        Some(ConstantItem::Class(item)) => assert_eq!(item.class_type(), Some(point.clone())),
        other => panic!("unexpected {:?}", other),
    }

    let length = pool.methodref(length).unwrap();
    let binding = length.binding().unwrap();
    assert_eq!(binding.method.unwrap().name, "length");
    assert_eq!(length.signature().unwrap().return_type, JavaType::Base(BaseType::Int));

    let missing = pool.fieldref(missing).unwrap();
    let binding = missing.binding().unwrap();
    assert!(binding.field.is_none());
    assert!(matches!(
        diagnostics.warnings()[..],
        [Warning::ClassLoadingError(_)]
    ));
}
