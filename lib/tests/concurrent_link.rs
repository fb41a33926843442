mod common;

use classlink::jvm::class_graph::{ClassData, ClassGraph, JavaType, TypeSystem};
use classlink::jvm::model::Class;
use classlink::jvm::pool::ConstantItem;
use classlink::jvm::*;
use common::{code, init_logging, ClassFileBuilder};
use std::sync::Arc;

const THREADS: usize = 8;

#[test]
fn racing_links_agree() {
    init_logging();
    let mut builder = ClassFileBuilder::new("me/alec/Point");
    let length = builder.methodref("java/lang/String", "length", "()I");
    let missing = builder.methodref("me/alec/Missing", "run", "()V");
    let [length_hi, length_lo] = length.to_be_bytes();
    let [missing_hi, missing_lo] = missing.to_be_bytes();
    let bytecode = [
        0x2a, // aload_0
        0xb6, length_hi, length_lo, // invokevirtual String.length
        0x57, // pop
        0xb8, missing_hi, missing_lo, // invokestatic Missing.run
        0xb1, // return
    ];
    let attribute = builder.attribute("Code", code(1, 1, &bytecode, &[]));
    builder.method(0x0009, "run", "(Ljava/lang/String;)V", vec![attribute]);
    let class: Class<ClassGraph> = Class::new(
        &builder.build(),
        "me.alec.Point",
        ParseOptions::empty(),
        None,
        &LogDiagnostics,
    )
    .unwrap();

    let class_graph = ClassGraph::with_java_lang();
    let point = JavaType::class(&class_graph.add_class(ClassData::new(
        "me.alec.Point",
        Some(class_graph.java_lang().object),
        ClassAccessFlags::PUBLIC,
    )));
    let diagnostics = CollectingDiagnostics::new();

    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| class.link(&class_graph, &point, LoadMode::Link, &diagnostics));
        }
    });

    let pool = class.constant_pool();
    let length = pool.methodref(length).unwrap();
    let first = length.binding().unwrap().method.unwrap();
    let second = length.binding().unwrap().method.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // Every thread observes the one committed type, loaded or not
    let missing_class = pool.methodref(missing).unwrap().member.class;
    match pool.get(missing_class) {
        Some(ConstantItem::Class(item)) => {
            assert_eq!(item.class_type(), Some(JavaType::Unloadable(Arc::from("me.alec.Missing"))));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(pool.methodref(missing).unwrap().binding().is_none());

    // Every thread that attempted the load may have reported it
    let warnings = diagnostics.warnings();
    assert!(!warnings.is_empty() && warnings.len() <= THREADS);
    assert!(warnings
        .iter()
        .all(|warning| matches!(warning, Warning::ClassLoadingError(_))));
}

#[test]
fn link_is_idempotent() {
    init_logging();
    let mut builder = ClassFileBuilder::new("me/alec/Point");
    let length = builder.methodref("java/lang/String", "length", "()I");
    let [length_hi, length_lo] = length.to_be_bytes();
    let attribute = builder.attribute("Code", code(1, 1, &[0x2a, 0xb6, length_hi, length_lo, 0xac], &[]));
    builder.method(0x0009, "len", "(Ljava/lang/String;)I", vec![attribute]);
    let class: Class<ClassGraph> = Class::new(
        &builder.build(),
        "me.alec.Point",
        ParseOptions::empty(),
        None,
        &LogDiagnostics,
    )
    .unwrap();

    let class_graph = ClassGraph::with_java_lang();
    let point = class_graph.unloadable("me.alec.Point");
    class.link(&class_graph, &point, LoadMode::Link, &LogDiagnostics);
    let before = class.constant_pool().methodref(length).unwrap().signature().unwrap();
    class.link(&class_graph, &point, LoadMode::Link, &LogDiagnostics);
    let after = class.constant_pool().methodref(length).unwrap().signature().unwrap();
    assert!(Arc::ptr_eq(&before.arguments, &after.arguments));
    assert_eq!(after.return_type, JavaType::Base(BaseType::Int));
}
