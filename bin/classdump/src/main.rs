use classlink::jvm::class_file::ClassFile;
use classlink::jvm::class_graph::{ClassData, ClassGraph, JavaType, TypeSystem};
use classlink::jvm::model::Class;
use classlink::jvm::pool::ConstantItem;
use classlink::jvm::*;

use clap::{Arg, ArgAction, Command};
use std::error::Error as StdError;
use std::fs;
use std::path::Path;

fn main() -> Result<(), Box<dyn StdError>> {
    env_logger::init();

    let matches = Command::new("Class file dumper")
        .version(clap::crate_version!())
        .author("Alec Theriault <alec.theriault@gmail.com>")
        .about("Load a JVM class file, link it against `java.lang`, and print the result")
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("CLASS_NAME")
                .help("Name to report errors against (defaults to the file stem)"),
        )
        .arg(
            Arg::new("remove-assertions")
                .long("remove-assertions")
                .action(ArgAction::SetTrue)
                .help("Skip the `$assertionsDisabled` initialization in `<clinit>`"),
        )
        .arg(
            Arg::new("debug-tables")
                .long("debug-tables")
                .action(ArgAction::SetTrue)
                .help("Decode `LineNumberTable` and `LocalVariableTable` attributes"),
        )
        .arg(
            Arg::new("static-compiler")
                .long("static-compiler")
                .action(ArgAction::SetTrue)
                .help("Honor `ikvm.lang.Internal` annotations"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Sets the input class file to use")
                .required(true)
                .index(1),
        )
        .get_matches();

    let mut options = ParseOptions::empty();
    if matches.get_flag("remove-assertions") {
        options |= ParseOptions::REMOVE_ASSERTIONS;
    }
    if matches.get_flag("debug-tables") {
        options |= ParseOptions::LINE_NUMBER_TABLE | ParseOptions::LOCAL_VARIABLE_TABLE;
    }
    if matches.get_flag("static-compiler") {
        options |= ParseOptions::STATIC_COMPILER;
    }

    let input = matches
        .get_one::<String>("INPUT")
        .ok_or("missing input file")?;
    let input_name = match matches.get_one::<String>("name") {
        Some(name) => name.clone(),
        None => Path::new(input)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.clone()),
    };

    log::info!("Reading '{}'", input);
    let bytes = fs::read(input)?;
    let class_file = ClassFile::parse(&bytes).map_err(Error::from)?;
    let class: Class<ClassGraph> = Class::new(&class_file, &input_name, options, None, &LogDiagnostics)?;

    let class_graph = ClassGraph::with_java_lang();
    let this_type = this_type(&class_graph, &class);
    class.link(&class_graph, &this_type, LoadMode::Link, &LogDiagnostics);

    print_class(&class);
    Ok(())
}

/// Register the class in the graph, if its superclass is known there
fn this_type(class_graph: &ClassGraph, class: &Class<ClassGraph>) -> JavaType {
    let superclass = match class.super_class_name() {
        None => None,
        Some(name) => match class_graph.lookup_class(name) {
            Some(superclass) => Some(superclass),
            None => {
                log::warn!("Superclass {} is not loaded, {} stays unloadable", name, class.name());
                return class_graph.unloadable(class.name());
            }
        },
    };
    let data = ClassData::new(class.name(), superclass, class.access_flags());
    JavaType::class(&class_graph.add_class(data))
}

fn print_class(class: &Class<ClassGraph>) {
    println!("{} {:?} (version {})", class.name(), class.access_flags(), class.version());
    if let Some(super_class) = class.super_class_name() {
        println!("  extends {}", super_class);
    }
    for interface in class.interfaces() {
        println!("  implements {}", interface);
    }
    if let Some(source_path) = class.source_path() {
        println!("  source {}", source_path);
    }

    for field in class.fields() {
        print!("  field {} {} {:?}", field.name(), field.descriptor(), field.member.access_flags);
        if let Some(constant) = &field.constant_value {
            print!(" = {:?}", constant);
        }
        println!();
    }

    for method in class.methods() {
        print!("  method {}{} {:?}", method.name(), method.descriptor(), method.member.access_flags);
        match method.code.as_ref().map(|code| code.decoded()) {
            None => println!(),
            Some(Ok(decoded)) => println!(
                ": {} instructions, {} handlers",
                decoded.instructions.len() - 1,
                decoded.exception_table.len()
            ),
            Some(Err(error)) => println!(": deferred verify error: {}", error),
        }
    }

    let unresolved: Vec<&str> = class
        .constant_pool()
        .iter()
        .filter_map(|(_, item)| match item {
            ConstantItem::Class(item) => match item.class_type() {
                Some(JavaType::Unloadable(_)) => Some(item.name.as_str()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    if !unresolved.is_empty() {
        println!("  unresolved classes: {}", unresolved.join(", "));
    }
}
