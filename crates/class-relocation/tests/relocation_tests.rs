//! End-to-end relocation over directory trees.

use std::fs;
use std::path::Path;

use class_relocation::{relocate, DirStore, Phase, RelocationError, Relocator, DEFAULT_MARKER_DESCRIPTOR};
use jvm_classfile::testing::ClassFileBuilder;
use jvm_classfile::{Constant, ParsedClass};
use tempfile::TempDir;

fn write_class(root: &Path, name: &str, builder: &ClassFileBuilder) {
    let path = root.join(format!("{name}.class"));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, builder.build()).unwrap();
}

fn read_class(root: &Path, relative: &str) -> ParsedClass {
    let bytes = fs::read(root.join(relative)).unwrap();
    ParsedClass::parse(&bytes).unwrap()
}

fn field_types(class: &ParsedClass) -> Vec<(String, String)> {
    class
        .fields
        .iter()
        .map(|f| {
            (
                class.constant_pool.utf8(f.name_index).unwrap(),
                class.constant_pool.utf8(f.descriptor_index).unwrap(),
            )
        })
        .collect()
}

fn list_files(root: &Path) -> Vec<String> {
    fn walk(dir: &Path, prefix: &str, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let name = entry.file_name().to_string_lossy().to_string();
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            if entry.path().is_dir() {
                walk(&entry.path(), &relative, out);
            } else {
                out.push(relative);
            }
        }
    }
    let mut out = Vec::new();
    if root.exists() {
        walk(root, "", &mut out);
    }
    out.sort();
    out
}

/// A {B b; C c;} and B {C c;} are marked, C {A a;} is not.
fn write_scenario(input: &Path) {
    let mut a = ClassFileBuilder::new("A");
    a.field("b", "LB;").field("c", "LC;").annotation(DEFAULT_MARKER_DESCRIPTOR);
    let mut b = ClassFileBuilder::new("B");
    b.field("c", "LC;").annotation(DEFAULT_MARKER_DESCRIPTOR);
    let mut c = ClassFileBuilder::new("C");
    c.field("a", "LA;");
    write_class(input, "A", &a);
    write_class(input, "B", &b);
    write_class(input, "C", &c);
}

#[test]
fn test_qwerty_scenario() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_scenario(&input);

    let table = relocate(
        &DirStore::new(&input),
        &mut DirStore::new(&output),
        "qwerty",
        DEFAULT_MARKER_DESCRIPTOR,
    )
    .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.get("A"), Some("qwerty/A"));
    assert_eq!(table.get("B"), Some("qwerty/B"));
    assert_eq!(
        list_files(&output),
        vec!["C.class", "qwerty/A.class", "qwerty/B.class"]
    );

    let a = read_class(&output, "qwerty/A.class");
    assert_eq!(a.declared_name(), "qwerty/A");
    assert_eq!(
        field_types(&a),
        vec![
            ("b".to_string(), "Lqwerty/B;".to_string()),
            ("c".to_string(), "LC;".to_string()),
        ]
    );
    assert!(a.has_marker_attribute(DEFAULT_MARKER_DESCRIPTOR));

    let b = read_class(&output, "qwerty/B.class");
    assert_eq!(b.declared_name(), "qwerty/B");
    assert_eq!(field_types(&b), vec![("c".to_string(), "LC;".to_string())]);

    let c = read_class(&output, "C.class");
    assert_eq!(c.declared_name(), "C");
    assert_eq!(field_types(&c), vec![("a".to_string(), "Lqwerty/A;".to_string())]);
}

#[test]
fn test_report_phases() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_scenario(&input);

    let report = Relocator::new("qwerty")
        .run(&DirStore::new(&input), &mut DirStore::new(&output))
        .unwrap();

    let discovery = report.phase(Phase::Discovery).unwrap();
    assert_eq!(discovery.scanned, 3);
    assert_eq!(discovery.written, vec!["qwerty/A.class", "qwerty/B.class"]);
    assert_eq!(
        report.phase(Phase::Propagation).unwrap().written,
        vec!["C.class"]
    );
    // B holds no reference to a relocated class
    assert_eq!(
        report.phase(Phase::Fixup).unwrap().written,
        vec!["qwerty/A.class"]
    );
    assert_eq!(report.output_paths().len(), 3);
}

#[test]
fn test_mutual_references_between_marked_classes() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    let mut a = ClassFileBuilder::new("org/lib/A");
    a.method("peer", "()Lorg/lib/B;")
        .annotation(DEFAULT_MARKER_DESCRIPTOR);
    let mut b = ClassFileBuilder::new("org/lib/B");
    b.super_class("org/lib/A")
        .field_with_signature("all", "Ljava/util/List;", "Ljava/util/List<Lorg/lib/A;>;")
        .annotation(DEFAULT_MARKER_DESCRIPTOR);
    write_class(&input, "org/lib/A", &a);
    write_class(&input, "org/lib/B", &b);

    relocate(
        &DirStore::new(&input),
        &mut DirStore::new(&output),
        "v7",
        DEFAULT_MARKER_DESCRIPTOR,
    )
    .unwrap();

    for relative in ["v7/org/lib/A.class", "v7/org/lib/B.class"] {
        let class = read_class(&output, relative);
        let names = class.referenced_class_names().unwrap();
        assert!(!names.contains("org/lib/A"), "{relative}: {names:?}");
        assert!(!names.contains("org/lib/B"), "{relative}: {names:?}");
    }
    let b = read_class(&output, "v7/org/lib/B.class");
    assert_eq!(b.super_name().as_deref(), Some("v7/org/lib/A"));
    assert_eq!(list_files(&output).len(), 2);
}

#[test]
fn test_untouched_classes_are_not_emitted() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    let mut lonely = ClassFileBuilder::new("p/Lonely");
    lonely.field("s", "Ljava/lang/String;");
    let mut near_miss = ClassFileBuilder::new("p/NearMiss");
    near_miss.field("x", "Lp/AB;");
    let mut marked = ClassFileBuilder::new("p/A");
    marked.annotation(DEFAULT_MARKER_DESCRIPTOR);
    write_class(&input, "p/Lonely", &lonely);
    write_class(&input, "p/NearMiss", &near_miss);
    write_class(&input, "p/A", &marked);
    fs::write(input.join("p/readme.txt"), "not a class").unwrap();

    relocate(
        &DirStore::new(&input),
        &mut DirStore::new(&output),
        "v1",
        DEFAULT_MARKER_DESCRIPTOR,
    )
    .unwrap();
    assert_eq!(list_files(&output), vec!["v1/p/A.class"]);
}

#[test]
fn test_string_literals_survive_relocation() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    let mut marked = ClassFileBuilder::new("p/A");
    marked.annotation(DEFAULT_MARKER_DESCRIPTOR);
    let mut user = ClassFileBuilder::new("p/User");
    let literal = user.string_constant("p/A");
    let class_index = user.class_ref("p/A");
    let [hi, lo] = class_index.to_be_bytes();
    user.method_with_code("make", "()V", 2, 1, vec![0xBB, hi, lo, 0x57, 0xB1]);
    write_class(&input, "p/A", &marked);
    write_class(&input, "p/User", &user);

    relocate(
        &DirStore::new(&input),
        &mut DirStore::new(&output),
        "v1",
        DEFAULT_MARKER_DESCRIPTOR,
    )
    .unwrap();

    let user = read_class(&output, "p/User.class");
    let Some(Constant::String { string_index }) = user.constant_pool.get(literal) else {
        panic!("literal moved");
    };
    assert_eq!(user.constant_pool.utf8(*string_index).unwrap(), "p/A");
    assert_eq!(user.constant_pool.class_name(class_index).unwrap(), "v1/p/A");
}

#[test]
fn test_runs_are_deterministic() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    write_scenario(&input);

    let mut outputs = Vec::new();
    for run in ["first", "second"] {
        let output = dir.path().join(run);
        relocate(
            &DirStore::new(&input),
            &mut DirStore::new(&output),
            "qwerty",
            DEFAULT_MARKER_DESCRIPTOR,
        )
        .unwrap();
        let files: Vec<(String, Vec<u8>)> = list_files(&output)
            .into_iter()
            .map(|f| {
                let bytes = fs::read(output.join(&f)).unwrap();
                (f, bytes)
            })
            .collect();
        outputs.push(files);
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_colliding_relocations_fail() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    let mut one = ClassFileBuilder::new("p/A");
    one.annotation(DEFAULT_MARKER_DESCRIPTOR);
    let mut two = ClassFileBuilder::new("p/A");
    two.annotation(DEFAULT_MARKER_DESCRIPTOR);
    write_class(&input, "p/A", &one);
    write_class(&input, "q/A", &two);

    let err = relocate(
        &DirStore::new(&input),
        &mut DirStore::new(&output),
        "v1",
        DEFAULT_MARKER_DESCRIPTOR,
    )
    .unwrap_err();
    assert!(matches!(err, RelocationError::DuplicateClass { ref name, .. } if name == "p/A"));
}

#[test]
fn test_missing_input_directory() {
    let dir = TempDir::new().unwrap();
    let err = relocate(
        &DirStore::new(dir.path().join("nope")),
        &mut DirStore::new(dir.path().join("out")),
        "v1",
        DEFAULT_MARKER_DESCRIPTOR,
    )
    .unwrap_err();
    assert!(matches!(err, RelocationError::Storage { phase: Phase::Discovery, .. }));
}

#[test]
fn test_marked_class_cannot_shadow_existing_relocated_name() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    let mut marked = ClassFileBuilder::new("p/A");
    marked.annotation(DEFAULT_MARKER_DESCRIPTOR);
    let mut squatter = ClassFileBuilder::new("v1/p/A");
    squatter.field("a", "Lp/A;");
    write_class(&input, "p/A", &marked);
    write_class(&input, "v1/p/A", &squatter);

    let err = relocate(
        &DirStore::new(&input),
        &mut DirStore::new(&output),
        "v1",
        DEFAULT_MARKER_DESCRIPTOR,
    )
    .unwrap_err();
    assert!(matches!(err, RelocationError::DuplicateClass { ref name, .. } if name == "v1/p/A"));
    assert!(list_files(&output).is_empty());
}

#[test]
fn test_declared_name_cannot_escape_output_directory() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    let mut evil = ClassFileBuilder::new("../../escaped/Evil");
    evil.annotation(DEFAULT_MARKER_DESCRIPTOR);
    write_class(&input, "Evil", &evil);

    let err = relocate(
        &DirStore::new(&input),
        &mut DirStore::new(&output),
        "v1",
        DEFAULT_MARKER_DESCRIPTOR,
    )
    .unwrap_err();
    assert!(matches!(err, RelocationError::MalformedClassFile { phase: Phase::Discovery, .. }));
    assert_eq!(err.path(), Some("Evil.class"));
    assert!(!dir.path().join("escaped").exists());
    assert!(list_files(&output).is_empty());
}
