//! Class-tree fixtures for CLI tests.

use std::fs;
use std::path::Path;

use jvm_classfile::testing::ClassFileBuilder;
use jvm_classfile::ParsedClass;

pub const MARKER: &str = "Lorg/eolang/Versionized;";

/// Write `builder` at `<root>/<internal name>.class`.
pub fn write_class(root: &Path, internal_name: &str, builder: &ClassFileBuilder) {
    let path = root.join(format!("{internal_name}.class"));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, builder.build()).unwrap();
}

pub fn read_class(root: &Path, relative: &str) -> ParsedClass {
    let bytes = fs::read(root.join(relative)).unwrap();
    ParsedClass::parse(&bytes).unwrap()
}

/// `A {B b; C c;}` and `B {C c;}` carry the marker, `C {A a;}` does not.
pub fn write_qwerty_scenario(root: &Path) {
    let mut a = ClassFileBuilder::new("A");
    a.field("b", "LB;").field("c", "LC;").annotation(MARKER);
    let mut b = ClassFileBuilder::new("B");
    b.field("c", "LC;").annotation(MARKER);
    let mut c = ClassFileBuilder::new("C");
    c.field("a", "LA;");
    write_class(root, "A", &a);
    write_class(root, "B", &b);
    write_class(root, "C", &c);
}

/// Relative paths of every `.class` file under `root`, sorted.
pub fn list_class_files(root: &Path) -> Vec<String> {
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
            } else if relative.ends_with(".class") {
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
