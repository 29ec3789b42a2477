//! Assembling small class files by hand for tests.

use std::collections::HashMap;

use crate::class::{MAGIC, RUNTIME_INVISIBLE_ANNOTATIONS, RUNTIME_VISIBLE_ANNOTATIONS};
use crate::constant_pool::Constant;
use crate::mutf8;

const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;

struct RawAttribute {
    name_index: u16,
    info: Vec<u8>,
}

struct RawMember {
    name_index: u16,
    descriptor_index: u16,
    attributes: Vec<RawAttribute>,
}

/// Builds a structurally valid class file.
///
/// Pool entries are interned, so the same text always lands on a single
/// `CONSTANT_Utf8`. A literal and a class reference with equal text share one
/// entry, as javac output does.
pub struct ClassFileBuilder {
    major_version: u16,
    pool: Vec<Constant>,
    utf8s: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    strings: HashMap<String, u16>,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<RawMember>,
    methods: Vec<RawMember>,
    attributes: Vec<RawAttribute>,
    visible: Vec<Vec<u8>>,
    invisible: Vec<Vec<u8>>,
}

impl ClassFileBuilder {
    pub fn new(name: &str) -> Self {
        let mut builder = Self {
            major_version: 52,
            pool: vec![Constant::Unusable],
            utf8s: HashMap::new(),
            classes: HashMap::new(),
            strings: HashMap::new(),
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            visible: Vec::new(),
            invisible: Vec::new(),
        };
        builder.this_class = builder.class_ref(name);
        builder.super_class = builder.class_ref("java/lang/Object");
        builder
    }

    pub fn major_version(&mut self, major: u16) -> &mut Self {
        self.major_version = major;
        self
    }

    pub fn super_class(&mut self, name: &str) -> &mut Self {
        self.super_class = self.class_ref(name);
        self
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        let index = self.class_ref(name);
        self.interfaces.push(index);
        self
    }

    pub fn field(&mut self, name: &str, descriptor: &str) -> &mut Self {
        let member = self.member(name, descriptor);
        self.fields.push(member);
        self
    }

    pub fn field_with_signature(&mut self, name: &str, descriptor: &str, signature: &str) -> &mut Self {
        let mut member = self.member(name, descriptor);
        member.attributes.push(self.signature_attribute(signature));
        self.fields.push(member);
        self
    }

    pub fn method(&mut self, name: &str, descriptor: &str) -> &mut Self {
        let member = self.member(name, descriptor);
        self.methods.push(member);
        self
    }

    /// A method whose only attribute is `Code` with the given instructions.
    pub fn method_with_code(
        &mut self,
        name: &str,
        descriptor: &str,
        max_stack: u16,
        max_locals: u16,
        code: Vec<u8>,
    ) -> &mut Self {
        let mut member = self.member(name, descriptor);
        let info = code_body(max_stack, max_locals, &code, Vec::new());
        member.attributes.push(RawAttribute {
            name_index: self.utf8("Code"),
            info,
        });
        self.methods.push(member);
        self
    }

    /// A method whose `Code` carries a `LocalVariableTable` for `locals`.
    pub fn method_with_locals(&mut self, name: &str, descriptor: &str, locals: &[(&str, &str)]) -> &mut Self {
        let mut member = self.member(name, descriptor);

        let mut table = Vec::new();
        table.extend_from_slice(&(locals.len() as u16).to_be_bytes());
        for (slot, (local_name, local_desc)) in locals.iter().enumerate() {
            table.extend_from_slice(&0u16.to_be_bytes()); // start_pc
            table.extend_from_slice(&1u16.to_be_bytes()); // length
            table.extend_from_slice(&self.utf8(local_name).to_be_bytes());
            table.extend_from_slice(&self.utf8(local_desc).to_be_bytes());
            table.extend_from_slice(&(slot as u16 + 1).to_be_bytes());
        }
        let lvt = RawAttribute {
            name_index: self.utf8("LocalVariableTable"),
            info: table,
        };

        let max_locals = locals.len() as u16 + 1;
        let info = code_body(1, max_locals, &[0xB1], vec![lvt]);
        member.attributes.push(RawAttribute {
            name_index: self.utf8("Code"),
            info,
        });
        self.methods.push(member);
        self
    }

    /// Class-level `RuntimeVisibleAnnotations` entry with no elements.
    pub fn annotation(&mut self, descriptor: &str) -> &mut Self {
        self.utf8(RUNTIME_VISIBLE_ANNOTATIONS);
        let type_index = self.utf8(descriptor);
        let mut body = type_index.to_be_bytes().to_vec();
        body.extend_from_slice(&0u16.to_be_bytes());
        self.visible.push(body);
        self
    }

    pub fn invisible_annotation(&mut self, descriptor: &str) -> &mut Self {
        self.utf8(RUNTIME_INVISIBLE_ANNOTATIONS);
        let type_index = self.utf8(descriptor);
        let mut body = type_index.to_be_bytes().to_vec();
        body.extend_from_slice(&0u16.to_be_bytes());
        self.invisible.push(body);
        self
    }

    /// Visible annotation with a single enum-valued element.
    pub fn annotation_with_enum(
        &mut self,
        descriptor: &str,
        element: &str,
        enum_descriptor: &str,
        constant: &str,
    ) -> &mut Self {
        self.utf8(RUNTIME_VISIBLE_ANNOTATIONS);
        let mut body = Vec::new();
        body.extend_from_slice(&self.utf8(descriptor).to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&self.utf8(element).to_be_bytes());
        body.push(b'e');
        body.extend_from_slice(&self.utf8(enum_descriptor).to_be_bytes());
        body.extend_from_slice(&self.utf8(constant).to_be_bytes());
        self.visible.push(body);
        self
    }

    pub fn source_file(&mut self, name: &str) -> &mut Self {
        let name_index = self.utf8("SourceFile");
        let info = self.utf8(name).to_be_bytes().to_vec();
        self.attributes.push(RawAttribute { name_index, info });
        self
    }

    pub fn class_signature(&mut self, signature: &str) -> &mut Self {
        let attribute = self.signature_attribute(signature);
        self.attributes.push(attribute);
        self
    }

    /// Class-level attribute with an arbitrary body.
    pub fn raw_class_attribute(&mut self, name: &str, info: Vec<u8>) -> &mut Self {
        let name_index = self.utf8(name);
        self.attributes.push(RawAttribute { name_index, info });
        self
    }

    /// Index of the `CONSTANT_String` for `value`.
    pub fn string_constant(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.strings.get(value) {
            return index;
        }
        let string_index = self.utf8(value);
        let index = self.push(Constant::String { string_index });
        self.strings.insert(value.to_string(), index);
        index
    }

    /// Index of the `CONSTANT_Class` for `name`.
    pub fn class_ref(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.classes.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        let index = self.push(Constant::Class { name_index });
        self.classes.insert(name.to_string(), index);
        index
    }

    /// Index of a `CONSTANT_Methodref` for `owner.name descriptor`.
    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class_ref(owner);
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let name_and_type_index = self.push(Constant::NameAndType {
            name_index,
            descriptor_index,
        });
        self.push(Constant::MethodRef {
            class_index,
            name_and_type_index,
        })
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8s.get(value) {
            return index;
        }
        let index = self.push(Constant::Utf8(mutf8::encode(value)));
        self.utf8s.insert(value.to_string(), index);
        index
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());

        out.extend_from_slice(&(self.pool.len() as u16).to_be_bytes());
        for constant in &self.pool[1..] {
            constant.write(&mut out);
        }

        out.extend_from_slice(&(ACC_PUBLIC | ACC_SUPER).to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for iface in &self.interfaces {
            out.extend_from_slice(&iface.to_be_bytes());
        }
        write_members(&self.fields, &mut out);
        write_members(&self.methods, &mut out);

        let mut attributes: Vec<(u16, Vec<u8>)> = self
            .attributes
            .iter()
            .map(|a| (a.name_index, a.info.clone()))
            .collect();
        for (name, bodies) in [
            (RUNTIME_VISIBLE_ANNOTATIONS, &self.visible),
            (RUNTIME_INVISIBLE_ANNOTATIONS, &self.invisible),
        ] {
            if bodies.is_empty() {
                continue;
            }
            let Some(&name_index) = self.utf8s.get(name) else {
                continue;
            };
            let mut info = (bodies.len() as u16).to_be_bytes().to_vec();
            for body in bodies {
                info.extend_from_slice(body);
            }
            attributes.push((name_index, info));
        }
        out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
        for (name_index, info) in &attributes {
            write_attribute(*name_index, info, &mut out);
        }
        out
    }

    fn push(&mut self, constant: Constant) -> u16 {
        self.pool.push(constant);
        (self.pool.len() - 1) as u16
    }

    fn member(&mut self, name: &str, descriptor: &str) -> RawMember {
        RawMember {
            name_index: self.utf8(name),
            descriptor_index: self.utf8(descriptor),
            attributes: Vec::new(),
        }
    }

    fn signature_attribute(&mut self, signature: &str) -> RawAttribute {
        RawAttribute {
            name_index: self.utf8("Signature"),
            info: self.utf8(signature).to_be_bytes().to_vec(),
        }
    }
}

fn code_body(max_stack: u16, max_locals: u16, code: &[u8], attributes: Vec<RawAttribute>) -> Vec<u8> {
    let mut info = Vec::new();
    info.extend_from_slice(&max_stack.to_be_bytes());
    info.extend_from_slice(&max_locals.to_be_bytes());
    info.extend_from_slice(&(code.len() as u32).to_be_bytes());
    info.extend_from_slice(code);
    info.extend_from_slice(&0u16.to_be_bytes()); // exception_table_length
    info.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for attr in &attributes {
        write_attribute(attr.name_index, &attr.info, &mut info);
    }
    info
}

fn write_attribute(name_index: u16, info: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&name_index.to_be_bytes());
    out.extend_from_slice(&(info.len() as u32).to_be_bytes());
    out.extend_from_slice(info);
}

fn write_members(members: &[RawMember], out: &mut Vec<u8>) {
    out.extend_from_slice(&(members.len() as u16).to_be_bytes());
    for member in members {
        out.extend_from_slice(&ACC_PUBLIC.to_be_bytes());
        out.extend_from_slice(&member.name_index.to_be_bytes());
        out.extend_from_slice(&member.descriptor_index.to_be_bytes());
        out.extend_from_slice(&(member.attributes.len() as u16).to_be_bytes());
        for attr in &member.attributes {
            write_attribute(attr.name_index, &attr.info, out);
        }
    }
}
