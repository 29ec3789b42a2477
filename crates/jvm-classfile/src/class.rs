//! Parsed class-file structure.

use std::collections::BTreeSet;

use crate::attributes::{self, NameSlots};
use crate::constant_pool::ConstantPool;
use crate::error::{ClassFormatError, Result};
use crate::mutf8;
use crate::reader::ByteReader;
use crate::summary::ClassSummary;

pub const MAGIC: u32 = 0xCAFE_BABE;
/// JDK 1.0.2
pub const MIN_MAJOR_VERSION: u16 = 45;
/// JDK 27
pub const MAX_MAJOR_VERSION: u16 = 71;

pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";

/// An attribute with its body kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl Attribute {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let name_index = reader.read_u16()?;
        let len = reader.read_u32()? as usize;
        let info = reader.read_bytes(len)?.to_vec();
        Ok(Self { name_index, info })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.name_index.to_be_bytes());
        out.extend_from_slice(&(self.info.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.info);
    }
}

/// A field or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let access_flags = reader.read_u16()?;
        let name_index = reader.read_u16()?;
        let descriptor_index = reader.read_u16()?;
        let attributes = read_attributes(reader)?;
        Ok(Self {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.name_index.to_be_bytes());
        out.extend_from_slice(&self.descriptor_index.to_be_bytes());
        write_attributes(&self.attributes, out);
    }
}

fn read_attributes(reader: &mut ByteReader<'_>) -> Result<Vec<Attribute>> {
    let count = reader.read_u16()?;
    (0..count).map(|_| Attribute::read(reader)).collect()
}

fn write_attributes(attributes: &[Attribute], out: &mut Vec<u8>) {
    out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for attr in attributes {
        attr.write(out);
    }
}

fn read_members(reader: &mut ByteReader<'_>) -> Result<Vec<MemberInfo>> {
    let count = reader.read_u16()?;
    (0..count).map(|_| MemberInfo::read(reader)).collect()
}

/// A class file decoded into its top-level structure.
///
/// Pool, members and attributes are held in an addressable form; code bodies
/// and any attribute this crate does not interpret stay as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClass {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
    declared_name: String,
    raw: Vec<u8>,
}

impl ParsedClass {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.read_u32()?;
        if magic != MAGIC {
            return Err(ClassFormatError::BadMagic(magic));
        }
        let minor_version = reader.read_u16()?;
        let major_version = reader.read_u16()?;
        if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major_version) {
            return Err(ClassFormatError::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let constant_pool = ConstantPool::read(&mut reader)?;
        let access_flags = reader.read_u16()?;
        let this_class = reader.read_u16()?;
        let super_class = reader.read_u16()?;
        let interface_count = reader.read_u16()?;
        let interfaces = (0..interface_count)
            .map(|_| reader.read_u16())
            .collect::<Result<Vec<_>>>()?;
        let fields = read_members(&mut reader)?;
        let methods = read_members(&mut reader)?;
        let attributes = read_attributes(&mut reader)?;

        if reader.remaining() > 0 {
            return Err(ClassFormatError::TrailingBytes(reader.remaining()));
        }

        let declared_name = constant_pool.class_name(this_class)?;
        if declared_name
            .split('/')
            .any(|segment| matches!(segment, "" | "." | ".."))
        {
            return Err(ClassFormatError::InvalidClassName(declared_name));
        }
        // super_class is 0 only for java/lang/Object and module-info
        if super_class != 0 {
            constant_pool.class_name(super_class)?;
        }
        for &iface in &interfaces {
            constant_pool.class_name(iface)?;
        }

        Ok(Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
            declared_name,
            raw: bytes.to_vec(),
        })
    }

    /// The class's own internal name (`this_class`).
    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    /// Bytes this class was parsed from.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn super_name(&self) -> Option<String> {
        if self.super_class == 0 {
            return None;
        }
        self.constant_pool.class_name(self.super_class).ok()
    }

    pub fn interface_names(&self) -> Vec<String> {
        self.interfaces
            .iter()
            .filter_map(|&i| self.constant_pool.class_name(i).ok())
            .collect()
    }

    /// Name of an attribute, if its name index resolves to a UTF-8 entry.
    pub fn attribute_name(&self, attr: &Attribute) -> Option<String> {
        self.constant_pool.utf8(attr.name_index).ok()
    }

    /// Whether a class-level annotation has exactly `marker_descriptor` as its type.
    ///
    /// Both runtime-visible and runtime-invisible annotations count; the
    /// comparison is on the encoded descriptor bytes.
    pub fn has_marker_attribute(&self, marker_descriptor: &str) -> bool {
        let marker = mutf8::encode(marker_descriptor);
        self.attributes.iter().any(|attr| {
            let Ok(name) = self.constant_pool.utf8_bytes(attr.name_index) else {
                return false;
            };
            if name != RUNTIME_VISIBLE_ANNOTATIONS.as_bytes()
                && name != RUNTIME_INVISIBLE_ANNOTATIONS.as_bytes()
            {
                return false;
            }
            match attributes::annotation_type_indices(&attr.info) {
                Ok(indices) => indices.into_iter().any(|idx| {
                    self.constant_pool
                        .utf8_bytes(idx)
                        .map(|desc| desc == marker.as_slice())
                        .unwrap_or(false)
                }),
                Err(_) => false,
            }
        })
    }

    /// Every class name that appears in a symbolic-reference position.
    ///
    /// Names are collected from class constants, descriptors, signatures and
    /// annotation types; array descriptors contribute their element class.
    pub fn referenced_class_names(&self) -> Result<BTreeSet<String>> {
        let slots = NameSlots::collect(self)?;
        let mut names = BTreeSet::new();
        for (utf8_index, role) in slots.roles() {
            let Ok(value) = self.constant_pool.utf8(utf8_index) else {
                continue;
            };
            role.collect_names(&value, &mut names);
        }
        Ok(names)
    }

    pub fn summary(&self, marker_descriptor: &str) -> ClassSummary {
        ClassSummary {
            name: self.declared_name.clone(),
            super_name: self.super_name(),
            interfaces: self.interface_names(),
            major_version: self.major_version,
            minor_version: self.minor_version,
            constant_pool_count: self.constant_pool.count(),
            fields: self.fields.len(),
            methods: self.methods.len(),
            has_marker: self.has_marker_attribute(marker_descriptor),
        }
    }

    /// Serialize back to class-file bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.raw.len() + 64);
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        self.constant_pool.write(&mut out);
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for iface in &self.interfaces {
            out.extend_from_slice(&iface.to_be_bytes());
        }
        out.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            field.write(&mut out);
        }
        out.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            method.write(&mut out);
        }
        write_attributes(&self.attributes, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ClassFileBuilder;

    const MARKER: &str = "Lorg/eolang/Versionized;";

    #[test]
    fn test_parse_and_reserialize_is_identity() {
        let mut builder = ClassFileBuilder::new("org/example/A");
        builder
            .field("b", "Lorg/example/B;")
            .method("run", "()V")
            .annotation(MARKER)
            .source_file("A.java");
        let bytes = builder.build();

        let class = ParsedClass::parse(&bytes).unwrap();
        assert_eq!(class.declared_name(), "org/example/A");
        assert_eq!(class.super_name().as_deref(), Some("java/lang/Object"));
        assert_eq!(class.to_bytes(), bytes);
        assert_eq!(class.raw_bytes(), bytes.as_slice());
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = ClassFileBuilder::new("p/A").build();
        bytes[0] = 0xCB;
        let err = ParsedClass::parse(&bytes).unwrap_err();
        assert!(matches!(err, ClassFormatError::BadMagic(0xCBFE_BABE)));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = ClassFileBuilder::new("p/A").build();
        bytes[6] = 0x00;
        bytes[7] = 0x2C;
        let err = ParsedClass::parse(&bytes).unwrap_err();
        assert_eq!(
            err,
            ClassFormatError::UnsupportedVersion {
                major: 44,
                minor: 0
            }
        );
    }

    #[test]
    fn test_truncated_and_trailing() {
        let bytes = ClassFileBuilder::new("p/A").build();
        let err = ParsedClass::parse(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, ClassFormatError::Truncated { .. }));

        let mut extra = bytes.clone();
        extra.push(0);
        let err = ParsedClass::parse(&extra).unwrap_err();
        assert_eq!(err, ClassFormatError::TrailingBytes(1));
    }

    #[test]
    fn test_declared_name_with_relative_segments_is_rejected() {
        for name in ["../../escaped/Evil", "p/./A", "p//A", "/p/A", "p/A/"] {
            let bytes = ClassFileBuilder::new(name).build();
            let err = ParsedClass::parse(&bytes).unwrap_err();
            assert_eq!(err, ClassFormatError::InvalidClassName(name.to_string()));
        }
        assert!(ParsedClass::parse(&ClassFileBuilder::new("p/A$1").build()).is_ok());
    }

    #[test]
    fn test_marker_detection() {
        let mut marked = ClassFileBuilder::new("p/A");
        marked.annotation("Ljava/lang/Deprecated;").annotation(MARKER);
        let class = ParsedClass::parse(&marked.build()).unwrap();
        assert!(class.has_marker_attribute(MARKER));
        assert!(!class.has_marker_attribute("Lorg/eolang/Other;"));

        let mut invisible = ClassFileBuilder::new("p/B");
        invisible.invisible_annotation(MARKER);
        let class = ParsedClass::parse(&invisible.build()).unwrap();
        assert!(class.has_marker_attribute(MARKER));

        // A field typed with the marker is not an annotation
        let mut plain = ClassFileBuilder::new("p/C");
        plain.field("m", MARKER);
        let class = ParsedClass::parse(&plain.build()).unwrap();
        assert!(!class.has_marker_attribute(MARKER));
    }

    #[test]
    fn test_referenced_class_names() {
        let mut builder = ClassFileBuilder::new("p/A");
        builder
            .interface("p/I")
            .field("xs", "[[Lp/X;")
            .method("m", "(Lp/Y;I)Lp/Z;")
            .field_with_signature("list", "Ljava/util/List;", "Ljava/util/List<Lp/W;>;");
        let class = ParsedClass::parse(&builder.build()).unwrap();
        let names = class.referenced_class_names().unwrap();
        for expected in [
            "p/A",
            "p/I",
            "p/X",
            "p/Y",
            "p/Z",
            "p/W",
            "java/lang/Object",
            "java/util/List",
        ] {
            assert!(names.contains(expected), "missing {expected}: {names:?}");
        }
    }

    #[test]
    fn test_summary() {
        let mut builder = ClassFileBuilder::new("p/A");
        builder.field("f", "I").annotation(MARKER);
        let class = ParsedClass::parse(&builder.build()).unwrap();
        let summary = class.summary(MARKER);
        assert_eq!(summary.name, "p/A");
        assert_eq!(summary.fields, 1);
        assert_eq!(summary.methods, 0);
        assert!(summary.has_marker);
        assert_eq!(summary.constant_pool_count, class.constant_pool.count());
    }
}
