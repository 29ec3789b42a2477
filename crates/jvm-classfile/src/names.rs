//! Class-name remapping inside internal names, descriptors and generic signatures.
//!
//! Matching is always on whole name tokens: a key `p/A` matches the token
//! `p/A` in `Lp/A;` but never the prefix of `p/AB` or `p/A$Inner`.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::warn;

/// Lookup from an internal class name to its replacement.
pub trait NameMapper {
    fn map_name(&self, name: &str) -> Option<&str>;
}

impl NameMapper for BTreeMap<String, String> {
    fn map_name(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl NameMapper for HashMap<String, String> {
    fn map_name(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Single-entry mapping, used for a class's self rename.
#[derive(Debug, Clone, Copy)]
pub struct SingleName<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

impl NameMapper for SingleName<'_> {
    fn map_name(&self, name: &str) -> Option<&str> {
        (name == self.from).then_some(self.to)
    }
}

/// Records every name it is asked about and never maps anything.
#[derive(Default)]
struct NameCollector {
    names: RefCell<BTreeSet<String>>,
}

impl NameMapper for NameCollector {
    fn map_name(&self, name: &str) -> Option<&str> {
        self.names.borrow_mut().insert(name.to_string());
        None
    }
}

/// How a `CONSTANT_Utf8` value is interpreted at a given reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameRole {
    /// Target of a `CONSTANT_Class`: an internal name or an array descriptor
    ClassName,
    /// Field or method descriptor
    Descriptor,
    /// Generic signature
    Signature,
}

impl NameRole {
    /// Rewritten value, or `None` when nothing in `value` is mapped.
    pub fn remap<M: NameMapper + ?Sized>(self, value: &str, mapper: &M) -> Option<String> {
        match self {
            NameRole::ClassName if value.starts_with('[') => remap_descriptor(value, mapper),
            NameRole::ClassName => mapper
                .map_name(value)
                .filter(|mapped| *mapped != value)
                .map(str::to_string),
            NameRole::Descriptor => remap_descriptor(value, mapper),
            NameRole::Signature => match remap_signature(value, mapper) {
                Ok(remapped) => remapped,
                Err(MalformedSignature { position }) => {
                    warn!(signature = value, position, "unparseable signature left unchanged");
                    None
                }
            },
        }
    }

    /// Add every class name `value` mentions in this role to `names`.
    pub fn collect_names(self, value: &str, names: &mut BTreeSet<String>) {
        let collector = NameCollector::default();
        match self {
            NameRole::Signature => {
                // a partial parse still reports the names seen so far
                let _ = remap_signature(value, &collector);
            }
            role => {
                role.remap(value, &collector);
            }
        }
        names.extend(collector.names.into_inner());
    }
}

/// Rewrite the class names inside a field or method descriptor.
///
/// Returns `None` when nothing changed or when an object type is missing its
/// terminating `;`.
pub fn remap_descriptor<M: NameMapper + ?Sized>(desc: &str, mapper: &M) -> Option<String> {
    let mut out = String::with_capacity(desc.len() + 16);
    let mut changed = false;
    let mut rest = desc;
    while let Some(pos) = rest.find('L') {
        out.push_str(&rest[..=pos]);
        let after = &rest[pos + 1..];
        let end = after.find(';')?;
        let name = &after[..end];
        match mapper.map_name(name) {
            Some(mapped) if mapped != name => {
                out.push_str(mapped);
                changed = true;
            }
            _ => out.push_str(name),
        }
        out.push(';');
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    changed.then_some(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedSignature {
    pub position: usize,
}

/// Rewrite the class names inside a class, method or field signature.
///
/// Inner class segments (`Lp/Outer<TT;>.Inner;`) are looked up by their full
/// binary name `p/Outer$Inner`; the emitted segment is the simple name of the
/// mapped class.
pub fn remap_signature<M: NameMapper + ?Sized>(
    sig: &str,
    mapper: &M,
) -> Result<Option<String>, MalformedSignature> {
    let mut parser = SignatureParser {
        sig,
        pos: 0,
        out: String::with_capacity(sig.len() + 16),
        changed: false,
        mapper,
    };
    parser.signature()?;
    Ok(parser.changed.then_some(parser.out))
}

struct SignatureParser<'s, 'm, M: ?Sized> {
    sig: &'s str,
    pos: usize,
    out: String,
    changed: bool,
    mapper: &'m M,
}

impl<'s, M: NameMapper + ?Sized> SignatureParser<'s, '_, M> {
    fn error(&self) -> MalformedSignature {
        MalformedSignature { position: self.pos }
    }

    fn peek(&self) -> Option<u8> {
        self.sig.as_bytes().get(self.pos).copied()
    }

    fn expect_peek(&self) -> Result<u8, MalformedSignature> {
        self.peek().ok_or_else(|| self.error())
    }

    fn copy(&mut self, n: usize) {
        self.out.push_str(&self.sig[self.pos..self.pos + n]);
        self.pos += n;
    }

    /// Consume up to (not including) the first of `stops`.
    fn take_until(&mut self, stops: &[u8]) -> Result<&'s str, MalformedSignature> {
        let sig: &'s str = self.sig;
        let rest = &sig.as_bytes()[self.pos..];
        let len = rest
            .iter()
            .position(|b| stops.contains(b))
            .ok_or_else(|| self.error())?;
        let token = &sig[self.pos..self.pos + len];
        self.pos += len;
        Ok(token)
    }

    fn signature(&mut self) -> Result<(), MalformedSignature> {
        if self.peek() == Some(b'<') {
            self.formal_type_parameters()?;
        }
        if self.peek() == Some(b'(') {
            self.copy(1);
            while self.expect_peek()? != b')' {
                self.type_signature()?;
            }
            self.copy(1);
            self.type_signature()?;
            while self.peek() == Some(b'^') {
                self.copy(1);
                self.type_signature()?;
            }
        } else {
            if self.peek().is_none() {
                return Err(self.error());
            }
            while self.peek().is_some() {
                self.type_signature()?;
            }
        }
        if self.pos != self.sig.len() {
            return Err(self.error());
        }
        Ok(())
    }

    fn formal_type_parameters(&mut self) -> Result<(), MalformedSignature> {
        self.copy(1);
        while self.expect_peek()? != b'>' {
            let ident = self.take_until(b":")?;
            if ident.is_empty() {
                return Err(self.error());
            }
            self.out.push_str(ident);
            while self.peek() == Some(b':') {
                self.copy(1);
                if matches!(self.peek(), Some(b'L' | b'T' | b'[')) {
                    self.type_signature()?;
                }
            }
        }
        self.copy(1);
        Ok(())
    }

    fn type_signature(&mut self) -> Result<(), MalformedSignature> {
        match self.expect_peek()? {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V' => {
                self.copy(1);
                Ok(())
            }
            b'[' => {
                self.copy(1);
                self.type_signature()
            }
            b'T' => {
                self.copy(1);
                let var = self.take_until(b";")?;
                self.out.push_str(var);
                self.copy(1);
                Ok(())
            }
            b'L' => self.class_type_signature(),
            _ => Err(self.error()),
        }
    }

    fn class_type_signature(&mut self) -> Result<(), MalformedSignature> {
        self.copy(1);
        let name = self.take_until(b"<.;")?;
        let mut original = name.to_string();
        let mut mapped_outer = match self.mapper.map_name(name) {
            Some(mapped) if mapped != name => {
                self.changed = true;
                mapped.to_string()
            }
            _ => name.to_string(),
        };
        self.out.push_str(&mapped_outer);

        loop {
            match self.expect_peek()? {
                b'<' => self.type_arguments()?,
                b'.' => {
                    self.copy(1);
                    let inner = self.take_until(b"<.;")?;
                    original = format!("{}${}", original, inner);
                    match self.mapper.map_name(&original) {
                        Some(mapped) => {
                            let prefix = format!("{}$", mapped_outer);
                            let simple = match mapped.strip_prefix(prefix.as_str()) {
                                Some(simple) => simple,
                                None => mapped.rsplit('$').next().unwrap_or(mapped),
                            };
                            if simple != inner {
                                self.changed = true;
                            }
                            self.out.push_str(simple);
                            mapped_outer = mapped.to_string();
                        }
                        None => {
                            self.out.push_str(inner);
                            mapped_outer = format!("{}${}", mapped_outer, inner);
                        }
                    }
                }
                b';' => {
                    self.copy(1);
                    return Ok(());
                }
                _ => return Err(self.error()),
            }
        }
    }

    fn type_arguments(&mut self) -> Result<(), MalformedSignature> {
        self.copy(1);
        while self.expect_peek()? != b'>' {
            match self.expect_peek()? {
                b'*' => self.copy(1),
                b'+' | b'-' => {
                    self.copy(1);
                    self.type_signature()?;
                }
                _ => self.type_signature()?,
            }
        }
        self.copy(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_descriptor_remap() {
        let map = table(&[("p/A", "tag/p/A")]);
        assert_eq!(
            remap_descriptor("(Lp/A;I[Lp/A;)Lp/A;", &map).as_deref(),
            Some("(Ltag/p/A;I[Ltag/p/A;)Ltag/p/A;")
        );
        assert_eq!(remap_descriptor("(IJ)V", &map), None);
        assert_eq!(remap_descriptor("Lp/B;", &map), None);
    }

    #[test]
    fn test_descriptor_does_not_match_substrings() {
        let map = table(&[("p/A", "tag/p/A")]);
        assert_eq!(remap_descriptor("Lp/AB;", &map), None);
        assert_eq!(remap_descriptor("Lp/A$Inner;", &map), None);
        assert_eq!(remap_descriptor("Lxp/A;", &map), None);
    }

    #[test]
    fn test_descriptor_without_terminator_is_left_alone() {
        let map = table(&[("p/A", "tag/p/A")]);
        assert_eq!(remap_descriptor("Lp/A", &map), None);
    }

    #[test]
    fn test_class_name_role() {
        let map = table(&[("p/A", "tag/p/A")]);
        assert_eq!(
            NameRole::ClassName.remap("p/A", &map).as_deref(),
            Some("tag/p/A")
        );
        assert_eq!(
            NameRole::ClassName.remap("[[Lp/A;", &map).as_deref(),
            Some("[[Ltag/p/A;")
        );
        assert_eq!(NameRole::ClassName.remap("p/AB", &map), None);
    }

    #[test]
    fn test_single_name_mapper() {
        let single = SingleName {
            from: "p/A",
            to: "v1/p/A",
        };
        assert_eq!(
            NameRole::Descriptor.remap("(Lp/A;Lp/B;)V", &single).as_deref(),
            Some("(Lv1/p/A;Lp/B;)V")
        );
    }

    #[test]
    fn test_signature_generic_arguments() {
        let map = table(&[("p/A", "t/p/A"), ("p/B", "t/p/B")]);
        let remapped =
            remap_signature("Ljava/util/Map<Lp/A;Ljava/util/List<+Lp/B;>;>;", &map).unwrap();
        assert_eq!(
            remapped.as_deref(),
            Some("Ljava/util/Map<Lt/p/A;Ljava/util/List<+Lt/p/B;>;>;")
        );
    }

    #[test]
    fn test_signature_type_variables_are_not_class_names() {
        // type variable named like a mapped class
        let map = table(&[("A", "t/A"), ("L", "t/L")]);
        let sig = "<L:Ljava/lang/Object;A::Ljava/lang/Comparable<TL;>;>(TA;[TL;)TA;";
        assert_eq!(remap_signature(sig, &map).unwrap(), None);
    }

    #[test]
    fn test_class_signature_with_bounds_and_interfaces() {
        let map = table(&[("p/Base", "t/p/Base"), ("p/I", "t/p/I")]);
        let sig = "<T:Lp/Base;>Lp/Base;Lp/I<TT;>;";
        assert_eq!(
            remap_signature(sig, &map).unwrap().as_deref(),
            Some("<T:Lt/p/Base;>Lt/p/Base;Lt/p/I<TT;>;")
        );
    }

    #[test]
    fn test_method_signature_with_throws() {
        let map = table(&[("p/E", "t/p/E")]);
        let sig = "<X:Ljava/lang/Object;>(TX;*)V^Lp/E;^TX;";
        // `*` is only valid inside type arguments
        assert!(remap_signature(sig, &map).is_err());

        let sig = "<X:Ljava/lang/Object;>(TX;Ljava/util/List<*>;)V^Lp/E;";
        assert_eq!(
            remap_signature(sig, &map).unwrap().as_deref(),
            Some("<X:Ljava/lang/Object;>(TX;Ljava/util/List<*>;)V^Lt/p/E;")
        );
    }

    #[test]
    fn test_signature_inner_class_segments() {
        let map = table(&[("p/Outer", "t/p/Outer"), ("p/Outer$Inner", "t/p/Outer$Inner")]);
        let sig = "Lp/Outer<Ljava/lang/String;>.Inner<Ljava/lang/Integer;>;";
        assert_eq!(
            remap_signature(sig, &map).unwrap().as_deref(),
            Some("Lt/p/Outer<Ljava/lang/String;>.Inner<Ljava/lang/Integer;>;")
        );

        // only the outer class is mapped: the inner simple name stays
        let map = table(&[("p/Outer", "t/p/Outer")]);
        assert_eq!(
            remap_signature("Lp/Outer<TT;>.Inner;", &map).unwrap().as_deref(),
            Some("Lt/p/Outer<TT;>.Inner;")
        );

        // renamed inner class
        let map = table(&[("p/Outer$Inner", "p/Outer$Renamed")]);
        assert_eq!(
            remap_signature("Lp/Outer<TT;>.Inner;", &map).unwrap().as_deref(),
            Some("Lp/Outer<TT;>.Renamed;")
        );
    }

    #[test]
    fn test_malformed_signature() {
        let map = table(&[]);
        assert!(remap_signature("Lp/A", &map).is_err());
        assert!(remap_signature("", &map).is_err());
        assert!(remap_signature("Q", &map).is_err());
        assert_eq!(NameRole::Signature.remap("Lp/A", &map), None);
    }

    #[test]
    fn test_collect_names() {
        let mut names = BTreeSet::new();
        NameRole::Signature.collect_names("Lp/Outer<Lp/A;>.Inner;", &mut names);
        NameRole::Descriptor.collect_names("([Lp/B;)V", &mut names);
        NameRole::ClassName.collect_names("p/C", &mut names);
        let expected: BTreeSet<String> = ["p/Outer", "p/A", "p/Outer$Inner", "p/B", "p/C"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, expected);
    }
}
