//! Typed SNMP values and their rendering into file content.
//!
//! Rendering is type-directed over a closed set of value kinds. Kinds
//! without a renderer produce [`Rendered::Unsupported`], which carries the
//! diagnostic data as a value. A read of such an entry still succeeds and
//! returns [`UnsupportedType::diagnostic`] as its content, so clients see
//! the unhandled type instead of an I/O error.

use std::fmt;
use std::net::Ipv4Addr;

use thiserror::Error;

use crate::oid::Oid;

/// A value delivered by the agent for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    /// OCTET STRING (DisplayString and friends).
    OctetString(Vec<u8>),
    /// INTEGER.
    Integer(i32),
    /// Counter32.
    Counter32(u32),
    /// Counter64.
    Counter64(u64),
    /// Unsigned32 / Gauge32.
    Unsigned32(u32),
    /// TimeTicks, in hundredths of a second.
    TimeTicks(u32),
    /// OBJECT IDENTIFIER, a reference to another identifier.
    ObjectIdentifier(Oid),
    /// IpAddress.
    IpAddress(Ipv4Addr),
    /// Opaque.
    Opaque(Vec<u8>),
}

/// The wire type of a [`SnmpValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    OctetString,
    Integer,
    Counter32,
    Counter64,
    Unsigned32,
    TimeTicks,
    ObjectIdentifier,
    IpAddress,
    Opaque,
}

impl TypeTag {
    /// Returns the SNMP type name.
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::OctetString => "OctetString",
            TypeTag::Integer => "Integer",
            TypeTag::Counter32 => "Counter32",
            TypeTag::Counter64 => "Counter64",
            TypeTag::Unsigned32 => "Unsigned32",
            TypeTag::TimeTicks => "TimeTicks",
            TypeTag::ObjectIdentifier => "ObjectIdentifier",
            TypeTag::IpAddress => "IpAddress",
            TypeTag::Opaque => "Opaque",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SnmpValue {
    /// Returns the wire type of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            SnmpValue::OctetString(_) => TypeTag::OctetString,
            SnmpValue::Integer(_) => TypeTag::Integer,
            SnmpValue::Counter32(_) => TypeTag::Counter32,
            SnmpValue::Counter64(_) => TypeTag::Counter64,
            SnmpValue::Unsigned32(_) => TypeTag::Unsigned32,
            SnmpValue::TimeTicks(_) => TypeTag::TimeTicks,
            SnmpValue::ObjectIdentifier(_) => TypeTag::ObjectIdentifier,
            SnmpValue::IpAddress(_) => TypeTag::IpAddress,
            SnmpValue::Opaque(_) => TypeTag::Opaque,
        }
    }

    /// Returns a human-readable form of the raw value, used in diagnostics.
    pub fn raw_string(&self) -> String {
        match self {
            SnmpValue::OctetString(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            SnmpValue::Integer(v) => v.to_string(),
            SnmpValue::Counter32(v) | SnmpValue::Unsigned32(v) | SnmpValue::TimeTicks(v) => {
                v.to_string()
            }
            SnmpValue::Counter64(v) => v.to_string(),
            SnmpValue::ObjectIdentifier(oid) => oid.to_string(),
            SnmpValue::IpAddress(addr) => addr.to_string(),
            SnmpValue::Opaque(bytes) => hex_bytes(bytes),
        }
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// A cached value whose type has no renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error unknown type: {type_tag} (name={name} value={raw})")]
pub struct UnsupportedType {
    /// The identifier the value belongs to.
    pub name: String,
    /// The raw value, formatted for humans.
    pub raw: String,
    /// The value's wire type.
    pub type_tag: TypeTag,
}

impl UnsupportedType {
    /// Returns the payload served as file content for this entry.
    pub fn diagnostic(&self) -> Vec<u8> {
        format!("{self}\n").into_bytes()
    }
}

/// Outcome of rendering a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// File content for a supported type.
    Content(Vec<u8>),
    /// The type has no renderer.
    Unsupported(UnsupportedType),
}

impl Rendered {
    /// Returns the bytes served to readers.
    ///
    /// Unsupported types yield their diagnostic text.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Rendered::Content(bytes) => bytes,
            Rendered::Unsupported(unsupported) => unsupported.diagnostic(),
        }
    }

    /// Returns true if the value had no renderer.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Rendered::Unsupported(_))
    }
}

/// Renders the value cached under `name`.
///
/// | type | content |
/// |------|---------|
/// | OctetString | the text, then a newline |
/// | Counter32 / Counter64 / TimeTicks | decimal, then a newline |
/// | ObjectIdentifier | the raw arcs in decimal, then a newline |
/// | anything else | [`Rendered::Unsupported`] |
///
/// Object identifiers are printed as their raw arc list (`[1 3 6 1]`), not
/// in dotted notation.
pub fn render(name: &str, value: &SnmpValue) -> Rendered {
    match value {
        SnmpValue::OctetString(bytes) => {
            let mut out = String::from_utf8_lossy(bytes).into_owned().into_bytes();
            out.push(b'\n');
            Rendered::Content(out)
        }
        SnmpValue::Counter32(v) | SnmpValue::TimeTicks(v) => {
            Rendered::Content(format!("{v}\n").into_bytes())
        }
        SnmpValue::Counter64(v) => Rendered::Content(format!("{v}\n").into_bytes()),
        SnmpValue::ObjectIdentifier(oid) => {
            let arcs: Vec<String> = oid.arcs().iter().map(u32::to_string).collect();
            Rendered::Content(format!("[{}]\n", arcs.join(" ")).into_bytes())
        }
        SnmpValue::Integer(_)
        | SnmpValue::Unsigned32(_)
        | SnmpValue::IpAddress(_)
        | SnmpValue::Opaque(_) => Rendered::Unsupported(UnsupportedType {
            name: name.to_string(),
            raw: value.raw_string(),
            type_tag: value.type_tag(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(value: &SnmpValue) -> Vec<u8> {
        render(".1.3.6.1.2.1.1.1.0", value).into_bytes()
    }

    #[test]
    fn test_render_octet_string() {
        let v = SnmpValue::OctetString(b"test-system".to_vec());
        assert_eq!(rendered(&v), b"test-system\n");
    }

    #[test]
    fn test_render_empty_octet_string() {
        let v = SnmpValue::OctetString(Vec::new());
        assert_eq!(rendered(&v), b"\n");
    }

    #[test]
    fn test_render_invalid_utf8_is_lossy() {
        let v = SnmpValue::OctetString(vec![b'a', 0xff, b'b']);
        let out = rendered(&v);
        assert_eq!(String::from_utf8(out).unwrap(), "a\u{fffd}b\n");
    }

    #[test]
    fn test_render_time_ticks() {
        assert_eq!(rendered(&SnmpValue::TimeTicks(12345)), b"12345\n");
    }

    #[test]
    fn test_render_counters() {
        assert_eq!(rendered(&SnmpValue::Counter32(7)), b"7\n");
        assert_eq!(
            rendered(&SnmpValue::Counter64(u64::MAX)),
            format!("{}\n", u64::MAX).as_bytes()
        );
    }

    #[test]
    fn test_render_object_identifier_as_raw_arcs() {
        let oid = Oid::parse(".1.3.6.1.4.1.8072.3.2.10").unwrap();
        let out = rendered(&SnmpValue::ObjectIdentifier(oid));
        assert_eq!(out, b"[1 3 6 1 4 1 8072 3 2 10]\n");
    }

    #[test]
    fn test_render_object_identifier_separators() {
        let out = rendered(&SnmpValue::ObjectIdentifier(Oid::parse(".0").unwrap()));
        assert_eq!(out, b"[0]\n");

        let large = Oid::from_arcs(vec![1, 3, u32::MAX]).unwrap();
        let out = rendered(&SnmpValue::ObjectIdentifier(large));
        assert_eq!(out, format!("[1 3 {}]\n", u32::MAX).as_bytes());
    }

    #[test]
    fn test_render_unsupported_carries_diagnostic() {
        let name = ".1.3.6.1.2.1.2.2.1.1.1";
        let r = render(name, &SnmpValue::Integer(-3));
        let Rendered::Unsupported(ref u) = r else {
            panic!("Integer should have no renderer");
        };
        assert_eq!(u.type_tag, TypeTag::Integer);
        assert_eq!(u.raw, "-3");

        let text = String::from_utf8(r.into_bytes()).unwrap();
        assert!(text.contains(name));
        assert!(text.contains("-3"));
        assert!(text.contains("Integer"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_unsupported_kinds() {
        for v in [
            SnmpValue::Integer(1),
            SnmpValue::Unsigned32(1),
            SnmpValue::IpAddress(Ipv4Addr::new(10, 0, 0, 1)),
            SnmpValue::Opaque(vec![0xde, 0xad]),
        ] {
            assert!(render("x", &v).is_unsupported(), "{v:?} should be unsupported");
        }
    }

    #[test]
    fn test_raw_string_formats() {
        assert_eq!(SnmpValue::IpAddress(Ipv4Addr::new(192, 168, 0, 1)).raw_string(), "192.168.0.1");
        assert_eq!(SnmpValue::Opaque(vec![0x0a, 0xff]).raw_string(), "0a ff");
        assert_eq!(SnmpValue::Unsigned32(42).raw_string(), "42");
    }

    #[test]
    fn test_type_tag_display() {
        assert_eq!(SnmpValue::TimeTicks(0).type_tag().to_string(), "TimeTicks");
        assert_eq!(TypeTag::OctetString.as_str(), "OctetString");
    }
}
