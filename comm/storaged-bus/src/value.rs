//! Typed values exchanged with the daemon.
//!
//! Every property and method argument on the bus carries a type signature.
//! [`Value`] keeps enough of that type to re-encode arguments, while the
//! comparison helpers ([`Value::loosely_eq`], [`Value::loose_cmp`]) compare
//! across integer widths and string-like kinds, which is what assertions on
//! daemon state need.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use storaged_constants::bus::NULL_PATH;

/// A typed bus value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    Str(String),
    ObjectPath(String),
    /// Byte array (`ay`). Strings passed this way are NUL-terminated.
    Bytes(Vec<u8>),
    /// Homogeneous array with an explicit element signature.
    Array { element: String, items: Vec<Value> },
    /// Struct (tuple) of values.
    Struct(Vec<Value>),
    /// String-keyed dictionary, encoded as `a{sv}`.
    Dict(BTreeMap<String, Value>),
    /// Explicit variant wrapper, only needed when building arguments.
    Variant(Box<Value>),
}

impl Value {
    /// Object path value.
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self::ObjectPath(path.into())
    }

    /// The null object path (`/`).
    #[must_use]
    pub fn null_path() -> Self {
        Self::ObjectPath(NULL_PATH.to_string())
    }

    /// NUL-terminated byte string, the daemon's encoding for file paths and NQNs.
    #[must_use]
    pub fn bytes_z(s: &str) -> Self {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        Self::Bytes(bytes)
    }

    /// Array with the given element signature.
    #[must_use]
    pub fn array(element: impl Into<String>, items: Vec<Value>) -> Self {
        Self::Array {
            element: element.into(),
            items,
        }
    }

    /// Array of object paths (`ao`).
    #[must_use]
    pub fn paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::array("o", paths.into_iter().map(Self::path).collect())
    }

    /// Option dictionary (`a{sv}`).
    #[must_use]
    pub fn dict<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// An empty option dictionary.
    #[must_use]
    pub fn no_options() -> Self {
        Self::Dict(BTreeMap::new())
    }

    /// Returns the bus type signature of this value.
    #[must_use]
    pub fn signature(&self) -> String {
        match self {
            Self::Bool(_) => "b".into(),
            Self::Byte(_) => "y".into(),
            Self::Int16(_) => "n".into(),
            Self::UInt16(_) => "q".into(),
            Self::Int32(_) => "i".into(),
            Self::UInt32(_) => "u".into(),
            Self::Int64(_) => "x".into(),
            Self::UInt64(_) => "t".into(),
            Self::Double(_) => "d".into(),
            Self::Str(_) => "s".into(),
            Self::ObjectPath(_) => "o".into(),
            Self::Bytes(_) => "ay".into(),
            Self::Array { element, .. } => format!("a{element}"),
            Self::Struct(fields) => {
                let inner: String = fields.iter().map(Self::signature).collect();
                format!("({inner})")
            }
            Self::Dict(_) => "a{sv}".into(),
            Self::Variant(_) => "v".into(),
        }
    }

    /// Strips any variant wrappers.
    #[must_use]
    pub fn unwrapped(&self) -> &Self {
        match self {
            Self::Variant(inner) => inner.unwrapped(),
            other => other,
        }
    }

    /// Integer view across all integer widths.
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        match self.unwrapped() {
            Self::Byte(v) => Some(i128::from(*v)),
            Self::Int16(v) => Some(i128::from(*v)),
            Self::UInt16(v) => Some(i128::from(*v)),
            Self::Int32(v) => Some(i128::from(*v)),
            Self::UInt32(v) => Some(i128::from(*v)),
            Self::Int64(v) => Some(i128::from(*v)),
            Self::UInt64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|v| u64::try_from(v).ok())
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self.unwrapped() {
            Self::Double(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            other => other.as_i128().map(|v| v as f64),
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.unwrapped() {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String view of `s` and `o` values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.unwrapped() {
            Self::Str(s) | Self::ObjectPath(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self.unwrapped() {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Items of an array or fields of a struct.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self.unwrapped() {
            Self::Array { items, .. } => Some(items),
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_dict(&self) -> Option<&BTreeMap<String, Value>> {
        match self.unwrapped() {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Text view: strings as-is, byte strings decoded with the trailing NUL removed.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self.unwrapped() {
            Self::Str(s) | Self::ObjectPath(s) => Some(s.clone()),
            Self::Bytes(b) => {
                let end = b.iter().position(|&c| c == 0).unwrap_or(b.len());
                Some(String::from_utf8_lossy(&b[..end]).into_owned())
            }
            _ => None,
        }
    }

    /// True for the null object path.
    #[must_use]
    pub fn is_null_path(&self) -> bool {
        matches!(self.unwrapped(), Self::ObjectPath(p) if p == NULL_PATH)
    }

    /// Number of elements in a container value, `None` for scalars.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self.unwrapped() {
            Self::Str(s) | Self::ObjectPath(s) => Some(s.len()),
            Self::Bytes(b) => Some(b.len()),
            Self::Array { items, .. } => Some(items.len()),
            Self::Struct(fields) => Some(fields.len()),
            Self::Dict(d) => Some(d.len()),
            _ => None,
        }
    }

    /// Truthiness: `false`, zero, and empty containers are false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self.unwrapped() {
            Self::Bool(b) => *b,
            Self::Double(d) => *d != 0.0,
            other => match other.as_i128() {
                Some(n) => n != 0,
                None => other.len().is_some_and(|n| n > 0),
            },
        }
    }

    /// Equality that ignores integer width, `s`/`o` distinction and variant wrapping.
    ///
    /// Byte arrays compare equal to arrays of integers with the same elements.
    #[must_use]
    pub fn loosely_eq(&self, other: &Value) -> bool {
        let (a, b) = (self.unwrapped(), other.unwrapped());
        if let (Some(x), Some(y)) = (a.as_i128(), b.as_i128()) {
            return x == y;
        }
        if let (Self::Double(_), _) | (_, Self::Double(_)) = (a, b) {
            return matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y);
        }
        if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
            return x == y;
        }
        match (a, b) {
            (Self::Bool(x), Self::Bool(y)) => x == y,
            (Self::Bytes(x), Self::Bytes(y)) => x == y,
            (Self::Bytes(bytes), other) | (other, Self::Bytes(bytes)) => {
                other.as_slice().is_some_and(|items| {
                    items.len() == bytes.len()
                        && items
                            .iter()
                            .zip(bytes)
                            .all(|(v, b)| v.as_i128() == Some(i128::from(*b)))
                })
            }
            (Self::Dict(x), Self::Dict(y)) => {
                x.len() == y.len()
                    && x
                        .iter()
                        .all(|(k, v)| y.get(k).is_some_and(|w| v.loosely_eq(w)))
            }
            _ => match (a.as_slice(), b.as_slice()) {
                (Some(x), Some(y)) => {
                    x.len() == y.len() && x.iter().zip(y).all(|(v, w)| v.loosely_eq(w))
                }
                _ => false,
            },
        }
    }

    /// Ordering across numeric kinds, or lexicographic for strings.
    #[must_use]
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        let (a, b) = (self.unwrapped(), other.unwrapped());
        if let (Some(x), Some(y)) = (a.as_i128(), b.as_i128()) {
            return Some(x.cmp(&y));
        }
        if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
            return x.partial_cmp(&y);
        }
        match (a.as_str(), b.as_str()) {
            (Some(x), Some(y)) => Some(x.cmp(y)),
            _ => None,
        }
    }

    /// Containment: substring for text, element for arrays, key for dictionaries,
    /// subsequence for byte strings.
    #[must_use]
    pub fn contains(&self, needle: &Value) -> bool {
        match self.unwrapped() {
            Self::Str(s) | Self::ObjectPath(s) => needle.to_text().is_some_and(|n| s.contains(&n)),
            Self::Bytes(haystack) => match needle.unwrapped() {
                Self::Bytes(n) if n.is_empty() => true,
                Self::Bytes(n) => haystack.windows(n.len()).any(|w| w == n.as_slice()),
                other => other
                    .as_i128()
                    .is_some_and(|b| haystack.iter().any(|h| i128::from(*h) == b)),
            },
            Self::Dict(d) => needle.as_str().is_some_and(|k| d.contains_key(k)),
            other => other
                .as_slice()
                .is_some_and(|items| items.iter().any(|v| v.loosely_eq(needle))),
        }
    }

    /// Prefix test on the text view.
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.to_text().is_some_and(|t| t.starts_with(prefix))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::ObjectPath(p) => write!(f, "{p}"),
            Self::Bytes(b) => match self.to_text() {
                Some(t) if b.last() == Some(&0) && t.chars().all(|c| !c.is_control()) => {
                    write!(f, "b{t:?}")
                }
                _ => write!(f, "{b:?}"),
            },
            Self::Array { items, .. } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Struct(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
            Self::Dict(d) => {
                f.write_str("{")?;
                for (i, (k, v)) in d.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Variant(inner) => write!(f, "<{inner}>"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f64 => Double,
    String => Str,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Self::Str(v.clone())
    }
}
