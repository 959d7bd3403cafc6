//! Core value types: ValueKind, Arity, Value, and the numeric coercion rules.

use core::fmt;

/// Maximum number of elements in a byte-array value.
pub const MAX_ARRAY_LEN: usize = 64;

/// Fixed-capacity storage for byte-array values.
pub type ByteArray = heapless::Vec<u8, MAX_ARRAY_LEN>;

/// Type tag of a registry entry or value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Byte,
    ByteArray,
}

impl ValueKind {
    /// Canonical wire name, as used by `READ`, `WRITE` and `LIST`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Byte => "byte",
            Self::ByteArray => "bytes",
        }
    }

    /// Look up a kind by its wire name (case-insensitive, common aliases accepted).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        const ALIASES: &[(&str, ValueKind)] = &[
            ("bool", ValueKind::Bool),
            ("boolean", ValueKind::Bool),
            ("int", ValueKind::Int),
            ("integer", ValueKind::Int),
            ("float", ValueKind::Float),
            ("byte", ValueKind::Byte),
            ("uint8", ValueKind::Byte),
            ("bytes", ValueKind::ByteArray),
            ("array", ValueKind::ByteArray),
            ("byte_array", ValueKind::ByteArray),
        ];
        ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|&(_, kind)| kind)
    }

    /// Whether values of this kind are arrays.
    #[inline]
    #[must_use]
    pub const fn is_array(self) -> bool {
        matches!(self, Self::ByteArray)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of a registry entry: a single value or a fixed-length array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Arity {
    Scalar,
    Array(usize),
}

impl Arity {
    /// Number of addressable elements (1 for scalars).
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Array(n) => n,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_array(self) -> bool {
        matches!(self, Self::Array(_))
    }
}

/// A typed protocol value.
///
/// Displays in its wire form: booleans as `1`/`0`, numbers in decimal and
/// byte arrays as a comma-separated list.
///
/// # Example
///
/// ```
/// use dataref_proto::Value;
///
/// let v = Value::from_bytes(&[1, 2, 255]).unwrap();
/// assert_eq!(format!("{}", v), "1,2,255");
/// assert_eq!(format!("{}", Value::Bool(true)), "1");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Byte(u8),
    ByteArray(ByteArray),
}

impl Value {
    /// The kind tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Byte(_) => ValueKind::Byte,
            Self::ByteArray(_) => ValueKind::ByteArray,
        }
    }

    /// Zero value for the given kind. Byte arrays get `len` zeroed elements.
    #[must_use]
    pub fn zeroed(kind: ValueKind, len: usize) -> Self {
        match kind {
            ValueKind::Bool => Self::Bool(false),
            ValueKind::Int => Self::Int(0),
            ValueKind::Float => Self::Float(0.0),
            ValueKind::Byte => Self::Byte(0),
            ValueKind::ByteArray => {
                let mut bytes = ByteArray::new();
                bytes.resize(len.min(MAX_ARRAY_LEN), 0).ok();
                Self::ByteArray(bytes)
            }
        }
    }

    /// Build a byte-array value. Returns `None` if `bytes` exceeds [`MAX_ARRAY_LEN`].
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        ByteArray::from_slice(bytes).ok().map(Self::ByteArray)
    }

    /// Numeric view of a scalar value. Byte arrays have none.
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(i as f32),
            Self::Float(f) => Some(f),
            Self::Byte(b) => Some(f32::from(b)),
            Self::ByteArray(_) => None,
        }
    }

    /// Convert this value to another kind using the wire coercion rules.
    ///
    /// Scalars convert freely between scalar kinds. Byte arrays only
    /// convert to themselves, and no scalar converts to a byte array.
    #[must_use]
    pub fn coerce_to(&self, kind: ValueKind) -> Option<Self> {
        if self.kind() == kind {
            return Some(self.clone());
        }
        if let Self::Int(i) = *self {
            // Avoid the f32 round trip for large integers
            return match kind {
                ValueKind::Bool => Some(Self::Bool(i > 0)),
                ValueKind::Byte => Some(Self::Byte(i.clamp(0, 255) as u8)),
                ValueKind::Float => Some(Self::Float(i as f32)),
                _ => None,
            };
        }
        let v = self.as_f32()?;
        match kind {
            ValueKind::Bool => Some(Self::Bool(coerce_bool(v))),
            ValueKind::Int => Some(Self::Int(coerce_int(v))),
            ValueKind::Float => Some(Self::Float(v)),
            ValueKind::Byte => Some(Self::Byte(coerce_byte(v))),
            ValueKind::ByteArray => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Byte(b) => write!(f, "{}", b),
            Self::ByteArray(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// Error converting a wire value string to a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoerceError {
    /// The string is not a number (or `true`/`false`).
    NotANumber,
    /// The number is NaN or infinite.
    NotFinite,
    /// Byte arrays cannot be built from a single scalar string.
    ArrayKind,
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber => write!(f, "not a number"),
            Self::NotFinite => write!(f, "not a finite number"),
            Self::ArrayKind => write!(f, "array kind needs a value list"),
        }
    }
}

/// Parse a wire value as a float.
///
/// Accepts decimal integers, decimal floats and the words `true`/`false`.
pub fn parse_number(raw: &str) -> Result<f32, CoerceError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        return Ok(1.0);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Ok(0.0);
    }
    let v: f32 = raw.parse().map_err(|_| CoerceError::NotANumber)?;
    if !v.is_finite() {
        return Err(CoerceError::NotFinite);
    }
    Ok(v)
}

/// `bool = v > 0.5`
#[inline]
#[must_use]
pub fn coerce_bool(v: f32) -> bool {
    v > 0.5
}

/// `byte = clamp(round(v), 0, 255)`
#[inline]
#[must_use]
pub fn coerce_byte(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 255.0) + 0.5) as u8
}

/// Round half away from zero, saturating at the i32 range.
#[inline]
#[must_use]
pub fn coerce_int(v: f32) -> i32 {
    if v >= 0.0 {
        (v + 0.5) as i32
    } else {
        (v - 0.5) as i32
    }
}

/// Coerce a wire value string to a scalar value of the given kind.
///
/// Integer strings are parsed exactly for [`ValueKind::Int`]; everything
/// else goes through the float representation.
pub fn coerce(raw: &str, kind: ValueKind) -> Result<Value, CoerceError> {
    if kind == ValueKind::Int {
        if let Ok(i) = raw.trim().parse::<i32>() {
            return Ok(Value::Int(i));
        }
    }
    let v = parse_number(raw)?;
    match kind {
        ValueKind::Bool => Ok(Value::Bool(coerce_bool(v))),
        ValueKind::Int => Ok(Value::Int(coerce_int(v))),
        ValueKind::Float => Ok(Value::Float(v)),
        ValueKind::Byte => Ok(Value::Byte(coerce_byte(v))),
        ValueKind::ByteArray => Err(CoerceError::ArrayKind),
    }
}

/// Parse a comma-separated byte list into `out`, clamping each element.
///
/// At most `out.len()` elements are parsed; anything after that is ignored
/// without being inspected. Returns the number of elements parsed. `out` is
/// left in an unspecified state on error.
pub fn parse_byte_list(raw: &str, out: &mut [u8]) -> Result<usize, CoerceError> {
    let mut count = 0;
    for (slot, part) in out.iter_mut().zip(raw.split(',')) {
        *slot = coerce_byte(parse_number(part)?);
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_bool_threshold() {
        assert_eq!(coerce("1.0", ValueKind::Bool), Ok(Value::Bool(true)));
        assert_eq!(coerce("0.5", ValueKind::Bool), Ok(Value::Bool(false)));
        assert_eq!(coerce("0.51", ValueKind::Bool), Ok(Value::Bool(true)));
        assert_eq!(coerce("true", ValueKind::Bool), Ok(Value::Bool(true)));
        assert_eq!(coerce("-3", ValueKind::Bool), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_coerce_byte_clamps_and_rounds() {
        assert_eq!(coerce("300", ValueKind::Byte), Ok(Value::Byte(255)));
        assert_eq!(coerce("-5", ValueKind::Byte), Ok(Value::Byte(0)));
        assert_eq!(coerce("127.5", ValueKind::Byte), Ok(Value::Byte(128)));
        assert_eq!(coerce("127.4", ValueKind::Byte), Ok(Value::Byte(127)));
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce("2147483647", ValueKind::Int), Ok(Value::Int(i32::MAX)));
        assert_eq!(coerce("-42", ValueKind::Int), Ok(Value::Int(-42)));
        assert_eq!(coerce("2.5", ValueKind::Int), Ok(Value::Int(3)));
        assert_eq!(coerce("-2.5", ValueKind::Int), Ok(Value::Int(-3)));
        assert_eq!(coerce("1e12", ValueKind::Int), Ok(Value::Int(i32::MAX)));
    }

    #[test]
    fn test_coerce_rejects_garbage() {
        assert_eq!(coerce("abc", ValueKind::Float), Err(CoerceError::NotANumber));
        assert_eq!(coerce("", ValueKind::Byte), Err(CoerceError::NotANumber));
        assert_eq!(coerce("inf", ValueKind::Float), Err(CoerceError::NotFinite));
        assert_eq!(coerce("1", ValueKind::ByteArray), Err(CoerceError::ArrayKind));
    }

    #[test]
    fn test_parse_byte_list_ignores_surplus() {
        let mut out = [0u8; 3];
        assert_eq!(parse_byte_list("1,2,300,4,5", &mut out), Ok(3));
        assert_eq!(out, [1, 2, 255]);

        // Surplus elements are not even validated
        let mut out = [0u8; 2];
        assert_eq!(parse_byte_list("7,8,garbage", &mut out), Ok(2));
        assert_eq!(out, [7, 8]);
    }

    #[test]
    fn test_parse_byte_list_partial() {
        let mut out = [9u8; 4];
        assert_eq!(parse_byte_list("1,2", &mut out), Ok(2));
        assert_eq!(out, [1, 2, 9, 9]);
        assert_eq!(parse_byte_list("1,,2", &mut out), Err(CoerceError::NotANumber));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Bool(false)), "0");
        assert_eq!(format!("{}", Value::Int(-7)), "-7");
        assert_eq!(format!("{}", Value::Float(1.5)), "1.5");
        assert_eq!(format!("{}", Value::Byte(255)), "255");
        assert_eq!(format!("{}", Value::zeroed(ValueKind::ByteArray, 3)), "0,0,0");
    }

    #[test]
    fn test_value_coerce_to() {
        assert_eq!(Value::Bool(true).coerce_to(ValueKind::Float), Some(Value::Float(1.0)));
        assert_eq!(Value::Int(300).coerce_to(ValueKind::Byte), Some(Value::Byte(255)));
        assert_eq!(Value::Float(0.7).coerce_to(ValueKind::Bool), Some(Value::Bool(true)));
        assert_eq!(Value::Byte(3).coerce_to(ValueKind::ByteArray), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ValueKind::from_name("BOOL"), Some(ValueKind::Bool));
        assert_eq!(ValueKind::from_name("uint8"), Some(ValueKind::Byte));
        assert_eq!(ValueKind::from_name("bytes"), Some(ValueKind::ByteArray));
        assert_eq!(ValueKind::from_name("string"), None);
        for kind in [ValueKind::Bool, ValueKind::Int, ValueKind::Float, ValueKind::Byte, ValueKind::ByteArray] {
            assert_eq!(ValueKind::from_name(kind.name()), Some(kind));
        }
    }
}
