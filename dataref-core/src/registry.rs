//! Typed value store keyed by dataref name.
//!
//! Entries are registered once with a kind and an arity and keep both for
//! their lifetime. Lookups resolve a [`KeyRef`] (name plus optional index)
//! to exactly one entry, or to one element of a byte-array entry.

use core::fmt;

use dataref_proto::{
    coerce, is_valid_name, parse_byte_list, parse_number, types::coerce_byte, Arity, ByteArray,
    KeyRef, Value, ValueKind, MAX_ARRAY_LEN, MAX_KEY_LEN,
};

/// Errors from registering, reading or writing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// An entry with this name already exists.
    DuplicateKey,
    /// Name is empty, too long or uses characters outside `[A-Za-z0-9_]`.
    InvalidKey,
    /// Kind and arity do not fit together, or the array length is out of range.
    InvalidArity,
    /// No room for another entry.
    Full,
    /// No entry with this name.
    UnknownKey,
    /// A scalar read addressed a whole array.
    IndexRequired,
    /// Index outside `[0, N)`.
    IndexOutOfRange,
    /// An index was given for a scalar entry.
    NotAnArray,
    /// The value cannot be converted to the entry's kind.
    TypeMismatch,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey => write!(f, "duplicate key"),
            Self::InvalidKey => write!(f, "invalid key name"),
            Self::InvalidArity => write!(f, "invalid arity for kind"),
            Self::Full => write!(f, "registry full"),
            Self::UnknownKey => write!(f, "unknown key"),
            Self::IndexRequired => write!(f, "index required"),
            Self::IndexOutOfRange => write!(f, "index out of range"),
            Self::NotAnArray => write!(f, "not an array"),
            Self::TypeMismatch => write!(f, "type mismatch"),
        }
    }
}

/// Key name storage.
pub type KeyName = heapless::String<MAX_KEY_LEN>;

/// One registered dataref.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    name: KeyName,
    kind: ValueKind,
    arity: Arity,
    value: Value,
}

impl Entry {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Current value. Byte arrays always hold exactly `arity.len()` elements.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    fn bytes_mut(&mut self) -> Option<&mut ByteArray> {
        match &mut self.value {
            Value::ByteArray(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Where a resolved key points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Whole(usize),
    Element(usize, usize),
}

/// Fixed-capacity registry of up to `N` entries, kept in registration order.
///
/// # Example
///
/// ```
/// use dataref_core::Registry;
/// use dataref_proto::{Arity, KeyRef, Value, ValueKind};
///
/// let mut registry: Registry<8> = Registry::new();
/// registry.register("LED_STATE", ValueKind::ByteArray, Arity::Array(4)).unwrap();
///
/// let key = KeyRef::parse("LED_STATE[3]").unwrap();
/// registry.write(&key, "300").unwrap();
/// assert_eq!(registry.read(&key), Ok(Value::Byte(255)));
/// ```
#[derive(Debug, Default)]
pub struct Registry<const N: usize> {
    entries: heapless::Vec<Entry, N>,
}

impl<const N: usize> Registry<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    /// Register a new entry with a zeroed initial value.
    ///
    /// Scalar kinds need [`Arity::Scalar`]; [`ValueKind::ByteArray`] needs
    /// [`Arity::Array`] with `1..=MAX_ARRAY_LEN` elements.
    pub fn register(
        &mut self,
        name: &str,
        kind: ValueKind,
        arity: Arity,
    ) -> Result<(), RegistryError> {
        self.register_value(name, Value::zeroed(kind, arity.len()), arity)
    }

    /// Register a new entry with an initial value. The arity must match the
    /// value: byte arrays must hold exactly `N` elements for `Array(N)`.
    pub fn register_value(
        &mut self,
        name: &str,
        value: Value,
        arity: Arity,
    ) -> Result<(), RegistryError> {
        if !is_valid_name(name) {
            return Err(RegistryError::InvalidKey);
        }
        let kind = value.kind();
        let arity_ok = match (&value, arity) {
            (Value::ByteArray(bytes), Arity::Array(n)) => {
                (1..=MAX_ARRAY_LEN).contains(&n) && bytes.len() == n
            }
            (Value::ByteArray(_), Arity::Scalar) => false,
            (_, Arity::Scalar) => true,
            (_, Arity::Array(_)) => false,
        };
        if !arity_ok {
            return Err(RegistryError::InvalidArity);
        }
        if self.position(name).is_some() {
            return Err(RegistryError::DuplicateKey);
        }
        let name = KeyName::try_from(name).map_err(|_| RegistryError::InvalidKey)?;
        self.entries
            .push(Entry {
                name,
                kind,
                arity,
                value,
            })
            .map_err(|_| RegistryError::Full)
    }

    /// Read the value addressed by `key`.
    ///
    /// An indexed key yields one [`Value::Byte`]; an unindexed key on an
    /// array yields the whole array.
    pub fn read(&self, key: &KeyRef<'_>) -> Result<Value, RegistryError> {
        match self.resolve(key)? {
            Slot::Whole(pos) => Ok(self.entries[pos].value.clone()),
            Slot::Element(pos, i) => match &self.entries[pos].value {
                Value::ByteArray(bytes) => bytes
                    .get(i)
                    .map(|&b| Value::Byte(b))
                    .ok_or(RegistryError::IndexOutOfRange),
                _ => Err(RegistryError::NotAnArray),
            },
        }
    }

    /// Like [`read`](Self::read), but refuses to return a whole array.
    pub fn read_scalar(&self, key: &KeyRef<'_>) -> Result<Value, RegistryError> {
        if let Slot::Whole(pos) = self.resolve(key)? {
            if self.entries[pos].arity.is_array() {
                return Err(RegistryError::IndexRequired);
            }
        }
        self.read(key)
    }

    /// Write a raw wire value, coercing it to the entry's kind.
    ///
    /// Whole-array writes take `v0,v1,...`, clamp each element to a byte and
    /// write the first `min(count, N)` elements. Elements past `N` are
    /// ignored; any bad element within range rejects the whole write.
    pub fn write(&mut self, key: &KeyRef<'_>, raw: &str) -> Result<(), RegistryError> {
        match self.resolve(key)? {
            Slot::Element(pos, i) => {
                let v = parse_number(raw).map_err(|_| RegistryError::TypeMismatch)?;
                self.store_element(pos, i, coerce_byte(v))
            }
            Slot::Whole(pos) => {
                let entry = &mut self.entries[pos];
                match entry.arity {
                    Arity::Scalar => {
                        entry.value =
                            coerce(raw, entry.kind).map_err(|_| RegistryError::TypeMismatch)?;
                        Ok(())
                    }
                    Arity::Array(n) => {
                        let mut parsed = [0u8; MAX_ARRAY_LEN];
                        let count = parse_byte_list(raw, &mut parsed[..n])
                            .map_err(|_| RegistryError::TypeMismatch)?;
                        store_prefix(entry, &parsed[..count])
                    }
                }
            }
        }
    }

    /// Store a typed value, converting it to the entry's kind.
    ///
    /// Scalars convert between scalar kinds. A whole-array target takes a
    /// [`Value::ByteArray`] with the same prefix rule as [`write`](Self::write).
    pub fn set(&mut self, key: &KeyRef<'_>, value: &Value) -> Result<(), RegistryError> {
        match self.resolve(key)? {
            Slot::Element(pos, i) => match value.coerce_to(ValueKind::Byte) {
                Some(Value::Byte(b)) => self.store_element(pos, i, b),
                _ => Err(RegistryError::TypeMismatch),
            },
            Slot::Whole(pos) => {
                let entry = &mut self.entries[pos];
                match (entry.arity, value) {
                    (Arity::Array(_), Value::ByteArray(bytes)) => store_prefix(entry, bytes),
                    (Arity::Array(_), _) => Err(RegistryError::TypeMismatch),
                    (Arity::Scalar, value) => {
                        entry.value = value
                            .coerce_to(entry.kind)
                            .ok_or(RegistryError::TypeMismatch)?;
                        Ok(())
                    }
                }
            }
        }
    }

    /// Look up an entry by base name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.position(name).map(|pos| &self.entries[pos])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name.as_str() == name)
    }

    fn resolve(&self, key: &KeyRef<'_>) -> Result<Slot, RegistryError> {
        let pos = self
            .position(key.name())
            .ok_or(RegistryError::UnknownKey)?;
        match key.index() {
            None => Ok(Slot::Whole(pos)),
            Some(index) => {
                let Arity::Array(n) = self.entries[pos].arity else {
                    return Err(RegistryError::NotAnArray);
                };
                match usize::try_from(index) {
                    Ok(i) if i < n => Ok(Slot::Element(pos, i)),
                    _ => Err(RegistryError::IndexOutOfRange),
                }
            }
        }
    }

    fn store_element(&mut self, pos: usize, i: usize, byte: u8) -> Result<(), RegistryError> {
        let slot = self.entries[pos]
            .bytes_mut()
            .and_then(|bytes| bytes.get_mut(i))
            .ok_or(RegistryError::IndexOutOfRange)?;
        *slot = byte;
        Ok(())
    }
}

/// Overwrite the first `src.len()` elements of an array entry, ignoring
/// anything past its arity. The remaining elements keep their values.
fn store_prefix(entry: &mut Entry, src: &[u8]) -> Result<(), RegistryError> {
    let bytes = entry.bytes_mut().ok_or(RegistryError::TypeMismatch)?;
    let count = src.len().min(bytes.len());
    bytes[..count].copy_from_slice(&src[..count]);
    Ok(())
}
