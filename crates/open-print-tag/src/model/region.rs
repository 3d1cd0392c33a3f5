//! Regions: sparse typed fields plus unknown-key passthrough.
//!
//! Each region struct is generated by [`region_schema!`] from a field table,
//! which yields both the typed `Option` fields and a static descriptor list
//! that the codec, validator and merge engine iterate instead of
//! inspecting types at runtime.

use std::fmt;

use crate::error::FieldError;
use crate::model::field::{FieldDescriptor, FieldValue};
use crate::model::value::Value;

/// Which of the three tag regions a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Meta,
    Main,
    Aux,
}

impl RegionKind {
    pub fn name(self) -> &'static str {
        match self {
            RegionKind::Meta => "meta",
            RegionKind::Main => "main",
            RegionKind::Aux => "aux",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CBOR container form used when encoding a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerForm {
    /// Length-prefixed maps and arrays.
    Definite,
    /// Break-terminated maps and arrays.
    Indefinite,
    /// Indefinite, except that an empty region becomes a one-byte empty map.
    Auto,
}

/// Maximum precision floats are rounded to before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatPrecision {
    P64,
    P32,
    P16,
}

/// Per-region encoding policy.
///
/// Options are not stored on the wire; a decoded region always carries its
/// kind's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionOptions {
    pub container: ContainerForm,
    pub float_precision: FloatPrecision,
}

impl RegionOptions {
    pub const META: RegionOptions = RegionOptions {
        container: ContainerForm::Definite,
        float_precision: FloatPrecision::P32,
    };

    pub const MAIN: RegionOptions = RegionOptions {
        container: ContainerForm::Auto,
        float_precision: FloatPrecision::P32,
    };

    pub const AUX: RegionOptions = RegionOptions {
        container: ContainerForm::Auto,
        float_precision: FloatPrecision::P32,
    };

    /// Returns the default options for a region kind.
    pub fn default_for(kind: RegionKind) -> RegionOptions {
        match kind {
            RegionKind::Meta => Self::META,
            RegionKind::Main => Self::MAIN,
            RegionKind::Aux => Self::AUX,
        }
    }

    pub fn with_container(mut self, container: ContainerForm) -> Self {
        self.container = container;
        self
    }

    pub fn with_float_precision(mut self, precision: FloatPrecision) -> Self {
        self.float_precision = precision;
        self
    }
}

/// Integer-keyed values with no named field, kept sorted by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unknowns {
    entries: Vec<(i64, Value)>,
}

impl Unknowns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: i64) -> Option<&Value> {
        self.entries
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|i| &self.entries[i].1)
    }

    /// Inserts or replaces a value, returning the previous one.
    pub(crate) fn insert(&mut self, key: i64, value: Value) -> Option<Value> {
        match self.entries.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            Err(i) => {
                self.entries.insert(i, (key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: i64) -> Option<Value> {
        self.entries
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|i| self.entries.remove(i).1)
    }

    pub fn contains_key(&self, key: i64) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &Value)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Common interface of the meta, main and aux regions.
pub trait Region: Default + Clone {
    const KIND: RegionKind;

    /// Named fields in ascending key order.
    const FIELDS: &'static [FieldDescriptor];

    fn field(&self, key: u32) -> Option<FieldValue>;

    /// Sets a named field; the value must match the field's kind.
    fn set_field(&mut self, key: u32, value: FieldValue) -> Result<(), FieldError>;

    /// Clears a named field, returning whether it was set.
    fn clear_field(&mut self, key: u32) -> bool;

    fn has_field(&self, key: u32) -> bool;

    /// Copies one named field from another region of the same kind,
    /// clearing it here if it is unset there.
    fn copy_field(&mut self, source: &Self, key: u32);

    fn unknowns(&self) -> &Unknowns;

    fn unknowns_mut(&mut self) -> &mut Unknowns;

    fn options(&self) -> &RegionOptions;

    fn options_mut(&mut self) -> &mut RegionOptions;

    fn descriptor(key: u32) -> Option<&'static FieldDescriptor> {
        Self::FIELDS.iter().find(|d| d.key == key)
    }

    fn descriptor_by_name(name: &str) -> Option<&'static FieldDescriptor> {
        Self::FIELDS.iter().find(|d| d.name == name)
    }

    /// Returns true if a named field uses this key.
    fn is_known_key(key: i64) -> bool {
        u32::try_from(key).is_ok_and(|k| Self::descriptor(k).is_some())
    }

    /// Stores a value under a key that has no named field.
    fn set_unknown(&mut self, key: i64, value: Value) -> Result<(), FieldError> {
        if Self::is_known_key(key) {
            return Err(FieldError::KnownKey {
                region: Self::KIND,
                key,
            });
        }
        self.unknowns_mut().insert(key, value);
        Ok(())
    }

    fn unknown(&self, key: i64) -> Option<&Value> {
        self.unknowns().get(key)
    }

    fn remove_unknown(&mut self, key: i64) -> Option<Value> {
        self.unknowns_mut().remove(key)
    }

    /// Looks up a named field by its field name.
    fn field_by_name(&self, name: &str) -> Result<Option<FieldValue>, FieldError> {
        let descriptor = Self::descriptor_by_name(name).ok_or_else(|| FieldError::NoSuchField {
            region: Self::KIND,
            name: name.to_string(),
        })?;
        Ok(self.field(descriptor.key))
    }

    /// Parses text into a named field, looked up by field name.
    fn set_field_from_str(&mut self, name: &str, text: &str) -> Result<(), FieldError> {
        let descriptor = Self::descriptor_by_name(name).ok_or_else(|| FieldError::NoSuchField {
            region: Self::KIND,
            name: name.to_string(),
        })?;
        let value = FieldValue::parse(descriptor.kind, text)?;
        self.set_field(descriptor.key, value)
    }

    /// Iterates the set named fields in key order.
    fn present_fields(&self) -> Vec<(&'static FieldDescriptor, FieldValue)> {
        Self::FIELDS
            .iter()
            .filter_map(|d| self.field(d.key).map(|v| (d, v)))
            .collect()
    }

    /// Returns true if no named field and no unknown is set.
    fn is_empty(&self) -> bool {
        self.unknowns().is_empty() && Self::FIELDS.iter().all(|d| !self.has_field(d.key))
    }
}

/// Generates a region struct, its descriptor table and its [`Region`] impl.
macro_rules! region_schema {
    (@constraints $c:expr ;) => { $c };
    (@constraints $c:expr ; required $(, $($rest:tt)*)?) => {
        region_schema!(@constraints $c.required() ; $($($rest)*)?)
    };
    (@constraints $c:expr ; recommended $(, $($rest:tt)*)?) => {
        region_schema!(@constraints $c.recommended() ; $($($rest)*)?)
    };
    (@constraints $c:expr ; max_length = $n:literal $(, $($rest:tt)*)?) => {
        region_schema!(@constraints $c.max_length($n) ; $($($rest)*)?)
    };

    (
        $(#[$meta:meta])*
        pub struct $name:ident: $kind:ident {
            $(
                $(#[$field_meta:meta])*
                $key:literal => $field:ident: $ty:ty $([$($constraint:tt)*])?,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: Option<$ty>,
            )*
            /// Encoding policy for this region.
            pub options: $crate::model::region::RegionOptions,
            unknowns: $crate::model::region::Unknowns,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field: None,)*
                    options: $crate::model::region::RegionOptions::default_for(
                        $crate::model::region::RegionKind::$kind,
                    ),
                    unknowns: $crate::model::region::Unknowns::new(),
                }
            }
        }

        impl $crate::model::region::Region for $name {
            const KIND: $crate::model::region::RegionKind =
                $crate::model::region::RegionKind::$kind;

            const FIELDS: &'static [$crate::model::field::FieldDescriptor] = &[
                $(
                    $crate::model::field::FieldDescriptor {
                        key: $key,
                        name: stringify!($field),
                        kind: <$ty as $crate::model::field::FieldType>::KIND,
                        constraints: region_schema!(
                            @constraints $crate::model::field::Constraints::NONE ;
                            $($($constraint)*)?
                        ),
                    },
                )*
            ];

            fn field(&self, key: u32) -> Option<$crate::model::field::FieldValue> {
                match key {
                    $(
                        $key => self
                            .$field
                            .clone()
                            .map($crate::model::field::FieldType::into_field_value),
                    )*
                    _ => None,
                }
            }

            fn set_field(
                &mut self,
                key: u32,
                value: $crate::model::field::FieldValue,
            ) -> Result<(), $crate::error::FieldError> {
                match key {
                    $(
                        $key => {
                            self.$field = Some(
                                <$ty as $crate::model::field::FieldType>::from_field_value(value)?,
                            );
                            Ok(())
                        }
                    )*
                    _ => Err($crate::error::FieldError::NoSuchKey {
                        region: Self::KIND,
                        key,
                    }),
                }
            }

            fn clear_field(&mut self, key: u32) -> bool {
                match key {
                    $($key => self.$field.take().is_some(),)*
                    _ => false,
                }
            }

            fn has_field(&self, key: u32) -> bool {
                match key {
                    $($key => self.$field.is_some(),)*
                    _ => false,
                }
            }

            fn copy_field(&mut self, source: &Self, key: u32) {
                match key {
                    $($key => self.$field = source.$field.clone(),)*
                    _ => {}
                }
            }

            fn unknowns(&self) -> &$crate::model::region::Unknowns {
                &self.unknowns
            }

            fn unknowns_mut(&mut self) -> &mut $crate::model::region::Unknowns {
                &mut self.unknowns
            }

            fn options(&self) -> &$crate::model::region::RegionOptions {
                &self.options
            }

            fn options_mut(&mut self) -> &mut $crate::model::region::RegionOptions {
                &mut self.options
            }
        }
    };
}

pub(crate) use region_schema;
