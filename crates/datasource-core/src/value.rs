//! The typed value cell stored in every node.
//!
//! A [`ValueCell`] holds at most one [`Value`]. It starts empty
//! ([`Value::Void`]); the first write fixes its kind, and later writes of a
//! different kind are rejected until the cell is cleared. Writing a value
//! equal to the current one is reported as "unchanged" so callers can skip
//! change notification.

use std::fmt;

use tracing::warn;

use crate::error::ValueError;

/// Process-wide interned string, used for the [`ValueKind::Name`] kind.
pub type Name = string_cache::DefaultAtom;

/// Discriminant of a [`Value`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// No value.
    #[default]
    Void,
    /// `i32`.
    Int,
    /// `f32`.
    Float,
    /// `bool`.
    Bool,
    /// Interned identifier ([`Name`]).
    Name,
    /// Human-readable, localisable text ([`Text`]).
    Text,
    /// Plain owned string.
    String,
    /// Reference to an image asset ([`ResourceRef`]).
    Image,
    /// Hierarchical tag ([`GameplayTag`]).
    GameplayTag,
    /// Opaque structured payload ([`StructBlob`]).
    Struct,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Void => "void",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Name => "name",
            Self::Text => "text",
            Self::String => "string",
            Self::Image => "image",
            Self::GameplayTag => "gameplay-tag",
            Self::Struct => "struct",
        };
        f.write_str(s)
    }
}

/// Localisable display text.
///
/// Two texts are equal when both their content and their locale match;
/// the same characters under a different locale count as a change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Text {
    /// Displayed characters.
    pub content: String,
    /// Locale identifier the content was produced for, e.g. `"en-US"`.
    /// Empty for culture-invariant text.
    pub locale: String,
}

impl Text {
    /// Culture-invariant text.
    pub fn invariant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            locale: String::new(),
        }
    }

    /// Text localised for `locale`.
    pub fn localized(content: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            locale: locale.into(),
        }
    }
}

/// Path of an image-compatible asset (texture or material).
///
/// The store never loads the asset; consumers resolve the path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResourceRef(pub String);

impl ResourceRef {
    /// Whether the reference points at nothing.
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }
}

/// Dotted hierarchical tag such as `"Status.Debuff.Poison"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GameplayTag(pub String);

impl GameplayTag {
    /// Whether `self` equals `parent` or lies underneath it.
    ///
    /// `Status.Debuff.Poison` matches `Status.Debuff` and `Status`, but not
    /// `Status.Deb`.
    pub fn matches(&self, parent: &GameplayTag) -> bool {
        match self.0.strip_prefix(parent.0.as_str()) {
            Some(rest) => !parent.0.is_empty() && (rest.is_empty() || rest.starts_with('.')),
            None => false,
        }
    }
}

/// Opaque structured payload: a type name plus its encoded bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StructBlob {
    /// Name of the payload's type, used by consumers to decode `bytes`.
    pub type_name: String,
    /// Encoded payload.
    pub bytes: Vec<u8>,
}

/// A value of one of the supported kinds, or nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No value.
    #[default]
    Void,
    /// See [`ValueKind::Int`].
    Int(i32),
    /// See [`ValueKind::Float`].
    Float(f32),
    /// See [`ValueKind::Bool`].
    Bool(bool),
    /// See [`ValueKind::Name`].
    Name(Name),
    /// See [`ValueKind::Text`].
    Text(Text),
    /// See [`ValueKind::String`].
    String(String),
    /// See [`ValueKind::Image`].
    Image(ResourceRef),
    /// See [`ValueKind::GameplayTag`].
    GameplayTag(GameplayTag),
    /// See [`ValueKind::Struct`].
    Struct(StructBlob),
}

impl Value {
    /// The discriminant of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Void => ValueKind::Void,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
            Self::Name(_) => ValueKind::Name,
            Self::Text(_) => ValueKind::Text,
            Self::String(_) => ValueKind::String,
            Self::Image(_) => ValueKind::Image,
            Self::GameplayTag(_) => ValueKind::GameplayTag,
            Self::Struct(_) => ValueKind::Struct,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("<void>"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Name(v) => write!(f, "{}", &**v),
            Self::Text(v) if v.locale.is_empty() => write!(f, "{:?}", v.content),
            Self::Text(v) => write!(f, "{:?} ({})", v.content, v.locale),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Image(v) => write!(f, "image:{}", v.0),
            Self::GameplayTag(v) => write!(f, "tag:{}", v.0),
            Self::Struct(v) => write!(f, "struct:{} ({} bytes)", v.type_name, v.bytes.len()),
        }
    }
}

/// A Rust type that can live in a [`ValueCell`].
///
/// Implemented for exactly the payload types of [`Value`]; the trait is the
/// static half of the cell's runtime kind check.
pub trait CellValue: Clone + PartialEq + Default + Sized {
    /// The kind this type is stored as.
    const KIND: ValueKind;

    /// Wrap into a [`Value`].
    fn into_value(self) -> Value;

    /// Borrow out of a [`Value`] of the matching kind.
    fn peek(value: &Value) -> Option<&Self>;
}

macro_rules! impl_cell_value {
    ($ty:ty, $variant:ident) => {
        impl CellValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn peek(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_cell_value!(i32, Int);
impl_cell_value!(f32, Float);
impl_cell_value!(bool, Bool);
impl_cell_value!(Name, Name);
impl_cell_value!(Text, Text);
impl_cell_value!(String, String);
impl_cell_value!(ResourceRef, Image);
impl_cell_value!(GameplayTag, GameplayTag);
impl_cell_value!(StructBlob, Struct);

/// Single-kind value slot with change detection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueCell {
    value: Value,
}

impl ValueCell {
    /// An empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Kind of the stored value.
    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Whether the cell holds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self.value, Value::Void)
    }

    /// Empty the cell, unlocking its kind. Returns whether anything was
    /// removed.
    pub fn clear(&mut self) -> bool {
        !matches!(std::mem::take(&mut self.value), Value::Void)
    }

    /// Store `new_value`.
    ///
    /// Returns `Ok(true)` when the stored value changed, `Ok(false)` when it
    /// already equalled `new_value`, and [`ValueError::TypeMismatch`] (cell
    /// untouched) when the cell holds another kind.
    pub fn set<T: CellValue>(&mut self, new_value: T) -> Result<bool, ValueError> {
        if let Some(current) = T::peek(&self.value) {
            if *current == new_value {
                return Ok(false);
            }
            self.value = new_value.into_value();
            return Ok(true);
        }
        if self.is_empty() {
            self.value = new_value.into_value();
            return Ok(true);
        }
        Err(ValueError::TypeMismatch {
            expected: T::KIND,
            found: self.kind(),
        })
    }

    /// Read the value as `T`, or `T::default()` with a warning when the cell
    /// holds another kind. An empty cell reads as the default silently.
    pub fn get<T: CellValue>(&self) -> T {
        if let Some(v) = T::peek(&self.value) {
            return v.clone();
        }
        if !self.is_empty() {
            warn!(
                expected = %T::KIND,
                found = %self.kind(),
                "tried to get a value of incompatible kind, returning default"
            );
        }
        T::default()
    }

    /// Borrow the value as `T` if that is the stored kind.
    pub fn try_get<T: CellValue>(&self) -> Option<&T> {
        T::peek(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cell_accepts_any_kind() {
        let mut cell = ValueCell::new();
        assert!(cell.is_empty());
        assert_eq!(cell.set(5i32), Ok(true));
        assert_eq!(cell.kind(), ValueKind::Int);
        assert_eq!(cell.get::<i32>(), 5);
    }

    #[test]
    fn equal_write_reports_unchanged() {
        let mut cell = ValueCell::new();
        cell.set(String::from("hp")).unwrap();
        assert_eq!(cell.set(String::from("hp")), Ok(false));
        assert_eq!(cell.set(String::from("mp")), Ok(true));
    }

    #[test]
    fn kind_is_locked_until_cleared() {
        let mut cell = ValueCell::new();
        cell.set(7i32).unwrap();
        assert_eq!(
            cell.set(1.5f32),
            Err(ValueError::TypeMismatch {
                expected: ValueKind::Float,
                found: ValueKind::Int,
            })
        );
        assert_eq!(cell.get::<i32>(), 7);

        assert!(cell.clear());
        assert!(!cell.clear());
        assert_eq!(cell.set(1.5f32), Ok(true));
    }

    #[test]
    fn mismatched_get_returns_default() {
        let mut cell = ValueCell::new();
        cell.set(true).unwrap();
        assert_eq!(cell.get::<f32>(), 0.0);
        assert_eq!(cell.try_get::<f32>(), None);
        assert_eq!(cell.try_get::<bool>(), Some(&true));
    }

    #[test]
    fn text_equality_includes_locale() {
        let mut cell = ValueCell::new();
        cell.set(Text::localized("Bonjour", "fr-FR")).unwrap();
        assert_eq!(cell.set(Text::localized("Bonjour", "fr-FR")), Ok(false));
        assert_eq!(cell.set(Text::localized("Bonjour", "fr-CA")), Ok(true));
    }

    #[test]
    fn name_atoms_compare_by_content() {
        let mut cell = ValueCell::new();
        cell.set(Name::from("Warrior")).unwrap();
        assert_eq!(cell.set(Name::from("Warrior")), Ok(false));
        assert_eq!(&*cell.get::<Name>(), "Warrior");
    }

    #[test]
    fn gameplay_tag_matching_respects_segments() {
        let poison = GameplayTag("Status.Debuff.Poison".into());
        assert!(poison.matches(&GameplayTag("Status.Debuff".into())));
        assert!(poison.matches(&GameplayTag("Status".into())));
        assert!(poison.matches(&poison.clone()));
        assert!(!poison.matches(&GameplayTag("Status.Deb".into())));
        assert!(!poison.matches(&GameplayTag::default()));
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::Void.to_string(), "<void>");
        assert_eq!(
            Value::Text(Text::localized("Hi", "en")).to_string(),
            "\"Hi\" (en)"
        );
        assert_eq!(
            Value::Struct(StructBlob {
                type_name: "Loadout".into(),
                bytes: vec![1, 2, 3],
            })
            .to_string(),
            "struct:Loadout (3 bytes)"
        );
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn int_cell_rejects_floats(start in any::<i32>(), f in any::<f32>()) {
                let mut cell = ValueCell::new();
                cell.set(start).unwrap();
                prop_assert!(cell.set(f).is_err());
                prop_assert_eq!(cell.get::<i32>(), start);
            }

            #[test]
            fn set_reports_change_iff_values_differ(a in any::<i32>(), b in any::<i32>()) {
                let mut cell = ValueCell::new();
                cell.set(a).unwrap();
                prop_assert_eq!(cell.set(b), Ok(a != b));
                prop_assert_eq!(cell.get::<i32>(), b);
            }
        }
    }
}
