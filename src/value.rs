use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

use anyhow::Result;
use indexmap::IndexMap;

use crate::error::{fail, ErrorKind, ScriptError};
use crate::lambda::Lambda;
use crate::ops;
use crate::varref::{AssignmentRequest, Reference};

/// Dynamically typed runtime value. Collections are owned outright, so cloning
/// a value deep-copies it; assignment is always by value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),

    String(String),

    Boolean(bool),

    Array(Vec<Value>),

    Map(DataMap),

    Set(DataSet),

    Colour(Colour),

    Changer(Changer),

    Lambda(Box<Lambda>),

    HookSet(HookSet),

    /// Only exists within a single evaluation; never stored.
    Ref(Box<Reference>),

    Assignment(Box<AssignmentRequest>),

    Error(Box<ScriptError>),
}

/// Datamap and property-chain key.
#[derive(Clone, Debug)]
pub enum Key {
    String(String),

    Number(f64),
}

/// Insertion-ordered string/number keyed map. Sealed maps refuse new keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataMap {
    entries: IndexMap<Key, Value>,

    sealed: bool,
}

/// Unordered collection of structurally distinct values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSet(Vec<Value>);

#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A deferred styling command. The calls run in order, so `a + b` runs `a`'s
/// calls before `b`'s.
#[derive(Clone, Debug, PartialEq)]
pub struct Changer {
    pub calls: Vec<ChangerCall>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChangerCall {
    pub name: String,

    pub params: Vec<Value>,
}

/// Result of a `?name` hook selection. When the host knows the text of the
/// selected hooks it fills in `text`, which lets the set take part in string
/// operations.
#[derive(Clone, Debug, PartialEq)]
pub struct HookSet {
    pub name: String,

    pub text: Option<String>,
}

impl Value {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Value::Error(Box::new(ScriptError::new(kind, message)))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Whether the two values are of the same runtime category.
    pub fn same_kind(&self, other: &Value) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Explicit to-string capability, used when a value of another kind is
    /// combined with a string.
    pub fn coerce_to_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::HookSet(HookSet { text: Some(text), .. }) => Some(text.clone()),
            _ => None,
        }
    }

    /// Payload used when this value is written into a variable.
    pub fn assign_value(self) -> Value {
        match self {
            Value::HookSet(HookSet { text: Some(text), .. }) => Value::String(text),
            other => other,
        }
    }

    /// Lift an error value into `anyhow`, for hosts that want to bail.
    pub fn into_result(self) -> Result<Value> {
        match self {
            Value::Error(err) => Err((*err).into()),
            other => Ok(other),
        }
    }

    /// Human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Number(n) => format!("the number {n}"),
            Value::String(s) if s.is_empty() => "an empty string".into(),
            Value::String(s) => format!("the string {s:?}"),
            Value::Boolean(b) => format!("the boolean value '{b}'"),
            Value::Array(items) if items.is_empty() => "an empty array".into(),
            Value::Array(_) => "an array".into(),
            Value::Map(_) => "a datamap".into(),
            Value::Set(_) => "a dataset".into(),
            Value::Colour(_) => "a colour".into(),
            Value::Changer(changer) => match changer.calls.first() {
                Some(call) => format!("a ({}:) command", call.name),
                None => "a changer command".into(),
            },
            Value::Lambda(_) => "a lambda".into(),
            Value::HookSet(hooks) => format!("the ?{} hook", hooks.name),
            Value::Ref(_) => "a variable reference".into(),
            Value::Assignment(_) => "an assignment operation".into(),
            Value::Error(_) => "an error".into(),
        }
    }
}

/// First error among `values`, cloned out.
pub fn first_error(values: &[&Value]) -> Option<Value> {
    values.iter().find(|v| v.is_error()).map(|v| (*v).clone())
}

impl Key {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            &Key::Number(n) => Some(n),
            Key::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s),
            Key::Number(_) => None,
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::String(a), Key::String(b)) => a == b,
            (&Key::Number(a), &Key::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);

        match self {
            Key::String(s) => s.hash(state),
            // -0 and 0 are the same key
            Key::Number(n) => (n + 0.0).to_bits().hash(state),
        }
    }
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map that rejects new keys. Existing keys may still be overwritten.
    pub fn sealed(entries: impl IntoIterator<Item=(Key, Value)>) -> Self {
        let mut map: Self = entries.into_iter().collect();
        map.sealed = true;
        map
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: Key, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=(&Key, &Value)> {
        self.entries.iter()
    }

    /// Copy every entry of `other` over this map.
    pub fn merge(&mut self, other: DataMap) {
        self.entries.extend(other.entries);
    }
}

impl FromIterator<(Key, Value)> for DataMap {
    fn from_iter<T: IntoIterator<Item=(Key, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            sealed: false,
        }
    }
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` unless a structurally equal value is already present.
    pub fn insert(&mut self, value: Value) -> bool {
        if self.contains(&value) {
            return false;
        }

        self.0.push(value);
        true
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.iter().any(|v| ops::structural_eq(v, value))
    }

    pub fn remove(&mut self, value: &Value) {
        self.0.retain(|v| !ops::structural_eq(v, value));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=&Value> {
        self.0.iter()
    }
}

impl FromIterator<Value> for DataSet {
    fn from_iter<T: IntoIterator<Item=Value>>(iter: T) -> Self {
        let mut set = DataSet::new();

        for value in iter {
            set.insert(value);
        }

        set
    }
}

impl IntoIterator for DataSet {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Colour {
    /// Parses `#rgb` or `#rrggbb`, with or without the leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        let channel = |s: &str| u8::from_str_radix(s, 16).ok();

        match hex.len() {
            3 => {
                let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| d as u8 * 17));
                Some(Colour {
                    r: digits.next()??,
                    g: digits.next()??,
                    b: digits.next()??,
                })
            },

            6 => Some(Colour {
                r: channel(hex.get(0..2)?)?,
                g: channel(hex.get(2..4)?)?,
                b: channel(hex.get(4..6)?)?,
            }),

            _ => None,
        }
    }

    /// Hex code for one of the named colour literals.
    pub fn named_hex(name: &str) -> Option<&'static str> {
        Some(match name.to_ascii_lowercase().as_str() {
            "red" => "#e61919",
            "orange" => "#e68019",
            "yellow" => "#e5e619",
            "lime" => "#80e619",
            "green" => "#19e619",
            "cyan" | "aqua" => "#19e5e6",
            "blue" => "#197fe6",
            "navy" => "#1919e6",
            "purple" => "#7f19e6",
            "fuchsia" | "magenta" => "#e619e5",
            "white" => "#fff",
            "black" => "#000",
            "gray" | "grey" => "#888",
            _ => return None,
        })
    }

    /// Channel-wise blend used by `+`.
    pub fn blend(self, other: Colour) -> Colour {
        let mix = |l: u8, r: u8| ((l as f64 + r as f64) * 0.6).round().min(255.0) as u8;

        Colour {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    pub fn channel(&self, name: &str) -> Option<u8> {
        match name {
            "r" => Some(self.r),
            "g" => Some(self.g),
            "b" => Some(self.b),
            _ => None,
        }
    }
}

impl Changer {
    pub fn new(name: impl Into<String>, params: Vec<Value>) -> Self {
        Changer {
            calls: vec![ChangerCall { name: name.into(), params }],
        }
    }

    /// `self` then `next`.
    pub fn compose(mut self, next: Changer) -> Changer {
        self.calls.extend(next.calls);
        self
    }
}

impl HookSet {
    pub fn named(name: impl Into<String>) -> Self {
        HookSet {
            name: name.into(),
            text: None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::String(s) => write!(f, "{s}"),
            Key::Number(n) => write!(f, "{n}"),
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<DataMap> for Value {
    fn from(value: DataMap) -> Self {
        Value::Map(value)
    }
}

impl From<DataSet> for Value {
    fn from(value: DataSet) -> Self {
        Value::Set(value)
    }
}

impl From<Colour> for Value {
    fn from(value: Colour) -> Self {
        Value::Colour(value)
    }
}

impl From<ScriptError> for Value {
    fn from(value: ScriptError) -> Self {
        Value::Error(Box::new(value))
    }
}

impl From<Result<Value, ScriptError>> for Value {
    fn from(value: Result<Value, ScriptError>) -> Self {
        value.unwrap_or_else(Value::from)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::String(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::String(value)
    }
}

impl From<f64> for Key {
    fn from(value: f64) -> Self {
        Key::Number(value)
    }
}

impl From<Key> for Value {
    fn from(value: Key) -> Self {
        match value {
            Key::String(s) => Value::String(s),
            Key::Number(n) => Value::Number(n),
        }
    }
}

impl TryFrom<Value> for Key {
    type Error = ScriptError;

    fn try_from(value: Value) -> Result<Self, ScriptError> {
        match value {
            Value::String(s) => Ok(Key::String(s)),
            Value::Number(n) => Ok(Key::Number(n)),
            Value::Error(err) => Err(*err),
            other => fail!(Type, "Only strings and numbers can be used as data names, not {}.", other.describe()),
        }
    }
}

#[test]
fn colour_literals() {
    let red = Colour::from_hex(Colour::named_hex("Red").unwrap()).unwrap();
    assert_eq!(red, Colour { r: 0xe6, g: 0x19, b: 0x19 });
    assert_eq!(Colour::from_hex("#fff"), Some(Colour { r: 255, g: 255, b: 255 }));
    assert_eq!(Colour::from_hex("#12"), None);
    assert_eq!(red.to_string(), "#e61919");
}

#[test]
fn colour_blend_clamps() {
    let white = Colour { r: 255, g: 255, b: 255 };
    let black = Colour::default();
    assert_eq!(white.blend(white), white);
    assert_eq!(white.blend(black), Colour { r: 153, g: 153, b: 153 });
}

#[test]
fn number_keys_ignore_sign_of_zero() {
    let mut map = DataMap::new();
    map.insert(Key::Number(0.0), Value::from(1));
    assert!(map.contains_key(&Key::Number(-0.0)));
    assert!(!map.contains_key(&Key::from("0")));
}

#[test]
fn dataset_dedups_structurally() {
    let set: DataSet = [
        Value::Array(vec![1.into(), 2.into()]),
        Value::Array(vec![1.into(), 2.into()]),
        Value::from("a"),
    ].into_iter().collect();

    assert_eq!(set.len(), 2);
}
