//! Core types shared by the node model, components and the terminal backend.
//!
//! - [`Props`] / [`PropValue`] - attribute maps carried by nodes and components
//! - [`Callback`] - shared event and component callbacks
//! - [`Attr`] / [`Cell`] / [`ClipRect`] - terminal canvas primitives

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;

// =============================================================================
// Callback
// =============================================================================

/// A shared callback taking a JSON payload.
///
/// Host event listeners receive `{"type": "<event>"}`. Callbacks passed
/// between components may carry any payload (a square index, a move number).
///
/// Equality is identity: two callbacks are equal only if they share the same
/// allocation. A closure created fresh on every render is therefore never
/// equal to the previous render's closure.
#[derive(Clone)]
pub struct Callback {
    inner: Rc<dyn Fn(&Value) -> Result<()>>,
}

impl Callback {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<()> + 'static,
    {
        Self { inner: Rc::new(f) }
    }

    /// Invoke the callback.
    pub fn call(&self, payload: &Value) -> Result<()> {
        (self.inner)(payload)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.inner) as *const ())
    }
}

// =============================================================================
// Prop Value
// =============================================================================

/// A single prop value.
///
/// Absent props are simply not present in [`Props`]; there is no null variant.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// Plain string, set verbatim as an attribute.
    Str(String),
    /// Boolean attribute: present when true, omitted when false.
    Bool(bool),
    /// Structured data for component props (arrays, numbers, objects).
    Json(Value),
    /// Event listener or component-to-component callback.
    Callback(Callback),
}

impl PropValue {
    /// Borrow the string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            PropValue::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Borrow the callback, if this is one.
    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            PropValue::Callback(cb) => Some(cb),
            _ => None,
        }
    }

    /// Convert to a JSON value. Callbacks have no JSON form.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            PropValue::Str(s) => Some(Value::String(s.clone())),
            PropValue::Bool(b) => Some(Value::Bool(*b)),
            PropValue::Json(v) => Some(v.clone()),
            PropValue::Callback(_) => None,
        }
    }

    /// Short description used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropValue::Str(_) => "string",
            PropValue::Bool(_) => "boolean",
            PropValue::Json(_) => "json",
            PropValue::Callback(_) => "callback",
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::Json(value)
    }
}

impl From<Callback> for PropValue {
    fn from(value: Callback) -> Self {
        PropValue::Callback(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Json(Value::from(value))
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Json(Value::from(value))
    }
}

/// Attribute name to value. Ordering is irrelevant to comparison; a sorted map
/// keeps attribute application deterministic.
pub type Props = BTreeMap<String, PropValue>;

// =============================================================================
// Cell Attributes (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Text attributes for the terminal canvas.
    ///
    /// Combine with bitwise OR: `Attr::BOLD | Attr::UNDERLINE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attr: u8 {
        const NONE = 0;
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const UNDERLINE = 1 << 2;
        const INVERSE = 1 << 3;
    }
}

// =============================================================================
// Cell
// =============================================================================

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub char: char,
    pub attrs: Attr,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            char: ' ',
            attrs: Attr::NONE,
        }
    }
}

// =============================================================================
// ClipRect
// =============================================================================

/// A rectangle on the terminal canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl ClipRect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Check if a point is inside this rect.
    #[inline]
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

// =============================================================================
// Tests
// =============================================================================
