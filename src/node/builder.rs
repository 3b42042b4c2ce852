//! Tree builder.
//!
//! [`build`] takes an element type, an attribute map and a list of children,
//! and produces either an element node or a component instance. Children may
//! be nested to any depth; lists are flattened in place and absent entries
//! are dropped.
//!
//! ```ignore
//! use spark_vdom::{build, children, props, Node};
//!
//! let row = build(
//!     "div",
//!     props! { "className" => "board-row" },
//!     children![Node::text("a"), None::<Node>, vec!["b", "c"]],
//! )?;
//! ```

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::{ElementNode, Node};
use crate::component::{Component, ComponentRef};
use crate::error::{Error, Result};
use crate::types::{PropValue, Props};

// =============================================================================
// Target Contract
// =============================================================================

/// Anything the builder can write attributes and children into.
pub trait NodeTarget {
    fn set_attribute(&mut self, name: &str, value: PropValue);
    fn append_child(&mut self, child: Node);
}

// =============================================================================
// Element Type
// =============================================================================

/// What [`build`] should produce.
#[derive(Clone)]
pub enum ElementType {
    /// A primitive host tag such as `div` or `button`.
    Tag(String),
    /// A component type; the factory creates a fresh instance per build.
    Component(Rc<dyn Fn() -> ComponentRef>),
}

impl ElementType {
    pub fn tag(name: impl Into<String>) -> Self {
        ElementType::Tag(name.into())
    }

    /// Component type constructed through `Default`.
    pub fn component<C: Component + Default>() -> Self {
        ElementType::Component(Rc::new(|| ComponentRef::new(C::default())))
    }

    /// Component type with a custom constructor.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> ComponentRef + 'static,
    {
        ElementType::Component(Rc::new(factory))
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Tag(tag.to_string())
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        ElementType::Tag(tag)
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            ElementType::Component(_) => f.write_str("Component(..)"),
        }
    }
}

// =============================================================================
// Child
// =============================================================================

/// A child entry before flattening.
#[derive(Debug, Clone)]
pub enum Child {
    /// Absent; dropped.
    Null,
    /// Raw text; wrapped in a text node.
    Text(String),
    Node(Node),
    /// Nested list; expanded in place.
    List(Vec<Child>),
    /// Loosely typed child. Strings become text, null is dropped, arrays
    /// are flattened, anything else is rejected.
    Value(Value),
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<ComponentRef> for Child {
    fn from(component: ComponentRef) -> Self {
        Child::Node(Node::Component(component))
    }
}

impl From<Value> for Child {
    fn from(value: Value) -> Self {
        Child::Value(value)
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(child: Option<T>) -> Self {
        child.map_or(Child::Null, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(children: Vec<T>) -> Self {
        Child::List(children.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Build
// =============================================================================

/// Assemble a node from a type, attributes and children.
///
/// Attributes are stored verbatim in the target's props; conventions such as
/// `className` and `on<Event>` apply only when the node is mounted.
pub fn build(ty: impl Into<ElementType>, attributes: Props, children: Vec<Child>) -> Result<Node> {
    let mut flat = Vec::new();
    flatten_into(children, &mut flat)?;

    match ty.into() {
        ElementType::Tag(tag) => {
            let mut element = ElementNode::new(tag);
            fill(&mut element, attributes, flat);
            Ok(Node::Element(element))
        }
        ElementType::Component(factory) => {
            let mut component = factory();
            fill(&mut component, attributes, flat);
            Ok(Node::Component(component))
        }
    }
}

fn fill(target: &mut impl NodeTarget, attributes: Props, children: Vec<Node>) {
    for (name, value) in attributes {
        target.set_attribute(&name, value);
    }
    for child in children {
        target.append_child(child);
    }
}

fn flatten_into(children: Vec<Child>, out: &mut Vec<Node>) -> Result<()> {
    for child in children {
        match child {
            Child::Null => {}
            Child::Text(text) => out.push(Node::text(text)),
            Child::Node(node) => out.push(node),
            Child::List(nested) => flatten_into(nested, out)?,
            Child::Value(value) => flatten_value(value, out)?,
        }
    }
    Ok(())
}

fn flatten_value(value: Value, out: &mut Vec<Node>) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::String(text) => {
            out.push(Node::text(text));
            Ok(())
        }
        Value::Array(items) => items.into_iter().try_for_each(|item| flatten_value(item, out)),
        other => Err(Error::InvalidChild {
            found: describe(&other),
        }),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::Object(_) => "object".to_string(),
        Value::Null => "null".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
    }
}

// =============================================================================
// Macros
// =============================================================================

/// Build a [`Props`](crate::types::Props) map.
///
/// ```ignore
/// let props = props! { "className" => "square", "onClick" => callback };
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::types::Props::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut props = $crate::types::Props::new();
        $(
            props.insert(
                ::std::string::String::from($name),
                $crate::types::PropValue::from($value),
            );
        )+
        props
    }};
}

/// Build a child list for [`build`](crate::node::build).
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {
        ::std::vec![$($crate::node::Child::from($child)),*]
    };
}

// =============================================================================
// Tests
// =============================================================================
