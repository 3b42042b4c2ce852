//! Node - the virtual representation of renderable content.
//!
//! Three variants, closed:
//!
//! - [`Node::Element`] - tag, props, ordered children
//! - [`Node::Text`] - literal content
//! - [`Node::Component`] - a component instance that expands into a node on render
//!
//! Nodes are what [`build`] produces and what [`Component::render`] returns.
//! Expanding every component in a node tree yields a [`VNode`] tree, which is
//! the only form that can be mounted or reconciled.
//!
//! [`Component::render`]: crate::component::Component::render

mod builder;
mod vnode;

pub use builder::{build, Child, ElementType, NodeTarget};
pub use vnode::{VElement, VNode, VText};

pub(crate) use vnode::Mount;

use crate::component::ComponentRef;
use crate::error::Result;
use crate::types::{PropValue, Props};

// =============================================================================
// Node
// =============================================================================

/// One unit of renderable content, before component expansion.
#[derive(Clone, Debug)]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Component(ComponentRef),
}

/// An element with a tag, props and children.
#[derive(Clone, Debug, Default)]
pub struct ElementNode {
    tag: String,
    props: Props,
    children: Vec<Node>,
}

/// Literal text content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextNode {
    content: String,
}

impl Node {
    /// An empty element.
    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element(ElementNode::new(tag))
    }

    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(TextNode {
            content: content.into(),
        })
    }

    pub fn component(component: ComponentRef) -> Self {
        Node::Component(component)
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(&text.content),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentRef> {
        match self {
            Node::Component(c) => Some(c),
            _ => None,
        }
    }

    /// Expand every component in this subtree, producing the virtual tree.
    pub fn to_virtual_tree(&self) -> Result<VNode> {
        match self {
            Node::Element(el) => {
                let children = el
                    .children
                    .iter()
                    .map(Node::to_virtual_tree)
                    .collect::<Result<Vec<_>>>()?;
                Ok(VNode::element(el.tag.clone(), el.props.clone(), children))
            }
            Node::Text(text) => Ok(VNode::text(text.content.clone())),
            Node::Component(component) => component.to_virtual_tree(),
        }
    }
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: Props::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

impl NodeTarget for ElementNode {
    fn set_attribute(&mut self, name: &str, value: PropValue) {
        self.props.insert(name.to_string(), value);
    }

    fn append_child(&mut self, child: Node) {
        self.children.push(child);
    }
}

impl TextNode {
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl From<ComponentRef> for Node {
    fn from(component: ComponentRef) -> Self {
        Node::Component(component)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_to_virtual_tree() {
        let mut el = ElementNode::new("div");
        el.set_attribute("className", "board-row".into());
        el.append_child(Node::text("hi"));

        let vnode = Node::Element(el).to_virtual_tree().unwrap();
        let VNode::Element(vel) = &vnode else {
            panic!("expected element");
        };
        assert_eq!(vel.tag(), "div");
        assert_eq!(vel.props().len(), 1);
        assert_eq!(vel.children().len(), 1);
        assert!(!vnode.is_mounted());
    }

    #[test]
    fn test_text_accessors() {
        let node = Node::text("X");
        assert_eq!(node.as_text(), Some("X"));
        assert!(node.as_element().is_none());
    }
}
