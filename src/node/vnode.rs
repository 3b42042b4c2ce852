//! Virtual tree nodes and the mount path.
//!
//! A [`VNode`] is a fully expanded node: only elements and text remain. Once
//! mounted, each VNode owns the [`DocumentSpan`] wrapping its rendered unit.
//! Mounting is reachable only through the crate-private [`Mount`] capability;
//! application code mounts through [`crate::mount`].

use serde_json::Value;
use tracing::trace;

use crate::document::{DocumentSpan, Host, UnitId};
use crate::error::{Error, Result};
use crate::types::{Callback, PropValue, Props};

// =============================================================================
// Types
// =============================================================================

/// A node in a fully expanded virtual tree.
#[derive(Debug)]
pub enum VNode {
    Element(VElement),
    Text(VText),
}

#[derive(Debug)]
pub struct VElement {
    pub(crate) tag: String,
    pub(crate) props: Props,
    pub(crate) children: Vec<VNode>,
    pub(crate) unit: Option<UnitId>,
    pub(crate) span: Option<DocumentSpan>,
}

#[derive(Debug)]
pub struct VText {
    pub(crate) content: String,
    pub(crate) unit: Option<UnitId>,
    pub(crate) span: Option<DocumentSpan>,
}

impl VNode {
    /// An unmounted element.
    pub fn element(tag: impl Into<String>, props: Props, children: Vec<VNode>) -> Self {
        VNode::Element(VElement {
            tag: tag.into(),
            props,
            children,
            unit: None,
            span: None,
        })
    }

    /// An unmounted text node.
    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text(VText {
            content: content.into(),
            unit: None,
            span: None,
        })
    }

    /// Unit rendered for this node, once mounted.
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            VNode::Element(el) => el.unit,
            VNode::Text(text) => text.unit,
        }
    }

    pub fn span(&self) -> Option<&DocumentSpan> {
        match self {
            VNode::Element(el) => el.span.as_ref(),
            VNode::Text(text) => text.span.as_ref(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.span().is_some()
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element(el) => &el.children,
            VNode::Text(_) => &[],
        }
    }

    pub(crate) fn take_span(&mut self) -> Option<DocumentSpan> {
        match self {
            VNode::Element(el) => el.span.take(),
            VNode::Text(text) => text.span.take(),
        }
    }

    /// Move the span and unit of `old` onto this node.
    pub(crate) fn adopt(&mut self, old: &mut VNode) {
        let unit = old.unit();
        let span = old.take_span();
        match self {
            VNode::Element(el) => {
                el.unit = unit;
                el.span = span;
            }
            VNode::Text(text) => {
                text.unit = unit;
                text.span = span;
            }
        }
    }

    /// Total number of nodes in this subtree.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(VNode::count).sum::<usize>()
    }
}

impl VElement {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }
}

impl VText {
    pub fn content(&self) -> &str {
        &self.content
    }
}

// =============================================================================
// Mount
// =============================================================================

/// Rendering capability: realise a node into a span it takes ownership of.
pub(crate) trait Mount {
    fn mount_into(&mut self, span: DocumentSpan) -> Result<()>;
}

impl Mount for VNode {
    fn mount_into(&mut self, span: DocumentSpan) -> Result<()> {
        match self {
            VNode::Element(el) => el.mount_into(span),
            VNode::Text(text) => text.mount_into(span),
        }
    }
}

impl Mount for VText {
    fn mount_into(&mut self, span: DocumentSpan) -> Result<()> {
        let unit = span.host().create_text(&self.content);
        span.replace_contents(unit)?;
        trace!(?unit, span = ?span.id(), "mounted text");
        self.unit = Some(unit);
        self.span = Some(span);
        Ok(())
    }
}

impl Mount for VElement {
    fn mount_into(&mut self, span: DocumentSpan) -> Result<()> {
        let host = span.host().clone();
        let unit = host.create_element(&self.tag);
        apply_props(host.as_ref(), unit, &self.props)?;

        // Children are mounted into the detached container first, so nested
        // spans are complete before the container enters its parent span.
        for child in &mut self.children {
            let child_span = DocumentSpan::at_end_of(host.clone(), unit)?;
            child.mount_into(child_span)?;
        }

        span.replace_contents(unit)?;
        trace!(tag = %self.tag, ?unit, span = ?span.id(), "mounted element");
        self.unit = Some(unit);
        self.span = Some(span);
        Ok(())
    }
}

// =============================================================================
// Attribute Conventions
// =============================================================================

/// Event name for an `on<Event>` prop: the remainder with its first
/// character lower-cased.
pub(crate) fn event_name(prop: &str) -> Option<String> {
    let rest = prop.strip_prefix("on")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

/// Host attribute name for a prop.
pub(crate) fn attribute_name(prop: &str) -> &str {
    match prop {
        "className" => "class",
        other => other,
    }
}

/// What a single prop turns into on a host unit.
enum PropEffect<'a> {
    Listener(String, &'a Callback),
    Attribute(&'a str, String),
    Omit,
}

fn prop_effect<'a>(name: &'a str, value: &'a PropValue) -> Result<PropEffect<'a>> {
    if let Some(event) = event_name(name) {
        let callback = value.as_callback().ok_or_else(|| {
            Error::malformed_attribute(
                name,
                format!("event props take a callback, found {}", value.kind_name()),
            )
        })?;
        return Ok(PropEffect::Listener(event, callback));
    }

    let attr = attribute_name(name);
    match value {
        PropValue::Str(s) => Ok(PropEffect::Attribute(attr, s.clone())),
        PropValue::Bool(true) => Ok(PropEffect::Attribute(attr, String::new())),
        PropValue::Bool(false) | PropValue::Json(Value::Null) => Ok(PropEffect::Omit),
        PropValue::Json(Value::String(s)) => Ok(PropEffect::Attribute(attr, s.clone())),
        PropValue::Json(v @ (Value::Number(_) | Value::Bool(_))) => {
            Ok(PropEffect::Attribute(attr, v.to_string()))
        }
        PropValue::Json(_) => Err(Error::malformed_attribute(
            name,
            "objects and arrays cannot be written as attributes",
        )),
        PropValue::Callback(_) => Err(Error::malformed_attribute(
            name,
            "callbacks are only valid on on<Event> props",
        )),
    }
}

/// Apply every prop of an element to its freshly created unit.
pub(crate) fn apply_props(host: &dyn Host, unit: UnitId, props: &Props) -> Result<()> {
    for (name, value) in props {
        match prop_effect(name, value)? {
            PropEffect::Listener(event, callback) => {
                host.add_event_listener(unit, &event, callback.clone())?
            }
            PropEffect::Attribute(attr, text) => host.set_attribute(unit, attr, &text)?,
            PropEffect::Omit => {}
        }
    }
    Ok(())
}

impl VNode {
    /// Check every element's props against the attribute conventions
    /// without touching any document.
    pub fn validate(&self) -> Result<()> {
        if let VNode::Element(el) = self {
            for (name, value) in &el.props {
                prop_effect(name, value)?;
            }
            el.children.iter().try_for_each(VNode::validate)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::document::HeadlessDocument;
    use crate::types::Callback;

    fn mount_in_body(mut vnode: VNode) -> (Rc<HeadlessDocument>, VNode) {
        let doc = HeadlessDocument::new();
        let host: Rc<dyn Host> = doc.clone();
        let span = DocumentSpan::at_end_of(host, doc.body()).unwrap();
        vnode.mount_into(span).unwrap();
        (doc, vnode)
    }

    #[test]
    fn test_event_name_lowercases_first_char() {
        assert_eq!(event_name("onClick").as_deref(), Some("click"));
        assert_eq!(event_name("onMouseDown").as_deref(), Some("mouseDown"));
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("className"), None);
    }

    #[test]
    fn test_mount_element_with_children() {
        let mut props = Props::new();
        props.insert("className".into(), "square".into());
        props.insert("disabled".into(), false.into());
        props.insert("key".into(), json!(3).into());
        let vnode = VNode::element("button", props, vec![VNode::text("X")]);

        let (doc, vnode) = mount_in_body(vnode);
        assert_eq!(
            doc.inner_html(doc.body()).unwrap(),
            r#"<button class="square" key="3">X</button>"#
        );
        assert!(vnode.is_mounted());
        assert!(vnode.children()[0].is_mounted());
        assert_eq!(doc.open_span_count(), 2);
    }

    #[test]
    fn test_mount_registers_listener() {
        let mut props = Props::new();
        props.insert("onClick".into(), Callback::new(|_| Ok(())).into());
        let (doc, vnode) = mount_in_body(VNode::element("button", props, vec![]));

        let unit = vnode.unit().unwrap();
        assert!(doc.has_listener(unit, "click"));
        assert_eq!(doc.attribute(unit, "onClick").unwrap(), None);
    }

    #[test]
    fn test_event_prop_without_callback_is_malformed() {
        let doc = HeadlessDocument::new();
        let host: Rc<dyn Host> = doc.clone();
        let span = DocumentSpan::at_end_of(host, doc.body()).unwrap();
        let mut props = Props::new();
        props.insert("onClick".into(), "alert()".into());

        let err = VNode::element("button", props, vec![]).mount_into(span).unwrap_err();
        assert!(matches!(err, Error::MalformedAttribute { ref name, .. } if name == "onClick"));
    }

    #[test]
    fn test_structured_json_attribute_is_malformed() {
        let doc = HeadlessDocument::new();
        let host: Rc<dyn Host> = doc.clone();
        let span = DocumentSpan::at_end_of(host, doc.body()).unwrap();
        let mut props = Props::new();
        props.insert("squares".into(), json!([null, "X"]).into());

        let err = VNode::element("div", props, vec![]).mount_into(span).unwrap_err();
        assert!(matches!(err, Error::MalformedAttribute { .. }));
    }

    #[test]
    fn test_validate_finds_nested_malformed_prop() {
        let mut bad = Props::new();
        bad.insert("onClick".into(), "str".into());
        let tree = VNode::element(
            "div",
            Props::new(),
            vec![VNode::text("a"), VNode::element("button", bad, vec![])],
        );
        assert!(matches!(tree.validate(), Err(Error::MalformedAttribute { .. })));

        let mut good = Props::new();
        good.insert("className".into(), "row".into());
        good.insert("hidden".into(), false.into());
        assert!(VNode::element("div", good, vec![VNode::text("a")]).validate().is_ok());
    }

    #[test]
    fn test_count() {
        let tree = VNode::element(
            "ol",
            Props::new(),
            vec![VNode::element("li", Props::new(), vec![VNode::text("a")]), VNode::text("b")],
        );
        assert_eq!(tree.count(), 4);
    }
}
