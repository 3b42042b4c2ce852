//! Headless in-memory document.
//!
//! An arena of element and text units plus a table of live spans. Every
//! structural mutation goes through [`Inner::insert_child`] or
//! [`Inner::remove_child`], which keep span boundaries in step with the tree.
//! All mutations are recorded in a log so callers can assert exactly what a
//! render or reconciliation touched.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::Rc;

use serde_json::json;
use tracing::trace;

use super::{Boundary, Host, SpanId, UnitId};
use crate::error::{Error, Result};
use crate::types::Callback;

// =============================================================================
// Public Types
// =============================================================================

/// What kind of unit an id refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    Element { tag: String },
    Text { content: String },
}

/// One recorded document mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create { unit: UnitId },
    Insert { parent: UnitId, index: usize, unit: UnitId },
    Remove { parent: UnitId, index: usize, unit: UnitId },
    SetAttribute { unit: UnitId, name: String, value: String },
    AddListener { unit: UnitId, event: String },
}

// =============================================================================
// Internal State
// =============================================================================

enum Content {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        listeners: Vec<(String, Callback)>,
    },
    Text(String),
}

struct UnitData {
    content: Content,
    parent: Option<UnitId>,
    children: Vec<UnitId>,
}

#[derive(Clone, Copy)]
struct SpanData {
    start: Boundary,
    end: Boundary,
    valid: bool,
}

struct Inner {
    units: Vec<UnitData>,
    spans: Vec<Option<SpanData>>,
    free_spans: Vec<usize>,
    mutations: Vec<Mutation>,
    body: UnitId,
}

impl Inner {
    fn unit(&self, id: UnitId) -> Result<&UnitData> {
        self.units.get(id.0).ok_or(Error::UnknownUnit(id))
    }

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut UnitData> {
        self.units.get_mut(id.0).ok_or(Error::UnknownUnit(id))
    }

    fn create(&mut self, content: Content) -> UnitId {
        let id = UnitId(self.units.len());
        self.units.push(UnitData {
            content,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn span(&self, id: SpanId) -> Result<SpanData> {
        match self.spans.get(id.0) {
            Some(Some(data)) if data.valid => Ok(*data),
            Some(Some(_)) => Err(Error::span_violation(
                Some(id),
                "boundaries were invalidated when their container was deleted",
            )),
            _ => Err(Error::span_violation(Some(id), "span is closed")),
        }
    }

    fn span_mut(&mut self, id: SpanId) -> Result<&mut SpanData> {
        self.span(id)?;
        match self.spans.get_mut(id.0) {
            Some(Some(data)) => Ok(data),
            _ => Err(Error::span_violation(Some(id), "span is closed")),
        }
    }

    fn element_children_len(&self, container: UnitId) -> Result<usize> {
        let unit = self.unit(container)?;
        match unit.content {
            Content::Element { .. } => Ok(unit.children.len()),
            Content::Text(_) => Err(Error::Host {
                reason: format!("text unit {container:?} cannot contain children"),
            }),
        }
    }

    fn check_boundary(&self, span: Option<SpanId>, point: Boundary) -> Result<()> {
        let len = self.element_children_len(point.container)?;
        if point.offset > len {
            return Err(Error::span_violation(
                span,
                format!(
                    "offset {} is past the end of {:?} ({} children)",
                    point.offset, point.container, len
                ),
            ));
        }
        Ok(())
    }

    /// Position of an attached unit within its parent.
    fn index_of(&self, unit: UnitId) -> Result<(UnitId, usize)> {
        let parent = self.unit(unit)?.parent.ok_or_else(|| Error::Host {
            reason: format!("unit {unit:?} is not attached to a parent"),
        })?;
        let index = self
            .unit(parent)?
            .children
            .iter()
            .position(|&child| child == unit)
            .ok_or(Error::UnknownUnit(unit))?;
        Ok((parent, index))
    }

    fn is_inclusive_ancestor(&self, ancestor: UnitId, mut node: UnitId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.units.get(node.0).and_then(|u| u.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn insert_child(&mut self, parent: UnitId, index: usize, unit: UnitId) -> Result<()> {
        let len = self.element_children_len(parent)?;
        if index > len {
            return Err(Error::Host {
                reason: format!("insert index {index} past end of {parent:?}"),
            });
        }
        if self.unit(unit)?.parent.is_some() {
            return Err(Error::Host {
                reason: format!("unit {unit:?} is already attached"),
            });
        }
        if self.is_inclusive_ancestor(unit, parent) {
            return Err(Error::Host {
                reason: format!("cannot insert {unit:?} into its own subtree"),
            });
        }

        self.unit_mut(parent)?.children.insert(index, unit);
        self.unit_mut(unit)?.parent = Some(parent);

        for data in self.spans.iter_mut().flatten() {
            for point in [&mut data.start, &mut data.end] {
                if point.container == parent && point.offset > index {
                    point.offset += 1;
                }
            }
        }

        self.mutations.push(Mutation::Insert { parent, index, unit });
        Ok(())
    }

    fn remove_child(&mut self, parent: UnitId, index: usize) -> Result<UnitId> {
        let children = &mut self.unit_mut(parent)?.children;
        if index >= children.len() {
            return Err(Error::Host {
                reason: format!("remove index {index} past end of {parent:?}"),
            });
        }
        let unit = children.remove(index);
        self.unit_mut(unit)?.parent = None;

        // Spans anchored inside the removed subtree are now meaningless.
        let doomed: Vec<usize> = self
            .spans
            .iter()
            .enumerate()
            .filter_map(|(slot, data)| {
                let data = data.as_ref()?;
                let inside = self.is_inclusive_ancestor(unit, data.start.container)
                    || self.is_inclusive_ancestor(unit, data.end.container);
                inside.then_some(slot)
            })
            .collect();
        for slot in doomed {
            if let Some(Some(data)) = self.spans.get_mut(slot) {
                data.valid = false;
            }
        }

        for data in self.spans.iter_mut().flatten() {
            for point in [&mut data.start, &mut data.end] {
                if point.container == parent && point.offset > index {
                    point.offset -= 1;
                }
            }
        }

        self.mutations.push(Mutation::Remove { parent, index, unit });
        Ok(unit)
    }

    fn write_html(&self, unit: UnitId, out: &mut String) -> Result<()> {
        let data = self.unit(unit)?;
        match &data.content {
            Content::Text(content) => out.push_str(&escape(content)),
            Content::Element { tag, attributes, .. } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{}\"", escape(value));
                }
                out.push('>');
                for &child in &data.children {
                    self.write_html(child, out)?;
                }
                let _ = write!(out, "</{tag}>");
            }
        }
        Ok(())
    }

    fn write_text(&self, unit: UnitId, out: &mut String) -> Result<()> {
        let data = self.unit(unit)?;
        if let Content::Text(content) = &data.content {
            out.push_str(content);
        }
        for &child in &data.children {
            self.write_text(child, out)?;
        }
        Ok(())
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn collapse_end_to_start(data: &mut SpanData) {
    if data.end.container != data.start.container || data.end.offset < data.start.offset {
        data.end = data.start;
    }
}

fn collapse_start_to_end(data: &mut SpanData) {
    if data.start.container != data.end.container || data.start.offset > data.end.offset {
        data.start = data.end;
    }
}

// =============================================================================
// HeadlessDocument
// =============================================================================

/// In-memory document with a `<body>` root.
pub struct HeadlessDocument {
    inner: RefCell<Inner>,
}

impl HeadlessDocument {
    /// Create an empty document. The body element is not logged as a mutation.
    pub fn new() -> Rc<Self> {
        let mut inner = Inner {
            units: Vec::new(),
            spans: Vec::new(),
            free_spans: Vec::new(),
            mutations: Vec::new(),
            body: UnitId(0),
        };
        inner.body = inner.create(Content::Element {
            tag: "body".to_string(),
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
        });
        Rc::new(Self {
            inner: RefCell::new(inner),
        })
    }

    /// The root container.
    pub fn body(&self) -> UnitId {
        self.inner.borrow().body
    }

    /// Append a detached unit to a container, outside of any span.
    pub fn append_child(&self, parent: UnitId, unit: UnitId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let len = inner.element_children_len(parent)?;
        inner.insert_child(parent, len, unit)
    }

    pub fn children(&self, unit: UnitId) -> Result<Vec<UnitId>> {
        Ok(self.inner.borrow().unit(unit)?.children.clone())
    }

    pub fn parent(&self, unit: UnitId) -> Result<Option<UnitId>> {
        Ok(self.inner.borrow().unit(unit)?.parent)
    }

    pub fn kind(&self, unit: UnitId) -> Result<UnitKind> {
        let inner = self.inner.borrow();
        Ok(match &inner.unit(unit)?.content {
            Content::Element { tag, .. } => UnitKind::Element { tag: tag.clone() },
            Content::Text(content) => UnitKind::Text {
                content: content.clone(),
            },
        })
    }

    /// Tag name of an element, `None` for text.
    pub fn tag(&self, unit: UnitId) -> Result<Option<String>> {
        Ok(match self.kind(unit)? {
            UnitKind::Element { tag } => Some(tag),
            UnitKind::Text { .. } => None,
        })
    }

    pub fn attribute(&self, unit: UnitId, name: &str) -> Result<Option<String>> {
        let inner = self.inner.borrow();
        Ok(match &inner.unit(unit)?.content {
            Content::Element { attributes, .. } => attributes.get(name).cloned(),
            Content::Text(_) => None,
        })
    }

    pub fn has_listener(&self, unit: UnitId, event: &str) -> bool {
        let inner = self.inner.borrow();
        match inner.unit(unit).map(|u| &u.content) {
            Ok(Content::Element { listeners, .. }) => listeners.iter().any(|(e, _)| e == event),
            _ => false,
        }
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, unit: UnitId) -> Result<String> {
        let mut out = String::new();
        self.inner.borrow().write_text(unit, &mut out)?;
        Ok(out)
    }

    /// Serialise a unit and its subtree.
    pub fn to_html(&self, unit: UnitId) -> Result<String> {
        let mut out = String::new();
        self.inner.borrow().write_html(unit, &mut out)?;
        Ok(out)
    }

    /// Serialise only the children of a container.
    pub fn inner_html(&self, unit: UnitId) -> Result<String> {
        let inner = self.inner.borrow();
        let mut out = String::new();
        for &child in &inner.unit(unit)?.children {
            inner.write_html(child, &mut out)?;
        }
        Ok(out)
    }

    /// All descendant elements with `tag`, in document order.
    pub fn find_all(&self, root: UnitId, tag: &str) -> Result<Vec<UnitId>> {
        let inner = self.inner.borrow();
        let mut found = Vec::new();
        let mut stack: Vec<UnitId> = inner.unit(root)?.children.iter().rev().copied().collect();
        while let Some(unit) = stack.pop() {
            let data = inner.unit(unit)?;
            if let Content::Element { tag: t, .. } = &data.content {
                if t == tag {
                    found.push(unit);
                }
            }
            stack.extend(data.children.iter().rev().copied());
        }
        Ok(found)
    }

    /// Deliver an event to `unit`, bubbling up through its ancestors.
    ///
    /// The listener list is collected before any listener runs, and no
    /// internal borrow is held while they run, so listeners may mutate the
    /// document. Returns the number of listeners invoked.
    pub fn dispatch(&self, unit: UnitId, event: &str) -> Result<usize> {
        let listeners: Vec<Callback> = {
            let inner = self.inner.borrow();
            let mut collected = Vec::new();
            let mut current = Some(unit);
            while let Some(id) = current {
                let data = inner.unit(id)?;
                if let Content::Element { listeners, .. } = &data.content {
                    collected.extend(
                        listeners
                            .iter()
                            .filter(|(name, _)| name == event)
                            .map(|(_, cb)| cb.clone()),
                    );
                }
                current = data.parent;
            }
            collected
        };

        trace!(?unit, event, listeners = listeners.len(), "dispatching event");
        let payload = json!({ "type": event });
        for listener in &listeners {
            listener.call(&payload)?;
        }
        Ok(listeners.len())
    }

    /// Snapshot of the mutation log.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.inner.borrow().mutations.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.inner.borrow().mutations.len()
    }

    /// Drain the mutation log.
    pub fn take_mutations(&self) -> Vec<Mutation> {
        std::mem::take(&mut self.inner.borrow_mut().mutations)
    }

    /// Number of spans currently open.
    pub fn open_span_count(&self) -> usize {
        self.inner.borrow().spans.iter().flatten().count()
    }
}

// =============================================================================
// Host Implementation
// =============================================================================

impl Host for HeadlessDocument {
    fn create_element(&self, tag: &str) -> UnitId {
        let mut inner = self.inner.borrow_mut();
        let unit = inner.create(Content::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
        });
        inner.mutations.push(Mutation::Create { unit });
        unit
    }

    fn create_text(&self, content: &str) -> UnitId {
        let mut inner = self.inner.borrow_mut();
        let unit = inner.create(Content::Text(content.to_string()));
        inner.mutations.push(Mutation::Create { unit });
        unit
    }

    fn set_attribute(&self, unit: UnitId, name: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        match &mut inner.unit_mut(unit)?.content {
            Content::Element { attributes, .. } => {
                attributes.insert(name.to_string(), value.to_string());
            }
            Content::Text(_) => {
                return Err(Error::Host {
                    reason: format!("cannot set attribute '{name}' on text unit {unit:?}"),
                });
            }
        }
        inner.mutations.push(Mutation::SetAttribute {
            unit,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn add_event_listener(&self, unit: UnitId, event: &str, callback: Callback) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        match &mut inner.unit_mut(unit)?.content {
            Content::Element { listeners, .. } => listeners.push((event.to_string(), callback)),
            Content::Text(_) => {
                return Err(Error::Host {
                    reason: format!("cannot listen for '{event}' on text unit {unit:?}"),
                });
            }
        }
        inner.mutations.push(Mutation::AddListener {
            unit,
            event: event.to_string(),
        });
        Ok(())
    }

    fn child_count(&self, container: UnitId) -> Result<usize> {
        self.inner.borrow().element_children_len(container)
    }

    fn open_span(&self, start: Boundary, end: Boundary) -> Result<SpanId> {
        let mut inner = self.inner.borrow_mut();
        inner.check_boundary(None, start)?;
        inner.check_boundary(None, end)?;
        let data = SpanData {
            start,
            end,
            valid: true,
        };
        let slot = match inner.free_spans.pop() {
            Some(slot) => {
                inner.spans[slot] = Some(data);
                slot
            }
            None => {
                inner.spans.push(Some(data));
                inner.spans.len() - 1
            }
        };
        Ok(SpanId(slot))
    }

    fn close_span(&self, span: SpanId) {
        let inner = &mut *self.inner.borrow_mut();
        if let Some(slot) = inner.spans.get_mut(span.0) {
            if slot.take().is_some() {
                inner.free_spans.push(span.0);
            }
        }
    }

    fn span_bounds(&self, span: SpanId) -> Result<(Boundary, Boundary)> {
        let data = self.inner.borrow().span(span)?;
        Ok((data.start, data.end))
    }

    fn insert(&self, span: SpanId, unit: UnitId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let data = inner.span(span)?;
        inner.check_boundary(Some(span), data.start)?;
        inner.insert_child(data.start.container, data.start.offset, unit)?;
        if data.start == data.end {
            let grown = inner.span_mut(span)?;
            grown.end = Boundary::new(data.start.container, data.start.offset + 1);
        }
        Ok(())
    }

    fn delete_contents(&self, span: SpanId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let data = inner.span(span)?;
        if data.start.container != data.end.container {
            return Err(Error::span_violation(
                Some(span),
                "cannot delete a span whose boundaries sit in different containers",
            ));
        }
        inner.check_boundary(Some(span), data.end)?;
        loop {
            let data = inner.span(span)?;
            if data.end.offset <= data.start.offset {
                break;
            }
            inner.remove_child(data.start.container, data.start.offset)?;
        }
        Ok(())
    }

    fn set_start_before(&self, span: SpanId, unit: UnitId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let (parent, index) = inner.index_of(unit)?;
        let data = inner.span_mut(span)?;
        data.start = Boundary::new(parent, index);
        collapse_end_to_start(data);
        Ok(())
    }

    fn set_start_after(&self, span: SpanId, unit: UnitId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let (parent, index) = inner.index_of(unit)?;
        let data = inner.span_mut(span)?;
        data.start = Boundary::new(parent, index + 1);
        collapse_end_to_start(data);
        Ok(())
    }

    fn set_end_after(&self, span: SpanId, unit: UnitId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let (parent, index) = inner.index_of(unit)?;
        let data = inner.span_mut(span)?;
        data.end = Boundary::new(parent, index + 1);
        collapse_start_to_end(data);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_new_document_has_empty_body() {
        let doc = HeadlessDocument::new();
        assert_eq!(doc.tag(doc.body()).unwrap().as_deref(), Some("body"));
        assert!(doc.children(doc.body()).unwrap().is_empty());
        assert_eq!(doc.mutation_count(), 0);
    }

    #[test]
    fn test_to_html_escapes_and_sorts_attributes() {
        let doc = HeadlessDocument::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "title", "a<b").unwrap();
        doc.set_attribute(div, "class", "x").unwrap();
        let text = doc.create_text("1 & 2");
        doc.append_child(div, text).unwrap();
        doc.append_child(doc.body(), div).unwrap();

        assert_eq!(
            doc.inner_html(doc.body()).unwrap(),
            r#"<div class="x" title="a&lt;b">1 &amp; 2</div>"#
        );
        assert_eq!(doc.text_content(div).unwrap(), "1 & 2");
    }

    #[test]
    fn test_insert_at_shared_boundary_extends_following_span() {
        let doc = HeadlessDocument::new();
        let body = doc.body();
        for label in ["a", "b"] {
            let unit = doc.create_text(label);
            doc.append_child(body, unit).unwrap();
        }
        let before = doc.open_span(Boundary::new(body, 0), Boundary::new(body, 1)).unwrap();
        let after = doc.open_span(Boundary::new(body, 1), Boundary::new(body, 2)).unwrap();

        let tail = doc.open_span(Boundary::new(body, 1), Boundary::new(body, 1)).unwrap();
        let new = doc.create_text("x");
        doc.insert(tail, new).unwrap();

        assert_eq!(doc.span_bounds(before).unwrap().1, Boundary::new(body, 1));
        // A start sitting exactly on the insertion point does not move.
        assert_eq!(doc.span_bounds(after).unwrap(), (Boundary::new(body, 1), Boundary::new(body, 3)));
        assert_eq!(doc.span_bounds(tail).unwrap(), (Boundary::new(body, 1), Boundary::new(body, 2)));
    }

    #[test]
    fn test_removed_container_invalidates_inner_spans() {
        let doc = HeadlessDocument::new();
        let body = doc.body();
        let div = doc.create_element("div");
        doc.append_child(body, div).unwrap();
        let inner_span = doc.open_span(Boundary::new(div, 0), Boundary::new(div, 0)).unwrap();
        let outer = doc.open_span(Boundary::new(body, 0), Boundary::new(body, 1)).unwrap();

        doc.delete_contents(outer).unwrap();

        let err = doc.insert(inner_span, doc.create_text("late")).unwrap_err();
        assert!(err.is_span_violation());
        assert!(doc.span_bounds(outer).is_ok());
    }

    #[test]
    fn test_closed_span_is_a_violation() {
        let doc = HeadlessDocument::new();
        let span = doc.open_span(Boundary::new(doc.body(), 0), Boundary::new(doc.body(), 0)).unwrap();
        doc.close_span(span);
        assert!(doc.span_bounds(span).unwrap_err().is_span_violation());
    }

    #[test]
    fn test_open_span_rejects_out_of_range_offset() {
        let doc = HeadlessDocument::new();
        let err = doc
            .open_span(Boundary::new(doc.body(), 0), Boundary::new(doc.body(), 3))
            .unwrap_err();
        assert!(err.is_span_violation());
    }

    #[test]
    fn test_dispatch_bubbles_to_ancestors() {
        let doc = HeadlessDocument::new();
        let outer = doc.create_element("div");
        let button = doc.create_element("button");
        let label = doc.create_text("go");
        doc.append_child(doc.body(), outer).unwrap();
        doc.append_child(outer, button).unwrap();
        doc.append_child(button, label).unwrap();

        let hits = Rc::new(Cell::new(0));
        for unit in [outer, button] {
            let hits = hits.clone();
            doc.add_event_listener(
                unit,
                "click",
                Callback::new(move |payload| {
                    assert_eq!(payload["type"], "click");
                    hits.set(hits.get() + 1);
                    Ok(())
                }),
            )
            .unwrap();
        }

        assert_eq!(doc.dispatch(label, "click").unwrap(), 2);
        assert_eq!(hits.get(), 2);
        assert_eq!(doc.dispatch(label, "keydown").unwrap(), 0);
    }

    #[test]
    fn test_listener_can_mutate_document() {
        let doc = HeadlessDocument::new();
        let button = doc.create_element("button");
        doc.append_child(doc.body(), button).unwrap();

        let weak = Rc::downgrade(&doc);
        doc.add_event_listener(
            button,
            "click",
            Callback::new(move |_| {
                if let Some(doc) = weak.upgrade() {
                    let text = doc.create_text("clicked");
                    doc.append_child(doc.body(), text)?;
                }
                Ok(())
            }),
        )
        .unwrap();

        doc.dispatch(button, "click").unwrap();
        assert_eq!(doc.text_content(doc.body()).unwrap(), "clicked");
    }

    #[test]
    fn test_find_all_in_document_order() {
        let doc = HeadlessDocument::new();
        let list = doc.create_element("ol");
        doc.append_child(doc.body(), list).unwrap();
        let first = doc.create_element("li");
        let second = doc.create_element("li");
        doc.append_child(list, first).unwrap();
        doc.append_child(list, second).unwrap();

        assert_eq!(doc.find_all(doc.body(), "li").unwrap(), vec![first, second]);
    }
}
