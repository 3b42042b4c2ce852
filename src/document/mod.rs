//! Document - Host abstraction and the span patching protocol.
//!
//! Everything above this module touches the live document only through
//! [`DocumentSpan`]s. A span is a contiguous range of a container's content,
//! described by two boundary points:
//!
//! ```text
//! container: <div>  [ a ][ b ][ c ]
//!                  0    1    2    3      (offsets)
//! span over b:        start=(div,1) end=(div,2)
//! ```
//!
//! Boundaries are live. When the host inserts or removes a unit in a
//! container, every open span with a boundary past that point shifts, so a
//! sibling's span keeps wrapping the same content.
//!
//! Any rendering backend implements [`Host`]. The bundled
//! [`HeadlessDocument`] keeps the tree in memory.

mod headless;

pub use headless::{HeadlessDocument, Mutation, UnitKind};

use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::types::Callback;

// =============================================================================
// Handles
// =============================================================================

/// Opaque handle to a unit (element or text) in a host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub usize);

/// Opaque handle to an open span in a host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(pub usize);

/// A boundary point: an offset between the children of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub container: UnitId,
    pub offset: usize,
}

impl Boundary {
    pub const fn new(container: UnitId, offset: usize) -> Self {
        Self { container, offset }
    }
}

// =============================================================================
// Host
// =============================================================================

/// A live document the engine can render into.
///
/// Methods take `&self`; implementations use interior mutability so that
/// event listeners invoked by the host can re-enter the engine.
pub trait Host {
    /// Create a detached element unit.
    fn create_element(&self, tag: &str) -> UnitId;

    /// Create a detached text unit.
    fn create_text(&self, content: &str) -> UnitId;

    /// Set a literal attribute on an element.
    fn set_attribute(&self, unit: UnitId, name: &str, value: &str) -> Result<()>;

    /// Register an event listener on an element.
    fn add_event_listener(&self, unit: UnitId, event: &str, callback: Callback) -> Result<()>;

    /// Number of children of a container.
    fn child_count(&self, container: UnitId) -> Result<usize>;

    /// Open a new live span between two boundaries.
    fn open_span(&self, start: Boundary, end: Boundary) -> Result<SpanId>;

    /// Forget a span. Unknown ids are ignored.
    fn close_span(&self, span: SpanId);

    /// Current boundaries of a span.
    fn span_bounds(&self, span: SpanId) -> Result<(Boundary, Boundary)>;

    /// Insert a detached unit at the start of a span.
    fn insert(&self, span: SpanId, unit: UnitId) -> Result<()>;

    /// Remove every unit inside a span, collapsing it.
    fn delete_contents(&self, span: SpanId) -> Result<()>;

    /// Move the span's start to just before `unit`.
    fn set_start_before(&self, span: SpanId, unit: UnitId) -> Result<()>;

    /// Move the span's start to just after `unit`.
    fn set_start_after(&self, span: SpanId, unit: UnitId) -> Result<()>;

    /// Move the span's end to just after `unit`.
    fn set_end_after(&self, span: SpanId, unit: UnitId) -> Result<()>;
}

// =============================================================================
// DocumentSpan
// =============================================================================

/// An owned span in a host document.
///
/// Exactly one node owns a span at a time. The type is deliberately not
/// `Clone`; handing a span to another node is a move. Dropping the span
/// closes it in the host.
pub struct DocumentSpan {
    host: Rc<dyn Host>,
    id: SpanId,
}

impl DocumentSpan {
    /// Open a span between two boundaries.
    pub fn new(host: Rc<dyn Host>, start: Boundary, end: Boundary) -> Result<Self> {
        let id = host.open_span(start, end)?;
        Ok(Self { host, id })
    }

    /// A span covering the entire current content of `container`.
    pub fn covering(host: Rc<dyn Host>, container: UnitId) -> Result<Self> {
        let len = host.child_count(container)?;
        Self::new(host, Boundary::new(container, 0), Boundary::new(container, len))
    }

    /// A collapsed span positioned at the end of `container`'s current content.
    pub fn at_end_of(host: Rc<dyn Host>, container: UnitId) -> Result<Self> {
        let len = host.child_count(container)?;
        let point = Boundary::new(container, len);
        Self::new(host, point, point)
    }

    /// A collapsed span positioned immediately after this one.
    pub fn after(&self) -> Result<Self> {
        let (_, end) = self.bounds()?;
        Self::new(self.host.clone(), end, end)
    }

    /// The host this span lives in.
    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn id(&self) -> SpanId {
        self.id
    }

    /// Current boundaries.
    pub fn bounds(&self) -> Result<(Boundary, Boundary)> {
        self.host.span_bounds(self.id)
    }

    /// True when start and end coincide.
    pub fn is_collapsed(&self) -> Result<bool> {
        let (start, end) = self.bounds()?;
        Ok(start == end)
    }

    pub fn insert(&self, unit: UnitId) -> Result<()> {
        self.host.insert(self.id, unit)
    }

    pub fn delete_contents(&self) -> Result<()> {
        self.host.delete_contents(self.id)
    }

    pub fn set_start_before(&self, unit: UnitId) -> Result<()> {
        self.host.set_start_before(self.id, unit)
    }

    pub fn set_start_after(&self, unit: UnitId) -> Result<()> {
        self.host.set_start_after(self.id, unit)
    }

    pub fn set_end_after(&self, unit: UnitId) -> Result<()> {
        self.host.set_end_after(self.id, unit)
    }

    /// Atomically replace the span's contents with `unit`.
    ///
    /// The new unit goes in first, then the old contents are deleted, then
    /// the span is reset to wrap exactly the new unit. Deleting first would
    /// leave the span momentarily empty, and an empty span sitting on a
    /// sibling's boundary gets absorbed into that sibling on the next insert.
    pub fn replace_contents(&self, unit: UnitId) -> Result<()> {
        self.insert(unit)?;
        self.set_start_after(unit)?;
        self.delete_contents()?;
        self.set_start_before(unit)?;
        self.set_end_after(unit)
    }
}

impl Drop for DocumentSpan {
    fn drop(&mut self) {
        self.host.close_span(self.id);
    }
}

impl fmt::Debug for DocumentSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DocumentSpan").field(&self.id).finish()
    }
}

/// Error for an operation that needs a span on a node that has none.
pub(crate) fn missing_span(what: &str) -> Error {
    Error::span_violation(None, format!("{what} has no span; it was never mounted"))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> (Rc<HeadlessDocument>, Rc<dyn Host>) {
        let doc = HeadlessDocument::new();
        let host: Rc<dyn Host> = doc.clone();
        (doc, host)
    }

    #[test]
    fn test_replace_contents_wraps_new_unit() {
        let (doc, host) = doc();
        let body = doc.body();
        let old = doc.create_text("old");
        doc.append_child(body, old).unwrap();

        let span = DocumentSpan::covering(host, body).unwrap();
        let new = doc.create_text("new");
        span.replace_contents(new).unwrap();

        assert_eq!(doc.children(body).unwrap(), vec![new]);
        let (start, end) = span.bounds().unwrap();
        assert_eq!(start, Boundary::new(body, 0));
        assert_eq!(end, Boundary::new(body, 1));
    }

    #[test]
    fn test_replace_keeps_sibling_spans_apart() {
        let (doc, host) = doc();
        let body = doc.body();
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        doc.append_child(body, a).unwrap();
        doc.append_child(body, b).unwrap();

        let first = DocumentSpan::new(host.clone(), Boundary::new(body, 0), Boundary::new(body, 1)).unwrap();
        let second = DocumentSpan::new(host, Boundary::new(body, 1), Boundary::new(body, 2)).unwrap();

        let replacement = doc.create_text("A");
        first.replace_contents(replacement).unwrap();

        assert_eq!(doc.text_content(body).unwrap(), "Ab");
        assert_eq!(first.bounds().unwrap(), (Boundary::new(body, 0), Boundary::new(body, 1)));
        assert_eq!(second.bounds().unwrap(), (Boundary::new(body, 1), Boundary::new(body, 2)));
    }

    #[test]
    fn test_delete_first_absorbs_into_neighbour() {
        // The unsafe ordering: delete, then insert into the collapsed span.
        let (doc, host) = doc();
        let body = doc.body();
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        doc.append_child(body, a).unwrap();
        doc.append_child(body, b).unwrap();

        let first = DocumentSpan::new(host.clone(), Boundary::new(body, 0), Boundary::new(body, 1)).unwrap();
        let second = DocumentSpan::new(host, Boundary::new(body, 1), Boundary::new(body, 2)).unwrap();
        first.delete_contents().unwrap();

        // `first` is now collapsed on `second`'s start. The shared start does
        // not move on insert, so the new unit ends up inside `second` as well.
        let c = doc.create_text("c");
        first.insert(c).unwrap();
        assert_eq!(first.bounds().unwrap(), (Boundary::new(body, 0), Boundary::new(body, 1)));
        assert_eq!(second.bounds().unwrap(), (Boundary::new(body, 0), Boundary::new(body, 2)));
    }

    #[test]
    fn test_after_is_collapsed_at_end() {
        let (doc, host) = doc();
        let body = doc.body();
        let a = doc.create_text("a");
        doc.append_child(body, a).unwrap();

        let span = DocumentSpan::covering(host, body).unwrap();
        let tail = span.after().unwrap();
        assert!(tail.is_collapsed().unwrap());
        assert_eq!(tail.bounds().unwrap().0, Boundary::new(body, 1));
    }

    #[test]
    fn test_drop_closes_span() {
        let (doc, host) = doc();
        let span = DocumentSpan::at_end_of(host, doc.body()).unwrap();
        assert_eq!(doc.open_span_count(), 1);
        drop(span);
        assert_eq!(doc.open_span_count(), 0);
    }
}
