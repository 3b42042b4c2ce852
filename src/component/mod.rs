//! Component - stateful node producers.
//!
//! A component is any type implementing [`Component`]. The engine wraps it
//! in a [`ComponentRef`], which holds the props written by the builder, the
//! pre-render children, the current state and, once mounted, the previous
//! virtual tree snapshot used as the diff baseline.
//!
//! # State updates
//!
//! ```text
//! set_state(partial)
//!   ├─ state is an object   → merge → render → reconcile(snapshot, new) → store new
//!   └─ state is not object  → replace → render → mount fresh into snapshot's span
//! ```
//!
//! Each call runs its render and patch synchronously before returning.
//!
//! Only a component passed to [`crate::mount`] owns a snapshot. Components
//! nested inside another component's output are re-created on every parent
//! render and expanded into the parent's virtual tree.

mod state;

pub use state::merge_state;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::document::{missing_span, DocumentSpan};
use crate::error::{Error, Result};
use crate::node::{Mount, Node, NodeTarget, VNode};
use crate::reconciler::{reconcile, PatchSummary};
use crate::types::{Callback, PropValue, Props};

// =============================================================================
// Component Trait
// =============================================================================

/// A stateful node producer.
pub trait Component: 'static {
    /// Produce this component's node for the current props and state.
    fn render(&self, cx: &Context) -> Result<Node>;

    /// State held before the first render. `None` means no state.
    fn initial_state(&self) -> Option<Value> {
        None
    }

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

// =============================================================================
// Render Context
// =============================================================================

/// Everything a component can read while rendering.
pub struct Context {
    props: Props,
    state: Value,
    children: Vec<Node>,
    handle: ComponentHandle,
}

impl Context {
    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    /// Deserialize a structured prop. Absent props yield `None`.
    pub fn prop_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.props.get(name).and_then(PropValue::to_json) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// A callback prop, cloned.
    pub fn callback(&self, name: &str) -> Option<Callback> {
        self.props.get(name).and_then(PropValue::as_callback).cloned()
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.state)?)
    }

    /// Children appended by the builder before render.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Handle for updating this component's state from callbacks.
    pub fn handle(&self) -> ComponentHandle {
        self.handle.clone()
    }
}

// =============================================================================
// ComponentRef
// =============================================================================

struct Inner {
    behavior: Box<dyn Component>,
    props: RefCell<Props>,
    children: RefCell<Vec<Node>>,
    state: RefCell<Value>,
    snapshot: RefCell<Option<VNode>>,
    detached: Cell<bool>,
}

/// A shared component instance.
#[derive(Clone)]
pub struct ComponentRef(Rc<Inner>);

impl ComponentRef {
    pub fn new(behavior: impl Component) -> Self {
        let state = behavior.initial_state().unwrap_or(Value::Null);
        Self(Rc::new(Inner {
            behavior: Box::new(behavior),
            props: RefCell::new(Props::new()),
            children: RefCell::new(Vec::new()),
            state: RefCell::new(state),
            snapshot: RefCell::new(None),
            detached: Cell::new(false),
        }))
    }

    pub fn name(&self) -> &'static str {
        self.0.behavior.name()
    }

    /// Write a prop. Meant for use before the first render.
    pub fn set_attribute(&self, name: &str, value: impl Into<PropValue>) {
        self.0.props.borrow_mut().insert(name.to_string(), value.into());
    }

    /// Append a pre-render child.
    pub fn append_child(&self, child: impl Into<Node>) {
        self.0.children.borrow_mut().push(child.into());
    }

    pub fn props(&self) -> Props {
        self.0.props.borrow().clone()
    }

    pub fn state(&self) -> Value {
        self.0.state.borrow().clone()
    }

    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&*self.0.state.borrow())?)
    }

    pub fn handle(&self) -> ComponentHandle {
        ComponentHandle(Rc::downgrade(&self.0))
    }

    /// True once mounted and until unmounted.
    pub fn is_mounted(&self) -> bool {
        self.0
            .snapshot
            .borrow()
            .as_ref()
            .is_some_and(VNode::is_mounted)
    }

    /// True after a patch failed part way through. The document region is
    /// then unknown and further updates are refused until the component is
    /// mounted again.
    pub fn is_detached(&self) -> bool {
        self.0.detached.get()
    }

    /// Run `f` against the current snapshot, if any.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(Option<&VNode>) -> R) -> R {
        f(self.0.snapshot.borrow().as_ref())
    }

    /// Call the component's render with a fresh context.
    pub fn render(&self) -> Result<Node> {
        let cx = Context {
            props: self.props(),
            state: self.state(),
            children: self.0.children.borrow().clone(),
            handle: self.handle(),
        };
        self.0.behavior.render(&cx)
    }

    /// Render and expand nested components.
    pub fn to_virtual_tree(&self) -> Result<VNode> {
        self.render()?.to_virtual_tree()
    }

    /// Update state and re-render.
    ///
    /// An object state is merged with [`merge_state`] and the new tree is
    /// reconciled against the snapshot. A missing or non-object state is
    /// replaced and the subtree is mounted fresh into the existing span.
    ///
    /// A render whose props break the attribute conventions fails before
    /// the document is touched; the previous tree stays mounted and the next
    /// valid update patches against it. A detached component returns
    /// [`Error::SpanViolation`].
    pub fn set_state(&self, partial: Value) -> Result<()> {
        if self.is_detached() {
            return Err(Error::span_violation(
                None,
                format!("{} is detached after a failed update", self.name()),
            ));
        }

        let replaced = {
            let mut state = self.0.state.borrow_mut();
            if state.is_object() {
                merge_state(&mut state, partial);
                false
            } else {
                *state = partial;
                true
            }
        };

        if !self.is_mounted() {
            debug!(component = self.name(), "state set on unmounted component");
            return Ok(());
        }

        if replaced {
            self.rerender()
        } else {
            self.update().map(|_| ())
        }
    }

    /// Render and reconcile against the snapshot.
    pub(crate) fn update(&self) -> Result<PatchSummary> {
        let mut next = self.to_virtual_tree()?;
        next.validate()?;
        let previous = self
            .0
            .snapshot
            .borrow_mut()
            .take()
            .ok_or_else(|| missing_span(self.name()))?;
        let summary = reconcile(previous, &mut next).inspect_err(|err| self.detach(err))?;
        debug!(component = self.name(), ?summary, "updated");
        *self.0.snapshot.borrow_mut() = Some(next);
        Ok(summary)
    }

    /// Render and mount fresh into the snapshot's span.
    fn rerender(&self) -> Result<()> {
        let mut next = self.to_virtual_tree()?;
        next.validate()?;
        let span = self
            .0
            .snapshot
            .borrow_mut()
            .take()
            .and_then(|mut previous| previous.take_span())
            .ok_or_else(|| missing_span(self.name()))?;
        next.mount_into(span).inspect_err(|err| self.detach(err))?;
        debug!(component = self.name(), "remounted after state replacement");
        *self.0.snapshot.borrow_mut() = Some(next);
        Ok(())
    }

    /// First mount: render, expand and realise into `span`.
    pub(crate) fn mount_into(&self, span: DocumentSpan) -> Result<()> {
        let mut tree = self.to_virtual_tree()?;
        tree.validate()?;
        tree.mount_into(span)?;
        debug!(component = self.name(), nodes = tree.count(), "mounted");
        *self.0.snapshot.borrow_mut() = Some(tree);
        self.0.detached.set(false);
        Ok(())
    }

    fn detach(&self, err: &Error) {
        error!(component = self.name(), %err, "patch failed, component detached");
        self.0.detached.set(true);
    }

    /// Delete the mounted content and drop the snapshot.
    pub(crate) fn unmount(&self) -> Result<()> {
        let snapshot = self.0.snapshot.borrow_mut().take();
        self.0.detached.set(false);
        if let Some(span) = snapshot.as_ref().and_then(VNode::span) {
            span.delete_contents()?;
            debug!(component = self.name(), "unmounted");
        }
        Ok(())
    }
}

impl NodeTarget for ComponentRef {
    fn set_attribute(&mut self, name: &str, value: PropValue) {
        ComponentRef::set_attribute(self, name, value);
    }

    fn append_child(&mut self, child: Node) {
        ComponentRef::append_child(self, child);
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("name", &self.name())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

// =============================================================================
// ComponentHandle
// =============================================================================

/// Weak handle to a component, for capture in callbacks.
#[derive(Clone)]
pub struct ComponentHandle(Weak<Inner>);

impl ComponentHandle {
    pub fn upgrade(&self) -> Option<ComponentRef> {
        self.0.upgrade().map(ComponentRef)
    }

    /// Forward to [`ComponentRef::set_state`]. A dropped component ignores
    /// the call.
    pub fn set_state(&self, partial: Value) -> Result<()> {
        match self.upgrade() {
            Some(component) => component.set_state(partial),
            None => {
                warn!("set_state on a dropped component ignored");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentHandle")
            .field(&(self.0.strong_count() > 0))
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
