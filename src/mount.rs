//! Mount API - attach a root component to a host container.
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::{mount, ComponentRef, HeadlessDocument};
//!
//! let doc = HeadlessDocument::new();
//! let game = ComponentRef::new(Game);
//! let handle = mount(&game, &doc, doc.body())?;
//!
//! // ... events drive set_state ...
//!
//! handle.unmount()?;
//! ```

use std::rc::Rc;

use tracing::info;

use crate::component::ComponentRef;
use crate::document::{DocumentSpan, Host, UnitId};
use crate::error::Result;

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`mount`].
///
/// Dropping the handle leaves the content in place; call
/// [`MountHandle::unmount`] to remove it.
#[derive(Debug)]
pub struct MountHandle {
    root: ComponentRef,
    container: UnitId,
}

impl MountHandle {
    /// The mounted root component.
    pub fn component(&self) -> &ComponentRef {
        &self.root
    }

    pub fn container(&self) -> UnitId {
        self.container
    }

    /// Delete the mounted content and drop the root's snapshot.
    pub fn unmount(self) -> Result<()> {
        self.root.unmount()?;
        info!(component = self.root.name(), container = ?self.container, "unmounted");
        Ok(())
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Mount `component` into `container`, replacing whatever it held.
///
/// Opens a span covering the container's current content, deletes that
/// content, then renders the component into the span.
pub fn mount<H>(component: &ComponentRef, host: &Rc<H>, container: UnitId) -> Result<MountHandle>
where
    H: Host + 'static,
{
    let host: Rc<dyn Host> = host.clone();
    let span = DocumentSpan::covering(host, container)?;
    span.delete_contents()?;
    component.mount_into(span)?;

    info!(component = component.name(), ?container, "mounted");
    Ok(MountHandle {
        root: component.clone(),
        container,
    })
}

// =============================================================================
// Tests
// =============================================================================
