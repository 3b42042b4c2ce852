//! # spark-vdom
//!
//! Declarative components with a positional virtual-tree reconciler.
//!
//! Application code describes a tree of components and markup nodes. The
//! engine keeps a live region of a host document in sync with it: on every
//! `set_state` the component re-renders, the new virtual tree is diffed
//! against the previous one, and only the regions that changed are
//! rewritten.
//!
//! ## Architecture
//!
//! ```text
//! build() → Node tree → Component::render() (recursively) → VNode tree
//!                                                              │
//!                           reconcile(previous, next) ◄────────┘
//!                                      │
//!                           DocumentSpan operations → Host
//! ```
//!
//! Everything above [`document`] touches the live document only through
//! [`DocumentSpan`]s. The bundled [`HeadlessDocument`] keeps the tree in
//! memory; the [`pipeline`] module paints it onto a terminal.
//!
//! ## Modules
//!
//! - [`types`] - Props, callbacks, terminal cell types
//! - [`document`] - Host trait, spans, headless document
//! - [`node`] - Node model, tree builder, virtual tree
//! - [`component`] - Component trait, state and lifecycle
//! - [`reconciler`] - `same_node` and the diff/patch walk
//! - [`mount`] - Mount entry point
//! - [`renderer`] / [`state`] / [`pipeline`] - terminal backend

pub mod component;
pub mod document;
pub mod error;
pub mod mount;
pub mod node;
pub mod pipeline;
pub mod reconciler;
pub mod renderer;
pub mod state;
pub mod types;

pub use types::*;

pub use error::{Error, Result};

pub use document::{Boundary, DocumentSpan, HeadlessDocument, Host, Mutation, SpanId, UnitId, UnitKind};

pub use node::{build, Child, ElementNode, ElementType, Node, NodeTarget, TextNode, VElement, VNode, VText};

pub use component::{merge_state, Component, ComponentHandle, ComponentRef, Context};

pub use reconciler::{same_node, PatchSummary};

pub use mount::{mount, MountHandle};

pub use pipeline::{mount_terminal, render_mode, set_render_mode, RenderMode, TerminalApp};
