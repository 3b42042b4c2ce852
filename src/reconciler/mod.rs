//! Reconciler - positional diff and patch.
//!
//! Given the previously mounted virtual tree and a fresh, unmounted one, the
//! reconciler walks both in lockstep:
//!
//! ```text
//! same_node(old, new)?
//!   no  → take old's span, mount new into it (whole subtree recreated)
//!   yes → new adopts old's span and unit, then per child index i:
//!           i <  old.len  → reconcile(old[i], new[i])
//!           i >= old.len  → mount new[i] right after new[i - 1]
//!         old children past new.len are deleted
//! ```
//!
//! Matching is purely by position. A `key` prop is compared like any other
//! prop and never used to pair children, so a reorder turns into a chain of
//! per-position replacements.

use tracing::trace;

use crate::document::{missing_span, DocumentSpan};
use crate::error::Result;
use crate::node::{Mount, VElement, VNode};

// =============================================================================
// Patch Summary
// =============================================================================

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchSummary {
    /// Nodes whose document region was kept.
    pub reused: usize,
    /// Positions whose old subtree was replaced by a fresh mount.
    pub remounted: usize,
    /// New trailing children mounted after the last shared position.
    pub appended: usize,
    /// Old trailing children deleted.
    pub removed: usize,
}

impl PatchSummary {
    /// True if the pass touched the document structure.
    pub fn changed(&self) -> bool {
        self.remounted + self.appended + self.removed > 0
    }
}

// =============================================================================
// Node Comparison
// =============================================================================

/// Decide whether `old`'s document region can be reused for `new`.
///
/// Elements must share a tag, every prop of `new` must be present in `old`
/// with an equal value, and `old` must not carry extra props. Text nodes
/// must have identical content.
pub fn same_node(old: &VNode, new: &VNode) -> bool {
    match (old, new) {
        (VNode::Text(old), VNode::Text(new)) => old.content == new.content,
        (VNode::Element(old), VNode::Element(new)) => {
            old.tag == new.tag
                && old.props.len() <= new.props.len()
                && new
                    .props
                    .iter()
                    .all(|(name, value)| old.props.get(name) == Some(value))
        }
        _ => false,
    }
}

// =============================================================================
// Reconcile
// =============================================================================

/// Patch the document so it shows `new`, consuming the mounted `old`.
///
/// On return `new` is mounted and owns every span it needs.
pub fn reconcile(old: VNode, new: &mut VNode) -> Result<PatchSummary> {
    let mut summary = PatchSummary::default();
    reconcile_node(old, new, &mut summary)?;
    Ok(summary)
}

fn reconcile_node(mut old: VNode, new: &mut VNode, summary: &mut PatchSummary) -> Result<()> {
    if !same_node(&old, new) {
        let span = old.take_span().ok_or_else(|| missing_span("previous node"))?;
        drop(old);
        trace!(span = ?span.id(), "remounting");
        new.mount_into(span)?;
        summary.remounted += 1;
        return Ok(());
    }

    if !old.is_mounted() {
        return Err(missing_span("previous node"));
    }
    new.adopt(&mut old);
    summary.reused += 1;

    match (old, new) {
        (VNode::Element(old), VNode::Element(new)) => reconcile_children(old, new, summary),
        _ => Ok(()),
    }
}

fn reconcile_children(old: VElement, new: &mut VElement, summary: &mut PatchSummary) -> Result<()> {
    let shared = old.children.len().min(new.children.len());
    let mut old_children = old.children.into_iter();

    for (index, old_child) in old_children.by_ref().take(shared).enumerate() {
        reconcile_node(old_child, &mut new.children[index], summary)?;
    }

    for index in shared..new.children.len() {
        let span = tail_span(new, index)?;
        trace!(index, span = ?span.id(), "appending child");
        new.children[index].mount_into(span)?;
        summary.appended += 1;
    }

    for surplus in old_children {
        if let Some(span) = surplus.span() {
            trace!(span = ?span.id(), "removing surplus child");
            span.delete_contents()?;
        }
        summary.removed += 1;
    }
    Ok(())
}

/// A collapsed span where child `index` should go: right after the previous
/// child, or at the end of the element itself for the first child.
fn tail_span(parent: &VElement, index: usize) -> Result<DocumentSpan> {
    match index.checked_sub(1).and_then(|prev| parent.children.get(prev)) {
        Some(prev) => prev
            .span()
            .ok_or_else(|| missing_span("previous sibling"))?
            .after(),
        None => {
            let span = parent.span.as_ref().ok_or_else(|| missing_span("parent element"))?;
            let unit = parent.unit.ok_or_else(|| missing_span("parent element"))?;
            DocumentSpan::at_end_of(span.host().clone(), unit)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::document::{Host, HeadlessDocument, Mutation};
    use crate::types::{Callback, PropValue, Props};

    fn props(entries: &[(&str, PropValue)]) -> Props {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn el(tag: &str, entries: &[(&str, PropValue)], children: Vec<VNode>) -> VNode {
        VNode::element(tag, props(entries), children)
    }

    fn mounted(mut tree: VNode) -> (Rc<HeadlessDocument>, VNode) {
        let doc = HeadlessDocument::new();
        let host: Rc<dyn Host> = doc.clone();
        tree.mount_into(DocumentSpan::at_end_of(host, doc.body()).unwrap())
            .unwrap();
        doc.take_mutations();
        (doc, tree)
    }

    fn list(items: &[&str]) -> VNode {
        el(
            "ol",
            &[],
            items
                .iter()
                .map(|item| el("li", &[], vec![VNode::text(*item)]))
                .collect(),
        )
    }

    #[rstest]
    #[case::identical(&[("class", "a".into())], &[("class", "a".into())], true)]
    #[case::old_has_extra(&[("class", "a".into()), ("title", "t".into())], &[("class", "a".into())], false)]
    #[case::new_has_extra(&[("class", "a".into())], &[("class", "a".into()), ("title", "t".into())], false)]
    #[case::value_changed(&[("class", "a".into())], &[("class", "b".into())], false)]
    #[case::no_props(&[], &[], true)]
    #[case::json_equal(&[("key", json!(2).into())], &[("key", json!(2).into())], true)]
    fn test_same_node_props(
        #[case] old: &[(&str, PropValue)],
        #[case] new: &[(&str, PropValue)],
        #[case] expected: bool,
    ) {
        assert_eq!(same_node(&el("div", old, vec![]), &el("div", new, vec![])), expected);
    }

    #[test]
    fn test_same_node_kinds() {
        assert!(!same_node(&el("div", &[], vec![]), &el("span", &[], vec![])));
        assert!(!same_node(&VNode::text("a"), &el("a", &[], vec![])));
        assert!(same_node(&VNode::text("a"), &VNode::text("a")));
        assert!(!same_node(&VNode::text("a"), &VNode::text("b")));
    }

    #[test]
    fn test_same_node_callbacks_compare_by_identity() {
        let click = Callback::new(|_| Ok(()));
        let shared = el("button", &[("onClick", click.clone().into())], vec![]);
        let same = el("button", &[("onClick", click.into())], vec![]);
        let fresh = el("button", &[("onClick", Callback::new(|_| Ok(())).into())], vec![]);
        assert!(same_node(&shared, &same));
        assert!(!same_node(&shared, &fresh));
    }

    #[test]
    fn test_identical_tree_produces_no_mutations() {
        let (doc, old) = mounted(list(&["a", "b", "c"]));
        let mut new = list(&["a", "b", "c"]);

        let summary = reconcile(old, &mut new).unwrap();

        assert!(doc.mutations().is_empty());
        assert!(!summary.changed());
        assert_eq!(summary.reused, 7);
        assert_eq!(doc.open_span_count(), new.count());
    }

    #[test]
    fn test_trailing_append_touches_only_new_region() {
        let (doc, old) = mounted(list(&["x"]));
        let first_li = old.children()[0].unit().unwrap();
        let mut new = list(&["x", "y"]);

        let summary = reconcile(old, &mut new).unwrap();

        let ol = new.unit().unwrap();
        assert_eq!(summary.appended, 1);
        assert_eq!(summary.remounted, 0);
        assert_eq!(doc.children(ol).unwrap()[0], first_li);
        assert_eq!(doc.text_content(ol).unwrap(), "xy");

        // Only creation and insertion of the new <li> and its text.
        let structural: Vec<_> = doc
            .mutations()
            .into_iter()
            .filter(|m| matches!(m, Mutation::Insert { .. } | Mutation::Remove { .. }))
            .collect();
        let new_li = new.children()[1].unit().unwrap();
        assert!(structural.contains(&Mutation::Insert { parent: ol, index: 1, unit: new_li }));
        assert!(!structural.iter().any(|m| matches!(m, Mutation::Remove { .. })));
        assert!(
            !structural
                .iter()
                .any(|m| matches!(m, Mutation::Insert { parent, .. } if *parent == first_li))
        );
    }

    #[test]
    fn test_append_into_empty_parent_anchors_at_parent() {
        let (doc, old) = mounted(list(&[]));
        let mut new = list(&["a", "b"]);

        let summary = reconcile(old, &mut new).unwrap();

        assert_eq!(summary.appended, 2);
        assert_eq!(doc.text_content(new.unit().unwrap()).unwrap(), "ab");
        let spans: Vec<_> = new.children().iter().map(|c| c.span().unwrap().bounds().unwrap()).collect();
        assert_eq!(spans[0].1, spans[1].0);
    }

    #[test]
    fn test_surplus_old_children_are_removed() {
        let (doc, old) = mounted(list(&["a", "b", "c"]));
        let mut new = list(&["a"]);

        let summary = reconcile(old, &mut new).unwrap();

        assert_eq!(summary.removed, 2);
        assert_eq!(doc.children(new.unit().unwrap()).unwrap().len(), 1);
        assert_eq!(doc.text_content(doc.body()).unwrap(), "a");
        assert_eq!(doc.open_span_count(), new.count());
    }

    #[test]
    fn test_changed_prop_remounts_subtree() {
        let (doc, old) = mounted(el("div", &[("class", "a".into())], vec![VNode::text("t")]));
        let old_unit = old.unit().unwrap();
        let mut new = el("div", &[("class", "b".into())], vec![VNode::text("t")]);

        let summary = reconcile(old, &mut new).unwrap();

        assert_eq!(summary.remounted, 1);
        assert_ne!(new.unit().unwrap(), old_unit);
        assert_eq!(doc.inner_html(doc.body()).unwrap(), r#"<div class="b">t</div>"#);
        assert!(new.children()[0].is_mounted());
    }

    #[test]
    fn test_reorder_is_positional_replacement() {
        let (doc, old) = mounted(list(&["a", "b"]));
        let mut new = list(&["b", "a"]);

        let summary = reconcile(old, &mut new).unwrap();

        // <ol> and both <li> kept, both texts replaced in place.
        assert_eq!(summary.reused, 3);
        assert_eq!(summary.remounted, 2);
        assert_eq!(doc.text_content(doc.body()).unwrap(), "ba");
    }

    #[test]
    fn test_text_to_element_swap() {
        let (doc, old) = mounted(el("p", &[], vec![VNode::text("plain")]));
        let mut new = el("p", &[], vec![el("b", &[], vec![VNode::text("bold")])]);

        reconcile(old, &mut new).unwrap();

        assert_eq!(doc.inner_html(doc.body()).unwrap(), "<p><b>bold</b></p>");
    }

    #[test]
    fn test_unmounted_old_is_span_violation() {
        let old = list(&["a"]);
        let mut new = list(&["a"]);
        let err = reconcile(old, &mut new).unwrap_err();
        assert!(err.is_span_violation());
    }
}
