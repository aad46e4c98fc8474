//! # Edit deltas
//!
//! Ordered, typed edit operations folded onto a raw document as an overlay.
//!
//! The tracker never mutates the document it is applied to: `apply_to`
//! rebuilds only the spine from each edited node up to the root and shares
//! every untouched subtree through `Arc`. Untouched properties keep their
//! parsed form (symbolic references included), which is what lets the
//! exporter re-emit `@Ref` verbatim for anything the user never touched while
//! edited properties become concrete literals.
//!
//! Removing a previously recorded delta is undo: re-applying the remaining
//! overlay to the pristine base reproduces the pre-edit document exactly.

use crate::errors::DeltaError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uiml_parser::document::{NodeId, PropertyName, PropertyValue, UIDocument, UIElement};

/// Handle to a recorded delta, used for undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeltaId(u64);

impl std::fmt::Display for DeltaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "delta-{}", self.0)
    }
}

/// New location for a moved element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveAnchor {
    pub parent: NodeId,
    pub index: usize,
}

/// One recorded edit. All matching is by durable [`NodeId`], never by object
/// identity or structural equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum EditDelta {
    SetProperty {
        node: NodeId,
        name: PropertyName,
        value: PropertyValue,
    },
    MoveElement {
        node: NodeId,
        anchor: MoveAnchor,
    },
    AddElement {
        parent: NodeId,
        index: usize,
        element: UIElement,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedDelta {
    pub id: DeltaId,
    pub delta: EditDelta,
}

/// Single-writer edit overlay for one editing session.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EditDeltaTracker {
    deltas: Vec<RecordedDelta>,
    next_id: u64,
}

impl EditDeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit; later deltas win per `(node, property)` pair.
    pub fn record(&mut self, delta: EditDelta) -> DeltaId {
        let id = DeltaId(self.next_id);
        self.next_id += 1;
        self.deltas.push(RecordedDelta { id, delta });
        id
    }

    /// Remove a previously recorded delta (undo). Returns false when the id
    /// is unknown or already removed.
    pub fn remove(&mut self, id: DeltaId) -> bool {
        let before = self.deltas.len();
        self.deltas.retain(|d| d.id != id);
        self.deltas.len() != before
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordedDelta> {
        self.deltas.iter()
    }

    /// Fold the overlay onto `document`, producing a new document. The input
    /// is untouched; untouched subtrees are shared, not copied.
    pub fn apply_to(&self, document: &UIDocument) -> Result<UIDocument, DeltaError> {
        let mut root = document.root.clone();
        for recorded in &self.deltas {
            root = apply_delta(&root, &recorded.delta)?;
        }
        Ok(UIDocument {
            root,
            imports: document.imports.clone(),
            styles: document.styles.clone(),
            comments: document.comments.clone(),
        })
    }
}

fn apply_delta(root: &Arc<UIElement>, delta: &EditDelta) -> Result<Arc<UIElement>, DeltaError> {
    match delta {
        EditDelta::SetProperty { node, name, value } => set_property(root, node, name, value)
            .ok_or_else(|| DeltaError::NodeNotFound(node.clone())),
        EditDelta::AddElement {
            parent,
            index,
            element,
        } => insert_child(root, parent, *index, Arc::new(element.clone()))
            .ok_or_else(|| DeltaError::ParentNotFound(parent.clone())),
        EditDelta::MoveElement { node, anchor } => {
            if root.node_id == *node {
                return Err(DeltaError::CannotMoveRoot);
            }
            let subtree = root
                .find(node)
                .ok_or_else(|| DeltaError::NodeNotFound(node.clone()))?;
            if subtree.contains(&anchor.parent) {
                return Err(DeltaError::CycleDetected {
                    node: node.clone(),
                    parent: anchor.parent.clone(),
                });
            }
            if root.find(&anchor.parent).is_none() {
                return Err(DeltaError::ParentNotFound(anchor.parent.clone()));
            }

            let (detached_root, removed) =
                detach(root, node).ok_or_else(|| DeltaError::NodeNotFound(node.clone()))?;
            insert_child(&detached_root, &anchor.parent, anchor.index, removed)
                .ok_or_else(|| DeltaError::ParentNotFound(anchor.parent.clone()))
        }
    }
}

/// Rebuild the path from `target` to the root with the property set; every
/// sibling subtree is shared via `Arc`.
fn set_property(
    element: &Arc<UIElement>,
    target: &NodeId,
    name: &PropertyName,
    value: &PropertyValue,
) -> Option<Arc<UIElement>> {
    if &element.node_id == target {
        let mut updated = (**element).clone();
        if let Some(slot) = updated.properties.get_mut(name) {
            *slot = value.clone();
        } else {
            updated.properties.insert(name.clone(), value.clone());
        }
        return Some(Arc::new(updated));
    }
    for (i, child) in element.children.iter().enumerate() {
        if let Some(new_child) = set_property(child, target, name, value) {
            let mut updated = (**element).clone();
            updated.children[i] = new_child;
            return Some(Arc::new(updated));
        }
    }
    None
}

/// Remove `target` from wherever it sits; returns the rebuilt tree and the
/// removed subtree.
fn detach(
    element: &Arc<UIElement>,
    target: &NodeId,
) -> Option<(Arc<UIElement>, Arc<UIElement>)> {
    if let Some(pos) = element.children.iter().position(|c| &c.node_id == target) {
        let mut updated = (**element).clone();
        let removed = updated.children.remove(pos);
        return Some((Arc::new(updated), removed));
    }
    for (i, child) in element.children.iter().enumerate() {
        if let Some((new_child, removed)) = detach(child, target) {
            let mut updated = (**element).clone();
            updated.children[i] = new_child;
            return Some((Arc::new(updated), removed));
        }
    }
    None
}

fn insert_child(
    element: &Arc<UIElement>,
    parent: &NodeId,
    index: usize,
    node: Arc<UIElement>,
) -> Option<Arc<UIElement>> {
    if &element.node_id == parent {
        let mut updated = (**element).clone();
        let index = index.min(updated.children.len());
        updated.children.insert(index, node);
        return Some(Arc::new(updated));
    }
    for (i, child) in element.children.iter().enumerate() {
        if let Some(new_child) = insert_child(child, parent, index, node.clone()) {
            let mut updated = (**element).clone();
            updated.children[i] = new_child;
            return Some(Arc::new(updated));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiml_parser::parse;

    fn node_id_of(doc: &UIDocument, element_id: &str) -> NodeId {
        fn walk(element: &UIElement, wanted: &str) -> Option<NodeId> {
            if element.id.as_ref().map(|i| i.as_str()) == Some(wanted) {
                return Some(element.node_id.clone());
            }
            element.children.iter().find_map(|c| walk(c, wanted))
        }
        walk(&doc.root, element_id).expect("element id not found")
    }

    #[test]
    fn test_set_property_produces_new_document() {
        let doc = parse("Group #Main { Width: 10; Label #A { Text: \"x\"; } }").unwrap();
        let mut tracker = EditDeltaTracker::new();
        tracker.record(EditDelta::SetProperty {
            node: node_id_of(&doc, "Main"),
            name: PropertyName::from("Width"),
            value: PropertyValue::Number(99.0),
        });

        let edited = tracker.apply_to(&doc).unwrap();
        assert_eq!(
            edited.root.property("Width"),
            Some(&PropertyValue::Number(99.0))
        );
        // The input document is untouched
        assert_eq!(doc.root.property("Width"), Some(&PropertyValue::Number(10.0)));
    }

    #[test]
    fn test_untouched_subtrees_are_shared() {
        let doc = parse("Group #Main { Label #A { } Label #B { } }").unwrap();
        let mut tracker = EditDeltaTracker::new();
        tracker.record(EditDelta::SetProperty {
            node: node_id_of(&doc, "A"),
            name: PropertyName::from("Width"),
            value: PropertyValue::Number(1.0),
        });

        let edited = tracker.apply_to(&doc).unwrap();
        // Sibling B is the same allocation, not a copy
        assert!(Arc::ptr_eq(&doc.root.children[1], &edited.root.children[1]));
        assert!(!Arc::ptr_eq(&doc.root.children[0], &edited.root.children[0]));
    }

    #[test]
    fn test_no_change_set_is_structurally_equal() {
        let doc = parse("Group #Main { Width: @Size; }").unwrap();
        let mut tracker = EditDeltaTracker::new();
        tracker.record(EditDelta::SetProperty {
            node: node_id_of(&doc, "Main"),
            name: PropertyName::from("Width"),
            value: doc.root.property("Width").unwrap().clone(),
        });

        let edited = tracker.apply_to(&doc).unwrap();
        assert_eq!(doc, edited);
    }

    #[test]
    fn test_last_write_wins_per_property() {
        let doc = parse("Group #Main { Width: 10; }").unwrap();
        let main = node_id_of(&doc, "Main");
        let mut tracker = EditDeltaTracker::new();
        tracker.record(EditDelta::SetProperty {
            node: main.clone(),
            name: PropertyName::from("Width"),
            value: PropertyValue::Number(20.0),
        });
        tracker.record(EditDelta::SetProperty {
            node: main,
            name: PropertyName::from("Width"),
            value: PropertyValue::Number(30.0),
        });

        let edited = tracker.apply_to(&doc).unwrap();
        assert_eq!(
            edited.root.property("Width"),
            Some(&PropertyValue::Number(30.0))
        );
    }

    #[test]
    fn test_move_element() {
        let doc = parse("Group #Main { Group #Left { Label #X { } } Group #Right { } }").unwrap();
        let mut tracker = EditDeltaTracker::new();
        tracker.record(EditDelta::MoveElement {
            node: node_id_of(&doc, "X"),
            anchor: MoveAnchor {
                parent: node_id_of(&doc, "Right"),
                index: 0,
            },
        });

        let edited = tracker.apply_to(&doc).unwrap();
        let left = &edited.root.children[0];
        let right = &edited.root.children[1];
        assert!(left.children.is_empty());
        assert_eq!(right.children[0].id.as_ref().unwrap().as_str(), "X");
    }

    #[test]
    fn test_move_into_own_subtree_is_rejected() {
        let doc = parse("Group #Main { Group #Outer { Group #Inner { } } }").unwrap();
        let mut tracker = EditDeltaTracker::new();
        tracker.record(EditDelta::MoveElement {
            node: node_id_of(&doc, "Outer"),
            anchor: MoveAnchor {
                parent: node_id_of(&doc, "Inner"),
                index: 0,
            },
        });

        assert!(matches!(
            tracker.apply_to(&doc),
            Err(DeltaError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_add_element() {
        let doc = parse("Group #Main { }").unwrap();
        let mut element = UIElement::new(NodeId::from("local-1"), "Label");
        element
            .properties
            .insert(PropertyName::from("Text"), PropertyValue::Text("new".into()));

        let mut tracker = EditDeltaTracker::new();
        tracker.record(EditDelta::AddElement {
            parent: node_id_of(&doc, "Main"),
            index: 0,
            element,
        });

        let edited = tracker.apply_to(&doc).unwrap();
        assert_eq!(edited.root.children.len(), 1);
        assert_eq!(
            edited.root.children[0].property("Text"),
            Some(&PropertyValue::Text("new".to_string()))
        );
    }

    #[test]
    fn test_unknown_node_is_an_error() {
        let doc = parse("Group #Main { }").unwrap();
        let mut tracker = EditDeltaTracker::new();
        tracker.record(EditDelta::SetProperty {
            node: NodeId::from("nope"),
            name: PropertyName::from("Width"),
            value: PropertyValue::Number(1.0),
        });
        assert!(matches!(
            tracker.apply_to(&doc),
            Err(DeltaError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_remove_recorded_delta_is_undo() {
        let doc = parse("Group #Main { Width: 10; }").unwrap();
        let mut tracker = EditDeltaTracker::new();
        let id = tracker.record(EditDelta::SetProperty {
            node: node_id_of(&doc, "Main"),
            name: PropertyName::from("Width"),
            value: PropertyValue::Number(42.0),
        });

        assert!(tracker.remove(id));
        assert!(!tracker.remove(id));

        let edited = tracker.apply_to(&doc).unwrap();
        assert_eq!(doc, edited);
    }
}
