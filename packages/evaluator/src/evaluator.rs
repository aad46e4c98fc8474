//! # Expression evaluation
//!
//! `evaluate(value, scope) -> value` is pure and total: every reference,
//! expression and spread reduces to a best-effort concrete value, and
//! everything that cannot reduce stays symbolic. Failures never throw; they
//! go to the [`DiagnosticSink`] side channel and the original node is
//! returned, so one broken reference cannot stop a document from rendering.
//!
//! ## Determinism
//!
//! For a fixed document + resolver, `resolve()` is fully deterministic: no
//! iteration-order leaks (property maps are insertion-ordered), no
//! time/random/environment dependence, and the per-session import cache only
//! memoizes pure parses.
//!
//! ## Cycle protection
//!
//! A "currently resolving" set keyed by document-qualified reference strings
//! guards every named lookup. Re-entering a key in progress abandons that
//! branch with a warning and falls back to the unresolved node, so `@A = @A;`
//! and mutually recursive styles terminate instead of overflowing the stack.

use crate::diagnostics::{DiagnosticSink, EvalWarning, NullSink};
use crate::scope::{ImportResolver, ResolveSession, VariableScope};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use tracing::warn;
use uiml_parser::document::*;

type Frames = Vec<IndexMap<String, PropertyValue>>;

/// Produce a fully concrete copy of `document` for rendering. Warnings go to
/// the log only.
pub fn resolve(document: &UIDocument, resolver: &dyn ImportResolver) -> UIDocument {
    let mut sink = NullSink;
    resolve_at_path(document, "<memory>", resolver, &mut sink)
}

/// [`resolve`] with a caller-provided warning sink.
pub fn resolve_with_diagnostics(
    document: &UIDocument,
    resolver: &dyn ImportResolver,
    sink: &mut dyn DiagnosticSink,
) -> UIDocument {
    resolve_at_path(document, "<memory>", resolver, sink)
}

/// Resolve a document that lives at `path`; relative imports resolve against
/// it.
pub fn resolve_at_path(
    document: &UIDocument,
    path: &str,
    resolver: &dyn ImportResolver,
    sink: &mut dyn DiagnosticSink,
) -> UIDocument {
    let session = ResolveSession::new(resolver);
    let scope = Rc::new(VariableScope::new(document.clone(), path));
    session.preload(scope.clone());

    let mut ctx = EvalContext {
        session: &session,
        resolving: HashSet::new(),
        sink,
    };
    let mut frames = Frames::new();
    let root = ctx.resolve_element(&document.root, &scope, &mut frames);

    UIDocument {
        root: Arc::new(root),
        imports: document.imports.clone(),
        styles: document.styles.clone(),
        comments: document.comments.clone(),
    }
}

/// Evaluate one value against a scope. The session lives for this call only.
pub fn evaluate(
    value: &PropertyValue,
    scope: Rc<VariableScope>,
    resolver: &dyn ImportResolver,
    sink: &mut dyn DiagnosticSink,
) -> PropertyValue {
    let session = ResolveSession::new(resolver);
    session.preload(scope.clone());
    let mut ctx = EvalContext {
        session: &session,
        resolving: HashSet::new(),
        sink,
    };
    let mut frames = Frames::new();
    ctx.evaluate_in(value, &scope, &mut frames)
}

struct EvalContext<'a> {
    session: &'a ResolveSession<'a>,
    resolving: HashSet<String>,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> EvalContext<'a> {
    fn warn(&mut self, message: String, reference: Option<String>) {
        warn!(reference = reference.as_deref().unwrap_or("-"), "{}", message);
        self.sink.report(EvalWarning { message, reference });
    }

    fn resolve_element(
        &mut self,
        element: &UIElement,
        scope: &Rc<VariableScope>,
        frames: &mut Frames,
    ) -> UIElement {
        if element.is_comment() {
            return element.clone();
        }

        // Element-scoped style declarations shadow document styles for this
        // subtree; the frame keeps them raw, evaluation happens per lookup
        let mut frame = IndexMap::new();
        for (key, value) in &element.properties {
            if let Some(name) = key.as_str().strip_prefix('@') {
                if value.canonical_reference_text().as_deref() != Some(key.as_str()) {
                    frame.insert(name.to_string(), value.clone());
                }
            }
        }
        frames.push(frame);

        let mut properties = IndexMap::new();
        for (key, value) in &element.properties {
            let is_use = key.as_str().starts_with("#use-")
                || value.canonical_reference_text().as_deref() == Some(key.as_str());
            let evaluated = self.evaluate_in(value, scope, frames);
            if is_use {
                self.merge_style_use(key, evaluated, &mut properties);
            } else {
                upsert(&mut properties, key.clone(), evaluated);
            }
        }

        let children = element
            .children
            .iter()
            .map(|child| Arc::new(self.resolve_element(child, scope, frames)))
            .collect();

        frames.pop();

        UIElement {
            node_id: element.node_id.clone(),
            element_type: element.element_type.clone(),
            source_type: element.source_type.clone(),
            id: element.id.clone(),
            properties,
            children,
        }
    }

    /// Fold an evaluated style use into the element at its position. Property
    /// bundles merge (later explicit keys still win, since they are written
    /// after); anything else stays an entry of its own.
    fn merge_style_use(
        &mut self,
        key: &PropertyName,
        evaluated: PropertyValue,
        properties: &mut IndexMap<PropertyName, PropertyValue>,
    ) {
        let bundle = match &evaluated {
            PropertyValue::Spread(inner) => inner.as_ref().clone(),
            other => other.clone(),
        };
        match bundle {
            PropertyValue::Tuple(tuple) => {
                for entry in tuple.entries {
                    match entry {
                        TupleEntry::Keyed { key, value } => upsert(properties, key, value),
                        TupleEntry::Spread { value } => {
                            self.warn(
                                "unmergeable spread left inside style bundle".to_string(),
                                value.canonical_reference_text(),
                            );
                        }
                    }
                }
            }
            PropertyValue::Style(StyleReference::Inline { properties: bundle }) => {
                for (k, v) in bundle {
                    upsert(properties, k, v);
                }
            }
            _ => {
                properties.insert(key.clone(), evaluated);
            }
        }
    }

    fn evaluate_in(
        &mut self,
        value: &PropertyValue,
        scope: &Rc<VariableScope>,
        frames: &mut Frames,
    ) -> PropertyValue {
        match value {
            PropertyValue::Style(reference) => self.eval_style_reference(reference, scope, frames),
            PropertyValue::VariableRef(var) => self.eval_variable_ref(var, scope, frames),
            PropertyValue::Expression(expr) => {
                let left = self.evaluate_in(&expr.left, scope, frames);
                let right = self.evaluate_in(&expr.right, scope, frames);
                match (left.as_numeric(), right.as_numeric()) {
                    (Some(l), Some(r)) => {
                        if expr.op == BinaryOp::Divide && r == 0.0 {
                            self.warn("division by zero evaluates to 0".to_string(), None);
                            PropertyValue::Number(0.0)
                        } else {
                            PropertyValue::Number(apply_op(expr.op, l, r))
                        }
                    }
                    // Non-numeric operand: the node stays symbolic with its
                    // operands evaluated, never silently dropped
                    _ => PropertyValue::Expression(Box::new(ExpressionValue {
                        left,
                        op: expr.op,
                        right,
                    })),
                }
            }
            PropertyValue::Tuple(tuple) => {
                PropertyValue::Tuple(self.eval_tuple(tuple, scope, frames))
            }
            PropertyValue::Anchor(anchor) => {
                let fields = anchor
                    .fields
                    .iter()
                    .map(|(field, value)| (*field, self.evaluate_in(value, scope, frames)))
                    .collect();
                PropertyValue::Anchor(AnchorValue { fields })
            }
            PropertyValue::List(items) => PropertyValue::List(
                items
                    .iter()
                    .map(|item| self.evaluate_in(item, scope, frames))
                    .collect(),
            ),
            PropertyValue::Spread(inner) => {
                PropertyValue::Spread(Box::new(self.evaluate_in(inner, scope, frames)))
            }
            other => other.clone(),
        }
    }

    fn eval_style_reference(
        &mut self,
        reference: &StyleReference,
        scope: &Rc<VariableScope>,
        frames: &mut Frames,
    ) -> PropertyValue {
        match reference {
            StyleReference::Local { name } => self
                .lookup_and_eval(None, name, scope, frames)
                .unwrap_or_else(|| PropertyValue::Style(reference.clone())),
            StyleReference::Imported { alias, name } => self
                .lookup_and_eval(Some(alias), name, scope, frames)
                .unwrap_or_else(|| PropertyValue::Style(reference.clone())),
            StyleReference::Spread { inner } => {
                let evaluated = self.eval_style_reference(inner, scope, frames);
                match evaluated {
                    // Still a named reference: the lookup failed, keep the
                    // original spread as written
                    PropertyValue::Style(StyleReference::Local { .. })
                    | PropertyValue::Style(StyleReference::Imported { .. })
                    | PropertyValue::Style(StyleReference::Spread { .. }) => {
                        PropertyValue::Style(reference.clone())
                    }
                    other => PropertyValue::Spread(Box::new(other)),
                }
            }
            StyleReference::Inline { properties } => {
                let mut evaluated = IndexMap::new();
                for (key, value) in properties {
                    evaluated.insert(key.clone(), self.evaluate_in(value, scope, frames));
                }
                PropertyValue::Style(StyleReference::Inline {
                    properties: evaluated,
                })
            }
        }
    }

    /// Resolve `@name` (or `$alias.@name`) to its bound value, evaluated in
    /// the scope that owns it. `None` means unresolved; the caller keeps the
    /// symbolic node.
    fn lookup_and_eval(
        &mut self,
        alias: Option<&str>,
        name: &str,
        scope: &Rc<VariableScope>,
        frames: &mut Frames,
    ) -> Option<PropertyValue> {
        match alias {
            None => {
                let raw = frames
                    .iter()
                    .rev()
                    .find_map(|frame| frame.get(name).cloned());
                let raw = match raw {
                    Some(value) => value,
                    None => match scope.style(name) {
                        Some(def) => style_body_value(&def.body),
                        None => {
                            self.warn(
                                format!("unresolved style reference '@{}'", name),
                                Some(format!("@{}", name)),
                            );
                            return None;
                        }
                    },
                };
                let key = format!("{}::@{}", scope.path, name);
                self.guarded_eval(key, &raw, scope, frames, format!("@{}", name))
            }
            Some(alias) => {
                let reference = format!("${}.@{}", alias, name);
                let import_path = match scope.import_path(alias) {
                    Some(path) => path.to_string(),
                    None => {
                        self.warn(
                            format!("unknown import alias '${}'", alias),
                            Some(reference),
                        );
                        return None;
                    }
                };
                let imported = match self.session.load(&import_path, &scope.path) {
                    Some(imported) => imported,
                    None => {
                        self.warn(
                            format!("import '${}' could not be loaded", alias),
                            Some(reference),
                        );
                        return None;
                    }
                };
                let raw = match imported.style(name) {
                    Some(def) => style_body_value(&def.body),
                    None => {
                        self.warn(
                            format!("'@{}' is not defined in '{}'", name, imported.path),
                            Some(reference),
                        );
                        return None;
                    }
                };
                // Imported values evaluate in the imported document's own
                // scope, not the caller's
                let key = format!("{}::@{}", imported.path, name);
                let mut imported_frames = Frames::new();
                self.guarded_eval(key, &raw, &imported, &mut imported_frames, reference)
            }
        }
    }

    fn guarded_eval(
        &mut self,
        key: String,
        raw: &PropertyValue,
        scope: &Rc<VariableScope>,
        frames: &mut Frames,
        reference: String,
    ) -> Option<PropertyValue> {
        if self.resolving.contains(&key) {
            self.warn(
                format!("reference cycle detected at '{}'", reference),
                Some(reference),
            );
            return None;
        }
        self.resolving.insert(key.clone());
        let result = self.evaluate_in(raw, scope, frames);
        self.resolving.remove(&key);
        Some(result)
    }

    fn eval_variable_ref(
        &mut self,
        var: &VariableRefValue,
        scope: &Rc<VariableScope>,
        frames: &mut Frames,
    ) -> PropertyValue {
        let text = var.canonical_text();
        let root_name = match var.path.first() {
            Some(name) => name,
            None => return PropertyValue::VariableRef(var.clone()),
        };
        let root = self.lookup_and_eval(var.alias.as_deref(), root_name, scope, frames);
        let mut current = match root {
            Some(value) => value,
            None => return PropertyValue::VariableRef(var.clone()),
        };

        for segment in &var.path[1..] {
            let next = match &current {
                PropertyValue::Tuple(tuple) => tuple.get(segment).cloned(),
                PropertyValue::Style(StyleReference::Inline { properties }) => {
                    properties.get(&PropertyName::from(segment.as_str())).cloned()
                }
                PropertyValue::Anchor(anchor) => anchor
                    .fields
                    .iter()
                    .find(|(field, _)| field.as_str() == segment.as_str())
                    .map(|(_, value)| value.clone()),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => {
                    self.warn(
                        format!("cannot resolve member '{}' in '{}'", segment, text),
                        Some(text.clone()),
                    );
                    return PropertyValue::VariableRef(var.clone());
                }
            }
        }
        current
    }

    /// Tuple evaluation merges spread entries in declaration order. Plain
    /// keys written after a spread override identically-named spread keys; a
    /// spread that does not reduce to a bundle passes through unmerged.
    fn eval_tuple(
        &mut self,
        tuple: &TupleValue,
        scope: &Rc<VariableScope>,
        frames: &mut Frames,
    ) -> TupleValue {
        let mut entries: Vec<TupleEntry> = Vec::new();
        for entry in &tuple.entries {
            match entry {
                TupleEntry::Keyed { key, value } => {
                    let value = self.evaluate_in(value, scope, frames);
                    upsert_entry(&mut entries, key.clone(), value);
                }
                TupleEntry::Spread { value } => {
                    let evaluated = self.evaluate_in(value, scope, frames);
                    let bundle = match &evaluated {
                        PropertyValue::Spread(inner) => inner.as_ref().clone(),
                        other => other.clone(),
                    };
                    match bundle {
                        PropertyValue::Tuple(inner) => {
                            for entry in inner.entries {
                                match entry {
                                    TupleEntry::Keyed { key, value } => {
                                        upsert_entry(&mut entries, key, value)
                                    }
                                    TupleEntry::Spread { value } => {
                                        entries.push(TupleEntry::Spread { value })
                                    }
                                }
                            }
                        }
                        PropertyValue::Style(StyleReference::Inline { properties }) => {
                            for (key, value) in properties {
                                upsert_entry(&mut entries, key, value);
                            }
                        }
                        other => entries.push(TupleEntry::Spread { value: other }),
                    }
                }
            }
        }
        TupleValue { entries }
    }
}

/// The value a style definition binds its name to.
fn style_body_value(body: &StyleBody) -> PropertyValue {
    match body {
        StyleBody::Scalar(value) => value.clone(),
        StyleBody::Tuple(tuple) => PropertyValue::Tuple(tuple.clone()),
        StyleBody::Constructor { properties, .. } => PropertyValue::Tuple(TupleValue {
            entries: properties
                .iter()
                .map(|(key, value)| TupleEntry::Keyed {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }),
        // Element templates contribute their property bundle
        StyleBody::Element(element) => PropertyValue::Tuple(TupleValue {
            entries: element
                .properties
                .iter()
                .filter(|(key, _)| !key.as_str().starts_with('#'))
                .map(|(key, value)| TupleEntry::Keyed {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }),
    }
}

fn apply_op(op: BinaryOp, left: f64, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Subtract => left - right,
        BinaryOp::Multiply => left * right,
        BinaryOp::Divide => left / right,
    }
}

fn upsert(map: &mut IndexMap<PropertyName, PropertyValue>, key: PropertyName, value: PropertyValue) {
    if let Some(slot) = map.get_mut(&key) {
        *slot = value;
    } else {
        map.insert(key, value);
    }
}

fn upsert_entry(entries: &mut Vec<TupleEntry>, key: PropertyName, value: PropertyValue) {
    for entry in entries.iter_mut() {
        if let TupleEntry::Keyed {
            key: existing,
            value: slot,
        } = entry
        {
            if *existing == key {
                *slot = value;
                return;
            }
        }
    }
    entries.push(TupleEntry::Keyed { key, value });
}
