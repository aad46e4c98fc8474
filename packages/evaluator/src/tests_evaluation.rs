use crate::diagnostics::EvalWarning;
use crate::evaluator::{resolve, resolve_with_diagnostics};
use crate::scope::{ImportError, ImportResolver, ResolvedSource};
use std::cell::Cell;
use std::collections::HashMap;
use uiml_parser::document::*;
use uiml_parser::parse;

/// In-memory resolver; canonical paths are `/abs/<import path>`.
struct MapResolver {
    files: HashMap<&'static str, &'static str>,
    calls: Cell<usize>,
}

impl MapResolver {
    fn new(files: &[(&'static str, &'static str)]) -> Self {
        Self {
            files: files.iter().copied().collect(),
            calls: Cell::new(0),
        }
    }

    fn empty() -> Self {
        Self::new(&[])
    }
}

impl ImportResolver for MapResolver {
    fn resolve(&self, import_path: &str, _from: &str) -> Result<ResolvedSource, ImportError> {
        self.calls.set(self.calls.get() + 1);
        match self.files.get(import_path) {
            Some(source) => Ok(ResolvedSource {
                path: format!("/abs/{}", import_path),
                source: source.to_string(),
            }),
            None => Err(ImportError::NotFound(import_path.to_string())),
        }
    }
}

fn resolve_source(source: &str, resolver: &MapResolver) -> UIDocument {
    let doc = parse(source).expect("parse failed");
    resolve(&doc, resolver)
}

fn resolve_collecting(source: &str, resolver: &MapResolver) -> (UIDocument, Vec<EvalWarning>) {
    let doc = parse(source).expect("parse failed");
    let mut warnings: Vec<EvalWarning> = Vec::new();
    let resolved = resolve_with_diagnostics(&doc, resolver, &mut warnings);
    (resolved, warnings)
}

#[test]
fn test_scenario_a_local_style_resolution() {
    let source = "@Size = 64; Group #Main { Width: @Size; }";
    let raw = parse(source).unwrap();

    // Raw parse leaves the reference symbolic
    assert!(matches!(
        raw.root.property("Width"),
        Some(PropertyValue::Style(StyleReference::Local { name })) if name == "Size"
    ));

    let resolved = resolve(&raw, &MapResolver::empty());
    assert_eq!(
        resolved.root.property("Width"),
        Some(&PropertyValue::Number(64.0))
    );

    // The raw document is untouched
    assert!(matches!(
        raw.root.property("Width"),
        Some(PropertyValue::Style(_))
    ));
}

#[test]
fn test_expression_folding() {
    let doc = resolve_source(
        "@Size = 64; Group { A: @Size + 16; B: @Size * 2; C: 2 - (3 - 1); D: 50% + 10; }",
        &MapResolver::empty(),
    );
    assert_eq!(doc.root.property("A"), Some(&PropertyValue::Number(80.0)));
    assert_eq!(doc.root.property("B"), Some(&PropertyValue::Number(128.0)));
    assert_eq!(doc.root.property("C"), Some(&PropertyValue::Number(0.0)));
    // Percent contributes its literal figure
    assert_eq!(doc.root.property("D"), Some(&PropertyValue::Number(60.0)));
}

#[test]
fn test_division_by_zero_yields_zero_and_warning() {
    let (doc, warnings) =
        resolve_collecting("Group { W: 10 / 0; }", &MapResolver::empty());
    assert_eq!(doc.root.property("W"), Some(&PropertyValue::Number(0.0)));
    assert!(warnings.iter().any(|w| w.message.contains("division by zero")));
}

#[test]
fn test_non_numeric_operand_stays_symbolic() {
    let (doc, _) = resolve_collecting(
        "@Name = \"abc\"; Group { W: @Name + 10; }",
        &MapResolver::empty(),
    );
    match doc.root.property("W").unwrap() {
        PropertyValue::Expression(expr) => {
            // Operands are evaluated, the node itself stays
            assert_eq!(expr.left, PropertyValue::Text("abc".to_string()));
            assert_eq!(expr.right, PropertyValue::Number(10.0));
        }
        other => panic!("expected symbolic expression, got {:?}", other),
    }
}

#[test]
fn test_self_cycle_is_safe() {
    let (doc, warnings) =
        resolve_collecting("@A = @A; Group { W: @A; }", &MapResolver::empty());
    assert!(warnings.iter().any(|w| w.message.contains("cycle")));
    // Falls back to the unresolved node rather than recursing forever
    assert!(matches!(
        doc.root.property("W"),
        Some(PropertyValue::Style(_))
    ));
}

#[test]
fn test_mutual_cycle_is_safe() {
    let (_, warnings) = resolve_collecting(
        "@A = @B; @B = @A; Group { W: @A; X: @B; }",
        &MapResolver::empty(),
    );
    assert!(warnings.iter().any(|w| w.message.contains("cycle")));
}

#[test]
fn test_unresolved_reference_warns_and_keeps_node() {
    let (doc, warnings) = resolve_collecting("Group { W: @Nope; }", &MapResolver::empty());
    assert!(matches!(
        doc.root.property("W"),
        Some(PropertyValue::Style(StyleReference::Local { name })) if name == "Nope"
    ));
    assert!(warnings.iter().any(|w| w.reference.as_deref() == Some("@Nope")));
}

#[test]
fn test_tuple_spread_merge_and_override() {
    let doc = resolve_source(
        "@Base = (A: 1, B: 2); Group { P: (...@Base, B: 3, C: 4); }",
        &MapResolver::empty(),
    );
    match doc.root.property("P").unwrap() {
        PropertyValue::Tuple(tuple) => {
            assert_eq!(tuple.get("A"), Some(&PropertyValue::Number(1.0)));
            // Plain key after the spread wins
            assert_eq!(tuple.get("B"), Some(&PropertyValue::Number(3.0)));
            assert_eq!(tuple.get("C"), Some(&PropertyValue::Number(4.0)));
        }
        other => panic!("expected tuple, got {:?}", other),
    }
}

#[test]
fn test_non_tuple_spread_passes_through_unmerged() {
    let doc = resolve_source(
        "@S = 5; Group { P: (...@S, A: 1); }",
        &MapResolver::empty(),
    );
    match doc.root.property("P").unwrap() {
        PropertyValue::Tuple(tuple) => {
            assert!(matches!(
                &tuple.entries[0],
                TupleEntry::Spread {
                    value: PropertyValue::Number(n)
                } if *n == 5.0
            ));
            assert_eq!(tuple.get("A"), Some(&PropertyValue::Number(1.0)));
        }
        other => panic!("expected tuple, got {:?}", other),
    }
}

#[test]
fn test_imported_style_resolution() {
    let resolver = MapResolver::new(&[("lib.ui", "@W = 7;")]);
    let doc = resolve_source("$L = \"lib.ui\"; Group { Width: $L.@W; }", &resolver);
    assert_eq!(doc.root.property("Width"), Some(&PropertyValue::Number(7.0)));
}

#[test]
fn test_imported_refs_resolve_in_their_own_scope() {
    // @A references @B from its own document, not the caller's @B
    let resolver = MapResolver::new(&[("lib.ui", "@A = @B + 1; @B = 2;")]);
    let doc = resolve_source(
        "$L = \"lib.ui\"; @B = 100; Group { W: $L.@A; }",
        &resolver,
    );
    assert_eq!(doc.root.property("W"), Some(&PropertyValue::Number(3.0)));
}

#[test]
fn test_transitive_imports() {
    let resolver = MapResolver::new(&[
        ("lib.ui", "$Deep = \"deep.ui\"; @A = $Deep.@Base * 2;"),
        ("deep.ui", "@Base = 21;"),
    ]);
    let doc = resolve_source("$L = \"lib.ui\"; Group { W: $L.@A; }", &resolver);
    assert_eq!(doc.root.property("W"), Some(&PropertyValue::Number(42.0)));
}

#[test]
fn test_import_memoization_one_parse_per_file() {
    let resolver = MapResolver::new(&[("lib.ui", "@A = 1; @B = 2;")]);
    let doc = resolve_source(
        "$L = \"lib.ui\"; Group { A: $L.@A; B: $L.@B; C: $L.@A + $L.@B; }",
        &resolver,
    );
    assert_eq!(doc.root.property("C"), Some(&PropertyValue::Number(3.0)));
    assert_eq!(resolver.calls.get(), 1, "file resolved more than once");
}

#[test]
fn test_missing_import_keeps_reference() {
    let (doc, warnings) = resolve_collecting(
        "$L = \"missing.ui\"; Group { W: $L.@X; }",
        &MapResolver::empty(),
    );
    assert!(matches!(
        doc.root.property("W"),
        Some(PropertyValue::Style(StyleReference::Imported { .. }))
    ));
    assert!(!warnings.is_empty());
}

#[test]
fn test_resolution_is_deterministic() {
    let resolver = MapResolver::new(&[("lib.ui", "@A = (X: 1, Y: 2);")]);
    let source = "$L = \"lib.ui\"; @S = 4; Group { P: (...$L.@A, Z: @S * 2); W: @S; }";
    let doc = parse(source).unwrap();

    let first = resolve(&doc, &resolver);
    let second = resolve(&doc, &resolver);
    assert_eq!(first, second);
}

#[test]
fn test_element_style_use_merges_bundle() {
    let doc = resolve_source(
        "@Card = (Padding: 4, Background: #202020); Group { ...@Card; Padding: 8; }",
        &MapResolver::empty(),
    );
    // Explicit key written after the use wins
    assert_eq!(
        doc.root.property("Padding"),
        Some(&PropertyValue::Number(8.0))
    );
    assert!(matches!(
        doc.root.property("Background"),
        Some(PropertyValue::Color(_))
    ));
}

#[test]
fn test_element_style_use_order_matters() {
    let doc = resolve_source(
        "@Card = (Padding: 4); Group { Padding: 8; ...@Card; }",
        &MapResolver::empty(),
    );
    // The use comes later, its keys override
    assert_eq!(
        doc.root.property("Padding"),
        Some(&PropertyValue::Number(4.0))
    );
}

#[test]
fn test_inline_style_use_merges() {
    let doc = resolve_source("Group { ...(Padding: 4); }", &MapResolver::empty());
    assert_eq!(
        doc.root.property("Padding"),
        Some(&PropertyValue::Number(4.0))
    );
}

#[test]
fn test_scoped_style_shadows_document_style() {
    let doc = resolve_source(
        "@Pad = 1; Group { @Pad = 8; Width: @Pad; Label { Height: @Pad; } }",
        &MapResolver::empty(),
    );
    assert_eq!(doc.root.property("Width"), Some(&PropertyValue::Number(8.0)));
    // Scoped styles are visible to the subtree
    assert_eq!(
        doc.root.children[0].property("Height"),
        Some(&PropertyValue::Number(8.0))
    );
}

#[test]
fn test_variable_ref_member_access() {
    let doc = resolve_source(
        "@Theme = (Primary: #ff0000, Sizes: (Small: 8)); Group { C: @Theme.Primary; S: @Theme.Sizes.Small; }",
        &MapResolver::empty(),
    );
    assert!(matches!(
        doc.root.property("C"),
        Some(PropertyValue::Color(c)) if c.rgb == "ff0000"
    ));
    assert_eq!(doc.root.property("S"), Some(&PropertyValue::Number(8.0)));
}

#[test]
fn test_variable_ref_missing_member_warns() {
    let (doc, warnings) = resolve_collecting(
        "@Theme = (Primary: 1); Group { X: @Theme.Missing; }",
        &MapResolver::empty(),
    );
    assert!(matches!(
        doc.root.property("X"),
        Some(PropertyValue::VariableRef(_))
    ));
    assert!(warnings.iter().any(|w| w.message.contains("Missing")));
}

#[test]
fn test_anchor_fields_are_evaluated() {
    let doc = resolve_source(
        "@M = 4; Group { Anchor: (Left: @M, Top: @M * 2); }",
        &MapResolver::empty(),
    );
    match doc.root.property("Anchor").unwrap() {
        PropertyValue::Anchor(anchor) => {
            assert_eq!(anchor.fields[0].1, PropertyValue::Number(4.0));
            assert_eq!(anchor.fields[1].1, PropertyValue::Number(8.0));
        }
        other => panic!("expected anchor, got {:?}", other),
    }
}

#[test]
fn test_constructor_style_resolves_to_bundle() {
    let doc = resolve_source(
        "@Title = Font(Family: \"Serif\", Size: 18); Group { F: @Title; }",
        &MapResolver::empty(),
    );
    match doc.root.property("F").unwrap() {
        PropertyValue::Tuple(tuple) => {
            assert_eq!(tuple.get("Size"), Some(&PropertyValue::Number(18.0)));
        }
        other => panic!("expected tuple bundle, got {:?}", other),
    }
}

#[test]
fn test_import_cycle_between_files_is_safe() {
    // a.ui and b.ui reference each other; the session cache plus the cycle
    // guard keep this finite
    let resolver = MapResolver::new(&[
        ("a.ui", "$B = \"b.ui\"; @X = $B.@Y; @Z = 1;"),
        ("b.ui", "$A = \"a.ui\"; @Y = $A.@Z;"),
    ]);
    let doc = resolve_source("$A = \"a.ui\"; Group { W: $A.@X; }", &resolver);
    assert_eq!(doc.root.property("W"), Some(&PropertyValue::Number(1.0)));
}
