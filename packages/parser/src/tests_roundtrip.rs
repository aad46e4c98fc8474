//! Round-trip properties: parse → export → parse is structurally stable, and
//! export is idempotent after one pass.

use crate::document::*;
use crate::serializer::{export, FormatterConfig};
use crate::{parse, parse_partial};

fn roundtrip(source: &str) -> (UIDocument, String) {
    let doc = parse(source).expect("parse failed");
    let text = export(&doc, &FormatterConfig::default()).expect("export failed");
    (doc, text)
}

#[test]
fn test_roundtrip_structural_equality() {
    let source = r#"
$Gui = "shared/gui.ui";

@Size = 64;
@Card = (Padding: 4, Background: #202020);

Group #Main {
    Width: @Size;
    Height: @Size + 16;
    Visible: true;
    Tint: #ff0000(0.5);
    Label #Title {
        Text: "Hello";
        Scale: 50%;
    }
}
"#;
    let (doc, text) = roundtrip(source);
    let reparsed = parse(&text).expect("re-parse failed");
    assert_eq!(doc, reparsed);
}

#[test]
fn test_export_is_idempotent() {
    let source = r#"
@Theme = (Primary: #3366ff, ...@Base);
Group #Main {
    @Pad = 8;
    Width: @Pad * 2 + 4;
    ...@Theme;
    Label #A { Text: "A"; }
    // keep me
    Label #B { Text: %menu.b; }
}
"#;
    let (doc, first) = roundtrip(source);
    let _ = doc;
    let again = parse(&first).expect("re-parse failed");
    let second = export(&again, &FormatterConfig::default()).expect("second export failed");
    assert_eq!(first, second);
}

#[test]
fn test_untouched_references_reexport_verbatim() {
    let source = "Group #Main { Width: @Size; Color: $Gui.@Theme.Primary; ...$Gui.@Card; }";
    let (_, text) = roundtrip(source);
    assert!(text.contains("Width: @Size;"));
    assert!(text.contains("Color: $Gui.@Theme.Primary;"));
    assert!(text.contains("...$Gui.@Card;"));
}

#[test]
fn test_scenario_comment_between_siblings() {
    let source = "Group { Label #A{Text:\"A\";} // mid\n Label #B{Text:\"B\";} }";
    let (_, text) = roundtrip(source);

    let a = text.find("Label #A").expect("A missing");
    let mid = text.find("// mid").expect("comment missing");
    let b = text.find("Label #B").expect("B missing");
    assert!(a < mid && mid < b, "comment drifted: {}", text);
}

#[test]
fn test_scenario_color_alpha_exact() {
    let (_, text) = roundtrip("Group { Tint: #ff0000(0.5); }");
    assert!(text.contains("#ff0000(0.5)"), "alpha mangled: {}", text);

    // No alpha: none invented
    let (_, text) = roundtrip("Group { Tint: #ff0000; }");
    assert!(text.contains("Tint: #ff0000;"));
    assert!(!text.contains("#ff0000("));
}

#[test]
fn test_alias_reversal_is_byte_exact() {
    let (_, text) = roundtrip("TextButton #Ok { Text: \"OK\"; }");
    assert!(text.contains("TextButton #Ok"), "alias lost: {}", text);

    let (_, text) = roundtrip("AssetImage #Icon { Source: \"a.png\"; }");
    assert!(text.contains("AssetImage #Icon"));

    let (_, text) = roundtrip("TabNavigation #Tabs { }");
    assert!(text.contains("TabNavigation #Tabs"));

    let (_, text) = roundtrip("Group #Scroller { LayoutMode: Horizontal; }");
    assert!(text.contains("Group #Scroller"));
    assert!(text.contains("LayoutMode: Horizontal;"));
    assert!(!text.contains("ScrollView"));
    assert!(!text.contains("Orientation"));
}

#[test]
fn test_plain_scrollview_is_not_renamed() {
    let (doc, text) = roundtrip("ScrollView #S { Orientation: Vertical; }");
    assert_eq!(doc.root.element_type.as_str(), "ScrollView");
    assert!(text.contains("ScrollView #S"));
    assert!(text.contains("Orientation: Vertical;"));
}

#[test]
fn test_prefixed_forms_roundtrip() {
    let source = "Group #Root { @Header #Top { Width: 1; } $Gui.@Card #Box { } #Bare { } }";
    let (doc, text) = roundtrip(source);
    assert!(text.contains("@Header #Top {"));
    assert!(text.contains("$Gui.@Card #Box {"));
    assert!(text.contains("#Bare {"));

    let reparsed = parse(&text).expect("re-parse failed");
    assert_eq!(doc, reparsed);
}

#[test]
fn test_expression_precedence_roundtrip() {
    // Explicit parens that matter are kept
    let (doc, text) = roundtrip("Group { W: 2 - (3 - 1); }");
    assert!(text.contains("W: 2 - (3 - 1);"), "parens lost: {}", text);
    assert_eq!(doc, parse(&text).unwrap());

    // Left-associative chain re-emits without parens
    let (_, text) = roundtrip("Group { W: 2 - 3 - 1; }");
    assert!(text.contains("W: 2 - 3 - 1;"));

    // Redundant parens are dropped, tree is unchanged
    let flat = parse("Group { W: (2 - 3) - 1; }").unwrap();
    let bare = parse("Group { W: 2 - 3 - 1; }").unwrap();
    assert_eq!(flat, bare);
}

#[test]
fn test_multi_root_wrapper_is_flattened() {
    let source = "Group #A { }\nGroup #B { }";
    let (doc, text) = roundtrip(source);
    assert!(doc.root.is_wrapper());
    assert!(!text.contains("#document"));

    let reparsed = parse(&text).expect("re-parse failed");
    assert_eq!(doc, reparsed);
}

#[test]
fn test_number_formatting() {
    let (_, text) = roundtrip("Group { A: 64; B: 0.5; C: 12.0 + 1; }");
    assert!(text.contains("A: 64;"));
    assert!(text.contains("B: 0.5;"));
    // Integral decimals normalize to the bare integer
    assert!(text.contains("C: 12 + 1;"));
}

#[test]
fn test_percent_rounding_stabilizes() {
    let (_, first) = roundtrip("Group { W: 33.3333%; }");
    assert!(first.contains("W: 33.33%;"));

    let again = parse(&first).unwrap();
    let second = export(&again, &FormatterConfig::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_list_and_tuple_roundtrip() {
    let source = "Group { Tags: [\"a\", \"b\"]; Pad: (Top: 1, Bottom: 2, ...@Extra); }";
    let (doc, text) = roundtrip(source);
    assert!(text.contains("Tags: [\"a\", \"b\"];"));
    assert!(text.contains("Pad: (Top: 1, Bottom: 2, ...@Extra);"));
    assert_eq!(doc, parse(&text).unwrap());
}

#[test]
fn test_anchor_field_order_preserved() {
    let (doc, text) = roundtrip("Group { Anchor: (Bottom: 4, Left: 2); }");
    assert!(
        text.contains("Anchor: (Bottom: 4, Left: 2);"),
        "field order changed: {}",
        text
    );
    assert_eq!(doc, parse(&text).unwrap());
}

#[test]
fn test_header_and_footer_comments() {
    let source = "// header\nGroup #Main { }\n// footer trails everything\n";
    let (_, text) = roundtrip(source);
    let header = text.find("// header").unwrap();
    let group = text.find("Group #Main").unwrap();
    let footer = text.find("// footer").unwrap();
    assert!(header < group && group < footer);
}

#[test]
fn test_parse_errors_fail_parse_but_not_partial() {
    let source = "Group { Width: ; Height: 10; }";
    let errors = parse(source).expect_err("should fail");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].line >= 1);

    let (doc, errors) = parse_partial(source, "/broken.ui");
    assert_eq!(errors.len(), 1);
    assert!(doc.root.property("Height").is_some());
}

#[test]
fn test_scoped_style_roundtrip() {
    let (doc, text) = roundtrip("Group { @Pad = 8; Width: @Pad; }");
    assert!(text.contains("@Pad = 8;"));
    assert!(text.contains("Width: @Pad;"));
    assert_eq!(doc, parse(&text).unwrap());
}

#[test]
fn test_semicolon_after_block_config() {
    let doc = parse("Group #A { Label #B { } }").unwrap();
    let config = FormatterConfig {
        semicolon_after_block: true,
        ..FormatterConfig::default()
    };
    let text = export(&doc, &config).unwrap();
    assert!(text.contains("};"));

    // The emitted form parses back to the same structure
    assert_eq!(doc, parse(&text).unwrap());
}

#[test]
fn test_tabs_config() {
    let doc = parse("Group { Width: 1; }").unwrap();
    let config = FormatterConfig {
        use_tabs: true,
        ..FormatterConfig::default()
    };
    let text = export(&doc, &config).unwrap();
    assert!(text.contains("\tWidth: 1;"));
}

#[test]
fn test_inline_style_use_roundtrip() {
    let (doc, text) = roundtrip("Group { ...(Padding: 4); (Margin: 2); }");
    assert!(text.contains("...(Padding: 4);"));
    assert!(text.contains("(Margin: 2);"));
    assert_eq!(doc, parse(&text).unwrap());
}

#[test]
fn test_localized_and_null_roundtrip() {
    let (doc, text) = roundtrip("Label { Text: %hud.score; Extra: null; }");
    assert!(text.contains("Text: %hud.score;"));
    assert!(text.contains("Extra: null;"));
    assert_eq!(doc, parse(&text).unwrap());
}
