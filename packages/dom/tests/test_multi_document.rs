/// Multi-document rendering tests
///
/// These tests validate that:
/// - A newly subscribed document receives everything rendered before it
/// - Documents that were already subscribed never receive duplicates
/// - Unsubscribed documents stop receiving rules
/// - Clearing the renderer removes the style nodes of every document

use fela::{DocumentHandle, Renderer, RendererConfig, Style, VirtualDocument};
use fela_dom::{render, serialize_document, TYPE_ATTRIBUTE};
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn style(value: Value) -> Style {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

fn rule_css(document: &DocumentHandle) -> String {
    document
        .borrow()
        .style_nodes()
        .iter()
        .filter(|node| node.attribute(TYPE_ATTRIBUTE) == Some("RULE"))
        .map(|node| node.css_text())
        .collect()
}

#[test]
fn test_late_document_receives_previous_rules() {
    init_tracing();
    let first = VirtualDocument::new().into_handle();
    let second = VirtualDocument::new().into_handle();
    let mut renderer = Renderer::new(RendererConfig::new());

    render(&mut renderer, &first);
    renderer.render_style(
        style(json!({ "color": "red", "fontSize": 12, ":hover": { "color": "blue" } })),
        &Value::Null,
    );

    render(&mut renderer, &second);

    assert_eq!(rule_css(&first), ".a{color:red}.b{font-size:12}.c:hover{color:blue}");
    assert_eq!(rule_css(&second), rule_css(&first));
    assert_eq!(serialize_document(&second.borrow()), serialize_document(&first.borrow()));
}

#[test]
fn test_new_rules_reach_every_document() {
    let first = VirtualDocument::new().into_handle();
    let second = VirtualDocument::new().into_handle();
    let mut renderer = Renderer::new(RendererConfig::new());

    render(&mut renderer, &first);
    render(&mut renderer, &second);
    renderer.render_declaration("color", &json!("red"), "", "", "");
    renderer.render_declaration("color", &json!("blue"), "", "(min-width: 300px)", "");

    for document in [&first, &second] {
        let document = document.borrow();
        let nodes = document.style_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].css_text(), ".a{color:red}");
        assert_eq!(nodes[1].attribute("media"), Some("(min-width: 300px)"));
    }
}

#[test]
fn test_resubscribing_a_document_does_not_duplicate() {
    let document = VirtualDocument::new().into_handle();
    let mut renderer = Renderer::new(RendererConfig::new());

    let first = render(&mut renderer, &document);
    renderer.render_declaration("color", &json!("red"), "", "", "");
    let second = render(&mut renderer, &document);

    assert_eq!(first.ref_id(), second.ref_id());
    assert_eq!(rule_css(&document), ".a{color:red}");
    assert_eq!(renderer.document_ref(&document).map(|r| r.ref_count), Some(2));
}

#[test]
fn test_unsubscribed_document_stops_receiving_rules() {
    let first = VirtualDocument::new().into_handle();
    let second = VirtualDocument::new().into_handle();
    let mut renderer = Renderer::new(RendererConfig::new());

    render(&mut renderer, &first);
    let subscription = render(&mut renderer, &second);
    renderer.render_declaration("color", &json!("red"), "", "", "");

    renderer.unsubscribe_document(&subscription);
    renderer.render_declaration("color", &json!("blue"), "", "", "");

    assert_eq!(rule_css(&first), ".a{color:red}.b{color:blue}");
    // nodes already written stay in place
    assert_eq!(rule_css(&second), ".a{color:red}");
    assert!(renderer.document_ref(&second).is_none());
}

#[test]
fn test_clear_removes_nodes_from_every_document() {
    let first = VirtualDocument::new().into_handle();
    let second = VirtualDocument::new().into_handle();
    let mut renderer = Renderer::new(RendererConfig::new());

    render(&mut renderer, &first);
    render(&mut renderer, &second);
    renderer.render_declaration("color", &json!("red"), "", "", "");
    renderer.render_static("body{margin:0}", None);

    renderer.clear();

    assert!(first.borrow().style_nodes().is_empty());
    assert!(second.borrow().style_nodes().is_empty());
    assert!(renderer.nodes().is_empty());

    // rendering after a clear starts over in the default document only
    renderer.render_declaration("color", &json!("red"), "", "", "");
    assert!(first.borrow().style_nodes().is_empty());
}

#[test]
fn test_default_document_receives_earlier_rules_on_attach() {
    let document = VirtualDocument::new().into_handle();
    let mut renderer = Renderer::new(RendererConfig::new().with_document(document.clone()));

    renderer.render_declaration("color", &json!("red"), "", "", "");
    renderer.render_static("body{margin:0}", None);

    let subscription = render(&mut renderer, &document);
    assert_eq!(subscription.ref_id(), 0);

    let document = document.borrow();
    let nodes = document.style_nodes();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].attribute(TYPE_ATTRIBUTE), Some("STATIC"));
    assert_eq!(nodes[0].css_text(), "body{margin:0}");
    assert_eq!(nodes[1].css_text(), ".a{color:red}");
}

#[test]
fn test_replayed_globals_are_written_once() {
    let first = VirtualDocument::new().into_handle();
    let second = VirtualDocument::new().into_handle();
    let mut renderer = Renderer::new(RendererConfig::new().with_keyframe_prefixes(vec![]));

    render(&mut renderer, &first);
    renderer.render_keyframe(
        |_: &fela::Props, _: &Renderer| style(json!({ "from": { "opacity": 0 } })),
        &Value::Null,
    );
    renderer.render_font("Lato", &["lato.woff"], &Default::default());
    render(&mut renderer, &second);
    render(&mut renderer, &first);

    for document in [&first, &second] {
        let document = document.borrow();
        let keyframes = document
            .style_nodes()
            .iter()
            .find(|node| node.attribute(TYPE_ATTRIBUTE) == Some("KEYFRAME"))
            .map(|node| node.css_text())
            .expect("keyframe node");
        assert_eq!(keyframes, "@keyframes k1{from{opacity:0}}");
        assert_eq!(document.style_nodes().len(), 2);
    }
}
