use dom::{NodeKey, find_element, find_elements};
use render::{Engine, Props, RenderError, RenderTree, TemplateResult, Value, html};
use std::cell::Cell;
use std::rc::Rc;

fn engine() -> Rc<Engine> {
    let engine = Engine::new();
    engine.define("x-card", |props: &Props| {
        html!("<section class=\"card\"><h2>" {props.text("title")} "</h2><slot>nothing here</slot></section>")
    });
    engine.define("x-panel", |_: &Props| {
        html!("<header><slot name=\"title\">Untitled</slot></header><div class=\"body\"><slot></slot></div>")
    });
    engine.define("x-button", |props: &Props| {
        let onpress = props.get("onpress").cloned().unwrap_or_default();
        html!("<button onclick=" {onpress} ">" {props.text("label")} "</button>")
    });
    Rc::new(engine)
}

fn setup() -> (RenderTree, NodeKey) {
    let mut tree = RenderTree::new(engine());
    let root = tree.document_mut().create_element("body");
    (tree, root)
}

fn element(tree: &RenderTree, root: NodeKey, name: &str) -> NodeKey {
    find_element(tree.document(), root, name)
        .unwrap_or_else(|| panic!("no <{name}> in {}", tree.document().inner_html(root)))
}

fn text(tree: &RenderTree, node: NodeKey) -> String {
    tree.document().text_content(node)
}

fn card_page(title: &str, body: &str) -> TemplateResult {
    html!("<main><x-card title=" {title} "><p>" {body} "</p></x-card></main>")
}

#[test]
fn component_receives_props_and_default_slot() {
    let (mut tree, root) = setup();
    tree.render(card_page("Hello", "first"), root).unwrap();

    let section = element(&tree, root, "section");
    assert_eq!(tree.document().get_attribute(section, "class"), Some("card"));
    assert_eq!(text(&tree, element(&tree, section, "h2")), "Hello");
    let p = element(&tree, section, "p");
    assert_eq!(text(&tree, p), "first");
    assert!(!text(&tree, root).contains("nothing here"));
    assert!(find_element(tree.document(), root, "x-card").is_none());
}

#[test]
fn component_updates_in_place() {
    let (mut tree, root) = setup();
    tree.render(card_page("Hello", "first"), root).unwrap();
    let h2 = element(&tree, root, "h2");
    let p = element(&tree, root, "p");

    tree.render(card_page("Bye", "second"), root).unwrap();
    assert_eq!(element(&tree, root, "h2"), h2);
    assert_eq!(element(&tree, root, "p"), p);
    assert_eq!(text(&tree, h2), "Bye");
    assert_eq!(text(&tree, p), "second");
}

#[test]
fn empty_caller_content_uses_fallback() {
    let (mut tree, root) = setup();
    tree.render(html!("<x-card title=\"t\">\n  </x-card>"), root).unwrap();
    let section = element(&tree, root, "section");
    assert_eq!(text(&tree, section), "tnothing here");
}

#[test]
fn named_slots_take_matching_children() {
    let (mut tree, root) = setup();
    tree.render(
        html!("<x-panel>\n  <h1 slot=\"title\">Hi</h1>\n  <p>Body</p>\n</x-panel>"),
        root,
    )
    .unwrap();

    let header = element(&tree, root, "header");
    let body = element(&tree, root, "div");
    assert!(find_element(tree.document(), header, "h1").is_some());
    assert!(find_element(tree.document(), header, "p").is_none());
    assert_eq!(text(&tree, element(&tree, body, "p")), "Body");
    assert!(!text(&tree, header).contains("Untitled"));
}

#[test]
fn missing_named_slot_content_falls_back() {
    let (mut tree, root) = setup();
    tree.render(html!("<x-panel><p>Only body</p></x-panel>"), root)
        .unwrap();
    let header = element(&tree, root, "header");
    assert_eq!(text(&tree, header), "Untitled");
    assert_eq!(text(&tree, element(&tree, root, "div")), "Only body");
}

fn counter_button(label: &str, count: Rc<Cell<u32>>) -> TemplateResult {
    let onpress = Value::handler(move |_| count.set(count.get() + 1));
    html!("<x-button label=" {label} " onpress=" {onpress} "></x-button>")
}

#[test]
fn handler_props_reach_the_component() {
    let (mut tree, root) = setup();
    let count = Rc::new(Cell::new(0));
    tree.render(counter_button("go", Rc::clone(&count)), root).unwrap();
    let button = element(&tree, root, "button");
    assert_eq!(text(&tree, button), "go");
    tree.document().dispatch(button, "click");
    assert_eq!(count.get(), 1);

    tree.render(counter_button("again", Rc::clone(&count)), root).unwrap();
    assert_eq!(element(&tree, root, "button"), button);
    assert_eq!(tree.document().listener_count(button, "click"), 1);
    tree.document().dispatch(button, "click");
    assert_eq!(count.get(), 2);
    assert_eq!(text(&tree, button), "again");
}

#[test]
fn components_inside_lists() {
    let (mut tree, root) = setup();
    let page = |titles: &[&str]| {
        let cards: Vec<TemplateResult> = titles
            .iter()
            .map(|title| html!("<x-card title=" {*title} "></x-card>"))
            .collect();
        html!("<div>" {cards} "</div>")
    };
    tree.render(page(&["a", "b"]), root).unwrap();
    let sections = find_elements(tree.document(), root, "section");
    assert_eq!(sections.len(), 2);

    tree.render(page(&["a", "b", "c"]), root).unwrap();
    let grown = find_elements(tree.document(), root, "section");
    assert_eq!(grown.len(), 3);
    assert_eq!(grown[..2], sections[..]);
    let titles: Vec<_> = find_elements(tree.document(), root, "h2")
        .into_iter()
        .map(|h2| text(&tree, h2))
        .collect();
    assert_eq!(titles, ["a", "b", "c"]);
}

#[test]
fn component_names_are_case_insensitive() {
    let engine = Rc::new(Engine::new());
    engine.define("X-Late", |_: &Props| html!("<i>late</i>"));
    assert!(engine.components().contains("x-late"));

    let mut tree = RenderTree::new(Rc::clone(&engine));
    let root = tree.document_mut().create_element("body");
    tree.render(html!("<X-LATE></X-LATE>"), root).unwrap();
    assert_eq!(text(&tree, root), "late");
}

#[test]
fn removed_components_fail_to_resolve() {
    let (mut tree, root) = setup();
    let page = || html!("<x-card title=\"t\"></x-card>");
    tree.render(page(), root).unwrap();
    assert!(tree.engine().components().remove("x-card").is_some());

    let mut other = RenderTree::new(Rc::clone(tree.engine()));
    let root = other.document_mut().create_element("body");
    assert_eq!(
        other.render(page(), root),
        Err(RenderError::UnknownComponent("x-card".into()))
    );
}

#[test]
fn caller_nodes_with_holes_stay_live() {
    let (mut tree, root) = setup();
    let page = |n: u32| html!("<x-card title=\"count\"><b>" {n} "</b> items</x-card>");
    tree.render(page(1), root).unwrap();
    let b = element(&tree, root, "b");
    assert_eq!(text(&tree, b), "1");
    tree.render(page(2), root).unwrap();
    assert_eq!(element(&tree, root, "b"), b);
    assert_eq!(text(&tree, b), "2");
    let section = element(&tree, root, "section");
    assert_eq!(text(&tree, section), "count2 items");
}

fn toggle_engine() -> Rc<Engine> {
    let engine = Engine::new();
    engine.define("x-toggle", |props: &Props| {
        if props.get("on").is_some_and(Value::is_truthy) {
            html!("<div class=\"on\"><slot></slot></div>")
        } else {
            html!("<p>off</p>")
        }
    });
    Rc::new(engine)
}

fn toggle_page(on: bool, n: u32) -> TemplateResult {
    html!("<x-toggle on=" {on} "><b>" {n} "</b></x-toggle>")
}

#[test]
fn caller_content_survives_a_slotless_template() {
    let mut tree = RenderTree::new(toggle_engine());
    let root = tree.document_mut().create_element("body");
    tree.render(toggle_page(true, 1), root).unwrap();
    let b = element(&tree, root, "b");
    assert_eq!(text(&tree, b), "1");

    tree.render(toggle_page(false, 2), root).unwrap();
    assert!(find_element(tree.document(), root, "b").is_none());
    assert_eq!(text(&tree, root), "off");
    assert!(tree.document().contains(b));

    tree.render(toggle_page(false, 3), root).unwrap();
    assert_eq!(text(&tree, root), "off");

    tree.render(toggle_page(true, 4), root).unwrap();
    assert_eq!(element(&tree, root, "b"), b);
    assert_eq!(text(&tree, b), "4");
    let div = element(&tree, root, "div");
    assert_eq!(tree.document().parent(b), Some(div));
    assert!(find_element(tree.document(), root, "p").is_none());
}

#[test]
fn unmount_leaves_no_stray_nodes() {
    let (mut tree, root) = setup();
    tree.render(card_page("Hello", "first"), root).unwrap();
    tree.render(panel_page(), root).unwrap();
    tree.render(card_page("Again", "second"), root).unwrap();
    assert!(tree.unmount(root).unwrap());
    assert_eq!(tree.document().len(), 1);
}

fn panel_page() -> TemplateResult {
    html!("<x-panel>\n  <h1 slot=\"title\">Hi</h1>\n</x-panel>")
}

#[test]
fn component_errors_propagate() {
    let engine = Engine::new();
    engine.define("x-bad", |_: &Props| html!("<p onclick=" {"not a handler"} "></p>"));
    let mut tree = RenderTree::new(Rc::new(engine));
    let root = tree.document_mut().create_element("body");
    let err = tree.render(html!("<x-bad></x-bad>"), root).unwrap_err();
    assert!(matches!(err, RenderError::UnsupportedAttrValue { ref name, kind: "text" } if name == "onclick"));
}
