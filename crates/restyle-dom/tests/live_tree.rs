//! Live tree behaviour through the public trait

use pretty_assertions::assert_eq;
use restyle_dom::{DocumentSpec, LiveTree, MemoryTree, SelectorError};

fn page() -> MemoryTree {
    let spec = DocumentSpec::element("body")
        .with_computed("color", "black")
        .with_child(
            DocumentSpec::element("nav")
                .with_id("menu")
                .with_child(DocumentSpec::element("a").with_classes(&["link", "first"]))
                .with_child(DocumentSpec::element("a").with_classes(&["link"]))
                .with_child(DocumentSpec::element("a").with_classes(&["link", "last"])),
        )
        .with_child(
            DocumentSpec::element("main").with_child(
                DocumentSpec::element("p")
                    .with_style("margin: 0 auto; color: gray;")
                    .with_child(DocumentSpec::element("a").with_classes(&["link"])),
            ),
        );
    MemoryTree::from_spec(&spec).unwrap()
}

#[test]
fn combinators_and_structural_pseudos() {
    let tree = page();
    let links = tree.query_all(".link").unwrap();
    assert_eq!(links.len(), 4);

    assert_eq!(tree.query_all("#menu > a").unwrap(), links[..3].to_vec());
    assert_eq!(tree.query_all("main a").unwrap(), vec![links[3]]);
    assert_eq!(tree.query_all("#menu > :first-child").unwrap(), vec![links[0]]);
    assert_eq!(tree.query_all("#menu > :last-child").unwrap(), vec![links[2]]);
    assert_eq!(tree.query_all("#menu > :nth-child(2)").unwrap(), vec![links[1]]);
    assert_eq!(tree.query_all("a.link.last, a.first").unwrap(), vec![links[0], links[2]]);
}

#[test]
fn malformed_selectors_are_errors_not_panics() {
    let tree = page();
    assert_eq!(tree.query_all("   "), Err(SelectorError::Empty));
    assert!(matches!(
        tree.query_all("a:hover"),
        Err(SelectorError::UnsupportedPseudo { .. })
    ));
    assert!(tree.query_all("a..link").is_err());
    assert!(tree.query_all("#menu >").is_err());
}

#[test]
fn own_style_round_trips_and_cascades() {
    let mut tree = page();
    let p = tree.query_all("p").unwrap()[0];
    assert_eq!(
        tree.style_text(p).unwrap().as_deref(),
        Some("margin: 0 auto; color: gray;")
    );

    tree.set_own_property(p, "color", "navy").unwrap();
    tree.set_own_property(p, "padding", "4px").unwrap();
    assert_eq!(
        tree.style_text(p).unwrap().as_deref(),
        Some("margin: 0 auto; color: navy; padding: 4px;")
    );

    let link = tree.query_all("main a").unwrap()[0];
    assert_eq!(tree.computed_property(link, "color").unwrap(), "navy");

    tree.remove_own_property(p, "color").unwrap();
    assert_eq!(tree.computed_property(p, "color").unwrap(), "black");
}

#[test]
fn engine_rules_silently_drop_writes() {
    let mut tree = page();
    tree.ignore_value("display", "grid");
    let main = tree.query_all("main").unwrap()[0];

    tree.set_own_property(main, "display", "grid").unwrap();
    assert_eq!(tree.own_property(main, "display").unwrap(), None);

    tree.set_own_property(main, "display", "flex").unwrap();
    assert_eq!(tree.own_property(main, "display").unwrap().as_deref(), Some("flex"));
}

#[test]
fn detached_subtrees_leave_the_document() {
    let mut tree = page();
    let nav = tree.query_all("#menu").unwrap()[0];
    let first = tree.query_all(".first").unwrap()[0];
    tree.set_indicator(nav, true).unwrap();

    tree.detach(nav);
    assert!(!tree.has_indicator(nav));
    assert!(!tree.is_connected(nav));
    assert!(!tree.is_connected(first));
    assert!(tree.query_all("#menu").unwrap().is_empty());
    assert_eq!(tree.query_all(".link").unwrap().len(), 1);
    assert!(tree.set_own_property(first, "color", "red").is_err());
    assert!(tree.computed_property(first, "color").is_err());
}
