//! Integration test: persisted save shapes.
//!
//! Seeds a backend with hand-written persisted values in the shipped save
//! format (plain JSON scalars plus the tagged-map encoding), opens a
//! session over it, and asserts the live state matches. Also covers the
//! fail-closed self-heal when a persisted value is corrupt.

use relink_core::catalog;
use relink_core::node::NodeState;
use relink_core::session::Session;
use relink_core::test_utils::RecordingPresenter;
use relink_store::backend::{MemoryBackend, StorageBackend};

#[test]
fn opens_a_hand_written_save() {
    let mut backend = MemoryBackend::new();
    backend.seed("player.energy", "2500");
    backend.seed("node.Mithril.state", "\"Alive\"");
    backend.seed("node.Mithril.upkeep", "40");
    backend.seed(
        "mithril.currentResources",
        r#"{"dataType":"Map","value":[["Scrap",5],["Steel",12]]}"#,
    );
    backend.seed("node.mithril.build-btn-successful-clicks", "4");
    backend.seed("state", "\"Primary\"");
    backend.seed("node_count", "1");

    let mut session = Session::open_seeded(backend, 3).unwrap();
    catalog::install(&mut session).unwrap();

    assert_eq!(session.energy(), 2500);
    let node = session.node("Mithril").unwrap();
    assert_eq!(node.state(), NodeState::Alive);
    assert_eq!(node.upkeep(), 40);
    let m = session.manufactory().unwrap();
    assert_eq!(m.ledger().amount("Scrap"), 5);
    assert_eq!(m.ledger().amount("Steel"), 12);
    assert_eq!(m.successful_builds(), 4);
    assert!(session.booted_before().unwrap());
    assert!(session.scanned_before().unwrap());
    assert!(session.take_recovery_reports().is_empty());
}

#[test]
fn persisted_shapes_match_the_save_format() {
    let mut session = Session::open_seeded(MemoryBackend::new(), 3).unwrap();
    catalog::install(&mut session).unwrap();
    let mut p = RecordingPresenter::new();
    catalog::boot(&mut session, &mut p).unwrap();
    session.connect("Mithril", &mut p).unwrap();

    let backend = session.into_backend();
    assert_eq!(
        backend.read("player.energy").unwrap().as_deref(),
        Some("920")
    );
    assert_eq!(
        backend.read("node.Mithril.state").unwrap().as_deref(),
        Some("\"Alive\"")
    );
    assert_eq!(backend.read("state").unwrap().as_deref(), Some("\"Primary\""));
    assert_eq!(backend.read("node_count").unwrap().as_deref(), Some("1"));

    // Collections use the tagged-map envelope.
    let resources = backend.read("mithril.currentResources").unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&resources).unwrap();
    assert_eq!(parsed["dataType"], "Map");
    assert!(parsed["value"].is_array());

    let recipes = backend.read("mithril.knownRecipes").unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&recipes).unwrap();
    assert_eq!(parsed["dataType"], "Map");
    assert_eq!(parsed["value"][0][0], "refine-scrap");
}

#[test]
fn corrupt_values_self_heal_and_report() {
    let mut backend = MemoryBackend::new();
    backend.seed("player.energy", "not a number");
    backend.seed("node.Mithril.state", "\"Zombie\"");
    backend.seed("mithril.currentResources", "{\"dataType\":\"Set\",\"value\":[]}");

    let mut session = Session::open_seeded(backend, 3).unwrap();
    catalog::install(&mut session).unwrap();

    // Every corrupt value fell back to its default and was re-persisted.
    assert_eq!(session.energy(), 982);
    assert_eq!(session.node("Mithril").unwrap().state(), NodeState::Hidden);
    assert_eq!(session.manufactory().unwrap().ledger().entries().count(), 0);

    let reports = session.take_recovery_reports();
    assert_eq!(reports.len(), 3);

    // The healed values round-trip cleanly on the next open.
    let backend = session.into_backend();
    let mut session = Session::open_seeded(backend, 4).unwrap();
    catalog::install(&mut session).unwrap();
    assert!(session.take_recovery_reports().is_empty());
}
