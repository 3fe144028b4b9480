//! Integration test: node lifecycle over the presenter.
//!
//! Exercises connect, the two-phase disconnect, and reconnect against a
//! recording presenter, asserting the render stream, the transient error
//! flash, the activation thought's once-only contract, and the
//! manufactory surface build/teardown hooks.

use relink_core::catalog;
use relink_core::error::GameError;
use relink_core::node::NodeState;
use relink_core::session::Session;
use relink_core::test_utils::RecordingPresenter;
use relink_store::backend::MemoryBackend;

fn booted() -> (Session<MemoryBackend>, RecordingPresenter) {
    let mut session = Session::open_seeded(MemoryBackend::new(), 7).unwrap();
    catalog::install(&mut session).unwrap();
    let mut p = RecordingPresenter::new();
    catalog::boot(&mut session, &mut p).unwrap();
    (session, p)
}

#[test]
fn failed_connect_flashes_and_changes_nothing() {
    let (mut session, mut p) = booted();
    session.set_energy(499, &mut p).unwrap();
    let renders_before = p.rendered.len();

    let result = session.connect("Mithril", &mut p);

    assert!(matches!(result, Err(GameError::InsufficientEnergy { .. })));
    assert_eq!(p.connect_flashes, vec!["Mithril".to_string()]);
    assert_eq!(p.rendered.len(), renders_before);
    assert_eq!(session.energy(), 499);
    assert_eq!(session.node("Mithril").unwrap().state(), NodeState::Disabled);
    assert!(p.surfaces_built.is_empty());
}

#[test]
fn connect_renders_alive_and_builds_the_surface() {
    let (mut session, mut p) = booted();

    session.connect("Mithril", &mut p).unwrap();

    assert_eq!(session.energy(), catalog::FIRST_SCAN_ENERGY_MW - 500);
    assert_eq!(p.last_render_of("Mithril").unwrap().state, NodeState::Alive);
    assert_eq!(p.surfaces_built, vec!["Mithril".to_string()]);
    // The activation thought fires alongside the surface build.
    assert!(p.thoughts.iter().any(|t| t.contains("Mithril used to be")));
}

#[test]
fn disconnect_requires_the_second_step() {
    let (mut session, mut p) = booted();
    session.connect("Mithril", &mut p).unwrap();

    session.begin_disconnect("Mithril").unwrap();
    // Arming alone changes nothing observable.
    assert_eq!(session.node("Mithril").unwrap().state(), NodeState::Alive);
    assert!(p.surfaces_torn_down.is_empty());

    session.confirm_disconnect("Mithril", &mut p).unwrap();
    assert_eq!(session.node("Mithril").unwrap().state(), NodeState::Disabled);
    assert_eq!(p.surfaces_torn_down, vec!["Mithril".to_string()]);
    assert_eq!(p.last_render_of("Mithril").unwrap().state, NodeState::Disabled);
}

#[test]
fn cancel_disarms_and_confirm_then_fails() {
    let (mut session, mut p) = booted();
    session.connect("Mithril", &mut p).unwrap();

    session.begin_disconnect("Mithril").unwrap();
    session.cancel_disconnect("Mithril").unwrap();

    let result = session.confirm_disconnect("Mithril", &mut p);
    assert!(matches!(result, Err(GameError::ConfirmNotPending(_))));
    assert_eq!(session.node("Mithril").unwrap().state(), NodeState::Alive);
}

#[test]
fn activation_thought_fires_once_across_reconnects() {
    let (mut session, mut p) = booted();

    session.connect("Mithril", &mut p).unwrap();
    session.begin_disconnect("Mithril").unwrap();
    session.confirm_disconnect("Mithril", &mut p).unwrap();
    session.connect("Mithril", &mut p).unwrap();

    let activation = p
        .thoughts
        .iter()
        .filter(|t| t.contains("Mithril used to be"))
        .count();
    assert_eq!(activation, 1);
    // The surface, by contrast, rebuilds every time.
    assert_eq!(p.surfaces_built.len(), 2);
}

#[test]
fn reconnect_debits_the_cost_again() {
    let (mut session, mut p) = booted();

    session.connect("Mithril", &mut p).unwrap();
    session.begin_disconnect("Mithril").unwrap();
    session.confirm_disconnect("Mithril", &mut p).unwrap();
    session.connect("Mithril", &mut p).unwrap();

    assert_eq!(session.energy(), catalog::FIRST_SCAN_ENERGY_MW - 1000);
}

#[test]
fn lifecycle_survives_reopen_mid_disconnect() {
    let (mut session, mut p) = booted();
    session.connect("Mithril", &mut p).unwrap();
    session.begin_disconnect("Mithril").unwrap();
    let backend = session.into_backend();

    // The armed confirmation is in-memory only; a reopened session comes
    // back Alive with nothing pending.
    let mut session = Session::open_seeded(backend, 8).unwrap();
    catalog::install(&mut session).unwrap();
    let mut p = RecordingPresenter::new();

    assert_eq!(session.node("Mithril").unwrap().state(), NodeState::Alive);
    let result = session.confirm_disconnect("Mithril", &mut p);
    assert!(matches!(result, Err(GameError::ConfirmNotPending(_))));
}
