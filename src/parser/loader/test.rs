use super::*;
use crate::{error::LoadError, parser::parse, NodeKind};

fn load_source(src: &str) -> Result<Vec<Play>, LoadError> {
    load(&parse(src)?, &Registry::default())
}

#[test]
fn test_tactic() {
    let plays = load_source(
        r#"
play main = Sequence {
    Strike
    Idle
}

tactic Strike = Selector {
    Capture(role = striker)
}
    "#,
    )
    .unwrap();

    assert_eq!(plays.len(), 1);
    let root = &plays[0].root;
    assert_eq!(root.name(), "Sequence");
    assert_eq!(root.kind(), NodeKind::Composite);
    let names: Vec<_> = root.children().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["Selector", "Idle"]);
    assert_eq!(root.children()[0].children()[0].name(), "Capture");
}

#[test]
fn test_required() {
    let plays = load_source(
        r#"
tactic Wait = Timed(seconds = 1)

play main = Parallel {
    Wait(required = false)
    Wait
    Idle(required = false)
}
    "#,
    )
    .unwrap();

    let required: Vec<_> = plays[0]
        .root
        .children()
        .iter()
        .map(|c| c.is_required())
        .collect();
    assert_eq!(required, vec![false, true, false]);
}

#[test]
fn test_play_params() {
    let plays = load_source(
        "play A(priority = 7) when stage == playing = Idle\nplay B = Idle",
    )
    .unwrap();
    assert_eq!(plays[0].name(), "A");
    assert_eq!(plays[0].priority(), 7);
    assert_eq!(plays[1].priority(), 0);
    assert!(!plays[0].guard().matches(&Default::default()));
    assert!(plays[1].guard().matches(&Default::default()));

    assert!(matches!(
        load_source("play A(priority = -1) = Idle"),
        Err(LoadError::Param { .. })
    ));
    assert!(matches!(
        load_source("play A(speed = 1) = Idle"),
        Err(LoadError::Param { .. })
    ));
}

#[test]
fn test_recurse() {
    let res = load_source(
        r#"
play main = Sequence {
    sub
}

tactic sub = Sequence {
    sub
}
    "#,
    );
    assert!(matches!(
        res,
        Err(LoadError::InfiniteRecursion { node }) if node == "sub"
    ));

    // Mutual recursion
    let res = load_source(
        r#"
play main = ping

tactic ping = Sequence { pong }

tactic pong = Selector { ping }
    "#,
    );
    assert!(matches!(res, Err(LoadError::InfiniteRecursion { .. })));
}

#[test]
fn test_reused_tactic_is_not_recursion() {
    let plays = load_source(
        r#"
tactic Wait = Timed(seconds = 1)

play main = Sequence {
    Wait
    Wait
}
    "#,
    )
    .unwrap();
    assert_eq!(plays[0].root.children().len(), 2);
}

#[test]
fn test_errors() {
    assert!(matches!(
        load_source("play main = Dance"),
        Err(LoadError::MissingNode(node)) if node == "Dance"
    ));
    assert!(matches!(
        load_source("play main = Idle { Idle }"),
        Err(LoadError::AddChildError(_, node)) if node == "Idle"
    ));
    assert!(matches!(
        load_source("play main = Capture"),
        Err(LoadError::Param { node, error: ParamError::Missing("role") }) if node == "Capture"
    ));
    assert!(matches!(
        load_source("play main = Idle(required = 1)"),
        Err(LoadError::Param { .. })
    ));
    assert!(matches!(
        load_source("play main = Idle\nplay main = Idle"),
        Err(LoadError::DuplicatePlay(name)) if name == "main"
    ));
    assert!(matches!(
        load_source("tactic t = Idle\ntactic t = Idle\nplay main = t"),
        Err(LoadError::DuplicateTactic(name)) if name == "t"
    ));
    assert!(matches!(
        load_source("tactic t = Idle\nplay main = t(speed = 3)"),
        Err(LoadError::Param { .. })
    ));
    assert!(matches!(
        load_source("play main when weather == sunny = Idle"),
        Err(LoadError::InvalidGuard { key, .. }) if key == "weather"
    ));
    assert!(matches!(
        load_source("play main when stage == lunch = Idle"),
        Err(LoadError::InvalidGuard { value, .. }) if value == "lunch"
    ));
}

#[test]
fn test_syntax_error_location() {
    let err = load_source("play A = Idle\n\nplay B = Move(role = a,, to = ball)").err();
    match err {
        Some(LoadError::Parse { line, near }) => {
            assert_eq!(line, 3);
            assert_eq!(near, ", to = ball)");
        }
        other => panic!("unexpected {:?}", other),
    }

    assert!(matches!(
        load_source("play A = Idle\nnonsense"),
        Err(LoadError::Parse { line: 2, .. })
    ));
}
