use std::{cell::Cell, rc::Rc};

use super::*;
use crate::{
    config::GameplayConfig,
    planning::PlanFeedback,
    role_assignment::{Assignment, RoleRequest, RoleRequirements},
    world::{Team, WorldState},
    DiagnosticEvent,
};

struct Fixed(Status);

impl BehaviorNode for Fixed {
    fn tick(&mut self, _children: &mut [BehaviorNodeContainer], _ctx: &mut Context) -> Status {
        self.0
    }
}

/// Running for `left` ticks, then Success. Counts how often it was ticked.
struct Countdown {
    left: u32,
    ticks: Rc<Cell<u32>>,
}

impl Countdown {
    fn new(left: u32) -> (Self, Rc<Cell<u32>>) {
        let ticks = Rc::new(Cell::new(0));
        (
            Self {
                left,
                ticks: ticks.clone(),
            },
            ticks,
        )
    }
}

impl BehaviorNode for Countdown {
    fn tick(&mut self, _children: &mut [BehaviorNodeContainer], _ctx: &mut Context) -> Status {
        self.ticks.set(self.ticks.get() + 1);
        if self.left == 0 {
            Status::Success
        } else {
            self.left -= 1;
            Status::Running
        }
    }
}

struct Wants(&'static str, Status);

impl BehaviorNode for Wants {
    fn tick(&mut self, _children: &mut [BehaviorNodeContainer], _ctx: &mut Context) -> Status {
        self.1
    }

    fn role_request(&self, _world: &WorldState, _config: &GameplayConfig) -> Option<RoleRequest> {
        Some(RoleRequest::new(self.0, RoleRequirements::default()))
    }
}

fn node(n: impl BehaviorNode + 'static) -> BehaviorNodeContainer {
    BehaviorNodeContainer::new_node(n)
}

fn tree(
    root: impl BehaviorNode + 'static,
    children: impl IntoIterator<Item = BehaviorNodeContainer>,
) -> BehaviorNodeContainer {
    let mut root = node(root);
    for child in children {
        root.add_child(child).unwrap();
    }
    root
}

fn tick_at(tree: &mut BehaviorNodeContainer, time: f64) -> Status {
    let world = WorldState::new(time, Team::Blue);
    let config = GameplayConfig::default();
    let assignment = Assignment::default();
    let feedback = PlanFeedback::default();
    let mut ctx = Context::new(&world, &config, &assignment, &feedback);
    tree.tick(&mut ctx)
}

fn tick(tree: &mut BehaviorNodeContainer) -> Status {
    tick_at(tree, 0.)
}

fn roles(tree: &BehaviorNodeContainer) -> Vec<String> {
    let world = WorldState::new(0., Team::Blue);
    let (requests, _) = tree.requirements(&world, &GameplayConfig::default());
    requests.into_iter().map(|r| r.role.to_string()).collect()
}

#[test]
fn test_sequence() {
    let mut seq = tree(
        SequenceNode::default(),
        [node(Fixed(Status::Success)), node(Fixed(Status::Success))],
    );
    assert_eq!(tick(&mut seq), Status::Success);

    let mut seq = tree(
        SequenceNode::default(),
        [node(Fixed(Status::Failed)), node(Fixed(Status::Success))],
    );
    assert_eq!(tick(&mut seq), Status::Failed);

    // Optional children may fail
    let mut seq = tree(
        SequenceNode::default(),
        [
            node(Fixed(Status::Failed)).optional(),
            node(Fixed(Status::Success)),
        ],
    );
    assert_eq!(tick(&mut seq), Status::Success);

    assert_eq!(
        tick(&mut tree(SequenceNode::default(), Vec::new())),
        Status::Success
    );
}

#[test]
fn test_sequence_suspend() {
    let (first, first_ticks) = Countdown::new(2);
    let (second, second_ticks) = Countdown::new(0);
    let mut seq = tree(SequenceNode::default(), [node(first), node(second)]);

    assert_eq!(tick(&mut seq), Status::Running);
    assert_eq!(tick(&mut seq), Status::Running);
    assert_eq!(second_ticks.get(), 0);

    // The first child finishes and the second one runs in the same tick
    assert_eq!(tick(&mut seq), Status::Success);
    assert_eq!(first_ticks.get(), 3);
    assert_eq!(second_ticks.get(), 1);

    // Finished nodes are not ticked again until reset
    assert_eq!(tick(&mut seq), Status::Success);
    assert_eq!(first_ticks.get(), 3);

    seq.reset();
    assert_eq!(seq.last_result(), None);
    assert_eq!(tick(&mut seq), Status::Success);
    assert_eq!(first_ticks.get(), 4);
}

#[test]
fn test_selector() {
    let mut sel = tree(
        SelectorNode::default(),
        [node(Fixed(Status::Failed)), node(Fixed(Status::Success))],
    );
    assert_eq!(tick(&mut sel), Status::Success);

    let mut sel = tree(
        SelectorNode::default(),
        [node(Fixed(Status::Failed)), node(Fixed(Status::Failed))],
    );
    assert_eq!(tick(&mut sel), Status::Failed);

    let (first, first_ticks) = Countdown::new(1);
    let mut sel = tree(
        SelectorNode::default(),
        [node(Fixed(Status::Failed)), node(first), node(Fixed(Status::Success))],
    );
    assert_eq!(tick(&mut sel), Status::Running);
    assert_eq!(tick(&mut sel), Status::Success);
    assert_eq!(first_ticks.get(), 2);
}

#[test]
fn test_parallel() {
    let (running, _) = Countdown::new(1);
    let mut par = tree(
        ParallelNode,
        [node(running), node(Fixed(Status::Failed)).optional()],
    );
    assert_eq!(tick(&mut par), Status::Running);
    assert_eq!(tick(&mut par), Status::Success);

    let (running, _) = Countdown::new(5);
    let mut par = tree(ParallelNode, [node(running), node(Fixed(Status::Failed))]);
    assert_eq!(tick(&mut par), Status::Failed);

    // Only optional children: done when all of them are
    let (running, _) = Countdown::new(1);
    let mut par = tree(
        ParallelNode,
        [
            node(running).optional(),
            node(Fixed(Status::Failed)).optional(),
        ],
    );
    assert_eq!(tick(&mut par), Status::Running);
    assert_eq!(tick(&mut par), Status::Success);

    // Required children decide even while optional ones keep running
    let (forever, _) = Countdown::new(u32::MAX);
    let mut par = tree(
        ParallelNode,
        [node(Fixed(Status::Success)), node(forever).optional()],
    );
    assert_eq!(tick(&mut par), Status::Success);
}

#[test]
fn test_repeat() {
    let (child, ticks) = Countdown::new(0);
    let mut rep = tree(RepeatNode::new(Some(3)), [node(child)]);
    assert_eq!(tick(&mut rep), Status::Running);
    assert_eq!(tick(&mut rep), Status::Running);
    assert_eq!(tick(&mut rep), Status::Success);
    assert_eq!(ticks.get(), 3);

    let mut rep = tree(RepeatNode::new(None), [node(Fixed(Status::Failed))]);
    assert_eq!(tick(&mut rep), Status::Failed);

    let mut rep = tree(RepeatNode::new(None), [node(Fixed(Status::Success))]);
    for _ in 0..10 {
        assert_eq!(tick(&mut rep), Status::Running);
    }
}

#[test]
fn test_single_child_limit() {
    let mut rep = node(RepeatNode::new(None));
    assert!(rep.add_child(node(Fixed(Status::Success))).is_ok());
    assert!(rep.add_child(node(Fixed(Status::Success))).is_err());
    assert!(node(Fixed(Status::Success))
        .add_child(node(Fixed(Status::Success)))
        .is_err());
}

#[test]
fn test_timed() {
    let (slow, _) = Countdown::new(100);
    let mut timed = tree(TimedNode::new(1.), [node(slow)]);
    assert_eq!(tick_at(&mut timed, 10.), Status::Running);
    assert_eq!(tick_at(&mut timed, 10.5), Status::Running);
    assert_eq!(tick_at(&mut timed, 11.), Status::Failed);
    assert_eq!(timed.state_name(), "TimedOut");

    let (quick, _) = Countdown::new(1);
    let mut timed = tree(TimedNode::new(1.), [node(quick)]);
    assert_eq!(tick_at(&mut timed, 0.), Status::Running);
    assert_eq!(tick_at(&mut timed, 0.1), Status::Success);
    assert_eq!(timed.state_name(), "Done");

    timed.reset();
    assert_eq!(timed.state_name(), "Waiting");
}

#[test]
fn test_wait() {
    let mut wait = node(TimedNode::new(2.));
    assert_eq!(tick_at(&mut wait, 5.), Status::Running);
    assert_eq!(tick_at(&mut wait, 6.), Status::Running);
    assert_eq!(tick_at(&mut wait, 7.), Status::Success);
}

#[test]
fn test_timed_states_named() {
    for state in TimedState::ALL {
        assert!(!state.name().is_empty());
    }
}

#[test]
fn test_requirements_follow_active_children() {
    let mut seq = tree(
        SequenceNode::default(),
        [
            node(Wants("first", Status::Success)),
            node(Wants("second", Status::Running)),
        ],
    );
    assert_eq!(roles(&seq), vec!["first"]);
    assert_eq!(tick(&mut seq), Status::Running);
    assert_eq!(roles(&seq), vec!["second"]);

    let par = tree(
        ParallelNode,
        [
            node(Wants("a", Status::Running)),
            tree(
                SequenceNode::default(),
                [node(Wants("b", Status::Running)), node(Wants("c", Status::Running))],
            ),
        ],
    );
    assert_eq!(roles(&par), vec!["a", "b"]);
}

#[test]
fn test_duplicate_role() {
    let par = tree(
        ParallelNode,
        [
            node(Wants("striker", Status::Running)),
            node(Wants("striker", Status::Running)),
        ],
    );
    let world = WorldState::new(0., Team::Blue);
    let (requests, events) = par.requirements(&world, &GameplayConfig::default());
    assert_eq!(requests.len(), 1);
    assert!(matches!(
        events.as_slice(),
        [DiagnosticEvent::DuplicateRole { .. }]
    ));
}

#[test]
fn test_node_state_events() {
    let world = WorldState::new(0., Team::Blue);
    let config = GameplayConfig::default();
    let assignment = Assignment::default();
    let feedback = PlanFeedback::default();
    let mut ctx = Context::new(&world, &config, &assignment, &feedback);

    let (child, _) = Countdown::new(3);
    let mut seq = tree(SequenceNode::default(), [node(child)]);
    seq.tick(&mut ctx);
    seq.tick(&mut ctx);
    // Only the first tick changed anything
    assert_eq!(ctx.events().len(), 2);
    let (_, events) = ctx.into_parts();
    assert!(matches!(
        &events[0],
        DiagnosticEvent::NodeState { node, status: Status::Running, .. } if node == "Countdown"
    ));
}
