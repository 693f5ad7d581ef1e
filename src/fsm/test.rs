use super::*;
use crate::{
    error::{InfeasibleAssignment, InfeasibleReason},
    geometry::{point, Pose},
    planning::PlanFeedback,
    role_assignment::{assign, Assignment, Candidate, Capabilities, StickyBindings},
    skills::{Capture, CaptureState},
    world::{BallObservation, GameState, RobotId, Team},
    Action,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Light {
    Red,
    Green,
}

impl FsmState for Light {
    const ALL: &'static [Self] = &[Light::Red, Light::Green];

    fn name(self) -> &'static str {
        match self {
            Light::Red => "Red",
            Light::Green => "Green",
        }
    }
}

#[test]
fn test_state_machine() {
    let mut machine = StateMachine::new(Light::Red);
    assert_eq!(machine.time_in_state(5.), 0.);
    machine.start(1.);
    assert_eq!(machine.time_in_state(3.), 2.);
    assert!(!machine.set(Light::Red, 3.));
    assert_eq!(machine.time_in_state(3.), 2.);

    assert!(machine.set(Light::Green, 4.));
    assert_eq!(machine.state(), Light::Green);
    assert_eq!(machine.time_in_state(4.5), 0.5);
    // Time never runs backwards
    assert_eq!(machine.time_in_state(0.), 0.);

    machine.reset();
    assert_eq!(machine.state(), Light::Red);
    assert_eq!(machine.time_in_state(10.), 0.);
}

fn world() -> WorldState {
    WorldState::new(0., Team::Blue)
        .with_game(GameState::playing())
        .with_robot(RobotObservation::new(3, Team::Blue, Pose::new(0., 0., 0.)))
        .with_ball(BallObservation::at(point(1., 0.)))
}

fn capture_node(mandatory: bool) -> SkillNode<Capture> {
    SkillNode::new(
        Capture,
        RoleSpec {
            mandatory,
            priority: 4,
            ..RoleSpec::new("striker")
        },
    )
}

fn tick(
    node: &mut SkillNode<Capture>,
    world: &WorldState,
    assignment: &Assignment,
) -> (Status, Option<Action>) {
    let config = GameplayConfig::default();
    let feedback = PlanFeedback::default();
    let mut ctx = Context::new(world, &config, assignment, &feedback);
    let status = node.tick(&mut [], &mut ctx);
    (status, ctx.action(RobotId(3)).copied())
}

#[test]
fn test_role_request() {
    let node = capture_node(true);
    let request = node
        .role_request(&world(), &GameplayConfig::default())
        .unwrap();
    assert_eq!(request.role, RoleId::new("striker"));
    assert_eq!(request.requirements.priority, 4);
    assert!(request.requirements.mandatory);
    assert!(request.requirements.capabilities.dribbler);
    assert_eq!(request.requirements.preferred_position, Some(point(1., 0.)));
}

#[test]
fn test_bound_skill_acts() {
    let world = world();
    let mut node = capture_node(false);
    let request = node
        .role_request(&world, &GameplayConfig::default())
        .unwrap();
    let robots = [Candidate {
        id: RobotId(3),
        position: point(0., 0.),
        capabilities: Capabilities::all(),
    }];
    let assignment = assign(
        &[request],
        &robots,
        &StickyBindings::default(),
        &Default::default(),
    );

    let (status, action) = tick(&mut node, &world, &assignment);
    assert_eq!(status, Status::Running);
    assert!(matches!(action, Some(Action::MoveTo { .. })));
    assert_eq!(node.state(), CaptureState::Approach);
    assert_eq!(node.state_name(), "Approach");
}

#[test]
fn test_unbound_skill_waits() {
    let world = world();
    let mut node = capture_node(true);

    // Not requested this tick
    let (status, action) = tick(&mut node, &world, &Assignment::default());
    assert_eq!(status, Status::Running);
    assert_eq!(action, None);

    // Assigned to a robot that vanished from the snapshot
    let request = node
        .role_request(&world, &GameplayConfig::default())
        .unwrap();
    let ghost = [Candidate {
        id: RobotId(9),
        position: point(0., 0.),
        capabilities: Capabilities::all(),
    }];
    let stale = assign(
        &[request],
        &ghost,
        &StickyBindings::default(),
        &Default::default(),
    );
    assert_eq!(stale.robot(&RoleId::new("striker")), Some(RobotId(9)));
    let (status, action) = tick(&mut node, &world, &stale);
    assert_eq!(status, Status::Running);
    assert_eq!(action, None);
}

#[test]
fn test_infeasible_mandatory_fails() {
    let world = world();
    let request = capture_node(true)
        .role_request(&world, &GameplayConfig::default())
        .unwrap();
    let assignment = assign(
        &[request],
        &[],
        &StickyBindings::default(),
        &Default::default(),
    );
    assert_eq!(
        assignment.infeasible().next(),
        Some(&InfeasibleAssignment {
            role: RoleId::new("striker"),
            reason: InfeasibleReason::NoRobots,
        })
    );

    let (status, action) = tick(&mut capture_node(true), &world, &assignment);
    assert_eq!(status, Status::Failed);
    assert_eq!(action, None);
}

#[test]
fn test_reset_restores_initial_state() {
    let world = world()
        .with_robot(RobotObservation::new(4, Team::Blue, Pose::new(0.8, 0., 0.)));
    let mut node = capture_node(false);
    let robots = [Candidate {
        id: RobotId(4),
        position: point(0.8, 0.),
        capabilities: Capabilities::all(),
    }];
    let request = node
        .role_request(&world, &GameplayConfig::default())
        .unwrap();
    let assignment = assign(
        &[request],
        &robots,
        &StickyBindings::default(),
        &Default::default(),
    );
    tick(&mut node, &world, &assignment);
    assert_eq!(node.state(), CaptureState::Capture);

    node.reset();
    assert_eq!(node.state(), CaptureState::Approach);
}
