use std::collections::BTreeSet;

use proptest::prelude::*;

use super::*;
use crate::geometry::point;

fn robot(id: u8, x: f64, y: f64) -> Candidate {
    Candidate {
        id: RobotId(id),
        position: point(x, y),
        capabilities: Capabilities {
            dribbler: true,
            kicker: true,
            chipper: false,
        },
    }
}

fn solve(requests: &[RoleRequest], robots: &[Candidate]) -> Assignment {
    assign(
        requests,
        robots,
        &StickyBindings::default(),
        &AssignmentConfig::default(),
    )
}

#[test]
fn test_empty_inputs() {
    assert!(solve(&[], &[robot(0, 0., 0.)]).is_empty());
    assert!(solve(&[], &[]).is_empty());

    let requests = [
        RoleRequest::new("a", RoleRequirements::default()),
        RoleRequest::new("b", RoleRequirements::default().mandatory()),
    ];
    let assignment = solve(&requests, &[]);
    assert_eq!(
        assignment.outcome(&"a".into()),
        Some(&RoleOutcome::Unfilled)
    );
    assert_eq!(
        assignment.outcome(&"b".into()),
        Some(&RoleOutcome::Infeasible(InfeasibleAssignment {
            role: "b".into(),
            reason: InfeasibleReason::NoRobots,
        }))
    );
}

#[test]
fn test_nearest_robot() {
    let requests = [RoleRequest::new("striker", RoleRequirements::near(point(1., 0.)))];
    let robots = [robot(0, -3., 0.), robot(1, 0.5, 0.), robot(2, 3., 3.)];
    assert_eq!(solve(&requests, &robots).robot(&"striker".into()), Some(RobotId(1)));
}

#[test]
fn test_minimum_total_distance() {
    // Greedy would give robot 0 to "a" and leave "b" with a long trip
    let requests = [
        RoleRequest::new("a", RoleRequirements::near(point(0., 0.))),
        RoleRequest::new("b", RoleRequirements::near(point(-2., 0.))),
    ];
    let robots = [robot(0, -1., 0.), robot(1, 1.5, 0.)];
    let assignment = solve(&requests, &robots);
    assert_eq!(assignment.robot(&"a".into()), Some(RobotId(1)));
    assert_eq!(assignment.robot(&"b".into()), Some(RobotId(0)));
}

#[test]
fn test_capability_is_hard() {
    let mut no_kicker = robot(0, 1., 0.);
    no_kicker.capabilities.kicker = false;
    let requests = [RoleRequest::new(
        "kicker",
        RoleRequirements::near(point(1., 0.))
            .with_capabilities(Capabilities {
                kicker: true,
                ..Capabilities::default()
            })
            .mandatory(),
    )];

    let assignment = solve(&requests, &[no_kicker]);
    assert_eq!(
        assignment.infeasible().next().map(|e| e.reason),
        Some(InfeasibleReason::NoCapableRobot)
    );

    // A far away capable robot still wins over a close incapable one
    let assignment = solve(&requests, &[no_kicker, robot(1, -4., 2.)]);
    assert_eq!(assignment.robot(&"kicker".into()), Some(RobotId(1)));
}

#[test]
fn test_required_robot() {
    let requests = [RoleRequest::new(
        "goalie",
        RoleRequirements::near(point(-4.5, 0.))
            .requiring(RobotId(2))
            .mandatory(),
    )];
    let robots = [robot(0, -4.4, 0.), robot(2, 3., 0.)];
    assert_eq!(solve(&requests, &robots).robot(&"goalie".into()), Some(RobotId(2)));

    let assignment = solve(&requests, &robots[..1]);
    assert_eq!(
        assignment.infeasible().next().map(|e| e.reason),
        Some(InfeasibleReason::NoCapableRobot)
    );
}

#[test]
fn test_priority_wins_scarce_robot() {
    let requests = [
        RoleRequest::new("low", RoleRequirements::near(point(0., 0.))),
        RoleRequest::new(
            "high",
            RoleRequirements::near(point(3., 3.)).with_priority(5),
        ),
    ];
    let assignment = solve(&requests, &[robot(4, 0., 0.)]);
    assert_eq!(assignment.robot(&"high".into()), Some(RobotId(4)));
    assert_eq!(assignment.outcome(&"low".into()), Some(&RoleOutcome::Unfilled));
}

#[test]
fn test_mandatory_outranked() {
    let requests = [
        RoleRequest::new("first", RoleRequirements::default().with_priority(9).mandatory()),
        RoleRequest::new("second", RoleRequirements::default().mandatory()),
    ];
    let assignment = solve(&requests, &[robot(0, 0., 0.)]);
    assert_eq!(assignment.robot(&"first".into()), Some(RobotId(0)));
    assert_eq!(
        assignment.infeasible().map(|e| (e.role.clone(), e.reason)).collect::<Vec<_>>(),
        vec![(RoleId::new("second"), InfeasibleReason::Outranked)]
    );
}

#[test]
fn test_ties_go_to_lowest_id() {
    // No preferred positions: every pairing costs the same
    let requests = [
        RoleRequest::new("b", RoleRequirements::default()),
        RoleRequest::new("a", RoleRequirements::default().with_priority(1)),
    ];
    let robots = [robot(7, 0., 0.), robot(3, 0., 0.), robot(5, 0., 0.)];
    let assignment = solve(&requests, &robots);
    assert_eq!(assignment.robot(&"a".into()), Some(RobotId(3)));
    assert_eq!(assignment.robot(&"b".into()), Some(RobotId(5)));
}

#[test]
fn test_sticky_keeps_previous_robot() {
    let requests = [RoleRequest::new("striker", RoleRequirements::near(point(0., 0.)))];
    let robots = [robot(0, -1., 0.), robot(1, 1.2, 0.)];
    let config = AssignmentConfig::default();

    let first = assign(&requests, &robots, &StickyBindings::default(), &config);
    assert_eq!(first.robot(&"striker".into()), Some(RobotId(0)));
    let sticky = StickyBindings::from_assignment(&first, &requests);

    // Robot 1 is now slightly closer, but not by more than the bonus
    let moved = [robot(0, -1., 0.), robot(1, 0.9, 0.)];
    let second = assign(&requests, &moved, &sticky, &config);
    assert_eq!(second.robot(&"striker".into()), Some(RobotId(0)));

    // Without stickiness the closer robot takes over
    let fresh = assign(&requests, &moved, &StickyBindings::default(), &config);
    assert_eq!(fresh.robot(&"striker".into()), Some(RobotId(1)));

    // A strictly better match beyond the bonus does take over
    let much_closer = [robot(0, -1., 0.), robot(1, 0.1, 0.)];
    let third = assign(&requests, &much_closer, &sticky, &config);
    assert_eq!(third.robot(&"striker".into()), Some(RobotId(1)));
}

#[test]
fn test_far_preferred_position() {
    let requests = [
        RoleRequest::new("a", RoleRequirements::near(point(1e13, 0.))),
        RoleRequest::new("b", RoleRequirements::near(point(0., 0.))),
    ];
    let robots = [robot(0, 5., 0.), robot(1, 0., 0.)];
    let assignment = solve(&requests, &robots);
    // Any robot beats leaving the role empty, however far away the spot is
    assert_eq!(assignment.robot(&"a".into()), Some(RobotId(0)));
    assert_eq!(assignment.robot(&"b".into()), Some(RobotId(1)));

    // A huge bonus keeps the sticky robot without overflowing
    let previous = [RoleRequest::new("b", RoleRequirements::near(point(5., 0.)))];
    let sticky = StickyBindings::from_assignment(&solve(&previous, &robots), &previous);
    let config = AssignmentConfig { sticky_bonus: 1e13 };
    let assignment = assign(&requests, &robots, &sticky, &config);
    assert_eq!(assignment.robot(&"b".into()), Some(RobotId(0)));
    assert_eq!(assignment.robot(&"a".into()), Some(RobotId(1)));
}

#[test]
fn test_not_sticky_is_not_remembered() {
    let requests = [RoleRequest::new(
        "support",
        RoleRequirements::near(point(0., 0.)).not_sticky(),
    )];
    let assignment = solve(&requests, &[robot(0, 0., 0.)]);
    assert!(StickyBindings::from_assignment(&assignment, &requests).is_empty());
}

#[test]
fn test_carried_over() {
    let requests = [
        RoleRequest::new("a", RoleRequirements::default()),
        RoleRequest::new("b", RoleRequirements::default().mandatory()),
    ];
    let robots = [robot(0, 0., 0.), robot(1, 1., 0.)];
    let previous = solve(&requests, &robots);
    let stale = previous.carried_over(&requests, &robots[..1]);
    let lost = if previous.robot(&"a".into()) == Some(RobotId(1)) { "a" } else { "b" };
    assert_eq!(stale.robot(&lost.into()), None);
    assert_eq!(stale.bindings().count(), 1);
}

fn arb_caps() -> impl Strategy<Value = Capabilities> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(dribbler, kicker, chipper)| {
        Capabilities {
            dribbler,
            kicker,
            chipper,
        }
    })
}

fn arb_request() -> impl Strategy<Value = RoleRequirements> {
    (
        arb_caps(),
        proptest::option::of((-4.5f64..4.5, -3f64..3.)),
        0u8..4,
        any::<bool>(),
    )
        .prop_map(|(capabilities, pos, priority, mandatory)| RoleRequirements {
            capabilities,
            preferred_position: pos.map(|(x, y)| point(x, y)),
            priority,
            mandatory,
            sticky: true,
            required_robot: None,
        })
}

fn arb_robot() -> impl Strategy<Value = (f64, f64, Capabilities)> {
    (-4.5f64..4.5, -3f64..3., arb_caps())
}

proptest! {
    #[test]
    fn assignment_is_a_matching(
        reqs in proptest::collection::vec(arb_request(), 0..8),
        bots in proptest::collection::vec(arb_robot(), 0..8),
    ) {
        let requests: Vec<RoleRequest> = reqs
            .into_iter()
            .enumerate()
            .map(|(i, r)| RoleRequest::new(format!("role{}", i), r))
            .collect();
        let robots: Vec<Candidate> = bots
            .into_iter()
            .enumerate()
            .map(|(i, (x, y, capabilities))| Candidate {
                id: RobotId(i as u8),
                position: point(x, y),
                capabilities,
            })
            .collect();

        let assignment = solve(&requests, &robots);
        prop_assert_eq!(assignment.len(), requests.len());

        let mut used = BTreeSet::new();
        for (role, robot) in assignment.bindings() {
            prop_assert!(used.insert(robot), "robot {} assigned twice", robot);
            let req = requests.iter().find(|r| &r.role == role).unwrap();
            let bot = robots.iter().find(|c| c.id == robot).unwrap();
            prop_assert!(req.requirements.capabilities.satisfied_by(&bot.capabilities));
        }

        // Infeasible only ever shows up for mandatory requests
        for error in assignment.infeasible() {
            let req = requests.iter().find(|r| r.role == error.role).unwrap();
            prop_assert!(req.requirements.mandatory);
        }

        // Re-solving with the result as sticky state changes nothing
        let sticky = StickyBindings::from_assignment(&assignment, &requests);
        let again = assign(&requests, &robots, &sticky, &AssignmentConfig::default());
        prop_assert_eq!(
            again.bindings().collect::<Vec<_>>(),
            assignment.bindings().collect::<Vec<_>>()
        );
    }
}
