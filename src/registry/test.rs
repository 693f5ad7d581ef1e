use super::*;
use crate::{config::GameplayConfig, geometry::point, world::WorldState, Team};

fn params(entries: &[(&str, ParamValue)]) -> NodeParams {
    NodeParams::new(entries.iter().map(|(k, v)| (k.to_string(), v.clone())))
}

fn ident(s: &str) -> ParamValue {
    ParamValue::Ident(s.to_owned())
}

#[test]
fn test_take() {
    let mut p = params(&[
        ("times", ParamValue::Number(3.)),
        ("at", ParamValue::Text("1, 2".to_owned())),
        ("chip", ParamValue::Bool(true)),
        ("half", ParamValue::Number(2.5)),
    ]);
    assert_eq!(p.take_integer("times", 10), Ok(Some(3)));
    assert_eq!(p.take_integer("times", 10), Ok(None));
    assert_eq!(p.take_target("at"), Ok(Some(Target::Point(point(1., 2.)))));
    assert_eq!(p.take_bool("chip"), Ok(Some(true)));
    assert_eq!(
        p.take_integer("half", 10),
        Err(ParamError::Invalid {
            key: "half".to_owned(),
            expected: "a non-negative whole number"
        })
    );
    assert!(p.is_empty());
    assert_eq!(p.finish(), Ok(()));
}

#[test]
fn test_role() {
    let mut p = params(&[
        ("role", ident("striker")),
        ("priority", ParamValue::Number(7.)),
        ("sticky", ParamValue::Bool(false)),
    ]);
    let role = p.role().unwrap();
    assert_eq!(role.id, RoleId::new("striker"));
    assert_eq!(role.priority, 7);
    assert!(!role.mandatory);
    assert!(!role.sticky);

    assert_eq!(params(&[]).role(), Err(ParamError::Missing("role")));
    assert!(params(&[("role", ident("a")), ("priority", ParamValue::Number(300.))])
        .role()
        .is_err());
}

#[test]
fn test_build() {
    let registry = Registry::default();
    let world = WorldState::new(0., Team::Blue);
    let config = GameplayConfig::default();

    let node = registry
        .build(
            "HoldPosition",
            params(&[("role", ident("wall")), ("at", ident("center"))]),
        )
        .unwrap()
        .unwrap();
    let request = node.role_request(&world, &config).unwrap();
    assert_eq!(request.role, RoleId::new("wall"));
    assert_eq!(request.requirements.preferred_position, Some(point(0., 0.)));

    assert!(registry.build("Sequence", NodeParams::default()).unwrap().is_ok());
    assert!(registry.build("Dance", NodeParams::default()).is_none());
    assert!(registry
        .build("Idle", NodeParams::default())
        .unwrap()
        .unwrap()
        .role_request(&world, &config)
        .is_none());
}

#[test]
fn test_build_rejects_bad_params() {
    let registry = Registry::default();
    let err = |ty: &str, entries: &[(&str, ParamValue)]| {
        registry.build(ty, params(entries)).unwrap().err()
    };

    assert_eq!(err("Timed", &[]), Some(ParamError::Missing("seconds")));
    assert_eq!(
        err("Sequence", &[("speed", ParamValue::Number(1.))]),
        Some(ParamError::Unknown("speed".to_owned()))
    );
    assert_eq!(err("Capture", &[]), Some(ParamError::Missing("role")));
    assert!(matches!(
        err("Move", &[("role", ident("a")), ("to", ident("somewhere"))]),
        Some(ParamError::Invalid { .. })
    ));
    assert!(matches!(
        err(
            "PivotKick",
            &[("role", ident("a")), ("strength", ParamValue::Number(2.))]
        ),
        Some(ParamError::Invalid { .. })
    ));
    assert_eq!(
        err(
            "Move",
            &[
                ("role", ident("a")),
                ("to", ident("ball")),
                ("fallback", ident("hold"))
            ]
        ),
        None
    );
    assert!(matches!(
        err("Defender", &[("role", ident("a")), ("side", ident("up"))]),
        Some(ParamError::Invalid { .. })
    ));
    assert!(matches!(
        err("Mark", &[("role", ident("a")), ("distance", ParamValue::Number(0.))]),
        Some(ParamError::Invalid { .. })
    ));
    assert!(matches!(
        err("Mark", &[("role", ident("a")), ("rank", ParamValue::Number(16.))]),
        Some(ParamError::Invalid { .. })
    ));
    assert_eq!(
        err(
            "Defender",
            &[
                ("role", ident("a")),
                ("side", ident("left")),
                ("radius", ParamValue::Number(1.5))
            ]
        ),
        None
    );
}

#[test]
fn test_register_custom() {
    struct Wait;
    impl BehaviorNode for Wait {
        fn tick(
            &mut self,
            _children: &mut [crate::BehaviorNodeContainer],
            _ctx: &mut crate::Context,
        ) -> crate::Status {
            crate::Status::Running
        }
    }

    let mut registry = Registry::default();
    assert!(!registry.contains("Wait"));
    registry.register("Wait", boxify(|_| Ok(Wait)));
    assert!(registry.contains("Wait"));
    assert!(registry.build("Wait", NodeParams::default()).unwrap().is_ok());
}
