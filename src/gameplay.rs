use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    command::{Action, PlanFallback, RobotCommand},
    config::GameplayConfig,
    diagnostics::DiagnosticEvent,
    error::{ConfigError, PlanningFailure},
    geometry::{Pose, Shape, ShapeSet},
    planning::{Budget, Path, PathCache, PlanFeedback, PlanRequest, RrtPlanner},
    playbook::Playbook,
    role_assignment::{assign, Assignment, Candidate, RoleRequest, StickyBindings},
    world::{RobotId, RobotObservation, WorldState},
    Context, NodeKind, Status,
};

/// Everything one tick decided.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// Name of the play that ran, `None` if no play matched the game state.
    pub play: Option<String>,
    pub status: Option<Status>,
    /// One command for every robot of ours in the snapshot.
    pub commands: BTreeMap<RobotId, RobotCommand>,
    pub events: Vec<DiagnosticEvent>,
}

/// The per-tick pipeline: play selection, role assignment, behavior tree and planning.
///
/// State carried from one tick to the next (current play, sticky bindings, the last
/// assignment, cached paths and planning feedback) is replaced at the end of
/// [`GameplayModule::tick`] only.
pub struct GameplayModule {
    config: GameplayConfig,
    playbook: Playbook,
    planner: RrtPlanner,
    rng: ChaCha8Rng,
    cancel: Arc<AtomicBool>,
    current: Option<usize>,
    last_status: Option<Status>,
    sticky: StickyBindings,
    assignment: Assignment,
    cache: PathCache,
    feedback: PlanFeedback,
}

impl GameplayModule {
    pub fn new(config: GameplayConfig, playbook: Playbook) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            planner: RrtPlanner::new(config.planner, &config.field)?,
            config,
            playbook,
            rng,
            cancel: Arc::new(AtomicBool::new(false)),
            current: None,
            last_status: None,
            sticky: StickyBindings::default(),
            assignment: Assignment::default(),
            cache: PathCache::new(),
            feedback: PlanFeedback::default(),
        })
    }

    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    pub fn playbook(&self) -> &Playbook {
        &self.playbook
    }

    /// Name of the play that ran in the last tick.
    pub fn current_play(&self) -> Option<&str> {
        self.current
            .and_then(|idx| self.playbook.plays().get(idx))
            .map(|play| play.name())
    }

    /// The assignment made in the last tick.
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Set this from another thread when a newer world state arrived; planning still in
    /// progress gives up. It is cleared at the start of every tick.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn tick(&mut self, world: &WorldState) -> TickOutput {
        let deadline = Instant::now() + self.config.tick_deadline();
        self.cancel.store(false, Ordering::Relaxed);
        let mut events = vec![];

        let (world, issues) = world.sanitized();
        for issue in issues {
            emit(&mut events, DiagnosticEvent::MalformedState(issue));
        }

        let selected = self.select_play(&world, &mut events);

        let candidates = self.candidates(&world);
        let mut requests = vec![];
        let mut assignment = Assignment::default();
        let mut status = None;
        let mut actions = BTreeMap::new();
        if let Some(idx) = selected.filter(|&idx| self.playbook.get_mut(idx).is_some()) {
            let play = self.playbook.get_mut(idx).expect("checked above");
            let (reqs, duplicates) = play.root.requirements(&world, &self.config);
            for event in duplicates {
                emit(&mut events, event);
            }
            requests = reqs;

            assignment = self.assign_roles(&requests, &candidates, deadline, &mut events);
            for (role, robot) in assignment.bindings() {
                if self.assignment.robot(role) != Some(robot) {
                    emit(
                        &mut events,
                        DiagnosticEvent::RoleAssigned {
                            role: role.clone(),
                            robot,
                        },
                    );
                }
            }
            for infeasible in assignment.infeasible() {
                emit(
                    &mut events,
                    DiagnosticEvent::InfeasibleAssignment(infeasible.clone()),
                );
            }

            let play = self.playbook.get_mut(idx).expect("checked above");
            let mut ctx = Context::new(&world, &self.config, &assignment, &self.feedback);
            let result = play.root.tick(&mut ctx);
            if self.last_status != Some(result) {
                ctx.emit(DiagnosticEvent::NodeState {
                    node: play.name().to_owned(),
                    kind: NodeKind::Play,
                    state: "",
                    status: result,
                });
            }
            let (acted, tree_events) = ctx.into_parts();
            events.extend(tree_events);
            actions = acted;
            status = Some(result);
        }

        let mut cache = std::mem::take(&mut self.cache);
        let mut feedback = self.feedback.clone();
        let mut commands = BTreeMap::new();
        for (id, action) in actions {
            let Some(robot) = world.robot(id) else {
                continue;
            };
            let command = match action {
                Action::MoveTo {
                    target,
                    dribble,
                    avoid_ball,
                    fallback,
                } => {
                    let path = self.plan_move(
                        &world,
                        robot,
                        MoveGoal {
                            target,
                            avoid_ball,
                            fallback,
                        },
                        deadline,
                        &mut cache,
                        &mut feedback,
                        &mut events,
                    );
                    match path {
                        Some(path) => RobotCommand::FollowPath { path, dribble },
                        None => RobotCommand::Hold {
                            pose: robot.pose,
                            dribble,
                        },
                    }
                }
                Action::Kick { chip, strength } => RobotCommand::Kick { chip, strength },
                Action::Hold { dribble } => RobotCommand::Hold {
                    pose: robot.pose,
                    dribble,
                },
            };
            commands.insert(id, command);
        }

        for robot in world.our_robots() {
            if !matches!(commands.get(&robot.id), Some(RobotCommand::FollowPath { .. })) {
                cache.remove(robot.id);
            }
            commands.entry(robot.id).or_insert(RobotCommand::Hold {
                pose: robot.pose,
                dribble: false,
            });
        }

        // Commit
        self.sticky = StickyBindings::from_assignment(&assignment, &requests);
        self.assignment = assignment;
        self.cache = cache;
        self.feedback = feedback;
        self.current = selected;
        self.last_status = status;

        TickOutput {
            play: self.current_play().map(str::to_owned),
            status,
            commands,
            events,
        }
    }

    /// Pick the play for this tick, resetting plays that finished or are left.
    fn select_play(
        &mut self,
        world: &WorldState,
        events: &mut Vec<DiagnosticEvent>,
    ) -> Option<usize> {
        let previous = self.current;
        let running = previous.filter(|&idx| {
            self.playbook
                .plays()
                .get(idx)
                .map_or(false, |play| !play.root.is_done())
        });

        let selected = self.playbook.select(&world.game, running);
        if selected == running {
            return selected;
        }

        let previous_name = previous
            .and_then(|idx| self.playbook.plays().get(idx))
            .map(|play| play.name().to_owned());
        if let Some(play) = previous.and_then(|idx| self.playbook.get_mut(idx)) {
            play.root.reset();
        }
        self.last_status = None;
        if let Some(play) = selected.and_then(|idx| self.playbook.plays().get(idx)) {
            emit(
                events,
                DiagnosticEvent::PlaySelected {
                    play: play.name().to_owned(),
                    previous: previous_name,
                },
            );
        }
        selected
    }

    /// Solve the assignment, or keep last tick's bindings if the deadline already passed.
    fn assign_roles(
        &self,
        requests: &[RoleRequest],
        candidates: &[Candidate],
        deadline: Instant,
        events: &mut Vec<DiagnosticEvent>,
    ) -> Assignment {
        if Instant::now() < deadline {
            return assign(requests, candidates, &self.sticky, &self.config.assignment);
        }
        emit(events, DiagnosticEvent::DeadlineExceeded { stage: "assignment" });
        self.assignment.carried_over(requests, candidates)
    }

    /// Robots that may take roles: ours, seen by the cameras and enabled.
    fn candidates(&self, world: &WorldState) -> Vec<Candidate> {
        world
            .our_robots()
            .filter(|robot| robot.visible)
            .filter_map(|robot| {
                let settings = self.config.robot(robot.id);
                settings.enabled.then(|| Candidate {
                    id: robot.id,
                    position: robot.position(),
                    capabilities: settings.capabilities(),
                })
            })
            .collect()
    }

    /// Everything `robot` must not touch, grown by `margin` plus the obstacle's own size.
    fn obstacles(
        &self,
        world: &WorldState,
        robot: RobotId,
        avoid_ball: bool,
        margin: f64,
    ) -> ShapeSet {
        let mut obstacles = ShapeSet::new();
        for other in &world.robots {
            if other.team == world.our_team && other.id == robot {
                continue;
            }
            obstacles.push(Shape::circle(
                other.position(),
                self.config.robot_radius + margin,
            ));
        }
        if avoid_ball {
            if let Some(ball) = world.ball_position() {
                obstacles.push(Shape::circle(ball, self.config.ball_radius + margin));
            }
        }
        for shape in self.config.static_obstacles().iter() {
            obstacles.push(shape.inflate(margin));
        }
        obstacles
    }

    /// A path for a move action, or `None` if the robot should hold.
    #[allow(clippy::too_many_arguments)]
    fn plan_move(
        &mut self,
        world: &WorldState,
        robot: &RobotObservation,
        request: MoveGoal,
        deadline: Instant,
        cache: &mut PathCache,
        feedback: &mut PlanFeedback,
        events: &mut Vec<DiagnosticEvent>,
    ) -> Option<Path> {
        let planner = *self.planner.config();
        let position = robot.position();
        let margin = self.config.robot_radius + planner.clearance;
        let obstacles = self.obstacles(world, robot.id, request.avoid_ball, margin);
        // Targets off the field (a ball far outside, say) are driven towards up to the edge
        let target = Pose::at(
            self.config.field.clamp(&request.target.position),
            request.target.heading,
        );
        if target.position != request.target.position {
            log::debug!(
                "Target of robot {} clamped from {:?} to {:?}",
                robot.id,
                request.target.position,
                target.position
            );
        }

        let cached = cache.lookup(robot.id, &position, &target, &obstacles, &planner);
        if let Some(path) = cached {
            emit(events, DiagnosticEvent::PathReused { robot: robot.id });
            return Some(path);
        }

        let constraints = self.config.constraints_for(robot.id);
        let mut plan_request = PlanRequest {
            start: position,
            start_speed: robot.velocity.norm().min(constraints.max_speed),
            goal: target,
            obstacles,
            constraints,
        };
        let cancel = self.cancel.clone();
        let budget = Budget::iterations(planner.max_iterations)
            .with_deadline(deadline)
            .with_cancel(&cancel);

        let reason = match self.planner.plan(&plan_request, &mut self.rng, &budget) {
            Ok(path) => {
                emit(
                    events,
                    DiagnosticEvent::PlanningSucceeded {
                        robot: robot.id,
                        waypoints: path.waypoints().len(),
                    },
                );
                feedback.record_success(robot.id);
                cache.store(robot.id, target, plan_request.obstacles, path.clone());
                return Some(path);
            }
            Err(reason) => reason,
        };

        // Running out of time says nothing about the behavior's target
        if !matches!(
            reason,
            PlanningFailure::DeadlineExceeded | PlanningFailure::Cancelled
        ) {
            feedback.record_failure(robot.id, reason);
        }
        emit(
            events,
            DiagnosticEvent::PlanningFailed {
                robot: robot.id,
                reason,
                fallback: request.fallback,
            },
        );

        if let Some(path) = cache.stale(robot.id, &position, planner.step_size) {
            emit(events, DiagnosticEvent::PathReused { robot: robot.id });
            return Some(path);
        }

        match request.fallback {
            PlanFallback::StraightLine => (reason != PlanningFailure::InvalidRequest).then(|| {
                Path::interpolate(
                    &[position, target.position],
                    plan_request.start_speed,
                    Some(target.heading),
                    &constraints,
                    planner.waypoint_spacing,
                )
            }),
            PlanFallback::Relaxed => {
                if matches!(
                    reason,
                    PlanningFailure::DeadlineExceeded
                        | PlanningFailure::Cancelled
                        | PlanningFailure::InvalidRequest
                ) {
                    return None;
                }
                plan_request.obstacles =
                    self.obstacles(world, robot.id, request.avoid_ball, self.config.robot_radius);
                self.planner
                    .plan(&plan_request, &mut self.rng, &budget)
                    .map_err(|reason| {
                        log::warn!("Relaxed planning failed for robot {}: {}", robot.id, reason)
                    })
                    .ok()
            }
            PlanFallback::Hold => None,
        }
    }
}

/// The move part of [`Action::MoveTo`].
#[derive(Debug, Clone, Copy)]
struct MoveGoal {
    target: Pose,
    avoid_ball: bool,
    fallback: PlanFallback,
}

fn emit(events: &mut Vec<DiagnosticEvent>, event: DiagnosticEvent) {
    event.log();
    events.push(event);
}
