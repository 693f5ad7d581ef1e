use crate::{
    fsm::{FsmState, StateMachine},
    BehaviorNode, BehaviorNodeContainer, Context, NodeKind, NumChildren, Status,
};

/// Ticks children in order. A non-required child that fails is skipped.
#[derive(Default)]
pub struct SequenceNode {
    current_child: usize,
}

impl BehaviorNode for SequenceNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn max_children(&self) -> NumChildren {
        NumChildren::Infinite
    }

    fn tick(&mut self, children: &mut [BehaviorNodeContainer], ctx: &mut Context) -> Status {
        while let Some(child) = children.get_mut(self.current_child) {
            match child.tick(ctx) {
                Status::Running => return Status::Running,
                Status::Failed if child.is_required() => return Status::Failed,
                _ => self.current_child += 1,
            }
        }
        Status::Success
    }

    fn active_children(&self, children: &[BehaviorNodeContainer]) -> Vec<usize> {
        if self.current_child < children.len() {
            vec![self.current_child]
        } else {
            vec![]
        }
    }

    fn reset(&mut self) {
        self.current_child = 0;
    }
}

/// First-runnable selector: the first child that does not fail decides the result.
#[derive(Default)]
pub struct SelectorNode {
    current_child: usize,
}

impl BehaviorNode for SelectorNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn max_children(&self) -> NumChildren {
        NumChildren::Infinite
    }

    fn tick(&mut self, children: &mut [BehaviorNodeContainer], ctx: &mut Context) -> Status {
        while let Some(child) = children.get_mut(self.current_child) {
            match child.tick(ctx) {
                Status::Failed => self.current_child += 1,
                status => return status,
            }
        }
        Status::Failed
    }

    fn active_children(&self, children: &[BehaviorNodeContainer]) -> Vec<usize> {
        if self.current_child < children.len() {
            vec![self.current_child]
        } else {
            vec![]
        }
    }

    fn reset(&mut self) {
        self.current_child = 0;
    }
}

/// Ticks all unfinished children every tick.
///
/// Fails as soon as a required child failed and succeeds once all required children
/// succeeded. Without required children it succeeds when every child is finished.
#[derive(Default)]
pub struct ParallelNode;

impl BehaviorNode for ParallelNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn max_children(&self) -> NumChildren {
        NumChildren::Infinite
    }

    fn tick(&mut self, children: &mut [BehaviorNodeContainer], ctx: &mut Context) -> Status {
        let mut failed = false;
        let mut any_required = false;
        let mut required_running = false;
        let mut all_done = true;
        for child in children.iter_mut() {
            let status = child.tick(ctx);
            if child.is_required() {
                any_required = true;
                match status {
                    Status::Failed => failed = true,
                    Status::Running => required_running = true,
                    Status::Success => (),
                }
            }
            if status == Status::Running {
                all_done = false;
            }
        }

        if failed {
            Status::Failed
        } else if (any_required && !required_running) || (!any_required && all_done) {
            Status::Success
        } else {
            Status::Running
        }
    }

    fn active_children(&self, children: &[BehaviorNodeContainer]) -> Vec<usize> {
        children
            .iter()
            .enumerate()
            .filter(|(_, child)| !child.is_done())
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Runs its child again after every success, `times` times or forever.
#[derive(Default)]
pub struct RepeatNode {
    times: Option<u32>,
    count: u32,
}

impl RepeatNode {
    pub fn new(times: Option<u32>) -> Self {
        Self { times, count: 0 }
    }
}

impl BehaviorNode for RepeatNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn max_children(&self) -> NumChildren {
        NumChildren::Finite(1)
    }

    fn tick(&mut self, children: &mut [BehaviorNodeContainer], ctx: &mut Context) -> Status {
        if self.times.map_or(false, |times| self.count >= times) {
            return Status::Success;
        }
        let Some(child) = children.first_mut() else {
            return Status::Success;
        };
        match child.tick(ctx) {
            Status::Success => {
                self.count += 1;
                if self.times.map_or(false, |times| self.count >= times) {
                    return Status::Success;
                }
                // The next round starts in the next tick
                child.reset();
                Status::Running
            }
            status => status,
        }
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedState {
    Waiting,
    Running,
    Done,
    TimedOut,
}

impl FsmState for TimedState {
    const ALL: &'static [Self] = &[
        TimedState::Waiting,
        TimedState::Running,
        TimedState::Done,
        TimedState::TimedOut,
    ];

    fn name(self) -> &'static str {
        match self {
            TimedState::Waiting => "Waiting",
            TimedState::Running => "Running",
            TimedState::Done => "Done",
            TimedState::TimedOut => "TimedOut",
        }
    }
}

/// Fails its child once it ran longer than `seconds` of world time.
///
/// Without a child it simply waits for `seconds` and then succeeds.
pub struct TimedNode {
    seconds: f64,
    machine: StateMachine<TimedState>,
    result: Status,
}

impl TimedNode {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds,
            machine: StateMachine::new(TimedState::Waiting),
            result: Status::Running,
        }
    }

    pub fn state(&self) -> TimedState {
        self.machine.state()
    }
}

impl BehaviorNode for TimedNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Timed
    }

    fn max_children(&self) -> NumChildren {
        NumChildren::Finite(1)
    }

    fn tick(&mut self, children: &mut [BehaviorNodeContainer], ctx: &mut Context) -> Status {
        let now = ctx.world().timestamp;
        match self.machine.state() {
            TimedState::Done => return self.result,
            TimedState::TimedOut => return Status::Failed,
            TimedState::Waiting => {
                self.machine.set(TimedState::Running, now);
            }
            TimedState::Running => (),
        }

        let elapsed = self.machine.time_in_state(now) >= self.seconds;
        let Some(child) = children.first_mut() else {
            if elapsed {
                self.machine.set(TimedState::Done, now);
                self.result = Status::Success;
            }
            return self.result;
        };

        if elapsed {
            log::debug!("timed out after {}s", self.seconds);
            self.machine.set(TimedState::TimedOut, now);
            return Status::Failed;
        }
        match child.tick(ctx) {
            Status::Running => Status::Running,
            status => {
                self.machine.set(TimedState::Done, now);
                self.result = status;
                status
            }
        }
    }

    fn active_children(&self, children: &[BehaviorNodeContainer]) -> Vec<usize> {
        match self.machine.state() {
            TimedState::Waiting | TimedState::Running if !children.is_empty() => vec![0],
            _ => vec![],
        }
    }

    fn reset(&mut self) {
        self.machine.reset();
        self.result = Status::Running;
    }

    fn state_name(&self) -> &'static str {
        self.machine.state().name()
    }
}

#[cfg(test)]
mod test;
