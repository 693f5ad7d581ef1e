use crate::{
    config::GameplayConfig,
    diagnostics::DiagnosticEvent,
    error::{AddChildError, AddChildResult},
    role_assignment::RoleRequest,
    world::WorldState,
    BehaviorNode, Context, NodeKind, NumChildren, Status,
};

/// A node of a behavior tree together with its children and bookkeeping.
///
/// Once the node returns Success or Failed the result is remembered and returned
/// without ticking the node again, until [`BehaviorNodeContainer::reset`] is called.
pub struct BehaviorNodeContainer {
    /// Name of the type of the node
    pub(crate) name: String,
    pub(crate) node: Box<dyn BehaviorNode>,
    pub(crate) children: Vec<BehaviorNodeContainer>,
    /// A parent sequence or parallel fails when a required child fails.
    pub(crate) required: bool,
    pub(crate) last_result: Option<Status>,
    last_reported: Option<(&'static str, Status)>,
}

impl BehaviorNodeContainer {
    pub fn new(node: Box<dyn BehaviorNode>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node,
            children: vec![],
            required: true,
            last_result: None,
            last_reported: None,
        }
    }

    /// Wrap a node, named after its type.
    pub fn new_node<T: BehaviorNode + 'static>(node: T) -> Self {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        let name = base.rsplit("::").next().unwrap_or(base);
        Self::new(Box::new(node), name)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_child(mut self, child: BehaviorNodeContainer) -> Result<Self, AddChildError> {
        self.add_child(child)?;
        Ok(self)
    }

    pub fn tick(&mut self, ctx: &mut Context) -> Status {
        if let Some(result) = self.last_result.filter(|s| s.is_done()) {
            return result;
        }
        let status = self.node.tick(&mut self.children, ctx);
        self.last_result = Some(status);

        let report = (self.node.state_name(), status);
        if self.last_reported != Some(report) {
            self.last_reported = Some(report);
            ctx.emit(DiagnosticEvent::NodeState {
                node: self.name.clone(),
                kind: self.node.kind(),
                state: report.0,
                status,
            });
        }
        status
    }

    pub fn reset(&mut self) {
        self.node.reset();
        for child in &mut self.children {
            child.reset();
        }
        self.last_result = None;
        self.last_reported = None;
    }

    /// Role requests of the part of the tree that will run this tick, depth-first in
    /// declaration order. A role requested twice keeps its first request.
    pub fn requirements(
        &self,
        world: &WorldState,
        config: &GameplayConfig,
    ) -> (Vec<RoleRequest>, Vec<DiagnosticEvent>) {
        let mut requests = vec![];
        let mut events = vec![];
        self.collect_requirements(world, config, &mut requests, &mut events);
        (requests, events)
    }

    fn collect_requirements(
        &self,
        world: &WorldState,
        config: &GameplayConfig,
        requests: &mut Vec<RoleRequest>,
        events: &mut Vec<DiagnosticEvent>,
    ) {
        if self.is_done() {
            return;
        }
        if let Some(request) = self.node.role_request(world, config) {
            if requests.iter().any(|r| r.role == request.role) {
                events.push(DiagnosticEvent::DuplicateRole {
                    role: request.role,
                    node: self.name.clone(),
                });
            } else {
                requests.push(request);
            }
        }
        for idx in self.node.active_children(&self.children) {
            if let Some(child) = self.children.get(idx) {
                child.collect_requirements(world, config, requests, events);
            }
        }
    }

    pub fn add_child(&mut self, child: BehaviorNodeContainer) -> AddChildResult {
        if NumChildren::Finite(self.children.len()) < self.node.max_children() {
            self.children.push(child);
            Ok(())
        } else {
            Err(AddChildError::TooManyNodes)
        }
    }

    pub fn children(&self) -> &[BehaviorNodeContainer] {
        &self.children
    }

    pub fn last_result(&self) -> Option<Status> {
        self.last_result
    }

    pub fn is_done(&self) -> bool {
        self.last_result.map_or(false, Status::is_done)
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    pub fn state_name(&self) -> &'static str {
        self.node.state_name()
    }
}
