use crate::{
    command::PlanFallback,
    error::ParamError,
    fsm::{RoleSpec, Skill, SkillNode},
    nodes::{ParallelNode, RepeatNode, SelectorNode, SequenceNode, TimedNode},
    role_assignment::RoleId,
    skills::{
        Capture, Defender, Goalie, HoldPosition, Idle, Mark, Move, PivotKick, Target,
        ARRIVE_TOLERANCE,
    },
    BehaviorNode,
};
use std::collections::HashMap;

/// Builds a node from the parameters written next to its type name in a play script.
pub type Constructor = Box<dyn Fn(&mut NodeParams) -> Result<Box<dyn BehaviorNode>, ParamError>>;

pub fn boxify<T>(
    cons: impl (Fn(&mut NodeParams) -> Result<T, ParamError>) + 'static,
) -> Constructor
where
    T: BehaviorNode + 'static,
{
    Box::new(
        move |params: &mut NodeParams| -> Result<Box<dyn BehaviorNode>, ParamError> {
            Ok(Box::new(cons(params)?))
        },
    )
}

/// Like [`boxify`] for skills: the role parameters (`role`, `priority`, `mandatory`,
/// `sticky`) are taken first, the rest is left to `cons`.
fn skill<S: Skill>(
    cons: impl (Fn(&mut NodeParams) -> Result<S, ParamError>) + 'static,
) -> Constructor {
    Box::new(move |params: &mut NodeParams| -> Result<Box<dyn BehaviorNode>, ParamError> {
        let role = params.role()?;
        Ok(Box::new(SkillNode::new(cons(params)?, role)))
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    /// A quoted string
    Text(String),
    /// A bare word
    Ident(String),
    Bool(bool),
}

/// Parameters of one node. Constructors take what they understand; whatever is left
/// over is an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeParams {
    entries: Vec<(String, ParamValue)>,
}

impl NodeParams {
    pub fn new(entries: impl IntoIterator<Item = (String, ParamValue)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn take(&mut self, key: &str) -> Option<ParamValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn take_number(&mut self, key: &'static str) -> Result<Option<f64>, ParamError> {
        match self.take(key) {
            None => Ok(None),
            Some(ParamValue::Number(value)) if value.is_finite() => Ok(Some(value)),
            Some(_) => Err(invalid(key, "a number")),
        }
    }

    /// A whole number in `0..=max`.
    pub fn take_integer(&mut self, key: &'static str, max: u32) -> Result<Option<u32>, ParamError> {
        let expected = "a non-negative whole number";
        match self.take_number(key).map_err(|_| invalid(key, expected))? {
            None => Ok(None),
            Some(value) if value >= 0. && value <= max as f64 && value.fract() == 0. => {
                Ok(Some(value as u32))
            }
            Some(_) => Err(invalid(key, expected)),
        }
    }

    pub fn take_bool(&mut self, key: &'static str) -> Result<Option<bool>, ParamError> {
        match self.take(key) {
            None => Ok(None),
            Some(ParamValue::Bool(value)) => Ok(Some(value)),
            Some(_) => Err(invalid(key, "true or false")),
        }
    }

    /// A bare word or a quoted string.
    pub fn take_word(&mut self, key: &'static str) -> Result<Option<String>, ParamError> {
        match self.take(key) {
            None => Ok(None),
            Some(ParamValue::Ident(s) | ParamValue::Text(s)) => Ok(Some(s)),
            Some(_) => Err(invalid(key, "a name")),
        }
    }

    pub fn take_target(&mut self, key: &'static str) -> Result<Option<Target>, ParamError> {
        let expected = "a target like ball, their_goal or \"x, y\"";
        match self.take_word(key).map_err(|_| invalid(key, expected))? {
            None => Ok(None),
            Some(s) => s.parse().map(Some).map_err(|_| invalid(key, expected)),
        }
    }

    pub fn take_fallback(&mut self, key: &'static str) -> Result<Option<PlanFallback>, ParamError> {
        let fallback = match self.take_word(key)?.as_deref() {
            None => return Ok(None),
            Some("straight_line") => PlanFallback::StraightLine,
            Some("relaxed") => PlanFallback::Relaxed,
            Some("hold") => PlanFallback::Hold,
            Some(_) => return Err(invalid(key, "straight_line, relaxed or hold")),
        };
        Ok(Some(fallback))
    }

    pub fn role(&mut self) -> Result<RoleSpec, ParamError> {
        let id = self.take_word("role")?.ok_or(ParamError::Missing("role"))?;
        let mut spec = RoleSpec::new(RoleId::new(id));
        if let Some(priority) = self.take_integer("priority", u8::MAX as u32)? {
            spec.priority = priority as u8;
        }
        if let Some(mandatory) = self.take_bool("mandatory")? {
            spec.mandatory = mandatory;
        }
        if let Some(sticky) = self.take_bool("sticky")? {
            spec.sticky = sticky;
        }
        Ok(spec)
    }

    /// Fails on the first parameter nobody took.
    pub fn finish(self) -> Result<(), ParamError> {
        match self.entries.into_iter().next() {
            Some((key, _)) => Err(ParamError::Unknown(key)),
            None => Ok(()),
        }
    }
}

fn invalid(key: &str, expected: &'static str) -> ParamError {
    ParamError::Invalid {
        key: key.to_owned(),
        expected,
    }
}

pub struct Registry {
    node_types: HashMap<String, Constructor>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut ret = Self {
            node_types: HashMap::new(),
        };
        ret.register("Sequence", boxify(|_| Ok(SequenceNode::default())));
        ret.register("Selector", boxify(|_| Ok(SelectorNode::default())));
        ret.register("Parallel", boxify(|_| Ok(ParallelNode)));
        ret.register(
            "Repeat",
            boxify(|params| Ok(RepeatNode::new(params.take_integer("times", u32::MAX)?))),
        );
        ret.register(
            "Timed",
            boxify(|params| {
                let seconds = params
                    .take_number("seconds")?
                    .ok_or(ParamError::Missing("seconds"))?;
                if seconds < 0. {
                    return Err(invalid("seconds", "a non-negative number"));
                }
                Ok(TimedNode::new(seconds))
            }),
        );
        ret.register("Idle", boxify(|_| Ok(Idle)));

        ret.register(
            "HoldPosition",
            skill(|params| {
                Ok(HoldPosition {
                    at: params.take_target("at")?.ok_or(ParamError::Missing("at"))?,
                    face: params.take_target("face")?,
                })
            }),
        );
        ret.register(
            "Move",
            skill(|params| {
                let to = params.take_target("to")?.ok_or(ParamError::Missing("to"))?;
                let mut skill = Move::new(to);
                skill.face = params.take_target("face")?;
                skill.tolerance = params.take_number("tolerance")?.unwrap_or(ARRIVE_TOLERANCE);
                if skill.tolerance <= 0. {
                    return Err(invalid("tolerance", "a positive number"));
                }
                if let Some(max_failures) = params.take_integer("max_failures", u32::MAX)? {
                    skill.max_failures = max_failures;
                }
                if let Some(fallback) = params.take_fallback("fallback")? {
                    skill.fallback = fallback;
                }
                Ok(skill)
            }),
        );
        ret.register("Capture", skill(|_| Ok(Capture)));
        ret.register(
            "PivotKick",
            skill(|params| {
                let mut skill = PivotKick::default();
                if let Some(target) = params.take_target("target")? {
                    skill.target = target;
                }
                if let Some(chip) = params.take_bool("chip")? {
                    skill.chip = chip;
                }
                if let Some(strength) = params.take_number("strength")? {
                    if !(0. ..=1.).contains(&strength) {
                        return Err(invalid("strength", "a number between 0 and 1"));
                    }
                    skill.strength = strength;
                }
                Ok(skill)
            }),
        );
        ret.register("Goalie", skill(|_| Ok(Goalie)));
        ret.register(
            "Mark",
            skill(|params| {
                let mut skill = Mark::default();
                if let Some(rank) = params.take_integer("rank", 15)? {
                    skill.rank = rank as usize;
                }
                if let Some(distance) = params.take_number("distance")? {
                    if distance <= 0. {
                        return Err(invalid("distance", "a positive number"));
                    }
                    skill.distance = distance;
                }
                Ok(skill)
            }),
        );
        ret.register(
            "Defender",
            skill(|params| {
                let mut skill = Defender::default();
                if let Some(side) = params.take_word("side")? {
                    skill.side = side
                        .parse()
                        .map_err(|_| invalid("side", "left, center or right"))?;
                }
                if let Some(radius) = params.take_number("radius")? {
                    if radius <= 0. {
                        return Err(invalid("radius", "a positive number"));
                    }
                    skill.radius = radius;
                }
                Ok(skill)
            }),
        );
        ret
    }
}

impl Registry {
    pub fn register(&mut self, type_name: impl ToString, constructor: Constructor) {
        self.node_types.insert(type_name.to_string(), constructor);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.node_types.contains_key(type_name)
    }

    /// `None` if no such node type was registered.
    pub fn build(
        &self,
        type_name: &str,
        mut params: NodeParams,
    ) -> Option<Result<Box<dyn BehaviorNode>, ParamError>> {
        let constructor = self.node_types.get(type_name)?;
        Some(constructor(&mut params).and_then(|node| {
            params.finish()?;
            Ok(node)
        }))
    }
}

#[cfg(test)]
mod test;
