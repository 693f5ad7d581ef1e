use std::collections::HashSet;

use crate::{
    error::LoadError,
    parser::{self, GuardDef, GuardOp},
    world::{GameState, Possession, Restart, Stage},
    BehaviorNodeContainer, Registry,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    Stage(Vec<Stage>, bool),
    Restart(Vec<Restart>, bool),
    Possession(Vec<Possession>, bool),
}

impl Clause {
    fn matches(&self, game: &GameState) -> bool {
        match self {
            Clause::Stage(any_of, negated) => any_of.contains(&game.stage) != *negated,
            Clause::Restart(any_of, negated) => any_of.contains(&game.restart) != *negated,
            Clause::Possession(any_of, negated) => {
                any_of.contains(&game.possession) != *negated
            }
        }
    }
}

/// Condition on the referee state under which a play may run. All clauses must hold;
/// an empty guard always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayGuard {
    clauses: Vec<Clause>,
}

impl PlayGuard {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn stage_in(mut self, stages: &[Stage]) -> Self {
        self.clauses.push(Clause::Stage(stages.to_vec(), false));
        self
    }

    pub fn restart_in(mut self, restarts: &[Restart]) -> Self {
        self.clauses.push(Clause::Restart(restarts.to_vec(), false));
        self
    }

    pub fn possession_in(mut self, possessions: &[Possession]) -> Self {
        self.clauses
            .push(Clause::Possession(possessions.to_vec(), false));
        self
    }

    pub(crate) fn from_defs(defs: &[GuardDef]) -> Result<Self, LoadError> {
        let clauses = defs
            .iter()
            .map(|def| -> Result<Clause, LoadError> {
                let (values, negated) = match &def.op {
                    GuardOp::Eq(value) => (vec![*value], false),
                    GuardOp::Ne(value) => (vec![*value], true),
                    GuardOp::In(values) => (values.clone(), false),
                };
                match def.key {
                    "stage" => Ok(Clause::Stage(keywords(def.key, &values)?, negated)),
                    "restart" => Ok(Clause::Restart(keywords(def.key, &values)?, negated)),
                    "possession" => Ok(Clause::Possession(keywords(def.key, &values)?, negated)),
                    key => Err(LoadError::InvalidGuard {
                        key: key.to_owned(),
                        value: values.join(", "),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { clauses })
    }

    pub fn matches(&self, game: &GameState) -> bool {
        self.clauses.iter().all(|clause| clause.matches(game))
    }
}

fn keywords<T: std::str::FromStr>(key: &str, values: &[&str]) -> Result<Vec<T>, LoadError> {
    values
        .iter()
        .map(|value| {
            value.parse().map_err(|_| LoadError::InvalidGuard {
                key: key.to_owned(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// A named behavior tree with the conditions under which it is chosen.
pub struct Play {
    name: String,
    priority: u32,
    guard: PlayGuard,
    pub(crate) root: BehaviorNodeContainer,
}

impl Play {
    pub fn new(
        name: impl Into<String>,
        priority: u32,
        guard: PlayGuard,
        root: BehaviorNodeContainer,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            guard,
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn guard(&self) -> &PlayGuard {
        &self.guard
    }

    pub fn root(&self) -> &BehaviorNodeContainer {
        &self.root
    }
}

/// All plays the team knows about.
#[derive(Default)]
pub struct Playbook {
    plays: Vec<Play>,
}

impl Playbook {
    pub fn new(plays: Vec<Play>) -> Result<Self, LoadError> {
        let mut names = HashSet::new();
        for play in &plays {
            if !names.insert(play.name.as_str()) {
                return Err(LoadError::DuplicatePlay(play.name.clone()));
            }
        }
        Ok(Self { plays })
    }

    pub fn from_source(source: &str, registry: &Registry) -> Result<Self, LoadError> {
        let parsed = parser::parse(source)?;
        Self::new(parser::load(&parsed, registry)?)
    }

    /// The plays shipped with the crate, built from the default registry.
    pub fn builtin() -> Result<Self, LoadError> {
        Self::from_source(include_str!("../plays/default.play"), &Registry::default())
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn play(&self, name: &str) -> Option<&Play> {
        self.plays.iter().find(|play| play.name == name)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut Play> {
        self.plays.get_mut(idx)
    }

    /// Index of the play to run.
    ///
    /// `running` is the play that ran in the previous tick and has not finished. It is
    /// kept while its guard holds and no play of strictly higher priority matches.
    /// Otherwise the matching play with the highest priority wins, the earliest
    /// declared one among equals.
    pub fn select(&self, game: &GameState, running: Option<usize>) -> Option<usize> {
        let best = self
            .plays
            .iter()
            .enumerate()
            .filter(|(_, play)| play.guard.matches(game))
            .fold(None, |best: Option<(usize, &Play)>, (idx, play)| match best {
                Some((_, b)) if b.priority >= play.priority => best,
                _ => Some((idx, play)),
            });

        let current = running
            .and_then(|idx| Some((idx, self.plays.get(idx)?)))
            .filter(|(_, play)| play.guard.matches(game));

        match (current, best) {
            (Some((idx, cur)), Some((_, b))) if b.priority <= cur.priority => Some(idx),
            (_, best) => best.map(|(idx, _)| idx),
        }
    }
}
