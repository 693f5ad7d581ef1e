use std::collections::HashSet;

use super::nom_parser::{NodeDef, PlayDef, PlaySource};
use crate::{
    error::{AddChildError, LoadError, ParamError},
    playbook::{Play, PlayGuard},
    BehaviorNodeContainer, NodeParams, ParamValue, Registry,
};

/// Instantiate every play of a parsed script, in declaration order.
///
/// Tactic references are expanded in place, so each play gets its own copy of the
/// nodes and no state is shared between plays.
pub fn load(source: &PlaySource, registry: &Registry) -> Result<Vec<Play>, LoadError> {
    let mut tactics = HashSet::new();
    for tactic in &source.tactics {
        if !tactics.insert(tactic.name) {
            return Err(LoadError::DuplicateTactic(tactic.name.to_owned()));
        }
    }

    let mut names = HashSet::new();
    let mut plays = vec![];
    for def in &source.plays {
        if !names.insert(def.name) {
            return Err(LoadError::DuplicatePlay(def.name.to_owned()));
        }
        plays.push(load_play(def, source, registry)?);
    }
    Ok(plays)
}

fn load_play(def: &PlayDef, source: &PlaySource, registry: &Registry) -> Result<Play, LoadError> {
    let mut params = params_of(&def.params);
    let priority = params
        .take_integer("priority", u32::MAX)
        .and_then(|priority| {
            params.finish()?;
            Ok(priority.unwrap_or(0))
        })
        .map_err(|error| LoadError::Param {
            node: def.name.to_owned(),
            error,
        })?;

    let guard = PlayGuard::from_defs(&def.guard)?;

    let top = TreeStack {
        name: def.name,
        parent: None,
    };
    let root = load_recurse(&def.root, registry, source, &top)?;

    Ok(Play::new(def.name, priority, guard, root))
}

fn params_of(params: &[(&str, ParamValue)]) -> NodeParams {
    NodeParams::new(params.iter().map(|(k, v)| (k.to_string(), v.clone())))
}

/// A mechanism to detect infinite recursion. It is a linked list in call stack.
/// You can traverse the link back to enumerate all the tactic names (which is effectively
/// function names) and check if a tactic name to be inserted is already there.
///
/// A tactic that refers to itself, directly or through other tactics, would expand
/// forever, so it is an error.
struct TreeStack<'a, 'src> {
    name: &'src str,
    parent: Option<&'a TreeStack<'a, 'src>>,
}

impl<'a, 'src> TreeStack<'a, 'src> {
    fn find(&self, name: &str) -> bool {
        if self.name == name {
            true
        } else if let Some(parent) = self.parent {
            parent.find(name)
        } else {
            false
        }
    }
}

fn load_recurse(
    parent: &NodeDef,
    registry: &Registry,
    source: &PlaySource,
    parent_stack: &TreeStack,
) -> Result<BehaviorNodeContainer, LoadError> {
    let mut params = params_of(&parent.params);
    let param_error = |error: ParamError| LoadError::Param {
        node: parent.ty.to_owned(),
        error,
    };
    let required = params.take_bool("required").map_err(param_error)?;

    let mut ret = if let Some(node) = registry.build(parent.ty, params.clone()) {
        BehaviorNodeContainer::new(node.map_err(param_error)?, parent.ty)
    } else {
        let tactic = source
            .tactics
            .iter()
            .find(|tactic| tactic.name == parent.ty)
            .ok_or_else(|| LoadError::MissingNode(parent.ty.to_owned()))?;

        // Prevent infinite recursion
        if parent_stack.find(parent.ty) {
            return Err(LoadError::InfiniteRecursion {
                node: parent.ty.to_owned(),
            });
        }
        // A tactic takes nothing but `required`
        params.finish().map_err(param_error)?;
        if !parent.children.is_empty() {
            return Err(LoadError::AddChildError(
                AddChildError::TooManyNodes,
                parent.ty.to_owned(),
            ));
        }
        let tree_stack = TreeStack {
            name: parent.ty,
            parent: Some(parent_stack),
        };
        load_recurse(&tactic.root, registry, source, &tree_stack)?
    };

    for child in &parent.children {
        let child_node = load_recurse(child, registry, source, parent_stack)?;
        ret.add_child(child_node)
            .map_err(|e| LoadError::AddChildError(e, parent.ty.to_owned()))?;
    }

    if let Some(required) = required {
        ret.required = required;
    }

    Ok(ret)
}

#[cfg(test)]
mod test;
