//! Play scripts: a nom parser producing a syntax tree and a loader that turns it into
//! behavior trees through a [`Registry`](crate::Registry).

mod loader;
mod nom_parser;

pub use self::{
    loader::load,
    nom_parser::{
        parse_file, parse_node, parse_play, parse_tactic, GuardDef, GuardOp, NodeDef, PlayDef,
        PlaySource, TacticDef,
    },
};

use crate::error::LoadError;

/// Parse a whole play script. Unlike [`parse_file`], anything left unparsed is an error.
pub fn parse(source: &str) -> Result<PlaySource, LoadError> {
    match parse_file(source) {
        Ok(("", parsed)) => Ok(parsed),
        Ok((rest, _)) => Err(syntax_error(source, nom_parser::error_position(rest))),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(syntax_error(source, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(syntax_error(source, "")),
    }
}

/// `at` is a suffix of `source`.
fn syntax_error(source: &str, at: &str) -> LoadError {
    let at = at.trim_start();
    let offset = source.len().saturating_sub(at.len());
    let line = source[..offset].matches('\n').count() + 1;
    let near = at
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take(24)
        .collect();
    LoadError::Parse { line, near }
}
