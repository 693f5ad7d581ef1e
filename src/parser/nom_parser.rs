use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{alpha1, alphanumeric1, char, multispace1, none_of},
    combinator::{cut, map, map_res, opt, recognize, value, verify},
    multi::{many0, separated_list0, separated_list1},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};

use crate::ParamValue;

/// A node as written in the source, before it is looked up in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDef<'src> {
    pub(crate) ty: &'src str,
    pub(crate) params: Vec<(&'src str, ParamValue)>,
    pub(crate) children: Vec<NodeDef<'src>>,
}

impl<'src> NodeDef<'src> {
    pub fn new(ty: &'src str) -> Self {
        Self {
            ty,
            params: vec![],
            children: vec![],
        }
    }

    #[allow(dead_code)]
    fn new_with_params(ty: &'src str, params: Vec<(&'src str, ParamValue)>) -> Self {
        Self {
            ty,
            params,
            children: vec![],
        }
    }

    #[allow(dead_code)]
    fn new_with_children(ty: &'src str, children: Vec<NodeDef<'src>>) -> Self {
        Self {
            ty,
            params: vec![],
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TacticDef<'src> {
    pub(crate) name: &'src str,
    pub(crate) root: NodeDef<'src>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOp<'src> {
    Eq(&'src str),
    Ne(&'src str),
    In(Vec<&'src str>),
}

/// One `key op value` clause of a `when` guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDef<'src> {
    pub(crate) key: &'src str,
    pub(crate) op: GuardOp<'src>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayDef<'src> {
    pub(crate) name: &'src str,
    pub(crate) params: Vec<(&'src str, ParamValue)>,
    pub(crate) guard: Vec<GuardDef<'src>>,
    pub(crate) root: NodeDef<'src>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaySource<'src> {
    pub tactics: Vec<TacticDef<'src>>,
    pub plays: Vec<PlayDef<'src>>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn line_comment(i: &str) -> IResult<&str, ()> {
    value((), pair(char('#'), opt(is_not("\n\r"))))(i)
}

/// Whitespace, newlines and comments.
fn blank(i: &str) -> IResult<&str, ()> {
    value((), many0(alt((value((), multispace1), line_comment))))(i)
}

fn ws<'src, O>(
    f: impl FnMut(&'src str) -> IResult<&'src str, O>,
) -> impl FnMut(&'src str) -> IResult<&'src str, O> {
    preceded(blank, f)
}

fn keyword<'src>(word: &'static str) -> impl FnMut(&'src str) -> IResult<&'src str, &'src str> {
    ws(verify(identifier, move |s: &str| s == word))
}

fn str_literal(input: &str) -> IResult<&str, ParamValue> {
    let (r, val) = delimited(char('"'), many0(none_of("\"")), char('"'))(input)?;
    Ok((r, ParamValue::Text(val.into_iter().collect())))
}

fn number(i: &str) -> IResult<&str, ParamValue> {
    map(map_res(recognize_float, str::parse::<f64>), ParamValue::Number)(i)
}

fn word(i: &str) -> IResult<&str, ParamValue> {
    map(identifier, |s| match s {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        s => ParamValue::Ident(s.to_owned()),
    })(i)
}

fn param(i: &str) -> IResult<&str, (&str, ParamValue)> {
    separated_pair(
        ws(identifier),
        ws(char('=')),
        ws(alt((str_literal, number, word))),
    )(i)
}

/// Once the opening parenthesis is seen, errors inside are not backtracked over.
fn param_list(i: &str) -> IResult<&str, Vec<(&str, ParamValue)>> {
    preceded(
        ws(char('(')),
        cut(terminated(
            separated_list0(ws(char(',')), param),
            pair(opt(ws(char(','))), ws(char(')'))),
        )),
    )(i)
}

pub fn parse_node(i: &str) -> IResult<&str, NodeDef> {
    let (i, ty) = ws(identifier)(i)?;

    let (i, params) = opt(param_list)(i)?;

    let (i, children) = opt(preceded(
        ws(char('{')),
        cut(terminated(many0(parse_node), ws(char('}')))),
    ))(i)?;

    Ok((
        i,
        NodeDef {
            ty,
            params: params.unwrap_or_default(),
            children: children.unwrap_or_default(),
        },
    ))
}

fn guard_def(i: &str) -> IResult<&str, GuardDef> {
    let (i, key) = ws(identifier)(i)?;

    let (i, op) = alt((
        map(preceded(ws(tag("==")), ws(identifier)), GuardOp::Eq),
        map(preceded(ws(tag("!=")), ws(identifier)), GuardOp::Ne),
        map(
            preceded(
                keyword("in"),
                delimited(
                    ws(char('[')),
                    separated_list1(ws(char(',')), ws(identifier)),
                    ws(char(']')),
                ),
            ),
            GuardOp::In,
        ),
    ))(i)?;

    Ok((i, GuardDef { key, op }))
}

pub fn parse_tactic(i: &str) -> IResult<&str, TacticDef> {
    let (i, (_, name, _, root)) = tuple((
        keyword("tactic"),
        cut(ws(identifier)),
        cut(ws(char('='))),
        cut(parse_node),
    ))(i)?;

    Ok((i, TacticDef { name, root }))
}

pub fn parse_play(i: &str) -> IResult<&str, PlayDef> {
    let (i, _) = keyword("play")(i)?;

    let (i, name) = cut(ws(identifier))(i)?;

    let (i, params) = opt(param_list)(i)?;

    let (i, guard) = opt(preceded(
        keyword("when"),
        cut(separated_list1(ws(char(',')), guard_def)),
    ))(i)?;

    let (i, _) = cut(ws(char('=')))(i)?;

    let (i, root) = cut(parse_node)(i)?;

    Ok((
        i,
        PlayDef {
            name,
            params: params.unwrap_or_default(),
            guard: guard.unwrap_or_default(),
            root,
        },
    ))
}

enum Statement<'src> {
    Tactic(TacticDef<'src>),
    Play(PlayDef<'src>),
}

fn statement(i: &str) -> IResult<&str, Statement> {
    alt((
        map(parse_tactic, Statement::Tactic),
        map(parse_play, Statement::Play),
    ))(i)
}

/// Parses as many statements as it can. The caller checks that nothing is left over.
pub fn parse_file(i: &str) -> IResult<&str, PlaySource> {
    let (i, stmts) = many0(statement)(i)?;

    // Eat up trailing blanks to indicate that the input was thoroughly consumed
    let (i, _) = blank(i)?;

    let (tactics, plays) = stmts
        .into_iter()
        .fold((vec![], vec![]), |mut acc, cur| {
            match cur {
                Statement::Tactic(tactic) => acc.0.push(tactic),
                Statement::Play(play) => acc.1.push(play),
            }
            acc
        });

    Ok((i, PlaySource { tactics, plays }))
}

/// Where the statement at the start of `i` stops parsing, for error messages.
pub(crate) fn error_position(i: &str) -> &str {
    match statement(i) {
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => e.input,
        _ => i,
    }
}
