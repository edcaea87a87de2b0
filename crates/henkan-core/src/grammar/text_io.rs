//! Text form of the grammar.
//!
//! ```text
//! [rules]
//! noun           @noun
//! v,cc=k5        @v_k5
//!
//! [graph]
//! @noun  ""            Sr@
//! @noun  "は" "が"      Sk@
//! @v_k5  "か"           Cz@mizen
//! @mizen "ない"         Se@   :@
//! ```
//!
//! A transition token is a run of attributes followed by `@name`:
//! `:` weaker and `.` weak connection, `C?` conjugation form,
//! `H?` head part of speech, `S?` dependent class.

use tracing::warn;

use super::{
    DepGraph, Grammar, IndepRule, Transition, RATIO_BASE, WEAKER_CONNECTION, WEAK_CONNECTION,
};
use crate::dict::DictError;
use crate::pos::{ConjType, DepClass, Pos, WordType};

#[derive(PartialEq)]
enum Section {
    None,
    Rules,
    Graph,
}

pub fn parse_grammar_text(text: &str) -> Result<Grammar, DictError> {
    let mut graph = DepGraph::default();
    let mut rules = Vec::new();
    let mut section = Section::None;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let err = |msg: &str| DictError::Parse(format!("line {}: {msg}: {line}", lineno + 1));
        match line {
            "[rules]" => {
                section = Section::Rules;
                continue;
            }
            "[graph]" => {
                section = Section::Graph;
                continue;
            }
            _ => {}
        }
        let tokens = tokenize(line).map_err(|m| err(m))?;
        match section {
            Section::Rules => {
                let [wt, node] = tokens.as_slice() else {
                    return Err(err("rule needs `wtype @node`"));
                };
                let wtype: WordType = wt.parse().map_err(|e| err(&format!("{e}")))?;
                if !node.starts_with('@') {
                    return Err(err("node names start with @"));
                }
                rules.push(IndepRule {
                    wtype,
                    node: graph.node_id(node),
                });
            }
            Section::Graph => parse_graph_line(&mut graph, &tokens).map_err(|m| err(&m))?,
            Section::None => return Err(err("line outside of a section")),
        }
    }

    for name in graph.empty_nodes() {
        warn!(node = name, "dependent-word node has no branch");
    }
    Ok(Grammar { graph, rules })
}

/// Split on whitespace, keeping quoted conditions (which may be empty) intact.
fn tokenize(line: &str) -> Result<Vec<String>, &'static str> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            token.push(chars.next().unwrap_or('"'));
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(ch) => token.push(ch),
                    None => return Err("unterminated condition"),
                }
            }
            token.push('"');
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

fn parse_graph_line(graph: &mut DepGraph, tokens: &[String]) -> Result<(), String> {
    let Some((name, rest)) = tokens.split_first() else {
        return Ok(());
    };
    if !name.starts_with('@') {
        return Err("node names start with @".to_string());
    }
    let node = graph.node_id(name);
    let mut conditions: Vec<String> = rest
        .iter()
        .take_while(|t| t.starts_with('"'))
        .map(|t| t[1..t.len() - 1].to_string())
        .collect();
    let transitions = &rest[conditions.len()..];
    if conditions.is_empty() {
        warn!(node = name.as_str(), "branch without a condition");
        conditions.push(String::new());
    }
    let mut parsed = Vec::with_capacity(transitions.len());
    for token in transitions {
        parsed.push(parse_transition(graph, token)?);
    }
    graph.branch_mut(node, conditions).transitions.extend(parsed);
    Ok(())
}

fn parse_transition(graph: &mut DepGraph, token: &str) -> Result<Transition, String> {
    let at = token
        .find('@')
        .ok_or_else(|| format!("transition without target: {token}"))?;
    let (attrs, target) = token.split_at(at);
    let mut tr = Transition::default();
    let mut conn = 1;
    let mut it = attrs.chars();
    while let Some(c) = it.next() {
        match c {
            ':' => {
                conn = WEAKER_CONNECTION;
                tr.weak = true;
            }
            '.' => {
                conn = WEAK_CONNECTION;
                tr.weak = true;
            }
            'C' => {
                tr.ct = match it.next() {
                    Some('z') => ConjType::Mizen,
                    Some('y') => ConjType::Renyou,
                    Some('s') => ConjType::Syusi,
                    Some('t') => ConjType::Rentai,
                    Some('k') => ConjType::Katei,
                    Some('m') => ConjType::Meirei,
                    Some('g') => ConjType::Head,
                    other => return Err(format!("unknown conjugation attribute C{other:?}")),
                }
            }
            'H' => {
                tr.head_pos = match it.next() {
                    Some('n') => Pos::Noun,
                    Some('v') => Pos::V,
                    Some('j') => Pos::Ajv,
                    other => return Err(format!("unknown head attribute H{other:?}")),
                }
            }
            'S' => {
                tr.dc = match it.next() {
                    Some('f') => DepClass::Fuzokugo,
                    Some('k') => DepClass::Kakujoshi,
                    Some('y') => DepClass::Renyou,
                    Some('t') => DepClass::Rentai,
                    Some('e') => DepClass::End,
                    Some('r') => DepClass::Raw,
                    other => return Err(format!("unknown class attribute S{other:?}")),
                }
            }
            other => return Err(format!("unknown transition attribute {other}")),
        }
    }
    tr.next = graph.node_id(target);
    tr.trans_ratio = RATIO_BASE / conn;
    Ok(tr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::TERMINAL_NODE;
    use crate::pos::Pos;

    const GRAMMAR: &str = r#"
[rules]
noun      @noun
v,cc=k5   @v_k5

[graph]
@noun ""          Sr@
@noun "は" "が"    Sk@
@noun "は"         :Sf@
@noun "で"         .Sy@noun_de
@noun_de "も"      Sf@
@v_k5 "き"         CyHn@
"#;

    #[test]
    fn parses_rules_and_graph() {
        let g = parse_grammar_text(GRAMMAR).unwrap();
        assert_eq!(g.rules.len(), 2);
        assert_eq!(g.rules[0].wtype.pos, Pos::Noun);
        let noun = g.graph.node(g.rules[0].node).unwrap();
        assert_eq!(noun.name, "@noun");
        // "は","が" and "は" are distinct condition lists
        assert_eq!(noun.branches.len(), 4);
        assert_eq!(noun.branches[0].conditions, vec![String::new()]);
        assert_eq!(noun.branches[0].transitions[0].next, TERMINAL_NODE);
        assert_eq!(noun.branches[0].transitions[0].dc, DepClass::Raw);

        let weak = &noun.branches[2].transitions[0];
        assert!(weak.weak);
        assert_eq!(weak.trans_ratio, RATIO_BASE / 2);

        let de = &noun.branches[3].transitions[0];
        assert_eq!(de.trans_ratio, RATIO_BASE / 8);
        assert_eq!(g.graph.node(de.next).unwrap().name, "@noun_de");

        let v = g.graph.node(g.rules[1].node).unwrap();
        let t = &v.branches[0].transitions[0];
        assert_eq!(t.ct, ConjType::Renyou);
        assert_eq!(t.head_pos, Pos::Noun);
    }

    #[test]
    fn identical_conditions_merge() {
        let g = parse_grammar_text("[graph]\n@a \"x\" Sf@\n@a \"x\" Se@\n").unwrap();
        let a = g.graph.node(g.graph.find("@a").unwrap()).unwrap();
        assert_eq!(a.branches.len(), 1);
        assert_eq!(a.branches[0].transitions.len(), 2);
    }

    #[test]
    fn missing_condition_becomes_empty() {
        let g = parse_grammar_text("[graph]\n@a Sf@\n").unwrap();
        let a = g.graph.node(1).unwrap();
        assert_eq!(a.branches[0].conditions, vec![String::new()]);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_grammar_text("@a \"x\" Sf@").is_err());
        assert!(parse_grammar_text("[graph]\n@a \"x\" Sq@\n").is_err());
        assert!(parse_grammar_text("[graph]\n@a \"x\" Sf\n").is_err());
        assert!(parse_grammar_text("[graph]\n@a \"x Sf@\n").is_err());
        assert!(parse_grammar_text("[rules]\nbogus @a\n").is_err());
    }
}
