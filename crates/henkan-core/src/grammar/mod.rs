//! Dependent-word transition graph and independent-word rules.
//!
//! After an independent word is matched, the splitter walks this graph
//! from the rule's start node: each branch lists the literal conditions
//! (particles, auxiliaries, inflection endings) that may follow, and each
//! transition says where to go next and how the tail is classified.
//! Node 0 (`@`) is the terminal.

mod text_io;

pub use text_io::parse_grammar_text;

use std::fs;
use std::path::Path;

use crate::dict::DictError;
use crate::pos::{ConjType, DepClass, Pos, WordType};

/// Fixed-point base of every score ratio.
pub const RATIO_BASE: i32 = 256;

/// Connection strengths; a transition's ratio is `RATIO_BASE / conn`.
pub const NORMAL_CONNECTION: i32 = 1;
pub const WEAKER_CONNECTION: i32 = 2;
pub const WEAK_CONNECTION: i32 = 8;

pub const TERMINAL_NODE: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: usize,
    pub trans_ratio: i32,
    pub weak: bool,
    pub ct: ConjType,
    pub dc: DepClass,
    /// Overrides the head part of speech (nominalizing verbs and the like).
    pub head_pos: Pos,
}

impl Default for Transition {
    fn default() -> Self {
        Transition {
            next: TERMINAL_NODE,
            trans_ratio: RATIO_BASE / NORMAL_CONNECTION,
            weak: false,
            ct: ConjType::None,
            dc: DepClass::None,
            head_pos: Pos::None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Branch {
    /// Literal prefixes of the remaining text; `""` always matches.
    pub conditions: Vec<String>,
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepNode {
    pub name: String,
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepGraph {
    nodes: Vec<DepNode>,
}

impl Default for DepGraph {
    fn default() -> Self {
        DepGraph {
            nodes: vec![DepNode {
                name: "@".to_string(),
                branches: Vec::new(),
            }],
        }
    }
}

impl DepGraph {
    /// Id of the node named `name`, created on first reference.
    pub fn node_id(&mut self, name: &str) -> usize {
        if let Some(id) = self.nodes.iter().position(|n| n.name == name) {
            return id;
        }
        self.nodes.push(DepNode {
            name: name.to_string(),
            branches: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    pub fn node(&self, id: usize) -> Option<&DepNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Branch of `node` with exactly these conditions, created if missing.
    pub(crate) fn branch_mut(&mut self, node: usize, conditions: Vec<String>) -> &mut Branch {
        let branches = &mut self.nodes[node].branches;
        let idx = match branches.iter().position(|b| b.conditions == conditions) {
            Some(i) => i,
            None => {
                branches.push(Branch {
                    conditions,
                    transitions: Vec::new(),
                });
                branches.len() - 1
            }
        };
        &mut branches[idx]
    }

    /// Names of non-terminal nodes that have no branch at all.
    pub fn empty_nodes(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .skip(1)
            .filter(|n| n.branches.is_empty())
            .map(|n| n.name.as_str())
            .collect()
    }
}

/// An independent-word type and the graph node its tail search starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndepRule {
    pub wtype: WordType,
    pub node: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grammar {
    pub graph: DepGraph,
    pub rules: Vec<IndepRule>,
}

impl Grammar {
    pub fn open(path: &Path) -> Result<Self, DictError> {
        parse_grammar_text(&fs::read_to_string(path)?)
    }
}
