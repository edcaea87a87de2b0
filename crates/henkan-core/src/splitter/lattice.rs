//! Viterbi search over metawords.
//!
//! Nodes are bucketed by the offset they end at. Each node carries the
//! segment class of its last metaword, which is the Viterbi state: at
//! most one node per (class, border) pair survives in a bucket, and a
//! bucket holds at most `node_max_size` nodes.

use std::cmp::Ordering;

use tracing::{debug, debug_span};

use super::metaword::{CanUse, MwKind};
use super::{Borders, MwId, SplitterContext};
use crate::engine::Engine;
use crate::feature::FeatureList;
use crate::pos::{SegClass, SEG_SIZE};
use crate::settings::settings;

#[derive(Debug, Clone)]
struct LatticeNode {
    /// Offset the node's metaword starts at.
    border: usize,
    seg_class: SegClass,
    /// Product of transition probabilities along the path.
    real_prob: f64,
    /// `real_prob` weighted by the metaword score.
    adjusted_prob: f64,
    mw: Option<MwId>,
    before: Option<usize>,
}

struct Lattice {
    nodes: Vec<LatticeNode>,
    /// Node ids ending at each offset.
    buckets: Vec<Vec<usize>>,
}

impl Lattice {
    fn new(n: usize) -> Self {
        Lattice {
            nodes: Vec::new(),
            buckets: vec![Vec::new(); n + 1],
        }
    }

    fn alloc(&mut self, node: LatticeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

/// Run the search over `[from, to)` and write the chosen borders into `work`.
pub(super) fn mark_borders(
    sc: &mut SplitterContext,
    engine: &Engine,
    work: &mut Borders,
    from: usize,
    to: usize,
) {
    let _span = debug_span!("lattice", from, to).entered();
    let mut lattice = Lattice::new(sc.len());
    let start = lattice.alloc(LatticeNode {
        border: from,
        seg_class: SegClass::HEAD,
        real_prob: 1.0,
        adjusted_prob: 1.0,
        mw: None,
        before: None,
    });
    lattice.buckets[from].push(start);

    for i in from..to {
        let lefts = lattice.buckets[i].clone();
        for left in lefts {
            for k in 0..sc.mw_at[i].len() {
                let id = sc.mw_at[i][k];
                let mw = &sc.metawords[id];
                if mw.can_use != CanUse::Ok || mw.end() > to {
                    continue;
                }
                let node = make_node(sc, engine, &lattice.nodes[left], left, i, id);
                push_node(sc, &mut lattice, node, mw_end(sc, id));
            }
        }
    }

    apply_tail_transition(engine, &mut lattice, to);
    let Some(best) = choose_path(sc, &lattice, from, to) else {
        return;
    };
    debug!(
        nodes = lattice.nodes.len(),
        best_prob = lattice.nodes[best].adjusted_prob
    );

    let mut cursor = best;
    while let Some(before) = lattice.nodes[cursor].before {
        let node = &lattice.nodes[cursor];
        work.best_seg_class[node.border] = node.seg_class;
        if let Some(mw) = node.mw {
            mark_border_by_metaword(sc, work, mw);
        }
        cursor = before;
    }
}

fn mw_end(sc: &SplitterContext, id: MwId) -> usize {
    sc.metawords[id].end()
}

fn make_node(
    sc: &SplitterContext,
    engine: &Engine,
    left: &LatticeNode,
    left_id: usize,
    border: usize,
    id: MwId,
) -> LatticeNode {
    let mw = &sc.metawords[id];
    let mut fl = FeatureList::new();
    fl.set_cur_class(mw.seg_class);
    fl.set_class_trans(left.seg_class, mw.seg_class);
    fl.set_dep_class(mw.dep_class);
    fl.set_dep_word(mw.dep_word_hash);
    fl.set_mw_features(mw.features);
    fl.set_noun_cos(&mw.core_wt);
    fl.sort();

    let prob = engine.model().trans_prob(&fl) * form_bias(sc, id);
    let real_prob = left.real_prob * prob;
    LatticeNode {
        border,
        seg_class: mw.seg_class,
        real_prob,
        adjusted_prob: real_prob * mw.score as f64,
        mw: Some(id),
        before: Some(left_id),
    }
}

/// Length prior of a metaword: Poisson over its length clamped to `[2, 6]`.
fn form_bias(sc: &SplitterContext, id: MwId) -> f64 {
    let mut mw = &sc.metawords[id];
    while mw.kind == MwKind::Wrap {
        match mw.mw1 {
            Some(inner) => mw = &sc.metawords[inner],
            None => break,
        }
    }
    if mw.seg_class.is_depword() {
        return 1.0 / SEG_SIZE as f64;
    }
    let mut r = mw.len.clamp(2, 6);
    if mw.seg_class == SegClass::RENTAISHI {
        r = r.max(3);
    }
    poisson(settings().lattice.poisson_lambda, r)
}

fn poisson(lambda: f64, r: usize) -> f64 {
    let mut p = (-lambda).exp();
    for k in 1..=r {
        p *= lambda / k as f64;
    }
    p
}

/// Compare two nodes; `Greater` means `a` is preferred.
///
/// Where both paths end on the same offsets, a learned phrase beats
/// everything else and a whole compound beats a run of its parts. The
/// adjusted probability decides the rest.
fn cmp_node(sc: &SplitterContext, lattice: &Lattice, a: usize, b: usize) -> Ordering {
    let mut x = Some(a);
    let mut y = Some(b);
    while let (Some(xi), Some(yi)) = (x, y) {
        let (nx, ny) = (&lattice.nodes[xi], &lattice.nodes[yi]);
        let (Some(mx), Some(my)) = (nx.mw, ny.mw) else {
            break;
        };
        let (mx, my) = (&sc.metawords[mx], &sc.metawords[my]);
        if mx.end() != my.end() {
            break;
        }
        match (mx.kind == MwKind::Ochaire, my.kind == MwKind::Ochaire) {
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }
        match (mx.kind, my.kind) {
            (MwKind::CompoundHead, MwKind::CompoundPart) => return Ordering::Greater,
            (MwKind::CompoundPart, MwKind::CompoundHead) => return Ordering::Less,
            _ => {}
        }
        x = nx.before;
        y = ny.before;
    }
    let (pa, pb) = (
        lattice.nodes[a].adjusted_prob,
        lattice.nodes[b].adjusted_prob,
    );
    pa.partial_cmp(&pb).unwrap_or(Ordering::Equal)
}

fn push_node(sc: &SplitterContext, lattice: &mut Lattice, node: LatticeNode, end: usize) {
    let (class, border) = (node.seg_class, node.border);
    let id = lattice.alloc(node);
    let same = lattice.buckets[end].iter().position(|&old| {
        let o = &lattice.nodes[old];
        o.seg_class == class && o.border == border
    });
    if let Some(pos) = same {
        let old = lattice.buckets[end][pos];
        if cmp_node(sc, lattice, id, old) != Ordering::Less {
            lattice.buckets[end][pos] = id;
        }
        return;
    }
    lattice.buckets[end].push(id);
    if lattice.buckets[end].len() > settings().lattice.node_max_size {
        remove_min_node(sc, lattice, end);
    }
}

fn remove_min_node(sc: &SplitterContext, lattice: &mut Lattice, end: usize) {
    let bucket = &lattice.buckets[end];
    let mut min = 0;
    for pos in 1..bucket.len() {
        if cmp_node(sc, lattice, bucket[pos], bucket[min]) == Ordering::Less {
            min = pos;
        }
    }
    lattice.buckets[end].remove(min);
}

/// Weight the nodes that end the range by the transition into `TAIL`.
fn apply_tail_transition(engine: &Engine, lattice: &mut Lattice, to: usize) {
    for k in 0..lattice.buckets[to].len() {
        let id = lattice.buckets[to][k];
        let node = &mut lattice.nodes[id];
        let mut fl = FeatureList::new();
        fl.set_cur_class(SegClass::TAIL);
        fl.set_class_trans(node.seg_class, SegClass::TAIL);
        fl.sort();
        node.adjusted_prob *= engine.model().trans_prob(&fl);
    }
}

/// Best node of the last non-empty bucket in `(from, to]`.
fn choose_path(sc: &SplitterContext, lattice: &Lattice, from: usize, to: usize) -> Option<usize> {
    let end = (from + 1..=to)
        .rev()
        .find(|&i| !lattice.buckets[i].is_empty())?;
    let bucket = &lattice.buckets[end];
    let mut best = bucket[0];
    for &id in &bucket[1..] {
        if cmp_node(sc, lattice, id, best) == Ordering::Greater {
            best = id;
        }
    }
    Some(best)
}

fn mark_border_by_metaword(sc: &mut SplitterContext, work: &mut Borders, id: MwId) {
    let (kind, from, mw1, mw2) = {
        let mw = &sc.metawords[id];
        (mw.kind, mw.from, mw.mw1, mw.mw2)
    };
    match kind {
        MwKind::Dummy
        | MwKind::Single
        | MwKind::CompoundPart
        | MwKind::VRenyouA
        | MwKind::VRenyouNoun
        | MwKind::Number => {
            // A numeral chain converts as one segment, so its parts get no borders.
            work.seg_border[from] = true;
        }
        MwKind::CompoundLeaf => {
            work.seg_border[from] = true;
            work.best_mw[from] = Some(id);
            sc.metawords[id].can_use = CanUse::Ok;
        }
        MwKind::CompoundHead | MwKind::Compound => {
            if let Some(leaf) = mw1 {
                let leaf_from = sc.metawords[leaf].from;
                work.best_mw[leaf_from] = Some(leaf);
                mark_border_by_metaword(sc, work, leaf);
            }
            if let Some(rest) = mw2 {
                mark_border_by_metaword(sc, work, rest);
            }
        }
        MwKind::Wrap => {
            if let Some(inner) = mw1 {
                mark_border_by_metaword(sc, work, inner);
            }
        }
        MwKind::Ochaire => {
            work.seg_border[from] = true;
            if let Some(next) = mw1 {
                mark_border_by_metaword(sc, work, next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisson_peaks_near_lambda() {
        let lambda = 4.0;
        assert!(poisson(lambda, 4) > poisson(lambda, 2));
        assert!(poisson(lambda, 4) > poisson(lambda, 8));
        let total: f64 = (0..60).map(|r| poisson(lambda, r)).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
