//! Structural scoring of the metawords offered for one segment.

use super::{MwId, SplitterContext};
use crate::engine::Engine;
use crate::feature::{FeatureList, MwFeatures};
use crate::grammar::RATIO_BASE;
use crate::pos::SegClass;

/// Structural score of a metaword that follows a segment of class `prev`.
fn struct_score(sc: &SplitterContext, engine: &Engine, id: MwId, prev: SegClass) -> i64 {
    let mw = &sc.metawords[id];
    let mut fl = FeatureList::new();
    fl.set_cur_class(mw.seg_class);
    fl.set_dep_word(mw.dep_word_hash);
    fl.set_dep_class(mw.dep_class);
    fl.set_mw_features(mw.features);
    fl.set_class_trans(prev, mw.seg_class);
    fl.sort();

    let prob = 0.1 + engine.model().cand_prob(&fl);
    let base = (RATIO_BASE * RATIO_BASE) as f64;
    let mut score = (base * prob) as i64;
    if mw.features.contains(MwFeatures::SUFFIX) {
        score /= 2;
    }
    if mw.features.contains(MwFeatures::WEAK_CONN) {
        score /= 10;
    }
    score
}

/// Store each metaword's structural score and sort the ids by it, highest first.
pub(super) fn sort_by_structure(
    sc: &mut SplitterContext,
    engine: &Engine,
    mw_ids: &mut [MwId],
    prev: SegClass,
) {
    for &id in mw_ids.iter() {
        let score = struct_score(sc, engine, id, prev);
        sc.metawords[id].struct_score = score;
    }
    mw_ids.sort_by(|&a, &b| {
        sc.metawords[b]
            .struct_score
            .cmp(&sc.metawords[a].struct_score)
    });
}
