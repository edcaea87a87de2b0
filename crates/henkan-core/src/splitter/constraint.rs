//! Border constraint evaluation.
//!
//! Before the lattice runs over `[from, to)`, every metaword starting in
//! that range is re-checked against the border the caller insists on.
//! A metaword that starts before the border must end exactly on it.

use super::metaword::{CanUse, MwCheck, MwKind};
use super::{lattice, Borders, MwId, SplitterContext};
use crate::engine::Engine;

pub(super) fn eval_border(
    sc: &mut SplitterContext,
    engine: &Engine,
    work: &mut Borders,
    from: usize,
    from2: usize,
    to: usize,
) {
    for i in from..to {
        for k in 0..sc.mw_at[i].len() {
            let id = sc.mw_at[i][k];
            sc.metawords[id].can_use = CanUse::Unchecked;
        }
    }
    for i in from..to {
        for k in 0..sc.mw_at[i].len() {
            let id = sc.mw_at[i][k];
            check_metaword(sc, id, from, from2);
        }
    }

    // Nothing fits the forced border: run the lattice from it instead.
    let any_ok = sc.mw_at[from]
        .iter()
        .any(|&id| sc.metawords[id].can_use == CanUse::Ok);
    let from = if any_ok { from } else { from2 };
    if from >= to {
        return;
    }
    lattice::mark_borders(sc, engine, work, from, to);
}

fn border_check(sc: &SplitterContext, id: MwId, from: usize, border: usize) -> bool {
    let mw = &sc.metawords[id];
    if mw.from < border {
        mw.from == from && mw.end() == border
    } else {
        true
    }
}

fn set_can_use(sc: &mut SplitterContext, id: MwId, ok: bool) -> bool {
    sc.metawords[id].can_use = if ok { CanUse::Ok } else { CanUse::Ng };
    ok
}

/// Check one metaword and return whether it is usable.
fn check_metaword(sc: &mut SplitterContext, id: MwId, from: usize, border: usize) -> bool {
    match sc.metawords[id].can_use {
        CanUse::Ok => return true,
        CanUse::Ng => return false,
        CanUse::Unchecked => {}
    }
    let mw = &sc.metawords[id];
    let (kind, mw1, mw2) = (mw.kind, mw.mw1, mw.mw2);
    match kind.check() {
        MwCheck::None => true,
        MwCheck::Single => {
            let ok = border_check(sc, id, from, border);
            set_can_use(sc, id, ok)
        }
        MwCheck::Wrap => {
            let ok = match mw1 {
                Some(inner) => check_metaword(sc, inner, from, border),
                None => border_check(sc, id, from, border),
            };
            set_can_use(sc, id, ok)
        }
        MwCheck::Border => {
            let ok = match (mw1, mw2) {
                // A combination must not be split at the forced border.
                (Some(a), Some(_)) if sc.metawords[a].end() == border => false,
                (Some(a), b) => {
                    let left = check_metaword(sc, a, from, border);
                    let right = match b {
                        Some(b) => {
                            let b_from = sc.metawords[b].from;
                            check_metaword(sc, b, b_from, border)
                        }
                        None => true,
                    };
                    left && right
                }
                (None, _) => border_check(sc, id, from, border),
            };
            set_can_use(sc, id, ok)
        }
        MwCheck::Number | MwCheck::Compound => {
            let chain = if kind == MwKind::Number {
                [MwKind::Number, MwKind::Number]
            } else {
                [MwKind::CompoundHead, MwKind::Compound]
            };
            let mut ok = true;
            let mut cursor = Some(id);
            while let Some(c) = cursor {
                let link = &sc.metawords[c];
                if !chain.contains(&link.kind) {
                    break;
                }
                if let Some(part) = link.mw1 {
                    if !border_check(sc, part, from, border) {
                        ok = false;
                        break;
                    }
                }
                cursor = link.mw2;
            }
            set_can_use(sc, id, ok)
        }
        MwCheck::Ochaire => {
            let ok = border_check(sc, id, from, border);
            // The whole phrase stands or falls together.
            let mut cursor = Some(id);
            while let Some(c) = cursor {
                sc.metawords[c].can_use = if ok { CanUse::Ok } else { CanUse::Ng };
                cursor = sc.metawords[c].mw1;
            }
            ok
        }
    }
}
