//! Flipping literals and prime implicants of a model.
//!
//! Both work on the complete assignment left by a satisfiable `solve` and
//! rely on the watch invariant it guarantees: every clause has a true
//! watched literal. A literal can be dropped (or flipped) when each clause
//! watching it can move that watch to another true literal.

use {
    crate::callbacks::Callbacks,
    crate::clause::{lbool, ClauseRef, CRef, ELit, Lit, Var},
    crate::core::{invalid_api_usage, Solver, Status},
    std::mem,
};

/// Result of `Solver::flip_and_implicant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlippedImplicant {
    /// The literal could not be flipped, nothing was computed.
    NotFlipped,
    /// The ticks limit was hit while computing the implicants.
    Timeout,
    /// Both implicants were computed, this side is the shorter one.
    Side(usize),
}

impl<Cb: Callbacks> Solver<Cb> {
    /// Try to invert the value of `lit` in the current model.
    ///
    /// Succeeds if every clause stays satisfied, in which case `value`
    /// reports the new assignment. Unknown and root-level variables are
    /// never flipped.
    pub fn flip_literal<L: Into<ELit>>(&mut self, lit: L) -> bool {
        self.require_status("flip_literal", &[Status::Sat]);
        let elit = lit.into();
        let lit = match self.lookup(elit) {
            Some(lit) => lit,
            None => return false,
        };
        if self.fixed(elit) != lbool::UNDEF {
            return false;
        }
        self.flip_internal(lit)
    }

    /// Compute two implicants of the model and return the shorter one.
    ///
    /// `ignore` splits the original clauses by id: the implicant of side
    /// `0` only has to satisfy the clauses for which it returns `true`,
    /// the one of side `1` those for which it returns `false`. Learned
    /// clauses never count. Returns `None` if the ticks limit is hit.
    pub fn compute_prime_implicant<F>(&mut self, mut ignore: F) -> Option<usize>
    where
        F: FnMut(u32) -> bool,
    {
        self.require_status("compute_prime_implicant", &[Status::Sat]);
        debug_assert!(self.prime[0].is_empty() && self.prime[1].is_empty());
        let mut unassigned = vec![];
        let mut limit_hit = false;
        for side in 0..2 {
            let ignoring = side == 1;
            for i in 0..self.trail.len() {
                if self.stats.ticks >= self.ticks_limit {
                    limit_hit = true;
                    break;
                }
                let lit = self.true_literal(self.trail[i]);
                let v = lit.var();
                debug_assert!(self.vars[v].level > 0);
                let reason = self.vars[v].reason;
                if reason != CRef::UNDEF {
                    let c = self.ca.get_ref(reason);
                    // the only true literal of a relevant reason must stay
                    if !c.learned() && ignore(c.id()) != ignoring {
                        continue;
                    }
                }
                let removable =
                    self.prime_propagate(v, None, |c| c.learned() || ignore(c.id()) == ignoring);
                if removable {
                    trace!("dropping {:?} from implicant {}", lit, side);
                    self.values[lit] = lbool::UNDEF;
                    self.values[!lit] = lbool::UNDEF;
                    unassigned.push(lit);
                }
            }
            self.collect_implicant(side, &mut unassigned);
        }
        self.finish_implicants(limit_hit)
    }

    /// Give `f` the blocking clause of the implicant of `side`, the
    /// negation of its literals, then forget both implicants.
    pub fn add_prime_implicant<F>(&mut self, side: usize, mut f: F)
    where
        F: FnMut(usize, &[ELit]),
    {
        self.require_status("add_prime_implicant", &[Status::SatPrime]);
        if side > 1 {
            invalid_api_usage("add_prime_implicant", format_args!("invalid side {}", side));
        }
        let mut eclause = mem::take(&mut self.eclause);
        eclause.clear();
        eclause.extend(self.prime[side].iter().map(|&lit| self.export_lit(!lit)));
        f(side, &eclause);
        eclause.clear();
        self.eclause = eclause;
        self.prime[0].clear();
        self.prime[1].clear();
    }

    /// Flip `lit`, then compute the implicants of the clauses containing
    /// `lit` (side `0`) and its negation (side `1`) in the new model.
    ///
    /// Each implicant starts with the literal it is computed for.
    pub fn flip_and_implicant<L: Into<ELit>>(&mut self, lit: L) -> FlippedImplicant {
        self.require_status("flip_and_implicant", &[Status::Sat]);
        let elit = lit.into();
        if !self.flip_literal(elit) {
            return FlippedImplicant::NotFlipped;
        }
        let blit = self.lookup(elit).expect("flipped literal is known");
        let mut unassigned = vec![];
        let mut limit_hit = false;
        for side in 0..2 {
            let block = blit ^ (side == 1);
            let v = blit.var();
            let removable = self.prime_propagate(v, Some(block), |c| c.learned());
            debug_assert!(removable, "flipped literal {:?} is pinned", blit);
            if removable {
                let lit = self.true_literal(blit);
                self.values[lit] = lbool::UNDEF;
                self.values[!lit] = lbool::UNDEF;
                unassigned.push(lit);
            }
            self.prime[side].push(block);
            for i in 0..self.trail.len() {
                if self.stats.ticks >= self.ticks_limit {
                    limit_hit = true;
                    break;
                }
                let lit = self.trail[i];
                if self.values[lit] == lbool::UNDEF {
                    continue;
                }
                let lit = self.true_literal(lit);
                if self.prime_propagate(lit.var(), Some(block), |c| c.learned()) {
                    trace!("dropping {:?} from implicant of {:?}", lit, block);
                    self.values[lit] = lbool::UNDEF;
                    self.values[!lit] = lbool::UNDEF;
                    unassigned.push(lit);
                }
            }
            self.collect_implicant(side, &mut unassigned);
        }
        match self.finish_implicants(limit_hit) {
            Some(side) => FlippedImplicant::Side(side),
            None => FlippedImplicant::Timeout,
        }
    }

    #[inline]
    fn true_literal(&self, lit: Lit) -> Lit {
        if self.values[lit] == lbool::FALSE {
            !lit
        } else {
            lit
        }
    }

    fn flip_internal(&mut self, lit: Lit) -> bool {
        self.stats.flip += 1;
        let lit = self.true_literal(lit);
        debug_assert_eq!(self.values[lit], lbool::TRUE);
        trace!("trying to flip {:?}", lit);
        let res = self.move_watches(lit, |_| false, None);
        if res {
            debug!("flipped {:?}", lit);
            self.values[lit] = lbool::FALSE;
            self.values[!lit] = lbool::TRUE;
            self.stats.flipped += 1;
        }
        res
    }

    /// Can `v` be unassigned without leaving a relevant clause without
    /// a true literal? Relevant clauses are the ones `skip` keeps and, with
    /// a `block`, that contain it.
    fn prime_propagate<S>(&mut self, v: Var, block: Option<Lit>, mut skip: S) -> bool
    where
        S: FnMut(ClauseRef) -> bool,
    {
        let pos = Lit::new(v, true);
        self.move_watches(!pos, &mut skip, block) && self.move_watches(pos, &mut skip, block)
    }

    /// Move the clauses watching `lit` to another true literal, unless
    /// their other watch is true. Stops at the first relevant clause where
    /// neither is possible and returns `false`.
    fn move_watches<S>(&mut self, lit: Lit, mut skip: S, block: Option<Lit>) -> bool
    where
        S: FnMut(ClauseRef) -> bool,
    {
        let mut ws = mem::take(&mut self.watches[lit]);
        let mut ticks = 1 + (ws.len() as u64 >> 5);
        let mut res = true;
        let mut i = 0;
        let mut j = 0;
        while i < ws.len() {
            let cr = ws[i];
            ws[j] = cr;
            i += 1;
            j += 1;
            if skip(self.ca.get_ref(cr)) {
                continue;
            }
            ticks += 1;
            let values = &self.values;
            let lits = self.ca.lits_mut(cr);
            debug_assert!(lits.len() > 1);
            let other = if lits[0] == lit { lits[1] } else { lits[0] };
            if values[other] == lbool::TRUE {
                continue;
            }
            let replacement = (2..lits.len()).find(|&k| values[lits[k]] == lbool::TRUE);
            if let Some(k) = replacement {
                let repl = lits[k];
                lits[0] = other;
                lits[1] = repl;
                lits[k] = lit;
                self.watches[repl].push(cr);
                j -= 1;
            } else if block.map_or(false, |b| !self.ca.get_ref(cr).lits().contains(&b)) {
                continue;
            } else {
                trace!("{:?} pinned by {:?}", lit, cr);
                res = false;
                break;
            }
        }
        while i < ws.len() {
            ws[j] = ws[i];
            i += 1;
            j += 1;
        }
        ws.truncate(j);
        debug_assert!(self.watches[lit].is_empty());
        self.watches[lit] = ws;
        self.stats.ticks += ticks;
        res
    }

    /// Append the true literals to `prime[side]`, then assign the
    /// `unassigned` literals again.
    fn collect_implicant(&mut self, side: usize, unassigned: &mut Vec<Lit>) {
        for i in 0..self.num_vars() as u32 {
            let pos = Lit::new(Var::from_idx(i), true);
            if self.values[pos] == lbool::TRUE {
                self.prime[side].push(pos);
            } else if self.values[!pos] == lbool::TRUE {
                self.prime[side].push(!pos);
            }
        }
        for &lit in unassigned.iter() {
            debug_assert_eq!(self.values[lit], lbool::UNDEF);
            self.values[lit] = lbool::TRUE;
            self.values[!lit] = lbool::FALSE;
        }
        unassigned.clear();
        debug!("implicant {} of size {}", side, self.prime[side].len());
    }

    fn finish_implicants(&mut self, limit_hit: bool) -> Option<usize> {
        if limit_hit {
            info!("ticks limit {} hit computing implicants", self.ticks_limit);
            self.prime[0].clear();
            self.prime[1].clear();
            return None;
        }
        self.update_status(Status::SatPrime);
        Some((self.prime[0].len() > self.prime[1].len()) as usize)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::BasicSolver;

    fn solved(clauses: &[&[i32]]) -> BasicSolver {
        let mut s = BasicSolver::default();
        for &c in clauses {
            s.add_clause(c);
        }
        assert_eq!(s.solve(), Status::Sat);
        s
    }

    fn dimacs(lits: &[ELit]) -> Vec<i32> {
        lits.iter().map(|l| l.to_dimacs()).collect()
    }

    #[test]
    fn test_flip() {
        let mut s = solved(&[&[1, 2], &[-1, 3]]);
        for i in 1..=3 {
            assert_eq!(s.value(i), lbool::TRUE);
        }
        assert!(s.flip_literal(2));
        assert_eq!(s.value(2), lbool::FALSE);
        // 1 is now the only true literal of the first clause
        assert!(!s.flip_literal(1));
        assert!(!s.flip_literal(-3));
        assert!(!s.flip_literal(7));
        assert_eq!(s.stats().flip, 3);
        assert_eq!(s.stats().flipped, 1);
        assert_eq!(s.status(), Status::Sat);
    }

    #[test]
    fn test_no_flip_at_root() {
        let mut s = solved(&[&[1], &[1, 2]]);
        assert!(!s.flip_literal(1));
        assert!(!s.flip_literal(-1));
        assert_eq!(s.value(1), lbool::TRUE);
    }

    #[test]
    fn test_prime_implicant() {
        let mut s = solved(&[&[1, 2], &[-1, 3]]);
        // with all clauses on side 1, side 0 only keeps root literals
        assert_eq!(s.compute_prime_implicant(|_| false), Some(0));
        assert_eq!(s.status(), Status::SatPrime);
        assert_eq!(s.prime[0].len(), 0);
        assert_eq!(s.value(2), lbool::TRUE);
        let mut blocking = vec![];
        s.add_prime_implicant(1, |side, lits| {
            assert_eq!(side, 1);
            blocking = dimacs(lits);
        });
        assert_eq!(blocking, vec![-1, -3]);
        assert!(s.prime[0].is_empty() && s.prime[1].is_empty());
    }

    #[test]
    fn test_prime_implicant_split_by_id() {
        let mut s = BasicSolver::default();
        s.add_clause_with_id(1, &[1, 2]);
        s.add_clause_with_id(2, &[-1, 3]);
        assert_eq!(s.solve(), Status::Sat);
        let side = s.compute_prime_implicant(|id| id == 2);
        assert!(side.is_some());
        let mut sides = vec![vec![], vec![]];
        for side in 0..2 {
            sides[side] = s.prime[side].iter().map(|&l| s.export_lit(l).to_dimacs()).collect();
        }
        // side 0 satisfies clause 2, side 1 clause 1
        assert!(sides[0].contains(&3) || sides[0].contains(&-1));
        assert!(sides[1].contains(&1) || sides[1].contains(&2));
        assert_eq!(sides[0].len(), 1);
        assert_eq!(sides[1].len(), 1);
    }

    #[test]
    fn test_flip_and_implicant() {
        let mut s = solved(&[&[1, 2], &[-1, 3]]);
        assert_eq!(s.flip_and_implicant(3), FlippedImplicant::NotFlipped);
        assert_eq!(s.status(), Status::Sat);
        assert_eq!(s.flip_and_implicant(2), FlippedImplicant::Side(1));
        assert_eq!(s.status(), Status::SatPrime);
        assert_eq!(s.value(2), lbool::FALSE);
        let mut blocking = vec![];
        s.add_prime_implicant(0, |_, lits| blocking = dimacs(lits));
        assert_eq!(blocking, vec![-2, -1]);
    }

    #[test]
    fn test_prime_implicant_timeout() {
        let mut s = solved(&[&[1, 2], &[-1, 3]]);
        s.set_ticks_limit(0);
        assert_eq!(s.compute_prime_implicant(|_| false), None);
        assert_eq!(s.status(), Status::Sat);
        assert_eq!(s.flip_and_implicant(2), FlippedImplicant::Timeout);
        for i in 1..=3 {
            assert_ne!(s.value(i), lbool::UNDEF);
        }
    }

    #[test]
    #[should_panic(expected = "invalid status 'unknown' (expected 'satisfiable')")]
    fn test_implicant_needs_model() {
        let mut s = BasicSolver::default();
        s.add_clause(&[1, 2]);
        s.compute_prime_implicant(|_| false);
    }

    #[test]
    #[should_panic(expected = "expected 'satisfiable with prime implicant'")]
    fn test_add_implicant_needs_implicant() {
        let mut s = solved(&[&[1, 2]]);
        s.add_prime_implicant(0, |_, _| ());
    }
}
