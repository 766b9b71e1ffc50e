//! Clausal cores.
//!
//! When antecedents are tracked, every learned clause remembers the clauses
//! it was resolved from. After an unsatisfiable `solve`, the clauses
//! reachable from the empty clause (or from the clause justifying the failed
//! assumptions) through these links form a clausal core: the original
//! clauses in it are unsatisfiable on their own.

use {
    crate::callbacks::Callbacks,
    crate::clause::{lbool, CRef, ELit},
    crate::core::{invalid_api_usage, Solver, Status},
    std::mem,
};

/// A clause of the core, as reported by `Solver::trace_core`.
#[derive(Debug, Clone, Copy)]
pub struct CoreClause<'a> {
    /// Handle of the clause, as used in `antecedents`.
    pub cid: u32,
    /// Id given when the clause was added, `0` for learned clauses.
    pub id: u32,
    pub learned: bool,
    pub lits: &'a [ELit],
    /// Handles of the clauses this one was resolved from, in order.
    pub antecedents: &'a [u32],
}

enum Visit {
    Enter(CRef),
    Finish(CRef),
}

impl<Cb: Callbacks> Solver<Cb> {
    /// Mark the clauses the last unsatisfiability proof depends on.
    ///
    /// Returns the number of original and of learned clauses in the core.
    /// Requires status `Unsat` and antecedent tracking.
    pub fn compute_clausal_core(&mut self) -> (usize, usize) {
        self.require_status("compute_clausal_core", &[Status::Unsat]);
        if !self.antecedents {
            invalid_api_usage("compute_clausal_core", format_args!("antecedents not tracked"));
        }
        debug_assert!(self.core.is_empty());

        let mut original = 0;
        let mut learned = 0;
        let root = if self.inconsistent != CRef::UNDEF {
            self.inconsistent
        } else {
            debug_assert!(!self.assumptions.is_empty());
            self.failing
        };

        if root == CRef::UNDEF {
            debug!("assumptions clash, empty core");
        } else {
            let mut stack = vec![Visit::Enter(root)];
            while let Some(visit) = stack.pop() {
                match visit {
                    Visit::Finish(cr) => {
                        let c = self.ca.get_ref(cr);
                        debug_assert!(!c.core());
                        if c.learned() {
                            learned += 1;
                        } else {
                            original += 1;
                        }
                        self.ca.set_core(cr, true);
                        self.core.push(cr);
                    }
                    Visit::Enter(cr) => {
                        let c = self.ca.get_ref(cr);
                        if c.core() {
                            continue;
                        }
                        stack.push(Visit::Finish(cr));
                        for d in c.antecedents() {
                            if !self.ca.get_ref(d).core() {
                                stack.push(Visit::Enter(d));
                            }
                        }
                    }
                }
            }
        }
        info!(
            "clausal core of {} original and {} learned clauses",
            original,
            learned
        );
        self.update_status(Status::UnsatCore);
        (original, learned)
    }

    /// Call `f` on the id of every original clause of the core.
    pub fn traverse_core_ids<F>(&self, mut f: F)
    where
        F: FnMut(u32),
    {
        self.require_status("traverse_core_ids", &[Status::UnsatCore]);
        for cr in self.ca.iter_range(CRef::default(), self.end_original_ref) {
            let c = self.ca.get_ref(cr);
            if c.learned() || !c.core() {
                continue;
            }
            f(c.id());
        }
    }

    /// Call `f` on every clause of the core, original or learned.
    pub fn traverse_core_clauses<F>(&mut self, mut f: F)
    where
        F: FnMut(bool, &[ELit]),
    {
        self.traverse_core_clauses_with_id(|_, learned, lits| f(learned, lits));
    }

    /// Same as `traverse_core_clauses`, the id being `0` for learned clauses.
    pub fn traverse_core_clauses_with_id<F>(&mut self, mut f: F)
    where
        F: FnMut(u32, bool, &[ELit]),
    {
        self.require_status("traverse_core_clauses", &[Status::UnsatCore]);
        let mut eclause = mem::take(&mut self.eclause);
        for &cr in &self.core {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.core());
            eclause.clear();
            eclause.extend(c.lits().iter().map(|&lit| self.export_lit(lit)));
            let id = if c.learned() { 0 } else { c.id() };
            f(id, c.learned(), &eclause);
        }
        eclause.clear();
        self.eclause = eclause;
    }

    /// Call `f` on every clause of the core, antecedents first.
    ///
    /// Together with the antecedents of learned clauses this is a
    /// resolution proof of the empty clause, or of the failing clause.
    pub fn trace_core<F>(&mut self, mut f: F)
    where
        F: FnMut(&CoreClause),
    {
        self.require_status("trace_core", &[Status::UnsatCore]);
        let mut eclause = mem::take(&mut self.eclause);
        for &cr in &self.core {
            let c = self.ca.get_ref(cr);
            eclause.clear();
            eclause.extend(c.lits().iter().map(|&lit| self.export_lit(lit)));
            let learned = c.learned();
            f(&CoreClause {
                cid: cr.offset(),
                id: if learned { 0 } else { c.id() },
                learned,
                lits: &eclause,
                antecedents: c.antecedent_offsets(),
            });
        }
        eclause.clear();
        self.eclause = eclause;
    }

    /// Drop every clause outside of the core, then forget the assignment.
    ///
    /// The solver is back to status `Unknown` with the original clauses of
    /// the core only, which are unsatisfiable again.
    pub fn shrink_to_clausal_core(&mut self) {
        self.require_status("shrink_to_clausal_core", &[Status::UnsatCore]);
        debug!("shrinking to clausal core of {} clauses", self.core.len());

        self.trail.clear();
        self.unassigned = self.num_vars();
        self.propagated = 0;
        self.level = 0;
        self.queue.reset_search();
        self.values.fill(lbool::UNDEF);
        for (_, ws) in self.watches.iter_mut() {
            ws.clear();
        }
        self.units.clear();
        self.inconsistent = CRef::UNDEF;

        let end = self.end_original_ref;
        let mut q = CRef::default();
        let mut c = CRef::default();
        while c < end {
            let next = self.ca.next(c);
            let clause = self.ca.get_ref(c);
            if !clause.learned() && clause.core() {
                let len = self.ca.move_record(c, q);
                self.ca.set_core(q, false);
                self.connect_new_clause(q);
                q = q + len;
            }
            c = next;
        }
        self.ca.truncate(q);
        self.end_original_ref = q;
        self.core.clear();

        for (_, v) in self.vars.iter_mut() {
            v.reason = CRef::UNDEF;
            v.level = 0;
        }
        self.reset_assumptions();
        self.learned = false;
        info!("{} original clauses left", self.num_clauses());
        self.update_status(Status::Unknown);
    }
}
