
/* Main Interface */

use crate::{
    callbacks::Callbacks,
    clause::{lbool, ELit},
    core::{Solver, Status},
};

/// Main interface for a solver: it makes it possible to add clauses,
/// assume literals, and check for satisfiability
///
/// This is the part of the API front-ends (the DIMACS reader, the C
/// bindings) need; cores and implicants are reached through `Solver`.
pub trait SolverInterface {
    /// Number of variables seen in clauses and assumptions.
    fn num_vars(&self) -> usize;

    /// Number of original clauses.
    fn num_clauses(&self) -> usize;

    /// Result of the last `solve`, or `Unknown` after a change.
    fn status(&self) -> Status;

    /// Print some current statistics to standard output.
    fn print_stats(&self);

    /// Add a clause, tagged with `id` for core traversals. The literals must
    /// be on distinct variables.
    fn add_clause_with_id(&mut self, id: u32, lits: &[ELit]);

    /// Assume `lit` for the next call to `solve` only.
    fn assume(&mut self, lit: ELit);

    /// Search for a model that respects the assumptions (with resource constraints).
    fn solve(&mut self) -> Status;

    /// Query model for lit
    ///
    /// Precondition: last result was `Sat`
    fn value(&self, lit: ELit) -> lbool;

    /// Value of this literal if it's assigned at level 0, or `UNDEF` otherwise
    fn fixed(&self, lit: ELit) -> lbool;

    /// Is this assumption part of the reason for unsatisfiability?
    ///
    /// Precondition: last result was `Unsat`
    fn failed(&self, lit: ELit) -> bool;
}

impl<Cb: Callbacks> SolverInterface for Solver<Cb> {
    fn num_vars(&self) -> usize {
        Solver::num_vars(self)
    }
    fn num_clauses(&self) -> usize {
        Solver::num_clauses(self)
    }
    fn status(&self) -> Status {
        Solver::status(self)
    }
    fn print_stats(&self) {
        Solver::print_stats(self)
    }
    fn add_clause_with_id(&mut self, id: u32, lits: &[ELit]) {
        Solver::add_clause_with_id(self, id, lits)
    }
    fn assume(&mut self, lit: ELit) {
        Solver::assume(self, lit)
    }
    fn solve(&mut self) -> Status {
        Solver::solve(self)
    }
    fn value(&self, lit: ELit) -> lbool {
        Solver::value(self, lit)
    }
    fn fixed(&self, lit: ELit) -> lbool {
        Solver::fixed(self, lit)
    }
    fn failed(&self, lit: ELit) -> bool {
        Solver::failed(self, lit)
    }
}
