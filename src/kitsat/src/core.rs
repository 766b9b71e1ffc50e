/*****************************************************************************************[core.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::callbacks::{Basic, Callbacks},
    crate::clause::{lbool, CRef, ClauseAllocator, ELit, LMap, Lit, VMap, Var},
    crate::intmap::IntMapBool,
    crate::queue::Queue,
    std::{fmt, mem},
};

/// Result of the last call to `solve`, possibly refined by a later query.
///
/// The numeric codes are the usual ones of incremental SAT interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Unknown = 0,
    Sat = 10,
    /// Satisfiable, and `compute_prime_implicant` succeeded.
    SatPrime = 11,
    Unsat = 20,
    /// Unsatisfiable, and `compute_clausal_core` marked the core.
    UnsatCore = 21,
}

impl Status {
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Sat => "satisfiable",
            Status::SatPrime => "satisfiable with prime implicant",
            Status::Unsat => "unsatisfiable",
            Status::UnsatCore => "unsatisfiable with core",
        }
    }

    pub fn is_sat(self) -> bool {
        self == Status::Sat || self == Status::SatPrime
    }

    pub fn is_unsat(self) -> bool {
        self == Status::Unsat || self == Status::UnsatCore
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options given at creation, and restored by `clear`.
#[derive(Debug, Clone)]
pub struct SolverOpts {
    /// Seed of the generator used by the shuffling and phase functions.
    pub seed: u64,
    /// Record antecedents of learned clauses, needed for clausal cores.
    pub track_antecedents: bool,
    /// Number of ticks allowed before `solve` gives up.
    pub ticks_limit: Option<u64>,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        Self {
            seed: 0,
            track_antecedents: false,
            ticks_limit: None,
        }
    }
}

/// Counters, never reset except by `clear`.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub learned: u64,
    pub original: u64,
    pub flip: u64,
    pub flipped: u64,
    pub sat: u64,
    pub unsat: u64,
    pub unknown: u64,
    pub solved: u64,
    pub conflicts: u64,
    pub decisions: u64,
    pub propagations: u64,
    pub ticks: u64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct VarData {
    pub level: u32,
    pub reason: CRef,
}

impl Default for VarData {
    fn default() -> Self {
        VarData {
            level: 0,
            reason: CRef::UNDEF,
        }
    }
}

/// The main solver structure
///
/// A `Solver` owns every clause it was given, the assignment, the decision
/// queue and the statistics. External literals (`ELit`) are mapped to
/// internal ones the first time they appear; all queries take external
/// literals.
///
/// It is parametrized by `Callbacks`
pub struct Solver<Cb: Callbacks> {
    pub(crate) cb: Cb,
    opts: SolverOpts,

    pub(crate) status: Status,
    /// Are antecedents of learned clauses recorded?
    pub(crate) antecedents: bool,
    /// Has any clause been learned yet?
    pub(crate) learned: bool,
    pub(crate) level: u32,
    /// Number of trail literals already propagated.
    pub(crate) propagated: usize,
    pub(crate) unassigned: usize,
    /// Empty clause, or the conflict found at the root without tracking.
    pub(crate) inconsistent: CRef,
    /// Clause justifying the failed assumptions.
    pub(crate) failing: CRef,
    pub(crate) generator: u64,
    /// One past the last original clause.
    pub(crate) end_original_ref: CRef,

    pub(crate) ca: ClauseAllocator,
    pub(crate) queue: Queue,
    pub(crate) vars: VMap<VarData>,
    pub(crate) marks: IntMapBool<Var>,
    pub(crate) phases: IntMapBool<Var>,
    pub(crate) values: LMap<lbool>,
    pub(crate) failed: IntMapBool<Lit>,
    /// `watches[lit]` lists the clauses watching `lit`.
    pub(crate) watches: LMap<Vec<CRef>>,

    /// `import[eidx]` is one more than the internal index, or 0.
    import: Vec<u32>,
    /// External index of each internal variable.
    pub(crate) export: Vec<u32>,
    /// One more than the largest external index seen.
    evars: u32,

    pub(crate) analyzed: Vec<Var>,
    pub(crate) assumptions: Vec<Lit>,
    pub(crate) core: Vec<CRef>,
    pub(crate) eclause: Vec<ELit>,
    pub(crate) klause: Vec<Lit>,
    pub(crate) resolved: Vec<CRef>,
    pub(crate) trail: Vec<Lit>,
    pub(crate) units: Vec<CRef>,
    pub(crate) prime: [Vec<Lit>; 2],

    pub(crate) ticks_limit: u64,
    pub(crate) stats: Stats,
}

/// Print the model as DIMACS
pub struct SolverPrintDimacs<'a, Cb: Callbacks + 'a> {
    s: &'a Solver<Cb>,
}

mod dimacs {
    use super::*;

    impl<'a, Cb: Callbacks> fmt::Display for SolverPrintDimacs<'a, Cb> {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            write!(out, "v ")?;
            for eidx in 0..self.s.evars {
                let elit = ELit::new(2 * eidx);
                match self.s.lookup(elit) {
                    Some(lit) if self.s.values[lit] == lbool::TRUE => {
                        write!(out, "{} ", elit.to_dimacs())?
                    }
                    Some(lit) if self.s.values[lit] == lbool::FALSE => {
                        write!(out, "{} ", (!elit).to_dimacs())?
                    }
                    _ => (),
                }
            }
            writeln!(out, "0")
        }
    }
}

impl<Cb: Callbacks + Default> Default for Solver<Cb> {
    fn default() -> Self {
        Solver::new(SolverOpts::default(), Default::default())
    }
}

impl Solver<Basic> {
    /// Make `solve` return `Status::Unknown` as soon as `f` returns true.
    pub fn set_terminator<F>(&mut self, f: F)
    where
        F: 'static + Fn() -> bool,
    {
        self.cb.set_stop(f);
    }

    pub fn no_terminator(&mut self) {
        self.cb.clear_stop();
    }
}

// public API
impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given options and callbacks.
    pub fn new(opts: SolverOpts, cb: Cb) -> Self {
        let mut s = Solver {
            cb,
            status: Status::Unknown,
            antecedents: opts.track_antecedents,
            learned: false,
            level: 0,
            propagated: 0,
            unassigned: 0,
            inconsistent: CRef::UNDEF,
            failing: CRef::UNDEF,
            generator: opts.seed,
            end_original_ref: CRef::default(),
            ca: ClauseAllocator::new(),
            queue: Queue::new(),
            vars: VMap::new(),
            marks: IntMapBool::new(),
            phases: IntMapBool::new(),
            values: LMap::new(),
            failed: IntMapBool::new(),
            watches: LMap::new(),
            import: vec![],
            export: vec![],
            evars: 0,
            analyzed: vec![],
            assumptions: vec![],
            core: vec![],
            eclause: vec![],
            klause: vec![],
            resolved: vec![],
            trail: vec![],
            units: vec![],
            prime: [vec![], vec![]],
            ticks_limit: u64::MAX,
            stats: Stats::default(),
            opts,
        };
        if let Some(delta) = s.opts.ticks_limit {
            s.set_ticks_limit(delta);
        }
        s
    }

    /// Forget every clause and variable, keeping callbacks and buffers.
    ///
    /// Options given at creation (seed, tracking, limit) apply again.
    pub fn clear(&mut self) {
        debug!("clear solver with {} variables", self.num_vars());
        debug_assert!(self.analyzed.is_empty());
        debug_assert!(self.klause.is_empty());
        debug_assert!(self.resolved.is_empty());
        for &eidx in &self.export {
            self.import[eidx as usize] = 0;
        }
        self.export.clear();
        self.evars = 0;

        self.ca.clear();
        self.queue.clear();
        self.vars.clear();
        self.marks.clear();
        self.phases.clear();
        self.values.clear();
        self.failed.clear();
        self.watches.clear();

        self.assumptions.clear();
        self.core.clear();
        self.eclause.clear();
        self.trail.clear();
        self.units.clear();
        self.prime[0].clear();
        self.prime[1].clear();

        self.status = Status::Unknown;
        self.antecedents = self.opts.track_antecedents;
        self.learned = false;
        self.level = 0;
        self.propagated = 0;
        self.unassigned = 0;
        self.inconsistent = CRef::UNDEF;
        self.failing = CRef::UNDEF;
        self.generator = self.opts.seed;
        self.end_original_ref = CRef::default();
        self.stats = Stats::default();
        self.ticks_limit = u64::MAX;
        if let Some(delta) = self.opts.ticks_limit {
            self.set_ticks_limit(delta);
        }
    }

    /// Tear the solver down.
    pub fn release(self) {
        debug!("release solver with {} variables", self.num_vars());
    }

    #[inline]
    pub fn cb(&self) -> &Cb {
        &self.cb
    }
    #[inline]
    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    /// Record antecedents of learned clauses from now on.
    ///
    /// Only possible before anything was learned.
    pub fn track_antecedents(&mut self) {
        self.require_status("track_antecedents", &[Status::Unknown]);
        if self.learned {
            invalid_api_usage(
                "track_antecedents",
                format_args!("can not start tracking antecedents after learning"),
            );
        }
        debug!("enabling antecedents tracking");
        self.antecedents = true;
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.generator = seed;
    }

    /// Allow `delta` more ticks, counting from now.
    pub fn set_ticks_limit(&mut self, delta: u64) {
        let current = self.stats.ticks;
        self.ticks_limit = if u64::MAX - delta <= current {
            u64::MAX
        } else {
            current + delta
        };
        debug!("ticks limit {} after {} ticks", self.ticks_limit, current);
    }

    pub fn no_ticks_limit(&mut self) {
        self.ticks_limit = u64::MAX;
    }

    #[inline]
    pub fn current_ticks(&self) -> u64 {
        self.stats.ticks
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Number of internal variables.
    #[inline]
    pub fn num_vars(&self) -> usize {
        self.export.len()
    }

    /// Number of original clauses currently stored.
    pub fn num_clauses(&self) -> usize {
        self.ca
            .iter_range(CRef::default(), self.end_original_ref)
            .filter(|&cr| !self.ca.get_ref(cr).learned())
            .count()
    }

    pub fn print_stats(&self) {
        println!("c solved                : {:<12}", self.stats.solved);
        println!(
            "c results               : {} sat, {} unsat, {} unknown",
            self.stats.sat, self.stats.unsat, self.stats.unknown
        );
        println!("c conflicts             : {:<12}", self.stats.conflicts);
        println!("c decisions             : {:<12}", self.stats.decisions);
        println!("c propagations          : {:<12}", self.stats.propagations);
        println!("c ticks                 : {:<12}", self.stats.ticks);
        println!(
            "c clauses               : {:<12}   ({} learned)",
            self.stats.original, self.stats.learned
        );
        println!(
            "c flipped               : {:<12}   ({} tried)",
            self.stats.flipped, self.stats.flip
        );
    }

    /// Model over the external variables seen so far, as a DIMACS `v` line.
    pub fn dimacs_model(&self) -> SolverPrintDimacs<'_, Cb> {
        SolverPrintDimacs { s: self }
    }

    pub fn add_clause<L: Into<ELit> + Copy>(&mut self, lits: &[L]) {
        self.add_clause_with_id_and_exception(NO_ID, lits, None);
    }

    /// Add a clause whose `id` is reported by core traversals.
    pub fn add_clause_with_id<L: Into<ELit> + Copy>(&mut self, id: u32, lits: &[L]) {
        self.add_clause_with_id_and_exception(id, lits, None);
    }

    /// Add `lits` without `except`.
    pub fn add_clause_with_id_and_exception<L: Into<ELit> + Copy>(
        &mut self,
        id: u32,
        lits: &[L],
        except: Option<ELit>,
    ) {
        self.prepare_new_clause();
        for &l in lits {
            let elit: ELit = l.into();
            if Some(elit) == except {
                continue;
            }
            self.push_clause_literal("add_clause_with_id_and_exception", elit);
        }
        self.finish_clause(id);
    }

    /// Add `lits` under the equivalence of `lit` and `other`.
    ///
    /// The clause is dropped when it contains `lit` or `other`, and the
    /// negations of both are removed from it.
    pub fn add_clause_with_id_and_equivalence<L: Into<ELit> + Copy>(
        &mut self,
        id: u32,
        lits: &[L],
        lit: ELit,
        other: ELit,
    ) {
        self.prepare_new_clause();
        for &l in lits {
            let elit: ELit = l.into();
            if elit == lit || elit == other {
                trace!("dropping clause satisfied by {}", elit);
                self.unmark_clause();
                self.klause.clear();
                return;
            }
            if elit == !lit || elit == !other {
                continue;
            }
            self.push_clause_literal("add_clause_with_id_and_equivalence", elit);
        }
        self.finish_clause(id);
    }

    pub fn add_unit<L: Into<ELit>>(&mut self, lit: L) {
        let lit: ELit = lit.into();
        self.add_clause(&[lit]);
    }

    pub fn add_binary<L: Into<ELit>>(&mut self, a: L, b: L) {
        let lits: [ELit; 2] = [a.into(), b.into()];
        self.add_clause(&lits);
    }

    /// Assume `lit` for the next call to `solve` only.
    pub fn assume<L: Into<ELit>>(&mut self, lit: L) {
        if self.status != Status::Unknown {
            self.reset_incremental();
        }
        let lit = self.import_lit(lit.into());
        debug!("registering assumption {:?}", lit);
        self.assumptions.push(lit);
    }

    /// Solve the clauses under the current assumptions.
    pub fn solve(&mut self) -> Status {
        if self.status != Status::Unknown {
            self.reset_incremental();
        } else if self.level > 0 {
            self.completely_backtrack_to_root_level();
        }
        debug!(
            "solve {} variables under {} assumptions",
            self.num_vars(),
            self.assumptions.len()
        );
        self.stats.solved += 1;
        self.cb.on_start();

        let res = match self.propagate_units() {
            Some(res) => res,
            None => self.search(),
        };

        if res == Status::Unknown && !self.assumptions.is_empty() {
            self.reset_assumptions();
        }
        self.update_status(res);
        match res {
            Status::Sat => self.stats.sat += 1,
            Status::Unsat => self.stats.unsat += 1,
            _ => self.stats.unknown += 1,
        }
        info!("solve finished: {}", res);
        self.cb.on_result(res);
        res
    }

    /// Value of `lit` in the model.
    pub fn value<L: Into<ELit>>(&self, lit: L) -> lbool {
        self.require_status("value", &[Status::Sat, Status::SatPrime]);
        match self.lookup(lit.into()) {
            Some(lit) => self.values[lit],
            None => lbool::UNDEF,
        }
    }

    /// Value of `lit` if it is forced at the root, `UNDEF` otherwise.
    pub fn fixed<L: Into<ELit>>(&self, lit: L) -> lbool {
        match self.lookup(lit.into()) {
            Some(lit) => {
                let value = self.values[lit];
                if value == lbool::UNDEF || self.vars[lit.var()].level > 0 {
                    lbool::UNDEF
                } else {
                    value
                }
            }
            None => lbool::UNDEF,
        }
    }

    /// Is the assumption `lit` part of the reason for unsatisfiability?
    pub fn failed<L: Into<ELit>>(&self, lit: L) -> bool {
        self.require_status("failed", &[Status::Unsat, Status::UnsatCore]);
        match self.lookup(lit.into()) {
            Some(lit) => self.failed[lit],
            None => false,
        }
    }

    /// Give every variable a random phase.
    pub fn randomize_phases(&mut self) {
        debug!("randomizing phases");
        let mut random = 0;
        for i in 0..self.num_vars() {
            if i % 64 == 0 {
                random = utils::next_random64(&mut self.generator);
            }
            self.phases
                .set(Var::from_idx(i as u32), (random >> (i % 64)) & 1 == 1);
        }
    }

    /// Invert the phase of every variable.
    pub fn flip_phases(&mut self) {
        debug!("flipping phases");
        self.phases.negate();
    }

    /// Shuffle the decision queue, every watch list and the unit clauses.
    pub fn shuffle_clauses(&mut self) {
        self.require_status("shuffle_clauses", &[Status::Unknown]);
        debug!("shuffling variable order and watches");
        let vars = self.num_vars() as u32;
        for _ in 0..vars {
            let v = utils::pick_random(&mut self.generator, 0, vars);
            self.queue.requeue(Var::from_idx(v));
        }
        self.queue.reset_search();
        debug_assert!(self.queue.check());
        for (_, ws) in self.watches.iter_mut() {
            utils::shuffle(&mut self.generator, ws);
        }
        utils::shuffle(&mut self.generator, &mut self.units);
    }
}

/// Id of clauses added without one.
pub(crate) const NO_ID: u32 = u32::MAX;

// literal space
impl<Cb: Callbacks> Solver<Cb> {
    /// Internal literal of `elit`, if its variable was seen before.
    pub(crate) fn lookup(&self, elit: ELit) -> Option<Lit> {
        let iidx = *self.import.get(elit.var_idx() as usize)?;
        if iidx == 0 {
            None
        } else {
            Some(Lit::new(Var::from_idx(iidx - 1), !elit.is_negated()))
        }
    }

    /// Internal literal of `elit`, allocating its variable if needed.
    pub(crate) fn import_lit(&mut self, elit: ELit) -> Lit {
        let eidx = elit.var_idx();
        if eidx >= self.evars {
            self.enlarge_external(eidx);
        }
        let iidx = match self.import[eidx as usize] {
            0 => {
                let v = self.new_var(eidx);
                self.import[eidx as usize] = v.idx() + 1;
                v.idx()
            }
            i => i - 1,
        };
        Lit::new(Var::from_idx(iidx), !elit.is_negated())
    }

    #[inline]
    pub(crate) fn export_lit(&self, lit: Lit) -> ELit {
        let eidx = self.export[lit.var().idx() as usize];
        ELit::new(2 * eidx + (!lit.sign()) as u32)
    }

    fn enlarge_external(&mut self, eidx: u32) {
        let needed = eidx as usize + 1;
        if self.import.len() < needed {
            let new_len = needed.max(2 * self.import.len());
            trace!("external variables resized to {}", new_len);
            self.import.resize(new_len, 0);
        }
        self.evars = eidx + 1;
    }

    fn new_var(&mut self, eidx: u32) -> Var {
        let v = Var::from_idx(self.export.len() as u32);
        self.export.push(eidx);
        let neg = Lit::new(v, false);
        self.values.reserve(neg, lbool::UNDEF);
        self.watches.reserve_default(neg);
        self.failed.reserve(neg);
        self.vars.reserve_default(v);
        self.marks.reserve(v);
        self.phases.reserve(v);
        self.queue.insert_new(v);
        self.unassigned += 1;
        trace!("new variable {:?} for external index {}", v, eidx);
        v
    }
}

// clauses
impl<Cb: Callbacks> Solver<Cb> {
    fn prepare_new_clause(&mut self) {
        if self.status != Status::Unknown {
            self.reset_incremental();
        } else if self.level > 0 {
            self.completely_backtrack_to_root_level();
        }
        debug_assert!(self.klause.is_empty());
    }

    fn push_clause_literal(&mut self, fun: &str, elit: ELit) {
        let lit = self.import_lit(elit);
        let v = lit.var();
        if self.marks[v] {
            self.unmark_clause();
            self.klause.clear();
            invalid_api_usage(
                fun,
                format_args!("variable {} repeated in clause", elit.var_idx() + 1),
            );
        }
        self.marks.set(v, true);
        self.klause.push(lit);
    }

    fn unmark_clause(&mut self) {
        for &lit in &self.klause {
            self.marks.set(lit.var(), false);
        }
    }

    fn finish_clause(&mut self, id: u32) {
        self.unmark_clause();
        self.new_original_clause(id);
        self.klause.clear();
    }

    /// Move the literals of `klause` not falsified at the root to its
    /// front, returning how many there are.
    fn partition_root_falsified(&mut self) -> usize {
        let mut n = 0;
        for i in 0..self.klause.len() {
            if self.values[self.klause[i]] != lbool::FALSE {
                self.klause.swap(n, i);
                n += 1;
            }
        }
        n
    }

    fn new_original_clause(&mut self, id: u32) {
        let non_false = self.partition_root_falsified();
        let cr = self.ca.alloc_original(id, &self.klause);
        self.stats.ticks += 1;
        self.stats.original += 1;
        self.connect_new_clause(cr);
        self.end_original_ref = self.ca.end();
        // root assignments are flushed from the trail and never propagated
        // again, so a clause already unit or falsified there goes with the units
        if self.klause.len() > 1 && non_false < 2 && self.values[self.klause[0]] != lbool::TRUE {
            trace!("clause {:?} is unit or falsified at the root", cr);
            self.units.push(cr);
        }
    }

    /// Learn `klause`, with `resolved` as antecedents if they are tracked.
    pub(crate) fn new_learned_clause(&mut self) -> CRef {
        let antecedents: &[CRef] = if self.antecedents { &self.resolved } else { &[] };
        let cr = self.ca.alloc_learned(&self.klause, antecedents);
        self.stats.ticks += 1;
        self.stats.learned += 1;
        self.learned = true;
        trace!("learned clause {:?} of size {}", cr, self.klause.len());
        self.connect_new_clause(cr);
        cr
    }

    pub(crate) fn connect_new_clause(&mut self, cr: CRef) {
        let c = self.ca.get_ref(cr);
        match c.size() {
            0 => {
                if self.inconsistent == CRef::UNDEF {
                    debug!("registering empty clause {:?}", cr);
                    self.inconsistent = cr;
                }
            }
            1 => self.units.push(cr),
            _ => {
                let lits = c.lits();
                self.watches[lits[0]].push(cr);
                self.watches[lits[1]].push(cr);
            }
        }
    }
}

// search
impl<Cb: Callbacks> Solver<Cb> {
    fn assign(&mut self, lit: Lit, mut reason: CRef) {
        debug_assert_eq!(self.values[lit], lbool::UNDEF);
        self.values[lit] = lbool::TRUE;
        self.values[!lit] = lbool::FALSE;
        let v = lit.var();
        self.phases.set(v, !lit.sign());
        self.trail.push(lit);
        if self.level == 0 {
            debug_assert_ne!(reason, CRef::UNDEF);
            let c = self.ca.get_ref(reason);
            if c.size() > 1 {
                // root assignments are justified by unit clauses only
                if self.antecedents {
                    self.resolved.push(reason);
                    for &other in c.lits() {
                        if other != lit {
                            let other_reason = self.vars[other.var()].reason;
                            debug_assert_ne!(other_reason, CRef::UNDEF);
                            self.resolved.push(other_reason);
                        }
                    }
                }
                self.klause.push(lit);
                reason = self.new_learned_clause();
                self.resolved.clear();
                self.klause.clear();
            }
        }
        self.vars[v] = VarData {
            level: self.level,
            reason,
        };
        debug_assert!(self.unassigned > 0);
        self.unassigned -= 1;
    }

    #[inline]
    fn unassign(&mut self, lit: Lit) {
        self.values[lit] = lbool::UNDEF;
        self.values[!lit] = lbool::UNDEF;
        self.unassigned += 1;
        self.queue.on_unassign(lit.var());
    }

    /// Visit the clauses watching `!lit`, returning a conflict if any.
    fn propagate_literal(&mut self, lit: Lit) -> CRef {
        debug_assert_eq!(self.values[lit], lbool::TRUE);
        let not_lit = !lit;
        let mut ws = mem::take(&mut self.watches[not_lit]);
        let mut ticks = 1 + (ws.len() as u64 >> 5);
        let mut conflict = CRef::UNDEF;
        let mut i = 0;
        let mut j = 0;
        while i < ws.len() {
            let cr = ws[i];
            ws[j] = cr;
            i += 1;
            j += 1;
            ticks += 1;
            let values = &self.values;
            let lits = self.ca.lits_mut(cr);
            debug_assert!(lits.len() > 1);
            let other = if lits[0] == not_lit { lits[1] } else { lits[0] };
            let other_value = values[other];
            if other_value == lbool::TRUE {
                continue;
            }
            let replacement = (2..lits.len()).find(|&k| values[lits[k]] != lbool::FALSE);
            if let Some(k) = replacement {
                let repl = lits[k];
                lits[0] = other;
                lits[1] = repl;
                lits[k] = not_lit;
                self.watches[repl].push(cr);
                j -= 1;
            } else if other_value == lbool::FALSE {
                trace!("conflict {:?}", cr);
                self.stats.conflicts += 1;
                conflict = cr;
                break;
            } else {
                self.assign(other, cr);
            }
        }
        while i < ws.len() {
            ws[j] = ws[i];
            i += 1;
            j += 1;
        }
        ws.truncate(j);
        debug_assert!(self.watches[not_lit].is_empty());
        self.watches[not_lit] = ws;
        self.stats.ticks += ticks;
        conflict
    }

    fn propagate(&mut self) -> CRef {
        debug_assert_eq!(self.inconsistent, CRef::UNDEF);
        let mut propagated = 0;
        let mut conflict = CRef::UNDEF;
        while conflict == CRef::UNDEF && self.propagated < self.trail.len() {
            let lit = self.trail[self.propagated];
            conflict = self.propagate_literal(lit);
            self.propagated += 1;
            propagated += 1;
        }
        self.stats.propagations += propagated;
        conflict
    }

    fn bump(&mut self) {
        for &v in &self.analyzed {
            self.marks.set(v, false);
            self.queue.move_to_front(v);
        }
        self.analyzed.clear();
        debug_assert!(self.queue.check());
    }

    fn backtrack(&mut self, jump: u32) {
        debug_assert!(jump < self.level);
        trace!("backtrack from level {} to {}", self.level, jump);
        while let Some(&lit) = self.trail.last() {
            if self.vars[lit.var()].level == jump {
                break;
            }
            self.trail.pop();
            self.unassign(lit);
        }
        self.propagated = self.trail.len();
        self.level = jump;
    }

    pub(crate) fn completely_backtrack_to_root_level(&mut self) {
        trace!("backtrack from level {} to the root", self.level);
        let trail = mem::take(&mut self.trail);
        for &lit in &trail {
            debug_assert!(self.vars[lit.var()].level > 0);
            self.unassign(lit);
        }
        self.trail = trail;
        self.trail.clear();
        self.propagated = 0;
        self.level = 0;
    }

    /// Learn the first UIP clause of `conflict`, backjump and assert it.
    fn analyze(&mut self, conflict: CRef) {
        debug_assert!(self.level > 0);
        debug_assert_eq!(self.inconsistent, CRef::UNDEF);
        debug_assert!(self.analyzed.is_empty());
        debug_assert!(self.resolved.is_empty());
        debug_assert!(self.klause.is_empty());
        // slot 0 is for the negated UIP
        self.klause.push(Lit::UNDEF);
        let level = self.level;
        let mut reason = conflict;
        let mut p = self.trail.len();
        let mut open = 0u32;
        let mut jump = 0u32;
        let uip = loop {
            debug_assert_ne!(reason, CRef::UNDEF);
            self.resolved.push(reason);
            let c = self.ca.get_ref(reason);
            for &lit in c.lits() {
                let v = lit.var();
                if self.marks[v] {
                    continue;
                }
                debug_assert_eq!(self.values[lit], lbool::FALSE);
                self.marks.set(v, true);
                self.analyzed.push(v);
                let tmp = self.vars[v].level;
                if tmp < level {
                    let mut lit = lit;
                    if tmp > jump {
                        jump = tmp;
                        if self.klause.len() > 1 {
                            lit = mem::replace(&mut self.klause[1], lit);
                        }
                    }
                    self.klause.push(lit);
                } else {
                    open += 1;
                }
            }
            let next = loop {
                debug_assert!(p > 0);
                p -= 1;
                let lit = self.trail[p];
                if self.marks[lit.var()] {
                    break lit;
                }
            };
            debug_assert!(open > 0);
            open -= 1;
            if open == 0 {
                break next;
            }
            reason = self.vars[next.var()].reason;
        };
        let not_uip = !uip;
        trace!(
            "first UIP {:?} jump level {} size {}",
            not_uip,
            jump,
            self.klause.len()
        );
        self.klause[0] = not_uip;
        self.bump();
        let learned = self.new_learned_clause();
        self.resolved.clear();
        self.klause.clear();
        self.backtrack(jump);
        self.assign(not_uip, learned);
    }

    /// Mark the assumptions responsible for the falsified one.
    fn failing(&mut self) {
        debug_assert_eq!(self.inconsistent, CRef::UNDEF);
        debug_assert!(!self.assumptions.is_empty());
        debug_assert!(self.analyzed.is_empty());
        debug_assert!(self.resolved.is_empty());
        debug_assert!(self.klause.is_empty());

        let mut failed_unit = None;
        let mut failed_clashing = None;
        let mut first_failed = None;
        for &lit in &self.assumptions {
            if self.values[lit] != lbool::FALSE {
                continue;
            }
            if first_failed.is_none() {
                first_failed = Some(lit);
            }
            let vd = self.vars[lit.var()];
            if vd.level == 0 {
                failed_unit = Some(lit);
                break;
            }
            if failed_clashing.is_none() && vd.reason == CRef::UNDEF {
                failed_clashing = Some(lit);
            }
        }
        let failed = failed_unit
            .or(failed_clashing)
            .or(first_failed)
            .expect("no falsified assumption");
        let failed_var = failed.var();
        debug!("first failed assumption {:?}", failed);
        self.failed.set(failed, true);

        if failed_unit.is_some() {
            self.failing = self.vars[failed_var].reason;
            debug_assert_eq!(self.ca.get_ref(self.failing).size(), 1);
            return;
        }
        if failed_clashing.is_some() {
            debug!("assumption {:?} clashes with its negation", failed);
            self.failed.set(!failed, true);
            return;
        }

        self.marks.set(failed_var, true);
        self.analyzed.push(failed_var);
        self.klause.push(!failed);

        // peel the trail backwards so that `resolved` is a resolution chain,
        // the reasons of root literals come last
        let mut units = vec![];
        let mut open = 1;
        let mut p = self.trail.len();
        while open > 0 {
            open -= 1;
            let v = loop {
                debug_assert!(p > 0);
                p -= 1;
                let v = self.trail[p].var();
                if self.marks[v] && self.vars[v].level > 0 {
                    break v;
                }
            };
            let reason = self.vars[v].reason;
            if reason == CRef::UNDEF {
                let mut lit = Lit::new(v, true);
                if self.values[lit] == lbool::FALSE {
                    lit = !lit;
                }
                trace!("failed assumption {:?}", lit);
                debug_assert!(!self.failed[lit]);
                self.failed.set(lit, true);
                self.klause.push(!lit);
            } else {
                self.resolved.push(reason);
                let c = self.ca.get_ref(reason);
                for &other in c.lits() {
                    let ov = other.var();
                    if self.marks[ov] {
                        continue;
                    }
                    self.marks.set(ov, true);
                    self.analyzed.push(ov);
                    if self.vars[ov].level > 0 {
                        open += 1;
                    } else {
                        units.push(ov);
                    }
                }
            }
        }
        for v in units {
            let reason = self.vars[v].reason;
            debug_assert_ne!(reason, CRef::UNDEF);
            debug_assert_eq!(self.ca.get_ref(reason).size(), 1);
            self.resolved.push(reason);
        }
        for &v in &self.analyzed {
            self.marks.set(v, false);
        }
        self.analyzed.clear();

        debug_assert!(!self.resolved.is_empty());
        self.failing = if self.resolved.len() == 1 {
            self.resolved[0]
        } else {
            self.new_learned_clause()
        };
        debug!("failing clause {:?}", self.failing);
        self.resolved.clear();
        self.klause.clear();
    }

    fn flush_trail(&mut self) {
        debug_assert_eq!(self.level, 0);
        trace!("flushing {} root literals from the trail", self.trail.len());
        self.propagated = 0;
        self.trail.clear();
    }

    /// Place the next assumption or decision; `Some` when search is over.
    fn decide(&mut self) -> Option<Status> {
        if self.level == 0 && !self.trail.is_empty() {
            self.flush_trail();
        }
        let mut decision = Lit::UNDEF;
        while (self.level as usize) < self.assumptions.len() {
            let assumption = self.assumptions[self.level as usize];
            let value = self.values[assumption];
            if value == lbool::FALSE {
                self.failing();
                return Some(Status::Unsat);
            } else if value == lbool::TRUE {
                // pseudo decision level
                self.level += 1;
            } else {
                decision = assumption;
                break;
            }
        }
        if self.unassigned == 0 {
            return Some(Status::Sat);
        }
        if self.stats.ticks >= self.ticks_limit {
            info!("ticks limit {} hit", self.ticks_limit);
            return Some(Status::Unknown);
        }
        if self.cb.stop() {
            info!("terminated by callback");
            return Some(Status::Unknown);
        }
        if decision == Lit::UNDEF {
            let values = &self.values;
            let v = self
                .queue
                .next_unassigned(|v| values[Lit::new(v, true)] != lbool::UNDEF);
            decision = Lit::new(v, !self.phases[v]);
        }
        self.stats.decisions += 1;
        self.level += 1;
        trace!("decide {:?} at level {}", decision, self.level);
        self.assign(decision, CRef::UNDEF);
        None
    }

    /// Record that the clauses are unsatisfiable, `cr` being falsified at
    /// the root.
    fn inconsistent(&mut self, mut cr: CRef) {
        debug_assert_ne!(cr, CRef::UNDEF);
        debug_assert_eq!(self.inconsistent, CRef::UNDEF);
        if !self.antecedents {
            debug!("inconsistent through {:?}", cr);
            self.inconsistent = cr;
            return;
        }
        debug_assert!(self.analyzed.is_empty());
        debug_assert!(self.resolved.is_empty());
        let mut next = 0;
        loop {
            debug_assert_ne!(cr, CRef::UNDEF);
            self.resolved.push(cr);
            let c = self.ca.get_ref(cr);
            for &lit in c.lits() {
                let v = lit.var();
                debug_assert_eq!(self.vars[v].level, 0);
                if self.marks[v] {
                    continue;
                }
                self.marks.set(v, true);
                self.analyzed.push(v);
            }
            if next == self.analyzed.len() {
                break;
            }
            let v = self.analyzed[next];
            next += 1;
            cr = self.vars[v].reason;
        }
        debug_assert!(self.klause.is_empty());
        let empty = self.new_learned_clause();
        debug!("inconsistent, empty clause {:?}", empty);
        self.inconsistent = empty;
        for &v in &self.analyzed {
            self.marks.set(v, false);
        }
        self.analyzed.clear();
        self.resolved.clear();
    }

    fn propagate_units(&mut self) -> Option<Status> {
        if self.inconsistent != CRef::UNDEF {
            return Some(Status::Unsat);
        }
        debug_assert_eq!(self.level, 0);
        let mut next = 0;
        while next < self.units.len() {
            let cr = self.units[next];
            next += 1;
            let unit = self.ca.get_ref(cr).lits()[0];
            let value = self.values[unit];
            if value == lbool::TRUE {
                continue;
            }
            if value == lbool::FALSE {
                self.inconsistent(cr);
                return Some(Status::Unsat);
            }
            self.assign(unit, cr);
            let conflict = self.propagate();
            if conflict != CRef::UNDEF {
                self.inconsistent(conflict);
                return Some(Status::Unsat);
            }
        }
        None
    }

    fn search(&mut self) -> Status {
        loop {
            let conflict = self.propagate();
            if conflict != CRef::UNDEF {
                if self.level > 0 {
                    self.analyze(conflict);
                } else {
                    self.inconsistent(conflict);
                    return Status::Unsat;
                }
            } else if let Some(res) = self.decide() {
                return res;
            }
        }
    }
}

// incremental state
impl<Cb: Callbacks> Solver<Cb> {
    pub(crate) fn update_status(&mut self, status: Status) {
        if self.status != status {
            debug!("status '{}' -> '{}'", self.status, status);
        }
        self.status = status;
    }

    pub(crate) fn reset_assumptions(&mut self) {
        trace!("reset {} assumptions", self.assumptions.len());
        for &lit in &self.assumptions {
            self.failed.set(lit, false);
            self.failed.set(!lit, false);
        }
        self.assumptions.clear();
        self.failing = CRef::UNDEF;
    }

    fn reset_core(&mut self) {
        trace!("reset {} core clauses", self.core.len());
        for &cr in &self.core {
            self.ca.set_core(cr, false);
        }
        self.core.clear();
    }

    pub(crate) fn reset_incremental(&mut self) {
        if self.level > 0 {
            self.completely_backtrack_to_root_level();
        }
        if !self.assumptions.is_empty() {
            self.reset_assumptions();
        }
        if self.status == Status::UnsatCore {
            self.reset_core();
        }
        self.prime[0].clear();
        self.prime[1].clear();
        self.update_status(Status::Unknown);
    }

    #[track_caller]
    pub(crate) fn require_status(&self, fun: &str, expected: &[Status]) {
        if !expected.contains(&self.status) {
            let expected: Vec<&str> = expected.iter().map(|s| s.as_str()).collect();
            invalid_api_usage(
                fun,
                format_args!(
                    "invalid status '{}' (expected '{}')",
                    self.status,
                    expected.join("' or '")
                ),
            );
        }
    }
}

/// Usage errors are programming errors: fail loudly.
#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn invalid_api_usage(fun: &str, args: fmt::Arguments) -> ! {
    panic!("invalid API usage in '{}': {}", fun, args)
}

pub(crate) mod utils {
    /// Linear congruential generator, returning the new state.
    pub(crate) fn next_random64(state: &mut u64) -> u64 {
        *state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        *state
    }

    pub(crate) fn next_random32(state: &mut u64) -> u32 {
        (next_random64(state) >> 32) as u32
    }

    /// Random number in `[l, r)`, or `l` if the range is empty.
    pub(crate) fn pick_random(state: &mut u64, l: u32, r: u32) -> u32 {
        debug_assert!(l <= r);
        let delta = (r - l) as u64;
        let tmp = next_random32(state) as u64;
        l + ((delta * tmp) >> 32) as u32
    }

    pub(crate) fn shuffle<T>(state: &mut u64, a: &mut [T]) {
        for i in 0..a.len() {
            let j = pick_random(state, 0, i as u32) as usize;
            if j != i {
                a.swap(i, j);
            }
        }
    }
}
