//! Helpers shared by the integration tests: small random formulas and a
//! brute-force oracle to check the solver against.

#![allow(dead_code)]

use kitsat::{lbool, BasicSolver, SolverOpts};

pub type Clause = Vec<i32>;

/// Deterministic generator, so failures can be replayed.
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng(seed ^ 0x9e37_79b9_7f4a_7c15)
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    /// Uniform in `0..n`.
    pub fn below(&mut self, n: u32) -> u32 {
        (self.next() % n as u64) as u32
    }

    pub fn lit(&mut self, vars: u32) -> i32 {
        let v = self.below(vars) as i32 + 1;
        if self.below(2) == 0 {
            v
        } else {
            -v
        }
    }
}

/// `m` clauses of three literals on distinct variables among `1..=vars`.
pub fn random_3cnf(rng: &mut Rng, vars: u32, m: usize) -> Vec<Clause> {
    (0..m)
        .map(|_| {
            let mut c: Clause = vec![];
            while c.len() < 3 {
                let lit = rng.lit(vars);
                if c.iter().all(|&l| l.abs() != lit.abs()) {
                    c.push(lit);
                }
            }
            c
        })
        .collect()
}

fn lit_true(assignment: u32, lit: i32) -> bool {
    let bit = assignment >> (lit.abs() - 1) & 1 == 1;
    bit == (lit > 0)
}

/// Is there an assignment of `1..=vars` satisfying `clauses` and `units`?
pub fn brute_force_sat(vars: u32, clauses: &[Clause], units: &[i32]) -> bool {
    assert!(vars <= 20);
    (0..1u32 << vars).any(|a| {
        units.iter().all(|&l| lit_true(a, l))
            && clauses.iter().all(|c| c.iter().any(|&l| lit_true(a, l)))
    })
}

pub fn solver_with(clauses: &[Clause], track_antecedents: bool) -> BasicSolver {
    let mut s = BasicSolver::new(
        SolverOpts {
            track_antecedents,
            ..SolverOpts::default()
        },
        Default::default(),
    );
    for (i, c) in clauses.iter().enumerate() {
        s.add_clause_with_id(i as u32 + 1, c);
    }
    s
}

/// Does the current model of `s` satisfy every clause?
pub fn model_satisfies(s: &BasicSolver, clauses: &[Clause]) -> bool {
    clauses
        .iter()
        .all(|c| c.iter().any(|&l| s.value(l) == lbool::TRUE))
}

/// Clauses `p(i) in some hole` and `no two pigeons in a hole`, for
/// `holes + 1` pigeons.
pub fn pigeonhole(holes: i32) -> Vec<Clause> {
    let p = |i: i32, j: i32| i * holes + j + 1;
    let mut clauses = vec![];
    for i in 0..=holes {
        clauses.push((0..holes).map(|j| p(i, j)).collect());
    }
    for j in 0..holes {
        for i in 0..=holes {
            for k in i + 1..=holes {
                clauses.push(vec![-p(i, j), -p(k, j)]);
            }
        }
    }
    clauses
}
