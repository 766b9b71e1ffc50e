mod common;

use common::*;
use kitsat::{BasicSolver, Status};
use std::collections::HashMap;

fn core_ids(s: &mut BasicSolver) -> Vec<u32> {
    let mut ids = vec![];
    s.traverse_core_ids(|id| ids.push(id));
    ids
}

fn select(clauses: &[Clause], ids: &[u32]) -> Vec<Clause> {
    ids.iter().map(|&id| clauses[id as usize - 1].clone()).collect()
}

/// Resolve `antecedents` from left to right, each clause on the single
/// variable it clashes on with what was derived so far.
fn resolve_chain(clauses: &HashMap<u32, Vec<i32>>, antecedents: &[u32]) -> Vec<i32> {
    let mut res = clauses[&antecedents[0]].clone();
    for a in &antecedents[1..] {
        let d = &clauses[a];
        let pivots: Vec<i32> = d.iter().cloned().filter(|l| res.contains(&-l)).collect();
        assert_eq!(pivots.len(), 1, "{:?} does not resolve with {:?}", d, res);
        res.retain(|&l| l != -pivots[0]);
        for &l in d {
            if l != pivots[0] && !res.contains(&l) {
                res.push(l);
            }
        }
    }
    res.sort();
    res
}

/// Check that every learned clause of the core is derived by its
/// antecedents, and return the number of learned clauses.
fn check_core_chains(s: &mut BasicSolver) -> usize {
    let mut clauses = HashMap::new();
    let mut learned = 0;
    s.trace_core(|c| {
        let mut lits: Vec<i32> = c.lits.iter().map(|l| l.to_dimacs()).collect();
        lits.sort();
        if c.learned {
            learned += 1;
            assert_eq!(resolve_chain(&clauses, c.antecedents), lits, "clause {}", c.cid);
        }
        clauses.insert(c.cid, lits);
    });
    learned
}

#[test]
fn test_failing_clause_chain() {
    let clauses = vec![vec![-1, 2], vec![-2, 3], vec![-3, 5], vec![-2, -5, -4]];
    let mut s = solver_with(&clauses, true);
    s.assume(1);
    s.assume(4);
    assert_eq!(s.solve(), Status::Unsat);
    assert!(s.failed(1));
    assert!(s.failed(4));
    assert_eq!(s.compute_clausal_core(), (4, 1));
    assert_eq!(check_core_chains(&mut s), 1);
    let mut failing = vec![];
    s.traverse_core_clauses(|learned, lits| {
        if learned {
            failing = lits.iter().map(|l| l.to_dimacs()).collect();
        }
    });
    failing.sort();
    assert_eq!(failing, vec![-4, -1]);
}

#[test]
fn test_random_core_chains_under_assumptions() {
    let mut rng = Rng::new(13);
    let mut checked = 0;
    for round in 0..400 {
        let vars = 8;
        let m = 15 + rng.below(30) as usize;
        let clauses = random_3cnf(&mut rng, vars, m);
        let mut s = solver_with(&clauses, true);
        let assumptions: Vec<i32> = (0..rng.below(4)).map(|_| rng.lit(vars)).collect();
        for &a in &assumptions {
            s.assume(a);
        }
        if s.solve() != Status::Unsat {
            continue;
        }
        checked += 1;
        let failed: Vec<i32> = assumptions.iter().cloned().filter(|&a| s.failed(a)).collect();
        let (_, learned) = s.compute_clausal_core();
        assert_eq!(check_core_chains(&mut s), learned, "round {}", round);
        let core = select(&clauses, &core_ids(&mut s));
        assert!(
            !brute_force_sat(vars, &core, &failed),
            "round {}: core with {:?} is satisfiable",
            round,
            failed
        );
    }
    assert!(checked > 50);
}

#[test]
fn test_pigeonhole_core_is_everything() {
    // pigeonhole formulas are minimally unsatisfiable
    for &holes in &[2, 3, 4] {
        let clauses = pigeonhole(holes);
        let mut s = solver_with(&clauses, true);
        assert_eq!(s.solve(), Status::Unsat);
        let (original, _) = s.compute_clausal_core();
        assert_eq!(original, clauses.len());
        let ids = core_ids(&mut s);
        assert_eq!(ids, (1..=clauses.len() as u32).collect::<Vec<_>>());
    }
}

#[test]
fn test_core_ignores_padding() {
    let mut clauses = pigeonhole(3);
    let n = clauses.len() as u32;
    clauses.push(vec![21, 22]);
    clauses.push(vec![-21, 23]);
    let mut s = solver_with(&clauses, true);
    assert_eq!(s.solve(), Status::Unsat);
    let (original, _) = s.compute_clausal_core();
    assert_eq!(original, n as usize);
    assert!(core_ids(&mut s).iter().all(|&id| id <= n));
}

#[test]
fn test_random_cores_are_unsatisfiable() {
    let mut rng = Rng::new(11);
    let mut checked = 0;
    for round in 0..300 {
        let vars = 8;
        let clauses = random_3cnf(&mut rng, vars, 45);
        let mut s = solver_with(&clauses, true);
        if s.solve() != Status::Unsat {
            continue;
        }
        checked += 1;
        let (original, learned) = s.compute_clausal_core();
        assert_eq!(s.status().code(), 21);
        let ids = core_ids(&mut s);
        assert_eq!(ids.len(), original);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        let core = select(&clauses, &ids);
        assert!(!brute_force_sat(vars, &core, &[]), "round {}", round);

        let mut traced_learned = 0;
        let mut seen = vec![];
        s.trace_core(|c| {
            assert!(c.antecedents.iter().all(|a| seen.contains(a)));
            if c.learned {
                traced_learned += 1;
            } else {
                assert_eq!(clauses[c.id as usize - 1].len(), c.lits.len());
            }
            seen.push(c.cid);
        });
        assert_eq!(traced_learned, learned);
    }
    assert!(checked > 10);
}

#[test]
fn test_shrink_is_idempotent() {
    let mut rng = Rng::new(12);
    let mut checked = 0;
    for _ in 0..100 {
        let vars = 8;
        let clauses = random_3cnf(&mut rng, vars, 50);
        let mut s = solver_with(&clauses, true);
        if s.solve() != Status::Unsat {
            continue;
        }
        checked += 1;
        let (original, _) = s.compute_clausal_core();
        let ids = core_ids(&mut s);
        s.shrink_to_clausal_core();
        assert_eq!(s.status(), Status::Unknown);
        assert_eq!(s.num_clauses(), original);

        assert_eq!(s.solve(), Status::Unsat);
        let (again, _) = s.compute_clausal_core();
        assert!(again <= original);
        let shrunk = core_ids(&mut s);
        assert!(shrunk.iter().all(|id| ids.contains(id)));

        s.shrink_to_clausal_core();
        assert_eq!(s.num_clauses(), again);
        assert_eq!(s.solve(), Status::Unsat);
    }
    assert!(checked > 0);
}

#[test]
fn test_core_survives_incremental_use() {
    let clauses = pigeonhole(3);
    let mut s = solver_with(&clauses, true);
    s.assume(1);
    assert_eq!(s.solve(), Status::Unsat);
    s.compute_clausal_core();
    // a new call forgets the previous core
    assert_eq!(s.solve(), Status::Unsat);
    let (original, _) = s.compute_clausal_core();
    assert_eq!(original, clauses.len());
}

#[test]
fn test_core_clauses_are_exported() {
    let mut s = solver_with(&[vec![5, -9], vec![-5], vec![9]], true);
    assert_eq!(s.solve(), Status::Unsat);
    s.compute_clausal_core();
    let mut originals = vec![];
    s.traverse_core_clauses_with_id(|id, learned, lits| {
        if !learned {
            let mut lits: Vec<i32> = lits.iter().map(|l| l.to_dimacs()).collect();
            lits.sort();
            originals.push((id, lits));
        }
    });
    originals.sort();
    assert_eq!(originals, vec![(1, vec![-9, 5]), (2, vec![-5]), (3, vec![9])]);
}

#[test]
#[should_panic(expected = "invalid API usage in 'shrink_to_clausal_core'")]
fn test_shrink_needs_core() {
    let mut s = solver_with(&pigeonhole(2), true);
    assert_eq!(s.solve(), Status::Unsat);
    s.shrink_to_clausal_core();
}
