mod common;

use common::*;
use kitsat::{lbool, BasicSolver, ELit, Status};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_unit_propagation() {
    let mut s = BasicSolver::default();
    s.add_clause(&[1]);
    s.add_clause(&[-1, 2]);
    assert_eq!(s.solve(), Status::Sat);
    assert_eq!(s.status().code(), 10);
    assert_eq!(s.value(1), lbool::TRUE);
    assert_eq!(s.value(2), lbool::TRUE);
    assert_eq!(s.value(-2), lbool::FALSE);
    // never mentioned
    assert_eq!(s.value(7), lbool::UNDEF);
}

#[test]
fn test_immediate_conflict() {
    let mut s = BasicSolver::default();
    s.add_unit(1);
    s.add_unit(-1);
    assert_eq!(s.solve(), Status::Unsat);
    assert_eq!(s.status().code(), 20);
    assert!(!s.failed(1));
    // stays unsatisfiable whatever comes next
    s.add_binary(2, 3);
    assert_eq!(s.solve(), Status::Unsat);
}

#[test]
fn test_assumption_failure() {
    let mut s = BasicSolver::default();
    s.add_clause(&[-1, -2]);
    s.assume(1);
    s.assume(2);
    assert_eq!(s.solve(), Status::Unsat);
    assert!(s.failed(1));
    assert!(s.failed(2));
    assert!(!s.failed(-1));
    // the clause alone is satisfiable
    assert_eq!(s.solve(), Status::Sat);
    assert!(s.value(-1) == lbool::TRUE || s.value(-2) == lbool::TRUE);
}

#[test]
fn test_failed_subset_of_assumptions() {
    let mut s = BasicSolver::default();
    s.add_clause(&[-1, 2]);
    s.add_clause(&[-2, 3]);
    s.assume(4);
    s.assume(1);
    s.assume(-3);
    s.assume(5);
    assert_eq!(s.solve(), Status::Unsat);
    assert!(s.failed(1));
    assert!(s.failed(-3));
    assert!(!s.failed(4));
    assert!(!s.failed(5));
}

#[test]
fn test_incremental_clauses() {
    let mut s = BasicSolver::default();
    s.add_clause(&[1, 2, 3]);
    assert_eq!(s.solve(), Status::Sat);
    s.add_clause(&[-1]);
    s.add_clause(&[-2]);
    assert_eq!(s.status(), Status::Unknown);
    assert_eq!(s.solve(), Status::Sat);
    assert_eq!(s.value(3), lbool::TRUE);
    assert_eq!(s.fixed(3), lbool::TRUE);
    s.add_clause(&[-3]);
    assert_eq!(s.solve(), Status::Unsat);
    assert_eq!(s.num_clauses(), 4);
    assert_eq!(s.stats().solved, 3);
    assert_eq!(s.stats().sat, 2);
    assert_eq!(s.stats().unsat, 1);
}

#[test]
fn test_clause_variants() {
    let mut s = BasicSolver::default();
    let (x, y) = (ELit::from_dimacs(1), ELit::from_dimacs(2));
    // 1 <-> 2 substituted: satisfied by 1, dropped
    s.add_clause_with_id_and_equivalence(1, &[1, 3], x, y);
    // becomes {3}
    s.add_clause_with_id_and_equivalence(2, &[-2, 3], x, y);
    // becomes {-4}
    s.add_clause_with_id_and_exception(3, &[-4, 5], Some(ELit::from_dimacs(5)));
    assert_eq!(s.num_clauses(), 2);
    assert_eq!(s.solve(), Status::Sat);
    assert_eq!(s.value(3), lbool::TRUE);
    assert_eq!(s.value(4), lbool::FALSE);
}

#[test]
fn test_clear() {
    let mut s = BasicSolver::default();
    s.add_clause(&[1]);
    s.add_clause(&[-1]);
    assert_eq!(s.solve(), Status::Unsat);
    s.clear();
    assert_eq!(s.status(), Status::Unknown);
    assert_eq!(s.num_vars(), 0);
    assert_eq!(s.num_clauses(), 0);
    s.add_clause(&[-1]);
    assert_eq!(s.solve(), Status::Sat);
    assert_eq!(s.value(1), lbool::FALSE);
    s.release();
}

#[test]
fn test_random_against_brute_force() {
    let mut rng = Rng::new(1);
    for round in 0..200 {
        let vars = 8;
        let m = 20 + rng.below(25) as usize;
        let clauses = random_3cnf(&mut rng, vars, m);
        let mut s = solver_with(&clauses, false);
        let expected = brute_force_sat(vars, &clauses, &[]);
        let res = s.solve();
        assert_eq!(res.is_sat(), expected, "round {}: {:?}", round, clauses);
        if res == Status::Sat {
            assert!(model_satisfies(&s, &clauses), "round {}", round);
        }
    }
}

#[test]
fn test_random_assumptions() {
    let mut rng = Rng::new(2);
    for round in 0..200 {
        let vars = 8;
        let m = 15 + rng.below(15) as usize;
        let clauses = random_3cnf(&mut rng, vars, m);
        let mut s = solver_with(&clauses, false);
        let assumptions: Vec<i32> = (0..1 + rng.below(4)).map(|_| rng.lit(vars)).collect();
        for &a in &assumptions {
            s.assume(a);
        }
        let expected = brute_force_sat(vars, &clauses, &assumptions);
        match s.solve() {
            Status::Sat => {
                assert!(expected, "round {}", round);
                assert!(model_satisfies(&s, &clauses));
                for &a in &assumptions {
                    assert_eq!(s.value(a), lbool::TRUE, "round {}", round);
                }
            }
            Status::Unsat => {
                assert!(!expected, "round {}", round);
                let failed: Vec<i32> =
                    assumptions.iter().cloned().filter(|&a| s.failed(a)).collect();
                // the failed assumptions are enough for unsatisfiability
                assert!(
                    !brute_force_sat(vars, &clauses, &failed),
                    "round {}: failed {:?} of {:?}",
                    round,
                    failed,
                    assumptions
                );
            }
            res => panic!("unexpected {}", res),
        }
    }
}

#[test]
fn test_assumption_monotonicity() {
    let mut rng = Rng::new(3);
    let mut checked = 0;
    for _ in 0..200 {
        let vars = 8;
        let clauses = random_3cnf(&mut rng, vars, 25);
        let mut s = solver_with(&clauses, false);
        let mut assumptions: Vec<i32> = (0..3).map(|_| rng.lit(vars)).collect();
        for &a in &assumptions {
            s.assume(a);
        }
        if s.solve() != Status::Unsat {
            continue;
        }
        checked += 1;
        assumptions.push(rng.lit(vars));
        for &a in &assumptions {
            s.assume(a);
        }
        assert_eq!(s.solve(), Status::Unsat, "{:?}", assumptions);
    }
    assert!(checked > 0);
}

#[test]
fn test_learned_clauses_are_kept() {
    let clauses = pigeonhole(4);
    let mut s = solver_with(&clauses, false);
    s.assume(1);
    assert_eq!(s.solve(), Status::Unsat);
    let learned = s.stats().learned;
    assert!(learned > 0);
    assert_eq!(s.solve(), Status::Unsat);
    assert_eq!(s.num_clauses(), clauses.len());
}

#[test]
fn test_ticks_limit_resumes() {
    let mut s = solver_with(&pigeonhole(5), false);
    s.set_ticks_limit(0);
    assert_eq!(s.solve(), Status::Unknown);
    assert_eq!(s.status().code(), 0);
    assert_eq!(s.stats().unknown, 1);
    s.set_ticks_limit(u64::MAX);
    assert_eq!(s.solve(), Status::Unsat);
    assert!(s.current_ticks() > 0);
}

#[test]
fn test_terminator_resumes() {
    let calls = Rc::new(Cell::new(0));
    let mut s = solver_with(&pigeonhole(5), false);
    {
        let calls = calls.clone();
        s.set_terminator(move || {
            calls.set(calls.get() + 1);
            calls.get() > 3
        });
    }
    s.assume(1);
    assert_eq!(s.solve(), Status::Unknown);
    assert_eq!(calls.get(), 4);
    s.no_terminator();
    // assumptions were dropped by the interrupted call
    assert_eq!(s.solve(), Status::Unsat);
    assert!(!s.failed(1));
    assert_eq!(calls.get(), 4);
}

#[test]
fn test_randomized_search() {
    let mut rng = Rng::new(4);
    for seed in 0..50 {
        let vars = 8;
        let clauses = random_3cnf(&mut rng, vars, 30);
        let expected = brute_force_sat(vars, &clauses, &[]);
        let mut s = solver_with(&clauses, false);
        s.set_seed(seed);
        s.shuffle_clauses();
        if seed % 2 == 0 {
            s.randomize_phases();
        } else {
            s.flip_phases();
        }
        let res = s.solve();
        assert_eq!(res.is_sat(), expected);
        if res.is_sat() {
            assert!(model_satisfies(&s, &clauses));
        }
    }
}

#[test]
fn test_dimacs_model() {
    let mut s = BasicSolver::default();
    s.add_clause(&[1]);
    s.add_clause(&[-2]);
    assert_eq!(s.solve(), Status::Sat);
    assert_eq!(format!("{}", s.dimacs_model()), "v 1 -2 0\n");
}

#[test]
#[should_panic(expected = "invalid status 'unknown' (expected 'satisfiable' or 'satisfiable with prime implicant')")]
fn test_value_before_solve() {
    let mut s = BasicSolver::default();
    s.add_clause(&[1]);
    s.value(1);
}

#[test]
#[should_panic(expected = "invalid status 'satisfiable' (expected 'unsatisfiable' or 'unsatisfiable with core')")]
fn test_failed_when_satisfiable() {
    let mut s = BasicSolver::default();
    s.add_clause(&[1]);
    assert_eq!(s.solve(), Status::Sat);
    s.failed(1);
}

#[test]
#[should_panic(expected = "variable 2 repeated in clause")]
fn test_repeated_variable() {
    let mut s = BasicSolver::default();
    s.add_clause(&[1, 2, -2]);
}

#[test]
#[should_panic(expected = "literal 0")]
fn test_zero_literal() {
    ELit::from_dimacs(0);
}

#[test]
#[should_panic(expected = "invalid API usage in 'track_antecedents'")]
fn test_tracking_after_solve() {
    let mut s = BasicSolver::default();
    s.add_clause(&[1]);
    assert_eq!(s.solve(), Status::Sat);
    s.track_antecedents();
}

#[test]
#[should_panic(expected = "invalid API usage in 'shuffle_clauses'")]
fn test_shuffle_after_solve() {
    let mut s = BasicSolver::default();
    s.add_clause(&[1, 2]);
    assert_eq!(s.solve(), Status::Sat);
    s.shuffle_clauses();
}
