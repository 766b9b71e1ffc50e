//! # IPASIR
//!
//! API for kitsat following the [IPASIR](https://github.com/biotomas/ipasir) convention.
//!
//! Every function taking a solver pointer expects one returned by
//! `ipasir_init` and not yet given to `ipasir_release`.

use kitsat::{lbool, BasicSolver, ELit};
use std::os::raw::{c_char, c_int, c_void};

static NAME: &str = "kitsat-0.1\0";

/// The wrapper around a solver. It contains the clause being added.
struct IpasirSolver {
    solver: BasicSolver,
    cur: Vec<ELit>, // current clause
}

impl IpasirSolver {
    fn new() -> IpasirSolver {
        IpasirSolver {
            solver: BasicSolver::default(),
            cur: Vec::new(),
        }
    }

    /// Add `cur`, merging repeated literals and dropping tautologies, which
    /// IPASIR allows but the solver does not.
    fn add_current_clause(&mut self) {
        self.cur.sort_unstable();
        self.cur.dedup();
        if !self.cur.windows(2).any(|w| w[0].var_idx() == w[1].var_idx()) {
            self.solver.add_clause(&self.cur);
        }
        self.cur.clear();
    }
}

#[inline]
unsafe fn get_solver<'a>(ptr: *mut c_void) -> &'a mut IpasirSolver {
    debug_assert!(!ptr.is_null());
    &mut *(ptr as *mut IpasirSolver)
}

#[no_mangle]
pub extern "C" fn ipasir_signature() -> *const c_char {
    NAME.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn ipasir_init() -> *mut c_void {
    let s = Box::new(IpasirSolver::new());
    Box::into_raw(s) as *mut c_void
}

/// # Safety
///
/// `ptr` must come from `ipasir_init` and is invalid afterwards.
#[no_mangle]
pub unsafe extern "C" fn ipasir_release(ptr: *mut c_void) {
    let s = Box::from_raw(ptr as *mut IpasirSolver);
    s.solver.release();
}

/// # Safety
///
/// `ptr` must be a live solver.
#[no_mangle]
pub unsafe extern "C" fn ipasir_add(ptr: *mut c_void, lit: c_int) {
    let s = get_solver(ptr);
    if lit == 0 {
        s.add_current_clause();
    } else {
        s.cur.push(ELit::from_dimacs(lit));
    }
}

/// # Safety
///
/// `ptr` must be a live solver.
#[no_mangle]
pub unsafe extern "C" fn ipasir_assume(ptr: *mut c_void, lit: c_int) {
    let s = get_solver(ptr);
    s.solver.assume(ELit::from_dimacs(lit));
}

/// # Safety
///
/// `ptr` must be a live solver.
#[no_mangle]
pub unsafe extern "C" fn ipasir_solve(ptr: *mut c_void) -> c_int {
    let s = get_solver(ptr);
    s.solver.solve().code()
}

/// # Safety
///
/// `ptr` must be a live solver whose last `ipasir_solve` returned 10.
#[no_mangle]
pub unsafe extern "C" fn ipasir_val(ptr: *mut c_void, lit: c_int) -> c_int {
    let s = get_solver(ptr);
    match s.solver.value(ELit::from_dimacs(lit)) {
        x if x == lbool::TRUE => lit,
        x if x == lbool::FALSE => -lit,
        _ => 0,
    }
}

/// # Safety
///
/// `ptr` must be a live solver whose last `ipasir_solve` returned 20.
#[no_mangle]
pub unsafe extern "C" fn ipasir_failed(ptr: *mut c_void, lit: c_int) -> c_int {
    let s = get_solver(ptr);
    s.solver.failed(ELit::from_dimacs(lit)) as c_int
}

/// # Safety
///
/// `ptr` must be a live solver, and `state` must stay valid for
/// `terminate` as long as it is installed.
#[no_mangle]
pub unsafe extern "C" fn ipasir_set_terminate(
    ptr: *mut c_void,
    state: *mut c_void,
    terminate: Option<extern "C" fn(*mut c_void) -> c_int>,
) {
    let s = get_solver(ptr);
    match terminate {
        Some(terminate) => s.solver.set_terminator(move || terminate(state) != 0),
        None => s.solver.no_terminator(),
    }
}

/// Exporting learned clauses is not supported: the callback is never
/// called and the solver is left untouched.
///
/// # Safety
///
/// `ptr` must be a live solver.
#[no_mangle]
pub unsafe extern "C" fn ipasir_set_learn(
    _ptr: *mut c_void,
    _state: *mut c_void,
    _max_len: c_int,
    _learn: Option<extern "C" fn(*mut c_void, *mut c_int)>,
) {
}
