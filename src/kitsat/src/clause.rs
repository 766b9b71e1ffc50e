/*****************************************************************************************[clause.rs]
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
    crate::{
        alloc::{self, RegionAllocator},
        intmap::{AsIndex, IntMap},
    },
    bitflags::bitflags,
    std::{fmt, ops, slice},
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var(u32);

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !0 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}", self.0 + 1)
        }
    }
}

impl Var {
    pub const UNDEF: Var = Var(!0);
    #[inline(always)]
    pub(crate) fn from_idx(idx: u32) -> Self {
        debug_assert!(idx < u32::MAX / 2, "Var::from_idx: index too large");
        Var(idx)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
}

impl AsIndex for Var {
    fn as_index(self) -> usize {
        self.0 as usize
    }
    fn from_index(index: usize) -> Self {
        Var(index as u32)
    }
}

pub type VMap<V> = IntMap<Var, V>;

/// Internal literal, `2 * var + negated`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Lit(u32);

impl Lit {
    pub const UNDEF: Lit = Lit(!1);

    #[inline(always)]
    pub fn new(var: Var, sign: bool) -> Self {
        Lit(var.0 * 2 + (!sign) as u32)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
    /// `true` for the positive literal of its variable.
    #[inline(always)]
    pub fn sign(&self) -> bool {
        (self.0 & 1) == 0
    }
    #[inline(always)]
    pub fn var(&self) -> Var {
        Var(self.0 >> 1)
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !1 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}{:?}", if self.sign() { "" } else { "-" }, self.var())
        }
    }
}

impl ops::Not for Lit {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Lit(self.0 ^ 1)
    }
}
impl ops::BitXor<bool> for Lit {
    type Output = Self;
    fn bitxor(self, rhs: bool) -> Self {
        Lit(self.0 ^ rhs as u32)
    }
}

impl AsIndex for Lit {
    #[inline(always)]
    fn as_index(self) -> usize {
        self.0 as usize
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Lit(index as u32)
    }
}

pub type LMap<V> = IntMap<Lit, V>;

/// Literal as the caller numbers it: `2 * index + negated`.
///
/// The caller's indices are arbitrary and sparse; the solver maps each of
/// them to a dense internal variable the first time it is seen.
///
/// ```
/// use kitsat::ELit;
/// let l = ELit::from_dimacs(-3);
/// assert_eq!(l.raw(), 5);
/// assert_eq!(l.var_idx(), 2);
/// assert!(l.is_negated());
/// assert_eq!((!l).to_dimacs(), 3);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ELit(u32);

impl ELit {
    #[inline(always)]
    pub const fn new(raw: u32) -> Self {
        ELit(raw)
    }

    /// Convert a non-zero signed DIMACS literal.
    pub fn from_dimacs(lit: i32) -> Self {
        if lit == 0 {
            panic!("invalid API usage in 'ELit::from_dimacs': literal 0 is not a literal");
        }
        let idx = lit.unsigned_abs() - 1;
        ELit(2 * idx + (lit < 0) as u32)
    }
    #[inline(always)]
    pub fn raw(self) -> u32 {
        self.0
    }
    #[inline(always)]
    pub fn var_idx(self) -> u32 {
        self.0 >> 1
    }
    #[inline(always)]
    pub fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }
    pub fn to_dimacs(self) -> i32 {
        let v = self.var_idx() as i32 + 1;
        if self.is_negated() {
            -v
        } else {
            v
        }
    }
}

impl From<i32> for ELit {
    fn from(lit: i32) -> Self {
        ELit::from_dimacs(lit)
    }
}

impl ops::Not for ELit {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        ELit(self.0 ^ 1)
    }
}

impl fmt::Debug for ELit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}
impl fmt::Display for ELit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

#[allow(non_camel_case_types)]
#[derive(Clone, Copy)]
/// A ternary boolean (true, false, undefined) used for partial assignments.
pub struct lbool(u8);

impl fmt::Debug for lbool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "TRUE")
        } else if self.0 == 1 {
            write!(f, "FALSE")
        } else if self.0 <= 3 {
            write!(f, "UNDEF")
        } else {
            // unreachable
            write!(f, "lbool({})", self.0)
        }
    }
}
impl Default for lbool {
    fn default() -> Self {
        lbool::UNDEF
    }
}

impl lbool {
    pub const TRUE: lbool = lbool(0);
    pub const FALSE: lbool = lbool(1);
    pub const UNDEF: lbool = lbool(2);
    pub fn from_u8(v: u8) -> Self {
        debug_assert!(v == (v & 3), "lbool::from_u8: invalid value");
        lbool(v)
    }

    /// `1` for true, `-1` for false and `0` for undefined.
    pub fn to_i8(&self) -> i8 {
        if *self == lbool::TRUE {
            1
        } else if *self == lbool::FALSE {
            -1
        } else {
            0
        }
    }
}

// from minisat:
// bool operator == (lbool b) const { return ((b.value&2) & (value&2)) | (!(b.value&2)&(value == b.value)); }
impl PartialEq for lbool {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0 || (self.0 & rhs.0 & 2) != 0
    }
}

impl Eq for lbool {}

impl ops::Neg for lbool {
    type Output = lbool;

    /// Negation of a `lbool`
    fn neg(self) -> Self {
        lbool(self.0 ^ 1)
    }
}

impl ops::BitXor<bool> for lbool {
    type Output = lbool;

    /// Xor of a lbool with a boolean.
    fn bitxor(self, rhs: bool) -> Self {
        lbool(self.0 ^ rhs as u8)
    }
}

impl From<bool> for lbool {
    fn from(x: bool) -> Self {
        if x {
            lbool::TRUE
        } else {
            lbool::FALSE
        }
    }
}

bitflags! {
    /// Flag word of a clause record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClauseFlags: u32 {
        /// Reached from the inconsistency witness by `compute_clausal_core`.
        const CORE = 0b01;
        /// Derived by the solver rather than added by the caller.
        const LEARNED = 0b10;
    }
}

/// Number of words before the literals of a clause record.
pub(crate) const HEADER_WORDS: u32 = 3;

/// Metadata of a clause
///
/// Layout in the arena:
/// word 0: external id (original clause) or number of antecedents (learned clause);
/// word 1: size;
/// word 2: flags;
/// then `size` literals, then the antecedents of a learned clause.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClauseHeader {
    aux: u32,
    size: u32,
    flags: ClauseFlags,
}

impl ClauseHeader {
    #[inline(always)]
    fn extra(&self) -> u32 {
        if self.flags.contains(ClauseFlags::LEARNED) {
            self.aux
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Copy)]
/// A reference to some clause
pub(crate) struct ClauseRef<'a> {
    header: ClauseHeader,
    lits: &'a [Lit],
    antecedents: &'a [u32],
}

impl<'a> ClauseRef<'a> {
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.header.size
    }
    #[inline(always)]
    pub fn flags(&self) -> ClauseFlags {
        self.header.flags
    }
    #[inline(always)]
    pub fn learned(&self) -> bool {
        self.header.flags.contains(ClauseFlags::LEARNED)
    }
    #[inline(always)]
    pub fn core(&self) -> bool {
        self.header.flags.contains(ClauseFlags::CORE)
    }
    /// External id of an original clause.
    #[inline(always)]
    pub fn id(&self) -> u32 {
        debug_assert!(!self.learned());
        self.header.aux
    }
    #[inline(always)]
    pub fn lits(&self) -> &'a [Lit] {
        self.lits
    }
    /// Offsets of the clauses resolved to derive this one.
    #[inline(always)]
    pub fn antecedent_offsets(&self) -> &'a [u32] {
        self.antecedents
    }
    pub fn antecedents(&self) -> impl Iterator<Item = CRef> + 'a {
        self.antecedents.iter().map(|&r| CRef::from_offset(r))
    }
}

#[inline(always)]
fn as_lits(data: &[u32]) -> &[Lit] {
    // `Lit` is `repr(transparent)` over `u32`
    unsafe { slice::from_raw_parts(data.as_ptr() as *const Lit, data.len()) }
}

#[inline(always)]
fn as_lits_mut(data: &mut [u32]) -> &mut [Lit] {
    // `Lit` is `repr(transparent)` over `u32`
    unsafe { slice::from_raw_parts_mut(data.as_mut_ptr() as *mut Lit, data.len()) }
}

/// Anything that can be considered as a list of literals.
pub trait ClauseIterable: fmt::Debug {
    type Item: Copy + Into<ELit>;
    fn items(&self) -> &[Self::Item];
}

/// Any iterable clause can be printed in DIMACS
impl<T: ClauseIterable> display::Print for T {
    // display as DIMACS
    fn fmt_dimacs(&self, out: &mut fmt::Formatter) -> fmt::Result {
        for &x in self.items().iter() {
            let lit: ELit = x.into();
            write!(out, "{} ", lit.to_dimacs())?;
        }
        write!(out, "0")?;
        Ok(())
    }
}

impl<'a> ClauseIterable for &'a [ELit] {
    type Item = ELit;
    fn items(&self) -> &[Self::Item] {
        self
    }
}

impl ClauseIterable for Vec<ELit> {
    type Item = ELit;
    fn items(self: &Vec<ELit>) -> &[Self::Item] {
        self
    }
}

#[derive(Debug)]
/// Main clause allocator. It stores every clause of a solver, original
/// and learned, in one growing buffer of words.
pub struct ClauseAllocator {
    ra: RegionAllocator<u32>,
}

impl Default for ClauseAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseAllocator {
    pub fn with_start_cap(start_cap: u32) -> Self {
        Self {
            ra: RegionAllocator::new(start_cap),
        }
    }
    pub fn new() -> Self {
        Self::with_start_cap(1024)
    }
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.ra.len()
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.ra.is_empty()
    }

    /// Reference one past the last clause.
    #[inline(always)]
    pub(crate) fn end(&self) -> CRef {
        CRef::from_offset(self.ra.len())
    }

    fn alloc_record(&mut self, aux: u32, flags: ClauseFlags, lits: &[Lit], extra: &[CRef]) -> CRef {
        let size = lits.len() as u32;
        let len = HEADER_WORDS + size + extra.len() as u32;
        let cr = self.ra.alloc(len);
        let data = self.ra.subslice_mut(cr, len);
        data[0] = aux;
        data[1] = size;
        data[2] = flags.bits();
        let (lit_words, extra_words) = data[HEADER_WORDS as usize..].split_at_mut(size as usize);
        for (w, lit) in lit_words.iter_mut().zip(lits) {
            *w = lit.idx();
        }
        for (w, r) in extra_words.iter_mut().zip(extra) {
            *w = r.offset();
        }
        cr
    }

    /// Append a clause given by the caller.
    pub(crate) fn alloc_original(&mut self, id: u32, lits: &[Lit]) -> CRef {
        self.alloc_record(id, ClauseFlags::empty(), lits, &[])
    }

    /// Append a derived clause together with the clauses it was resolved from.
    pub(crate) fn alloc_learned(&mut self, lits: &[Lit], antecedents: &[CRef]) -> CRef {
        self.alloc_record(
            antecedents.len() as u32,
            ClauseFlags::LEARNED,
            lits,
            antecedents,
        )
    }

    #[inline(always)]
    fn header(&self, cr: CRef) -> ClauseHeader {
        let data = self.ra.subslice(cr, HEADER_WORDS);
        ClauseHeader {
            aux: data[0],
            size: data[1],
            flags: ClauseFlags::from_bits_truncate(data[2]),
        }
    }

    /// Get a reference on the clause `cr` points to
    pub(crate) fn get_ref(&self, cr: CRef) -> ClauseRef<'_> {
        let header = self.header(cr);
        let lits = cr + HEADER_WORDS;
        ClauseRef {
            header,
            lits: as_lits(self.ra.subslice(lits, header.size)),
            antecedents: self.ra.subslice(lits + header.size, header.extra()),
        }
    }

    /// Mutable access to the literals of `cr`, used to move watches.
    pub(crate) fn lits_mut(&mut self, cr: CRef) -> &mut [Lit] {
        let size = self.ra[cr + 1];
        as_lits_mut(self.ra.subslice_mut(cr + HEADER_WORDS, size))
    }

    pub(crate) fn set_core(&mut self, cr: CRef, core: bool) {
        let mut flags = ClauseFlags::from_bits_truncate(self.ra[cr + 2]);
        flags.set(ClauseFlags::CORE, core);
        self.ra[cr + 2] = flags.bits();
    }

    /// Number of words used by the record at `cr`.
    #[inline(always)]
    pub(crate) fn record_len(&self, cr: CRef) -> u32 {
        let h = self.header(cr);
        HEADER_WORDS + h.size + h.extra()
    }

    /// Reference to the clause following `cr`.
    #[inline(always)]
    pub(crate) fn next(&self, cr: CRef) -> CRef {
        cr + self.record_len(cr)
    }

    /// Iterate over the clauses in `[start, end)`.
    pub(crate) fn iter_range(&self, start: CRef, end: CRef) -> impl Iterator<Item = CRef> + '_ {
        let mut cur = start;
        std::iter::from_fn(move || {
            if cur >= end {
                None
            } else {
                let cr = cur;
                cur = self.next(cr);
                Some(cr)
            }
        })
    }

    /// Move the record at `from` down to `to`, returning its length.
    pub(crate) fn move_record(&mut self, from: CRef, to: CRef) -> u32 {
        let len = self.record_len(from);
        if from != to {
            self.ra.copy_within(from, len, to);
        }
        len
    }

    /// Drop every clause at or after `end`.
    pub(crate) fn truncate(&mut self, end: CRef) {
        self.ra.truncate(end);
    }

    pub(crate) fn clear(&mut self) {
        self.ra.clear();
    }
}

/// Handle of a clause: the offset of its record in the `ClauseAllocator`.
pub type CRef = alloc::Ref<u32>;

/// Generic interface for objects printable in DIMACS
pub mod display {
    use std::fmt;

    /// Objects that can be printed in DIMACS syntax
    pub trait Print: Sized {
        fn fmt_dimacs(&self, out: &mut fmt::Formatter) -> fmt::Result;

        /// Any type implementing `T` can  be used in a format string by
        /// just using `x.pp_dimacs()` instead of `x`.
        ///
        /// ```
        /// use kitsat::*;
        /// let v: Vec<ELit> = vec![ELit::from_dimacs(1), ELit::from_dimacs(-2)];
        /// assert_eq!(format!("{}", v.pp_dimacs()), "1 -2 0");
        /// ```
        fn pp_dimacs(&self) -> PrintWrapper<'_, Self> {
            PrintWrapper(self)
        }
    }

    /// A wrapper that can be used to display objects in format strings
    pub struct PrintWrapper<'a, T: 'a + Print>(&'a T);

    // Whenever `T` is printable in DIMACS, its wrapper implements Display
    impl<'a, T: Print> fmt::Display for PrintWrapper<'a, T> {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            self.0.fmt_dimacs(out)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lit(i: i32) -> Lit {
        Lit::new(Var::from_idx(i.unsigned_abs() - 1), i > 0)
    }

    #[test]
    fn test_eq() {
        use super::lbool;
        for i in 0..4 {
            let a = lbool::from_u8(i);
            for j in 0..4 {
                let b = lbool::from_u8(j);
                let are_eq = (i == 0 && j == 0) || (i == 1 && j == 1) || (i >= 2 && j >= 2);
                assert_eq!(
                    are_eq,
                    a == b,
                    "{:?}[{}] == {:?}[{}] should be {}",
                    a,
                    i,
                    b,
                    j,
                    are_eq
                );
            }
        }
    }

    #[test]
    fn test_not() {
        assert_eq!(-lbool::TRUE, lbool::FALSE);
        assert_eq!(-lbool::FALSE, lbool::TRUE);
        assert_eq!(-lbool::UNDEF, lbool::UNDEF);
    }

    #[test]
    fn test_bitxor() {
        assert_eq!(lbool::TRUE ^ true, lbool::FALSE);
        assert_eq!(lbool::TRUE ^ false, lbool::TRUE);
        assert_eq!(lbool::FALSE ^ true, lbool::TRUE);
        assert_eq!(lbool::UNDEF ^ true, lbool::UNDEF);
    }

    #[test]
    fn test_to_i8() {
        assert_eq!(lbool::TRUE.to_i8(), 1);
        assert_eq!(lbool::FALSE.to_i8(), -1);
        assert_eq!(lbool::UNDEF.to_i8(), 0);
        assert_eq!(lbool::default(), lbool::UNDEF);
    }

    #[test]
    fn test_lit_encoding() {
        let v = Var::from_idx(3);
        let p = Lit::new(v, true);
        assert_eq!(p.idx(), 6);
        assert_eq!((!p).idx(), 7);
        assert!(p.sign());
        assert!(!(!p).sign());
        assert_eq!((!p).var(), v);
        assert_eq!(p ^ true, !p);
        assert_eq!(format!("{:?}", !p), "-4");
    }

    #[test]
    fn test_elit_dimacs() {
        assert_eq!(ELit::from_dimacs(1).raw(), 0);
        assert_eq!(ELit::from_dimacs(-1).raw(), 1);
        assert_eq!(ELit::from_dimacs(7).raw(), 12);
        assert_eq!(ELit::new(13).to_dimacs(), -7);
        assert_eq!(ELit::from(i32::MIN).raw(), u32::MAX);
    }

    #[test]
    #[should_panic(expected = "literal 0")]
    fn test_elit_zero() {
        ELit::from_dimacs(0);
    }

    #[test]
    fn test_clause_records() {
        let mut ca = ClauseAllocator::with_start_cap(4);
        let c1 = ca.alloc_original(42, &[lit(1), lit(-2), lit(3)]);
        let c2 = ca.alloc_learned(&[lit(-1)], &[c1]);
        let c3 = ca.alloc_original(7, &[]);
        assert_eq!(ca.next(c1), c2);
        assert_eq!(ca.next(c2), c3);
        assert_eq!(ca.next(c3), ca.end());

        let c = ca.get_ref(c1);
        assert_eq!(c.id(), 42);
        assert_eq!(c.size(), 3);
        assert_eq!(c.lits(), &[lit(1), lit(-2), lit(3)]);
        assert!(!c.learned());
        assert_eq!(c.antecedents().count(), 0);

        let c = ca.get_ref(c2);
        assert!(c.learned());
        assert_eq!(c.flags(), ClauseFlags::LEARNED);
        assert_eq!(c.antecedents().collect::<Vec<_>>(), vec![c1]);

        ca.lits_mut(c1).swap(0, 2);
        assert_eq!(ca.get_ref(c1).lits()[0], lit(3));

        ca.set_core(c2, true);
        assert!(ca.get_ref(c2).core());
        assert!(ca.get_ref(c2).learned());
        ca.set_core(c2, false);
        assert!(!ca.get_ref(c2).core());

        let all: Vec<_> = ca.iter_range(CRef::default(), ca.end()).collect();
        assert_eq!(all, vec![c1, c2, c3]);
    }

    #[test]
    fn test_move_record() {
        let mut ca = ClauseAllocator::new();
        let c1 = ca.alloc_original(1, &[lit(1), lit(2)]);
        let c2 = ca.alloc_original(2, &[lit(-1), lit(3)]);
        let len = ca.move_record(c2, c1);
        ca.truncate(c1 + len);
        assert_eq!(ca.get_ref(c1).id(), 2);
        assert_eq!(ca.get_ref(c1).lits(), &[lit(-1), lit(3)]);
        assert_eq!(ca.next(c1), ca.end());
    }
}
