//! Variable ordering by recency.
//!
//! Variables form a doubly linked list stored in a `VMap`. The `last` end
//! holds the variables most recently involved in a conflict, and every
//! variable carries the value of a global counter taken when it was
//! (re)inserted, so stamps strictly increase from `first` to `last`.
//!
//! Decisions walk backwards from a `search` cursor. The cursor only ever
//! points at a variable such that every variable after it is assigned; it
//! moves back towards `first` while deciding, and jumps forward again when
//! a variable with a larger stamp is unassigned.

use crate::clause::{VMap, Var};

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: Var,
    next: Var,
    stamp: u64,
}

impl Default for Link {
    fn default() -> Self {
        Link {
            prev: Var::UNDEF,
            next: Var::UNDEF,
            stamp: 0,
        }
    }
}

#[derive(Debug)]
pub struct Queue {
    links: VMap<Link>,
    first: Var,
    last: Var,
    stamp: u64,
    search: Var,
}

impl Default for Queue {
    fn default() -> Self {
        Queue {
            links: VMap::new(),
            first: Var::UNDEF,
            last: Var::UNDEF,
            stamp: 0,
            search: Var::UNDEF,
        }
    }
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every variable.
    pub fn clear(&mut self) {
        self.links.clear();
        self.first = Var::UNDEF;
        self.last = Var::UNDEF;
        self.stamp = 0;
        self.search = Var::UNDEF;
    }

    /// Insert a fresh variable at the recent end and point `search` at it.
    pub fn insert_new(&mut self, v: Var) {
        self.links.reserve_default(v);
        self.enqueue(v);
        self.search = self.last;
    }

    #[inline]
    pub fn first(&self) -> Var {
        self.first
    }
    #[inline]
    pub fn last(&self) -> Var {
        self.last
    }
    #[inline]
    pub fn stamp(&self, v: Var) -> u64 {
        self.links[v].stamp
    }

    fn enqueue(&mut self, v: Var) {
        let last = self.last;
        {
            let l = &mut self.links[v];
            l.prev = last;
            l.next = Var::UNDEF;
            l.stamp = self.stamp;
        }
        self.stamp += 1;
        if last == Var::UNDEF {
            self.first = v;
        } else {
            debug_assert_eq!(self.links[last].next, Var::UNDEF);
            self.links[last].next = v;
        }
        self.last = v;
    }

    fn dequeue(&mut self, v: Var) {
        let Link { prev, next, .. } = self.links[v];
        if prev == Var::UNDEF {
            debug_assert_eq!(self.first, v);
            self.first = next;
        } else {
            self.links[prev].next = next;
        }
        if next == Var::UNDEF {
            debug_assert_eq!(self.last, v);
            self.last = prev;
        } else {
            self.links[next].prev = prev;
        }
    }

    /// Unlink `v` and put it back at the recent end with a fresh stamp.
    pub fn requeue(&mut self, v: Var) {
        self.dequeue(v);
        self.enqueue(v);
    }

    /// Bump `v`: make it the most recent variable.
    pub fn move_to_front(&mut self, v: Var) {
        if v != self.last {
            self.requeue(v);
        }
    }

    #[inline]
    pub fn search(&self) -> Var {
        self.search
    }

    /// Point the cursor at the most recent variable.
    pub fn reset_search(&mut self) {
        self.search = self.last;
    }

    /// `v` just became unassigned.
    #[inline]
    pub fn on_unassign(&mut self, v: Var) {
        let search = self.search;
        if search == Var::UNDEF || self.links[v].stamp > self.links[search].stamp {
            self.search = v;
        }
    }

    /// Most recent unassigned variable, starting the walk at `search`.
    ///
    /// There must be one.
    pub fn next_unassigned<F>(&mut self, is_assigned: F) -> Var
    where
        F: Fn(Var) -> bool,
    {
        let mut v = self.search;
        while is_assigned(v) {
            v = self.links[v].prev;
            debug_assert_ne!(v, Var::UNDEF, "no unassigned variable left");
        }
        self.search = v;
        v
    }

    /// Variables from oldest to most recent.
    pub fn iter(&self) -> impl Iterator<Item = Var> + '_ {
        let mut cur = self.first;
        std::iter::from_fn(move || {
            if cur == Var::UNDEF {
                None
            } else {
                let v = cur;
                cur = self.links[v].next;
                Some(v)
            }
        })
    }

    /// Check links and stamps, for debugging.
    pub fn check(&self) -> bool {
        let mut prev = Var::UNDEF;
        let mut n = 0;
        for v in self.iter() {
            let l = &self.links[v];
            if l.prev != prev {
                return false;
            }
            if prev != Var::UNDEF && self.links[prev].stamp >= l.stamp {
                return false;
            }
            prev = v;
            n += 1;
        }
        prev == self.last && n == self.links.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn var(i: u32) -> Var {
        Var::from_idx(i)
    }

    fn queue(n: u32) -> Queue {
        let mut q = Queue::new();
        for i in 0..n {
            q.insert_new(var(i));
        }
        q
    }

    #[test]
    fn test_insertion_order() {
        let q = queue(4);
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![var(0), var(1), var(2), var(3)]);
        assert_eq!(q.first(), var(0));
        assert_eq!(q.search(), var(3));
        assert!(q.check());
    }

    #[test]
    fn test_move_to_front() {
        let mut q = queue(4);
        q.move_to_front(var(1));
        q.move_to_front(var(0));
        q.move_to_front(var(0));
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![var(2), var(3), var(1), var(0)]);
        assert_eq!(q.last(), var(0));
        assert!(q.stamp(var(0)) > q.stamp(var(1)));
        assert!(q.check());
    }

    #[test]
    fn test_search_cursor() {
        let mut q = queue(4);
        let assigned = [true, false, true, true];
        let v = q.next_unassigned(|v| assigned[v.idx() as usize]);
        assert_eq!(v, var(1));
        assert_eq!(q.search(), var(1));
        // unassigning an older variable leaves the cursor alone
        q.on_unassign(var(0));
        assert_eq!(q.search(), var(1));
        q.on_unassign(var(3));
        assert_eq!(q.search(), var(3));
        q.reset_search();
        assert_eq!(q.search(), var(3));
    }

    #[test]
    fn test_clear() {
        let mut q = queue(3);
        q.clear();
        assert_eq!(q.iter().count(), 0);
        q.insert_new(var(0));
        assert_eq!(q.first(), var(0));
        assert!(q.check());
    }
}
