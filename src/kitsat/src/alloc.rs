/*****************************************************************************************[alloc.rs]
Copyright (c) 2008-2010, Niklas Sorensson (MiniSat)
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

use std::cmp;
use std::fmt;
use std::marker::PhantomData;
use std::ops;

/// Append-only region of `T` values.
///
/// Values are addressed by `Ref<T>` offsets, which stay valid when the
/// backing buffer grows. Space is only given back by `truncate`, after the
/// owner compacted whatever it wants to keep with `copy_within`.
#[derive(Debug)]
pub struct RegionAllocator<T: Copy> {
    vec: Vec<T>,
}

impl<T: Copy> RegionAllocator<T> {
    pub fn new(start_cap: u32) -> Self {
        Self {
            vec: Vec::with_capacity(start_cap as usize),
        }
    }
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.vec.len() as u32
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Reserve `size` default values, returning a reference to the first one.
    ///
    /// Panics once the region cannot be addressed with 32 bits anymore.
    pub fn alloc(&mut self, size: u32) -> Ref<T>
    where
        T: Default,
    {
        let len = self.vec.len() as u64;
        if len + size as u64 >= Ref::<T>::UNDEF.0 as u64 {
            panic!("region allocator exhausted: cannot add {} words to {}", size, len);
        }
        let r = Ref(len as u32, PhantomData);
        self.vec.extend((0..size).map(|_| T::default()));
        r
    }
    #[inline(always)]
    pub fn subslice(&self, r: Ref<T>, len: u32) -> &[T] {
        &self.vec[r.0 as usize..r.0 as usize + len as usize]
    }
    #[inline(always)]
    pub fn subslice_mut(&mut self, r: Ref<T>, len: u32) -> &mut [T] {
        &mut self.vec[r.0 as usize..r.0 as usize + len as usize]
    }

    /// Move `len` values starting at `from` down to `to`.
    pub fn copy_within(&mut self, from: Ref<T>, len: u32, to: Ref<T>) {
        debug_assert!(to <= from);
        let start = from.0 as usize;
        self.vec.copy_within(start..start + len as usize, to.0 as usize);
    }

    /// Forget everything at and after `end`.
    pub fn truncate(&mut self, end: Ref<T>) {
        self.vec.truncate(end.0 as usize);
    }

    /// Forget everything, keep the buffer.
    pub fn clear(&mut self) {
        self.vec.clear();
    }
}

impl<T: Copy> ops::Index<Ref<T>> for RegionAllocator<T> {
    type Output = T;
    fn index(&self, index: Ref<T>) -> &Self::Output {
        &self.vec[index.0 as usize]
    }
}
impl<T: Copy> ops::IndexMut<Ref<T>> for RegionAllocator<T> {
    fn index_mut(&mut self, index: Ref<T>) -> &mut Self::Output {
        &mut self.vec[index.0 as usize]
    }
}

#[derive(Clone, Copy)]
#[repr(transparent)]
/// A reference to a `T` value living in the allocator.
///
/// The reference is invariant in `T`.
pub struct Ref<T: Copy>(u32, PhantomData<fn(T) -> T>);

impl<T: Copy> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if *self == Self::UNDEF {
            write!(f, "Ref(UNDEF)")
        } else {
            f.debug_tuple("Ref").field(&self.0).finish()
        }
    }
}
impl<T: Copy> PartialEq for Ref<T> {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0
    }
}
impl<T: Copy> Eq for Ref<T> {}
impl<T: Copy> PartialOrd for Ref<T> {
    fn partial_cmp(&self, rhs: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(rhs))
    }
}
impl<T: Copy> Ord for Ref<T> {
    #[inline(always)]
    fn cmp(&self, rhs: &Self) -> cmp::Ordering {
        Ord::cmp(&self.0, &rhs.0)
    }
}
impl<T: Copy> Default for Ref<T> {
    fn default() -> Self {
        Ref(0, PhantomData)
    }
}

impl<T: Copy> Ref<T> {
    pub const UNDEF: Self = Ref(!0, PhantomData);

    /// Offset of the referenced value inside its region.
    #[inline(always)]
    pub fn offset(&self) -> u32 {
        self.0
    }

    /// Rebuild a reference from an offset obtained with `offset`.
    #[inline(always)]
    pub fn from_offset(offset: u32) -> Self {
        Ref(offset, PhantomData)
    }
}

impl<T: Copy> ops::Add<u32> for Ref<T> {
    type Output = Ref<T>;
    fn add(self, rhs: u32) -> Self::Output {
        Ref(self.0 + rhs, PhantomData)
    }
}
