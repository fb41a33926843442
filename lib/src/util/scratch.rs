use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Pool of reusable vectors, meant to live in a `thread_local!`
///
/// Buffers are handed out as [`Scratch`] guards and are cleared and returned to the pool when
/// the guard drops, whichever way the borrowing scope exits.
pub struct ScratchPool<T> {
    free: RefCell<Vec<Vec<T>>>,
}

impl<T> ScratchPool<T> {
    pub const fn new() -> ScratchPool<T> {
        ScratchPool {
            free: RefCell::new(vec![]),
        }
    }

    /// Borrow an empty buffer with room for at least `capacity` elements
    pub fn take(&self, capacity: usize) -> Scratch<'_, T> {
        let mut buffer = self.free.borrow_mut().pop().unwrap_or_default();
        buffer.reserve(capacity);
        Scratch { pool: self, buffer }
    }

    /// Number of buffers currently sitting idle in the pool
    pub fn idle(&self) -> usize {
        self.free.borrow().len()
    }
}

/// Buffer borrowed from a [`ScratchPool`]
pub struct Scratch<'a, T> {
    pool: &'a ScratchPool<T>,
    buffer: Vec<T>,
}

impl<'a, T> Deref for Scratch<'a, T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.buffer
    }
}

impl<'a, T> DerefMut for Scratch<'a, T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.buffer
    }
}

impl<'a, T> Drop for Scratch<'a, T> {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        self.pool.free.borrow_mut().push(buffer);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn buffers_return_on_drop() {
        let pool: ScratchPool<u32> = ScratchPool::new();
        {
            let mut scratch = pool.take(16);
            scratch.push(1);
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 1);

        let scratch = pool.take(4);
        assert!(scratch.is_empty(), "returned buffer should be cleared");
        assert!(scratch.capacity() >= 16);
    }

    #[test]
    fn buffers_return_on_early_exit() {
        fn fails(pool: &ScratchPool<u8>) -> Result<(), ()> {
            let mut scratch = pool.take(8);
            scratch.push(0);
            Err(())?;
            Ok(())
        }

        let pool = ScratchPool::new();
        assert!(fails(&pool).is_err());
        assert_eq!(pool.idle(), 1);
    }
}
