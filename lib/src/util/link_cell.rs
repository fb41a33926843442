use parking_lot::Mutex;
use std::fmt::{Debug, Error as FmtError, Formatter};

/// Set-once slot for values computed while linking
///
/// Linking may happen from several threads at once against the same class. Every lazily computed
/// binding follows the same discipline:
///
///   1. check under the lock whether a value is already committed
///   2. compute a candidate _without_ holding the lock (racing callers may all do this)
///   3. commit under the lock, but only if nobody else committed first
///
/// All callers observe the first committed value. The computation must therefore be pure, since
/// losing candidates are simply dropped.
pub struct LinkCell<T> {
    slot: Mutex<Option<T>>,
}

impl<T> LinkCell<T> {
    pub fn new() -> LinkCell<T> {
        LinkCell {
            slot: Mutex::new(None),
        }
    }
}

impl<T: Clone> LinkCell<T> {
    /// Committed value, if there is one
    pub fn get(&self) -> Option<T> {
        self.slot.lock().clone()
    }

    /// Commit a value unless one is already present, returning whichever value won
    pub fn commit(&self, candidate: T) -> T {
        let mut slot = self.slot.lock();
        match &*slot {
            Some(existing) => existing.clone(),
            None => {
                *slot = Some(candidate.clone());
                candidate
            }
        }
    }

    /// Return the committed value or compute (outside of the lock) and commit a candidate
    pub fn get_or_link(&self, compute: impl FnOnce() -> T) -> T {
        if let Some(existing) = self.get() {
            return existing;
        }
        let candidate = compute();
        self.commit(candidate)
    }
}

impl<T> Default for LinkCell<T> {
    fn default() -> Self {
        LinkCell::new()
    }
}

impl<T: Debug> Debug for LinkCell<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match &*self.slot.lock() {
            Some(value) => f.debug_tuple("Linked").field(value).finish(),
            None => f.write_str("Unlinked"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn first_commit_wins() {
        let cell = LinkCell::new();
        assert_eq!(cell.get(), None);
        assert_eq!(cell.commit(1), 1);
        assert_eq!(cell.commit(2), 1);
        assert_eq!(cell.get(), Some(1));
    }

    #[test]
    fn compute_skipped_once_linked() {
        let cell = LinkCell::new();
        cell.commit("a");
        assert_eq!(cell.get_or_link(|| panic!("should not recompute")), "a");
    }

    #[test]
    fn racing_commits_converge() {
        let cell: LinkCell<usize> = LinkCell::new();
        let computations = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|thread_idx| {
                    let cell = &cell;
                    let computations = &computations;
                    scope.spawn(move || {
                        cell.get_or_link(|| {
                            computations.fetch_add(1, Ordering::SeqCst);
                            thread_idx
                        })
                    })
                })
                .collect();

            let observed: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let winner = cell.get().unwrap();
            assert!(observed.iter().all(|value| *value == winner));
        });

        assert!(computations.load(Ordering::SeqCst) >= 1);
    }
}
