//! Reference-counted audio processing context shared across engine instances.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Pool holding at most one live context
///
/// The context is created on the first `acquire` and destroyed when the last
/// `Rc` returned by `acquire` is dropped. Clones share the same slot.
pub struct SharedContext<C> {
    slot: Rc<RefCell<Weak<C>>>,
}

impl<C> Clone for SharedContext<C> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<C> Default for SharedContext<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SharedContext<C> {
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(Weak::new())),
        }
    }

    /// Return the live context, or build a new one with `make`
    pub fn acquire<E>(&self, make: impl FnOnce() -> Result<C, E>) -> Result<Rc<C>, E> {
        if let Some(context) = self.slot.borrow().upgrade() {
            return Ok(context);
        }

        let context = Rc::new(make()?);
        *self.slot.borrow_mut() = Rc::downgrade(&context);
        Ok(context)
    }

    /// Whether some owner still holds the context
    pub fn is_live(&self) -> bool {
        self.slot.borrow().strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_once_while_held() {
        let pool: SharedContext<u32> = SharedContext::new();
        let mut created = 0;

        let first = pool
            .acquire(|| {
                created += 1;
                Ok::<_, ()>(1)
            })
            .unwrap();
        let second = pool
            .acquire(|| {
                created += 1;
                Ok::<_, ()>(2)
            })
            .unwrap();

        assert_eq!(created, 1);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_destroyed_with_last_owner() {
        let pool: SharedContext<u32> = SharedContext::new();
        let shared = pool.clone();

        let first = pool.acquire(|| Ok::<_, ()>(1)).unwrap();
        let second = shared.acquire(|| Ok::<_, ()>(2)).unwrap();
        drop(first);
        assert!(pool.is_live());
        drop(second);
        assert!(!pool.is_live());

        let fresh = pool.acquire(|| Ok::<_, ()>(3)).unwrap();
        assert_eq!(*fresh, 3);
    }

    #[test]
    fn test_failed_creation_leaves_pool_empty() {
        let pool: SharedContext<u32> = SharedContext::new();
        assert_eq!(pool.acquire(|| Err("no device")), Err("no device"));
        assert!(!pool.is_live());
    }
}
