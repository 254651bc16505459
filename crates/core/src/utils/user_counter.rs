use std::{
    fmt::Debug,
    marker::PhantomData,
    ops::Deref,
    ptr::NonNull,
    sync::atomic::{self, AtomicUsize, Ordering},
};

// guards against overflowing the counter through leaked handles
const MAX_USERS: usize = isize::MAX as usize;

pub(crate) struct Counted<T: ?Sized> {
    users: AtomicUsize,
    value: T,
}

impl<T> Counted<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            users: AtomicUsize::new(1),
            value,
        }
    }
}

/// Shared handle with an intrusive atomic user count.
///
/// Every handle represents one user. Cloning is `user_add`, dropping is
/// `user_remove`. The value is destroyed by whichever `user_remove`
/// takes the count from one to zero.
pub struct UserCounter<T: ?Sized> {
    ptr: NonNull<Counted<T>>,
    _phantom: PhantomData<Counted<T>>,
}

unsafe impl<T: ?Sized + Send + Sync> Send for UserCounter<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for UserCounter<T> {}

impl<T> UserCounter<T> {
    pub fn new(value: T) -> Self {
        Self::from_counted(Box::new(Counted::new(value)))
    }
}

impl<T: ?Sized> UserCounter<T> {
    // unsized handles are created by coercing the box before handing it in
    pub(crate) fn from_counted(counted: Box<Counted<T>>) -> Self {
        Self {
            ptr: NonNull::from(Box::leak(counted)),
            _phantom: PhantomData,
        }
    }

    fn counted(&self) -> &Counted<T> {
        // SAFETY: we hold a user, so the allocation is alive
        unsafe { self.ptr.as_ref() }
    }

    pub fn users(this: &Self) -> usize {
        this.counted().users.load(Ordering::Acquire)
    }

    pub fn ptr_eq(lhs: &Self, rhs: &Self) -> bool {
        std::ptr::addr_eq(lhs.ptr.as_ptr(), rhs.ptr.as_ptr())
    }

    fn user_add(&self) {
        let prev = self.counted().users.fetch_add(1, Ordering::Relaxed);
        if prev > MAX_USERS {
            std::process::abort();
        }
    }

    fn user_remove(&mut self) {
        // the value of the single decrement decides destruction,
        // so concurrent removals can never both observe zero
        let prev = self.counted().users.fetch_sub(1, Ordering::Release);
        assert!(prev != 0, "user count underflow");
        if prev != 1 {
            return;
        }
        atomic::fence(Ordering::Acquire);
        // SAFETY: we were the last user, nobody else can observe the value
        drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
    }
}

impl<T: ?Sized> Clone for UserCounter<T> {
    fn clone(&self) -> Self {
        self.user_add();
        Self {
            ptr: self.ptr,
            _phantom: PhantomData,
        }
    }
}

impl<T: ?Sized> Drop for UserCounter<T> {
    fn drop(&mut self) {
        self.user_remove();
    }
}

impl<T: ?Sized> Deref for UserCounter<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.counted().value
    }
}

impl<T: ?Sized> AsRef<T> for UserCounter<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T: ?Sized + Debug> Debug for UserCounter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&**self, f)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::UserCounter;

    struct DropCount(Arc<AtomicUsize>);

    impl Drop for DropCount {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn destroyed_once_after_last_user() {
        let drops = Arc::new(AtomicUsize::new(0));
        let first = UserCounter::new(DropCount(drops.clone()));
        let others = (0..4).map(|_| first.clone()).collect::<Vec<_>>();
        assert_eq!(UserCounter::users(&first), 5);
        drop(first);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert_eq!(UserCounter::users(&others[0]), 4);
        drop(others);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_add_remove() {
        let drops = Arc::new(AtomicUsize::new(0));
        let shared = UserCounter::new(DropCount(drops.clone()));
        std::thread::scope(|s| {
            for _ in 0..8 {
                let handle = shared.clone();
                s.spawn(move || {
                    for _ in 0..1000 {
                        let extra = handle.clone();
                        drop(extra);
                    }
                });
            }
        });
        assert_eq!(UserCounter::users(&shared), 1);
        drop(shared);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ptr_eq() {
        let a = UserCounter::new(1);
        let b = a.clone();
        let c = UserCounter::new(1);
        assert!(UserCounter::ptr_eq(&a, &b));
        assert!(!UserCounter::ptr_eq(&a, &c));
    }
}
