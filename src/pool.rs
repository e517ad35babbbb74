//! Scratch-buffer reuse for the learner's cartesian walk.
//!
//! A top-level `learn` call allocates a handful of short-lived buffers
//! (an offset vector, a pattern-string scratch, a token-sequence
//! scratch) on every tuple it processes. Rather than let each tuple
//! allocate fresh, buffers are borrowed from a pool and handed back
//! explicitly before the call returns.

pub trait Clearable {
    fn clear_contents(&mut self);
}

impl Clearable for String {
    fn clear_contents(&mut self) {
        self.clear();
    }
}

impl<T> Clearable for Vec<T> {
    fn clear_contents(&mut self) {
        self.clear();
    }
}

pub struct Pool<T> {
    free: Vec<T>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Pool { free: Vec::new() }
    }
}

impl<T: Clearable + Default> Pool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a buffer out of the pool, or allocate a fresh one.
    pub fn take(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    /// Clear and return a buffer to the pool.
    pub fn give_back(&mut self, mut value: T) {
        value.clear_contents();
        self.free.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reused_buffer_is_cleared() {
        let mut pool: Pool<String> = Pool::new();
        let mut s = pool.take();
        s.push_str("leftover");
        pool.give_back(s);

        let s2 = pool.take();
        assert_eq!(s2, "");
    }

    #[test]
    fn empty_pool_allocates_fresh() {
        let mut pool: Pool<Vec<u8>> = Pool::new();
        let v = pool.take();
        assert!(v.is_empty());
    }
}
