//! Sliding window (circular dictionary) for LZSS and DEFLATE history.
//!
//! The window holds exactly `N` slots. Writing always happens at the insert
//! cursor, which advances modulo `N`, so the oldest value is overwritten once
//! the window is full.
//!
//! Reads take a *logical* index that is reduced modulo `N`. Indices past the
//! end alias back into the buffer; LZSS back-references rely on this when a
//! match starts near the end of the window and runs past it.
//!
//! # Sizes
//!
//! - Arena LZSS: 4 KB (4096 slots)
//! - DEFLATE: 32 KB (32768 slots)

/// Common window capacities.
pub mod sizes {
    /// Window size of the Arena LZSS format (4 KB).
    pub const LZSS: usize = 4096;
    /// Window size for DEFLATE (32 KB).
    pub const DEFLATE: usize = 32768;
}

/// A fixed-capacity circular buffer of `N` values of type `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindow<T, const N: usize> {
    /// Backing slots, always `N` long.
    slots: Box<[T]>,
    /// Slot the next insert writes to.
    cursor: usize,
}

impl<T: Clone, const N: usize> SlidingWindow<T, N> {
    /// Create a window with every slot set to `fill` and the cursor at 0.
    pub fn new(fill: T) -> Self {
        Self::with_cursor(fill, 0)
    }

    /// Create a window with every slot set to `fill` and the cursor at
    /// `cursor % N`.
    pub fn with_cursor(fill: T, cursor: usize) -> Self {
        const { assert!(N > 0, "SlidingWindow capacity must be greater than 0") };

        Self {
            slots: vec![fill; N].into_boxed_slice(),
            cursor: cursor % N,
        }
    }

    /// Insert every value of `values` in order.
    pub fn insert_all(&mut self, values: &[T]) {
        for value in values {
            self.insert(value.clone());
        }
    }
}

impl<T, const N: usize> SlidingWindow<T, N> {
    /// Window capacity.
    pub const CAPACITY: usize = N;

    /// Get the capacity of the window.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Get the slot the next insert will overwrite.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Overwrite the slot at the cursor and advance the cursor.
    #[inline]
    pub fn insert(&mut self, value: T) {
        self.slots[self.cursor] = value;
        self.cursor = (self.cursor + 1) % N;
    }

    /// Read the value at physical slot `index % N`.
    ///
    /// Never fails: any index maps to a slot.
    #[inline]
    pub fn read_at(&self, index: usize) -> &T {
        &self.slots[Self::physical_index(index)]
    }

    /// Map a logical index to its physical slot.
    #[inline]
    pub fn physical_index(index: usize) -> usize {
        index % N
    }

    /// Physical slots in storage order.
    pub fn as_slice(&self) -> &[T] {
        &self.slots
    }
}

impl<T: Clone + Default, const N: usize> Default for SlidingWindow<T, N> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
