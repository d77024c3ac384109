//! # Owned Buffer
//!
//! Fixed-length buffer that is reallocated, never grown in place.

/// An owned, exactly-sized buffer with an explicit allocation lifecycle.
///
/// The buffer is either *unallocated* or holds exactly `len` elements.
/// Changing the required length discards the old storage and allocates a
/// fresh default-filled one (copy-discard-reallocate); keeping the same
/// length keeps the storage and its contents.
///
/// Disposal is idempotent: disposing twice, or disposing a buffer that was
/// never allocated, is a silent no-op.
///
/// # Example
///
/// ```rust
/// use sylva_core::OwnedBuffer;
///
/// let mut near: OwnedBuffer<u32> = OwnedBuffer::new();
/// assert!(!near.is_allocated());
///
/// near.ensure_capacity(4);
/// near.as_mut_slice()[0] = 7;
/// assert_eq!(near.len(), 4);
///
/// near.dispose();
/// near.dispose();
/// assert!(!near.is_allocated());
/// ```
#[derive(Debug, Clone)]
pub struct OwnedBuffer<T> {
    /// Backing storage. `None` until first allocated and after disposal.
    storage: Option<Box<[T]>>,
}

impl<T> OwnedBuffer<T> {
    /// Creates an unallocated buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { storage: None }
    }

    /// Creates an allocated buffer that takes ownership of `values`.
    #[must_use]
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            storage: Some(values.into_boxed_slice()),
        }
    }

    /// Returns true if storage is currently allocated.
    #[inline]
    #[must_use]
    pub const fn is_allocated(&self) -> bool {
        self.storage.is_some()
    }

    /// Returns the element count (0 when unallocated).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.as_ref().map_or(0, |s| s.len())
    }

    /// Returns true if the buffer holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read access to the elements. Empty when unallocated.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_deref().unwrap_or(&[])
    }

    /// Write access to the elements. Empty when unallocated.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.storage.as_deref_mut().unwrap_or(&mut [])
    }

    /// Releases the storage.
    ///
    /// Safe to call any number of times.
    pub fn dispose(&mut self) {
        self.storage = None;
    }
}

impl<T: Default> OwnedBuffer<T> {
    /// Makes the buffer hold exactly `len` elements.
    ///
    /// Existing storage of the same length is kept untouched. Otherwise the
    /// old storage is released and a default-filled one allocated.
    ///
    /// Returns true if a reallocation happened.
    pub fn ensure_capacity(&mut self, len: usize) -> bool {
        match &self.storage {
            Some(storage) if storage.len() == len => false,
            _ => {
                self.reallocate(len);
                true
            }
        }
    }

    /// Fills every element with its default value.
    pub fn reset(&mut self) {
        for slot in self.as_mut_slice() {
            *slot = T::default();
        }
    }

    fn reallocate(&mut self, len: usize) {
        self.dispose();
        let storage: Vec<T> = (0..len).map(|_| T::default()).collect();
        self.storage = Some(storage.into_boxed_slice());
    }
}

impl<T> Default for OwnedBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_capacity_reallocates_on_change() {
        let mut buffer: OwnedBuffer<u32> = OwnedBuffer::new();

        assert!(buffer.ensure_capacity(3));
        buffer.as_mut_slice()[1] = 9;

        // Same length: storage kept
        assert!(!buffer.ensure_capacity(3));
        assert_eq!(buffer.as_slice()[1], 9);

        // New length: fresh default storage
        assert!(buffer.ensure_capacity(5));
        assert_eq!(buffer.as_slice(), &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_length_is_allocated() {
        let mut buffer: OwnedBuffer<f32> = OwnedBuffer::new();
        buffer.ensure_capacity(0);

        assert!(buffer.is_allocated());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut never: OwnedBuffer<u8> = OwnedBuffer::new();
        never.dispose();
        never.dispose();
        assert!(!never.is_allocated());

        let mut buffer = OwnedBuffer::from_vec(vec![1u8, 2, 3]);
        buffer.dispose();
        buffer.dispose();
        assert!(!buffer.is_allocated());
        assert!(buffer.as_slice().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut buffer = OwnedBuffer::from_vec(vec![4u16, 5]);
        buffer.reset();
        assert_eq!(buffer.as_slice(), &[0, 0]);
    }
}
