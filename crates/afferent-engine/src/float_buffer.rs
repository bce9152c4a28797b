//! Fixed-capacity float staging buffer.
//!
//! Hosts with copy-on-write arrays pay an O(n) copy per element update. A
//! `FloatBuffer` lives on the native side instead: the host mutates it in
//! place each frame and the renderer uploads straight from its backing
//! storage (the zero-copy draw paths).

use crate::error::{AfferentError, Result};

/// A zero-initialized `f32` array whose capacity never changes.
pub struct FloatBuffer {
    data: Box<[f32]>,
}

impl FloatBuffer {
    /// Allocates `capacity` zeroed floats.
    ///
    /// Allocation failure is reported instead of aborting the process.
    pub fn new(capacity: usize) -> Result<Self> {
        let mut data: Vec<f32> = Vec::new();
        data.try_reserve_exact(capacity).map_err(|e| {
            AfferentError::Buffer(format!("float buffer of {capacity} floats: {e}"))
        })?;
        data.resize(capacity, 0.0);

        Ok(Self {
            data: data.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Writes one float. Panics when `index >= capacity`.
    #[inline]
    pub fn set(&mut self, index: usize, value: f32) {
        self.data[index] = value;
    }

    /// Reads one float. Panics when `index >= capacity`.
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.data[index]
    }

    /// Writes one float without a bounds check.
    ///
    /// # Safety
    /// `index < self.capacity()` must hold.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, index: usize, value: f32) {
        debug_assert!(index < self.data.len());
        // SAFETY: upheld by the caller.
        unsafe { *self.data.get_unchecked_mut(index) = value };
    }

    /// Reads one float without a bounds check.
    ///
    /// # Safety
    /// `index < self.capacity()` must hold.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> f32 {
        debug_assert!(index < self.data.len());
        // SAFETY: upheld by the caller.
        unsafe { *self.data.get_unchecked(index) }
    }

    /// Writes `N` consecutive floats starting at `index`.
    ///
    /// One call per instance record instead of one per component.
    #[inline]
    pub fn set_vec<const N: usize>(&mut self, index: usize, values: [f32; N]) {
        self.data[index..index + N].copy_from_slice(&values);
    }

    /// Unchecked form of [`set_vec`](Self::set_vec).
    ///
    /// # Safety
    /// `index + N <= self.capacity()` must hold.
    #[inline]
    pub unsafe fn set_vec_unchecked<const N: usize>(&mut self, index: usize, values: [f32; N]) {
        debug_assert!(index + N <= self.data.len());
        // SAFETY: the destination range is in bounds per the caller's contract
        // and cannot overlap a stack array.
        unsafe {
            std::ptr::copy_nonoverlapping(
                values.as_ptr(),
                self.data.as_mut_ptr().add(index),
                N,
            );
        }
    }

    /// Backing storage; the pointer is stable for the buffer's lifetime.
    #[inline]
    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Raw bytes of the whole buffer, as uploaded by the zero-copy paths.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

impl std::fmt::Debug for FloatBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloatBuffer")
            .field("capacity", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_zeroed() {
        let buf = FloatBuffer::new(16).unwrap();
        assert_eq!(buf.capacity(), 16);
        assert!(buf.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_capacity_is_allowed() {
        let buf = FloatBuffer::new(0).unwrap();
        assert_eq!(buf.capacity(), 0);
        assert!(buf.as_bytes().is_empty());
    }

    #[test]
    fn set_get_round_trips_every_index() {
        let mut buf = FloatBuffer::new(64).unwrap();
        for i in 0..64 {
            buf.set(i, i as f32 * 0.5 - 3.25);
        }
        for i in 0..64 {
            assert_eq!(buf.get(i), i as f32 * 0.5 - 3.25);
        }
    }

    #[test]
    fn unchecked_access_matches_checked() {
        let mut buf = FloatBuffer::new(4).unwrap();
        unsafe {
            buf.set_unchecked(3, f32::MAX);
            assert_eq!(buf.get_unchecked(3), f32::MAX);
        }
        assert_eq!(buf.get(3), f32::MAX);
    }

    #[test]
    fn set_vec_writes_consecutive_floats() {
        let mut buf = FloatBuffer::new(10).unwrap();
        buf.set_vec(5, [1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(&buf.as_slice()[..5], &[0.0; 5]);
        assert_eq!(&buf.as_slice()[5..], &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn mutable_slice_writes_reach_the_byte_view() {
        let mut buf = FloatBuffer::new(8).unwrap();
        for record in buf.as_mut_slice().chunks_exact_mut(4) {
            record.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        }
        assert_eq!(buf.get(6), 3.0);
        assert_eq!(&buf.as_bytes()[..4], &1.0f32.to_ne_bytes());
    }

    #[test]
    #[should_panic]
    fn checked_set_panics_out_of_bounds() {
        let mut buf = FloatBuffer::new(2).unwrap();
        buf.set(2, 1.0);
    }

    #[test]
    fn sprite_records_read_back_in_order() {
        // 8 sprites x 5 floats: x, y, rotation, half size, alpha.
        let mut buf = FloatBuffer::new(40).unwrap();
        for i in 0..8 {
            let f = i as f32;
            unsafe { buf.set_vec_unchecked(i * 5, [f * 10.0, f * 20.0, f * 0.1, 16.0, 1.0]) };
        }

        let data = unsafe { std::slice::from_raw_parts(buf.as_ptr(), buf.capacity()) };
        for i in 0..8 {
            let f = i as f32;
            assert_eq!(&data[i * 5..i * 5 + 5], &[f * 10.0, f * 20.0, f * 0.1, 16.0, 1.0]);
        }
        assert_eq!(buf.as_bytes().len(), 40 * 4);
    }
}
