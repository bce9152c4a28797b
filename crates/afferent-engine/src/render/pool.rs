//! Frame-scoped recycling of GPU buffers.
//!
//! Draw calls need fresh vertex/index/uniform storage every frame, and a
//! buffer written by one draw must not be overwritten by a later draw in the
//! same frame (writes land at submit time). The pool hands out buffers marked
//! in-use until [`BufferPool::reset_frame`] runs between frames.

use std::collections::HashMap;

use crate::config::PoolConfig;

/// What a pooled buffer is used for. Each kind has its own slot budget.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    TextVertex,
    TextIndex,
    Uniform,
}

impl BufferKind {
    pub const ALL: [BufferKind; 5] = [
        BufferKind::Vertex,
        BufferKind::Index,
        BufferKind::TextVertex,
        BufferKind::TextIndex,
        BufferKind::Uniform,
    ];

    fn label(self) -> &'static str {
        match self {
            BufferKind::Vertex => "afferent pooled vertex buffer",
            BufferKind::Index => "afferent pooled index buffer",
            BufferKind::TextVertex => "afferent pooled text vertex buffer",
            BufferKind::TextIndex => "afferent pooled text index buffer",
            BufferKind::Uniform => "afferent pooled uniform buffer",
        }
    }
}

/// Creates the backing storage for pooled buffers.
pub trait BufferAllocator {
    type Buffer: Clone;

    fn allocate(&mut self, kind: BufferKind, size: u64) -> Self::Buffer;

    /// Largest buffer the backend can create, in bytes.
    fn max_size(&self) -> u64 {
        u64::MAX
    }
}

/// Allocates real wgpu buffers.
pub struct WgpuAllocator {
    device: wgpu::Device,
}

impl WgpuAllocator {
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }
}

impl BufferAllocator for WgpuAllocator {
    type Buffer = wgpu::Buffer;

    fn allocate(&mut self, kind: BufferKind, size: u64) -> wgpu::Buffer {
        let usage = match kind {
            BufferKind::Vertex | BufferKind::TextVertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index | BufferKind::TextIndex => wgpu::BufferUsages::INDEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
        };
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(kind.label()),
            size: size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn max_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }
}

/// Counters for pool behaviour, cumulative since creation.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct PoolStats {
    /// Pooled slots created.
    pub allocations: u64,
    /// Free slots of a too-small class replaced by a larger allocation.
    pub replacements: u64,
    /// Acquisitions satisfied by an existing free slot.
    pub reuses: u64,
    /// One-off allocations outside the pool.
    pub overflows: u64,
}

struct PooledBuffer<B> {
    buffer: B,
    capacity: u64,
    in_use: bool,
}

/// A capacity-bounded arena of buffers keyed by `(kind, size class)`.
///
/// Size classes are powers of two, so a free slot in the request's class
/// always fits. When a kind has used its whole slot budget, a free slot of a
/// smaller class is replaced; with nothing free the request overflows into
/// an unpooled buffer that is dropped at the next frame boundary.
pub struct BufferPool<A: BufferAllocator> {
    allocator: A,
    config: PoolConfig,
    buckets: HashMap<(BufferKind, u64), Vec<PooledBuffer<A::Buffer>>>,
    slot_counts: HashMap<BufferKind, usize>,
    overflow: Vec<A::Buffer>,
    stats: PoolStats,
}

impl<A: BufferAllocator> BufferPool<A> {
    pub fn new(allocator: A, config: PoolConfig) -> Self {
        Self {
            allocator,
            config,
            buckets: HashMap::new(),
            slot_counts: HashMap::new(),
            overflow: Vec::new(),
            stats: PoolStats::default(),
        }
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Pooled slots currently held for `kind`.
    pub fn slot_count(&self, kind: BufferKind) -> usize {
        self.slot_counts.get(&kind).copied().unwrap_or(0)
    }

    /// Unpooled buffers held until the next frame boundary.
    #[inline]
    pub fn overflow_count(&self) -> usize {
        self.overflow.len()
    }

    fn size_class(&self, required: u64) -> u64 {
        required.max(self.config.min_buffer_size).next_power_of_two()
    }

    /// Returns a buffer of at least `required` bytes, unused this frame.
    ///
    /// `None` when `required` exceeds what the backend can allocate.
    pub fn acquire(&mut self, kind: BufferKind, required: u64) -> Option<A::Buffer> {
        let limit = self.allocator.max_size();
        if required > limit {
            log::warn!("{kind:?} buffer of {required} bytes exceeds the device limit of {limit}");
            return None;
        }

        let class = self.size_class(required);
        if class > self.config.max_buffer_size || class > limit {
            return Some(self.acquire_overflow(kind, required, "above the pooled size limit"));
        }

        let bucket = self.buckets.entry((kind, class)).or_default();
        if let Some(slot) = bucket.iter_mut().find(|s| !s.in_use) {
            slot.in_use = true;
            self.stats.reuses += 1;
            return Some(slot.buffer.clone());
        }

        let count = self.slot_counts.entry(kind).or_insert(0);
        if *count < self.config.max_slots {
            *count += 1;
            self.stats.allocations += 1;
            return Some(self.insert_slot(kind, class));
        }

        if self.evict_free_slot(kind, class) {
            self.stats.replacements += 1;
            return Some(self.insert_slot(kind, class));
        }

        Some(self.acquire_overflow(kind, required, "pool exhausted"))
    }

    /// Clears every in-use flag and drops overflow buffers.
    ///
    /// Called exactly once between frames. Pooled slots are never freed.
    pub fn reset_frame(&mut self) {
        for slot in self.buckets.values_mut().flatten() {
            slot.in_use = false;
        }
        if !self.overflow.is_empty() {
            log::debug!("releasing {} overflow buffers", self.overflow.len());
            self.overflow.clear();
        }
    }

    fn insert_slot(&mut self, kind: BufferKind, class: u64) -> A::Buffer {
        let buffer = self.allocator.allocate(kind, class);
        self.buckets
            .entry((kind, class))
            .or_default()
            .push(PooledBuffer {
                buffer: buffer.clone(),
                capacity: class,
                in_use: true,
            });
        buffer
    }

    /// Removes one free slot of `kind` whose capacity is below `class`.
    fn evict_free_slot(&mut self, kind: BufferKind, class: u64) -> bool {
        for ((k, _), bucket) in self.buckets.iter_mut() {
            if *k != kind {
                continue;
            }
            if let Some(pos) = bucket.iter().position(|s| !s.in_use && s.capacity < class) {
                bucket.swap_remove(pos);
                return true;
            }
        }
        false
    }

    fn acquire_overflow(&mut self, kind: BufferKind, required: u64, why: &str) -> A::Buffer {
        log::debug!("{kind:?} buffer of {required} bytes allocated unpooled ({why})");
        self.stats.overflows += 1;
        let buffer = self.allocator.allocate(kind, required.max(4));
        self.overflow.push(buffer.clone());
        buffer
    }
}

/// Fixed-size ring of reusable per-draw records.
///
/// Records are handed out in order and all become free again at
/// [`WrapperRing::reset`]. When the ring is exhausted `acquire` hands the
/// value back and the caller keeps it as an unpooled record.
pub struct WrapperRing<T> {
    slots: Vec<T>,
    capacity: usize,
    used: usize,
}

impl<T> WrapperRing<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            used: 0,
        }
    }

    /// Stores `value` in the next free record and returns it.
    pub fn acquire(&mut self, value: T) -> Result<&mut T, T> {
        if self.used >= self.capacity {
            return Err(value);
        }
        let idx = self.used;
        self.used += 1;
        if idx < self.slots.len() {
            self.slots[idx] = value;
        } else {
            self.slots.push(value);
        }
        Ok(&mut self.slots[idx])
    }

    /// Records handed out this frame.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.used
    }

    /// Records ever created; never exceeds the ring capacity.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out numbered fake buffers and remembers every allocation.
    struct CountingAllocator {
        sizes: Vec<(BufferKind, u64)>,
        limit: u64,
    }

    impl Default for CountingAllocator {
        fn default() -> Self {
            Self {
                sizes: Vec::new(),
                limit: u64::MAX,
            }
        }
    }

    impl BufferAllocator for CountingAllocator {
        type Buffer = usize;

        fn allocate(&mut self, kind: BufferKind, size: u64) -> usize {
            self.sizes.push((kind, size));
            self.sizes.len() - 1
        }

        fn max_size(&self) -> u64 {
            self.limit
        }
    }

    fn pool(max_slots: usize) -> BufferPool<CountingAllocator> {
        pool_with_limit(max_slots, u64::MAX)
    }

    fn pool_with_limit(max_slots: usize, limit: u64) -> BufferPool<CountingAllocator> {
        BufferPool::new(
            CountingAllocator {
                limit,
                ..CountingAllocator::default()
            },
            PoolConfig {
                max_slots,
                max_buffer_size: 4096,
                min_buffer_size: 256,
                wrapper_slots: 4,
            },
        )
    }

    // ── acquire ───────────────────────────────────────────────────────────

    #[test]
    fn sizes_round_up_to_power_of_two_classes() {
        let mut p = pool(8);
        p.acquire(BufferKind::Vertex, 10);
        p.acquire(BufferKind::Vertex, 300);
        p.acquire(BufferKind::Vertex, 1024);
        let sizes: Vec<u64> = p.allocator.sizes.iter().map(|s| s.1).collect();
        assert_eq!(sizes, vec![256, 512, 1024]);
    }

    #[test]
    fn in_use_buffers_are_not_handed_out_twice() {
        let mut p = pool(8);
        let a = p.acquire(BufferKind::Vertex, 100).unwrap();
        let b = p.acquire(BufferKind::Vertex, 100).unwrap();
        assert_ne!(a, b);
        assert_eq!(p.stats().allocations, 2);
    }

    #[test]
    fn reset_frame_makes_slots_reusable() {
        let mut p = pool(8);
        let a = p.acquire(BufferKind::Index, 100).unwrap();
        p.reset_frame();
        let b = p.acquire(BufferKind::Index, 200).unwrap();
        assert_eq!(a, b);
        assert_eq!(p.stats().reuses, 1);
        assert_eq!(p.allocator.sizes.len(), 1);
    }

    #[test]
    fn kinds_do_not_share_slots() {
        let mut p = pool(8);
        let v = p.acquire(BufferKind::Vertex, 100).unwrap();
        p.reset_frame();
        let t = p.acquire(BufferKind::TextVertex, 100).unwrap();
        assert_ne!(v, t);
        assert_eq!(p.slot_count(BufferKind::Vertex), 1);
        assert_eq!(p.slot_count(BufferKind::TextVertex), 1);
    }

    #[test]
    fn exhausted_pool_overflows_and_stays_bounded() {
        let mut p = pool(2);
        for _ in 0..5 {
            p.acquire(BufferKind::Vertex, 100);
        }
        assert_eq!(p.slot_count(BufferKind::Vertex), 2);
        assert_eq!(p.overflow_count(), 3);
        assert_eq!(p.stats().overflows, 3);

        p.reset_frame();
        assert_eq!(p.overflow_count(), 0);
        for _ in 0..2 {
            p.acquire(BufferKind::Vertex, 100);
        }
        assert_eq!(p.stats().reuses, 2);
        assert_eq!(p.slot_count(BufferKind::Vertex), 2);
    }

    #[test]
    fn overflow_allocates_exact_size() {
        let mut p = pool(1);
        p.acquire(BufferKind::Uniform, 16);
        p.acquire(BufferKind::Uniform, 48);
        assert_eq!(p.allocator.sizes.last(), Some(&(BufferKind::Uniform, 48)));
    }

    #[test]
    fn oversized_requests_bypass_the_pool() {
        let mut p = pool(8);
        p.acquire(BufferKind::Vertex, 5000);
        assert_eq!(p.slot_count(BufferKind::Vertex), 0);
        assert_eq!(p.overflow_count(), 1);
    }

    #[test]
    fn small_free_slot_is_replaced_when_budget_is_spent() {
        let mut p = pool(1);
        let small = p.acquire(BufferKind::Vertex, 100).unwrap();
        p.reset_frame();

        let big = p.acquire(BufferKind::Vertex, 2000).unwrap();
        assert_ne!(small, big);
        assert_eq!(p.stats().replacements, 1);
        assert_eq!(p.slot_count(BufferKind::Vertex), 1);
        assert_eq!(p.overflow_count(), 0);

        p.reset_frame();
        assert_eq!(p.acquire(BufferKind::Vertex, 2000), Some(big));
    }

    #[test]
    fn requests_above_the_device_limit_are_refused() {
        let mut p = pool_with_limit(8, 1000);
        assert_eq!(p.acquire(BufferKind::Vertex, 1001), None);
        assert!(p.allocator.sizes.is_empty());
        assert_eq!(p.overflow_count(), 0);
    }

    #[test]
    fn classes_above_the_device_limit_fall_back_to_exact_size() {
        let mut p = pool_with_limit(8, 1000);
        assert!(p.acquire(BufferKind::Vertex, 600).is_some());
        assert_eq!(p.slot_count(BufferKind::Vertex), 0);
        assert_eq!(p.allocator.sizes, vec![(BufferKind::Vertex, 600)]);
    }

    // ── wrapper ring ──────────────────────────────────────────────────────

    #[test]
    fn wrapper_ring_recycles_records() {
        let mut ring = WrapperRing::new(2);
        assert_eq!(ring.acquire(1).copied(), Ok(1));
        assert_eq!(ring.acquire(2).copied(), Ok(2));
        assert_eq!(ring.acquire(3).copied(), Err(3));
        assert_eq!(ring.in_use(), 2);

        ring.reset();
        assert_eq!(ring.acquire(7).copied(), Ok(7));
        assert_eq!(ring.allocated(), 2);
    }
}
