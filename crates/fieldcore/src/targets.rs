//! Surface extent and the ping/pong pair of simulation targets.
//!
//! The pair is two fixed slots plus a parity flag. [`TargetPair::split`] hands
//! out the previous slot shared and the current slot exclusively, so a pass
//! can never read and write the same target.

use tracing::{debug, warn};

/// Largest texture edge assumed when an allocator does not say otherwise.
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn texel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A resize as reported by the windowing layer: logical (device independent)
/// size plus the display scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeRequest {
    pub width: f32,
    pub height: f32,
    pub scale_factor: f32,
}

impl ResizeRequest {
    pub fn logical(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scale_factor: 1.0,
        }
    }

    pub fn with_scale(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }
}

/// Resolved sizes derived from a [`ResizeRequest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceExtent {
    /// Logical size, at least 1x1.
    pub logical: [f32; 2],
    /// Size of the simulation targets: logical scaled by the capped density.
    pub physical: SurfaceSize,
    /// Size of the presentable surface: logical scaled by the full density.
    pub window: SurfaceSize,
    pub density: f32,
}

impl SurfaceExtent {
    pub fn resolve(request: ResizeRequest, dpr_max: f32, max_dimension: u32) -> Self {
        let sanitize = |v: f32| if v.is_finite() { v.max(1.0) } else { 1.0 };
        let logical = [sanitize(request.width), sanitize(request.height)];
        let scale = if request.scale_factor.is_finite() && request.scale_factor > 0.0 {
            request.scale_factor
        } else {
            1.0
        };
        let cap = if dpr_max.is_finite() && dpr_max > 0.0 {
            dpr_max
        } else {
            1.0
        };
        let density = scale.min(cap);
        let max_dimension = max_dimension.max(1);
        let scaled = |factor: f32| {
            let width = (logical[0] * factor).round().max(1.0) as u32;
            let height = (logical[1] * factor).round().max(1.0) as u32;
            SurfaceSize::new(width.min(max_dimension), height.min(max_dimension))
        };
        let physical = scaled(density);
        let unclamped = (logical[0] * density).round() as u32;
        if unclamped > max_dimension || (logical[1] * density).round() as u32 > max_dimension {
            warn!(
                width = physical.width,
                height = physical.height,
                max_dimension,
                "field size clamped to device limit"
            );
        }
        Self {
            logical,
            physical,
            window: scaled(scale),
            density,
        }
    }

    /// Reciprocal of the physical target size.
    pub fn texel(&self) -> [f32; 2] {
        [
            1.0 / self.physical.width as f32,
            1.0 / self.physical.height as f32,
        ]
    }
}

/// Creates simulation targets. Implemented by each field kernel.
pub trait TargetAllocator {
    type Target;

    fn allocate(&mut self, slot: Slot, size: SurfaceSize) -> Self::Target;

    fn max_dimension(&self) -> u32 {
        DEFAULT_MAX_DIMENSION
    }
}

#[derive(Debug)]
pub struct TargetPair<T> {
    slots: [T; 2],
    current: Slot,
}

impl<T> TargetPair<T> {
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            current: Slot::A,
        }
    }

    pub fn current_slot(&self) -> Slot {
        self.current
    }

    pub fn previous_slot(&self) -> Slot {
        self.current.other()
    }

    pub fn get(&self, slot: Slot) -> &T {
        &self.slots[slot.index()]
    }

    pub fn current(&self) -> &T {
        self.get(self.current)
    }

    pub fn previous(&self) -> &T {
        self.get(self.previous_slot())
    }

    /// Borrows `(previous, current)` for one simulation pass.
    pub fn split(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        match self.current {
            Slot::A => (&*b, a),
            Slot::B => (&*a, b),
        }
    }

    pub fn swap(&mut self) {
        self.current = self.current.other();
    }

    fn replace(&mut self, a: T, b: T) {
        self.slots = [a, b];
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    Reallocated(SurfaceSize),
    Unchanged,
}

/// Owns the target pair and the extent it was allocated for.
#[derive(Debug)]
pub struct SurfaceTargets<T> {
    pair: TargetPair<T>,
    extent: SurfaceExtent,
    generation: u64,
}

impl<T> SurfaceTargets<T> {
    pub fn new<A>(request: ResizeRequest, dpr_max: f32, allocator: &mut A) -> Self
    where
        A: TargetAllocator<Target = T> + ?Sized,
    {
        let extent = SurfaceExtent::resolve(request, dpr_max, allocator.max_dimension());
        let a = allocator.allocate(Slot::A, extent.physical);
        let b = allocator.allocate(Slot::B, extent.physical);
        debug!(
            width = extent.physical.width,
            height = extent.physical.height,
            "allocated field targets"
        );
        Self {
            pair: TargetPair::new(a, b),
            extent,
            generation: 0,
        }
    }

    /// Reallocates both targets when the physical size changes. The role
    /// assignment is kept; repeated identical sizes are a no-op apart from
    /// refreshing the logical extent.
    pub fn resize<A>(&mut self, request: ResizeRequest, dpr_max: f32, allocator: &mut A) -> ResizeOutcome
    where
        A: TargetAllocator<Target = T> + ?Sized,
    {
        let extent = SurfaceExtent::resolve(request, dpr_max, allocator.max_dimension());
        let unchanged = extent.physical == self.extent.physical;
        self.extent = extent;
        if unchanged {
            return ResizeOutcome::Unchanged;
        }

        let a = allocator.allocate(Slot::A, extent.physical);
        let b = allocator.allocate(Slot::B, extent.physical);
        self.pair.replace(a, b);
        self.generation += 1;
        debug!(
            width = extent.physical.width,
            height = extent.physical.height,
            density = extent.density,
            generation = self.generation,
            "reallocated field targets"
        );
        ResizeOutcome::Reallocated(extent.physical)
    }

    pub fn extent(&self) -> &SurfaceExtent {
        &self.extent
    }

    pub fn size(&self) -> SurfaceSize {
        self.extent.physical
    }

    /// Incremented on every reallocation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pair(&self) -> &TargetPair<T> {
        &self.pair
    }

    pub fn pair_mut(&mut self) -> &mut TargetPair<T> {
        &mut self.pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        allocations: u32,
    }

    impl TargetAllocator for Counter {
        type Target = (u32, SurfaceSize);

        fn allocate(&mut self, _slot: Slot, size: SurfaceSize) -> Self::Target {
            self.allocations += 1;
            (self.allocations, size)
        }

        fn max_dimension(&self) -> u32 {
            4096
        }
    }

    #[test]
    fn degenerate_sizes_clamp_to_one() {
        let extent = SurfaceExtent::resolve(ResizeRequest::logical(0.0, -3.0), 2.0, 4096);
        assert_eq!(extent.physical, SurfaceSize::new(1, 1));
        let nan = SurfaceExtent::resolve(ResizeRequest::logical(f32::NAN, 10.0), 2.0, 4096);
        assert_eq!(nan.physical, SurfaceSize::new(1, 10));
    }

    #[test]
    fn density_is_capped() {
        let extent =
            SurfaceExtent::resolve(ResizeRequest::logical(800.0, 600.0).with_scale(3.0), 2.0, 8192);
        assert_eq!(extent.physical, SurfaceSize::new(1600, 1200));
        assert_eq!(extent.window, SurfaceSize::new(2400, 1800));
        assert_eq!(extent.density, 2.0);
    }

    #[test]
    fn device_limit_clamps_each_axis() {
        let extent =
            SurfaceExtent::resolve(ResizeRequest::logical(5000.0, 100.0).with_scale(1.0), 2.0, 4096);
        assert_eq!(extent.physical, SurfaceSize::new(4096, 100));
    }

    #[test]
    fn split_never_aliases() {
        let mut pair = TargetPair::new(1, 2);
        let (previous, current) = pair.split();
        assert_eq!((*previous, *current), (2, 1));
        pair.swap();
        let (previous, current) = pair.split();
        assert_eq!((*previous, *current), (1, 2));
        assert_ne!(pair.current_slot(), pair.previous_slot());
    }

    #[test]
    fn resize_keeps_roles_and_skips_identical_sizes() {
        let mut alloc = Counter::default();
        let mut targets = SurfaceTargets::new(ResizeRequest::logical(10.0, 10.0), 2.0, &mut alloc);
        targets.pair_mut().swap();
        assert_eq!(targets.pair().current_slot(), Slot::B);

        let outcome = targets.resize(ResizeRequest::logical(20.0, 10.0), 2.0, &mut alloc);
        assert_eq!(outcome, ResizeOutcome::Reallocated(SurfaceSize::new(20, 10)));
        assert_eq!(targets.pair().current_slot(), Slot::B);
        assert_eq!(targets.generation(), 1);
        assert_eq!(alloc.allocations, 4);

        let again = targets.resize(ResizeRequest::logical(20.0, 10.0), 2.0, &mut alloc);
        assert_eq!(again, ResizeOutcome::Unchanged);
        assert_eq!(alloc.allocations, 4);
        assert_eq!(targets.pair().current().0, 4);
    }
}
