//! Read-only hand-off of the attribute buffers to a renderer.

/// Which attribute buffers changed since the renderer last uploaded them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    pub positions: bool,
    pub colors: bool,
    pub sizes: bool,
    pub opacities: bool,
}

impl DirtyFlags {
    pub const ALL: Self = Self {
        positions: true,
        colors: true,
        sizes: true,
        opacities: true,
    };

    pub fn any(&self) -> bool {
        self.positions || self.colors || self.sizes || self.opacities
    }

    pub fn mark_all(&mut self) {
        *self = Self::ALL;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Borrowed view of the simulation buffers between ticks.
///
/// `positions` and `colors` hold three floats per slot; the other slices hold
/// one entry per slot. Inactive slots keep zeroed attributes.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub positions: &'a [f32],
    pub colors: &'a [f32],
    pub sizes: &'a [f32],
    pub opacities: &'a [f32],
    pub active: &'a [bool],
    pub dirty: DirtyFlags,
    pub active_count: usize,
    pub frame: u64,
}

impl<'a> FrameView<'a> {
    pub fn capacity(&self) -> usize {
        self.active.len()
    }

    pub fn active_slots(&self) -> impl Iterator<Item = usize> + 'a {
        let active = self.active;
        (0..active.len()).filter(move |&slot| active[slot])
    }

    pub fn position(&self, slot: usize) -> [f32; 3] {
        let p = &self.positions[slot * 3..slot * 3 + 3];
        [p[0], p[1], p[2]]
    }

    pub fn color(&self, slot: usize) -> [f32; 3] {
        let c = &self.colors[slot * 3..slot * 3 + 3];
        [c[0], c[1], c[2]]
    }
}

/// The rendering side of the swarm. Implementations copy what they need out of
/// the view; they never get mutable access to simulation state.
pub trait RenderBridge {
    fn upload(&mut self, view: &FrameView<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_flags() {
        let mut flags = DirtyFlags::default();
        assert!(!flags.any());
        flags.mark_all();
        assert_eq!(flags, DirtyFlags::ALL);
        flags.clear();
        assert!(!flags.any());
    }

    #[test]
    fn test_active_slots() {
        let positions = [1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 4.0, 5.0, 6.0];
        let active = [true, false, true];
        let view = FrameView {
            positions: &positions,
            colors: &positions,
            sizes: &[1.0, 0.0, 1.0],
            opacities: &[1.0, 0.0, 1.0],
            active: &active,
            dirty: DirtyFlags::ALL,
            active_count: 2,
            frame: 0,
        };
        assert_eq!(view.active_slots().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(view.position(2), [4.0, 5.0, 6.0]);
        assert_eq!(view.capacity(), 3);
    }
}
