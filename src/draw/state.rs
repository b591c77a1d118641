#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceLifecycle {
    Uninitialized,
    Loading,
    Ready,
}

impl SurfaceLifecycle {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

pub fn can_transition(from: SurfaceLifecycle, to: SurfaceLifecycle) -> bool {
    matches!(
        (from, to),
        (SurfaceLifecycle::Uninitialized, SurfaceLifecycle::Loading)
            | (SurfaceLifecycle::Loading, SurfaceLifecycle::Ready)
            | (SurfaceLifecycle::Ready, SurfaceLifecycle::Loading)
    ) || from == to
}
