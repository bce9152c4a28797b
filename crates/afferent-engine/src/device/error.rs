/// What the renderer should do after a surface acquisition failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next frame may succeed.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Device is out of memory; the host should tear the renderer down.
    Fatal,
}
