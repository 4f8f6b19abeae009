/// Controller-owned lifecycle state.
///
/// Mutated only through [`super::PipelineRuntime::start`] and
/// [`super::PipelineRuntime::stop`]:
/// Created →(start)→ Playing →(stop)→ Paused →(stop continues)→ Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Created,
    Playing,
    Paused,
    Stopped,
}
