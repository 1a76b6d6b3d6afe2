/// External inputs to the conference loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConferenceCommand {
    /// Local capture succeeded; start buffering the local track.
    LocalMediaReady,

    /// Local capture was refused or failed. Reported once, never retried.
    CaptureFailed { reason: String },

    /// Open a session as the offering side.
    Call,

    /// Ask the relay to let the operator choose a new save directory.
    PickSaveDir,

    Shutdown,
}
