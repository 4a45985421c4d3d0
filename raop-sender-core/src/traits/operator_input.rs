use std::time::Duration;

/// Answer at the "proceed without receivers" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    Proceed,
    Abort,
}

/// Operator commands, as seen by the controller.
pub trait OperatorInput {
    /// Block until the operator either proceeds or aborts.
    fn acknowledge(&mut self) -> Acknowledgement;

    /// Wait at most `wait` for a quit request.
    ///
    /// Returns `true` once the operator asked to quit (or input was closed).
    fn quit_requested(&mut self, wait: Duration) -> bool;
}
