//! The interface between solvers and whatever owns the blocks.

use crate::error::SolverError;

/// An ordered set of blocks sharing a coupling state.
///
/// The coupling state is the flattened vector of every value produced by the
/// blocks. Evaluating a block reads the current state and overwrites the part
/// of it the block produces.
pub trait BlockSystem {
    type Error: From<SolverError>;

    fn block_count(&self) -> usize;

    /// Evaluate one block in place.
    fn evaluate_block(&mut self, index: usize) -> Result<(), Self::Error>;

    /// Current coupling state.
    fn state(&self) -> Vec<f64>;

    /// Overwrite the coupling state (same length as `state()`).
    fn set_state(&mut self, x: &[f64]) -> Result<(), Self::Error>;

    /// Human-readable name of state element `index`.
    fn state_label(&self, index: usize) -> String;

    /// Evaluate every block once, in order.
    fn evaluate_all(&mut self) -> Result<(), Self::Error> {
        for i in 0..self.block_count() {
            self.evaluate_block(i)?;
        }
        Ok(())
    }
}
