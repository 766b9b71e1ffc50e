
use crate::core::Status;

/// Basic callbacks to the solver
///
/// The solver polls `stop` before every decision; answering `true` makes
/// the current `solve` return `Status::Unknown`, leaving the solver ready
/// for another call.
pub trait Callbacks {
    /// Called before starting to solve
    fn on_start(&mut self) {}

    /// Called when a result is computed
    fn on_result(&mut self, _s: Status) {}

    /// Should we stop? called regularly for asynchronous interrupts and such
    fn stop(&self) -> bool {
        false
    }
}

/// Basic set of callbacks
///
/// This doesn't do anything except storing a terminator function
pub struct Basic {
    stop: Option<Box<dyn Fn() -> bool>>, // to stop
}

impl Callbacks for Basic {
    fn stop(&self) -> bool {
        match self.stop {
            None => false,
            Some(ref f) => f(),
        }
    }
}

impl Basic {
    /// Allocate a new set of callbacks
    pub fn new() -> Self {
        Basic { stop: None }
    }

    /// Set the `stop` function
    pub fn set_stop<F>(&mut self, f: F)
    where
        F: 'static + Fn() -> bool,
    {
        self.stop = Some(Box::new(f));
    }

    /// Remove the `stop` function, if any
    pub fn clear_stop(&mut self) {
        self.stop = None;
    }
}

impl Default for Basic {
    fn default() -> Self {
        Basic::new()
    }
}
