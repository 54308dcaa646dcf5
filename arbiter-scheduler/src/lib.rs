//! Match scheduling: a priority-queue accelerator over the persistent match
//! table, and round generation guarded by the coordination substrate's
//! distributed lock (§4.1).

pub mod queue;
pub mod round;

pub use queue::Queue;
pub use round::RoundGenerator;
