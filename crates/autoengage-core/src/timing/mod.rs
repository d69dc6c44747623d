//! Human timing model.
//!
//! Every delay in the engine goes through a [`Clock`] and every coin flip
//! through a [`RandomSource`], so tests can run the full flow instantly and
//! deterministically.

mod clock;
mod pacer;
mod random;

pub use clock::{Clock, SystemClock};
pub use pacer::HumanPacer;
pub use random::{RandomSource, ThreadRandom};
