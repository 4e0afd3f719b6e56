mod clock;
mod pacer;
mod trainer;

pub use clock::{Clock, SystemClock};
pub use pacer::{FixedDelay, NoDelay, Pacer};
pub use trainer::{train, TrainReport, Trainer};
