pub mod arch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod optimization;
pub mod telemetry;
pub mod training;

pub use arch::Mlp;
pub use config::TrainingConfig;
pub use dataset::{Batch, Dataset};
pub use error::{ObserverErr, Result, TrainErr};
pub use training::{train, TrainReport, Trainer};
