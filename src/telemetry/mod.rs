mod matrix;
pub mod observer;
mod record;
mod snapshot;

pub use observer::{ChannelObserver, JsonLines, Observer, Recorder};
pub use record::{Record, RecordKind};
pub use snapshot::{BackwardSnapshot, ForwardSnapshot, Snapshot, WeightsSnapshot};
