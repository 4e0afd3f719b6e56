use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The error type an `Observer` may fail with.
pub type ObserverErr = Box<dyn Error + Send + Sync>;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, TrainErr>;

/// The trainer's error type.
#[derive(Debug)]
pub enum TrainErr {
    /// A shape invariant was violated (e.g. input features vs. the model's input size).
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A batch was built without rows.
    EmptyBatch,
    /// An epoch ran over zero batches, so its average loss is undefined.
    EmptyDataset { epoch: usize },
    /// The observer failed, its error is kept as the source.
    Observer(ObserverErr),
    InvalidConfig(String),
    Io(io::Error),
    Json(serde_json::Error),
}

impl Display for TrainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(f, "shape mismatch for {what}: got {got}, expected {expected}"),
            TrainErr::EmptyBatch => write!(f, "a batch must have at least one row"),
            TrainErr::EmptyDataset { epoch } => {
                write!(f, "epoch {epoch} ran over an empty dataset, its average loss is undefined")
            }
            TrainErr::Observer(e) => write!(f, "observer failed: {e}"),
            TrainErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            TrainErr::Io(e) => write!(f, "io error: {e}"),
            TrainErr::Json(e) => write!(f, "invalid JSON: {e}"),
        }
    }
}

impl Error for TrainErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainErr::Observer(e) => Some(&**e),
            TrainErr::Io(e) => Some(e),
            TrainErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TrainErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for TrainErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
