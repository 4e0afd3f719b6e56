use std::io::{self, Write};

use tokio::sync::mpsc;

use super::Record;
use crate::error::ObserverErr;

/// The receiving end of the trainer's telemetry.
///
/// The trainer calls `observe` synchronously, in order, once per batch and once more at the
/// end of every epoch (see `RecordKind::EpochSummary` for what that last record carries). It
/// waits for the call to return before updating the model's parameters, so a record always
/// shows the parameters the batch's gradients were computed with.
///
/// Returning an error aborts the training.
pub trait Observer {
    fn observe(&mut self, record: Record) -> Result<(), ObserverErr>;
}

impl<O: Observer + ?Sized> Observer for Box<O> {
    fn observe(&mut self, record: Record) -> Result<(), ObserverErr> {
        (**self).observe(record)
    }
}

/// An `Observer` that calls a closure, see `from_fn`.
pub struct FromFn<F> {
    f: F,
}

/// Creates an `Observer` out of a closure.
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(Record) -> Result<(), ObserverErr>,
{
    FromFn { f }
}

impl<F> Observer for FromFn<F>
where
    F: FnMut(Record) -> Result<(), ObserverErr>,
{
    fn observe(&mut self, record: Record) -> Result<(), ObserverErr> {
        (self.f)(record)
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct Recorder {
    records: Vec<Record>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the records of a single epoch, in the order they were observed.
    pub fn epoch(&self, epoch: usize) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.epoch == epoch)
    }
}

impl Observer for Recorder {
    fn observe(&mut self, record: Record) -> Result<(), ObserverErr> {
        self.records.push(record);
        Ok(())
    }
}

/// Writes every record as a line of JSON.
pub struct JsonLines<W: Write> {
    writer: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Observer for JsonLines<W> {
    fn observe(&mut self, record: Record) -> Result<(), ObserverErr> {
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Forwards every record through a bounded channel.
///
/// `observe` blocks until the channel has room for the record, so a slow consumer slows the
/// training down instead of reordering or dropping records. Since it blocks, the trainer must
/// not run inside an async context, use `tokio::task::spawn_blocking` or a plain thread.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::Sender<Record>,
}

impl ChannelObserver {
    /// Creates a new `ChannelObserver` along with the receiving end of its channel.
    ///
    /// # Arguments
    /// * `capacity` - The amount of records that can be buffered, must be positive.
    ///
    /// # Returns
    /// The observer and the receiver.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Record>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl Observer for ChannelObserver {
    fn observe(&mut self, record: Record) -> Result<(), ObserverErr> {
        self.tx.blocking_send(record).map_err(|_| {
            io::Error::new(io::ErrorKind::BrokenPipe, "telemetry receiver was dropped").into()
        })
    }
}
