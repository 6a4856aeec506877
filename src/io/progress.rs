use std::sync::mpsc::Sender;

/// One progress checkpoint: a percentage and a human-readable message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub percent: u8,
    pub message: String,
}

impl Progress {
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
        }
    }
}

/// One-way sink for pipeline progress.
///
/// Implementors decide how to marshal events onto their own thread; the
/// pipeline calls `emit` synchronously from whatever thread runs it.
pub trait EventSink {
    fn emit(&self, progress: Progress);
}

impl<F> EventSink for F
where
    F: Fn(Progress),
{
    fn emit(&self, progress: Progress) {
        self(progress)
    }
}

impl EventSink for Sender<Progress> {
    fn emit(&self, progress: Progress) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send(progress);
    }
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _progress: Progress) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, sync::mpsc};

    #[test]
    fn closures_are_sinks() {
        let seen = RefCell::new(Vec::new());
        let sink = |p: Progress| seen.borrow_mut().push(p.percent);
        sink.emit(Progress::new(30, "Downloading"));
        sink.emit(Progress::new(250, "clamped"));
        assert_eq!(*seen.borrow(), vec![30, 100]);
    }

    #[test]
    fn sender_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        tx.emit(Progress::new(0, "start"));
        assert_eq!(rx.recv().unwrap().message, "start");
        drop(rx);
        tx.emit(Progress::new(100, "Completed!"));
    }
}
