//! Runs a pipeline off the caller's thread.
//!
//! A UI hands a request to [`spawn_job`] and drains the receiver on its own
//! thread; the pipeline never knows who is listening.

use std::{
    path::PathBuf,
    sync::{mpsc::Sender, Arc},
    thread::{self, JoinHandle},
};

use crate::{
    core::pipeline::Pipeline,
    error::TransposeError,
    io::progress::Progress,
    types::TransformRequest,
};

#[derive(Debug)]
pub enum JobEvent {
    Progress(Progress),
    Finished(PathBuf),
    Failed(TransposeError),
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress(_))
    }
}

/// Starts one job on a new thread. Exactly one terminal event is sent last.
pub fn spawn_job(
    pipeline: Arc<Pipeline>,
    request: TransformRequest,
    events: Sender<JobEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let sink = |p: Progress| {
            let _ = events.send(JobEvent::Progress(p));
        };
        let terminal = match pipeline.run(&request, &sink) {
            Ok(path) => JobEvent::Finished(path),
            Err(e) => JobEvent::Failed(e),
        };
        let _ = events.send(terminal);
    })
}
