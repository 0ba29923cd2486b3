//! Sequential worker harness for stateful sources.

use std::sync::mpsc;
use std::thread;

use crate::error::MercatorError;

type Job<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// A single-consumer work queue backed by a dedicated thread.
///
/// The worker owns the state of a source exclusively: the state is constructed on the worker
/// thread and is only ever touched by jobs running there, one at a time in submission order.
/// This serialization is what lets sources keep mutable state (such as open archive handles)
/// without any internal locking.
///
/// Dropping the worker closes the queue; already queued jobs are drained before the thread
/// exits.
pub(crate) struct SourceWorker<S> {
    sender: Option<mpsc::Sender<Job<S>>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl<S: 'static> SourceWorker<S> {
    /// Spawns a worker thread with the given name. The state is built by `init` on the worker
    /// thread itself, so it does not need to be `Send`.
    pub(crate) fn spawn<F>(name: &str, init: F) -> Self
    where
        F: FnOnce() -> S + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<Job<S>>();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut state = init();
                while let Ok(job) = receiver.recv() {
                    job(&mut state);
                }
            });

        let thread = match thread {
            Ok(thread) => Some(thread),
            Err(error) => {
                log::error!("Failed to spawn worker thread {name}: {error}");
                None
            }
        };

        Self {
            sender: Some(sender),
            thread,
        }
    }

    /// Enqueues a job for the worker.
    ///
    /// Returns an error when the worker is no longer running; callers are expected to turn this
    /// into an immediate error response rather than panicking.
    pub(crate) fn submit<F>(&self, job: F) -> Result<(), MercatorError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return Err(MercatorError::Other("worker terminated".to_string()));
        };
        sender
            .send(Box::new(job))
            .map_err(|_| MercatorError::Other("worker terminated".to_string()))
    }
}

impl<S> Drop for SourceWorker<S> {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn jobs_run_in_submission_order() {
        let worker = SourceWorker::spawn("order-test", Vec::<u32>::new);
        for value in 0..8 {
            worker
                .submit(move |state| state.push(value))
                .expect("worker is running");
        }

        let (sender, receiver) = mpsc::channel();
        worker
            .submit(move |state| {
                sender.send(state.clone()).ok();
            })
            .expect("worker is running");

        assert_eq!(
            receiver.recv().expect("worker reports its state"),
            (0..8).collect::<Vec<_>>()
        );
    }

    #[test]
    fn state_is_built_on_the_worker_thread() {
        let (sender, receiver) = mpsc::channel();
        let worker = SourceWorker::spawn("init-test", move || {
            sender
                .send(thread::current().name().map(str::to_string))
                .ok();
            0u32
        });

        assert_eq!(
            receiver.recv().expect("init runs"),
            Some("init-test".to_string())
        );
        drop(worker);
    }

    #[test]
    fn queued_jobs_are_drained_on_drop() {
        let (sender, receiver) = mpsc::channel();
        let worker = SourceWorker::spawn("drain-test", || ());
        for value in 0..4 {
            let sender = sender.clone();
            worker
                .submit(move |_| {
                    sender.send(value).ok();
                })
                .expect("worker is running");
        }
        drop(worker);

        let drained: Vec<u32> = receiver.try_iter().collect();
        assert_eq!(drained, vec![0, 1, 2, 3]);
    }
}
