use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::driver::DriverError;
use crate::error::Error;

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// State whose context has to be current while it is used.
pub(crate) trait Current: Send + 'static {
    fn make_current(&mut self) -> Result<(), DriverError>;
    fn release_current(&mut self);
}

/// A dedicated worker thread owning `S`.
///
/// GPU contexts are bound to the thread that activates them, so the state
/// never leaves the worker. Callers hand in closures and block until the
/// worker replies; jobs run one at a time in submission order.
pub(crate) struct ContextThread<S> {
    jobs: Option<mpsc::Sender<Job<S>>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: Current> ContextThread<S> {
    /// Starts the worker and builds the state on it with `init`.
    ///
    /// Returns once `init` has finished. If it fails the worker exits and the
    /// error is returned here.
    pub(crate) fn spawn<F>(name: &str, init: F) -> Result<Self, Error>
    where
        F: FnOnce() -> Result<S, Error> + Send + 'static,
    {
        let (jobs, queue) = mpsc::channel::<Job<S>>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), Error>>(1);

        let worker = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let mut state = match init() {
                    Ok(state) => {
                        let _ = ready_tx.send(Ok(()));
                        state
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                for job in queue {
                    job(&mut state);
                }
            })
            .map_err(Error::Spawn)?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                jobs: Some(jobs),
                worker: Some(worker),
            }),
            Ok(Err(err)) => {
                let _ = worker.join();
                Err(err)
            }
            Err(_) => {
                let _ = worker.join();
                Err(Error::ContextThreadGone)
            }
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.jobs.is_some()
    }

    /// Runs `work` on the worker with the context current and waits for its
    /// result.
    pub(crate) fn run<R, F>(&self, work: F) -> Result<R, Error>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> Result<R, Error> + Send + 'static,
    {
        let jobs = self.jobs.as_ref().ok_or(Error::Released)?;
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let job: Job<S> = Box::new(move |state: &mut S| {
            let result = match state.make_current() {
                Ok(()) => {
                    let result = work(state);
                    state.release_current();
                    result
                }
                Err(err) => Err(Error::MakeCurrent(err)),
            };
            let _ = reply_tx.send(result);
        });
        jobs.send(job).map_err(|_| Error::ContextThreadGone)?;
        reply_rx.recv().map_err(|_| Error::ContextThreadGone)?
    }

    /// Runs `last` on the worker without touching the context, then stops the
    /// worker and waits for it to exit. Does nothing once stopped.
    pub(crate) fn finish<F>(&mut self, last: F)
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        let Some(jobs) = self.jobs.take() else {
            return;
        };
        if jobs.send(Box::new(last)).is_err() {
            tracing::warn!("context thread exited before shutdown");
        }
        drop(jobs);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("context thread panicked");
            }
        }
    }
}

impl<S> Drop for ContextThread<S> {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread::ThreadId;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        current: bool,
        log: Arc<Mutex<Vec<String>>>,
        fail_make_current: bool,
    }

    impl Current for Recorder {
        fn make_current(&mut self) -> Result<(), DriverError> {
            if self.fail_make_current {
                return Err("context lost".into());
            }
            self.current = true;
            self.log.lock().unwrap().push("make_current".into());
            Ok(())
        }

        fn release_current(&mut self) {
            self.current = false;
            self.log.lock().unwrap().push("release_current".into());
        }
    }

    #[test]
    fn work_runs_on_worker_with_context_current() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let state_log = log.clone();
        let worker = ContextThread::spawn("test-context", move || {
            Ok(Recorder {
                log: state_log,
                ..Default::default()
            })
        })
        .unwrap();

        let (worker_id, was_current) = worker
            .run(|state: &mut Recorder| Ok((thread::current().id(), state.current)))
            .unwrap();
        let second: ThreadId = worker.run(|_| Ok(thread::current().id())).unwrap();

        assert!(was_current);
        assert_ne!(worker_id, thread::current().id());
        assert_eq!(worker_id, second);
        assert_eq!(
            *log.lock().unwrap(),
            ["make_current", "release_current", "make_current", "release_current"]
        );
    }

    #[test]
    fn jobs_run_in_submission_order() {
        let worker = ContextThread::spawn("test-context", || Ok(Recorder::default())).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..16 {
            let order = order.clone();
            worker
                .run(move |_| {
                    order.lock().unwrap().push(i);
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(*order.lock().unwrap(), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn failed_activation_skips_work() {
        let worker = ContextThread::spawn("test-context", || {
            Ok(Recorder {
                fail_make_current: true,
                ..Default::default()
            })
        })
        .unwrap();
        let result = worker.run(|_| -> Result<(), Error> { panic!("must not run") });
        assert!(matches!(result, Err(Error::MakeCurrent(_))));
    }

    #[test]
    fn init_failure_is_returned() {
        let result = ContextThread::<Recorder>::spawn("test-context", || Err(Error::NoBackend));
        assert!(matches!(result, Err(Error::NoBackend)));
    }

    #[test]
    fn run_after_finish_reports_released() {
        let mut worker = ContextThread::spawn("test-context", || Ok(Recorder::default())).unwrap();
        worker.finish(|_| {});
        assert!(!worker.is_running());
        assert!(matches!(worker.run(|_| Ok(())), Err(Error::Released)));
        worker.finish(|_| unreachable!());
    }

    #[test]
    fn panicking_job_surfaces_as_gone_thread() {
        let worker = ContextThread::spawn("test-context", || Ok(Recorder::default())).unwrap();
        let result = worker.run(|_| -> Result<(), Error> { panic!("boom") });
        assert!(matches!(result, Err(Error::ContextThreadGone)));
        assert!(matches!(worker.run(|_| Ok(())), Err(Error::ContextThreadGone)));
    }
}
