//! Native replacements for the browser's `Worker` and animation-frame
//! callback.
//!
//! The teacher's `workers::worker_pool::WorkerPool` drives a pool of
//! `web_sys::Worker` objects through postMessage; this module gives the
//! scheduler the same two capabilities — submit work, get notified when
//! it's done, and a steady tick — backed by `std::thread` instead, so the
//! scheduler itself stays platform-agnostic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

type Job<R> = Box<dyn FnOnce() -> R + Send>;
type ResultCallback<R> = Arc<Mutex<Option<Box<dyn Fn(R) + Send>>>>;

/// One OS-thread worker that runs submitted jobs to completion in
/// submission order and reports each result through a registered
/// callback.
///
/// Dropping (or calling [`ComputeWorker::terminate`]) detaches the
/// underlying thread rather than joining it: a worker may be in the
/// middle of a tile that legitimately takes minutes at deep zoom, and the
/// coordinator must not block waiting for it. This is what "terminate and
/// recreate" means for native threads — the old thread is abandoned, not
/// killed, and simply has nothing left to report to once its channel and
/// callback are gone.
pub struct ComputeWorker<R: Send + 'static> {
    sender: mpsc::Sender<Job<R>>,
    callback: ResultCallback<R>,
    handle: Option<thread::JoinHandle<()>>,
}

impl<R: Send + 'static> ComputeWorker<R> {
    pub fn spawn() -> Self {
        let callback: ResultCallback<R> = Arc::new(Mutex::new(None));
        let worker_callback = Arc::clone(&callback);
        let (sender, receiver) = mpsc::channel::<Job<R>>();

        let handle = thread::spawn(move || {
            for job in receiver {
                let result = job();
                if let Some(cb) = worker_callback.lock().unwrap().as_ref() {
                    cb(result);
                }
            }
        });

        Self {
            sender,
            callback,
            handle: Some(handle),
        }
    }

    /// Register the callback invoked (on this worker's thread) after each
    /// submitted job completes. Replaces any previously registered
    /// callback.
    pub fn on_result(&self, callback: impl Fn(R) + Send + 'static) {
        *self.callback.lock().unwrap() = Some(Box::new(callback));
    }

    /// Enqueue a job. Jobs run in submission order; this never blocks on
    /// the job's own execution.
    pub fn submit(&self, job: Job<R>) {
        let _ = self.sender.send(job);
    }

    /// Detach this worker. Any job currently running finishes in the
    /// background with no observer; queued-but-unstarted jobs are
    /// dropped unrun once the channel closes.
    pub fn terminate(self) {
        let start = Instant::now();
        drop(self.sender);
        if let Some(handle) = self.handle {
            drop(handle);
        }
        log::debug!(
            target: "fractalwonder_engine::pool",
            "worker terminated in {:?}",
            start.elapsed(),
        );
    }
}

/// A steady ~60 Hz tick, the native analogue of `requestAnimationFrame`.
/// Used to drive the interaction preview loop independently of the tile
/// render pipeline.
pub struct FrameTicker {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FrameTicker {
    pub fn start(mut on_tick: impl FnMut() + Send + 'static) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let frame_duration = Duration::from_secs_f64(1.0 / 60.0);
            while !stop_flag.load(Ordering::Relaxed) {
                let tick_start = Instant::now();
                on_tick();
                let elapsed = tick_start.elapsed();
                if elapsed < frame_duration {
                    thread::sleep(frame_duration - elapsed);
                }
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop ticking and join the ticker thread. Unlike `ComputeWorker`,
    /// the ticker's own work is never long-running, so joining here is
    /// safe and bounded.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    #[test]
    fn submitted_job_reports_its_result() {
        let worker: ComputeWorker<i32> = ComputeWorker::spawn();
        let (tx, rx) = channel();
        worker.on_result(move |r| {
            let _ = tx.send(r);
        });
        worker.submit(Box::new(|| 42));
        let result = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(result, 42);
        worker.terminate();
    }

    #[test]
    fn jobs_run_in_submission_order() {
        let worker: ComputeWorker<i32> = ComputeWorker::spawn();
        let (tx, rx) = channel();
        worker.on_result(move |r| {
            let _ = tx.send(r);
        });
        for i in 0..5 {
            worker.submit(Box::new(move || i));
        }
        let results: Vec<i32> = (0..5)
            .map(|_| rx.recv_timeout(Duration::from_secs(1)).unwrap())
            .collect();
        assert_eq!(results, vec![0, 1, 2, 3, 4]);
        worker.terminate();
    }

    #[test]
    fn terminate_does_not_block_on_a_running_job() {
        let worker: ComputeWorker<i32> = ComputeWorker::spawn();
        worker.submit(Box::new(|| {
            thread::sleep(Duration::from_millis(200));
            1
        }));
        thread::sleep(Duration::from_millis(10));
        let start = Instant::now();
        worker.terminate();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn ticker_invokes_callback_multiple_times() {
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        let ticker = FrameTicker::start(move || {
            *counter.lock().unwrap() += 1;
        });
        thread::sleep(Duration::from_millis(100));
        ticker.stop();
        assert!(*count.lock().unwrap() >= 3);
    }
}
