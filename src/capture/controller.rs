//! Start/stop state machine driving timer-based capture ticks
//!
//! The UI calls [`CaptureLoop::tick`] on every repaint. A frame is pulled from
//! the source only when the loop is running, the previous tick has finished
//! and the tick interval has elapsed.

use std::convert::Infallible;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{CaptureError, Frame, FrameSource};

/// Lifecycle of a capture loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// Outcome of a single tick request
#[derive(Debug)]
pub enum Tick<T> {
    /// Loop is not running
    Inactive,
    /// Interval has not elapsed yet
    NotDue,
    /// A previous tick is still being processed
    Busy,
    /// A frame was acquired and processed
    Processed(T),
    /// The source failed; it has been released and the loop stopped
    Failed(CaptureError),
}

impl Tick<Infallible> {
    /// Re-type a tick that carries no output
    fn widen<T>(self) -> Tick<T> {
        match self {
            Tick::Inactive => Tick::Inactive,
            Tick::NotDue => Tick::NotDue,
            Tick::Busy => Tick::Busy,
            Tick::Failed(e) => Tick::Failed(e),
            Tick::Processed(never) => match never {},
        }
    }
}

/// Owns the frame source of one tool and schedules its ticks
pub struct CaptureLoop {
    state: CaptureState,
    source: Option<Box<dyn FrameSource>>,
    interval: Duration,
    next_due: Option<Instant>,
    processing: bool,
}

impl CaptureLoop {
    /// Create an idle loop ticking every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            state: CaptureState::Idle,
            source: None,
            interval,
            next_due: None,
            processing: false,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CaptureState::Running
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Description of the active source, if any
    pub fn source_name(&self) -> Option<String> {
        self.source.as_ref().map(|s| s.describe())
    }

    /// Open a source and start running.
    ///
    /// Starting a running loop is a no-op and does not call `open`. When `open`
    /// fails the state is left untouched.
    pub fn start<F>(&mut self, open: F) -> Result<(), CaptureError>
    where
        F: FnOnce() -> Result<Box<dyn FrameSource>, CaptureError>,
    {
        if self.is_running() {
            debug!("Capture already running");
            return Ok(());
        }

        let source = open()?;
        info!("Capture started on {}", source.describe());

        self.source = Some(source);
        self.state = CaptureState::Running;
        self.next_due = None;
        self.processing = false;
        Ok(())
    }

    /// Stop running and release the source.
    ///
    /// Returns `true` if this call released a source; stopping a loop that is
    /// not running does nothing.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }

        self.state = CaptureState::Stopped;
        self.processing = false;
        self.next_due = None;

        match self.source.take() {
            Some(mut source) => {
                source.release();
                info!("Capture stopped, {} released", source.describe());
                true
            }
            None => false,
        }
    }

    /// Time left until the next tick is due, `None` when not running
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if !self.is_running() {
            return None;
        }
        Some(
            self.next_due
                .map(|due| due.saturating_duration_since(now))
                .unwrap_or(Duration::ZERO),
        )
    }

    /// Acquire a frame if one is due and mark the tick in progress.
    ///
    /// Every `Ok` must be followed by [`CaptureLoop::finish_tick`].
    pub fn begin_tick(&mut self, now: Instant) -> Result<Frame, Tick<Infallible>> {
        if !self.is_running() {
            return Err(Tick::Inactive);
        }
        if self.processing {
            return Err(Tick::Busy);
        }
        if self.next_due.is_some_and(|due| now < due) {
            return Err(Tick::NotDue);
        }

        let Some(source) = self.source.as_mut() else {
            return Err(Tick::Inactive);
        };

        match source.next_frame() {
            Ok(frame) => {
                self.processing = true;
                Ok(frame)
            }
            Err(e) => {
                warn!("Capture failed: {}", e);
                self.stop();
                Err(Tick::Failed(e))
            }
        }
    }

    /// Mark the current tick finished and schedule the next one
    pub fn finish_tick(&mut self, now: Instant) {
        self.processing = false;
        if self.is_running() {
            self.next_due = Some(now + self.interval);
        }
    }

    /// Run one full tick: acquire, process, reschedule
    pub fn tick<T>(&mut self, now: Instant, process: impl FnOnce(Frame) -> T) -> Tick<T> {
        let frame = match self.begin_tick(now) {
            Ok(frame) => frame,
            Err(skipped) => return skipped.widen(),
        };

        let output = process(frame);
        self.finish_tick(now);
        Tick::Processed(output)
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::Mat;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Source that counts releases and fails after `frames` reads
    struct CountingSource {
        frames: usize,
        releases: Rc<Cell<usize>>,
    }

    impl FrameSource for CountingSource {
        fn next_frame(&mut self) -> Result<Frame, CaptureError> {
            if self.frames == 0 {
                return Err(CaptureError::ReadFailed);
            }
            self.frames -= 1;
            Ok(Frame::new(Mat::default()))
        }

        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn running_loop(frames: usize) -> (CaptureLoop, Rc<Cell<usize>>) {
        let releases = Rc::new(Cell::new(0));
        let mut capture = CaptureLoop::new(Duration::from_millis(30));
        let counter = releases.clone();
        capture
            .start(move || {
                Ok(Box::new(CountingSource {
                    frames,
                    releases: counter,
                }) as Box<dyn FrameSource>)
            })
            .unwrap();
        (capture, releases)
    }

    #[test]
    fn test_initial_state() {
        let capture = CaptureLoop::new(Duration::from_millis(10));
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.source_name().is_none());
        assert!(capture.time_until_due(Instant::now()).is_none());
    }

    #[test]
    fn test_start_transitions_to_running() {
        let (capture, releases) = running_loop(5);
        assert_eq!(capture.state(), CaptureState::Running);
        assert_eq!(capture.source_name().as_deref(), Some("counting"));
        assert_eq!(releases.get(), 0);
    }

    #[test]
    fn test_failed_open_keeps_state() {
        let mut capture = CaptureLoop::new(Duration::from_millis(10));
        let result = capture.start(|| Err(CaptureError::CameraUnavailable(0)));

        assert!(matches!(result, Err(CaptureError::CameraUnavailable(0))));
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn test_start_while_running_does_not_reopen() {
        let (mut capture, _releases) = running_loop(5);
        let opened = Cell::new(false);
        capture
            .start(|| {
                opened.set(true);
                Err(CaptureError::CameraUnavailable(0))
            })
            .unwrap();

        assert!(!opened.get());
        assert!(capture.is_running());
    }

    #[test]
    fn test_stop_releases_exactly_once() {
        let (mut capture, releases) = running_loop(5);

        assert!(capture.stop());
        assert!(!capture.stop());
        assert!(!capture.stop());
        drop(capture);

        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_drop_releases_running_source() {
        let (capture, releases) = running_loop(5);
        drop(capture);
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_restart_after_stop() {
        let (mut capture, releases) = running_loop(5);
        capture.stop();
        assert_eq!(capture.state(), CaptureState::Stopped);

        let counter = releases.clone();
        capture
            .start(move || {
                Ok(Box::new(CountingSource {
                    frames: 1,
                    releases: counter,
                }) as Box<dyn FrameSource>)
            })
            .unwrap();
        assert!(capture.is_running());

        capture.stop();
        assert_eq!(releases.get(), 2);
    }

    #[test]
    fn test_tick_inactive_when_idle() {
        let mut capture = CaptureLoop::new(Duration::from_millis(10));
        assert!(matches!(capture.tick(Instant::now(), |_| ()), Tick::Inactive));
    }

    #[test]
    fn test_tick_respects_interval() {
        let (mut capture, _releases) = running_loop(5);
        let start = Instant::now();

        assert!(matches!(capture.tick(start, |_| 1), Tick::Processed(1)));
        assert!(matches!(
            capture.tick(start + Duration::from_millis(10), |_| 2),
            Tick::NotDue
        ));
        assert_eq!(
            capture.time_until_due(start + Duration::from_millis(10)),
            Some(Duration::from_millis(20))
        );
        assert!(matches!(
            capture.tick(start + Duration::from_millis(30), |_| 3),
            Tick::Processed(3)
        ));
    }

    #[test]
    fn test_begin_tick_guards_reentry() {
        let (mut capture, _releases) = running_loop(5);
        let now = Instant::now();

        assert!(capture.begin_tick(now).is_ok());
        assert!(matches!(capture.begin_tick(now), Err(Tick::Busy)));

        capture.finish_tick(now);
        assert!(matches!(capture.begin_tick(now), Err(Tick::NotDue)));
        assert!(capture.begin_tick(now + Duration::from_millis(30)).is_ok());
    }

    #[test]
    fn test_source_failure_halts_loop() {
        let (mut capture, releases) = running_loop(1);
        let start = Instant::now();

        assert!(matches!(capture.tick(start, |_| ()), Tick::Processed(())));
        let result = capture.tick(start + Duration::from_secs(1), |_| ());

        assert!(matches!(result, Tick::Failed(CaptureError::ReadFailed)));
        assert_eq!(capture.state(), CaptureState::Stopped);
        assert_eq!(releases.get(), 1);

        assert!(!capture.stop());
        assert!(matches!(
            capture.tick(start + Duration::from_secs(2), |_| ()),
            Tick::Inactive
        ));
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_stop_clears_processing_flag() {
        let (mut capture, _releases) = running_loop(5);
        let now = Instant::now();
        assert!(capture.begin_tick(now).is_ok());
        capture.stop();
        capture.finish_tick(now);

        assert!(capture.time_until_due(now).is_none());
    }
}
