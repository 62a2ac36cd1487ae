//! Edge auto-scrolling while a drag pointer sits near a container edge.

use crate::ticker::{FRAME_PERIOD, TICKS_PER_SECOND, TickFlow, TickLoop};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A scrollable container owned by the host.
///
/// Called from the scroll loop's worker thread.
pub trait ScrollTarget: Send + Sync {
    /// Advance the scroll offset by `delta` pixels (negative scrolls back).
    fn scroll_by(&self, delta: f64);
}

/// Scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Scroll speed for a pointer `distance_from_edge` pixels inside an edge
/// zone of width `max_distance`.
///
/// Zero outside the zone; inside, `max_speed * t²` where `t` grows from 0 at
/// the inner border of the zone to 1 at the edge itself.
pub fn calculate_scroll_speed(distance_from_edge: f64, max_distance: f64, max_speed: f64) -> f64 {
    if max_distance <= 0.0 || !(0.0..max_distance).contains(&distance_from_edge) {
        return 0.0;
    }
    let t = (1.0 - distance_from_edge / max_distance).clamp(0.0, 1.0);
    max_speed * t * t
}

/// Pixels moved by one tick at `speed` px/s.
fn scroll_step(speed: f64) -> f64 {
    speed / TICKS_PER_SECOND
}

/// One running per-axis loop. Speed is shared with the worker so it can be
/// adjusted without restarting.
struct ScrollLoop {
    target: Arc<dyn ScrollTarget>,
    speed: Arc<AtomicU64>,
    ticker: TickLoop,
}

impl ScrollLoop {
    fn start(axis: Axis, target: Arc<dyn ScrollTarget>, speed: f64) -> Self {
        let shared_speed = Arc::new(AtomicU64::new(speed.to_bits()));
        let worker_speed = shared_speed.clone();
        let worker_target = target.clone();
        let name = match axis {
            Axis::Vertical => "vscroll",
            Axis::Horizontal => "hscroll",
        };
        let ticker = TickLoop::spawn(name, FRAME_PERIOD, move || {
            let speed = f64::from_bits(worker_speed.load(Ordering::Relaxed));
            worker_target.scroll_by(scroll_step(speed));
            TickFlow::Continue
        });
        Self {
            target,
            speed: shared_speed,
            ticker,
        }
    }

    fn set_speed(&self, speed: f64) {
        self.speed.store(speed.to_bits(), Ordering::Relaxed);
    }
}

/// Runs at most one scroll loop per axis.
#[derive(Default)]
pub struct AutoScroller {
    vertical: Option<ScrollLoop>,
    horizontal: Option<ScrollLoop>,
}

impl fmt::Debug for AutoScroller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoScroller")
            .field("vertical", &self.is_scrolling(Axis::Vertical))
            .field("horizontal", &self.is_scrolling(Axis::Horizontal))
            .finish()
    }
}

impl AutoScroller {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, axis: Axis) -> &mut Option<ScrollLoop> {
        match axis {
            Axis::Vertical => &mut self.vertical,
            Axis::Horizontal => &mut self.horizontal,
        }
    }

    /// Start scrolling `target` at `speed` px/s, cancelling any previous
    /// loop on the axis.
    pub fn start(&mut self, axis: Axis, target: Arc<dyn ScrollTarget>, speed: f64) {
        self.stop(axis);
        log::debug!("Auto-scroll {:?} started at {:.1} px/s", axis, speed);
        *self.slot(axis) = Some(ScrollLoop::start(axis, target, speed));
    }

    pub fn start_vertical_scroll(&mut self, target: Arc<dyn ScrollTarget>, speed: f64) {
        self.start(Axis::Vertical, target, speed);
    }

    pub fn start_horizontal_scroll(&mut self, target: Arc<dyn ScrollTarget>, speed: f64) {
        self.start(Axis::Horizontal, target, speed);
    }

    /// Keep an axis scrolling at `speed`, reusing the running loop when it
    /// already drives the same target. A zero speed stops the axis.
    pub fn update(&mut self, axis: Axis, target: &Arc<dyn ScrollTarget>, speed: f64) {
        if speed == 0.0 {
            self.stop(axis);
            return;
        }
        let same_target = matches!(
            self.slot(axis),
            Some(running) if Arc::ptr_eq(&running.target, target)
        );
        if !same_target {
            self.start(axis, target.clone(), speed);
        } else if let Some(running) = self.slot(axis) {
            running.set_speed(speed);
        }
    }

    /// Stop one axis. Idempotent.
    pub fn stop(&mut self, axis: Axis) {
        if let Some(mut running) = self.slot(axis).take() {
            running.ticker.stop();
            log::debug!("Auto-scroll {:?} stopped", axis);
        }
    }

    pub fn stop_vertical_scroll(&mut self) {
        self.stop(Axis::Vertical);
    }

    pub fn stop_horizontal_scroll(&mut self) {
        self.stop(Axis::Horizontal);
    }

    /// Stop both axes. Idempotent.
    pub fn stop_all(&mut self) {
        self.stop(Axis::Vertical);
        self.stop(Axis::Horizontal);
    }

    pub fn is_scrolling(&self, axis: Axis) -> bool {
        match axis {
            Axis::Vertical => self.vertical.is_some(),
            Axis::Horizontal => self.horizontal.is_some(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingScroll;
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};
    use std::time::{Duration, Instant};

    fn wait_until(mut done: impl FnMut() -> bool) {
        let start = Instant::now();
        while !done() && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Scroll target remembering which threads wrote to it.
    #[derive(Default)]
    struct WriterLog {
        writers: Mutex<HashSet<ThreadId>>,
        offset: RecordingScroll,
    }

    impl ScrollTarget for WriterLog {
        fn scroll_by(&self, delta: f64) {
            self.writers.lock().unwrap().insert(thread::current().id());
            self.offset.scroll_by(delta);
        }
    }

    #[test]
    fn test_speed_outside_zone_is_zero() {
        assert_eq!(calculate_scroll_speed(60.0, 50.0, 1000.0), 0.0);
        assert_eq!(calculate_scroll_speed(-1.0, 50.0, 1000.0), 0.0);
        assert_eq!(calculate_scroll_speed(10.0, 0.0, 1000.0), 0.0);
    }

    #[test]
    fn test_speed_is_quadratic() {
        assert!((calculate_scroll_speed(0.0, 50.0, 1000.0) - 1000.0).abs() < 1e-9);
        assert!((calculate_scroll_speed(25.0, 50.0, 1000.0) - 250.0).abs() < 1e-9);
        let shallow = calculate_scroll_speed(40.0, 50.0, 1000.0);
        let deep = calculate_scroll_speed(10.0, 50.0, 1000.0);
        assert!(deep > shallow);
    }

    #[test]
    fn test_scroll_step_per_tick() {
        assert!((scroll_step(600.0) - 9.6).abs() < 1e-9);
        assert!((scroll_step(-125.0) + 2.0).abs() < 1e-9);
        assert_eq!(scroll_step(0.0), 0.0);

        let target = RecordingScroll::default();
        target.scroll_by(scroll_step(600.0));
        target.scroll_by(scroll_step(600.0));
        assert!((target.offset() - 19.2).abs() < 1e-9);
    }

    #[test]
    fn test_restart_leaves_single_writer() {
        let target = Arc::new(WriterLog::default());
        let mut scroller = AutoScroller::new();
        scroller.start_vertical_scroll(target.clone(), 600.0);
        wait_until(|| target.offset.offset() > 0.0);
        scroller.start_vertical_scroll(target.clone(), 600.0);

        target.writers.lock().unwrap().clear();
        let resumed = target.offset.offset();
        wait_until(|| target.offset.offset() > resumed + 20.0);
        assert!(target.offset.offset() > resumed);
        assert_eq!(target.writers.lock().unwrap().len(), 1);

        scroller.stop_all();
        let frozen = target.offset.offset();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(target.offset.offset(), frozen);
    }

    #[test]
    fn test_restart_with_new_target_cancels_old_loop() {
        let first = Arc::new(RecordingScroll::default());
        let second = Arc::new(RecordingScroll::default());
        let mut scroller = AutoScroller::new();
        scroller.start_vertical_scroll(first.clone(), 600.0);
        wait_until(|| first.offset() > 0.0);
        scroller.start_vertical_scroll(second.clone(), 600.0);

        let abandoned = first.offset();
        wait_until(|| second.offset() > 20.0);
        assert!(second.offset() > 0.0);
        assert_eq!(first.offset(), abandoned);
        scroller.stop_all();
    }

    #[test]
    fn test_vertical_scroll_advances_and_stops() {
        let target = Arc::new(RecordingScroll::default());
        let mut scroller = AutoScroller::new();
        scroller.start_vertical_scroll(target.clone(), 600.0);
        assert!(scroller.is_scrolling(Axis::Vertical));

        wait_until(|| target.offset() > 0.0);
        assert!(target.offset() > 0.0);

        scroller.stop_all();
        let frozen = target.offset();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(target.offset(), frozen);
        assert!(!scroller.is_scrolling(Axis::Vertical));
        scroller.stop_all();
    }

    #[test]
    fn test_update_with_zero_speed_stops_axis() {
        let target: Arc<dyn ScrollTarget> = Arc::new(RecordingScroll::default());
        let mut scroller = AutoScroller::new();
        scroller.update(Axis::Horizontal, &target, -300.0);
        assert!(scroller.is_scrolling(Axis::Horizontal));
        scroller.update(Axis::Horizontal, &target, 0.0);
        assert!(!scroller.is_scrolling(Axis::Horizontal));
    }
}
