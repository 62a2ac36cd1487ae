//! Zoom-out overview transitions during long drags.
//!
//! The phase lifecycle is strictly `Normal → ZoomingOut → Miniature →
//! ZoomingIn → Normal` (a drag ending mid zoom-out goes straight to
//! `ZoomingIn`). A progress scalar in `[0, 1]` accompanies the phase, 0 in
//! `Normal` and 1 in `Miniature`.

use crate::config::AnimationDriver;
use crate::id::ColumnId;
use crate::ticker::{FRAME_PERIOD, TickFlow, TickLoop};
use kurbo::{Point, Rect};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Margin kept around the hovered miniature column before hover is cleared.
pub const HOVER_HYSTERESIS: f64 = 12.0;

/// Zoom phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoomPhase {
    #[default]
    Normal,
    ZoomingOut,
    Miniature,
    ZoomingIn,
}

impl ZoomPhase {
    /// Whether the miniature overview is (partly) visible.
    pub fn is_overview(self) -> bool {
        matches!(self, ZoomPhase::ZoomingOut | ZoomPhase::Miniature)
    }
}

#[derive(Debug, Clone)]
struct Animation {
    from: f64,
    to: f64,
    started_at: Instant,
    duration: Duration,
}

/// Shared zoom state, advanced by the animation task.
#[derive(Debug, Clone, Default)]
pub struct ZoomState {
    phase: ZoomPhase,
    progress: f64,
    animation: Option<Animation>,
    hovered_overlay: Option<ColumnId>,
}

impl ZoomState {
    pub fn phase(&self) -> ZoomPhase {
        self.phase
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn hovered_overlay(&self) -> Option<&ColumnId> {
        self.hovered_overlay.as_ref()
    }

    fn begin(&mut self, phase: ZoomPhase, to: f64, full_duration: Duration, now: Instant) {
        let from = self.progress;
        self.phase = phase;
        self.animation = Some(Animation {
            from,
            to,
            started_at: now,
            duration: full_duration.mul_f64((to - from).abs()),
        });
        self.advance(now);
    }

    /// Advance the running animation to `now`.
    ///
    /// Returns true while the animation is still in flight.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(animation) = &self.animation else {
            return false;
        };
        let elapsed = now.saturating_duration_since(animation.started_at);
        let t = if animation.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / animation.duration.as_secs_f64()).min(1.0)
        };
        self.progress = animation.from + (animation.to - animation.from) * t;
        if t < 1.0 {
            return true;
        }

        self.progress = animation.to;
        self.animation = None;
        self.phase = match self.phase {
            ZoomPhase::ZoomingOut => ZoomPhase::Miniature,
            ZoomPhase::ZoomingIn => {
                self.hovered_overlay = None;
                ZoomPhase::Normal
            }
            settled => settled,
        };
        log::debug!("Zoom transition settled in {:?}", self.phase);
        false
    }
}

/// Whether a pointer has left the source column horizontally.
///
/// Half-open like [`Rect::contains`]: the right edge already belongs to the
/// next column.
pub fn exits_column(pointer: Point, column_bounds: Rect) -> bool {
    !(column_bounds.x0..column_bounds.x1).contains(&pointer.x)
}

/// Drives the zoom phase machine and owns its animation task.
#[derive(Debug)]
pub struct ZoomController {
    state: Arc<Mutex<ZoomState>>,
    driver: AnimationDriver,
    zoom_out_duration: Duration,
    zoom_in_duration: Duration,
    task: Option<TickLoop>,
}

impl ZoomController {
    pub fn new(
        driver: AnimationDriver,
        zoom_out_duration: Duration,
        zoom_in_duration: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ZoomState::default())),
            driver,
            zoom_out_duration,
            zoom_in_duration,
            task: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ZoomState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ZoomState {
        self.lock().clone()
    }

    pub fn phase(&self) -> ZoomPhase {
        self.lock().phase
    }

    pub fn progress(&self) -> f64 {
        self.lock().progress
    }

    pub fn hovered_overlay_column(&self) -> Option<ColumnId> {
        self.lock().hovered_overlay.clone()
    }

    pub fn set_hovered_overlay_column(&mut self, column_id: Option<ColumnId>) {
        self.lock().hovered_overlay = column_id;
    }

    /// Hover test against miniature column rectangles reported by the host.
    ///
    /// The previously hovered column stays hovered while the pointer is within
    /// [`HOVER_HYSTERESIS`] of its rectangle.
    pub fn update_overlay_hover(
        &mut self,
        position: Point,
        columns: &[(ColumnId, Rect)],
    ) -> Option<ColumnId> {
        let mut state = self.lock();
        if let Some(current) = state.hovered_overlay.clone() {
            let still_hovered = columns.iter().any(|(id, bounds)| {
                *id == current
                    && bounds
                        .inflate(HOVER_HYSTERESIS, HOVER_HYSTERESIS)
                        .contains(position)
            });
            if still_hovered {
                return Some(current);
            }
        }
        let next = columns
            .iter()
            .find(|(_, bounds)| bounds.contains(position))
            .map(|(id, _)| id.clone());
        if next != state.hovered_overlay {
            log::trace!("Overlay hover: {:?}", next);
        }
        state.hovered_overlay = next.clone();
        next
    }

    fn cancel_task(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.stop();
        }
    }

    fn start(&mut self, phase: ZoomPhase, to: f64, duration: Duration, now: Instant) {
        self.cancel_task();
        let in_flight = {
            let mut state = self.lock();
            state.begin(phase, to, duration, now);
            state.animation.is_some()
        };
        if in_flight && self.driver == AnimationDriver::Background {
            let state = self.state.clone();
            self.task = Some(TickLoop::spawn("zoom", FRAME_PERIOD, move || {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                if state.advance(Instant::now()) {
                    TickFlow::Continue
                } else {
                    TickFlow::Stop
                }
            }));
        }
    }

    /// Begin zooming out to the overview. Valid from `Normal`, or to restart
    /// a zoom-out already in flight.
    pub fn start_zoom_out_transition(&mut self, now: Instant) -> bool {
        if !matches!(self.phase(), ZoomPhase::Normal | ZoomPhase::ZoomingOut) {
            return false;
        }
        log::debug!("Zooming out to overview");
        self.start(ZoomPhase::ZoomingOut, 1.0, self.zoom_out_duration, now);
        true
    }

    /// Begin zooming back in. Valid from `ZoomingOut`, `Miniature`, or to
    /// restart a zoom-in already in flight.
    pub fn start_zoom_in_transition(&mut self, now: Instant) -> bool {
        if self.phase() == ZoomPhase::Normal {
            return false;
        }
        log::debug!("Zooming in from overview");
        self.start(ZoomPhase::ZoomingIn, 0.0, self.zoom_in_duration, now);
        true
    }

    /// Advance the animation (manual driver). Returns true while in flight.
    pub fn tick(&mut self, now: Instant) -> bool {
        let in_flight = self.lock().advance(now);
        if !in_flight {
            self.task = None;
        }
        in_flight
    }

    /// Safety net for gesture teardown: if no drag is active but the overview
    /// is showing, start zooming back in.
    pub fn ensure_zoom_reset(&mut self, drag_active: bool, now: Instant) -> bool {
        if drag_active || !self.phase().is_overview() {
            return false;
        }
        log::warn!("Zoom left in {:?} without an active drag, resetting", self.phase());
        self.start_zoom_in_transition(now)
    }

    /// Force `Normal` immediately, cancelling any animation.
    pub fn reset(&mut self) {
        self.cancel_task();
        *self.lock() = ZoomState::default();
    }
}

impl Drop for ZoomController {
    fn drop(&mut self) {
        self.cancel_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Id;
    use std::thread;

    fn manual(out_ms: u64, in_ms: u64) -> ZoomController {
        ZoomController::new(
            AnimationDriver::Manual,
            Duration::from_millis(out_ms),
            Duration::from_millis(in_ms),
        )
    }

    #[test]
    fn test_full_lifecycle() {
        let mut zoom = manual(300, 200);
        let t0 = Instant::now();
        assert_eq!(zoom.phase(), ZoomPhase::Normal);

        assert!(zoom.start_zoom_out_transition(t0));
        assert_eq!(zoom.phase(), ZoomPhase::ZoomingOut);

        assert!(zoom.tick(t0 + Duration::from_millis(150)));
        assert!((zoom.progress() - 0.5).abs() < 1e-9);

        assert!(!zoom.tick(t0 + Duration::from_millis(300)));
        assert_eq!(zoom.phase(), ZoomPhase::Miniature);
        assert!((zoom.progress() - 1.0).abs() < 1e-9);

        let t1 = t0 + Duration::from_millis(400);
        assert!(zoom.start_zoom_in_transition(t1));
        assert_eq!(zoom.phase(), ZoomPhase::ZoomingIn);
        assert!(!zoom.tick(t1 + Duration::from_millis(200)));
        assert_eq!(zoom.phase(), ZoomPhase::Normal);
        assert_eq!(zoom.progress(), 0.0);
    }

    #[test]
    fn test_zoom_in_not_valid_from_normal() {
        let mut zoom = manual(300, 200);
        assert!(!zoom.start_zoom_in_transition(Instant::now()));
        assert_eq!(zoom.phase(), ZoomPhase::Normal);
    }

    #[test]
    fn test_zoom_in_mid_zoom_out_uses_remaining_distance() {
        let mut zoom = manual(100, 100);
        let t0 = Instant::now();
        zoom.start_zoom_out_transition(t0);
        zoom.tick(t0 + Duration::from_millis(40));
        let t1 = t0 + Duration::from_millis(40);
        assert!(zoom.start_zoom_in_transition(t1));
        assert!(zoom.tick(t1 + Duration::from_millis(20)));
        assert!(!zoom.tick(t1 + Duration::from_millis(40)));
        assert_eq!(zoom.phase(), ZoomPhase::Normal);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let mut zoom = manual(0, 0);
        zoom.start_zoom_out_transition(Instant::now());
        assert_eq!(zoom.phase(), ZoomPhase::Miniature);
        zoom.set_hovered_overlay_column(Some(Id::from("col-2")));
        zoom.start_zoom_in_transition(Instant::now());
        assert_eq!(zoom.phase(), ZoomPhase::Normal);
        assert!(zoom.hovered_overlay_column().is_none());
    }

    #[test]
    fn test_ensure_zoom_reset() {
        let mut zoom = manual(0, 0);
        zoom.start_zoom_out_transition(Instant::now());
        assert!(!zoom.ensure_zoom_reset(true, Instant::now()));
        assert_eq!(zoom.phase(), ZoomPhase::Miniature);
        assert!(zoom.ensure_zoom_reset(false, Instant::now()));
        assert_eq!(zoom.phase(), ZoomPhase::Normal);
        assert!(!zoom.ensure_zoom_reset(false, Instant::now()));
    }

    #[test]
    fn test_overlay_hover_hysteresis() {
        let mut zoom = manual(0, 0);
        let columns = vec![
            (Id::from("a"), Rect::new(0.0, 0.0, 100.0, 100.0)),
            (Id::from("b"), Rect::new(100.0, 0.0, 200.0, 100.0)),
        ];
        let mut hover = |x, y| zoom.update_overlay_hover(Point::new(x, y), &columns);
        assert_eq!(hover(50.0, 50.0), Some(Id::from("a")));
        // Just inside "b" but within the margin of "a".
        assert_eq!(hover(105.0, 50.0), Some(Id::from("a")));
        assert_eq!(hover(150.0, 50.0), Some(Id::from("b")));
        assert_eq!(hover(150.0, 300.0), None);
    }

    #[test]
    fn test_exits_column() {
        let bounds = Rect::new(0.0, 0.0, 200.0, 500.0);
        assert!(exits_column(Point::new(250.0, 10.0), bounds));
        assert!(exits_column(Point::new(-1.0, 10.0), bounds));
        assert!(!exits_column(Point::new(150.0, 900.0), bounds));
        assert!(!exits_column(Point::new(0.0, 10.0), bounds));
        // The right edge is already inside the neighbouring column.
        assert!(exits_column(Point::new(200.0, 10.0), bounds));
        assert!(!exits_column(Point::new(199.9, 10.0), bounds));
    }

    #[test]
    fn test_background_driver_settles() {
        let mut zoom = ZoomController::new(
            AnimationDriver::Background,
            Duration::from_millis(30),
            Duration::from_millis(30),
        );
        zoom.start_zoom_out_transition(Instant::now());
        let start = Instant::now();
        while zoom.phase() != ZoomPhase::Miniature && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(zoom.phase(), ZoomPhase::Miniature);

        // Restarting cancels the previous task before starting a new one.
        zoom.start_zoom_in_transition(Instant::now());
        zoom.start_zoom_in_transition(Instant::now());
        let start = Instant::now();
        while zoom.phase() != ZoomPhase::Normal && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(zoom.phase(), ZoomPhase::Normal);
    }
}
