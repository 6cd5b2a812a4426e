use std::time::Instant;

use crate::canvas::{Canvas, DrawingContext};
use crate::entity::{Commands, HookId, World};
use crate::present::PresentationSurface;
use crate::time::{FrameClock, FrameScheduler, FrameTime};

use super::{GlobalDrawCtx, GlobalHooks, GlobalUpdateCtx, Phase, TickError};

/// Fixed-rate loop over a [`Canvas`].
///
/// Each tick, in order:
/// 1. clear the framebuffer to the background colour
/// 2. update hooks of every instance (templates in registration order,
///    instances in insertion order), then apply buffered commands
/// 3. global update hooks
/// 4. draw hooks of every instance, same order as 2
/// 5. global draw hooks
/// 6. overlay hooks
/// 7. present the framebuffer
/// 8. reschedule, then apply a viewport resize requested by a global update
///
/// The driver never sleeps or spawns threads. The host calls [`poll`] whenever
/// it wakes, and uses [`next_deadline`] to decide when that should be.
///
/// [`poll`]: Self::poll
/// [`next_deadline`]: Self::next_deadline
#[derive(Debug)]
pub struct FrameDriver {
    canvas:    Canvas,
    hooks:     GlobalHooks,
    scheduler: FrameScheduler,
    clock:     FrameClock,
    commands:  Commands,
    pending_resize: Option<(i32, i32)>,
}

impl FrameDriver {
    pub fn new(canvas: Canvas) -> Self {
        let scheduler = FrameScheduler::new(canvas.settings().fps()).unwrap_or_default();

        Self {
            canvas,
            hooks: GlobalHooks::default(),
            scheduler,
            clock: FrameClock::new(),
            commands: Commands::default(),
            pending_resize: None,
        }
    }

    #[inline]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Mutable canvas access between ticks (resize, settings, registration).
    #[inline]
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        self.canvas.world_mut()
    }

    #[inline]
    pub fn hooks_mut(&mut self) -> &mut GlobalHooks {
        &mut self.hooks
    }

    pub fn on_update<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&mut GlobalUpdateCtx<'_>) -> anyhow::Result<()> + 'static,
    {
        self.hooks.bind_update(hook)
    }

    pub fn on_draw<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&mut GlobalDrawCtx<'_>) -> anyhow::Result<()> + 'static,
    {
        self.hooks.bind_draw(hook)
    }

    pub fn on_draw_overlay<F>(&mut self, hook: F) -> HookId
    where
        F: FnMut(&mut GlobalDrawCtx<'_>) -> anyhow::Result<()> + 'static,
    {
        self.hooks.bind_overlay(hook)
    }

    #[inline]
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    #[inline]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Arms the loop; the first tick is due at `now`.
    pub fn start(&mut self, now: Instant) {
        if let Err(err) = self.scheduler.set_fps(self.canvas.settings().fps()) {
            log::warn!("keeping previous frame rate: {err}");
        }
        self.clock.reset();
        self.scheduler.start(now);
        log::debug!("frame loop started at {} fps", self.scheduler.fps());
    }

    /// Stops scheduling ticks. A tick in progress is unaffected; `poll` does
    /// nothing until [`start`](Self::start) is called again.
    pub fn stop(&mut self) {
        if self.scheduler.is_running() {
            log::debug!("frame loop stopped after {} ticks", self.clock.frame_count());
        }
        self.scheduler.stop();
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Runs one tick if one is due at `now`. Returns whether a tick ran.
    pub fn poll<S>(&mut self, now: Instant, surface: &mut S) -> Result<bool, TickError>
    where
        S: PresentationSurface + ?Sized,
    {
        if !self.scheduler.is_due(now) {
            return Ok(false);
        }
        self.tick(now, surface)?;
        Ok(true)
    }

    /// Runs one tick unconditionally and advances the schedule.
    ///
    /// If a phase or the presentation fails, the remaining steps are skipped,
    /// buffered commands and resize requests are dropped, and neither the
    /// clock nor the schedule advances: a retry sees the same frame index.
    ///
    /// A resize requested through [`GlobalUpdateCtx::request_resize`] is
    /// applied last. If it is rejected the frame has still been presented and
    /// counted, the old buffer is kept and [`TickError::Canvas`] is returned.
    pub fn tick<S>(&mut self, now: Instant, surface: &mut S) -> Result<(), TickError>
    where
        S: PresentationSurface + ?Sized,
    {
        let time = self.clock.peek(now);
        log::trace!("tick {} (dt {:.4}s)", time.frame_index, time.dt);

        let phases = self.run_phases(time);
        let resize = self.pending_resize.take();
        if let Err(err) = phases {
            self.commands.discard();
            return Err(err);
        }

        surface
            .present(self.canvas.framebuffer())
            .map_err(TickError::Present)?;

        self.clock.commit(now);
        self.scheduler.complete_tick(now, self.canvas.settings().fps())?;

        if let Some((width, height)) = resize {
            self.canvas.resize_viewport(width, height)?;
        }
        Ok(())
    }

    fn run_phases(&mut self, time: FrameTime) -> Result<(), TickError> {
        let canvas = &mut self.canvas;
        let hook_err = |phase: Phase| move |source: anyhow::Error| TickError::Hook { phase, source };

        // 1. clear
        let background = canvas.settings.background;
        canvas.framebuffer.fill(background);

        // 2. per-instance update, then deferred edits
        let viewport = canvas.viewport();
        canvas
            .world
            .run_update(viewport, time, &mut self.commands)
            .map_err(hook_err(Phase::Update))?;
        self.commands.apply(&mut canvas.world);

        // 3. global update
        {
            let mut ctx = GlobalUpdateCtx {
                world: &mut canvas.world,
                settings: &mut canvas.settings,
                viewport,
                time,
                resize: &mut self.pending_resize,
            };
            for hook in self.hooks.update.iter_mut() {
                hook(&mut ctx).map_err(hook_err(Phase::GlobalUpdate))?;
            }
        }

        // Origin may have moved in the global update.
        let viewport = canvas.viewport();

        // 4. per-instance draw
        canvas
            .world
            .run_draw(&mut canvas.framebuffer, viewport, time)
            .map_err(hook_err(Phase::Draw))?;

        // 5. global draw, world space
        {
            let origin = embedded_graphics::geometry::Point::new(viewport.x, viewport.y);
            let mut ctx = GlobalDrawCtx {
                world: &canvas.world,
                settings: &canvas.settings,
                viewport,
                time,
                canvas: DrawingContext::world(&mut canvas.framebuffer, origin),
            };
            for hook in self.hooks.draw.iter_mut() {
                hook(&mut ctx).map_err(hook_err(Phase::GlobalDraw))?;
            }
        }

        // 6. overlay, screen space
        {
            let mut ctx = GlobalDrawCtx {
                world: &canvas.world,
                settings: &canvas.settings,
                viewport,
                time,
                canvas: DrawingContext::screen(&mut canvas.framebuffer),
            };
            for hook in self.hooks.overlay.iter_mut() {
                hook(&mut ctx).map_err(hook_err(Phase::Overlay))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    use anyhow::bail;
    use embedded_graphics::geometry::Point;

    use super::*;
    use crate::canvas::{CanvasError, Framebuffer};
    use crate::entity::{InstanceState, Template};
    use crate::paint::Color;
    use crate::time::interval_for;

    #[derive(Default)]
    struct RecordingSurface {
        presented: usize,
        last: Vec<u8>,
        size: (u32, u32),
    }

    impl PresentationSurface for RecordingSurface {
        fn present(&mut self, frame: &Framebuffer) -> anyhow::Result<()> {
            self.presented += 1;
            self.last = frame.as_bytes().to_vec();
            self.size = frame.size();
            Ok(())
        }
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn driver(w: i32, h: i32) -> FrameDriver {
        FrameDriver::new(Canvas::new(w, h).unwrap())
    }

    fn push(log: &Log, entry: impl Into<String>) {
        log.borrow_mut().push(entry.into());
    }

    #[test]
    fn counter_and_draw_log_scenario() {
        let mut d = driver(8, 8);
        let counter = Rc::new(Cell::new(0));
        let log: Log = Rc::default();

        let mut t = Template::new("t");
        let c = counter.clone();
        t.bind_update(move |_| {
            c.set(c.get() + 1);
            Ok(())
        });
        let l = log.clone();
        t.bind_draw(move |_| {
            push(&l, "I");
            Ok(())
        });
        let tid = d.world_mut().register(t);
        d.world_mut().spawn(tid, InstanceState::default()).unwrap();

        let l = log.clone();
        d.on_draw(move |_| {
            push(&l, "G");
            Ok(())
        });
        let l = log.clone();
        d.on_draw_overlay(move |_| {
            push(&l, "O");
            Ok(())
        });

        let mut surface = RecordingSurface::default();
        d.tick(Instant::now(), &mut surface).unwrap();

        assert_eq!(counter.get(), 1);
        assert_eq!(*log.borrow(), ["I", "G", "O"]);
        assert_eq!(surface.presented, 1);
    }

    #[test]
    fn phases_run_in_fixed_order() {
        let mut d = driver(8, 8);
        let log: Log = Rc::default();

        let mut t = Template::new("t");
        let l = log.clone();
        t.bind_update(move |ctx| {
            push(&l, format!("update {}", ctx.state.position.x));
            Ok(())
        });
        let l = log.clone();
        t.bind_draw(move |ctx| {
            push(&l, format!("draw {}", ctx.state.position.x));
            Ok(())
        });
        let tid = d.world_mut().register(t);
        d.world_mut().spawn(tid, InstanceState::at(1.0, 0.0)).unwrap();
        d.world_mut().spawn(tid, InstanceState::at(2.0, 0.0)).unwrap();

        // Bound in reverse to show binding order does not matter across phases.
        let l = log.clone();
        d.on_draw_overlay(move |_| {
            push(&l, "overlay");
            Ok(())
        });
        let l = log.clone();
        d.on_draw(move |_| {
            push(&l, "global draw");
            Ok(())
        });
        let l = log.clone();
        d.on_update(move |_| {
            push(&l, "global update");
            Ok(())
        });

        d.tick(Instant::now(), &mut RecordingSurface::default()).unwrap();

        assert_eq!(
            *log.borrow(),
            [
                "update 1",
                "update 2",
                "global update",
                "draw 1",
                "draw 2",
                "global draw",
                "overlay"
            ]
        );
    }

    #[test]
    fn templates_run_in_registration_order() {
        let mut d = driver(8, 8);
        let log: Log = Rc::default();

        for name in ["A", "B"] {
            let mut t = Template::new(name);
            let l = log.clone();
            t.bind_draw(move |_| {
                push(&l, name);
                Ok(())
            });
            let tid = d.world_mut().register(t);
            d.world_mut().spawn(tid, InstanceState::default()).unwrap();
        }

        d.tick(Instant::now(), &mut RecordingSurface::default()).unwrap();
        assert_eq!(*log.borrow(), ["A", "B"]);
    }

    #[test]
    fn fps_change_reschedules_next_tick() {
        let mut d = driver(4, 4);
        let ticks = Rc::new(Cell::new(0u32));
        let t = ticks.clone();
        d.on_update(move |ctx| {
            t.set(t.get() + 1);
            if t.get() == 2 {
                ctx.settings.set_fps(60)?;
            }
            Ok(())
        });

        let mut surface = RecordingSurface::default();
        let t0 = Instant::now();
        d.start(t0);

        assert!(d.poll(t0, &mut surface).unwrap());
        let n = t0 + interval_for(30).unwrap();
        assert_eq!(d.next_deadline(), Some(n));
        assert!(!d.poll(n - Duration::from_millis(1), &mut surface).unwrap());

        // Tick N still fires on the 30 fps grid and switches to 60.
        assert!(d.poll(n, &mut surface).unwrap());
        assert_eq!(d.next_deadline(), Some(n + interval_for(60).unwrap()));
        assert_eq!(d.scheduler().fps(), 60);
        assert_eq!(surface.presented, 2);
    }

    #[test]
    fn unbound_hook_is_not_invoked() {
        let mut d = driver(4, 4);
        let calls = Rc::new(Cell::new(0));

        let mut t = Template::new("t");
        let c = calls.clone();
        let hook = t.bind_update(move |_| {
            c.set(c.get() + 1);
            Ok(())
        });
        assert!(t.unbind_update(hook));
        let tid = d.world_mut().register(t);
        d.world_mut().spawn(tid, InstanceState::default()).unwrap();

        let c = calls.clone();
        let global = d.on_draw(move |_| {
            c.set(c.get() + 1);
            Ok(())
        });
        assert!(d.hooks_mut().unbind_draw(global));

        d.tick(Instant::now(), &mut RecordingSurface::default()).unwrap();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn empty_world_still_clears_and_presents() {
        let mut d = driver(3, 2);
        d.canvas_mut().settings_mut().background = Color::BLUE;

        let mut surface = RecordingSurface::default();
        d.tick(Instant::now(), &mut surface).unwrap();

        assert_eq!(surface.presented, 1);
        assert_eq!(&surface.last[..4], &[0, 0, 255, 255]);
        assert_eq!(d.canvas().framebuffer().pixel(2, 1), Some(Color::BLUE));
    }

    #[test]
    fn hook_error_aborts_tick() {
        let mut d = driver(4, 4);
        let drawn = Rc::new(Cell::new(false));

        let mut t = Template::new("faulty");
        t.bind_update(|ctx| {
            let (template, state) = (ctx.template, *ctx.state);
            ctx.commands().spawn(template, state);
            bail!("boom")
        });
        let dr = drawn.clone();
        t.bind_draw(move |_| {
            dr.set(true);
            Ok(())
        });
        let tid = d.world_mut().register(t);
        d.world_mut().spawn(tid, InstanceState::default()).unwrap();

        let mut surface = RecordingSurface::default();
        let t0 = Instant::now();
        d.start(t0);
        let err = d.poll(t0, &mut surface).unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Update));
        assert!(format!("{:#}", anyhow::Error::from(err)).contains("boom"));
        assert!(!drawn.get());
        assert_eq!(surface.presented, 0);
        assert_eq!(d.canvas().world().instance_count(), 1);
        assert_eq!(d.next_deadline(), Some(t0));
    }

    #[test]
    fn overlay_error_reports_phase() {
        let mut d = driver(4, 4);
        d.on_draw_overlay(|_| bail!("overlay broke"));
        let err = d.tick(Instant::now(), &mut RecordingSurface::default()).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Overlay));
    }

    #[test]
    fn spawned_instance_is_drawn_in_same_tick() {
        let mut d = driver(8, 8);
        let draws = Rc::new(Cell::new(0));

        let mut t = Template::new("spawner");
        t.bind_update(|ctx| {
            if ctx.time.frame_index == 0 && ctx.state.depth == 0.0 {
                let template = ctx.template;
                ctx.commands().spawn(template, InstanceState::at(5.0, 5.0).with_depth(1.0));
            }
            Ok(())
        });
        let dr = draws.clone();
        t.bind_draw(move |ctx| {
            dr.set(dr.get() + 1);
            ctx.canvas.set_pixel(ctx.state.position.to_point(), Color::RED);
            Ok(())
        });
        let tid = d.world_mut().register(t);
        d.world_mut().spawn(tid, InstanceState::default()).unwrap();

        d.tick(Instant::now(), &mut RecordingSurface::default()).unwrap();

        assert_eq!(draws.get(), 2);
        assert_eq!(d.canvas().world().instance_count(), 2);
        assert_eq!(d.canvas().framebuffer().pixel(5, 5), Some(Color::RED));
    }

    #[test]
    fn instance_draws_follow_viewport_origin_and_overlay_does_not() {
        let mut d = driver(10, 10);
        d.canvas_mut().settings_mut().origin = (2, 2);

        let mut t = Template::new("dot");
        t.bind_draw(|ctx| {
            ctx.canvas.set_pixel(ctx.state.position.to_point(), Color::RED);
            Ok(())
        });
        let tid = d.world_mut().register(t);
        d.world_mut().spawn(tid, InstanceState::at(5.0, 5.0)).unwrap();
        d.on_draw_overlay(|ctx| {
            ctx.canvas.set_pixel(Point::new(0, 0), Color::BLACK);
            Ok(())
        });

        d.tick(Instant::now(), &mut RecordingSurface::default()).unwrap();

        let fb = d.canvas().framebuffer();
        assert_eq!(fb.pixel(3, 3), Some(Color::RED));
        assert_eq!(fb.pixel(5, 5), Some(Color::LIGHT_GRAY));
        assert_eq!(fb.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn stop_prevents_further_ticks() {
        let mut d = driver(4, 4);
        let mut surface = RecordingSurface::default();
        let t0 = Instant::now();
        d.start(t0);
        d.stop();
        assert!(!d.is_running());
        assert!(!d.poll(t0 + Duration::from_secs(1), &mut surface).unwrap());
        assert_eq!(surface.presented, 0);
    }

    #[test]
    fn hook_id_from_another_list_unbinds_nothing() {
        let mut d = driver(4, 4);
        let overlays = Rc::new(Cell::new(0));

        let draw_id = d.on_draw(|_| Ok(()));
        let o = overlays.clone();
        d.on_draw_overlay(move |_| {
            o.set(o.get() + 1);
            Ok(())
        });

        assert!(!d.hooks_mut().unbind_overlay(draw_id));
        d.tick(Instant::now(), &mut RecordingSurface::default()).unwrap();
        assert_eq!(overlays.get(), 1);
    }

    #[test]
    fn resize_request_applies_after_present() {
        let mut d = driver(4, 4);
        d.on_update(|ctx| {
            if ctx.time.frame_index == 0 {
                ctx.request_resize(6, 3);
            }
            Ok(())
        });

        let mut surface = RecordingSurface::default();
        let t0 = Instant::now();
        d.tick(t0, &mut surface).unwrap();
        assert_eq!(surface.size, (4, 4));
        assert_eq!(d.canvas().viewport().size(), (6, 3));

        d.tick(t0 + Duration::from_millis(33), &mut surface).unwrap();
        assert_eq!(surface.size, (6, 3));
        assert_eq!(surface.last.len(), 6 * 3 * 4);
        assert_eq!(d.canvas().resource_stats().live(), 1);
    }

    #[test]
    fn invalid_resize_request_fails_and_keeps_buffer() {
        let mut d = driver(4, 4);
        d.on_update(|ctx| {
            ctx.request_resize(0, 3);
            Ok(())
        });

        let mut surface = RecordingSurface::default();
        let err = d.tick(Instant::now(), &mut surface).unwrap_err();

        assert!(matches!(
            err,
            TickError::Canvas(CanvasError::InvalidViewport { .. })
        ));
        assert_eq!(surface.presented, 1);
        assert_eq!(d.canvas().framebuffer().size(), (4, 4));
    }

    #[test]
    fn resize_request_of_aborted_tick_is_dropped() {
        let mut d = driver(4, 4);
        d.on_update(|ctx| {
            ctx.request_resize(8, 8);
            Ok(())
        });
        d.on_draw(|_| bail!("draw broke"));

        let err = d.tick(Instant::now(), &mut RecordingSurface::default()).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::GlobalDraw));
        assert_eq!(d.canvas().framebuffer().size(), (4, 4));
    }

    #[test]
    fn failed_tick_keeps_frame_index() {
        let mut d = driver(4, 4);
        let seen: Rc<RefCell<Vec<u64>>> = Rc::default();
        let failed = Rc::new(Cell::new(false));

        let s = seen.clone();
        let f = failed.clone();
        d.on_update(move |ctx| {
            s.borrow_mut().push(ctx.time.frame_index);
            if !f.replace(true) {
                bail!("first tick fails");
            }
            Ok(())
        });

        let t0 = Instant::now();
        let mut surface = RecordingSurface::default();
        assert!(d.tick(t0, &mut surface).is_err());
        d.tick(t0 + Duration::from_millis(33), &mut surface).unwrap();
        d.tick(t0 + Duration::from_millis(66), &mut surface).unwrap();

        assert_eq!(*seen.borrow(), [0, 0, 1]);
    }
}
