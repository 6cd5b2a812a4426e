use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::FrameDriver;
use crate::device::{Gpu, GpuInit};
use crate::paint::Color;
use crate::present::WgpuPresenter;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Initial window size. Independent of the canvas viewport; frames are
    /// letterboxed into whatever size the window has.
    pub initial_size: LogicalSize<f64>,
    /// Fill around the letterboxed frame.
    pub letterbox: Color,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "gamecanvas".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
            letterbox: Color::BLACK,
        }
    }
}

/// Native host: one window, one [`FrameDriver`].
///
/// The event loop sleeps until the driver's next deadline
/// (`ControlFlow::WaitUntil`), then requests a redraw; the tick itself runs
/// inside `RedrawRequested`. A failing tick is logged, stops the loop and is
/// returned from [`Runtime::run`].
pub struct Runtime;

impl Runtime {
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit, driver: FrameDriver) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = HostState::new(config, gpu_init, driver);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    presenter: WgpuPresenter<'this>,
}

struct HostState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    driver: FrameDriver,

    window: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
}

impl HostState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, driver: FrameDriver) -> Self {
        Self {
            config,
            gpu_init,
            driver,
            window: None,
            failure: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let letterbox = self.config.letterbox;

        let entry = WindowEntryTryBuilder {
            window,
            presenter_builder: |w| {
                let gpu = pollster::block_on(Gpu::new(w, gpu_init))?;
                let mut presenter = WgpuPresenter::new(gpu);
                presenter.set_letterbox_color(letterbox);
                Ok::<_, anyhow::Error>(presenter)
            },
        }
            .try_build()
            .context("GPU initialization failed for window")?;

        self.window = Some(entry);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.driver.stop();
        self.failure = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Self { driver, window, .. } = self;
        let Some(entry) = window.as_mut() else { return };

        let now = Instant::now();
        let result = entry.with_presenter_mut(|presenter| -> Result<()> {
            // Off-schedule redraws (expose, resize) repaint the last frame.
            if !driver.poll(now, presenter).context("tick failed")? {
                presenter.redraw().context("redraw failed")?;
            }
            Ok(())
        });

        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }
}

impl ApplicationHandler for HostState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e.context("failed to create initial window"));
            return;
        }

        self.driver.start(Instant::now());

        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = &self.window else { return };

        match self.driver.next_deadline() {
            Some(deadline) if Instant::now() >= deadline => {
                entry.with_window(|w| w.request_redraw());
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.driver.stop();
                self.window = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_presenter_mut(|p| p.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_presenter_mut(|p| p.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
