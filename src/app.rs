use crate::Core;
use log::{error, warn};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    window::WindowAttributes,
};

/// Whatever draws into the window each frame.
pub trait FrameDriver {
    fn resize(&mut self, _core: &Core) {}
    fn update(&mut self, _core: &Core) {}
    fn render(&mut self, core: &Core) -> Result<(), wgpu::SurfaceError>;
    /// Returns `true` when the event was consumed.
    fn handle_input(&mut self, _core: &Core, _event: &WindowEvent) -> bool {
        false
    }
}

type DriverCreator<D> = Box<dyn FnOnce(&Core) -> anyhow::Result<D>>;

pub struct WaterApp {
    window_title: String,
    window_size: (u32, u32),
    core: Option<Core>,
}

impl WaterApp {
    pub fn new(window_title: &str, width: u32, height: u32) -> anyhow::Result<(Self, EventLoop<()>)> {
        let event_loop = EventLoop::builder().build()?;
        // the window is created on the first `resumed`
        let app = Self {
            window_title: String::from(window_title),
            window_size: (width, height),
            core: None,
        };
        Ok((app, event_loop))
    }

    pub fn run<D: FrameDriver + 'static>(
        self,
        event_loop: EventLoop<()>,
        creator: impl FnOnce(&Core) -> anyhow::Result<D> + 'static,
    ) -> anyhow::Result<()> {
        let mut handler = WaterAppHandler {
            app: self,
            creator: Some(Box::new(creator)),
            driver: None,
        };
        event_loop.run_app(&mut handler)?;
        Ok(())
    }

    pub fn core(&self) -> Option<&Core> {
        self.core.as_ref()
    }
}

struct WaterAppHandler<D: FrameDriver> {
    app: WaterApp,
    creator: Option<DriverCreator<D>>,
    driver: Option<D>,
}

impl<D: FrameDriver> WaterAppHandler<D> {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = WindowAttributes::default()
            .with_inner_size(LogicalSize::new(self.app.window_size.0, self.app.window_size.1))
            .with_title(&self.app.window_title)
            .with_resizable(true);
        let window = event_loop.create_window(window_attributes)?;
        let core = pollster::block_on(Core::new(window))?;
        if let Some(creator) = self.creator.take() {
            self.driver = Some(creator(&core)?);
        }
        self.app.core = Some(core);
        Ok(())
    }
}

impl<D: FrameDriver> ApplicationHandler for WaterAppHandler<D> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.core.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            error!("failed to start: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (Some(core), Some(driver)) = (&mut self.app.core, &mut self.driver) else {
            return;
        };
        if window_id != core.window().id() || driver.handle_input(core, &event) {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if core.size == size {
                    return;
                }
                core.resize(size);
                driver.resize(core);
            }
            WindowEvent::RedrawRequested => {
                driver.update(core);
                match driver.render(core) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => core.resize(core.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => warn!("render error: {e:?}"),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(core) = &self.app.core {
            core.window().request_redraw();
        }
    }
}
