// Window surface + swapchain setup check
//
// Opens an invisible fixed-size window, brings up a Vulkan context against
// its surface, builds the swapchain and its image views, then tears the
// whole stack down and exits. Exits non-zero if any step fails.

use anyhow::Result;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
use vk_smoke::{init_logging, Config, Presentation, VulkanContext};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

fn main() -> Result<()> {
    init_logging();

    let config = Config::load();
    log::info!("Window: {}x{}", config.window.width, config.window.height);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    app.outcome
}

/// Application state for the one-shot swapchain check.
///
/// Field order matters for drop: swapchain resources first, then the
/// context (device, surface, instance), then the window itself.
struct App {
    config: Config,
    outcome: Result<()>,
    presentation: Option<Presentation>,
    context: Option<VulkanContext>,
    window: Option<Window>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            outcome: Ok(()),
            presentation: None,
            context: None,
            window: None,
        }
    }

    fn bootstrap(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        // The window stays hidden: it exists only to back the surface
        let window_attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_resizable(false)
            .with_visible(false);

        let window = event_loop.create_window(window_attributes)?;

        let context = VulkanContext::with_surface(
            &self.config,
            window.raw_display_handle(),
            window.raw_window_handle(),
        )?;
        let presentation = Presentation::new(&context)?;

        log::info!(
            "Swapchain ready: {} image view(s), format {:?}, {}x{}",
            presentation.image_views.len(),
            presentation.format,
            presentation.extent.width,
            presentation.extent.height
        );

        self.presentation = Some(presentation);
        self.context = Some(context);
        self.window = Some(window);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.bootstrap(event_loop) {
            log::error!("Swapchain setup failed: {:?}", e);
            self.outcome = Err(e);
        }

        // One-shot check: leave the loop as soon as setup has run
        event_loop.exit();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::CloseRequested = event {
            event_loop.exit();
        }
    }

    // Runs before run_app returns, so everything is released while the
    // windowing subsystem is still alive: views and swapchain, then the
    // context, then the window, and the event loop itself last.
    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.presentation = None;
        self.context = None;
        self.window = None;
        log::info!("Teardown complete");
    }
}
