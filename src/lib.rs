// vk-smoke - minimal Vulkan bring-up checks
//
// Three small programs share this library: headless device setup, window
// surface + swapchain setup, and a GPU buffer fill with readback. Every
// wrapper type releases its handles in reverse creation order.

pub mod backend;
pub mod config;
pub mod fill;

pub use backend::{Commands, DeviceBuffer, InitError, Presentation, VulkanContext};
pub use config::Config;

/// Initialize logging from the environment, defaulting to info level.
pub fn init_logging() {
    use env_logger::Builder;
    use log::LevelFilter;

    let mut builder = Builder::from_default_env();
    builder.filter_level(LevelFilter::Info);
    builder.init();
}
