// Backend module - Vulkan abstraction layer
//
// Design: Thin wrapper around ash with safety and ergonomics
// Teardown: every wrapper releases its handles in reverse creation order

pub mod buffer;
pub mod commands;
pub mod context;
pub mod error;
pub mod presentation;

pub use buffer::DeviceBuffer;
pub use commands::Commands;
pub use context::VulkanContext;
pub use error::InitError;
pub use presentation::Presentation;
