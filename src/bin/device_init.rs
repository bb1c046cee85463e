// Headless device setup check
//
// Brings up a full Vulkan context (instance, accelerator, logical device,
// queue) without any window, then tears it down again. Exits non-zero if
// any step fails.

use anyhow::Result;
use vk_smoke::{init_logging, Config, VulkanContext};

fn main() -> Result<()> {
    init_logging();

    let config = Config::load();

    let context = VulkanContext::new(&config)?;
    log::info!(
        "Device ready: accelerator {}, queue family {}",
        config.device.adapter_index,
        context.queue_family_index
    );

    drop(context);
    log::info!("Teardown complete");
    Ok(())
}
