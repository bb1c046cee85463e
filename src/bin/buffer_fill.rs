// GPU buffer fill check
//
// Fills a 256 byte host-visible buffer on the GPU (whole-buffer word fill,
// then two 64 byte patches), reads it back and prints the contents as
// unsigned integers, sixteen per line. The readback is verified against the
// expected layout before exiting.

use anyhow::{bail, Result};
use ash::vk;
use vk_smoke::{fill, init_logging, Commands, Config, DeviceBuffer, VulkanContext};

fn main() -> Result<()> {
    init_logging();

    let config = Config::load();

    // Locals drop in reverse order: buffer, commands, context
    let context = VulkanContext::new(&config)?;
    let commands = Commands::new(&context)?;
    let buffer = DeviceBuffer::new(
        &context,
        fill::SIZE,
        vk::BufferUsageFlags::TRANSFER_DST,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
    )?;

    // Seed with ascending bytes before the GPU writes
    buffer.write_bytes(&fill::seed())?;

    commands.submit_once(|device, cmd| fill::record(device, cmd, buffer.buffer))?;

    let bytes = buffer.read_bytes()?;
    println!("{}", fill::format_table(&bytes));

    let expected = fill::expected();
    if let Some(i) = bytes.iter().zip(&expected).position(|(a, b)| a != b) {
        bail!(
            "readback mismatch at byte {}: got {}, expected {}",
            i,
            bytes[i],
            expected[i]
        );
    }
    log::info!("Readback verified: {} bytes match", bytes.len());

    Ok(())
}
