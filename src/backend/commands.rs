// Command recording and submission
//
// One pool + one primary command buffer, driven synchronously: record,
// submit with no fence, wait for the queue to drain.

use ash::vk;

use crate::backend::context::VulkanContext;
use crate::backend::error::InitError;

/// Command pool with a single primary command buffer. The buffer is freed
/// and the pool destroyed on drop, in that order.
pub struct Commands {
    pub pool: vk::CommandPool,
    pub buffer: vk::CommandBuffer,
    queue: vk::Queue,
    device: ash::Device,
}

impl Commands {
    pub fn new(context: &VulkanContext) -> Result<Self, InitError> {
        let device = &context.device;

        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(context.queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { device.create_command_pool(&pool_info, None) }
            .map_err(|e| InitError::vk("create_command_pool", e))?;

        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let buffer = match unsafe { device.allocate_command_buffers(&alloc_info) } {
            Ok(buffers) => buffers[0],
            Err(e) => {
                unsafe { device.destroy_command_pool(pool, None) };
                return Err(InitError::vk("allocate_command_buffers", e));
            }
        };

        Ok(Self {
            pool,
            buffer,
            queue: context.queue,
            device: device.clone(),
        })
    }

    /// Record commands via `record`, submit them once and block until the
    /// queue has drained. Submission uses no fence; completion is observed
    /// through the queue wait.
    pub fn submit_once<F>(&self, record: F) -> Result<(), InitError>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let begin_info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe { self.device.begin_command_buffer(self.buffer, &begin_info) }
            .map_err(|e| InitError::vk("begin_command_buffer", e))?;

        record(&self.device, self.buffer);

        unsafe { self.device.end_command_buffer(self.buffer) }
            .map_err(|e| InitError::vk("end_command_buffer", e))?;

        let buffers = [self.buffer];
        let submit_info = vk::SubmitInfo::builder().command_buffers(&buffers).build();

        unsafe {
            self.device
                .queue_submit(self.queue, &[submit_info], vk::Fence::null())
                .map_err(|e| InitError::vk("queue_submit", e))?;

            self.device
                .queue_wait_idle(self.queue)
                .map_err(|e| InitError::vk("queue_wait_idle", e))?;
        }

        Ok(())
    }
}

impl Drop for Commands {
    fn drop(&mut self) {
        unsafe {
            self.device.free_command_buffers(self.pool, &[self.buffer]);
            self.device.destroy_command_pool(self.pool, None);
        }
    }
}
