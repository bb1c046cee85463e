// GPU buffer allocation
//
// Provides a buffer with explicitly allocated, host-mappable device memory.
// The memory type is selected by compatibility mask + property flags.

use ash::vk;

use crate::backend::context::VulkanContext;
use crate::backend::error::InitError;

/// A buffer with its backing device memory. Memory is freed and the buffer
/// destroyed on drop, in that order.
pub struct DeviceBuffer {
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    pub size: vk::DeviceSize,
    device: ash::Device,
}

impl DeviceBuffer {
    pub fn new(
        context: &VulkanContext,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        flags: vk::MemoryPropertyFlags,
    ) -> Result<Self, InitError> {
        let device = &context.device;

        // Create buffer
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.create_buffer(&buffer_info, None) }
            .map_err(|e| InitError::vk("create_buffer", e))?;

        // Get memory requirements
        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        // Find suitable memory type
        let memory_type_index = match find_memory_type(
            &context.memory_properties,
            requirements.memory_type_bits,
            flags,
        ) {
            Some(index) => index,
            None => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(InitError::NoCompatibleMemory {
                    type_bits: requirements.memory_type_bits,
                    flags,
                });
            }
        };

        // Allocate memory
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        let memory = match unsafe { device.allocate_memory(&alloc_info, None) } {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(InitError::vk("allocate_memory", e));
            }
        };

        // Bind memory to buffer
        if let Err(e) = unsafe { device.bind_buffer_memory(buffer, memory, 0) } {
            unsafe {
                device.free_memory(memory, None);
                device.destroy_buffer(buffer, None);
            }
            return Err(InitError::vk("bind_buffer_memory", e));
        }

        log::debug!("Allocated {size} byte buffer (memory type {memory_type_index})");

        Ok(Self {
            buffer,
            memory,
            size,
            device: device.clone(),
        })
    }

    /// Copy `data` into the buffer through a temporary mapping. Requires
    /// host-visible memory and `data` no longer than the buffer.
    pub fn write_bytes(&self, data: &[u8]) -> Result<(), InitError> {
        unsafe {
            let ptr = self
                .device
                .map_memory(
                    self.memory,
                    0,
                    data.len() as vk::DeviceSize,
                    vk::MemoryMapFlags::empty(),
                )
                .map_err(|e| InitError::vk("map_memory", e))?;

            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr as *mut u8, data.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }

    /// Read the whole buffer back through a temporary mapping.
    pub fn read_bytes(&self) -> Result<Vec<u8>, InitError> {
        let mut out = vec![0u8; self.size as usize];
        unsafe {
            let ptr = self
                .device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .map_err(|e| InitError::vk("map_memory", e))?;

            std::ptr::copy_nonoverlapping(ptr as *const u8, out.as_mut_ptr(), out.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(out)
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.free_memory(self.memory, None);
            self.device.destroy_buffer(self.buffer, None);
        }
    }
}

/// Find a memory type supported by `type_bits` that carries all of `flags`.
pub(crate) fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    flags: vk::MemoryPropertyFlags,
) -> Option<u32> {
    for i in 0..memory_properties.memory_type_count {
        let has_type = (type_bits & (1 << i)) != 0;
        let has_flags = memory_properties.memory_types[i as usize]
            .property_flags
            .contains(flags);

        if has_type && has_flags {
            return Some(i);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(types: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut props = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: types.len() as u32,
            ..Default::default()
        };
        for (i, &flags) in types.iter().enumerate() {
            props.memory_types[i] = vk::MemoryType {
                property_flags: flags,
                heap_index: 0,
            };
        }
        props
    }

    const HOST: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::from_raw(
        vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw()
            | vk::MemoryPropertyFlags::HOST_COHERENT.as_raw(),
    );

    #[test]
    fn first_matching_type_is_chosen() {
        let props = props(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            HOST,
            vk::MemoryPropertyFlags::from_raw(
                HOST.as_raw() | vk::MemoryPropertyFlags::HOST_CACHED.as_raw(),
            ),
        ]);

        assert_eq!(find_memory_type(&props, 0b111, HOST), Some(1));
    }

    #[test]
    fn type_bits_mask_is_respected() {
        let props = props(&[vk::MemoryPropertyFlags::DEVICE_LOCAL, HOST, HOST]);

        // Type 1 is compatible flag-wise but excluded by the mask.
        assert_eq!(find_memory_type(&props, 0b100, HOST), Some(2));
        assert_eq!(find_memory_type(&props, 0b001, HOST), None);
    }

    #[test]
    fn device_local_only_adapter_has_no_host_visible_match() {
        let props = props(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ]);

        assert_eq!(find_memory_type(&props, u32::MAX, HOST), None);
    }
}
