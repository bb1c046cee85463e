// Vulkan context - shared instance, accelerator and device state
//
// Responsibilities:
// - Instance creation with optional validation layers
// - Window surface creation (when a window is attached)
// - Accelerator + queue family selection from config
// - Logical device + queue creation

use std::ffi::CStr;
use std::os::raw::c_char;

use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::backend::error::InitError;
use crate::config::Config;

/// Window surface handle bundled with the extension loader that owns it.
pub struct SurfaceState {
    pub loader: ash::extensions::khr::Surface,
    pub handle: vk::SurfaceKHR,
}

/// Vulkan context wrapper with automatic cleanup.
///
/// Owns everything from the instance down to the logical device. Teardown
/// happens in [`Drop`], strictly in reverse creation order: device, surface,
/// debug messenger, instance.
pub struct VulkanContext {
    pub device: ash::Device,
    pub queue: vk::Queue,
    pub queue_family_index: u32,
    pub physical_device: vk::PhysicalDevice,

    // Device properties (cached at creation)
    pub properties: vk::PhysicalDeviceProperties,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,

    surface: Option<SurfaceState>,
    debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
    pub instance: ash::Instance,
    _entry: Entry,
}

impl VulkanContext {
    /// Create a headless context: no surface, no swapchain extension.
    pub fn new(config: &Config) -> Result<Self, InitError> {
        Self::create(config, None)
    }

    /// Create a context bound to a window surface. The selected queue family
    /// must be able to present to it.
    pub fn with_surface(
        config: &Config,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<Self, InitError> {
        Self::create(config, Some((display, window)))
    }

    fn create(
        config: &Config,
        window: Option<(RawDisplayHandle, RawWindowHandle)>,
    ) -> Result<Self, InitError> {
        log::info!("Creating Vulkan context");

        // Step 1: Load Vulkan library
        let entry = unsafe { Entry::load() }?;

        // Validation layers per config, debug builds only
        let enable_validation = cfg!(debug_assertions) && config.debug.validation_layers;

        // Step 2: Create instance
        let instance =
            Self::create_instance(&entry, config, window.map(|(d, _)| d), enable_validation)?;

        // Step 3: Setup debug messenger if validation enabled
        let debug_utils = if enable_validation {
            match Self::setup_debug_messenger(&entry, &instance) {
                Ok(pair) => Some(pair),
                Err(err) => {
                    unsafe { Self::release_partial(&instance, None, None) };
                    return Err(err);
                }
            }
        } else {
            None
        };

        // Step 4: Create window surface if a window was attached
        let surface = match window {
            Some((display, window)) => {
                match Self::create_surface(&entry, &instance, display, window) {
                    Ok(state) => Some(state),
                    Err(err) => {
                        unsafe { Self::release_partial(&instance, debug_utils, None) };
                        return Err(err);
                    }
                }
            }
            None => None,
        };

        // Step 5: Select accelerator + queue family, create logical device
        let selected = Self::select_and_create_device(&instance, config, surface.as_ref());
        let (physical_device, device, queue, queue_family_index) = match selected {
            Ok(parts) => parts,
            Err(err) => {
                unsafe { Self::release_partial(&instance, debug_utils, surface) };
                return Err(err);
            }
        };

        // Step 6: Cache device properties
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let memory_properties =
            unsafe { instance.get_physical_device_memory_properties(physical_device) };

        log::info!(
            "Selected accelerator: {}",
            unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }.to_string_lossy()
        );
        log::info!(
            "API Version: {}.{}.{}",
            vk::api_version_major(properties.api_version),
            vk::api_version_minor(properties.api_version),
            vk::api_version_patch(properties.api_version)
        );

        Ok(Self {
            device,
            queue,
            queue_family_index,
            physical_device,
            properties,
            memory_properties,
            surface,
            debug_utils,
            instance,
            _entry: entry,
        })
    }

    fn create_instance(
        entry: &Entry,
        config: &Config,
        display: Option<RawDisplayHandle>,
        enable_validation: bool,
    ) -> Result<ash::Instance, InitError> {
        let app_info = vk::ApplicationInfo::builder()
            .application_name(c"vk-smoke")
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(c"vk-smoke")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(config.device.vk_api_version());

        // Surface extensions only when a window is attached; a headless
        // context needs none.
        let mut extensions: Vec<*const c_char> = match display {
            Some(display) => ash_window::enumerate_required_extensions(display)
                .map_err(|e| InitError::vk("enumerate_required_extensions", e))?
                .to_vec(),
            None => Vec::new(),
        };

        let mut layers: Vec<*const c_char> = Vec::new();
        if enable_validation {
            extensions.push(DebugUtils::name().as_ptr());
            layers.push(c"VK_LAYER_KHRONOS_validation".as_ptr());
        }

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        unsafe { entry.create_instance(&create_info, None) }
            .map_err(|e| InitError::vk("create_instance", e))
    }

    fn setup_debug_messenger(
        entry: &Entry,
        instance: &ash::Instance,
    ) -> Result<(DebugUtils, vk::DebugUtilsMessengerEXT), InitError> {
        let debug_utils = DebugUtils::new(entry, instance);

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }
            .map_err(|e| InitError::vk("create_debug_utils_messenger", e))?;

        Ok((debug_utils, messenger))
    }

    fn create_surface(
        entry: &Entry,
        instance: &ash::Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<SurfaceState, InitError> {
        let loader = ash::extensions::khr::Surface::new(entry, instance);
        let handle = unsafe { ash_window::create_surface(entry, instance, display, window, None) }
            .map_err(|e| InitError::vk("create_surface", e))?;
        log::debug!("Window surface created");
        Ok(SurfaceState { loader, handle })
    }

    fn select_and_create_device(
        instance: &ash::Instance,
        config: &Config,
        surface: Option<&SurfaceState>,
    ) -> Result<(vk::PhysicalDevice, ash::Device, vk::Queue, u32), InitError> {
        let accelerators = unsafe { instance.enumerate_physical_devices() }
            .map_err(|e| InitError::vk("enumerate_physical_devices", e))?;
        for (i, &accelerator) in accelerators.iter().enumerate() {
            let props = unsafe { instance.get_physical_device_properties(accelerator) };
            log::debug!(
                "Accelerator {}: {} ({:?}, API {}.{}.{})",
                i,
                unsafe { CStr::from_ptr(props.device_name.as_ptr()) }.to_string_lossy(),
                props.device_type,
                vk::api_version_major(props.api_version),
                vk::api_version_minor(props.api_version),
                vk::api_version_patch(props.api_version)
            );
        }

        let physical_device = select_accelerator(&accelerators, config.device.adapter_index)?;

        let families =
            unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
        let queue_family_index = select_queue_family(&families, config.device.queue_family_index)?;
        log::debug!(
            "Queue family {} flags: {:?}",
            queue_family_index,
            families[queue_family_index as usize].queue_flags
        );

        if let Some(state) = surface {
            let supported = unsafe {
                state.loader.get_physical_device_surface_support(
                    physical_device,
                    queue_family_index,
                    state.handle,
                )
            }
            .map_err(|e| InitError::vk("get_physical_device_surface_support", e))?;
            if !supported {
                return Err(InitError::NoPresentSupport {
                    queue_family: queue_family_index,
                });
            }
        }

        let (device, queue) = Self::create_logical_device(
            instance,
            physical_device,
            queue_family_index,
            surface.is_some(),
        )?;

        Ok((physical_device, device, queue, queue_family_index))
    }

    fn create_logical_device(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        presentation: bool,
    ) -> Result<(ash::Device, vk::Queue), InitError> {
        let queue_priorities = [1.0];
        let queue_create_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family_index)
            .queue_priorities(&queue_priorities)
            .build();

        let mut extensions: Vec<*const c_char> = Vec::new();
        if presentation {
            extensions.push(ash::extensions::khr::Swapchain::name().as_ptr());
        }

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(std::slice::from_ref(&queue_create_info))
            .enabled_extension_names(&extensions);

        let device = unsafe { instance.create_device(physical_device, &create_info, None) }
            .map_err(|e| InitError::vk("create_device", e))?;

        let queue = unsafe { device.get_device_queue(queue_family_index, 0) };

        Ok((device, queue))
    }

    // Reverse-order release for setup failures after instance creation.
    unsafe fn release_partial(
        instance: &ash::Instance,
        debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
        surface: Option<SurfaceState>,
    ) {
        if let Some(state) = surface {
            state.loader.destroy_surface(state.handle, None);
        }
        if let Some((loader, messenger)) = debug_utils {
            loader.destroy_debug_utils_messenger(messenger, None);
        }
        instance.destroy_instance(None);
    }

    /// Surface state, or [`InitError::NoSurface`] for headless contexts.
    pub fn surface(&self) -> Result<&SurfaceState, InitError> {
        self.surface.as_ref().ok_or(InitError::NoSurface)
    }

    /// Wait for the device to go idle (e.g. before releasing resources).
    pub fn wait_idle(&self) -> Result<(), InitError> {
        unsafe { self.device.device_wait_idle() }
            .map_err(|e| InitError::vk("device_wait_idle", e))
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        log::info!("Destroying Vulkan context...");

        let _ = self.wait_idle();

        // Cleanup in reverse order
        unsafe {
            self.device.destroy_device(None);

            if let Some(state) = self.surface.take() {
                state.loader.destroy_surface(state.handle, None);
            }

            if let Some((debug_utils, messenger)) = self.debug_utils.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

/// Pick the accelerator at the configured index from the enumerated list.
pub(crate) fn select_accelerator(
    accelerators: &[vk::PhysicalDevice],
    requested: usize,
) -> Result<vk::PhysicalDevice, InitError> {
    accelerators
        .get(requested)
        .copied()
        .ok_or(InitError::NoAccelerator {
            requested,
            available: accelerators.len(),
        })
}

/// Validate the configured queue family index against the reported families.
pub(crate) fn select_queue_family(
    families: &[vk::QueueFamilyProperties],
    requested: u32,
) -> Result<u32, InitError> {
    if (requested as usize) < families.len() {
        Ok(requested)
    } else {
        Err(InitError::NoQueueFamily {
            requested,
            available: families.len() as u32,
        })
    }
}

// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = CStr::from_ptr((*p_callback_data).p_message);

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Vulkan] {}", message.to_string_lossy());
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Vulkan] {}", message.to_string_lossy());
        }
        _ => {
            log::debug!("[Vulkan] {}", message.to_string_lossy());
        }
    }

    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerator_selection_respects_configured_index() {
        let devices = [vk::PhysicalDevice::null(), vk::PhysicalDevice::null()];
        assert!(select_accelerator(&devices, 1).is_ok());

        match select_accelerator(&devices, 2) {
            Err(InitError::NoAccelerator {
                requested,
                available,
            }) => {
                assert_eq!(requested, 2);
                assert_eq!(available, 2);
            }
            other => panic!("expected NoAccelerator, got {other:?}"),
        }
    }

    #[test]
    fn empty_enumeration_is_reported_not_indexed() {
        assert!(matches!(
            select_accelerator(&[], 0),
            Err(InitError::NoAccelerator {
                requested: 0,
                available: 0,
            })
        ));
    }

    #[test]
    fn queue_family_selection_validates_range() {
        let families = vec![vk::QueueFamilyProperties::default(); 3];
        assert_eq!(select_queue_family(&families, 0).unwrap(), 0);
        assert_eq!(select_queue_family(&families, 2).unwrap(), 2);
        assert!(matches!(
            select_queue_family(&families, 3),
            Err(InitError::NoQueueFamily {
                requested: 3,
                available: 3,
            })
        ));
    }
}
