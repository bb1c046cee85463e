// Presentation - window surface swapchain
//
// Creates the swapchain and its image views against the context's surface.
// Driver-reported values are taken as-is: first surface format, minimum
// image count, current extent and current transform.

use ash::vk;

use crate::backend::context::VulkanContext;
use crate::backend::error::InitError;

pub struct Presentation {
    pub swapchain: vk::SwapchainKHR,
    pub loader: ash::extensions::khr::Swapchain,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
    device: ash::Device,
}

impl Presentation {
    /// Build the swapchain and one image view per swapchain image. The
    /// context must have been created with a surface.
    pub fn new(context: &VulkanContext) -> Result<Self, InitError> {
        let surface = context.surface()?;

        // Query surface capabilities
        let caps = unsafe {
            surface.loader.get_physical_device_surface_capabilities(
                context.physical_device,
                surface.handle,
            )
        }
        .map_err(|e| InitError::vk("get_physical_device_surface_capabilities", e))?;

        // Query supported formats
        let formats = unsafe {
            surface
                .loader
                .get_physical_device_surface_formats(context.physical_device, surface.handle)
        }
        .map_err(|e| InitError::vk("get_physical_device_surface_formats", e))?;

        // Query supported present modes
        let present_modes = unsafe {
            surface
                .loader
                .get_physical_device_surface_present_modes(context.physical_device, surface.handle)
        }
        .map_err(|e| InitError::vk("get_physical_device_surface_present_modes", e))?;
        log::debug!("Surface present modes: {present_modes:?}");

        let surface_format = select_surface_format(&formats)?;

        // FIFO is always supported
        let present_mode = vk::PresentModeKHR::FIFO;
        log::info!("Present mode: {:?}", present_mode);

        // The driver's current extent and the minimum image count, verbatim
        let extent = caps.current_extent;
        let image_count = caps.min_image_count;

        log::info!("Creating swapchain: {}x{}", extent.width, extent.height);

        let loader = ash::extensions::khr::Swapchain::new(&context.instance, &context.device);

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);

        let swapchain = unsafe { loader.create_swapchain(&create_info, None) }
            .map_err(|e| InitError::vk("create_swapchain", e))?;

        // Get swapchain images
        let images = match unsafe { loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(e) => {
                unsafe { loader.destroy_swapchain(swapchain, None) };
                return Err(InitError::vk("get_swapchain_images", e));
            }
        };

        log::info!("Created swapchain with {} images", images.len());

        // Create image views; release everything built so far if one fails
        let mut image_views = Vec::with_capacity(images.len());
        for &image in &images {
            let view_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(surface_format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            match unsafe { context.device.create_image_view(&view_info, None) } {
                Ok(view) => image_views.push(view),
                Err(e) => {
                    unsafe {
                        for &view in &image_views {
                            context.device.destroy_image_view(view, None);
                        }
                        loader.destroy_swapchain(swapchain, None);
                    }
                    return Err(InitError::vk("create_image_view", e));
                }
            }
        }

        Ok(Self {
            swapchain,
            loader,
            images,
            image_views,
            format: surface_format.format,
            extent,
            device: context.device.clone(),
        })
    }
}

impl Drop for Presentation {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

// The first reported format is used as-is, whatever it is.
fn select_surface_format(
    formats: &[vk::SurfaceFormatKHR],
) -> Result<vk::SurfaceFormatKHR, InitError> {
    formats.first().copied().ok_or(InitError::NoSurfaceFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reported_format_wins() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let chosen = select_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn empty_format_list_is_an_error() {
        assert!(matches!(
            select_surface_format(&[]),
            Err(InitError::NoSurfaceFormat)
        ));
    }
}
