// Failure kinds for the setup sequences
//
// Every fallible setup step returns one of these instead of discarding the
// driver's result code. Already-acquired resources are released in reverse
// order on the way out regardless of which step failed.

use ash::vk;

/// An error raised while bringing up a Vulkan context or its resources.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The Vulkan loader could not be found or initialized.
    #[error("Vulkan driver unavailable")]
    Driver(#[from] ash::LoadingError),

    /// The configured accelerator index does not exist (including the case
    /// where the driver enumerates zero accelerators).
    #[error("accelerator index {requested} out of range: {available} accelerator(s) enumerated")]
    NoAccelerator { requested: usize, available: usize },

    /// The configured queue family index does not exist on the selected
    /// accelerator.
    #[error("queue family {requested} out of range: accelerator reports {available} families")]
    NoQueueFamily { requested: u32, available: u32 },

    /// The selected queue family cannot present to the bound surface.
    #[error("queue family {queue_family} cannot present to the window surface")]
    NoPresentSupport { queue_family: u32 },

    /// The context was created headless but a surface-dependent operation
    /// was requested.
    #[error("context was created without a window surface")]
    NoSurface,

    /// The driver reported no supported surface formats.
    #[error("driver reported no supported surface formats")]
    NoSurfaceFormat,

    /// No memory type satisfies both the resource's compatibility mask and
    /// the required property flags.
    #[error("no compatible memory type (type bits {type_bits:#b}, required flags {flags:?})")]
    NoCompatibleMemory {
        type_bits: u32,
        flags: vk::MemoryPropertyFlags,
    },

    /// A driver call failed partway through a setup sequence.
    #[error("{stage} failed: {source}")]
    Vk {
        stage: &'static str,
        #[source]
        source: vk::Result,
    },
}

impl InitError {
    pub(crate) fn vk(stage: &'static str, source: vk::Result) -> Self {
        Self::Vk { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_diagnostic_detail() {
        let err = InitError::NoAccelerator {
            requested: 0,
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "accelerator index 0 out of range: 0 accelerator(s) enumerated"
        );

        let err = InitError::NoPresentSupport { queue_family: 3 };
        assert!(err.to_string().contains("queue family 3"));

        let err = InitError::vk("create_buffer", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        let text = err.to_string();
        assert!(text.starts_with("create_buffer failed"));
    }
}
