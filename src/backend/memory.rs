// Device memory - memory type selection and raw allocations
//
// Buffers and images ask for memory through here: their requirements give a
// mask of compatible memory types, the caller gives the properties it needs,
// and the lowest index satisfying both wins. There is no fallback.

use ash::vk;

use super::device::DeviceShared;
use super::error::{check, non_null, unsupported, Result};

/// Find a memory type index that is in `type_bits` and has every flag in `properties`
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    properties: vk::MemoryPropertyFlags,
) -> Option<u32> {
    let count = memory_properties
        .memory_type_count
        .min(vk::MAX_MEMORY_TYPES as u32);

    (0..count).find(|&i| {
        let has_type = (type_bits & (1 << i)) != 0;
        let has_properties = memory_properties.memory_types[i as usize]
            .property_flags
            .contains(properties);
        has_type && has_properties
    })
}

/// Allocate memory matching `requirements`. Returns the memory and the full
/// property flags of the chosen type.
pub(crate) fn allocate(
    device: &DeviceShared,
    requirements: &vk::MemoryRequirements,
    properties: vk::MemoryPropertyFlags,
) -> Result<(vk::DeviceMemory, vk::MemoryPropertyFlags)> {
    let logger = device.logger();

    let memory_type_index = find_memory_type(
        device.memory_properties(),
        requirements.memory_type_bits,
        properties,
    )
    .ok_or_else(|| {
        unsupported(
            logger,
            "Memory type",
            format!(
                "{:?} in type mask {:#b}",
                properties, requirements.memory_type_bits
            ),
        )
    })?;

    let alloc_info = vk::MemoryAllocateInfo::builder()
        .allocation_size(requirements.size)
        .memory_type_index(memory_type_index);

    let memory = check(
        logger,
        "vkAllocateMemory",
        device.driver().allocate_memory(device.handle(), &alloc_info),
    )?;
    let memory = non_null(logger, "vkAllocateMemory", memory)?;

    let type_flags = device.memory_properties().memory_types[memory_type_index as usize].property_flags;
    Ok((memory, type_flags))
}
