// Pipeline barriers over buffers and images
//
// One call records one vkCmdPipelineBarrier holding only buffer barriers or
// only image barriers. Queue family ownership never changes hands here.

use ash::vk;

use super::command::CommandBuffer;

/// Access change over a whole buffer
#[derive(Debug, Clone, Copy)]
pub struct BufferBarrier {
    pub buffer: vk::Buffer,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
}

/// Access and layout change over every mip level and array layer of an image
#[derive(Debug, Clone, Copy)]
pub struct ImageBarrier {
    pub image: vk::Image,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    pub aspect: vk::ImageAspectFlags,
}

fn whole_range(aspect: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: aspect,
        base_mip_level: 0,
        level_count: vk::REMAINING_MIP_LEVELS,
        base_array_layer: 0,
        layer_count: vk::REMAINING_ARRAY_LAYERS,
    }
}

impl CommandBuffer {
    pub fn buffer_barriers(
        &self,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        barriers: &[BufferBarrier],
    ) {
        if barriers.is_empty() {
            return;
        }

        let barriers: Vec<vk::BufferMemoryBarrier> = barriers
            .iter()
            .map(|b| {
                vk::BufferMemoryBarrier::builder()
                    .src_access_mask(b.src_access)
                    .dst_access_mask(b.dst_access)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .buffer(b.buffer)
                    .offset(0)
                    .size(vk::WHOLE_SIZE)
                    .build()
            })
            .collect();

        let device = self.pool().device();
        device.driver().cmd_pipeline_barrier(
            device.handle(),
            self.handle(),
            src_stage,
            dst_stage,
            &barriers,
            &[],
        );
    }

    pub fn image_barriers(
        &self,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        barriers: &[ImageBarrier],
    ) {
        if barriers.is_empty() {
            return;
        }

        let barriers: Vec<vk::ImageMemoryBarrier> = barriers
            .iter()
            .map(|b| {
                vk::ImageMemoryBarrier::builder()
                    .src_access_mask(b.src_access)
                    .dst_access_mask(b.dst_access)
                    .old_layout(b.old_layout)
                    .new_layout(b.new_layout)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(b.image)
                    .subresource_range(whole_range(b.aspect))
                    .build()
            })
            .collect();

        let device = self.pool().device();
        device.driver().cmd_pipeline_barrier(
            device.handle(),
            self.handle(),
            src_stage,
            dst_stage,
            &[],
            &barriers,
        );
    }
}
