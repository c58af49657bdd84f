use std::fmt;

/// Output strategy selected per frame before the culling dispatch.
///
/// Switching is free: both strategies own their output buffers and bind groups,
/// and only the shared counter is reset each frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum CullMode {
    /// One indirect command per visible element, submitted as one multi-draw.
    #[default]
    MicroBatch,
    /// Compacted visible-id list plus a single shared instanced command.
    CompactedInstance,
}

impl CullMode {
    pub const ALL: [CullMode; 2] = [CullMode::MicroBatch, CullMode::CompactedInstance];

    /// Returns the other strategy.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            CullMode::MicroBatch => CullMode::CompactedInstance,
            CullMode::CompactedInstance => CullMode::MicroBatch,
        }
    }

    /// Native draws issued for `visible` elements.
    ///
    /// Micro-batch counts one draw per command even though they go out in a
    /// single multi-draw call.
    #[inline]
    pub fn draw_submissions(self, visible: u32) -> u32 {
        match self {
            CullMode::MicroBatch => visible,
            CullMode::CompactedInstance => 1,
        }
    }

    /// Value of the `mode` uniform read by the vertex shader.
    #[inline]
    pub(crate) fn shader_id(self) -> u32 {
        match self {
            CullMode::MicroBatch => 0,
            CullMode::CompactedInstance => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CullMode::MicroBatch => "micro-batch indirect",
            CullMode::CompactedInstance => "instanced indirect",
        }
    }
}

impl fmt::Display for CullMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
