// ─── Fehler‑Typ ───────────────────────────────────────────────────────

use std::{fmt, path::PathBuf};

use crate::runtime::DeviceKind;

pub type Result<T> = std::result::Result<T, ClError>;

/// One step of the acquire → dispatch → read‑back sequence.
///
/// The `Display` text is the message printed when the step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Platform,
    Device,
    Context,
    Queue,
    Buffer,
    Source,
    Program,
    Kernel,
    Argument,
    Write,
    Enqueue,
    ReadBack,
    Finish,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Platform => "platform",
            Stage::Device   => "device",
            Stage::Context  => "context",
            Stage::Queue    => "queue",
            Stage::Buffer   => "buffer",
            Stage::Source   => "source",
            Stage::Program  => "program",
            Stage::Kernel   => "kernel",
            Stage::Argument => "argument",
            Stage::Write    => "write",
            Stage::Enqueue  => "enqueue",
            Stage::ReadBack => "read_back",
            Stage::Finish   => "finish",
        }
    }

    fn failure(self) -> &'static str {
        match self {
            Stage::Platform => "failed to get platform IDs",
            Stage::Device   => "failed to get device IDs",
            Stage::Context  => "failed to create context",
            Stage::Queue    => "failed to create command queue",
            Stage::Buffer   => "failed to create buffer",
            Stage::Source   => "failed to load kernel source",
            Stage::Program  => "failed to build program",
            Stage::Kernel   => "failed to create kernel",
            Stage::Argument => "failed to set kernel argument",
            Stage::Write    => "failed to write buffer",
            Stage::Enqueue  => "failed to enqueue kernel",
            Stage::ReadBack => "failed to read buffer",
            Stage::Finish   => "failed to finish command queue",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ClError {
    #[error("Error({code}): {stage} ({})", status_name(*code))]
    Api { stage: Stage, code: i32 },

    #[error("failed to get valid platform number")]
    NoPlatform,

    #[error("platform index {index} out of range ({count} platform(s))")]
    PlatformIndex { index: usize, count: usize },

    #[error("no {kind} device on the selected platform")]
    NoDevice { kind: DeviceKind },

    #[error("device index {index} out of range ({count} device(s))")]
    DeviceIndex { index: usize, count: usize },

    #[error("failed to read kernel source {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("kernel source {} is empty", path.display())]
    EmptySource { path: PathBuf },

    #[error("failed to build program:\n{log}")]
    Build { log: String },

    #[error("invalid element count: {0}")]
    InvalidSize(usize),

    #[error("host slice has {actual} element(s), session expects {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("session not ready for {}", .0.as_str())]
    NotReady(Stage),

    #[error("result mismatch at index {index}: expected {expected}, got {actual}")]
    Verification { index: usize, expected: f32, actual: f32 },
}

/// Attaches the failing [`Stage`] to a native status code.
pub trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T>;
}

impl<T> AtStage<T> for std::result::Result<T, opencl3::error_codes::ClError> {
    #[inline]
    fn at(self, stage: Stage) -> Result<T> {
        self.map_err(|e| ClError::Api { stage, code: e.0 })
    }
}

/// Symbolic name of an OpenCL status code.
pub fn status_name(code: i32) -> &'static str {
    match code {
        0     => "CL_SUCCESS",
        -1    => "CL_DEVICE_NOT_FOUND",
        -2    => "CL_DEVICE_NOT_AVAILABLE",
        -3    => "CL_COMPILER_NOT_AVAILABLE",
        -4    => "CL_MEM_OBJECT_ALLOCATION_FAILURE",
        -5    => "CL_OUT_OF_RESOURCES",
        -6    => "CL_OUT_OF_HOST_MEMORY",
        -7    => "CL_PROFILING_INFO_NOT_AVAILABLE",
        -8    => "CL_MEM_COPY_OVERLAP",
        -9    => "CL_IMAGE_FORMAT_MISMATCH",
        -10   => "CL_IMAGE_FORMAT_NOT_SUPPORTED",
        -11   => "CL_BUILD_PROGRAM_FAILURE",
        -12   => "CL_MAP_FAILURE",
        -30   => "CL_INVALID_VALUE",
        -31   => "CL_INVALID_DEVICE_TYPE",
        -32   => "CL_INVALID_PLATFORM",
        -33   => "CL_INVALID_DEVICE",
        -34   => "CL_INVALID_CONTEXT",
        -35   => "CL_INVALID_QUEUE_PROPERTIES",
        -36   => "CL_INVALID_COMMAND_QUEUE",
        -37   => "CL_INVALID_HOST_PTR",
        -38   => "CL_INVALID_MEM_OBJECT",
        -42   => "CL_INVALID_BINARY",
        -43   => "CL_INVALID_BUILD_OPTIONS",
        -44   => "CL_INVALID_PROGRAM",
        -45   => "CL_INVALID_PROGRAM_EXECUTABLE",
        -46   => "CL_INVALID_KERNEL_NAME",
        -47   => "CL_INVALID_KERNEL_DEFINITION",
        -48   => "CL_INVALID_KERNEL",
        -49   => "CL_INVALID_ARG_INDEX",
        -50   => "CL_INVALID_ARG_VALUE",
        -51   => "CL_INVALID_ARG_SIZE",
        -52   => "CL_INVALID_KERNEL_ARGS",
        -53   => "CL_INVALID_WORK_DIMENSION",
        -54   => "CL_INVALID_WORK_GROUP_SIZE",
        -55   => "CL_INVALID_WORK_ITEM_SIZE",
        -56   => "CL_INVALID_GLOBAL_OFFSET",
        -57   => "CL_INVALID_EVENT_WAIT_LIST",
        -58   => "CL_INVALID_EVENT",
        -59   => "CL_INVALID_OPERATION",
        -61   => "CL_INVALID_BUFFER_SIZE",
        -63   => "CL_INVALID_GLOBAL_WORK_SIZE",
        -1001 => "CL_PLATFORM_NOT_FOUND_KHR",
        _     => "unknown status",
    }
}
