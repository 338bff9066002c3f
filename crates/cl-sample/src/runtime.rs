//! The native compute API as seen by a [`Session`](crate::Session).
//!
//! Every handle that must be released is an associated type whose `Drop`
//! releases it. Platform and device handles are plain ids and are never
//! released.

use std::fmt;

use crate::error::Result;

/// Which class of device to ask a platform for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DeviceKind {
    #[default]
    Gpu,
    Cpu,
    Accelerator,
    All,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceKind::Gpu         => "GPU",
            DeviceKind::Cpu         => "CPU",
            DeviceKind::Accelerator => "accelerator",
            DeviceKind::All         => "any",
        })
    }
}

/// Device-side access of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub name: String,
    pub vendor: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub vendor: String,
    pub compute_units: u32,
    pub global_mem_bytes: u64,
}

/// Blocking, single-threaded access to a compute runtime.
pub trait Runtime {
    type Platform: Clone;
    type Device: Clone;
    type Context;
    type Queue;
    type Buffer;
    type Program;
    type Kernel;

    fn platforms(&self) -> Result<Vec<Self::Platform>>;
    fn platform_info(&self, platform: &Self::Platform) -> Result<PlatformInfo>;

    /// Devices of `kind` under `platform`. An empty list is not an error.
    fn devices(&self, platform: &Self::Platform, kind: DeviceKind) -> Result<Vec<Self::Device>>;
    fn device_info(&self, device: &Self::Device) -> Result<DeviceInfo>;

    fn create_context(&self, device: &Self::Device) -> Result<Self::Context>;
    fn create_queue(&self, context: &Self::Context, device: &Self::Device) -> Result<Self::Queue>;
    fn create_buffer(&self, context: &Self::Context, access: MemAccess, bytes: usize)
        -> Result<Self::Buffer>;

    /// Compiles and builds `source`. A failed build returns
    /// [`ClError::Build`](crate::ClError::Build) carrying the build log.
    fn build_program(&self, context: &Self::Context, source: &str, options: &str)
        -> Result<Self::Program>;
    fn create_kernel(&self, program: &Self::Program, name: &str) -> Result<Self::Kernel>;

    fn set_buffer_arg(&self, kernel: &mut Self::Kernel, index: u32, buffer: &Self::Buffer)
        -> Result<()>;
    fn set_scalar_arg(&self, kernel: &mut Self::Kernel, index: u32, value: u32) -> Result<()>;

    /// Blocking host → device copy.
    fn write_buffer(&self, queue: &Self::Queue, buffer: &mut Self::Buffer, data: &[u8])
        -> Result<()>;
    /// 1‑D ND-range launch with `global` work items.
    fn enqueue_kernel(&self, queue: &Self::Queue, kernel: &Self::Kernel, global: usize)
        -> Result<()>;
    /// Blocking device → host copy.
    fn read_buffer(&self, queue: &Self::Queue, buffer: &mut Self::Buffer, out: &mut [u8])
        -> Result<()>;
    fn finish(&self, queue: &Self::Queue) -> Result<()>;
}
