//! OpenCL tutorials: platform and device discovery, context and queue
//! creation, buffer allocation, kernel build and a single dispatch with
//! optional read-back.
//!
//! All handles of one run live in a [`Session`] and are released in reverse
//! creation order when it is dropped.

// ─── Feature‑Module ───────────────────────────────────────────────────
#[cfg(feature = "metrics")]
pub mod metrics;
#[cfg(feature = "metrics")]
pub use metrics::summary;

// ─── Module ───────────────────────────────────────────────────────────
pub mod config;
pub mod error;
pub mod opencl;
pub mod runtime;
pub mod session;
pub mod tutorial;

pub use config::{SampleConfig, BUFFER_COUNT, DEFAULT_ELEMENTS, DEFAULT_KERNEL_NAME, DEFAULT_KERNEL_PATH};
pub use error::{AtStage, ClError, Result, Stage, status_name};
pub use opencl::OpenCl;
pub use runtime::{DeviceInfo, DeviceKind, MemAccess, PlatformInfo, Runtime};
pub use session::{Session, list_platforms, select_device, select_platform, CL_PLATFORM_NOT_FOUND_KHR};
pub use tutorial::{
    enumerate_devices, enumerate_platforms, load_kernel_source, run, square_reference, verify,
    PlatformListing, RunReport,
};
