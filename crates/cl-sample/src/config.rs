// ─── Konfiguration ────────────────────────────────────────────────────

use std::path::PathBuf;

use crate::error::{ClError, Result};
use crate::runtime::DeviceKind;

/// Number of `f32` elements per buffer.
pub const DEFAULT_ELEMENTS: usize = 1024;
/// Input + output.
pub const BUFFER_COUNT: usize = 2;
pub const DEFAULT_KERNEL_PATH: &str = "kernel/square.cl";
pub const DEFAULT_KERNEL_NAME: &str = "square";

/// Parameters of one tutorial run.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub platform_index: usize,
    pub device_index: usize,
    pub device_kind: DeviceKind,
    pub elements: usize,
    pub kernel_path: PathBuf,
    pub kernel_name: String,
    pub build_options: String,
    /// Read the output buffer back and check it on the host.
    pub read_back: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            platform_index: 0,
            device_index: 0,
            device_kind: DeviceKind::Gpu,
            elements: DEFAULT_ELEMENTS,
            kernel_path: PathBuf::from(DEFAULT_KERNEL_PATH),
            kernel_name: DEFAULT_KERNEL_NAME.to_owned(),
            build_options: String::new(),
            read_back: true,
        }
    }
}

impl SampleConfig {
    pub fn validate(&self) -> Result<()> {
        // der Kernel bekommt die Länge als cl_uint
        if self.elements == 0 || u32::try_from(self.elements).is_err() {
            return Err(ClError::InvalidSize(self.elements));
        }
        // Bytegröße muss in usize passen
        if self.elements.checked_mul(std::mem::size_of::<f32>()).is_none() {
            return Err(ClError::InvalidSize(self.elements));
        }
        Ok(())
    }

    /// Size of one buffer in bytes.
    pub fn buffer_bytes(&self) -> usize {
        self.elements * std::mem::size_of::<f32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tutorial_constants() {
        let cfg = SampleConfig::default();
        assert_eq!(cfg.elements, DEFAULT_ELEMENTS);
        assert_eq!(cfg.kernel_path, PathBuf::from("kernel/square.cl"));
        assert_eq!(cfg.device_kind, DeviceKind::Gpu);
        assert!(cfg.read_back);
        assert_eq!(cfg.buffer_bytes(), 4096);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_elements_is_rejected() {
        let cfg = SampleConfig { elements: 0, ..SampleConfig::default() };
        assert!(matches!(cfg.validate(), Err(ClError::InvalidSize(0))));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn element_count_must_fit_kernel_argument() {
        let cfg = SampleConfig { elements: u32::MAX as usize + 1, ..SampleConfig::default() };
        assert!(matches!(cfg.validate(), Err(ClError::InvalidSize(_))));
    }

    #[test]
    fn byte_size_overflow_is_rejected() {
        let cfg = SampleConfig { elements: usize::MAX / 2, ..SampleConfig::default() };
        assert!(matches!(cfg.validate(), Err(ClError::InvalidSize(_))));
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn u32_element_count_overflowing_bytes_is_rejected() {
        let cfg = SampleConfig { elements: u32::MAX as usize, ..SampleConfig::default() };
        assert!(matches!(cfg.validate(), Err(ClError::InvalidSize(_))));
    }
}
