//! The tutorial programs: platform count, device listing and the full
//! dispatch with optional read-back.

use std::{fs, path::Path};

use log::{info, warn};

use crate::config::SampleConfig;
use crate::error::{ClError, Result};
use crate::runtime::{DeviceInfo, DeviceKind, PlatformInfo, Runtime};
use crate::session::{list_platforms, Session};

/// Relative tolerance when checking device results against the host.
pub const TOLERANCE: f32 = 1e-5;

/// What a finished [`run`] saw.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub platform: PlatformInfo,
    pub device: DeviceInfo,
    pub elements: usize,
    /// `true` when the output was read back and matched the host reference.
    pub verified: bool,
    /// Leading output values, empty without read-back.
    pub head: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformListing {
    pub info: PlatformInfo,
    pub devices: Vec<DeviceInfo>,
}

/// Reads the kernel source from `path`.
pub fn load_kernel_source(path: &Path) -> Result<String> {
    let src = fs::read_to_string(path).map_err(|source| ClError::Source {
        path: path.to_path_buf(),
        source,
    })?;
    if src.trim().is_empty() {
        return Err(ClError::EmptySource { path: path.to_path_buf() });
    }
    Ok(src)
}

/// Every platform the runtime reports. Zero platforms is an error.
pub fn enumerate_platforms<R: Runtime>(rt: &R) -> Result<Vec<PlatformInfo>> {
    let platforms = list_platforms(rt)?;
    platforms.iter().map(|p| rt.platform_info(p)).collect()
}

/// Devices of `kind` per platform. A platform without such devices is
/// listed with an empty device list.
pub fn enumerate_devices<R: Runtime>(rt: &R, kind: DeviceKind) -> Result<Vec<PlatformListing>> {
    let platforms = list_platforms(rt)?;

    let mut listings = Vec::with_capacity(platforms.len());
    for platform in &platforms {
        let info = rt.platform_info(platform)?;
        let devices = rt
            .devices(platform, kind)?
            .iter()
            .map(|d| rt.device_info(d))
            .collect::<Result<Vec<_>>>()?;
        if devices.is_empty() {
            info!("platform `{}` has no {kind} device", info.name);
        }
        listings.push(PlatformListing { info, devices });
    }
    Ok(listings)
}

/// Host reference for the `square` kernel.
pub fn square_reference(input: &[f32]) -> Vec<f32> {
    input.iter().map(|x| x * x).collect()
}

/// Compares `actual` against `expected` element by element.
pub fn verify(expected: &[f32], actual: &[f32]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(ClError::LengthMismatch { expected: expected.len(), actual: actual.len() });
    }
    for (index, (&e, &a)) in expected.iter().zip(actual).enumerate() {
        if (e - a).abs() > TOLERANCE * e.abs().max(1.0) || a.is_nan() {
            return Err(ClError::Verification { index, expected: e, actual: a });
        }
    }
    Ok(())
}

/// The full tutorial: acquire, build, dispatch, optionally read back.
/// Every handle is released when the session goes out of scope, on the
/// error paths as well.
pub fn run<R: Runtime>(rt: &R, cfg: &SampleConfig) -> Result<RunReport> {
    /* ---------- 1. Plattform, Gerät, Kontext, Queue, Buffer ---------- */
    let mut session = Session::open(rt, cfg)?;
    let platform = rt.platform_info(session.platform())?;
    let device = rt.device_info(session.device())?;
    info!("platform `{}`, device `{}`", platform.name, device.name);

    /* ---------- 2. Kernel einlesen & bauen ---------------------------- */
    let source = load_kernel_source(&cfg.kernel_path)?;
    if let Err(err) = session.load_kernel(&source, &cfg.kernel_name, &cfg.build_options) {
        if matches!(err, ClError::Build { .. }) {
            warn!("build of {} failed", cfg.kernel_path.display());
        }
        return Err(err);
    }

    /* ---------- 3. Hostdaten & Dispatch ------------------------------ */
    let input: Vec<f32> = (0..cfg.elements).map(|i| i as f32).collect();
    session.dispatch(&input)?;
    info!("kernel `{}` dispatched over {} element(s)", cfg.kernel_name, cfg.elements);

    let mut report = RunReport {
        platform,
        device,
        elements: cfg.elements,
        verified: false,
        head: Vec::new(),
    };

    /* ---------- 4. Device → Host & Verifizieren ----------------------- */
    if cfg.read_back {
        let mut output = vec![0.0_f32; cfg.elements];
        session.read_back(&mut output)?;
        verify(&square_reference(&input), &output)?;
        report.verified = true;
        report.head = output.into_iter().take(4).collect();
    }

    Ok(report)
}
