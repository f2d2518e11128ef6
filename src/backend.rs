//! Compute backend selection
//!
//! The device is picked once from the `--device` flag and then passed
//! explicitly to every use case. Use cases are written once, generic over
//! an autodiff backend, and [`dispatch`] instantiates them for the chosen one.
//!
//! - `cpu`  → `Autodiff<NdArray>`
//! - `gpu`  → `Autodiff<Wgpu>` when built with the `wgpu` feature and
//!            an adapter answers, otherwise a warning and the CPU backend
//! - `auto` → GPU if compiled in and usable, else CPU

use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use burn::tensor::backend::AutodiffBackend;
#[cfg(feature = "wgpu")]
use burn::{
    backend::{wgpu::WgpuDevice, Wgpu},
    tensor::Tensor,
};
use clap::ValueEnum;

/// Device requested on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DeviceChoice {
    #[default]
    Auto,
    Cpu,
    Gpu,
}

/// Backend actually used for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeTarget {
    Cpu,
    #[cfg(feature = "wgpu")]
    Gpu,
}

impl ComputeTarget {
    pub fn name(&self) -> &'static str {
        match self {
            ComputeTarget::Cpu => "NdArray (CPU)",
            #[cfg(feature = "wgpu")]
            ComputeTarget::Gpu => "WGPU",
        }
    }
}

/// Work that can run on any autodiff backend.
pub trait BackendTask {
    type Output;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Self::Output;
}

pub fn resolve(choice: DeviceChoice) -> ComputeTarget {
    resolve_with(choice, gpu_usable)
}

#[cfg(feature = "wgpu")]
fn gpu_usable() -> bool {
    gpu_adapter_available(&WgpuDevice::default())
}

#[cfg(not(feature = "wgpu"))]
fn gpu_usable() -> bool {
    false
}

/// Pick the backend for `choice`; `gpu_usable` is only asked when a GPU
/// could be used at all.
fn resolve_with(choice: DeviceChoice, gpu_usable: impl FnOnce() -> bool) -> ComputeTarget {
    if choice == DeviceChoice::Cpu {
        return ComputeTarget::Cpu;
    }

    #[cfg(feature = "wgpu")]
    {
        if gpu_usable() {
            return ComputeTarget::Gpu;
        }
        tracing::warn!("No usable GPU adapter found; falling back to CPU");
    }
    #[cfg(not(feature = "wgpu"))]
    {
        let _ = gpu_usable;
        if choice == DeviceChoice::Gpu {
            tracing::warn!("GPU requested but this build has no wgpu backend; falling back to CPU");
        }
    }
    ComputeTarget::Cpu
}

/// Run one tiny op on `device`. cubecl panics when no adapter exists,
/// so the panic is caught here and the hook silenced meanwhile.
#[cfg(feature = "wgpu")]
fn gpu_adapter_available(device: &WgpuDevice) -> bool {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(|info| {
        tracing::debug!("GPU adapter check failed: {info}");
    }));
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = Tensor::<Wgpu, 1>::zeros([1], device).into_data();
    }));
    std::panic::set_hook(previous);
    outcome.is_ok()
}

pub fn dispatch<T: BackendTask>(choice: DeviceChoice, task: T) -> T::Output {
    let target = resolve(choice);
    tracing::info!("Using {} backend", target.name());

    match target {
        ComputeTarget::Cpu => task.run::<Autodiff<NdArray>>(NdArrayDevice::Cpu),
        #[cfg(feature = "wgpu")]
        ComputeTarget::Gpu => {
            let device = WgpuDevice::default();
            tracing::info!("WGPU device: {:?}", device);
            task.run::<Autodiff<Wgpu>>(device)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DeviceName;

    impl BackendTask for DeviceName {
        type Output = String;

        fn run<B: AutodiffBackend>(self, device: B::Device) -> String {
            format!("{device:?}")
        }
    }

    #[test]
    fn test_cpu_is_always_available() {
        assert_eq!(resolve(DeviceChoice::Cpu), ComputeTarget::Cpu);
        assert_eq!(dispatch(DeviceChoice::Cpu, DeviceName), format!("{:?}", NdArrayDevice::Cpu));
    }

    #[test]
    fn test_no_adapter_falls_back_to_cpu() {
        assert_eq!(resolve_with(DeviceChoice::Auto, || false), ComputeTarget::Cpu);
        assert_eq!(resolve_with(DeviceChoice::Gpu, || false), ComputeTarget::Cpu);
    }

    #[test]
    fn test_cpu_choice_skips_the_gpu_check() {
        let target = resolve_with(DeviceChoice::Cpu, || panic!("gpu checked"));
        assert_eq!(target, ComputeTarget::Cpu);
    }

    #[cfg(feature = "wgpu")]
    #[test]
    fn test_usable_adapter_selects_gpu() {
        assert_eq!(resolve_with(DeviceChoice::Auto, || true), ComputeTarget::Gpu);
        assert_eq!(resolve_with(DeviceChoice::Gpu, || true), ComputeTarget::Gpu);
    }

    #[cfg(not(feature = "wgpu"))]
    #[test]
    fn test_gpu_falls_back_to_cpu_without_wgpu() {
        assert_eq!(resolve(DeviceChoice::Gpu), ComputeTarget::Cpu);
        assert_eq!(resolve(DeviceChoice::Auto), ComputeTarget::Cpu);
    }
}
