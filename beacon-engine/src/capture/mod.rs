mod capture_device;
mod local_capture;

pub use capture_device::*;
pub use local_capture::*;
