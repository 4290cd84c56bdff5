pub mod command_device;
pub mod device;

pub use command_device::{CommandDevice, DeviceHandle};
pub use device::DeviceControl;
