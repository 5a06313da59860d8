pub mod mock;
pub mod sysfs;

pub use mock::MockGateway;
pub use sysfs::FsGateway;
