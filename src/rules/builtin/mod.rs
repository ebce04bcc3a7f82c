pub mod device_mismatch;
pub mod ip_blocklist;
pub mod velocity;

pub use device_mismatch::DeviceMismatchRule;
pub use ip_blocklist::IpBlocklistRule;
pub use velocity::VelocityRule;
