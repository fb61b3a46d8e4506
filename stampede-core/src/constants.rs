use std::time::Duration;

pub const DEFAULT_VIRTUAL_USERS: u32 = 10;
pub const DEFAULT_DURATION: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
