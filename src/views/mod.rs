pub mod shared;
pub mod troubleshoot;

pub use troubleshoot::TroubleshootView;
