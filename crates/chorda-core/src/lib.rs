pub mod buffer;
pub mod chord;
pub mod config;
pub mod dispatch;
pub mod expand;
#[cfg(windows)]
pub mod hook;
pub mod keymap;
pub mod mode;
pub mod tables;
pub mod types;

pub use buffer::{Deletion, EditBuffer, Unit};
pub use chord::ChordEngine;
pub use config::Settings;
pub use dispatch::Dispatcher;
pub use expand::{health_check, ExpansionJob, ExpansionWorker, ServiceConfig, ServiceError};
pub use mode::ModeController;
pub use types::{ChordOutcome, HookAction, InjectOp, KeyEdge, Mode, Notification, RawKeyEvent};
