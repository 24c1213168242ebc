// ABOUTME: Service seams consumed by the phase state machines.
// ABOUTME: One trait per external concern; a backend type implements them together.

mod activity;
mod dispatch;
mod local;
mod lookups;
mod sweeping;

pub use activity::{ActivityError, ActivityOps, LogCallback, LogLevel};
pub use dispatch::{DispatchError, DispatchErrorKind, DispatchOps, TaskHandle};
pub use local::LocalDispatcher;
pub use lookups::{InfraOps, LookupError, SettingsOps};
pub use sweeping::{SweepingError, SweepingOutputs, find_typed};
