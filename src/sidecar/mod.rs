//! 旁路通道模块：后台同步触发、推送通知映射与宿主控制消息。
//!
//! # Sidecar Channels
//!
//! Out-of-band signalling that does not go through the request path.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ReplayTrigger`] | Invokes the deferred-mutation hook at most once per reconnect |
//! | [`push`] | Pure push payload → notification descriptor mapping |
//! | [`ControlMessage`] | Commands from the host application |

pub mod control;
pub mod push;
pub mod sync;

pub use control::{ControlMessage, VersionReport};
pub use push::{ClickOutcome, NotificationAction, NotificationDescriptor};
pub use sync::{NoopReplay, ReplayHook, ReplayOutcome, ReplayTrigger, SYNC_TAG};
