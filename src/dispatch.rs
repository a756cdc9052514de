//! 事件分发模块：事件类型到处理函数的显式映射与协作式任务队列。
//!
//! # Event Dispatcher
//!
//! Every input to the proxy (intercepted request, lifecycle event, sync,
//! push, control message) is a [`ProxyEvent`]. The [`Dispatcher`] maps each
//! [`EventKind`] to a handler function returning a future.
//!
//! [`Dispatcher::run`] drains a queue of events on a single task. Handlers
//! interleave only at their await points, so no two handlers ever run their
//! synchronous sections at the same time. Dropping the `run` future abandons
//! in-flight handlers; cache writes they already committed stand.

use crate::config::ProxyConfig;
use crate::lifecycle::{ActivationReport, InstallReport};
use crate::proxy::Registration;
use crate::sidecar::push::{notification_for_push, on_notification_click};
use crate::sidecar::{
    ClickOutcome, ControlMessage, NotificationDescriptor, ReplayOutcome, ReplayTrigger,
    VersionReport,
};
use crate::strategy::Served;
use crate::types::RequestDescriptor;
use crate::{Error, ErrorContext, Result};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

pub enum ProxyEvent {
    Install(ProxyConfig),
    Activate,
    Fetch(RequestDescriptor),
    Online,
    Sync { tag: String },
    Push { payload: Option<String> },
    NotificationClick { action: Option<String> },
    Message {
        message: ControlMessage,
        reply: Option<oneshot::Sender<VersionReport>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Online,
    Sync,
    Push,
    NotificationClick,
    Message,
}

impl ProxyEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProxyEvent::Install(_) => EventKind::Install,
            ProxyEvent::Activate => EventKind::Activate,
            ProxyEvent::Fetch(_) => EventKind::Fetch,
            ProxyEvent::Online => EventKind::Online,
            ProxyEvent::Sync { .. } => EventKind::Sync,
            ProxyEvent::Push { .. } => EventKind::Push,
            ProxyEvent::NotificationClick { .. } => EventKind::NotificationClick,
            ProxyEvent::Message { .. } => EventKind::Message,
        }
    }
}

#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(Option<ActivationReport>),
    Response(Served),
    Replay(ReplayOutcome),
    Notification(NotificationDescriptor),
    Click(ClickOutcome),
    Version(VersionReport),
}

type Handler = for<'a> fn(&'a Dispatcher, ProxyEvent) -> BoxFuture<'a, Result<EventOutcome>>;

pub struct Envelope {
    event: ProxyEvent,
    reply: oneshot::Sender<Result<EventOutcome>>,
}

/// Cloneable sender side of the dispatcher queue.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl DispatcherHandle {
    /// Enqueue `event` and wait for its outcome.
    pub async fn send(&self, event: ProxyEvent) -> Result<EventOutcome> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { event, reply })
            .map_err(|_| closed())?;
        rx.await.map_err(|_| closed())?
    }
}

fn closed() -> Error {
    Error::lifecycle_with_context(
        "dispatcher is shut down",
        ErrorContext::new().with_source("dispatch"),
    )
}

fn misrouted(kind: EventKind) -> Error {
    Error::lifecycle_with_context(
        format!("event routed to the wrong handler: {:?}", kind),
        ErrorContext::new().with_source("dispatch"),
    )
}

pub struct Dispatcher {
    registration: Arc<Registration>,
    replay: ReplayTrigger,
    defaults: ProxyConfig,
    handlers: HashMap<EventKind, Handler>,
}

impl Dispatcher {
    /// `defaults` supplies settings (such as the notification title) used
    /// while no instance is installed.
    pub fn new(registration: Arc<Registration>, replay: ReplayTrigger, defaults: ProxyConfig) -> Self {
        let mut handlers: HashMap<EventKind, Handler> = HashMap::new();
        handlers.insert(EventKind::Install, on_install);
        handlers.insert(EventKind::Activate, on_activate);
        handlers.insert(EventKind::Fetch, on_fetch);
        handlers.insert(EventKind::Online, on_online);
        handlers.insert(EventKind::Sync, on_sync);
        handlers.insert(EventKind::Push, on_push);
        handlers.insert(EventKind::NotificationClick, on_notification);
        handlers.insert(EventKind::Message, on_message);
        Self {
            registration,
            replay,
            defaults,
            handlers,
        }
    }

    pub fn channel() -> (DispatcherHandle, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (DispatcherHandle { tx }, rx)
    }

    pub fn registration(&self) -> &Arc<Registration> {
        &self.registration
    }

    /// Handle one event directly, bypassing the queue.
    pub async fn dispatch(&self, event: ProxyEvent) -> Result<EventOutcome> {
        let kind = event.kind();
        let handler = self.handlers.get(&kind).ok_or_else(|| misrouted(kind))?;
        handler(self, event).await
    }

    /// Drain `rx` until every handle is dropped, then finish in-flight work.
    pub async fn run(&self, mut rx: mpsc::UnboundedReceiver<Envelope>) {
        let mut in_flight = FuturesUnordered::new();
        loop {
            tokio::select! {
                envelope = rx.recv() => match envelope {
                    Some(Envelope { event, reply }) => {
                        in_flight.push(async move {
                            let outcome = self.dispatch(event).await;
                            // The sender may have given up waiting.
                            let _ = reply.send(outcome);
                        });
                    }
                    None => break,
                },
                Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
            }
        }
        while in_flight.next().await.is_some() {}
        debug!("dispatcher queue drained");
    }

    fn notification_title(&self) -> String {
        self.registration
            .active()
            .map(|i| i.config().notification_title.clone())
            .unwrap_or_else(|| self.defaults.notification_title.clone())
    }
}

fn on_install(d: &Dispatcher, event: ProxyEvent) -> BoxFuture<'_, Result<EventOutcome>> {
    Box::pin(async move {
        let ProxyEvent::Install(config) = event else {
            return Err(misrouted(EventKind::Install));
        };
        let (_, report) = d.registration.install(config).await?;
        Ok(EventOutcome::Installed(report))
    })
}

fn on_activate(d: &Dispatcher, _event: ProxyEvent) -> BoxFuture<'_, Result<EventOutcome>> {
    Box::pin(async move { Ok(EventOutcome::Activated(d.registration.promote().await?)) })
}

fn on_fetch(d: &Dispatcher, event: ProxyEvent) -> BoxFuture<'_, Result<EventOutcome>> {
    Box::pin(async move {
        let ProxyEvent::Fetch(request) = event else {
            return Err(misrouted(EventKind::Fetch));
        };
        Ok(EventOutcome::Response(d.registration.handle_fetch(&request).await?))
    })
}

fn on_online(d: &Dispatcher, _event: ProxyEvent) -> BoxFuture<'_, Result<EventOutcome>> {
    Box::pin(async move { Ok(EventOutcome::Replay(d.replay.connectivity_restored().await)) })
}

fn on_sync(d: &Dispatcher, event: ProxyEvent) -> BoxFuture<'_, Result<EventOutcome>> {
    Box::pin(async move {
        let ProxyEvent::Sync { tag } = event else {
            return Err(misrouted(EventKind::Sync));
        };
        info!(tag = %tag, "background sync event");
        Ok(EventOutcome::Replay(d.replay.on_sync(&tag).await))
    })
}

fn on_push(d: &Dispatcher, event: ProxyEvent) -> BoxFuture<'_, Result<EventOutcome>> {
    Box::pin(async move {
        let ProxyEvent::Push { payload } = event else {
            return Err(misrouted(EventKind::Push));
        };
        info!("push event received");
        let notification =
            notification_for_push(&d.notification_title(), payload.as_deref(), SystemTime::now());
        Ok(EventOutcome::Notification(notification))
    })
}

fn on_notification(_d: &Dispatcher, event: ProxyEvent) -> BoxFuture<'_, Result<EventOutcome>> {
    Box::pin(async move {
        let ProxyEvent::NotificationClick { action } = event else {
            return Err(misrouted(EventKind::NotificationClick));
        };
        debug!(action = ?action, "notification click");
        Ok(EventOutcome::Click(on_notification_click(action.as_deref())))
    })
}

fn on_message(d: &Dispatcher, event: ProxyEvent) -> BoxFuture<'_, Result<EventOutcome>> {
    Box::pin(async move {
        let ProxyEvent::Message { message, reply } = event else {
            return Err(misrouted(EventKind::Message));
        };
        info!(message = ?message, "control message received");
        match message {
            ControlMessage::Promote => Ok(EventOutcome::Activated(d.registration.promote().await?)),
            ControlMessage::ReportVersion => {
                let instance = d
                    .registration
                    .active()
                    .or_else(|| d.registration.waiting())
                    .ok_or_else(|| {
                        Error::lifecycle_with_context(
                            "no installed instance to report",
                            ErrorContext::new().with_source("dispatch"),
                        )
                    })?;
                let report = VersionReport {
                    version: instance.version_label(),
                };
                if let Some(reply) = reply {
                    if reply.send(report.clone()).is_err() {
                        warn!("version reply channel closed");
                    }
                }
                Ok(EventOutcome::Version(report))
            }
        }
    })
}
