//! Event processors.
//!
//! This module provides the [`EventProcessor`] trait that components push
//! events into, and [`ListenerDispatcher`], a processor that routes events to
//! listeners registered against event keys.
//!
//! # Key-matched Dispatch
//!
//! Each listener is registered with an [`EventKey`]. When an event is pushed:
//!
//! 1. Listeners are checked in registration order
//! 2. Every listener whose key is the event's key or an ancestor of it runs
//! 3. Listener failures are collected, they do not stop dispatch
//!
//! ```rust,ignore
//! use simbot_core::{ListenerDispatcher, MESSAGE_EVENT};
//!
//! let dispatcher = ListenerDispatcher::new();
//!
//! dispatcher.listen(&MESSAGE_EVENT, |event| async move {
//!     if let Some(message) = event.as_message_event() {
//!         message.reply(&"pong".into()).await?;
//!     }
//!     Ok(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::{Level, debug, span, warn};

use crate::foundation::error::{BotError, BotResult};
use crate::foundation::event::{BoxedEvent, EventKey};

/// A boxed event processor.
pub type BoxedEventProcessor = Arc<dyn EventProcessor>;

/// Outcome of pushing one event.
#[derive(Debug, Default)]
pub struct EventProcessingResult {
    /// Number of listeners that ran.
    pub invoked: usize,
    /// Errors returned by listeners.
    pub errors: Vec<BotError>,
}

impl EventProcessingResult {
    /// An empty result, for events nobody listens to.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if no listener ran.
    pub fn is_empty(&self) -> bool {
        self.invoked == 0
    }

    /// Returns true if every listener that ran succeeded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Receives events produced by components.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    /// Returns true if pushing an event with this key would do anything.
    ///
    /// Components check this before building an event, so events nobody is
    /// interested in are never constructed.
    fn is_processable(&self, key: &EventKey) -> bool;

    /// Processes one event.
    async fn push(&self, event: BoxedEvent) -> EventProcessingResult;
}

/// A listener callback.
pub type EventListener = Arc<dyn Fn(BoxedEvent) -> BoxFuture<'static, BotResult<()>> + Send + Sync>;

struct Registration {
    key: &'static EventKey,
    listener: EventListener,
}

/// An [`EventProcessor`] routing events to key-matched listeners.
///
/// Listeners can be added after the dispatcher has been shared.
#[derive(Default, Clone)]
pub struct ListenerDispatcher {
    listeners: Arc<RwLock<Vec<Registration>>>,
}

impl ListenerDispatcher {
    /// Creates a new, empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for `key` and all of its descendants.
    pub fn listen<F, Fut>(&self, key: &'static EventKey, listener: F)
    where
        F: Fn(BoxedEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BotResult<()>> + Send + 'static,
    {
        let erased: EventListener =
            Arc::new(move |event| -> BoxFuture<'static, BotResult<()>> {
                Box::pin(listener(event))
            });
        self.listeners.write().push(Registration {
            key,
            listener: erased,
        });
    }

    /// Registers a listener for `key` (builder pattern).
    pub fn with<F, Fut>(self, key: &'static EventKey, listener: F) -> Self
    where
        F: Fn(BoxedEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BotResult<()>> + Send + 'static,
    {
        self.listen(key, listener);
        self
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Removes all listeners.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    fn matching(&self, key: &EventKey) -> Vec<EventListener> {
        self.listeners
            .read()
            .iter()
            .filter(|r| key.is_sub_of(r.key))
            .map(|r| Arc::clone(&r.listener))
            .collect()
    }
}

#[async_trait]
impl EventProcessor for ListenerDispatcher {
    fn is_processable(&self, key: &EventKey) -> bool {
        self.listeners.read().iter().any(|r| key.is_sub_of(r.key))
    }

    async fn push(&self, event: BoxedEvent) -> EventProcessingResult {
        let span = span!(Level::DEBUG, "push", event_key = %event.key());
        let _enter = span.enter();

        let listeners = self.matching(event.key());
        if listeners.is_empty() {
            return EventProcessingResult::empty();
        }

        let mut result = EventProcessingResult::empty();
        for listener in listeners {
            result.invoked += 1;
            if let Err(e) = listener(event.clone()).await {
                warn!(event_key = %event.key(), error = %e, "Listener failed");
                result.errors.push(e);
            }
        }

        debug!(invoked = result.invoked, "Event processed");
        result
    }
}

impl std::fmt::Debug for ListenerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerDispatcher")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::event::{EVENT, Event, MESSAGE_EVENT, REQUEST_EVENT};
    use crate::foundation::id::{Id, Timestamp};
    use crate::foundation::message::Element;
    use crate::integration::objective::{BoxedBot, Bot, Contact, Friend, Group};
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static TEST_EVENT: EventKey = EventKey::new("test.event", &[&EVENT]);
    static TEST_MESSAGE: EventKey = EventKey::new("test.message", &[&TEST_EVENT, &MESSAGE_EVENT]);

    struct MockBot;

    #[async_trait]
    impl Bot for MockBot {
        fn id(&self) -> Id {
            Id::from("test-bot")
        }

        fn username(&self) -> String {
            "test".into()
        }

        fn avatar(&self) -> String {
            String::new()
        }

        fn component(&self) -> &'static str {
            "test"
        }

        fn is_active(&self) -> bool {
            true
        }

        async fn start(&self) -> BotResult<bool> {
            Ok(true)
        }

        async fn cancel(&self) -> BotResult<bool> {
            Ok(true)
        }

        async fn join(&self) {}

        async fn friend(&self, _id: &Id) -> BotResult<Option<Arc<dyn Friend>>> {
            Ok(None)
        }

        async fn friends(&self) -> BotResult<Vec<Arc<dyn Friend>>> {
            Ok(Vec::new())
        }

        async fn group(&self, _id: &Id) -> BotResult<Option<Arc<dyn Group>>> {
            Ok(None)
        }

        async fn groups(&self) -> BotResult<Vec<Arc<dyn Group>>> {
            Ok(Vec::new())
        }

        async fn contact(&self, _id: &Id) -> BotResult<Option<Arc<dyn Contact>>> {
            Ok(None)
        }

        async fn contacts(&self) -> BotResult<Vec<Arc<dyn Contact>>> {
            Ok(Vec::new())
        }

        async fn resolve_image(&self, id: &Id) -> BotResult<Element> {
            Ok(Element::image_id(id.clone()))
        }

        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    struct TestEvent {
        key: &'static EventKey,
        id: Id,
    }

    impl TestEvent {
        fn boxed(key: &'static EventKey) -> BoxedEvent {
            BoxedEvent::new(Self { key, id: Id::random() })
        }
    }

    impl Event for TestEvent {
        fn key(&self) -> &'static EventKey {
            self.key
        }

        fn id(&self) -> &Id {
            &self.id
        }

        fn timestamp(&self) -> Timestamp {
            Timestamp::now()
        }

        fn bot(&self) -> BoxedBot {
            Arc::new(MockBot)
        }

        fn component(&self) -> &'static str {
            "test"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn counting(
        counter: &Arc<AtomicUsize>,
        by: usize,
    ) -> impl Fn(BoxedEvent) -> BoxFuture<'static, BotResult<()>> + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_| {
            let c = Arc::clone(&counter);
            Box::pin(async move {
                c.fetch_add(by, Ordering::SeqCst);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_push_no_listeners() {
        let dispatcher = ListenerDispatcher::new();
        assert!(!dispatcher.is_processable(&TEST_MESSAGE));

        let result = dispatcher.push(TestEvent::boxed(&TEST_MESSAGE)).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_ancestor_listener_receives_event() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher = ListenerDispatcher::new()
            .with(&MESSAGE_EVENT, counting(&counter, 1))
            .with(&TEST_EVENT, counting(&counter, 10))
            .with(&REQUEST_EVENT, counting(&counter, 100));

        assert!(dispatcher.is_processable(&TEST_MESSAGE));
        assert!(!dispatcher.is_processable(&EVENT));

        let result = dispatcher.push(TestEvent::boxed(&TEST_MESSAGE)).await;
        assert_eq!(result.invoked, 2);
        assert!(result.is_success());
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[tokio::test]
    async fn test_listener_failure_does_not_stop_dispatch() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher = ListenerDispatcher::new();
        dispatcher.listen(&TEST_EVENT, |_| async {
            BotResult::<()>::Err(BotError::unsupported("nope"))
        });
        dispatcher.listen(&TEST_EVENT, counting(&counter, 1));

        let result = dispatcher.push(TestEvent::boxed(&TEST_EVENT)).await;
        assert_eq!(result.invoked, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_listener_sees_event_bot() {
        let dispatcher = ListenerDispatcher::new();
        dispatcher.listen(&TEST_EVENT, |event| async move {
            assert_eq!(event.bot().id(), Id::from("test-bot"));
            assert!(event.downcast_ref::<TestEvent>().is_some());
            let image = event.bot().resolve_image(&Id::from("x")).await?;
            assert!(matches!(image, Element::Image(_)));
            BotResult::Ok(())
        });

        let result = dispatcher.push(TestEvent::boxed(&TEST_EVENT)).await;
        assert!(result.is_success());
        dispatcher.clear();
        assert_eq!(dispatcher.listener_count(), 0);
    }
}
