//! Typed publish/subscribe endpoints over Zenoh.
//!
//! Subscribers support three delivery modes: a queue drained with
//! [`ZSub::recv`]/[`ZSub::recv_timeout`], a push callback, and either of
//! those combined with a message filter evaluated before delivery. The
//! filter is the content-based routing primitive: a subscriber sharing a
//! broadcast topic only observes messages its predicate accepts.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use tracing::{debug, error};
use zenoh::{Result, Session, Wait};

use crate::Builder;
use crate::msg::{CdrSerdes, ZMessage};
use crate::topic;

pub struct ZPubBuilder<T> {
    session: Arc<Session>,
    domain_id: usize,
    topic: String,
    _phantom_data: PhantomData<T>,
}

impl<T> ZPubBuilder<T> {
    pub fn new(session: Arc<Session>, domain_id: usize, topic: &str) -> Self {
        Self {
            session,
            domain_id,
            topic: topic.to_owned(),
            _phantom_data: PhantomData,
        }
    }
}

impl<T: ZMessage> Builder for ZPubBuilder<T> {
    type Output = ZPub<T>;

    fn build(self) -> Result<Self::Output> {
        let key_expr = topic::key_expr(self.domain_id, &self.topic)?;
        debug!("[PUB] Declaring publisher: {}", key_expr);
        let inner = self.session.declare_publisher(key_expr).wait()?;
        Ok(ZPub {
            topic: self.topic,
            inner,
            _phantom_data: PhantomData,
        })
    }
}

pub struct ZPub<T: ZMessage> {
    topic: String,
    inner: zenoh::pubsub::Publisher<'static>,
    _phantom_data: PhantomData<T>,
}

impl<T: ZMessage> ZPub<T> {
    pub fn publish(&self, msg: &T) -> Result<()> {
        let bytes = CdrSerdes::serialize(msg)?;
        self.inner.put(bytes).wait()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

type MessageFilter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

pub struct ZSubBuilder<T> {
    session: Arc<Session>,
    domain_id: usize,
    topic: String,
    filter: Option<MessageFilter<T>>,
    _phantom_data: PhantomData<T>,
}

impl<T: ZMessage> ZSubBuilder<T> {
    pub fn new(session: Arc<Session>, domain_id: usize, topic: &str) -> Self {
        Self {
            session,
            domain_id,
            topic: topic.to_owned(),
            filter: None,
            _phantom_data: PhantomData,
        }
    }

    /// Install a routing predicate evaluated after decode and before
    /// delivery. Messages it rejects are invisible to this subscriber.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Build a subscriber that pushes each accepted message into a callback.
    pub fn build_with_callback<F>(self, callback: F) -> Result<ZSub<T>>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.build_internal(callback)
    }

    fn build_internal<F>(self, deliver: F) -> Result<ZSub<T>>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let key_expr = topic::key_expr(self.domain_id, &self.topic)?;
        debug!("[SUB] Declaring subscriber: {}", key_expr);

        let topic = self.topic.clone();
        let filter = self.filter;
        let inner = self
            .session
            .declare_subscriber(key_expr)
            .callback(move |sample| {
                let payload = sample.payload().to_bytes();
                let msg: T = match CdrSerdes::<T>::deserialize(&payload) {
                    Ok(msg) => msg,
                    Err(e) => {
                        error!("[SUB] Failed to decode message on '{}': {}", topic, e);
                        return;
                    }
                };
                if let Some(f) = &filter {
                    if !f(&msg) {
                        return;
                    }
                }
                deliver(msg);
            })
            .wait()?;

        Ok(ZSub {
            topic: self.topic,
            _inner: inner,
            queue: None,
        })
    }
}

impl<T: ZMessage> Builder for ZSubBuilder<T> {
    type Output = ZSub<T>;

    /// Build a subscriber that enqueues accepted messages for `recv`.
    fn build(self) -> Result<Self::Output> {
        let (tx, rx) = flume::unbounded();
        let mut sub = self.build_internal(move |msg| {
            let _ = tx.send(msg);
        })?;
        sub.queue = Some(rx);
        Ok(sub)
    }
}

pub struct ZSub<T: ZMessage> {
    topic: String,
    _inner: zenoh::pubsub::Subscriber<()>,
    queue: Option<flume::Receiver<T>>,
}

impl<T: ZMessage> ZSub<T> {
    fn queue(&self) -> Result<&flume::Receiver<T>> {
        self.queue
            .as_ref()
            .ok_or_else(|| zenoh::Error::from("Subscriber was built with callback, no queue available"))
    }

    /// Block until the next accepted message arrives.
    pub fn recv(&self) -> Result<T> {
        Ok(self.queue()?.recv()?)
    }

    /// Block until the next accepted message arrives or the timeout elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T> {
        self.queue()?
            .recv_timeout(timeout)
            .map_err(|_| zenoh::Error::from("Receive timed out"))
    }

    /// Take the next accepted message without blocking.
    pub fn try_recv(&self) -> Option<T> {
        self.queue.as_ref()?.try_recv().ok()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}
