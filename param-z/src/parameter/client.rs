//! Parameter client: addresses any node and correlates its responses.
//!
//! Requests are published on the shared request topics with the target's
//! `node_id`; responses come back on shared response topics where every
//! client sees every reply. Correlation is a pending-request map keyed by
//! `(node_id, request_id)` whose entries are rendezvous channels fulfilled
//! by the response subscriber's callback, so a caller wakes exactly when its
//! own reply arrives or the deadline elapses — there is no polling interval
//! and no other cancellation mechanism.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering::AcqRel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info};
use zenoh::{Result, Session};

use crate::Builder;
use crate::error::ParamError;
use crate::msg::ZMessage;
use crate::pubsub::{ZPub, ZPubBuilder, ZSub, ZSubBuilder};
use crate::topic::topics;

use super::lock;
use super::types::{Parameter, ParameterEvent, SetResult};
use super::wire::{
    Correlated, GetParametersRequest, GetParametersResponse, ListParametersRequest,
    ListParametersResponse, SetParametersRequest, SetParametersResponse,
};

/// Push callback for the global event stream. Receives events from every
/// node; per-node filtering is the caller's responsibility.
pub type EventCallback = Arc<dyn Fn(ParameterEvent) + Send + Sync>;

pub struct ParameterClientBuilder {
    session: Arc<Session>,
    domain_id: usize,
    event_callback: Option<EventCallback>,
}

impl ParameterClientBuilder {
    pub(crate) fn new(session: Arc<Session>, domain_id: usize) -> Self {
        Self {
            session,
            domain_id,
            event_callback: None,
        }
    }

    /// Subscribe to the global `ParameterEvent` stream.
    pub fn with_event_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(ParameterEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(Arc::new(callback));
        self
    }
}

impl Builder for ParameterClientBuilder {
    type Output = ParameterClient;

    fn build(self) -> Result<Self::Output> {
        let set = RequestChannel::open(
            &self.session,
            self.domain_id,
            topics::SET_PARAMETERS_REQUEST,
            topics::SET_PARAMETERS_RESPONSE,
        )?;
        let get = RequestChannel::open(
            &self.session,
            self.domain_id,
            topics::GET_PARAMETERS_REQUEST,
            topics::GET_PARAMETERS_RESPONSE,
        )?;
        let list = RequestChannel::open(
            &self.session,
            self.domain_id,
            topics::LIST_PARAMETERS_REQUEST,
            topics::LIST_PARAMETERS_RESPONSE,
        )?;

        let _event_sub = match self.event_callback {
            Some(callback) => Some(
                ZSubBuilder::new(self.session.clone(), self.domain_id, topics::PARAMETER_EVENTS)
                    .build_with_callback(move |wire| callback(ParameterEvent::from_wire(&wire)))?,
            ),
            None => None,
        };

        info!("[CLIENT] Parameter client ready");

        Ok(ParameterClient {
            next_request_id: AtomicU64::new(1),
            set,
            get,
            list,
            _event_sub,
        })
    }
}

pub struct ParameterClient {
    /// Strictly increasing, unique within this client instance.
    next_request_id: AtomicU64,
    set: RequestChannel<SetParametersRequest, SetParametersResponse>,
    get: RequestChannel<GetParametersRequest, GetParametersResponse>,
    list: RequestChannel<ListParametersRequest, ListParametersResponse>,
    _event_sub: Option<ZSub<super::wire::WireParameterEvent>>,
}

impl ParameterClient {
    fn next_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, AcqRel)
    }

    /// Set parameters on a remote node, returning one result per parameter.
    pub fn set_parameters(
        &self,
        target_node: &str,
        params: &[Parameter],
        timeout: Duration,
    ) -> std::result::Result<Vec<SetResult>, ParamError> {
        let request_id = self.next_request_id();
        let request = SetParametersRequest {
            node_id: target_node.to_owned(),
            request_id,
            parameters: params.iter().map(Parameter::to_wire).collect(),
        };
        debug!(
            "[CLIENT] set_parameters -> '{}': {} params (request_id={})",
            target_node,
            params.len(),
            request_id
        );
        let response = self.set.call(target_node, request_id, &request, timeout)?;
        Ok(response.results.into_iter().map(SetResult::from_wire).collect())
    }

    /// Get parameters from a remote node. Names the node does not hold are
    /// omitted from the result.
    pub fn get_parameters(
        &self,
        target_node: &str,
        names: &[&str],
        timeout: Duration,
    ) -> std::result::Result<Vec<Parameter>, ParamError> {
        let request_id = self.next_request_id();
        let request = GetParametersRequest {
            node_id: target_node.to_owned(),
            request_id,
            names: names.iter().map(|n| (*n).to_owned()).collect(),
        };
        debug!(
            "[CLIENT] get_parameters -> '{}': {:?} (request_id={})",
            target_node, names, request_id
        );
        let response = self.get.call(target_node, request_id, &request, timeout)?;
        Ok(response.parameters.iter().map(Parameter::from_wire).collect())
    }

    /// List parameter names on a remote node. An empty prefix list returns
    /// all names; `depth` bounds the visible hierarchy levels.
    pub fn list_parameters(
        &self,
        target_node: &str,
        prefixes: &[&str],
        depth: u32,
        timeout: Duration,
    ) -> std::result::Result<Vec<String>, ParamError> {
        let request_id = self.next_request_id();
        let request = ListParametersRequest {
            node_id: target_node.to_owned(),
            request_id,
            prefixes: prefixes.iter().map(|p| (*p).to_owned()).collect(),
            depth,
        };
        debug!(
            "[CLIENT] list_parameters -> '{}': prefixes={:?}, depth={} (request_id={})",
            target_node, prefixes, depth, request_id
        );
        let response = self.list.call(target_node, request_id, &request, timeout)?;
        Ok(response.names)
    }
}

type PendingMap<Resp> = Arc<Mutex<HashMap<(String, u64), flume::Sender<Resp>>>>;

/// One request/response topic pair: a request publisher plus a response
/// subscriber that fulfills waiting callers through the pending map.
struct RequestChannel<Req: ZMessage, Resp: ZMessage + Correlated> {
    publisher: ZPub<Req>,
    pending: PendingMap<Resp>,
    _response_sub: ZSub<Resp>,
}

impl<Req, Resp> RequestChannel<Req, Resp>
where
    Req: ZMessage,
    Resp: ZMessage + Correlated,
{
    fn open(
        session: &Arc<Session>,
        domain_id: usize,
        request_topic: &str,
        response_topic: &str,
    ) -> Result<Self> {
        let publisher = ZPubBuilder::new(session.clone(), domain_id, request_topic).build()?;

        let pending: PendingMap<Resp> = Arc::new(Mutex::new(HashMap::new()));
        let map = pending.clone();
        let _response_sub = ZSubBuilder::<Resp>::new(session.clone(), domain_id, response_topic)
            .build_with_callback(move |resp: Resp| {
                let key = (resp.node_id().to_owned(), resp.request_id());
                let waiter = lock(&map).remove(&key);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(resp);
                    }
                    // Another client's reply, or ours after the deadline.
                    None => debug!(
                        "[CLIENT] Dropping uncorrelated response from '{}' (request_id={})",
                        key.0, key.1
                    ),
                }
            })?;

        Ok(Self {
            publisher,
            pending,
            _response_sub,
        })
    }

    fn call(
        &self,
        target_node: &str,
        request_id: u64,
        request: &Req,
        timeout: Duration,
    ) -> std::result::Result<Resp, ParamError> {
        let key = (target_node.to_owned(), request_id);
        let (tx, rx) = flume::bounded(1);
        lock(&self.pending).insert(key.clone(), tx);

        let outcome = match self.publisher.publish(request) {
            Ok(()) => rx.recv_timeout(timeout).map_err(|_| ParamError::Timeout {
                node_id: target_node.to_owned(),
            }),
            Err(e) => Err(ParamError::Transport(e.to_string())),
        };

        // The callback removed the entry on a match; sweep it on the
        // timeout and publish-failure paths.
        lock(&self.pending).remove(&key);
        outcome
    }
}
