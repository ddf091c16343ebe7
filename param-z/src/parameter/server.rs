//! Parameter server: binds one store to a logical node identity.
//!
//! The server subscribes to the three shared request topics with a routing
//! filter of the form `request.node_id == self.node_id`, so it only ever
//! observes requests addressed to it. Responses echo the responder identity
//! and the caller's `request_id`; the response to a request is always
//! published before the event its side effects produced.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};
use zenoh::{Result, Session};

use crate::Builder;
use crate::error::ParamError;
use crate::pubsub::{ZPub, ZPubBuilder, ZSub, ZSubBuilder};
use crate::topic::topics;

use super::lock;
use super::store::ParameterStore;
use super::types::{Parameter, SetResult};
use super::wire::{
    GetParametersRequest, GetParametersResponse, ListParametersRequest, ListParametersResponse,
    SetParametersRequest, SetParametersResponse, WireParameterEvent, WireSetResult,
};

/// Per-parameter validation hook for inbound Set requests. Returning a
/// failure rejects the value before it reaches the store.
pub type SetHook = Arc<dyn Fn(&Parameter) -> SetResult + Send + Sync>;

pub struct ParameterServerBuilder {
    session: Arc<Session>,
    domain_id: usize,
    node_id: String,
    set_hook: Option<SetHook>,
}

impl ParameterServerBuilder {
    pub(crate) fn new(session: Arc<Session>, domain_id: usize, node_id: String) -> Self {
        Self {
            session,
            domain_id,
            node_id,
            set_hook: None,
        }
    }

    /// Replace the default all-succeed behavior with custom validation.
    pub fn with_set_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Parameter) -> SetResult + Send + Sync + 'static,
    {
        self.set_hook = Some(Arc::new(hook));
        self
    }
}

impl Builder for ParameterServerBuilder {
    type Output = ParameterServer;

    fn build(self) -> Result<Self::Output> {
        let Self {
            session,
            domain_id,
            node_id,
            set_hook,
        } = self;

        let store = Arc::new(Mutex::new(ParameterStore::new()));

        let event_pub = Arc::new(
            ZPubBuilder::<WireParameterEvent>::new(
                session.clone(),
                domain_id,
                topics::PARAMETER_EVENTS,
            )
            .build()?,
        );
        let set_response_pub = Arc::new(
            ZPubBuilder::<SetParametersResponse>::new(
                session.clone(),
                domain_id,
                topics::SET_PARAMETERS_RESPONSE,
            )
            .build()?,
        );
        let get_response_pub = Arc::new(
            ZPubBuilder::<GetParametersResponse>::new(
                session.clone(),
                domain_id,
                topics::GET_PARAMETERS_RESPONSE,
            )
            .build()?,
        );
        let list_response_pub = Arc::new(
            ZPubBuilder::<ListParametersResponse>::new(
                session.clone(),
                domain_id,
                topics::LIST_PARAMETERS_RESPONSE,
            )
            .build()?,
        );

        let _set_sub = {
            let store = store.clone();
            let response_pub = set_response_pub;
            let event_pub = event_pub.clone();
            let me = node_id.clone();
            let hook = set_hook;
            let filter_id = node_id.clone();
            ZSubBuilder::<SetParametersRequest>::new(
                session.clone(),
                domain_id,
                topics::SET_PARAMETERS_REQUEST,
            )
            .with_filter(move |req| req.node_id == filter_id)
            .build_with_callback(move |req| {
                handle_set(&store, &response_pub, &event_pub, &me, hook.as_deref(), req);
            })?
        };

        let _get_sub = {
            let store = store.clone();
            let response_pub = get_response_pub;
            let me = node_id.clone();
            let filter_id = node_id.clone();
            ZSubBuilder::<GetParametersRequest>::new(
                session.clone(),
                domain_id,
                topics::GET_PARAMETERS_REQUEST,
            )
            .with_filter(move |req| req.node_id == filter_id)
            .build_with_callback(move |req| {
                handle_get(&store, &response_pub, &me, req);
            })?
        };

        let _list_sub = {
            let store = store.clone();
            let response_pub = list_response_pub;
            let me = node_id.clone();
            let filter_id = node_id.clone();
            ZSubBuilder::<ListParametersRequest>::new(
                session.clone(),
                domain_id,
                topics::LIST_PARAMETERS_REQUEST,
            )
            .with_filter(move |req| req.node_id == filter_id)
            .build_with_callback(move |req| {
                handle_list(&store, &response_pub, &me, req);
            })?
        };

        info!("[SERVER {}] Parameter server ready", node_id);

        Ok(ParameterServer {
            node_id,
            store,
            event_pub,
            _set_sub,
            _get_sub,
            _list_sub,
        })
    }
}

/// One node's parameter service: exclusive owner of its store.
pub struct ParameterServer {
    node_id: String,
    store: Arc<Mutex<ParameterStore>>,
    event_pub: Arc<ZPub<WireParameterEvent>>,
    _set_sub: ZSub<SetParametersRequest>,
    _get_sub: ZSub<GetParametersRequest>,
    _list_sub: ZSub<ListParametersRequest>,
}

impl ParameterServer {
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Upsert one parameter into the pending batch. The change is broadcast
    /// on the next [`publish_event`](Self::publish_event).
    pub fn set_parameter(&self, param: Parameter) {
        lock(&self.store).set_parameter(param);
    }

    /// Apply each parameter, then flush the combined batch as one event.
    pub fn set_parameters(&self, params: impl IntoIterator<Item = Parameter>) -> Result<()> {
        lock(&self.store).set_parameters(params);
        self.publish_event()
    }

    /// Remove a parameter and flush. Removing an absent name is a no-op
    /// that produces no event.
    pub fn delete_parameter(&self, name: &str) -> Result<bool> {
        let removed = lock(&self.store).delete_parameter(name);
        self.publish_event()?;
        Ok(removed)
    }

    pub fn get_parameter(&self, name: &str) -> std::result::Result<Parameter, ParamError> {
        lock(&self.store).get_parameter(name).cloned()
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        lock(&self.store).has_parameter(name)
    }

    pub fn get_all_parameters(&self) -> Vec<Parameter> {
        lock(&self.store).get_all_parameters()
    }

    pub fn list_parameter_names(&self, prefix: &str, depth: u32) -> Vec<String> {
        lock(&self.store).list_parameter_names(prefix, depth)
    }

    pub fn parameter_count(&self) -> usize {
        lock(&self.store).parameter_count()
    }

    /// Broadcast the pending batch as one event; a quiet batch sends
    /// nothing.
    pub fn publish_event(&self) -> Result<()> {
        let event = lock(&self.store).take_event(&self.node_id);
        if let Some(event) = event {
            self.event_pub.publish(&event.to_wire())?;
        }
        Ok(())
    }
}

// ── Request handlers ────────────────────────────────────────────────────────
//
// Invoked from transport callbacks, possibly concurrently; each locks the
// store for the duration of its body. Failures are logged, never propagated
// into the handler loop.

fn handle_set(
    store: &Mutex<ParameterStore>,
    response_pub: &ZPub<SetParametersResponse>,
    event_pub: &ZPub<WireParameterEvent>,
    node_id: &str,
    hook: Option<&(dyn Fn(&Parameter) -> SetResult + Send + Sync)>,
    req: SetParametersRequest,
) {
    debug!(
        "[SERVER {}] set_parameters: {} params (request_id={})",
        node_id,
        req.parameters.len(),
        req.request_id
    );

    let mut results: Vec<WireSetResult> = Vec::with_capacity(req.parameters.len());
    let event = {
        let mut store = lock(store);
        for wire_param in &req.parameters {
            let param = Parameter::from_wire(wire_param);
            let result = match hook {
                Some(hook) => hook(&param),
                None => SetResult::success(),
            };
            if result.successful {
                store.set_parameter(param);
            } else {
                debug!(
                    "[SERVER {}] rejected '{}': {}",
                    node_id, param.name, result.reason
                );
            }
            results.push(result.to_wire());
        }
        store.take_event(node_id)
    };

    let response = SetParametersResponse {
        node_id: node_id.to_owned(),
        request_id: req.request_id,
        results,
    };
    // Response first, so a caller correlating on it never misses the
    // change it just applied.
    if let Err(e) = response_pub.publish(&response) {
        warn!("[SERVER {}] Failed to send set response: {}", node_id, e);
    }
    if let Some(event) = event {
        if let Err(e) = event_pub.publish(&event.to_wire()) {
            warn!("[SERVER {}] Failed to publish parameter event: {}", node_id, e);
        }
    }
}

fn handle_get(
    store: &Mutex<ParameterStore>,
    response_pub: &ZPub<GetParametersResponse>,
    node_id: &str,
    req: GetParametersRequest,
) {
    debug!(
        "[SERVER {}] get_parameters: {:?} (request_id={})",
        node_id, req.names, req.request_id
    );

    // Absent names are silently omitted, not errors.
    let parameters = {
        let store = lock(store);
        req.names
            .iter()
            .filter_map(|name| store.get_parameter(name).ok().map(Parameter::to_wire))
            .collect()
    };

    let response = GetParametersResponse {
        node_id: node_id.to_owned(),
        request_id: req.request_id,
        parameters,
    };
    if let Err(e) = response_pub.publish(&response) {
        warn!("[SERVER {}] Failed to send get response: {}", node_id, e);
    }
}

fn handle_list(
    store: &Mutex<ParameterStore>,
    response_pub: &ZPub<ListParametersResponse>,
    node_id: &str,
    req: ListParametersRequest,
) {
    debug!(
        "[SERVER {}] list_parameters: prefixes={:?}, depth={} (request_id={})",
        node_id, req.prefixes, req.depth, req.request_id
    );

    let names = {
        let store = lock(store);
        if req.prefixes.is_empty() {
            store.list_parameter_names("", req.depth)
        } else {
            let mut names: Vec<String> = req
                .prefixes
                .iter()
                .flat_map(|prefix| store.list_parameter_names(prefix, req.depth))
                .collect();
            // Overlapping prefixes may match the same name.
            names.sort();
            names.dedup();
            names
        }
    };

    let response = ListParametersResponse {
        node_id: node_id.to_owned(),
        request_id: req.request_id,
        names,
    };
    if let Err(e) = response_pub.publish(&response) {
        warn!("[SERVER {}] Failed to send list response: {}", node_id, e);
    }
}
