//! Topic names and their Zenoh key expressions.

use zenoh::{Result, key_expr::KeyExpr};

/// The seven parameter-service channels. Request topics are shared by all
/// servers (each filters on its own `node_id`); response topics are shared
/// by all clients (each filters on `(node_id, request_id)`).
pub mod topics {
    pub const PARAMETER_EVENTS: &str = "parameter_events";

    pub const SET_PARAMETERS_REQUEST: &str = "set_parameters/request";
    pub const SET_PARAMETERS_RESPONSE: &str = "set_parameters/response";

    pub const GET_PARAMETERS_REQUEST: &str = "get_parameters/request";
    pub const GET_PARAMETERS_RESPONSE: &str = "get_parameters/response";

    pub const LIST_PARAMETERS_REQUEST: &str = "list_parameters/request";
    pub const LIST_PARAMETERS_RESPONSE: &str = "list_parameters/response";
}

const KEY_PREFIX: &str = "pz";

/// Map a logical topic to its key expression: `pz/<domain_id>/<topic>`.
///
/// Domains are disjoint key spaces; endpoints only match within one domain.
pub fn key_expr(domain_id: usize, topic: &str) -> Result<KeyExpr<'static>> {
    let ke = format!("{KEY_PREFIX}/{domain_id}/{topic}").try_into()?;
    Ok(ke)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_expr_format() {
        let ke = key_expr(0, topics::PARAMETER_EVENTS).unwrap();
        assert_eq!(ke.to_string(), "pz/0/parameter_events");

        let ke = key_expr(7, topics::SET_PARAMETERS_REQUEST).unwrap();
        assert_eq!(ke.to_string(), "pz/7/set_parameters/request");
    }
}
