//! Desired state of the Endpoints address list.

use std::fmt;
use std::net::IpAddr;

use serde::Serialize;

/// JSON pointer to the address list of the first subset.
pub const ADDRESSES_PATH: &str = "/subsets/0/addresses";

/// Change to the endpoint address list, recomputed every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointPatch {
    /// Publish exactly these addresses, in this order.
    Replace(Vec<IpAddr>),
    /// No backend is healthy: drop the address list.
    Remove,
}

/// One `{"ip": ...}` entry of an Endpoints subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointAddress {
    pub ip: String,
}

/// RFC 6902 operation as sent to the API server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum JsonPatchOp {
    Replace {
        path: &'static str,
        value: Vec<EndpointAddress>,
    },
    Remove {
        path: &'static str,
    },
}

impl EndpointPatch {
    /// `Replace` for a non-empty healthy set, `Remove` otherwise.
    pub fn from_healthy(healthy: Vec<IpAddr>) -> Self {
        if healthy.is_empty() {
            EndpointPatch::Remove
        } else {
            EndpointPatch::Replace(healthy)
        }
    }

    /// Short operation name, used as a metrics label.
    pub fn op(&self) -> &'static str {
        match self {
            EndpointPatch::Replace(_) => "replace",
            EndpointPatch::Remove => "remove",
        }
    }

    pub fn addresses(&self) -> Vec<EndpointAddress> {
        match self {
            EndpointPatch::Replace(ips) => ips
                .iter()
                .map(|ip| EndpointAddress { ip: ip.to_string() })
                .collect(),
            EndpointPatch::Remove => Vec::new(),
        }
    }

    pub fn operations(&self) -> Vec<JsonPatchOp> {
        match self {
            EndpointPatch::Replace(_) => vec![JsonPatchOp::Replace {
                path: ADDRESSES_PATH,
                value: self.addresses(),
            }],
            EndpointPatch::Remove => vec![JsonPatchOp::Remove {
                path: ADDRESSES_PATH,
            }],
        }
    }

    /// The JSON patch document, as passed to `kubectl patch --type=json`.
    pub fn to_json_patch(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.operations())
    }
}

impl fmt::Display for EndpointPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointPatch::Replace(ips) => {
                let list: Vec<String> = ips.iter().map(ToString::to_string).collect();
                write!(f, "replace [{}]", list.join(", "))
            }
            EndpointPatch::Remove => f.write_str("remove"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn ips(list: &[&str]) -> Vec<IpAddr> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_shape_selection() {
        assert_eq!(EndpointPatch::from_healthy(Vec::new()), EndpointPatch::Remove);
        assert_eq!(
            EndpointPatch::from_healthy(ips(&["10.0.0.1"])),
            EndpointPatch::Replace(ips(&["10.0.0.1"]))
        );
    }

    #[test]
    fn test_replace_document() {
        let patch = EndpointPatch::Replace(ips(&["10.0.0.1", "10.0.0.2"]));
        let doc: Value = serde_json::from_str(&patch.to_json_patch().unwrap()).unwrap();
        assert_eq!(
            doc,
            json!([{
                "op": "replace",
                "path": "/subsets/0/addresses",
                "value": [{"ip": "10.0.0.1"}, {"ip": "10.0.0.2"}]
            }])
        );
    }

    #[test]
    fn test_remove_document() {
        let doc: Value =
            serde_json::from_str(&EndpointPatch::Remove.to_json_patch().unwrap()).unwrap();
        assert_eq!(doc, json!([{"op": "remove", "path": "/subsets/0/addresses"}]));
    }

    #[test]
    fn test_display() {
        let patch = EndpointPatch::Replace(ips(&["10.0.0.1", "10.0.0.2"]));
        assert_eq!(patch.to_string(), "replace [10.0.0.1, 10.0.0.2]");
        assert_eq!(EndpointPatch::Remove.to_string(), "remove");
    }
}
