//! Transport-neutral request descriptor.

/// The slice of an inbound request that key-generation strategies need.
///
/// Transport adapters (an HTTP middleware, a gRPC interceptor, a raw socket
/// server) populate this from their own request type; the limiter never
/// assumes a specific framework.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Client network address (typically the peer IP).
    pub client_addr: String,
    /// Request method or verb.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Authenticated user id, when the request carries one.
    pub principal: Option<String>,
    /// Username attempted by a login request, when present.
    pub credential: Option<String>,
}

impl RequestDescriptor {
    /// Create a descriptor from the fields every transport can supply.
    pub fn new(
        client_addr: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            client_addr: client_addr.into(),
            method: method.into(),
            path: path.into(),
            principal: None,
            credential: None,
        }
    }

    /// Attach the authenticated user id.
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// Attach the username a login attempt is targeting.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}
