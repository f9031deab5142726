//! HTTP method tokens understood by the routing model
//!
//! Handler modules name their exports after these tokens (`GET`, `POST`, ...).
//! Two sentinels exist besides the concrete methods:
//! - `ALL`: a module without method exports that serves every method through
//!   its `default` or `handler` export
//! - `ANY`: an artifact name that carries no method suffix

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A concrete HTTP method or one of the two wildcard sentinels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    All,
    Any,
}

impl Method {
    /// The seven methods a module may export by name, in canonical order
    pub const HTTP: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
    ];

    /// Uppercase token, as used in route keys and export names
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::All => "ALL",
            Method::Any => "ANY",
        }
    }

    /// Classifies an export name as an HTTP method handler (case-insensitive)
    ///
    /// Only the seven concrete methods qualify; `ALL`/`ANY` are never export names.
    ///
    /// # Examples
    ///
    /// ```
    /// use skyport_router::Method;
    ///
    /// assert_eq!(Method::from_export_name("GET"), Some(Method::Get));
    /// assert_eq!(Method::from_export_name("post"), Some(Method::Post));
    /// assert_eq!(Method::from_export_name("handler"), None);
    /// assert_eq!(Method::from_export_name("ALL"), None);
    /// ```
    pub fn from_export_name(name: &str) -> Option<Method> {
        Method::HTTP
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(name))
    }

    /// True for the `ALL` and `ANY` sentinels
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Method::All | Method::Any)
    }

    /// Whether a handler registered under `self` serves a request made with `requested`
    pub fn serves(&self, requested: Method) -> bool {
        self.is_wildcard() || *self == requested
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known method token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(method) = Method::from_export_name(s) {
            return Ok(method);
        }
        match s.to_ascii_uppercase().as_str() {
            "ALL" => Ok(Method::All),
            "ANY" => Ok(Method::Any),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip_tokens() {
        for method in Method::HTTP {
            assert_eq!(method.as_str().parse::<Method>(), Ok(method));
        }
        assert_eq!("all".parse::<Method>(), Ok(Method::All));
        assert_eq!("Any".parse::<Method>(), Ok(Method::Any));
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn test_wildcards_serve_everything() {
        assert!(Method::All.serves(Method::Delete));
        assert!(Method::Any.serves(Method::Get));
        assert!(Method::Get.serves(Method::Get));
        assert!(!Method::Get.serves(Method::Post));
    }
}
