use std::fmt;

/// Outcome status of a fetch attempt
///
/// HTTP responses map onto the named variants (or `Other` for codes without a
/// name here). `Timeout` and `Unreachable` describe transport failures that the
/// downloader reports as error pages instead of failing the fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    // ===== Success =====
    Ok,
    Created,
    Accepted,
    NoContent,

    // ===== Redirection =====
    MovedPermanently,
    Found,
    SeeOther,
    NotModified,
    TemporaryRedirect,
    PermanentRedirect,

    // ===== Client Errors =====
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    RequestTimeout,
    Gone,
    TooManyRequests,

    // ===== Server Errors =====
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,

    /// Any HTTP status code without a dedicated variant
    Other(u16),

    // ===== Transport Failures =====
    /// The request timed out before a response arrived
    Timeout,

    /// The host could not be connected to (DNS, refused connection, TLS)
    Unreachable,
}

impl Status {
    /// Maps an HTTP status code onto a `Status`
    pub fn from_http_code(code: u16) -> Self {
        match code {
            200 => Self::Ok,
            201 => Self::Created,
            202 => Self::Accepted,
            204 => Self::NoContent,
            301 => Self::MovedPermanently,
            302 => Self::Found,
            303 => Self::SeeOther,
            304 => Self::NotModified,
            307 => Self::TemporaryRedirect,
            308 => Self::PermanentRedirect,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            408 => Self::RequestTimeout,
            410 => Self::Gone,
            429 => Self::TooManyRequests,
            500 => Self::InternalServerError,
            501 => Self::NotImplemented,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            other => Self::Other(other),
        }
    }

    /// The HTTP status code, or `None` for transport failures
    pub fn code(&self) -> Option<u16> {
        let code = match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::Accepted => 202,
            Self::NoContent => 204,
            Self::MovedPermanently => 301,
            Self::Found => 302,
            Self::SeeOther => 303,
            Self::NotModified => 304,
            Self::TemporaryRedirect => 307,
            Self::PermanentRedirect => 308,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::RequestTimeout => 408,
            Self::Gone => 410,
            Self::TooManyRequests => 429,
            Self::InternalServerError => 500,
            Self::NotImplemented => 501,
            Self::BadGateway => 502,
            Self::ServiceUnavailable => 503,
            Self::GatewayTimeout => 504,
            Self::Other(code) => *code,
            Self::Timeout | Self::Unreachable => return None,
        };
        Some(code)
    }

    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        matches!(self.code(), Some(200..=299))
    }

    /// Returns true for failures that never produced an HTTP response
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Timeout | Self::Unreachable)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Unreachable => write!(f, "unreachable"),
            Self::Other(code) => write!(f, "HTTP {}", code),
            named => match named.code() {
                Some(code) => write!(f, "HTTP {} ({:?})", code, named),
                None => write!(f, "{:?}", named),
            },
        }
    }
}
