//! Status codes written with every response.
//!
//! Numeric ranges carry meaning: 2000–2999 success, 4000–4999 authorization,
//! 5000–5999 server and application errors.

/// A numeric response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    // Success
    pub const OK: StatusCode = StatusCode(2000);
    pub const NAMESPACE_ALREADY_EXISTS: StatusCode = StatusCode(2001);
    pub const USER_ALREADY_EXISTS: StatusCode = StatusCode(2002);

    // Authorization
    pub const UNAUTHORIZED: StatusCode = StatusCode(4000);

    // Errors
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(5000);
    pub const INVALID_STATEMENT_TYPE: StatusCode = StatusCode(5001);
    pub const NAMESPACE_DOES_NOT_EXIST: StatusCode = StatusCode(5002);
    pub const USER_DOES_NOT_EXIST: StatusCode = StatusCode(5003);
    pub const CREATE_NAMESPACE_ERROR: StatusCode = StatusCode(5004);

    pub fn code(self) -> u16 {
        self.0
    }

    /// The registered name, if any. Unknown codes render as `Unknown`.
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            2000 => "OK",
            2001 => "NamespaceAlreadyExists",
            2002 => "UserAlreadyExists",
            4000 => "Unauthorized",
            5000 => "InternalServerError",
            5001 => "InvalidStatementType",
            5002 => "NamespaceDoesNotExist",
            5003 => "UserDoesNotExist",
            5004 => "CreateNamespaceError",
            _ => return None,
        };
        Some(name)
    }

    pub fn is_success(self) -> bool {
        (2000..3000).contains(&self.0)
    }
}
