//! Caller identity extracted from gateway headers.
//!
//! Authentication happens upstream; the gateway forwards the verified
//! identity in `x-user-id` and `x-user-role`. Requests missing either
//! header are unauthorized, not anonymous.

use std::future::{Ready, ready};

use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest, dev::Payload};

use crate::domain::{Caller, Error, Role};
use crate::inbound::http::validation::{FieldName, parse_uuid};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext(pub Caller);

impl CallerContext {
    /// The caller, provided they hold exactly this role.
    pub fn require(&self, role: Role) -> Result<&Caller, Error> {
        self.require_any(&[role])
    }

    /// The caller, provided they hold one of the given roles.
    pub fn require_any(&self, roles: &[Role]) -> Result<&Caller, Error> {
        if roles.contains(&self.0.role) {
            Ok(&self.0)
        } else {
            Err(Error::forbidden("role not permitted for this operation"))
        }
    }
}

fn header_value<'h>(headers: &'h HeaderMap, name: &str) -> Result<&'h str, Error> {
    headers
        .get(name)
        .ok_or_else(|| Error::unauthorized(format!("missing {name} header")))?
        .to_str()
        .map_err(|_| Error::unauthorized(format!("{name} header is not valid UTF-8")))
}

fn extract_caller(headers: &HeaderMap) -> Result<CallerContext, Error> {
    let user_id = parse_uuid(
        header_value(headers, USER_ID_HEADER)?,
        FieldName::new(USER_ID_HEADER),
    )?;
    let role = header_value(headers, USER_ROLE_HEADER)?
        .parse::<Role>()
        .map_err(|_| Error::unauthorized("x-user-role must be student, instructor or admin"))?;
    Ok(CallerContext(Caller { user_id, role }))
}

impl FromRequest for CallerContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_caller(req.headers()))
    }
}
