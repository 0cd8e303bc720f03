use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::users::pagination::{PaginationQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::users::repo_types::PublicUser;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for a partial update; omitted or empty fields are kept.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Raw `?page=&size=&order_by=`; numbers are parsed by hand for precise errors.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub page: Option<String>,
    pub size: Option<String>,
    pub order_by: Option<String>,
}

impl TryFrom<ListUsersParams> for PaginationQuery {
    type Error = ApiError;

    fn try_from(p: ListUsersParams) -> Result<Self, Self::Error> {
        let page = match p.page.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ApiError::Validation("invalid page".into()))?,
        };
        let size = match p.size.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_PAGE_SIZE,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
                _ => return Err(ApiError::Validation("invalid size".into())),
            },
        };
        Ok(PaginationQuery {
            page,
            size,
            order_by: p.order_by.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, size: Option<&str>) -> ListUsersParams {
        ListUsersParams {
            page: page.map(Into::into),
            size: size.map(Into::into),
            order_by: None,
        }
    }

    #[test]
    fn list_params_default_and_parse() {
        let q = PaginationQuery::try_from(params(None, None)).unwrap();
        assert_eq!(q, PaginationQuery::default());

        let q = PaginationQuery::try_from(params(Some("3"), Some("25"))).unwrap();
        assert_eq!((q.page, q.size), (3, 25));

        let q = PaginationQuery::try_from(params(Some("4294967295"), Some("100"))).unwrap();
        assert!(q.offset() > 0);
    }

    #[test]
    fn list_params_reject_non_integers() {
        for (page, size, msg) in [
            (Some("abc"), None, "invalid page"),
            (Some("-1"), None, "invalid page"),
            (None, Some("ten"), "invalid size"),
            (None, Some("0"), "invalid size"),
            (None, Some("101"), "invalid size"),
            (Some("4294967295"), Some("4294967295"), "invalid size"),
        ] {
            let err = PaginationQuery::try_from(params(page, size)).unwrap_err();
            assert_eq!(err.to_string(), msg);
        }
    }
}
