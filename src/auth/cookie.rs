/// HTTP-only cookies carrying the access and refresh tokens.
///
/// The refresh cookie is scoped to the /auth path so it is only ever sent
/// to the refresh and logout endpoints; the access cookie rides on every
/// request. Max-age always matches the token class TTL.
use actix_web::cookie::{time::Duration, Cookie, SameSite};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

pub const ACCESS_COOKIE_PATH: &str = "/";
pub const REFRESH_COOKIE_PATH: &str = "/auth";

pub fn access_token_cookie(token: &str, ttl_seconds: i64, secure: bool) -> Cookie<'static> {
    build(
        ACCESS_TOKEN_COOKIE,
        token,
        ACCESS_COOKIE_PATH,
        ttl_seconds,
        secure,
    )
}

pub fn refresh_token_cookie(token: &str, ttl_seconds: i64, secure: bool) -> Cookie<'static> {
    build(
        REFRESH_TOKEN_COOKIE,
        token,
        REFRESH_COOKIE_PATH,
        ttl_seconds,
        secure,
    )
}

pub fn removal_cookie(name: &'static str, path: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "")
        .path(path)
        .http_only(true)
        .same_site(SameSite::Strict)
        .finish();
    cookie.make_removal();
    cookie
}

fn build(
    name: &'static str,
    token: &str,
    path: &'static str,
    ttl_seconds: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build(name, token.to_string())
        .path(path)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::seconds(ttl_seconds))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_cookie_attributes() {
        let cookie = access_token_cookie("tok", 900, true);

        assert_eq!(cookie.name(), "access_token");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(900)));
    }

    #[test]
    fn refresh_cookie_is_scoped_to_auth_path() {
        let cookie = refresh_token_cookie("tok", 2_592_000, false);

        assert_eq!(cookie.name(), "refresh_token");
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(2_592_000)));
    }

    #[test]
    fn removal_cookie_clears_the_value() {
        let cookie = removal_cookie(REFRESH_TOKEN_COOKIE, REFRESH_COOKIE_PATH);

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
