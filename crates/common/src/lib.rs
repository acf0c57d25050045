//! Shared building blocks for the storefront crates: logging bootstrap and
//! the wire types every HTTP response is wrapped in.

pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn envelope_success_omits_error() {
        let body = types::ApiResponse::success("done", Some(42));
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["data"], 42);
        assert!(v.get("error").is_none());
    }

    #[test]
    fn envelope_failure_omits_data() {
        let body = types::ApiResponse::<()>::failure("login failed", "invalid credentials");
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "invalid credentials");
        assert!(v.get("data").is_none());
    }
}
