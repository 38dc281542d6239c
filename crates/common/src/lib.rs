//! Shared building blocks for the student hub binaries: wire types,
//! logging setup and startup environment checks.

pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_serializes_status() {
        let h = types::Health { status: "ok" };
        let v = serde_json::to_value(&h).unwrap();
        assert_eq!(v, serde_json::json!({"status": "ok"}));
    }

    #[test]
    fn error_body_shape() {
        let body = types::ErrorBody::new("Not found");
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v, serde_json::json!({"error": "Not found"}));
    }
}
