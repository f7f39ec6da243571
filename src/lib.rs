use std::error::Error;

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod identity;
pub mod model;
pub mod notification;
pub mod routes;
pub mod s3;
pub mod service;
pub mod store;

pub fn unpack_error(err: &dyn Error) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

/// Public location of an object. Services without a known virtual-host
/// scheme are addressed path-style on the configured endpoint.
pub fn get_s3_url(service: &str, endpoint: &str, bucket: &str, key: &str) -> String {
    match service {
        "t3" => format!("https://{}.t3.storage.dev/{}", bucket, key),
        "s3" => format!("https://{}.s3.amazonaws.com/{}", bucket, key),
        _ => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_s3_url_by_service() {
        assert_eq!(
            get_s3_url("s3", "https://s3.amazonaws.com", "attachments", "b1"),
            "https://attachments.s3.amazonaws.com/b1"
        );
        assert_eq!(
            get_s3_url("t3", "https://fly.storage.tigris.dev", "attachments", "b1"),
            "https://attachments.t3.storage.dev/b1"
        );
    }

    #[test]
    fn test_get_s3_url_path_style_for_other_services() {
        assert_eq!(
            get_s3_url("minio", "http://localhost:9000/", "attachments", "b1"),
            "http://localhost:9000/attachments/b1"
        );
    }
}
