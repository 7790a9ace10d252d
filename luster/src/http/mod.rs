mod handler;

pub use handler::{create_http_handler, expect_success, parse_json_if_ok, HttpHandler, USER_AGENT};
