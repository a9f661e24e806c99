//! Auth-header command - show the Basic authorization header

use eventstream_client::basic_auth_header;

/// Print the `Authorization` header sent for a username/password pair
pub fn auth_header(username: &str, password: &str) {
    println!("Authorization: {}", basic_auth_header(username, password));
}
