//! Client IP extraction against real actix requests

use std::net::SocketAddr;

use actix_web::test::TestRequest;
use geolookup::config::{IpHeader, StaticConfig};
use geolookup::utils::client_ip_from_request;

fn peer(addr: &str) -> SocketAddr {
    addr.parse().unwrap()
}

#[test]
fn test_default_headers_prefer_forwarded_for() {
    let headers = StaticConfig::default().ip_headers;
    let req = TestRequest::default()
        .insert_header(("x-real-ip", "198.51.100.4"))
        .insert_header(("x-forwarded-for", "203.0.113.50"))
        .peer_addr(peer("127.0.0.1:40000"))
        .to_http_request();

    assert_eq!(client_ip_from_request(&req, &headers), "203.0.113.50");
}

#[test]
fn test_header_names_match_case_insensitively() {
    let headers = vec![IpHeader::new("CF-Connecting-IP", 1)];
    let req = TestRequest::default()
        .insert_header(("cf-connecting-ip", "2001:db8::7"))
        .to_http_request();

    assert_eq!(client_ip_from_request(&req, &headers), "2001:db8::7");
}

#[test]
fn test_falls_back_to_peer_address() {
    let headers = StaticConfig::default().ip_headers;
    let req = TestRequest::default()
        .insert_header(("x-forwarded-for", " "))
        .peer_addr(peer("[::ffff:192.0.2.33]:8080"))
        .to_http_request();

    assert_eq!(client_ip_from_request(&req, &headers), "192.0.2.33");
}

#[test]
fn test_no_source_yields_empty_string() {
    let req = TestRequest::default().to_http_request();
    assert_eq!(client_ip_from_request(&req, &[]), "");
}

#[test]
fn test_unprioritized_headers_keep_config_order() {
    let headers = vec![
        IpHeader::named("x-client-ip"),
        IpHeader::named("true-client-ip"),
        IpHeader::new("x-real-ip", 5),
    ];
    let req = TestRequest::default()
        .insert_header(("true-client-ip", "192.0.2.2"))
        .insert_header(("x-client-ip", "192.0.2.1"))
        .to_http_request();
    assert_eq!(client_ip_from_request(&req, &headers), "192.0.2.1");

    let req = TestRequest::default()
        .insert_header(("true-client-ip", "192.0.2.2"))
        .insert_header(("x-client-ip", "192.0.2.1"))
        .insert_header(("x-real-ip", "192.0.2.3"))
        .to_http_request();
    assert_eq!(client_ip_from_request(&req, &headers), "192.0.2.3");
}
