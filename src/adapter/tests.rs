use std::cell::RefCell;
use std::path::PathBuf;

use crate::adapter::{classify, Adapter, EngineAdapter};
use crate::engine::{Engine, EngineOptions, EngineResult, EngineSslVersion, HttpAuth};
use crate::error::ErrorKind;
use crate::request::{Headers, Method, RequestDescriptor, SslVersion, VerifyMode};
use crate::Error;

/// Records the options of every run and answers with a scripted result.
struct RecordingEngine {
    result: EngineResult,
    runs: RefCell<Vec<EngineOptions>>,
}

impl RecordingEngine {
    fn answering(result: EngineResult) -> Self {
        RecordingEngine {
            result,
            runs: RefCell::new(vec![]),
        }
    }

    fn last_options(&self) -> EngineOptions {
        self.runs.borrow().last().cloned().expect("engine was run")
    }
}

impl Engine for RecordingEngine {
    fn run(&self, options: &EngineOptions) -> anyhow::Result<EngineResult> {
        self.runs.borrow_mut().push(options.clone());
        Ok(self.result.clone())
    }
}

struct FailingEngine;

impl Engine for FailingEngine {
    fn run(&self, _options: &EngineOptions) -> anyhow::Result<EngineResult> {
        Err(anyhow!("certificate file not found"))
    }
}

fn ok_result() -> EngineResult {
    let mut headers = Headers::new();
    headers.insert("Accept-encoding".to_string(), "utf-8".to_string());
    EngineResult::completed(200, headers, b"foo bar".to_vec())
}

/// Runs a GET for `request` and returns the options the engine saw.
fn generate_request(request: RequestDescriptor) -> EngineOptions {
    let engine = RecordingEngine::answering(ok_result());
    let adapter = EngineAdapter::new(request, &engine);
    adapter.request(Method::Get).unwrap();
    engine.last_options()
}

fn descriptor() -> RequestDescriptor {
    RequestDescriptor::new("http://example.com")
}

fn client_auth_request() -> RequestDescriptor {
    let mut request = descriptor();
    request.auth.ssl.cert_key_file = Some(PathBuf::from("fixtures/client_key.pem"));
    request.auth.ssl.cert_file = Some(PathBuf::from("fixtures/client_cert.pem"));
    request.auth.ssl.cert_key_password = Some("example".to_string());
    request
}

#[test]
fn each_method_is_passed_through_with_body_and_headers() {
    let methods = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Head,
    ];
    for method in methods {
        let engine = RecordingEngine::answering(ok_result());
        let request = descriptor()
            .with_body("xml=hi&name=123")
            .with_header("Coffee-Pot", "of course");
        let adapter = EngineAdapter::new(request, &engine);

        let response = adapter.request(method).unwrap();

        let options = engine.last_options();
        assert_eq!(options.method, method);
        assert_eq!(options.url, "http://example.com");
        assert_eq!(options.body, b"xml=hi&name=123".to_vec());
        assert_eq!(options.headers["Coffee-Pot"], "of course");
        assert_eq!(response.code, 200);
        assert_eq!(response.body, b"foo bar".to_vec());
        assert_eq!(response.headers["Accept-encoding"], "utf-8");
    }
}

#[test]
fn convenience_methods_use_their_verb() {
    let engine = RecordingEngine::answering(ok_result());
    let adapter = EngineAdapter::new(descriptor().with_method(Method::Put), &engine);

    adapter.execute().unwrap();
    assert_eq!(engine.last_options().method, Method::Put);
    adapter.post().unwrap();
    assert_eq!(engine.last_options().method, Method::Post);
    adapter.head().unwrap();
    assert_eq!(engine.last_options().method, Method::Head);
    adapter.delete().unwrap();
    assert_eq!(engine.last_options().method, Method::Delete);
}

#[test]
fn timed_out_result_is_a_timeout_error() {
    let mut result = EngineResult::failed(true, "Operation timed out after 100 milliseconds");
    let engine = RecordingEngine::answering(result.clone());
    let err = EngineAdapter::new(descriptor(), &engine).get().unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Timeout));

    // A timeout flag wins even when a status code came back.
    result.code = 200;
    assert_eq!(classify(result).unwrap_err().kind(), ErrorKind::Timeout);
}

#[test]
fn ssl_message_is_a_tls_error() {
    let message = "SSL routines: certificate verify failed";
    let engine = RecordingEngine::answering(EngineResult::failed(false, message));

    match EngineAdapter::new(descriptor(), &engine).get() {
        Err(Error::Transport(err)) => {
            assert_eq!(err.kind(), ErrorKind::Tls);
            assert_eq!(err.message(), message);
        }
        other => panic!("expected a TLS error, got {:?}", other),
    }

    let err = classify(EngineResult::failed(false, "error:0A000086:ssl3_get_record")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Tls);
}

#[test]
fn other_zero_status_is_a_connection_error() {
    let engine = RecordingEngine::answering(EngineResult::failed(false, "Could not resolve host"));

    match EngineAdapter::new(descriptor(), &engine).get() {
        Err(Error::Transport(err)) => {
            assert_eq!(err.kind(), ErrorKind::Connection);
            assert_eq!(err.message(), "Could not resolve host");
        }
        other => panic!("expected a connection error, got {:?}", other),
    }
}

#[test]
fn error_status_codes_are_responses() {
    for code in [404, 500] {
        let engine = RecordingEngine::answering(EngineResult::completed(
            code,
            Headers::new(),
            b"not here".to_vec(),
        ));

        let response = EngineAdapter::new(descriptor(), &engine).get().unwrap();

        assert_eq!(response.code, code);
        assert_eq!(response.body, b"not here".to_vec());
    }
}

#[test]
fn engine_configuration_errors_propagate() {
    let err = EngineAdapter::new(descriptor(), FailingEngine).get().unwrap_err();

    assert!(matches!(err, Error::Engine(_)));
    assert_eq!(err.kind(), None);
}

#[test]
fn proxy_is_not_set_unless_specified() {
    assert_eq!(generate_request(descriptor()).proxy, None);
}

#[test]
fn proxy_is_set_if_specified() {
    let options = generate_request(descriptor().with_proxy("http://proxy.example.com"));
    assert_eq!(options.proxy.as_deref(), Some("http://proxy.example.com"));
}

#[test]
fn timeout_ms_is_not_set_unless_specified() {
    assert_eq!(generate_request(descriptor()).timeout_ms, None);
}

#[test]
fn timeout_ms_is_set_from_read_timeout() {
    let mut request = descriptor();
    request.read_timeout = Some(30.0);
    assert_eq!(generate_request(request).timeout_ms, Some(30_000));
}

#[test]
fn timeout_ms_is_set_from_write_timeout() {
    let mut request = descriptor();
    request.write_timeout = Some(30.0);
    assert_eq!(generate_request(request).timeout_ms, Some(30_000));
}

#[test]
fn read_timeout_wins_over_write_timeout() {
    let mut request = descriptor();
    request.read_timeout = Some(5.0);
    request.write_timeout = Some(30.0);
    assert_eq!(generate_request(request).timeout_ms, Some(5_000));
}

#[test]
fn connecttimeout_ms_is_set_if_specified() {
    assert_eq!(generate_request(descriptor()).connecttimeout_ms, None);

    let mut request = descriptor();
    request.open_timeout = Some(30.0);
    assert_eq!(generate_request(request).connecttimeout_ms, Some(30_000));

    let mut request = descriptor();
    request.open_timeout = Some(0.25);
    assert_eq!(generate_request(request).connecttimeout_ms, Some(250));
}

#[test]
fn headers_are_passed_unchanged() {
    let request = descriptor()
        .with_header("Coffee-Pot", "of course")
        .with_header("x-lower", "Mixed Case");

    let options = generate_request(request.clone());

    assert_eq!(options.headers, request.headers);
}

#[test]
fn http_auth_is_not_set_without_authentication() {
    let options = generate_request(descriptor());
    assert_eq!(options.httpauth, None);
    assert_eq!(options.username, None);
    assert_eq!(options.password, None);
}

#[test]
fn http_auth_types_and_credentials() {
    let mut basic = descriptor();
    basic.auth.basic("foo", "bar");
    let mut digest = descriptor();
    digest.auth.digest("foo", "bar");
    let mut ntlm = descriptor();
    ntlm.auth.ntlm("tester", "vReqSoafRe5O");

    let options = generate_request(basic);
    assert_eq!(options.httpauth, Some(HttpAuth::Basic));
    assert_eq!(options.username.as_deref(), Some("foo"));
    assert_eq!(options.password.as_deref(), Some("bar"));

    let options = generate_request(digest);
    assert_eq!(options.httpauth, Some(HttpAuth::Digest));
    assert_eq!(options.username.as_deref(), Some("foo"));
    assert_eq!(options.password.as_deref(), Some("bar"));

    let options = generate_request(ntlm);
    assert_eq!(options.httpauth, Some(HttpAuth::Ntlm));
    assert_eq!(options.username.as_deref(), Some("tester"));
    assert_eq!(options.password.as_deref(), Some("vReqSoafRe5O"));
}

#[test]
fn ssl_version_is_unset_when_unspecified() {
    let mut request = descriptor();
    request.set_ssl(true);
    assert_eq!(generate_request(request).sslversion, None);
}

#[test]
fn ssl_version_mapping() {
    let table = [
        (SslVersion::TLSv1_2, EngineSslVersion::Tlsv1_2),
        (SslVersion::TLSv1_1, EngineSslVersion::Tlsv1_1),
        (SslVersion::TLSv1, EngineSslVersion::Tlsv1),
        (SslVersion::SSLv2, EngineSslVersion::Sslv2),
        (SslVersion::SSLv23, EngineSslVersion::Sslv2),
        (SslVersion::SSLv3, EngineSslVersion::Sslv3),
    ];
    for (version, expected) in table {
        let mut request = descriptor();
        request.set_ssl(true);
        request.auth.ssl.ssl_version = Some(version);
        assert_eq!(generate_request(request).sslversion, Some(expected));
    }
    assert_eq!(EngineSslVersion::Tlsv1_2.to_string(), "tlsv1_2");
}

#[test]
fn ssl_version_is_mapped_without_tls_enabled() {
    let mut request = descriptor();
    request.auth.ssl.ssl_version = Some(SslVersion::TLSv1_1);

    let options = generate_request(request);

    assert_eq!(options.sslversion, Some(EngineSslVersion::Tlsv1_1));
    assert_eq!(options.ssl_verifyhost, None);
    assert_eq!(options.ssl_verifypeer, None);
    assert_eq!(options.sslcerttype, None);
}

#[test]
fn tls_options_are_unset_when_tls_is_disabled() {
    let mut request = descriptor();
    request.auth.ssl.cert_file = Some(PathBuf::from("client_cert.pem"));

    let options = generate_request(request);

    assert_eq!(options.ssl_verifyhost, None);
    assert_eq!(options.ssl_verifypeer, None);
    assert_eq!(options.sslcerttype, None);
    assert_eq!(options.sslcert, None);
}

#[test]
fn certificate_is_sent_regardless_of_verify_mode() {
    let mut request = client_auth_request();
    request.auth.ssl.verify_mode = VerifyMode::None;

    let options = generate_request(request);

    assert_eq!(options.sslcert, Some(PathBuf::from("fixtures/client_cert.pem")));
    assert_eq!(options.sslkey, Some(PathBuf::from("fixtures/client_key.pem")));
    assert_eq!(options.sslkeypasswd.as_deref(), Some("example"));
    assert_eq!(options.ssl_verifyhost, Some(0));
    assert_eq!(options.ssl_verifypeer, Some(false));
}

#[test]
fn peer_mode_verifies_host_and_peer() {
    let mut request = client_auth_request();
    request.auth.ssl.verify_mode = VerifyMode::Peer;

    let options = generate_request(request);

    assert_eq!(options.sslcert, Some(PathBuf::from("fixtures/client_cert.pem")));
    assert_eq!(options.sslkey, Some(PathBuf::from("fixtures/client_key.pem")));
    assert_eq!(options.sslkeypasswd.as_deref(), Some("example"));
    assert_eq!(options.ssl_verifyhost, Some(2));
    assert_eq!(options.ssl_verifypeer, Some(true));
}

// Every mode other than `None` and `Peer` keeps the strict host check but
// leaves peer verification off. This is deliberate and must not be widened.
#[test]
fn other_modes_verify_host_only() {
    for mode in [
        VerifyMode::Host,
        VerifyMode::FailIfNoPeerCert,
        VerifyMode::ClientOnce,
    ] {
        let mut request = client_auth_request();
        request.auth.ssl.verify_mode = mode;

        let options = generate_request(request);

        assert_eq!(options.ssl_verifyhost, Some(2), "{:?}", mode);
        assert_eq!(options.ssl_verifypeer, Some(false), "{:?}", mode);
    }
}

#[test]
fn cert_type_is_upper_cased() {
    let options = generate_request(client_auth_request());
    assert_eq!(options.sslcerttype.as_deref(), Some("PEM"));

    let mut request = client_auth_request();
    request.auth.ssl.cert_type = "der".to_string();
    assert_eq!(generate_request(request).sslcerttype.as_deref(), Some("DER"));
}

#[test]
fn ca_cert_is_set_if_specified() {
    let mut request = client_auth_request();
    assert_eq!(generate_request(request.clone()).cainfo, None);

    request.auth.ssl.ca_cert_file = Some(PathBuf::from("fixtures/client_cert.pem"));
    assert_eq!(
        generate_request(request).cainfo,
        Some(PathBuf::from("fixtures/client_cert.pem"))
    );
}

#[test]
fn tls_applies_alongside_http_auth() {
    let mut request = client_auth_request();
    request.auth.basic("foo", "bar");

    let options = generate_request(request);

    assert_eq!(options.httpauth, Some(HttpAuth::Basic));
    assert_eq!(options.ssl_verifyhost, Some(2));
    assert!(options.sslcert.is_some());
}

#[test]
fn options_are_rebuilt_for_every_call() {
    let engine = RecordingEngine::answering(ok_result());
    let mut request = descriptor();
    request.auth.basic("foo", "bar");
    let adapter = EngineAdapter::new(request, &engine);

    adapter.get().unwrap();
    adapter.post().unwrap();

    let runs = engine.runs.borrow();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].proxy, None);
    assert_eq!(runs[1].method, Method::Post);
    assert_eq!(runs[1].httpauth, Some(HttpAuth::Basic));
    assert_eq!(runs[0], adapter.build_options(Method::Get));
}
