use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use reqwest::blocking::{Client, ClientBuilder, RequestBuilder};
use reqwest::header::HeaderMap;
use reqwest::tls::{self, Certificate, Identity};
use reqwest::Proxy;
use tracing::{trace, warn};

use crate::engine::{
    Engine, EngineOptions, EngineResult, EngineSslVersion, HttpAuth, VERIFY_HOST_NONE,
};
use crate::request::{Headers, Method};

/// Runs requests with `reqwest`'s blocking client.
///
/// A new client is built for every run, so nothing (connections, cookies,
/// TLS sessions) carries over from one request to the next.
///
/// native-tls has no switch for checking the host name while skipping chain
/// verification. `ssl_verifypeer = false` therefore disables both checks,
/// whatever `ssl_verifyhost` says; a warning is logged when a strict host
/// check is lost this way.
///
/// Client keys must be unencrypted PKCS#8 PEM, or bundled in a PKCS#12 file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestEngine;

impl Engine for ReqwestEngine {
    fn run(&self, options: &EngineOptions) -> anyhow::Result<EngineResult> {
        let client = build_client(options)?;

        let mut request_builder = client.request(options.method.into(), options.url.as_str());
        request_builder = set_headers(&options.headers, request_builder);
        request_builder = set_auth(options, request_builder)?;
        if !options.body.is_empty() {
            request_builder = request_builder.body(options.body.clone());
        }
        let request = request_builder
            .build()
            .with_context(|| format!("Failed building request for {}", options.url))?;

        match client.execute(request).and_then(into_result) {
            Ok(result) => Ok(result),
            Err(err) if err.is_builder() => Err(err.into()),
            Err(err) => {
                trace!(error = ?err, "reqwest reported a transport failure");
                Ok(EngineResult::failed(err.is_timeout(), return_message(&err)))
            }
        }
    }
}

fn build_client(options: &EngineOptions) -> anyhow::Result<Client> {
    let mut builder = Client::builder();

    if let Some(proxy) = &options.proxy {
        let proxy = Proxy::all(proxy.as_str())
            .with_context(|| format!("Invalid proxy URL: {:?}", proxy))?;
        builder = builder.proxy(proxy);
    }

    if let Some(version) = options.sslversion {
        builder = builder.min_tls_version(tls_version(version)?);
    }
    let checks = certificate_checks(options);
    if checks.accept_invalid_hostnames {
        builder = builder.danger_accept_invalid_hostnames(true);
    }
    if checks.accept_invalid_certs {
        builder = builder.danger_accept_invalid_certs(true);
    }
    builder = set_identity(options, builder)?;
    if let Some(cainfo) = &options.cainfo {
        let certificate = Certificate::from_pem(&read(cainfo)?)
            .with_context(|| format!("Invalid CA certificate: {:?}", cainfo))?;
        builder = builder.add_root_certificate(certificate);
    }

    if let Some(connect_timeout) = options.connecttimeout_ms {
        builder = builder.connect_timeout(Duration::from_millis(connect_timeout));
    }
    if let Some(timeout) = options.timeout_ms {
        builder = builder.timeout(Duration::from_millis(timeout));
    }

    builder.build().context("Failed building HTTP client")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct CertificateChecks {
    pub(super) accept_invalid_hostnames: bool,
    pub(super) accept_invalid_certs: bool,
}

pub(super) fn certificate_checks(options: &EngineOptions) -> CertificateChecks {
    let checks = CertificateChecks {
        accept_invalid_hostnames: options.ssl_verifyhost == Some(VERIFY_HOST_NONE),
        accept_invalid_certs: options.ssl_verifypeer == Some(false),
    };
    let host_check_lost = checks.accept_invalid_certs
        && !checks.accept_invalid_hostnames
        && options.ssl_verifyhost.is_some();
    if host_check_lost {
        warn!(
            url = %options.url,
            "certificate verification is off, so the host name is not checked either"
        );
    }
    checks
}

/// The requested version is a minimum, as with curl. No maximum is set.
pub(super) fn tls_version(version: EngineSslVersion) -> anyhow::Result<tls::Version> {
    match version {
        EngineSslVersion::Tlsv1_2 => Ok(tls::Version::TLS_1_2),
        EngineSslVersion::Tlsv1_1 => Ok(tls::Version::TLS_1_1),
        EngineSslVersion::Tlsv1 => Ok(tls::Version::TLS_1_0),
        EngineSslVersion::Sslv2 | EngineSslVersion::Sslv3 => {
            bail!("{} is not supported by the reqwest engine", version)
        }
    }
}

fn set_identity(options: &EngineOptions, builder: ClientBuilder) -> anyhow::Result<ClientBuilder> {
    let cert = match (&options.sslcert, &options.sslkey) {
        (Some(cert), _) => cert,
        (None, Some(key)) => bail!("Client key {:?} was given without a certificate", key),
        (None, None) => return Ok(builder),
    };
    let cert_type = options.sslcerttype.as_deref().unwrap_or("PEM");

    let identity = match cert_type {
        "PEM" => {
            if options.sslkeypasswd.is_some() {
                bail!("Encrypted PEM keys are not supported by the reqwest engine");
            }
            let key = options.sslkey.as_deref().unwrap_or(cert.as_path());
            Identity::from_pkcs8_pem(&read(cert)?, &read(key)?)
        }
        "P12" => {
            let password = options.sslkeypasswd.as_deref().unwrap_or("");
            Identity::from_pkcs12_der(&read(cert)?, password)
        }
        other => bail!("Certificate type {} is not supported by the reqwest engine", other),
    }
    .with_context(|| format!("Invalid client certificate: {:?}", cert))?;

    Ok(builder.identity(identity))
}

fn set_auth(
    options: &EngineOptions,
    request_builder: RequestBuilder,
) -> anyhow::Result<RequestBuilder> {
    match options.httpauth {
        None => Ok(request_builder),
        Some(HttpAuth::Basic) => Ok(request_builder.basic_auth(
            options.username.as_deref().unwrap_or_default(),
            options.password.as_deref(),
        )),
        Some(scheme) => bail!("HTTP {} authentication is not supported by the reqwest engine", scheme),
    }
}

fn set_headers(headers: &Headers, mut request_builder: RequestBuilder) -> RequestBuilder {
    for (key, value) in headers {
        request_builder = request_builder.header(key.as_str(), value.as_str());
    }
    request_builder
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed reading {:?}", path))
}

/// The diagnostic text of a failed request: the cause chain, without the
/// request URL, so the URL cannot leak into failure classification.
fn return_message(err: &reqwest::Error) -> String {
    let mut message = String::new();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            if !message.is_empty() {
                message.push_str(": ");
            }
            message.push_str(&text);
        }
        source = cause.source();
    }
    if message.is_empty() {
        message = err.to_string();
    }
    message
}

fn into_result(response: reqwest::blocking::Response) -> reqwest::Result<EngineResult> {
    let code = response.status().as_u16();
    let headers = collect_headers(response.headers());
    let body = response.bytes()?.to_vec();
    Ok(EngineResult::completed(code, headers, body))
}

fn collect_headers(header_map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (header_name, header_value) in header_map.iter() {
        let value = String::from_utf8_lossy(header_value.as_bytes());
        match headers.get_mut(header_name.as_str()) {
            Some(joined) => {
                joined.push_str(", ");
                joined.push_str(&value);
            }
            None => {
                headers.insert(header_name.to_string(), value.into_owned());
            }
        }
    }
    headers
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Patch => reqwest::Method::PATCH,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}
