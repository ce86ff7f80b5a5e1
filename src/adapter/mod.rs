//! Turns a [`RequestDescriptor`] into engine options, runs the engine once
//! and normalizes what comes back.
//!
//! Only transport failures become errors. A response with any status code,
//! 404 and 500 included, is returned as a [`Response`].

use tracing::{debug, warn};

use crate::engine::{
    Engine, EngineOptions, EngineResult, EngineSslVersion, HttpAuth, NO_RESPONSE,
    VERIFY_HOST_NONE, VERIFY_HOST_STRICT,
};
use crate::error::{ErrorKind, TransportError};
use crate::request::{Auth, AuthKind, Method, RequestDescriptor, SslVersion, VerifyMode};
use crate::{Error, Response, Result};

#[cfg(test)]
mod tests;

pub trait Adapter {
    fn descriptor(&self) -> &RequestDescriptor;

    fn request(&self, method: Method) -> Result<Response>;

    /// Issues the request with the descriptor's own method.
    fn execute(&self) -> Result<Response> {
        self.request(self.descriptor().method)
    }

    fn get(&self) -> Result<Response> {
        self.request(Method::Get)
    }

    fn post(&self) -> Result<Response> {
        self.request(Method::Post)
    }

    fn put(&self) -> Result<Response> {
        self.request(Method::Put)
    }

    fn delete(&self) -> Result<Response> {
        self.request(Method::Delete)
    }

    fn head(&self) -> Result<Response> {
        self.request(Method::Head)
    }
}

/// An [`Adapter`] over any [`Engine`].
///
/// Holds the descriptor and the engine, nothing else. Options are rebuilt
/// from scratch on every call.
#[derive(Debug)]
pub struct EngineAdapter<E> {
    request: RequestDescriptor,
    engine: E,
}

impl<E: Engine> EngineAdapter<E> {
    pub fn new(request: RequestDescriptor, engine: E) -> Self {
        EngineAdapter { request, engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The engine options a request with `method` would run with.
    pub fn build_options(&self, method: Method) -> EngineOptions {
        let request = &self.request;
        let mut options =
            EngineOptions::new(method, &request.url, &request.body, &request.headers);

        configure_auth(&request.auth, &mut options);
        configure_proxy(request, &mut options);
        configure_ssl(&request.auth, &mut options);
        configure_timeouts(request, &mut options);

        options
    }
}

impl<E: Engine> Adapter for EngineAdapter<E> {
    fn descriptor(&self) -> &RequestDescriptor {
        &self.request
    }

    fn request(&self, method: Method) -> Result<Response> {
        let options = self.build_options(method);
        debug!(%method, url = %options.url, "executing request");

        let result = self.engine.run(&options).map_err(Error::Engine)?;
        let response = classify(result)?;

        debug!(%method, url = %options.url, code = response.code, "received response");
        Ok(response)
    }
}

fn configure_auth(auth: &Auth, options: &mut EngineOptions) {
    let (scheme, credentials) = match &auth.kind {
        AuthKind::None => return,
        AuthKind::Basic(credentials) => (HttpAuth::Basic, credentials),
        AuthKind::Digest(credentials) => (HttpAuth::Digest, credentials),
        AuthKind::Ntlm(credentials) => (HttpAuth::Ntlm, credentials),
    };

    options.httpauth = Some(scheme);
    options.username = Some(credentials.username.clone());
    options.password = Some(credentials.password.clone());
}

fn configure_proxy(request: &RequestDescriptor, options: &mut EngineOptions) {
    if let Some(proxy) = &request.proxy {
        options.proxy = Some(proxy.clone());
    }
}

fn engine_ssl_version(version: SslVersion) -> EngineSslVersion {
    match version {
        SslVersion::TLSv1_2 => EngineSslVersion::Tlsv1_2,
        SslVersion::TLSv1_1 => EngineSslVersion::Tlsv1_1,
        SslVersion::TLSv1 => EngineSslVersion::Tlsv1,
        SslVersion::SSLv2 | SslVersion::SSLv23 => EngineSslVersion::Sslv2,
        SslVersion::SSLv3 => EngineSslVersion::Sslv3,
    }
}

fn configure_ssl(auth: &Auth, options: &mut EngineOptions) {
    let ssl = &auth.ssl;

    // The version hint is independent of whether TLS is otherwise enabled.
    options.sslversion = ssl.ssl_version.map(engine_ssl_version);

    if !ssl.is_enabled() {
        return;
    }

    // Host checking stays strict for every mode but `None`; only `Peer`
    // additionally verifies the peer certificate.
    if ssl.verify_mode == VerifyMode::None {
        options.ssl_verifyhost = Some(VERIFY_HOST_NONE);
        options.ssl_verifypeer = Some(false);
    } else {
        options.ssl_verifyhost = Some(VERIFY_HOST_STRICT);
        options.ssl_verifypeer = Some(ssl.verify_mode == VerifyMode::Peer);
    }

    // Client certificates go out whatever the verify mode.
    options.sslcerttype = Some(ssl.cert_type.to_uppercase());
    if let Some(cert_file) = &ssl.cert_file {
        options.sslcert = Some(cert_file.clone());
    }
    if let Some(cert_key_file) = &ssl.cert_key_file {
        options.sslkey = Some(cert_key_file.clone());
    }
    if let Some(cert_key_password) = &ssl.cert_key_password {
        options.sslkeypasswd = Some(cert_key_password.clone());
    }
    if let Some(ca_cert_file) = &ssl.ca_cert_file {
        options.cainfo = Some(ca_cert_file.clone());
    }
}

fn to_millis(seconds: f64) -> u64 {
    (seconds * 1000.0) as u64
}

fn configure_timeouts(request: &RequestDescriptor, options: &mut EngineOptions) {
    if let Some(open_timeout) = request.open_timeout {
        options.connecttimeout_ms = Some(to_millis(open_timeout));
    }
    if let Some(read_or_write_timeout) = request.read_timeout.or(request.write_timeout) {
        options.timeout_ms = Some(to_millis(read_or_write_timeout));
    }
}

/// Separates transport failures from responses.
///
/// A timeout wins over everything else. A result without a status code is a
/// TLS failure when the engine's message mentions SSL, and a connection
/// failure otherwise. Anything carrying a status code is a response.
pub fn classify(result: EngineResult) -> std::result::Result<Response, TransportError> {
    let failure = if result.timed_out {
        Some(TransportError::timeout())
    } else if result.code == NO_RESPONSE {
        let kind = if result.return_message.to_lowercase().contains("ssl") {
            ErrorKind::Tls
        } else {
            ErrorKind::Connection
        };
        Some(TransportError::new(kind, result.return_message))
    } else {
        None
    };

    match failure {
        Some(err) => {
            warn!(kind = ?err.kind(), error = err.message(), "request failed");
            Err(err)
        }
        None => Ok(Response::new(result.code, result.headers, result.body)),
    }
}
