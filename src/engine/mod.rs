//! The execution engine seam.
//!
//! An [`Engine`] receives a fully populated [`EngineOptions`] and performs one
//! blocking HTTP call with it. Option names follow the libcurl vocabulary
//! (`httpauth`, `ssl_verifyhost`, `timeout_ms`, ...). Every option other than
//! the request line, body and headers is optional: `None` means "leave the
//! engine's own default alone", which is not the same as any explicit value.

use std::fmt;
use std::path::PathBuf;

use crate::request::{Headers, Method};


#[cfg(feature = "reqwest")]
pub mod reqwest;

/// `ssl_verifyhost` value that skips the hostname check.
pub const VERIFY_HOST_NONE: u8 = 0;
/// `ssl_verifyhost` value that requires the certificate to match the host.
pub const VERIFY_HOST_STRICT: u8 = 2;

/// Status code an engine reports when no response was received.
pub const NO_RESPONSE: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpAuth {
    Basic,
    Digest,
    Ntlm,
}

impl fmt::Display for HttpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = match *self {
            HttpAuth::Basic => "basic",
            HttpAuth::Digest => "digest",
            HttpAuth::Ntlm => "ntlm",
        };
        f.write_str(auth)
    }
}

/// Protocol versions as the engine names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum EngineSslVersion {
    Tlsv1_2,
    Tlsv1_1,
    Tlsv1,
    Sslv2,
    Sslv3,
}

impl fmt::Display for EngineSslVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = match *self {
            EngineSslVersion::Tlsv1_2 => "tlsv1_2",
            EngineSslVersion::Tlsv1_1 => "tlsv1_1",
            EngineSslVersion::Tlsv1 => "tlsv1",
            EngineSslVersion::Sslv2 => "sslv2",
            EngineSslVersion::Sslv3 => "sslv3",
        };
        f.write_str(version)
    }
}

/// Per-call engine configuration. Built fresh for every request and never
/// reused.
#[derive(Clone, Default, PartialEq)]
pub struct EngineOptions {
    pub method: Method,
    pub url: String,
    pub body: Vec<u8>,
    pub headers: Headers,

    pub httpauth: Option<HttpAuth>,
    pub username: Option<String>,
    pub password: Option<String>,

    pub proxy: Option<String>,

    pub sslversion: Option<EngineSslVersion>,
    pub ssl_verifyhost: Option<u8>,
    pub ssl_verifypeer: Option<bool>,
    pub sslcerttype: Option<String>,
    pub sslcert: Option<PathBuf>,
    pub sslkey: Option<PathBuf>,
    pub sslkeypasswd: Option<String>,
    pub cainfo: Option<PathBuf>,

    pub connecttimeout_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl EngineOptions {
    pub fn new(method: Method, url: &str, body: &[u8], headers: &Headers) -> Self {
        EngineOptions {
            method,
            url: url.to_string(),
            body: body.to_vec(),
            headers: headers.clone(),
            ..Default::default()
        }
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |secret: &Option<String>| secret.as_ref().map(|_| "[redacted]");
        f.debug_struct("EngineOptions")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body_len", &self.body.len())
            .field("headers", &self.headers)
            .field("httpauth", &self.httpauth)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("proxy", &self.proxy)
            .field("sslversion", &self.sslversion)
            .field("ssl_verifyhost", &self.ssl_verifyhost)
            .field("ssl_verifypeer", &self.ssl_verifypeer)
            .field("sslcerttype", &self.sslcerttype)
            .field("sslcert", &self.sslcert)
            .field("sslkey", &self.sslkey)
            .field("sslkeypasswd", &redacted(&self.sslkeypasswd))
            .field("cainfo", &self.cainfo)
            .field("connecttimeout_ms", &self.connecttimeout_ms)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// What the engine hands back from a run, failed or not.
///
/// A transport failure is reported as `code == NO_RESPONSE` together with a
/// diagnostic `return_message`; `timed_out` is set when a deadline elapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineResult {
    pub code: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub timed_out: bool,
    pub return_message: String,
}

impl EngineResult {
    pub fn completed(code: u16, headers: Headers, body: Vec<u8>) -> Self {
        EngineResult {
            code,
            headers,
            body,
            timed_out: false,
            return_message: String::from("No error"),
        }
    }

    pub fn failed(timed_out: bool, return_message: impl Into<String>) -> Self {
        EngineResult {
            code: NO_RESPONSE,
            timed_out,
            return_message: return_message.into(),
            ..Default::default()
        }
    }
}

pub trait Engine {
    /// Performs exactly one blocking request.
    ///
    /// Transport failures come back as an `Ok` result with `code ==
    /// NO_RESPONSE`. `Err` is reserved for options the engine cannot apply.
    fn run(&self, options: &EngineOptions) -> anyhow::Result<EngineResult>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn run(&self, options: &EngineOptions) -> anyhow::Result<EngineResult> {
        (**self).run(options)
    }
}
