use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::Error;

pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
    Options,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match *self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
        };
        f.write_str(method)
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "PATCH" => Ok(Method::Patch),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(Error::Config(format!("unsupported HTTP method {:?}", s))),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Everything needed to issue one request. Built by the caller and consumed,
/// unchanged, by an adapter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: Method,
    #[serde(deserialize_with = "body_from_str")]
    pub body: Vec<u8>,
    pub headers: Headers,
    pub auth: Auth,
    pub proxy: Option<String>,
    /// Seconds.
    pub open_timeout: Option<f64>,
    /// Seconds.
    pub read_timeout: Option<f64>,
    /// Seconds.
    pub write_timeout: Option<f64>,
}

impl RequestDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        RequestDescriptor {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Forces the TLS settings in `auth.ssl` to apply even when nothing else
    /// in them would.
    pub fn set_ssl(&mut self, enabled: bool) {
        self.auth.ssl.enabled = enabled;
    }
}

fn body_from_str<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let body = String::deserialize(deserializer)?;
    Ok(body.into_bytes())
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// The HTTP authentication scheme of a request. Exactly one is active.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthKind {
    #[default]
    None,
    Basic(Credentials),
    Digest(Credentials),
    Ntlm(Credentials),
}

impl AuthKind {
    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            AuthKind::None => None,
            AuthKind::Basic(credentials)
            | AuthKind::Digest(credentials)
            | AuthKind::Ntlm(credentials) => Some(credentials),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Auth {
    pub kind: AuthKind,
    /// Applies independently of `kind`.
    pub ssl: TlsDescriptor,
}

impl Auth {
    pub fn basic(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.kind = AuthKind::Basic(Credentials::new(username, password));
    }

    pub fn digest(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.kind = AuthKind::Digest(Credentials::new(username, password));
    }

    pub fn ntlm(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.kind = AuthKind::Ntlm(Credentials::new(username, password));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
#[allow(non_camel_case_types)]
pub enum SslVersion {
    TLSv1_2,
    TLSv1_1,
    TLSv1,
    SSLv2,
    SSLv23,
    SSLv3,
}

impl FromStr for SslVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TLSv1_2" => Ok(SslVersion::TLSv1_2),
            "TLSv1_1" => Ok(SslVersion::TLSv1_1),
            "TLSv1" => Ok(SslVersion::TLSv1),
            "SSLv2" => Ok(SslVersion::SSLv2),
            "SSLv23" => Ok(SslVersion::SSLv23),
            "SSLv3" => Ok(SslVersion::SSLv3),
            _ => Err(Error::Config(format!("unknown SSL version {:?}", s))),
        }
    }
}

impl TryFrom<String> for SslVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How the server certificate is checked.
///
/// Only `None` turns verification off. `Peer` verifies the certificate chain
/// and the hostname; every other mode verifies the hostname alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum VerifyMode {
    None,
    Peer,
    #[default]
    Host,
    FailIfNoPeerCert,
    ClientOnce,
}

impl FromStr for VerifyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(VerifyMode::None),
            "peer" => Ok(VerifyMode::Peer),
            "host" => Ok(VerifyMode::Host),
            "fail_if_no_peer_cert" => Ok(VerifyMode::FailIfNoPeerCert),
            "client_once" => Ok(VerifyMode::ClientOnce),
            _ => Err(Error::Config(format!("unknown verify mode {:?}", s))),
        }
    }
}

impl TryFrom<String> for VerifyMode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TlsDescriptor {
    pub enabled: bool,
    pub ssl_version: Option<SslVersion>,
    pub verify_mode: VerifyMode,
    pub cert_type: String,
    pub cert_file: Option<PathBuf>,
    pub cert_key_file: Option<PathBuf>,
    pub cert_key_password: Option<String>,
    pub ca_cert_file: Option<PathBuf>,
}

impl Default for TlsDescriptor {
    fn default() -> Self {
        TlsDescriptor {
            enabled: false,
            ssl_version: None,
            verify_mode: VerifyMode::default(),
            cert_type: String::from("pem"),
            cert_file: None,
            cert_key_file: None,
            cert_key_password: None,
            ca_cert_file: None,
        }
    }
}

impl TlsDescriptor {
    /// TLS settings apply when explicitly requested, when verification is
    /// switched off, when a client certificate and key pair is given, or
    /// when a CA file is given.
    pub fn is_enabled(&self) -> bool {
        self.enabled
            || self.verify_mode == VerifyMode::None
            || (self.cert_file.is_some() && self.cert_key_file.is_some())
            || self.ca_cert_file.is_some()
    }
}

impl fmt::Debug for TlsDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsDescriptor")
            .field("enabled", &self.enabled)
            .field("ssl_version", &self.ssl_version)
            .field("verify_mode", &self.verify_mode)
            .field("cert_type", &self.cert_type)
            .field("cert_file", &self.cert_file)
            .field("cert_key_file", &self.cert_key_file)
            .field(
                "cert_key_password",
                &self.cert_key_password.as_ref().map(|_| "[redacted]"),
            )
            .field("ca_cert_file", &self.ca_cert_file)
            .finish()
    }
}
