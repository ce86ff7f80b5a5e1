//! # http-adapter
//!
//! Issues a single HTTP request through one of the registered adapters and
//! prints the response.
//!
//! ```text,no_run
//! $ http-adapter -X POST -H 'Content-Type: application/json' -d '{"id": 42}' https://httpbin.org/post
//! HTTP 200
//! content-type: application/json
//! ...
//! ```
//!
//! A request can also be described in a JSON file and tweaked from the
//! command line; flags win over the file.
//!
//! **request.json**
//! ```text,no_run
//! {
//!     "url": "https://internal.example.com/service",
//!     "method": "POST",
//!     "body": "<envelope/>",
//!     "auth": {
//!         "kind": {"type": "basic", "username": "user", "password": "secret"},
//!         "ssl": {"verify_mode": "peer", "ca_cert_file": "ca.pem"}
//!     },
//!     "read_timeout": 5
//! }
//! ```
//!
//! ```text,no_run
//! $ http-adapter -f request.json --read-timeout 10
//! ```
//!
//! Timeouts, TLS failures and connection failures exit with an error. Any
//! response, whatever its status code, is printed and exits successfully.

use std::fs::read_to_string;
use std::io::stdout;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::{App, Arg, ArgMatches};
use http_adapter::output::{parse_format, print::FormattedOutputter, Outputter};
use http_adapter::{AdapterRegistry, RequestDescriptor};
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("http_adapter=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = App::new("http-adapter")
        .version(VERSION)
        .about("Executes a single HTTP request through a pluggable engine")
        .arg(Arg::with_name("URL").index(1).required_unless("REQUEST_FILE"))
        .arg(
            Arg::with_name("REQUEST_FILE")
                .short("f")
                .long("request-file")
                .takes_value(true)
                .help("A file containing a JSON object that describes the request"),
        )
        .arg(
            Arg::with_name("METHOD")
                .short("X")
                .long("method")
                .takes_value(true)
                .help("GET, POST, PUT, DELETE, HEAD, PATCH or OPTIONS"),
        )
        .arg(
            Arg::with_name("HEADER")
                .short("H")
                .long("header")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .validator(is_valid_header)
                .help("A request header, as 'Name: value'"),
        )
        .arg(
            Arg::with_name("DATA")
                .short("d")
                .long("data")
                .takes_value(true)
                .help("The request body"),
        )
        .arg(
            Arg::with_name("PROXY")
                .long("proxy")
                .takes_value(true)
                .help("Proxy URL"),
        )
        .arg(
            Arg::with_name("BASIC")
                .long("basic")
                .takes_value(true)
                .value_name("USER:PASSWORD")
                .conflicts_with_all(&["DIGEST", "NTLM"])
                .help("HTTP basic authentication"),
        )
        .arg(
            Arg::with_name("DIGEST")
                .long("digest")
                .takes_value(true)
                .value_name("USER:PASSWORD")
                .conflicts_with("NTLM")
                .help("HTTP digest authentication"),
        )
        .arg(
            Arg::with_name("NTLM")
                .long("ntlm")
                .takes_value(true)
                .value_name("USER:PASSWORD")
                .help("NTLM authentication"),
        )
        .arg(
            Arg::with_name("SSL_VERSION")
                .long("ssl-version")
                .takes_value(true)
                .possible_values(&["TLSv1_2", "TLSv1_1", "TLSv1", "SSLv2", "SSLv23", "SSLv3"]),
        )
        .arg(
            Arg::with_name("VERIFY_MODE")
                .long("verify-mode")
                .takes_value(true)
                .possible_values(&["none", "peer", "host", "fail_if_no_peer_cert", "client_once"])
                .help("How the server certificate is verified"),
        )
        .arg(
            Arg::with_name("CERT")
                .long("cert")
                .takes_value(true)
                .help("Client certificate file"),
        )
        .arg(
            Arg::with_name("KEY")
                .long("key")
                .takes_value(true)
                .help("Client certificate key file"),
        )
        .arg(
            Arg::with_name("KEY_PASSWORD")
                .long("key-password")
                .takes_value(true)
                .help("Password of the client certificate key"),
        )
        .arg(
            Arg::with_name("CERT_TYPE")
                .long("cert-type")
                .takes_value(true)
                .help("Client certificate type [default: pem]"),
        )
        .arg(
            Arg::with_name("CACERT")
                .long("cacert")
                .takes_value(true)
                .help("CA certificate file"),
        )
        .arg(
            Arg::with_name("OPEN_TIMEOUT")
                .long("open-timeout")
                .takes_value(true)
                .validator(is_valid_timeout)
                .help("Seconds to wait for the connection"),
        )
        .arg(
            Arg::with_name("READ_TIMEOUT")
                .long("read-timeout")
                .takes_value(true)
                .validator(is_valid_timeout)
                .help("Seconds to wait for the response"),
        )
        .arg(
            Arg::with_name("WRITE_TIMEOUT")
                .long("write-timeout")
                .takes_value(true)
                .validator(is_valid_timeout)
                .help("Seconds to wait for the request to be sent; ignored when --read-timeout is given"),
        )
        .arg(
            Arg::with_name("ADAPTER")
                .long("adapter")
                .takes_value(true)
                .help("The adapter to execute the request with [default: the first registered]"),
        )
        .arg(
            Arg::with_name("RESPONSE_OUTPUT_FORMAT")
                .long("response-output-format")
                .short("s")
                .default_value("%R\n%H\n%B\n")
                .hide_default_value(true)
                .help("Define the format for print the response, possible options %R status line, %H headers, %B body \n[default: %R\\n%H\\n%B\\n]")
        )
        .arg(
            Arg::with_name("REQUEST_OUTPUT_FORMAT")
                .long("request-output-format")
                .short("q")
                .default_value("%R\n\n")
                .hide_default_value(true)
                .help("Define the format for print the request, possible options %R request line, %H headers, %B body \n[default: %R\\n\\n]")
        )
        .usage("http-adapter [OPTIONS] <URL>")
        .get_matches();

    let request = build_request(&matches)?;
    let response_format = matches.value_of("RESPONSE_OUTPUT_FORMAT").unwrap_or_default();
    let request_format = matches.value_of("REQUEST_OUTPUT_FORMAT").unwrap_or_default();

    let registry = AdapterRegistry::with_defaults()?;
    let adapter_name = match matches.value_of("ADAPTER") {
        Some(name) => name,
        None => registry
            .default_adapter()
            .ok_or_else(|| anyhow!("No adapter is available in this build"))?,
    };
    info!(adapter = adapter_name, method = %request.method, url = %request.url, "sending request");

    let mut stdout = stdout();
    let mut outputter = FormattedOutputter::new(
        &mut stdout,
        parse_format(request_format)?,
        parse_format(response_format)?,
    );
    outputter.request(&request)?;

    let adapter = registry.build(adapter_name, request)?;
    let response = adapter
        .execute()
        .with_context(|| format!("Error executing request with the {} adapter", adapter_name))?;

    outputter.response(&response)
}

fn build_request(matches: &ArgMatches) -> Result<RequestDescriptor> {
    let mut request = match matches.value_of("REQUEST_FILE") {
        Some(file) => load_request(Path::new(file))?,
        None => RequestDescriptor::default(),
    };

    if let Some(url) = matches.value_of("URL") {
        request.url = url.to_string();
    }
    if let Some(method) = matches.value_of("METHOD") {
        request.method = method.parse()?;
    }
    for header in matches.values_of("HEADER").into_iter().flatten() {
        let (name, value) = split_header(header)?;
        request.headers.insert(name, value);
    }
    if let Some(data) = matches.value_of("DATA") {
        request.body = data.as_bytes().to_vec();
    }
    if let Some(proxy) = matches.value_of("PROXY") {
        request.proxy = Some(proxy.to_string());
    }

    if let Some(credentials) = matches.value_of("BASIC") {
        let (username, password) = split_credentials(credentials);
        request.auth.basic(username, password);
    }
    if let Some(credentials) = matches.value_of("DIGEST") {
        let (username, password) = split_credentials(credentials);
        request.auth.digest(username, password);
    }
    if let Some(credentials) = matches.value_of("NTLM") {
        let (username, password) = split_credentials(credentials);
        request.auth.ntlm(username, password);
    }

    let ssl = &mut request.auth.ssl;
    if let Some(version) = matches.value_of("SSL_VERSION") {
        ssl.ssl_version = Some(version.parse()?);
    }
    if let Some(verify_mode) = matches.value_of("VERIFY_MODE") {
        ssl.verify_mode = verify_mode.parse()?;
    }
    if let Some(cert) = matches.value_of("CERT") {
        ssl.cert_file = Some(cert.into());
    }
    if let Some(key) = matches.value_of("KEY") {
        ssl.cert_key_file = Some(key.into());
    }
    if let Some(password) = matches.value_of("KEY_PASSWORD") {
        ssl.cert_key_password = Some(password.to_string());
    }
    if let Some(cert_type) = matches.value_of("CERT_TYPE") {
        ssl.cert_type = cert_type.to_string();
    }
    if let Some(cacert) = matches.value_of("CACERT") {
        ssl.ca_cert_file = Some(cacert.into());
    }

    if let Some(timeout) = matches.value_of("OPEN_TIMEOUT") {
        request.open_timeout = Some(timeout.parse()?);
    }
    if let Some(timeout) = matches.value_of("READ_TIMEOUT") {
        request.read_timeout = Some(timeout.parse()?);
    }
    if let Some(timeout) = matches.value_of("WRITE_TIMEOUT") {
        request.write_timeout = Some(timeout.parse()?);
    }

    Ok(request)
}

fn load_request(file: &Path) -> Result<RequestDescriptor> {
    let contents = read_to_string(file)
        .with_context(|| format!("Failed opening request file: {:?}", file))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed parsing request file: {:?}", file))
}

fn split_header(header: &str) -> Result<(String, String)> {
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| anyhow!("Header must look like 'Name: value', got {:?}", header))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

/// `user:password`; a missing password is empty.
fn split_credentials(credentials: &str) -> (&str, &str) {
    credentials.split_once(':').unwrap_or((credentials, ""))
}

fn is_valid_header(val: String) -> Result<(), String> {
    split_header(&val).map(|_| ()).map_err(|err| err.to_string())
}

fn is_valid_timeout(val: String) -> Result<(), String> {
    match val.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(()),
        _ => Err(String::from("Timeout is not a valid number of seconds")),
    }
}
