// jmap-rpc/src/discover.rs
use crate::error::{Error, Result};

/// One `_jmap._tcp` SRV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvTarget {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

impl SrvTarget {
    /// `https://<target>[:<port>]/.well-known/jmap`
    pub fn session_url(&self) -> String {
        well_known_url(&self.target, self.port)
    }
}

/// Session endpoint of a host. The port is left out when it is 0 or 443.
pub fn well_known_url(target: &str, port: u16) -> String {
    let host = target.strip_suffix('.').unwrap_or(target);
    match port {
        0 | 443 => format!("https://{host}/.well-known/jmap"),
        port => format!("https://{host}:{port}/.well-known/jmap"),
    }
}

/// Lowest priority first; heavier weight first within a priority.
pub fn sort_targets(targets: &mut [SrvTarget]) {
    targets.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.weight.cmp(&a.weight)));
}

/// Looks up `_jmap._tcp.<domain>` and returns candidate session endpoints in
/// the order they should be tried.
#[cfg(feature = "srv")]
pub async fn discover(domain: &str) -> Result<Vec<String>> {
    use hickory_resolver::TokioAsyncResolver;

    let fail = |message: String| Error::Discovery {
        domain: domain.to_string(),
        message,
    };

    let resolver = TokioAsyncResolver::tokio_from_system_conf().map_err(|e| fail(e.to_string()))?;
    let mut name = format!("_jmap._tcp.{domain}");
    if !name.ends_with('.') {
        name.push('.');
    }
    log::debug!("looking up SRV {}", name);
    let lookup = resolver
        .srv_lookup(name.as_str())
        .await
        .map_err(|e| fail(e.to_string()))?;

    let targets: Vec<SrvTarget> = lookup
        .iter()
        .map(|srv| SrvTarget {
            priority: srv.priority(),
            weight: srv.weight(),
            port: srv.port(),
            target: srv.target().to_utf8(),
        })
        .collect();
    endpoints(domain, targets)
}

/// A target of `.` means the service is not offered there.
#[cfg_attr(not(feature = "srv"), allow(dead_code))]
fn endpoints(domain: &str, mut targets: Vec<SrvTarget>) -> Result<Vec<String>> {
    targets.retain(|t| !t.target.is_empty() && t.target != ".");
    if targets.is_empty() {
        return Err(Error::Discovery {
            domain: domain.to_string(),
            message: "no JMAP SRV record found".to_string(),
        });
    }
    sort_targets(&mut targets);
    Ok(targets.iter().map(SrvTarget::session_url).collect())
}
