//! Target resolution
//!
//! Turns target specifiers into probe addresses. Literal addresses are used
//! as given; host names go through the system resolver or through explicit
//! name servers. A target that yields no usable address is recorded as a
//! [`ResolutionFailure`] and the others carry on.

use crate::{
    error::{AppError, Result},
    models::{ProbeTarget, ResolutionFailure},
    types::{AddressFamily, DnsConfig},
};
use futures::future::join_all;
use std::{
    collections::HashSet,
    net::{IpAddr, SocketAddr},
    time::Duration,
};
use trust_dns_resolver::{
    config::{LookupIpStrategy, NameServerConfig, Protocol, ResolverConfig, ResolverOpts},
    TokioAsyncResolver,
};

/// Resolver backend
#[derive(Clone)]
pub enum DnsResolver {
    /// Platform resolver (getaddrinfo), honours /etc/hosts
    System,
    /// trust-dns against explicit name servers
    Custom(TokioAsyncResolver),
}

/// Addresses to probe plus the targets that produced none
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTargets {
    /// Deduplicated, in target order then resolver order
    pub targets: Vec<ProbeTarget>,
    pub failures: Vec<ResolutionFailure>,
}

impl ResolvedTargets {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Resolves targets under one address-family filter and timeout
pub struct DnsManager {
    resolver: DnsResolver,
    family: AddressFamily,
    timeout: Duration,
}

impl DnsManager {
    /// Create a DNS manager for the given configuration
    pub fn new(dns_config: &DnsConfig, family: AddressFamily, timeout: Duration) -> Result<Self> {
        let resolver = match dns_config {
            DnsConfig::System => DnsResolver::System,
            DnsConfig::Custom { servers } => {
                DnsResolver::Custom(Self::create_custom_resolver(servers, family, timeout)?)
            }
        };

        Ok(Self { resolver, family, timeout })
    }

    /// Create a resolver querying `servers` over UDP with TCP fallback
    pub fn create_custom_resolver(
        servers: &[IpAddr],
        family: AddressFamily,
        timeout: Duration,
    ) -> Result<TokioAsyncResolver> {
        if servers.is_empty() {
            return Err(AppError::validation("No DNS servers provided"));
        }

        let mut config = ResolverConfig::new();
        for &server in servers {
            let socket_addr = SocketAddr::new(server, 53);
            config.add_name_server(NameServerConfig::new(socket_addr, Protocol::Udp));
            config.add_name_server(NameServerConfig::new(socket_addr, Protocol::Tcp));
        }

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.ip_strategy = match family {
            AddressFamily::Any => LookupIpStrategy::Ipv4AndIpv6,
            AddressFamily::V4 => LookupIpStrategy::Ipv4Only,
            AddressFamily::V6 => LookupIpStrategy::Ipv6Only,
        };

        Ok(TokioAsyncResolver::tokio(config, opts))
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Look a host name up without filtering or timeout
    pub async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        match &self.resolver {
            DnsResolver::System => {
                let addrs = tokio::net::lookup_host((host, 0))
                    .await
                    .map_err(|e| AppError::dns_resolution(e.to_string()))?;
                Ok(addrs.map(|sa| sa.ip()).collect())
            }
            DnsResolver::Custom(resolver) => {
                let response = resolver.lookup_ip(host).await?;
                Ok(response.iter().collect())
            }
        }
    }

    /// Resolve one target to its matching addresses
    pub async fn resolve_target(&self, target: &str) -> std::result::Result<Vec<ProbeTarget>, ResolutionFailure> {
        let host = target.trim();

        let addresses = match host.parse::<IpAddr>() {
            Ok(addr) => vec![addr],
            Err(_) => match tokio::time::timeout(self.timeout, self.lookup(host)).await {
                Ok(Ok(addresses)) => addresses,
                Ok(Err(AppError::DnsResolution(reason))) => return Err(ResolutionFailure::new(host, reason)),
                Ok(Err(e)) => return Err(ResolutionFailure::new(host, e.to_string())),
                Err(_) => {
                    return Err(ResolutionFailure::new(
                        host,
                        format!("lookup timed out after {}ms", self.timeout.as_millis()),
                    ));
                }
            },
        };

        let mut matching: Vec<IpAddr> = Vec::new();
        for addr in addresses.into_iter().filter(|addr| self.family.matches(addr)) {
            if !matching.contains(&addr) {
                matching.push(addr);
            }
        }

        if matching.is_empty() {
            return Err(ResolutionFailure::new(
                host,
                format!("no {} address found", self.family.label()),
            ));
        }

        Ok(matching.into_iter().map(|addr| ProbeTarget::new(host, addr)).collect())
    }

    /// Resolve all targets concurrently
    ///
    /// An address produced by several targets is kept once, attributed to the
    /// first of them.
    pub async fn resolve_all(&self, targets: &[String]) -> ResolvedTargets {
        let results = join_all(targets.iter().map(|target| self.resolve_target(target))).await;

        let mut resolved = ResolvedTargets::default();
        let mut seen = HashSet::new();
        for result in results {
            match result {
                Ok(addresses) => {
                    resolved
                        .targets
                        .extend(addresses.into_iter().filter(|target| seen.insert(target.addr)));
                }
                Err(failure) => resolved.failures.push(failure),
            }
        }
        resolved
    }
}
