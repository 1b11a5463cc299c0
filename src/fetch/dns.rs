// src/fetch/dns.rs
// =============================================================================
// DNS resolution with a public primary server and a public fallback.
//
// reqwest lets us replace its resolver through the `Resolve` trait. Ours asks
// Cloudflare (1.1.1.1) first and Google (8.8.8.8) if that fails. Nothing is
// cached: every new connection goes through the same primary/fallback dance.
//
// The resolver is built once from a DnsConfig and handed to the HTTP client
// builder; there is no global resolver state.
// =============================================================================

use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveError;
use hickory_resolver::TokioAsyncResolver;
use hyper::client::connect::dns::Name;
use reqwest::dns::{Addrs, Resolve, Resolving};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const PRIMARY_NAMESERVER: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(1, 1, 1, 1), 53));
pub const FALLBACK_NAMESERVER: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(8, 8, 8, 8), 53));

/// Which nameservers to use and how long to wait on each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsConfig {
    pub primary: SocketAddr,
    pub fallback: SocketAddr,
    /// Budget for a single attempt. The fallback gets its own budget.
    pub timeout: Duration,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            primary: PRIMARY_NAMESERVER,
            fallback: FALLBACK_NAMESERVER,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Both nameservers failed for `host`.
///
/// This ends up inside reqwest's connect error, which is how the fetch layer
/// recognises DNS failures without looking at message text.
#[derive(Debug, Error)]
#[error("could not resolve {host} via {primary} or {fallback}: {source}")]
pub struct DnsError {
    host: String,
    primary: SocketAddr,
    fallback: SocketAddr,
    #[source]
    source: ResolveError,
}

#[derive(Clone)]
pub struct FallbackResolver {
    config: DnsConfig,
    primary: TokioAsyncResolver,
    fallback: TokioAsyncResolver,
}

impl FallbackResolver {
    pub fn new(config: DnsConfig) -> Self {
        Self {
            config,
            primary: single_server(config.primary, config.timeout),
            fallback: single_server(config.fallback, config.timeout),
        }
    }

    /// Looks `host` up on the primary server, then once on the fallback.
    pub async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, DnsError> {
        match self.primary.lookup_ip(host).await {
            Ok(found) => return Ok(found.iter().collect()),
            Err(e) => debug!(host, server = %self.config.primary, error = %e, "primary DNS failed"),
        }

        self.fallback
            .lookup_ip(host)
            .await
            .map(|found| found.iter().collect())
            .map_err(|source| DnsError {
                host: host.to_string(),
                primary: self.config.primary,
                fallback: self.config.fallback,
                source,
            })
    }
}

impl Resolve for FallbackResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let ips = resolver.lookup(name.as_str()).await?;
            // reqwest fills in the real port
            let addrs: Addrs = Box::new(ips.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok(addrs)
        })
    }
}

fn single_server(server: SocketAddr, timeout: Duration) -> TokioAsyncResolver {
    let mut config = ResolverConfig::new();
    config.add_name_server(NameServerConfig::new(server, Protocol::Udp));

    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    // One query per server, no retries against the same one
    opts.attempts = 0;
    opts.cache_size = 0;

    TokioAsyncResolver::tokio(config, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::proto::op::{Message, MessageType, OpCode};
    use hickory_resolver::proto::rr::rdata::A;
    use hickory_resolver::proto::rr::{RData, Record, RecordType};
    use hickory_resolver::proto::serialize::binary::BinEncodable;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::net::UdpSocket;

    // Port 9 (discard) has nothing listening on loopback
    fn unreachable_config() -> DnsConfig {
        let dead = SocketAddr::from(([127, 0, 0, 1], 9));
        DnsConfig {
            primary: dead,
            fallback: dead,
            timeout: Duration::from_millis(300),
        }
    }

    #[test]
    fn test_default_servers() {
        let config = DnsConfig::default();
        assert_eq!(config.primary.to_string(), "1.1.1.1:53");
        assert_eq!(config.fallback.to_string(), "8.8.8.8:53");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_ip_literal_needs_no_server() {
        let resolver = FallbackResolver::new(unreachable_config());
        let ips = resolver.lookup("127.0.0.1").await.unwrap();
        assert_eq!(ips, vec![IpAddr::from([127, 0, 0, 1])]);
    }

    /// A local UDP nameserver. Counts the A queries it receives and, when
    /// `answer` is set, replies with that address.
    async fn local_nameserver(answer: Option<Ipv4Addr>) -> (SocketAddr, Arc<AtomicUsize>) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let request = Message::from_vec(&buf[..len]).unwrap();
                if request.queries().iter().any(|q| q.query_type() == RecordType::A) {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                let Some(ip) = answer else { continue };

                let mut response = Message::new();
                response
                    .set_id(request.id())
                    .set_message_type(MessageType::Response)
                    .set_op_code(OpCode::Query)
                    .set_recursion_desired(true)
                    .set_recursion_available(true);
                for query in request.queries() {
                    response.add_query(query.clone());
                    if query.query_type() == RecordType::A {
                        response.add_answer(Record::from_rdata(
                            query.name().clone(),
                            60,
                            RData::A(A(ip)),
                        ));
                    }
                }
                let bytes = response.to_bytes().unwrap();
                let _ = socket.send_to(&bytes, peer).await;
            }
        });

        (addr, seen)
    }

    #[tokio::test]
    async fn test_fallback_answers_when_primary_is_down() {
        let (fallback, a_queries) = local_nameserver(Some(Ipv4Addr::new(10, 1, 2, 3))).await;
        let resolver = FallbackResolver::new(DnsConfig {
            primary: SocketAddr::from(([127, 0, 0, 1], 9)),
            fallback,
            timeout: Duration::from_millis(500),
        });

        let ips = resolver.lookup("www.linkscope.test").await.unwrap();
        assert_eq!(ips, vec![IpAddr::from([10, 1, 2, 3])]);
        assert_eq!(a_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_each_server_is_asked_once() {
        let (primary, primary_queries) = local_nameserver(None).await;
        let (fallback, fallback_queries) = local_nameserver(None).await;
        let resolver = FallbackResolver::new(DnsConfig {
            primary,
            fallback,
            timeout: Duration::from_millis(200),
        });

        assert!(resolver.lookup("www.linkscope.test").await.is_err());
        assert_eq!(primary_queries.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_servers_failing_is_an_error() {
        let resolver = FallbackResolver::new(unreachable_config());
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            resolver.lookup("linkscope-test.invalid"),
        )
        .await
        .expect("lookup should give up on its own");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("linkscope-test.invalid"));
    }
}
