use crate::Hop;
use pathtrace_dns::{DnsEntry, Resolver};
use pathtrace_geoip::{Location, Locator};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::instrument;

/// Annotate hops with their geographic location and hostname.
///
/// Lookups for all hops run concurrently. A failed lookup is recorded on the
/// hop and never fails the trace.
#[derive(Clone, Default)]
pub struct Enricher {
    locator: Option<Arc<dyn Locator>>,
    resolver: Option<Arc<dyn Resolver>>,
}

struct Enrichment {
    location: Option<Result<Location, String>>,
    hostname: Option<String>,
}

impl Enricher {
    /// Create an `Enricher`, both lookups are optional.
    #[must_use]
    pub fn new(locator: Option<Arc<dyn Locator>>, resolver: Option<Arc<dyn Resolver>>) -> Self {
        Self { locator, resolver }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.locator.is_some() || self.resolver.is_some()
    }

    /// Enrich every responding hop, preserving hop order.
    #[instrument(skip_all, fields(hops = hops.len()), level = "debug")]
    pub async fn enrich(&self, mut hops: Vec<Hop>) -> Vec<Hop> {
        if !self.is_enabled() {
            return hops;
        }
        let mut tasks = JoinSet::new();
        let mut positions = HashMap::new();
        for (position, hop) in hops.iter().enumerate() {
            if let Some(addr) = hop.addr() {
                let locator = self.locator.clone();
                let resolver = self.resolver.clone();
                let task = tasks.spawn(lookup(addr, locator, resolver));
                positions.insert(task.id(), position);
            }
        }
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, enrichment)) => {
                    if let Some(&position) = positions.get(&id) {
                        apply(&mut hops[position], enrichment);
                    }
                }
                Err(err) => {
                    tracing::warn!(?err, "enrichment task failed");
                    if let Some(&position) = positions.get(&err.id()) {
                        if self.locator.is_some() {
                            hops[position].set_location_error(format!("lookup failed: {err}"));
                        }
                    }
                }
            }
        }
        hops
    }
}

async fn lookup(
    addr: IpAddr,
    locator: Option<Arc<dyn Locator>>,
    resolver: Option<Arc<dyn Resolver>>,
) -> Enrichment {
    let location = async {
        let locator = locator?;
        Some(locator.locate(addr).await.map_err(|err| {
            tracing::debug!(%addr, %err, "location lookup failed");
            err.to_string()
        }))
    };
    let hostname = async {
        let resolver = resolver?;
        let entry = tokio::task::spawn_blocking(move || resolver.reverse_lookup(addr))
            .await
            .ok()?;
        match entry {
            DnsEntry::Resolved(_, hostnames) => hostnames.into_iter().next(),
            _ => None,
        }
    };
    let (location, hostname) = tokio::join!(location, hostname);
    Enrichment { location, hostname }
}

fn apply(hop: &mut Hop, enrichment: Enrichment) {
    match enrichment.location {
        Some(Ok(location)) => hop.set_location(location),
        Some(Err(err)) => hop.set_location_error(err),
        None => {}
    }
    if let Some(hostname) = enrichment.hostname {
        hop.set_hostname(hostname);
    }
}
