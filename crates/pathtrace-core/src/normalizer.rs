use crate::{CommandFamily, Hop};
use std::fmt::{Debug, Formatter};
use tracing::instrument;

mod address_scan;
mod common;
mod hop_tracer;
mod line_scan;
mod path_tracer;
mod reachability;

/// Which parse tier produced the hops of a trace.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ParseOutcome {
    /// A parser for the specific tool that ran.
    Structured,
    /// The generic line scanner.
    LineScan,
    /// Every literal address found anywhere in the output.
    AddressScan,
    /// No tier produced any hops.
    Uninterpretable,
}

/// A parse function from tool output to hops.
pub type ParseFn = Box<dyn Fn(&str) -> Vec<Hop> + Send + Sync>;

/// A single tier of the normalizer chain.
pub struct Tier {
    outcome: ParseOutcome,
    parse: ParseFn,
}

impl Tier {
    pub fn new<F>(outcome: ParseOutcome, parse: F) -> Self
    where
        F: Fn(&str) -> Vec<Hop> + Send + Sync + 'static,
    {
        Self {
            outcome,
            parse: Box::new(parse),
        }
    }
}

impl Debug for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tier")
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// The hops produced by a [`Normalizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub outcome: ParseOutcome,
    pub hops: Vec<Hop>,
}

/// Convert raw tool output into hops.
///
/// Tiers are tried in order and the first tier to produce at least one hop
/// wins, later tiers are never run.
#[derive(Debug)]
pub struct Normalizer {
    tiers: Vec<Tier>,
}

impl Normalizer {
    /// The standard tier chain for output produced by a tool of `family`.
    ///
    /// The structured parser for the family (if any) is followed by the line
    /// scanner and finally the address scanner.
    #[must_use]
    pub fn for_family(family: CommandFamily) -> Self {
        let structured = match family {
            CommandFamily::HopTracer => Some(Tier::new(ParseOutcome::Structured, hop_tracer::parse)),
            CommandFamily::LightweightTracer => {
                Some(Tier::new(ParseOutcome::Structured, path_tracer::parse))
            }
            CommandFamily::ReachabilityProbe => {
                Some(Tier::new(ParseOutcome::Structured, reachability::parse))
            }
            CommandFamily::Unknown => None,
        };
        let tiers = structured
            .into_iter()
            .chain([
                Tier::new(ParseOutcome::LineScan, line_scan::parse),
                Tier::new(ParseOutcome::AddressScan, address_scan::parse),
            ])
            .collect();
        Self { tiers }
    }

    /// A custom tier chain.
    #[must_use]
    pub fn with_tiers(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    #[instrument(skip_all, level = "debug")]
    pub fn normalize(&self, text: &str) -> Normalized {
        for tier in &self.tiers {
            let hops = (tier.parse)(text);
            if !hops.is_empty() {
                tracing::debug!(outcome = ?tier.outcome, hops = hops.len(), "parsed output");
                return Normalized {
                    outcome: tier.outcome,
                    hops,
                };
            }
            tracing::debug!(outcome = ?tier.outcome, "tier produced no hops");
        }
        tracing::warn!("output could not be interpreted");
        Normalized {
            outcome: ParseOutcome::Uninterpretable,
            hops: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use test_case::test_case;

    fn counting_tier(
        outcome: ParseOutcome,
        hops: Vec<Hop>,
        calls: &Arc<AtomicUsize>,
    ) -> Tier {
        let calls = calls.clone();
        Tier::new(outcome, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            hops.clone()
        })
    }

    #[test]
    fn test_first_non_empty_tier_wins() {
        let structured = Arc::new(AtomicUsize::new(0));
        let line_scan = Arc::new(AtomicUsize::new(0));
        let address_scan = Arc::new(AtomicUsize::new(0));
        let normalizer = Normalizer::with_tiers(vec![
            counting_tier(ParseOutcome::Structured, vec![Hop::timeout(1)], &structured),
            counting_tier(ParseOutcome::LineScan, vec![Hop::timeout(2)], &line_scan),
            counting_tier(ParseOutcome::AddressScan, vec![Hop::timeout(3)], &address_scan),
        ]);
        let normalized = normalizer.normalize("anything");
        assert_eq!(ParseOutcome::Structured, normalized.outcome);
        assert_eq!(vec![Hop::timeout(1)], normalized.hops);
        assert_eq!(1, structured.load(Ordering::SeqCst));
        assert_eq!(0, line_scan.load(Ordering::SeqCst));
        assert_eq!(0, address_scan.load(Ordering::SeqCst));
    }

    #[test]
    fn test_falls_through_empty_tiers() {
        let structured = Arc::new(AtomicUsize::new(0));
        let line_scan = Arc::new(AtomicUsize::new(0));
        let address_scan = Arc::new(AtomicUsize::new(0));
        let normalizer = Normalizer::with_tiers(vec![
            counting_tier(ParseOutcome::Structured, vec![], &structured),
            counting_tier(ParseOutcome::LineScan, vec![], &line_scan),
            counting_tier(ParseOutcome::AddressScan, vec![Hop::timeout(1)], &address_scan),
        ]);
        let normalized = normalizer.normalize("anything");
        assert_eq!(ParseOutcome::AddressScan, normalized.outcome);
        assert_eq!(1, structured.load(Ordering::SeqCst));
        assert_eq!(1, line_scan.load(Ordering::SeqCst));
        assert_eq!(1, address_scan.load(Ordering::SeqCst));
    }

    #[test]
    fn test_uninterpretable() {
        let normalized = Normalizer::for_family(CommandFamily::HopTracer)
            .normalize("traceroute: unknown host\nsomething went wrong\n");
        assert_eq!(ParseOutcome::Uninterpretable, normalized.outcome);
        assert!(normalized.hops.is_empty());
    }

    #[test_case(CommandFamily::HopTracer, " 1  10.0.0.1  1.0 ms", ParseOutcome::Structured)]
    #[test_case(CommandFamily::LightweightTracer, " 1:  10.0.0.1  1.0ms", ParseOutcome::Structured)]
    #[test_case(CommandFamily::ReachabilityProbe, "64 bytes from 10.0.0.1: time=1.0 ms", ParseOutcome::Structured)]
    #[test_case(CommandFamily::Unknown, " 1  10.0.0.1  1.0 ms", ParseOutcome::LineScan)]
    #[test_case(CommandFamily::LightweightTracer, " 1  10.0.0.1  1.0 ms", ParseOutcome::LineScan; "wrong family")]
    #[test_case(CommandFamily::HopTracer, "<<10.0.0.1>>", ParseOutcome::AddressScan)]
    fn test_for_family(family: CommandFamily, text: &str, expected: ParseOutcome) {
        let normalized = Normalizer::for_family(family).normalize(text);
        assert_eq!(expected, normalized.outcome);
        assert_eq!(Some(IpAddr::from([10, 0, 0, 1])), normalized.hops[0].addr());
    }

    #[test]
    fn test_same_text_same_hops() {
        let text = "garbled 10.0.0.1 output 10.0.0.2";
        let normalizer = Normalizer::for_family(CommandFamily::ReachabilityProbe);
        assert_eq!(normalizer.normalize(text), normalizer.normalize(text));
    }
}
