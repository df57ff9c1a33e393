//! Funding graph construction and dominant-funder resolution.
//!
//! Inbound native-currency transfers become candidate `sender -> holder`
//! edges in a directed graph whose edge weight counts observed transfers.
//! Resolution then keeps, for each holder, the edge from the sender with
//! the most transfers (ties break to the first-seen sender), so every
//! holder ends up attributed to at most one funder and clusters partition
//! the holder set instead of overlapping.

use crate::data_source::LedgerDataSource;
use crate::types::{Address, Holder, Transfer};
use futures::future::join_all;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Known infrastructure and exchange wallets never treated as funders.
/// A transfer from any of these says nothing about common control.
pub const DEFAULT_EXCLUDED_SENDERS: &[&str] = &[
    "11111111111111111111111111111111",             // System Program
    "1nc1nerator11111111111111111111111111111111",  // Incinerator
    "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",  // Token Program
    "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL", // Associated Token Program
    "ComputeBudget111111111111111111111111111111",  // Compute Budget Program
    "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9", // Binance hot wallet
    "2AQdpHJ2JpcEgPiATUXjQxA8QmafFegfQwSLWSprPicm", // Coinbase hot wallet
    "AC5RDfQFmDS1deWZos921JfqscXdByf8BKHs5ACWjtW2", // Bybit hot wallet
    "5VCwKtCXgCJ6kit5FybXjvriW3xELsFDhYrPSqtJNmcD", // OKX hot wallet
    "FWznbcNXWQuHTawe9RxvQ2LdCENssh12dsznf4RiouN5", // Kraken hot wallet
];

/// Funding graph configuration.
#[derive(Debug, Clone)]
pub struct FundingGraphConfig {
    /// Transfers below this many native units are ignored.
    pub min_funding_amount: f64,
    /// Holders whose transfers are fetched concurrently per batch; batches
    /// run sequentially to bound peak concurrency.
    pub batch_size: usize,
    /// Senders never treated as funders.
    pub excluded_senders: Vec<Address>,
}

impl Default for FundingGraphConfig {
    fn default() -> Self {
        Self {
            min_funding_amount: 0.1,
            batch_size: 10,
            excluded_senders: DEFAULT_EXCLUDED_SENDERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Resolved funding relationships: every recipient has exactly one funder.
#[derive(Debug, Clone, Default)]
pub struct FundingGraph {
    /// Funder and the recipients it won, in first-seen order.
    funders: Vec<(Address, Vec<Address>)>,
    slot_of: HashMap<Address, usize>,
    funder_of: HashMap<Address, Address>,
}

impl FundingGraph {
    fn attribute(&mut self, funder: Address, recipient: Address) {
        self.funder_of.insert(recipient.clone(), funder.clone());
        match self.slot_of.get(&funder) {
            Some(&slot) => self.funders[slot].1.push(recipient),
            None => {
                self.slot_of.insert(funder.clone(), self.funders.len());
                self.funders.push((funder, vec![recipient]));
            }
        }
    }

    /// The single funder attributed to `recipient`, if any.
    pub fn funder_of(&self, recipient: &str) -> Option<&Address> {
        self.funder_of.get(recipient)
    }

    /// Recipients attributed to `funder`, in holder rank order.
    pub fn recipients_of(&self, funder: &str) -> &[Address] {
        self.slot_of
            .get(funder)
            .map(|&slot| self.funders[slot].1.as_slice())
            .unwrap_or(&[])
    }

    /// All funders with their recipients, first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &[Address])> {
        self.funders
            .iter()
            .map(|(funder, recipients)| (funder, recipients.as_slice()))
    }

    /// Number of distinct funders.
    pub fn funder_count(&self) -> usize {
        self.funders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funders.is_empty()
    }
}

/// Builds the resolved funding graph for a holder set.
pub struct FundingGraphBuilder {
    source: Arc<dyn LedgerDataSource>,
    config: FundingGraphConfig,
}

impl FundingGraphBuilder {
    pub fn new(source: Arc<dyn LedgerDataSource>, config: FundingGraphConfig) -> Self {
        Self { source, config }
    }

    /// Fetch inbound transfers for every holder and resolve the graph.
    /// A holder with no qualifying transfer simply has no funder.
    pub async fn build(&self, holders: &[Holder]) -> FundingGraph {
        let mut inbound: Vec<(Address, Vec<Transfer>)> = Vec::with_capacity(holders.len());

        for batch in holders.chunks(self.config.batch_size.max(1)) {
            let fetches = batch.iter().map(|holder| {
                let address = holder.address.clone();
                async move {
                    let transfers = self
                        .source
                        .incoming_transfers(&address, self.config.min_funding_amount)
                        .await
                        .unwrap_or_default();
                    (address, transfers)
                }
            });
            inbound.extend(join_all(fetches).await);
        }

        let graph = self.resolve(&inbound);
        info!(
            "Funding graph: {} funders over {} holders",
            graph.funder_count(),
            holders.len()
        );
        graph
    }

    /// Accumulate candidate edges, then pick one dominant funder per holder.
    fn resolve(&self, inbound: &[(Address, Vec<Transfer>)]) -> FundingGraph {
        let excluded: HashSet<&str> = self
            .config
            .excluded_senders
            .iter()
            .map(String::as_str)
            .collect();

        let mut graph: DiGraph<Address, u32> = DiGraph::new();
        let mut node_of: HashMap<Address, NodeIndex> = HashMap::new();

        for (holder, transfers) in inbound {
            for transfer in transfers {
                if transfer.amount < self.config.min_funding_amount {
                    continue;
                }
                if excluded.contains(transfer.from.as_str()) {
                    continue;
                }

                let sender = *node_of
                    .entry(transfer.from.clone())
                    .or_insert_with(|| graph.add_node(transfer.from.clone()));
                let recipient = *node_of
                    .entry(holder.clone())
                    .or_insert_with(|| graph.add_node(holder.clone()));

                match graph.find_edge(sender, recipient) {
                    Some(edge) => graph[edge] += 1,
                    None => {
                        graph.add_edge(sender, recipient, 1);
                    }
                }
            }
        }

        let mut resolved = FundingGraph::default();
        for (holder, _) in inbound {
            if resolved.funder_of.contains_key(holder) {
                continue;
            }
            let Some(&node) = node_of.get(holder) else {
                continue;
            };

            // Dominant funder: most transfers wins, first-seen edge on ties.
            let mut best: Option<(u32, petgraph::graph::EdgeIndex, NodeIndex)> = None;
            for edge in graph.edges_directed(node, Direction::Incoming) {
                let count = *edge.weight();
                let replace = match best {
                    None => true,
                    Some((best_count, best_edge, _)) => {
                        count > best_count || (count == best_count && edge.id() < best_edge)
                    }
                };
                if replace {
                    best = Some((count, edge.id(), edge.source()));
                }
            }

            if let Some((count, _, source_node)) = best {
                let funder = graph[source_node].clone();
                debug!("{} attributed to {} ({} transfers)", holder, funder, count);
                resolved.attribute(funder, holder.clone());
            }
        }

        resolved
    }
}
