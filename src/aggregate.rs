use std::collections::BTreeSet;

use crate::extract::{ClientRow, Extraction, NetworkRow};

/// Owns the run-wide deduplicated row sets. Each input file's extraction is
/// absorbed in turn; full-tuple equality collapses repeat sightings across
/// files, and the ordered sets make the materialized tables come out
/// bssid-major regardless of input order.
#[derive(Debug, Default)]
pub struct Aggregator {
    networks: BTreeSet<NetworkRow>,
    clients: BTreeSet<ClientRow>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, extraction: Extraction) {
        for n in extraction.networks {
            self.networks.insert(n);
        }
        for c in extraction.clients {
            self.clients.insert(c);
        }
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn into_rows(self) -> (Vec<NetworkRow>, Vec<ClientRow>) {
        (self.networks.into_iter().collect(), self.clients.into_iter().collect())
    }
}
