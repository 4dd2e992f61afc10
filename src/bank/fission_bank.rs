use dashmap::DashMap;

use crate::bank::Site;

//=====================================================================
// Fission sites produced during one cycle.
//
// Histories running in parallel append their sites concurrently, keyed
// by the history that produced them. Draining sorts by history id and
// keeps each history's sites in production order.
//=====================================================================
#[derive(Debug, Default)]
pub struct FissionBank {
    sites: DashMap<u64, Vec<Site>>,
}

impl FissionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, history: u64, sites: Vec<Site>) {
        if sites.is_empty() {
            return;
        }
        self.sites.entry(history).or_default().extend(sites);
    }

    // Number of sites
    pub fn len(&self) -> usize {
        self.sites.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn drain_ordered(&mut self) -> Vec<Site> {
        let mut entries: Vec<(u64, Vec<Site>)> = std::mem::take(&mut self.sites).into_iter().collect();
        entries.sort_unstable_by_key(|(history, _)| *history);
        entries.into_iter().flat_map(|(_, sites)| sites).collect()
    }
}
