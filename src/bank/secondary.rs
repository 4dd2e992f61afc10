use std::collections::VecDeque;

use crate::bank::Site;

// Secondary neutrons of one history, from multi-neutron reactions
// such as (n,2n) and (n,3n). They are transported after the particle
// that produced them, in the order they were banked.
#[derive(Debug, Default)]
pub struct SecondaryBank {
    queue: VecDeque<Site>,
}

impl SecondaryBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, site: Site) {
        self.queue.push_back(site);
    }

    pub fn pop(&mut self) -> Option<Site> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
