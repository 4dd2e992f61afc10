use crate::random::RandomSource;
use crate::unitf64::UnitF64;

// Scripted random source for unit tests. Hands out the given values in
// order and panics when they run out.
pub struct MockRng {
    values: Vec<f64>,
    index: usize,
}

impl MockRng {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, index: 0 }
    }

    pub fn consumed(&self) -> usize {
        self.index
    }
}

impl RandomSource for MockRng {
    fn next_unit(&mut self) -> UnitF64 {
        if self.index >= self.values.len() {
            panic!("MockRng: Ran out of values to return");
        }
        let value = self.values[self.index];
        self.index += 1;
        UnitF64::new_unchecked(value)
    }
}
