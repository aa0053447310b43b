/// Fresh-name source for one subroutine.
///
/// Temporaries and the if/while label suffixes are numbered from 1 in
/// visitation order; `reset` is called at every function entry so sibling
/// functions number independently.
#[derive(Debug, Default)]
pub struct CodeCounters {
    temps: usize,
    ifs: usize,
    whiles: usize,
}

impl CodeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn new_temp(&mut self) -> String {
        self.temps += 1;
        format!("%{}", self.temps)
    }

    /// Suffix shared by one `ifK`/`elseK`/`endifK` triple.
    pub fn new_if_label(&mut self) -> usize {
        self.ifs += 1;
        self.ifs
    }

    /// Suffix shared by one `whileK`/`endwhileK` pair.
    pub fn new_while_label(&mut self) -> usize {
        self.whiles += 1;
        self.whiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temps_count_from_one_and_reset() {
        let mut counters = CodeCounters::new();
        assert_eq!(counters.new_temp(), "%1");
        assert_eq!(counters.new_temp(), "%2");
        assert_eq!(counters.new_if_label(), 1);
        assert_eq!(counters.new_while_label(), 1);
        assert_eq!(counters.new_while_label(), 2);

        counters.reset();
        assert_eq!(counters.new_temp(), "%1");
        assert_eq!(counters.new_if_label(), 1);
    }
}
