use serde::{Deserialize, Serialize};

/// Sequential name generator for script-side temporaries.
///
/// One generator is owned by each render session; names are only unique
/// within the script output produced through that session and are never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IDGenerator {
    count: u32,
}

impl IDGenerator {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// Resume a sequence, e.g. when a session continues after a previous pass
    pub fn starting_at(count: u32) -> Self {
        Self { count }
    }

    /// Next raw sequence number
    pub fn next_index(&mut self) -> u32 {
        let index = self.count;
        self.count += 1;
        index
    }

    /// Name for a temporary element variable (`j0`, `j1`, ...)
    pub fn new_var(&mut self) -> String {
        format!("j{}", self.next_index())
    }

    /// Name for a synthesized event handler function (`f0`, `f1`, ...)
    pub fn new_function(&mut self) -> String {
        format!("f{}", self.next_index())
    }

    /// Element id for a created element that script has to address
    /// (`o0`, `o1`, ...)
    pub fn new_element_id(&mut self) -> String {
        format!("o{}", self.next_index())
    }

    /// Number of names handed out so far
    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_names() {
        let mut gen = IDGenerator::new();

        assert_eq!(gen.new_var(), "j0");
        assert_eq!(gen.new_function(), "f1");
        assert_eq!(gen.new_var(), "j2");
        assert_eq!(gen.new_element_id(), "o3");
        assert_eq!(gen.count(), 4);
    }

    #[test]
    fn test_resumed_sequence() {
        let mut gen = IDGenerator::starting_at(41);
        assert_eq!(gen.new_var(), "j41");
        assert_eq!(gen.next_index(), 42);
    }

    #[test]
    fn test_generator_state_survives_serialization() {
        let mut gen = IDGenerator::new();
        gen.new_var();
        gen.new_var();

        let json = serde_json::to_string(&gen).unwrap();
        let mut restored: IDGenerator = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.new_var(), "j2");
    }
}
