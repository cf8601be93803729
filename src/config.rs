//! Stream configuration

/// Konfigurasi storage sebuah stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Kapasitas awal dalam bytes
    pub initial_capacity: usize,
    /// Faktor pertumbuhan saat buffer penuh (minimal 2)
    pub growth_factor: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            growth_factor: 2,
        }
    }
}

impl StreamConfig {
    pub fn with_initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    /// Growth factor di bawah 2 di-clamp ke 2 supaya pertumbuhan tetap geometris
    pub fn with_growth_factor(mut self, factor: usize) -> Self {
        self.growth_factor = factor.max(2);
        self
    }

    #[inline(always)]
    pub(crate) fn effective_growth(&self) -> usize {
        self.growth_factor.max(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_factor_clamped() {
        let config = StreamConfig::default().with_growth_factor(1);
        assert_eq!(config.growth_factor, 2);

        let config = StreamConfig {
            initial_capacity: 0,
            growth_factor: 0,
        };
        assert_eq!(config.effective_growth(), 2);
    }

    #[test]
    fn test_builder() {
        let config = StreamConfig::default()
            .with_initial_capacity(4096)
            .with_growth_factor(4);
        assert_eq!(config.initial_capacity, 4096);
        assert_eq!(config.growth_factor, 4);
    }
}
