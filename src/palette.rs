// Default series colours

/// Ordered colour cycle
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<String>,
}

impl ColorPalette {
    /// The d3 category10 scheme
    pub fn category10() -> Self {
        let colors = [
            "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
            "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
        ];
        Self {
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Colour at `index`, wrapping around the cycle
    pub fn color(&self, index: usize) -> String {
        self.colors[index % self.colors.len()].clone()
    }

    /// The first `n` colours of the cycle
    pub fn take(&self, n: usize) -> Vec<String> {
        (0..n).map(|i| self.color(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_wraps() {
        let palette = ColorPalette::category10();
        assert_eq!(palette.color(0), "#1f77b4");
        assert_eq!(palette.color(10), "#1f77b4");
        assert_eq!(palette.take(3).len(), 3);
    }
}
