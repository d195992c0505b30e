//! Run configuration handed to the solver.

/// Tolerance used when none (or a non-positive one) is given.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// Working-set budget of the multiply kernel, in `f64` elements.
///
/// 32768 elements fill a 256 KiB cache.
pub const DEFAULT_CACHE_ELEMENTS: usize = 32 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Largest `l*m + m*n + l*n` handled by the direct loop.
    pub cache_elements: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            cache_elements: DEFAULT_CACHE_ELEMENTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpmConfig {
    /// The series stops once the largest entry of the newest term is at most
    /// this value.
    pub tolerance: f64,
    pub workers: usize,
    pub kernel: KernelConfig,
}

impl ExpmConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            workers,
            kernel: KernelConfig::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = effective_tolerance(tolerance);
        self
    }

    pub fn with_kernel(mut self, kernel: KernelConfig) -> Self {
        self.kernel = kernel;
        self
    }
}

/// Replaces a non-positive (or NaN) tolerance with [`DEFAULT_TOLERANCE`].
pub fn effective_tolerance(tolerance: f64) -> f64 {
    if tolerance > 0.0 {
        tolerance
    } else {
        DEFAULT_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_tolerance_falls_back() {
        assert_eq!(ExpmConfig::new(2).with_tolerance(0.0).tolerance, DEFAULT_TOLERANCE);
        assert_eq!(ExpmConfig::new(2).with_tolerance(-1.0).tolerance, DEFAULT_TOLERANCE);
        assert_eq!(ExpmConfig::new(2).with_tolerance(f64::NAN).tolerance, DEFAULT_TOLERANCE);
        assert_eq!(ExpmConfig::new(2).with_tolerance(1e-8).tolerance, 1e-8);
    }
}
