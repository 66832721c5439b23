use serde::{Deserialize, Serialize};

/// A dense feature vector produced by an encoder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn dot(&self, other: &Vector) -> f32 {
        dot_product(&self.data, &other.data)
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        dot_product(&self.data, &self.data).sqrt()
    }

    /// Cosine similarity with another vector.
    ///
    /// Defined as 0.0 when either vector has zero norm or the dimensions
    /// disagree, so callers never see NaN.
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let norm_a = self.norm();
        let norm_b = other.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        self.dot(other) / (norm_a * norm_b)
    }
}

/// Scalar dot product with two accumulators for better pipelining.
/// Mismatched lengths yield 0.0.
#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut sum1 = 0.0f32;
    let mut sum2 = 0.0f32;
    let chunks = a.len() / 2;

    for i in 0..chunks {
        let j = i * 2;
        sum1 += a[j] * b[j];
        sum2 += a[j + 1] * b[j + 1];
    }

    if a.len() % 2 == 1 {
        let last = a.len() - 1;
        sum1 += a[last] * b[last];
    }

    sum1 + sum2
}
