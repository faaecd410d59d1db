//! P-value adjustment for multiple testing
//!
//! Benjamini-Hochberg step-up correction, shared by the expression and
//! enrichment pipelines. Undefined (NaN) p-values pass through as NaN and
//! do not count toward the number of tests.

/// Apply Benjamini-Hochberg FDR correction to p-values.
///
/// Each adjusted value is min over j >= rank of (p_j * m / j), clamped to 1,
/// where m is the number of defined p-values. Output order matches input
/// order; NaN inputs yield NaN outputs.
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len();
    if n == 0 {
        return vec![];
    }

    let mut indices: Vec<usize> = (0..n).collect();

    // Sort indices by p-value with NaN at the end
    indices.sort_by(|&a, &b| {
        let pa = pvalues[a];
        let pb = pvalues[b];

        if pa.is_nan() && pb.is_nan() {
            std::cmp::Ordering::Equal
        } else if pa.is_nan() {
            std::cmp::Ordering::Greater
        } else if pb.is_nan() {
            std::cmp::Ordering::Less
        } else {
            pa.partial_cmp(&pb).unwrap()
        }
    });

    let m = pvalues.iter().filter(|p| p.is_finite()).count();

    if m == 0 {
        return vec![f64::NAN; n];
    }

    // Walk from the largest defined p-value down, carrying the running minimum
    let mut padj = vec![f64::NAN; n];
    let mut cummin = f64::INFINITY;
    let mut rank = m;

    for &i in indices.iter().rev() {
        let p = pvalues[i];

        if p.is_finite() {
            let adj = (p * m as f64 / rank as f64).min(1.0);
            cummin = cummin.min(adj);
            padj[i] = cummin;
            rank -= 1;
        }
    }

    padj
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bh_basic() {
        let pvalues = vec![0.01, 0.04, 0.03, 0.02];
        let padj = benjamini_hochberg(&pvalues);

        for (p, adj) in pvalues.iter().zip(padj.iter()) {
            assert!(*adj >= *p);
        }
        for adj in &padj {
            assert!(*adj <= 1.0);
        }
    }

    #[test]
    fn test_bh_known_values() {
        let pvalues = vec![0.005, 0.011, 0.02, 0.04];
        let padj = benjamini_hochberg(&pvalues);

        assert!((padj[0] - 0.02).abs() < 1e-12);
        assert!((padj[1] - 0.022).abs() < 1e-12);
        assert!((padj[2] - 0.02 * 4.0 / 3.0).abs() < 1e-12);
        assert!((padj[3] - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_bh_with_nan() {
        let pvalues = vec![0.01, f64::NAN, 0.03, 0.02];
        let padj = benjamini_hochberg(&pvalues);

        assert!(padj[0].is_finite());
        assert!(padj[1].is_nan());
        assert!(padj[2].is_finite());
        assert!(padj[3].is_finite());

        // NaN is excluded from m: smallest p-value gets 0.01 * 3 / 1
        assert!((padj[0] - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_bh_ordering() {
        let pvalues = vec![0.001, 0.01, 0.05, 0.1];
        let padj = benjamini_hochberg(&pvalues);

        for i in 0..padj.len() - 1 {
            assert!(padj[i] <= padj[i + 1]);
        }
    }

    #[test]
    fn test_bh_order_independent() {
        let sorted = vec![0.002, 0.009, 0.013, 0.04, 0.3];
        let shuffled = vec![0.04, 0.002, 0.3, 0.013, 0.009];

        let padj_sorted = benjamini_hochberg(&sorted);
        let padj_shuffled = benjamini_hochberg(&shuffled);

        // The same raw p-value gets the same adjusted value in any order
        for (i, p) in sorted.iter().enumerate() {
            let j = shuffled.iter().position(|q| q == p).unwrap();
            assert!((padj_sorted[i] - padj_shuffled[j]).abs() < 1e-15);
        }
    }

    #[test]
    fn test_bh_all_nan() {
        let pvalues = vec![f64::NAN, f64::NAN];
        let padj = benjamini_hochberg(&pvalues);
        assert!(padj.iter().all(|p| p.is_nan()));
    }

    #[test]
    fn test_bh_empty() {
        let padj = benjamini_hochberg(&[]);
        assert!(padj.is_empty());
    }
}
