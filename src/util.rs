/// Number of decimal digits in `n`. Used to size zero-padded indices in the
/// console report.
pub fn digit_count(n: usize) -> usize {
    n.to_string().len()
}
