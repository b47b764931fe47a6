/// Integer division `x / y`, rounded up.
///
/// Both operands must be positive; anything else is a caller bug and panics.
/// No floating point is involved: the result is `1 + (x - 1) / y`.
pub fn ceil_div(x: usize, y: usize) -> usize {
    assert!(x > 0, "ceil_div: dividend must be positive");
    assert!(y > 0, "ceil_div: divisor must be positive");
    1 + (x - 1) / y
}

#[cfg(test)]
mod tests {
    use super::ceil_div;

    #[test]
    fn rounds_up_partial_quotients() {
        assert_eq!(ceil_div(7, 5), 2);
        assert_eq!(ceil_div(8, 3), 3);
        assert_eq!(ceil_div(9, 3), 3);
        assert_eq!(ceil_div(1, 1000), 1);
    }

    #[test]
    fn unit_divisor_and_equal_operands() {
        for n in 1..=64 {
            assert_eq!(ceil_div(n, 1), n);
            assert_eq!(ceil_div(n, n), 1);
        }
    }

    #[test]
    #[should_panic(expected = "dividend must be positive")]
    fn zero_dividend_panics() {
        ceil_div(0, 3);
    }

    #[test]
    #[should_panic(expected = "divisor must be positive")]
    fn zero_divisor_panics() {
        ceil_div(3, 0);
    }
}
