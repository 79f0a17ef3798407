//! Property tests checking radix conversion against native `u128` math.

use proptest::prelude::*;
use ulc_num::{add_small, div_by_16, hex_of, mul_by_small, radix_to_decimal};

fn render(mut value: u128, radix: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(char::from_digit((value % u128::from(radix)) as u32, radix).unwrap());
        value /= u128::from(radix);
    }
    out.iter().rev().collect()
}

proptest! {
    #[test]
    fn prop_hex_of_matches_reference(value in any::<u128>(), radix in 2u32..=36, zeros in 0usize..4) {
        let digits = format!("{}{}", "0".repeat(zeros), render(value, radix));
        let hex = hex_of(&digits, radix).unwrap();
        prop_assert_eq!(u128::from_str_radix(&hex, 16).unwrap(), value);
        prop_assert_eq!(hex, format!("{value:X}"));
    }

    #[test]
    fn prop_lowercase_digits_accepted(value in any::<u64>(), radix in 11u32..=36) {
        let digits = render(u128::from(value), radix).to_lowercase();
        prop_assert_eq!(hex_of(&digits, radix).unwrap(), format!("{value:X}"));
    }

    #[test]
    fn prop_radix_to_decimal_matches_reference(value in any::<u128>(), radix in 2u32..=36) {
        let digits = render(value, radix);
        prop_assert_eq!(radix_to_decimal(&digits, radix).unwrap(), value.to_string());
    }

    #[test]
    fn prop_small_arithmetic(a in 0u128..u128::MAX / 100, k in 0u32..100) {
        let digits = a.to_string();
        prop_assert_eq!(mul_by_small(&digits, k).unwrap(), (a * u128::from(k)).to_string());
        prop_assert_eq!(add_small(&digits, k).unwrap(), (a + u128::from(k)).to_string());
    }

    #[test]
    fn prop_div_by_16_reaches_zero(a in any::<u128>()) {
        let mut digits = a.to_string();
        let mut value = a;
        loop {
            let (quotient, rem) = div_by_16(&digits).unwrap();
            prop_assert_eq!(u128::from(rem), value % 16);
            prop_assert_eq!(quotient.clone(), (value / 16).to_string());
            value /= 16;
            if value == 0 {
                prop_assert_eq!(div_by_16(&quotient).unwrap(), ("0".to_string(), 0));
                break;
            }
            digits = quotient;
        }
    }
}

#[test]
fn test_all_zero_in_every_radix() {
    for radix in 2..=36 {
        assert_eq!(hex_of("000", radix).unwrap(), "0", "radix {radix}");
    }
}
