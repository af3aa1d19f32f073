use crate::balances::parse_amount;
use rust_decimal::RoundingStrategy;

/// Renders an amount with at most six fractional digits and no trailing zeros.
///
/// Empty or unparsable input renders as `"0"`.
pub fn formatted_amount(raw: &str) -> String {
    match parse_amount(raw) {
        Some(value) => {
            let rounded = value
                .round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
                .normalize();
            if rounded.is_zero() {
                "0".to_string()
            } else {
                rounded.to_string()
            }
        }
        None => "0".to_string(),
    }
}

/// Turns a raw action identifier (`"supply_collateral"`, `"addLiquidity"`) into a
/// sentence-case label (`"Supply collateral"`, `"Add liquidity"`).
pub fn format_action(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut spaced = String::with_capacity(raw.len() + 4);
    for c in raw.chars() {
        match c {
            '_' => spaced.push(' '),
            c if c.is_uppercase() => {
                spaced.push(' ');
                spaced.push(c);
            }
            c => spaced.push(c),
        }
    }

    let lowered = spaced.trim().to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_trimmed() {
        assert_eq!(formatted_amount("1000.300000"), "1000.3");
        assert_eq!(formatted_amount("100"), "100");
        assert_eq!(formatted_amount("0.1234567"), "0.123457");
        assert_eq!(formatted_amount("0.0000001"), "0");
        assert_eq!(formatted_amount(""), "0");
        assert_eq!(formatted_amount("garbage"), "0");
    }

    #[test]
    fn actions_are_sentence_cased() {
        assert_eq!(format_action("supply"), "Supply");
        assert_eq!(format_action("supply_collateral"), "Supply collateral");
        assert_eq!(format_action("addLiquidity"), "Add liquidity");
        assert_eq!(format_action(""), "");
    }
}
