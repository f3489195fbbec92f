//! Human-readable amount formatting.

use std::fmt;

use crate::config::Rules;

use super::ids::Amount;

/// Display adapter for an [`Amount`].
///
/// Either `"12 nova 5 groth"` or, with [`PrintableAmount::show_point`],
/// `"12.00000005"` with trailing zeros and a trailing separator removed.
#[derive(Debug, Clone)]
pub struct PrintableAmount {
    value: Amount,
    coin: u64,
    show_point: bool,
    coin_name: String,
    groth_name: String,
}

impl PrintableAmount {
    pub fn new(value: Amount, rules: &Rules) -> Self {
        Self {
            value,
            coin: rules.coin.max(1),
            show_point: false,
            coin_name: "nova".to_string(),
            groth_name: "groth".to_string(),
        }
    }

    pub fn show_point(mut self) -> Self {
        self.show_point = true;
        self
    }

    /// Override the unit names, e.g. for an asset with its own ticker.
    pub fn with_names(mut self, coin_name: &str, groth_name: &str) -> Self {
        self.coin_name = coin_name.to_string();
        self.groth_name = groth_name.to_string();
        self
    }
}

impl fmt::Display for PrintableAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.value / self.coin;
        let fraction = self.value % self.coin;

        if self.show_point {
            let width = (self.coin as f64).log10().round() as usize;
            let s = format!("{}.{:0width$}", whole, fraction, width = width);
            let s = s.trim_end_matches('0').trim_end_matches(['.', ',']);
            return f.write_str(s);
        }

        if self.value >= self.coin {
            write!(f, "{} {}", whole, self.coin_name)?;
        }
        if fraction > 0 || self.value == 0 {
            let sep = if self.value >= self.coin { " " } else { "" };
            write!(f, "{}{} {}", sep, fraction, self.groth_name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: Amount) -> String {
        PrintableAmount::new(value, &Rules::default()).to_string()
    }

    fn fmt_point(value: Amount) -> String {
        PrintableAmount::new(value, &Rules::default()).show_point().to_string()
    }

    #[test]
    fn coins_and_groth() {
        assert_eq!(fmt(0), "0 groth");
        assert_eq!(fmt(5), "5 groth");
        assert_eq!(fmt(100_000_000), "1 nova");
        assert_eq!(fmt(250_000_007), "2 nova 50000007 groth");
    }

    #[test]
    fn decimal_point_trims_zeros() {
        assert_eq!(fmt_point(0), "0");
        assert_eq!(fmt_point(100_000_000), "1");
        assert_eq!(fmt_point(150_000_000), "1.5");
        assert_eq!(fmt_point(1), "0.00000001");
        assert_eq!(fmt_point(1_000_000_000), "10");
    }

    #[test]
    fn custom_names() {
        let s = PrintableAmount::new(100_000_001, &Rules::default())
            .with_names("TKN", "atom")
            .to_string();
        assert_eq!(s, "1 TKN 1 atom");
    }
}
