//! Price normalization for coffee variants.
//!
//! A variant title carries its package weight as a leading token ("250g",
//! "1kg"). From it we derive the price per cup and the price per kilogram.
//! Titles without a recognizable weight (capsule packs and the like) fall back
//! to an assumed package weight.

use serde::Serialize;

use storefront_core::{Money, ValueObject};

/// Standard servings (cups) per gram-equivalent package: `grams / 6` cups.
pub const SERVINGS_PER_PACKAGE: u64 = 6;

/// Package weight assumed when the title carries no parseable weight.
pub const FALLBACK_GRAMS: u64 = 60;

/// The weight a variant title was read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum WeightBasis {
    /// "250g": an explicit gram count.
    Grams(u64),
    /// "1kg": an explicit kilogram count.
    Kilograms(u64),
    /// Unrecognized token; [`FALLBACK_GRAMS`] is assumed.
    Assumed,
}

impl ValueObject for WeightBasis {}

impl WeightBasis {
    /// Read the weight token in front of the first `g` of a title.
    ///
    /// Returns `None` when the title has nothing usable: empty, an empty head
    /// (title starts with `g`), a zero weight, or a `k` head without digits.
    pub fn parse(title: &str) -> Option<WeightBasis> {
        if title.is_empty() {
            return None;
        }

        let head = title.split('g').next().unwrap_or_default().trim();
        if head.is_empty() {
            return None;
        }

        if let Ok(grams) = head.parse::<u64>() {
            return (grams > 0).then_some(WeightBasis::Grams(grams));
        }

        if let Some((before_k, _)) = head.split_once('k') {
            let digits: String = before_k
                .trim_start()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            let kilograms = digits.parse::<u64>().ok()?;
            // Kilograms must still be expressible in grams for the per-cup ratio.
            kilograms.checked_mul(1000)?;
            return (kilograms > 0).then_some(WeightBasis::Kilograms(kilograms));
        }

        Some(WeightBasis::Assumed)
    }

    /// Package weight in grams.
    pub fn grams(&self) -> u64 {
        match *self {
            WeightBasis::Grams(g) => g,
            WeightBasis::Kilograms(k) => k.saturating_mul(1000),
            WeightBasis::Assumed => FALLBACK_GRAMS,
        }
    }

    /// True when the weight was not read from the title.
    pub fn is_assumed(&self) -> bool {
        matches!(self, WeightBasis::Assumed)
    }

    /// `unit_price / (grams / 6)`.
    pub fn per_serving(&self, unit_price: Money) -> Option<Money> {
        unit_price.scale(SERVINGS_PER_PACKAGE, self.grams())
    }

    /// `unit_price / grams * 1000`, or `unit_price / kilograms` for kg titles.
    pub fn per_kilogram(&self, unit_price: Money) -> Option<Money> {
        match *self {
            WeightBasis::Kilograms(k) => unit_price.scale(1, k),
            WeightBasis::Grams(_) | WeightBasis::Assumed => unit_price.scale(1000, self.grams()),
        }
    }
}

/// Both normalized prices for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedPrices {
    pub basis: WeightBasis,
    pub per_serving: Money,
    pub per_kilogram: Money,
}

impl ValueObject for DerivedPrices {}

impl DerivedPrices {
    /// "0,29 € pro Tasse"
    pub fn serving_line(&self) -> String {
        format!("{} € pro Tasse", self.per_serving)
    }

    /// "(48,00 € pro kg)"
    pub fn kilogram_line(&self) -> String {
        format!("({} € pro kg)", self.per_kilogram)
    }
}

/// Derive price per cup and price per kilogram from a variant title.
///
/// Both prices are present or both are absent; absent means the caller
/// renders nothing for either line.
pub fn derive_prices(title: &str, unit_price: Money) -> Option<DerivedPrices> {
    let basis = WeightBasis::parse(title)?;

    if basis.is_assumed() {
        tracing::debug!(
            title,
            fallback_grams = FALLBACK_GRAMS,
            "variant title carries no weight; assuming fallback package weight"
        );
    }

    Some(DerivedPrices {
        basis,
        per_serving: basis.per_serving(unit_price)?,
        per_kilogram: basis.per_kilogram(unit_price)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eur(cents: u64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn gram_title_derives_cup_and_kilo_price() {
        let prices = derive_prices("250g", eur(1200)).unwrap();
        assert_eq!(prices.basis, WeightBasis::Grams(250));
        assert_eq!(prices.per_serving.format_de(), "0,29");
        assert_eq!(prices.per_kilogram.format_de(), "48,00");
        assert_eq!(prices.serving_line(), "0,29 € pro Tasse");
        assert_eq!(prices.kilogram_line(), "(48,00 € pro kg)");
    }

    #[test]
    fn kilogram_title_divides_by_kilograms() {
        let prices = derive_prices("1kg", eur(4000)).unwrap();
        assert_eq!(prices.basis, WeightBasis::Kilograms(1));
        assert_eq!(prices.per_kilogram.format_de(), "40,00");
        // 40.00 / (1000 / 6) = 0.24
        assert_eq!(prices.per_serving.format_de(), "0,24");
    }

    #[test]
    fn capsule_title_falls_back_to_sixty_grams() {
        let prices = derive_prices("10 Kapseln", eur(399)).unwrap();
        assert_eq!(prices.basis, WeightBasis::Assumed);
        // 3.99 / (60 / 6) = 0.399 -> 0.40
        assert_eq!(prices.per_serving.format_de(), "0,40");
        // 3.99 / 60 * 1000 = 66.50
        assert_eq!(prices.per_kilogram.format_de(), "66,50");
    }

    #[test]
    fn arbitrary_words_take_the_fallback_path() {
        let prices = derive_prices("Sample", eur(600)).unwrap();
        assert!(prices.basis.is_assumed());
    }

    #[test]
    fn suffix_after_weight_is_ignored() {
        assert_eq!(WeightBasis::parse("500g Abo"), Some(WeightBasis::Grams(500)));
        assert_eq!(WeightBasis::parse("2kg Abo"), Some(WeightBasis::Kilograms(2)));
        assert_eq!(WeightBasis::parse("250 g"), Some(WeightBasis::Grams(250)));
    }

    #[test]
    fn unusable_titles_yield_no_prices() {
        for title in ["", "g", "  gemahlen", "0g", "0kg", "kg", "Abo kg"] {
            assert_eq!(derive_prices(title, eur(1000)), None, "{title:?}");
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: "{G}g" yields per-kilogram = P / G * 1000, rounded to cents.
            #[test]
            fn gram_titles_normalize_per_kilogram(grams in 1u64..100_000, cents in 0u64..1_000_000) {
                let prices = derive_prices(&format!("{grams}g"), eur(cents)).unwrap();
                prop_assert_eq!(prices.per_kilogram, eur(cents).scale(1000, grams).unwrap());
                prop_assert_eq!(prices.per_serving, eur(cents).scale(6, grams).unwrap());
            }

            /// Property: "{K}kg" yields per-kilogram = P / K, rounded to cents.
            #[test]
            fn kilogram_titles_normalize_per_kilogram(kilos in 1u64..1_000, cents in 0u64..1_000_000) {
                let prices = derive_prices(&format!("{kilos}kg"), eur(cents)).unwrap();
                prop_assert_eq!(prices.per_kilogram, eur(cents).scale(1, kilos).unwrap());
            }

            /// Property: a readable weight yields both prices from that weight,
            /// an unreadable one yields neither.
            #[test]
            fn prices_follow_the_parsed_weight(title in "\\PC{0,24}", cents in 0u64..1_000_000) {
                let derived = derive_prices(&title, eur(cents));
                match WeightBasis::parse(&title) {
                    Some(basis) => {
                        let prices = derived.expect("readable weight must price");
                        let per_kilogram = match basis {
                            WeightBasis::Kilograms(k) => eur(cents).scale(1, k),
                            _ => eur(cents).scale(1000, basis.grams()),
                        };
                        prop_assert_eq!(prices.basis, basis);
                        prop_assert_eq!(Some(prices.per_serving), eur(cents).scale(6, basis.grams()));
                        prop_assert_eq!(Some(prices.per_kilogram), per_kilogram);
                    }
                    None => prop_assert!(derived.is_none()),
                }
            }
        }
    }
}
