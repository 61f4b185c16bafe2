//! UK postcode normalization, validation, and the delivery-area rule set
//! that gates checkout.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::StorefrontError;

/// Outward/inward structure of a full UK postcode, without the space:
/// one or two area letters, a digit, an optional alphanumeric district
/// suffix, then the three-character inward code.
static POSTCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,2}[0-9][A-Z0-9]?[0-9][A-Z]{2}$").expect("postcode regex"));

/// A validated, canonically formatted UK postcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postcode {
    formatted: String,
    outward: String,
    area: String,
}

impl Postcode {
    /// Canonical form with a single space before the inward code,
    /// e.g. `SW1A 1AA`.
    pub fn as_str(&self) -> &str {
        &self.formatted
    }

    /// The outward code, e.g. `SW1A`.
    pub fn outward(&self) -> &str {
        &self.outward
    }

    /// The leading area letters of the outward code, e.g. `SW`.
    pub fn area(&self) -> &str {
        &self.area
    }
}

impl std::fmt::Display for Postcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.formatted)
    }
}

/// Normalizes (trim, uppercase, strip interior whitespace) and validates a
/// raw postcode string. Validation runs before any availability check.
pub fn parse_postcode(raw: &str) -> Result<Postcode, StorefrontError> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if compact.is_empty() {
        return Err(StorefrontError::ValidationError(
            "Please enter your postcode".to_string(),
        ));
    }

    if !POSTCODE_RE.is_match(&compact) {
        return Err(StorefrontError::ValidationError(
            "Please enter a valid UK postcode".to_string(),
        ));
    }

    // The inward code is always the final three characters.
    let split = compact.len() - 3;
    let (outward, inward) = compact.split_at(split);
    let area: String = outward.chars().take_while(|c| c.is_ascii_alphabetic()).collect();

    Ok(Postcode {
        formatted: format!("{outward} {inward}"),
        outward: outward.to_string(),
        area,
    })
}

/// Allow-list of postcode areas the store delivers to.
#[derive(Debug, Clone)]
pub struct DeliveryAreas {
    areas: Vec<String>,
}

impl DeliveryAreas {
    pub fn new<I, S>(areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            areas: areas
                .into_iter()
                .map(|a| a.into().trim().to_uppercase())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    pub fn covers(&self, postcode: &Postcode) -> bool {
        self.areas.iter().any(|a| a == postcode.area())
    }

    /// Runs the availability rule, yielding the user-facing refusal when the
    /// area is outside the delivery range.
    pub fn check(&self, postcode: &Postcode) -> Result<(), StorefrontError> {
        if self.covers(postcode) {
            Ok(())
        } else {
            Err(StorefrontError::DeliveryUnavailable(
                "Sorry, we don't deliver to your area yet".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("SW1A1AA", "SW1A 1AA", "SW1A", "SW")]
    #[case("sw1a 1aa", "SW1A 1AA", "SW1A", "SW")]
    #[case("  EC1A 1BB  ", "EC1A 1BB", "EC1A", "EC")]
    #[case("M1 1AE", "M1 1AE", "M1", "M")]
    #[case("CR2 6XH", "CR2 6XH", "CR2", "CR")]
    #[case("DN55 1PT", "DN55 1PT", "DN55", "DN")]
    fn valid_postcodes_normalize(
        #[case] raw: &str,
        #[case] formatted: &str,
        #[case] outward: &str,
        #[case] area: &str,
    ) {
        let pc = parse_postcode(raw).unwrap();
        assert_eq!(pc.as_str(), formatted);
        assert_eq!(pc.outward(), outward);
        assert_eq!(pc.area(), area);
    }

    #[rstest]
    #[case("1234")]
    #[case("SW1A")]
    #[case("SW1A 1A")]
    #[case("QWERTY123")]
    #[case("SW1A-1AA")]
    fn invalid_postcodes_are_rejected(#[case] raw: &str) {
        assert_matches!(
            parse_postcode(raw),
            Err(StorefrontError::ValidationError(_))
        );
    }

    #[test]
    fn empty_postcode_has_its_own_message() {
        let err = parse_postcode("   ").unwrap_err();
        assert_matches!(err, StorefrontError::ValidationError(msg) if msg.contains("enter your postcode"));
    }

    #[test]
    fn coverage_matches_exact_area_only() {
        let areas = DeliveryAreas::new(["N", "SW"]);
        assert!(areas.covers(&parse_postcode("N1 9AL").unwrap()));
        assert!(areas.covers(&parse_postcode("SW1A 1AA").unwrap()));
        // NW is a different area even though it starts with N.
        assert!(!areas.covers(&parse_postcode("NW1 4RY").unwrap()));
    }

    #[test]
    fn uncovered_area_yields_delivery_unavailable() {
        let areas = DeliveryAreas::new(["SW"]);
        let pc = parse_postcode("YO1 7HH").unwrap();
        assert_matches!(areas.check(&pc), Err(StorefrontError::DeliveryUnavailable(_)));
    }
}
