//! Sticky bucket assignment.
//!
//! A client's bucket travels in the `variant-cookie` cookie. Lookup is a plain
//! substring check against the raw `Cookie` header, not a cookie-syntax parse,
//! so `variant-cookie=22` is read as bucket B and `variant-cookie=12` as A.

use std::fmt;

use rand::Rng;

/// Name of the cookie carrying the bucket.
pub const COOKIE_NAME: &str = "variant-cookie";

/// Cookie lifetime: 30 days.
pub const COOKIE_MAX_AGE_SECS: u64 = 2_592_000;

/// One side of the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// First discovered variant, served with the "Yin" theme.
    A,
    /// Second discovered variant, served with the "Yang" theme.
    B,
}

impl Bucket {
    /// Value stored in the cookie for this bucket.
    pub fn cookie_value(self) -> &'static str {
        match self {
            Bucket::A => "1",
            Bucket::B => "2",
        }
    }

    /// Position of this bucket's URL in the discovery list.
    pub fn index(self) -> usize {
        match self {
            Bucket::A => 0,
            Bucket::B => 1,
        }
    }

    /// Finds an existing assignment in a raw `Cookie` header.
    ///
    /// A is checked before B.
    pub fn from_cookie_header(header: Option<&str>) -> Option<Self> {
        let header = header?;
        [Bucket::A, Bucket::B]
            .into_iter()
            .find(|bucket| header.contains(&bucket.cookie_pair()))
    }

    /// Draws a fresh bucket with probability 0.5 each.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<f64>() < 0.5 {
            Bucket::A
        } else {
            Bucket::B
        }
    }

    /// `Set-Cookie` value persisting this bucket on the client.
    pub fn set_cookie(self) -> String {
        format!(
            "{}; path=/; Max-Age={}",
            self.cookie_pair(),
            COOKIE_MAX_AGE_SECS
        )
    }

    fn cookie_pair(self) -> String {
        format!("{}={}", COOKIE_NAME, self.cookie_value())
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::A => f.write_str("A"),
            Bucket::B => f.write_str("B"),
        }
    }
}

/// Outcome of bucket resolution for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub bucket: Bucket,
    /// True when the bucket was drawn for this request and must be persisted.
    pub is_new: bool,
}

impl Assignment {
    /// Honors an existing cookie, otherwise draws a new bucket.
    pub fn resolve<R: Rng + ?Sized>(cookie_header: Option<&str>, rng: &mut R) -> Self {
        match Bucket::from_cookie_header(cookie_header) {
            Some(bucket) => Self {
                bucket,
                is_new: false,
            },
            None => Self {
                bucket: Bucket::draw(rng),
                is_new: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // ========== Cookie Lookup ==========

    #[test]
    fn test_cookie_value_1_is_bucket_a() {
        assert_eq!(
            Bucket::from_cookie_header(Some("variant-cookie=1")),
            Some(Bucket::A)
        );
    }

    #[test]
    fn test_cookie_value_2_is_bucket_b() {
        assert_eq!(
            Bucket::from_cookie_header(Some("variant-cookie=2")),
            Some(Bucket::B)
        );
    }

    #[test]
    fn test_cookie_among_other_cookies() {
        let header = "session=abc; variant-cookie=2; theme=dark";
        assert_eq!(Bucket::from_cookie_header(Some(header)), Some(Bucket::B));
    }

    #[test]
    fn test_missing_header_has_no_bucket() {
        assert_eq!(Bucket::from_cookie_header(None), None);
    }

    #[test]
    fn test_header_without_token_has_no_bucket() {
        assert_eq!(
            Bucket::from_cookie_header(Some("session=abc; variant=1")),
            None
        );
    }

    #[test]
    fn test_unknown_cookie_value_has_no_bucket() {
        assert_eq!(Bucket::from_cookie_header(Some("variant-cookie=3")), None);
    }

    #[test]
    fn test_cookie_name_is_case_sensitive() {
        assert_eq!(Bucket::from_cookie_header(Some("Variant-Cookie=1")), None);
    }

    // Substring matching is kept as-is: longer values and embedded tokens
    // still match.

    #[test]
    fn test_longer_value_22_matches_bucket_b() {
        assert_eq!(
            Bucket::from_cookie_header(Some("other=1;variant-cookie=22")),
            Some(Bucket::B)
        );
    }

    #[test]
    fn test_embedded_token_matches_bucket_b() {
        assert_eq!(
            Bucket::from_cookie_header(Some("xvariant-cookie=2x")),
            Some(Bucket::B)
        );
    }

    #[test]
    fn test_value_12_matches_bucket_a_first() {
        assert_eq!(
            Bucket::from_cookie_header(Some("variant-cookie=12")),
            Some(Bucket::A)
        );
    }

    #[test]
    fn test_both_tokens_present_prefers_a() {
        let header = "variant-cookie=2; variant-cookie=1";
        assert_eq!(Bucket::from_cookie_header(Some(header)), Some(Bucket::A));
    }

    // ========== Set-Cookie ==========

    #[test]
    fn test_set_cookie_bucket_a() {
        assert_eq!(
            Bucket::A.set_cookie(),
            "variant-cookie=1; path=/; Max-Age=2592000"
        );
    }

    #[test]
    fn test_set_cookie_bucket_b() {
        assert_eq!(
            Bucket::B.set_cookie(),
            "variant-cookie=2; path=/; Max-Age=2592000"
        );
    }

    #[test]
    fn test_set_cookie_round_trips_through_lookup() {
        for bucket in [Bucket::A, Bucket::B] {
            let header = bucket.set_cookie();
            assert_eq!(Bucket::from_cookie_header(Some(&header)), Some(bucket));
        }
    }

    #[test]
    fn test_bucket_index_and_display() {
        assert_eq!(Bucket::A.index(), 0);
        assert_eq!(Bucket::B.index(), 1);
        assert_eq!(Bucket::A.to_string(), "A");
        assert_eq!(Bucket::B.to_string(), "B");
    }

    // ========== Random Draw ==========

    #[test]
    fn test_draw_low_value_is_a() {
        let mut rng = StepRng::new(0, 0);
        assert_eq!(Bucket::draw(&mut rng), Bucket::A);
    }

    #[test]
    fn test_draw_high_value_is_b() {
        let mut rng = StepRng::new(u64::MAX, 0);
        assert_eq!(Bucket::draw(&mut rng), Bucket::B);
    }

    #[test]
    fn test_draw_distribution_near_50_50() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let a_count = (0..n)
            .filter(|_| Bucket::draw(&mut rng) == Bucket::A)
            .count();

        let ratio = a_count as f64 / n as f64;
        assert!((0.48..0.52).contains(&ratio), "ratio was {}", ratio);
    }

    // ========== Assignment ==========

    #[test]
    fn test_resolve_existing_cookie_is_not_new() {
        let mut rng = StepRng::new(u64::MAX, 0);
        let assignment = Assignment::resolve(Some("variant-cookie=1"), &mut rng);
        assert_eq!(assignment.bucket, Bucket::A);
        assert!(!assignment.is_new);
    }

    #[test]
    fn test_resolve_without_cookie_draws_new() {
        let mut rng = StepRng::new(u64::MAX, 0);
        let assignment = Assignment::resolve(None, &mut rng);
        assert_eq!(assignment.bucket, Bucket::B);
        assert!(assignment.is_new);
    }

    #[test]
    fn test_resolve_unrelated_cookie_draws_new() {
        let mut rng = StepRng::new(0, 0);
        let assignment = Assignment::resolve(Some("session=abc"), &mut rng);
        assert_eq!(assignment.bucket, Bucket::A);
        assert!(assignment.is_new);
    }
}
