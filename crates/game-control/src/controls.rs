//! Humanized input helpers
//!
//! Taps and delays get small random perturbations so input timing does
//! not look machine-generated.

use rand::Rng;
use std::time::Duration;

/// Default tap jitter in pixels
pub const TAP_JITTER: i32 = 5;

/// Offset a coordinate pair by up to `amount` pixels in each axis
pub fn jittered(x: i32, y: i32, amount: i32) -> (i32, i32) {
    if amount <= 0 {
        return (x, y);
    }
    let mut rng = rand::thread_rng();
    (
        x + rng.gen_range(-amount..=amount),
        y + rng.gen_range(-amount..=amount),
    )
}

/// Scale a delay by a random factor in [0.8, 1.2]
pub fn humanized(base: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.8..=1.2);
    base.mul_f64(factor)
}

/// Sleep for a humanized variation of `base`
pub async fn human_delay(base: Duration) {
    tokio::time::sleep(humanized(base)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jittered_stays_in_bounds() {
        for _ in 0..100 {
            let (x, y) = jittered(100, 200, 5);
            assert!((95..=105).contains(&x));
            assert!((195..=205).contains(&y));
        }
    }

    #[test]
    fn test_jittered_zero_amount() {
        assert_eq!(jittered(7, 9, 0), (7, 9));
    }

    #[test]
    fn test_humanized_bounds() {
        let base = Duration::from_secs(10);
        for _ in 0..100 {
            let d = humanized(base);
            assert!(d >= Duration::from_secs(8) && d <= Duration::from_secs(12));
        }
    }
}
