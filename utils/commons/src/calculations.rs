use super::*;

/// Whole steps elapsed between `start` and `now`. Not clamped to any
/// duration; times before `start` count as zero elapsed steps.
pub fn elapsed_steps(start: Timestamp, step_length: Duration, now: Timestamp) -> u64 {
    match now.duration_since(start) {
        Some(elapsed) => elapsed.millis() / step_length.millis(),
        None => 0,
    }
}

/// The constant price at step zero, in raw price units.
pub fn initial_price(reserve: u64, decrement: u64, duration_steps: u64) -> u64 {
    reserve + decrement * duration_steps
}

/// Price after `elapsed` steps: the reserve raised by one decrement per
/// remaining step. Clamping the elapsed count keeps the arithmetic additive,
/// so the price can neither underflow nor fall below the reserve, and it
/// stays pinned at exactly the reserve from the expiry step onward.
pub fn current_price(reserve: u64, decrement: u64, duration_steps: u64, elapsed: u64) -> u64 {
    reserve + decrement * (duration_steps - elapsed.min(duration_steps))
}

/// Whether the bidding window has closed after `elapsed` steps. The expiry
/// step itself is still inside the window, at exactly the reserve price.
pub fn is_expired(elapsed: u64, duration_steps: u64) -> bool {
    elapsed > duration_steps
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_price_schedule() {
        claim_eq!(initial_price(500, 50, 10), 1_000);
        claim_eq!(current_price(500, 50, 10, 0), 1_000);
        claim_eq!(current_price(500, 50, 10, 5), 750);
        claim_eq!(current_price(500, 50, 10, 10), 500);
        claim_eq!(
            current_price(500, 50, 10, u64::MAX),
            500,
            "Price stays pinned at the reserve after the window"
        );
        claim!(!is_expired(10, 10), "The expiry step is inside the window");
        claim!(is_expired(11, 10), "One step past the duration is outside");
    }

    #[concordium_test]
    fn test_elapsed_steps() {
        let start = Timestamp::from_timestamp_millis(1_000);
        let step_length = Duration::from_millis(500);

        claim_eq!(
            elapsed_steps(start, step_length, Timestamp::from_timestamp_millis(0)),
            0,
            "Times before the start count as zero elapsed steps"
        );
        claim_eq!(elapsed_steps(start, step_length, start), 0);
        claim_eq!(
            elapsed_steps(start, step_length, Timestamp::from_timestamp_millis(1_999)),
            1,
            "Partial steps do not count"
        );
        claim_eq!(
            elapsed_steps(start, step_length, Timestamp::from_timestamp_millis(2_000)),
            2
        );
    }
}
