//! A Dutch (descending-price) auction settled in CCD.
//!
//! The price starts at `reserve_price + duration_steps * price_decrement` and
//! falls by one decrement per elapsed step until it reaches the reserve. The
//! first bid at or above the current price wins; the attached CCD is forwarded
//! to the seller and the auction terminates.
#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod state;
