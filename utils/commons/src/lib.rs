//! It exposes the errors, types, price calculations and CIS-2 client
//! helpers shared by the Dutch auction contracts.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{cis2_client::*, constants::*, errors::*, types::*};
use concordium_cis2::*;
use concordium_std::*;

pub mod calculations;
mod cis2_client;
mod constants;
mod errors;
mod types;
