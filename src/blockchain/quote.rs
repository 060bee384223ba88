// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee quotes for both chain families.

use alloy::primitives::U256;

/// Family-specific breakdown of a [`FeeQuote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeDetails {
    /// `gas_price × gas_limit`, paid by the sender.
    FeeMarket { gas_limit: u64, gas_price: u128 },
    /// Energy and bandwidth drawn from the account's resource pool; only the
    /// shortfall is burned from the native balance.
    Resource {
        energy_required: u64,
        energy_available: u64,
        /// Sun burned per missing unit of energy
        energy_price: u64,
        bandwidth_bytes: u64,
        bandwidth_available: u64,
        /// Sun burned per byte when free and staked bandwidth do not cover
        bandwidth_price: u64,
        /// One-off cost of activating a recipient that does not exist yet
        activation_fee: u64,
    },
}

/// Native-currency cost of a pending operation.
///
/// Produced fresh for every request: both the unit price and the unit count
/// move between blocks, so a quote is never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeQuote {
    /// Gas limit (fee-market) or energy required (resource-model)
    pub estimated_units: u64,
    /// Price per unit in the native smallest unit
    pub unit_price: U256,
    /// Native smallest units the sender must hold to pay for execution
    pub total_native_cost: U256,
    pub details: FeeDetails,
}

impl FeeQuote {
    pub fn fee_market(gas_limit: u64, gas_price: u128) -> Self {
        Self {
            estimated_units: gas_limit,
            unit_price: U256::from(gas_price),
            total_native_cost: U256::from(gas_limit) * U256::from(gas_price),
            details: FeeDetails::FeeMarket {
                gas_limit,
                gas_price,
            },
        }
    }

    /// Price a resource-model operation from the account's available pool.
    ///
    /// Bandwidth is all-or-nothing: when the pool cannot cover the whole
    /// transaction size the full size is burned.
    pub fn resource(
        energy_required: u64,
        energy_available: u64,
        energy_price: u64,
        bandwidth_bytes: u64,
        bandwidth_available: u64,
        bandwidth_price: u64,
        activation_fee: u64,
    ) -> Self {
        let energy_shortfall = energy_required.saturating_sub(energy_available);
        let energy_cost = U256::from(energy_shortfall) * U256::from(energy_price);
        let bandwidth_cost = if bandwidth_available >= bandwidth_bytes {
            U256::ZERO
        } else {
            U256::from(bandwidth_bytes) * U256::from(bandwidth_price)
        };

        Self {
            estimated_units: energy_required,
            unit_price: U256::from(energy_price),
            total_native_cost: energy_cost + bandwidth_cost + U256::from(activation_fee),
            details: FeeDetails::Resource {
                energy_required,
                energy_available,
                energy_price,
                bandwidth_bytes,
                bandwidth_available,
                bandwidth_price,
                activation_fee,
            },
        }
    }
}
