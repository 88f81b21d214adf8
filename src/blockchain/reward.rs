use crate::errors::{ChainError, ChainResult};
use crate::transaction::Amount;

/// Block subsidy that halves every `halving_interval` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardSchedule {
    base_subsidy: Amount,
    halving_interval: u32,
}

impl RewardSchedule {
    pub fn new(base_subsidy: Amount, halving_interval: u32) -> ChainResult<Self> {
        if halving_interval == 0 {
            return Err(ChainError::InvalidInput(
                "halving interval must be positive".into(),
            ));
        }
        Ok(Self {
            base_subsidy,
            halving_interval,
        })
    }

    pub(crate) const fn new_unchecked(base_subsidy: Amount, halving_interval: u32) -> Self {
        Self {
            base_subsidy,
            halving_interval,
        }
    }

    pub fn base_subsidy(&self) -> Amount {
        self.base_subsidy
    }

    pub fn halving_interval(&self) -> u32 {
        self.halving_interval
    }

    pub fn subsidy(&self, height: u32) -> Amount {
        let halvings = height / self.halving_interval;
        if halvings >= Amount::BITS {
            return 0;
        }
        self.base_subsidy >> halvings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::COIN;
    use proptest::prelude::*;

    fn regtest() -> RewardSchedule {
        RewardSchedule::new(50 * COIN, 150).unwrap()
    }

    #[test]
    fn first_halving_boundary() {
        let s = regtest();
        assert_eq!(s.subsidy(1), 50 * COIN);
        assert_eq!(s.subsidy(149), 50 * COIN);
        assert_eq!(s.subsidy(150), 25 * COIN);
        assert_eq!(s.subsidy(299), 25 * COIN);
        assert_eq!(s.subsidy(300), 1_250_000_000);
    }

    #[test]
    fn subsidy_runs_out() {
        let s = regtest();
        assert_eq!(s.subsidy(150 * 63), (50 * COIN) >> 63);
        assert_eq!(s.subsidy(150 * 64), 0);
        assert_eq!(s.subsidy(u32::MAX), 0);
    }

    #[test]
    fn zero_interval_is_invalid() {
        assert!(RewardSchedule::new(50 * COIN, 0).is_err());
    }

    proptest! {
        #[test]
        fn halves_after_each_interval(h in 1u32..100_000) {
            let s = regtest();
            prop_assert_eq!(s.subsidy(h + 150), s.subsidy(h) >> 1);
        }

        #[test]
        fn never_increases(h in 0u32..u32::MAX) {
            let s = regtest();
            prop_assert!(s.subsidy(h + 1) <= s.subsidy(h));
        }
    }
}
