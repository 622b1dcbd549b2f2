//! Tests for fragmentation configuration validation.

use std::time::Duration;

use rstest::rstest;

use crate::fragment::{
    DEFAULT_REASSEMBLY_TIMEOUT,
    FragmentationConfig,
    FragmentationError,
    Fragmenter,
    MAX_FRAGMENT_SIZE,
    MIN_FRAGMENT_SIZE,
};

#[rstest]
#[case::zero(0)]
#[case::header_only(9)]
#[case::just_below_minimum(MIN_FRAGMENT_SIZE - 1)]
#[case::beyond_length_prefix(MAX_FRAGMENT_SIZE + 1)]
fn rejects_unusable_fragment_sizes(#[case] size: usize) {
    let expected = FragmentationError::InvalidFragmentSize {
        size,
        min: MIN_FRAGMENT_SIZE,
        max: MAX_FRAGMENT_SIZE,
    };
    assert_eq!(Fragmenter::new(size).expect_err("size must be rejected"), expected);
    assert_eq!(
        FragmentationConfig::new(size, MAX_FRAGMENT_SIZE).expect_err("size must be rejected"),
        expected
    );
}

#[rstest]
#[case(MIN_FRAGMENT_SIZE)]
#[case(1500)]
#[case(MAX_FRAGMENT_SIZE)]
fn accepts_fragment_sizes_in_range(#[case] size: usize) {
    let fragmenter = Fragmenter::new(size).expect("size within range");
    assert_eq!(fragmenter.max_fragment_size().get(), size);
}

#[test]
fn reassembly_budget_must_hold_a_fragment() {
    assert_eq!(
        FragmentationConfig::new(128, 127),
        Err(FragmentationError::BudgetBelowFragmentSize {
            budget: 127,
            fragment_size: 128,
        })
    );
}

#[test]
fn config_defaults_and_overrides() {
    let config = FragmentationConfig::new(128, 4096).expect("valid config");
    assert_eq!(config.reassembly_timeout(), DEFAULT_REASSEMBLY_TIMEOUT);
    assert_eq!(config.max_reassembly_size().get(), 4096);

    let config = config.with_reassembly_timeout(Duration::from_secs(2));
    assert_eq!(config.reassembly_timeout(), Duration::from_secs(2));
    assert_eq!(
        Fragmenter::from_config(&config).max_fragment_size().get(),
        128
    );
}
