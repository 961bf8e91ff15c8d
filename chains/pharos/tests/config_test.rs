use pharos_bot::{Amount, PharosConfig};

// Runs in its own test binary, so the process environment is not shared
// with the in-crate config tests.
#[test]
fn test_environment_overrides_keep_amount_literals() {
    std::env::set_var("PHAROS__PARAMS__UNWRAP_AMOUNT", "1.50");
    std::env::set_var("PHAROS__PARAMS__WRAP_COUNT", "3");

    let config = PharosConfig::load("/nonexistent/pharos.toml").unwrap();
    assert_eq!(config.params.unwrap_amount, "1.50");
    assert_eq!(config.params.wrap_count, 3);

    let amounts = config.amounts().unwrap();
    match amounts.unwrap {
        Amount::Exact(amount) => {
            assert_eq!(amount.scale(), 2);
            assert_eq!(amount.to_string(), "1.50");
        }
        Amount::All => panic!("expected an exact amount"),
    }
}
