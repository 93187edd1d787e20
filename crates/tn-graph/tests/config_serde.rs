//! Solver settings loaded from JSON, as a host application would store them.
#![cfg(feature = "serde")]

use tn_graph::SolveConfig;

#[test]
fn config_round_trips_through_json() {
    let config = SolveConfig {
        relax_coef: 0.7,
        skip_iterations: 2,
        max_iterations: 250,
        precision: 1e-8,
    };
    let text = serde_json::to_string(&config).unwrap();
    let back: SolveConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn missing_fields_take_defaults() {
    let config: SolveConfig = serde_json::from_str(r#"{ "relax_coef": 0.5 }"#).unwrap();
    assert_eq!(
        config,
        SolveConfig {
            relax_coef: 0.5,
            ..SolveConfig::default()
        }
    );
}
