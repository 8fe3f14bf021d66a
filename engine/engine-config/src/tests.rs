//! Tests for the configuration module.

use super::*;

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.data_dir, "./data");
    assert_eq!(config.common.log_level, "info");
    assert_eq!(config.selfplay.num_workers, 14);
    assert_eq!(config.mcts.num_simulations, 200);
    assert_eq!(config.storage.replay_db, "replay.db");
}

#[test]
fn test_selfplay_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.selfplay.iterations, 400);
    assert_eq!(config.selfplay.games_per_iteration, 10);
    assert!(!config.selfplay.include_draws);
    assert_eq!(config.selfplay.seed, 0);
}

#[test]
fn test_evaluation_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.evaluation.interval, 5);
    assert_eq!(config.evaluation.games, 4);
    assert_eq!(config.evaluation.compete_back, 50);
    assert!((config.evaluation.elo_k - 16.0).abs() < f64::EPSILON);
    assert!((config.evaluation.initial_elo - 1500.0).abs() < f64::EPSILON);
}

#[test]
fn test_mcts_defaults() {
    let config = CentralConfig::default();
    assert!((config.mcts.c_puct - 1.0).abs() < f64::EPSILON);
    assert!((config.mcts.temperature - 0.1).abs() < f64::EPSILON);
    assert_eq!(config.mcts.temp_threshold, 0);
    assert!(config.mcts.dirichlet_alpha.abs() < f64::EPSILON);
    assert!(config.mcts.dirichlet_weight.abs() < f64::EPSILON);
    assert_eq!(config.mcts.onnx_intra_threads, 1);
}

#[test]
fn test_temperature_schedule() {
    let mut mcts = MctsConfig {
        temperature: 1.0,
        late_temperature: 0.25,
        ..MctsConfig::default()
    };
    // Threshold 0 keeps the early temperature for the whole game
    assert!((mcts.temperature_at(70) - 1.0).abs() < f64::EPSILON);

    mcts.temp_threshold = 10;
    assert!((mcts.temperature_at(9) - 1.0).abs() < f64::EPSILON);
    assert!((mcts.temperature_at(10) - 0.25).abs() < f64::EPSILON);
}

#[test]
fn test_ultimate_env_overrides() {
    std::env::set_var("ULTIMATE_COMMON_DATA_DIR", "/tmp/ultimate-data");
    std::env::set_var("ULTIMATE_SELFPLAY_NUM_WORKERS", "3");
    std::env::set_var("ULTIMATE_EVALUATION_ELO_K", "24.5");
    std::env::set_var("ULTIMATE_SELFPLAY_INCLUDE_DRAWS", "true");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.common.data_dir, "/tmp/ultimate-data");
    assert_eq!(config.selfplay.num_workers, 3);
    assert!((config.evaluation.elo_k - 24.5).abs() < f64::EPSILON);
    assert!(config.selfplay.include_draws);

    std::env::remove_var("ULTIMATE_COMMON_DATA_DIR");
    std::env::remove_var("ULTIMATE_SELFPLAY_NUM_WORKERS");
    std::env::remove_var("ULTIMATE_EVALUATION_ELO_K");
    std::env::remove_var("ULTIMATE_SELFPLAY_INCLUDE_DRAWS");
}

#[test]
fn test_unparseable_env_override_is_ignored() {
    std::env::set_var("ULTIMATE_MCTS_NUM_SIMULATIONS", "lots");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.mcts.num_simulations, 200);

    std::env::remove_var("ULTIMATE_MCTS_NUM_SIMULATIONS");
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
data_dir = "/custom/data"

[selfplay]
games_per_iteration = 32
num_workers = 4

[mcts]
num_simulations = 800
dirichlet_alpha = 0.3
dirichlet_weight = 0.25
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.data_dir, "/custom/data");
    assert_eq!(config.selfplay.games_per_iteration, 32);
    assert_eq!(config.selfplay.num_workers, 4);
    assert_eq!(config.mcts.num_simulations, 800);
    assert!((config.mcts.dirichlet_alpha - 0.3).abs() < f64::EPSILON);
    assert!((config.mcts.dirichlet_weight - 0.25).abs() < f64::EPSILON);
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[evaluation]
games = 20
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.evaluation.games, 20);
    assert_eq!(config.evaluation.interval, 5); // Default
    assert_eq!(config.common.data_dir, "./data"); // Default
    assert_eq!(config.selfplay.iterations, 400); // Default
}

#[test]
fn test_load_from_missing_path_uses_defaults() {
    let config = load_from_path(&std::path::PathBuf::from("/nonexistent/ultimate/config.toml"));
    assert_eq!(config.selfplay.games_per_iteration, 10);
}
