use super::*;

fn builder(method: PickingMethod) -> PickBuilder {
    PickBuilder {
        config: PickingConfig {
            method,
            ..PickingConfig::default()
        },
        previous_job_name: "job003".to_string(),
        input_file: "micrographs_ctf.star".to_string(),
    }
}

#[test]
fn log_method_emits_log_flags() {
    let argv = builder(PickingMethod::Log).build_command(Path::new("pick"), "job004");
    assert!(argv.iter().any(|a| a == "--LoG"));
    assert!(!argv.iter().any(|a| a == "--ref"));
}

#[test]
fn template_method_emits_threshold_flag() {
    let argv = builder(PickingMethod::Template).build_command(Path::new("pick"), "job004");
    assert!(argv.iter().any(|a| a == "--threshold"));
    assert!(!argv.iter().any(|a| a == "--LoG"));
}

#[test]
fn validate_rejects_inverted_diameter_range() {
    let mut b = builder(PickingMethod::Log);
    b.config.diameter_min_angstrom = 300.0;
    b.config.diameter_max_angstrom = 100.0;
    assert!(b.validate().is_err());
}

#[test]
fn supports_gpu_is_true() {
    assert!(builder(PickingMethod::Log).supports_gpu());
}
