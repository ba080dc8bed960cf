use super::*;

fn builder() -> CtfBuilder {
    CtfBuilder {
        config: CtfConfig::default(),
        previous_job_name: "job002".to_string(),
        input_file: "micrographs.star".to_string(),
    }
}

#[test]
fn validate_rejects_inverted_defocus_range() {
    let mut b = builder();
    b.config.defocus_min = 50_000.0;
    b.config.defocus_max = 5_000.0;
    assert!(b.validate().is_err());
}

#[test]
fn validate_rejects_nonpositive_step() {
    let mut b = builder();
    b.config.defocus_step = 0.0;
    assert!(b.validate().is_err());
}

#[test]
fn input_chains_from_motion_directory() {
    let argv = builder().build_command(Path::new("ctf"), "job003");
    let idx = argv.iter().position(|a| a == "--i").unwrap();
    assert_eq!(argv[idx + 1], "motion/job002/micrographs.star");
}

#[test]
fn does_not_support_gpu() {
    assert!(!builder().supports_gpu());
}
