use super::*;

fn builder(variant: Class2dVariant) -> Class2dBuilder {
    Class2dBuilder {
        config: Class2dConfig {
            variant,
            ..Class2dConfig::default()
        },
        previous_job_name: "job005".to_string(),
        input_file: "particles.star".to_string(),
    }
}

#[test]
fn fast_variant_does_not_support_mpi() {
    assert!(!builder(Class2dVariant::Fast).supports_mpi());
}

#[test]
fn slow_variant_supports_mpi() {
    assert!(builder(Class2dVariant::Slow).supports_mpi());
}

#[test]
fn build_command_uses_variant_default_iterations() {
    let argv = builder(Class2dVariant::Fast).build_command(Path::new("class2d"), "job006");
    let idx = argv.iter().position(|a| a == "--iter").unwrap();
    assert_eq!(argv[idx + 1], "25");

    let argv = builder(Class2dVariant::Slow).build_command(Path::new("class2d"), "job006");
    let idx = argv.iter().position(|a| a == "--iter").unwrap();
    assert_eq!(argv[idx + 1], "10");
}

#[test]
fn validate_rejects_zero_class_count() {
    let mut b = builder(Class2dVariant::Fast);
    b.config.class_count = 0;
    assert!(b.validate().is_err());
}

#[test]
fn input_chains_from_extract_directory() {
    let argv = builder(Class2dVariant::Fast).build_command(Path::new("class2d"), "job006");
    let idx = argv.iter().position(|a| a == "--i").unwrap();
    assert_eq!(argv[idx + 1], "extract/job005/particles.star");
}
