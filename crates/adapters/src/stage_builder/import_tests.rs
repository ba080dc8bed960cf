use super::*;

#[test]
fn validate_rejects_empty_file_list() {
    let builder = ImportBuilder {
        files: Vec::new(),
        optics: OpticsConfig::default(),
    };
    assert!(builder.validate().is_err());
}

#[test]
fn validate_accepts_nonempty_file_list() {
    let builder = ImportBuilder {
        files: vec![PathBuf::from("a.tiff")],
        optics: OpticsConfig::default(),
    };
    assert!(builder.validate().is_ok());
}

#[test]
fn build_command_includes_all_files_and_optics() {
    let builder = ImportBuilder {
        files: vec![PathBuf::from("a.tiff"), PathBuf::from("b.tiff")],
        optics: OpticsConfig::default(),
    };
    let argv = builder.build_command(Path::new("import"), "job001");
    assert_eq!(argv[0], "relion_import");
    assert!(argv.iter().any(|a| a == "a.tiff"));
    assert!(argv.iter().any(|a| a == "b.tiff"));
}

#[test]
fn has_no_input_job_names() {
    let builder = ImportBuilder {
        files: vec![PathBuf::from("a.tiff")],
        optics: OpticsConfig::default(),
    };
    assert!(builder.get_input_job_names().is_empty());
}
