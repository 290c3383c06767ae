use jpegpress::engine::{
    destination_path, is_compress_candidate, is_compressed_output, is_jpeg_path,
    source_for_output, target_dimensions,
};
use jpegpress::utils::settings_toml::parse_settings_toml;
use jpegpress::utils::{apply_file_to_opts, temp_path_for, write_atomically};
use jpegpress::{CompressionConfig, CompressionOpts, PipelineError, RunState};
use std::path::{Path, PathBuf};

// --- is_jpeg_path / is_compressed_output ---

#[test]
fn test_jpeg_extensions_case_insensitive() {
    for name in ["a.jpg", "a.JPG", "a.jpeg", "a.JpEg", "dir/b.Jpg"] {
        assert!(is_jpeg_path(Path::new(name)), "{name}");
    }
}

#[test]
fn test_non_jpeg_extensions_rejected() {
    for name in ["a.png", "a.jpg.bak", "a.jfif", "jpg", "a", "a.tiff"] {
        assert!(!is_jpeg_path(Path::new(name)), "{name}");
    }
}

#[test]
fn test_compressed_output_needs_its_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("photo.JPEG");
    let output = dir.path().join("photo_compressed.JPEG");
    std::fs::write(&source, b"x").unwrap();
    std::fs::write(&output, b"x").unwrap();

    assert!(is_compressed_output(&output, "_compressed"));
    assert!(!is_compress_candidate(&output, "_compressed"));
    assert!(!is_compressed_output(&source, "_compressed"));
    assert!(is_compress_candidate(&source, "_compressed"));
}

#[test]
fn test_lone_suffixed_name_is_a_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let trip = dir.path().join("trip_compressed.jpg");
    std::fs::write(&trip, b"x").unwrap();
    assert!(!is_compressed_output(&trip, "_compressed"));
    assert!(is_compress_candidate(&trip, "_compressed"));
}

#[test]
fn test_source_for_output() {
    assert_eq!(
        source_for_output(Path::new("a/b.c_compressed.jpg"), "_compressed"),
        Some(PathBuf::from("a/b.c.jpg"))
    );
    assert_eq!(
        source_for_output(Path::new("a/_compressed.jpg"), "_compressed"),
        None
    );
    assert_eq!(source_for_output(Path::new("a/b.jpg"), "_compressed"), None);
}

// --- destination_path ---

#[test]
fn test_destination_keeps_dir_and_extension() {
    assert_eq!(
        destination_path(Path::new("/pics/holiday/beach.JPG"), "_compressed"),
        Some(PathBuf::from("/pics/holiday/beach_compressed.JPG"))
    );
    assert_eq!(
        destination_path(Path::new("cat.jpeg"), "_small"),
        Some(PathBuf::from("cat_small.jpeg"))
    );
}

#[test]
fn test_destination_multi_dot_stem() {
    assert_eq!(
        destination_path(Path::new("a/b.c.jpg"), "_compressed"),
        Some(PathBuf::from("a/b.c_compressed.jpg"))
    );
}

#[cfg(unix)]
#[test]
fn test_destination_non_utf8_stems_stay_distinct() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let a = Path::new("pics").join(OsStr::from_bytes(b"x\xff.jpg"));
    let b = Path::new("pics").join(OsStr::from_bytes(b"x\xfe.jpg"));
    let dest_a = destination_path(&a, "_compressed").unwrap();
    let dest_b = destination_path(&b, "_compressed").unwrap();

    assert_ne!(dest_a, dest_b);
    assert_eq!(
        dest_a.file_name().unwrap().as_bytes(),
        b"x\xff_compressed.jpg"
    );
    assert_eq!(dest_a.parent(), Some(Path::new("pics")));
}

// --- target_dimensions ---

#[test]
fn test_target_dimensions_identity() {
    assert_eq!(target_dimensions(640, 480, 1.0), (640, 480));
}

#[test]
fn test_target_dimensions_rounds() {
    assert_eq!(target_dimensions(33, 21, 0.5), (17, 11));
    assert_eq!(target_dimensions(100, 50, 0.333), (33, 17));
}

#[test]
fn test_target_dimensions_never_zero() {
    assert_eq!(target_dimensions(1, 3, 0.01), (1, 1));
}

// --- CompressionConfig ---

#[test]
fn test_config_defaults() {
    let config = CompressionConfig::new(&CompressionOpts::default()).unwrap();
    assert_eq!(config.quality(), 0.75);
    assert_eq!(config.scale(), 1.0);
    assert!(config.workers() >= 1);
    assert_eq!(config.backlog(), config.workers() * 4);
    assert!(!config.recursive());
    assert_eq!(config.suffix(), "_compressed");
    assert_eq!(config.encoder_quality(), 75);
}

#[test]
fn test_config_rejects_out_of_range() {
    let bad = [
        CompressionOpts {
            quality: Some(0.0),
            ..Default::default()
        },
        CompressionOpts {
            quality: Some(1.01),
            ..Default::default()
        },
        CompressionOpts {
            scale: Some(-0.5),
            ..Default::default()
        },
        CompressionOpts {
            scale: Some(f32::NAN),
            ..Default::default()
        },
        CompressionOpts {
            workers: Some(0),
            ..Default::default()
        },
        CompressionOpts {
            backlog: Some(0),
            ..Default::default()
        },
        CompressionOpts {
            suffix: Some(String::new()),
            ..Default::default()
        },
        CompressionOpts {
            suffix: Some("a/b".to_string()),
            ..Default::default()
        },
    ];
    for opts in &bad {
        assert!(
            matches!(
                CompressionConfig::new(opts),
                Err(PipelineError::Configuration(_))
            ),
            "{opts:?}"
        );
    }
}

#[test]
fn test_config_accepts_upper_bounds() {
    let config = CompressionConfig::new(&CompressionOpts {
        quality: Some(1.0),
        scale: Some(1.0),
        workers: Some(8),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(config.encoder_quality(), 100);
    assert_eq!(config.workers(), 8);
    assert_eq!(config.backlog(), 32);
}

#[test]
fn test_encoder_quality_floor() {
    let config = CompressionConfig::new(&CompressionOpts {
        quality: Some(0.001),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(config.encoder_quality(), 1);
}

// --- settings file ---

#[test]
fn test_settings_toml_applies_present_fields_only() {
    let file = parse_settings_toml(
        r#"
        [settings]
        quality = 0.5
        recursive = true
        verbose = true
        log_file = "run.log"
        "#,
    )
    .unwrap();
    let mut opts = CompressionOpts {
        workers: Some(3),
        ..Default::default()
    };
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.quality, Some(0.5));
    assert_eq!(opts.recursive, Some(true));
    assert_eq!(opts.workers, Some(3));
    assert_eq!(opts.scale, None);
    assert_eq!(file.verbose(), Some(true));
    assert_eq!(file.log_file(), Some("run.log"));
}

#[test]
fn test_settings_toml_empty_and_invalid() {
    let file = parse_settings_toml("").unwrap();
    let mut opts = CompressionOpts::default();
    apply_file_to_opts(&file, &mut opts);
    assert!(opts.quality.is_none());

    assert!(parse_settings_toml("[settings]\nquality = \"high\"").is_err());
}

// --- RunState ---

#[test]
fn test_run_state_transitions() {
    use RunState::*;
    assert!(Idle.can_transition_to(Preparing));
    assert!(Preparing.can_transition_to(Running));
    assert!(Running.can_transition_to(Draining));
    assert!(Draining.can_transition_to(Completed));
    assert!(Running.can_transition_to(Failed));
    assert!(!Draining.can_transition_to(Running));
    assert!(!Completed.can_transition_to(Running));
    assert!(!Failed.can_transition_to(Completed));
    assert!(Completed.is_terminal() && Failed.is_terminal());
    assert!(!Draining.is_terminal());
}

// --- temp files ---

#[test]
fn test_temp_path_is_sibling() {
    assert_eq!(
        temp_path_for(Path::new("/a/b_compressed.jpg")),
        PathBuf::from("/a/b_compressed.jpg.tmp")
    );
}

#[test]
fn test_write_atomically_replaces_and_leaves_no_temp() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out_compressed.jpg");
    write_atomically(&dest, b"first").unwrap();
    write_atomically(&dest, b"second").unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"second");
    assert!(!temp_path_for(&dest).exists());
}

#[test]
fn test_write_atomically_failure_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing_dir").join("out.jpg");
    assert!(write_atomically(&dest, b"data").is_err());
    assert!(!dest.exists());
    assert!(!temp_path_for(&dest).exists());
}
