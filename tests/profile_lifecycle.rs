#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the profile lifecycle.
//!
//! Each test runs commands end to end against a temporary home directory
//! and data directory: save, load, rename, delete, archive and unarchive.

mod common;

use std::fs;
use std::path::Path;

use common::{IntegrationTestContext, TestContextBuilder};
use konfsave::archive::Compression;
use konfsave::cli::{
    ArchiveOpts, DeleteOpts, LoadOpts, Overrides, RenameOpts, SaveOpts, UnarchiveOpts,
};
use konfsave::commands;
use konfsave::logging::BufferedLog;
use konfsave::prompt::AssumeYes;

fn save(ctx: &IntegrationTestContext, name: &str) {
    let opts = SaveOpts {
        profile: Some(name.to_string()),
        destination: None,
        follow_symlinks: false,
        overrides: Overrides::default(),
    };
    commands::save::run(&ctx.global(), &opts, &AssumeYes, &BufferedLog::new()).unwrap();
}

fn load(ctx: &IntegrationTestContext, name: &str) {
    let opts = LoadOpts {
        profile: name.to_string(),
        overwrite: true,
        overrides: Overrides::default(),
    };
    commands::load::run(&ctx.global(), &opts, &AssumeYes, &BufferedLog::new()).unwrap();
}

/// Every file below `dir` with its contents, keyed by relative path.
fn tree(dir: &Path) -> Vec<(String, Vec<u8>)> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                out.push((rel, fs::read(&path).unwrap()));
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

// ---------------------------------------------------------------------------
// Save and load
// ---------------------------------------------------------------------------

#[test]
fn save_then_load_restores_files_and_record() {
    let ctx = TestContextBuilder::new()
        .with_home_file(".config/kdeglobals", "[General]\nColorScheme=Breeze\n")
        .with_home_file(".config/gtk-3.0/settings.ini", "[Settings]\n")
        .build();
    save(&ctx, "work");
    let record = fs::read(ctx.profile_dir("work").join(".konfsave_profile")).unwrap();

    load(&ctx, "work");

    assert_eq!(ctx.read_home(".config/kdeglobals"), "[General]\nColorScheme=Breeze\n");
    assert_eq!(ctx.read_home(".config/gtk-3.0/settings.ini"), "[Settings]\n");
    assert_eq!(
        fs::read(ctx.profile_dir("work").join(".konfsave_profile")).unwrap(),
        record
    );
    assert_eq!(ctx.active_pointer().unwrap().as_bytes(), record.as_slice());
}

#[test]
fn save_skips_exceptions() {
    let ctx = TestContextBuilder::new()
        .with_home_file(".config/kdeglobals", "x")
        .with_home_file(".config/secret.conf", "token")
        .build();
    save(&ctx, "work");
    assert!(ctx.profile_dir("work").join(".config/kdeglobals").is_file());
    assert!(!ctx.profile_dir("work").join(".config/secret.conf").exists());
}

#[test]
fn load_uses_the_profile_tree_and_keeps_unrelated_home_files() {
    let ctx = TestContextBuilder::new()
        .with_profile("work", &[(".config/gtk-3.0/gtk.css", "css")])
        .with_home_file(".config/gtk-3.0/mine.css", "keep")
        .build();

    load(&ctx, "work");

    assert_eq!(ctx.read_home(".config/gtk-3.0/gtk.css"), "css");
    assert_eq!(ctx.read_home(".config/gtk-3.0/mine.css"), "keep");
}

// ---------------------------------------------------------------------------
// Rename and delete
// ---------------------------------------------------------------------------

#[test]
fn rename_onto_existing_profile_is_a_conflict() {
    let ctx = TestContextBuilder::new()
        .with_profile("alpha", &[(".config/kwinrc", "alpha")])
        .with_profile("beta", &[(".config/kwinrc", "beta")])
        .build();
    let before_alpha = tree(&ctx.profile_dir("alpha"));
    let before_beta = tree(&ctx.profile_dir("beta"));

    let opts = RenameOpts {
        old: "alpha".to_string(),
        new: "beta".to_string(),
    };
    let err = commands::rename::run(&ctx.global(), &opts, &BufferedLog::new()).unwrap_err();

    assert!(err.to_string().contains("already saved"));
    assert_eq!(tree(&ctx.profile_dir("alpha")), before_alpha);
    assert_eq!(tree(&ctx.profile_dir("beta")), before_beta);
}

#[test]
fn deleting_active_profile_clears_pointer_only() {
    let ctx = TestContextBuilder::new()
        .with_profile("work", &[(".config/kwinrc", "stored")])
        .with_active("work")
        .with_home_file(".config/kwinrc", "live")
        .build();

    let opts = DeleteOpts {
        profiles: vec!["work".to_string()],
        noconfirm: true,
    };
    commands::delete::run(&ctx.global(), &opts, &AssumeYes, &BufferedLog::new()).unwrap();

    assert!(!ctx.profile_dir("work").exists());
    assert!(ctx.active_pointer().is_none());
    assert_eq!(ctx.read_home(".config/kwinrc"), "live");
}

// ---------------------------------------------------------------------------
// Archives
// ---------------------------------------------------------------------------

#[test]
fn archive_then_unarchive_under_new_name() {
    let ctx = TestContextBuilder::new()
        .with_profile(
            "work",
            &[
                (".config/kwinrc", "[Windows]\n"),
                (".config/gtk-3.0/settings.ini", "[Settings]\n"),
            ],
        )
        .build();
    let zip = ctx.root.path().join("work.konfsave.zip");

    let archive = ArchiveOpts {
        profile: Some("work".to_string()),
        destination: Some(zip.clone()),
        overwrite: false,
        compression: Compression::Deflate,
        compression_level: Some(9),
    };
    commands::archive::run_archive(&ctx.global(), &archive, &BufferedLog::new()).unwrap();

    let unarchive = UnarchiveOpts {
        file: zip,
        name: Some("copy".to_string()),
        overwrite: false,
        noconfirm: true,
    };
    commands::archive::run_unarchive(&ctx.global(), &unarchive, &AssumeYes, &BufferedLog::new())
        .unwrap();

    let without_record = |dir: &Path| {
        tree(dir)
            .into_iter()
            .filter(|(rel, _)| rel != ".konfsave_profile")
            .collect::<Vec<_>>()
    };
    assert_eq!(
        without_record(&ctx.profile_dir("copy")),
        without_record(&ctx.profile_dir("work"))
    );
    let record = fs::read_to_string(ctx.profile_dir("copy").join(".konfsave_profile")).unwrap();
    assert!(record.contains("\"name\": \"copy\""));
}

#[test]
fn archive_destination_conflict() {
    let ctx = TestContextBuilder::new()
        .with_profile("work", &[(".config/kwinrc", "x")])
        .build();
    let zip = ctx.root.path().join("work.zip");
    fs::write(&zip, "occupied").unwrap();

    let archive = ArchiveOpts {
        profile: Some("work".to_string()),
        destination: Some(zip.clone()),
        overwrite: false,
        compression: Compression::Store,
        compression_level: None,
    };
    let err = commands::archive::run_archive(&ctx.global(), &archive, &BufferedLog::new())
        .unwrap_err();

    assert!(err.to_string().contains("already exists"));
    assert_eq!(fs::read_to_string(&zip).unwrap(), "occupied");
}
