//! Build-time hints for locating FFmpeg.
//!
//! Linking is done by `ffmpeg-sys-next` (pulled in by `ffmpeg-next`); this
//! script only warns early when the environment looks likely to make that
//! discovery fail.

use std::env;
use std::path::{Path, PathBuf};

fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET", "PKG_CONFIG_PATH"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if let Some(ffmpeg_dir) = env::var_os("FFMPEG_DIR") {
        check_ffmpeg_dir(Path::new(&ffmpeg_dir));
        return;
    }

    match env::var("CARGO_CFG_TARGET_OS").unwrap_or_default().as_str() {
        "windows" => suggest_vcpkg(),
        "macos" => suggest_homebrew(),
        _ => {}
    }
}

fn check_ffmpeg_dir(ffmpeg_dir: &Path) {
    let missing: Vec<&str> = ["include", "lib"]
        .into_iter()
        .filter(|child| !ffmpeg_dir.join(child).is_dir())
        .collect();
    if !missing.is_empty() {
        println!(
            "cargo:warning=FFMPEG_DIR={} has no {} directory; FFmpeg headers and libraries are expected there.",
            ffmpeg_dir.display(),
            missing.join(" or "),
        );
    }
}

fn suggest_vcpkg() {
    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=FFMPEG_DIR is not set. On Windows, install FFmpeg with vcpkg and set FFMPEG_DIR to its installed triplet directory."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if candidate.is_dir() {
        println!(
            "cargo:warning=Found vcpkg FFmpeg candidate at {}. Set FFMPEG_DIR to it if linking fails.",
            candidate.display(),
        );
    } else {
        println!(
            "cargo:warning=VCPKG_ROOT is set but {} does not exist.",
            candidate.display(),
        );
    }
}

fn suggest_homebrew() {
    for prefix in ["/opt/homebrew/opt/ffmpeg", "/usr/local/opt/ffmpeg"] {
        let pkgconfig = Path::new(prefix).join("lib").join("pkgconfig");
        if pkgconfig.is_dir() {
            let on_path = env::var("PKG_CONFIG_PATH")
                .is_ok_and(|value| value.split(':').any(|entry| Path::new(entry) == pkgconfig));
            if !on_path {
                println!(
                    "cargo:warning=Homebrew FFmpeg found at {prefix}; add {} to PKG_CONFIG_PATH if linking fails.",
                    pkgconfig.display(),
                );
            }
            return;
        }
    }
}
