use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
    println!("cargo:rerun-if-env-changed=VCPKG_ROOT");
    println!("cargo:rerun-if-env-changed=VCPKGRS_TRIPLET");

    // Only Windows builds need help locating FFmpeg.
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }
    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=framescan needs FFmpeg development libraries; set FFMPEG_DIR (or VCPKG_ROOT) before building on Windows."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(&vcpkg_root).join("installed").join(&triplet);

    if candidate.exists() {
        println!(
            "cargo:warning=Found vcpkg FFmpeg under {}; export FFMPEG_DIR={} to silence this hint.",
            candidate.display(),
            candidate.display(),
        );
    } else {
        println!(
            "cargo:warning=VCPKG_ROOT has no FFmpeg install for triplet {triplet} ({}).",
            candidate.display(),
        );
    }
}
