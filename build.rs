use std::env;
use std::path::PathBuf;

// FFmpeg discovery only needs help on Windows, where the libraries usually
// come from vcpkg. Everywhere else pkg-config finds them.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows")
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        println!(
            "cargo:warning=aspectscan needs the FFmpeg libraries; set FFMPEG_DIR, or install them with vcpkg and set VCPKG_ROOT."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let install_dir = PathBuf::from(vcpkg_root).join("installed").join(&triplet);

    if !install_dir.exists() {
        println!(
            "cargo:warning=No vcpkg FFmpeg install for triplet {triplet} under {}.",
            install_dir.display()
        );
        return;
    }

    println!(
        "cargo:warning=Using vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to silence this message.",
        install_dir.display()
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!("cargo:warning=Set VCPKGRS_DYNAMIC=1 if the vcpkg FFmpeg build is dynamic.");
    }
}
